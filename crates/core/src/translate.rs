//! Turns source text into the [Program] tree.
//!
//! Translation is a recursive descent over ranges of scanned tokens. Every loop is first looked up
//! in the idiom catalogue, then handed to the loop classifier, and only if both give up is it
//! translated structurally, recursing into its body.
//!
//! Optimizing never changes what a program does, except for loops that reach past an end of the
//! tape (see [crate::tape]).

use tracing::{debug, trace};

use crate::errors::TranslationError;
use crate::idioms;
use crate::ir::{Instruction, Program};
use crate::optimize::{self, Unanalyzable};
use crate::parsing::{self, Scan, Symbol};

/// Which optimizations the translator may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Optimizations {
    /// Substitute catalogued idioms (see [crate::idioms]).
    pub idioms: bool,
    /// Replace statically analyzable loops with closed forms, seeks, and canonical bodies.
    pub closed_forms: bool,
}

impl Default for Optimizations {
    fn default() -> Self {
        Optimizations {
            idioms: true,
            closed_forms: true,
        }
    }
}

impl Optimizations {
    /// Translate every symbol literally. Runs of moves and adds are still merged.
    pub fn none() -> Self {
        Optimizations {
            idioms: false,
            closed_forms: false,
        }
    }
}

/// Translates source text with every optimization enabled.
pub fn translate(source: &[u8]) -> Result<Program, TranslationError> {
    translate_with(source, Optimizations::default())
}

/// Translates source text with the given optimizations.
pub fn translate_with(
    source: &[u8],
    optimizations: Optimizations,
) -> Result<Program, TranslationError> {
    let scan = parsing::scan(source)?;
    let translator = Translator {
        scan: &scan,
        optimizations,
    };
    let program = Program::new(translator.lower(0, scan.tokens().len())?);

    debug!(
        source_bytes = source.len(),
        tokens = scan.tokens().len(),
        instructions = program.len(),
        "translated program"
    );
    Ok(program)
}

struct Translator<'a> {
    scan: &'a Scan,
    optimizations: Optimizations,
}

impl Translator<'_> {
    /// Lowers tokens `start..end`. The range never splits a pair of brackets.
    fn lower(&self, start: usize, end: usize) -> Result<Vec<Instruction>, TranslationError> {
        use Instruction::*;

        let tokens = self.scan.tokens();
        let mut body = Vec::new();
        let mut i = start;

        while i < end {
            if let Some((next, replacement)) = self.match_sequence(i, end) {
                body.push(replacement);
                i = next;
                continue;
            }

            let token = tokens[i];
            let count = token.count as i32;
            match token.symbol {
                Symbol::IncrementAddr => body.push(MoveBy(count)),
                Symbol::DecrementAddr => body.push(MoveBy(-count)),
                Symbol::IncrementVal => body.push(AddBy {
                    delta: token.count as i8,
                    offset: 0,
                }),
                Symbol::DecrementVal => body.push(AddBy {
                    delta: (token.count as i8).wrapping_neg(),
                    offset: 0,
                }),
                Symbol::PutChar => body.push(Print),
                Symbol::GetChar => body.push(Read),
                Symbol::StartLoop => {
                    let close =
                        self.scan
                            .matching(i)
                            .ok_or(TranslationError::UnbalancedLoop {
                                position: token.position,
                            })?;
                    body.push(self.lower_loop(i, close)?);
                    i = close + 1;
                    continue;
                }
                Symbol::EndLoop => unreachable!("']' is always consumed by its matching '['"),
            }
            i += 1;
        }

        Ok(body)
    }

    /// Lowers the loop whose brackets are the tokens `open` and `close`.
    fn lower_loop(&self, open: usize, close: usize) -> Result<Instruction, TranslationError> {
        let position = self.scan.tokens()[open].position;

        if self.optimizations.idioms {
            if let Some(instr) = idioms::match_loop_body(self.scan.text(open + 1, close)) {
                debug!(position, instruction = %instr, "matched idiom");
                return Ok(instr);
            }
        }

        if self.optimizations.closed_forms {
            match optimize::classify(&self.scan.tokens()[open + 1..close]) {
                Ok(summary) => {
                    if let Some(instr) = summary.closed_form() {
                        debug!(position, instruction = %instr, "replaced loop with closed form");
                        return Ok(instr);
                    }
                    trace!(position, ?summary, "canonicalised loop body");
                    return Ok(Instruction::Loop(summary.canonical_body()));
                }
                Err(Unanalyzable::OffsetOverflow { position, offset }) => {
                    return Err(TranslationError::OffsetOverflow { position, offset });
                }
                Err(Unanalyzable::NotStaticallyAnalyzable(symbol)) => {
                    trace!(position, ?symbol, "loop is not statically analyzable");
                }
            }
        }

        Ok(Instruction::Loop(self.lower(open + 1, close)?))
    }

    /// Tries the catalogue of fragments that can start at token `i`. A match must end on a token
    /// boundary, so that it never consumes half of a run.
    fn match_sequence(&self, i: usize, end: usize) -> Option<(usize, Instruction)> {
        if !self.optimizations.idioms {
            return None;
        }

        let from = self.scan.offset_of(i);
        let code = &self.scan.cleaned()[from..self.scan.offset_of(end)];
        let (len, replacement) = idioms::match_sequence(code)?;
        let next = self.scan.token_starting_at(from + len)?;

        Some((next, replacement))
    }
}
