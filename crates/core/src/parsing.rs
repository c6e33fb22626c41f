//! Scans raw source text (really, just a bunch of bytes) into run-length encoded tokens.
//!
//! The scanner does three things at once:
//!
//!  - it throws away every byte that is not one of the eight meaningful symbols;
//!  - it merges runs of identical `>`, `<`, `+`, `-` into a single [Token] with a count;
//!  - it pairs up every `[` with its matching `]`.
//!
//! Every later stage walks loops recursively, so the scanner also refuses programs whose loops
//! nest deeper than [MAX_NESTING].

use std::collections::HashMap;

use crate::errors::TranslationError;

/// Longest run that a single [Token] can encode. Longer runs are split.
pub const MAX_RUN: u8 = u8::MAX;

/// Deepest loop nesting a program may have.
pub const MAX_NESTING: usize = 256;

/// One of the eight meaningful symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    IncrementAddr,
    DecrementAddr,
    IncrementVal,
    DecrementVal,
    PutChar,
    GetChar,
    StartLoop,
    EndLoop,
}

/// A run of one [Symbol].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub symbol: Symbol,
    /// How many times the symbol repeats. Always 1 for I/O and brackets.
    pub count: u8,
    /// Index of the first symbol of this run in the cleaned source.
    pub start: usize,
    /// Byte offset of the first symbol of this run in the original source.
    pub position: usize,
}

/// The result of scanning: cleaned source, tokens, and bracket pairs.
#[derive(Debug, Clone)]
pub struct Scan {
    cleaned: Vec<u8>,
    tokens: Vec<Token>,
    matching: HashMap<usize, usize>,
}

// public functions

/// Scans source text into [Scan].
///
/// Fails if there is a `[` without a matching `]` or vice versa, or if loops nest deeper than
/// [MAX_NESTING].
pub fn scan(source: &[u8]) -> Result<Scan, TranslationError> {
    use Symbol::*;

    let mut cleaned = Vec::with_capacity(source.len());
    let mut tokens: Vec<Token> = Vec::new();
    let mut matching = HashMap::new();
    let mut loops = LoopStack::new();

    for (position, &byte) in source.iter().enumerate() {
        let symbol = match Symbol::from_byte(byte) {
            Some(symbol) => symbol,
            None => continue,
        };
        let start = cleaned.len();
        cleaned.push(byte);

        if symbol.is_repeatable() {
            if let Some(last) = tokens.last_mut() {
                if last.symbol == symbol && last.count < MAX_RUN {
                    last.count += 1;
                    continue;
                }
            }
        }

        let index = tokens.len();
        tokens.push(Token {
            symbol,
            count: 1,
            start,
            position,
        });

        match symbol {
            StartLoop => {
                if loops.depth() >= MAX_NESTING {
                    return Err(TranslationError::NestingTooDeep {
                        position,
                        limit: MAX_NESTING,
                    });
                }
                loops.push(index);
            }
            EndLoop => match loops.pop() {
                Some(open) => {
                    matching.insert(open, index);
                }
                None => return Err(TranslationError::UnexpectedLoopClose { position }),
            },
            _ => (),
        }
    }

    if let Some(open) = loops.pop() {
        return Err(TranslationError::UnbalancedLoop {
            position: tokens[open].position,
        });
    }

    Ok(Scan {
        cleaned,
        tokens,
        matching,
    })
}

// Implementations

impl Symbol {
    pub fn from_byte(byte: u8) -> Option<Self> {
        use Symbol::*;
        match byte {
            b'>' => Some(IncrementAddr),
            b'<' => Some(DecrementAddr),
            b'+' => Some(IncrementVal),
            b'-' => Some(DecrementVal),
            b'.' => Some(PutChar),
            b',' => Some(GetChar),
            b'[' => Some(StartLoop),
            b']' => Some(EndLoop),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        use Symbol::*;
        match self {
            IncrementAddr => b'>',
            DecrementAddr => b'<',
            IncrementVal => b'+',
            DecrementVal => b'-',
            PutChar => b'.',
            GetChar => b',',
            StartLoop => b'[',
            EndLoop => b']',
        }
    }

    /// Only moves and increments are run-length encoded.
    pub fn is_repeatable(self) -> bool {
        use Symbol::*;
        matches!(
            self,
            IncrementAddr | DecrementAddr | IncrementVal | DecrementVal
        )
    }
}

impl Token {
    /// Index just past the last symbol of this run in the cleaned source.
    pub fn end(&self) -> usize {
        self.start + self.count as usize
    }
}

impl Scan {
    /// The source with every meaningless byte removed.
    pub fn cleaned(&self) -> &[u8] {
        &self.cleaned
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens[..]
    }

    /// Given the token index of a `[`, returns the token index of its `]`.
    pub fn matching(&self, open: usize) -> Option<usize> {
        self.matching.get(&open).copied()
    }

    /// Index into the cleaned source where the given token starts. One past the last token maps
    /// to the end of the cleaned source.
    pub fn offset_of(&self, token: usize) -> usize {
        self.tokens
            .get(token)
            .map(|t| t.start)
            .unwrap_or(self.cleaned.len())
    }

    /// Cleaned source text covered by tokens `start..end`.
    pub fn text(&self, start: usize, end: usize) -> &[u8] {
        &self.cleaned[self.offset_of(start)..self.offset_of(end)]
    }

    /// Finds the token that starts exactly at the given index of the cleaned source.
    pub fn token_starting_at(&self, offset: usize) -> Option<usize> {
        if offset == self.cleaned.len() {
            return Some(self.tokens.len());
        }
        self.tokens
            .binary_search_by_key(&offset, |t| t.start)
            .ok()
    }
}

// Private data structures

/// Keeps track of the `[` that are still waiting for their `]`.
struct LoopStack {
    stack: Vec<usize>,
}

impl LoopStack {
    fn new() -> Self {
        Self { stack: Vec::new() }
    }

    fn push(&mut self, token: usize) {
        self.stack.push(token);
    }

    fn pop(&mut self) -> Option<usize> {
        self.stack.pop()
    }

    fn depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(scan: &Scan) -> Vec<(Symbol, u8, usize)> {
        scan.tokens()
            .iter()
            .map(|t| (t.symbol, t.count, t.start))
            .collect()
    }

    #[test]
    fn strips_comments() {
        let scan = scan(b"hello + world - [ > ] .").unwrap();
        assert_eq!(scan.cleaned(), b"+-[>].");
    }

    #[test]
    fn merges_runs() {
        use Symbol::*;
        let scan = scan(b"+++>>-- <<.,,").unwrap();
        let symbols: Vec<_> = scan.tokens().iter().map(|t| (t.symbol, t.count)).collect();

        assert_eq!(
            symbols,
            vec![
                (IncrementVal, 3),
                (IncrementAddr, 2),
                (DecrementVal, 2),
                (DecrementAddr, 2),
                (PutChar, 1),
                (GetChar, 1),
                (GetChar, 1),
            ]
        );
    }

    #[test]
    fn splits_long_runs() {
        let source = vec![b'+'; 300];
        let scan = scan(&source).unwrap();
        let counts: Vec<_> = scan.tokens().iter().map(|t| t.count).collect();

        assert_eq!(counts, vec![255, 45]);
        assert_eq!(scan.tokens()[1].start, 255);
    }

    #[test]
    fn matches_nested_brackets() {
        let scan = scan(b"[[-]>[+]]").unwrap();
        // tokens: [ [ - ] > [ + ] ]
        assert_eq!(scan.matching(0), Some(8));
        assert_eq!(scan.matching(1), Some(3));
        assert_eq!(scan.matching(5), Some(7));
        assert_eq!(scan.matching(2), None);
    }

    #[test]
    fn unbalanced_open() {
        let err = scan(b"[+").unwrap_err();
        assert_eq!(err, TranslationError::UnbalancedLoop { position: 0 });
    }

    #[test]
    fn unbalanced_open_reports_original_offset() {
        let err = scan(b"ab[[+]").unwrap_err();
        assert_eq!(err, TranslationError::UnbalancedLoop { position: 2 });
    }

    #[test]
    fn unexpected_close() {
        let err = scan(b"+]").unwrap_err();
        assert_eq!(err, TranslationError::UnexpectedLoopClose { position: 1 });
    }

    #[test]
    fn scanning_is_idempotent() {
        let first = scan(b"a+b+[->+<]c>>>.,").unwrap();
        let second = scan(first.cleaned()).unwrap();

        assert_eq!(first.cleaned(), second.cleaned());
        assert_eq!(shape(&first), shape(&second));
        assert_eq!(first.matching, second.matching);
    }

    #[test]
    fn tokens_spell_out_the_cleaned_source() {
        let scan = scan(b"x+++>>[-]<<..,y").unwrap();
        let spelled: Vec<u8> = scan
            .tokens()
            .iter()
            .flat_map(|t| std::iter::repeat(t.symbol.as_byte()).take(t.count as usize))
            .collect();

        assert_eq!(spelled, scan.cleaned());
    }

    #[test]
    fn nesting_up_to_the_limit_is_accepted() {
        let mut source = vec![b'['; MAX_NESTING];
        source.extend(vec![b']'; MAX_NESTING]);
        assert!(scan(&source).is_ok());
    }

    #[test]
    fn nesting_past_the_limit_is_rejected() {
        let mut source = b"+".to_vec();
        source.extend(vec![b'['; MAX_NESTING + 1]);
        source.extend(vec![b']'; MAX_NESTING + 1]);

        assert_eq!(
            scan(&source).unwrap_err(),
            TranslationError::NestingTooDeep {
                position: MAX_NESTING + 1,
                limit: MAX_NESTING
            }
        );
    }

    #[test]
    fn text_and_offsets() {
        let scan = scan(b"++[->+<]").unwrap();
        // tokens: ++ [ - > + < ]
        assert_eq!(scan.text(2, 6), b"->+<");
        assert_eq!(scan.token_starting_at(3), Some(2));
        assert_eq!(scan.token_starting_at(1), None);
        assert_eq!(scan.token_starting_at(8), Some(7));
    }
}
