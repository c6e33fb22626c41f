//! Static analysis of loop bodies.
//!
//! A loop body that only moves the cursor and adds constants to cells can be summarised by where
//! the cursor ends up and how much each visited cell changes per pass. From that summary it is
//! often possible to replace the loop with a closed form that does not iterate at all.

use std::collections::BTreeMap;

use crate::ir::Instruction;
use crate::parsing::{Symbol, Token};

/// Net effect of one pass over a loop body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSummary {
    /// Where the cursor ends up, relative to where it started.
    pub displacement: i8,
    /// Per-offset change to each cell, modulo 256. Offsets with a zero delta are not present.
    pub deltas: BTreeMap<i8, i8>,
}

/// Why a loop body could not be summarised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unanalyzable {
    /// The body does I/O or contains another loop. Not an error; the loop is translated as-is.
    NotStaticallyAnalyzable(Symbol),
    /// The virtual cursor wandered further than a signed byte can express. This is fatal.
    OffsetOverflow { position: usize, offset: i64 },
}

/// Walks a loop body (the tokens strictly between `[` and `]`) once, tracking a virtual cursor.
///
/// A body that does I/O or contains another loop is never summarised, even if the cursor has
/// already wandered out of range by then; an offset overflow only counts for bodies that would
/// otherwise be summarised.
pub fn classify(body: &[Token]) -> Result<LoopSummary, Unanalyzable> {
    use Symbol::*;

    let mut cursor: i64 = 0;
    let mut deltas: BTreeMap<i8, i8> = BTreeMap::new();
    let mut overflow = None;

    for token in body {
        let count = token.count as i64;
        match token.symbol {
            IncrementAddr | DecrementAddr => {
                cursor += if token.symbol == IncrementAddr {
                    count
                } else {
                    -count
                };
                if let Err(err) = to_offset(cursor, token.position) {
                    overflow = overflow.or(Some(err));
                }
            }
            IncrementVal | DecrementVal => {
                let offset = match to_offset(cursor, token.position) {
                    Ok(offset) => offset,
                    Err(err) => {
                        overflow = overflow.or(Some(err));
                        continue;
                    }
                };
                // Deltas wrap just like the cells they will be added to.
                let amount = if token.symbol == IncrementVal {
                    token.count as i8
                } else {
                    (token.count as i8).wrapping_neg()
                };
                let delta = deltas.entry(offset).or_insert(0);
                *delta = delta.wrapping_add(amount);
            }
            symbol @ (PutChar | GetChar | StartLoop | EndLoop) => {
                return Err(Unanalyzable::NotStaticallyAnalyzable(symbol));
            }
        }
    }

    if let Some(err) = overflow {
        return Err(err);
    }

    deltas.retain(|_, delta| *delta != 0);

    Ok(LoopSummary {
        displacement: cursor as i8,
        deltas,
    })
}

fn to_offset(cursor: i64, position: usize) -> Result<i8, Unanalyzable> {
    i8::try_from(cursor).map_err(|_| Unanalyzable::OffsetOverflow {
        position,
        offset: cursor,
    })
}

impl LoopSummary {
    /// Replaces the whole loop with a single instruction, when that's possible.
    ///
    /// Returns [None] when the loop must still iterate; see [LoopSummary::canonical_body].
    pub fn closed_form(&self) -> Option<Instruction> {
        use Instruction::*;

        if self.displacement != 0 {
            return if self.deltas.is_empty() {
                Some(Seek(self.displacement as i32))
            } else {
                None
            };
        }

        // With the cursor back where it started, the loop decrements (or increments) the same cell
        // by exactly one each pass. A decrement by one reaches zero after exactly `v` passes; an
        // increment by one after `256 - v` passes, which is the same as `-v` passes mod 256.
        let sign = match self.deltas.get(&0) {
            Some(-1) => 1,
            Some(1) => -1,
            _ => return None,
        };

        let entries: Vec<(i8, i8)> = self
            .deltas
            .iter()
            .filter(|&(&offset, _)| offset != 0)
            .map(|(&offset, &weight)| (offset, weight.wrapping_mul(sign)))
            .collect();

        let specialised = match entries[..] {
            [] => Some(ClearCell),
            [(to, 1)] => Some(TransferAdd(to)),
            [(to, -1)] => Some(TransferSub(to)),
            _ => None,
        };
        Some(specialised.unwrap_or_else(|| WeightedTransfer(entries)))
    }

    /// A shorter body that has the same effect as one pass of the original body: one add per
    /// touched cell, then a single cursor move.
    pub fn canonical_body(&self) -> Vec<Instruction> {
        let mut body: Vec<_> = self
            .deltas
            .iter()
            .map(|(&offset, &delta)| Instruction::AddBy { delta, offset })
            .collect();
        if self.displacement != 0 {
            body.push(Instruction::MoveBy(self.displacement as i32));
        }
        body
    }
}
