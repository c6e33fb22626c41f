//! The tape machine: a fixed tape of byte cells and a cursor.
//!
//! The cursor never leaves the tape: moves past either end stop at the last cell. Cell accesses
//! at an offset from the cursor may land outside the tape; reads there see zero and writes there
//! are silently dropped.
//!
//! The two rules disagree at the edges. A literal loop that steps off the tape keeps working on
//! the edge cell, while the closed form of the same loop skips its off-tape target. Optimized and
//! literal translations therefore only agree on programs that stay clear of both ends.

use std::fmt;

/// Number of cells on the tape.
pub const TAPE_LEN: usize = 30_000;

/// Tape, cursor, and run counters for one execution.
#[derive(Clone)]
pub struct TapeMachine {
    cells: Box<[u8]>,
    cursor: usize,
    stats: Stats,
}

/// How much work a run did. Owned by the caller; nothing here is global.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub moves: u64,
    pub adds: u64,
    pub prints: u64,
    pub reads: u64,
    pub loop_passes: u64,
    pub seeks: u64,
    pub closed_forms: u64,
}

impl TapeMachine {
    pub fn new() -> Self {
        TapeMachine {
            cells: vec![0; TAPE_LEN].into_boxed_slice(),
            cursor: 0,
            stats: Stats::default(),
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [u8] {
        &mut self.cells
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut Stats {
        &mut self.stats
    }

    /// Moves the cursor, stopping at either end of the tape.
    pub fn move_by(&mut self, delta: i64) {
        let last = self.cells.len() as i64 - 1;
        self.cursor = (self.cursor as i64 + delta).clamp(0, last) as usize;
    }

    /// Puts the cursor at an absolute cell, stopping at the end of the tape.
    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.cells.len() - 1);
    }

    /// The cell under the cursor.
    pub fn current(&self) -> u8 {
        self.cells[self.cursor]
    }

    pub fn set_current(&mut self, value: u8) {
        self.cells[self.cursor] = value;
    }

    /// The cell at `cursor + offset`, or zero if that is off the tape.
    pub fn get(&self, offset: i64) -> u8 {
        self.index(offset).map(|i| self.cells[i]).unwrap_or(0)
    }

    /// Writes the cell at `cursor + offset`; does nothing if that is off the tape.
    pub fn set(&mut self, offset: i64, value: u8) {
        if let Some(i) = self.index(offset) {
            self.cells[i] = value;
        }
    }

    /// Adds (mod 256) to the cell at `cursor + offset`; does nothing if that is off the tape.
    pub fn add(&mut self, offset: i64, delta: u8) {
        if let Some(i) = self.index(offset) {
            self.cells[i] = self.cells[i].wrapping_add(delta);
        }
    }

    fn index(&self, offset: i64) -> Option<usize> {
        let i = self.cursor as i64 + offset;
        if i >= 0 && (i as usize) < self.cells.len() {
            Some(i as usize)
        } else {
            None
        }
    }
}

impl Default for TapeMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TapeMachine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let shown = &self.cells[..self.cells.len().min(10)];
        f.debug_struct("TapeMachine")
            .field("cursor", &self.cursor)
            .field("cells", &shown)
            .field("stats", &self.stats)
            .finish()
    }
}

impl Stats {
    /// Total number of instructions executed.
    pub fn total(&self) -> u64 {
        self.moves
            + self.adds
            + self.prints
            + self.reads
            + self.loop_passes
            + self.seeks
            + self.closed_forms
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, " moves:        {}", self.moves)?;
        writeln!(f, " adds:         {}", self.adds)?;
        writeln!(f, " prints:       {}", self.prints)?;
        writeln!(f, " reads:        {}", self.reads)?;
        writeln!(f, " loop passes:  {}", self.loop_passes)?;
        writeln!(f, " seeks:        {}", self.seeks)?;
        writeln!(f, " closed forms: {}", self.closed_forms)?;
        write!(f, " total:        {}", self.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_clamp_at_both_ends() {
        let mut tape = TapeMachine::new();

        tape.move_by(-5);
        assert_eq!(tape.cursor(), 0);

        tape.move_by(TAPE_LEN as i64 + 10);
        assert_eq!(tape.cursor(), TAPE_LEN - 1);
    }

    #[test]
    fn off_tape_access_is_ignored() {
        let mut tape = TapeMachine::new();

        tape.set(-1, 9);
        tape.add(-3, 1);
        assert_eq!(tape.get(-1), 0);
        assert!(tape.cells().iter().all(|&c| c == 0));
    }

    #[test]
    fn adds_wrap() {
        let mut tape = TapeMachine::new();
        tape.set_cursor(3);
        tape.add(1, 200);
        tape.add(1, 100);

        assert_eq!(tape.get(1), 44);
        assert_eq!(tape.cells()[4], 44);
    }

    #[test]
    fn stats_total() {
        let stats = Stats {
            moves: 1,
            adds: 2,
            loop_passes: 3,
            ..Stats::default()
        };
        assert_eq!(stats.total(), 6);
        assert!(stats.to_string().contains("total:        6"));
    }
}
