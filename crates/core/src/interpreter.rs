//! Executes the IR directly against a [TapeMachine].
//!
//! There is no program counter and no jump table: the interpreter walks the instruction tree
//! depth-first, and a loop is just a Rust `while` over its own body.

use std::io::{self, ErrorKind, Write};

use crate::errors::ExecutionError;
use crate::ir::{Instruction, Program};
use crate::tape::{Stats, TapeMachine};

/// Walks a [Program] against a borrowed tape, reading from `input` and writing to `output`.
pub struct Interpreter<'t, R, W> {
    tape: &'t mut TapeMachine,
    input: R,
    output: W,
}

/// Runs the program on a fresh tape and returns what it did.
pub fn run<R: io::Read, W: Write>(
    program: &Program,
    input: R,
    output: W,
) -> Result<Stats, ExecutionError> {
    let mut tape = TapeMachine::new();
    Interpreter::new(&mut tape, input, output).execute(program)?;
    Ok(tape.stats())
}

/// Runs the program with the default IO (prints to `stdout`; accepts input from `stdin`).
pub fn run_with_stdio(program: &Program) -> Result<Stats, ExecutionError> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run(program, stdin.lock(), io::BufWriter::new(stdout.lock()))
}

impl<'t, R: io::Read, W: Write> Interpreter<'t, R, W> {
    pub fn new(tape: &'t mut TapeMachine, input: R, output: W) -> Self {
        Interpreter {
            tape,
            input,
            output,
        }
    }

    /// Runs the whole program, then flushes the output.
    pub fn execute(&mut self, program: &Program) -> Result<(), ExecutionError> {
        self.execute_body(program.instructions())?;
        self.output.flush()?;
        Ok(())
    }

    fn execute_body(&mut self, body: &[Instruction]) -> Result<(), ExecutionError> {
        for instr in body {
            self.step(instr)?;
        }
        Ok(())
    }

    fn step(&mut self, instr: &Instruction) -> Result<(), ExecutionError> {
        use Instruction::*;

        match instr {
            MoveBy(delta) => {
                self.tape.move_by(*delta as i64);
                self.tape.stats_mut().moves += 1;
            }
            AddBy { delta, offset } => {
                self.tape.add(*offset as i64, *delta as u8);
                self.tape.stats_mut().adds += 1;
            }
            Print => {
                self.output.write_all(&[self.tape.current()])?;
                self.tape.stats_mut().prints += 1;
            }
            Read => {
                self.read_into_current()?;
                self.tape.stats_mut().reads += 1;
            }
            Seek(step) => {
                while self.tape.current() != 0 {
                    self.tape.move_by(*step as i64);
                }
                self.tape.stats_mut().seeks += 1;
            }
            Loop(body) => {
                while self.tape.current() != 0 {
                    self.tape.stats_mut().loop_passes += 1;
                    self.execute_body(body)?;
                }
            }
            Block(body) => self.execute_body(body)?,
            ClearCell => {
                self.tape.set_current(0);
                self.tape.stats_mut().closed_forms += 1;
            }
            TransferAdd(to) => {
                transfer(self.tape, &[(*to, 1)]);
                self.tape.stats_mut().closed_forms += 1;
            }
            TransferSub(to) => {
                transfer(self.tape, &[(*to, -1)]);
                self.tape.stats_mut().closed_forms += 1;
            }
            WeightedTransfer(entries) => {
                transfer(self.tape, entries);
                self.tape.stats_mut().closed_forms += 1;
            }
            Multiply => {
                multiply(self.tape);
                self.tape.stats_mut().closed_forms += 1;
            }
            Exponent => {
                exponent(self.tape);
                self.tape.stats_mut().closed_forms += 1;
            }
            Divide => {
                divide(self.tape);
                self.tape.stats_mut().closed_forms += 1;
            }
        }

        Ok(())
    }

    /// Blocks for one byte of input. At the end of input, the cell is left as it is.
    fn read_into_current(&mut self) -> Result<(), ExecutionError> {
        // Anything printed so far should be visible before we wait on the user.
        self.output.flush()?;

        let mut one_byte = [0u8];
        match self.input.read_exact(&mut one_byte) {
            Ok(()) => self.tape.set_current(one_byte[0]),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => (),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }
}

// Closed forms. Each one has exactly the effect of running its loop to completion.

/// Adds `weight * v` to every target, where `v` is the current cell, then zeroes the current cell.
fn transfer(tape: &mut TapeMachine, entries: &[(i8, i8)]) {
    let v = tape.current();
    for &(offset, weight) in entries {
        tape.add(offset as i64, (weight as u8).wrapping_mul(v));
    }
    tape.set_current(0);
}

/// `[>[>+>+<<-]>>[<<+>>-]<<<-]`
fn multiply(tape: &mut TapeMachine) {
    let a = tape.get(0);
    if a == 0 {
        return;
    }
    let (b, r, t) = (tape.get(1), tape.get(2), tape.get(3));

    // The first pass adds `b`; every later pass adds `b + t`, because the scratch cell is folded
    // back into the multiplier on the first pass.
    let multiplier = b.wrapping_add(t);
    let product = r
        .wrapping_add(b)
        .wrapping_add((a - 1).wrapping_mul(multiplier));

    tape.set(1, multiplier);
    tape.set(2, product);
    tape.set(3, 0);
    tape.set(0, 0);
}

/// `[>>[>+<-]>[<<[>+>>+<<<-]>>>[<<<+>>>-]<-]<<<-]`; scratch cells must start at zero.
fn exponent(tape: &mut TapeMachine) {
    let e = tape.get(0);
    if e == 0 {
        return;
    }
    let base = tape.get(1);
    let result = (0..e).fold(tape.get(2), |acc, _| acc.wrapping_mul(base));

    tape.set(2, result);
    tape.set(3, 0);
    tape.set(4, 0);
    tape.set(0, 0);
}

/// `[->-[>+>>]>[+[-<+>]>+>>]<<<<<]`; scratch cells must start at zero.
///
/// Dividing by zero is unspecified. This happens to compute what the loop itself would, which
/// is to treat the divisor as 256.
fn divide(tape: &mut TapeMachine) {
    let n = tape.get(0) as u32;
    if n == 0 {
        return;
    }
    let d = match tape.get(1) {
        0 => 256,
        d => d as u32,
    };

    tape.set(1, (d - n % d) as u8);
    tape.set(2, (n % d) as u8);
    tape.set(3, (n / d) as u8);
    tape.set(0, 0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::translate;

    fn output_of(source: &str, input: &[u8]) -> Vec<u8> {
        let program = translate(source.as_bytes()).unwrap();
        let mut output = Vec::new();
        run(&program, input, &mut output).unwrap();
        output
    }

    /// Runs `program` with the cursor at `start` and the given cells preloaded.
    fn tape_after(program: &Program, start: usize, cells: &[u8]) -> TapeMachine {
        let mut tape = TapeMachine::new();
        tape.cells_mut()[start..start + cells.len()].copy_from_slice(cells);
        tape.set_cursor(start);
        Interpreter::new(&mut tape, io::empty(), io::sink())
            .execute(program)
            .unwrap();
        tape
    }

    #[test]
    fn increment_and_print() {
        assert_eq!(output_of("++++.", b""), vec![4]);
    }

    #[test]
    fn simple_loop() {
        assert_eq!(output_of("+++[>++<-]>.", b""), vec![6]);
    }

    #[test]
    fn loop_on_zero_never_runs() {
        let program = Program::new(vec![Instruction::Loop(vec![Instruction::Print])]);
        let mut output = Vec::new();
        let stats = run(&program, io::empty(), &mut output).unwrap();

        assert!(output.is_empty());
        assert_eq!(stats.loop_passes, 0);
    }

    #[test]
    fn hello_world() {
        let source = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";
        assert_eq!(output_of(source, b""), b"Hello World!\n");
    }

    #[test]
    fn end_of_input_leaves_cell_alone() {
        assert_eq!(output_of(",.", b""), vec![0]);
        assert_eq!(output_of("+++,.", b""), vec![3]);
    }

    #[test]
    fn echo_with_clear_before_read() {
        assert_eq!(output_of(",[.[-],]", b"hey"), b"hey".to_vec());
    }

    #[test]
    fn cell_wraps_below_zero() {
        assert_eq!(output_of("-.", b""), vec![255]);
    }

    #[test]
    fn cursor_clamps_at_left_edge() {
        assert_eq!(output_of("<<<+.", b""), vec![1]);
    }

    #[test]
    fn transfers_off_the_left_edge_differ_from_literal_loops() {
        use crate::translate::{translate_with, Optimizations};

        let source = b"+++[-<+>]<.";
        let mut literal_output = Vec::new();
        let literal = translate_with(source, Optimizations::none()).unwrap();
        run(&literal, io::empty(), &mut literal_output).unwrap();

        assert_eq!(literal_output, vec![3]);
        assert_eq!(output_of("+++[-<+>]<.", b""), vec![0]);
    }

    #[test]
    fn weighted_transfer_skips_off_tape_targets() {
        let program = Program::new(vec![Instruction::WeightedTransfer(vec![(-1, 3), (1, 2)])]);
        let tape = tape_after(&program, 0, &[5]);

        assert_eq!(&tape.cells()[..2], &[0, 10]);
    }

    #[test]
    fn multiply_closed_form() {
        let program = Program::new(vec![Instruction::Multiply]);
        let tape = tape_after(&program, 10, &[7, 9, 1, 0]);

        assert_eq!(&tape.cells()[10..14], &[0, 9, 64, 0]);
        assert_eq!(tape.cursor(), 10);
    }

    #[test]
    fn exponent_closed_form() {
        let program = Program::new(vec![Instruction::Exponent]);
        let tape = tape_after(&program, 10, &[3, 5, 1, 0, 0]);

        assert_eq!(&tape.cells()[10..15], &[0, 5, 125, 0, 0]);
    }

    #[test]
    fn divide_closed_form() {
        let program = Program::new(vec![Instruction::Divide]);
        let tape = tape_after(&program, 10, &[17, 5, 0, 0, 0]);

        assert_eq!(&tape.cells()[10..14], &[0, 3, 2, 3]);
    }

    #[test]
    fn seek_finds_zero() {
        let program = translate(b"[>>]").unwrap();
        let tape = tape_after(&program, 0, &[1, 1, 1, 1, 0]);

        assert_eq!(tape.cursor(), 4);
        assert_eq!(tape.stats().seeks, 1);
    }
}
