//! The internal representation of a program.
//!
//! Unlike most compilers, the IR is a tree, not a control flow graph: every loop owns its body, and
//! a loop body is just a list of instructions. Both the interpreter and the C code generator walk
//! this tree directly.

use std::fmt;

/// A whole translated program. Owns the top-level block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    body: Vec<Instruction>,
}

/// One node of the IR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Move the cursor. Negative is left.
    MoveBy(i32),
    /// Add `delta` (mod 256) to the cell at `cursor + offset`.
    AddBy { delta: i8, offset: i8 },
    Print,
    Read,
    /// Move the cursor by `step` until it lands on a zero cell.
    Seek(i32),
    /// `[-]`
    ClearCell,
    /// Add the current cell to the cell at the offset, then zero the current cell.
    TransferAdd(i8),
    /// Subtract the current cell from the cell at the offset, then zero the current cell.
    TransferSub(i8),
    /// `c2 += c0 * c1`, using `c3` as scratch.
    Multiply,
    /// `c2 *= c1 ^ c0`, using `c3` and `c4` as scratch.
    Exponent,
    /// `c3 = c0 / c1` and `c2 = c0 % c1`, using `c2..c4` as scratch.
    Divide,
    /// For each `(offset, weight)`, add `weight * current cell` to the cell at that offset. Then
    /// zero the current cell.
    WeightedTransfer(Vec<(i8, i8)>),
    Loop(Vec<Instruction>),
    Block(Vec<Instruction>),
}

// Implementation

impl Program {
    /// Moves instructions into the program 👍🏼
    pub fn new(body: Vec<Instruction>) -> Self {
        Program { body }
    }

    /// Return a borrowed view into all top-level instructions.
    pub fn instructions(&self) -> &[Instruction] {
        &self.body
    }

    /// Counts every instruction in the tree, including loops and blocks themselves.
    pub fn len(&self) -> usize {
        count(&self.body)
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

impl Instruction {
    /// Whether this instruction is one of the non-iterating replacements for a loop.
    pub fn is_closed_form(&self) -> bool {
        use Instruction::*;
        matches!(
            self,
            ClearCell
                | TransferAdd(_)
                | TransferSub(_)
                | Multiply
                | Exponent
                | Divide
                | WeightedTransfer(_)
        )
    }

    /// The body of a loop or a block.
    pub fn body(&self) -> Option<&[Instruction]> {
        match self {
            Instruction::Loop(body) | Instruction::Block(body) => Some(body),
            _ => None,
        }
    }
}

fn count(instructions: &[Instruction]) -> usize {
    instructions
        .iter()
        .map(|instr| 1 + instr.body().map(count).unwrap_or(0))
        .sum()
}

/// Prints the IR in a pseudo-assembly format; nested bodies are indented.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_body(f, &self.body, 0)
    }
}

fn write_body(f: &mut fmt::Formatter, body: &[Instruction], depth: usize) -> fmt::Result {
    for instr in body {
        writeln!(f, "{:width$}{}", "", instr, width = depth * 4)?;
        if let Some(inner) = instr.body() {
            write_body(f, inner, depth + 1)?;
            writeln!(f, "{:width$}end", "", width = depth * 4)?;
        }
    }
    Ok(())
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Instruction::*;
        match self {
            MoveBy(amount) => write!(f, "p <- p + #{}", amount),
            AddBy { delta, offset } => write!(f, "[p{:+}] <- [p{:+}] + #{}", offset, offset, delta),
            Print => write!(f, "putchar [p]"),
            Read => write!(f, "getchar [p]"),
            Seek(step) => write!(f, "seek #{}", step),
            ClearCell => write!(f, "zro"),
            TransferAdd(to) => write!(f, "[p{:+}] <- [p{:+}] + [p]; zro", to, to),
            TransferSub(to) => write!(f, "[p{:+}] <- [p{:+}] - [p]; zro", to, to),
            Multiply => write!(f, "mul"),
            Exponent => write!(f, "pow"),
            Divide => write!(f, "div"),
            WeightedTransfer(entries) => {
                write!(f, "wtr")?;
                for (offset, weight) in entries {
                    write!(f, " [p{:+}]*{}", offset, weight)?;
                }
                Ok(())
            }
            Loop(_) => write!(f, "loop"),
            Block(_) => write!(f, "block"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Instruction::*;

    #[test]
    fn counts_nested_instructions() {
        let program = Program::new(vec![
            AddBy {
                delta: 3,
                offset: 0,
            },
            Loop(vec![MoveBy(1), Loop(vec![ClearCell]), MoveBy(-1)]),
            Print,
        ]);

        assert_eq!(program.len(), 7);
        assert!(!program.is_empty());
    }

    #[test]
    fn dump_indents_loop_bodies() {
        let program = Program::new(vec![Loop(vec![MoveBy(2)]), Print]);
        let dump = program.to_string();

        assert_eq!(dump, "loop\n    p <- p + #2\nend\nputchar [p]\n");
    }

    #[test]
    fn closed_forms() {
        assert!(ClearCell.is_closed_form());
        assert!(WeightedTransfer(vec![(1, 2)]).is_closed_form());
        assert!(!Seek(1).is_closed_form());
        assert!(!Loop(vec![]).is_closed_form());
    }
}
