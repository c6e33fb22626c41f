//! A small, literal catalogue of well-known source fragments.
//!
//! Some idioms multiply two cells whose values are only known at runtime, so no amount of static
//! delta counting in [crate::optimize] can find them. These are matched textually instead, before
//! the loop classifier ever sees them.

use crate::ir::Instruction;

/// Fragments that make up the *whole* body of a loop (the text between `[` and `]`).
const LOOP_BODIES: &[(&[u8], Idiom)] = &[
    (b"-", Idiom::ClearCell),
    (b"+", Idiom::ClearCell),
    (b"->+<", Idiom::TransferAdd(1)),
    (b">+<-", Idiom::TransferAdd(1)),
    (b"-<+>", Idiom::TransferAdd(-1)),
    (b"<+>-", Idiom::TransferAdd(-1)),
    (b"->-<", Idiom::TransferSub(1)),
    (b">-<-", Idiom::TransferSub(1)),
    (b"-<->", Idiom::TransferSub(-1)),
    (b"<->-", Idiom::TransferSub(-1)),
    (b"->+>+<<", Idiom::Copy),
    (b">[>+>+<<-]>>[<<+>>-]<<<-", Idiom::Multiply),
    (
        b">>[>+<-]>[<<[>+>>+<<<-]>>>[<<<+>>>-]<-]<<<-",
        Idiom::Exponent,
    ),
    (b"->-[>+>>]>[+[-<+>]>+>>]<<<<<", Idiom::Divide),
];

/// Fragments that may appear anywhere in a sequence of instructions.
const SEQUENCES: &[(&[u8], Idiom)] = &[(b">[-<->]<", Idiom::SubtractRightNeighbour)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Idiom {
    ClearCell,
    TransferAdd(i8),
    TransferSub(i8),
    Copy,
    Multiply,
    Exponent,
    Divide,
    SubtractRightNeighbour,
}

/// Looks up the body of a loop in the catalogue.
pub fn match_loop_body(body: &[u8]) -> Option<Instruction> {
    LOOP_BODIES
        .iter()
        .find(|(fragment, _)| *fragment == body)
        .map(|&(_, idiom)| idiom.instruction())
}

/// Looks for a catalogued fragment at the very start of `code`.
///
/// Returns the length of the matched fragment and its replacement.
pub fn match_sequence(code: &[u8]) -> Option<(usize, Instruction)> {
    SEQUENCES
        .iter()
        .find(|(fragment, _)| code.starts_with(fragment))
        .map(|&(fragment, idiom)| (fragment.len(), idiom.instruction()))
}

impl Idiom {
    fn instruction(self) -> Instruction {
        use Instruction::*;
        match self {
            Idiom::ClearCell => ClearCell,
            Idiom::TransferAdd(to) => TransferAdd(to),
            Idiom::TransferSub(to) => TransferSub(to),
            Idiom::Copy => WeightedTransfer(vec![(1, 1), (2, 1)]),
            Idiom::Multiply => Multiply,
            Idiom::Exponent => Exponent,
            Idiom::Divide => Divide,
            Idiom::SubtractRightNeighbour => Block(vec![MoveBy(1), TransferSub(-1), MoveBy(-1)]),
        }
    }
}
