//! Brainyuck internals.
//!
//! The compiler has the following architecture:
//!
//!  - source code is scanned into run-length encoded tokens with matched brackets ([parsing]);
//!  - the tokens are translated into a tree of [Instruction]s, the **i**nternal
//!    **r**epresentation ([ir]). While translating, each loop is looked up in a small catalogue
//!    of known idioms ([idioms]), then statically analysed ([optimize]); loops that are simple
//!    enough are replaced by a closed form that does not iterate at all;
//!  - the tree can then be either: _interpreted_ directly against a tape ([interpreter]) or;
//!    lowered to C ([codegen]), which an ordinary C compiler turns into a native executable.
//!
//! Both backends consume exactly the same tree, and must agree on the output of every program.

pub mod codegen;
pub mod errors;
pub mod idioms;
pub mod interpreter;
pub mod ir;
pub mod optimize;
pub mod parsing;
pub mod tape;
pub mod translate;

pub use crate::codegen::generate;
pub use crate::errors::{ExecutionError, TranslationError};
pub use crate::interpreter::{run, run_with_stdio, Interpreter};
pub use crate::ir::{Instruction, Program};
pub use crate::parsing::scan;
pub use crate::tape::{Stats, TapeMachine, TAPE_LEN};
pub use crate::translate::{translate, translate_with, Optimizations};
