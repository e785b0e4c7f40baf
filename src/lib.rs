//! BareBones: natural-number variables, `incr`/`decr`/`clear`, `while x not 0 do`
//! loops and procedures with by-reference arguments.
//!
//! A program is parsed once into a [`Program`] arena. The [`Interpreter`]
//! executes it, optionally under an interactive [`Debugger`], and the
//! [`emit`] backends translate it to BareBones, Python, Java, Rust and C++.

pub mod ast;
pub mod debugger;
pub mod emit;
pub mod errors;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod variable;

pub use ast::{Block, BlockId, BlockKind, Call, Command, Comments, Program};
pub use debugger::{ConsoleCommand, Debugger};
pub use emit::{backends, write_all, write_artifact, Backend};
pub use errors::{EmitError, ParseError, RunError};
pub use interpreter::Interpreter;
pub use parser::parse;
pub use variable::{Natural, Variable, MAX_VALUE};
