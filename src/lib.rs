//! TrashShell, a small interactive command-line shell.
//!
//! A line goes through a fixed series of steps:
//! 1. `$NAME` references are expanded textually ([`expand`]).
//! 2. The result is split into quote-aware tokens ([`lexer`]) and grouped into
//!    segments joined by `;`, `&&` and `||` ([`parser`]).
//! 3. The segments run left to right, each gated by the operator in front of
//!    it ([`evaluator`]).
//! 4. A segment is an assignment, a builtin, an external program, or a
//!    pipeline of external programs.
//!
//! The main entry point is [`Interpreter`]; [`repl`] wraps it in an
//! interactive loop.

mod builtin;
pub mod command;
pub mod env;
pub mod error;
pub mod evaluator;
pub mod expand;
mod external;
mod interpreter;
pub mod lexer;
pub mod parser;
mod pipeline;
pub mod repl;
pub mod signals;

pub use command::{ExitCode, Outcome, Output};
pub use interpreter::Interpreter;
