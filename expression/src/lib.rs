#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

//! The small expression language embedded in templates: conditions,
//! iterables, interpolations and attribute values.

pub mod ast;
mod eval;
mod lexer;
mod parser;
pub mod precedence;
mod reader;
pub mod token;
pub mod value;
pub mod visitor;

pub use crate::eval::{EvalError, Evaluator, Interpreter, Scope};
pub use crate::lexer::Lexer;
pub use crate::parser::{parse, Parser};
pub use crate::visitor::{free_identifiers, is_global};
