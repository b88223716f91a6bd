#![warn(clippy::all)]

pub mod ast;
pub mod tags;
pub mod token;
pub mod visitor;
