#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
)]
#![allow(clippy::must_use_candidate)]

mod attrs;
pub mod interpolation;
mod lexer;
pub mod scan;

pub use lexer::*;
