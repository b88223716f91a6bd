#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
)]
#![allow(clippy::must_use_candidate)]

pub mod client;
pub mod program;
pub mod render;
pub mod runtime;

pub use crate::client::serialize;
pub use crate::program::*;
pub use crate::render::{
    render, DependencyRecord, RenderError, RenderErrorCode, RenderOptions, Rendered,
};
