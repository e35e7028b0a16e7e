//! Rill compiler library
//!
//! A front-end (lexer, recursive-descent parser with embedded semantic
//! analysis) for the rill toy language, plus a miniature optimizer over a
//! basic-block IR (loop unrolling and local redundancy elimination).

pub mod frontend;
pub mod middle;

pub use frontend::error::{Result, SyntaxError};
