//! reweave-syntax: a reference front end for reweave
//!
//! Parses a small Java-like statement language (statements, method
//! declarations, expressions) into a `reweave_core::SyntaxTree` so the
//! rewriting engine can run against real source text.

mod error;
mod lexer;
mod parser;

pub use error::ParseError;
pub use lexer::{lex, Spanned, Token};
pub use parser::parse;
