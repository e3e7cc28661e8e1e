//! Parse errors

use reweave_core::TreeError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected character at {offset}")]
    UnexpectedChar { offset: usize },

    #[error("expected {expected} at {offset}, found {found}")]
    UnexpectedToken {
        offset: usize,
        expected: String,
        found: String,
    },

    #[error("unexpected end of input: expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("parser built an invalid tree: {0}")]
    Tree(#[from] TreeError),
}

impl ParseError {
    /// Byte offset the error points at, if any
    pub fn offset(&self) -> Option<usize> {
        match self {
            ParseError::UnexpectedChar { offset } | ParseError::UnexpectedToken { offset, .. } => {
                Some(*offset)
            }
            ParseError::UnexpectedEof { .. } | ParseError::Tree(_) => None,
        }
    }
}
