//! reweave-core: format-preserving structural rewriting
//!
//! This crate provides:
//! - `SyntaxTree`: an immutable arena of parsed nodes with byte ranges
//! - `RewriteState`: a session recording structural edits against a tree
//! - `Placeholder`: copy, move and literal stand-ins for nodes
//! - `plan()`: list edit planning into retain/delete/insert scripts
//! - `generate()`: minimal, non-overlapping text edits for a session
//! - `apply_edits()`: a checking applier for those edits
//!
//! Everything a session does not touch keeps its original text, including
//! whitespace and comments.

pub mod ast;
pub mod config;
mod edit;
mod error;
pub mod format;
mod generate;
mod placeholder;
mod planner;
pub mod rewrite;
mod synthetic;

#[cfg(test)]
mod testing;

pub use ast::{
    Cardinality, Child, Delimiter, ListRole, NodeId, NodeKind, NodeSpec, Property, PropertyToken,
    Slot, SlotSpec, SyntaxNode, SyntaxTree, TextRange, TreeBuilder, TreeId,
};
pub use config::{ConfigError, FormatOptions};
pub use edit::{apply_edits, ApplyError, TextEdit};
pub use error::{Result, RewriteError, TreeError};
pub use format::{Formatter, IndentFormatter};
pub use generate::generate;
pub use placeholder::Placeholder;
pub use planner::{plan, EditScript, ListOp, ListRegion};
pub use rewrite::{
    open, EditEvent, ListRewrite, PropertyDelta, PropertyDeltas, RewriteState, Wrapping,
};
pub use synthetic::{FreshChild, FreshNode, NodeHandle, SessionId, SyntheticId};
