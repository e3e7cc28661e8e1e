//! Stand-ins for nodes whose text is taken from elsewhere

use crate::ast::{NodeId, NodeKind, SyntaxTree};

/// A placeholder resolved to text at generation time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    /// Verbatim source text of `source`, captured when the copy was made
    Copy { source: NodeId, text: String },
    /// Source text of `source` with its pending edits; erases the original
    Move { source: NodeId },
    /// Caller supplied text, laid out by the formatter
    Literal { text: String, kind: NodeKind },
}

impl Placeholder {
    /// Kind of the node this placeholder stands for
    pub fn kind_hint(&self, tree: &SyntaxTree) -> NodeKind {
        match self {
            Placeholder::Copy { source, .. } | Placeholder::Move { source } => tree.kind(*source),
            Placeholder::Literal { kind, .. } => *kind,
        }
    }
}
