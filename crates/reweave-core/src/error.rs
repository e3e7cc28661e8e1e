//! Error types of the rewriting engine

use thiserror::Error;

use crate::ast::{NodeId, NodeKind, Property, Slot};
use crate::synthetic::NodeHandle;

/// Misuse of a rewrite session
///
/// These are programming errors of the caller: the session refuses the
/// offending call and is left as it was before it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    #[error("invalid edit on {node}: {reason}")]
    InvalidEditState { node: NodeHandle, reason: String },

    #[error("{node} does not belong to this session")]
    ForeignNode { node: NodeHandle },

    #[error("malformed placeholder: {reason}")]
    MalformedPlaceholder { reason: String },

    #[error("malformed {kind} node: {reason}")]
    MalformedNode { kind: NodeKind, reason: String },

    #[error("node {node} is moved into its own subtree")]
    CyclicMove { node: NodeId },

    #[error("generated edits overlap at offset {offset}")]
    OverlappingEdits { offset: usize },
}

impl RewriteError {
    pub(crate) fn invalid(node: impl Into<NodeHandle>, reason: impl Into<String>) -> Self {
        RewriteError::InvalidEditState {
            node: node.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn placeholder(reason: impl Into<String>) -> Self {
        RewriteError::MalformedPlaceholder {
            reason: reason.into(),
        }
    }
}

/// Rejected tree construction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("range {start}..{end} out of bounds for source length {len}")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },

    #[error("child {child} lies outside its parent range {parent}")]
    ChildOutsideParent {
        child: NodeId,
        parent: crate::ast::TextRange,
    },

    #[error("node {0} is already attached to a parent")]
    AlreadyAttached(NodeId),

    #[error("node {0} was not pushed to this builder")]
    UnknownNode(NodeId),

    #[error("{kind} has no slot {slot:?}")]
    UnknownSlot { kind: NodeKind, slot: Slot },

    #[error("{kind} slot {slot:?} expects {expected}")]
    SlotCardinality {
        kind: NodeKind,
        slot: Slot,
        expected: &'static str,
    },

    #[error("{kind} is missing required slot {slot:?}")]
    MissingSlot { kind: NodeKind, slot: Slot },

    #[error("{kind} list {slot:?} is not in source order")]
    UnorderedList { kind: NodeKind, slot: Slot },

    #[error("{kind} has no property {property:?}")]
    UnknownProperty { kind: NodeKind, property: Property },

    #[error("{kind} is missing property {property:?}")]
    MissingProperty { kind: NodeKind, property: Property },

    #[error("root {0} has a parent")]
    RootHasParent(NodeId),
}

pub type Result<T, E = RewriteError> = std::result::Result<T, E>;
