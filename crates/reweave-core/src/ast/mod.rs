//! Original syntax tree: node kinds, the immutable arena and its builder

mod kind;
mod tree;

pub use kind::{Cardinality, Delimiter, ListRole, NodeKind, Property, Slot, SlotSpec};
pub use tree::{
    Child, NodeId, NodeSpec, PropertyToken, SyntaxNode, SyntaxTree, TextRange, TreeBuilder, TreeId,
};
