//! Immutable syntax tree arena and its builder
//!
//! Parsers push nodes bottom-up through [`TreeBuilder`]; the finished
//! [`SyntaxTree`] is never mutated again. Parent links live in a side
//! index instead of on the nodes.

use std::fmt;
use std::ops::{Index, Range};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use super::kind::{Cardinality, NodeKind, Property, Slot};
use crate::error::TreeError;

static NEXT_TREE_ID: AtomicU32 = AtomicU32::new(1);

/// Process-unique identity of a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeId(u32);

impl TreeId {
    fn next() -> Self {
        TreeId(NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Stable identity of an original node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    tree: TreeId,
    index: u32,
}

impl NodeId {
    pub fn tree(self) -> TreeId {
        self.tree
    }

    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tree, self.index)
    }
}

/// Half-open byte range `[start, end)` into the source buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "inverted range {start}..{end}");
        Self { start, end }
    }

    /// Zero-length range at `offset`
    pub fn empty(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains_range(&self, other: TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl From<Range<usize>> for TextRange {
    fn from(range: Range<usize>) -> Self {
        TextRange::new(range.start, range.end)
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Content of one child slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    Single(Option<NodeId>),
    List(Vec<NodeId>),
}

/// A property value together with the range of its token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyToken {
    pub text: String,
    pub range: TextRange,
}

/// One node of the original tree
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    kind: NodeKind,
    range: TextRange,
    children: Vec<(Slot, Child)>,
    properties: Vec<(Property, PropertyToken)>,
}

impl SyntaxNode {
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    /// Child in a singular slot
    pub fn child(&self, slot: Slot) -> Option<NodeId> {
        self.children.iter().find_map(|(s, child)| match child {
            Child::Single(id) if *s == slot => *id,
            _ => None,
        })
    }

    /// Elements of a list slot; empty for unknown slots
    pub fn list(&self, slot: Slot) -> &[NodeId] {
        self.children
            .iter()
            .find_map(|(s, child)| match child {
                Child::List(ids) if *s == slot => Some(ids.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn slots(&self) -> &[(Slot, Child)] {
        &self.children
    }

    pub fn property(&self, property: Property) -> Option<&PropertyToken> {
        self.properties
            .iter()
            .find_map(|(p, token)| (*p == property).then_some(token))
    }

    /// All children in source order
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().flat_map(|(_, child)| match child {
            Child::Single(id) => id.iter().copied().collect::<Vec<_>>(),
            Child::List(ids) => ids.clone(),
        })
    }
}

/// Immutable parsed tree over a source buffer
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    id: TreeId,
    source: Arc<str>,
    nodes: Vec<SyntaxNode>,
    parents: Vec<Option<(NodeId, Slot)>>,
    root: NodeId,
}

impl SyntaxTree {
    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` names a node of this tree
    pub fn contains(&self, id: NodeId) -> bool {
        id.tree == self.id && id.index() < self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&SyntaxNode> {
        if self.contains(id) {
            Some(&self.nodes[id.index()])
        } else {
            None
        }
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self[id].kind
    }

    pub fn range(&self, id: NodeId) -> TextRange {
        self[id].range
    }

    /// Original source text of a node
    pub fn text(&self, id: NodeId) -> &str {
        let range = self[id].range;
        &self.source[range.start..range.end]
    }

    /// Parent node and the slot holding `id`
    pub fn parent(&self, id: NodeId) -> Option<(NodeId, Slot)> {
        self.parents[id.index()]
    }

    /// Whether the slot holding `id` is list-valued
    pub fn in_list(&self, id: NodeId) -> bool {
        self.parent(id).is_some_and(|(parent, slot)| {
            self.kind(parent)
                .slot_spec(slot)
                .is_some_and(|spec| spec.cardinality == Cardinality::List)
        })
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id).map(|(parent, _)| parent);
        }
        false
    }

    /// Ancestors of `id`, nearest first
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id).map(|(p, _)| p), move |&p| {
            self.parent(p).map(|(parent, _)| parent)
        })
    }
}

impl Index<NodeId> for SyntaxTree {
    type Output = SyntaxNode;

    fn index(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.index()]
    }
}

/// Description of a node handed to [`TreeBuilder::push`]
#[derive(Debug, Clone)]
pub struct NodeSpec {
    kind: NodeKind,
    range: TextRange,
    children: Vec<(Slot, Child)>,
    properties: Vec<(Property, PropertyToken)>,
}

impl NodeSpec {
    pub fn new(kind: NodeKind, range: impl Into<TextRange>) -> Self {
        Self {
            kind,
            range: range.into(),
            children: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn child(self, slot: Slot, id: NodeId) -> Self {
        self.optional(slot, Some(id))
    }

    pub fn optional(mut self, slot: Slot, id: Option<NodeId>) -> Self {
        self.children.push((slot, Child::Single(id)));
        self
    }

    pub fn list(mut self, slot: Slot, ids: Vec<NodeId>) -> Self {
        self.children.push((slot, Child::List(ids)));
        self
    }

    pub fn property(
        mut self,
        property: Property,
        text: impl Into<String>,
        range: impl Into<TextRange>,
    ) -> Self {
        self.properties.push((
            property,
            PropertyToken {
                text: text.into(),
                range: range.into(),
            },
        ));
        self
    }
}

/// Bottom-up builder used by parsers
#[derive(Debug)]
pub struct TreeBuilder {
    id: TreeId,
    source: Arc<str>,
    nodes: Vec<SyntaxNode>,
    parents: Vec<Option<(NodeId, Slot)>>,
}

impl TreeBuilder {
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        Self {
            id: TreeId::next(),
            source: source.into(),
            nodes: Vec::new(),
            parents: Vec::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Range of an already pushed node
    pub fn range(&self, id: NodeId) -> Option<TextRange> {
        self.lookup(id).map(|node| node.range)
    }

    fn lookup(&self, id: NodeId) -> Option<&SyntaxNode> {
        (id.tree == self.id).then(|| self.nodes.get(id.index())).flatten()
    }

    /// Adds a node whose children were pushed before it
    pub fn push(&mut self, spec: NodeSpec) -> Result<NodeId, TreeError> {
        let NodeSpec {
            kind,
            range,
            children,
            mut properties,
        } = spec;

        self.check_range(range)?;

        for (property, token) in &properties {
            if !kind.has_property(*property) {
                return Err(TreeError::UnknownProperty {
                    kind,
                    property: *property,
                });
            }
            self.check_range(token.range)?;
        }
        for &property in kind.properties() {
            if properties.iter().any(|(p, _)| *p == property) {
                continue;
            }
            if property != Property::Modifiers {
                return Err(TreeError::MissingProperty { kind, property });
            }
            // Absent modifiers are an empty token at the node start.
            properties.push((
                property,
                PropertyToken {
                    text: String::new(),
                    range: TextRange::empty(range.start),
                },
            ));
        }

        for (slot, _) in &children {
            if kind.slot_spec(*slot).is_none() {
                return Err(TreeError::UnknownSlot { kind, slot: *slot });
            }
        }

        // Normalise to schema order, one entry per slot.
        let mut ordered = Vec::with_capacity(kind.slots().len());
        for spec in kind.slots() {
            let given = children
                .iter()
                .find(|(slot, _)| *slot == spec.slot)
                .map(|(_, child)| child.clone());
            let child = match (spec.cardinality, given) {
                (Cardinality::List, Some(Child::List(ids))) => Child::List(ids),
                (Cardinality::List, None) => Child::List(Vec::new()),
                (Cardinality::List, Some(Child::Single(_))) => {
                    return Err(TreeError::SlotCardinality {
                        kind,
                        slot: spec.slot,
                        expected: "a list",
                    })
                }
                (_, Some(Child::List(_))) => {
                    return Err(TreeError::SlotCardinality {
                        kind,
                        slot: spec.slot,
                        expected: "a single node",
                    })
                }
                (Cardinality::Required, Some(Child::Single(None)) | None) => {
                    return Err(TreeError::MissingSlot {
                        kind,
                        slot: spec.slot,
                    })
                }
                (_, Some(Child::Single(id))) => Child::Single(id),
                (Cardinality::Optional, None) => Child::Single(None),
            };
            ordered.push((spec.slot, child));
        }

        for (slot, child) in &ordered {
            let ids = match child {
                Child::Single(id) => id.iter().copied().collect::<Vec<_>>(),
                Child::List(ids) => ids.clone(),
            };
            let mut last_end = None;
            for id in ids {
                let child_range = self.lookup(id).ok_or(TreeError::UnknownNode(id))?.range;
                if self.parents[id.index()].is_some() {
                    return Err(TreeError::AlreadyAttached(id));
                }
                if !range.contains_range(child_range) {
                    return Err(TreeError::ChildOutsideParent {
                        child: id,
                        parent: range,
                    });
                }
                if last_end.is_some_and(|end| child_range.start < end) {
                    return Err(TreeError::UnorderedList { kind, slot: *slot });
                }
                last_end = Some(child_range.end);
            }
        }

        let id = NodeId {
            tree: self.id,
            index: self.nodes.len() as u32,
        };
        for (slot, child) in &ordered {
            let ids = match child {
                Child::Single(child) => child.iter().copied().collect::<Vec<_>>(),
                Child::List(ids) => ids.clone(),
            };
            for child in ids {
                self.parents[child.index()] = Some((id, *slot));
            }
        }
        self.nodes.push(SyntaxNode {
            kind,
            range,
            children: ordered,
            properties,
        });
        self.parents.push(None);
        Ok(id)
    }

    /// Seals the tree with `root` as its top node
    pub fn finish(self, root: NodeId) -> Result<SyntaxTree, TreeError> {
        if self.lookup(root).is_none() {
            return Err(TreeError::UnknownNode(root));
        }
        if self.parents[root.index()].is_some() {
            return Err(TreeError::RootHasParent(root));
        }
        Ok(SyntaxTree {
            id: self.id,
            source: self.source,
            nodes: self.nodes,
            parents: self.parents,
            root,
        })
    }

    fn check_range(&self, range: TextRange) -> Result<(), TreeError> {
        let len = self.source.len();
        if range.start > range.end
            || range.end > len
            || !self.source.is_char_boundary(range.start)
            || !self.source.is_char_boundary(range.end)
        {
            return Err(TreeError::RangeOutOfBounds {
                start: range.start,
                end: range.end,
                len,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(builder: &mut TreeBuilder, text: &str, start: usize) -> NodeId {
        let range = start..start + text.len();
        builder
            .push(
                NodeSpec::new(NodeKind::SimpleName, range.clone())
                    .property(Property::Identifier, text, range),
            )
            .unwrap()
    }

    #[test]
    fn test_build_field_access() {
        let mut builder = TreeBuilder::new("a.b");
        let a = name(&mut builder, "a", 0);
        let b = name(&mut builder, "b", 2);
        let access = builder
            .push(
                NodeSpec::new(NodeKind::FieldAccess, 0..3)
                    .child(Slot::Expression, a)
                    .child(Slot::Name, b),
            )
            .unwrap();
        let tree = builder.finish(access).unwrap();

        assert_eq!(tree.root(), access);
        assert_eq!(tree.text(b), "b");
        assert_eq!(tree.parent(a), Some((access, Slot::Expression)));
        assert_eq!(tree[access].child(Slot::Name), Some(b));
        assert!(tree.is_ancestor_or_self(access, b));
        assert_eq!(tree.ancestors(b).collect::<Vec<_>>(), vec![access]);
    }

    #[test]
    fn test_missing_required_slot() {
        let mut builder = TreeBuilder::new("a.");
        let a = name(&mut builder, "a", 0);
        let err = builder
            .push(NodeSpec::new(NodeKind::FieldAccess, 0..2).child(Slot::Expression, a))
            .unwrap_err();
        assert_eq!(
            err,
            TreeError::MissingSlot {
                kind: NodeKind::FieldAccess,
                slot: Slot::Name
            }
        );
    }

    #[test]
    fn test_child_attached_twice() {
        let mut builder = TreeBuilder::new("a");
        let a = name(&mut builder, "a", 0);
        builder
            .push(NodeSpec::new(NodeKind::ParenthesizedExpression, 0..1).child(Slot::Expression, a))
            .unwrap();
        let err = builder
            .push(NodeSpec::new(NodeKind::ParenthesizedExpression, 0..1).child(Slot::Expression, a))
            .unwrap_err();
        assert_eq!(err, TreeError::AlreadyAttached(a));
    }

    #[test]
    fn test_range_out_of_bounds() {
        let mut builder = TreeBuilder::new("ab");
        let err = builder
            .push(NodeSpec::new(NodeKind::NullLiteral, 0..5))
            .unwrap_err();
        assert!(matches!(err, TreeError::RangeOutOfBounds { len: 2, .. }));
    }

    #[test]
    fn test_modifiers_default_to_empty_token() {
        let mut builder = TreeBuilder::new("int x");
        let ty = builder
            .push(NodeSpec::new(NodeKind::PrimitiveType, 0..3).property(Property::Token, "int", 0..3))
            .unwrap();
        let x = name(&mut builder, "x", 4);
        let decl = builder
            .push(
                NodeSpec::new(NodeKind::SingleVariableDeclaration, 0..5)
                    .child(Slot::Type, ty)
                    .child(Slot::Name, x),
            )
            .unwrap();
        let tree = builder.finish(decl).unwrap();

        let modifiers = tree[decl].property(Property::Modifiers).unwrap();
        assert_eq!(modifiers.text, "");
        assert_eq!(modifiers.range, TextRange::empty(0));
        assert!(tree[ty].property(Property::Modifiers).is_none());
    }

    #[test]
    fn test_missing_identifier_is_rejected() {
        let mut builder = TreeBuilder::new("x");
        let err = builder
            .push(NodeSpec::new(NodeKind::SimpleName, 0..1))
            .unwrap_err();
        assert_eq!(
            err,
            TreeError::MissingProperty {
                kind: NodeKind::SimpleName,
                property: Property::Identifier
            }
        );
    }

    #[test]
    fn test_nodes_from_other_trees_are_not_contained() {
        let mut first = TreeBuilder::new("a");
        let a = name(&mut first, "a", 0);
        let first = first.finish(a).unwrap();

        let mut second = TreeBuilder::new("b");
        let b = name(&mut second, "b", 0);
        let second = second.finish(b).unwrap();

        assert!(first.contains(a));
        assert!(!first.contains(b));
        assert!(second.node(a).is_none());
    }
}
