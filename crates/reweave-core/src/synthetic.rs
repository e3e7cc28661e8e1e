//! Handles for nodes that can be attached by a rewrite session
//!
//! Original nodes are addressed by [`NodeId`]; nodes synthesized during a
//! session (fresh nodes and placeholders) live in that session's arena
//! and are addressed by [`SyntheticId`].

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::ast::{NodeId, NodeKind, Property, Slot};

static NEXT_SESSION_ID: AtomicU32 = AtomicU32::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u32);

impl SessionId {
    pub(crate) fn next() -> Self {
        SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Identity of a node owned by one rewrite session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyntheticId {
    session: SessionId,
    index: u32,
}

impl SyntheticId {
    pub(crate) fn new(session: SessionId, index: usize) -> Self {
        Self {
            session,
            index: index as u32,
        }
    }

    pub fn session(self) -> SessionId {
        self.session
    }

    pub(crate) fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for SyntheticId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.session, self.index)
    }
}

/// Anything that can stand where a node is expected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeHandle {
    Original(NodeId),
    Synthetic(SyntheticId),
}

impl NodeHandle {
    pub fn original(self) -> Option<NodeId> {
        match self {
            NodeHandle::Original(id) => Some(id),
            NodeHandle::Synthetic(_) => None,
        }
    }
}

impl From<NodeId> for NodeHandle {
    fn from(id: NodeId) -> Self {
        NodeHandle::Original(id)
    }
}

impl From<SyntheticId> for NodeHandle {
    fn from(id: SyntheticId) -> Self {
        NodeHandle::Synthetic(id)
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeHandle::Original(id) => write!(f, "node {id}"),
            NodeHandle::Synthetic(id) => write!(f, "synthetic {id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreshChild {
    Single(Option<NodeHandle>),
    List(Vec<NodeHandle>),
}

/// A node built during a session, registered with `RewriteState::create`
///
/// Children are handles: other fresh nodes or placeholders. Original
/// nodes enter a fresh node only through copy or move placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreshNode {
    kind: NodeKind,
    children: Vec<(Slot, FreshChild)>,
    properties: Vec<(Property, String)>,
}

impl FreshNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn name(identifier: impl Into<String>) -> Self {
        Self::new(NodeKind::SimpleName).with_property(Property::Identifier, identifier)
    }

    pub fn number(token: impl Into<String>) -> Self {
        Self::new(NodeKind::NumberLiteral).with_property(Property::Token, token)
    }

    pub fn with_child(mut self, slot: Slot, child: impl Into<NodeHandle>) -> Self {
        self.set_child(slot, FreshChild::Single(Some(child.into())));
        self
    }

    pub fn with_list(mut self, slot: Slot, items: impl IntoIterator<Item = NodeHandle>) -> Self {
        self.set_child(slot, FreshChild::List(items.into_iter().collect()));
        self
    }

    pub fn with_property(mut self, property: Property, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.properties.iter_mut().find(|(p, _)| *p == property) {
            Some((_, existing)) => *existing = value,
            None => self.properties.push((property, value)),
        }
        self
    }

    fn set_child(&mut self, slot: Slot, child: FreshChild) {
        match self.children.iter_mut().find(|(s, _)| *s == slot) {
            Some((_, existing)) => *existing = child,
            None => self.children.push((slot, child)),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn child(&self, slot: Slot) -> Option<NodeHandle> {
        self.children.iter().find_map(|(s, child)| match child {
            FreshChild::Single(handle) if *s == slot => *handle,
            _ => None,
        })
    }

    pub fn list(&self, slot: Slot) -> &[NodeHandle] {
        self.children
            .iter()
            .find_map(|(s, child)| match child {
                FreshChild::List(items) if *s == slot => Some(items.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn property(&self, property: Property) -> Option<&str> {
        self.properties
            .iter()
            .find_map(|(p, value)| (*p == property).then_some(value.as_str()))
    }

    pub fn slots(&self) -> &[(Slot, FreshChild)] {
        &self.children
    }

    pub fn properties(&self) -> &[(Property, String)] {
        &self.properties
    }

    /// All child handles in slot order
    pub fn handles(&self) -> Vec<NodeHandle> {
        self.children
            .iter()
            .flat_map(|(_, child)| match child {
                FreshChild::Single(handle) => handle.iter().copied().collect::<Vec<_>>(),
                FreshChild::List(items) => items.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overwrites_slots() {
        let session = SessionId::next();
        let a = NodeHandle::from(SyntheticId::new(session, 0));
        let b = NodeHandle::from(SyntheticId::new(session, 1));
        let node = FreshNode::new(NodeKind::ParenthesizedExpression)
            .with_child(Slot::Expression, a)
            .with_child(Slot::Expression, b);

        assert_eq!(node.child(Slot::Expression), Some(b));
        assert_eq!(node.handles(), vec![b]);
    }

    #[test]
    fn test_sessions_are_distinct() {
        assert_ne!(SessionId::next(), SessionId::next());
    }
}
