//! Rewrite sessions: the side table of pending structural edits
//!
//! A [`RewriteState`] borrows an immutable [`SyntaxTree`] and records what
//! should happen to it. Nothing is rendered until generation, which
//! consumes the session.

mod event;
mod list;

pub use event::{EditEvent, PropertyDelta, PropertyDeltas, Wrapping};
pub use list::ListRewrite;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::ast::{Cardinality, NodeId, NodeKind, Property, Slot, SyntaxTree};
use crate::error::{Result, RewriteError};
use crate::placeholder::Placeholder;
use crate::synthetic::{FreshChild, FreshNode, NodeHandle, SessionId, SyntheticId};

/// Open a rewrite session over `tree`
pub fn open(tree: &SyntaxTree) -> RewriteState<'_> {
    RewriteState::new(tree)
}

/// Final disposition of an original node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Terminal {
    Removed,
    Replaced(NodeHandle),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct NodeRecord {
    pub(crate) terminal: Option<Terminal>,
    pub(crate) deltas: Vec<PropertyDelta>,
    pub(crate) moved: Option<SyntheticId>,
}

impl NodeRecord {
    /// Whether the node's own text changes in place
    pub(crate) fn is_edited(&self) -> bool {
        self.terminal.is_some() || !self.deltas.is_empty() || self.moved.is_some()
    }

    pub(crate) fn wrapping(&self) -> Option<Wrapping> {
        self.deltas.iter().find_map(|delta| match delta {
            PropertyDelta::Wrapping(wrapping) => Some(*wrapping),
            PropertyDelta::Set { .. } => None,
        })
    }

    pub(crate) fn property(&self, property: Property) -> Option<&str> {
        self.deltas.iter().find_map(|delta| match delta {
            PropertyDelta::Set { property: p, value } if *p == property => Some(value.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Synthetic {
    Fresh(FreshNode),
    Placeholder(Placeholder),
}

#[derive(Debug, Clone)]
pub(crate) struct SyntheticEntry {
    pub(crate) node: Synthetic,
    pub(crate) attached: bool,
}

/// Pending edits of one session
#[derive(Debug)]
pub struct RewriteState<'t> {
    pub(crate) tree: &'t SyntaxTree,
    session: SessionId,
    journal: Vec<EditEvent>,
    pub(crate) records: FxHashMap<NodeId, NodeRecord>,
    /// Live lists of list slots touched by insertions
    pub(crate) lists: FxHashMap<(NodeId, Slot), Vec<NodeHandle>>,
    /// Contents given to originally empty optional slots
    pub(crate) fills: FxHashMap<(NodeId, Slot), NodeHandle>,
    pub(crate) synthetics: Vec<SyntheticEntry>,
}

impl<'t> RewriteState<'t> {
    pub fn new(tree: &'t SyntaxTree) -> Self {
        let session = SessionId::next();
        debug!(tree = %tree.id(), %session, nodes = tree.len(), "opened rewrite session");
        Self {
            tree,
            session,
            journal: Vec::new(),
            records: FxHashMap::default(),
            lists: FxHashMap::default(),
            fills: FxHashMap::default(),
            synthetics: Vec::new(),
        }
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Accepted mutations in call order
    pub fn events(&self) -> &[EditEvent] {
        &self.journal
    }

    // === Mutations ===

    /// Replace an original node by another node or placeholder
    pub fn replace(&mut self, original: NodeId, replacement: impl Into<NodeHandle>) -> Result<()> {
        let replacement = replacement.into();
        self.check_original(original)?;
        self.check_not_final(original)?;
        if self.record(original).is_some_and(|r| !r.deltas.is_empty()) {
            return Err(RewriteError::invalid(original, "node is already modified"));
        }

        if let Some(placeholder) = self.wrapping_move(original, replacement) {
            return self.normalize_wrap(original, replacement, placeholder);
        }
        if let Some(placeholder) = self.unwrapping_move(original, replacement) {
            return self.normalize_unwrap(original, placeholder);
        }

        let location = self.tree.parent(original).map_or(original, |(parent, _)| parent);
        self.check_attachable(replacement, location)?;
        self.mark_attached(replacement);

        trace!(node = %original, replacement = %replacement, "replace");
        self.record_mut(original).terminal = Some(Terminal::Replaced(replacement));
        self.journal.push(EditEvent::Replace {
            node: original,
            replacement,
        });
        Ok(())
    }

    /// Remove an original node from its slot or list
    pub fn remove(&mut self, original: NodeId) -> Result<()> {
        self.check_original(original)?;
        let Some((parent, slot)) = self.tree.parent(original) else {
            return Err(RewriteError::invalid(original, "the root cannot be removed"));
        };
        self.check_not_final(original)?;
        if self.record(original).is_some_and(|r| !r.deltas.is_empty()) {
            return Err(RewriteError::invalid(original, "node is already modified"));
        }
        if self.slot_cardinality(parent, slot) == Some(Cardinality::Required) {
            return Err(RewriteError::invalid(
                original,
                format!(
                    "required slot {slot:?} of {} cannot be emptied, replace it instead",
                    self.tree.kind(parent)
                ),
            ));
        }
        self.check_not_unwrapped(parent)?;

        trace!(node = %original, "remove");
        self.record_mut(original).terminal = Some(Terminal::Removed);
        self.journal.push(EditEvent::Remove { node: original });
        Ok(())
    }

    /// Insert into a list slot at `index` of the current live list
    pub fn insert(
        &mut self,
        parent: NodeId,
        slot: Slot,
        index: usize,
        node: impl Into<NodeHandle>,
    ) -> Result<()> {
        self.list(parent, slot)?.insert_at(index, node)
    }

    /// Edit handle for a list-valued slot
    pub fn list(&mut self, parent: NodeId, slot: Slot) -> Result<ListRewrite<'_, 't>> {
        self.check_original(parent)?;
        match self.slot_cardinality(parent, slot) {
            Some(Cardinality::List) => {}
            Some(_) => {
                return Err(RewriteError::invalid(
                    parent,
                    format!("slot {slot:?} is not a list, use set"),
                ))
            }
            None => {
                return Err(RewriteError::invalid(
                    parent,
                    format!("{} has no slot {slot:?}", self.tree.kind(parent)),
                ))
            }
        }
        Ok(ListRewrite::new(self, parent, slot))
    }

    /// Set the content of a singular slot: replace, clear or fill it
    pub fn set(&mut self, parent: NodeId, slot: Slot, value: Option<NodeHandle>) -> Result<()> {
        self.check_original(parent)?;
        match self.slot_cardinality(parent, slot) {
            Some(Cardinality::List) => {
                return Err(RewriteError::invalid(
                    parent,
                    format!("slot {slot:?} is a list, use list"),
                ))
            }
            Some(_) => {}
            None => {
                return Err(RewriteError::invalid(
                    parent,
                    format!("{} has no slot {slot:?}", self.tree.kind(parent)),
                ))
            }
        }

        match (self.tree[parent].child(slot), value) {
            (Some(child), Some(value)) => self.replace(child, value),
            (Some(child), None) => self.remove(child),
            (None, Some(value)) => {
                self.check_not_final(parent)?;
                if self.fills.contains_key(&(parent, slot)) {
                    return Err(RewriteError::invalid(
                        parent,
                        format!("slot {slot:?} is already filled"),
                    ));
                }
                self.check_attachable(value, parent)?;
                self.mark_attached(value);

                trace!(parent = %parent, ?slot, node = %value, "fill slot");
                self.fills.insert((parent, slot), value);
                self.journal.push(EditEvent::Insert {
                    node: value,
                    parent,
                    slot,
                    index: 0,
                });
                Ok(())
            }
            (None, None) => match self.fills.remove(&(parent, slot)) {
                Some(fill) => {
                    trace!(parent = %parent, ?slot, node = %fill, "clear filled slot");
                    self.detach(fill);
                    Ok(())
                }
                None => Err(RewriteError::invalid(
                    parent,
                    format!("slot {slot:?} is already empty"),
                )),
            },
        }
    }

    /// Record property-level changes of an original node
    pub fn modify(&mut self, node: NodeId, deltas: impl Into<PropertyDeltas>) -> Result<()> {
        let deltas = deltas.into();
        self.check_original(node)?;
        self.check_not_final(node)?;

        let kind = self.tree.kind(node);
        let existing = self.record(node).map(|r| r.deltas.as_slice()).unwrap_or(&[]);
        for (i, delta) in deltas.iter().enumerate() {
            if existing
                .iter()
                .chain(&deltas.0[..i])
                .any(|other| other.same_field(delta))
            {
                return Err(RewriteError::invalid(node, "property is already modified"));
            }
            match delta {
                PropertyDelta::Set { property, value } => {
                    if !kind.has_property(*property) {
                        return Err(RewriteError::invalid(
                            node,
                            format!("{kind} has no property {property:?}"),
                        ));
                    }
                    if *property != Property::Modifiers && value.trim().is_empty() {
                        return Err(RewriteError::invalid(
                            node,
                            format!("property {property:?} cannot be empty"),
                        ));
                    }
                }
                PropertyDelta::Wrapping(wrapping) => self.check_wrapping(node, *wrapping, None)?,
            }
        }

        trace!(node = %node, deltas = deltas.0.len(), "modify");
        self.record_mut(node).deltas.extend(deltas.0.iter().cloned());
        self.journal.push(EditEvent::Modify { node, deltas });
        Ok(())
    }

    /// Surround a single statement with a block
    pub fn wrap_in_block(&mut self, statement: NodeId) -> Result<()> {
        self.modify(statement, PropertyDelta::Wrapping(Wrapping::IntoBlock))
    }

    /// Replace a one-statement block by its statement
    pub fn unwrap_block(&mut self, block: NodeId) -> Result<()> {
        self.modify(block, PropertyDelta::Wrapping(Wrapping::OutOfBlock))
    }

    /// Placeholder with the current source text of `original`
    pub fn create_copy(&mut self, original: NodeId) -> Result<SyntheticId> {
        self.check_original(original)?;
        let text = self.tree.text(original).to_string();
        let id = self.push_synthetic(Synthetic::Placeholder(Placeholder::Copy {
            source: original,
            text,
        }));

        trace!(node = %original, placeholder = %id, "copy");
        self.journal.push(EditEvent::CopySource {
            node: original,
            placeholder: id,
        });
        Ok(id)
    }

    /// Placeholder that carries `original` elsewhere and erases it here
    pub fn create_move(&mut self, original: NodeId) -> Result<SyntheticId> {
        self.check_original(original)?;
        let Some((parent, _)) = self.tree.parent(original) else {
            return Err(RewriteError::invalid(original, "the root cannot be moved"));
        };
        if self.record(original).is_some_and(|r| r.moved.is_some()) {
            return Err(RewriteError::invalid(original, "node is already moved"));
        }
        self.check_not_unwrapped(parent)?;

        let id = self.push_synthetic(Synthetic::Placeholder(Placeholder::Move { source: original }));
        trace!(node = %original, placeholder = %id, "move");
        self.record_mut(original).moved = Some(id);
        self.journal.push(EditEvent::MoveSource {
            node: original,
            placeholder: id,
        });
        Ok(id)
    }

    /// Placeholder for caller supplied text
    pub fn create_placeholder(&mut self, text: impl Into<String>, kind: NodeKind) -> SyntheticId {
        self.push_synthetic(Synthetic::Placeholder(Placeholder::Literal {
            text: text.into(),
            kind,
        }))
    }

    /// Register a freshly built node
    pub fn create(&mut self, node: FreshNode) -> Result<SyntheticId> {
        validate_fresh(&node)?;

        let handles = node.handles();
        let mut seen = FxHashSet::default();
        for handle in &handles {
            if !seen.insert(*handle) {
                return Err(RewriteError::invalid(*handle, "used twice in one node"));
            }
            self.check_unattached(*handle)?;
        }
        for handle in handles {
            self.mark_attached(handle);
        }
        Ok(self.push_synthetic(Synthetic::Fresh(node)))
    }

    // === Queries used by generation ===

    pub(crate) fn record(&self, id: NodeId) -> Option<&NodeRecord> {
        self.records.get(&id)
    }

    pub(crate) fn synthetic(&self, id: SyntheticId) -> &Synthetic {
        &self.synthetics[id.index()].node
    }

    /// Whether the node's original position disappears
    pub(crate) fn is_erased(&self, id: NodeId) -> bool {
        self.record(id).is_some_and(|r| match r.terminal {
            Some(Terminal::Removed) => true,
            Some(Terminal::Replaced(_)) => false,
            None => r.moved.is_some(),
        })
    }

    pub(crate) fn terminal(&self, id: NodeId) -> Option<Terminal> {
        self.record(id).and_then(|r| r.terminal)
    }

    pub(crate) fn wrapping(&self, id: NodeId) -> Option<Wrapping> {
        self.record(id).and_then(NodeRecord::wrapping)
    }

    /// Current list of a list slot, erased originals included
    pub(crate) fn raw_list(&self, parent: NodeId, slot: Slot) -> Vec<NodeHandle> {
        match self.lists.get(&(parent, slot)) {
            Some(live) => live.clone(),
            None => self.tree[parent]
                .list(slot)
                .iter()
                .map(|id| NodeHandle::Original(*id))
                .collect(),
        }
    }

    /// Current list of a list slot as it will be rendered
    pub(crate) fn live_list(&self, parent: NodeId, slot: Slot) -> Vec<NodeHandle> {
        self.raw_list(parent, slot)
            .into_iter()
            .filter(|handle| !matches!(handle, NodeHandle::Original(id) if self.is_erased(*id)))
            .collect()
    }

    /// Kind of the node a handle renders as
    pub(crate) fn handle_kind(&self, handle: NodeHandle) -> NodeKind {
        match handle {
            NodeHandle::Original(id) => match self.terminal(id) {
                Some(Terminal::Replaced(replacement)) => self.handle_kind(replacement),
                _ => self.tree.kind(id),
            },
            NodeHandle::Synthetic(id) => match self.synthetic(id) {
                Synthetic::Fresh(node) => node.kind(),
                Synthetic::Placeholder(placeholder) => placeholder.kind_hint(self.tree),
            },
        }
    }

    // === Internals ===

    fn record_mut(&mut self, id: NodeId) -> &mut NodeRecord {
        self.records.entry(id).or_default()
    }

    fn push_synthetic(&mut self, node: Synthetic) -> SyntheticId {
        let id = SyntheticId::new(self.session, self.synthetics.len());
        self.synthetics.push(SyntheticEntry {
            node,
            attached: false,
        });
        id
    }

    fn slot_cardinality(&self, parent: NodeId, slot: Slot) -> Option<Cardinality> {
        self.tree
            .kind(parent)
            .slot_spec(slot)
            .map(|spec| spec.cardinality)
    }

    pub(crate) fn check_original(&self, id: NodeId) -> Result<()> {
        if self.tree.contains(id) {
            Ok(())
        } else {
            Err(RewriteError::ForeignNode { node: id.into() })
        }
    }

    fn check_synthetic(&self, id: SyntheticId) -> Result<()> {
        if id.session() == self.session && id.index() < self.synthetics.len() {
            Ok(())
        } else {
            Err(RewriteError::ForeignNode { node: id.into() })
        }
    }

    /// Fails when the node already has a removal or replacement
    pub(crate) fn check_not_final(&self, id: NodeId) -> Result<()> {
        match self.terminal(id) {
            Some(Terminal::Removed) => Err(RewriteError::invalid(id, "node is already removed")),
            Some(Terminal::Replaced(_)) => {
                Err(RewriteError::invalid(id, "node is already replaced"))
            }
            None => Ok(()),
        }
    }

    /// Fails when `block` is being unwrapped and so must keep its statement
    pub(crate) fn check_not_unwrapped(&self, block: NodeId) -> Result<()> {
        if self.wrapping(block) == Some(Wrapping::OutOfBlock) {
            return Err(RewriteError::invalid(
                block,
                "the statement of an unwrapped block cannot change position",
            ));
        }
        Ok(())
    }

    fn check_unattached(&self, handle: NodeHandle) -> Result<()> {
        let id = match handle {
            NodeHandle::Original(id) => {
                self.check_original(id)?;
                return Err(RewriteError::invalid(
                    id,
                    "original nodes are already attached, use create_copy or create_move",
                ));
            }
            NodeHandle::Synthetic(id) => id,
        };
        self.check_synthetic(id)?;
        let entry = &self.synthetics[id.index()];
        if entry.attached {
            return Err(match entry.node {
                Synthetic::Placeholder(_) => {
                    RewriteError::placeholder(format!("placeholder {id} is already attached"))
                }
                Synthetic::Fresh(_) => RewriteError::invalid(id, "node is already attached"),
            });
        }
        Ok(())
    }

    /// Checks that `handle` may be attached below the original `location`
    pub(crate) fn check_attachable(&self, handle: NodeHandle, location: NodeId) -> Result<()> {
        self.check_unattached(handle)?;
        for source in self.moved_sources(handle) {
            if self.tree.is_ancestor_or_self(source, location) {
                return Err(RewriteError::CyclicMove { node: source });
            }
        }
        Ok(())
    }

    pub(crate) fn mark_attached(&mut self, handle: NodeHandle) {
        if let NodeHandle::Synthetic(id) = handle {
            self.synthetics[id.index()].attached = true;
        }
    }

    /// Undo the attachment of an inserted node that left the tree again,
    /// together with its journal entry
    pub(crate) fn detach(&mut self, handle: NodeHandle) {
        if let NodeHandle::Synthetic(id) = handle {
            self.synthetics[id.index()].attached = false;
        }
        self.journal
            .retain(|event| !matches!(event, EditEvent::Insert { node, .. } if *node == handle));
    }

    /// Synthetic nodes reachable from a list, a filled slot or a replacement
    pub(crate) fn placed_synthetics(&self) -> FxHashSet<SyntheticId> {
        let replacements = self.records.values().filter_map(|record| match record.terminal {
            Some(Terminal::Replaced(handle)) => Some(handle),
            _ => None,
        });
        let mut stack: Vec<NodeHandle> = self
            .lists
            .values()
            .flatten()
            .copied()
            .chain(self.fills.values().copied())
            .chain(replacements)
            .collect();
        let mut placed = FxHashSet::default();
        while let Some(handle) = stack.pop() {
            let NodeHandle::Synthetic(id) = handle else {
                continue;
            };
            if !placed.insert(id) {
                continue;
            }
            if let Synthetic::Fresh(node) = self.synthetic(id) {
                stack.extend(node.handles());
            }
        }
        placed
    }

    /// Sources of all move placeholders reachable from `handle`
    fn moved_sources(&self, handle: NodeHandle) -> Vec<NodeId> {
        let mut sources = Vec::new();
        let mut stack = vec![handle];
        while let Some(handle) = stack.pop() {
            let NodeHandle::Synthetic(id) = handle else {
                continue;
            };
            match self.synthetic(id) {
                Synthetic::Fresh(node) => stack.extend(node.handles()),
                Synthetic::Placeholder(Placeholder::Move { source }) => sources.push(*source),
                Synthetic::Placeholder(_) => {}
            }
        }
        sources
    }

    fn check_wrapping(
        &self,
        node: NodeId,
        wrapping: Wrapping,
        moving: Option<SyntheticId>,
    ) -> Result<()> {
        let kind = self.tree.kind(node);
        let Some((parent, slot)) = self.tree.parent(node) else {
            return Err(RewriteError::invalid(node, "the root cannot change shape"));
        };
        match wrapping {
            Wrapping::IntoBlock => {
                if !kind.is_statement() || kind.is_label() {
                    return Err(RewriteError::invalid(node, format!("{kind} is not a statement")));
                }
                let statement_slot = matches!(
                    slot,
                    Slot::ThenStatement | Slot::ElseStatement | Slot::Body | Slot::Statements
                );
                if !statement_slot || self.tree.kind(parent) == NodeKind::MethodDeclaration {
                    return Err(RewriteError::invalid(
                        node,
                        format!("slot {slot:?} cannot hold a block"),
                    ));
                }
            }
            Wrapping::OutOfBlock => {
                if kind != NodeKind::Block {
                    return Err(RewriteError::invalid(node, format!("{kind} is not a block")));
                }
                if self.tree.kind(parent) == NodeKind::MethodDeclaration {
                    return Err(RewriteError::invalid(node, "a method body must stay a block"));
                }
                let [statement] = self.tree[node].list(Slot::Statements) else {
                    return Err(RewriteError::invalid(
                        node,
                        "only a block with exactly one statement can be unwrapped",
                    ));
                };
                if self.lists.contains_key(&(node, Slot::Statements)) {
                    return Err(RewriteError::invalid(node, "block statements are being edited"));
                }
                let record = self.record(*statement);
                let moved_elsewhere = record
                    .and_then(|r| r.moved)
                    .is_some_and(|placeholder| Some(placeholder) != moving);
                if record.is_some_and(|r| r.terminal == Some(Terminal::Removed)) || moved_elsewhere
                {
                    return Err(RewriteError::invalid(
                        node,
                        "the statement of the block is no longer in place",
                    ));
                }
            }
        }
        Ok(())
    }

    /// `Block[move(original)]` replacing `original` is a wrap
    fn wrapping_move(&self, original: NodeId, replacement: NodeHandle) -> Option<SyntheticId> {
        let NodeHandle::Synthetic(block) = replacement else {
            return None;
        };
        if self.check_synthetic(block).is_err() || self.synthetics[block.index()].attached {
            return None;
        }
        let Synthetic::Fresh(node) = self.synthetic(block) else {
            return None;
        };
        if node.kind() != NodeKind::Block {
            return None;
        }
        let [NodeHandle::Synthetic(inner)] = node.list(Slot::Statements) else {
            return None;
        };
        match self.synthetic(*inner) {
            Synthetic::Placeholder(Placeholder::Move { source }) if *source == original => {
                Some(*inner)
            }
            _ => None,
        }
    }

    /// `move(only statement)` replacing its block is an unwrap
    fn unwrapping_move(&self, original: NodeId, replacement: NodeHandle) -> Option<SyntheticId> {
        let NodeHandle::Synthetic(placeholder) = replacement else {
            return None;
        };
        if self.check_synthetic(placeholder).is_err()
            || self.synthetics[placeholder.index()].attached
            || self.tree.kind(original) != NodeKind::Block
        {
            return None;
        }
        let [statement] = self.tree[original].list(Slot::Statements) else {
            return None;
        };
        match self.synthetic(placeholder) {
            Synthetic::Placeholder(Placeholder::Move { source }) if source == statement => {
                Some(placeholder)
            }
            _ => None,
        }
    }

    fn normalize_wrap(
        &mut self,
        statement: NodeId,
        block: NodeHandle,
        placeholder: SyntheticId,
    ) -> Result<()> {
        self.check_wrapping(statement, Wrapping::IntoBlock, Some(placeholder))?;
        self.mark_attached(block);
        self.forget_move(statement, placeholder);

        trace!(node = %statement, "replace with block of itself, recorded as wrap");
        let delta = PropertyDelta::Wrapping(Wrapping::IntoBlock);
        self.record_mut(statement).deltas.push(delta.clone());
        self.journal.push(EditEvent::Modify {
            node: statement,
            deltas: delta.into(),
        });
        Ok(())
    }

    fn normalize_unwrap(&mut self, block: NodeId, placeholder: SyntheticId) -> Result<()> {
        self.check_wrapping(block, Wrapping::OutOfBlock, Some(placeholder))?;
        self.mark_attached(placeholder.into());
        if let Some(&statement) = self.tree[block].list(Slot::Statements).first() {
            self.forget_move(statement, placeholder);
        }

        trace!(node = %block, "replace block with its statement, recorded as unwrap");
        let delta = PropertyDelta::Wrapping(Wrapping::OutOfBlock);
        self.record_mut(block).deltas.push(delta.clone());
        self.journal.push(EditEvent::Modify {
            node: block,
            deltas: delta.into(),
        });
        Ok(())
    }

    fn forget_move(&mut self, node: NodeId, placeholder: SyntheticId) {
        if let Some(record) = self.records.get_mut(&node) {
            record.moved = None;
        }
        self.journal.retain(|event| {
            !matches!(event, EditEvent::MoveSource { node: n, placeholder: p }
                if *n == node && *p == placeholder)
        });
    }
}

/// Shape check of a fresh node against its kind's schema
fn validate_fresh(node: &FreshNode) -> Result<()> {
    let kind = node.kind();
    let malformed = |reason: String| RewriteError::MalformedNode { kind, reason };

    for (slot, child) in node.slots() {
        let Some(spec) = kind.slot_spec(*slot) else {
            return Err(malformed(format!("no slot {slot:?}")));
        };
        match (spec.cardinality, child) {
            (Cardinality::List, FreshChild::List(_)) => {}
            (Cardinality::List, FreshChild::Single(_)) => {
                return Err(malformed(format!("slot {slot:?} is a list")))
            }
            (_, FreshChild::List(_)) => {
                return Err(malformed(format!("slot {slot:?} holds a single node")))
            }
            (_, FreshChild::Single(_)) => {}
        }
    }
    for spec in kind.slots() {
        if spec.cardinality == Cardinality::Required && node.child(spec.slot).is_none() {
            return Err(malformed(format!("missing required slot {:?}", spec.slot)));
        }
    }
    for (property, _) in node.properties() {
        if !kind.has_property(*property) {
            return Err(malformed(format!("no property {property:?}")));
        }
    }
    for &property in kind.properties() {
        if property != Property::Modifiers
            && node.property(property).map_or(true, |v| v.trim().is_empty())
        {
            return Err(malformed(format!("missing property {property:?}")));
        }
    }
    Ok(())
}
