//! Edit handle for one list-valued slot

use tracing::trace;

use super::{EditEvent, RewriteState};
use crate::ast::{NodeId, Slot};
use crate::error::{Result, RewriteError};
use crate::synthetic::NodeHandle;

/// Mutations of the list in `slot` of `parent`
///
/// Indices count the elements currently in the list: removed and
/// moved-out originals are skipped, inserted nodes are included.
pub struct ListRewrite<'s, 't> {
    state: &'s mut RewriteState<'t>,
    parent: NodeId,
    slot: Slot,
}

impl<'s, 't> ListRewrite<'s, 't> {
    pub(super) fn new(state: &'s mut RewriteState<'t>, parent: NodeId, slot: Slot) -> Self {
        Self {
            state,
            parent,
            slot,
        }
    }

    /// Elements as they will be rendered
    pub fn live(&self) -> Vec<NodeHandle> {
        self.state.live_list(self.parent, self.slot)
    }

    pub fn len(&self) -> usize {
        self.live().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert_first(&mut self, node: impl Into<NodeHandle>) -> Result<()> {
        self.insert_at(0, node)
    }

    pub fn insert_last(&mut self, node: impl Into<NodeHandle>) -> Result<()> {
        let len = self.len();
        self.insert_at(len, node)
    }

    pub fn insert_at(&mut self, index: usize, node: impl Into<NodeHandle>) -> Result<()> {
        let node = node.into();
        let raw = self.state.raw_list(self.parent, self.slot);
        let visible: Vec<usize> = raw
            .iter()
            .enumerate()
            .filter(|(_, handle)| !self.is_erased(**handle))
            .map(|(i, _)| i)
            .collect();
        let position = match index.cmp(&visible.len()) {
            std::cmp::Ordering::Less => visible[index],
            std::cmp::Ordering::Equal => raw.len(),
            std::cmp::Ordering::Greater => {
                return Err(RewriteError::invalid(
                    self.parent,
                    format!("index {index} is past the end of {:?}", self.slot),
                ))
            }
        };
        self.insert_raw(position, index, node)
    }

    pub fn insert_before(
        &mut self,
        anchor: impl Into<NodeHandle>,
        node: impl Into<NodeHandle>,
    ) -> Result<()> {
        let position = self.position_of(anchor.into())?;
        let index = self.visible_index(position);
        self.insert_raw(position, index, node.into())
    }

    pub fn insert_after(
        &mut self,
        anchor: impl Into<NodeHandle>,
        node: impl Into<NodeHandle>,
    ) -> Result<()> {
        let position = self.position_of(anchor.into())? + 1;
        let index = self.visible_index(position);
        self.insert_raw(position, index, node.into())
    }

    /// Replace an element, original or inserted
    pub fn replace(
        &mut self,
        element: impl Into<NodeHandle>,
        replacement: impl Into<NodeHandle>,
    ) -> Result<()> {
        let element = element.into();
        let position = self.position_of(element)?;
        match element {
            NodeHandle::Original(id) => self.state.replace(id, replacement),
            NodeHandle::Synthetic(_) => {
                let replacement = replacement.into();
                self.state.check_attachable(replacement, self.parent)?;
                self.state.detach(element);
                self.state.mark_attached(replacement);
                let mut live = self.state.raw_list(self.parent, self.slot);
                live[position] = replacement;
                self.state.lists.insert((self.parent, self.slot), live);
                trace!(parent = %self.parent, slot = ?self.slot, node = %replacement, "replace inserted element");
                let index = self.visible_index(position);
                self.state.journal.push(EditEvent::Insert {
                    node: replacement,
                    parent: self.parent,
                    slot: self.slot,
                    index,
                });
                Ok(())
            }
        }
    }

    /// Remove an element, original or inserted
    pub fn remove(&mut self, element: impl Into<NodeHandle>) -> Result<()> {
        let element = element.into();
        let position = self.position_of(element)?;
        match element {
            NodeHandle::Original(id) => self.state.remove(id),
            NodeHandle::Synthetic(_) => {
                let mut live = self.state.raw_list(self.parent, self.slot);
                live.remove(position);
                self.state.lists.insert((self.parent, self.slot), live);
                self.state.detach(element);
                trace!(parent = %self.parent, slot = ?self.slot, node = %element, "remove inserted element");
                Ok(())
            }
        }
    }

    fn insert_raw(&mut self, position: usize, index: usize, node: NodeHandle) -> Result<()> {
        self.state.check_not_final(self.parent)?;
        self.state.check_not_unwrapped(self.parent)?;
        self.state.check_attachable(node, self.parent)?;
        self.state.mark_attached(node);

        let mut live = self.state.raw_list(self.parent, self.slot);
        live.insert(position, node);
        self.state.lists.insert((self.parent, self.slot), live);

        trace!(parent = %self.parent, slot = ?self.slot, index, node = %node, "insert");
        self.state.journal.push(EditEvent::Insert {
            node,
            parent: self.parent,
            slot: self.slot,
            index,
        });
        Ok(())
    }

    fn is_erased(&self, handle: NodeHandle) -> bool {
        matches!(handle, NodeHandle::Original(id) if self.state.is_erased(id))
    }

    fn visible_index(&self, position: usize) -> usize {
        self.state.raw_list(self.parent, self.slot)[..position]
            .iter()
            .filter(|handle| !self.is_erased(**handle))
            .count()
    }

    fn position_of(&self, element: NodeHandle) -> Result<usize> {
        if let NodeHandle::Original(id) = element {
            self.state.check_original(id)?;
        }
        self.state
            .raw_list(self.parent, self.slot)
            .iter()
            .position(|handle| *handle == element)
            .ok_or_else(|| {
                RewriteError::invalid(element, format!("not an element of {:?}", self.slot))
            })
    }
}
