//! List edit planning
//!
//! Turns an original list and the list a session wants into a
//! retain/delete/insert script. The script depends only on the two
//! lists, never on the order of the mutation calls that produced the
//! live list.

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::ast::NodeId;
use crate::synthetic::NodeHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOp {
    /// Original element kept at its place
    Retain(NodeId),
    /// Original element dropped
    Delete(NodeId),
    /// Element added before the next retained one
    Insert(NodeHandle),
}

/// Deletions and insertions between two consecutive retained elements
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListRegion {
    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,
    pub deleted: Vec<NodeId>,
    pub inserted: Vec<NodeHandle>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditScript {
    pub ops: Vec<ListOp>,
}

impl EditScript {
    pub fn is_identity(&self) -> bool {
        self.ops.iter().all(|op| matches!(op, ListOp::Retain(_)))
    }

    /// Live list the script produces
    pub fn result(&self) -> Vec<NodeHandle> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                ListOp::Retain(id) => Some(NodeHandle::Original(*id)),
                ListOp::Insert(handle) => Some(*handle),
                ListOp::Delete(_) => None,
            })
            .collect()
    }

    /// Non-empty change runs, in list order
    pub fn regions(&self) -> Vec<ListRegion> {
        let mut regions = Vec::new();
        let mut current = ListRegion::default();

        for op in &self.ops {
            match *op {
                ListOp::Retain(id) => {
                    if !current.deleted.is_empty() || !current.inserted.is_empty() {
                        current.next = Some(id);
                        regions.push(current);
                    }
                    current = ListRegion {
                        prev: Some(id),
                        ..Default::default()
                    };
                }
                ListOp::Delete(id) => current.deleted.push(id),
                ListOp::Insert(handle) => current.inserted.push(handle),
            }
        }
        if !current.deleted.is_empty() || !current.inserted.is_empty() {
            regions.push(current);
        }
        regions
    }
}

/// Plan the edits turning `original` into `live`
///
/// A single forward scan: a live original still ahead of the cursor is
/// retained and every original skipped to reach it is deleted; anything
/// else is inserted at the cursor.
pub fn plan(original: &[NodeId], live: &[NodeHandle]) -> EditScript {
    let positions: FxHashMap<NodeId, usize> = original
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, i))
        .collect();

    let mut ops = Vec::with_capacity(original.len() + live.len());
    let mut cursor = 0;

    for handle in live {
        let position = match handle {
            NodeHandle::Original(id) => positions.get(id).copied().filter(|&p| p >= cursor),
            NodeHandle::Synthetic(_) => None,
        };
        match position {
            Some(p) => {
                ops.extend(original[cursor..p].iter().map(|id| ListOp::Delete(*id)));
                ops.push(ListOp::Retain(original[p]));
                cursor = p + 1;
            }
            None => ops.push(ListOp::Insert(*handle)),
        }
    }
    ops.extend(original[cursor..].iter().map(|id| ListOp::Delete(*id)));

    let script = EditScript { ops };
    trace!(
        original = original.len(),
        live = live.len(),
        ops = script.ops.len(),
        "planned list edit"
    );
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{NodeKind, NodeSpec, Slot, TreeBuilder};
    use crate::synthetic::{SessionId, SyntheticId};

    fn originals(n: usize) -> Vec<NodeId> {
        let source = ";".repeat(n);
        let mut builder = TreeBuilder::new(source.as_str());
        let ids: Vec<NodeId> = (0..n)
            .map(|i| builder.push(NodeSpec::new(NodeKind::EmptyStatement, i..i + 1)).unwrap())
            .collect();
        let root = builder
            .push(NodeSpec::new(NodeKind::CompilationUnit, 0..n).list(Slot::Statements, ids.clone()))
            .unwrap();
        builder.finish(root).unwrap();
        ids
    }

    fn fresh(session: SessionId, i: usize) -> NodeHandle {
        SyntheticId::new(session, i).into()
    }

    #[test]
    fn test_identity() {
        let o = originals(3);
        let live: Vec<NodeHandle> = o.iter().map(|id| (*id).into()).collect();
        let script = plan(&o, &live);
        assert!(script.is_identity());
        assert!(script.regions().is_empty());
    }

    #[test]
    fn test_insert_anchors_before_next_retained() {
        let o = originals(3);
        let s = SessionId::next();
        let x = fresh(s, 0);
        let live = vec![o[0].into(), x, o[2].into()];

        let script = plan(&o, &live);
        assert_eq!(
            script.ops,
            vec![
                ListOp::Retain(o[0]),
                ListOp::Delete(o[1]),
                ListOp::Insert(x),
                ListOp::Retain(o[2]),
            ]
        );
        assert_eq!(script.result(), live);
        assert_eq!(
            script.regions(),
            vec![ListRegion {
                prev: Some(o[0]),
                next: Some(o[2]),
                deleted: vec![o[1]],
                inserted: vec![x],
            }]
        );
    }

    #[test]
    fn test_trailing_and_leading_regions() {
        let o = originals(2);
        let s = SessionId::next();
        let (x, y) = (fresh(s, 0), fresh(s, 1));
        let live = vec![x, o[1].into(), y];

        let regions = plan(&o, &live).regions();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].prev, None);
        assert_eq!(regions[0].next, Some(o[1]));
        assert_eq!(regions[0].deleted, vec![o[0]]);
        assert_eq!(regions[1].prev, Some(o[1]));
        assert_eq!(regions[1].next, None);
        assert_eq!(regions[1].inserted, vec![y]);
    }

    #[test]
    fn test_empty_original() {
        let s = SessionId::next();
        let live = vec![fresh(s, 0), fresh(s, 1)];
        let script = plan(&[], &live);
        assert_eq!(script.result(), live);
        assert_eq!(script.regions().len(), 1);
    }

    #[test]
    fn test_everything_deleted() {
        let o = originals(2);
        let script = plan(&o, &[]);
        assert_eq!(script.ops, vec![ListOp::Delete(o[0]), ListOp::Delete(o[1])]);
        assert!(script.result().is_empty());
    }
}
