//! Journal entries and property-level change records

use crate::ast::{NodeId, Property, Slot};
use crate::synthetic::{NodeHandle, SyntheticId};

/// Shape change of a statement position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wrapping {
    /// Surround a single statement with `{ }`
    IntoBlock,
    /// Replace a one-statement block by its statement
    OutOfBlock,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyDelta {
    Set { property: Property, value: String },
    Wrapping(Wrapping),
}

impl PropertyDelta {
    pub fn set(property: Property, value: impl Into<String>) -> Self {
        PropertyDelta::Set {
            property,
            value: value.into(),
        }
    }

    /// Two deltas conflict when they change the same field
    pub(crate) fn same_field(&self, other: &PropertyDelta) -> bool {
        match (self, other) {
            (PropertyDelta::Set { property: a, .. }, PropertyDelta::Set { property: b, .. }) => {
                a == b
            }
            (PropertyDelta::Wrapping(_), PropertyDelta::Wrapping(_)) => true,
            _ => false,
        }
    }
}

/// Field-level changes of one node
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyDeltas(pub Vec<PropertyDelta>);

impl PropertyDeltas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, property: Property, value: impl Into<String>) -> Self {
        self.0.push(PropertyDelta::set(property, value));
        self
    }

    pub fn wrapping(mut self, wrapping: Wrapping) -> Self {
        self.0.push(PropertyDelta::Wrapping(wrapping));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyDelta> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<PropertyDelta> for PropertyDeltas {
    fn from(delta: PropertyDelta) -> Self {
        PropertyDeltas(vec![delta])
    }
}

/// One accepted mutation, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEvent {
    Insert {
        node: NodeHandle,
        parent: NodeId,
        slot: Slot,
        index: usize,
    },
    Remove {
        node: NodeId,
    },
    Replace {
        node: NodeId,
        replacement: NodeHandle,
    },
    Modify {
        node: NodeId,
        deltas: PropertyDeltas,
    },
    MoveSource {
        node: NodeId,
        placeholder: SyntheticId,
    },
    CopySource {
        node: NodeId,
        placeholder: SyntheticId,
    },
}
