//! Discrete mutation records emitted while the live tree is patched.
//!
//! The engine applies every mutation to the live tree in place and records
//! it here, so callers and tests observe the exact patch stream without a
//! host-level mutation observer.
//!
//! Invariants:
//! - Records are emitted in application order.
//! - All ids are live-tree ids; streaming-tree ids never appear.
//! - Ids referenced by a record are valid at the time it is emitted
//!   (`RemoveNode` invalidates the node's whole subtree for later records).
//! - `InsertBefore`/`MoveBefore` with `before: None` append at the end.
//! - Unit sequence numbers are contiguous and start at 1.

use dom::{AttrName, Id};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    /// The node was replaced wholesale in its parent slot (kind or tag
    /// mismatch). Terminal for that subtree.
    ReplaceNode { old: Id, new: Id },
    /// A clone of a new-tree node was inserted.
    InsertBefore {
        parent: Id,
        node: Id,
        before: Option<Id>,
    },
    /// An existing live node was relocated; its identity is preserved.
    MoveBefore {
        parent: Id,
        node: Id,
        before: Option<Id>,
    },
    RemoveNode { parent: Id, node: Id },
    SetText { node: Id, text: String },
    SetAttribute {
        node: Id,
        name: AttrName,
        value: Option<String>,
    },
    RemoveAttribute { node: Id, name: AttrName },
}

/// One externally visible batch: either a transition (animatable as a unit)
/// or an immediately applied group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionUnit {
    pub seq: u64,
    pub transition: bool,
    pub mutations: Vec<Mutation>,
}

/// Everything a reconciliation pass did, in order. Returned to the caller
/// instead of being retained in ambient process-wide state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub units: Vec<TransitionUnit>,
}

impl ReconcileReport {
    pub fn mutations(&self) -> impl Iterator<Item = &Mutation> {
        self.units.iter().flat_map(|unit| unit.mutations.iter())
    }

    pub fn mutation_count(&self) -> usize {
        self.units.iter().map(|unit| unit.mutations.len()).sum()
    }

    /// True when the pass proved the trees already converged.
    pub fn is_noop(&self) -> bool {
        self.units.is_empty()
    }
}
