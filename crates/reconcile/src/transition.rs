//! Batching hook between the engine and the observable mutation stream.
//!
//! With transitions enabled, each non-empty batch becomes one animatable
//! unit; disabled, batches are recorded as plain immediate groups. Either
//! way the units end up in the returned report, not in global state.

use crate::mutation::{Mutation, ReconcileReport, TransitionUnit};

pub struct TransitionGate {
    enabled: bool,
    seq: u64,
    units: Vec<TransitionUnit>,
}

impl TransitionGate {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            seq: 0,
            units: Vec::new(),
        }
    }

    /// Record one batch. Empty batches are suppressed so a no-op pass stays
    /// observably a no-op.
    pub fn apply(&mut self, mutations: Vec<Mutation>) {
        if mutations.is_empty() {
            return;
        }
        self.seq += 1;
        log::debug!(
            target: "reconcile.gate",
            "unit {} ({} mutations, transition={})",
            self.seq,
            mutations.len(),
            self.enabled
        );
        self.units.push(TransitionUnit {
            seq: self.seq,
            transition: self.enabled,
            mutations,
        });
    }

    pub fn into_report(self) -> ReconcileReport {
        ReconcileReport { units: self.units }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::Id;

    #[test]
    fn empty_batches_are_suppressed() {
        let mut gate = TransitionGate::new(true);
        gate.apply(Vec::new());
        assert!(gate.into_report().is_noop());
    }

    #[test]
    fn units_are_sequenced_and_tagged() {
        let mut gate = TransitionGate::new(true);
        gate.apply(vec![Mutation::SetText {
            node: Id(1),
            text: "a".to_string(),
        }]);
        gate.apply(vec![Mutation::SetText {
            node: Id(1),
            text: "b".to_string(),
        }]);
        let report = gate.into_report();
        assert_eq!(report.units.len(), 2);
        assert_eq!(report.units[0].seq, 1);
        assert_eq!(report.units[1].seq, 2);
        assert!(report.units.iter().all(|unit| unit.transition));
        assert_eq!(report.mutation_count(), 2);
    }

    #[test]
    fn disabled_gate_records_immediate_units() {
        let mut gate = TransitionGate::new(false);
        gate.apply(vec![Mutation::SetText {
            node: Id(1),
            text: "a".to_string(),
        }]);
        let report = gate.into_report();
        assert!(!report.units[0].transition);
    }
}
