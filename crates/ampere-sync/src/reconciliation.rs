//! Merging authoritative snapshots back into the simulation

use crate::snapshot::AuthoritativeSnapshot;
use crate::validate::relative_drift;
use ampere_sim::{PatchOutcome, Simulation};
use tracing::{debug, warn};

/// Result of reconciling one snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReconcileOutcome {
    /// The snapshot was merged
    Applied {
        /// Relative energy difference before the merge
        drift: f64,
        /// Generator patches that applied
        generators: usize,
    },
    /// An equal or newer snapshot was already merged
    Stale,
}

/// Applies authoritative state in version order
#[derive(Debug, Clone)]
pub struct Reconciler {
    last_version: Option<u64>,
    drift_tolerance: f64,
}

impl Reconciler {
    /// Create a reconciler warning above `drift_tolerance` relative drift
    pub fn new(drift_tolerance: f64) -> Self {
        Self {
            last_version: None,
            drift_tolerance,
        }
    }

    /// Merge a snapshot unless an equal or newer one was already merged
    pub fn apply(&mut self, sim: &mut Simulation, snapshot: &AuthoritativeSnapshot) -> ReconcileOutcome {
        if self.last_version.is_some_and(|last| snapshot.version <= last) {
            debug!(version = snapshot.version, last = ?self.last_version, "stale snapshot ignored");
            return ReconcileOutcome::Stale;
        }
        self.last_version = Some(snapshot.version);

        let drift = snapshot
            .energy
            .map_or(0.0, |remote| relative_drift(sim.user().energy, remote));
        if drift > self.drift_tolerance {
            warn!(
                version = snapshot.version,
                drift,
                local = %sim.user().energy,
                remote = ?snapshot.energy.map(|e| e.to_string()),
                "energy drifted from authoritative state"
            );
        }

        sim.apply_aggregate_patch(&snapshot.aggregate_patch());
        let generators = snapshot
            .generators
            .iter()
            .filter(|patch| sim.apply_entity_patch(patch) == PatchOutcome::Applied)
            .count();

        ReconcileOutcome::Applied { drift, generators }
    }

    /// Version of the newest merged snapshot
    pub fn last_version(&self) -> Option<u64> {
        self.last_version
    }

    pub fn drift_tolerance(&self) -> f64 {
        self.drift_tolerance
    }
}
