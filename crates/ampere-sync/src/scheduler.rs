//! Autosave scheduling outside the simulator
//!
//! The simulator only raises a dirty flag. This scheduler decides when that
//! turns into a snapshot.

use crate::snapshot::PersistSnapshot;
use ampere_sim::Simulation;
use ampere_core::interval_from_ms;
use chrono::{DateTime, TimeDelta, Utc};

/// Produces snapshots at a fixed cadence while state is dirty
#[derive(Debug, Clone)]
pub struct AutosaveScheduler {
    interval: TimeDelta,
    last_save_at: Option<DateTime<Utc>>,
    version: u64,
}

impl AutosaveScheduler {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval: interval_from_ms(interval_ms),
            last_save_at: None,
            version: 0,
        }
    }

    /// Whether the cadence allows a save at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.last_save_at
            .map_or(true, |last| now - last >= self.interval)
    }

    /// Snapshot the simulation if a save is due and something changed
    ///
    /// The dirty flag is only consumed when a snapshot is produced.
    pub fn poll(&mut self, sim: &mut Simulation, now: DateTime<Utc>) -> Option<PersistSnapshot> {
        if !self.is_due(now) || !sim.take_dirty() {
            return None;
        }
        Some(self.force(sim, now))
    }

    /// Snapshot immediately, regardless of cadence or dirty state
    ///
    /// Every snapshot gets the next save version, whatever changed.
    pub fn force(&mut self, sim: &mut Simulation, now: DateTime<Utc>) -> PersistSnapshot {
        sim.take_dirty();
        self.last_save_at = Some(now);
        self.version += 1;
        PersistSnapshot::capture(sim, self.version, now)
    }

    /// Version of the most recent snapshot (0 before the first)
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn last_save_at(&self) -> Option<DateTime<Utc>> {
        self.last_save_at
    }
}
