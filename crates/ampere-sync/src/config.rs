//! Sync configuration

use serde::{Deserialize, Serialize};

/// Cadence and limits of the sync collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Minimum time between autosaves
    pub autosave_interval_ms: u64,
    /// Relative energy difference tolerated before reconciliation warns
    pub drift_tolerance: f64,
    /// Maximum commands awaiting completion
    pub max_in_flight: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            autosave_interval_ms: 10_000,
            drift_tolerance: 0.02,
            max_in_flight: 64,
        }
    }
}
