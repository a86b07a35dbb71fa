//! Monotonic patches merged back from the persistence layer
//!
//! Remote results arrive after later ticks may already have moved local state
//! on. A patch only applies when it is at least as new as the state it would
//! overwrite; otherwise it is discarded.

use crate::generator::GeneratorState;
use crate::user::AggregateBonuses;
use ampere_core::{BigValue, GeneratorId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authoritative state for one generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityPatch {
    pub id: GeneratorId,
    /// Revision the patch was derived from
    pub revision: u64,
    pub state: GeneratorState,
    pub heat: f64,
    pub build_complete_at: Option<DateTime<Utc>>,
}

/// Authoritative aggregate fields
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregatePatch {
    /// Aggregate revision the patch was derived from
    pub revision: u64,
    pub energy: Option<BigValue>,
    pub money: Option<BigValue>,
    pub bonuses: Option<AggregateBonuses>,
}

/// Result of merging a patch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The patch was merged
    Applied,
    /// Local state is newer; nothing changed
    Stale,
    /// The target no longer exists
    Dropped,
}

impl PatchOutcome {
    /// Check if the patch changed anything
    pub fn is_applied(&self) -> bool {
        matches!(self, PatchOutcome::Applied)
    }
}
