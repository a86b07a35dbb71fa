//! Generator entities
//!
//! A generator moves through `Building → Running ⇄ Paused`. Overload sends a
//! running generator back to `Building`; demolition removes it from outside.

use crate::catalog::GeneratorMeta;
use ampere_core::{BigValue, GeneratorId, TypeRef};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GeneratorState {
    /// Under construction or rebuilding after an overload
    #[default]
    Building,
    /// Producing energy and accruing heat
    Running,
    /// Idle and cooling down
    Paused,
}

impl fmt::Display for GeneratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeneratorState::Building => "building",
            GeneratorState::Running => "running",
            GeneratorState::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// Per-generator upgrade levels, written by the economy layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeLevels {
    pub production: u32,
    pub heat_reduction: u32,
    pub tolerance: u32,
}

/// A placed generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorEntity {
    pub id: GeneratorId,
    pub type_ref: TypeRef,
    pub state: GeneratorState,
    /// Accumulated heat, never negative
    pub heat: f64,
    pub base_tolerance: f64,
    pub heat_rate: f64,
    pub base_production: BigValue,
    #[serde(default)]
    pub upgrades: UpgradeLevels,
    /// When the current build finishes (set while `Building`)
    pub build_complete_at: Option<DateTime<Utc>>,
    /// Duration of a (re)build in seconds
    pub build_duration_secs: f64,
    /// Bumped on every local state transition and heat change
    #[serde(default)]
    pub revision: u64,
    /// Set while the type cannot be resolved
    #[serde(default)]
    pub degraded: bool,
}

impl GeneratorEntity {
    /// A freshly placed generator, building until `now + build_duration_secs`
    pub fn from_meta(
        id: GeneratorId,
        type_ref: impl Into<TypeRef>,
        meta: &GeneratorMeta,
        build_duration_secs: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            type_ref: type_ref.into(),
            state: GeneratorState::Building,
            heat: 0.0,
            base_tolerance: meta.tolerance,
            heat_rate: meta.heat_rate,
            base_production: meta.production,
            upgrades: UpgradeLevels::default(),
            build_complete_at: Some(build_deadline(now, build_duration_secs)),
            build_duration_secs,
            revision: 0,
            degraded: false,
        }
    }

    /// Whether the generator is producing
    pub fn is_running(&self) -> bool {
        self.state == GeneratorState::Running
    }

    /// Whether the generator is (re)building
    pub fn is_developing(&self) -> bool {
        self.state == GeneratorState::Building
    }

    /// Whether the build timer has elapsed at `now`
    ///
    /// A building generator without a completion time counts as finished.
    pub fn build_finished(&self, now: DateTime<Utc>) -> bool {
        self.is_developing() && self.build_complete_at.map_or(true, |at| now >= at)
    }

    /// Seconds until the build completes (0 when not building)
    pub fn remaining_build_secs(&self, now: DateTime<Utc>) -> f64 {
        match (self.state, self.build_complete_at) {
            (GeneratorState::Building, Some(at)) => {
                ((at - now).num_milliseconds() as f64 / 1000.0).max(0.0)
            }
            _ => 0.0,
        }
    }

    /// Build progress in `[0, 1]` (1 when not building)
    pub fn build_progress(&self, now: DateTime<Utc>) -> f64 {
        if !self.is_developing() || self.build_duration_secs <= 0.0 {
            return 1.0;
        }
        let remaining = self.remaining_build_secs(now);
        (1.0 - remaining / self.build_duration_secs).clamp(0.0, 1.0)
    }

    /// Finish building: start running with no heat
    pub(crate) fn complete_build(&mut self) {
        self.state = GeneratorState::Running;
        self.heat = 0.0;
        self.build_complete_at = None;
        self.revision += 1;
    }

    /// Overload reset: rebuild for the original duration from `now`
    pub(crate) fn reset_for_rebuild(&mut self, now: DateTime<Utc>) {
        self.state = GeneratorState::Building;
        self.heat = 0.0;
        self.build_complete_at = Some(build_deadline(now, self.build_duration_secs));
        self.revision += 1;
    }

    /// Add heat, clamped at zero
    pub(crate) fn accrue_heat(&mut self, amount: f64) {
        self.set_heat(self.heat + amount);
    }

    /// Lose heat at `rate` per second, clamped at zero
    pub(crate) fn cool(&mut self, rate: f64, delta: f64) {
        self.set_heat(self.heat - rate * delta);
    }

    /// Any heat change is a write that older patches must not undo
    fn set_heat(&mut self, heat: f64) {
        let heat = heat.max(0.0);
        if heat != self.heat {
            self.heat = heat;
            self.revision += 1;
        }
    }
}

/// `now` plus a build duration in whole milliseconds
///
/// Saturates at the latest representable time.
pub(crate) fn build_deadline(now: DateTime<Utc>, seconds: f64) -> DateTime<Utc> {
    let millis = (seconds.max(0.0) * 1000.0).round() as i64;
    TimeDelta::try_milliseconds(millis)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
