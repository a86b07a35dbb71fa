//! Simulator configuration

use serde::{Deserialize, Serialize};

/// Tunables for the production and heat model
///
/// Every field has a default, so partial RON files are valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Cadence of the simulator's own tick timer
    pub tick_interval_ms: u64,
    /// Floor clamp on elapsed seconds per tick
    pub min_delta_secs: f64,
    /// Optional ceiling on elapsed seconds per tick
    pub max_delta_secs: Option<f64>,
    /// Heat lost per second while paused or building
    pub cooling_rate: f64,
    /// Production gained per production upgrade level
    pub production_step: f64,
    /// Heat rate removed per heat reduction upgrade level
    pub heat_reduction_step: f64,
    /// Floor of both heat reduction factors
    pub min_heat_factor: f64,
    /// Heat per second added per production upgrade level
    pub heat_per_production_level: f64,
    /// Tolerance per generator or global tolerance level
    pub tolerance_per_level: f64,
    /// Global production bonus per level
    pub production_bonus_step: f64,
    /// Build duration for types that do not set one
    pub default_build_secs: f64,
    /// Lower bound on any build duration
    pub min_build_secs: f64,
    /// Generators allowed before capacity bonuses
    pub base_max_generators: usize,
}

impl SimConfig {
    /// Build duration for a type's configured build time
    pub fn build_duration_secs(&self, build_secs: f64) -> f64 {
        if build_secs > 0.0 {
            build_secs.max(self.min_build_secs)
        } else {
            self.default_build_secs
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            min_delta_secs: 0.5,
            max_delta_secs: None,
            cooling_rate: 1.0,
            production_step: 0.1,
            heat_reduction_step: 0.1,
            min_heat_factor: 0.1,
            heat_per_production_level: 0.5,
            tolerance_per_level: 10.0,
            production_bonus_step: 0.1,
            default_build_secs: 2.0,
            min_build_secs: 1.0,
            base_max_generators: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_duration() {
        let config = SimConfig::default();
        assert_eq!(config.build_duration_secs(0.0), 2.0);
        assert_eq!(config.build_duration_secs(-3.0), 2.0);
        assert_eq!(config.build_duration_secs(0.25), 1.0);
        assert_eq!(config.build_duration_secs(30.0), 30.0);
    }

    #[test]
    fn test_partial_ron() {
        let config: SimConfig = ron::from_str("(cooling_rate: 2.5, base_max_generators: 4)").unwrap();
        assert_eq!(config.cooling_rate, 2.5);
        assert_eq!(config.base_max_generators, 4);
        assert_eq!(config.min_delta_secs, 0.5);
        assert_eq!(config.max_delta_secs, None);
    }
}
