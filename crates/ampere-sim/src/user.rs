//! Per-user aggregate state and the global production multiplier

use crate::config::SimConfig;
use ampere_core::BigValue;
use serde::{Deserialize, Serialize};

/// Resources and global bonuses of one session
///
/// The simulator writes `energy` when production accrues. Every other field
/// belongs to the economy layer and is only read here.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserAggregateState {
    pub energy: BigValue,
    pub money: BigValue,
    pub production_bonus: u32,
    pub rebirth_count: u32,
    pub energy_multiplier_level: u32,
    pub tolerance_bonus: u32,
    /// Fraction in `[0, 1]` removed from every generator's heat rate
    pub heat_reduction_percent: f64,
    pub max_generators_bonus: u32,
}

impl UserAggregateState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// The bonus levels owned by the economy layer
    pub fn bonuses(&self) -> AggregateBonuses {
        AggregateBonuses {
            production_bonus: self.production_bonus,
            rebirth_count: self.rebirth_count,
            energy_multiplier_level: self.energy_multiplier_level,
            tolerance_bonus: self.tolerance_bonus,
            heat_reduction_percent: self.heat_reduction_percent,
            max_generators_bonus: self.max_generators_bonus,
        }
    }

    /// Overwrite the bonus levels
    pub fn set_bonuses(&mut self, bonuses: AggregateBonuses) {
        self.production_bonus = bonuses.production_bonus;
        self.rebirth_count = bonuses.rebirth_count;
        self.energy_multiplier_level = bonuses.energy_multiplier_level;
        self.tolerance_bonus = bonuses.tolerance_bonus;
        self.heat_reduction_percent = bonuses.heat_reduction_percent;
        self.max_generators_bonus = bonuses.max_generators_bonus;
    }
}

/// Bonus levels as carried by aggregate patches
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateBonuses {
    pub production_bonus: u32,
    pub rebirth_count: u32,
    pub energy_multiplier_level: u32,
    pub tolerance_bonus: u32,
    pub heat_reduction_percent: f64,
    pub max_generators_bonus: u32,
}

/// Global multiplier applied to each tick's summed production
///
/// `linear * 2^doublings`, where doublings combine rebirths and energy
/// multiplier levels. Doublings are applied exactly so large counts do not
/// overflow a float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateMultiplier {
    pub linear: f64,
    pub doublings: u32,
}

impl AggregateMultiplier {
    /// The multiplier for a user's current bonus levels
    pub fn for_user(user: &UserAggregateState, config: &SimConfig) -> Self {
        Self {
            linear: 1.0 + config.production_bonus_step * f64::from(user.production_bonus),
            doublings: user
                .rebirth_count
                .saturating_add(user.energy_multiplier_level),
        }
    }

    /// The multiplier as a plain factor (may be infinite for huge doublings)
    pub fn factor(&self) -> f64 {
        self.linear * 2f64.powf(f64::from(self.doublings))
    }

    /// Apply the multiplier to a value
    pub fn apply(&self, value: BigValue) -> BigValue {
        value
            .multiply_by_scalar(self.linear)
            .multiply_by_pow2(self.doublings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplier_compounds() {
        let user = UserAggregateState {
            rebirth_count: 2,
            energy_multiplier_level: 1,
            ..Default::default()
        };
        let multiplier = AggregateMultiplier::for_user(&user, &SimConfig::default());
        assert_eq!(multiplier.factor(), 8.0);
        assert_eq!(multiplier.apply(BigValue::from_plain(5.0)).to_plain(), 40.0);
    }

    #[test]
    fn test_linear_bonus() {
        let user = UserAggregateState {
            production_bonus: 5,
            rebirth_count: 1,
            ..Default::default()
        };
        let multiplier = AggregateMultiplier::for_user(&user, &SimConfig::default());
        assert_eq!(multiplier.linear, 1.5);
        assert_eq!(multiplier.factor(), 3.0);
        assert_eq!(multiplier.apply(BigValue::from_plain(10.0)).to_plain(), 30.0);
    }

    #[test]
    fn test_bonuses_round_trip() {
        let mut user = UserAggregateState::new();
        let bonuses = AggregateBonuses {
            tolerance_bonus: 3,
            heat_reduction_percent: 0.25,
            ..Default::default()
        };
        user.set_bonuses(bonuses);
        assert_eq!(user.bonuses(), bonuses);
        assert_eq!(user.tolerance_bonus, 3);
    }
}
