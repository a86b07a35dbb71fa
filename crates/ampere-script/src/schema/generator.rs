//! Generator type definition schema

use crate::error::{Error, Result};
use ampere_core::{BigValue, TypeRef};
use ampere_sim::GeneratorMeta;
use serde::{Deserialize, Serialize};

/// Definition of a generator type (e.g., solar panel, coal plant)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorTypeDef {
    /// Unique identifier for this type
    pub id: TypeRef,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Placement cost, charged by the economy layer
    #[serde(default)]
    pub cost: BigValue,
    /// Energy per second at upgrade level 0
    #[serde(default)]
    pub production: BigValue,
    /// Heat per second at upgrade level 0
    #[serde(default)]
    pub heat_rate: f64,
    /// Heat threshold at upgrade level 0
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Build time in seconds (0 = simulator default)
    #[serde(default)]
    pub build_secs: f64,
}

/// Longest accepted build time: one year
pub const MAX_BUILD_SECS: f64 = 365.0 * 24.0 * 3_600.0;

fn default_tolerance() -> f64 {
    100.0
}

impl GeneratorTypeDef {
    /// Create a new generator type definition
    pub fn new(id: impl Into<TypeRef>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            cost: BigValue::ZERO,
            production: BigValue::ZERO,
            heat_rate: 0.0,
            tolerance: default_tolerance(),
            build_secs: 0.0,
        }
    }

    /// The simulator's view of this type
    pub fn meta(&self) -> GeneratorMeta {
        GeneratorMeta {
            production: self.production,
            heat_rate: self.heat_rate,
            tolerance: self.tolerance,
            build_secs: self.build_secs,
        }
    }

    /// Reject definitions the simulator cannot run
    pub fn validate(&self) -> Result<()> {
        if self.id.as_str().trim().is_empty() {
            return Err(Error::InvalidSchema("generator type with empty id".to_string()));
        }
        let numbers = [
            ("heat_rate", self.heat_rate),
            ("tolerance", self.tolerance),
            ("build_secs", self.build_secs),
        ];
        for (field, value) in numbers {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidSchema(format!(
                    "{}: {} must be a non-negative number, got {}",
                    self.id, field, value
                )));
            }
        }
        if self.build_secs > MAX_BUILD_SECS {
            return Err(Error::InvalidSchema(format!(
                "{}: build_secs must be at most {}, got {}",
                self.id, MAX_BUILD_SECS, self.build_secs
            )));
        }
        Ok(())
    }
}
