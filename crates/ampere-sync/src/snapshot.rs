//! Snapshots exchanged with the persistence layer

use crate::Result;
use ampere_core::{BigValue, GeneratorId};
use ampere_sim::{AggregateBonuses, AggregatePatch, EntityPatch, Simulation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A value as a strict `(mantissa, tier)` pair
///
/// Used where the encoding is not self-describing (the binary cache).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValueRecord {
    pub mantissa: u64,
    pub tier: u64,
}

impl From<BigValue> for ValueRecord {
    fn from(value: BigValue) -> Self {
        let (mantissa, tier) = value.to_wire();
        Self { mantissa, tier }
    }
}

impl From<ValueRecord> for BigValue {
    fn from(record: ValueRecord) -> Self {
        BigValue::new(record.mantissa, record.tier)
    }
}

/// Persisted state of one generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorRecord {
    pub id: GeneratorId,
    pub heat: f64,
    pub running: bool,
}

/// Periodic state snapshot sent to the persistence layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistSnapshot {
    /// Save counter, increasing with every snapshot
    pub version: u64,
    /// Aggregate energy revision at capture time
    pub revision: u64,
    pub taken_at: DateTime<Utc>,
    pub energy: ValueRecord,
    pub money: ValueRecord,
    pub generators: Vec<GeneratorRecord>,
}

impl PersistSnapshot {
    /// Capture the current simulation state as save number `version`
    pub fn capture(sim: &Simulation, version: u64, now: DateTime<Utc>) -> Self {
        let user = sim.user();
        Self {
            version,
            revision: sim.aggregate_revision(),
            taken_at: now,
            energy: user.energy.into(),
            money: user.money.into(),
            generators: sim
                .generators()
                .map(|g| GeneratorRecord {
                    id: g.id,
                    heat: g.heat,
                    running: g.is_running(),
                })
                .collect(),
        }
    }

    /// Encode for the remote layer
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode for the local cache
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Merged state returned by the persistence layer
///
/// Values decode leniently: malformed numbers read as zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthoritativeSnapshot {
    /// Version of the snapshot this answers
    pub version: u64,
    /// Aggregate energy revision the values reflect
    pub revision: u64,
    pub energy: Option<BigValue>,
    pub money: Option<BigValue>,
    pub bonuses: Option<AggregateBonuses>,
    pub generators: Vec<EntityPatch>,
}

impl AuthoritativeSnapshot {
    /// The aggregate part as a patch
    pub fn aggregate_patch(&self) -> AggregatePatch {
        AggregatePatch {
            revision: self.revision,
            energy: self.energy,
            money: self.money,
            bonuses: self.bonuses,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
