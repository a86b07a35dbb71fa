//! Ampere Sim - Production and heat simulation for idle generators
//!
//! This crate advances a set of generators once per tick:
//! - Builds complete on schedule and start running
//! - Running generators produce energy and accrue heat
//! - Paused and building generators cool down
//! - Generators whose heat passes their tolerance overload and rebuild
//! - Summed production is scaled by the user's aggregate multiplier
//!
//! ## Collaborators
//!
//! The simulator owns only its own tick timer. Persistence, display and
//! economy layers interact with it through:
//! - read-only accessors (`production_rate`, `heat`, `effective_tolerance`, ...)
//! - drained `SimEvent`s and `Cmd`s
//! - a dirty flag for external autosave scheduling
//! - monotonic `EntityPatch`/`AggregatePatch` merges
//!
//! ```
//! use ampere_core::BigValue;
//! use ampere_sim::{GeneratorMeta, MemoryCatalog, SimConfig, Simulation};
//! use chrono::Utc;
//!
//! let catalog = MemoryCatalog::new().with(
//!     "solar",
//!     GeneratorMeta {
//!         production: BigValue::from_plain(1.0),
//!         heat_rate: 0.0,
//!         tolerance: 100.0,
//!         build_secs: 0.0,
//!     },
//! );
//! let mut sim = Simulation::new(SimConfig::default(), catalog);
//! let id = sim.place("solar", Utc::now()).unwrap();
//! assert!(sim.generator(id).unwrap().is_developing());
//! ```

mod catalog;
mod cmd;
mod config;
mod error;
mod event;
mod generator;
mod patch;
mod simulation;
mod user;

pub use catalog::{GeneratorMeta, MemoryCatalog, TypeCatalog};
pub use cmd::{Cmd, OverloadReport};
pub use config::SimConfig;
pub use error::{Error, Result};
pub use event::SimEvent;
pub use generator::{GeneratorEntity, GeneratorState, UpgradeLevels};
pub use patch::{AggregatePatch, EntityPatch, PatchOutcome};
pub use simulation::{Simulation, TickReport};
pub use user::{AggregateBonuses, AggregateMultiplier, UserAggregateState};
