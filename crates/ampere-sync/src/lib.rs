//! Ampere Sync - Persistence plumbing for the ampere simulator
//!
//! The simulator never blocks on storage. This crate connects it to a
//! persistence collaborator:
//!
//! - **Snapshots**: periodic `PersistSnapshot`s (JSON for the remote layer,
//!   bincode for a local cache)
//! - **Autosave**: `AutosaveScheduler` drains the simulator's dirty flag at its
//!   own cadence
//! - **Outbox**: overload reports queued with tickets and delivered later
//! - **Reconciliation**: authoritative snapshots merged in version order
//!   through monotonic patches, with drift warnings
//!
//! # Example
//!
//! ```rust,ignore
//! let mut scheduler = AutosaveScheduler::new(config.autosave_interval_ms);
//! let mut outbox = Outbox::new(config.max_in_flight);
//! let mut reconciler = Reconciler::new(config.drift_tolerance);
//!
//! loop {
//!     sim.tick(Utc::now());
//!     outbox.collect(&mut sim);
//!     outbox.deliver(&mut persistence, &mut sim);
//!     if let Some(snapshot) = scheduler.poll(&mut sim, Utc::now()) {
//!         let merged = persistence.save(&snapshot)?;
//!         reconciler.apply(&mut sim, &merged);
//!     }
//! }
//! ```

mod config;
mod error;
mod outbox;
mod persistence;
mod reconciliation;
mod scheduler;
mod snapshot;
pub mod validate;

pub use config::SyncConfig;
pub use error::{Error, Result};
pub use outbox::{DeliveryStats, InFlight, Outbox, Ticket};
pub use persistence::{MemoryPersistence, Persistence};
pub use reconciliation::{ReconcileOutcome, Reconciler};
pub use scheduler::AutosaveScheduler;
pub use snapshot::{AuthoritativeSnapshot, GeneratorRecord, PersistSnapshot, ValueRecord};
pub use validate::{relative_drift, within_tolerance};
