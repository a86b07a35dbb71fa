//! The persistence collaborator seam

use crate::error::{Error, Result};
use crate::snapshot::{AuthoritativeSnapshot, PersistSnapshot};
use ampere_core::BigValue;
use ampere_sim::{EntityPatch, GeneratorState, OverloadReport};
use tracing::debug;

/// Remote storage for session state
///
/// Implementations may be slow or fail; callers never let that stall a tick.
pub trait Persistence {
    /// Store a snapshot and return the merged authoritative state
    fn save(&mut self, snapshot: &PersistSnapshot) -> Result<AuthoritativeSnapshot>;

    /// Record an overload, optionally returning the authoritative generator state
    fn report_overload(&mut self, report: &OverloadReport) -> Result<Option<EntityPatch>>;
}

/// In-process persistence backed by the binary snapshot cache
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    cache: Option<Vec<u8>>,
    /// Money as the remote layer sees it
    pub money: Option<BigValue>,
    overloads: Vec<OverloadReport>,
    saves: usize,
    fail_next: bool,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call fail
    pub fn fail_next(&mut self) {
        self.fail_next = true;
    }

    /// The most recently saved snapshot
    pub fn last_snapshot(&self) -> Result<Option<PersistSnapshot>> {
        self.cache
            .as_deref()
            .map(PersistSnapshot::from_bytes)
            .transpose()
    }

    /// Overloads reported so far
    pub fn overloads(&self) -> &[OverloadReport] {
        &self.overloads
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }

    fn check_failure(&mut self) -> Result<()> {
        if std::mem::take(&mut self.fail_next) {
            return Err(Error::Persistence("simulated outage".to_string()));
        }
        Ok(())
    }
}

impl Persistence for MemoryPersistence {
    fn save(&mut self, snapshot: &PersistSnapshot) -> Result<AuthoritativeSnapshot> {
        self.check_failure()?;
        self.cache = Some(snapshot.to_bytes()?);
        self.saves += 1;
        debug!(version = snapshot.version, generators = snapshot.generators.len(), "snapshot saved");

        Ok(AuthoritativeSnapshot {
            version: snapshot.version,
            revision: snapshot.revision,
            energy: Some(snapshot.energy.into()),
            money: self.money,
            bonuses: None,
            generators: Vec::new(),
        })
    }

    fn report_overload(&mut self, report: &OverloadReport) -> Result<Option<EntityPatch>> {
        self.check_failure()?;
        self.overloads.push(report.clone());
        Ok(Some(EntityPatch {
            id: report.id,
            revision: report.revision,
            state: GeneratorState::Building,
            heat: 0.0,
            build_complete_at: report.build_complete_at,
        }))
    }
}
