//! Outbound commands produced by the simulator

use ampere_core::GeneratorId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Work for collaborators outside the simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cmd {
    /// No operation
    None,

    /// Batch multiple commands
    Batch(Vec<Cmd>),

    /// Tell the persistence layer a generator overloaded
    ReportOverload(OverloadReport),

    /// A build finished; progress views should refresh
    RefreshProgress { id: GeneratorId },
}

/// An overload applied locally and awaiting confirmation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverloadReport {
    pub id: GeneratorId,
    /// Generator revision after the local reset
    pub revision: u64,
    /// Heat at the moment of overload
    pub heat: f64,
    pub tolerance: f64,
    pub build_complete_at: Option<DateTime<Utc>>,
    pub at: DateTime<Utc>,
}

impl Cmd {
    /// Create an empty command
    pub fn none() -> Self {
        Cmd::None
    }

    /// Create a batch of commands
    pub fn batch(cmds: Vec<Cmd>) -> Self {
        // Flatten nested batches and filter out None
        let mut flattened: Vec<Cmd> = cmds
            .into_iter()
            .flat_map(|cmd| match cmd {
                Cmd::None => vec![],
                Cmd::Batch(inner) => inner,
                other => vec![other],
            })
            .collect();

        match flattened.len() {
            0 => Cmd::None,
            1 => flattened.pop().unwrap_or(Cmd::None),
            _ => Cmd::Batch(flattened),
        }
    }

    /// Check if this is a None command
    pub fn is_none(&self) -> bool {
        matches!(self, Cmd::None)
    }

    /// Iterate over the leaf commands
    pub fn iter(&self) -> Box<dyn Iterator<Item = &Cmd> + '_> {
        match self {
            Cmd::None => Box::new(std::iter::empty()),
            Cmd::Batch(cmds) => Box::new(cmds.iter().flat_map(|cmd| cmd.iter())),
            other => Box::new(std::iter::once(other)),
        }
    }
}
