//! Error types for ampere-sync

use thiserror::Error;

/// Sync error type
#[derive(Debug, Error)]
pub enum Error {
    /// The persistence collaborator failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary cache encoding or decoding failed
    #[error("Cache encoding error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Too many commands awaiting completion
    #[error("Outbox full ({capacity} in flight)")]
    OutboxFull { capacity: usize },

    /// A completion arrived for a ticket that is not in flight
    #[error("Unknown ticket {0}")]
    UnknownTicket(u64),
}

/// Result type for sync operations
pub type Result<T> = std::result::Result<T, Error>;
