//! Error types for ampere-sim

use crate::generator::GeneratorState;
use ampere_core::{GeneratorId, TypeRef};
use thiserror::Error;

/// Simulator error type
///
/// Only external mutations fail. A tick always completes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Generator not found: {0}")]
    GeneratorNotFound(GeneratorId),

    #[error("Generator already exists: {0}")]
    DuplicateGenerator(GeneratorId),

    #[error("Unknown generator type: {0}")]
    UnknownType(TypeRef),

    #[error("Generator capacity reached ({limit})")]
    CapacityReached { limit: usize },

    #[error("Cannot {action} {id} while {from}")]
    InvalidTransition {
        id: GeneratorId,
        from: GeneratorState,
        action: &'static str,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
