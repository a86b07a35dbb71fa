//! Events observed by display and diagnostics layers

use ampere_core::{GeneratorId, TypeRef};
use serde::{Deserialize, Serialize};

/// Something that happened to the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    Placed { id: GeneratorId, type_ref: TypeRef },
    Demolished { id: GeneratorId },
    BuildCompleted { id: GeneratorId },
    Overloaded { id: GeneratorId, heat: f64, tolerance: f64 },
    /// The generator's type could not be resolved; it only cools until it can
    Degraded { id: GeneratorId, type_ref: TypeRef },
    Paused { id: GeneratorId },
    Resumed { id: GeneratorId },
}

impl SimEvent {
    /// The generator this event concerns
    pub fn generator(&self) -> GeneratorId {
        match self {
            SimEvent::Placed { id, .. }
            | SimEvent::Demolished { id }
            | SimEvent::BuildCompleted { id }
            | SimEvent::Overloaded { id, .. }
            | SimEvent::Degraded { id, .. }
            | SimEvent::Paused { id }
            | SimEvent::Resumed { id } => *id,
        }
    }
}
