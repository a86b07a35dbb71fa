//! Generator type lookup

use ampere_core::{BigValue, TypeRef};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The parts of a generator type the simulator needs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneratorMeta {
    /// Energy per second at upgrade level 0
    pub production: BigValue,
    /// Heat per second at upgrade level 0
    pub heat_rate: f64,
    /// Heat threshold at upgrade level 0
    pub tolerance: f64,
    /// Configured build time in seconds (0 = use the default)
    pub build_secs: f64,
}

/// Resolves a type reference to its metadata
///
/// Implemented by loaded definition sets and by [`MemoryCatalog`].
pub trait TypeCatalog {
    /// Look up a type, `None` when it is unknown
    fn generator_meta(&self, type_ref: &TypeRef) -> Option<GeneratorMeta>;
}

/// An in-memory catalog keyed by type reference
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    types: IndexMap<TypeRef, GeneratorMeta>,
}

impl MemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type, replacing any previous entry
    pub fn insert(&mut self, type_ref: impl Into<TypeRef>, meta: GeneratorMeta) {
        self.types.insert(type_ref.into(), meta);
    }

    /// Builder form of [`MemoryCatalog::insert`]
    pub fn with(mut self, type_ref: impl Into<TypeRef>, meta: GeneratorMeta) -> Self {
        self.insert(type_ref, meta);
        self
    }

    /// Remove a type
    pub fn remove(&mut self, type_ref: &TypeRef) -> Option<GeneratorMeta> {
        self.types.shift_remove(type_ref)
    }

    /// Number of known types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeCatalog for MemoryCatalog {
    fn generator_meta(&self, type_ref: &TypeRef) -> Option<GeneratorMeta> {
        self.types.get(type_ref).copied()
    }
}
