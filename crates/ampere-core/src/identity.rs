//! Identity types for generators and generator types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a placed generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneratorId(pub u64);

impl GeneratorId {
    /// Create a new generator ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for GeneratorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "generator:{}", self.0)
    }
}

/// Reference to a generator type definition
///
/// String based so catalog files can name types directly
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeRef(pub String);

impl TypeRef {
    /// Create a new type reference
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the reference as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TypeRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_id() {
        let id = GeneratorId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(format!("{}", id), "generator:42");
    }

    #[test]
    fn test_type_ref() {
        let kind = TypeRef::new("wind_turbine");
        assert_eq!(kind.as_str(), "wind_turbine");
        assert_eq!(format!("{}", kind), "wind_turbine");
        assert_eq!(TypeRef::from("wind_turbine"), kind);
    }

    #[test]
    fn test_type_ref_is_transparent() {
        let json = serde_json::to_string(&TypeRef::from("solar")).unwrap();
        assert_eq!(json, "\"solar\"");
    }
}
