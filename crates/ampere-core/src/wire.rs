//! Wire representation of resource values
//!
//! The persistence layer exchanges values as a `(mantissa, tier)` pair. Older
//! records carry a single plain number instead, and hand-edited or legacy
//! payloads may hold strings, negatives or garbage. Decoding never fails:
//! anything that is not a usable non-negative number reads as zero.

use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A leniently decoded wire number
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WireNumber {
    /// A whole non-negative number
    Int(u64),
    /// A floating point number (may be fractional or negative)
    Float(f64),
    /// Anything else: negative integers, non-numeric text, lists, maps
    Invalid,
}

impl WireNumber {
    /// Floor to a non-negative integer; invalid input reads as 0
    pub fn to_u64_floor(self) -> u64 {
        match self {
            WireNumber::Int(n) => n,
            WireNumber::Float(f) if f.is_finite() && f > 0.0 => f.floor() as u64,
            _ => 0,
        }
    }

    /// Read as a plain magnitude; invalid input reads as 0
    pub fn to_f64(self) -> f64 {
        match self {
            WireNumber::Int(n) => n as f64,
            WireNumber::Float(f) if f.is_finite() && f > 0.0 => f,
            _ => 0.0,
        }
    }
}

impl Serialize for WireNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WireNumber::Int(n) => serializer.serialize_u64(*n),
            WireNumber::Float(f) => serializer.serialize_f64(*f),
            WireNumber::Invalid => serializer.serialize_u64(0),
        }
    }
}

struct WireNumberVisitor;

impl<'de> Visitor<'de> for WireNumberVisitor {
    type Value = WireNumber;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<WireNumber, E> {
        Ok(WireNumber::Int(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<WireNumber, E> {
        Ok(u64::try_from(v).map_or(WireNumber::Invalid, WireNumber::Int))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<WireNumber, E> {
        Ok(WireNumber::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<WireNumber, E> {
        let v = v.trim();
        if let Ok(n) = v.parse::<u64>() {
            return Ok(WireNumber::Int(n));
        }
        Ok(v.parse::<f64>().map_or(WireNumber::Invalid, WireNumber::Float))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<WireNumber, E> {
        Ok(WireNumber::Invalid)
    }

    fn visit_unit<E: de::Error>(self) -> Result<WireNumber, E> {
        Ok(WireNumber::Invalid)
    }

    fn visit_none<E: de::Error>(self) -> Result<WireNumber, E> {
        Ok(WireNumber::Invalid)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<WireNumber, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<WireNumber, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(WireNumber::Invalid)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<WireNumber, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(WireNumber::Invalid)
    }
}

impl<'de> Deserialize<'de> for WireNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(WireNumberVisitor)
    }
}

/// A value as it travels to and from the persistence layer
///
/// `data`/`high` are accepted as aliases of `mantissa`/`tier` for records
/// written by older clients.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WireValue {
    #[serde(default, alias = "data", skip_serializing_if = "Option::is_none")]
    pub mantissa: Option<WireNumber>,
    #[serde(default, alias = "high", skip_serializing_if = "Option::is_none")]
    pub tier: Option<WireNumber>,
    /// Legacy single plain-number field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plain: Option<WireNumber>,
}

impl WireValue {
    /// A well-formed `(mantissa, tier)` pair
    pub fn pair(mantissa: u64, tier: u64) -> Self {
        Self {
            mantissa: Some(WireNumber::Int(mantissa)),
            tier: Some(WireNumber::Int(tier)),
            plain: None,
        }
    }

    /// A legacy record holding only a plain number
    pub fn legacy(plain: f64) -> Self {
        Self {
            mantissa: None,
            tier: None,
            plain: Some(WireNumber::Float(plain)),
        }
    }
}
