//! Ampere Core - Numeric and timing primitives for the ampere idle engine
//!
//! This crate provides the types every other ampere crate builds on:
//! - `BigValue` - Non-negative quantities that grow past `f64`/`u64` range
//! - Unit-suffix formatting (`1.23K`, `12.3Ud`, `1.23MiDCUd`)
//! - Lenient wire decoding for values from the persistence layer
//! - Generator and type identifiers
//! - Tick clock with delta clamping
//!
//! ## BigValue
//!
//! A `BigValue` stores `mantissa / 1000 * 10^tier`. All arithmetic is total:
//! malformed or negative input becomes zero and nothing panics.
//!
//! ```
//! use ampere_core::BigValue;
//!
//! let a = BigValue::from_plain(1_500.0);
//! let b = BigValue::from_plain(250.0);
//! assert_eq!((a + b).to_plain(), 1_750.0);
//! assert_eq!(a.to_string(), "1.50K");
//! ```

pub mod format;
mod identity;
pub mod time;
mod value;
pub mod wire;

pub use format::{format, unit_for_tier};
pub use identity::{GeneratorId, TypeRef};
pub use time::{interval_from_ms, Tick, TickClock};
pub use value::{BigValue, LIMIT, SCALE};
pub use wire::{WireNumber, WireValue};
