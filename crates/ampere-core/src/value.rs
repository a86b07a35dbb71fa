//! Arbitrary-growth resource values
//!
//! A [`BigValue`] stores a quantity as `mantissa / SCALE * 10^tier`. Every
//! constructor and every operation normalizes its result, so a `BigValue`
//! observed from outside this module always has `mantissa < LIMIT` (or is the
//! canonical zero). Operations never fail: malformed input becomes zero.

use crate::format::format;
use crate::wire::{WireNumber, WireValue};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Sub};

/// Fixed-point scale of the mantissa (three decimal places)
pub const SCALE: u64 = 1_000;

/// Exclusive upper bound of a normalized mantissa
pub const LIMIT: u64 = 1_000_000;

/// log3(10), used by [`BigValue::log3`]
const LOG3_10: f64 = 2.095_903_274_29;

/// Largest power-of-two step applied at once by [`BigValue::multiply_by_pow2`]
const POW2_CHUNK: u32 = 32;

/// A non-negative quantity whose magnitude may exceed `f64`/`u64` precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "WireValue", into = "WireValue")]
pub struct BigValue {
    mantissa: u64,
    tier: u64,
}

impl BigValue {
    /// The canonical zero `{0, 0}`
    pub const ZERO: BigValue = BigValue {
        mantissa: 0,
        tier: 0,
    };

    /// Build a value from raw parts, normalizing them
    pub fn new(mantissa: u64, tier: u64) -> Self {
        normalize(u128::from(mantissa), tier)
    }

    /// Build a value from a plain (unscaled) magnitude
    ///
    /// Negative, `NaN` and infinite inputs become zero.
    pub fn from_plain(plain: f64) -> Self {
        if !plain.is_finite() || plain <= 0.0 {
            return Self::ZERO;
        }
        scaled_product(SCALE as f64, plain, 0)
    }

    /// Build a value from a whole plain magnitude without going through `f64`
    pub fn from_plain_int(plain: u64) -> Self {
        normalize(u128::from(plain) * u128::from(SCALE), 0)
    }

    /// Build a value from its wire parts
    ///
    /// When both parts are absent the legacy plain field is used instead; when
    /// that is absent too the result is zero.
    pub fn from_wire(mantissa: Option<u64>, tier: Option<u64>, fallback_plain: Option<f64>) -> Self {
        match (mantissa, tier) {
            (None, None) => fallback_plain.map_or(Self::ZERO, Self::from_plain),
            (mantissa, tier) => Self::new(mantissa.unwrap_or(0), tier.unwrap_or(0)),
        }
    }

    /// Wire form `(mantissa, tier)`
    pub fn to_wire(&self) -> (u64, u64) {
        (self.mantissa, self.tier)
    }

    /// The normalized mantissa
    pub fn mantissa(&self) -> u64 {
        self.mantissa
    }

    /// The number of overflow promotions
    pub fn tier(&self) -> u64 {
        self.tier
    }

    /// Check if this is the canonical zero
    pub fn is_zero(&self) -> bool {
        self.mantissa == 0
    }

    /// Re-run normalization on the stored parts
    ///
    /// Values are normalized on construction, so this returns `self` unchanged.
    pub fn normalize(self) -> Self {
        Self::new(self.mantissa, self.tier)
    }

    /// Approximate plain magnitude, floored
    ///
    /// Exact at tier 0. Higher tiers go through `f64` and lose precision; very
    /// large tiers yield `f64::INFINITY`.
    pub fn to_plain(&self) -> f64 {
        if self.tier == 0 {
            return (self.mantissa / SCALE) as f64;
        }
        let exponent = 10f64.powf(self.tier as f64);
        (self.mantissa as f64 * exponent / SCALE as f64).floor()
    }

    /// Sum of two values, aligning the smaller tier down to the larger one
    pub fn add(self, other: BigValue) -> BigValue {
        let (high, low) = if self.tier >= other.tier {
            (self, other)
        } else {
            (other, self)
        };
        let aligned = shift_down(low.mantissa, high.tier - low.tier);
        normalize(u128::from(high.mantissa) + u128::from(aligned), high.tier)
    }

    /// Difference of two values, clamped at zero
    pub fn subtract(self, other: BigValue) -> BigValue {
        if self <= other {
            return Self::ZERO;
        }
        // self > other implies self.tier >= other.tier
        let aligned = shift_down(other.mantissa, self.tier - other.tier);
        normalize(u128::from(self.mantissa.saturating_sub(aligned)), self.tier)
    }

    /// Multiply by a non-negative plain factor, flooring the mantissa
    pub fn multiply_by_scalar(self, factor: f64) -> BigValue {
        if !factor.is_finite() || factor <= 0.0 || self.is_zero() {
            return Self::ZERO;
        }
        if factor == 1.0 {
            return self;
        }
        scaled_product(self.mantissa as f64, factor, self.tier)
    }

    /// Multiply by a whole number
    pub fn multiply_by_int(self, factor: u64) -> BigValue {
        normalize(u128::from(self.mantissa) * u128::from(factor), self.tier)
    }

    /// Multiply by `2^exponent`
    ///
    /// Applied in bounded steps so exponents past the `f64` range still
    /// produce a finite value.
    pub fn multiply_by_pow2(self, exponent: u32) -> BigValue {
        let mut value = self;
        let mut remaining = exponent;
        while remaining > 0 && !value.is_zero() {
            let step = remaining.min(POW2_CHUNK);
            value = normalize(u128::from(value.mantissa) << step, value.tier);
            remaining -= step;
        }
        value
    }

    /// Add a plain magnitude
    pub fn add_plain(self, plain: f64) -> BigValue {
        self.add(Self::from_plain(plain))
    }

    /// Subtract a plain magnitude, clamped at zero
    pub fn subtract_plain(self, plain: f64) -> BigValue {
        self.subtract(Self::from_plain(plain))
    }

    /// Compare against a plain magnitude
    pub fn compare_plain(&self, plain: f64) -> Ordering {
        self.cmp(&Self::from_plain(plain))
    }

    /// Base-3 logarithm of the represented quantity, floored at 0
    pub fn log3(&self) -> f64 {
        if self.is_zero() {
            return 0.0;
        }
        let real = self.mantissa.max(1) as f64 / SCALE as f64;
        let value = real.ln() / 3f64.ln() + self.tier as f64 * LOG3_10;
        value.max(0.0)
    }
}

/// Collapse raw parts into the normalized form
fn normalize(mut mantissa: u128, mut tier: u64) -> BigValue {
    while mantissa >= u128::from(LIMIT) {
        mantissa /= 10;
        tier = tier.saturating_add(1);
    }
    if mantissa == 0 {
        return BigValue::ZERO;
    }
    BigValue {
        mantissa: mantissa as u64,
        tier,
    }
}

/// Normalize `mantissa * factor` at `tier`
///
/// When the product leaves the `f64` range, decimal places of `factor` move
/// into the tier first.
fn scaled_product(mantissa: f64, factor: f64, tier: u64) -> BigValue {
    let product = mantissa * factor;
    if product.is_finite() {
        return from_scaled_f64(product, tier);
    }
    let places = (factor.log10().floor() as i32 - 6).max(0);
    let reduced = factor / 10f64.powi(places);
    from_scaled_f64(mantissa * reduced, tier.saturating_add(places as u64))
}

/// Normalize a floating mantissa, flooring at every promotion
fn from_scaled_f64(mut mantissa: f64, mut tier: u64) -> BigValue {
    if !mantissa.is_finite() || mantissa <= 0.0 {
        return BigValue::ZERO;
    }
    let limit = LIMIT as f64;
    while mantissa >= limit {
        mantissa = (mantissa / 10.0).floor();
        tier = tier.saturating_add(1);
    }
    normalize(mantissa.floor() as u128, tier)
}

/// Divide a mantissa by `10^places`, truncating
fn shift_down(mantissa: u64, places: u64) -> u64 {
    // mantissa < 10^6, so six or more places always truncate to zero
    if places >= 7 {
        return 0;
    }
    mantissa / 10u64.pow(places as u32)
}

impl Ord for BigValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tier
            .cmp(&other.tier)
            .then(self.mantissa.cmp(&other.mantissa))
    }
}

impl PartialOrd for BigValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for BigValue {
    type Output = BigValue;

    fn add(self, rhs: BigValue) -> BigValue {
        BigValue::add(self, rhs)
    }
}

impl Sub for BigValue {
    type Output = BigValue;

    fn sub(self, rhs: BigValue) -> BigValue {
        self.subtract(rhs)
    }
}

impl Mul<f64> for BigValue {
    type Output = BigValue;

    fn mul(self, rhs: f64) -> BigValue {
        self.multiply_by_scalar(rhs)
    }
}

impl Sum for BigValue {
    fn sum<I: Iterator<Item = BigValue>>(iter: I) -> BigValue {
        iter.fold(BigValue::ZERO, BigValue::add)
    }
}

impl From<u64> for BigValue {
    fn from(plain: u64) -> Self {
        BigValue::from_plain_int(plain)
    }
}

impl From<WireValue> for BigValue {
    fn from(wire: WireValue) -> Self {
        let part = |n: Option<WireNumber>| n.map(|n| n.to_u64_floor());
        BigValue::from_wire(
            part(wire.mantissa),
            part(wire.tier),
            wire.plain.map(|n| n.to_f64()),
        )
    }
}

impl From<BigValue> for WireValue {
    fn from(value: BigValue) -> Self {
        WireValue::pair(value.mantissa, value.tier)
    }
}

impl fmt::Display for BigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format(self))
    }
}
