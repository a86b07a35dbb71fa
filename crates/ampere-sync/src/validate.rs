//! Drift checks between local and authoritative values

use ampere_core::BigValue;

/// Relative difference `|a - b| / max(a, b)`, 0 when both are zero
///
/// Computed from mantissa and tier so it stays finite at any magnitude.
pub fn relative_drift(a: BigValue, b: BigValue) -> f64 {
    let (high, low) = if a >= b { (a, b) } else { (b, a) };
    if high.is_zero() {
        return 0.0;
    }
    let diff = high.subtract(low);
    if diff.is_zero() {
        return 0.0;
    }
    let places = high.tier().saturating_sub(diff.tier());
    let ratio = diff.mantissa() as f64 / high.mantissa() as f64;
    ratio / 10f64.powi(places.min(i32::MAX as u64) as i32)
}

/// Whether two values agree within a relative tolerance
pub fn within_tolerance(local: BigValue, remote: BigValue, tolerance: f64) -> bool {
    relative_drift(local, remote) <= tolerance
}
