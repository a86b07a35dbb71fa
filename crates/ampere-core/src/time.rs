//! Tick timing for the production loop
//!
//! - `Tick` - Logical tick counter
//! - `TickClock` - Wall-clock driven tick scheduling with delta clamping
//!
//! Deltas are measured in seconds between consecutive ticks. They are clamped
//! below by a minimum (so the first tick and clock skew still make progress)
//! and optionally above by a catch-up ceiling.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A discrete tick identifier (logical time unit)
pub type Tick = u64;

/// Clock that drives fixed-interval ticks from wall-clock time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickClock {
    /// Number of ticks processed so far
    pub tick: Tick,
    /// Wall-clock time of the last processed tick
    pub last_tick_at: Option<DateTime<Utc>>,
    /// Nominal interval between ticks
    pub interval_ms: u64,
    /// Smallest delta a tick will report, in seconds
    pub min_delta_secs: f64,
    /// Largest delta a tick will report, in seconds (`None` = unbounded)
    pub max_delta_secs: Option<f64>,
}

impl TickClock {
    /// Create a clock with a 0.5 s minimum delta and no ceiling
    pub fn new(interval_ms: u64) -> Self {
        Self {
            tick: 0,
            last_tick_at: None,
            interval_ms,
            min_delta_secs: 0.5,
            max_delta_secs: None,
        }
    }

    /// Override the delta bounds
    pub fn with_delta_bounds(mut self, min_secs: f64, max_secs: Option<f64>) -> Self {
        self.min_delta_secs = min_secs;
        self.max_delta_secs = max_secs;
        self
    }

    /// Whether a tick should run at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_tick_at {
            None => true,
            Some(last) => now - last >= self.interval(),
        }
    }

    /// When the next tick becomes due (`None` before the first tick or past the end of time)
    pub fn next_due_at(&self) -> Option<DateTime<Utc>> {
        self.last_tick_at
            .and_then(|last| last.checked_add_signed(self.interval()))
    }

    /// Record a tick at `now` and return the clamped delta in seconds
    ///
    /// The first tick has no predecessor and reports the minimum delta.
    pub fn advance(&mut self, now: DateTime<Utc>) -> f64 {
        let raw = match self.last_tick_at {
            Some(last) => (now - last).num_milliseconds() as f64 / 1000.0,
            None => 0.0,
        };
        self.advance_with(now, raw)
    }

    /// Record a tick at `now` with an externally measured delta
    pub fn advance_with(&mut self, now: DateTime<Utc>, raw_secs: f64) -> f64 {
        self.tick += 1;
        self.last_tick_at = Some(now);
        self.clamp_delta(raw_secs)
    }

    /// Apply the delta bounds to a raw delta
    pub fn clamp_delta(&self, raw_secs: f64) -> f64 {
        if raw_secs.is_nan() {
            return self.min_delta_secs;
        }
        let delta = raw_secs.max(self.min_delta_secs);
        match self.max_delta_secs {
            Some(max) if delta > max => max.max(self.min_delta_secs),
            _ => delta,
        }
    }

    fn interval(&self) -> TimeDelta {
        interval_from_ms(self.interval_ms)
    }
}

/// A millisecond interval, saturating at the largest representable delta
pub fn interval_from_ms(ms: u64) -> TimeDelta {
    i64::try_from(ms)
        .ok()
        .and_then(TimeDelta::try_milliseconds)
        .unwrap_or(TimeDelta::MAX)
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_first_tick_uses_minimum() {
        let mut clock = TickClock::new(1000);
        assert!(clock.is_due(at(0)));
        assert_eq!(clock.advance(at(0)), 0.5);
        assert_eq!(clock.tick, 1);
        assert_eq!(clock.next_due_at(), Some(at(1)));
    }

    #[test]
    fn test_regular_ticks() {
        let mut clock = TickClock::new(1000);
        clock.advance(at(0));
        assert!(!clock.is_due(at(0)));
        assert!(clock.is_due(at(1)));
        assert_eq!(clock.advance(at(1)), 1.0);
        assert_eq!(clock.advance(at(4)), 3.0);
        assert_eq!(clock.tick, 3);
    }

    #[test]
    fn test_clock_skew_clamps_to_minimum() {
        let mut clock = TickClock::new(1000);
        clock.advance(at(10));
        assert_eq!(clock.advance(at(5)), 0.5);
    }

    #[test]
    fn test_advance_with_external_delta() {
        let mut clock = TickClock::new(1000);
        assert_eq!(clock.advance_with(at(0), 1.0), 1.0);
        assert_eq!(clock.advance_with(at(1), 0.2), 0.5);
        assert_eq!(clock.tick, 2);
        assert_eq!(clock.last_tick_at, Some(at(1)));
    }

    #[test]
    fn test_catch_up_ceiling() {
        let clock = TickClock::new(1000).with_delta_bounds(0.5, Some(60.0));
        assert_eq!(clock.clamp_delta(3600.0), 60.0);
        assert_eq!(clock.clamp_delta(f64::NAN), 0.5);
        assert_eq!(clock.clamp_delta(0.1), 0.5);

        let unbounded = TickClock::default();
        assert_eq!(unbounded.clamp_delta(3600.0), 3600.0);
    }

    #[test]
    fn test_huge_interval_saturates() {
        assert_eq!(interval_from_ms(u64::MAX), TimeDelta::MAX);

        let mut clock = TickClock::new(u64::MAX);
        clock.advance(at(0));
        assert!(!clock.is_due(at(3_600)));
        assert_eq!(clock.next_due_at(), None);
    }
}
