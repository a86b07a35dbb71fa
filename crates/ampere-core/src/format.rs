//! Unit-suffix formatting for resource values
//!
//! Renders a [`BigValue`] as `<number><unit>`, e.g. `123`, `1.23K`, `12.3Ud`,
//! `1.23MiDCUd`. The unit is built from layered name tables:
//!
//! - tiers `1..=30` use the base units (`K`, `M`, `B`, ...)
//! - tiers `31..=300` combine a small-unit prefix with a big unit (`Ud`, `DV`)
//! - tiers `301..=3000` add the hundreds marker `C` with a prefix and suffix
//! - larger tiers peel off huge units (`Mi`, `Mc`, `Na`, ...) recursively
//! - past [`E_NOTATION_TIER`] the unit falls back to `e<tier>`

use crate::value::{BigValue, SCALE};

/// Tiers above this render as `e<tier>`
pub const E_NOTATION_TIER: u64 = 300_000_000_000_000;

const BASE_UNITS: [&str; 11] = ["", "K", "M", "B", "T", "Qa", "Qi", "Sx", "Sp", "Oc", "N"];
const COMMON_UNITS: [&str; 10] = ["", "U", "D", "T", "Qa", "Qi", "Sx", "Sp", "Oc", "N"];
const HIGH_COMMON_UNITS: [&str; 9] = ["", "D", "T", "Qa", "Qi", "Sx", "Sp", "Oc", "N"];
const BIG_UNITS: [&str; 10] = ["", "d", "V", "Tr", "Qav", "Qiv", "Sev", "Spv", "Ocv", "Nv"];
const HUGE_UNITS: [&str; 13] = [
    "", "C", "Mi", "Mc", "Na", "Pi", "Fe", "At", "Ze", "Yo", "Xo", "Ve", "Me",
];

/// First tier covered by the huge-unit recursion
const HUGE_START: u64 = 3_001;

/// Tiers covered by the first huge unit (`Mi`): 999 blocks of 3000
const HUGE_FIRST_RANGE: u128 = 3_000 * 999;

/// Format a value for display
///
/// Zero renders as `"0"`. The number shows three significant digits, with the
/// decimal point placed by the tier's position in its 3-step cycle.
pub fn format(value: &BigValue) -> String {
    if value.is_zero() {
        return "0".to_string();
    }

    let tier = value.tier();
    let mut scaled = value.mantissa() as f64 / SCALE as f64;
    match tier % 3 {
        1 => scaled /= 100.0,
        2 => scaled /= 10.0,
        _ => {}
    }

    let text = if scaled >= 100.0 {
        format!("{:.0}", scaled)
    } else if scaled >= 10.0 {
        format!("{:.1}", scaled)
    } else {
        format!("{:.2}", scaled)
    };

    let unit = unit_for_tier(tier);
    text + &unit
}

/// The unit suffix for a tier (empty for tier 0)
pub fn unit_for_tier(tier: u64) -> String {
    match tier {
        0 => String::new(),
        1..=30 => pick(&BASE_UNITS, tier.div_ceil(3)).to_string(),
        31..=300 => {
            let offset = tier - 31;
            let big = offset / 30 + 1;
            let common = (offset % 30) / 3;
            format!("{}{}", pick(&COMMON_UNITS, common), pick(&BIG_UNITS, big))
        }
        301..=3000 => {
            let offset = tier - 301;
            let prefix = prefix_unit(offset / 300);
            let suffix = suffix_unit(offset % 300 + 1);
            format!("{prefix}C{suffix}")
        }
        t if t > E_NOTATION_TIER => format!("e{t}"),
        t => huge_unit(t - HUGE_START),
    }
}

/// Look up a table entry, treating out-of-range indices as empty
fn pick(table: &[&'static str], index: u64) -> &'static str {
    usize::try_from(index)
        .ok()
        .and_then(|i| table.get(i))
        .copied()
        .unwrap_or("")
}

/// Suffix placed after a `C` or huge unit, for a 1-based offset
fn suffix_unit(offset: u64) -> String {
    match offset {
        0 => String::new(),
        1..=30 => pick(&COMMON_UNITS, offset.div_ceil(3) - 1).to_string(),
        _ => unit_for_tier(offset),
    }
}

/// Small-unit and big-unit pair for an index in `0..100`
fn common_big_unit(index: u64) -> String {
    match index {
        0 => String::new(),
        1..=9 => pick(&COMMON_UNITS, index).to_string(),
        _ => {
            let adjusted = index - 10;
            format!(
                "{}{}",
                pick(&COMMON_UNITS, adjusted % 10),
                pick(&BIG_UNITS, adjusted / 10 + 1)
            )
        }
    }
}

/// Multiplier prefix placed before a `C` or huge unit
fn prefix_unit(index: u64) -> String {
    match index {
        0..=8 => pick(&HIGH_COMMON_UNITS, index).to_string(),
        9..=98 => {
            let adjusted = index - 9;
            format!(
                "{}{}",
                pick(&COMMON_UNITS, adjusted % 10),
                pick(&BIG_UNITS, adjusted / 10 + 1)
            )
        }
        _ => {
            let offset = index - 99;
            format!(
                "{}C{}",
                prefix_unit(offset / 100),
                common_big_unit(offset % 100)
            )
        }
    }
}

/// Unit for tiers past 3000, given the 0-based offset from [`HUGE_START`]
///
/// Each huge unit covers 999 blocks, and each block is 1000 times larger than
/// a block of the previous unit (`Mi` blocks span 3000 tiers).
fn huge_unit(offset: u64) -> String {
    let offset = u128::from(offset);
    let mut huge_index = 2usize;
    let mut covered: u128 = 0;
    let mut range = HUGE_FIRST_RANGE;

    while offset >= covered + range {
        covered += range;
        range *= 1000;
        huge_index += 1;
    }

    let relative = offset - covered;
    let block = 3_000u128 * 1000u128.pow((huge_index - 2) as u32);
    let quotient = (relative / block) as u64;
    let remainder = (relative % block) as u64;

    let huge = HUGE_UNITS.get(huge_index).copied().unwrap_or("");
    format!(
        "{}{}{}",
        prefix_unit(quotient),
        huge,
        suffix_unit(remainder + 1)
    )
}
