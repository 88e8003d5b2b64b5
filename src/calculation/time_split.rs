//! Night-window time splitting.
//!
//! Splits one shift's [start, end) interval into ordinary and
//! night-differential duration. The night window wraps midnight, so a
//! shift whose end does not follow its start is treated as crossing into
//! the next day on an extended 0..2880-minute timeline.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::NightWindow;

const MINUTES_PER_DAY: u32 = 1440;

/// The result of splitting a shift against the night window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSplit {
    /// Hours outside the night window.
    pub normal_hours: Decimal,
    /// Hours inside the night window.
    pub night_hours: Decimal,
}

/// Converts worked minutes to hours with the statutory rounding policy.
///
/// Minutes that are an exact multiple of a quarter hour convert to exact
/// quarter-hour values; anything else rounds half-up to one decimal place.
///
/// # Example
///
/// ```
/// use payslip_engine::calculation::round_hours;
/// use rust_decimal::Decimal;
///
/// assert_eq!(round_hours(90), Decimal::new(15, 1));  // 1.5
/// assert_eq!(round_hours(50), Decimal::new(8, 1));   // 0.8333... -> 0.8
/// ```
pub fn round_hours(minutes: u32) -> Decimal {
    if minutes % 15 == 0 {
        // Exact quarter hours need no rounding: 15 min = 0.25 h.
        Decimal::from(minutes / 15) * Decimal::new(25, 2)
    } else {
        (Decimal::from(minutes) / Decimal::from(60))
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
    }
}

/// Overlap in minutes of [start, end) with [window_start, window_end).
fn overlap(start: u32, end: u32, window_start: u32, window_end: u32) -> u32 {
    let lo = start.max(window_start);
    let hi = end.min(window_end);
    hi.saturating_sub(lo)
}

/// Splits a shift's start/end times into ordinary and night hours.
///
/// Times are minutes since midnight. When `end_minute <= start_minute`
/// the shift is taken to cross midnight. The rounding policy of
/// [`round_hours`] is applied identically to both components. Pure and
/// infallible; malformed times are the caller's concern.
///
/// # Example
///
/// ```
/// use payslip_engine::calculation::split_shift_hours;
/// use payslip_engine::config::NightWindow;
/// use rust_decimal::Decimal;
///
/// let window = NightWindow { start_minute: 1320, end_minute: 480 };
/// // 21:00 to 23:30: one ordinary hour, then 1.5 night hours.
/// let split = split_shift_hours(21 * 60, 23 * 60 + 30, &window);
/// assert_eq!(split.normal_hours, Decimal::new(10, 1));
/// assert_eq!(split.night_hours, Decimal::new(15, 1));
/// ```
pub fn split_shift_hours(start_minute: u32, end_minute: u32, window: &NightWindow) -> TimeSplit {
    let end = if end_minute <= start_minute {
        end_minute + MINUTES_PER_DAY
    } else {
        end_minute
    };

    // The night window on the extended timeline: [22:00, 24:00) the same
    // evening and [24:00, 24:00 + window_end) the following morning.
    let evening = overlap(start_minute, end, window.start_minute, MINUTES_PER_DAY);
    let morning = overlap(
        start_minute,
        end,
        MINUTES_PER_DAY,
        MINUTES_PER_DAY + window.end_minute,
    );

    let night_minutes = evening + morning;
    let total_minutes = end - start_minute;

    TimeSplit {
        normal_hours: round_hours(total_minutes - night_minutes),
        night_hours: round_hours(night_minutes),
    }
}
