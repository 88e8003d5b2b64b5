//! Monthly shift aggregation.
//!
//! Turns a helper's shift records for one month into daily and monthly
//! category totals. Invalid records are excluded before classification but
//! never silently dropped: every exclusion is tallied into the result for
//! observability.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::config::NightWindow;
use crate::models::{CancelStatus, DailyAttendance, ShiftRecord, WorkCategory};

use super::time_split::split_shift_hours;

/// Why a shift record was excluded from aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// The record was soft-deleted.
    Deleted,
    /// The record carries no actual performed time.
    NoPerformedTime,
    /// The record was removed from the schedule without time worked.
    RemovedWithoutTime,
    /// The record was cancelled without time worked.
    CancelledWithoutTime,
    /// The service code is not in the classification table.
    UnknownServiceCode {
        /// The unrecognized code.
        code: String,
    },
}

/// A shift record excluded from aggregation, recorded for observability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedShift {
    /// The ID of the excluded shift.
    pub shift_id: String,
    /// The date of the excluded shift.
    pub date: NaiveDate,
    /// Why the shift was excluded.
    pub reason: ExclusionReason,
}

/// Aggregated attendance for one helper and one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAttendance {
    /// Per-day rows, ascending by day of month; only days with work.
    pub daily: Vec<DailyAttendance>,
    /// Ordinary care hours outside the night window.
    pub normal_hours: Decimal,
    /// Ordinary care hours inside the night window.
    pub night_normal_hours: Decimal,
    /// Accompanying care hours outside the night window.
    pub accompany_hours: Decimal,
    /// Accompanying care hours inside the night window.
    pub night_accompany_hours: Decimal,
    /// Office work hours.
    pub office_hours: Decimal,
    /// Sales activity hours.
    pub sales_hours: Decimal,
    /// Sum of all six category totals.
    pub total_hours: Decimal,
    /// Distinct days with any ordinary-care hours.
    pub work_days: u32,
    /// Distinct days with any accompanying-care hours.
    pub accompany_days: u32,
    /// Records excluded from aggregation.
    pub excluded: Vec<ExcludedShift>,
}

fn exclusion_reason(shift: &ShiftRecord) -> Option<ExclusionReason> {
    if shift.deleted {
        return Some(ExclusionReason::Deleted);
    }
    match shift.cancel_status {
        CancelStatus::RemovedWithoutTime => return Some(ExclusionReason::RemovedWithoutTime),
        CancelStatus::CancelledWithoutTime => {
            return Some(ExclusionReason::CancelledWithoutTime);
        }
        CancelStatus::None => {}
    }
    if shift.duration_hours <= Decimal::ZERO {
        return Some(ExclusionReason::NoPerformedTime);
    }
    if shift.category().is_none() {
        return Some(ExclusionReason::UnknownServiceCode {
            code: shift.service_code.clone(),
        });
    }
    None
}

/// Aggregates a month of shift records into daily rows and category totals.
///
/// Exclusions are applied before classification; the normal/night split of
/// each surviving record comes from [`split_shift_hours`] when both times
/// are present, otherwise the raw duration counts entirely as ordinary.
///
/// "Work days" and "accompany days" are the cardinalities of the day sets
/// with more than zero hours in the respective category; a day with both
/// kinds of work counts once in each set.
pub fn aggregate_shifts(shifts: &[ShiftRecord], window: &NightWindow) -> MonthlyAttendance {
    let mut daily: BTreeMap<u32, DailyAttendance> = BTreeMap::new();
    let mut excluded = Vec::new();

    for shift in shifts {
        if let Some(reason) = exclusion_reason(shift) {
            warn!(
                shift_id = %shift.id,
                date = %shift.date,
                ?reason,
                "excluding shift record from aggregation"
            );
            excluded.push(ExcludedShift {
                shift_id: shift.id.clone(),
                date: shift.date,
                reason,
            });
            continue;
        }

        // Exclusions ran first, so the category is known here.
        let Some(category) = shift.category() else {
            continue;
        };

        let (day_hours, night_hours) = match (shift.start_minute, shift.end_minute) {
            (Some(start), Some(end)) if category.has_night_differential() => {
                let split = split_shift_hours(start, end, window);
                (split.normal_hours, split.night_hours)
            }
            _ => (shift.duration_hours, Decimal::ZERO),
        };

        let row = daily
            .entry(shift.date.day())
            .or_insert_with(|| DailyAttendance::empty(shift.date.day()));

        match category {
            WorkCategory::Normal => {
                row.normal += day_hours;
                row.night_normal += night_hours;
            }
            WorkCategory::Accompany => {
                row.accompany += day_hours;
                row.night_accompany += night_hours;
            }
            WorkCategory::Office => row.office += day_hours,
            WorkCategory::Sales => row.sales += day_hours,
        }
    }

    let daily: Vec<DailyAttendance> = daily.into_values().collect();

    let mut totals = MonthlyAttendance {
        daily: Vec::new(),
        normal_hours: Decimal::ZERO,
        night_normal_hours: Decimal::ZERO,
        accompany_hours: Decimal::ZERO,
        night_accompany_hours: Decimal::ZERO,
        office_hours: Decimal::ZERO,
        sales_hours: Decimal::ZERO,
        total_hours: Decimal::ZERO,
        work_days: 0,
        accompany_days: 0,
        excluded,
    };

    for row in &daily {
        totals.normal_hours += row.normal;
        totals.night_normal_hours += row.night_normal;
        totals.accompany_hours += row.accompany;
        totals.night_accompany_hours += row.night_accompany;
        totals.office_hours += row.office;
        totals.sales_hours += row.sales;

        if row.normal + row.night_normal > Decimal::ZERO {
            totals.work_days += 1;
        }
        if row.accompany + row.night_accompany > Decimal::ZERO {
            totals.accompany_days += 1;
        }
    }

    totals.total_hours = totals.normal_hours
        + totals.night_normal_hours
        + totals.accompany_hours
        + totals.night_accompany_hours
        + totals.office_hours
        + totals.sales_hours;
    totals.daily = daily;

    debug!(
        days = totals.daily.len(),
        total_hours = %totals.total_hours,
        excluded = totals.excluded.len(),
        "aggregated monthly attendance"
    );

    totals
}
