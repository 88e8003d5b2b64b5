//! Shift record model and service-type classification.
//!
//! Shift records are owned by the scheduling subsystem and consumed here as
//! read-only input. Classification of a service code into a payroll work
//! category lives in one place, [`WorkCategory::from_code`], so adding or
//! auditing a mapping is a one-line change.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Cancellation state of a shift record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelStatus {
    /// The shift was performed as scheduled.
    None,
    /// The shift was removed from the schedule with no time worked.
    RemovedWithoutTime,
    /// The shift was cancelled with no time worked.
    CancelledWithoutTime,
}

/// Payroll work category a service code classifies into.
///
/// # Example
///
/// ```
/// use payslip_engine::models::WorkCategory;
///
/// assert_eq!(WorkCategory::from_code("physical_care"), Some(WorkCategory::Normal));
/// assert_eq!(WorkCategory::from_code("mystery_code"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkCategory {
    /// Ordinary care work (身体介護, 生活援助, 家事援助).
    Normal,
    /// Accompanying care work (通院・外出同行).
    Accompany,
    /// Office work at the business location.
    Office,
    /// Sales activity.
    Sales,
}

impl WorkCategory {
    /// Classifies a service-type code into a work category.
    ///
    /// Returns `None` for unknown codes; callers treat that as a
    /// data-quality exclusion rather than an error.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "physical_care" | "daily_living_aid" | "home_care" => Some(Self::Normal),
            "accompany_outing" | "accompany_hospital" => Some(Self::Accompany),
            "office_work" => Some(Self::Office),
            "sales_activity" => Some(Self::Sales),
            _ => None,
        }
    }

    /// Returns true if this category carries a night differential when the
    /// shift overlaps the statutory night window.
    pub fn has_night_differential(self) -> bool {
        matches!(self, Self::Normal | Self::Accompany)
    }
}

/// A single shift record for one helper on one day.
///
/// Times are minutes since midnight and may be absent when the record only
/// carries a pre-computed duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftRecord {
    /// Unique identifier for the shift.
    pub id: String,
    /// The date the shift was worked.
    pub date: NaiveDate,
    /// Start time as minutes since midnight, when known.
    pub start_minute: Option<u32>,
    /// End time as minutes since midnight, when known.
    pub end_minute: Option<u32>,
    /// Duration in hours; authoritative when start/end are absent.
    pub duration_hours: Decimal,
    /// The service-type code from the scheduling subsystem.
    pub service_code: String,
    /// Cancellation state of the record.
    #[serde(default = "CancelStatus::none")]
    pub cancel_status: CancelStatus,
    /// Whether the record has been soft-deleted.
    #[serde(default)]
    pub deleted: bool,
}

impl CancelStatus {
    fn none() -> Self {
        Self::None
    }
}

impl ShiftRecord {
    /// Returns the work category for this record's service code, or `None`
    /// for an unknown code.
    pub fn category(&self) -> Option<WorkCategory> {
        WorkCategory::from_code(&self.service_code)
    }

    /// Returns true when both start and end times are present.
    pub fn has_times(&self) -> bool {
        self.start_minute.is_some() && self.end_minute.is_some()
    }
}
