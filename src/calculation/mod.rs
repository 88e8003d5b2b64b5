//! Calculation logic for the payslip derivation engine.
//!
//! This module contains the derivation pipeline: night-window time
//! splitting, monthly shift aggregation, social-insurance premium
//! calculation, withholding tax calculation, and the ordered
//! recomputation pass over the payslip aggregate.

mod aggregation;
mod insurance;
mod recalculation;
mod time_split;
mod withholding;

pub use aggregation::{ExcludedShift, ExclusionReason, MonthlyAttendance, aggregate_shifts};
pub use insurance::{InsuranceInput, InsurancePremiumCalculator, InsurancePremiums};
pub use recalculation::{PayslipEngine, RecalculationReport, StageAnomaly};
pub use time_split::{TimeSplit, round_hours, split_shift_hours};
pub use withholding::WithholdingTaxCalculator;
