//! Core data models for the payslip derivation engine.
//!
//! This module contains all the domain models used throughout the engine.

mod helper;
mod payslip;
mod shift;

pub use helper::{
    CategoryRates, HelperPayProfile, InsuranceEnrollment, PaymentPreference, SalaryMode, TaxColumn,
};
pub use payslip::{
    AllowanceItem, Attendance, DailyAttendance, DeductionItem, Deductions, Derived, Payments,
    Payslip, Totals,
};
pub use shift::{CancelStatus, ShiftRecord, WorkCategory};
