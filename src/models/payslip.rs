//! The payslip aggregate and its override-pin machinery.
//!
//! A [`Payslip`] is created once per (helper, year, month) and then edited
//! incrementally. Every derived numeric field is a [`Derived`] value: either
//! `Computed` (the engine may overwrite it) or `Pinned` (a human typed it and
//! recomputation must leave it alone while still propagating it downstream).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// A derived field that may be pinned by a manual edit.
///
/// Replaces the scattered `manual_x` boolean flags of the original design
/// with a single sum type, so each recompute stage is a one-line
/// [`Derived::update`] instead of an externally-tracked boolean check.
///
/// # Example
///
/// ```
/// use payslip_engine::models::Derived;
/// use rust_decimal::Decimal;
///
/// let mut field = Derived::Computed(Decimal::ZERO);
/// field.update(Decimal::new(100, 0));
/// assert_eq!(field.value(), Decimal::new(100, 0));
///
/// field.pin(Decimal::new(42, 0));
/// field.update(Decimal::new(999, 0)); // ignored, the pin wins
/// assert_eq!(field.value(), Decimal::new(42, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Derived<T> {
    /// The engine computed this value and may overwrite it.
    Computed(T),
    /// A human set this value; recomputation must not overwrite it.
    Pinned(T),
}

impl<T: Copy> Derived<T> {
    /// Returns the current value regardless of pin state.
    pub fn value(&self) -> T {
        match self {
            Self::Computed(v) | Self::Pinned(v) => *v,
        }
    }
}

impl<T> Derived<T> {
    /// Returns true if the field is pinned.
    pub fn is_pinned(&self) -> bool {
        matches!(self, Self::Pinned(_))
    }

    /// Pins the field to a manually-entered value.
    pub fn pin(&mut self, value: T) {
        *self = Self::Pinned(value);
    }

    /// Overwrites the value only when the field is not pinned.
    pub fn update(&mut self, value: T) {
        if let Self::Computed(_) = self {
            *self = Self::Computed(value);
        }
    }

    /// Clears the pin, keeping the current value as a computed one.
    pub fn unpin(self) -> Self {
        match self {
            Self::Pinned(v) | Self::Computed(v) => Self::Computed(v),
        }
    }
}

impl<T: Default> Default for Derived<T> {
    fn default() -> Self {
        Self::Computed(T::default())
    }
}

/// Hours worked per category on a single day of the month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAttendance {
    /// Day of month (1-based).
    pub day: u32,
    /// Ordinary care hours outside the night window.
    pub normal: Decimal,
    /// Ordinary care hours inside the night window.
    pub night_normal: Decimal,
    /// Accompanying care hours outside the night window.
    pub accompany: Decimal,
    /// Accompanying care hours inside the night window.
    pub night_accompany: Decimal,
    /// Office work hours.
    pub office: Decimal,
    /// Sales activity hours.
    pub sales: Decimal,
}

impl DailyAttendance {
    /// Returns an empty row for the given day.
    pub fn empty(day: u32) -> Self {
        Self {
            day,
            normal: Decimal::ZERO,
            night_normal: Decimal::ZERO,
            accompany: Decimal::ZERO,
            night_accompany: Decimal::ZERO,
            office: Decimal::ZERO,
            sales: Decimal::ZERO,
        }
    }

    /// Total hours across all categories for this day.
    pub fn total(&self) -> Decimal {
        self.normal
            + self.night_normal
            + self.accompany
            + self.night_accompany
            + self.office
            + self.sales
    }
}

/// Monthly attendance section of a payslip.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Attendance {
    /// Per-day breakdown; one row per day that had any work.
    pub daily: Vec<DailyAttendance>,
    /// Ordinary care hours outside the night window.
    pub normal_hours: Derived<Decimal>,
    /// Ordinary care hours inside the night window.
    pub night_normal_hours: Derived<Decimal>,
    /// Accompanying care hours outside the night window.
    pub accompany_hours: Derived<Decimal>,
    /// Accompanying care hours inside the night window.
    pub night_accompany_hours: Derived<Decimal>,
    /// Office work hours.
    pub office_hours: Derived<Decimal>,
    /// Sales activity hours.
    pub sales_hours: Derived<Decimal>,
    /// Total worked hours across all categories.
    pub total_hours: Derived<Decimal>,
    /// Count of distinct days with any ordinary-care hours.
    pub work_days: Derived<u32>,
    /// Count of distinct days with any accompanying-care hours.
    pub accompany_days: Derived<u32>,
}

impl Attendance {
    /// Sum of the six category hour totals.
    pub fn category_hours_sum(&self) -> Decimal {
        self.normal_hours.value()
            + self.night_normal_hours.value()
            + self.accompany_hours.value()
            + self.night_accompany_hours.value()
            + self.office_hours.value()
            + self.sales_hours.value()
    }

    /// Returns true if any hour-total field carries a pin.
    pub fn any_hours_pinned(&self) -> bool {
        self.normal_hours.is_pinned()
            || self.night_normal_hours.is_pinned()
            || self.accompany_hours.is_pinned()
            || self.night_accompany_hours.is_pinned()
            || self.office_hours.is_pinned()
            || self.sales_hours.is_pinned()
            || self.total_hours.is_pinned()
    }
}

/// A named allowance line, tagged taxable or non-taxable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowanceItem {
    /// Display name of the allowance.
    pub name: String,
    /// Amount in yen.
    pub amount: Decimal,
    /// Whether the allowance is subject to income tax.
    pub taxable: bool,
}

/// Payments section of a payslip.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Payments {
    /// Pay for ordinary care outside the night window.
    pub normal_pay: Derived<Decimal>,
    /// Pay for ordinary care inside the night window.
    pub night_normal_pay: Derived<Decimal>,
    /// Pay for accompanying care outside the night window.
    pub accompany_pay: Derived<Decimal>,
    /// Pay for accompanying care inside the night window.
    pub night_accompany_pay: Derived<Decimal>,
    /// Pay for office work.
    pub office_pay: Derived<Decimal>,
    /// Pay for sales activity.
    pub sales_pay: Derived<Decimal>,
    /// Non-taxable commuting allowance.
    pub transport_allowance: Derived<Decimal>,
    /// Additional allowance lines.
    pub other_allowances: Vec<AllowanceItem>,
    /// Total of all payment lines and allowances.
    pub total_payment: Derived<Decimal>,
}

impl Payments {
    /// Sum of the six category pay lines.
    pub fn category_pay_sum(&self) -> Decimal {
        self.normal_pay.value()
            + self.night_normal_pay.value()
            + self.accompany_pay.value()
            + self.night_accompany_pay.value()
            + self.office_pay.value()
            + self.sales_pay.value()
    }

    /// Sum of taxable other-allowance lines.
    pub fn taxable_allowance_total(&self) -> Decimal {
        self.other_allowances
            .iter()
            .filter(|a| a.taxable)
            .map(|a| a.amount)
            .sum()
    }

    /// Sum of non-taxable other-allowance lines (the transport allowance is
    /// its own field and not included here).
    pub fn non_taxable_allowance_total(&self) -> Decimal {
        self.other_allowances
            .iter()
            .filter(|a| !a.taxable)
            .map(|a| a.amount)
            .sum()
    }
}

/// A named deduction line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionItem {
    /// Display name of the deduction.
    pub name: String,
    /// Amount in yen.
    pub amount: Decimal,
}

/// Deductions section of a payslip.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Deductions {
    /// Health insurance premium (健康保険料).
    pub health: Derived<Decimal>,
    /// Long-term care insurance premium (介護保険料).
    pub care: Derived<Decimal>,
    /// Employees' pension premium (厚生年金保険料).
    pub pension: Derived<Decimal>,
    /// Employment insurance premium (雇用保険料).
    pub employment: Derived<Decimal>,
    /// Sum of the four insurance lines.
    pub social_insurance_total: Derived<Decimal>,
    /// Taxable amount fed to the withholding calculator.
    pub taxable_amount: Derived<Decimal>,
    /// Withheld income tax.
    pub income_tax: Derived<Decimal>,
    /// Resident tax; operator-entered, never derived by the engine.
    pub resident_tax: Decimal,
    /// Additional deduction lines.
    pub other_items: Vec<DeductionItem>,
    /// Grand total of all deductions.
    pub total_deduction: Derived<Decimal>,
}

impl Deductions {
    /// Sum of the four insurance premium lines.
    pub fn insurance_lines_sum(&self) -> Decimal {
        self.health.value() + self.care.value() + self.pension.value() + self.employment.value()
    }

    /// Sum of other deduction items.
    pub fn other_items_total(&self) -> Decimal {
        self.other_items.iter().map(|d| d.amount).sum()
    }
}

/// Totals section of a payslip.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Totals {
    /// Net payment (payments minus deductions).
    pub net_payment: Derived<Decimal>,
    /// Amount transferred to the helper's bank account.
    pub bank_transfer: Derived<Decimal>,
    /// Amount handed over in cash.
    pub cash_payment: Derived<Decimal>,
}

/// The derived payslip aggregate for one helper and one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payslip {
    /// Unique identifier for this payslip.
    pub id: Uuid,
    /// The helper the payslip belongs to.
    pub helper_id: String,
    /// Payroll year.
    pub year: i32,
    /// Payroll month (1-12).
    pub month: u32,
    /// When the payslip was first generated.
    pub generated_at: DateTime<Utc>,
    /// Attendance section.
    pub attendance: Attendance,
    /// Payments section.
    pub payments: Payments,
    /// Deductions section.
    pub deductions: Deductions,
    /// Totals section.
    pub totals: Totals,
}

impl Payslip {
    /// Creates an empty payslip with every derived field computed-zero.
    pub fn new(helper_id: impl Into<String>, year: i32, month: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            helper_id: helper_id.into(),
            year,
            month,
            generated_at: Utc::now(),
            attendance: Attendance::default(),
            payments: Payments::default(),
            deductions: Deductions::default(),
            totals: Totals::default(),
        }
    }

    /// Checks the aggregate's consistency invariants.
    ///
    /// Called after every recomputation pass; a violation means the caller
    /// must reject the recomputation rather than persist the payslip.
    ///
    /// A pinned total is authoritative and deliberately decoupled from its
    /// components, so each sum check is skipped while the total on its
    /// left-hand side carries a pin; the pinned value still propagates
    /// into every downstream formula. The daily-rows check is likewise
    /// skipped while any attendance hour field is pinned.
    pub fn check_invariants(&self) -> EngineResult<()> {
        let attendance = &self.attendance;
        if !attendance.total_hours.is_pinned()
            && attendance.total_hours.value() != attendance.category_hours_sum()
        {
            return Err(EngineError::InvariantViolation {
                field: "attendance.total_hours".to_string(),
                message: format!(
                    "total {} does not equal category sum {}",
                    attendance.total_hours.value(),
                    attendance.category_hours_sum()
                ),
            });
        }

        if !attendance.daily.is_empty() && !attendance.any_hours_pinned() {
            let daily_sum: Decimal = attendance.daily.iter().map(DailyAttendance::total).sum();
            if attendance.total_hours.value() != daily_sum {
                return Err(EngineError::InvariantViolation {
                    field: "attendance.daily".to_string(),
                    message: format!(
                        "total {} does not equal daily sum {}",
                        attendance.total_hours.value(),
                        daily_sum
                    ),
                });
            }
        }

        let deductions = &self.deductions;
        if !deductions.social_insurance_total.is_pinned()
            && deductions.social_insurance_total.value() != deductions.insurance_lines_sum()
        {
            return Err(EngineError::InvariantViolation {
                field: "deductions.social_insurance_total".to_string(),
                message: format!(
                    "total {} does not equal sum of insurance lines {}",
                    deductions.social_insurance_total.value(),
                    deductions.insurance_lines_sum()
                ),
            });
        }

        let expected_deduction = deductions.social_insurance_total.value()
            + deductions.income_tax.value()
            + deductions.resident_tax
            + deductions.other_items_total();
        if !deductions.total_deduction.is_pinned()
            && deductions.total_deduction.value() != expected_deduction
        {
            return Err(EngineError::InvariantViolation {
                field: "deductions.total_deduction".to_string(),
                message: format!(
                    "total {} does not equal component sum {}",
                    deductions.total_deduction.value(),
                    expected_deduction
                ),
            });
        }

        let expected_net =
            self.payments.total_payment.value() - deductions.total_deduction.value();
        if !self.totals.net_payment.is_pinned() && self.totals.net_payment.value() != expected_net
        {
            return Err(EngineError::InvariantViolation {
                field: "totals.net_payment".to_string(),
                message: format!(
                    "net {} does not equal payments minus deductions {}",
                    self.totals.net_payment.value(),
                    expected_net
                ),
            });
        }

        let split = self.totals.bank_transfer.value() + self.totals.cash_payment.value();
        if !self.totals.bank_transfer.is_pinned() && split != self.totals.net_payment.value() {
            return Err(EngineError::InvariantViolation {
                field: "totals.bank_transfer".to_string(),
                message: format!(
                    "bank plus cash {} does not equal net payment {}",
                    split,
                    self.totals.net_payment.value()
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_derived_update_overwrites_computed() {
        let mut field = Derived::Computed(dec("0"));
        field.update(dec("150"));
        assert_eq!(field.value(), dec("150"));
        assert!(!field.is_pinned());
    }

    #[test]
    fn test_derived_update_preserves_pin() {
        let mut field = Derived::Pinned(dec("42"));
        field.update(dec("999"));
        assert_eq!(field.value(), dec("42"));
        assert!(field.is_pinned());
    }

    #[test]
    fn test_derived_pin_and_unpin() {
        let mut field: Derived<Decimal> = Derived::default();
        field.pin(dec("10"));
        assert!(field.is_pinned());

        let field = field.unpin();
        assert!(!field.is_pinned());
        assert_eq!(field.value(), dec("10"));
    }

    #[test]
    fn test_derived_serialization() {
        let computed = Derived::Computed(dec("8.0"));
        assert_eq!(
            serde_json::to_string(&computed).unwrap(),
            "{\"computed\":\"8.0\"}"
        );

        let pinned = Derived::Pinned(dec("8.5"));
        assert_eq!(
            serde_json::to_string(&pinned).unwrap(),
            "{\"pinned\":\"8.5\"}"
        );

        let round_trip: Derived<Decimal> =
            serde_json::from_str("{\"pinned\":\"8.5\"}").unwrap();
        assert_eq!(round_trip, pinned);
    }

    #[test]
    fn test_daily_attendance_total() {
        let mut row = DailyAttendance::empty(15);
        row.normal = dec("3.0");
        row.night_normal = dec("1.5");
        row.office = dec("2.0");
        assert_eq!(row.total(), dec("6.5"));
    }

    fn consistent_payslip() -> Payslip {
        let mut slip = Payslip::new("helper_001", 2026, 4);

        slip.attendance.normal_hours.update(dec("80"));
        slip.attendance.office_hours.update(dec("20"));
        slip.attendance.total_hours.update(dec("100"));
        slip.attendance.daily = vec![
            DailyAttendance {
                day: 1,
                normal: dec("80"),
                night_normal: dec("0"),
                accompany: dec("0"),
                night_accompany: dec("0"),
                office: dec("20"),
                sales: dec("0"),
            },
        ];

        slip.payments.normal_pay.update(dec("120000"));
        slip.payments.office_pay.update(dec("22000"));
        slip.payments.total_payment.update(dec("142000"));

        slip.deductions.health.update(dec("7270"));
        slip.deductions.pension.update(dec("12993"));
        slip.deductions.employment.update(dec("781"));
        slip.deductions.social_insurance_total.update(dec("21044"));
        slip.deductions.income_tax.update(dec("1500"));
        slip.deductions.total_deduction.update(dec("22544"));

        slip.totals.net_payment.update(dec("119456"));
        slip.totals.bank_transfer.update(dec("119456"));
        slip.totals.cash_payment.update(dec("0"));

        slip
    }

    #[test]
    fn test_invariants_hold_for_consistent_payslip() {
        let slip = consistent_payslip();
        assert!(slip.check_invariants().is_ok());
    }

    #[test]
    fn test_invariant_violation_on_total_hours_mismatch() {
        let mut slip = consistent_payslip();
        slip.attendance.total_hours.update(dec("99"));

        let err = slip.check_invariants().unwrap_err();
        match err {
            EngineError::InvariantViolation { field, .. } => {
                assert_eq!(field, "attendance.total_hours");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invariant_violation_on_insurance_sum_mismatch() {
        let mut slip = consistent_payslip();
        slip.deductions.social_insurance_total.update(dec("1"));

        let err = slip.check_invariants().unwrap_err();
        match err {
            EngineError::InvariantViolation { field, .. } => {
                assert_eq!(field, "deductions.social_insurance_total");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invariant_violation_on_bank_cash_split() {
        let mut slip = consistent_payslip();
        slip.totals.cash_payment.update(dec("100"));

        let err = slip.check_invariants().unwrap_err();
        match err {
            EngineError::InvariantViolation { field, .. } => {
                assert_eq!(field, "totals.bank_transfer");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_daily_check_skipped_when_hours_pinned() {
        let mut slip = consistent_payslip();
        // Pin a category total away from what the daily rows say, and keep
        // the dependent totals arithmetically consistent with the pin.
        slip.attendance.normal_hours.pin(dec("90"));
        slip.attendance.total_hours.update(dec("110"));

        assert!(slip.check_invariants().is_ok());
    }

    #[test]
    fn test_sum_checks_skipped_for_pinned_totals() {
        let mut slip = consistent_payslip();
        // Each pinned total disagrees with its components; the pin wins.
        slip.deductions.social_insurance_total.pin(dec("20000"));
        slip.deductions.total_deduction.pin(dec("30000"));
        slip.totals.net_payment.pin(dec("100000"));
        slip.totals.bank_transfer.pin(dec("50000"));
        slip.attendance.total_hours.pin(dec("120"));

        assert!(slip.check_invariants().is_ok());
    }

    #[test]
    fn test_computed_total_mismatch_still_rejected() {
        let mut slip = consistent_payslip();
        slip.totals.net_payment.update(dec("1"));

        let err = slip.check_invariants().unwrap_err();
        match err {
            EngineError::InvariantViolation { field, .. } => {
                assert_eq!(field, "totals.net_payment");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_resident_tax_participates_in_deduction_total() {
        let mut slip = consistent_payslip();
        slip.deductions.resident_tax = dec("5000");
        slip.deductions.total_deduction.update(dec("27544"));
        slip.totals.net_payment.update(dec("114456"));
        slip.totals.bank_transfer.update(dec("114456"));

        assert!(slip.check_invariants().is_ok());
    }

    #[test]
    fn test_other_deduction_items_participate_in_total() {
        let mut slip = consistent_payslip();
        slip.deductions.other_items.push(DeductionItem {
            name: "dormitory".to_string(),
            amount: dec("10000"),
        });
        slip.deductions.total_deduction.update(dec("32544"));
        slip.totals.net_payment.update(dec("109456"));
        slip.totals.bank_transfer.update(dec("109456"));

        assert!(slip.check_invariants().is_ok());
    }

    #[test]
    fn test_payments_allowance_splits() {
        let mut payments = Payments::default();
        payments.other_allowances = vec![
            AllowanceItem {
                name: "qualification".to_string(),
                amount: dec("3000"),
                taxable: true,
            },
            AllowanceItem {
                name: "meal_support".to_string(),
                amount: dec("2000"),
                taxable: false,
            },
        ];

        assert_eq!(payments.taxable_allowance_total(), dec("3000"));
        assert_eq!(payments.non_taxable_allowance_total(), dec("2000"));
    }

    #[test]
    fn test_payslip_serialization_round_trip() {
        let slip = consistent_payslip();
        let json = serde_json::to_string(&slip).unwrap();
        let deserialized: Payslip = serde_json::from_str(&json).unwrap();
        assert_eq!(slip, deserialized);
    }
}
