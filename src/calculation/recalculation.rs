//! The ordered recomputation pass over the payslip aggregate.
//!
//! [`PayslipEngine`] is the single entry point for deriving a payslip,
//! whether from scratch out of shift records or after a manual edit. Both
//! paths run the same ordered stages, each a [`Derived::update`] that a
//! pin silently wins over, so a pinned field holds its value while still
//! feeding every downstream stage.
//!
//! A stage that cannot produce a value (say, an unsupported tax year)
//! records a [`StageAnomaly`] and leaves its field untouched instead of
//! aborting; only a post-pass invariant violation is fatal.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::StatutoryConfig;
use crate::error::EngineResult;
use crate::models::{HelperPayProfile, PaymentPreference, Payslip, SalaryMode, ShiftRecord};

use super::aggregation::{ExcludedShift, aggregate_shifts};
use super::insurance::{InsuranceInput, InsurancePremiumCalculator};
use super::withholding::WithholdingTaxCalculator;

/// A non-fatal problem hit by one recomputation stage.
///
/// The stage's target field keeps its previous value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageAnomaly {
    /// The payslip field the failing stage computes.
    pub stage: String,
    /// Human-readable description of the problem.
    pub message: String,
}

/// The outcome of one derivation or recomputation pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecalculationReport {
    /// Non-fatal stage problems, in stage order.
    pub anomalies: Vec<StageAnomaly>,
    /// Shift records excluded during aggregation; empty for a
    /// recompute-only pass.
    pub excluded: Vec<ExcludedShift>,
}

impl RecalculationReport {
    /// Returns true if the pass completed with no anomalies or exclusions.
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty() && self.excluded.is_empty()
    }
}

/// Derives payslips from shift records and pay profiles.
#[derive(Debug, Clone, Copy)]
pub struct PayslipEngine<'a> {
    config: &'a StatutoryConfig,
}

impl<'a> PayslipEngine<'a> {
    /// Creates an engine over a loaded statutory configuration.
    pub fn new(config: &'a StatutoryConfig) -> Self {
        Self { config }
    }

    /// Generates a payslip for one helper and month from shift records.
    ///
    /// Aggregates the shifts into daily rows, then runs the same
    /// recomputation pass [`recalculate`](Self::recalculate) uses, so a
    /// freshly generated payslip and a recomputed one always agree.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` when the derived aggregate fails its
    /// consistency checks; the payslip must not be persisted in that case.
    pub fn generate(
        &self,
        profile: &HelperPayProfile,
        shifts: &[ShiftRecord],
        year: i32,
        month: u32,
    ) -> EngineResult<(Payslip, RecalculationReport)> {
        let attendance = aggregate_shifts(shifts, self.config.night_window());

        let mut payslip = Payslip::new(profile.id.clone(), year, month);
        payslip.attendance.daily = attendance.daily;

        let mut report = self.recalculate(&mut payslip, profile)?;
        report.excluded = attendance.excluded;

        info!(
            helper_id = %profile.id,
            year,
            month,
            excluded = report.excluded.len(),
            "generated payslip"
        );
        Ok((payslip, report))
    }

    /// Recomputes every derived field of an existing payslip in stage
    /// order, respecting pins.
    ///
    /// Idempotent: a second pass over an unchanged payslip is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` when the recomputed aggregate fails
    /// its consistency checks.
    pub fn recalculate(
        &self,
        payslip: &mut Payslip,
        profile: &HelperPayProfile,
    ) -> EngineResult<RecalculationReport> {
        let mut anomalies = Vec::new();

        self.recompute_attendance(payslip);
        self.recompute_category_pay(payslip, profile);
        self.recompute_total_payment(payslip, profile);
        self.recompute_insurance(payslip, profile);
        self.recompute_taxable_amount(payslip);
        self.recompute_income_tax(payslip, profile, &mut anomalies);
        self.recompute_total_deduction(payslip);
        self.recompute_totals(payslip, profile);

        payslip.check_invariants()?;

        for anomaly in &anomalies {
            warn!(stage = %anomaly.stage, message = %anomaly.message, "recalculation anomaly");
        }

        Ok(RecalculationReport {
            anomalies,
            excluded: Vec::new(),
        })
    }

    /// Stages 1-2: category hour totals and day counts from the daily rows.
    fn recompute_attendance(&self, payslip: &mut Payslip) {
        let attendance = &mut payslip.attendance;

        let mut normal = Decimal::ZERO;
        let mut night_normal = Decimal::ZERO;
        let mut accompany = Decimal::ZERO;
        let mut night_accompany = Decimal::ZERO;
        let mut office = Decimal::ZERO;
        let mut sales = Decimal::ZERO;
        let mut work_days = 0u32;
        let mut accompany_days = 0u32;

        for row in &attendance.daily {
            normal += row.normal;
            night_normal += row.night_normal;
            accompany += row.accompany;
            night_accompany += row.night_accompany;
            office += row.office;
            sales += row.sales;

            if row.normal + row.night_normal > Decimal::ZERO {
                work_days += 1;
            }
            if row.accompany + row.night_accompany > Decimal::ZERO {
                accompany_days += 1;
            }
        }

        attendance.normal_hours.update(normal);
        attendance.night_normal_hours.update(night_normal);
        attendance.accompany_hours.update(accompany);
        attendance.night_accompany_hours.update(night_accompany);
        attendance.office_hours.update(office);
        attendance.sales_hours.update(sales);

        // The grand total is the sum of the category fields as they stand,
        // so a pinned category propagates into it.
        let total = attendance.category_hours_sum();
        attendance.total_hours.update(total);

        attendance.work_days.update(work_days);
        attendance.accompany_days.update(accompany_days);
    }

    /// Stage 3: category pay lines from hours and the profile's rates.
    fn recompute_category_pay(&self, payslip: &mut Payslip, profile: &HelperPayProfile) {
        let rates = &profile.rates;
        let hours = &payslip.attendance;
        let payments = &mut payslip.payments;

        let normal_pay = match profile.salary_mode {
            SalaryMode::FixedMonthly => profile.monthly_base,
            SalaryMode::Hourly => hours.normal_hours.value() * rates.normal,
        };
        payments.normal_pay.update(normal_pay);

        payments
            .night_normal_pay
            .update(hours.night_normal_hours.value() * rates.night_normal);
        payments
            .accompany_pay
            .update(hours.accompany_hours.value() * rates.accompany);
        payments
            .night_accompany_pay
            .update(hours.night_accompany_hours.value() * rates.night_accompany);
        payments
            .office_pay
            .update(hours.office_hours.value() * rates.office);
        payments
            .sales_pay
            .update(hours.sales_hours.value() * rates.sales);
    }

    /// Stages 4-5: transport allowance and the gross payment total.
    fn recompute_total_payment(&self, payslip: &mut Payslip, profile: &HelperPayProfile) {
        let payments = &mut payslip.payments;
        payments.transport_allowance.update(profile.transport_allowance);

        let other_total: Decimal = payments.other_allowances.iter().map(|a| a.amount).sum();
        let total =
            payments.category_pay_sum() + payments.transport_allowance.value() + other_total;
        payments.total_payment.update(total);
    }

    /// Stage 6: the four insurance premium lines and their total.
    fn recompute_insurance(&self, payslip: &mut Payslip, profile: &HelperPayProfile) {
        let payments = &payslip.payments;
        let salary = payments.total_payment.value() - payments.non_taxable_allowance_total();

        let calculator = InsurancePremiumCalculator::new(self.config);
        let premiums = calculator.calculate(&InsuranceInput {
            pinned_standard_remuneration: profile.pinned_standard_remuneration,
            monthly_salary_total: salary,
            age: profile.age,
            enrollment: profile.insurance,
            non_taxable_transport: payments.transport_allowance.value(),
        });

        let deductions = &mut payslip.deductions;
        deductions.health.update(premiums.health);
        deductions.care.update(premiums.care);
        deductions.pension.update(premiums.pension);
        deductions.employment.update(premiums.employment);
        deductions
            .social_insurance_total
            .update(deductions.insurance_lines_sum());
    }

    /// Stage 7: the taxable amount fed to the withholding calculator.
    fn recompute_taxable_amount(&self, payslip: &mut Payslip) {
        let payments = &payslip.payments;
        let taxable = payslip.payments.total_payment.value()
            - payments.transport_allowance.value()
            - payments.non_taxable_allowance_total()
            - payslip.deductions.social_insurance_total.value();
        payslip
            .deductions
            .taxable_amount
            .update(taxable.max(Decimal::ZERO));
    }

    /// Stage 8: withheld income tax.
    fn recompute_income_tax(
        &self,
        payslip: &mut Payslip,
        profile: &HelperPayProfile,
        anomalies: &mut Vec<StageAnomaly>,
    ) {
        if !profile.withholding_enabled {
            payslip.deductions.income_tax.update(Decimal::ZERO);
            return;
        }

        let worked_days =
            payslip.attendance.work_days.value() + payslip.attendance.accompany_days.value();
        let calculator = WithholdingTaxCalculator::new(self.config);
        match calculator.calculate(
            payslip.year,
            payslip.deductions.taxable_amount.value(),
            profile.dependents,
            profile.tax_column,
            Some(worked_days),
        ) {
            Ok(tax) => payslip.deductions.income_tax.update(tax),
            Err(err) => anomalies.push(StageAnomaly {
                stage: "deductions.income_tax".to_string(),
                message: err.to_string(),
            }),
        }
    }

    /// Stage 9: the deduction grand total.
    fn recompute_total_deduction(&self, payslip: &mut Payslip) {
        let deductions = &mut payslip.deductions;
        let total = deductions.social_insurance_total.value()
            + deductions.income_tax.value()
            + deductions.resident_tax
            + deductions.other_items_total();
        deductions.total_deduction.update(total);
    }

    /// Stage 10: net payment and the bank/cash split.
    fn recompute_totals(&self, payslip: &mut Payslip, profile: &HelperPayProfile) {
        let net =
            payslip.payments.total_payment.value() - payslip.deductions.total_deduction.value();
        payslip.totals.net_payment.update(net);

        let net = payslip.totals.net_payment.value();
        let cash = match profile.payment {
            PaymentPreference::BankTransfer => Decimal::ZERO,
            PaymentPreference::Cash => net,
            // The cash portion never exceeds what is actually payable.
            PaymentPreference::SplitCash(amount) => amount.min(net).max(Decimal::ZERO),
        };
        payslip.totals.cash_payment.update(cash);
        payslip
            .totals
            .bank_transfer
            .update(net - payslip.totals.cash_payment.value());
    }
}
