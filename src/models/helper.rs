//! Helper pay profile and related types.
//!
//! The pay profile is owned by the helper-management subsystem and consumed
//! here read-only. It carries everything the derivation needs that is not a
//! shift record: salary mode and rates, insurance enrollment, tax column,
//! and the bank/cash preference.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How the helper's base pay is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalaryMode {
    /// A fixed monthly base salary; differentials are paid on top.
    FixedMonthly,
    /// Pay is hours worked times the per-category hourly rate.
    Hourly,
}

/// Japanese withholding tax column (税額表の適用区分).
///
/// 甲 is the primary-employer table (dependent-adjusted), 乙 the
/// secondary-employer flat table, 丙 the daily/short-term table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxColumn {
    /// 甲欄 — primary employer, dependent-adjusted monthly table.
    Kou,
    /// 乙欄 — secondary employer, flat higher-rate table.
    Otsu,
    /// 丙欄 — daily/short-term table, requires days worked.
    Hei,
}

/// Which social-insurance schemes the helper is enrolled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InsuranceEnrollment {
    /// Health insurance (健康保険).
    pub health: bool,
    /// Long-term care insurance (介護保険). Normally implied by age >= 40;
    /// this flag forces enrollment below that age.
    pub care: bool,
    /// Employees' pension (厚生年金).
    pub pension: bool,
    /// Employment insurance (雇用保険).
    pub employment: bool,
}

/// Hourly rates per payroll category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRates {
    /// Ordinary care work, daytime.
    pub normal: Decimal,
    /// Ordinary care work inside the night window.
    pub night_normal: Decimal,
    /// Accompanying care, daytime.
    pub accompany: Decimal,
    /// Accompanying care inside the night window.
    pub night_accompany: Decimal,
    /// Office work.
    pub office: Decimal,
    /// Sales activity.
    pub sales: Decimal,
}

/// How the net payment is split between bank transfer and cash.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentPreference {
    /// The whole net payment goes to the bank account.
    BankTransfer,
    /// The whole net payment is handed over in cash.
    Cash,
    /// A fixed cash amount; the remainder goes to the bank.
    SplitCash(Decimal),
}

/// A helper's pay profile for one payroll month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelperPayProfile {
    /// Unique identifier for the helper.
    pub id: String,
    /// How base pay is determined.
    pub salary_mode: SalaryMode,
    /// Fixed monthly base salary; only meaningful for
    /// [`SalaryMode::FixedMonthly`].
    pub monthly_base: Decimal,
    /// Hourly rates per category.
    pub rates: CategoryRates,
    /// Non-taxable commuting allowance per month.
    pub transport_allowance: Decimal,
    /// Social-insurance enrollment flags.
    pub insurance: InsuranceEnrollment,
    /// The helper's age in years at the start of the payroll month.
    pub age: u32,
    /// Number of dependents for withholding purposes.
    pub dependents: u32,
    /// Withholding tax column.
    pub tax_column: TaxColumn,
    /// A pinned standard-remuneration amount; when present the bracket
    /// lookup is skipped and this value is the premium base.
    pub pinned_standard_remuneration: Option<Decimal>,
    /// Whether income tax is withheld at all. When false the tax
    /// calculator is bypassed and income tax is zero.
    pub withholding_enabled: bool,
    /// Bank/cash split preference.
    pub payment: PaymentPreference,
}

impl HelperPayProfile {
    /// Returns true if care-insurance premiums apply: enrolled in health
    /// insurance and either aged 40 or over or explicitly enrolled.
    pub fn care_premium_applies(&self, care_age_threshold: u32) -> bool {
        self.insurance.health && (self.age >= care_age_threshold || self.insurance.care)
    }
}
