//! Configuration types for the statutory tables.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the YAML documents under `config/jp/`.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};

/// The statutory night window, as minutes since midnight.
///
/// The window wraps midnight: 22:00 (1320) through 08:00 (480) the next
/// morning.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NightWindow {
    /// Start of the night window in minutes since midnight.
    pub start_minute: u32,
    /// End of the night window in minutes since midnight (next day).
    pub end_minute: u32,
}

/// Flat employee-share premium rates.
#[derive(Debug, Clone, Deserialize)]
pub struct PremiumRates {
    /// Health insurance rate applied to the standard remuneration.
    pub health: Decimal,
    /// Long-term care insurance rate applied to the standard remuneration.
    pub care: Decimal,
    /// Pension rate applied to the standard remuneration.
    pub pension: Decimal,
    /// Employment insurance rate applied to the monthly salary total.
    pub employment: Decimal,
}

/// Global statutory rules from `statutory.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatutoryRules {
    /// The night differential window.
    pub night_window: NightWindow,
    /// Employee-share premium rates.
    pub premium_rates: PremiumRates,
    /// Age from which care-insurance premiums apply.
    pub care_age_threshold: u32,
    /// Withholding tax is rounded to this unit (¥10).
    pub tax_rounding_unit: Decimal,
}

/// One standard-remuneration grade: a half-open gross range mapped to a
/// fixed standard amount.
#[derive(Debug, Clone, Deserialize)]
pub struct RemunerationBracket {
    /// Inclusive lower bound of the gross range.
    pub min: Decimal,
    /// Exclusive upper bound; `None` for the capped top grade.
    #[serde(default)]
    pub max: Option<Decimal>,
    /// The standard remuneration for this grade.
    pub standard: Decimal,
}

/// The two standard-remuneration grade tables from `remuneration.yaml`.
///
/// Health/care and pension use disjoint tables: health is capped at
/// ¥1,390,000, pension at ¥650,000 with an ¥88,000 floor.
#[derive(Debug, Clone, Deserialize)]
pub struct RemunerationTables {
    /// Grades for health and care insurance.
    pub health: Vec<RemunerationBracket>,
    /// Grades for the employees' pension.
    pub pension: Vec<RemunerationBracket>,
}

fn lookup_standard(brackets: &[RemunerationBracket], gross: Decimal) -> Option<Decimal> {
    // Linear scan; first matching half-open interval wins.
    brackets
        .iter()
        .find(|b| gross >= b.min && b.max.is_none_or(|max| gross < max))
        .map(|b| b.standard)
}

impl RemunerationTables {
    /// Looks up the health/care standard remuneration for a gross amount.
    pub fn health_standard(&self, gross: Decimal) -> Option<Decimal> {
        lookup_standard(&self.health, gross)
    }

    /// Looks up the pension standard remuneration for a gross amount.
    pub fn pension_standard(&self, gross: Decimal) -> Option<Decimal> {
        lookup_standard(&self.pension, gross)
    }
}

/// An employment-income-deduction row: deduction = amount × rate + add.
///
/// Flat rows carry a zero rate.
#[derive(Debug, Clone, Deserialize)]
pub struct DeductionRow {
    /// Inclusive lower bound of the salary range.
    pub min: Decimal,
    /// Exclusive upper bound; `None` for the top row.
    #[serde(default)]
    pub max: Option<Decimal>,
    /// Multiplier applied to the salary.
    pub rate: Decimal,
    /// Constant added (or subtracted, when negative).
    pub add: Decimal,
}

/// A progressive tax row: tax = base × rate − deduct.
#[derive(Debug, Clone, Deserialize)]
pub struct RateRow {
    /// Inclusive lower bound of the base range.
    pub min: Decimal,
    /// Exclusive upper bound; `None` for the top row.
    #[serde(default)]
    pub max: Option<Decimal>,
    /// Marginal rate for this row.
    pub rate: Decimal,
    /// Quick deduction for this row.
    pub deduct: Decimal,
}

/// An excess-over-minimum tax row: tax = base_tax + (amount − min) × rate.
#[derive(Debug, Clone, Deserialize)]
pub struct ExcessRow {
    /// Inclusive lower bound of the amount range.
    pub min: Decimal,
    /// Exclusive upper bound; `None` for the top row.
    #[serde(default)]
    pub max: Option<Decimal>,
    /// Tax at the lower bound of the row.
    pub base: Decimal,
    /// Marginal rate on the excess over the lower bound.
    pub rate: Decimal,
}

/// The 丙 (daily) table: a floor below which tax is zero plus day-rate rows.
#[derive(Debug, Clone, Deserialize)]
pub struct HeiTable {
    /// Daily taxable amounts below this owe no tax.
    pub day_threshold: Decimal,
    /// Day-rate rows applied to the per-day average.
    pub brackets: Vec<ExcessRow>,
}

/// The complete withholding formula set for one year.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxYearTable {
    /// The calendar year these constants apply to.
    pub year: i32,
    /// 甲-column taxable amounts below this owe no tax.
    pub threshold: Decimal,
    /// Monthly basic deduction (基礎控除).
    pub basic_deduction: Decimal,
    /// Monthly deduction per dependent (扶養控除).
    pub dependent_deduction: Decimal,
    /// Monthly employment-income deduction rows (給与所得控除).
    pub employment_deduction: Vec<DeductionRow>,
    /// 甲 progressive rows on the post-deduction base.
    pub kou_brackets: Vec<RateRow>,
    /// 乙 rows on the taxable amount, dependents ignored.
    pub otsu_brackets: Vec<ExcessRow>,
    /// 丙 daily table.
    pub hei: HeiTable,
}

impl TaxYearTable {
    /// Returns the monthly employment-income deduction for a taxable amount.
    pub fn employment_income_deduction(&self, amount: Decimal) -> Decimal {
        self.employment_deduction
            .iter()
            .find(|row| amount >= row.min && row.max.is_none_or(|max| amount < max))
            .map(|row| amount * row.rate + row.add)
            .unwrap_or(Decimal::ZERO)
    }
}

/// The complete statutory configuration: global rules, the two
/// standard-remuneration tables, and the per-year tax formula sets.
///
/// Read-only after load; sharing it by reference across worker threads is
/// safe.
#[derive(Debug, Clone)]
pub struct StatutoryConfig {
    rules: StatutoryRules,
    remuneration: RemunerationTables,
    tax_years: HashMap<i32, TaxYearTable>,
}

impl StatutoryConfig {
    /// Creates a new configuration from its component parts.
    pub fn new(
        rules: StatutoryRules,
        remuneration: RemunerationTables,
        tax_years: Vec<TaxYearTable>,
    ) -> Self {
        let tax_years = tax_years.into_iter().map(|t| (t.year, t)).collect();
        Self {
            rules,
            remuneration,
            tax_years,
        }
    }

    /// Returns the night differential window.
    pub fn night_window(&self) -> &NightWindow {
        &self.rules.night_window
    }

    /// Returns the premium rates.
    pub fn premium_rates(&self) -> &PremiumRates {
        &self.rules.premium_rates
    }

    /// Returns the age from which care premiums apply.
    pub fn care_age_threshold(&self) -> u32 {
        self.rules.care_age_threshold
    }

    /// Returns the withholding tax rounding unit.
    pub fn tax_rounding_unit(&self) -> Decimal {
        self.rules.tax_rounding_unit
    }

    /// Returns the standard-remuneration tables.
    pub fn remuneration(&self) -> &RemunerationTables {
        &self.remuneration
    }

    /// Returns the tax formula set for a year.
    ///
    /// A missing year is an error; silently falling back to a nearby
    /// year's table would misstate statutory tax.
    pub fn tax_year(&self, year: i32) -> EngineResult<&TaxYearTable> {
        self.tax_years
            .get(&year)
            .ok_or(EngineError::UnsupportedTaxYear { year })
    }

    /// Returns the years with a configured tax table, in ascending order.
    pub fn supported_tax_years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.tax_years.keys().copied().collect();
        years.sort_unstable();
        years
    }
}
