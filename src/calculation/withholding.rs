//! Withholding income tax calculation.
//!
//! Selects the bracket formula set for the requested year and tax column
//! and computes the monthly withholding amount, rounded half-up to the
//! nearest ¥10. Requesting a year with no configured table is a hard
//! error; defaulting to a nearby year would misstate statutory tax.

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::config::{ExcessRow, RateRow, StatutoryConfig, TaxYearTable};
use crate::error::{EngineError, EngineResult};
use crate::models::TaxColumn;

/// Calculates withholding income tax against the year-versioned tables.
#[derive(Debug, Clone, Copy)]
pub struct WithholdingTaxCalculator<'a> {
    config: &'a StatutoryConfig,
}

fn round_to_unit(amount: Decimal, unit: Decimal) -> Decimal {
    (amount / unit).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero) * unit
}

/// Progressive rows on a post-deduction base: tax = base × rate − deduct.
fn progressive_tax(rows: &[RateRow], base: Decimal) -> Decimal {
    rows.iter()
        .find(|row| base >= row.min && row.max.is_none_or(|max| base < max))
        .map(|row| base * row.rate - row.deduct)
        .unwrap_or(Decimal::ZERO)
}

/// Excess-over-minimum rows: tax = row base + (amount − row min) × rate.
fn excess_tax(rows: &[ExcessRow], amount: Decimal) -> Decimal {
    rows.iter()
        .find(|row| amount >= row.min && row.max.is_none_or(|max| amount < max))
        .map(|row| row.base + (amount - row.min) * row.rate)
        .unwrap_or(Decimal::ZERO)
}

impl<'a> WithholdingTaxCalculator<'a> {
    /// Creates a calculator over a loaded statutory configuration.
    pub fn new(config: &'a StatutoryConfig) -> Self {
        Self { config }
    }

    /// Computes the monthly withholding tax.
    ///
    /// `taxable` is the gross minus non-taxable items minus the
    /// social-insurance total. `worked_days` is required for the 丙
    /// column only.
    ///
    /// # Errors
    ///
    /// `UnsupportedTaxYear` when no table is configured for `year`;
    /// `MissingWorkedDays` when the 丙 column is requested without a
    /// positive day count.
    pub fn calculate(
        &self,
        year: i32,
        taxable: Decimal,
        dependents: u32,
        column: TaxColumn,
        worked_days: Option<u32>,
    ) -> EngineResult<Decimal> {
        let table = self.config.tax_year(year)?;
        let unit = self.config.tax_rounding_unit();

        let tax = match column {
            TaxColumn::Kou => self.kou_tax(table, taxable, dependents),
            TaxColumn::Otsu => excess_tax(&table.otsu_brackets, taxable),
            TaxColumn::Hei => {
                let days = worked_days
                    .filter(|d| *d > 0)
                    .ok_or(EngineError::MissingWorkedDays)?;
                self.hei_tax(table, taxable, days)
            }
        };

        let rounded = round_to_unit(tax.max(Decimal::ZERO), unit);
        debug!(year, %taxable, dependents, ?column, %rounded, "computed withholding tax");
        Ok(rounded)
    }

    /// 甲: dependent-adjusted monthly formula.
    fn kou_tax(&self, table: &TaxYearTable, taxable: Decimal, dependents: u32) -> Decimal {
        if taxable < table.threshold {
            return Decimal::ZERO;
        }

        let deduction = table.employment_income_deduction(taxable)
            + table.basic_deduction
            + Decimal::from(dependents) * table.dependent_deduction;

        let base = taxable - deduction;
        if base <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        progressive_tax(&table.kou_brackets, base)
    }

    /// 丙: day-rate table on the per-day average of the taxable amount.
    fn hei_tax(&self, table: &TaxYearTable, taxable: Decimal, days: u32) -> Decimal {
        let daily = taxable / Decimal::from(days);
        if daily < table.hei.day_threshold {
            return Decimal::ZERO;
        }

        excess_tax(&table.hei.brackets, daily) * Decimal::from(days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn loader() -> ConfigLoader {
        ConfigLoader::bundled().unwrap()
    }

    #[test]
    fn test_kou_2026_below_threshold_is_zero() {
        let loader = loader();
        let calc = WithholdingTaxCalculator::new(loader.config());

        let tax = calc
            .calculate(2026, dec("104999"), 0, TaxColumn::Kou, None)
            .unwrap();
        assert_eq!(tax, dec("0"));
    }

    #[test]
    fn test_kou_2026_rounds_up_to_3120() {
        let loader = loader();
        let calc = WithholdingTaxCalculator::new(loader.config());

        // 209,880 taxable: employment deduction 0.30 x 209,880 + 6,667,
        // basic deduction 79,167 => post-deduction base 61,082.
        // 61,082 x 5.105% = 3,118.24 -> rounds to 3,120.
        let tax = calc
            .calculate(2026, dec("209880"), 0, TaxColumn::Kou, None)
            .unwrap();
        assert_eq!(tax, dec("3120"));
    }

    #[test]
    fn test_kou_2026_rounds_down_to_150() {
        let loader = loader();
        let calc = WithholdingTaxCalculator::new(loader.config());

        // 136,333 taxable: flat employment deduction 54,167, basic
        // deduction 79,167 => base 2,999. 2,999 x 5.105% = 153.1 -> 150.
        let tax = calc
            .calculate(2026, dec("136333"), 0, TaxColumn::Kou, None)
            .unwrap();
        assert_eq!(tax, dec("150"));
    }

    #[test]
    fn test_kou_2025_threshold_is_88000() {
        let loader = loader();
        let calc = WithholdingTaxCalculator::new(loader.config());

        let below = calc
            .calculate(2025, dec("87999"), 0, TaxColumn::Kou, None)
            .unwrap();
        assert_eq!(below, dec("0"));

        let above = calc
            .calculate(2025, dec("150000"), 0, TaxColumn::Kou, None)
            .unwrap();
        assert!(above > dec("0"));
    }

    #[test]
    fn test_kou_2025_mid_bracket() {
        let loader = loader();
        let calc = WithholdingTaxCalculator::new(loader.config());

        // 300,000: employment deduction 96,667, basic 40,000 => base
        // 163,333; second bracket: x 10.21% - 8,296 = 8,380.3 -> 8,380.
        let tax = calc
            .calculate(2025, dec("300000"), 0, TaxColumn::Kou, None)
            .unwrap();
        assert_eq!(tax, dec("8380"));
    }

    #[test]
    fn test_kou_dependents_widen_the_deduction() {
        let loader = loader();
        let calc = WithholdingTaxCalculator::new(loader.config());

        let none = calc
            .calculate(2025, dec("300000"), 0, TaxColumn::Kou, None)
            .unwrap();
        let one = calc
            .calculate(2025, dec("300000"), 1, TaxColumn::Kou, None)
            .unwrap();
        let three = calc
            .calculate(2025, dec("300000"), 3, TaxColumn::Kou, None)
            .unwrap();

        // base 163,333 - 31,667 = 131,666; x 5.105% = 6,721.6 -> 6,720.
        assert_eq!(one, dec("6720"));
        assert!(one < none);
        assert!(three < one);
    }

    #[test]
    fn test_kou_deduction_exceeding_taxable_gives_zero() {
        let loader = loader();
        let calc = WithholdingTaxCalculator::new(loader.config());

        // Above the threshold but ten dependents wipe out the base.
        let tax = calc
            .calculate(2025, dec("150000"), 10, TaxColumn::Kou, None)
            .unwrap();
        assert_eq!(tax, dec("0"));
    }

    #[test]
    fn test_otsu_low_band_flat_rate() {
        let loader = loader();
        let calc = WithholdingTaxCalculator::new(loader.config());

        // 50,000 x 3.063% = 1,531.5 -> 1,530.
        let tax = calc
            .calculate(2025, dec("50000"), 0, TaxColumn::Otsu, None)
            .unwrap();
        assert_eq!(tax, dec("1530"));
    }

    #[test]
    fn test_otsu_upper_band() {
        let loader = loader();
        let calc = WithholdingTaxCalculator::new(loader.config());

        // 3,200 + (100,000 - 88,000) x 10.21% = 4,425.2 -> 4,430.
        let tax = calc
            .calculate(2025, dec("100000"), 0, TaxColumn::Otsu, None)
            .unwrap();
        assert_eq!(tax, dec("4430"));
    }

    #[test]
    fn test_otsu_ignores_dependents() {
        let loader = loader();
        let calc = WithholdingTaxCalculator::new(loader.config());

        let none = calc
            .calculate(2025, dec("200000"), 0, TaxColumn::Otsu, None)
            .unwrap();
        let three = calc
            .calculate(2025, dec("200000"), 3, TaxColumn::Otsu, None)
            .unwrap();
        assert_eq!(none, three);
    }

    #[test]
    fn test_hei_requires_worked_days() {
        let loader = loader();
        let calc = WithholdingTaxCalculator::new(loader.config());

        let missing = calc.calculate(2025, dec("100000"), 0, TaxColumn::Hei, None);
        assert!(matches!(missing, Err(EngineError::MissingWorkedDays)));

        let zero_days = calc.calculate(2025, dec("100000"), 0, TaxColumn::Hei, Some(0));
        assert!(matches!(zero_days, Err(EngineError::MissingWorkedDays)));
    }

    #[test]
    fn test_hei_below_day_threshold_is_zero() {
        let loader = loader();
        let calc = WithholdingTaxCalculator::new(loader.config());

        // 90,000 over 10 days averages 9,000/day, under the 9,300 floor.
        let tax = calc
            .calculate(2025, dec("90000"), 0, TaxColumn::Hei, Some(10))
            .unwrap();
        assert_eq!(tax, dec("0"));
    }

    #[test]
    fn test_hei_day_rate_scales_with_days() {
        let loader = loader();
        let calc = WithholdingTaxCalculator::new(loader.config());

        // 100,000 over 10 days: (10,000 - 9,300) x 5.105% = 35.735/day;
        // x 10 days = 357.35 -> 360.
        let tax = calc
            .calculate(2025, dec("100000"), 0, TaxColumn::Hei, Some(10))
            .unwrap();
        assert_eq!(tax, dec("360"));
    }

    #[test]
    fn test_unsupported_year_is_distinct_error() {
        let loader = loader();
        let calc = WithholdingTaxCalculator::new(loader.config());

        let result = calc.calculate(2019, dec("300000"), 0, TaxColumn::Kou, None);
        assert!(matches!(
            result,
            Err(EngineError::UnsupportedTaxYear { year: 2019 })
        ));
    }

    #[test]
    fn test_final_figure_rounds_to_nearest_ten() {
        let loader = loader();
        let calc = WithholdingTaxCalculator::new(loader.config());

        for (taxable, expected) in [("136333", "150"), ("209880", "3120")] {
            let tax = calc
                .calculate(2026, dec(taxable), 0, TaxColumn::Kou, None)
                .unwrap();
            assert_eq!(tax, dec(expected));
            assert_eq!(tax % dec("10"), dec("0"));
        }
    }
}
