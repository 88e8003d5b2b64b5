//! Social-insurance premium calculation.
//!
//! Computes the employee share of health, care, pension, and employment
//! premiums from a standard-remuneration base (pinned or derived from the
//! grade tables) plus the flat statutory rates. Health, care, and pension
//! round half-up; employment floors. The difference is statutory, not an
//! inconsistency.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::StatutoryConfig;
use crate::models::InsuranceEnrollment;

/// Inputs to a premium calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct InsuranceInput {
    /// A pinned standard remuneration; when present the grade lookup is
    /// skipped for both the health and pension bases.
    pub pinned_standard_remuneration: Option<Decimal>,
    /// Taxable monthly salary, the grade-lookup gross and the employment
    /// premium base before the transport subtraction.
    pub monthly_salary_total: Decimal,
    /// The helper's age in years.
    pub age: u32,
    /// Which schemes are enrolled.
    pub enrollment: InsuranceEnrollment,
    /// Non-taxable commuting allowance, subtracted from the employment
    /// premium base.
    pub non_taxable_transport: Decimal,
}

/// The four premium lines plus their sum.
///
/// A scheme the helper is not enrolled in contributes zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsurancePremiums {
    /// The standard remuneration used for health and care premiums.
    pub health_standard: Decimal,
    /// The standard remuneration used for the pension premium.
    pub pension_standard: Decimal,
    /// Health insurance premium, rounded half-up.
    pub health: Decimal,
    /// Care insurance premium, rounded half-up.
    pub care: Decimal,
    /// Pension premium, rounded half-up.
    pub pension: Decimal,
    /// Employment insurance premium, floored.
    pub employment: Decimal,
    /// Sum of the four lines.
    pub total: Decimal,
}

/// Calculates social-insurance premiums against the statutory tables.
#[derive(Debug, Clone, Copy)]
pub struct InsurancePremiumCalculator<'a> {
    config: &'a StatutoryConfig,
}

fn round_half_up(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

impl<'a> InsurancePremiumCalculator<'a> {
    /// Creates a calculator over a loaded statutory configuration.
    pub fn new(config: &'a StatutoryConfig) -> Self {
        Self { config }
    }

    /// Computes the four premium lines and their sum.
    ///
    /// # Example
    ///
    /// ```
    /// use payslip_engine::calculation::{InsuranceInput, InsurancePremiumCalculator};
    /// use payslip_engine::config::ConfigLoader;
    /// use payslip_engine::models::InsuranceEnrollment;
    /// use rust_decimal::Decimal;
    ///
    /// let loader = ConfigLoader::bundled().unwrap();
    /// let calculator = InsurancePremiumCalculator::new(loader.config());
    ///
    /// let premiums = calculator.calculate(&InsuranceInput {
    ///     pinned_standard_remuneration: Some(Decimal::new(294_000, 0)),
    ///     monthly_salary_total: Decimal::new(294_000, 0),
    ///     age: 45,
    ///     enrollment: InsuranceEnrollment {
    ///         health: true,
    ///         care: false,
    ///         pension: true,
    ///         employment: true,
    ///     },
    ///     non_taxable_transport: Decimal::ZERO,
    /// });
    /// assert_eq!(premiums.health, Decimal::new(15_053, 0));
    /// ```
    pub fn calculate(&self, input: &InsuranceInput) -> InsurancePremiums {
        let rates = self.config.premium_rates();
        let tables = self.config.remuneration();

        let (health_standard, pension_standard) = match input.pinned_standard_remuneration {
            Some(pinned) => (pinned, pinned),
            None => (
                tables
                    .health_standard(input.monthly_salary_total)
                    .unwrap_or(input.monthly_salary_total),
                tables
                    .pension_standard(input.monthly_salary_total)
                    .unwrap_or(input.monthly_salary_total),
            ),
        };

        let health = if input.enrollment.health {
            round_half_up(health_standard * rates.health)
        } else {
            Decimal::ZERO
        };

        let care_applies = input.enrollment.health
            && (input.age >= self.config.care_age_threshold() || input.enrollment.care);
        let care = if care_applies {
            round_half_up(health_standard * rates.care)
        } else {
            Decimal::ZERO
        };

        let pension = if input.enrollment.pension {
            round_half_up(pension_standard * rates.pension)
        } else {
            Decimal::ZERO
        };

        let employment = if input.enrollment.employment {
            // A pinned total below the transport allowance must not turn the
            // premium negative.
            let base = (input.monthly_salary_total - input.non_taxable_transport)
                .max(Decimal::ZERO);
            (base * rates.employment).floor()
        } else {
            Decimal::ZERO
        };

        let total = health + care + pension + employment;
        debug!(%health, %care, %pension, %employment, %total, "computed insurance premiums");

        InsurancePremiums {
            health_standard,
            pension_standard,
            health,
            care,
            pension,
            employment,
            total,
        }
    }
}
