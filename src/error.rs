//! Error types for the payslip derivation engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur during payslip derivation.

use thiserror::Error;

/// The main error type for the payslip derivation engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use payslip_engine::error::EngineError;
///
/// let error = EngineError::UnsupportedTaxYear { year: 2019 };
/// assert_eq!(
///     error.to_string(),
///     "No withholding tax table configured for year 2019"
/// );
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// No withholding tax table is configured for the requested year.
    ///
    /// Defaulting to a nearby year's table would silently misstate
    /// statutory tax, so this is always surfaced to the caller.
    #[error("No withholding tax table configured for year {year}")]
    UnsupportedTaxYear {
        /// The year with no configured table.
        year: i32,
    },

    /// The daily (丙) tax column was requested without a worked-day count.
    #[error("Tax column 丙 requires the number of days worked in the period")]
    MissingWorkedDays,

    /// A payslip failed its post-recomputation consistency checks.
    ///
    /// The caller must reject the recomputation rather than persist a
    /// payslip that violates its own totals.
    #[error("Payslip invariant violated: {field}: {message}")]
    InvariantViolation {
        /// The field or invariant that failed.
        field: String,
        /// A description of the inconsistency.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/file.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/file.yaml"
        );
    }

    #[test]
    fn test_config_parse_error_displays_path_and_message() {
        let error = EngineError::ConfigParseError {
            path: "/config/bad.yaml".to_string(),
            message: "invalid YAML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse configuration file '/config/bad.yaml': invalid YAML syntax"
        );
    }

    #[test]
    fn test_unsupported_tax_year_displays_year() {
        let error = EngineError::UnsupportedTaxYear { year: 2030 };
        assert_eq!(
            error.to_string(),
            "No withholding tax table configured for year 2030"
        );
    }

    #[test]
    fn test_missing_worked_days_message() {
        let error = EngineError::MissingWorkedDays;
        assert_eq!(
            error.to_string(),
            "Tax column 丙 requires the number of days worked in the period"
        );
    }

    #[test]
    fn test_invariant_violation_displays_field_and_message() {
        let error = EngineError::InvariantViolation {
            field: "net_payment".to_string(),
            message: "bank transfer plus cash does not equal net payment".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Payslip invariant violated: net_payment: bank transfer plus cash does not equal net payment"
        );
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_unsupported_year() -> EngineResult<()> {
            Err(EngineError::UnsupportedTaxYear { year: 1999 })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_unsupported_year()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
