//! Statutory configuration: bracket tables, premium rates, and the night
//! window, versioned by effective year.
//!
//! A fiscal-year revision of any table is a data edit to the YAML files
//! under `config/jp/`, never a code edit.

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    DeductionRow, ExcessRow, HeiTable, NightWindow, PremiumRates, RateRow, RemunerationBracket,
    RemunerationTables, StatutoryConfig, StatutoryRules, TaxYearTable,
};
