//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the statutory
//! tables from YAML files, plus a bundled table set compiled into the
//! binary so callers without a config directory can still compute.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use super::types::{RemunerationTables, StatutoryConfig, StatutoryRules, TaxYearTable};

/// Loads and provides access to the statutory configuration.
///
/// # Directory Structure
///
/// ```text
/// config/jp/
/// ├── statutory.yaml      # Night window, premium rates, rounding
/// ├── remuneration.yaml   # Standard-remuneration grade tables
/// └── tax/
///     ├── 2025.yaml       # Withholding formula set for 2025
///     └── 2026.yaml       # Withholding formula set for 2026
/// ```
///
/// # Example
///
/// ```no_run
/// use payslip_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/jp").unwrap();
/// let config = loader.config();
/// assert!(config.tax_year(2026).is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: StatutoryConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` when a required file is missing and
    /// `ConfigParseError` when a file contains invalid YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let rules = Self::load_yaml::<StatutoryRules>(&path.join("statutory.yaml"))?;
        let remuneration =
            Self::load_yaml::<RemunerationTables>(&path.join("remuneration.yaml"))?;
        let tax_years = Self::load_tax_years(&path.join("tax"))?;

        Ok(Self {
            config: StatutoryConfig::new(rules, remuneration, tax_years),
        })
    }

    /// Returns a loader with the statutory tables bundled into the crate.
    ///
    /// The bundled documents are the same files `load` reads from
    /// `config/jp/`, so both paths produce identical tables.
    pub fn bundled() -> EngineResult<Self> {
        let parse = |name: &str, content: &str| -> EngineResult<serde_yaml::Value> {
            serde_yaml::from_str(content).map_err(|e| EngineError::ConfigParseError {
                path: name.to_string(),
                message: e.to_string(),
            })
        };
        // Re-parse through serde_yaml::Value so parse errors name the
        // bundled document rather than an opaque string.
        let rules: StatutoryRules = serde_yaml::from_value(parse(
            "bundled:statutory.yaml",
            include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config/jp/statutory.yaml")),
        )?)
        .map_err(|e| EngineError::ConfigParseError {
            path: "bundled:statutory.yaml".to_string(),
            message: e.to_string(),
        })?;
        let remuneration: RemunerationTables = serde_yaml::from_value(parse(
            "bundled:remuneration.yaml",
            include_str!(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/config/jp/remuneration.yaml"
            )),
        )?)
        .map_err(|e| EngineError::ConfigParseError {
            path: "bundled:remuneration.yaml".to_string(),
            message: e.to_string(),
        })?;

        let mut tax_years = Vec::new();
        for (name, content) in [
            (
                "bundled:tax/2025.yaml",
                include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config/jp/tax/2025.yaml")),
            ),
            (
                "bundled:tax/2026.yaml",
                include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config/jp/tax/2026.yaml")),
            ),
        ] {
            let table: TaxYearTable = serde_yaml::from_value(parse(name, content)?).map_err(
                |e| EngineError::ConfigParseError {
                    path: name.to_string(),
                    message: e.to_string(),
                },
            )?;
            tax_years.push(table);
        }

        Ok(Self {
            config: StatutoryConfig::new(rules, remuneration, tax_years),
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads all tax-year files from the tax directory.
    fn load_tax_years(tax_dir: &Path) -> EngineResult<Vec<TaxYearTable>> {
        let tax_dir_str = tax_dir.display().to_string();

        if !tax_dir.exists() {
            return Err(EngineError::ConfigNotFound { path: tax_dir_str });
        }

        let entries = fs::read_dir(tax_dir).map_err(|_| EngineError::ConfigNotFound {
            path: tax_dir_str.clone(),
        })?;

        let mut tables = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: tax_dir_str.clone(),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                tables.push(Self::load_yaml::<TaxYearTable>(&path)?);
            }
        }

        if tables.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no tax-year files found)", tax_dir_str),
            });
        }

        Ok(tables)
    }

    /// Returns the underlying statutory configuration.
    pub fn config(&self) -> &StatutoryConfig {
        &self.config
    }
}
