//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading payroll rule
//! configurations from YAML files.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{EngineError, EngineResult};

use super::types::{
    AllowanceConfig, IncomeTaxConfig, OvertimeMultipliers, PayrollConfig, PensionRates,
};

/// Loads and provides access to the payroll rule configuration.
///
/// # Directory Structure
///
/// Every file is optional. A missing file falls back to the statutory
/// defaults for that section; a file that exists but does not parse is an
/// error.
///
/// ```text
/// config/default/
/// ├── income_tax.yaml  # Employment income tax brackets
/// ├── pension.yaml     # Employee and employer pension rates
/// ├── allowances.yaml  # Allowance exemption limits and per diem rules
/// └── overtime.yaml    # Overtime multipliers and monthly hours
/// ```
///
/// # Example
///
/// ```no_run
/// use adjustment_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// println!("Brackets: {}", loader.config().income_tax().brackets.len());
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: PayrollConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns `ConfigNotFound` if the directory itself does not exist and
    /// `ConfigParseError` if any present file contains invalid YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        if !path.is_dir() {
            return Err(EngineError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let income_tax = Self::load_section::<IncomeTaxConfig>(path, "income_tax.yaml")?;
        let pension = Self::load_section::<PensionRates>(path, "pension.yaml")?;
        let allowances = Self::load_section::<AllowanceConfig>(path, "allowances.yaml")?;
        let overtime = Self::load_section::<OvertimeMultipliers>(path, "overtime.yaml")?;

        let config = PayrollConfig::new(income_tax, pension, allowances, overtime);

        Ok(Self { config })
    }

    /// Loads one section, falling back to its default when the file is absent.
    fn load_section<T>(dir: &Path, file: &str) -> EngineResult<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        let path = dir.join(file);
        if !path.exists() {
            debug!(file = %path.display(), "config file absent, using defaults");
            return Ok(T::default());
        }
        Self::load_yaml(&path)
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

    /// Returns the loaded payroll configuration.
    pub fn config(&self) -> &PayrollConfig {
        &self.config
    }

    /// Consumes the loader and returns the configuration.
    pub fn into_config(self) -> PayrollConfig {
        self.config
    }
}
