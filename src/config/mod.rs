//! Configuration loading for the Adjustment Engine.
//!
//! This module loads the payroll rules from YAML files: income tax
//! brackets, pension rates, allowance exemption limits and overtime
//! multipliers.
//!
//! # Example
//!
//! ```no_run
//! use adjustment_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap().into_config();
//! println!("Employee pension rate: {}", config.pension().personnel_rate);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AllowanceConfig, IncomeTaxBracket, IncomeTaxConfig, OvertimeMultipliers, PayrollConfig,
    PensionRates, PerDiemLimit, SalaryLinkedCap,
};
