//! Calculation logic for the Adjustment Engine.
//!
//! This module contains pay component classification, the taxable split of
//! earning components, employment income tax, pension contributions, the
//! payroll summary derived from a record's own lines, and the two-step
//! recalculation of earning and deduction adjustments.

mod classifier;
mod deduction_adjustment;
mod earning_adjustment;
mod income_tax;
mod payroll_summary;
mod pension;
mod taxability;

pub use classifier::{
    DEDUCTIONS, DEFERRED_EARNINGS, FULLY_TAXABLE, NON_TAXABLE, PARTIALLY_TAXABLE, PENSIONABLE,
    TaxabilityClass, classify,
};
pub use deduction_adjustment::DeductionAdjustmentCalculator;
pub use earning_adjustment::{EarningAdjustmentCalculator, assess_earning_adjustment};
pub use income_tax::calculate_income_tax;
pub use payroll_summary::{OVERTIME_COMPONENT, calculate_overtime, calculate_payroll_summary};
pub use pension::calculate_pension;
pub use taxability::split_component;
