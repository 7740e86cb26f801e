//! Core data models for the Adjustment Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod adjustment;
mod ids;
mod pay_period;
mod payroll;
mod personnel;
mod totals;

pub use adjustment::{
    AdjustmentCoverage, DeductionAdjustment, DeductionAdjustmentCase, EarningAdjustment,
    EarningAdjustmentCase,
};
pub use ids::{AdjustmentId, OrganizationId, PayrollId};
pub use pay_period::PayrollMonth;
pub use payroll::{OvertimeHours, PayrollRecord};
pub use personnel::{PersonnelProfile, WorkingArea, WorkingEnvironment};
pub use totals::{AdjustmentTotals, PayrollSummary, PensionContribution, TaxableSplit};
