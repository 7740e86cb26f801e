//! Personnel profile and related types.
//!
//! A [`PersonnelProfile`] is the snapshot of employee data that the taxability
//! and overtime rules need. It travels with each payroll record.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How adverse an employee's working conditions are.
///
/// Only the three adverse levels qualify for a hardship allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkingEnvironment {
    /// Excellent conditions.
    Excellent,
    /// Very good conditions.
    VeryGood,
    /// Good conditions.
    Good,
    /// Medium conditions.
    Medium,
    /// Adverse conditions.
    Adverse,
    /// Very adverse conditions.
    VeryAdverse,
    /// Extremely adverse conditions.
    ExtremelyAdverse,
}

impl WorkingEnvironment {
    /// Returns true if a hardship allowance may be paid in this environment.
    ///
    /// # Examples
    ///
    /// ```
    /// use adjustment_engine::models::WorkingEnvironment;
    ///
    /// assert!(WorkingEnvironment::VeryAdverse.qualifies_for_hardship());
    /// assert!(!WorkingEnvironment::Good.qualifies_for_hardship());
    /// ```
    pub fn qualifies_for_hardship(&self) -> bool {
        matches!(
            self,
            WorkingEnvironment::Adverse
                | WorkingEnvironment::VeryAdverse
                | WorkingEnvironment::ExtremelyAdverse
        )
    }
}

/// The employee's working area; drives per diem exemption limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkingArea {
    /// Government official.
    GovernmentOfficial,
    /// Manager in a non-governmental organization.
    NonGovernmentalManager,
    /// Deputy manager in a non-governmental organization.
    DeputyNonGovernmentalManager,
    /// Expert in a non-governmental organization.
    NonGovernmentalExpert,
    /// Construction machinery operator.
    ConstructionMachineryOperator,
    /// Any other area.
    Other,
}

/// Employee data referenced by payroll rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonnelProfile {
    /// Organization-scoped personnel identifier (e.g. "EMP-001").
    pub personnel_id: String,
    /// Full display name.
    #[serde(default)]
    pub full_name: String,
    /// Agreed monthly basic salary, the basis for caps and overtime.
    pub basic_salary: Decimal,
    /// Working environment.
    pub working_environment: WorkingEnvironment,
    /// Working area.
    pub working_area: WorkingArea,
    /// Daily per diem rate paid when travelling; zero when not agreed.
    #[serde(default)]
    pub daily_per_diem: Decimal,
}

impl PersonnelProfile {
    /// Returns true if a per diem may be processed for this employee.
    pub fn has_daily_per_diem(&self) -> bool {
        self.daily_per_diem > Decimal::ZERO
    }
}
