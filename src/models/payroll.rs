//! Payroll record model.
//!
//! A [`PayrollRecord`] is one employee's payroll for one month. It is the root
//! entity that earning and deduction adjustments point at.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AdjustmentTotals, OrganizationId, PayrollId, PayrollMonth, PayrollSummary, PersonnelProfile};

/// Overtime hours worked in the month, by rate band.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OvertimeHours {
    /// Evening overtime hours.
    pub evening: Decimal,
    /// Night overtime hours.
    pub night: Decimal,
    /// Hours on the weekly rest day.
    pub rest_day: Decimal,
    /// Hours on a public holiday.
    pub public_holiday: Decimal,
}

impl OvertimeHours {
    /// Returns true if no overtime was worked.
    pub fn is_empty(&self) -> bool {
        self.evening.is_zero()
            && self.night.is_zero()
            && self.rest_day.is_zero()
            && self.public_holiday.is_zero()
    }
}

/// One employee's payroll for one month.
///
/// `earnings` and `deductions` are keyed by pay component name (see
/// [`crate::calculation::classify`]). `summary`, `earning_adjustment` and
/// `deduction_adjustment_total` are derived and overwritten by the engine.
///
/// # Example
///
/// ```
/// use adjustment_engine::models::{
///     OrganizationId, PayrollRecord, PersonnelProfile, WorkingArea, WorkingEnvironment,
/// };
/// use rust_decimal::Decimal;
///
/// let personnel = PersonnelProfile {
///     personnel_id: "EMP-001".to_string(),
///     full_name: "Abebe Kebede".to_string(),
///     basic_salary: Decimal::from(10000),
///     working_environment: WorkingEnvironment::Good,
///     working_area: WorkingArea::Other,
///     daily_per_diem: Decimal::ZERO,
/// };
/// let record = PayrollRecord::new(OrganizationId::new(), "2024-01".parse().unwrap(), personnel)
///     .with_earning("basic_salary", Decimal::from(10000));
///
/// assert_eq!(record.earning("basic_salary"), Decimal::from(10000));
/// assert_eq!(record.earning("commission"), Decimal::ZERO);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollRecord {
    /// Record id.
    pub id: PayrollId,
    /// Owning organization.
    pub organization: OrganizationId,
    /// Payroll month.
    pub period: PayrollMonth,
    /// Employee snapshot.
    pub personnel: PersonnelProfile,
    /// Earning lines by component name.
    #[serde(default)]
    pub earnings: BTreeMap<String, Decimal>,
    /// Deduction lines by component name.
    #[serde(default)]
    pub deductions: BTreeMap<String, Decimal>,
    /// Overtime hours; overtime pay is derived from these.
    #[serde(default)]
    pub overtime_hours: OvertimeHours,
    /// Totals derived from this record's own lines.
    #[serde(default)]
    pub summary: PayrollSummary,
    /// Earning adjustments recorded in this month, aggregated.
    #[serde(default)]
    pub earning_adjustment: AdjustmentTotals,
    /// Deduction adjustments recorded in this month, aggregated.
    #[serde(default)]
    pub deduction_adjustment_total: Decimal,
}

impl PayrollRecord {
    /// Creates an empty payroll record with a fresh id.
    pub fn new(organization: OrganizationId, period: PayrollMonth, personnel: PersonnelProfile) -> Self {
        Self {
            id: PayrollId::new(),
            organization,
            period,
            personnel,
            earnings: BTreeMap::new(),
            deductions: BTreeMap::new(),
            overtime_hours: OvertimeHours::default(),
            summary: PayrollSummary::default(),
            earning_adjustment: AdjustmentTotals::default(),
            deduction_adjustment_total: Decimal::ZERO,
        }
    }

    /// Builder-style helper that sets an earning line.
    pub fn with_earning(mut self, component: &str, amount: Decimal) -> Self {
        self.earnings.insert(component.to_string(), amount);
        self
    }

    /// Builder-style helper that sets a deduction line.
    pub fn with_deduction(mut self, component: &str, amount: Decimal) -> Self {
        self.deductions.insert(component.to_string(), amount);
        self
    }

    /// Amount of an earning line, zero when absent.
    pub fn earning(&self, component: &str) -> Decimal {
        self.earnings.get(component).copied().unwrap_or_default()
    }

    /// Amount of a deduction line, zero when absent.
    pub fn deduction(&self, component: &str) -> Decimal {
        self.deductions.get(component).copied().unwrap_or_default()
    }
}
