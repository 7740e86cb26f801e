//! Request types for the Adjustment Engine API.
//!
//! Request bodies carry only user-entered fields. Derived figures (summaries,
//! taxable splits, adjustment totals) are always computed by the engine.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{
    AdjustmentCoverage, AdjustmentId, DeductionAdjustment, DeductionAdjustmentCase,
    EarningAdjustment, EarningAdjustmentCase, OrganizationId, OvertimeHours, PayrollId,
    PayrollMonth, PayrollRecord, PersonnelProfile,
};

/// Request body for `POST /organizations/:org_id/payrolls`.
///
/// Supplying an existing `id` updates that record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollRequest {
    /// Existing record id to update; omitted to create.
    #[serde(default)]
    pub id: Option<PayrollId>,
    /// Payroll month, e.g. "2024-01".
    pub period: PayrollMonth,
    /// Employee snapshot.
    pub personnel: PersonnelProfile,
    /// Earning lines by component name.
    #[serde(default)]
    pub earnings: BTreeMap<String, Decimal>,
    /// Deduction lines by component name.
    #[serde(default)]
    pub deductions: BTreeMap<String, Decimal>,
    /// Overtime hours by band.
    #[serde(default)]
    pub overtime_hours: OvertimeHours,
}

impl PayrollRequest {
    /// Builds the payroll record for `organization`.
    pub fn into_record(self, organization: OrganizationId) -> PayrollRecord {
        let mut record = PayrollRecord::new(organization, self.period, self.personnel);
        if let Some(id) = self.id {
            record.id = id;
        }
        record.earnings = self.earnings;
        record.deductions = self.deductions;
        record.overtime_hours = self.overtime_hours;
        record
    }
}

/// Period covered by an adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageRequest {
    /// First day covered.
    pub period_start: NaiveDate,
    /// Last day covered.
    pub period_end: NaiveDate,
    /// Number of months covered.
    #[serde(default = "default_months_covered")]
    pub months_covered: u32,
}

fn default_months_covered() -> u32 {
    1
}

impl From<CoverageRequest> for AdjustmentCoverage {
    fn from(request: CoverageRequest) -> Self {
        let today = Utc::now().date_naive();
        AdjustmentCoverage {
            period_start: request.period_start,
            period_end: request.period_end,
            months_covered: request.months_covered,
            created_at: today,
            updated_at: today,
        }
    }
}

/// Request body for `POST /organizations/:org_id/earning-adjustments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningAdjustmentRequest {
    /// Existing adjustment id to update; omitted to create.
    #[serde(default)]
    pub id: Option<AdjustmentId>,
    /// Payroll the adjustment is paid in.
    #[serde(default)]
    pub payroll_to_record: Option<PayrollId>,
    /// Payroll being corrected.
    #[serde(default)]
    pub payroll_needing_adjustment: Option<PayrollId>,
    /// Reason for the adjustment.
    pub case: EarningAdjustmentCase,
    /// Earning component name.
    pub component: String,
    /// Amount owed.
    pub earning_amount: Decimal,
    /// Covered period; defaults to today.
    #[serde(default)]
    pub coverage: Option<CoverageRequest>,
}

impl EarningAdjustmentRequest {
    /// Builds the adjustment for `organization`.
    pub fn into_adjustment(self, organization: OrganizationId) -> EarningAdjustment {
        let mut adjustment = EarningAdjustment::new(
            organization,
            self.payroll_to_record,
            self.payroll_needing_adjustment,
            self.case,
            &self.component,
            self.earning_amount,
        );
        if let Some(id) = self.id {
            adjustment.id = id;
        }
        if let Some(coverage) = self.coverage {
            adjustment.coverage = coverage.into();
        }
        adjustment
    }
}

/// Request body for `POST /organizations/:org_id/deduction-adjustments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeductionAdjustmentRequest {
    /// Existing adjustment id to update; omitted to create.
    #[serde(default)]
    pub id: Option<AdjustmentId>,
    /// Payroll the deduction is withheld in.
    #[serde(default)]
    pub payroll_to_record: Option<PayrollId>,
    /// Payroll being corrected.
    #[serde(default)]
    pub payroll_needing_adjustment: Option<PayrollId>,
    /// Reason for the adjustment.
    pub case: DeductionAdjustmentCase,
    /// Deduction component name.
    pub component: String,
    /// Amount to withhold.
    pub deduction_amount: Decimal,
    /// Covered period; defaults to today.
    #[serde(default)]
    pub coverage: Option<CoverageRequest>,
}

impl DeductionAdjustmentRequest {
    /// Builds the adjustment for `organization`.
    pub fn into_adjustment(self, organization: OrganizationId) -> DeductionAdjustment {
        let mut adjustment = DeductionAdjustment::new(
            organization,
            self.payroll_to_record,
            self.payroll_needing_adjustment,
            self.case,
            &self.component,
            self.deduction_amount,
        );
        if let Some(id) = self.id {
            adjustment.id = id;
        }
        if let Some(coverage) = self.coverage {
            adjustment.coverage = coverage.into();
        }
        adjustment
    }
}
