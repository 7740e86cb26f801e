//! Earning and deduction adjustment models.
//!
//! An adjustment corrects a previously processed month (the *adjusted month*,
//! `payroll_needing_adjustment`) and is paid or withheld in a later payroll
//! (`payroll_to_record`).

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AdjustmentId, AdjustmentTotals, OrganizationId, PayrollId, PayrollMonth, PensionContribution};

/// Why an earning adjustment was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarningAdjustmentCase {
    /// Employee was paid less than owed.
    Underpayment,
    /// Employee was paid more than owed.
    Overpayment,
    /// A deduction was applied in error.
    DeductionError,
    /// General correction.
    Correction,
    /// Retroactive salary increment.
    SalaryIncrement,
    /// Back pay.
    Backpay,
    /// Contract revision.
    ContractRevision,
    /// Unpaid leave deduction.
    UnpaidLeaveDeduction,
    /// Late payment.
    LatePayment,
    /// Allowance added after the fact.
    AllowanceAddition,
    /// Bonus adjustment.
    BonusAdjustment,
    /// Internal transfer adjustment.
    TransferAdjustment,
    /// Anything else.
    Other,
}

/// Why a deduction adjustment was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionAdjustmentCase {
    /// General correction.
    Correction,
    /// Recovery of an overpayment.
    Overpayment,
    /// Retroactive deduction.
    RetroactiveDeduction,
    /// Deduction adjustment.
    DeductionAdjustment,
    /// Court ordered deduction.
    CourtOrderPayment,
    /// Recovery of a salary advance.
    AdvanceRecovery,
    /// Anything else.
    OtherAdjustment,
}

/// Period an adjustment covers, plus bookkeeping dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentCoverage {
    /// First day covered.
    pub period_start: NaiveDate,
    /// Last day covered.
    pub period_end: NaiveDate,
    /// Number of months the adjustment spans.
    pub months_covered: u32,
    /// When the adjustment was created.
    pub created_at: NaiveDate,
    /// When the adjustment was last saved.
    pub updated_at: NaiveDate,
}

impl Default for AdjustmentCoverage {
    fn default() -> Self {
        let today = Utc::now().date_naive();
        Self {
            period_start: today,
            period_end: today,
            months_covered: 1,
            created_at: today,
            updated_at: today,
        }
    }
}

/// A correction to a previously recorded earning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningAdjustment {
    /// Adjustment id.
    pub id: AdjustmentId,
    /// Owning organization.
    pub organization: OrganizationId,
    /// Payroll the adjustment is paid in.
    pub payroll_to_record: Option<PayrollId>,
    /// Payroll whose earning is being corrected.
    pub payroll_needing_adjustment: Option<PayrollId>,
    /// Period of `payroll_needing_adjustment`, resolved on save.
    #[serde(default)]
    pub adjusted_month: Option<PayrollMonth>,
    /// Reason for the adjustment.
    pub case: EarningAdjustmentCase,
    /// Earning component being corrected.
    pub component: String,
    /// Amount owed.
    pub earning_amount: Decimal,
    /// Taxable part of `earning_amount`.
    #[serde(default)]
    pub taxable: Decimal,
    /// Exempt part of `earning_amount`.
    #[serde(default)]
    pub non_taxable: Decimal,
    /// Pension due on `earning_amount` when the component is pensionable.
    #[serde(default)]
    pub pension: PensionContribution,
    /// Totals for every adjustment sharing this target and adjusted month.
    #[serde(default)]
    pub adjusted_month_totals: AdjustmentTotals,
    /// Totals for every adjustment recorded in the target payroll.
    #[serde(default)]
    pub recorded_month_totals: AdjustmentTotals,
    /// Coverage and bookkeeping dates.
    #[serde(default)]
    pub coverage: AdjustmentCoverage,
}

impl EarningAdjustment {
    /// Creates an adjustment with a fresh id and no derived figures.
    pub fn new(
        organization: OrganizationId,
        payroll_to_record: Option<PayrollId>,
        payroll_needing_adjustment: Option<PayrollId>,
        case: EarningAdjustmentCase,
        component: &str,
        earning_amount: Decimal,
    ) -> Self {
        Self {
            id: AdjustmentId::new(),
            organization,
            payroll_to_record,
            payroll_needing_adjustment,
            adjusted_month: None,
            case,
            component: component.to_string(),
            earning_amount,
            taxable: Decimal::ZERO,
            non_taxable: Decimal::ZERO,
            pension: PensionContribution::default(),
            adjusted_month_totals: AdjustmentTotals::default(),
            recorded_month_totals: AdjustmentTotals::default(),
            coverage: AdjustmentCoverage::default(),
        }
    }

    /// Returns true if this adjustment references `payroll` as target or source.
    pub fn references(&self, payroll: PayrollId) -> bool {
        self.payroll_to_record == Some(payroll) || self.payroll_needing_adjustment == Some(payroll)
    }
}

/// A correction to a previously recorded deduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionAdjustment {
    /// Adjustment id.
    pub id: AdjustmentId,
    /// Owning organization.
    pub organization: OrganizationId,
    /// Payroll the deduction is withheld in.
    pub payroll_to_record: Option<PayrollId>,
    /// Payroll whose deduction is being corrected.
    pub payroll_needing_adjustment: Option<PayrollId>,
    /// Period of `payroll_needing_adjustment`, resolved on save.
    #[serde(default)]
    pub adjusted_month: Option<PayrollMonth>,
    /// Reason for the adjustment.
    pub case: DeductionAdjustmentCase,
    /// Deduction component being corrected.
    pub component: String,
    /// Amount to withhold.
    pub deduction_amount: Decimal,
    /// Sum over adjustments sharing this target and adjusted month.
    #[serde(default)]
    pub adjusted_month_total_deduction: Decimal,
    /// Sum over adjustments recorded in the target payroll.
    #[serde(default)]
    pub recorded_month_total_deduction: Decimal,
    /// Coverage and bookkeeping dates.
    #[serde(default)]
    pub coverage: AdjustmentCoverage,
}

impl DeductionAdjustment {
    /// Creates an adjustment with a fresh id and no derived figures.
    pub fn new(
        organization: OrganizationId,
        payroll_to_record: Option<PayrollId>,
        payroll_needing_adjustment: Option<PayrollId>,
        case: DeductionAdjustmentCase,
        component: &str,
        deduction_amount: Decimal,
    ) -> Self {
        Self {
            id: AdjustmentId::new(),
            organization,
            payroll_to_record,
            payroll_needing_adjustment,
            adjusted_month: None,
            case,
            component: component.to_string(),
            deduction_amount,
            adjusted_month_total_deduction: Decimal::ZERO,
            recorded_month_total_deduction: Decimal::ZERO,
            coverage: AdjustmentCoverage::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_earning_adjustment_has_no_derived_figures() {
        let adjustment = EarningAdjustment::new(
            OrganizationId::new(),
            Some(PayrollId::new()),
            Some(PayrollId::new()),
            EarningAdjustmentCase::Backpay,
            "basic_salary",
            Decimal::from(100),
        );
        assert_eq!(adjustment.taxable, Decimal::ZERO);
        assert_eq!(adjustment.adjusted_month_totals, AdjustmentTotals::default());
        assert!(adjustment.adjusted_month.is_none());
    }

    #[test]
    fn test_references_matches_target_and_source() {
        let target = PayrollId::new();
        let source = PayrollId::new();
        let adjustment = EarningAdjustment::new(
            OrganizationId::new(),
            Some(target),
            Some(source),
            EarningAdjustmentCase::Correction,
            "commission",
            Decimal::from(10),
        );
        assert!(adjustment.references(target));
        assert!(adjustment.references(source));
        assert!(!adjustment.references(PayrollId::new()));
    }

    #[test]
    fn test_default_coverage_is_one_month() {
        let coverage = AdjustmentCoverage::default();
        assert_eq!(coverage.months_covered, 1);
        assert_eq!(coverage.period_start, coverage.period_end);
    }

    #[test]
    fn test_case_serializes_snake_case() {
        let json = serde_json::to_string(&DeductionAdjustmentCase::CourtOrderPayment).unwrap();
        assert_eq!(json, "\"court_order_payment\"");
        let case: EarningAdjustmentCase = serde_json::from_str("\"salary_increment\"").unwrap();
        assert_eq!(case, EarningAdjustmentCase::SalaryIncrement);
    }
}
