//! Earning adjustment calculation.
//!
//! An earning adjustment is assessed in two steps:
//!
//! 1. **Per adjusted month**: every adjustment recorded in the same target
//!    payroll that corrects the same source payroll is summed, and the extra
//!    income tax is found by re-running the tax brackets on the source's
//!    taxable pay plus the adjusted taxable pay.
//! 2. **Monthly**: the per adjusted month totals of every month corrected in
//!    the target payroll are summed into the recorded month totals, which
//!    are also stored on the target payroll.
//!
//! Both steps overwrite their results, so running them again yields the same
//! figures.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::PayrollConfig;
use crate::error::EngineResult;
use crate::models::{
    AdjustmentTotals, EarningAdjustment, PayrollMonth, PensionContribution, PersonnelProfile,
};
use crate::store::{AdjustmentFilter, RecordStore};

use super::classifier::classify;
use super::income_tax::calculate_income_tax;
use super::pension::calculate_pension;
use super::taxability::split_component;

/// Sets an adjustment's own taxable split and pension.
///
/// The split depends on the employee in the corrected month, so callers pass
/// the source payroll's personnel profile. Pension is only due on pensionable
/// components.
///
/// # Errors
///
/// Returns `UnknownComponent` or `ComponentKindMismatch` if the component is
/// not an earning.
pub fn assess_earning_adjustment(
    adjustment: &mut EarningAdjustment,
    personnel: &PersonnelProfile,
    config: &PayrollConfig,
) -> EngineResult<()> {
    let split = split_component(
        &adjustment.component,
        adjustment.earning_amount,
        personnel,
        config.allowances(),
    )?;
    adjustment.taxable = split.taxable;
    adjustment.non_taxable = split.non_taxable;
    adjustment.pension = if classify(&adjustment.component)?.is_pensionable() {
        calculate_pension(adjustment.earning_amount, config.pension())
    } else {
        PensionContribution::default()
    };
    Ok(())
}

/// Recalculates earning adjustment totals against a [`RecordStore`].
///
/// The calculator writes derived fields with plain store saves; it never
/// dispatches lifecycle events.
pub struct EarningAdjustmentCalculator<'a, S: RecordStore + ?Sized> {
    store: &'a mut S,
    config: &'a PayrollConfig,
}

impl<'a, S: RecordStore + ?Sized> EarningAdjustmentCalculator<'a, S> {
    /// Creates a calculator over `store`.
    pub fn new(store: &'a mut S, config: &'a PayrollConfig) -> Self {
        Self { store, config }
    }

    /// Runs both steps for `adjustment`.
    pub fn recalculate(&mut self, adjustment: &EarningAdjustment) -> EngineResult<()> {
        self.calculate_adjustment_per_adjusted_month(adjustment)?;
        self.calculate_monthly_adjustment(adjustment)?;
        Ok(())
    }

    /// Recomputes the totals of every adjustment sharing this adjustment's
    /// target and source payrolls.
    ///
    /// If the adjustment is still stored with the same references it is
    /// re-assessed against the current source payroll first. `adjustment` may
    /// be an instance that was just deleted or moved to other payrolls; its
    /// references still select the group to recompute.
    ///
    /// Returns `None` when the target or source is unset or cannot be
    /// resolved.
    pub fn calculate_adjustment_per_adjusted_month(
        &mut self,
        adjustment: &EarningAdjustment,
    ) -> EngineResult<Option<AdjustmentTotals>> {
        let org = adjustment.organization;
        let (Some(target), Some(source)) = (
            adjustment.payroll_to_record,
            adjustment.payroll_needing_adjustment,
        ) else {
            debug!(adjustment_id = %adjustment.id, "per-month step skipped: reference unset");
            return Ok(None);
        };

        if self.store.payroll(org, target)?.is_none() {
            debug!(adjustment_id = %adjustment.id, payroll_id = %target, "per-month step skipped: target unresolved");
            return Ok(None);
        }
        let Some(source_payroll) = self.store.payroll(org, source)? else {
            debug!(adjustment_id = %adjustment.id, payroll_id = %source, "per-month step skipped: source unresolved");
            return Ok(None);
        };

        // A stored instance that has moved to other payrolls is not part of this group
        if let Some(mut stored) = self.store.earning_adjustment(org, adjustment.id)? {
            if stored.payroll_to_record == Some(target)
                && stored.payroll_needing_adjustment == Some(source)
            {
                assess_earning_adjustment(&mut stored, &source_payroll.personnel, self.config)?;
                stored.adjusted_month = Some(source_payroll.period);
                self.store.save_earning_adjustment(&stored)?;
            }
        }

        let group = self
            .store
            .earning_adjustments(org, AdjustmentFilter::Pair { target, source })?;

        let mut totals = AdjustmentTotals::default();
        for member in &group {
            totals.gross_taxable_pay += member.taxable;
            totals.gross_non_taxable_pay += member.non_taxable;
            totals.pension += &member.pension;
        }
        totals.gross_pay = totals.gross_taxable_pay + totals.gross_non_taxable_pay;

        let summary = &source_payroll.summary;
        totals.total_taxable_pay = summary.gross_taxable_pay + totals.gross_taxable_pay;
        totals.employment_income_tax_total =
            calculate_income_tax(totals.total_taxable_pay, self.config.income_tax());
        totals.employment_income_tax =
            totals.employment_income_tax_total - summary.employment_income_tax;
        totals.total_earning_deduction = totals.employment_income_tax + totals.pension.employee;
        totals.expense = totals.gross_pay + totals.pension.employer;

        for mut member in group {
            member.adjusted_month_totals = totals.clone();
            self.store.save_earning_adjustment(&member)?;
        }

        debug!(
            payroll_to_record = %target,
            payroll_needing_adjustment = %source,
            gross_pay = %totals.gross_pay,
            employment_income_tax = %totals.employment_income_tax,
            "adjusted month totals recalculated"
        );

        Ok(Some(totals))
    }

    /// Recomputes the recorded month totals of every adjustment recorded in
    /// this adjustment's target payroll and stores them on the payroll.
    ///
    /// Each corrected month is counted once, through the first adjustment
    /// found for it. Returns `None` when the target is unset or cannot be
    /// resolved.
    pub fn calculate_monthly_adjustment(
        &mut self,
        adjustment: &EarningAdjustment,
    ) -> EngineResult<Option<AdjustmentTotals>> {
        let org = adjustment.organization;
        let Some(target) = adjustment.payroll_to_record else {
            debug!(adjustment_id = %adjustment.id, "monthly step skipped: target unset");
            return Ok(None);
        };
        let Some(mut target_payroll) = self.store.payroll(org, target)? else {
            debug!(adjustment_id = %adjustment.id, payroll_id = %target, "monthly step skipped: target unresolved");
            return Ok(None);
        };

        let group = self
            .store
            .earning_adjustments(org, AdjustmentFilter::Target(target))?;

        let mut by_month: BTreeMap<PayrollMonth, &AdjustmentTotals> = BTreeMap::new();
        for member in &group {
            if let Some(month) = member.adjusted_month {
                by_month
                    .entry(month)
                    .or_insert(&member.adjusted_month_totals);
            }
        }
        let recorded: AdjustmentTotals = by_month.into_values().sum();

        for mut member in group {
            member.recorded_month_totals = recorded.clone();
            self.store.save_earning_adjustment(&member)?;
        }

        target_payroll.earning_adjustment = recorded.clone();
        self.store.save_payroll(&target_payroll)?;

        debug!(
            payroll_to_record = %target,
            gross_pay = %recorded.gross_pay,
            "recorded month totals recalculated"
        );

        Ok(Some(recorded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::calculate_payroll_summary;
    use crate::models::{
        EarningAdjustmentCase, OrganizationId, PayrollRecord, WorkingArea, WorkingEnvironment,
    };
    use crate::store::InMemoryStore;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn create_test_payroll(org: OrganizationId, month: u32, salary: &str) -> PayrollRecord {
        let personnel = PersonnelProfile {
            personnel_id: "EMP-001".to_string(),
            full_name: "Abebe Kebede".to_string(),
            basic_salary: dec(salary),
            working_environment: WorkingEnvironment::Good,
            working_area: WorkingArea::Other,
            daily_per_diem: Decimal::ZERO,
        };
        let mut record =
            PayrollRecord::new(org, PayrollMonth::new(2024, month).unwrap(), personnel)
                .with_earning("basic_salary", dec(salary));
        record.summary = calculate_payroll_summary(&record, &PayrollConfig::default()).unwrap();
        record
    }

    fn create_test_adjustment(
        org: OrganizationId,
        target: &PayrollRecord,
        source: &PayrollRecord,
        component: &str,
        amount: &str,
    ) -> EarningAdjustment {
        EarningAdjustment::new(
            org,
            Some(target.id),
            Some(source.id),
            EarningAdjustmentCase::Underpayment,
            component,
            dec(amount),
        )
    }

    /// EA-001: assessment splits and prices pension
    #[test]
    fn test_assess_pensionable_component() {
        let org = OrganizationId::new();
        let payroll = create_test_payroll(org, 1, "10000");
        let mut adjustment =
            create_test_adjustment(org, &payroll, &payroll, "basic_salary", "1000");

        assess_earning_adjustment(&mut adjustment, &payroll.personnel, &PayrollConfig::default())
            .unwrap();

        assert_eq!(adjustment.taxable, dec("1000"));
        assert_eq!(adjustment.non_taxable, Decimal::ZERO);
        assert_eq!(adjustment.pension.employee, dec("70"));
        assert_eq!(adjustment.pension.employer, dec("110"));
    }

    /// EA-002: non-pensionable components carry no pension
    #[test]
    fn test_assess_non_pensionable_component() {
        let org = OrganizationId::new();
        let payroll = create_test_payroll(org, 1, "10000");
        let mut adjustment = create_test_adjustment(org, &payroll, &payroll, "commission", "500");
        adjustment.pension.employee = dec("99");

        assess_earning_adjustment(&mut adjustment, &payroll.personnel, &PayrollConfig::default())
            .unwrap();

        assert_eq!(adjustment.pension, PensionContribution::default());
    }

    /// EA-003: per-month tax delta over the source payroll
    #[test]
    fn test_per_adjusted_month_totals() {
        let org = OrganizationId::new();
        let config = PayrollConfig::default();
        let source = create_test_payroll(org, 1, "10000");
        let target = create_test_payroll(org, 2, "10000");
        let adjustment = create_test_adjustment(org, &target, &source, "basic_salary", "1000");

        let mut store = InMemoryStore::new();
        store.save_payroll(&source).unwrap();
        store.save_payroll(&target).unwrap();
        store.save_earning_adjustment(&adjustment).unwrap();

        let totals = EarningAdjustmentCalculator::new(&mut store, &config)
            .calculate_adjustment_per_adjusted_month(&adjustment)
            .unwrap()
            .unwrap();

        // 11000 * 0.30 - 1350 = 1950, previously 1650
        assert_eq!(totals.gross_taxable_pay, dec("1000"));
        assert_eq!(totals.total_taxable_pay, dec("11000"));
        assert_eq!(totals.employment_income_tax_total, dec("1950"));
        assert_eq!(totals.employment_income_tax, dec("300"));
        assert_eq!(totals.pension.employee, dec("70"));
        assert_eq!(totals.total_earning_deduction, dec("370"));
        assert_eq!(totals.expense, dec("1110"));

        let stored = store.earning_adjustment(org, adjustment.id).unwrap().unwrap();
        assert_eq!(stored.adjusted_month, Some(source.period));
        assert_eq!(stored.adjusted_month_totals, totals);
    }

    /// EA-004: unset or unresolved references skip the steps
    #[test]
    fn test_skips_without_references() {
        let org = OrganizationId::new();
        let config = PayrollConfig::default();
        let source = create_test_payroll(org, 1, "10000");
        let target = create_test_payroll(org, 2, "10000");
        let mut store = InMemoryStore::new();
        store.save_payroll(&source).unwrap();

        let mut unset = create_test_adjustment(org, &target, &source, "commission", "10");
        unset.payroll_to_record = None;
        let unresolved = create_test_adjustment(org, &target, &source, "commission", "10");

        let mut calculator = EarningAdjustmentCalculator::new(&mut store, &config);
        assert!(calculator.calculate_adjustment_per_adjusted_month(&unset).unwrap().is_none());
        assert!(calculator.calculate_monthly_adjustment(&unset).unwrap().is_none());
        assert!(calculator.calculate_adjustment_per_adjusted_month(&unresolved).unwrap().is_none());
        assert!(calculator.calculate_monthly_adjustment(&unresolved).unwrap().is_none());
    }

    /// EA-005: one representative per adjusted month
    #[test]
    fn test_monthly_counts_each_month_once() {
        let org = OrganizationId::new();
        let config = PayrollConfig::default();
        let january = create_test_payroll(org, 1, "10000");
        let february = create_test_payroll(org, 2, "10000");
        let march = create_test_payroll(org, 3, "10000");

        let mut store = InMemoryStore::new();
        for record in [&january, &february, &march] {
            store.save_payroll(record).unwrap();
        }

        let adjustments = [
            create_test_adjustment(org, &march, &january, "commission", "50"),
            create_test_adjustment(org, &march, &january, "commission", "75"),
            create_test_adjustment(org, &march, &february, "medical_allowance", "40"),
        ];
        for adjustment in &adjustments {
            store.save_earning_adjustment(adjustment).unwrap();
        }

        let mut calculator = EarningAdjustmentCalculator::new(&mut store, &config);
        for adjustment in &adjustments {
            calculator.recalculate(adjustment).unwrap();
        }

        let recorded = store.payroll(org, march.id).unwrap().unwrap().earning_adjustment;
        assert_eq!(recorded.gross_taxable_pay, dec("125"));
        assert_eq!(recorded.gross_non_taxable_pay, dec("40"));
        assert_eq!(recorded.gross_pay, dec("165"));

        for adjustment in &adjustments {
            let stored = store.earning_adjustment(org, adjustment.id).unwrap().unwrap();
            assert_eq!(stored.recorded_month_totals, recorded);
        }
    }

    /// EA-006: recalculating twice changes nothing
    #[test]
    fn test_recalculation_is_idempotent() {
        let org = OrganizationId::new();
        let config = PayrollConfig::default();
        let source = create_test_payroll(org, 1, "7000");
        let target = create_test_payroll(org, 2, "7000");
        let adjustment = create_test_adjustment(org, &target, &source, "basic_salary", "2500");

        let mut store = InMemoryStore::new();
        store.save_payroll(&source).unwrap();
        store.save_payroll(&target).unwrap();
        store.save_earning_adjustment(&adjustment).unwrap();

        EarningAdjustmentCalculator::new(&mut store, &config)
            .recalculate(&adjustment)
            .unwrap();
        let first = store.earning_adjustment(org, adjustment.id).unwrap().unwrap();
        let first_payroll = store.payroll(org, target.id).unwrap().unwrap();

        EarningAdjustmentCalculator::new(&mut store, &config)
            .recalculate(&adjustment)
            .unwrap();
        let second = store.earning_adjustment(org, adjustment.id).unwrap().unwrap();
        let second_payroll = store.payroll(org, target.id).unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(first_payroll, second_payroll);
    }

    /// EA-007: a deleted instance still drives recalculation of its group
    #[test]
    fn test_recalculation_after_delete() {
        let org = OrganizationId::new();
        let config = PayrollConfig::default();
        let source = create_test_payroll(org, 1, "10000");
        let target = create_test_payroll(org, 2, "10000");
        let kept = create_test_adjustment(org, &target, &source, "commission", "50");
        let removed = create_test_adjustment(org, &target, &source, "commission", "75");

        let mut store = InMemoryStore::new();
        store.save_payroll(&source).unwrap();
        store.save_payroll(&target).unwrap();
        store.save_earning_adjustment(&kept).unwrap();
        store.save_earning_adjustment(&removed).unwrap();
        EarningAdjustmentCalculator::new(&mut store, &config)
            .recalculate(&kept)
            .unwrap();

        let removed = store.delete_earning_adjustment(org, removed.id).unwrap().unwrap();
        EarningAdjustmentCalculator::new(&mut store, &config)
            .recalculate(&removed)
            .unwrap();

        let recorded = store.payroll(org, target.id).unwrap().unwrap().earning_adjustment;
        assert_eq!(recorded.gross_pay, dec("50"));
    }
}
