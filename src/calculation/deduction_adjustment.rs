//! Deduction adjustment calculation.
//!
//! Deduction adjustments carry no tax or pension, so both steps are plain
//! sums: per adjusted month over the (target, source) group, and monthly
//! over one representative per corrected month in the target payroll.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::EngineResult;
use crate::models::{DeductionAdjustment, PayrollMonth};
use crate::store::{AdjustmentFilter, RecordStore};

/// Recalculates deduction adjustment totals against a [`RecordStore`].
pub struct DeductionAdjustmentCalculator<'a, S: RecordStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: RecordStore + ?Sized> DeductionAdjustmentCalculator<'a, S> {
    /// Creates a calculator over `store`.
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Runs both steps for `adjustment`.
    pub fn recalculate(&mut self, adjustment: &DeductionAdjustment) -> EngineResult<()> {
        self.calculate_adjustment_per_adjusted_month(adjustment)?;
        self.calculate_monthly_adjustment(adjustment)?;
        Ok(())
    }

    /// Sums the deduction amounts sharing this adjustment's target and
    /// source, and stores the sum on every member.
    ///
    /// Returns `None` when the target or source is unset or cannot be
    /// resolved.
    pub fn calculate_adjustment_per_adjusted_month(
        &mut self,
        adjustment: &DeductionAdjustment,
    ) -> EngineResult<Option<Decimal>> {
        let org = adjustment.organization;
        let (Some(target), Some(source)) = (
            adjustment.payroll_to_record,
            adjustment.payroll_needing_adjustment,
        ) else {
            return Ok(None);
        };
        if self.store.payroll(org, target)?.is_none() {
            return Ok(None);
        }
        let Some(source_payroll) = self.store.payroll(org, source)? else {
            return Ok(None);
        };

        if let Some(mut stored) = self.store.deduction_adjustment(org, adjustment.id)? {
            if stored.payroll_to_record == Some(target)
                && stored.payroll_needing_adjustment == Some(source)
                && stored.adjusted_month != Some(source_payroll.period)
            {
                stored.adjusted_month = Some(source_payroll.period);
                self.store.save_deduction_adjustment(&stored)?;
            }
        }

        let group = self
            .store
            .deduction_adjustments(org, AdjustmentFilter::Pair { target, source })?;
        let total: Decimal = group.iter().map(|member| member.deduction_amount).sum();

        for mut member in group {
            member.adjusted_month_total_deduction = total;
            self.store.save_deduction_adjustment(&member)?;
        }

        Ok(Some(total))
    }

    /// Sums one per adjusted month total per corrected month and stores it
    /// on every adjustment in the target payroll and on the payroll.
    ///
    /// Returns `None` when the target is unset or cannot be resolved.
    pub fn calculate_monthly_adjustment(
        &mut self,
        adjustment: &DeductionAdjustment,
    ) -> EngineResult<Option<Decimal>> {
        let org = adjustment.organization;
        let Some(target) = adjustment.payroll_to_record else {
            return Ok(None);
        };
        let Some(mut target_payroll) = self.store.payroll(org, target)? else {
            return Ok(None);
        };

        let group = self
            .store
            .deduction_adjustments(org, AdjustmentFilter::Target(target))?;

        let mut by_month: BTreeMap<PayrollMonth, Decimal> = BTreeMap::new();
        for member in &group {
            if let Some(month) = member.adjusted_month {
                by_month
                    .entry(month)
                    .or_insert(member.adjusted_month_total_deduction);
            }
        }
        let total: Decimal = by_month.into_values().sum();

        for mut member in group {
            member.recorded_month_total_deduction = total;
            self.store.save_deduction_adjustment(&member)?;
        }

        target_payroll.deduction_adjustment_total = total;
        self.store.save_payroll(&target_payroll)?;

        debug!(payroll_to_record = %target, total = %total, "deduction adjustments recalculated");

        Ok(Some(total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        DeductionAdjustmentCase, OrganizationId, PayrollRecord, PersonnelProfile, WorkingArea,
        WorkingEnvironment,
    };
    use crate::store::InMemoryStore;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn create_test_payroll(org: OrganizationId, month: u32) -> PayrollRecord {
        let personnel = PersonnelProfile {
            personnel_id: "EMP-002".to_string(),
            full_name: String::new(),
            basic_salary: dec("6000"),
            working_environment: WorkingEnvironment::Medium,
            working_area: WorkingArea::Other,
            daily_per_diem: Decimal::ZERO,
        };
        PayrollRecord::new(org, PayrollMonth::new(2024, month).unwrap(), personnel)
    }

    fn create_test_adjustment(
        org: OrganizationId,
        target: &PayrollRecord,
        source: &PayrollRecord,
        amount: &str,
    ) -> DeductionAdjustment {
        DeductionAdjustment::new(
            org,
            Some(target.id),
            Some(source.id),
            DeductionAdjustmentCase::AdvanceRecovery,
            "loan_payment",
            dec(amount),
        )
    }

    /// DA-001: pair and monthly sums
    #[test]
    fn test_sums_by_pair_and_month() {
        let org = OrganizationId::new();
        let january = create_test_payroll(org, 1);
        let february = create_test_payroll(org, 2);
        let march = create_test_payroll(org, 3);
        let mut store = InMemoryStore::new();
        for record in [&january, &february, &march] {
            store.save_payroll(record).unwrap();
        }

        let adjustments = [
            create_test_adjustment(org, &march, &january, "100"),
            create_test_adjustment(org, &march, &january, "20.50"),
            create_test_adjustment(org, &march, &february, "30"),
        ];
        for adjustment in &adjustments {
            store.save_deduction_adjustment(adjustment).unwrap();
        }

        let mut calculator = DeductionAdjustmentCalculator::new(&mut store);
        for adjustment in &adjustments {
            calculator.recalculate(adjustment).unwrap();
        }

        let first = store.deduction_adjustment(org, adjustments[0].id).unwrap().unwrap();
        assert_eq!(first.adjusted_month_total_deduction, dec("120.50"));
        assert_eq!(first.recorded_month_total_deduction, dec("150.50"));
        assert_eq!(
            store.payroll(org, march.id).unwrap().unwrap().deduction_adjustment_total,
            dec("150.50")
        );
    }

    /// DA-002: no target means nothing to recalculate
    #[test]
    fn test_skips_without_target() {
        let org = OrganizationId::new();
        let january = create_test_payroll(org, 1);
        let mut store = InMemoryStore::new();
        store.save_payroll(&january).unwrap();

        let mut adjustment = create_test_adjustment(org, &january, &january, "10");
        adjustment.payroll_to_record = None;
        store.save_deduction_adjustment(&adjustment).unwrap();

        let mut calculator = DeductionAdjustmentCalculator::new(&mut store);
        assert!(calculator.calculate_adjustment_per_adjusted_month(&adjustment).unwrap().is_none());
        assert!(calculator.calculate_monthly_adjustment(&adjustment).unwrap().is_none());
    }

    /// DA-003: removing the last adjustment zeroes the payroll total
    #[test]
    fn test_delete_last_adjustment() {
        let org = OrganizationId::new();
        let january = create_test_payroll(org, 1);
        let february = create_test_payroll(org, 2);
        let mut store = InMemoryStore::new();
        store.save_payroll(&january).unwrap();
        store.save_payroll(&february).unwrap();

        let adjustment = create_test_adjustment(org, &february, &january, "45");
        store.save_deduction_adjustment(&adjustment).unwrap();
        DeductionAdjustmentCalculator::new(&mut store)
            .recalculate(&adjustment)
            .unwrap();

        let removed = store
            .delete_deduction_adjustment(org, adjustment.id)
            .unwrap()
            .unwrap();
        DeductionAdjustmentCalculator::new(&mut store)
            .recalculate(&removed)
            .unwrap();

        assert_eq!(
            store.payroll(org, february.id).unwrap().unwrap().deduction_adjustment_total,
            Decimal::ZERO
        );
    }
}
