//! The write path for payrolls and adjustments.
//!
//! Every write goes through a [`LedgerTransaction`]: the record is validated,
//! its derived fields are computed, it is saved, and the matching
//! [`RecordEvent`] is dispatched to the [`Recalculator`]. Deferred
//! recalculations run when the transaction commits.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use adjustment_engine::config::PayrollConfig;
//! use adjustment_engine::ledger::Ledger;
//! use adjustment_engine::models::{
//!     OrganizationId, PayrollRecord, PersonnelProfile, WorkingArea, WorkingEnvironment,
//! };
//! use adjustment_engine::store::InMemoryStore;
//! use rust_decimal::Decimal;
//!
//! let mut ledger = Ledger::new(InMemoryStore::new(), Arc::new(PayrollConfig::default()));
//! let personnel = PersonnelProfile {
//!     personnel_id: "EMP-001".to_string(),
//!     full_name: "Abebe Kebede".to_string(),
//!     basic_salary: Decimal::from(10000),
//!     working_environment: WorkingEnvironment::Good,
//!     working_area: WorkingArea::Other,
//!     daily_per_diem: Decimal::ZERO,
//! };
//! let record = PayrollRecord::new(OrganizationId::new(), "2024-01".parse().unwrap(), personnel)
//!     .with_earning("basic_salary", Decimal::from(10000));
//!
//! let saved = ledger.save_payroll(record).unwrap();
//! assert_eq!(saved.record.summary.net_pay, Decimal::from(7650));
//! assert!(saved.commit.is_clean());
//! ```

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::calculation::{
    TaxabilityClass, assess_earning_adjustment, calculate_payroll_summary, classify,
};
use crate::config::PayrollConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AdjustmentCoverage, AdjustmentId, AdjustmentTotals, DeductionAdjustment, EarningAdjustment,
    OrganizationId, PayrollId, PayrollRecord, PensionContribution, PersonnelProfile,
};
use crate::orchestrator::{Reaction, Recalculator, RecordEvent};
use crate::store::{AdjustmentFilter, RecordStore};
use crate::unit_of_work::{CommitReport, UnitOfWork};

const PAYROLL: &str = "Payroll record";
const EARNING_ADJUSTMENT: &str = "Earning adjustment";
const DEDUCTION_ADJUSTMENT: &str = "Deduction adjustment";

/// A record as it stands after a committed write, with the commit report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Committed<T> {
    /// The record after post-commit recalculation.
    pub record: T,
    /// Outcome of the post-commit hooks.
    pub commit: CommitReport,
}

/// Owns the record store and serves reads and transactional writes.
#[derive(Debug)]
pub struct Ledger<S: RecordStore> {
    store: S,
    recalculator: Recalculator,
}

impl<S: RecordStore + 'static> Ledger<S> {
    /// Creates a ledger over `store`.
    pub fn new(store: S, config: Arc<PayrollConfig>) -> Self {
        Self {
            store,
            recalculator: Recalculator::new(config),
        }
    }

    /// Returns the payroll configuration.
    pub fn config(&self) -> &PayrollConfig {
        self.recalculator.config()
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Opens a transaction for one or more writes.
    pub fn begin(&mut self) -> EngineResult<LedgerTransaction<'_, S>> {
        Ok(LedgerTransaction {
            uow: UnitOfWork::begin(&mut self.store)?,
            recalculator: &self.recalculator,
        })
    }

    /// Runs `op` in its own transaction; commits on success, rolls back on
    /// error.
    pub fn transact<T, F>(&mut self, op: F) -> EngineResult<(T, CommitReport)>
    where
        F: FnOnce(&mut LedgerTransaction<'_, S>) -> EngineResult<T>,
    {
        let mut tx = self.begin()?;
        match op(&mut tx) {
            Ok(value) => {
                let report = tx.commit()?;
                Ok((value, report))
            }
            Err(e) => {
                tx.rollback()?;
                Err(e)
            }
        }
    }

    /// Saves a payroll record in its own transaction.
    pub fn save_payroll(&mut self, record: PayrollRecord) -> EngineResult<Committed<PayrollRecord>> {
        let (org, id) = (record.organization, record.id);
        let (_, commit) = self.transact(|tx| tx.save_payroll(record))?;
        Ok(Committed {
            record: self.payroll(org, id)?,
            commit,
        })
    }

    /// Deletes a payroll record in its own transaction.
    pub fn delete_payroll(
        &mut self,
        org: OrganizationId,
        id: PayrollId,
    ) -> EngineResult<Committed<PayrollRecord>> {
        let (record, commit) = self.transact(|tx| tx.delete_payroll(org, id))?;
        Ok(Committed { record, commit })
    }

    /// Saves an earning adjustment in its own transaction.
    pub fn save_earning_adjustment(
        &mut self,
        adjustment: EarningAdjustment,
    ) -> EngineResult<Committed<EarningAdjustment>> {
        let (org, id) = (adjustment.organization, adjustment.id);
        let (_, commit) = self.transact(|tx| tx.save_earning_adjustment(adjustment))?;
        Ok(Committed {
            record: self.earning_adjustment(org, id)?,
            commit,
        })
    }

    /// Deletes an earning adjustment in its own transaction.
    pub fn delete_earning_adjustment(
        &mut self,
        org: OrganizationId,
        id: AdjustmentId,
    ) -> EngineResult<Committed<EarningAdjustment>> {
        let (record, commit) = self.transact(|tx| tx.delete_earning_adjustment(org, id))?;
        Ok(Committed { record, commit })
    }

    /// Saves a deduction adjustment in its own transaction.
    pub fn save_deduction_adjustment(
        &mut self,
        adjustment: DeductionAdjustment,
    ) -> EngineResult<Committed<DeductionAdjustment>> {
        let (org, id) = (adjustment.organization, adjustment.id);
        let (_, commit) = self.transact(|tx| tx.save_deduction_adjustment(adjustment))?;
        Ok(Committed {
            record: self.deduction_adjustment(org, id)?,
            commit,
        })
    }

    /// Deletes a deduction adjustment in its own transaction.
    pub fn delete_deduction_adjustment(
        &mut self,
        org: OrganizationId,
        id: AdjustmentId,
    ) -> EngineResult<Committed<DeductionAdjustment>> {
        let (record, commit) = self.transact(|tx| tx.delete_deduction_adjustment(org, id))?;
        Ok(Committed { record, commit })
    }

    /// Looks up a payroll record.
    pub fn payroll(&self, org: OrganizationId, id: PayrollId) -> EngineResult<PayrollRecord> {
        self.store
            .payroll(org, id)?
            .ok_or_else(|| EngineError::not_found(PAYROLL, id))
    }

    /// Lists an organization's payroll records.
    pub fn payrolls(&self, org: OrganizationId) -> EngineResult<Vec<PayrollRecord>> {
        self.store.payrolls(org)
    }

    /// Looks up an earning adjustment.
    pub fn earning_adjustment(
        &self,
        org: OrganizationId,
        id: AdjustmentId,
    ) -> EngineResult<EarningAdjustment> {
        self.store
            .earning_adjustment(org, id)?
            .ok_or_else(|| EngineError::not_found(EARNING_ADJUSTMENT, id))
    }

    /// Lists earning adjustments selected by `filter`.
    pub fn earning_adjustments(
        &self,
        org: OrganizationId,
        filter: AdjustmentFilter,
    ) -> EngineResult<Vec<EarningAdjustment>> {
        self.store.earning_adjustments(org, filter)
    }

    /// Looks up a deduction adjustment.
    pub fn deduction_adjustment(
        &self,
        org: OrganizationId,
        id: AdjustmentId,
    ) -> EngineResult<DeductionAdjustment> {
        self.store
            .deduction_adjustment(org, id)?
            .ok_or_else(|| EngineError::not_found(DEDUCTION_ADJUSTMENT, id))
    }

    /// Lists deduction adjustments selected by `filter`.
    pub fn deduction_adjustments(
        &self,
        org: OrganizationId,
        filter: AdjustmentFilter,
    ) -> EngineResult<Vec<DeductionAdjustment>> {
        self.store.deduction_adjustments(org, filter)
    }
}

/// An open ledger transaction.
///
/// Dropping it without calling [`commit`](Self::commit) rolls back every
/// write and discards the deferred recalculations.
pub struct LedgerTransaction<'s, S: RecordStore> {
    uow: UnitOfWork<'s, S>,
    recalculator: &'s Recalculator,
}

impl<'s, S: RecordStore + 'static> LedgerTransaction<'s, S> {
    /// Read access to the store, including this transaction's writes.
    pub fn store(&self) -> &S {
        self.uow.store()
    }

    /// Commits the writes and runs the deferred recalculations.
    pub fn commit(self) -> EngineResult<CommitReport> {
        let report = self.uow.commit()?;
        if !report.is_clean() {
            warn!(failures = report.failures.len(), "commit finished with failed recalculations");
        }
        Ok(report)
    }

    /// Discards the writes and the deferred recalculations.
    pub fn rollback(self) -> EngineResult<()> {
        self.uow.rollback()
    }

    fn dispatch(&mut self, event: RecordEvent) -> EngineResult<Reaction> {
        self.recalculator.dispatch(&mut self.uow, event)
    }

    fn resolve_payroll(&self, org: OrganizationId, id: Option<PayrollId>) -> EngineResult<Option<PayrollRecord>> {
        match id {
            Some(id) => self
                .uow
                .store()
                .payroll(org, id)?
                .map(Some)
                .ok_or_else(|| EngineError::not_found(PAYROLL, id)),
            None => Ok(None),
        }
    }

    /// Validates, summarizes and saves a payroll record.
    ///
    /// Adjustment totals already stored on the record are kept; they are
    /// owned by the adjustment calculators.
    ///
    /// # Errors
    ///
    /// - `DuplicatePayroll` if another record exists for the same personnel
    ///   and period
    /// - `Validation` for negative amounts, a hardship allowance outside an
    ///   adverse environment, a per diem without a daily rate, or an explicit
    ///   overtime line
    /// - `UnknownComponent` / `ComponentKindMismatch` for bad line names
    pub fn save_payroll(&mut self, mut record: PayrollRecord) -> EngineResult<PayrollRecord> {
        let org = record.organization;
        validate_personnel(&record.personnel)?;
        for (field, lines) in [("earnings", &record.earnings), ("deductions", &record.deductions)] {
            if let Some((component, _)) = lines.iter().find(|(_, amount)| amount.is_sign_negative()) {
                return Err(EngineError::validation(
                    format!("{}.{}", field, component),
                    "amount must not be negative",
                ));
            }
        }
        for component in record.earnings.keys() {
            validate_allowance_eligibility(component, &record.personnel)?;
        }

        let duplicate = self.uow.store().payrolls(org)?.into_iter().any(|other| {
            other.id != record.id
                && other.period == record.period
                && other.personnel.personnel_id == record.personnel.personnel_id
        });
        if duplicate {
            return Err(EngineError::DuplicatePayroll {
                personnel_id: record.personnel.personnel_id.clone(),
                period: record.period.label(),
            });
        }

        record.summary = calculate_payroll_summary(&record, self.recalculator.config())?;
        match self.uow.store().payroll(org, record.id)? {
            Some(existing) => {
                record.earning_adjustment = existing.earning_adjustment;
                record.deduction_adjustment_total = existing.deduction_adjustment_total;
            }
            None => {
                record.earning_adjustment = AdjustmentTotals::default();
                record.deduction_adjustment_total = Decimal::ZERO;
            }
        }

        self.uow.store_mut().save_payroll(&record)?;
        info!(
            payroll_id = %record.id,
            personnel_id = %record.personnel.personnel_id,
            period = %record.period,
            net_pay = %record.summary.net_pay,
            "payroll saved"
        );

        self.dispatch(RecordEvent::PayrollSaved {
            organization: org,
            payroll: record.id,
        })?;
        Ok(record)
    }

    /// Deletes a payroll record. Adjustments referencing it are kept.
    pub fn delete_payroll(&mut self, org: OrganizationId, id: PayrollId) -> EngineResult<PayrollRecord> {
        let removed = self
            .uow
            .store_mut()
            .delete_payroll(org, id)?
            .ok_or_else(|| EngineError::not_found(PAYROLL, id))?;
        info!(payroll_id = %id, "payroll deleted");
        Ok(removed)
    }

    /// Validates, assesses and saves an earning adjustment.
    ///
    /// The taxable split and pension are assessed against the employee of
    /// the corrected payroll, or of the target payroll when no source is set.
    /// Changing the target or source also recalculates the group the
    /// adjustment left, after commit.
    ///
    /// # Errors
    ///
    /// - `Validation` for a negative amount or an invalid coverage period
    /// - `UnknownComponent` / `ComponentKindMismatch` unless the component is
    ///   an earning
    /// - `RecordNotFound` if a referenced payroll does not exist
    pub fn save_earning_adjustment(
        &mut self,
        mut adjustment: EarningAdjustment,
    ) -> EngineResult<EarningAdjustment> {
        let org = adjustment.organization;
        if adjustment.earning_amount.is_sign_negative() {
            return Err(EngineError::validation("earning_amount", "amount must not be negative"));
        }
        if !classify(&adjustment.component)?.is_earning() {
            return Err(EngineError::ComponentKindMismatch {
                name: adjustment.component.clone(),
                expected: "an earning".to_string(),
            });
        }
        validate_coverage(&adjustment.coverage)?;

        let target = self.resolve_payroll(org, adjustment.payroll_to_record)?;
        let source = self.resolve_payroll(org, adjustment.payroll_needing_adjustment)?;

        adjustment.adjusted_month = source.as_ref().map(|payroll| payroll.period);
        let personnel = source.as_ref().or(target.as_ref()).map(|payroll| &payroll.personnel);
        match personnel {
            Some(personnel) => {
                validate_allowance_eligibility(&adjustment.component, personnel)?;
                assess_earning_adjustment(&mut adjustment, personnel, self.recalculator.config())?;
            }
            None => {
                adjustment.taxable = Decimal::ZERO;
                adjustment.non_taxable = Decimal::ZERO;
                adjustment.pension = PensionContribution::default();
            }
        }

        let existing = self.uow.store().earning_adjustment(org, adjustment.id)?;
        let mut moved_from = None;
        match existing {
            Some(existing) if same_references(&existing, &adjustment) => {
                adjustment.adjusted_month_totals = existing.adjusted_month_totals;
                adjustment.recorded_month_totals = existing.recorded_month_totals;
                adjustment.coverage.created_at = existing.coverage.created_at;
            }
            Some(existing) => {
                adjustment.adjusted_month_totals = AdjustmentTotals::default();
                adjustment.recorded_month_totals = AdjustmentTotals::default();
                adjustment.coverage.created_at = existing.coverage.created_at;
                moved_from = Some(existing);
            }
            None => {
                adjustment.adjusted_month_totals = AdjustmentTotals::default();
                adjustment.recorded_month_totals = AdjustmentTotals::default();
            }
        }
        adjustment.coverage.updated_at = Utc::now().date_naive();

        self.uow.store_mut().save_earning_adjustment(&adjustment)?;
        info!(
            adjustment_id = %adjustment.id,
            component = %adjustment.component,
            earning_amount = %adjustment.earning_amount,
            "earning adjustment saved"
        );

        self.dispatch(RecordEvent::EarningAdjustmentSaved(adjustment.clone()))?;
        if let Some(previous) = moved_from {
            self.dispatch(RecordEvent::EarningAdjustmentMoved(previous))?;
        }
        Ok(adjustment)
    }

    /// Deletes an earning adjustment and recalculates what it leaves behind.
    pub fn delete_earning_adjustment(
        &mut self,
        org: OrganizationId,
        id: AdjustmentId,
    ) -> EngineResult<EarningAdjustment> {
        let removed = self
            .uow
            .store_mut()
            .delete_earning_adjustment(org, id)?
            .ok_or_else(|| EngineError::not_found(EARNING_ADJUSTMENT, id))?;
        info!(adjustment_id = %id, "earning adjustment deleted");
        self.dispatch(RecordEvent::EarningAdjustmentDeleted(removed.clone()))?;
        Ok(removed)
    }

    /// Validates and saves a deduction adjustment.
    ///
    /// Changing the target or source also recalculates the group the
    /// adjustment left, after commit.
    ///
    /// # Errors
    ///
    /// - `Validation` for a negative amount or an invalid coverage period
    /// - `UnknownComponent` / `ComponentKindMismatch` unless the component is
    ///   a deduction
    /// - `RecordNotFound` if a referenced payroll does not exist
    pub fn save_deduction_adjustment(
        &mut self,
        mut adjustment: DeductionAdjustment,
    ) -> EngineResult<DeductionAdjustment> {
        let org = adjustment.organization;
        if adjustment.deduction_amount.is_sign_negative() {
            return Err(EngineError::validation("deduction_amount", "amount must not be negative"));
        }
        if classify(&adjustment.component)? != TaxabilityClass::Deduction {
            return Err(EngineError::ComponentKindMismatch {
                name: adjustment.component.clone(),
                expected: "a deduction".to_string(),
            });
        }
        validate_coverage(&adjustment.coverage)?;

        self.resolve_payroll(org, adjustment.payroll_to_record)?;
        let source = self.resolve_payroll(org, adjustment.payroll_needing_adjustment)?;
        adjustment.adjusted_month = source.map(|payroll| payroll.period);

        let existing = self.uow.store().deduction_adjustment(org, adjustment.id)?;
        let mut moved_from = None;
        match existing {
            Some(existing) if same_references(&existing, &adjustment) => {
                adjustment.adjusted_month_total_deduction = existing.adjusted_month_total_deduction;
                adjustment.recorded_month_total_deduction = existing.recorded_month_total_deduction;
                adjustment.coverage.created_at = existing.coverage.created_at;
            }
            Some(existing) => {
                adjustment.adjusted_month_total_deduction = Decimal::ZERO;
                adjustment.recorded_month_total_deduction = Decimal::ZERO;
                adjustment.coverage.created_at = existing.coverage.created_at;
                moved_from = Some(existing);
            }
            None => {
                adjustment.adjusted_month_total_deduction = Decimal::ZERO;
                adjustment.recorded_month_total_deduction = Decimal::ZERO;
            }
        }
        adjustment.coverage.updated_at = Utc::now().date_naive();

        self.uow.store_mut().save_deduction_adjustment(&adjustment)?;
        info!(
            adjustment_id = %adjustment.id,
            component = %adjustment.component,
            deduction_amount = %adjustment.deduction_amount,
            "deduction adjustment saved"
        );

        self.dispatch(RecordEvent::DeductionAdjustmentSaved(adjustment.clone()))?;
        if let Some(previous) = moved_from {
            self.dispatch(RecordEvent::DeductionAdjustmentMoved(previous))?;
        }
        Ok(adjustment)
    }

    /// Deletes a deduction adjustment and recalculates what it leaves behind.
    pub fn delete_deduction_adjustment(
        &mut self,
        org: OrganizationId,
        id: AdjustmentId,
    ) -> EngineResult<DeductionAdjustment> {
        let removed = self
            .uow
            .store_mut()
            .delete_deduction_adjustment(org, id)?
            .ok_or_else(|| EngineError::not_found(DEDUCTION_ADJUSTMENT, id))?;
        info!(adjustment_id = %id, "deduction adjustment deleted");
        self.dispatch(RecordEvent::DeductionAdjustmentDeleted(removed.clone()))?;
        Ok(removed)
    }
}

/// Adjustment references that select its recalculation groups.
trait PayrollReferences {
    fn references(&self) -> (Option<PayrollId>, Option<PayrollId>);
}

impl PayrollReferences for EarningAdjustment {
    fn references(&self) -> (Option<PayrollId>, Option<PayrollId>) {
        (self.payroll_to_record, self.payroll_needing_adjustment)
    }
}

impl PayrollReferences for DeductionAdjustment {
    fn references(&self) -> (Option<PayrollId>, Option<PayrollId>) {
        (self.payroll_to_record, self.payroll_needing_adjustment)
    }
}

fn same_references<A: PayrollReferences>(existing: &A, updated: &A) -> bool {
    existing.references() == updated.references()
}

fn validate_personnel(personnel: &PersonnelProfile) -> EngineResult<()> {
    if personnel.personnel_id.trim().is_empty() {
        return Err(EngineError::validation("personnel.personnel_id", "must not be empty"));
    }
    if personnel.basic_salary.is_sign_negative() {
        return Err(EngineError::validation("personnel.basic_salary", "must not be negative"));
    }
    if personnel.daily_per_diem.is_sign_negative() {
        return Err(EngineError::validation("personnel.daily_per_diem", "must not be negative"));
    }
    Ok(())
}

/// Hardship allowance requires an adverse environment; per diem requires a
/// daily rate.
fn validate_allowance_eligibility(component: &str, personnel: &PersonnelProfile) -> EngineResult<()> {
    match component {
        "hardship_allowance" if !personnel.working_environment.qualifies_for_hardship() => {
            Err(EngineError::validation(
                component,
                "hardship allowance is only paid in adverse working environments",
            ))
        }
        "per_diem" if !personnel.has_daily_per_diem() => Err(EngineError::validation(
            component,
            "per diem requires a daily per diem rate",
        )),
        _ => Ok(()),
    }
}

fn validate_coverage(coverage: &AdjustmentCoverage) -> EngineResult<()> {
    if coverage.period_end < coverage.period_start {
        return Err(EngineError::validation(
            "coverage.period_end",
            "must not be before period_start",
        ));
    }
    if coverage.months_covered == 0 {
        return Err(EngineError::validation("coverage.months_covered", "must be at least 1"));
    }
    Ok(())
}
