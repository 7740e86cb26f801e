//! In-memory transactional record store.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AdjustmentId, DeductionAdjustment, EarningAdjustment, OrganizationId, PayrollId, PayrollRecord,
};

use super::{AdjustmentFilter, RecordStore};

#[derive(Debug, Clone, Default)]
struct Tables {
    payrolls: BTreeMap<PayrollId, PayrollRecord>,
    earning_adjustments: BTreeMap<AdjustmentId, EarningAdjustment>,
    deduction_adjustments: BTreeMap<AdjustmentId, DeductionAdjustment>,
}

/// A [`RecordStore`] that keeps every table in memory.
///
/// A transaction works on a copy of the committed tables; commit swaps the
/// copy in and rollback drops it. Writes outside a transaction apply
/// immediately.
///
/// # Example
///
/// ```
/// use adjustment_engine::store::{InMemoryStore, RecordStore};
///
/// let mut store = InMemoryStore::new();
/// store.begin().unwrap();
/// assert!(store.is_in_transaction());
/// store.rollback().unwrap();
/// assert!(!store.is_in_transaction());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    committed: Tables,
    pending: Option<Tables>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a transaction is open.
    pub fn is_in_transaction(&self) -> bool {
        self.pending.is_some()
    }

    fn tables(&self) -> &Tables {
        self.pending.as_ref().unwrap_or(&self.committed)
    }

    fn tables_mut(&mut self) -> &mut Tables {
        self.pending.as_mut().unwrap_or(&mut self.committed)
    }
}

/// Rejects a write that would move a record to another organization.
fn check_owner(
    kind: &str,
    id: impl std::fmt::Display,
    existing: Option<OrganizationId>,
    incoming: OrganizationId,
) -> EngineResult<()> {
    match existing {
        Some(owner) if owner != incoming => Err(EngineError::Store {
            message: format!("{} {} belongs to another organization", kind, id),
        }),
        _ => Ok(()),
    }
}

impl RecordStore for InMemoryStore {
    fn begin(&mut self) -> EngineResult<()> {
        if self.pending.is_some() {
            return Err(EngineError::Store {
                message: "a transaction is already open".to_string(),
            });
        }
        self.pending = Some(self.committed.clone());
        debug!("transaction started");
        Ok(())
    }

    fn commit(&mut self) -> EngineResult<()> {
        let tables = self.pending.take().ok_or_else(|| EngineError::Store {
            message: "commit without an open transaction".to_string(),
        })?;
        self.committed = tables;
        debug!("transaction committed");
        Ok(())
    }

    fn rollback(&mut self) -> EngineResult<()> {
        if self.pending.take().is_none() {
            return Err(EngineError::Store {
                message: "rollback without an open transaction".to_string(),
            });
        }
        debug!("transaction rolled back");
        Ok(())
    }

    fn payroll(&self, org: OrganizationId, id: PayrollId) -> EngineResult<Option<PayrollRecord>> {
        Ok(self
            .tables()
            .payrolls
            .get(&id)
            .filter(|record| record.organization == org)
            .cloned())
    }

    fn payrolls(&self, org: OrganizationId) -> EngineResult<Vec<PayrollRecord>> {
        Ok(self
            .tables()
            .payrolls
            .values()
            .filter(|record| record.organization == org)
            .cloned()
            .collect())
    }

    fn save_payroll(&mut self, record: &PayrollRecord) -> EngineResult<()> {
        let tables = self.tables_mut();
        let existing = tables.payrolls.get(&record.id).map(|r| r.organization);
        check_owner("Payroll record", record.id, existing, record.organization)?;
        tables.payrolls.insert(record.id, record.clone());
        Ok(())
    }

    fn delete_payroll(
        &mut self,
        org: OrganizationId,
        id: PayrollId,
    ) -> EngineResult<Option<PayrollRecord>> {
        let tables = self.tables_mut();
        if tables.payrolls.get(&id).is_some_and(|r| r.organization == org) {
            Ok(tables.payrolls.remove(&id))
        } else {
            Ok(None)
        }
    }

    fn earning_adjustment(
        &self,
        org: OrganizationId,
        id: AdjustmentId,
    ) -> EngineResult<Option<EarningAdjustment>> {
        Ok(self
            .tables()
            .earning_adjustments
            .get(&id)
            .filter(|adjustment| adjustment.organization == org)
            .cloned())
    }

    fn earning_adjustments(
        &self,
        org: OrganizationId,
        filter: AdjustmentFilter,
    ) -> EngineResult<Vec<EarningAdjustment>> {
        Ok(self
            .tables()
            .earning_adjustments
            .values()
            .filter(|a| {
                a.organization == org
                    && filter.matches(a.payroll_to_record, a.payroll_needing_adjustment)
            })
            .cloned()
            .collect())
    }

    fn save_earning_adjustment(&mut self, adjustment: &EarningAdjustment) -> EngineResult<()> {
        let tables = self.tables_mut();
        let existing = tables
            .earning_adjustments
            .get(&adjustment.id)
            .map(|a| a.organization);
        check_owner("Earning adjustment", adjustment.id, existing, adjustment.organization)?;
        tables
            .earning_adjustments
            .insert(adjustment.id, adjustment.clone());
        Ok(())
    }

    fn delete_earning_adjustment(
        &mut self,
        org: OrganizationId,
        id: AdjustmentId,
    ) -> EngineResult<Option<EarningAdjustment>> {
        let tables = self.tables_mut();
        if tables
            .earning_adjustments
            .get(&id)
            .is_some_and(|a| a.organization == org)
        {
            Ok(tables.earning_adjustments.remove(&id))
        } else {
            Ok(None)
        }
    }

    fn deduction_adjustment(
        &self,
        org: OrganizationId,
        id: AdjustmentId,
    ) -> EngineResult<Option<DeductionAdjustment>> {
        Ok(self
            .tables()
            .deduction_adjustments
            .get(&id)
            .filter(|adjustment| adjustment.organization == org)
            .cloned())
    }

    fn deduction_adjustments(
        &self,
        org: OrganizationId,
        filter: AdjustmentFilter,
    ) -> EngineResult<Vec<DeductionAdjustment>> {
        Ok(self
            .tables()
            .deduction_adjustments
            .values()
            .filter(|a| {
                a.organization == org
                    && filter.matches(a.payroll_to_record, a.payroll_needing_adjustment)
            })
            .cloned()
            .collect())
    }

    fn save_deduction_adjustment(&mut self, adjustment: &DeductionAdjustment) -> EngineResult<()> {
        let tables = self.tables_mut();
        let existing = tables
            .deduction_adjustments
            .get(&adjustment.id)
            .map(|a| a.organization);
        check_owner("Deduction adjustment", adjustment.id, existing, adjustment.organization)?;
        tables
            .deduction_adjustments
            .insert(adjustment.id, adjustment.clone());
        Ok(())
    }

    fn delete_deduction_adjustment(
        &mut self,
        org: OrganizationId,
        id: AdjustmentId,
    ) -> EngineResult<Option<DeductionAdjustment>> {
        let tables = self.tables_mut();
        if tables
            .deduction_adjustments
            .get(&id)
            .is_some_and(|a| a.organization == org)
        {
            Ok(tables.deduction_adjustments.remove(&id))
        } else {
            Ok(None)
        }
    }
}
