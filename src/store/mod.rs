//! Record storage for payrolls and adjustments.
//!
//! The engine reaches persistence only through the [`RecordStore`] trait.
//! Every lookup is scoped to an [`OrganizationId`]; a record owned by another
//! organization is indistinguishable from a missing one.
//!
//! Saving through the store never triggers recalculation. Lifecycle events
//! are dispatched explicitly by the [`Ledger`](crate::ledger::Ledger), so the
//! calculators can persist derived fields with plain saves.

mod memory;

pub use memory::InMemoryStore;

use crate::error::EngineResult;
use crate::models::{
    AdjustmentId, DeductionAdjustment, EarningAdjustment, OrganizationId, PayrollId, PayrollRecord,
};

/// Selects adjustments by the payrolls they reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentFilter {
    /// Adjustments recorded in this payroll.
    Target(PayrollId),
    /// Adjustments recorded in `target` that correct `source`.
    Pair {
        /// The payroll the adjustment is recorded in.
        target: PayrollId,
        /// The payroll being corrected.
        source: PayrollId,
    },
    /// Adjustments whose target or source is this payroll.
    LinkedTo(PayrollId),
    /// Every adjustment of the organization.
    All,
}

impl AdjustmentFilter {
    /// Returns true if an adjustment with these references is selected.
    pub fn matches(&self, target: Option<PayrollId>, source: Option<PayrollId>) -> bool {
        match *self {
            AdjustmentFilter::Target(id) => target == Some(id),
            AdjustmentFilter::Pair {
                target: t,
                source: s,
            } => target == Some(t) && source == Some(s),
            AdjustmentFilter::LinkedTo(id) => target == Some(id) || source == Some(id),
            AdjustmentFilter::All => true,
        }
    }
}

/// Transactional storage for payroll records and adjustments.
///
/// Implementations must make every write between [`begin`](Self::begin) and
/// [`commit`](Self::commit) invisible to other readers until commit, and
/// discard them on [`rollback`](Self::rollback). Reads inside a transaction
/// see that transaction's own writes.
pub trait RecordStore {
    /// Starts a transaction.
    fn begin(&mut self) -> EngineResult<()>;

    /// Makes the transaction's writes durable.
    fn commit(&mut self) -> EngineResult<()>;

    /// Discards the transaction's writes.
    fn rollback(&mut self) -> EngineResult<()>;

    /// Looks up a payroll record.
    fn payroll(&self, org: OrganizationId, id: PayrollId) -> EngineResult<Option<PayrollRecord>>;

    /// Lists the organization's payroll records, ordered by id.
    fn payrolls(&self, org: OrganizationId) -> EngineResult<Vec<PayrollRecord>>;

    /// Inserts or replaces a payroll record.
    fn save_payroll(&mut self, record: &PayrollRecord) -> EngineResult<()>;

    /// Removes a payroll record, returning it if it existed.
    fn delete_payroll(
        &mut self,
        org: OrganizationId,
        id: PayrollId,
    ) -> EngineResult<Option<PayrollRecord>>;

    /// Looks up an earning adjustment.
    fn earning_adjustment(
        &self,
        org: OrganizationId,
        id: AdjustmentId,
    ) -> EngineResult<Option<EarningAdjustment>>;

    /// Lists earning adjustments selected by `filter`, ordered by id.
    fn earning_adjustments(
        &self,
        org: OrganizationId,
        filter: AdjustmentFilter,
    ) -> EngineResult<Vec<EarningAdjustment>>;

    /// Inserts or replaces an earning adjustment.
    fn save_earning_adjustment(&mut self, adjustment: &EarningAdjustment) -> EngineResult<()>;

    /// Removes an earning adjustment, returning it if it existed.
    fn delete_earning_adjustment(
        &mut self,
        org: OrganizationId,
        id: AdjustmentId,
    ) -> EngineResult<Option<EarningAdjustment>>;

    /// Looks up a deduction adjustment.
    fn deduction_adjustment(
        &self,
        org: OrganizationId,
        id: AdjustmentId,
    ) -> EngineResult<Option<DeductionAdjustment>>;

    /// Lists deduction adjustments selected by `filter`, ordered by id.
    fn deduction_adjustments(
        &self,
        org: OrganizationId,
        filter: AdjustmentFilter,
    ) -> EngineResult<Vec<DeductionAdjustment>>;

    /// Inserts or replaces a deduction adjustment.
    fn save_deduction_adjustment(&mut self, adjustment: &DeductionAdjustment) -> EngineResult<()>;

    /// Removes a deduction adjustment, returning it if it existed.
    fn delete_deduction_adjustment(
        &mut self,
        org: OrganizationId,
        id: AdjustmentId,
    ) -> EngineResult<Option<DeductionAdjustment>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matches() {
        let a = PayrollId::new();
        let b = PayrollId::new();
        let c = PayrollId::new();

        assert!(AdjustmentFilter::Target(a).matches(Some(a), Some(b)));
        assert!(!AdjustmentFilter::Target(a).matches(Some(b), Some(a)));
        assert!(AdjustmentFilter::Pair { target: a, source: b }.matches(Some(a), Some(b)));
        assert!(!AdjustmentFilter::Pair { target: a, source: b }.matches(Some(a), Some(c)));
        assert!(AdjustmentFilter::LinkedTo(b).matches(Some(a), Some(b)));
        assert!(AdjustmentFilter::LinkedTo(a).matches(Some(a), None));
        assert!(!AdjustmentFilter::LinkedTo(c).matches(Some(a), Some(b)));
        assert!(AdjustmentFilter::All.matches(None, None));
    }

    #[test]
    fn test_unset_references_never_match_an_id() {
        let a = PayrollId::new();
        assert!(!AdjustmentFilter::Target(a).matches(None, Some(a)));
        assert!(!AdjustmentFilter::Pair { target: a, source: a }.matches(Some(a), None));
    }
}
