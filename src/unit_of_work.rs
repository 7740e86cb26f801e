//! Transaction scope with post-commit hooks.
//!
//! A [`UnitOfWork`] opens a transaction on a [`RecordStore`] and collects
//! hooks to run once the transaction has committed. Hooks never run if the
//! unit of work is rolled back, explicitly or by being dropped.

use serde::Serialize;
use tracing::{error, warn};

use crate::error::EngineResult;
use crate::store::RecordStore;

type Hook<S> = Box<dyn FnOnce(&mut S) -> EngineResult<usize>>;

struct PendingHook<S> {
    label: String,
    run: Hook<S>,
}

/// A post-commit hook that returned an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookFailure {
    /// Label the hook was registered with.
    pub label: String,
    /// Error message.
    pub message: String,
}

/// Outcome of the post-commit hooks of a unit of work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    /// Number of hooks that ran, successful or not.
    pub hooks_run: usize,
    /// Recalculations reported by the successful hooks.
    pub recalculations: usize,
    /// Hooks that failed. The committed writes are kept.
    pub failures: Vec<HookFailure>,
}

impl CommitReport {
    /// Returns true if every hook succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// An open transaction plus the hooks to run after it commits.
///
/// # Example
///
/// ```
/// use adjustment_engine::store::InMemoryStore;
/// use adjustment_engine::unit_of_work::UnitOfWork;
///
/// let mut store = InMemoryStore::new();
/// let mut uow = UnitOfWork::begin(&mut store).unwrap();
/// uow.on_commit("count", |_store| Ok(3));
///
/// let report = uow.commit().unwrap();
/// assert_eq!(report.hooks_run, 1);
/// assert_eq!(report.recalculations, 3);
/// ```
pub struct UnitOfWork<'s, S: RecordStore> {
    store: &'s mut S,
    hooks: Vec<PendingHook<S>>,
    open: bool,
}

impl<'s, S: RecordStore> UnitOfWork<'s, S> {
    /// Starts a transaction on `store`.
    pub fn begin(store: &'s mut S) -> EngineResult<Self> {
        store.begin()?;
        Ok(Self {
            store,
            hooks: Vec::new(),
            open: true,
        })
    }

    /// Read access to the store inside the transaction.
    pub fn store(&self) -> &S {
        &*self.store
    }

    /// Write access to the store inside the transaction.
    pub fn store_mut(&mut self) -> &mut S {
        &mut *self.store
    }

    /// Registers a hook to run after a successful commit.
    ///
    /// Hooks run in registration order, each exactly once. The value a hook
    /// returns is added to [`CommitReport::recalculations`].
    pub fn on_commit<F>(&mut self, label: impl Into<String>, hook: F)
    where
        F: FnOnce(&mut S) -> EngineResult<usize> + 'static,
    {
        self.hooks.push(PendingHook {
            label: label.into(),
            run: Box::new(hook),
        });
    }

    /// Number of hooks waiting for commit.
    pub fn pending_hooks(&self) -> usize {
        self.hooks.len()
    }

    /// Commits the transaction, then runs the registered hooks.
    ///
    /// A failing hook is logged and recorded in the report; the remaining
    /// hooks still run. Only a failure of the commit itself is returned as an
    /// error, in which case no hook runs.
    pub fn commit(mut self) -> EngineResult<CommitReport> {
        self.store.commit()?;
        self.open = false;

        let mut report = CommitReport::default();
        for hook in std::mem::take(&mut self.hooks) {
            report.hooks_run += 1;
            match (hook.run)(&mut *self.store) {
                Ok(count) => report.recalculations += count,
                Err(e) => {
                    error!(hook = %hook.label, error = %e, "post-commit recalculation failed");
                    report.failures.push(HookFailure {
                        label: hook.label,
                        message: e.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    /// Discards the transaction and every pending hook.
    pub fn rollback(mut self) -> EngineResult<()> {
        self.open = false;
        self.hooks.clear();
        self.store.rollback()
    }
}

impl<S: RecordStore> Drop for UnitOfWork<'_, S> {
    fn drop(&mut self) {
        if self.open {
            warn!(pending_hooks = self.hooks.len(), "unit of work dropped without commit, rolling back");
            if let Err(e) = self.store.rollback() {
                error!(error = %e, "rollback on drop failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::models::{OrganizationId, PayrollMonth, PayrollRecord, PersonnelProfile, WorkingArea, WorkingEnvironment};
    use crate::store::InMemoryStore;
    use rust_decimal::Decimal;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn create_test_payroll(org: OrganizationId) -> PayrollRecord {
        let personnel = PersonnelProfile {
            personnel_id: "EMP-001".to_string(),
            full_name: String::new(),
            basic_salary: Decimal::from(5000),
            working_environment: WorkingEnvironment::Good,
            working_area: WorkingArea::Other,
            daily_per_diem: Decimal::ZERO,
        };
        PayrollRecord::new(org, PayrollMonth::new(2024, 5).unwrap(), personnel)
    }

    #[test]
    fn test_hooks_run_in_order_after_commit() {
        let mut store = InMemoryStore::new();
        let calls = Rc::new(RefCell::new(Vec::new()));

        let mut uow = UnitOfWork::begin(&mut store).unwrap();
        for label in ["first", "second", "third"] {
            let calls = Rc::clone(&calls);
            uow.on_commit(label, move |store: &mut InMemoryStore| {
                assert!(!store.is_in_transaction());
                calls.borrow_mut().push(label);
                Ok(1)
            });
        }
        assert!(calls.borrow().is_empty());
        assert_eq!(uow.pending_hooks(), 3);

        let report = uow.commit().unwrap();
        assert_eq!(*calls.borrow(), vec!["first", "second", "third"]);
        assert_eq!(report.recalculations, 3);
        assert!(report.is_clean());
    }

    #[test]
    fn test_rollback_discards_hooks() {
        let mut store = InMemoryStore::new();
        let calls = Rc::new(RefCell::new(0));
        let org = OrganizationId::new();
        let record = create_test_payroll(org);

        let mut uow = UnitOfWork::begin(&mut store).unwrap();
        uow.store_mut().save_payroll(&record).unwrap();
        let counter = Rc::clone(&calls);
        uow.on_commit("never", move |_| {
            *counter.borrow_mut() += 1;
            Ok(1)
        });
        uow.rollback().unwrap();

        assert_eq!(*calls.borrow(), 0);
        assert!(store.payroll(org, record.id).unwrap().is_none());
    }

    #[test]
    fn test_drop_rolls_back() {
        let mut store = InMemoryStore::new();
        let calls = Rc::new(RefCell::new(0));
        let org = OrganizationId::new();
        let record = create_test_payroll(org);

        {
            let mut uow = UnitOfWork::begin(&mut store).unwrap();
            uow.store_mut().save_payroll(&record).unwrap();
            let counter = Rc::clone(&calls);
            uow.on_commit("never", move |_| {
                *counter.borrow_mut() += 1;
                Ok(1)
            });
        }

        assert_eq!(*calls.borrow(), 0);
        assert!(!store.is_in_transaction());
        assert!(store.payroll(org, record.id).unwrap().is_none());
    }

    #[test]
    fn test_failing_hook_is_reported_and_others_run() {
        let mut store = InMemoryStore::new();
        let org = OrganizationId::new();
        let record = create_test_payroll(org);

        let mut uow = UnitOfWork::begin(&mut store).unwrap();
        uow.store_mut().save_payroll(&record).unwrap();
        uow.on_commit("broken", |_| {
            Err(EngineError::CalculationError {
                message: "boom".to_string(),
            })
        });
        uow.on_commit("fine", |_| Ok(2));

        let report = uow.commit().unwrap();
        assert_eq!(report.hooks_run, 2);
        assert_eq!(report.recalculations, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].label, "broken");
        assert!(store.payroll(org, record.id).unwrap().is_some());
    }
}
