//! Recalculation orchestration.
//!
//! The [`Recalculator`] decides, for each [`RecordEvent`], which adjustment
//! calculations to run and when:
//!
//! | Event | Condition | Reaction |
//! |---|---|---|
//! | Payroll saved | | after commit, both steps for every earning adjustment whose target or source is the payroll |
//! | Earning adjustment saved | target set | after commit, both steps |
//! | Earning adjustment deleted | target set | immediately, with the removed instance |
//! | Earning adjustment moved | previous target set | after commit, both steps for the group it left |
//! | Deduction adjustment saved | | after commit, both steps |
//! | Deduction adjustment deleted | | immediately, both steps |
//! | Deduction adjustment moved | previous target set | after commit, both steps for the group it left |
//!
//! Deduction adjustments are not recalculated when a payroll is saved.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::calculation::{DeductionAdjustmentCalculator, EarningAdjustmentCalculator};
use crate::config::PayrollConfig;
use crate::error::EngineResult;
use crate::models::{DeductionAdjustment, EarningAdjustment, OrganizationId, PayrollId};
use crate::store::{AdjustmentFilter, RecordStore};
use crate::unit_of_work::UnitOfWork;

/// A write to the record store that may require recalculation.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordEvent {
    /// A payroll record was created or updated.
    PayrollSaved {
        /// Owning organization.
        organization: OrganizationId,
        /// The saved payroll.
        payroll: PayrollId,
    },
    /// An earning adjustment was created or updated.
    EarningAdjustmentSaved(EarningAdjustment),
    /// An earning adjustment was deleted; carries the removed instance.
    EarningAdjustmentDeleted(EarningAdjustment),
    /// A saved earning adjustment changed its target or source; carries the
    /// instance as it was before the save.
    EarningAdjustmentMoved(EarningAdjustment),
    /// A deduction adjustment was created or updated.
    DeductionAdjustmentSaved(DeductionAdjustment),
    /// A deduction adjustment was deleted; carries the removed instance.
    DeductionAdjustmentDeleted(DeductionAdjustment),
    /// A saved deduction adjustment changed its target or source; carries the
    /// instance as it was before the save.
    DeductionAdjustmentMoved(DeductionAdjustment),
}

impl RecordEvent {
    /// Short name used in logs and hook labels.
    pub fn name(&self) -> &'static str {
        match self {
            RecordEvent::PayrollSaved { .. } => "payroll_saved",
            RecordEvent::EarningAdjustmentSaved(_) => "earning_adjustment_saved",
            RecordEvent::EarningAdjustmentDeleted(_) => "earning_adjustment_deleted",
            RecordEvent::EarningAdjustmentMoved(_) => "earning_adjustment_moved",
            RecordEvent::DeductionAdjustmentSaved(_) => "deduction_adjustment_saved",
            RecordEvent::DeductionAdjustmentDeleted(_) => "deduction_adjustment_deleted",
            RecordEvent::DeductionAdjustmentMoved(_) => "deduction_adjustment_moved",
        }
    }
}

/// What the recalculator did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reaction")]
pub enum Reaction {
    /// A hook was registered to run after commit.
    Deferred,
    /// Recalculation ran inside the unit of work.
    Immediate {
        /// Number of adjustments recalculated.
        recalculations: usize,
    },
    /// Nothing to recalculate.
    Skipped,
}

/// Reacts to record events by scheduling adjustment recalculation.
#[derive(Debug, Clone)]
pub struct Recalculator {
    config: Arc<PayrollConfig>,
}

impl Recalculator {
    /// Creates a recalculator using `config` for tax and pension rules.
    pub fn new(config: Arc<PayrollConfig>) -> Self {
        Self { config }
    }

    /// Returns the payroll configuration.
    pub fn config(&self) -> &PayrollConfig {
        &self.config
    }

    /// Handles one event inside `uow`.
    ///
    /// # Errors
    ///
    /// Only immediate reactions can fail here; failures of deferred hooks
    /// are reported by [`UnitOfWork::commit`].
    pub fn dispatch<S: RecordStore + 'static>(
        &self,
        uow: &mut UnitOfWork<'_, S>,
        event: RecordEvent,
    ) -> EngineResult<Reaction> {
        let name = event.name();
        let reaction = match event {
            RecordEvent::PayrollSaved {
                organization,
                payroll,
            } => {
                let config = Arc::clone(&self.config);
                uow.on_commit(format!("{}:{}", name, payroll), move |store: &mut S| {
                    recalculate_linked_earnings(store, &config, organization, payroll)
                });
                Reaction::Deferred
            }
            RecordEvent::EarningAdjustmentSaved(adjustment)
            | RecordEvent::EarningAdjustmentMoved(adjustment) => {
                if adjustment.payroll_to_record.is_none() {
                    Reaction::Skipped
                } else {
                    let config = Arc::clone(&self.config);
                    uow.on_commit(format!("{}:{}", name, adjustment.id), move |store: &mut S| {
                        EarningAdjustmentCalculator::new(store, &config).recalculate(&adjustment)?;
                        Ok(1)
                    });
                    Reaction::Deferred
                }
            }
            RecordEvent::EarningAdjustmentDeleted(adjustment) => {
                if adjustment.payroll_to_record.is_none() {
                    Reaction::Skipped
                } else {
                    EarningAdjustmentCalculator::new(uow.store_mut(), &self.config)
                        .recalculate(&adjustment)?;
                    Reaction::Immediate { recalculations: 1 }
                }
            }
            RecordEvent::DeductionAdjustmentSaved(adjustment) => {
                uow.on_commit(format!("{}:{}", name, adjustment.id), move |store: &mut S| {
                    DeductionAdjustmentCalculator::new(store).recalculate(&adjustment)?;
                    Ok(1)
                });
                Reaction::Deferred
            }
            RecordEvent::DeductionAdjustmentDeleted(adjustment) => {
                DeductionAdjustmentCalculator::new(uow.store_mut()).recalculate(&adjustment)?;
                Reaction::Immediate { recalculations: 1 }
            }
            RecordEvent::DeductionAdjustmentMoved(adjustment) => {
                if adjustment.payroll_to_record.is_none() {
                    Reaction::Skipped
                } else {
                    uow.on_commit(format!("{}:{}", name, adjustment.id), move |store: &mut S| {
                        DeductionAdjustmentCalculator::new(store).recalculate(&adjustment)?;
                        Ok(1)
                    });
                    Reaction::Deferred
                }
            }
        };

        info!(event = name, reaction = ?reaction, "record event dispatched");
        Ok(reaction)
    }
}

/// Runs both earning steps for every adjustment linked to `payroll`.
fn recalculate_linked_earnings<S: RecordStore + ?Sized>(
    store: &mut S,
    config: &PayrollConfig,
    organization: OrganizationId,
    payroll: PayrollId,
) -> EngineResult<usize> {
    let linked = store.earning_adjustments(organization, AdjustmentFilter::LinkedTo(payroll))?;
    let mut calculator = EarningAdjustmentCalculator::new(store, config);
    for adjustment in &linked {
        calculator.recalculate(adjustment)?;
    }
    debug!(payroll_id = %payroll, count = linked.len(), "linked earning adjustments recalculated");
    Ok(linked.len())
}
