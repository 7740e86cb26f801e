//! Payroll Adjustment Engine
//!
//! This crate records monthly payrolls and the earning and deduction
//! adjustments that correct them, and keeps every adjustment's derived
//! figures (taxable split, pension, per-month and per-payroll totals)
//! consistent as records change.
//!
//! Writes go through the [`ledger`], which dispatches a
//! [`RecordEvent`](orchestrator::RecordEvent) to the
//! [`Recalculator`](orchestrator::Recalculator) for each one. Recalculation
//! is deferred until the [`UnitOfWork`](unit_of_work::UnitOfWork) commits,
//! except for deletes, which recalculate immediately.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod orchestrator;
pub mod store;
pub mod unit_of_work;
