//! HTTP API module for the Adjustment Engine.
//!
//! This module provides the REST endpoints for recording payrolls and
//! earning and deduction adjustments. All routes are scoped to an
//! organization: `/organizations/:org_id/...`.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    CoverageRequest, DeductionAdjustmentRequest, EarningAdjustmentRequest, PayrollRequest,
};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
