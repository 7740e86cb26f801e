//! HTTP request handlers for the Adjustment Engine API.
//!
//! This module contains the handler functions for all API endpoints. Every
//! write handler runs one ledger transaction; deferred recalculations have
//! already run by the time the response is built.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::ledger::Committed;
use crate::models::{AdjustmentId, OrganizationId, PayrollId};
use crate::store::AdjustmentFilter;

use super::request::{DeductionAdjustmentRequest, EarningAdjustmentRequest, PayrollRequest};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/organizations/:org_id/payrolls",
            get(list_payrolls_handler).post(save_payroll_handler),
        )
        .route(
            "/organizations/:org_id/payrolls/:payroll_id",
            get(get_payroll_handler).delete(delete_payroll_handler),
        )
        .route(
            "/organizations/:org_id/payrolls/:payroll_id/earning-adjustments",
            get(list_recorded_earnings_handler),
        )
        .route(
            "/organizations/:org_id/payrolls/:payroll_id/deduction-adjustments",
            get(list_recorded_deductions_handler),
        )
        .route(
            "/organizations/:org_id/earning-adjustments",
            post(save_earning_adjustment_handler),
        )
        .route(
            "/organizations/:org_id/earning-adjustments/:adjustment_id",
            get(get_earning_adjustment_handler).delete(delete_earning_adjustment_handler),
        )
        .route(
            "/organizations/:org_id/deduction-adjustments",
            post(save_deduction_adjustment_handler),
        )
        .route(
            "/organizations/:org_id/deduction-adjustments/:adjustment_id",
            get(get_deduction_adjustment_handler).delete(delete_deduction_adjustment_handler),
        )
        .with_state(state)
}

/// Handler for POST /organizations/:org_id/payrolls.
///
/// Creates or updates a payroll record, then recalculates every earning
/// adjustment that references it.
async fn save_payroll_handler(
    State(state): State<AppState>,
    path: Result<Path<OrganizationId>, PathRejection>,
    payload: Result<Json<PayrollRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing payroll save request");

    let org = match path_params(correlation_id, path) {
        Ok(org) => org,
        Err(response) => return response,
    };
    let request = match json_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let record = request.into_record(org);
    let start_time = Instant::now();
    let result = {
        let mut ledger = state.ledger().lock().await;
        ledger.save_payroll(record)
    };
    if let Ok(saved) = &result {
        info!(
            correlation_id = %correlation_id,
            payroll_id = %saved.record.id,
            net_pay = %saved.record.summary.net_pay,
            recalculations = saved.commit.recalculations,
            duration_us = start_time.elapsed().as_micros(),
            "Payroll saved"
        );
    }
    committed_response(correlation_id, result)
}

/// Handler for GET /organizations/:org_id/payrolls.
async fn list_payrolls_handler(
    State(state): State<AppState>,
    path: Result<Path<OrganizationId>, PathRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Listing payrolls");

    let org = match path_params(correlation_id, path) {
        Ok(org) => org,
        Err(response) => return response,
    };
    let result = state.ledger().lock().await.payrolls(org);
    json_result(correlation_id, result)
}

/// Handler for GET /organizations/:org_id/payrolls/:payroll_id.
async fn get_payroll_handler(
    State(state): State<AppState>,
    path: Result<Path<(OrganizationId, PayrollId)>, PathRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Fetching payroll");

    let (org, id) = match path_params(correlation_id, path) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let result = state.ledger().lock().await.payroll(org, id);
    json_result(correlation_id, result)
}

/// Handler for DELETE /organizations/:org_id/payrolls/:payroll_id.
///
/// Adjustments that reference the payroll are left in place.
async fn delete_payroll_handler(
    State(state): State<AppState>,
    path: Result<Path<(OrganizationId, PayrollId)>, PathRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing payroll delete request");

    let (org, id) = match path_params(correlation_id, path) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let result = state.ledger().lock().await.delete_payroll(org, id);
    committed_response(correlation_id, result)
}

/// Handler for GET /organizations/:org_id/payrolls/:payroll_id/earning-adjustments.
///
/// Lists the earning adjustments recorded in the payroll.
async fn list_recorded_earnings_handler(
    State(state): State<AppState>,
    path: Result<Path<(OrganizationId, PayrollId)>, PathRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Listing recorded earning adjustments");

    let (org, id) = match path_params(correlation_id, path) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let result = state
        .ledger()
        .lock()
        .await
        .earning_adjustments(org, AdjustmentFilter::Target(id));
    json_result(correlation_id, result)
}

/// Handler for GET /organizations/:org_id/payrolls/:payroll_id/deduction-adjustments.
///
/// Lists the deduction adjustments recorded in the payroll.
async fn list_recorded_deductions_handler(
    State(state): State<AppState>,
    path: Result<Path<(OrganizationId, PayrollId)>, PathRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Listing recorded deduction adjustments");

    let (org, id) = match path_params(correlation_id, path) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let result = state
        .ledger()
        .lock()
        .await
        .deduction_adjustments(org, AdjustmentFilter::Target(id));
    json_result(correlation_id, result)
}

/// Handler for POST /organizations/:org_id/earning-adjustments.
async fn save_earning_adjustment_handler(
    State(state): State<AppState>,
    path: Result<Path<OrganizationId>, PathRejection>,
    payload: Result<Json<EarningAdjustmentRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing earning adjustment save request");

    let org = match path_params(correlation_id, path) {
        Ok(org) => org,
        Err(response) => return response,
    };
    let request = match json_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let adjustment = request.into_adjustment(org);
    let start_time = Instant::now();
    let result = {
        let mut ledger = state.ledger().lock().await;
        ledger.save_earning_adjustment(adjustment)
    };
    if let Ok(saved) = &result {
        info!(
            correlation_id = %correlation_id,
            adjustment_id = %saved.record.id,
            component = %saved.record.component,
            recalculations = saved.commit.recalculations,
            duration_us = start_time.elapsed().as_micros(),
            "Earning adjustment saved"
        );
    }
    committed_response(correlation_id, result)
}

/// Handler for GET /organizations/:org_id/earning-adjustments/:adjustment_id.
async fn get_earning_adjustment_handler(
    State(state): State<AppState>,
    path: Result<Path<(OrganizationId, AdjustmentId)>, PathRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Fetching earning adjustment");

    let (org, id) = match path_params(correlation_id, path) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let result = state.ledger().lock().await.earning_adjustment(org, id);
    json_result(correlation_id, result)
}

/// Handler for DELETE /organizations/:org_id/earning-adjustments/:adjustment_id.
async fn delete_earning_adjustment_handler(
    State(state): State<AppState>,
    path: Result<Path<(OrganizationId, AdjustmentId)>, PathRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing earning adjustment delete request");

    let (org, id) = match path_params(correlation_id, path) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let result = state.ledger().lock().await.delete_earning_adjustment(org, id);
    committed_response(correlation_id, result)
}

/// Handler for POST /organizations/:org_id/deduction-adjustments.
async fn save_deduction_adjustment_handler(
    State(state): State<AppState>,
    path: Result<Path<OrganizationId>, PathRejection>,
    payload: Result<Json<DeductionAdjustmentRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing deduction adjustment save request");

    let org = match path_params(correlation_id, path) {
        Ok(org) => org,
        Err(response) => return response,
    };
    let request = match json_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let adjustment = request.into_adjustment(org);
    let start_time = Instant::now();
    let result = {
        let mut ledger = state.ledger().lock().await;
        ledger.save_deduction_adjustment(adjustment)
    };
    if let Ok(saved) = &result {
        info!(
            correlation_id = %correlation_id,
            adjustment_id = %saved.record.id,
            component = %saved.record.component,
            recalculations = saved.commit.recalculations,
            duration_us = start_time.elapsed().as_micros(),
            "Deduction adjustment saved"
        );
    }
    committed_response(correlation_id, result)
}

/// Handler for GET /organizations/:org_id/deduction-adjustments/:adjustment_id.
async fn get_deduction_adjustment_handler(
    State(state): State<AppState>,
    path: Result<Path<(OrganizationId, AdjustmentId)>, PathRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Fetching deduction adjustment");

    let (org, id) = match path_params(correlation_id, path) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let result = state.ledger().lock().await.deduction_adjustment(org, id);
    json_result(correlation_id, result)
}

/// Handler for DELETE /organizations/:org_id/deduction-adjustments/:adjustment_id.
async fn delete_deduction_adjustment_handler(
    State(state): State<AppState>,
    path: Result<Path<(OrganizationId, AdjustmentId)>, PathRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing deduction adjustment delete request");

    let (org, id) = match path_params(correlation_id, path) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let result = state.ledger().lock().await.delete_deduction_adjustment(org, id);
    committed_response(correlation_id, result)
}

/// Unwraps path parameters or builds the 400 response.
fn path_params<T>(
    correlation_id: Uuid,
    path: Result<Path<T>, PathRejection>,
) -> Result<T, Response> {
    match path {
        Ok(Path(params)) => Ok(params),
        Err(rejection) => {
            let body_text = rejection.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "Invalid path parameters"
            );
            Err(json_response(
                StatusCode::BAD_REQUEST,
                ApiError::invalid_path(body_text),
            ))
        }
    }
}

/// Unwraps a JSON body or builds the 400 response.
fn json_body<T>(correlation_id: Uuid, payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    let rejection = match payload {
        Ok(Json(request)) => return Ok(request),
        Err(rejection) => rejection,
    };

    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // Body text carries the serde error
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    Err(json_response(StatusCode::BAD_REQUEST, error))
}

/// Builds the response for a committed write.
fn committed_response<T: Serialize>(
    correlation_id: Uuid,
    result: EngineResult<Committed<T>>,
) -> Response {
    if let Ok(committed) = &result {
        for failure in &committed.commit.failures {
            warn!(
                correlation_id = %correlation_id,
                hook = %failure.label,
                error = %failure.message,
                "Recalculation failed after commit"
            );
        }
    }
    json_result(correlation_id, result)
}

fn json_result<T: Serialize>(correlation_id: Uuid, result: EngineResult<T>) -> Response {
    match result {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(err) => error_response(correlation_id, err),
    }
}

fn error_response(correlation_id: Uuid, err: EngineError) -> Response {
    let api_error: ApiErrorResponse = err.into();
    if api_error.status.is_server_error() {
        error!(
            correlation_id = %correlation_id,
            code = %api_error.error.code,
            error = %api_error.error.message,
            "Request failed"
        );
    } else {
        warn!(
            correlation_id = %correlation_id,
            code = %api_error.error.code,
            error = %api_error.error.message,
            "Request rejected"
        );
    }
    json_response(api_error.status, api_error.error)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], Json(body)).into_response()
}
