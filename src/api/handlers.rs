//! HTTP request handlers for the payroll API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::PayrollError;
use crate::settlement::BatchOpening;

use super::request::{
    CalculateRequest, CurrentPeriodQuery, NoteRequest, OpenBatchRequest, OtherDeductionsRequest,
    PaycheckQuery, PeriodRequest, RunBatchRequest, TransitionRequest,
};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/periods",
            post(register_period_handler).get(list_periods_handler),
        )
        .route("/periods/current", get(current_period_handler))
        .route("/periods/:id/summary", get(period_summary_handler))
        .route("/batches", post(open_batch_handler))
        .route("/batches/:id", get(batch_report_handler))
        .route("/batches/:id/run", post(run_batch_handler))
        .route("/paychecks", get(list_paychecks_handler))
        .route("/paychecks/calculate", post(calculate_handler))
        .route("/paychecks/:id", get(get_paycheck_handler))
        .route("/paychecks/:id/transition", post(transition_handler))
        .route("/paychecks/:id/other-deductions", post(other_deductions_handler))
        .route("/paychecks/:id/notes", post(notes_handler))
        .with_state(state)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

fn error_response(correlation_id: Uuid, err: PayrollError) -> Response {
    warn!(
        correlation_id = %correlation_id,
        error = %err,
        "Request failed"
    );
    let api_error: ApiErrorResponse = err.into();
    json_response(api_error.status, api_error.error)
}

/// Maps a JSON extraction failure to a 400 response.
fn rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // The body text carries serde's detailed message
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
    json_response(StatusCode::BAD_REQUEST, error)
}

/// Handler for POST /periods.
async fn register_period_handler(
    State(state): State<AppState>,
    payload: Result<Json<PeriodRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing period registration");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    match state.service().register_period(request.into()).await {
        Ok(period) => {
            info!(correlation_id = %correlation_id, period_id = %period.id, "Period registered");
            json_response(StatusCode::CREATED, period)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for GET /periods.
async fn list_periods_handler(State(state): State<AppState>) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Listing periods");

    match state.service().list_periods().await {
        Ok(periods) => json_response(StatusCode::OK, periods),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for GET /periods/current.
async fn current_period_handler(
    State(state): State<AppState>,
    Query(query): Query<CurrentPeriodQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    info!(correlation_id = %correlation_id, date = %date, "Looking up current period");

    match state.service().current_period(date).await {
        Ok(period) => json_response(StatusCode::OK, period),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for GET /periods/:id/summary.
async fn period_summary_handler(
    State(state): State<AppState>,
    Path(period_id): Path<String>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, period_id = %period_id, "Building period summary");

    match state.service().period_summary(&period_id).await {
        Ok(summary) => json_response(StatusCode::OK, summary),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for POST /batches.
///
/// Returns 201 for a new batch and 200 when the period already had one.
async fn open_batch_handler(
    State(state): State<AppState>,
    payload: Result<Json<OpenBatchRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing batch open request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    match state
        .service()
        .open_batch(&request.period_id, &request.created_by)
        .await
    {
        Ok(BatchOpening::Created(batch)) => {
            info!(
                correlation_id = %correlation_id,
                batch_id = %batch.id,
                total_employees = batch.total_employees,
                "Batch opened"
            );
            json_response(StatusCode::CREATED, batch)
        }
        Ok(BatchOpening::Existing(batch)) => {
            info!(correlation_id = %correlation_id, batch_id = %batch.id, "Batch already open");
            json_response(StatusCode::OK, batch)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for GET /batches/:id.
async fn batch_report_handler(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, batch_id = %batch_id, "Building batch report");

    match state.service().batch_report(batch_id).await {
        Ok(report) => json_response(StatusCode::OK, report),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for POST /batches/:id/run.
async fn run_batch_handler(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    payload: Result<Json<RunBatchRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, batch_id = %batch_id, "Processing batch run request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let start_time = Instant::now();
    match state
        .service()
        .run_batch(batch_id, &request.processed_by)
        .await
    {
        Ok(batch) => {
            info!(
                correlation_id = %correlation_id,
                batch_id = %batch.id,
                status = ?batch.status,
                processed_count = batch.processed_count,
                failed_count = batch.failed_count,
                duration_us = start_time.elapsed().as_micros() as u64,
                "Batch run completed"
            );
            json_response(StatusCode::OK, batch)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for POST /paychecks/calculate.
async fn calculate_handler(
    State(state): State<AppState>,
    payload: Result<Json<CalculateRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing calculation request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let start_time = Instant::now();
    match state
        .service()
        .calculate(&request.employee_id, &request.period_id)
        .await
    {
        Ok(paycheck) => {
            info!(
                correlation_id = %correlation_id,
                employee_id = %paycheck.employee_id,
                net_pay = %paycheck.figures.net_pay,
                duration_us = start_time.elapsed().as_micros() as u64,
                "Calculation completed successfully"
            );
            json_response(StatusCode::OK, paycheck)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for GET /paychecks.
async fn list_paychecks_handler(
    State(state): State<AppState>,
    Query(query): Query<PaycheckQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        employee_id = ?query.employee_id,
        status = ?query.status,
        period_id = ?query.period_id,
        "Listing paychecks"
    );

    match state
        .service()
        .search_paychecks(
            query.employee_id.as_deref(),
            query.status,
            query.period_id.as_deref(),
        )
        .await
    {
        Ok(paychecks) => json_response(StatusCode::OK, paychecks),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for GET /paychecks/:id.
async fn get_paycheck_handler(
    State(state): State<AppState>,
    Path(paycheck_id): Path<Uuid>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, paycheck_id = %paycheck_id, "Fetching paycheck");

    match state.service().get_paycheck(paycheck_id).await {
        Ok(paycheck) => json_response(StatusCode::OK, paycheck),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for POST /paychecks/:id/transition.
async fn transition_handler(
    State(state): State<AppState>,
    Path(paycheck_id): Path<Uuid>,
    payload: Result<Json<TransitionRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, paycheck_id = %paycheck_id, "Processing transition request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    match state
        .service()
        .transition(paycheck_id, request.status, &request.actor)
        .await
    {
        Ok(paycheck) => {
            info!(
                correlation_id = %correlation_id,
                paycheck_id = %paycheck.id,
                status = %paycheck.status,
                "Transition applied"
            );
            json_response(StatusCode::OK, paycheck)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for POST /paychecks/:id/other-deductions.
async fn other_deductions_handler(
    State(state): State<AppState>,
    Path(paycheck_id): Path<Uuid>,
    payload: Result<Json<OtherDeductionsRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, paycheck_id = %paycheck_id, "Processing deduction update");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    match state
        .service()
        .set_other_deductions(paycheck_id, request.amount, request.note)
        .await
    {
        Ok(paycheck) => json_response(StatusCode::OK, paycheck),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for POST /paychecks/:id/notes.
async fn notes_handler(
    State(state): State<AppState>,
    Path(paycheck_id): Path<Uuid>,
    payload: Result<Json<NoteRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, paycheck_id = %paycheck_id, "Processing note");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    match state.service().annotate(paycheck_id, &request.note).await {
        Ok(paycheck) => json_response(StatusCode::OK, paycheck),
        Err(err) => error_response(correlation_id, err),
    }
}
