//! HTTP request handlers for the payroll engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{DayContext, classify_day, evaluate_leave_overage};
use crate::error::{EngineError, EngineResult};
use crate::models::{DayRecord, LineItem, PayPeriod};
use crate::service::PayrollRunner;

use super::request::{
    AdjustmentRequest, ApproveLeaveRequest, ClassifyDayRequest, LeaveDecisionRequest,
    LeaveOverageRequest, ManualLineRequest, PayrollRunRequest, RemoveLineRequest, SummaryRequest,
    TransitionRequest,
};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/attendance/classify", post(classify_handler))
        .route("/attendance/summary", post(summary_handler))
        .route("/attendance/adjustments", post(adjustment_handler))
        .route("/leave/overage", post(leave_overage_handler))
        .route("/leave/approve", post(approve_leave_handler))
        .route("/leave/decide", post(decide_leave_handler))
        .route("/payroll/runs", post(payroll_run_handler))
        .route("/payslips/transition", post(transition_handler))
        .route("/payslips/lines", post(add_line_handler))
        .route("/payslips/lines/remove", post(remove_line_handler))
        .with_state(state)
}

/// Handler for POST /attendance/classify.
///
/// Classifies one employee-day from the records in the payload. Holidays
/// and the work-time policy come from the server.
async fn classify_handler(
    State(state): State<AppState>,
    payload: Result<Json<ClassifyDayRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing classify request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(rejection, correlation_id),
    };

    respond(classify(state.runner(), &request), correlation_id)
}

fn classify(runner: &PayrollRunner, request: &ClassifyDayRequest) -> EngineResult<DayRecord> {
    if let Some(adjustment) = &request.adjustment {
        adjustment.validate()?;
    }
    let config = runner.config();
    let work_time = &config.policy().work_time;
    let calendar = runner.holiday_calendar(&config)?;
    let day_info = calendar.resolve_day(request.date, work_time.weekend_mode);

    Ok(classify_day(
        &DayContext {
            employee: &request.employee,
            date: request.date,
            events: &request.events,
            leave: &request.leave,
            day_info: &day_info,
            adjustment: request.adjustment.as_ref(),
            reference_today: request.reference_today,
        },
        work_time,
    ))
}

/// Handler for POST /attendance/summary.
async fn summary_handler(
    State(state): State<AppState>,
    payload: Result<Json<SummaryRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(rejection, correlation_id),
    };
    info!(
        correlation_id = %correlation_id,
        employee_id = %request.employee_id,
        from = %request.from,
        to = %request.to,
        "Processing attendance summary request"
    );

    let reference_today = request
        .reference_today
        .unwrap_or_else(|| Utc::now().date_naive());
    respond(
        state
            .runner()
            .summarize(&request.employee_id, request.from, request.to, reference_today),
        correlation_id,
    )
}

/// Handler for POST /attendance/adjustments.
async fn adjustment_handler(
    State(state): State<AppState>,
    payload: Result<Json<AdjustmentRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(rejection, correlation_id),
    };

    let adjustment = request.into_adjustment(Utc::now());
    let result = state
        .runner()
        .record_adjustment(adjustment.clone())
        .map(|()| adjustment);
    respond(result, correlation_id)
}

/// Handler for POST /leave/overage.
async fn leave_overage_handler(
    State(state): State<AppState>,
    payload: Result<Json<LeaveOverageRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(rejection, correlation_id),
    };

    let config = state.runner().config();
    respond(
        evaluate_leave_overage(
            &request.employee,
            request.leave_type,
            request.fiscal_year,
            request.days_taken,
            request.requested_days,
            config.policy(),
        ),
        correlation_id,
    )
}

/// Handler for POST /leave/approve.
async fn approve_leave_handler(
    State(state): State<AppState>,
    payload: Result<Json<ApproveLeaveRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(rejection, correlation_id),
    };
    info!(correlation_id = %correlation_id, request_id = %request.request_id, "Approving leave");

    respond(state.runner().approve_leave(&request.request_id), correlation_id)
}

/// Handler for POST /leave/decide.
async fn decide_leave_handler(
    State(state): State<AppState>,
    payload: Result<Json<LeaveDecisionRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(rejection, correlation_id),
    };

    respond(
        state
            .runner()
            .decide_leave(&request.request_id, request.decision),
        correlation_id,
    )
}

/// Handler for POST /payroll/runs.
///
/// Responds 409 with `SSO_POLICY_MISMATCH` when the month's lock has drifted
/// from the live policy and no reconciliation was supplied.
async fn payroll_run_handler(
    State(state): State<AppState>,
    payload: Result<Json<PayrollRunRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(rejection, correlation_id),
    };

    let start_time = Instant::now();
    let reference_today = request
        .reference_today
        .unwrap_or_else(|| Utc::now().date_naive());
    let result = PayPeriod::new(request.year, request.month, request.period).and_then(|period| {
        state
            .runner()
            .run(period, reference_today, request.reconciliation)
    });

    if let Ok(report) = &result {
        info!(
            correlation_id = %correlation_id,
            batch_id = %report.batch_id,
            payslips = report.payslips.len(),
            failures = report.failures.len(),
            duration_us = start_time.elapsed().as_micros(),
            "Pay run request completed"
        );
    }
    respond(result, correlation_id)
}

/// Handler for POST /payslips/transition.
async fn transition_handler(
    State(state): State<AppState>,
    payload: Result<Json<TransitionRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(rejection, correlation_id),
    };

    respond(
        state
            .runner()
            .transition_payslip(&request.batch_id, &request.employee_id, request.action),
        correlation_id,
    )
}

/// Handler for POST /payslips/lines.
async fn add_line_handler(
    State(state): State<AppState>,
    payload: Result<Json<ManualLineRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(rejection, correlation_id),
    };

    let line = LineItem::manual(&request.code, request.label, request.amount);
    respond(
        state.runner().add_manual_line(
            &request.batch_id,
            &request.employee_id,
            request.kind,
            line,
        ),
        correlation_id,
    )
}

/// Handler for POST /payslips/lines/remove.
async fn remove_line_handler(
    State(state): State<AppState>,
    payload: Result<Json<RemoveLineRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(rejection, correlation_id),
    };

    respond(
        state
            .runner()
            .remove_manual_line(&request.batch_id, &request.employee_id, &request.code),
        correlation_id,
    )
}

fn respond<T: Serialize>(result: EngineResult<T>, correlation_id: Uuid) -> Response {
    match result {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            Json(body),
        )
            .into_response(),
        Err(err) => error_response(err, correlation_id),
    }
}

fn error_response(err: EngineError, correlation_id: Uuid) -> Response {
    warn!(
        correlation_id = %correlation_id,
        code = err.code(),
        error = %err,
        "Request failed"
    );
    let api_error: ApiErrorResponse = err.into();
    (
        api_error.status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(api_error.error),
    )
        .into_response()
}

fn rejection_response(rejection: JsonRejection, correlation_id: Uuid) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
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
    (
        StatusCode::BAD_REQUEST,
        [(header::CONTENT_TYPE, "application/json")],
        Json(error),
    )
        .into_response()
}
