//! Response types for the payroll engine API.
//!
//! This module defines the error response structures and the mapping from
//! [`EngineError`] to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let status = match &error {
            EngineError::ConfigNotFound { .. }
            | EngineError::ConfigParseError { .. }
            | EngineError::InvalidPolicy { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            EngineError::MissingRate { .. }
            | EngineError::CalculationError { .. }
            | EngineError::NotPayable { .. }
            | EngineError::InvalidAdjustment { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::SsoPolicyMismatch { .. }
            | EngineError::PayslipImmutable { .. }
            | EngineError::InvalidTransition { .. }
            | EngineError::LeaveEntitlementExceeded { .. }
            | EngineError::InvalidLeaveTransition { .. }
            | EngineError::ConcurrentUpdate { .. } => StatusCode::CONFLICT,
            EngineError::EmployeeNotFound { .. }
            | EngineError::PayslipNotFound { .. }
            | EngineError::LeaveRequestNotFound { .. } => StatusCode::NOT_FOUND,
        };

        let error = match &error {
            EngineError::SsoPolicyMismatch { batch_id, .. } => ApiError::with_details(
                error.code(),
                error.to_string(),
                format!(
                    "Retry the run for {} with reconciliation KEEP_LOCKED or ADOPT_CURRENT",
                    batch_id
                ),
            ),
            _ => ApiError::new(error.code(), error.to_string()),
        };

        ApiErrorResponse { status, error }
    }
}
