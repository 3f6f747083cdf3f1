//! HTTP API module for the payroll engine.
//!
//! This module provides the REST API endpoints for attendance
//! classification, leave handling, pay runs and the payslip workflow.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    AdjustmentRequest, ApproveLeaveRequest, ClassifyDayRequest, LeaveDecisionRequest,
    LeaveOverageRequest, ManualLineRequest, PayrollRunRequest, RemoveLineRequest, SummaryRequest,
    TransitionRequest,
};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
