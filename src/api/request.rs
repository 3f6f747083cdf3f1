//! Request types for the payroll engine API.
//!
//! Request bodies reuse the domain models where the client supplies a whole
//! record and carry only identifiers where the record lives in the store.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{
    AdjustmentType, AttendanceAdjustment, AttendanceEvent, Employee, LeaveRequest, LeaveType,
    LineKind, PeriodNumber, SsoReconciliation,
};
use crate::service::{LeaveDecision, PayslipAction};

/// Body of `POST /attendance/classify`: one employee-day with its records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyDayRequest {
    /// The employee.
    pub employee: Employee,
    /// The day to classify.
    pub date: NaiveDate,
    /// Scans for the day.
    #[serde(default)]
    pub events: Vec<AttendanceEvent>,
    /// Leave requests that may cover the day.
    #[serde(default)]
    pub leave: Vec<LeaveRequest>,
    /// The day's adjustment, if any.
    #[serde(default)]
    pub adjustment: Option<AttendanceAdjustment>,
    /// Days after this are `FUTURE`.
    pub reference_today: NaiveDate,
}

/// Body of `POST /attendance/summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRequest {
    /// The employee.
    pub employee_id: String,
    /// First day of the window.
    pub from: NaiveDate,
    /// Last day of the window.
    pub to: NaiveDate,
    /// Defaults to the server's current date.
    #[serde(default)]
    pub reference_today: Option<NaiveDate>,
}

/// Body of `POST /leave/overage`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveOverageRequest {
    /// The employee taking leave.
    pub employee: Employee,
    /// The leave type.
    pub leave_type: LeaveType,
    /// The fiscal year the leave is charged to.
    pub fiscal_year: i32,
    /// Approved days already taken this year.
    pub days_taken: Decimal,
    /// Days being requested.
    pub requested_days: Decimal,
}

/// Body of `POST /leave/approve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveLeaveRequest {
    /// The stored leave request.
    pub request_id: String,
}

/// Body of `POST /leave/decide`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveDecisionRequest {
    /// The stored leave request.
    pub request_id: String,
    /// Reject or cancel.
    pub decision: LeaveDecision,
}

/// Body of `POST /attendance/adjustments`. The server stamps `adjusted_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentRequest {
    /// The employee.
    pub employee_id: String,
    /// The adjusted day.
    pub date: NaiveDate,
    /// What the adjustment does.
    pub adjustment_type: AdjustmentType,
    /// Check-in override.
    #[serde(default)]
    pub check_in: Option<NaiveTime>,
    /// Check-out override.
    #[serde(default)]
    pub check_out: Option<NaiveTime>,
    /// Justification.
    pub note: String,
    /// Who made the adjustment.
    pub adjusted_by: String,
}

impl AdjustmentRequest {
    /// Converts to a stored adjustment stamped with `adjusted_at`.
    pub fn into_adjustment(self, adjusted_at: DateTime<Utc>) -> AttendanceAdjustment {
        AttendanceAdjustment {
            employee_id: self.employee_id,
            date: self.date,
            adjustment_type: self.adjustment_type,
            check_in: self.check_in,
            check_out: self.check_out,
            note: self.note,
            adjusted_by: self.adjusted_by,
            adjusted_at,
        }
    }
}

/// Body of `POST /payroll/runs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollRunRequest {
    /// Calendar year.
    pub year: i32,
    /// Month, 1-12.
    pub month: u32,
    /// 1 or 2.
    pub period: PeriodNumber,
    /// Defaults to the server's current date.
    #[serde(default)]
    pub reference_today: Option<NaiveDate>,
    /// Required when the SSO policy changed since the month was locked.
    #[serde(default)]
    pub reconciliation: Option<SsoReconciliation>,
}

/// Body of `POST /payslips/transition`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    /// The pay period batch.
    pub batch_id: String,
    /// The employee.
    pub employee_id: String,
    /// The lifecycle action, tagged by `action`.
    #[serde(flatten)]
    pub action: PayslipAction,
}

/// Body of `POST /payslips/lines`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualLineRequest {
    /// The pay period batch.
    pub batch_id: String,
    /// The employee.
    pub employee_id: String,
    /// Addition or deduction.
    pub kind: LineKind,
    /// Line code; may not start with `AUTO:`.
    pub code: String,
    /// Line label.
    pub label: String,
    /// Amount, rounded to 2 decimals on entry.
    pub amount: Decimal,
}

/// Body of `POST /payslips/lines/remove`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveLineRequest {
    /// The pay period batch.
    pub batch_id: String,
    /// The employee.
    pub employee_id: String,
    /// Code of the manual lines to remove.
    pub code: String,
}
