//! Leave requests and leave overage results.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::OverLimitMode;
use crate::error::{EngineError, EngineResult};

/// The kind of leave requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveType {
    /// Sick leave.
    Sick,
    /// Personal business leave.
    Business,
    /// Annual vacation.
    Vacation,
}

impl std::fmt::Display for LeaveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeaveType::Sick => write!(f, "SICK"),
            LeaveType::Business => write!(f, "BUSINESS"),
            LeaveType::Vacation => write!(f, "VACATION"),
        }
    }
}

/// Where a leave request is in its approval workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    /// Waiting for a decision.
    #[default]
    Submitted,
    /// Approved; affects attendance and payroll.
    Approved,
    /// Rejected by an approver.
    Rejected,
    /// Withdrawn.
    Cancelled,
}

impl std::fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeaveStatus::Submitted => write!(f, "SUBMITTED"),
            LeaveStatus::Approved => write!(f, "APPROVED"),
            LeaveStatus::Rejected => write!(f, "REJECTED"),
            LeaveStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// A request for leave over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Unique identifier for the request.
    pub id: String,
    /// The employee taking leave.
    pub employee_id: String,
    /// The kind of leave.
    pub leave_type: LeaveType,
    /// First day of leave (inclusive).
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Days charged against the entitlement (may be fractional).
    pub days: Decimal,
    /// Workflow status.
    #[serde(default)]
    pub status: LeaveStatus,
    /// Fiscal year the days are charged to.
    pub fiscal_year: i32,
}

impl LeaveRequest {
    /// Returns true if the request is approved.
    pub fn is_approved(&self) -> bool {
        self.status == LeaveStatus::Approved
    }

    /// Returns true if `date` falls within the request's inclusive range.
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Moves a submitted request to approved.
    ///
    /// Entitlement checks happen in
    /// [`approve_leave`](crate::calculation::approve_leave); this only
    /// enforces the workflow.
    pub fn approve(&mut self) -> EngineResult<()> {
        self.transition("approve", &[LeaveStatus::Submitted], LeaveStatus::Approved)
    }

    /// Moves a submitted request to rejected.
    pub fn reject(&mut self) -> EngineResult<()> {
        self.transition("reject", &[LeaveStatus::Submitted], LeaveStatus::Rejected)
    }

    /// Withdraws a submitted or approved request.
    pub fn cancel(&mut self) -> EngineResult<()> {
        self.transition(
            "cancel",
            &[LeaveStatus::Submitted, LeaveStatus::Approved],
            LeaveStatus::Cancelled,
        )
    }

    fn transition(
        &mut self,
        action: &str,
        allowed_from: &[LeaveStatus],
        to: LeaveStatus,
    ) -> EngineResult<()> {
        if !allowed_from.contains(&self.status) {
            return Err(EngineError::InvalidLeaveTransition {
                request_id: self.id.clone(),
                action: action.to_string(),
                status: self.status.to_string(),
            });
        }
        self.status = to;
        Ok(())
    }
}

/// The outcome of comparing leave usage against the annual entitlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveOverage {
    /// The employee evaluated.
    pub employee_id: String,
    /// The leave type evaluated.
    pub leave_type: LeaveType,
    /// The fiscal year evaluated.
    pub fiscal_year: i32,
    /// Annual entitlement; `None` when the type is unlimited.
    pub entitlement: Option<Decimal>,
    /// Approved days already taken before this request.
    pub days_taken: Decimal,
    /// Days being requested or paid for now.
    pub requested_days: Decimal,
    /// True if the requested days push usage past the entitlement.
    pub exceeds: bool,
    /// Requested days that fall beyond the entitlement.
    pub over_days: Decimal,
    /// Overage handling mode, when the type has rules.
    pub mode: Option<OverLimitMode>,
    /// Salary deduction for the over days (`DEDUCT_SALARY` only).
    pub penalty: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn request(status: LeaveStatus) -> LeaveRequest {
        LeaveRequest {
            id: "lv_001".to_string(),
            employee_id: "emp_001".to_string(),
            leave_type: LeaveType::Sick,
            start_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
            days: Decimal::from_str("3").unwrap(),
            status,
            fiscal_year: 2026,
        }
    }

    #[test]
    fn test_covers_is_inclusive() {
        let req = request(LeaveStatus::Approved);
        assert!(req.covers(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()));
        assert!(req.covers(NaiveDate::from_ymd_opt(2026, 3, 4).unwrap()));
        assert!(!req.covers(NaiveDate::from_ymd_opt(2026, 3, 5).unwrap()));
        assert!(!req.covers(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()));
    }

    #[test]
    fn test_approve_from_submitted() {
        let mut req = request(LeaveStatus::Submitted);
        req.approve().unwrap();
        assert!(req.is_approved());
    }

    #[test]
    fn test_cannot_approve_rejected_request() {
        let mut req = request(LeaveStatus::Rejected);
        match req.approve() {
            Err(EngineError::InvalidLeaveTransition { status, action, .. }) => {
                assert_eq!(status, "REJECTED");
                assert_eq!(action, "approve");
            }
            other => panic!("Expected InvalidLeaveTransition, got {:?}", other),
        }
    }

    #[test]
    fn test_cancel_approved_request() {
        let mut req = request(LeaveStatus::Approved);
        req.cancel().unwrap();
        assert_eq!(req.status, LeaveStatus::Cancelled);
        assert!(req.cancel().is_err());
    }

    #[test]
    fn test_leave_request_deserialization_defaults_to_submitted() {
        let json = r#"{
            "id": "lv_002",
            "employee_id": "emp_001",
            "leave_type": "VACATION",
            "start_date": "2026-04-13",
            "end_date": "2026-04-15",
            "days": "3",
            "fiscal_year": 2026
        }"#;
        let req: LeaveRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.leave_type, LeaveType::Vacation);
        assert_eq!(req.status, LeaveStatus::Submitted);
    }
}
