//! Core data models for the payroll engine.
//!
//! This module contains all the domain models used throughout the engine.

mod attendance;
mod audit;
mod day_record;
mod employee;
mod holiday;
mod leave;
mod pay_period;
mod payslip;
mod period_metrics;

pub use attendance::{AdjustmentType, AttendanceAdjustment, AttendanceEvent, Direction};
pub use audit::{AuditStep, AuditWarning, WarningSeverity};
pub use day_record::{DayRecord, DayStatus, WorkDuration};
pub use employee::{CompensationPlan, Employee, EmploymentStatus, PayBasis};
pub use holiday::Holiday;
pub use leave::{LeaveOverage, LeaveRequest, LeaveStatus, LeaveType};
pub use pay_period::{
    MonthKey, PayPeriod, PayPeriodBatch, PeriodNumber, ReconciliationRecord, SsoDecision,
    SsoReconciliation,
};
pub use payslip::{
    AUTO_LINE_PREFIX, AttendanceSummary, LeaveSummary, LineItem, LineKind, LineSource,
    PaymentRecord, PayslipSnapshot, PayslipStatus, SsoBreakdown,
};
pub use period_metrics::PeriodMetrics;
