//! Aggregated attendance metrics for a date window.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AuditWarning, LeaveType};

/// Totals folded from a run of classified days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodMetrics {
    /// First day of the window (inclusive).
    pub start_date: NaiveDate,
    /// Last day of the window (inclusive).
    pub end_date: NaiveDate,
    /// Days present and on time.
    pub present_days: u32,
    /// Days present but late.
    pub late_days: u32,
    /// Working days without a clock-in.
    pub absent_days: u32,
    /// Days covered by approved leave.
    pub leave_days: u32,
    /// Days with a clock-in but no clock-out.
    pub no_data_days: u32,
    /// Holidays in the window.
    pub holiday_days: u32,
    /// Weekend days in the window.
    pub weekend_days: u32,
    /// Sum of late minutes over late days.
    pub late_minutes: u32,
    /// Minutes worked over closed shifts.
    pub worked_minutes: u32,
    /// Units of daily-rate pay earned.
    pub payable_units: Decimal,
    /// Leave days per type.
    pub leave_days_by_type: BTreeMap<LeaveType, u32>,
    /// True when at least one day needs operator review.
    pub review_needed: bool,
    /// Issues found while aggregating.
    pub warnings: Vec<AuditWarning>,
}

impl PeriodMetrics {
    /// Creates empty metrics for a window.
    pub fn empty(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            present_days: 0,
            late_days: 0,
            absent_days: 0,
            leave_days: 0,
            no_data_days: 0,
            holiday_days: 0,
            weekend_days: 0,
            late_minutes: 0,
            worked_minutes: 0,
            payable_units: Decimal::ZERO,
            leave_days_by_type: BTreeMap::new(),
            review_needed: false,
            warnings: Vec::new(),
        }
    }

    /// Days the employee attended, on time or late.
    pub fn attended_days(&self) -> u32 {
        self.present_days + self.late_days
    }
}
