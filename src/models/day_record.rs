//! Per-day attendance classification results.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{AdjustmentType, LeaveType};

/// The single classification a day receives.
///
/// Variants are listed in the order the classifier checks them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayStatus {
    /// After the reference date; nothing is computed.
    Future,
    /// Before the employee's start date.
    NotStarted,
    /// After the employee's end date.
    Ended,
    /// The employee is suspended.
    Suspended,
    /// A company holiday.
    Holiday {
        /// The holiday's name.
        name: String,
    },
    /// A weekend day under the configured weekend mode.
    Weekend,
    /// Covered by approved leave.
    Leave {
        /// The kind of leave.
        leave_type: LeaveType,
    },
    /// No clock-in on a working day.
    Absent,
    /// Clocked in but never out; needs review.
    NoData,
    /// Clocked in after the grace period.
    Late {
        /// Minutes past the grace threshold.
        late_minutes: u32,
    },
    /// Clocked in on time and out.
    Present,
}

impl DayStatus {
    /// A short code for the status, e.g. `LATE`.
    pub fn code(&self) -> &'static str {
        match self {
            DayStatus::Future => "FUTURE",
            DayStatus::NotStarted => "NOT_STARTED",
            DayStatus::Ended => "ENDED",
            DayStatus::Suspended => "SUSPENDED",
            DayStatus::Holiday { .. } => "HOLIDAY",
            DayStatus::Weekend => "WEEKEND",
            DayStatus::Leave { .. } => "LEAVE",
            DayStatus::Absent => "ABSENT",
            DayStatus::NoData => "NO_DATA",
            DayStatus::Late { .. } => "LATE",
            DayStatus::Present => "PRESENT",
        }
    }

    /// True for statuses decided before any scan is looked at.
    pub fn is_non_working(&self) -> bool {
        matches!(
            self,
            DayStatus::Future
                | DayStatus::NotStarted
                | DayStatus::Ended
                | DayStatus::Suspended
                | DayStatus::Holiday { .. }
                | DayStatus::Weekend
        )
    }
}

/// Time worked on a day, as whole hours plus remainder minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkDuration {
    /// Whole hours.
    pub hours: u32,
    /// Remaining minutes (0-59).
    pub minutes: u32,
}

impl WorkDuration {
    /// Splits a minute count into hours and minutes; negative counts become zero.
    pub fn from_minutes(total_minutes: i64) -> Self {
        let total = u32::try_from(total_minutes.max(0)).unwrap_or(u32::MAX);
        Self {
            hours: total / 60,
            minutes: total % 60,
        }
    }

    /// The duration in minutes.
    pub fn total_minutes(&self) -> u32 {
        self.hours * 60 + self.minutes
    }
}

/// The classified record for one employee on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    /// The employee.
    pub employee_id: String,
    /// The date classified.
    pub date: NaiveDate,
    /// The classification.
    pub status: DayStatus,
    /// First clock-in used, after adjustment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_in: Option<NaiveDateTime>,
    /// Last clock-out used, after adjustment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_out: Option<NaiveDateTime>,
    /// Worked time for closed shifts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_duration: Option<WorkDuration>,
    /// The day needs an operator to look at it.
    #[serde(default)]
    pub review_needed: bool,
    /// The adjustment applied to the day, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjustment: Option<AdjustmentType>,
}

impl DayRecord {
    /// Creates a record with only a status.
    pub fn with_status(employee_id: &str, date: NaiveDate, status: DayStatus) -> Self {
        Self {
            employee_id: employee_id.to_string(),
            date,
            status,
            first_in: None,
            last_out: None,
            work_duration: None,
            review_needed: false,
            adjustment: None,
        }
    }

    /// Late minutes, only for days the employee actually attended.
    ///
    /// ```
    /// use payroll_engine::models::{DayRecord, DayStatus};
    /// use chrono::NaiveDate;
    ///
    /// let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
    /// assert_eq!(DayRecord::with_status("e", date, DayStatus::Weekend).late_minutes(), None);
    /// assert_eq!(DayRecord::with_status("e", date, DayStatus::Present).late_minutes(), Some(0));
    /// ```
    pub fn late_minutes(&self) -> Option<u32> {
        match self.status {
            DayStatus::Late { late_minutes } => Some(late_minutes),
            DayStatus::Present => Some(0),
            _ => None,
        }
    }

    /// True if the day was attended (present or late).
    pub fn is_attended(&self) -> bool {
        matches!(self.status, DayStatus::Present | DayStatus::Late { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_duration_from_minutes() {
        let d = WorkDuration::from_minutes(545);
        assert_eq!(d.hours, 9);
        assert_eq!(d.minutes, 5);
        assert_eq!(d.total_minutes(), 545);
    }

    #[test]
    fn test_work_duration_clamps_negative() {
        assert_eq!(WorkDuration::from_minutes(-30).total_minutes(), 0);
    }

    #[test]
    fn test_status_serialization_is_tagged() {
        let json = serde_json::to_string(&DayStatus::Late { late_minutes: 5 }).unwrap();
        assert_eq!(json, r#"{"kind":"LATE","late_minutes":5}"#);

        let json = serde_json::to_string(&DayStatus::NoData).unwrap();
        assert_eq!(json, r#"{"kind":"NO_DATA"}"#);

        let parsed: DayStatus =
            serde_json::from_str(r#"{"kind":"LEAVE","leave_type":"SICK"}"#).unwrap();
        assert_eq!(
            parsed,
            DayStatus::Leave {
                leave_type: LeaveType::Sick
            }
        );
    }

    #[test]
    fn test_non_working_statuses() {
        assert!(DayStatus::Future.is_non_working());
        assert!(
            DayStatus::Holiday {
                name: "New Year".to_string()
            }
            .is_non_working()
        );
        assert!(!DayStatus::Absent.is_non_working());
        assert!(
            !DayStatus::Leave {
                leave_type: LeaveType::Sick
            }
            .is_non_working()
        );
    }

    #[test]
    fn test_codes() {
        assert_eq!(DayStatus::NotStarted.code(), "NOT_STARTED");
        assert_eq!(DayStatus::Late { late_minutes: 1 }.code(), "LATE");
    }
}
