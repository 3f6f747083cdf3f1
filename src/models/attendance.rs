//! Raw attendance events and manual attendance adjustments.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Direction of a clock event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Clock in.
    In,
    /// Clock out.
    Out,
}

/// A single clock-in or clock-out scan.
///
/// The timestamp is kept as the raw string received from the scanner so a
/// garbled value can be excluded from classification instead of failing the
/// whole record set on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEvent {
    /// The employee who scanned.
    pub employee_id: String,
    /// In or out.
    pub direction: Direction,
    /// Local wall-clock time of the scan.
    pub timestamp: String,
}

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

impl AttendanceEvent {
    /// Parses the scan time as a local date-time.
    ///
    /// RFC 3339 timestamps keep their own offset's wall-clock time. Returns
    /// `None` for anything that does not parse.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::models::{AttendanceEvent, Direction};
    ///
    /// let event = AttendanceEvent {
    ///     employee_id: "emp_001".to_string(),
    ///     direction: Direction::In,
    ///     timestamp: "2026-03-02T08:20:00+07:00".to_string(),
    /// };
    /// assert_eq!(event.local_time().unwrap().to_string(), "2026-03-02 08:20:00");
    ///
    /// let garbled = AttendanceEvent { timestamp: "08:20 yesterday".to_string(), ..event };
    /// assert!(garbled.local_time().is_none());
    /// ```
    pub fn local_time(&self) -> Option<NaiveDateTime> {
        let raw = self.timestamp.trim();

        if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
            return Some(with_offset.naive_local());
        }

        TIMESTAMP_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    }

    /// The calendar date of the scan, if the timestamp parses.
    pub fn local_date(&self) -> Option<NaiveDate> {
        self.local_time().map(|t| t.date())
    }
}

/// The kind of manual correction applied to one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentType {
    /// Sets the in and/or out time for the day.
    AddRecord,
    /// Keeps the scans but zeroes the late minutes.
    ForgiveLate,
}

/// A manual attendance correction for one employee on one date.
///
/// At most one adjustment exists per `(employee_id, date)`; a newer one
/// replaces the older one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceAdjustment {
    /// The employee being corrected.
    pub employee_id: String,
    /// The day being corrected.
    pub date: NaiveDate,
    /// The kind of correction.
    pub adjustment_type: AdjustmentType,
    /// Replacement clock-in time (`ADD_RECORD` only).
    #[serde(default)]
    pub check_in: Option<NaiveTime>,
    /// Replacement clock-out time (`ADD_RECORD` only).
    #[serde(default)]
    pub check_out: Option<NaiveTime>,
    /// Mandatory justification.
    pub note: String,
    /// Who made the correction.
    pub adjusted_by: String,
    /// When the correction was made.
    pub adjusted_at: DateTime<Utc>,
}

impl AttendanceAdjustment {
    /// Checks the adjustment carries its justification and audit identity.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidAdjustment`] when the note or actor is
    /// blank, or when an `ADD_RECORD` sets neither time.
    pub fn validate(&self) -> EngineResult<()> {
        if self.note.trim().is_empty() {
            return Err(EngineError::InvalidAdjustment {
                message: "a justification note is required".to_string(),
            });
        }

        if self.adjusted_by.trim().is_empty() {
            return Err(EngineError::InvalidAdjustment {
                message: "the adjusting user is required".to_string(),
            });
        }

        if self.adjustment_type == AdjustmentType::AddRecord
            && self.check_in.is_none()
            && self.check_out.is_none()
        {
            return Err(EngineError::InvalidAdjustment {
                message: "ADD_RECORD must set check_in or check_out".to_string(),
            });
        }

        Ok(())
    }

    /// The replacement clock-in as a date-time on the adjusted day.
    pub fn check_in_at(&self) -> Option<NaiveDateTime> {
        self.override_at(self.check_in)
    }

    /// The replacement clock-out as a date-time on the adjusted day.
    pub fn check_out_at(&self) -> Option<NaiveDateTime> {
        self.override_at(self.check_out)
    }

    fn override_at(&self, time: Option<NaiveTime>) -> Option<NaiveDateTime> {
        match self.adjustment_type {
            AdjustmentType::AddRecord => time.map(|t| self.date.and_time(t)),
            AdjustmentType::ForgiveLate => None,
        }
    }
}
