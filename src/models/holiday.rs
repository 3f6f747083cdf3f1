//! Holiday records as curated by staff.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A company-wide holiday.
///
/// The date is stored as entered. Records whose date does not normalize to
/// `YYYY-MM-DD` are ignored by the calendar rather than rejected.
///
/// # Example
///
/// ```
/// use payroll_engine::models::Holiday;
/// use chrono::NaiveDate;
///
/// let holiday = Holiday {
///     date: "2026-04-13T00:00:00".to_string(),
///     name: "Songkran".to_string(),
/// };
/// assert_eq!(holiday.normalized_date(), NaiveDate::from_ymd_opt(2026, 4, 13));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    /// The holiday date as entered.
    pub date: String,
    /// The holiday name.
    pub name: String,
}

impl Holiday {
    /// Normalizes the entered date to a calendar date.
    ///
    /// Accepts `YYYY-MM-DD` optionally followed by a time part.
    pub fn normalized_date(&self) -> Option<NaiveDate> {
        let raw = self.date.trim();
        let day_part = raw.split(['T', ' ']).next().unwrap_or(raw);
        NaiveDate::parse_from_str(day_part, "%Y-%m-%d").ok()
    }
}
