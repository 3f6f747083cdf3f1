//! Calendar resolution: holidays and weekends.
//!
//! This module answers, for any date, whether it is a company holiday and
//! whether it falls on a weekend under the configured weekend mode.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::WeekendMode;
use crate::models::Holiday;

/// What the calendar says about one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayInfo {
    /// The date resolved.
    pub date: NaiveDate,
    /// True if the date is a holiday.
    pub is_holiday: bool,
    /// The holiday's name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holiday_name: Option<String>,
    /// True if the date is a weekend day.
    pub is_weekend: bool,
}

/// Returns true if `date` is a weekend day under `mode`.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::is_weekend;
/// use payroll_engine::config::WeekendMode;
/// use chrono::NaiveDate;
///
/// // 2026-03-07 is a Saturday
/// let saturday = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
/// assert!(is_weekend(saturday, WeekendMode::SatSun));
/// assert!(!is_weekend(saturday, WeekendMode::SunOnly));
/// ```
pub fn is_weekend(date: NaiveDate, mode: WeekendMode) -> bool {
    match (date.weekday(), mode) {
        (Weekday::Sun, _) => true,
        (Weekday::Sat, WeekendMode::SatSun) => true,
        _ => false,
    }
}

/// The holiday set, keyed by normalized date.
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    holidays: HashMap<NaiveDate, String>,
}

impl HolidayCalendar {
    /// Builds the calendar from raw holiday records.
    ///
    /// Records whose date cannot be parsed are skipped with a warning. If two
    /// records share a date, the first one wins.
    pub fn from_records(records: &[Holiday]) -> Self {
        let mut holidays = HashMap::with_capacity(records.len());
        for record in records {
            match record.normalized_date() {
                Some(date) => {
                    holidays.entry(date).or_insert_with(|| record.name.clone());
                }
                None => {
                    warn!(date = %record.date, name = %record.name, "Skipping holiday with malformed date");
                }
            }
        }
        Self { holidays }
    }

    /// Number of usable holidays.
    pub fn len(&self) -> usize {
        self.holidays.len()
    }

    /// True if no usable holidays were loaded.
    pub fn is_empty(&self) -> bool {
        self.holidays.is_empty()
    }

    /// The holiday name for `date`, if it is one.
    pub fn holiday_name(&self, date: NaiveDate) -> Option<&str> {
        self.holidays.get(&date).map(String::as_str)
    }

    /// Resolves holiday and weekend flags for a date.
    pub fn resolve_day(&self, date: NaiveDate, mode: WeekendMode) -> DayInfo {
        let holiday_name = self.holiday_name(date).map(str::to_string);
        DayInfo {
            date,
            is_holiday: holiday_name.is_some(),
            holiday_name,
            is_weekend: is_weekend(date, mode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holiday(date: &str, name: &str) -> Holiday {
        Holiday {
            date: date.to_string(),
            name: name.to_string(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_sunday_is_always_weekend() {
        let sunday = date(2026, 3, 8);
        assert!(is_weekend(sunday, WeekendMode::SatSun));
        assert!(is_weekend(sunday, WeekendMode::SunOnly));
    }

    #[test]
    fn test_weekday_is_never_weekend() {
        let monday = date(2026, 3, 9);
        assert!(!is_weekend(monday, WeekendMode::SatSun));
        assert!(!is_weekend(monday, WeekendMode::SunOnly));
    }

    #[test]
    fn test_malformed_holidays_are_skipped() {
        let calendar = HolidayCalendar::from_records(&[
            holiday("2026-04-13", "Songkran"),
            holiday("13/04/2026", "Bad format"),
            holiday("", "Empty"),
            holiday("2026-05-01T00:00:00", "Labour Day"),
        ]);
        assert_eq!(calendar.len(), 2);
        assert_eq!(calendar.holiday_name(date(2026, 4, 13)), Some("Songkran"));
        assert_eq!(calendar.holiday_name(date(2026, 5, 1)), Some("Labour Day"));
    }

    #[test]
    fn test_resolve_day_on_holiday_weekend() {
        // 2026-04-12 is a Sunday
        let calendar = HolidayCalendar::from_records(&[holiday("2026-04-12", "Chakri Day")]);
        let info = calendar.resolve_day(date(2026, 4, 12), WeekendMode::SunOnly);
        assert!(info.is_holiday);
        assert!(info.is_weekend);
        assert_eq!(info.holiday_name.as_deref(), Some("Chakri Day"));
    }

    #[test]
    fn test_resolve_ordinary_day() {
        let calendar = HolidayCalendar::default();
        let info = calendar.resolve_day(date(2026, 3, 10), WeekendMode::SatSun);
        assert!(!info.is_holiday);
        assert!(!info.is_weekend);
        assert!(info.holiday_name.is_none());
    }
}
