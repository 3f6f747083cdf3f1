//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the
//! compensation policy and the holiday list from YAML files.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::calculation::HolidayCalendar;
use crate::error::{EngineError, EngineResult};
use crate::models::Holiday;

use super::types::CompensationPolicy;

#[derive(Debug, Deserialize)]
struct HolidaysFile {
    #[serde(default)]
    holidays: Vec<Holiday>,
}

/// Loads and provides access to the engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/
/// ├── policy.yaml     # Compensation policy
/// └── holidays.yaml   # Company holidays
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config").unwrap();
/// println!("Grace minutes: {}", loader.policy().work_time.grace_minutes);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    policy: CompensationPolicy,
    holidays: Vec<Holiday>,
    calendar: HolidayCalendar,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Errors
    ///
    /// - [`EngineError::ConfigNotFound`] if a file is missing
    /// - [`EngineError::ConfigParseError`] if a file is not valid YAML for its type
    /// - [`EngineError::InvalidPolicy`] if the policy fails validation
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let policy = Self::load_yaml::<CompensationPolicy>(&path.join("policy.yaml"))?;
        let holidays = Self::load_yaml::<HolidaysFile>(&path.join("holidays.yaml"))?.holidays;

        let loader = Self::from_parts(policy, holidays)?;
        info!(
            path = %path.display(),
            holidays = loader.calendar.len(),
            sso_fingerprint = %loader.policy.sso.fingerprint(),
            "Configuration loaded"
        );
        Ok(loader)
    }

    /// Builds a loader from an already parsed policy and holiday list.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidPolicy`] if the policy fails validation.
    pub fn from_parts(policy: CompensationPolicy, holidays: Vec<Holiday>) -> EngineResult<Self> {
        policy.validate()?;
        let calendar = HolidayCalendar::from_records(&holidays);
        Ok(Self {
            policy,
            holidays,
            calendar,
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the compensation policy.
    pub fn policy(&self) -> &CompensationPolicy {
        &self.policy
    }

    /// Returns the holiday records as loaded, including malformed ones.
    pub fn holidays(&self) -> &[Holiday] {
        &self.holidays
    }

    /// Returns the holiday calendar built from the usable records.
    pub fn calendar(&self) -> &HolidayCalendar {
        &self.calendar
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PayableDayRules, WeekendMode};
    use crate::models::LeaveType;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn config_path() -> &'static str {
        "./config"
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        let policy = loader.policy();
        assert_eq!(policy.work_time.grace_minutes, 15);
        assert_eq!(policy.work_time.weekend_mode, WeekendMode::SatSun);
        assert_eq!(policy.sso.employee_percent, dec("5"));
        assert_eq!(policy.sso.cap, dec("15000"));
        assert_eq!(policy.payable_days, PayableDayRules::default());
    }

    #[test]
    fn test_leave_rules_loaded() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let business = loader.policy().leave_rules(LeaveType::Business).unwrap();
        assert_eq!(business.annual_entitlement, dec("10"));
        assert_eq!(business.over_limit_handling.base_days(), 26);
    }

    #[test]
    fn test_holiday_calendar_built() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        assert!(!loader.calendar().is_empty());
        assert_eq!(
            loader
                .calendar()
                .holiday_name(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()),
            Some("New Year's Day")
        );
        assert!(loader.holidays().len() >= loader.calendar().len());
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        let result = ConfigLoader::load("/nonexistent/path");
        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("policy.yaml"));
            }
            _ => panic!("Expected ConfigNotFound error"),
        }
    }

    #[test]
    fn test_from_parts_validates_policy() {
        let mut policy = ConfigLoader::load(config_path()).unwrap().policy().clone();
        policy.daily_rate_monthly_days = 0;
        let result = ConfigLoader::from_parts(policy, vec![]);
        assert!(matches!(result, Err(EngineError::InvalidPolicy { .. })));
    }
}
