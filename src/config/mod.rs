//! Configuration loading and management for the payroll engine.
//!
//! This module provides functionality to load the compensation policy and
//! the holiday list from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config").unwrap();
//! println!("Work starts at {}", config.policy().work_time.start_time);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    CompensationPolicy, DEFAULT_DEDUCTION_BASE_DAYS, DEFAULT_PERIOD_ONE_END_DAY, LeaveTypePolicy,
    OverLimitHandling, OverLimitMode, PayPeriodPolicy, PayableDayRules, SsoPolicy, WeekendMode,
    WorkTimePolicy,
};
