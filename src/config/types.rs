//! Compensation policy types.
//!
//! This module contains the strongly-typed policy structures that are
//! deserialized from `policy.yaml`. The policy is always passed explicitly
//! into the calculation functions; nothing in the engine reads it from
//! ambient state.

use std::collections::BTreeMap;

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{EngineError, EngineResult};
use crate::models::LeaveType;

/// Divisor used to turn a monthly salary into a daily rate when the
/// leave policy does not set one.
pub const DEFAULT_DEDUCTION_BASE_DAYS: u32 = 26;

/// Last day of pay period 1 when the policy does not set one.
pub const DEFAULT_PERIOD_ONE_END_DAY: u32 = 15;

/// Which days of the week are treated as weekend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeekendMode {
    /// Saturday and Sunday are both weekend days.
    SatSun,
    /// Only Sunday is a weekend day.
    SunOnly,
}

/// Working-time rules used to compute lateness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkTimePolicy {
    /// The standard start of the working day.
    pub start_time: NaiveTime,
    /// Minutes after `start_time` before an arrival counts as late.
    pub grace_minutes: u32,
    /// Weekend rule.
    pub weekend_mode: WeekendMode,
}

impl WorkTimePolicy {
    /// The latest arrival time that is still on time.
    pub fn late_threshold(&self) -> NaiveTime {
        self.start_time + chrono::Duration::minutes(i64::from(self.grace_minutes))
    }
}

/// Bi-monthly pay period boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPeriodPolicy {
    /// The last day of the month that belongs to period 1.
    #[serde(default = "default_period_one_end_day")]
    pub period_one_end_day: u32,
}

impl Default for PayPeriodPolicy {
    fn default() -> Self {
        Self {
            period_one_end_day: DEFAULT_PERIOD_ONE_END_DAY,
        }
    }
}

fn default_period_one_end_day() -> u32 {
    DEFAULT_PERIOD_ONE_END_DAY
}

/// Statutory social-security contribution parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsoPolicy {
    /// Employee contribution in percent (e.g. `5` for 5%).
    pub employee_percent: Decimal,
    /// Salaries below this are contributed on this base.
    pub min_base: Decimal,
    /// Salaries above this are contributed on this base.
    pub cap: Decimal,
}

impl SsoPolicy {
    /// Returns a stable fingerprint of the contribution parameters.
    ///
    /// Values are normalized first so `5` and `5.00` fingerprint the same.
    /// The result is a lowercase hex SHA-256 digest.
    pub fn fingerprint(&self) -> String {
        let canonical = format!(
            "sso|employee_percent={}|min_base={}|cap={}",
            self.employee_percent.normalize(),
            self.min_base.normalize(),
            self.cap.normalize()
        );
        format!("{:x}", Sha256::digest(canonical.as_bytes()))
    }
}

/// What happens when a leave type's annual entitlement is exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverLimitMode {
    /// Deduct a daily rate per day over the entitlement.
    DeductSalary,
    /// The extra days are unpaid; handled manually.
    Unpaid,
    /// Leave beyond the entitlement may not be approved.
    Disallow,
}

/// Overage handling for one leave type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverLimitHandling {
    /// The handling mode.
    pub mode: OverLimitMode,
    /// Divisor applied to the monthly salary to get a daily deduction rate.
    #[serde(default)]
    pub deduction_base_days: Option<u32>,
}

impl OverLimitHandling {
    /// The deduction divisor, falling back to 26 days.
    pub fn base_days(&self) -> u32 {
        self.deduction_base_days.unwrap_or(DEFAULT_DEDUCTION_BASE_DAYS)
    }
}

/// Entitlement rules for one leave type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveTypePolicy {
    /// Days per fiscal year.
    pub annual_entitlement: Decimal,
    /// What happens past the entitlement.
    pub over_limit_handling: OverLimitHandling,
}

/// Which non-working day statuses still earn a payable unit for daily-rate staff.
///
/// Both are off unless the policy opts in; with the defaults no holiday,
/// weekend or leave day is payable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayableDayRules {
    /// Holidays earn a payable unit.
    #[serde(default)]
    pub holiday: bool,
    /// Approved leave days earn a payable unit.
    #[serde(default)]
    pub leave: bool,
}

/// The complete compensation policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationPolicy {
    /// Start time, grace and weekend rules.
    pub work_time: WorkTimePolicy,
    /// Pay period boundaries.
    #[serde(default)]
    pub pay_periods: PayPeriodPolicy,
    /// Statutory contribution parameters.
    pub sso: SsoPolicy,
    /// Entitlement per leave type. Types without an entry are unlimited.
    #[serde(default)]
    pub leave_types: BTreeMap<LeaveType, LeaveTypePolicy>,
    /// Payable-unit rules for non-working days.
    #[serde(default)]
    pub payable_days: PayableDayRules,
    /// Days used to derive a monthly equivalent for daily-rate employees.
    #[serde(default = "default_daily_rate_monthly_days")]
    pub daily_rate_monthly_days: u32,
}

fn default_daily_rate_monthly_days() -> u32 {
    DEFAULT_DEDUCTION_BASE_DAYS
}

impl CompensationPolicy {
    /// Checks the policy for values the engine cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidPolicy`] naming the first offending field.
    pub fn validate(&self) -> EngineResult<()> {
        if self.work_time.grace_minutes >= 24 * 60 {
            return Err(invalid(
                "work_time.grace_minutes",
                "must be less than one day",
            ));
        }

        if !(1..=27).contains(&self.pay_periods.period_one_end_day) {
            return Err(invalid(
                "pay_periods.period_one_end_day",
                "must be between 1 and 27",
            ));
        }

        if self.sso.employee_percent < Decimal::ZERO
            || self.sso.employee_percent > Decimal::ONE_HUNDRED
        {
            return Err(invalid("sso.employee_percent", "must be between 0 and 100"));
        }

        if self.sso.min_base < Decimal::ZERO || self.sso.min_base > self.sso.cap {
            return Err(invalid(
                "sso.min_base",
                "must be non-negative and not above sso.cap",
            ));
        }

        for (leave_type, rules) in &self.leave_types {
            if rules.annual_entitlement < Decimal::ZERO {
                return Err(invalid(
                    &format!("leave_types.{leave_type}.annual_entitlement"),
                    "must not be negative",
                ));
            }
            if rules.over_limit_handling.deduction_base_days == Some(0) {
                return Err(invalid(
                    &format!("leave_types.{leave_type}.over_limit_handling.deduction_base_days"),
                    "must be greater than zero",
                ));
            }
        }

        if self.daily_rate_monthly_days == 0 {
            return Err(invalid(
                "daily_rate_monthly_days",
                "must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Returns the entitlement rules for a leave type, if any.
    pub fn leave_rules(&self, leave_type: LeaveType) -> Option<&LeaveTypePolicy> {
        self.leave_types.get(&leave_type)
    }
}

fn invalid(field: &str, message: &str) -> EngineError {
    EngineError::InvalidPolicy {
        field: field.to_string(),
        message: message.to_string(),
    }
}
