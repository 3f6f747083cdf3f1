//! Pay period calendar and the per-month SSO lock record.
//!
//! A month is paid in two periods. Period 1 decides which contribution rate
//! applies for the month and locks that decision on the month's
//! [`PayPeriodBatch`]; period 2 trues up against it.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{PayPeriodPolicy, SsoPolicy};
use crate::error::{EngineError, EngineResult};

/// Which half of the month a pay period covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PeriodNumber {
    /// Day 1 through the configured boundary day.
    First,
    /// The day after the boundary through month end.
    Second,
}

impl TryFrom<u8> for PeriodNumber {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PeriodNumber::First),
            2 => Ok(PeriodNumber::Second),
            other => Err(format!("period must be 1 or 2, got {}", other)),
        }
    }
}

impl From<PeriodNumber> for u8 {
    fn from(value: PeriodNumber) -> Self {
        match value {
            PeriodNumber::First => 1,
            PeriodNumber::Second => 2,
        }
    }
}

/// A calendar month, the key for SSO locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1-12).
    pub month: u32,
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// One bi-monthly pay run: a year, a month and a period number.
///
/// # Example
///
/// ```
/// use payroll_engine::config::PayPeriodPolicy;
/// use payroll_engine::models::{PayPeriod, PeriodNumber};
/// use chrono::NaiveDate;
///
/// let period = PayPeriod::new(2026, 2, PeriodNumber::Second).unwrap();
/// let (start, end) = period.window(&PayPeriodPolicy::default()).unwrap();
/// assert_eq!(start, NaiveDate::from_ymd_opt(2026, 2, 16).unwrap());
/// assert_eq!(end, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
/// assert_eq!(period.batch_id(), "2026-02-P2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayPeriod {
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1-12).
    pub month: u32,
    /// Which half of the month.
    pub period: PeriodNumber,
}

impl PayPeriod {
    /// Creates a pay period, validating the month.
    pub fn new(year: i32, month: u32, period: PeriodNumber) -> EngineResult<Self> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(EngineError::CalculationError {
                message: format!("invalid pay period month {:04}-{:02}", year, month),
            });
        }
        Ok(Self {
            year,
            month,
            period,
        })
    }

    /// The identifier of this pay run, e.g. `2026-03-P1`.
    pub fn batch_id(&self) -> String {
        format!("{}-P{}", self.month_key(), u8::from(self.period))
    }

    /// The month this period belongs to.
    pub fn month_key(&self) -> MonthKey {
        MonthKey {
            year: self.year,
            month: self.month,
        }
    }

    /// Period 1 of the same month.
    pub fn period_one(&self) -> PayPeriod {
        PayPeriod {
            period: PeriodNumber::First,
            ..*self
        }
    }

    /// The inclusive date window of the period.
    pub fn window(&self, policy: &PayPeriodPolicy) -> EngineResult<(NaiveDate, NaiveDate)> {
        let first_of_month = self.date(1)?;
        let month_end = last_day_of_month(first_of_month);
        let boundary = policy.period_one_end_day.min(month_end.day());

        match self.period {
            PeriodNumber::First => Ok((first_of_month, self.date(boundary)?)),
            PeriodNumber::Second => Ok((self.date(boundary + 1)?, month_end)),
        }
    }

    /// The year-to-date window: 1 January through the period's last day.
    pub fn ytd_window(&self, policy: &PayPeriodPolicy) -> EngineResult<(NaiveDate, NaiveDate)> {
        let (_, end) = self.window(policy)?;
        let year_start = NaiveDate::from_ymd_opt(self.year, 1, 1).ok_or_else(|| {
            EngineError::CalculationError {
                message: format!("invalid fiscal year {}", self.year),
            }
        })?;
        Ok((year_start, end))
    }

    fn date(&self, day: u32) -> EngineResult<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day).ok_or_else(|| {
            EngineError::CalculationError {
                message: format!(
                    "day {} does not exist in {:04}-{:02}",
                    day, self.year, self.month
                ),
            }
        })
    }
}

fn last_day_of_month(first_of_month: NaiveDate) -> NaiveDate {
    let next_month = first_of_month
        .checked_add_months(chrono::Months::new(1))
        .unwrap_or(first_of_month);
    next_month.pred_opt().unwrap_or(first_of_month)
}

/// The contribution parameters actually used for a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsoDecision {
    /// Employee contribution in percent.
    pub employee_percent: Decimal,
    /// Minimum contribution base.
    pub min_base: Decimal,
    /// Maximum contribution base.
    pub cap: Decimal,
    /// Fingerprint of the policy the decision was taken from.
    pub policy_fingerprint: String,
}

impl SsoDecision {
    /// Captures the live policy as a decision.
    pub fn from_policy(policy: &SsoPolicy) -> Self {
        Self {
            employee_percent: policy.employee_percent,
            min_base: policy.min_base,
            cap: policy.cap,
            policy_fingerprint: policy.fingerprint(),
        }
    }
}

/// The operator's answer when the SSO policy changed between periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SsoReconciliation {
    /// Finish the month on the rate locked in period 1.
    KeepLocked,
    /// Switch to the live policy and true up against period 1.
    AdoptCurrent,
}

/// Record of a reconciliation applied to a locked month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRecord {
    /// What the operator chose.
    pub choice: SsoReconciliation,
    /// The decision that applies from now on for the month.
    pub decision: SsoDecision,
    /// When the choice was applied.
    pub reconciled_at: DateTime<Utc>,
}

/// The per-month lock document.
///
/// Created exactly once per month, by whichever pay run first needs an SSO
/// decision; never overwritten afterwards except to record a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPeriodBatch {
    /// The locked month.
    pub month: MonthKey,
    /// The decision taken when the lock was created.
    pub sso_lock: SsoDecision,
    /// The pay run that created the lock.
    pub locked_by: String,
    /// When the lock was created.
    pub locked_at: DateTime<Utc>,
    /// Set when an operator reconciled a policy change.
    #[serde(default)]
    pub reconciliation: Option<ReconciliationRecord>,
}

impl PayPeriodBatch {
    /// The decision currently in force for the month.
    pub fn effective_decision(&self) -> &SsoDecision {
        self.reconciliation
            .as_ref()
            .map(|r| &r.decision)
            .unwrap_or(&self.sso_lock)
    }
}
