//! Social-security (SSO) contribution and its bi-monthly split.
//!
//! The monthly contribution is split into two halves that always add back
//! up to the monthly figure. Period 1 deducts the first half and locks the
//! contribution decision for the month; period 2 deducts whatever is left
//! of the month's contribution under that decision.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::SsoPolicy;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    PayPeriod, PayPeriodBatch, PeriodNumber, ReconciliationRecord, SsoBreakdown, SsoDecision,
    SsoReconciliation,
};

use super::rounding::round_money;

/// Clamps a monthly salary into `[min_base, cap]`.
pub fn contribution_base(salary_monthly: Decimal, decision: &SsoDecision) -> Decimal {
    salary_monthly.max(decision.min_base).min(decision.cap)
}

/// The full-month contribution, rounded to 2 decimals.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::monthly_contribution;
/// use payroll_engine::config::SsoPolicy;
/// use payroll_engine::models::SsoDecision;
/// use rust_decimal::Decimal;
///
/// let decision = SsoDecision::from_policy(&SsoPolicy {
///     employee_percent: Decimal::from(5),
///     min_base: Decimal::from(1650),
///     cap: Decimal::from(15000),
/// });
/// assert_eq!(monthly_contribution(Decimal::from(12000), &decision), Decimal::new(60000, 2));
/// assert_eq!(monthly_contribution(Decimal::from(40000), &decision), Decimal::new(75000, 2));
/// ```
pub fn monthly_contribution(salary_monthly: Decimal, decision: &SsoDecision) -> Decimal {
    let base = contribution_base(salary_monthly, decision);
    round_money(base * decision.employee_percent / Decimal::ONE_HUNDRED)
}

/// Splits a monthly contribution into `(period_one, period_two)`.
///
/// `period_one` is half of `monthly` rounded; `period_two` takes the rest,
/// so the two always sum to `monthly` exactly.
pub fn split_contribution(monthly: Decimal) -> (Decimal, Decimal) {
    let period_one = round_money(monthly / Decimal::TWO);
    (period_one, monthly - period_one)
}

/// Computes the SSO effect on one payslip.
///
/// For period 1 the amount is the period-1 half. For period 2 it is the
/// monthly contribution minus what period 1 actually deducted, or the
/// period-2 half when there is no period-1 payslip. A negative amount is a
/// refund.
pub fn period_contribution(
    salary_monthly: Decimal,
    period: PeriodNumber,
    decision: &SsoDecision,
    period_one_deducted: Option<Decimal>,
) -> SsoBreakdown {
    let monthly = monthly_contribution(salary_monthly, decision);
    let (period_one_share, period_two_share) = split_contribution(monthly);

    let (already_deducted, amount) = match period {
        PeriodNumber::First => (None, period_one_share),
        PeriodNumber::Second => match period_one_deducted {
            Some(deducted) => (Some(deducted), monthly - deducted),
            None => (None, period_two_share),
        },
    };

    SsoBreakdown {
        decision: decision.clone(),
        contribution_base: contribution_base(salary_monthly, decision),
        monthly,
        period_one_share,
        period_two_share,
        already_deducted,
        amount,
    }
}

/// What the caller must do with the month's lock record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockAction {
    /// No lock existed; create it with a create-if-absent write.
    Create,
    /// The existing lock applies unchanged.
    Unchanged,
    /// A reconciliation was recorded; persist the updated lock.
    Reconciled,
}

/// The contribution decision to apply for a pay run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsoResolution {
    /// The decision to build payslips with.
    pub decision: SsoDecision,
    /// The lock record as it should be stored.
    pub batch: PayPeriodBatch,
    /// How to persist `batch`.
    pub action: LockAction,
}

/// Decides which contribution parameters a pay run uses.
///
/// - With no lock for the month, the live policy is used and a new lock is
///   proposed.
/// - With a lock whose decision matches the live policy, the lock is used.
/// - With a lock that has drifted from the live policy, the run is blocked
///   with [`EngineError::SsoPolicyMismatch`] unless `reconciliation` says
///   how to proceed.
pub fn resolve_sso_decision(
    period: &PayPeriod,
    live: &SsoPolicy,
    existing: Option<&PayPeriodBatch>,
    reconciliation: Option<SsoReconciliation>,
    now: DateTime<Utc>,
) -> EngineResult<SsoResolution> {
    let live_decision = SsoDecision::from_policy(live);

    let Some(batch) = existing else {
        return Ok(SsoResolution {
            decision: live_decision.clone(),
            batch: PayPeriodBatch {
                month: period.month_key(),
                sso_lock: live_decision,
                locked_by: period.batch_id(),
                locked_at: now,
                reconciliation: None,
            },
            action: LockAction::Create,
        });
    };

    let effective = batch.effective_decision();
    if effective.policy_fingerprint == live_decision.policy_fingerprint {
        return Ok(SsoResolution {
            decision: effective.clone(),
            batch: batch.clone(),
            action: LockAction::Unchanged,
        });
    }

    let choice = reconciliation.ok_or_else(|| EngineError::SsoPolicyMismatch {
        batch_id: period.batch_id(),
        locked_fingerprint: effective.policy_fingerprint.clone(),
        live_fingerprint: live_decision.policy_fingerprint.clone(),
    })?;

    let decision = match choice {
        SsoReconciliation::KeepLocked => effective.clone(),
        SsoReconciliation::AdoptCurrent => live_decision,
    };

    let mut reconciled = batch.clone();
    reconciled.reconciliation = Some(ReconciliationRecord {
        choice,
        decision: decision.clone(),
        reconciled_at: now,
    });

    Ok(SsoResolution {
        decision,
        batch: reconciled,
        action: LockAction::Reconciled,
    })
}
