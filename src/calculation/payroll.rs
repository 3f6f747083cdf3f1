//! Payslip generation.
//!
//! Combines base pay, the SSO contribution and leave overage penalties into
//! a [`PayslipSnapshot`] with an audit trace. Generated lines carry the
//! `AUTO:` code prefix so a regeneration can replace them without touching
//! lines entered by hand.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::{CompensationPolicy, OverLimitMode};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceSummary, AuditStep, AuditWarning, Employee, LeaveRequest, LeaveSummary, LineItem,
    PayBasis, PayPeriod, PayslipSnapshot, PayslipStatus, PeriodMetrics, SsoDecision,
    WarningSeverity,
};

use super::leave_overage::{leave_consumption, period_leave_overages};
use super::rounding::round_money;
use super::sso::period_contribution;

/// Everything needed to build one employee's payslip.
#[derive(Debug, Clone, Copy)]
pub struct PayslipInput<'a> {
    /// The employee being paid.
    pub employee: &'a Employee,
    /// The pay period.
    pub pay_period: PayPeriod,
    /// Metrics over the pay period window.
    pub period_metrics: &'a PeriodMetrics,
    /// Metrics from 1 January through the period end.
    pub ytd_metrics: &'a PeriodMetrics,
    /// The employee's leave requests; only approved ones are used.
    pub leave_requests: &'a [LeaveRequest],
    /// The compensation policy.
    pub policy: &'a CompensationPolicy,
    /// The SSO decision in force for the month.
    pub sso_decision: &'a SsoDecision,
    /// SSO deducted on this month's period-1 payslip (period 2 only).
    pub period_one_sso_deducted: Option<Decimal>,
    /// Generation timestamp recorded on the payslip.
    pub generated_at: DateTime<Utc>,
}

/// Builds a draft payslip.
///
/// The audit trace records four steps in order: base pay, SSO contribution,
/// leave overage and net pay.
///
/// # Errors
///
/// - [`EngineError::NotPayable`](crate::error::EngineError::NotPayable) for `NO_PAY` employees
/// - [`EngineError::MissingRate`](crate::error::EngineError::MissingRate) when the plan's rate is missing
pub fn build_payslip(input: &PayslipInput<'_>) -> EngineResult<PayslipSnapshot> {
    let employee = input.employee;
    let policy = input.policy;
    let period = input.pay_period;
    let mut trace = Vec::new();
    let mut additions = Vec::new();
    let mut deductions = Vec::new();
    let mut warnings = input.period_metrics.warnings.clone();

    // Base pay
    let (base_pay, base_step) = compute_base_pay(employee, input.period_metrics, 1)?;
    trace.push(base_step);

    // SSO
    let salary_monthly = employee.monthly_equivalent(policy.daily_rate_monthly_days)?;
    let sso = period_contribution(
        salary_monthly,
        period.period,
        input.sso_decision,
        input.period_one_sso_deducted,
    );
    if sso.amount > Decimal::ZERO {
        deductions.push(LineItem::auto("SSO", "Social security contribution", sso.amount));
    } else if sso.amount < Decimal::ZERO {
        additions.push(LineItem::auto("SSO_REFUND", "Social security contribution refund", -sso.amount));
    }
    trace.push(AuditStep {
        step_number: 2,
        rule_id: "sso_contribution".to_string(),
        rule_name: "SSO Contribution".to_string(),
        input: serde_json::json!({
            "salary_monthly": salary_monthly.to_string(),
            "employee_percent": sso.decision.employee_percent.to_string(),
            "min_base": sso.decision.min_base.to_string(),
            "cap": sso.decision.cap.to_string(),
            "policy_fingerprint": sso.decision.policy_fingerprint,
            "period": u8::from(period.period),
            "period_one_deducted": sso.already_deducted.map(|d| d.to_string()),
        }),
        output: serde_json::json!({
            "contribution_base": sso.contribution_base.to_string(),
            "monthly": sso.monthly.to_string(),
            "period_one_share": sso.period_one_share.to_string(),
            "period_two_share": sso.period_two_share.to_string(),
            "amount": sso.amount.to_string(),
        }),
        reasoning: match sso.already_deducted {
            Some(deducted) => format!(
                "Monthly {} less {} deducted in period 1 = {}",
                sso.monthly, deducted, sso.amount
            ),
            None => format!(
                "{}% of {} = {} per month; this period's share is {}",
                sso.decision.employee_percent.normalize(),
                sso.contribution_base,
                sso.monthly,
                sso.amount
            ),
        },
    });

    // Leave overage
    let window = period.window(&policy.pay_periods)?;
    let overages =
        period_leave_overages(employee, input.leave_requests, period.year, window, policy)?;
    let mut penalty_total = Decimal::ZERO;
    for overage in overages.iter().filter(|o| o.exceeds) {
        match overage.mode {
            Some(OverLimitMode::DeductSalary) if overage.penalty > Decimal::ZERO => {
                penalty_total = penalty_total.checked_add(overage.penalty).ok_or_else(|| {
                    EngineError::CalculationError {
                        message: format!("leave penalties for '{}' are out of range", employee.id),
                    }
                })?;
                deductions.push(LineItem::auto(
                    &format!("LEAVE_OVERAGE_{}", overage.leave_type),
                    format!(
                        "{} leave over entitlement ({} day(s))",
                        overage.leave_type,
                        overage.over_days.normalize()
                    ),
                    overage.penalty,
                ));
            }
            _ => warnings.push(AuditWarning::new(
                "LEAVE_OVER_LIMIT",
                format!(
                    "{} leave exceeds entitlement by {} day(s); handle manually",
                    overage.leave_type,
                    overage.over_days.normalize()
                ),
                WarningSeverity::Medium,
            )),
        }
    }
    trace.push(AuditStep {
        step_number: 3,
        rule_id: "leave_overage".to_string(),
        rule_name: "Leave Overage".to_string(),
        input: serde_json::json!({
            "window_start": window.0.to_string(),
            "window_end": window.1.to_string(),
            "fiscal_year": period.year,
        }),
        output: serde_json::to_value(&overages).unwrap_or(serde_json::Value::Null),
        reasoning: if overages.iter().any(|o| o.exceeds) {
            format!("Leave overage penalties total {}", penalty_total)
        } else {
            "No leave over entitlement in this period".to_string()
        },
    });

    let mut payslip = PayslipSnapshot {
        id: Uuid::new_v4(),
        batch_id: period.batch_id(),
        pay_period: period,
        employee_id: employee.id.clone(),
        compensation_plan: employee.compensation_plan,
        base_pay,
        additions,
        deductions,
        net_pay: Decimal::ZERO,
        attendance: AttendanceSummary {
            period: input.period_metrics.clone(),
            ytd: input.ytd_metrics.clone(),
        },
        leave: LeaveSummary {
            consumption: leave_consumption(&employee.id, input.leave_requests, period.year)?,
            overages,
        },
        sso: Some(sso),
        warnings,
        audit_trace: trace,
        status: PayslipStatus::Draft,
        revision: 0,
        revision_reason: None,
        payment: None,
        generated_at: input.generated_at,
        version: 0,
    };
    payslip.recompute_net_pay()?;

    if payslip.net_pay < Decimal::ZERO {
        payslip.warnings.push(AuditWarning::new(
            "NEGATIVE_NET_PAY",
            format!("Net pay is {}", payslip.net_pay),
            WarningSeverity::High,
        ));
    }
    payslip.audit_trace.push(net_pay_step(&payslip, 4));

    Ok(payslip)
}

fn compute_base_pay(
    employee: &Employee,
    metrics: &PeriodMetrics,
    step_number: u32,
) -> EngineResult<(Decimal, AuditStep)> {
    let (base_pay, input, reasoning) = match employee.pay_basis()? {
        PayBasis::Monthly { salary_monthly } => {
            let base_pay = round_money(salary_monthly / Decimal::TWO);
            (
                base_pay,
                serde_json::json!({
                    "plan": employee.compensation_plan.to_string(),
                    "salary_monthly": salary_monthly.to_string(),
                }),
                format!("{} / 2 = {}", salary_monthly, base_pay),
            )
        }
        PayBasis::Daily { salary_daily } => {
            let base_pay = salary_daily
                .checked_mul(metrics.payable_units)
                .map(round_money)
                .ok_or_else(|| EngineError::CalculationError {
                    message: format!("base pay for employee '{}' is out of range", employee.id),
                })?;
            (
                base_pay,
                serde_json::json!({
                    "plan": employee.compensation_plan.to_string(),
                    "salary_daily": salary_daily.to_string(),
                    "payable_units": metrics.payable_units.to_string(),
                }),
                format!(
                    "{} x {} payable day(s) = {}",
                    salary_daily, metrics.payable_units, base_pay
                ),
            )
        }
    };

    let step = AuditStep {
        step_number,
        rule_id: "base_pay".to_string(),
        rule_name: "Base Pay".to_string(),
        input,
        output: serde_json::json!({ "base_pay": base_pay.to_string() }),
        reasoning,
    };
    Ok((base_pay, step))
}

fn net_pay_step(payslip: &PayslipSnapshot, step_number: u32) -> AuditStep {
    let additions = payslip.total_additions();
    let deductions = payslip.total_deductions();
    AuditStep {
        step_number,
        rule_id: "net_pay".to_string(),
        rule_name: "Net Pay".to_string(),
        input: serde_json::json!({
            "base_pay": payslip.base_pay.to_string(),
            "additions": additions.to_string(),
            "deductions": deductions.to_string(),
        }),
        output: serde_json::json!({ "net_pay": payslip.net_pay.to_string() }),
        reasoning: format!(
            "{} + {} - {} = {}",
            payslip.base_pay, additions, deductions, payslip.net_pay
        ),
    }
}
