//! Leave entitlement consumption and overage penalties.
//!
//! The same evaluation runs twice in a request's life: at approval time it
//! is advisory (and enforces `DISALLOW`); at payslip time it is recomputed
//! from the final approved set and is what gets charged.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::{CompensationPolicy, OverLimitMode};
use crate::error::{EngineError, EngineResult};
use crate::models::{Employee, LeaveOverage, LeaveRequest, LeaveType};

use super::rounding::round_money;

/// Compares leave usage against the annual entitlement for one leave type.
///
/// `over_days` only counts requested days, never days already taken, so a
/// request is not charged for overage that predates it. Leave types without
/// policy rules are unlimited.
///
/// For `DEDUCT_SALARY` the penalty is
/// `monthly_salary / deduction_base_days * over_days`, rounded once.
/// `UNPAID` and `DISALLOW` carry no penalty here.
///
/// # Errors
///
/// - [`EngineError::CalculationError`] when the day counts or the penalty
///   are too large to represent
/// - when a `DEDUCT_SALARY` penalty is due and the employee has no usable
///   salary (see [`Employee::monthly_equivalent`])
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::evaluate_leave_overage;
/// use payroll_engine::config::*;
/// use payroll_engine::models::*;
/// use rust_decimal::Decimal;
/// # use std::collections::BTreeMap;
/// # use chrono::NaiveTime;
///
/// # let mut leave_types = BTreeMap::new();
/// # leave_types.insert(LeaveType::Business, LeaveTypePolicy {
/// #     annual_entitlement: Decimal::from(10),
/// #     over_limit_handling: OverLimitHandling { mode: OverLimitMode::DeductSalary, deduction_base_days: Some(26) },
/// # });
/// # let policy = CompensationPolicy {
/// #     work_time: WorkTimePolicy { start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(), grace_minutes: 15, weekend_mode: WeekendMode::SatSun },
/// #     pay_periods: PayPeriodPolicy::default(),
/// #     sso: SsoPolicy { employee_percent: Decimal::from(5), min_base: Decimal::from(1650), cap: Decimal::from(15000) },
/// #     leave_types,
/// #     payable_days: PayableDayRules::default(),
/// #     daily_rate_monthly_days: 26,
/// # };
/// let employee = Employee {
///     id: "emp_001".to_string(),
///     name: String::new(),
///     compensation_plan: CompensationPlan::Monthly,
///     salary_monthly: Some(Decimal::from(30000)),
///     salary_daily: None,
///     start_date: None,
///     end_date: None,
///     status: EmploymentStatus::Active,
/// };
///
/// let overage = evaluate_leave_overage(
///     &employee, LeaveType::Business, 2026, Decimal::from(9), Decimal::from(3), &policy,
/// ).unwrap();
/// assert!(overage.exceeds);
/// assert_eq!(overage.over_days, Decimal::from(2));
/// assert_eq!(overage.penalty, Decimal::new(230769, 2));
/// ```
pub fn evaluate_leave_overage(
    employee: &Employee,
    leave_type: LeaveType,
    fiscal_year: i32,
    days_taken: Decimal,
    requested_days: Decimal,
    policy: &CompensationPolicy,
) -> EngineResult<LeaveOverage> {
    let mut overage = LeaveOverage {
        employee_id: employee.id.clone(),
        leave_type,
        fiscal_year,
        entitlement: None,
        days_taken,
        requested_days,
        exceeds: false,
        over_days: Decimal::ZERO,
        mode: None,
        penalty: Decimal::ZERO,
    };

    let Some(rules) = policy.leave_rules(leave_type) else {
        return Ok(overage);
    };
    let handling = &rules.over_limit_handling;
    overage.entitlement = Some(rules.annual_entitlement);
    overage.mode = Some(handling.mode);

    let out_of_range = || EngineError::CalculationError {
        message: format!(
            "{} leave for employee '{}' is out of range (taken {}, requested {})",
            leave_type, employee.id, days_taken, requested_days
        ),
    };

    let beyond_entitlement = days_taken
        .checked_add(requested_days)
        .and_then(|total| total.checked_sub(rules.annual_entitlement))
        .ok_or_else(out_of_range)?
        .max(Decimal::ZERO);
    overage.over_days = beyond_entitlement.min(requested_days.max(Decimal::ZERO));
    overage.exceeds = overage.over_days > Decimal::ZERO;

    if overage.exceeds && handling.mode == OverLimitMode::DeductSalary {
        let monthly = employee.monthly_equivalent(policy.daily_rate_monthly_days)?;
        let daily_rate = monthly / Decimal::from(handling.base_days());
        overage.penalty = daily_rate
            .checked_mul(overage.over_days)
            .map(round_money)
            .ok_or_else(out_of_range)?;
    }

    Ok(overage)
}

/// Sums approved leave days per type for one employee and fiscal year.
///
/// # Errors
///
/// Returns [`EngineError::CalculationError`] if a total is out of range.
pub fn leave_consumption(
    employee_id: &str,
    requests: &[LeaveRequest],
    fiscal_year: i32,
) -> EngineResult<BTreeMap<LeaveType, Decimal>> {
    let mut consumption = BTreeMap::new();
    for request in approved_for(employee_id, requests, fiscal_year) {
        add_days(&mut consumption, request.leave_type, request.days)?;
    }
    Ok(consumption)
}

fn add_days(
    totals: &mut BTreeMap<LeaveType, Decimal>,
    leave_type: LeaveType,
    days: Decimal,
) -> EngineResult<()> {
    let total = totals.entry(leave_type).or_insert(Decimal::ZERO);
    *total = total
        .checked_add(days)
        .ok_or_else(|| EngineError::CalculationError {
            message: format!("{} leave days are out of range", leave_type),
        })?;
    Ok(())
}

/// Recomputes overage for the leave charged to one pay period.
///
/// Approved requests are attributed to the period containing their start
/// date. Days from requests starting before `start` count as already taken;
/// days from requests starting inside `[start, end]` are the ones evaluated.
/// Leave types with nothing starting in the window are omitted.
pub fn period_leave_overages(
    employee: &Employee,
    requests: &[LeaveRequest],
    fiscal_year: i32,
    (start, end): (NaiveDate, NaiveDate),
    policy: &CompensationPolicy,
) -> EngineResult<Vec<LeaveOverage>> {
    let mut taken: BTreeMap<LeaveType, Decimal> = BTreeMap::new();
    let mut requested: BTreeMap<LeaveType, Decimal> = BTreeMap::new();

    for request in approved_for(&employee.id, requests, fiscal_year) {
        if request.start_date < start {
            add_days(&mut taken, request.leave_type, request.days)?;
        } else if request.start_date <= end {
            add_days(&mut requested, request.leave_type, request.days)?;
        }
    }

    requested
        .into_iter()
        .map(|(leave_type, days)| {
            let already_taken = taken.get(&leave_type).copied().unwrap_or(Decimal::ZERO);
            evaluate_leave_overage(employee, leave_type, fiscal_year, already_taken, days, policy)
        })
        .collect()
}

/// Approves a submitted leave request.
///
/// The overage is evaluated against the other approved requests of the same
/// type and fiscal year and returned as advice. If the leave type's mode is
/// `DISALLOW` and the request would exceed the entitlement, the request is
/// left untouched and an error is returned.
///
/// # Errors
///
/// - [`EngineError::InvalidLeaveTransition`] if the request is not `SUBMITTED`
/// - [`EngineError::LeaveEntitlementExceeded`] on a `DISALLOW` overage
pub fn approve_leave(
    request: &mut LeaveRequest,
    existing: &[LeaveRequest],
    employee: &Employee,
    policy: &CompensationPolicy,
) -> EngineResult<LeaveOverage> {
    let mut approved = request.clone();
    approved.approve()?;

    let mut taken = BTreeMap::new();
    for other in approved_for(&employee.id, existing, request.fiscal_year)
        .filter(|r| r.leave_type == request.leave_type && r.id != request.id)
    {
        add_days(&mut taken, other.leave_type, other.days)?;
    }
    let days_taken = taken.remove(&request.leave_type).unwrap_or(Decimal::ZERO);

    let overage = evaluate_leave_overage(
        employee,
        request.leave_type,
        request.fiscal_year,
        days_taken,
        request.days,
        policy,
    )?;

    if overage.exceeds && overage.mode == Some(OverLimitMode::Disallow) {
        return Err(EngineError::LeaveEntitlementExceeded {
            request_id: request.id.clone(),
            leave_type: request.leave_type.to_string(),
            over_days: overage.over_days.normalize().to_string(),
        });
    }

    *request = approved;
    Ok(overage)
}

fn approved_for<'a>(
    employee_id: &'a str,
    requests: &'a [LeaveRequest],
    fiscal_year: i32,
) -> impl Iterator<Item = &'a LeaveRequest> + 'a {
    requests.iter().filter(move |r| {
        r.employee_id == employee_id && r.fiscal_year == fiscal_year && r.is_approved()
    })
}
