//! Period metrics aggregation.
//!
//! Folds classified days into [`PeriodMetrics`]. A payroll run calls this
//! twice per employee, once for the pay period and once for the year to
//! date; each call starts from empty metrics.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::PayableDayRules;
use crate::models::{AuditWarning, DayRecord, DayStatus, Employee, PeriodMetrics, WarningSeverity};

/// Aggregates the days of one employee that fall inside `[start, end]`.
///
/// `PRESENT` and `LATE` days earn one payable unit each. Holidays and leave
/// days earn one only when `payable_days` allows it. Days for other
/// employees or outside the window are ignored.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::aggregate_period;
/// use payroll_engine::config::PayableDayRules;
/// use payroll_engine::models::*;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let employee = Employee {
///     id: "emp_001".to_string(),
///     name: String::new(),
///     compensation_plan: CompensationPlan::Daily,
///     salary_monthly: None,
///     salary_daily: Some(Decimal::new(450, 0)),
///     start_date: None,
///     end_date: None,
///     status: EmploymentStatus::Active,
/// };
/// let d1 = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// let d2 = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
/// let days = vec![
///     DayRecord::with_status("emp_001", d1, DayStatus::Present),
///     DayRecord::with_status("emp_001", d2, DayStatus::Late { late_minutes: 12 }),
/// ];
///
/// let metrics = aggregate_period(&employee, d1, d2, &days, &PayableDayRules::default());
/// assert_eq!(metrics.payable_units, Decimal::from(2));
/// assert_eq!(metrics.late_minutes, 12);
/// ```
pub fn aggregate_period(
    employee: &Employee,
    start: NaiveDate,
    end: NaiveDate,
    days: &[DayRecord],
    payable_days: &PayableDayRules,
) -> PeriodMetrics {
    let mut metrics = PeriodMetrics::empty(start, end);
    let warn_absences = employee.expects_scans();

    for day in days
        .iter()
        .filter(|d| d.employee_id == employee.id && d.date >= start && d.date <= end)
    {
        match &day.status {
            DayStatus::Present => {
                metrics.present_days += 1;
                metrics.payable_units += Decimal::ONE;
            }
            DayStatus::Late { late_minutes } => {
                metrics.late_days += 1;
                metrics.late_minutes += late_minutes;
                metrics.payable_units += Decimal::ONE;
            }
            DayStatus::Absent => {
                metrics.absent_days += 1;
                if warn_absences {
                    metrics.warnings.push(AuditWarning::for_date(
                        "ABSENT",
                        "No clock-in on a working day",
                        WarningSeverity::Low,
                        day.date,
                    ));
                }
            }
            DayStatus::NoData => {
                metrics.no_data_days += 1;
            }
            DayStatus::Leave { leave_type } => {
                metrics.leave_days += 1;
                *metrics.leave_days_by_type.entry(*leave_type).or_insert(0) += 1;
                if payable_days.leave {
                    metrics.payable_units += Decimal::ONE;
                }
            }
            DayStatus::Holiday { .. } => {
                metrics.holiday_days += 1;
                if payable_days.holiday {
                    metrics.payable_units += Decimal::ONE;
                }
            }
            DayStatus::Weekend => metrics.weekend_days += 1,
            DayStatus::Future
            | DayStatus::NotStarted
            | DayStatus::Ended
            | DayStatus::Suspended => {}
        }

        if let Some(duration) = day.work_duration {
            metrics.worked_minutes += duration.total_minutes();
        }

        if day.review_needed {
            metrics.review_needed = true;
            let message = if day.status == DayStatus::NoData {
                "Clock-in without clock-out; review the day"
            } else {
                "Clock-out before clock-in; review the day"
            };
            metrics.warnings.push(AuditWarning::for_date(
                "REVIEW_NEEDED",
                message,
                WarningSeverity::Medium,
                day.date,
            ));
        }
    }

    metrics
}
