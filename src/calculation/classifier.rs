//! Daily attendance classification.
//!
//! Every day gets exactly one [`DayStatus`]. The checks run in a fixed
//! order and the first match wins:
//!
//! 1. after the reference date: `FUTURE`
//! 2. before the employment start date: `NOT_STARTED`
//! 3. after the employment end date: `ENDED`
//! 4. employee suspended: `SUSPENDED`
//! 5. company holiday: `HOLIDAY`
//! 6. weekend: `WEEKEND`
//! 7. approved leave covers the day: `LEAVE`
//! 8. otherwise the scans decide: `ABSENT`, `NO_DATA`, `LATE` or `PRESENT`
//!
//! Adjustments are only consulted in step 8, so they can never turn a
//! non-working day into an attended one.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::config::WorkTimePolicy;
use crate::models::{
    AdjustmentType, AttendanceAdjustment, AttendanceEvent, DayRecord, DayStatus, Direction,
    Employee, EmploymentStatus, LeaveRequest, WorkDuration,
};

use super::calendar::{DayInfo, HolidayCalendar};

/// Everything known about one employee on one date.
#[derive(Debug, Clone, Copy)]
pub struct DayContext<'a> {
    /// The employee being classified.
    pub employee: &'a Employee,
    /// The date being classified.
    pub date: NaiveDate,
    /// Scans for the day. Scans for other dates or employees are ignored.
    pub events: &'a [AttendanceEvent],
    /// Leave requests that may cover the day. Only approved ones count.
    pub leave: &'a [LeaveRequest],
    /// Holiday and weekend flags for the date.
    pub day_info: &'a DayInfo,
    /// The manual correction for the day, if any.
    pub adjustment: Option<&'a AttendanceAdjustment>,
    /// Days after this date are `FUTURE`.
    pub reference_today: NaiveDate,
}

/// The record sources for one employee over a window.
#[derive(Debug, Clone, Copy)]
pub struct EmployeeRecords<'a> {
    /// Raw scans.
    pub events: &'a [AttendanceEvent],
    /// Leave requests.
    pub leave: &'a [LeaveRequest],
    /// Manual corrections.
    pub adjustments: &'a [AttendanceAdjustment],
}

/// Classifies one employee's day.
///
/// Pure: the result depends only on the arguments.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::{classify_day, DayContext, DayInfo};
/// use payroll_engine::config::{WeekendMode, WorkTimePolicy};
/// use payroll_engine::models::*;
/// use chrono::{NaiveDate, NaiveTime};
///
/// let employee = Employee {
///     id: "emp_001".to_string(),
///     name: "Malee".to_string(),
///     compensation_plan: CompensationPlan::Monthly,
///     salary_monthly: Some(rust_decimal::Decimal::new(30000, 0)),
///     salary_daily: None,
///     start_date: None,
///     end_date: None,
///     status: EmploymentStatus::Active,
/// };
/// let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// let events = vec![
///     AttendanceEvent { employee_id: "emp_001".into(), direction: Direction::In, timestamp: "2026-03-02 08:20:00".into() },
///     AttendanceEvent { employee_id: "emp_001".into(), direction: Direction::Out, timestamp: "2026-03-02 17:00:00".into() },
/// ];
/// let day_info = DayInfo { date, is_holiday: false, holiday_name: None, is_weekend: false };
/// let work_time = WorkTimePolicy {
///     start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
///     grace_minutes: 15,
///     weekend_mode: WeekendMode::SatSun,
/// };
///
/// let record = classify_day(
///     &DayContext {
///         employee: &employee,
///         date,
///         events: &events,
///         leave: &[],
///         day_info: &day_info,
///         adjustment: None,
///         reference_today: date,
///     },
///     &work_time,
/// );
/// assert_eq!(record.status, DayStatus::Late { late_minutes: 5 });
/// ```
pub fn classify_day(ctx: &DayContext<'_>, work_time: &WorkTimePolicy) -> DayRecord {
    let employee = ctx.employee;
    let date = ctx.date;
    let record = |status| DayRecord::with_status(&employee.id, date, status);

    if date > ctx.reference_today {
        return record(DayStatus::Future);
    }
    if employee.start_date.is_some_and(|start| date < start) {
        return record(DayStatus::NotStarted);
    }
    if employee.end_date.is_some_and(|end| date > end) {
        return record(DayStatus::Ended);
    }
    if employee.status == EmploymentStatus::Suspended {
        return record(DayStatus::Suspended);
    }
    if ctx.day_info.is_holiday {
        return record(DayStatus::Holiday {
            name: ctx.day_info.holiday_name.clone().unwrap_or_default(),
        });
    }
    if ctx.day_info.is_weekend {
        return record(DayStatus::Weekend);
    }
    if let Some(leave) = ctx
        .leave
        .iter()
        .find(|r| r.employee_id == employee.id && r.is_approved() && r.covers(date))
    {
        return record(DayStatus::Leave {
            leave_type: leave.leave_type,
        });
    }

    classify_attendance(ctx, work_time)
}

fn classify_attendance(ctx: &DayContext<'_>, work_time: &WorkTimePolicy) -> DayRecord {
    let employee_id = &ctx.employee.id;
    let adjustment = ctx
        .adjustment
        .filter(|a| &a.employee_id == employee_id && a.date == ctx.date);

    let scans: Vec<(Direction, NaiveDateTime)> = ctx
        .events
        .iter()
        .filter(|e| &e.employee_id == employee_id)
        .filter_map(|e| e.local_time().map(|t| (e.direction, t)))
        .filter(|(_, t)| t.date() == ctx.date)
        .collect();
    let scanned_in = scan_times(&scans, Direction::In).min();
    let scanned_out = scan_times(&scans, Direction::Out).max();

    let first_in = adjustment.and_then(|a| a.check_in_at()).or(scanned_in);
    let last_out = adjustment.and_then(|a| a.check_out_at()).or(scanned_out);

    let mut record = DayRecord::with_status(employee_id, ctx.date, DayStatus::Absent);
    record.first_in = first_in;
    record.last_out = last_out;
    record.adjustment = adjustment.map(|a| a.adjustment_type);

    let Some(first_in) = first_in else {
        return record;
    };
    let Some(last_out) = last_out else {
        record.status = DayStatus::NoData;
        record.review_needed = true;
        return record;
    };

    let threshold = ctx.date.and_time(work_time.start_time)
        + Duration::minutes(i64::from(work_time.grace_minutes));
    let forgiven = adjustment.is_some_and(|a| a.adjustment_type == AdjustmentType::ForgiveLate);
    let late_minutes = if forgiven {
        0
    } else {
        (first_in - threshold).num_minutes().max(0)
    };

    let worked_minutes = (last_out - first_in).num_minutes();
    if worked_minutes < 0 {
        record.review_needed = true;
    }
    record.work_duration = Some(WorkDuration::from_minutes(worked_minutes));

    record.status = if late_minutes > 0 {
        DayStatus::Late {
            late_minutes: u32::try_from(late_minutes).unwrap_or(u32::MAX),
        }
    } else {
        DayStatus::Present
    };
    record
}

fn scan_times(
    scans: &[(Direction, NaiveDateTime)],
    direction: Direction,
) -> impl Iterator<Item = NaiveDateTime> + '_ {
    scans
        .iter()
        .filter(move |(d, _)| *d == direction)
        .map(|(_, t)| *t)
}

/// Classifies every day of an inclusive window for one employee.
///
/// Scans are grouped by their local date; scans with unparseable timestamps
/// are dropped. When several adjustments exist for one day the one with the
/// latest `adjusted_at` is used.
pub fn classify_range(
    employee: &Employee,
    start: NaiveDate,
    end: NaiveDate,
    records: &EmployeeRecords<'_>,
    calendar: &HolidayCalendar,
    work_time: &WorkTimePolicy,
    reference_today: NaiveDate,
) -> Vec<DayRecord> {
    let mut events_by_date: HashMap<NaiveDate, Vec<AttendanceEvent>> = HashMap::new();
    let mut garbled = 0usize;
    for event in records.events.iter().filter(|e| e.employee_id == employee.id) {
        match event.local_date() {
            Some(date) if date >= start && date <= end => {
                events_by_date.entry(date).or_default().push(event.clone());
            }
            Some(_) => {}
            None => garbled += 1,
        }
    }
    if garbled > 0 {
        debug!(employee_id = %employee.id, garbled, "Ignoring scans with unparseable timestamps");
    }

    let mut adjustments: HashMap<NaiveDate, &AttendanceAdjustment> = HashMap::new();
    for adjustment in records
        .adjustments
        .iter()
        .filter(|a| a.employee_id == employee.id)
    {
        let newer = adjustments
            .get(&adjustment.date)
            .is_none_or(|current| adjustment.adjusted_at >= current.adjusted_at);
        if newer {
            adjustments.insert(adjustment.date, adjustment);
        }
    }

    let leave: Vec<LeaveRequest> = records
        .leave
        .iter()
        .filter(|r| r.employee_id == employee.id && r.is_approved())
        .filter(|r| r.start_date <= end && r.end_date >= start)
        .cloned()
        .collect();

    start
        .iter_days()
        .take_while(|date| *date <= end)
        .map(|date| {
            let day_info = calendar.resolve_day(date, work_time.weekend_mode);
            let events = events_by_date.get(&date).map(Vec::as_slice).unwrap_or(&[]);
            classify_day(
                &DayContext {
                    employee,
                    date,
                    events,
                    leave: &leave,
                    day_info: &day_info,
                    adjustment: adjustments.get(&date).copied(),
                    reference_today,
                },
                work_time,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WeekendMode;
    use crate::models::{CompensationPlan, Holiday, LeaveStatus, LeaveType};
    use chrono::{NaiveTime, TimeZone, Utc};
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn work_time() -> WorkTimePolicy {
        WorkTimePolicy {
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            grace_minutes: 15,
            weekend_mode: WeekendMode::SatSun,
        }
    }

    fn create_test_employee() -> Employee {
        Employee {
            id: "emp_001".to_string(),
            name: "Malee".to_string(),
            compensation_plan: CompensationPlan::Monthly,
            salary_monthly: Some(Decimal::new(30000, 0)),
            salary_daily: None,
            start_date: Some(date(2026, 1, 5)),
            end_date: None,
            status: EmploymentStatus::Active,
        }
    }

    fn scan(direction: Direction, timestamp: &str) -> AttendanceEvent {
        AttendanceEvent {
            employee_id: "emp_001".to_string(),
            direction,
            timestamp: timestamp.to_string(),
        }
    }

    fn workday(d: NaiveDate) -> DayInfo {
        DayInfo {
            date: d,
            is_holiday: false,
            holiday_name: None,
            is_weekend: false,
        }
    }

    fn adjustment(d: NaiveDate, adjustment_type: AdjustmentType) -> AttendanceAdjustment {
        AttendanceAdjustment {
            employee_id: "emp_001".to_string(),
            date: d,
            adjustment_type,
            check_in: None,
            check_out: None,
            note: "Scanner offline".to_string(),
            adjusted_by: "hr_01".to_string(),
            adjusted_at: Utc.with_ymd_and_hms(2026, 3, 3, 9, 0, 0).unwrap(),
        }
    }

    fn classify(
        employee: &Employee,
        d: NaiveDate,
        events: &[AttendanceEvent],
        day_info: &DayInfo,
        adjustment: Option<&AttendanceAdjustment>,
    ) -> DayRecord {
        classify_day(
            &DayContext {
                employee,
                date: d,
                events,
                leave: &[],
                day_info,
                adjustment,
                reference_today: date(2026, 3, 31),
            },
            &work_time(),
        )
    }

    #[test]
    fn test_in_after_grace_is_late() {
        let d = date(2026, 3, 2);
        let events = [
            scan(Direction::In, "2026-03-02 08:20:00"),
            scan(Direction::Out, "2026-03-02 17:05:00"),
        ];
        let record = classify(&create_test_employee(), d, &events, &workday(d), None);
        assert_eq!(record.status, DayStatus::Late { late_minutes: 5 });
        assert_eq!(record.late_minutes(), Some(5));
        assert_eq!(
            record.work_duration,
            Some(WorkDuration {
                hours: 8,
                minutes: 45
            })
        );
    }

    #[test]
    fn test_in_within_grace_is_present() {
        let d = date(2026, 3, 2);
        let events = [
            scan(Direction::In, "2026-03-02 08:15:00"),
            scan(Direction::Out, "2026-03-02 17:00:00"),
        ];
        let record = classify(&create_test_employee(), d, &events, &workday(d), None);
        assert_eq!(record.status, DayStatus::Present);
    }

    #[test]
    fn test_in_without_out_is_no_data() {
        let d = date(2026, 3, 2);
        let events = [scan(Direction::In, "2026-03-02 08:10:00")];
        let record = classify(&create_test_employee(), d, &events, &workday(d), None);
        assert_eq!(record.status, DayStatus::NoData);
        assert!(record.review_needed);
        assert!(record.work_duration.is_none());
    }

    #[test]
    fn test_no_scans_is_absent() {
        let d = date(2026, 3, 2);
        let record = classify(&create_test_employee(), d, &[], &workday(d), None);
        assert_eq!(record.status, DayStatus::Absent);
    }

    #[test]
    fn test_first_in_and_last_out_are_authoritative() {
        let d = date(2026, 3, 2);
        let events = [
            scan(Direction::In, "2026-03-02 09:00:00"),
            scan(Direction::Out, "2026-03-02 12:00:00"),
            scan(Direction::In, "2026-03-02 07:55:00"),
            scan(Direction::Out, "2026-03-02 18:00:00"),
        ];
        let record = classify(&create_test_employee(), d, &events, &workday(d), None);
        assert_eq!(record.status, DayStatus::Present);
        assert_eq!(record.first_in.unwrap().time().to_string(), "07:55:00");
        assert_eq!(record.last_out.unwrap().time().to_string(), "18:00:00");
    }

    #[test]
    fn test_garbled_timestamps_are_excluded() {
        let d = date(2026, 3, 2);
        let events = [
            scan(Direction::In, "not-a-time"),
            scan(Direction::In, "2026-03-02 08:05:00"),
            scan(Direction::Out, "2026-13-45 99:00:00"),
        ];
        let record = classify(&create_test_employee(), d, &events, &workday(d), None);
        assert_eq!(record.status, DayStatus::NoData);
    }

    #[test]
    fn test_scans_from_other_days_are_ignored() {
        let d = date(2026, 3, 2);
        let events = [
            scan(Direction::In, "2026-03-01 08:00:00"),
            scan(Direction::Out, "2026-03-01 17:00:00"),
        ];
        let record = classify(&create_test_employee(), d, &events, &workday(d), None);
        assert_eq!(record.status, DayStatus::Absent);
    }

    #[test]
    fn test_future_wins_over_everything() {
        let d = date(2026, 4, 1);
        let holiday = DayInfo {
            is_holiday: true,
            holiday_name: Some("Holiday".to_string()),
            ..workday(d)
        };
        let record = classify(&create_test_employee(), d, &[], &holiday, None);
        assert_eq!(record.status, DayStatus::Future);
    }

    #[test]
    fn test_not_started_before_holiday() {
        let d = date(2026, 1, 1);
        let holiday = DayInfo {
            is_holiday: true,
            holiday_name: Some("New Year".to_string()),
            ..workday(d)
        };
        let record = classify(&create_test_employee(), d, &[], &holiday, None);
        assert_eq!(record.status, DayStatus::NotStarted);
    }

    #[test]
    fn test_ended_after_end_date() {
        let mut employee = create_test_employee();
        employee.end_date = Some(date(2026, 3, 1));
        let d = date(2026, 3, 2);
        let events = [
            scan(Direction::In, "2026-03-02 08:00:00"),
            scan(Direction::Out, "2026-03-02 17:00:00"),
        ];
        let record = classify(&employee, d, &events, &workday(d), None);
        assert_eq!(record.status, DayStatus::Ended);
    }

    #[test]
    fn test_suspended_before_weekend() {
        let mut employee = create_test_employee();
        employee.status = EmploymentStatus::Suspended;
        let d = date(2026, 3, 7);
        let weekend = DayInfo {
            is_weekend: true,
            ..workday(d)
        };
        let record = classify(&employee, d, &[], &weekend, None);
        assert_eq!(record.status, DayStatus::Suspended);
    }

    #[test]
    fn test_holiday_before_leave() {
        let d = date(2026, 4, 13);
        let leave = [LeaveRequest {
            id: "lv_001".to_string(),
            employee_id: "emp_001".to_string(),
            leave_type: LeaveType::Vacation,
            start_date: d,
            end_date: d,
            days: Decimal::ONE,
            status: LeaveStatus::Approved,
            fiscal_year: 2026,
        }];
        let holiday = DayInfo {
            is_holiday: true,
            holiday_name: Some("Songkran".to_string()),
            ..workday(d)
        };
        let employee = create_test_employee();
        let ctx = DayContext {
            employee: &employee,
            date: d,
            events: &[],
            leave: &leave,
            day_info: &holiday,
            adjustment: None,
            reference_today: date(2026, 4, 30),
        };
        assert_eq!(
            classify_day(&ctx, &work_time()).status,
            DayStatus::Holiday {
                name: "Songkran".to_string()
            }
        );

        let ordinary = workday(d);
        let ctx = DayContext {
            day_info: &ordinary,
            ..ctx
        };
        assert_eq!(
            classify_day(&ctx, &work_time()).status,
            DayStatus::Leave {
                leave_type: LeaveType::Vacation
            }
        );
    }

    #[test]
    fn test_unapproved_leave_is_ignored() {
        let d = date(2026, 3, 2);
        let leave = [LeaveRequest {
            id: "lv_001".to_string(),
            employee_id: "emp_001".to_string(),
            leave_type: LeaveType::Sick,
            start_date: d,
            end_date: d,
            days: Decimal::ONE,
            status: LeaveStatus::Submitted,
            fiscal_year: 2026,
        }];
        let employee = create_test_employee();
        let info = workday(d);
        let record = classify_day(
            &DayContext {
                employee: &employee,
                date: d,
                events: &[],
                leave: &leave,
                day_info: &info,
                adjustment: None,
                reference_today: d,
            },
            &work_time(),
        );
        assert_eq!(record.status, DayStatus::Absent);
    }

    #[test]
    fn test_add_record_fills_missing_out() {
        let d = date(2026, 3, 2);
        let events = [scan(Direction::In, "2026-03-02 08:10:00")];
        let mut adj = adjustment(d, AdjustmentType::AddRecord);
        adj.check_out = NaiveTime::from_hms_opt(17, 0, 0);
        let record = classify(&create_test_employee(), d, &events, &workday(d), Some(&adj));
        assert_eq!(record.status, DayStatus::Present);
        assert_eq!(record.adjustment, Some(AdjustmentType::AddRecord));
        assert!(!record.review_needed);
    }

    #[test]
    fn test_add_record_overrides_late_scan() {
        let d = date(2026, 3, 2);
        let events = [
            scan(Direction::In, "2026-03-02 09:30:00"),
            scan(Direction::Out, "2026-03-02 17:00:00"),
        ];
        let mut adj = adjustment(d, AdjustmentType::AddRecord);
        adj.check_in = NaiveTime::from_hms_opt(8, 0, 0);
        let record = classify(&create_test_employee(), d, &events, &workday(d), Some(&adj));
        assert_eq!(record.status, DayStatus::Present);
        assert_eq!(record.work_duration.unwrap().hours, 9);
    }

    #[test]
    fn test_forgive_late_zeroes_late_minutes() {
        let d = date(2026, 3, 2);
        let events = [
            scan(Direction::In, "2026-03-02 09:00:00"),
            scan(Direction::Out, "2026-03-02 17:00:00"),
        ];
        let adj = adjustment(d, AdjustmentType::ForgiveLate);
        let record = classify(&create_test_employee(), d, &events, &workday(d), Some(&adj));
        assert_eq!(record.status, DayStatus::Present);
        assert_eq!(record.late_minutes(), Some(0));
    }

    #[test]
    fn test_adjustment_never_fabricates_weekend_attendance() {
        let d = date(2026, 3, 7);
        let mut adj = adjustment(d, AdjustmentType::AddRecord);
        adj.check_in = NaiveTime::from_hms_opt(8, 0, 0);
        adj.check_out = NaiveTime::from_hms_opt(17, 0, 0);
        let weekend = DayInfo {
            is_weekend: true,
            ..workday(d)
        };
        let record = classify(&create_test_employee(), d, &[], &weekend, Some(&adj));
        assert_eq!(record.status, DayStatus::Weekend);
        assert!(record.adjustment.is_none());
        assert!(record.first_in.is_none());
    }

    #[test]
    fn test_out_before_in_needs_review() {
        let d = date(2026, 3, 2);
        let events = [
            scan(Direction::In, "2026-03-02 17:00:00"),
            scan(Direction::Out, "2026-03-02 08:00:00"),
        ];
        let record = classify(&create_test_employee(), d, &events, &workday(d), None);
        assert!(record.review_needed);
        assert_eq!(record.work_duration.unwrap().total_minutes(), 0);
    }

    #[test]
    fn test_classify_range_covers_every_day() {
        let employee = create_test_employee();
        let calendar = HolidayCalendar::from_records(&[Holiday {
            date: "2026-03-03".to_string(),
            name: "Makha Bucha".to_string(),
        }]);
        let events = [
            scan(Direction::In, "2026-03-02 08:20:00"),
            scan(Direction::Out, "2026-03-02 17:00:00"),
            scan(Direction::In, "garbage"),
        ];
        let mut older = adjustment(date(2026, 3, 4), AdjustmentType::AddRecord);
        older.check_in = NaiveTime::from_hms_opt(9, 0, 0);
        older.check_out = NaiveTime::from_hms_opt(17, 0, 0);
        let mut newer = older.clone();
        newer.check_in = NaiveTime::from_hms_opt(8, 0, 0);
        newer.adjusted_at = older.adjusted_at + Duration::hours(1);

        let adjustments = [newer, older];
        let days = classify_range(
            &employee,
            date(2026, 3, 1),
            date(2026, 3, 7),
            &EmployeeRecords {
                events: &events,
                leave: &[],
                adjustments: &adjustments,
            },
            &calendar,
            &work_time(),
            date(2026, 3, 5),
        );

        let statuses: Vec<&str> = days.iter().map(|d| d.status.code()).collect();
        assert_eq!(
            statuses,
            vec!["WEEKEND", "LATE", "HOLIDAY", "PRESENT", "ABSENT", "FUTURE", "FUTURE"]
        );
    }
}
