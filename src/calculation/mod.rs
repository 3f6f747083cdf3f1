//! Calculation logic for the payroll engine.
//!
//! Everything here is a pure function of its arguments: the calendar
//! resolver, the daily attendance classifier, the period aggregator, the
//! leave overage calculator, the SSO split and the payslip builder. The
//! compensation policy is always passed in explicitly.

mod aggregator;
mod calendar;
mod classifier;
mod leave_overage;
mod payroll;
mod rounding;
mod sso;

pub use aggregator::aggregate_period;
pub use calendar::{DayInfo, HolidayCalendar, is_weekend};
pub use classifier::{DayContext, EmployeeRecords, classify_day, classify_range};
pub use leave_overage::{
    approve_leave, evaluate_leave_overage, leave_consumption, period_leave_overages,
};
pub use payroll::{PayslipInput, build_payslip};
pub use rounding::round_money;
pub use sso::{
    LockAction, SsoResolution, contribution_base, monthly_contribution, period_contribution,
    resolve_sso_decision, split_contribution,
};
