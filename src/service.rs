//! Store-backed pay runs and payslip workflow.
//!
//! [`PayrollRunner`] fetches inputs from a [`RecordStore`], runs the pure
//! calculation functions and persists payslips and month locks. Errors for
//! one employee are collected into the run report instead of aborting the
//! batch; only an SSO policy mismatch blocks a whole run.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calculation::{
    EmployeeRecords, HolidayCalendar, LockAction, PayslipInput, SsoResolution, aggregate_period,
    approve_leave, build_payslip, classify_range, resolve_sso_decision,
};
use crate::config::ConfigLoader;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceAdjustment, DayRecord, Employee, LeaveOverage, LeaveRequest, LineItem, LineKind,
    PayPeriod, PayPeriodBatch, PayslipSnapshot, PeriodMetrics, PeriodNumber, SsoReconciliation,
};
use crate::store::RecordStore;

/// An employee the run produced no payslip for, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeFailure {
    /// The employee.
    pub employee_id: String,
    /// Machine-readable reason, usually an [`EngineError::code`].
    pub code: String,
    /// Human-readable reason.
    pub message: String,
}

/// Outcome of one pay run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// The batch id, e.g. `2026-03-P1`.
    pub batch_id: String,
    /// Payslips built and stored by this run.
    pub payslips: Vec<PayslipSnapshot>,
    /// Employees without a payslip.
    pub failures: Vec<EmployeeFailure>,
    /// The month lock the run used.
    pub lock: PayPeriodBatch,
}

/// Classified days and totals for one employee over a window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceReport {
    /// The employee.
    pub employee_id: String,
    /// One record per day of the window.
    pub days: Vec<DayRecord>,
    /// Totals over the window.
    pub metrics: PeriodMetrics,
}

/// A payslip lifecycle action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayslipAction {
    /// Send to the employee for review.
    Send,
    /// The employee accepts.
    Accept,
    /// The employee disputes the payslip.
    RequestRevision {
        /// Why the employee disputes it.
        reason: String,
    },
    /// Record payment.
    MarkPaid {
        /// Who paid.
        paid_by: String,
        /// The account the payment was settled from.
        settlement_account: String,
    },
}

/// Leave request decisions other than approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveDecision {
    /// `SUBMITTED -> REJECTED`.
    Reject,
    /// `SUBMITTED | APPROVED -> CANCELLED`.
    Cancel,
}

const LOCK_WRITE_ATTEMPTS: usize = 3;

/// Runs payroll against a record store.
pub struct PayrollRunner {
    config: RwLock<Arc<ConfigLoader>>,
    store: Arc<dyn RecordStore>,
}

impl PayrollRunner {
    /// Creates a runner over the given configuration and store.
    pub fn new(config: ConfigLoader, store: Arc<dyn RecordStore>) -> Self {
        Self {
            config: RwLock::new(Arc::new(config)),
            store,
        }
    }

    /// Returns the configuration currently in force.
    pub fn config(&self) -> Arc<ConfigLoader> {
        self.config.read().clone()
    }

    /// Swaps in a new configuration for subsequent runs.
    pub fn replace_config(&self, config: ConfigLoader) {
        info!(
            sso_fingerprint = %config.policy().sso.fingerprint(),
            "Compensation policy replaced"
        );
        *self.config.write() = Arc::new(config);
    }

    /// Returns the record store.
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Generates payslips for every employee for one pay period.
    ///
    /// The month's SSO lock is created by the first run of the month. When
    /// the live policy has drifted from the lock, `reconciliation` decides
    /// which decision applies; without it the run fails before any payslip
    /// is built.
    ///
    /// # Errors
    ///
    /// - [`EngineError::SsoPolicyMismatch`] on unreconciled drift
    /// - [`EngineError::ConcurrentUpdate`] if the month lock keeps changing
    ///   under the run
    /// - store errors while reading employees or holidays
    pub fn run(
        &self,
        period: PayPeriod,
        reference_today: NaiveDate,
        reconciliation: Option<SsoReconciliation>,
    ) -> EngineResult<RunReport> {
        let config = self.config();
        let batch_id = period.batch_id();
        let resolution = self.lock_sso_decision(&config, &period, reconciliation)?;
        let calendar = self.holiday_calendar(&config)?;

        let mut payslips = Vec::new();
        let mut failures = Vec::new();
        for employee in self.store.employees()? {
            match self.generate_payslip(
                &config,
                &calendar,
                &employee,
                period,
                &resolution,
                reference_today,
            ) {
                Ok(Some(payslip)) => payslips.push(payslip),
                Ok(None) => failures.push(EmployeeFailure {
                    employee_id: employee.id.clone(),
                    code: "NOT_EMPLOYED".to_string(),
                    message: format!("Employee '{}' is not employed during {}", employee.id, batch_id),
                }),
                Err(err) => {
                    warn!(batch_id = %batch_id, employee_id = %employee.id, error = %err, "Payslip not generated");
                    failures.push(EmployeeFailure {
                        employee_id: employee.id.clone(),
                        code: err.code().to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }

        info!(
            batch_id = %batch_id,
            payslips = payslips.len(),
            failures = failures.len(),
            "Pay run completed"
        );
        Ok(RunReport {
            batch_id,
            payslips,
            failures,
            lock: resolution.batch,
        })
    }

    /// The holidays in the store, or the configured calendar when the store
    /// has none.
    pub fn holiday_calendar(&self, config: &ConfigLoader) -> EngineResult<HolidayCalendar> {
        let holidays = self.store.holidays()?;
        if holidays.is_empty() {
            return Ok(config.calendar().clone());
        }
        Ok(HolidayCalendar::from_records(&holidays))
    }

    fn lock_sso_decision(
        &self,
        config: &ConfigLoader,
        period: &PayPeriod,
        reconciliation: Option<SsoReconciliation>,
    ) -> EngineResult<SsoResolution> {
        let live = &config.policy().sso;
        let mut existing = self.store.batch_lock(period.month_key())?;

        for _ in 0..LOCK_WRITE_ATTEMPTS {
            let resolution =
                resolve_sso_decision(period, live, existing.as_ref(), reconciliation, Utc::now())?;
            let (stored, written) = match (resolution.action, &existing) {
                (LockAction::Unchanged, _) => return Ok(resolution),
                (LockAction::Reconciled, Some(current)) => self
                    .store
                    .update_batch_lock(current, resolution.batch.clone())?,
                (LockAction::Reconciled, None) | (LockAction::Create, _) => self
                    .store
                    .create_batch_lock_if_absent(resolution.batch.clone())?,
            };
            if written {
                if resolution.action == LockAction::Reconciled {
                    info!(batch_id = %period.batch_id(), ?reconciliation, "SSO lock reconciled");
                }
                return Ok(resolution);
            }
            // Another run wrote the lock first; resolve against what it stored.
            debug!(batch_id = %period.batch_id(), "SSO lock changed concurrently");
            existing = Some(stored);
        }

        Err(EngineError::ConcurrentUpdate {
            resource: format!("SSO lock for {}", period.month_key()),
        })
    }

    fn generate_payslip(
        &self,
        config: &ConfigLoader,
        calendar: &HolidayCalendar,
        employee: &Employee,
        period: PayPeriod,
        resolution: &SsoResolution,
        reference_today: NaiveDate,
    ) -> EngineResult<Option<PayslipSnapshot>> {
        let policy = config.policy();
        employee.pay_basis()?;

        let (start, end) = period.window(&policy.pay_periods)?;
        let outside_employment = employee.start_date.is_some_and(|d| d > end)
            || employee.end_date.is_some_and(|d| d < start);
        if outside_employment {
            return Ok(None);
        }

        let (ytd_start, _) = period.ytd_window(&policy.pay_periods)?;
        let events = self.store.attendance_events(&employee.id, ytd_start, end)?;
        let leave = self.store.leave_requests(&employee.id)?;
        let adjustments = self.store.adjustments(&employee.id, ytd_start, end)?;
        let records = EmployeeRecords {
            events: &events,
            leave: &leave,
            adjustments: &adjustments,
        };

        let days = classify_range(
            employee,
            ytd_start,
            end,
            &records,
            calendar,
            &policy.work_time,
            reference_today,
        );
        let period_metrics = aggregate_period(employee, start, end, &days, &policy.payable_days);
        let ytd_metrics = aggregate_period(employee, ytd_start, end, &days, &policy.payable_days);

        let period_one_sso_deducted = match period.period {
            PeriodNumber::First => None,
            PeriodNumber::Second => self
                .store
                .payslip(&period.period_one().batch_id(), &employee.id)?
                .and_then(|p| p.sso.map(|sso| sso.amount)),
        };

        let mut payslip = build_payslip(&PayslipInput {
            employee,
            pay_period: period,
            period_metrics: &period_metrics,
            ytd_metrics: &ytd_metrics,
            leave_requests: &leave,
            policy,
            sso_decision: &resolution.decision,
            period_one_sso_deducted,
            generated_at: Utc::now(),
        })?;

        if let Some(previous) = self.store.payslip(&payslip.batch_id, &employee.id)? {
            payslip.carry_over_from(&previous)?;
        }
        let payslip = self.store.save_payslip(payslip)?;

        debug!(
            batch_id = %payslip.batch_id,
            employee_id = %employee.id,
            net_pay = %payslip.net_pay,
            "Payslip stored"
        );
        Ok(Some(payslip))
    }

    /// Classifies and totals one employee's attendance over `[from, to]`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmployeeNotFound`] for an unknown employee.
    pub fn summarize(
        &self,
        employee_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        reference_today: NaiveDate,
    ) -> EngineResult<AttendanceReport> {
        if to < from {
            return Err(EngineError::CalculationError {
                message: format!("window end {} is before its start {}", to, from),
            });
        }
        let config = self.config();
        let policy = config.policy();
        let employee = self.store.employee(employee_id)?;
        let calendar = self.holiday_calendar(&config)?;

        let events = self.store.attendance_events(employee_id, from, to)?;
        let leave = self.store.leave_requests(employee_id)?;
        let adjustments = self.store.adjustments(employee_id, from, to)?;
        let days = classify_range(
            &employee,
            from,
            to,
            &EmployeeRecords {
                events: &events,
                leave: &leave,
                adjustments: &adjustments,
            },
            &calendar,
            &policy.work_time,
            reference_today,
        );
        let metrics = aggregate_period(&employee, from, to, &days, &policy.payable_days);

        Ok(AttendanceReport {
            employee_id: employee_id.to_string(),
            days,
            metrics,
        })
    }

    /// Applies a lifecycle action to a stored payslip.
    pub fn transition_payslip(
        &self,
        batch_id: &str,
        employee_id: &str,
        action: PayslipAction,
    ) -> EngineResult<PayslipSnapshot> {
        self.update_payslip(batch_id, employee_id, |payslip| match &action {
            PayslipAction::Send => payslip.send(),
            PayslipAction::Accept => payslip.accept(),
            PayslipAction::RequestRevision { reason } => payslip.request_revision(reason),
            PayslipAction::MarkPaid {
                paid_by,
                settlement_account,
            } => payslip.mark_paid(paid_by, settlement_account, Utc::now()),
        })
    }

    /// Adds a manual line to an editable payslip.
    pub fn add_manual_line(
        &self,
        batch_id: &str,
        employee_id: &str,
        kind: LineKind,
        line: LineItem,
    ) -> EngineResult<PayslipSnapshot> {
        self.update_payslip(batch_id, employee_id, |payslip| {
            payslip.add_manual_line(kind, line)
        })
    }

    /// Removes manual lines with the given code from an editable payslip.
    pub fn remove_manual_line(
        &self,
        batch_id: &str,
        employee_id: &str,
        code: &str,
    ) -> EngineResult<PayslipSnapshot> {
        self.update_payslip(batch_id, employee_id, |payslip| {
            payslip.remove_manual_line(code).map(|_| ())
        })
    }

    fn update_payslip<F>(
        &self,
        batch_id: &str,
        employee_id: &str,
        change: F,
    ) -> EngineResult<PayslipSnapshot>
    where
        F: FnOnce(&mut PayslipSnapshot) -> EngineResult<()>,
    {
        let mut payslip =
            self.store
                .payslip(batch_id, employee_id)?
                .ok_or_else(|| EngineError::PayslipNotFound {
                    batch_id: batch_id.to_string(),
                    employee_id: employee_id.to_string(),
                })?;
        change(&mut payslip)?;
        let payslip = self.store.save_payslip(payslip)?;
        info!(
            batch_id = %batch_id,
            employee_id = %employee_id,
            status = %payslip.status,
            revision = payslip.revision,
            "Payslip updated"
        );
        Ok(payslip)
    }

    /// Approves a stored leave request and returns the advisory overage.
    ///
    /// # Errors
    ///
    /// - [`EngineError::LeaveRequestNotFound`] for an unknown id
    /// - [`EngineError::LeaveEntitlementExceeded`] on a `DISALLOW` overage
    /// - [`EngineError::ConcurrentUpdate`] if the employee's leave changed
    ///   while the request was being checked
    pub fn approve_leave(&self, request_id: &str) -> EngineResult<LeaveOverage> {
        let config = self.config();
        let (mut request, existing) = self.leave_request_with_siblings(request_id)?;
        let employee = self.store.employee(&request.employee_id)?;

        let overage = approve_leave(&mut request, &existing, &employee, config.policy())?;
        self.store.save_leave_request(request, &existing)?;
        if overage.exceeds {
            warn!(
                request_id = %request_id,
                employee_id = %employee.id,
                over_days = %overage.over_days,
                "Approved leave exceeds entitlement"
            );
        }
        Ok(overage)
    }

    /// Rejects or cancels a stored leave request.
    pub fn decide_leave(
        &self,
        request_id: &str,
        decision: LeaveDecision,
    ) -> EngineResult<LeaveRequest> {
        let (mut request, existing) = self.leave_request_with_siblings(request_id)?;
        match decision {
            LeaveDecision::Reject => request.reject()?,
            LeaveDecision::Cancel => request.cancel()?,
        }
        self.store.save_leave_request(request.clone(), &existing)?;
        Ok(request)
    }

    /// One leave request together with all of its employee's requests, as
    /// read for a conditional save.
    fn leave_request_with_siblings(
        &self,
        request_id: &str,
    ) -> EngineResult<(LeaveRequest, Vec<LeaveRequest>)> {
        let not_found = || EngineError::LeaveRequestNotFound {
            request_id: request_id.to_string(),
        };
        let employee_id = self.store.leave_request(request_id)?.ok_or_else(not_found)?.employee_id;
        let existing = self.store.leave_requests(&employee_id)?;
        let request = existing
            .iter()
            .find(|r| r.id == request_id)
            .cloned()
            .ok_or_else(not_found)?;
        Ok((request, existing))
    }

    /// Validates and stores an attendance adjustment, replacing any earlier
    /// one for the same employee and date.
    pub fn record_adjustment(&self, adjustment: AttendanceAdjustment) -> EngineResult<()> {
        adjustment.validate()?;
        self.store.employee(&adjustment.employee_id)?;
        info!(
            employee_id = %adjustment.employee_id,
            date = %adjustment.date,
            adjusted_by = %adjustment.adjusted_by,
            "Attendance adjustment recorded"
        );
        self.store.upsert_adjustment(adjustment)
    }
}
