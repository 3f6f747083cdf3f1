//! Record store abstraction and the in-memory implementation.
//!
//! The engine reads employees, scans, holidays, leave and adjustments
//! through [`RecordStore`] and writes back adjustments, leave decisions,
//! month locks and payslips. Every collection is keyed explicitly:
//! adjustments by `(employee_id, date)`, locks by month, payslips by
//! `(batch_id, employee_id)`.
//!
//! Writes that depend on an earlier read are conditional: the month lock is
//! created only if absent and replaced only if unchanged, payslips carry a
//! version, and leave decisions check the employee's requests were not
//! touched since they were read. A failed condition is reported as
//! [`EngineError::ConcurrentUpdate`] (or, for the lock, as the stored
//! record) instead of overwriting the other writer.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceAdjustment, AttendanceEvent, Employee, Holiday, LeaveRequest, MonthKey,
    PayPeriodBatch, PayslipSnapshot,
};

/// Read and write access to the records the engine works on.
pub trait RecordStore: Send + Sync {
    /// All employees, ordered by id.
    fn employees(&self) -> EngineResult<Vec<Employee>>;

    /// One employee.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmployeeNotFound`] if the id is unknown.
    fn employee(&self, employee_id: &str) -> EngineResult<Employee>;

    /// Scans for an employee whose local date falls in `[start, end]`.
    /// Scans with unparseable timestamps are included so callers can
    /// report them.
    fn attendance_events(
        &self,
        employee_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<AttendanceEvent>>;

    /// Every holiday record, as entered.
    fn holidays(&self) -> EngineResult<Vec<Holiday>>;

    /// Every leave request of an employee, any status.
    fn leave_requests(&self, employee_id: &str) -> EngineResult<Vec<LeaveRequest>>;

    /// One leave request by id.
    fn leave_request(&self, request_id: &str) -> EngineResult<Option<LeaveRequest>>;

    /// Inserts or replaces a leave request, provided the employee's requests
    /// still equal `observed` (as returned by [`RecordStore::leave_requests`]).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ConcurrentUpdate`] if any of the employee's
    /// requests changed since `observed` was read.
    fn save_leave_request(
        &self,
        request: LeaveRequest,
        observed: &[LeaveRequest],
    ) -> EngineResult<()>;

    /// Adjustments for an employee dated in `[start, end]`.
    fn adjustments(
        &self,
        employee_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<AttendanceAdjustment>>;

    /// Stores an adjustment, replacing any for the same employee and date.
    fn upsert_adjustment(&self, adjustment: AttendanceAdjustment) -> EngineResult<()>;

    /// The lock for a month, if one was created.
    fn batch_lock(&self, month: MonthKey) -> EngineResult<Option<PayPeriodBatch>>;

    /// Stores `batch` only if no lock exists for its month.
    ///
    /// Returns the stored lock and whether this call created it. The check
    /// and the write are one atomic step.
    fn create_batch_lock_if_absent(
        &self,
        batch: PayPeriodBatch,
    ) -> EngineResult<(PayPeriodBatch, bool)>;

    /// Replaces the lock for `batch.month` with `batch`, but only while the
    /// stored lock still equals `expected`. Used to record a reconciliation.
    ///
    /// Returns the stored lock and whether this call replaced it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CalculationError`] if the month has no lock.
    fn update_batch_lock(
        &self,
        expected: &PayPeriodBatch,
        batch: PayPeriodBatch,
    ) -> EngineResult<(PayPeriodBatch, bool)>;

    /// One payslip.
    fn payslip(&self, batch_id: &str, employee_id: &str) -> EngineResult<Option<PayslipSnapshot>>;

    /// Every payslip in a batch.
    fn payslips(&self, batch_id: &str) -> EngineResult<Vec<PayslipSnapshot>>;

    /// Inserts or replaces a payslip and returns it as stored, with its
    /// version bumped.
    ///
    /// `payslip.version` must equal the stored copy's version, or be `0`
    /// when none is stored yet.
    ///
    /// # Errors
    ///
    /// - [`EngineError::PayslipImmutable`] if the stored payslip is paid
    /// - [`EngineError::ConcurrentUpdate`] if the versions disagree
    fn save_payslip(&self, payslip: PayslipSnapshot) -> EngineResult<PayslipSnapshot>;
}

/// Initial records for an [`InMemoryStore`], usually read from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSeed {
    /// Employees.
    #[serde(default)]
    pub employees: Vec<Employee>,
    /// Raw scans.
    #[serde(default)]
    pub attendance_events: Vec<AttendanceEvent>,
    /// Holidays.
    #[serde(default)]
    pub holidays: Vec<Holiday>,
    /// Leave requests.
    #[serde(default)]
    pub leave_requests: Vec<LeaveRequest>,
    /// Adjustments; later entries win for the same employee and date.
    #[serde(default)]
    pub adjustments: Vec<AttendanceAdjustment>,
}

#[derive(Debug, Default)]
struct Records {
    employees: BTreeMap<String, Employee>,
    events: Vec<AttendanceEvent>,
    holidays: Vec<Holiday>,
    leave: BTreeMap<String, LeaveRequest>,
    adjustments: BTreeMap<(String, NaiveDate), AttendanceAdjustment>,
    batches: BTreeMap<MonthKey, PayPeriodBatch>,
    payslips: BTreeMap<(String, String), PayslipSnapshot>,
}

/// A [`RecordStore`] kept in process memory.
///
/// One mutex guards all collections; it is held only for the duration of a
/// single read or write, never across a payslip computation.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: Mutex<Records>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the seed records.
    pub fn from_seed(seed: StoreSeed) -> Self {
        let store = Self::new();
        {
            let mut records = store.records.lock();
            records.employees = seed
                .employees
                .into_iter()
                .map(|e| (e.id.clone(), e))
                .collect();
            records.events = seed.attendance_events;
            records.holidays = seed.holidays;
            records.leave = seed
                .leave_requests
                .into_iter()
                .map(|r| (r.id.clone(), r))
                .collect();
            for adjustment in seed.adjustments {
                records.adjustments.insert(
                    (adjustment.employee_id.clone(), adjustment.date),
                    adjustment,
                );
            }
            info!(
                employees = records.employees.len(),
                events = records.events.len(),
                leave_requests = records.leave.len(),
                "Record store seeded"
            );
        }
        store
    }

    /// Reads a JSON [`StoreSeed`] from disk.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ConfigNotFound`] or
    /// [`EngineError::ConfigParseError`] for a missing or malformed file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;
        let seed: StoreSeed =
            serde_json::from_str(&content).map_err(|e| EngineError::ConfigParseError {
                path: path_str,
                message: e.to_string(),
            })?;
        Ok(Self::from_seed(seed))
    }

    /// Adds or replaces an employee.
    pub fn put_employee(&self, employee: Employee) {
        self.records
            .lock()
            .employees
            .insert(employee.id.clone(), employee);
    }

    /// Appends raw scans.
    pub fn append_events(&self, events: impl IntoIterator<Item = AttendanceEvent>) {
        self.records.lock().events.extend(events);
    }

    /// Replaces the holiday list.
    pub fn replace_holidays(&self, holidays: Vec<Holiday>) {
        self.records.lock().holidays = holidays;
    }
}

impl RecordStore for InMemoryStore {
    fn employees(&self) -> EngineResult<Vec<Employee>> {
        Ok(self.records.lock().employees.values().cloned().collect())
    }

    fn employee(&self, employee_id: &str) -> EngineResult<Employee> {
        self.records
            .lock()
            .employees
            .get(employee_id)
            .cloned()
            .ok_or_else(|| EngineError::EmployeeNotFound {
                employee_id: employee_id.to_string(),
            })
    }

    fn attendance_events(
        &self,
        employee_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<AttendanceEvent>> {
        Ok(self
            .records
            .lock()
            .events
            .iter()
            .filter(|e| e.employee_id == employee_id)
            .filter(|e| e.local_date().is_none_or(|d| d >= start && d <= end))
            .cloned()
            .collect())
    }

    fn holidays(&self) -> EngineResult<Vec<Holiday>> {
        Ok(self.records.lock().holidays.clone())
    }

    fn leave_requests(&self, employee_id: &str) -> EngineResult<Vec<LeaveRequest>> {
        Ok(self
            .records
            .lock()
            .leave
            .values()
            .filter(|r| r.employee_id == employee_id)
            .cloned()
            .collect())
    }

    fn leave_request(&self, request_id: &str) -> EngineResult<Option<LeaveRequest>> {
        Ok(self.records.lock().leave.get(request_id).cloned())
    }

    fn save_leave_request(
        &self,
        request: LeaveRequest,
        observed: &[LeaveRequest],
    ) -> EngineResult<()> {
        let mut records = self.records.lock();
        let unchanged = records
            .leave
            .values()
            .filter(|r| r.employee_id == request.employee_id)
            .eq(observed.iter());
        if !unchanged {
            return Err(EngineError::ConcurrentUpdate {
                resource: format!("leave requests of employee '{}'", request.employee_id),
            });
        }
        debug!(request_id = %request.id, status = %request.status, "Saving leave request");
        records.leave.insert(request.id.clone(), request);
        Ok(())
    }

    fn adjustments(
        &self,
        employee_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<AttendanceAdjustment>> {
        let from = (employee_id.to_string(), start);
        let to = (employee_id.to_string(), end);
        Ok(self
            .records
            .lock()
            .adjustments
            .range(from..=to)
            .map(|(_, a)| a.clone())
            .collect())
    }

    fn upsert_adjustment(&self, adjustment: AttendanceAdjustment) -> EngineResult<()> {
        let key = (adjustment.employee_id.clone(), adjustment.date);
        let replaced = self
            .records
            .lock()
            .adjustments
            .insert(key, adjustment)
            .is_some();
        debug!(replaced, "Adjustment stored");
        Ok(())
    }

    fn batch_lock(&self, month: MonthKey) -> EngineResult<Option<PayPeriodBatch>> {
        Ok(self.records.lock().batches.get(&month).cloned())
    }

    fn create_batch_lock_if_absent(
        &self,
        batch: PayPeriodBatch,
    ) -> EngineResult<(PayPeriodBatch, bool)> {
        let mut records = self.records.lock();
        if let Some(existing) = records.batches.get(&batch.month) {
            return Ok((existing.clone(), false));
        }
        info!(month = %batch.month, locked_by = %batch.locked_by, "SSO decision locked");
        records.batches.insert(batch.month, batch.clone());
        Ok((batch, true))
    }

    fn update_batch_lock(
        &self,
        expected: &PayPeriodBatch,
        batch: PayPeriodBatch,
    ) -> EngineResult<(PayPeriodBatch, bool)> {
        let mut records = self.records.lock();
        let existing =
            records
                .batches
                .get_mut(&batch.month)
                .ok_or_else(|| EngineError::CalculationError {
                    message: format!("no SSO lock exists for {}", batch.month),
                })?;
        if *existing != *expected {
            return Ok((existing.clone(), false));
        }
        *existing = batch.clone();
        Ok((batch, true))
    }

    fn payslip(&self, batch_id: &str, employee_id: &str) -> EngineResult<Option<PayslipSnapshot>> {
        Ok(self
            .records
            .lock()
            .payslips
            .get(&(batch_id.to_string(), employee_id.to_string()))
            .cloned())
    }

    fn payslips(&self, batch_id: &str) -> EngineResult<Vec<PayslipSnapshot>> {
        Ok(self
            .records
            .lock()
            .payslips
            .values()
            .filter(|p| p.batch_id == batch_id)
            .cloned()
            .collect())
    }

    fn save_payslip(&self, mut payslip: PayslipSnapshot) -> EngineResult<PayslipSnapshot> {
        let key = (payslip.batch_id.clone(), payslip.employee_id.clone());
        let mut records = self.records.lock();
        let stored_version = match records.payslips.get(&key) {
            Some(existing) => {
                existing.ensure_not_paid()?;
                existing.version
            }
            None => 0,
        };
        if payslip.version != stored_version {
            return Err(EngineError::ConcurrentUpdate {
                resource: format!("payslip {}/{}", payslip.batch_id, payslip.employee_id),
            });
        }
        payslip.version += 1;
        records.payslips.insert(key, payslip.clone());
        Ok(payslip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::{PayslipInput, build_payslip};
    use crate::config::{ConfigLoader, SsoPolicy};
    use crate::models::{
        AdjustmentType, CompensationPlan, Direction, EmploymentStatus, LeaveStatus, LeaveType,
        PayPeriod, PayslipStatus, PeriodMetrics, PeriodNumber, SsoDecision,
    };
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn create_test_employee(id: &str) -> Employee {
        Employee {
            id: id.to_string(),
            name: String::new(),
            compensation_plan: CompensationPlan::Monthly,
            salary_monthly: Some(Decimal::from(12000)),
            salary_daily: None,
            start_date: None,
            end_date: None,
            status: EmploymentStatus::Active,
        }
    }

    fn adjustment(employee_id: &str, d: u32, note: &str) -> AttendanceAdjustment {
        AttendanceAdjustment {
            employee_id: employee_id.to_string(),
            date: date(d),
            adjustment_type: AdjustmentType::ForgiveLate,
            check_in: None,
            check_out: None,
            note: note.to_string(),
            adjusted_by: "hr_01".to_string(),
            adjusted_at: Utc.with_ymd_and_hms(2026, 3, 20, 9, 0, 0).unwrap(),
        }
    }

    fn payslip() -> PayslipSnapshot {
        let employee = create_test_employee("emp_001");
        let decision = SsoDecision::from_policy(&SsoPolicy {
            employee_percent: Decimal::from(5),
            min_base: Decimal::from(1650),
            cap: Decimal::from(15000),
        });
        let policy = ConfigLoader::load("./config").unwrap().policy().clone();
        let metrics = PeriodMetrics::empty(date(1), date(15));
        build_payslip(&PayslipInput {
            employee: &employee,
            pay_period: PayPeriod::new(2026, 3, PeriodNumber::First).unwrap(),
            period_metrics: &metrics,
            ytd_metrics: &metrics,
            leave_requests: &[],
            policy: &policy,
            sso_decision: &decision,
            period_one_sso_deducted: None,
            generated_at: Utc::now(),
        })
        .unwrap()
    }

    fn leave(id: &str, status: LeaveStatus) -> LeaveRequest {
        LeaveRequest {
            id: id.to_string(),
            employee_id: "emp_001".to_string(),
            leave_type: LeaveType::Sick,
            start_date: date(2),
            end_date: date(2),
            days: Decimal::ONE,
            status,
            fiscal_year: 2026,
        }
    }

    fn batch(percent: i64, locked_by: &str) -> PayPeriodBatch {
        PayPeriodBatch {
            month: MonthKey {
                year: 2026,
                month: 3,
            },
            sso_lock: SsoDecision::from_policy(&SsoPolicy {
                employee_percent: Decimal::from(percent),
                min_base: Decimal::from(1650),
                cap: Decimal::from(15000),
            }),
            locked_by: locked_by.to_string(),
            locked_at: Utc::now(),
            reconciliation: None,
        }
    }

    #[test]
    fn test_unknown_employee() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.employee("ghost"),
            Err(EngineError::EmployeeNotFound { .. })
        ));
    }

    #[test]
    fn test_adjustment_last_write_wins() {
        let store = InMemoryStore::new();
        store.upsert_adjustment(adjustment("emp_001", 2, "first")).unwrap();
        store.upsert_adjustment(adjustment("emp_001", 2, "second")).unwrap();
        store.upsert_adjustment(adjustment("emp_002", 2, "other")).unwrap();

        let stored = store.adjustments("emp_001", date(1), date(31)).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].note, "second");
    }

    #[test]
    fn test_adjustments_by_range() {
        let store = InMemoryStore::new();
        for d in [1, 5, 10, 20] {
            store.upsert_adjustment(adjustment("emp_001", d, "n")).unwrap();
        }
        let stored = store.adjustments("emp_001", date(5), date(10)).unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[test]
    fn test_events_by_range_keep_garbled() {
        let store = InMemoryStore::new();
        store.append_events([
            AttendanceEvent {
                employee_id: "emp_001".to_string(),
                direction: Direction::In,
                timestamp: "2026-03-02 08:00:00".to_string(),
            },
            AttendanceEvent {
                employee_id: "emp_001".to_string(),
                direction: Direction::In,
                timestamp: "2026-04-02 08:00:00".to_string(),
            },
            AttendanceEvent {
                employee_id: "emp_001".to_string(),
                direction: Direction::Out,
                timestamp: "??".to_string(),
            },
        ]);
        let events = store.attendance_events("emp_001", date(1), date(31)).unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_create_batch_lock_if_absent_keeps_first() {
        let store = InMemoryStore::new();
        let (first, created) = store.create_batch_lock_if_absent(batch(5, "2026-03-P1")).unwrap();
        assert!(created);
        let (second, created) = store.create_batch_lock_if_absent(batch(6, "2026-03-P2")).unwrap();
        assert!(!created);
        assert_eq!(second, first);
    }

    #[test]
    fn test_concurrent_lock_creation_has_one_winner() {
        let store = Arc::new(InMemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .create_batch_lock_if_absent(batch(5 + i, "2026-03-P1"))
                        .unwrap()
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|(_, created)| *created).count(), 1);
        let winner = &results.iter().find(|(_, created)| *created).unwrap().0;
        assert!(results.iter().all(|(b, _)| b == winner));
    }

    #[test]
    fn test_update_missing_lock_fails() {
        let store = InMemoryStore::new();
        let lock = batch(5, "2026-03-P1");
        assert!(store.update_batch_lock(&lock, lock.clone()).is_err());
    }

    #[test]
    fn test_update_batch_lock_from_stale_copy_is_refused() {
        let store = InMemoryStore::new();
        let (original, _) = store.create_batch_lock_if_absent(batch(5, "2026-03-P1")).unwrap();

        let mut kept = original.clone();
        kept.locked_by = "kept".to_string();
        let mut adopted = original.clone();
        adopted.locked_by = "adopted".to_string();

        let (stored, replaced) = store.update_batch_lock(&original, kept.clone()).unwrap();
        assert!(replaced);
        assert_eq!(stored, kept);

        let (stored, replaced) = store.update_batch_lock(&original, adopted).unwrap();
        assert!(!replaced);
        assert_eq!(stored, kept);
        assert_eq!(store.batch_lock(original.month).unwrap(), Some(kept));
    }

    #[test]
    fn test_payslip_versions_guard_interleaved_writes() {
        let store = InMemoryStore::new();
        let stored = store.save_payslip(payslip()).unwrap();
        assert_eq!(stored.version, 1);

        // Two writers read the same draft.
        let mut regenerated = store.payslip("2026-03-P1", "emp_001").unwrap().unwrap();
        let mut sent = regenerated.clone();

        sent.send().unwrap();
        let sent = store.save_payslip(sent).unwrap();
        assert_eq!(sent.version, 2);

        regenerated.base_pay = Decimal::from(7000);
        let result = store.save_payslip(regenerated);
        assert!(matches!(result, Err(EngineError::ConcurrentUpdate { .. })));

        let current = store.payslip("2026-03-P1", "emp_001").unwrap().unwrap();
        assert_eq!(current.status, PayslipStatus::SentToEmployee);
        assert_eq!(current.revision, 1);
    }

    #[test]
    fn test_new_payslip_does_not_replace_a_stored_one() {
        let store = InMemoryStore::new();
        store.save_payslip(payslip()).unwrap();
        let result = store.save_payslip(payslip());
        assert!(matches!(result, Err(EngineError::ConcurrentUpdate { .. })));
    }

    #[test]
    fn test_paid_payslip_refuses_writes() {
        let store = InMemoryStore::new();
        let mut paid = store.save_payslip(payslip()).unwrap();
        paid.send().unwrap();
        paid.accept().unwrap();
        paid.mark_paid("finance_01", "KBANK-001", Utc::now()).unwrap();
        let paid = store.save_payslip(paid).unwrap();

        let result = store.save_payslip(paid);
        assert!(matches!(result, Err(EngineError::PayslipImmutable { .. })));
    }

    #[test]
    fn test_leave_save_requires_unchanged_requests() {
        let store = InMemoryStore::from_seed(StoreSeed {
            leave_requests: vec![
                leave("lv_001", LeaveStatus::Submitted),
                leave("lv_002", LeaveStatus::Submitted),
            ],
            ..StoreSeed::default()
        });

        let observed = store.leave_requests("emp_001").unwrap();
        let mut first = observed[0].clone();
        first.approve().unwrap();
        let mut second = observed[1].clone();
        second.approve().unwrap();

        store.save_leave_request(first, &observed).unwrap();
        let result = store.save_leave_request(second, &observed);
        assert!(matches!(result, Err(EngineError::ConcurrentUpdate { .. })));
        assert_eq!(
            store.leave_request("lv_002").unwrap().unwrap().status,
            LeaveStatus::Submitted
        );
    }

    #[test]
    fn test_seed_from_json() {
        let json = r#"{
            "employees": [{
                "id": "emp_009",
                "compensation_plan": "DAILY",
                "salary_daily": "450"
            }],
            "holidays": [{ "date": "2026-04-13", "name": "Songkran" }]
        }"#;
        let seed: StoreSeed = serde_json::from_str(json).unwrap();
        let store = InMemoryStore::from_seed(seed);
        assert_eq!(
            store.employee("emp_009").unwrap().compensation_plan,
            CompensationPlan::Daily
        );
        assert_eq!(store.holidays().unwrap().len(), 1);
        assert!(store.leave_requests("emp_009").unwrap().is_empty());
    }

    #[test]
    fn test_put_employee_is_listed_in_order() {
        let store = InMemoryStore::new();
        store.put_employee(create_test_employee("emp_002"));
        store.put_employee(create_test_employee("emp_001"));
        let ids: Vec<String> = store.employees().unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["emp_001", "emp_002"]);
    }
}
