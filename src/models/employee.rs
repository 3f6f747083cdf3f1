//! Employee model and related types.
//!
//! This module defines the [`Employee`] struct together with the
//! compensation plan and employment status enums that decide how an
//! employee's days are classified and how they are paid.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// How an employee is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompensationPlan {
    /// Fixed monthly salary, half paid each bi-monthly period.
    Monthly,
    /// Daily rate multiplied by payable units.
    Daily,
    /// Fixed monthly salary for staff who are not expected to scan in.
    MonthlyNoScan,
    /// Not paid through payroll (owners, volunteers).
    NoPay,
}

impl std::fmt::Display for CompensationPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompensationPlan::Monthly => write!(f, "MONTHLY"),
            CompensationPlan::Daily => write!(f, "DAILY"),
            CompensationPlan::MonthlyNoScan => write!(f, "MONTHLY_NO_SCAN"),
            CompensationPlan::NoPay => write!(f, "NO_PAY"),
        }
    }
}

/// Whether the employee is currently allowed to work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentStatus {
    /// Working normally.
    #[default]
    Active,
    /// Temporarily suspended; every day classifies as suspended.
    Suspended,
}

/// The rate an employee is paid on, resolved from their plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayBasis {
    /// Monthly salary; each period pays half.
    Monthly {
        /// The full monthly salary.
        salary_monthly: Decimal,
    },
    /// Daily rate paid per payable unit.
    Daily {
        /// The rate for one payable unit.
        salary_daily: Decimal,
    },
}

/// Represents an employee whose attendance and pay the engine computes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// How the employee is paid.
    pub compensation_plan: CompensationPlan,
    /// Monthly salary, required for monthly plans.
    #[serde(default)]
    pub salary_monthly: Option<Decimal>,
    /// Daily rate, required for the daily plan.
    #[serde(default)]
    pub salary_daily: Option<Decimal>,
    /// First day of employment.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Last day of employment, set on departure.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Current employment status.
    #[serde(default)]
    pub status: EmploymentStatus,
}

impl Employee {
    /// Resolves the rate the employee is paid on.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotPayable`] for the `NO_PAY` plan
    /// - [`EngineError::MissingRate`] when the plan's rate is not set
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::models::{CompensationPlan, Employee, EmploymentStatus, PayBasis};
    /// use rust_decimal::Decimal;
    ///
    /// let employee = Employee {
    ///     id: "emp_001".to_string(),
    ///     name: "Somchai".to_string(),
    ///     compensation_plan: CompensationPlan::Daily,
    ///     salary_monthly: None,
    ///     salary_daily: Some(Decimal::new(450, 0)),
    ///     start_date: None,
    ///     end_date: None,
    ///     status: EmploymentStatus::Active,
    /// };
    /// assert_eq!(
    ///     employee.pay_basis().unwrap(),
    ///     PayBasis::Daily { salary_daily: Decimal::new(450, 0) }
    /// );
    /// ```
    pub fn pay_basis(&self) -> EngineResult<PayBasis> {
        match self.compensation_plan {
            CompensationPlan::NoPay => Err(EngineError::NotPayable {
                employee_id: self.id.clone(),
                plan: self.compensation_plan.to_string(),
            }),
            CompensationPlan::Monthly | CompensationPlan::MonthlyNoScan => self
                .salary_monthly
                .map(|salary_monthly| PayBasis::Monthly { salary_monthly })
                .ok_or_else(|| self.missing_rate("salary_monthly")),
            CompensationPlan::Daily => self
                .salary_daily
                .map(|salary_daily| PayBasis::Daily { salary_daily })
                .ok_or_else(|| self.missing_rate("salary_daily")),
        }
    }

    /// Returns the monthly salary used for contributions and leave deductions.
    ///
    /// Daily-rate employees without an explicit monthly salary use
    /// `salary_daily * monthly_days`.
    ///
    /// # Errors
    ///
    /// Same as [`Employee::pay_basis`], plus
    /// [`EngineError::CalculationError`] if the product overflows.
    pub fn monthly_equivalent(&self, monthly_days: u32) -> EngineResult<Decimal> {
        if let Some(salary_monthly) = self.salary_monthly {
            if self.compensation_plan != CompensationPlan::NoPay {
                return Ok(salary_monthly);
            }
        }

        match self.pay_basis()? {
            PayBasis::Monthly { salary_monthly } => Ok(salary_monthly),
            PayBasis::Daily { salary_daily } => salary_daily
                .checked_mul(Decimal::from(monthly_days))
                .ok_or_else(|| EngineError::CalculationError {
                    message: format!("monthly equivalent for employee '{}' is out of range", self.id),
                }),
        }
    }

    /// Returns true if the employee is expected to scan in and out.
    pub fn expects_scans(&self) -> bool {
        matches!(
            self.compensation_plan,
            CompensationPlan::Monthly | CompensationPlan::Daily
        )
    }

    fn missing_rate(&self, rate: &str) -> EngineError {
        EngineError::MissingRate {
            employee_id: self.id.clone(),
            plan: self.compensation_plan.to_string(),
            rate: rate.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn create_test_employee(plan: CompensationPlan) -> Employee {
        Employee {
            id: "emp_001".to_string(),
            name: "Malee".to_string(),
            compensation_plan: plan,
            salary_monthly: Some(dec("30000")),
            salary_daily: None,
            start_date: NaiveDate::from_ymd_opt(2023, 6, 1),
            end_date: None,
            status: EmploymentStatus::Active,
        }
    }

    #[test]
    fn test_deserialize_monthly_employee() {
        let json = r#"{
            "id": "emp_001",
            "name": "Malee",
            "compensation_plan": "MONTHLY",
            "salary_monthly": "30000",
            "start_date": "2023-06-01"
        }"#;

        let employee: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(employee.compensation_plan, CompensationPlan::Monthly);
        assert_eq!(employee.salary_monthly, Some(dec("30000")));
        assert_eq!(employee.status, EmploymentStatus::Active);
        assert!(employee.end_date.is_none());
    }

    #[test]
    fn test_deserialize_suspended_daily_employee() {
        let json = r#"{
            "id": "emp_002",
            "compensation_plan": "DAILY",
            "salary_daily": "450.50",
            "status": "SUSPENDED"
        }"#;

        let employee: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(employee.compensation_plan, CompensationPlan::Daily);
        assert_eq!(employee.status, EmploymentStatus::Suspended);
        assert_eq!(employee.salary_daily, Some(dec("450.50")));
    }

    #[test]
    fn test_pay_basis_monthly() {
        let employee = create_test_employee(CompensationPlan::Monthly);
        assert_eq!(
            employee.pay_basis().unwrap(),
            PayBasis::Monthly {
                salary_monthly: dec("30000")
            }
        );
    }

    #[test]
    fn test_pay_basis_no_pay_is_rejected() {
        let employee = create_test_employee(CompensationPlan::NoPay);
        match employee.pay_basis() {
            Err(EngineError::NotPayable { plan, .. }) => assert_eq!(plan, "NO_PAY"),
            other => panic!("Expected NotPayable, got {:?}", other),
        }
    }

    #[test]
    fn test_pay_basis_daily_without_rate_is_rejected() {
        let employee = create_test_employee(CompensationPlan::Daily);
        match employee.pay_basis() {
            Err(EngineError::MissingRate { rate, .. }) => assert_eq!(rate, "salary_daily"),
            other => panic!("Expected MissingRate, got {:?}", other),
        }
    }

    #[test]
    fn test_monthly_equivalent_for_daily_rate() {
        let mut employee = create_test_employee(CompensationPlan::Daily);
        employee.salary_monthly = None;
        employee.salary_daily = Some(dec("500"));
        assert_eq!(employee.monthly_equivalent(26).unwrap(), dec("13000"));
    }

    #[test]
    fn test_monthly_equivalent_prefers_explicit_salary() {
        let mut employee = create_test_employee(CompensationPlan::Daily);
        employee.salary_daily = Some(dec("500"));
        assert_eq!(employee.monthly_equivalent(26).unwrap(), dec("30000"));
    }

    #[test]
    fn test_expects_scans() {
        assert!(create_test_employee(CompensationPlan::Monthly).expects_scans());
        assert!(create_test_employee(CompensationPlan::Daily).expects_scans());
        assert!(!create_test_employee(CompensationPlan::MonthlyNoScan).expects_scans());
    }

    #[test]
    fn test_compensation_plan_serialization() {
        assert_eq!(
            serde_json::to_string(&CompensationPlan::MonthlyNoScan).unwrap(),
            "\"MONTHLY_NO_SCAN\""
        );
        assert_eq!(
            serde_json::to_string(&CompensationPlan::NoPay).unwrap(),
            "\"NO_PAY\""
        );
    }
}
