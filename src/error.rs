//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while classifying attendance
//! and building payslips.

use thiserror::Error;

/// The main error type for the payroll engine.
///
/// All fallible operations in the engine return this error type. The variants
/// fall into four families: configuration errors (fatal for one employee's
/// payslip), consistency errors (block a pay run until reconciled), state
/// errors (rejected outright), and lookups that found nothing.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/policy.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/policy.yaml");
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// The compensation policy loaded but contains inconsistent values.
    #[error("Invalid compensation policy field '{field}': {message}")]
    InvalidPolicy {
        /// The policy field that was rejected.
        field: String,
        /// Why the value was rejected.
        message: String,
    },

    /// No employee with the given id exists in the record store.
    #[error("Employee not found: {employee_id}")]
    EmployeeNotFound {
        /// The id that was looked up.
        employee_id: String,
    },

    /// The employee's compensation plan requires a rate that is not set.
    #[error("Employee '{employee_id}' has no {rate} for plan {plan}")]
    MissingRate {
        /// The employee missing the rate.
        employee_id: String,
        /// The compensation plan in effect.
        plan: String,
        /// Which rate is missing (`salary_monthly` or `salary_daily`).
        rate: String,
    },

    /// The employee is on a plan that never produces a payslip.
    #[error("Employee '{employee_id}' is on plan {plan} and is not payable")]
    NotPayable {
        /// The employee that was rejected.
        employee_id: String,
        /// The compensation plan in effect.
        plan: String,
    },

    /// The live SSO policy no longer matches the decision locked in period 1.
    #[error(
        "SSO policy for {batch_id} changed since period 1 was locked \
         (locked {locked_fingerprint}, live {live_fingerprint}); reconciliation required"
    )]
    SsoPolicyMismatch {
        /// The batch whose lock disagrees with the live policy.
        batch_id: String,
        /// Fingerprint stored on the lock.
        locked_fingerprint: String,
        /// Fingerprint of the policy currently in force.
        live_fingerprint: String,
    },

    /// No payslip exists for the given batch and employee.
    #[error("Payslip not found for employee '{employee_id}' in batch {batch_id}")]
    PayslipNotFound {
        /// The pay period batch id.
        batch_id: String,
        /// The employee id.
        employee_id: String,
    },

    /// A paid payslip cannot be changed in any way.
    #[error("Payslip for employee '{employee_id}' in batch {batch_id} is paid and immutable")]
    PayslipImmutable {
        /// The pay period batch id.
        batch_id: String,
        /// The employee id.
        employee_id: String,
    },

    /// A payslip lifecycle action is not allowed from the current status.
    #[error("Cannot {action} a payslip in status {status}")]
    InvalidTransition {
        /// The attempted action.
        action: String,
        /// The payslip's current status.
        status: String,
    },

    /// Approving the leave would exceed an entitlement whose policy disallows overage.
    #[error(
        "Leave request '{request_id}' exceeds the {leave_type} entitlement by {over_days} day(s) \
         and the policy disallows overage"
    )]
    LeaveEntitlementExceeded {
        /// The leave request that was rejected.
        request_id: String,
        /// The leave type.
        leave_type: String,
        /// Days over the annual entitlement.
        over_days: String,
    },

    /// No leave request with the given id exists in the record store.
    #[error("Leave request not found: {request_id}")]
    LeaveRequestNotFound {
        /// The id that was looked up.
        request_id: String,
    },

    /// A leave request lifecycle action is not allowed from its current status.
    #[error("Cannot {action} leave request '{request_id}' in status {status}")]
    InvalidLeaveTransition {
        /// The leave request id.
        request_id: String,
        /// The attempted action.
        action: String,
        /// The request's current status.
        status: String,
    },

    /// A record changed between being read and being written back.
    #[error("{resource} was changed by another request; reload and retry")]
    ConcurrentUpdate {
        /// What was being written, e.g. `payslip 2026-03-P1/emp_001`.
        resource: String,
    },

    /// An attendance adjustment failed validation.
    #[error("Invalid attendance adjustment: {message}")]
    InvalidAdjustment {
        /// Why the adjustment was rejected.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

impl EngineError {
    /// Returns a stable machine-readable code for the error.
    ///
    /// Codes are used in per-employee failure reports and API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                "CONFIG_ERROR"
            }
            EngineError::InvalidPolicy { .. } => "INVALID_POLICY",
            EngineError::EmployeeNotFound { .. } => "EMPLOYEE_NOT_FOUND",
            EngineError::MissingRate { .. } => "MISSING_RATE",
            EngineError::NotPayable { .. } => "NOT_PAYABLE",
            EngineError::SsoPolicyMismatch { .. } => "SSO_POLICY_MISMATCH",
            EngineError::PayslipNotFound { .. } => "PAYSLIP_NOT_FOUND",
            EngineError::PayslipImmutable { .. } => "PAYSLIP_IMMUTABLE",
            EngineError::InvalidTransition { .. } => "INVALID_TRANSITION",
            EngineError::LeaveEntitlementExceeded { .. } => "LEAVE_ENTITLEMENT_EXCEEDED",
            EngineError::LeaveRequestNotFound { .. } => "LEAVE_REQUEST_NOT_FOUND",
            EngineError::InvalidLeaveTransition { .. } => "INVALID_LEAVE_TRANSITION",
            EngineError::ConcurrentUpdate { .. } => "CONCURRENT_UPDATE",
            EngineError::InvalidAdjustment { .. } => "INVALID_ADJUSTMENT",
            EngineError::CalculationError { .. } => "CALCULATION_ERROR",
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/policy.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/policy.yaml"
        );
        assert_eq!(error.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_missing_rate_displays_employee_and_plan() {
        let error = EngineError::MissingRate {
            employee_id: "emp_007".to_string(),
            plan: "DAILY".to_string(),
            rate: "salary_daily".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Employee 'emp_007' has no salary_daily for plan DAILY"
        );
        assert_eq!(error.code(), "MISSING_RATE");
    }

    #[test]
    fn test_sso_mismatch_mentions_reconciliation() {
        let error = EngineError::SsoPolicyMismatch {
            batch_id: "2026-03".to_string(),
            locked_fingerprint: "abc".to_string(),
            live_fingerprint: "def".to_string(),
        };
        assert!(error.to_string().contains("reconciliation required"));
        assert_eq!(error.code(), "SSO_POLICY_MISMATCH");
    }

    #[test]
    fn test_invalid_transition_displays_action_and_status() {
        let error = EngineError::InvalidTransition {
            action: "accept".to_string(),
            status: "DRAFT".to_string(),
        };
        assert_eq!(error.to_string(), "Cannot accept a payslip in status DRAFT");
    }

    #[test]
    fn test_config_parse_error_displays_path_and_message() {
        let error = EngineError::ConfigParseError {
            path: "/config/policy.yaml".to_string(),
            message: "invalid YAML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse configuration file '/config/policy.yaml': invalid YAML syntax"
        );
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_not_payable() -> EngineResult<()> {
            Err(EngineError::NotPayable {
                employee_id: "emp_001".to_string(),
                plan: "NO_PAY".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_not_payable()?;
            Ok(())
        }

        assert_eq!(propagates_error().unwrap_err().code(), "NOT_PAYABLE");
    }
}
