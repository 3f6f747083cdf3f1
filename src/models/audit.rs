//! Audit trail and warning types shared by metrics and payslips.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single step in a payslip's audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
///
/// # Example
///
/// ```
/// use payroll_engine::models::AuditStep;
///
/// let step = AuditStep {
///     step_number: 1,
///     rule_id: "base_pay".to_string(),
///     rule_name: "Base Pay".to_string(),
///     input: serde_json::json!({"salary_monthly": "30000"}),
///     output: serde_json::json!({"base_pay": "15000.00"}),
///     reasoning: "Half of the monthly salary".to_string(),
/// };
/// assert_eq!(step.rule_id, "base_pay");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// How urgently a warning needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningSeverity {
    /// Informational.
    Low,
    /// Should be reviewed before paying.
    Medium,
    /// Likely wrong pay if ignored.
    High,
}

/// A warning generated during aggregation or payslip generation.
///
/// Warnings indicate potential issues that don't prevent calculation
/// but may require attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level.
    pub severity: WarningSeverity,
    /// The day the warning refers to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl AuditWarning {
    /// Creates a warning that is not tied to a day.
    pub fn new(code: &str, message: impl Into<String>, severity: WarningSeverity) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            severity,
            date: None,
        }
    }

    /// Creates a warning about a specific day.
    pub fn for_date(
        code: &str,
        message: impl Into<String>,
        severity: WarningSeverity,
        date: NaiveDate,
    ) -> Self {
        Self {
            date: Some(date),
            ..Self::new(code, message, severity)
        }
    }
}
