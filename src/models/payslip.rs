//! Payslip snapshot model and its lifecycle.
//!
//! A payslip is generated as a `DRAFT`, sent to the employee, and then
//! either accepted (`READY_TO_PAY`) or disputed (`REVISION_REQUESTED`).
//! Once `PAID` it never changes again.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

use super::{
    AuditStep, AuditWarning, CompensationPlan, LeaveOverage, LeaveType, PayPeriod, PeriodMetrics,
    SsoDecision,
};

/// Prefix carried by the code of every generated line item.
pub const AUTO_LINE_PREFIX: &str = "AUTO:";

/// Lifecycle status of a payslip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayslipStatus {
    /// Being prepared; may be regenerated and edited.
    #[default]
    Draft,
    /// Waiting for the employee's response.
    SentToEmployee,
    /// The employee disputed the payslip.
    RevisionRequested,
    /// The employee accepted the payslip.
    ReadyToPay,
    /// Settled. Terminal.
    Paid,
}

impl std::fmt::Display for PayslipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayslipStatus::Draft => write!(f, "DRAFT"),
            PayslipStatus::SentToEmployee => write!(f, "SENT_TO_EMPLOYEE"),
            PayslipStatus::RevisionRequested => write!(f, "REVISION_REQUESTED"),
            PayslipStatus::ReadyToPay => write!(f, "READY_TO_PAY"),
            PayslipStatus::Paid => write!(f, "PAID"),
        }
    }
}

/// Whether a line item was generated by the engine or entered by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineSource {
    /// Generated; replaced on every regeneration.
    Auto,
    /// Entered by an operator; survives regeneration.
    Manual,
}

/// Which side of the payslip a line item sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineKind {
    /// Adds to net pay.
    Addition,
    /// Subtracts from net pay.
    Deduction,
}

/// One addition or deduction on a payslip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Stable code; generated lines start with `AUTO:`.
    pub code: String,
    /// Text shown to the employee.
    pub label: String,
    /// Positive amount, rounded to 2 decimals.
    pub amount: Decimal,
    /// Generated or manual.
    pub source: LineSource,
}

impl LineItem {
    /// Creates a generated line; the code gets the `AUTO:` prefix.
    pub fn auto(code: &str, label: impl Into<String>, amount: Decimal) -> Self {
        Self {
            code: format!("{}{}", AUTO_LINE_PREFIX, code),
            label: label.into(),
            amount,
            source: LineSource::Auto,
        }
    }

    /// Creates an operator-entered line.
    pub fn manual(code: &str, label: impl Into<String>, amount: Decimal) -> Self {
        Self {
            code: code.to_string(),
            label: label.into(),
            amount,
            source: LineSource::Manual,
        }
    }

    /// True for generated lines.
    pub fn is_auto(&self) -> bool {
        self.source == LineSource::Auto || self.code.starts_with(AUTO_LINE_PREFIX)
    }
}

/// Attendance for the pay period and the year to date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    /// Metrics over the pay period window.
    pub period: PeriodMetrics,
    /// Metrics from 1 January through the period end.
    pub ytd: PeriodMetrics,
}

/// Leave usage for the fiscal year and any overage charged in this period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveSummary {
    /// Approved days per type for the fiscal year.
    pub consumption: BTreeMap<LeaveType, Decimal>,
    /// Overage evaluations for leave starting in this period.
    pub overages: Vec<LeaveOverage>,
}

/// How the SSO amount on this payslip was derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsoBreakdown {
    /// The contribution parameters applied.
    pub decision: SsoDecision,
    /// Contribution base after clamping to min base and cap.
    pub contribution_base: Decimal,
    /// Full-month contribution.
    pub monthly: Decimal,
    /// Period 1 share of `monthly`.
    pub period_one_share: Decimal,
    /// Period 2 share of `monthly`.
    pub period_two_share: Decimal,
    /// Amount deducted on the period 1 payslip (period 2 only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub already_deducted: Option<Decimal>,
    /// Net effect on this payslip: positive is a deduction, negative a refund.
    pub amount: Decimal,
}

/// Settlement details of a paid payslip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Who paid.
    pub paid_by: String,
    /// The account the payment was drawn from.
    pub settlement_account: String,
    /// When it was paid.
    pub paid_at: DateTime<Utc>,
}

/// A persisted, auditable payslip for one employee in one pay period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayslipSnapshot {
    /// Unique identifier, stable across regenerations.
    pub id: Uuid,
    /// The pay run this belongs to.
    pub batch_id: String,
    /// The pay period.
    pub pay_period: PayPeriod,
    /// The employee paid.
    pub employee_id: String,
    /// The employee's plan when generated.
    pub compensation_plan: CompensationPlan,
    /// Base pay for the period.
    pub base_pay: Decimal,
    /// Additions, generated and manual.
    pub additions: Vec<LineItem>,
    /// Deductions, generated and manual.
    pub deductions: Vec<LineItem>,
    /// `base_pay + additions - deductions`; may be negative.
    pub net_pay: Decimal,
    /// Attendance metrics.
    pub attendance: AttendanceSummary,
    /// Leave usage and overage.
    pub leave: LeaveSummary,
    /// SSO derivation, when a contribution applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sso: Option<SsoBreakdown>,
    /// Issues needing attention.
    pub warnings: Vec<AuditWarning>,
    /// Ordered record of the calculation.
    pub audit_trace: Vec<AuditStep>,
    /// Lifecycle status.
    pub status: PayslipStatus,
    /// Incremented on every send.
    pub revision: u32,
    /// The employee's reason for the latest revision request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_reason: Option<String>,
    /// Set once paid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentRecord>,
    /// When the payslip was last generated.
    pub generated_at: DateTime<Utc>,
    /// Store write counter; `0` until first stored. A save is refused
    /// unless this still matches the stored copy.
    #[serde(default)]
    pub version: u64,
}

impl PayslipSnapshot {
    /// Sum of all additions.
    pub fn total_additions(&self) -> Decimal {
        self.additions.iter().map(|l| l.amount).sum()
    }

    /// Sum of all deductions.
    pub fn total_deductions(&self) -> Decimal {
        self.deductions.iter().map(|l| l.amount).sum()
    }

    /// Recomputes net pay from the current lines.
    ///
    /// Every amount is already rounded, so the sum is exact and is not
    /// rounded again.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CalculationError`] if the totals overflow;
    /// `net_pay` is left unchanged.
    pub fn recompute_net_pay(&mut self) -> EngineResult<()> {
        let net_pay = checked_total(&self.additions)
            .zip(checked_total(&self.deductions))
            .and_then(|(additions, deductions)| {
                self.base_pay.checked_add(additions)?.checked_sub(deductions)
            })
            .ok_or_else(|| EngineError::CalculationError {
                message: format!(
                    "net pay for employee '{}' in {} is out of range",
                    self.employee_id, self.batch_id
                ),
            })?;
        self.net_pay = net_pay;
        Ok(())
    }

    /// True when lines may be edited and the payslip regenerated.
    pub fn is_editable(&self) -> bool {
        matches!(
            self.status,
            PayslipStatus::Draft | PayslipStatus::RevisionRequested
        )
    }

    /// Fails if the payslip is paid.
    pub fn ensure_not_paid(&self) -> EngineResult<()> {
        if self.status == PayslipStatus::Paid {
            return Err(EngineError::PayslipImmutable {
                batch_id: self.batch_id.clone(),
                employee_id: self.employee_id.clone(),
            });
        }
        Ok(())
    }

    /// Carries identity, lifecycle and manual lines over from the previous
    /// version of this payslip onto a freshly generated one.
    ///
    /// # Errors
    ///
    /// - [`EngineError::PayslipImmutable`] if `previous` is paid
    /// - [`EngineError::InvalidTransition`] if `previous` is not editable
    pub fn carry_over_from(&mut self, previous: &PayslipSnapshot) -> EngineResult<()> {
        previous.ensure_not_paid()?;
        if !previous.is_editable() {
            return Err(invalid_transition("regenerate", previous.status));
        }

        self.id = previous.id;
        self.version = previous.version;
        self.revision = previous.revision;
        self.revision_reason = previous.revision_reason.clone();
        self.status = PayslipStatus::Draft;

        self.additions
            .extend(previous.additions.iter().filter(|l| !l.is_auto()).cloned());
        self.deductions
            .extend(previous.deductions.iter().filter(|l| !l.is_auto()).cloned());
        self.recompute_net_pay()
    }

    /// Adds an operator-entered line.
    pub fn add_manual_line(&mut self, kind: LineKind, line: LineItem) -> EngineResult<()> {
        self.ensure_editable("edit")?;
        if line.code.starts_with(AUTO_LINE_PREFIX) {
            return Err(EngineError::CalculationError {
                message: format!("manual line codes may not start with {}", AUTO_LINE_PREFIX),
            });
        }

        let line = LineItem {
            source: LineSource::Manual,
            amount: crate::calculation::round_money(line.amount),
            ..line
        };
        let lines = match kind {
            LineKind::Addition => &mut self.additions,
            LineKind::Deduction => &mut self.deductions,
        };
        lines.push(line);
        if let Err(err) = self.recompute_net_pay() {
            match kind {
                LineKind::Addition => self.additions.pop(),
                LineKind::Deduction => self.deductions.pop(),
            };
            return Err(err);
        }
        Ok(())
    }

    /// Removes operator-entered lines with the given code. Generated lines
    /// cannot be removed.
    pub fn remove_manual_line(&mut self, code: &str) -> EngineResult<usize> {
        self.ensure_editable("edit")?;
        let before = self.additions.len() + self.deductions.len();
        self.additions.retain(|l| l.is_auto() || l.code != code);
        self.deductions.retain(|l| l.is_auto() || l.code != code);
        self.recompute_net_pay()?;
        Ok(before - self.additions.len() - self.deductions.len())
    }

    /// `DRAFT | REVISION_REQUESTED -> SENT_TO_EMPLOYEE`; bumps the revision.
    pub fn send(&mut self) -> EngineResult<()> {
        self.ensure_editable("send")?;
        self.status = PayslipStatus::SentToEmployee;
        self.revision += 1;
        Ok(())
    }

    /// `SENT_TO_EMPLOYEE -> READY_TO_PAY`.
    pub fn accept(&mut self) -> EngineResult<()> {
        self.require_status("accept", PayslipStatus::SentToEmployee)?;
        self.status = PayslipStatus::ReadyToPay;
        Ok(())
    }

    /// `SENT_TO_EMPLOYEE -> REVISION_REQUESTED`; a reason is required.
    pub fn request_revision(&mut self, reason: &str) -> EngineResult<()> {
        self.require_status("request revision of", PayslipStatus::SentToEmployee)?;
        if reason.trim().is_empty() {
            return Err(EngineError::CalculationError {
                message: "a revision request needs a reason".to_string(),
            });
        }
        self.status = PayslipStatus::RevisionRequested;
        self.revision_reason = Some(reason.trim().to_string());
        Ok(())
    }

    /// `READY_TO_PAY -> PAID`; records who paid and from which account.
    pub fn mark_paid(
        &mut self,
        paid_by: &str,
        settlement_account: &str,
        paid_at: DateTime<Utc>,
    ) -> EngineResult<()> {
        self.require_status("pay", PayslipStatus::ReadyToPay)?;
        if paid_by.trim().is_empty() || settlement_account.trim().is_empty() {
            return Err(EngineError::CalculationError {
                message: "payment needs a payer and a settlement account".to_string(),
            });
        }
        self.status = PayslipStatus::Paid;
        self.payment = Some(PaymentRecord {
            paid_by: paid_by.to_string(),
            settlement_account: settlement_account.to_string(),
            paid_at,
        });
        Ok(())
    }

    fn ensure_editable(&self, action: &str) -> EngineResult<()> {
        self.ensure_not_paid()?;
        if !self.is_editable() {
            return Err(invalid_transition(action, self.status));
        }
        Ok(())
    }

    fn require_status(&self, action: &str, expected: PayslipStatus) -> EngineResult<()> {
        self.ensure_not_paid()?;
        if self.status != expected {
            return Err(invalid_transition(action, self.status));
        }
        Ok(())
    }
}

fn checked_total(lines: &[LineItem]) -> Option<Decimal> {
    lines
        .iter()
        .try_fold(Decimal::ZERO, |total, line| total.checked_add(line.amount))
}

fn invalid_transition(action: &str, status: PayslipStatus) -> EngineError {
    EngineError::InvalidTransition {
        action: action.to_string(),
        status: status.to_string(),
    }
}
