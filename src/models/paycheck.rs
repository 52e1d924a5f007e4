//! Paycheck model and its lifecycle state machine.
//!
//! A paycheck is created as a `draft`, filled in by the salary calculator,
//! and then moved through `processed` and `paid`. `voided` and `failed`
//! are terminal side states kept for audit history.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PayrollError, PayrollResult};

use super::AuditStep;

/// Lifecycle status of a paycheck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaycheckStatus {
    /// Created, may be (re)calculated.
    Draft,
    /// Calculated and approved for payment.
    Processed,
    /// Paid out. Final unless policy allows voiding.
    Paid,
    /// Marked inert; retained for audit.
    Voided,
    /// Settlement failed during a batch run; the reason is on the paycheck.
    Failed,
}

impl PaycheckStatus {
    /// The wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaycheckStatus::Draft => "draft",
            PaycheckStatus::Processed => "processed",
            PaycheckStatus::Paid => "paid",
            PaycheckStatus::Voided => "voided",
            PaycheckStatus::Failed => "failed",
        }
    }

    /// Every status except `draft` is terminal for batch purposes.
    pub fn is_terminal(&self) -> bool {
        *self != PaycheckStatus::Draft
    }

    /// Whether the paycheck's net pay counts towards batch and period totals.
    pub fn counts_toward_totals(&self) -> bool {
        matches!(self, PaycheckStatus::Processed | PaycheckStatus::Paid)
    }
}

impl fmt::Display for PaycheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The itemized figures of a calculated paycheck, rounded to cents.
///
/// Totals are derived from the rounded components, so
/// `total_deductions` and `net_pay` match their parts exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaycheckFigures {
    /// Base salary for a full period.
    pub base_salary: Decimal,
    /// Contracted working days used for proration.
    pub contracted_working_days: u32,
    /// Days actually worked (half days count 0.5).
    pub actual_working_days: Decimal,
    /// Base salary prorated by worked days.
    pub basic_salary: Decimal,
    /// Fixed recurring allowances.
    pub allowances: Decimal,
    /// Basic salary plus allowances.
    pub gross_pay: Decimal,
    /// Income tax withheld.
    pub income_tax: Decimal,
    /// Health-insurance contribution.
    pub health_insurance: Decimal,
    /// Social-security contribution.
    pub social_security: Decimal,
    /// Profile deductions plus ad-hoc deductions entered on the paycheck.
    pub other_deductions: Decimal,
    /// Sum of the four deduction components.
    pub total_deductions: Decimal,
    /// Performance bonus.
    pub performance_bonus: Decimal,
    /// `gross_pay + performance_bonus - total_deductions`.
    pub net_pay: Decimal,
}

impl PaycheckFigures {
    /// Sum of the itemized deductions.
    pub fn deductions_sum(&self) -> Decimal {
        self.income_tax + self.health_insurance + self.social_security + self.other_deductions
    }

    /// Checks the deduction and net-pay identities.
    pub fn is_consistent(&self) -> bool {
        self.total_deductions == self.deductions_sum()
            && self.net_pay == self.gross_pay + self.performance_bonus - self.total_deductions
    }
}

/// One employee's itemized pay record for one period.
///
/// Identity is the `(employee_id, period_id)` pair; the `id` is a surrogate
/// key for addressing the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paycheck {
    /// Surrogate identifier.
    pub id: Uuid,
    /// The employee being paid.
    pub employee_id: String,
    /// The period being paid for.
    pub period_id: String,
    /// Calculated figures; zero until the first calculation.
    pub figures: PaycheckFigures,
    /// Deductions entered directly on the paycheck.
    pub adhoc_deductions: Decimal,
    /// Lifecycle status.
    pub status: PaycheckStatus,
    /// Who moved the paycheck to `processed`.
    pub processed_by: Option<String>,
    /// When the paycheck was processed.
    pub processed_at: Option<DateTime<Utc>>,
    /// When the paycheck was paid.
    pub paid_at: Option<DateTime<Utc>>,
    /// When the paycheck was voided.
    pub voided_at: Option<DateTime<Utc>>,
    /// Why settlement failed, for `failed` paychecks.
    pub failure_reason: Option<String>,
    /// Free-text notes, one per line.
    pub notes: String,
    /// When the calculator last ran.
    pub calculated_at: Option<DateTime<Utc>>,
    /// Audit steps from the last calculation.
    pub audit_trace: Vec<AuditStep>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record last changed.
    pub updated_at: DateTime<Utc>,
}

impl Paycheck {
    /// Creates a draft paycheck seeded with a base salary and contracted working days.
    pub fn draft(
        employee_id: impl Into<String>,
        period_id: impl Into<String>,
        base_salary: Decimal,
        contracted_working_days: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id: employee_id.into(),
            period_id: period_id.into(),
            figures: PaycheckFigures {
                base_salary,
                contracted_working_days,
                ..Default::default()
            },
            adhoc_deductions: Decimal::ZERO,
            status: PaycheckStatus::Draft,
            processed_by: None,
            processed_at: None,
            paid_at: None,
            voided_at: None,
            failure_reason: None,
            notes: String::new(),
            calculated_at: None,
            audit_trace: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the calculator has run at least once.
    pub fn is_calculated(&self) -> bool {
        self.calculated_at.is_some()
    }

    /// Stores a fresh calculation. Only drafts may be recalculated.
    pub fn apply_calculation(
        &mut self,
        figures: PaycheckFigures,
        audit_trace: Vec<AuditStep>,
        at: DateTime<Utc>,
    ) -> PayrollResult<()> {
        self.ensure_draft()?;
        debug_assert!(
            figures.is_consistent(),
            "inconsistent paycheck figures: {:?}",
            figures
        );

        self.figures = figures;
        self.audit_trace = audit_trace;
        self.calculated_at = Some(at);
        self.updated_at = at;
        Ok(())
    }

    /// Replaces the ad-hoc deduction amount. Only drafts accept new inputs.
    pub fn set_adhoc_deductions(&mut self, amount: Decimal, at: DateTime<Utc>) -> PayrollResult<()> {
        self.ensure_draft()?;
        if amount < Decimal::ZERO {
            return Err(PayrollError::invalid_input(
                "other_deductions",
                format!("must not be negative, got {}", amount),
            ));
        }
        self.adhoc_deductions = amount;
        self.updated_at = at;
        Ok(())
    }

    /// `draft -> processed`, recording who processed it.
    pub fn process(&mut self, actor: &str, at: DateTime<Utc>) -> PayrollResult<()> {
        if self.status != PaycheckStatus::Draft {
            return Err(self.illegal(
                PaycheckStatus::Processed,
                "only draft paychecks can be processed",
            ));
        }
        if !self.is_calculated() {
            return Err(self.illegal(
                PaycheckStatus::Processed,
                "calculation has not been run",
            ));
        }

        self.status = PaycheckStatus::Processed;
        self.processed_by = Some(actor.to_string());
        self.processed_at = Some(at);
        self.updated_at = at;
        Ok(())
    }

    /// `processed -> paid`.
    pub fn mark_paid(&mut self, at: DateTime<Utc>) -> PayrollResult<()> {
        if self.status != PaycheckStatus::Processed {
            return Err(self.illegal(
                PaycheckStatus::Paid,
                "paycheck must be processed before it is paid",
            ));
        }

        self.status = PaycheckStatus::Paid;
        self.paid_at = Some(at);
        self.updated_at = at;
        Ok(())
    }

    /// Any state except `voided` (and `paid`, unless allowed) `-> voided`.
    pub fn void(&mut self, allow_paid: bool, at: DateTime<Utc>) -> PayrollResult<()> {
        match self.status {
            PaycheckStatus::Voided => {
                return Err(self.illegal(PaycheckStatus::Voided, "paycheck is already voided"));
            }
            PaycheckStatus::Paid if !allow_paid => {
                return Err(self.illegal(
                    PaycheckStatus::Voided,
                    "paid paychecks cannot be voided under the current policy",
                ));
            }
            _ => {}
        }

        self.status = PaycheckStatus::Voided;
        self.voided_at = Some(at);
        self.updated_at = at;
        Ok(())
    }

    /// `draft -> failed`, recording why settlement failed.
    pub fn mark_failed(&mut self, reason: impl Into<String>, at: DateTime<Utc>) -> PayrollResult<()> {
        if self.status != PaycheckStatus::Draft {
            return Err(self.illegal(
                PaycheckStatus::Failed,
                "only draft paychecks can fail settlement",
            ));
        }

        self.status = PaycheckStatus::Failed;
        self.failure_reason = Some(reason.into());
        self.updated_at = at;
        Ok(())
    }

    /// Applies a caller-requested transition.
    ///
    /// Callers may request `processed`, `paid` or `voided`; `draft` and
    /// `failed` are never valid targets.
    pub fn transition(
        &mut self,
        target: PaycheckStatus,
        actor: &str,
        allow_void_paid: bool,
        at: DateTime<Utc>,
    ) -> PayrollResult<()> {
        match target {
            PaycheckStatus::Processed => self.process(actor, at),
            PaycheckStatus::Paid => self.mark_paid(at),
            PaycheckStatus::Voided => self.void(allow_void_paid, at),
            PaycheckStatus::Draft | PaycheckStatus::Failed => {
                Err(self.illegal(target, "not a requestable target state"))
            }
        }
    }

    /// Appends a free-text note. Allowed in any state.
    pub fn annotate(&mut self, note: &str, at: DateTime<Utc>) {
        let note = note.trim();
        if note.is_empty() {
            return;
        }
        if !self.notes.is_empty() {
            self.notes.push('\n');
        }
        self.notes.push_str(note);
        self.updated_at = at;
    }

    fn ensure_draft(&self) -> PayrollResult<()> {
        if self.status != PaycheckStatus::Draft {
            return Err(PayrollError::RecalculationRejected {
                paycheck_id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }

    fn illegal(&self, to: PaycheckStatus, reason: &str) -> PayrollError {
        PayrollError::IllegalTransition {
            paycheck_id: self.id,
            from: self.status,
            to,
            reason: reason.to_string(),
        }
    }
}
