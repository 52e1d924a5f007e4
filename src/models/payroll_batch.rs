//! Payroll batch model.
//!
//! A batch coordinates settlement of every employee in scope for one
//! period. It never owns paychecks; its aggregates are derived from them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Paycheck, PaycheckStatus};

/// Lifecycle status of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Opened, paychecks seeded, not yet run.
    Draft,
    /// A run has started and not every paycheck is terminal yet.
    Processing,
    /// Every in-scope paycheck reached a terminal state.
    Completed,
}

/// An employee whose paycheck could not be settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    /// The employee affected.
    pub employee_id: String,
    /// The failed paycheck.
    pub paycheck_id: Uuid,
    /// Why settlement failed.
    pub reason: String,
}

/// The result of settling one paycheck during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// Calculated and moved to `processed`.
    Settled {
        /// The employee settled.
        employee_id: String,
        /// Net pay of the processed paycheck.
        net_pay: Decimal,
    },
    /// Marked `failed`.
    Failed(BatchFailure),
    /// Left untouched because another writer already moved it on.
    Skipped {
        /// The employee skipped.
        employee_id: String,
        /// The status found.
        status: PaycheckStatus,
    },
}

/// Coordination record for settling one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollBatch {
    /// Surrogate identifier.
    pub id: Uuid,
    /// The period settled; unique across batches.
    pub period_id: String,
    /// Lifecycle status.
    pub status: BatchStatus,
    /// Employees enumerated when the batch was opened.
    pub employee_ids: Vec<String>,
    /// Number of employees in scope.
    pub total_employees: u32,
    /// In-scope paychecks settled (processed, paid or voided).
    pub processed_count: u32,
    /// In-scope paychecks that failed settlement.
    pub failed_count: u32,
    /// Sum of net pay over processed and paid paychecks.
    pub total_amount: Decimal,
    /// Per-employee failures, visible in the batch report.
    pub failures: Vec<BatchFailure>,
    /// Who opened the batch.
    pub created_by: String,
    /// Who completed the batch.
    pub processed_by: Option<String>,
    /// When the batch was opened.
    pub created_at: DateTime<Utc>,
    /// When the batch completed.
    pub processed_at: Option<DateTime<Utc>>,
    /// When the record last changed.
    pub updated_at: DateTime<Utc>,
}

impl PayrollBatch {
    /// Opens a draft batch over the given employees.
    pub fn open(
        period_id: impl Into<String>,
        employee_ids: Vec<String>,
        created_by: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let total_employees = employee_ids.len() as u32;
        Self {
            id: Uuid::new_v4(),
            period_id: period_id.into(),
            status: BatchStatus::Draft,
            employee_ids,
            total_employees,
            processed_count: 0,
            failed_count: 0,
            total_amount: Decimal::ZERO,
            failures: vec![],
            created_by: created_by.into(),
            processed_by: None,
            created_at: now,
            processed_at: None,
            updated_at: now,
        }
    }

    /// Whether the employee belongs to this batch.
    pub fn in_scope(&self, employee_id: &str) -> bool {
        self.employee_ids.iter().any(|id| id == employee_id)
    }

    /// Moves the batch to `processing` unless it already completed.
    pub fn begin_processing(&mut self, at: DateTime<Utc>) {
        if self.status != BatchStatus::Completed {
            self.status = BatchStatus::Processing;
            self.updated_at = at;
        }
    }

    /// Folds one settlement outcome into the live counters.
    pub fn record_outcome(&mut self, outcome: &SettlementOutcome, at: DateTime<Utc>) {
        match outcome {
            SettlementOutcome::Settled { net_pay, .. } => {
                if self.processed_count + self.failed_count < self.total_employees {
                    self.processed_count += 1;
                    self.total_amount = self.total_amount.saturating_add(*net_pay);
                }
            }
            SettlementOutcome::Failed(failure) => {
                if self.processed_count + self.failed_count < self.total_employees {
                    self.failed_count += 1;
                    self.failures.push(failure.clone());
                }
            }
            SettlementOutcome::Skipped { .. } => {}
        }
        self.updated_at = at;
        debug_assert!(self.processed_count + self.failed_count <= self.total_employees);
    }

    /// Recomputes every aggregate from the paychecks themselves.
    ///
    /// Paychecks outside this batch's period or scope are ignored. Returns
    /// the number of in-scope employees whose paycheck is still `draft` or
    /// missing.
    pub fn reconcile(&mut self, paychecks: &[Paycheck], at: DateTime<Utc>) -> u32 {
        let scoped: Vec<&Paycheck> = paychecks
            .iter()
            .filter(|p| p.period_id == self.period_id && self.in_scope(&p.employee_id))
            .collect();

        self.processed_count = scoped
            .iter()
            .filter(|p| p.status.is_terminal() && p.status != PaycheckStatus::Failed)
            .count() as u32;
        self.total_amount = scoped
            .iter()
            .filter(|p| p.status.counts_toward_totals())
            .fold(Decimal::ZERO, |total, p| total.saturating_add(p.figures.net_pay));
        self.failures = scoped
            .iter()
            .filter(|p| p.status == PaycheckStatus::Failed)
            .map(|p| BatchFailure {
                employee_id: p.employee_id.clone(),
                paycheck_id: p.id,
                reason: p.failure_reason.clone().unwrap_or_default(),
            })
            .collect();
        self.failed_count = self.failures.len() as u32;
        self.updated_at = at;

        debug_assert!(self.processed_count + self.failed_count <= self.total_employees);
        self.total_employees
            .saturating_sub(self.processed_count + self.failed_count)
    }

    /// Marks the batch completed if nothing is pending. Returns whether it did.
    pub fn try_complete(&mut self, pending: u32, actor: &str, at: DateTime<Utc>) -> bool {
        if pending > 0 {
            return false;
        }
        if self.status != BatchStatus::Completed {
            self.status = BatchStatus::Completed;
            self.processed_by = Some(actor.to_string());
            self.processed_at = Some(at);
            self.updated_at = at;
        }
        true
    }
}
