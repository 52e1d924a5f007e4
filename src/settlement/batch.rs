//! Batch opening and the concurrent settlement run.
//!
//! A run fans out one task per draft paycheck, bounded by a semaphore sized
//! to the store's safe write concurrency. Outcomes are folded into the
//! batch one at a time by the coordinating task, and the aggregates are
//! reconciled from the paychecks at the start and end of every run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{PayrollError, PayrollResult};
use crate::models::{
    BatchFailure, Paycheck, PaycheckStatus, PayrollBatch, PayrollPeriod, SettlementOutcome,
};

use super::PayrollService;

/// Cooperative interrupt for a batch run.
///
/// Workers check the signal after acquiring their permit; once it is set,
/// no further employee is started. Employees already in flight finish.
#[derive(Debug, Clone, Default)]
pub struct RunSignal {
    interrupted: Arc<AtomicBool>,
}

impl RunSignal {
    /// Creates a signal that is not yet interrupted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops the run from starting further employees.
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    /// True once any clone of this signal has been interrupted.
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }
}

/// Result of [`PayrollService::open_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOpening {
    /// A new batch was created.
    Created(PayrollBatch),
    /// The period already had a batch; it is returned unchanged.
    Existing(PayrollBatch),
}

impl BatchOpening {
    /// The opened batch, new or existing.
    pub fn batch(&self) -> &PayrollBatch {
        match self {
            BatchOpening::Created(batch) | BatchOpening::Existing(batch) => batch,
        }
    }

    /// Consumes the opening and returns the batch.
    pub fn into_batch(self) -> PayrollBatch {
        match self {
            BatchOpening::Created(batch) | BatchOpening::Existing(batch) => batch,
        }
    }

    /// True when this call created the batch.
    pub fn was_created(&self) -> bool {
        matches!(self, BatchOpening::Created(_))
    }
}

enum WorkerReport {
    Finished(SettlementOutcome),
    Interrupted,
    Aborted {
        paycheck_id: Uuid,
        error: PayrollError,
    },
}

impl PayrollService {
    /// Opens the batch for a period, seeding one draft paycheck per active
    /// employee.
    ///
    /// Opening is idempotent: if the period already has a batch it is
    /// returned as [`BatchOpening::Existing`] and nothing is seeded. A
    /// period with no active employees yields a batch that is already
    /// completed.
    pub async fn open_batch(&self, period_id: &str, created_by: &str) -> PayrollResult<BatchOpening> {
        let started = Instant::now();
        let period = self.active_period(period_id).await?;

        if let Some(existing) = self.repository.find_batch_for_period(period_id).await? {
            info!(batch_id = %existing.id, period_id, "Batch already open for period");
            return Ok(BatchOpening::Existing(existing));
        }

        let mut employee_ids = self.directory.list_active_employees().await?;
        employee_ids.sort();
        employee_ids.dedup();

        let now = Utc::now();
        let mut seeded = 0u32;
        for employee_id in &employee_ids {
            let (_, created) = self.seed_paycheck(employee_id, &period, now).await?;
            if created {
                seeded += 1;
            }
        }

        let mut batch = PayrollBatch::open(period_id, employee_ids, created_by, now);
        if batch.total_employees == 0 {
            batch.try_complete(0, created_by, now);
        }

        match self.repository.insert_batch(batch.clone()).await {
            Ok(()) => {
                info!(
                    batch_id = %batch.id,
                    period_id,
                    total_employees = batch.total_employees,
                    seeded,
                    status = ?batch.status,
                    elapsed_us = started.elapsed().as_micros() as u64,
                    "Opened payroll batch"
                );
                Ok(BatchOpening::Created(batch))
            }
            Err(PayrollError::DuplicatePeriod { .. }) => {
                let existing = self
                    .repository
                    .find_batch_for_period(period_id)
                    .await?
                    .ok_or_else(|| PayrollError::not_found("payroll batch for period", period_id))?;
                info!(batch_id = %existing.id, period_id, "Lost race to open batch, using existing");
                Ok(BatchOpening::Existing(existing))
            }
            Err(e) => Err(e),
        }
    }

    /// Runs a batch to completion.
    pub async fn run_batch(&self, batch_id: Uuid, processed_by: &str) -> PayrollResult<PayrollBatch> {
        self.run_batch_with_signal(batch_id, processed_by, &RunSignal::new())
            .await
    }

    /// Runs a batch, stopping early if `signal` is interrupted.
    ///
    /// Safe to call again: paychecks that already left `draft` are skipped,
    /// so an interrupted run resumes where it stopped. The batch completes
    /// only once no in-scope paycheck is still a draft.
    pub async fn run_batch_with_signal(
        &self,
        batch_id: Uuid,
        processed_by: &str,
        signal: &RunSignal,
    ) -> PayrollResult<PayrollBatch> {
        let started = Instant::now();
        let batch = self.get_batch(batch_id).await?;
        let period = Arc::new(self.get_period(&batch.period_id).await?);

        let paychecks = self.scoped_paychecks(&batch, &period).await?;
        let drafts: Vec<Uuid> = paychecks
            .iter()
            .filter(|p| p.status == PaycheckStatus::Draft)
            .map(|p| p.id)
            .collect();

        let batch = self
            .repository
            .update_batch(
                batch_id,
                Box::new(move |b| {
                    let now = Utc::now();
                    b.reconcile(&paychecks, now);
                    b.begin_processing(now);
                    Ok(())
                }),
            )
            .await?;

        info!(
            %batch_id,
            period_id = %batch.period_id,
            total_employees = batch.total_employees,
            already_processed = batch.processed_count,
            already_failed = batch.failed_count,
            to_settle = drafts.len(),
            "Starting batch run"
        );

        let limit = self.worker_limit();
        let semaphore = Arc::new(Semaphore::new(limit));
        let mut workers = JoinSet::new();

        for paycheck_id in drafts {
            let service = self.clone();
            let semaphore = semaphore.clone();
            let signal = signal.clone();
            let period = period.clone();
            let actor = processed_by.to_string();

            workers.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return WorkerReport::Interrupted;
                };
                if signal.is_interrupted() {
                    return WorkerReport::Interrupted;
                }
                match service.settle_paycheck(paycheck_id, &period, &actor).await {
                    Ok(outcome) => WorkerReport::Finished(outcome),
                    Err(error) => WorkerReport::Aborted { paycheck_id, error },
                }
            });
        }

        let mut not_started = 0u32;
        let mut first_error: Option<PayrollError> = None;

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(WorkerReport::Finished(SettlementOutcome::Skipped { employee_id, status })) => {
                    debug!(%batch_id, employee_id = %employee_id, status = %status, "Paycheck already settled elsewhere");
                }
                Ok(WorkerReport::Finished(outcome)) => {
                    self.repository
                        .update_batch(
                            batch_id,
                            Box::new(move |b| {
                                b.record_outcome(&outcome, Utc::now());
                                Ok(())
                            }),
                        )
                        .await?;
                }
                Ok(WorkerReport::Interrupted) => not_started += 1,
                Ok(WorkerReport::Aborted { paycheck_id, error }) => {
                    error!(%batch_id, %paycheck_id, error = %error, "Batch worker aborted");
                    first_error.get_or_insert(error);
                }
                Err(join_error) => {
                    error!(%batch_id, error = %join_error, "Batch worker panicked");
                    first_error.get_or_insert(PayrollError::WorkerFailed {
                        message: join_error.to_string(),
                    });
                }
            }
        }

        let paychecks = self.repository.list_paychecks(&period.id).await?;
        let actor = processed_by.to_string();
        let batch = self
            .repository
            .update_batch(
                batch_id,
                Box::new(move |b| {
                    let now = Utc::now();
                    let pending = b.reconcile(&paychecks, now);
                    b.try_complete(pending, &actor, now);
                    Ok(())
                }),
            )
            .await?;

        if not_started > 0 {
            warn!(%batch_id, not_started, "Batch run interrupted");
        }
        info!(
            %batch_id,
            status = ?batch.status,
            processed_count = batch.processed_count,
            failed_count = batch.failed_count,
            total_amount = %batch.total_amount,
            workers = limit,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Finished batch run"
        );

        match first_error {
            Some(error) => Err(error),
            None => Ok(batch),
        }
    }

    fn worker_limit(&self) -> usize {
        self.config
            .policy()
            .worker_concurrency
            .min(self.repository.write_concurrency())
            .max(1)
    }

    /// Paychecks of the batch's employees, seeding any that are missing.
    async fn scoped_paychecks(
        &self,
        batch: &PayrollBatch,
        period: &PayrollPeriod,
    ) -> PayrollResult<Vec<Paycheck>> {
        let mut paychecks: Vec<Paycheck> = self
            .repository
            .list_paychecks(&batch.period_id)
            .await?
            .into_iter()
            .filter(|p| batch.in_scope(&p.employee_id))
            .collect();

        let missing: Vec<&String> = batch
            .employee_ids
            .iter()
            .filter(|id| !paychecks.iter().any(|p| &p.employee_id == *id))
            .collect();
        for employee_id in missing {
            warn!(batch_id = %batch.id, employee_id = %employee_id, "Seeding missing paycheck");
            let (paycheck, _) = self.seed_paycheck(employee_id, period, Utc::now()).await?;
            paychecks.push(paycheck);
        }

        Ok(paychecks)
    }

    /// Inserts a draft paycheck for the employee unless one exists.
    ///
    /// A profile that cannot be read seeds a zero base salary; the run then
    /// records the failure on the paycheck.
    async fn seed_paycheck(
        &self,
        employee_id: &str,
        period: &PayrollPeriod,
        now: DateTime<Utc>,
    ) -> PayrollResult<(Paycheck, bool)> {
        let base_salary = match self.compensation.get_compensation(employee_id).await {
            Ok(profile) => profile.and_then(|c| c.base_salary).unwrap_or(Decimal::ZERO),
            Err(e) if e.is_record_failure() => {
                warn!(employee_id, error = %e, "Compensation unavailable while seeding paycheck");
                Decimal::ZERO
            }
            Err(e) => return Err(e),
        };

        let draft = Paycheck::draft(
            employee_id,
            &period.id,
            base_salary,
            self.config.policy().standard_working_days,
            now,
        );
        self.repository.insert_paycheck_if_absent(draft).await
    }

    /// Calculates and processes one draft paycheck as a single atomic update.
    ///
    /// Per-record errors mark the paycheck failed. A paycheck another writer
    /// already moved on is skipped.
    async fn settle_paycheck(
        &self,
        paycheck_id: Uuid,
        period: &PayrollPeriod,
        actor: &str,
    ) -> PayrollResult<SettlementOutcome> {
        let paycheck = self.get_paycheck(paycheck_id).await?;
        if paycheck.status != PaycheckStatus::Draft {
            return Ok(SettlementOutcome::Skipped {
                employee_id: paycheck.employee_id,
                status: paycheck.status,
            });
        }

        let context = match self.calculation_context(&paycheck.employee_id, period).await {
            Ok(context) => context,
            Err(e) if e.is_record_failure() => return self.fail_paycheck(&paycheck, e).await,
            Err(e) => return Err(e),
        };

        let actor = actor.to_string();
        let result = self
            .repository
            .update_paycheck(
                paycheck_id,
                Box::new(move |p| {
                    let at = Utc::now();
                    context.apply(p, at)?;
                    p.process(&actor, at)
                }),
            )
            .await;

        match result {
            Ok(settled) => {
                debug!(
                    %paycheck_id,
                    employee_id = %settled.employee_id,
                    net_pay = %settled.figures.net_pay,
                    "Settled paycheck"
                );
                Ok(SettlementOutcome::Settled {
                    employee_id: settled.employee_id,
                    net_pay: settled.figures.net_pay,
                })
            }
            Err(e) if e.is_stale_state() => self.skipped(paycheck_id).await,
            Err(e) if e.is_record_failure() => self.fail_paycheck(&paycheck, e).await,
            Err(e) => Err(e),
        }
    }

    async fn fail_paycheck(
        &self,
        paycheck: &Paycheck,
        cause: PayrollError,
    ) -> PayrollResult<SettlementOutcome> {
        let reason = cause.to_string();
        warn!(
            paycheck_id = %paycheck.id,
            employee_id = %paycheck.employee_id,
            reason = %reason,
            "Paycheck settlement failed"
        );

        let recorded = reason.clone();
        let result = self
            .repository
            .update_paycheck(
                paycheck.id,
                Box::new(move |p| p.mark_failed(recorded, Utc::now())),
            )
            .await;

        match result {
            Ok(_) => Ok(SettlementOutcome::Failed(BatchFailure {
                employee_id: paycheck.employee_id.clone(),
                paycheck_id: paycheck.id,
                reason,
            })),
            Err(e) if e.is_stale_state() => self.skipped(paycheck.id).await,
            Err(e) => Err(e),
        }
    }

    async fn skipped(&self, paycheck_id: Uuid) -> PayrollResult<SettlementOutcome> {
        let current = self.get_paycheck(paycheck_id).await?;
        Ok(SettlementOutcome::Skipped {
            employee_id: current.employee_id,
            status: current.status,
        })
    }
}
