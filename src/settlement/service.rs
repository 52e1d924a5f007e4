//! The payroll service: period registry, ad-hoc calculation, paycheck
//! lifecycle operations and reports.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calculation::{BonusPolicy, FlatRateBonus, SalaryBreakdown, SalaryInputs, calculate_salary};
use crate::config::{PayrollConfig, RateConfig};
use crate::error::{PayrollError, PayrollResult};
use crate::models::{
    AttendanceInput, CompensationInput, Paycheck, PaycheckStatus, PayrollBatch, PayrollPeriod,
};
use crate::sources::{AttendanceSource, CompensationSource, EmployeeDirectory, InMemoryDirectory};
use crate::store::{InMemoryRepository, PayrollRepository};

use super::report::{BatchReport, PeriodSummary};

/// Entry point for every payroll operation.
///
/// Cheap to clone; all state lives behind the repository and the
/// collaborator handles.
///
/// # Example
///
/// ```
/// use payroll_engine::config::PayrollConfig;
/// use payroll_engine::settlement::PayrollService;
/// use payroll_engine::sources::InMemoryDirectory;
///
/// let service = PayrollService::in_memory(PayrollConfig::default(), InMemoryDirectory::new());
/// assert_eq!(service.config().policy().standard_working_days, 22);
/// ```
#[derive(Clone)]
pub struct PayrollService {
    pub(super) repository: Arc<dyn PayrollRepository>,
    pub(super) attendance: Arc<dyn AttendanceSource>,
    pub(super) compensation: Arc<dyn CompensationSource>,
    pub(super) directory: Arc<dyn EmployeeDirectory>,
    pub(super) bonus_policy: Arc<dyn BonusPolicy>,
    pub(super) config: Arc<PayrollConfig>,
}

impl PayrollService {
    /// Creates a service over the given storage and collaborators.
    ///
    /// The bonus policy defaults to a flat rate taken from the configuration.
    pub fn new(
        config: PayrollConfig,
        repository: Arc<dyn PayrollRepository>,
        attendance: Arc<dyn AttendanceSource>,
        compensation: Arc<dyn CompensationSource>,
        directory: Arc<dyn EmployeeDirectory>,
    ) -> Self {
        let bonus_policy = Arc::new(FlatRateBonus::new(config.rates().performance_bonus_rate));
        Self {
            repository,
            attendance,
            compensation,
            directory,
            bonus_policy,
            config: Arc::new(config),
        }
    }

    /// Creates a service backed by an [`InMemoryRepository`] and a directory
    /// serving all three collaborator roles.
    pub fn in_memory(config: PayrollConfig, directory: InMemoryDirectory) -> Self {
        let directory = Arc::new(directory);
        Self::new(
            config,
            Arc::new(InMemoryRepository::new()),
            directory.clone(),
            directory.clone(),
            directory,
        )
    }

    /// Replaces the bonus policy.
    pub fn with_bonus_policy(mut self, bonus_policy: Arc<dyn BonusPolicy>) -> Self {
        self.bonus_policy = bonus_policy;
        self
    }

    /// The configuration the service was built with.
    pub fn config(&self) -> &PayrollConfig {
        &self.config
    }

    // Periods

    /// Registers a new period after validating its dates.
    pub async fn register_period(&self, period: PayrollPeriod) -> PayrollResult<PayrollPeriod> {
        period.validate()?;
        self.repository.insert_period(period.clone()).await?;

        info!(
            period_id = %period.id,
            start_date = %period.start_date,
            end_date = %period.end_date,
            payment_date = %period.payment_date,
            "Registered payroll period"
        );
        Ok(period)
    }

    /// Replaces an existing period's definition.
    ///
    /// Corrections are allowed even after a batch was opened; that case is
    /// logged as a warning since settled paychecks keep their figures.
    pub async fn correct_period(&self, period: PayrollPeriod) -> PayrollResult<PayrollPeriod> {
        period.validate()?;
        self.repository.save_period(period.clone()).await?;

        match self.repository.find_batch_for_period(&period.id).await? {
            Some(batch) => warn!(
                period_id = %period.id,
                batch_id = %batch.id,
                batch_status = ?batch.status,
                "Corrected a payroll period that already has a batch"
            ),
            None => info!(period_id = %period.id, "Corrected payroll period"),
        }
        Ok(period)
    }

    /// Fetches a period by id.
    pub async fn get_period(&self, period_id: &str) -> PayrollResult<PayrollPeriod> {
        self.repository
            .get_period(period_id)
            .await?
            .ok_or_else(|| PayrollError::not_found("payroll period", period_id))
    }

    /// Every registered period, ordered by start date.
    pub async fn list_periods(&self) -> PayrollResult<Vec<PayrollPeriod>> {
        self.repository.list_periods().await
    }

    /// The active period containing `date`, preferring the latest payment date.
    pub async fn current_period(&self, date: NaiveDate) -> PayrollResult<PayrollPeriod> {
        self.repository
            .list_periods()
            .await?
            .into_iter()
            .filter(|p| p.is_active && p.contains_date(date))
            .max_by_key(|p| p.payment_date)
            .ok_or_else(|| PayrollError::not_found("active payroll period", format!("date {}", date)))
    }

    /// Fetches a period and rejects it if it is inactive.
    pub(super) async fn active_period(&self, period_id: &str) -> PayrollResult<PayrollPeriod> {
        let period = self.get_period(period_id).await?;
        if !period.is_active {
            return Err(PayrollError::invalid_input(
                "period_id",
                format!("payroll period {} is not active", period_id),
            ));
        }
        Ok(period)
    }

    // Paychecks

    /// Fetches a paycheck by id.
    pub async fn get_paycheck(&self, paycheck_id: Uuid) -> PayrollResult<Paycheck> {
        self.repository
            .get_paycheck(paycheck_id)
            .await?
            .ok_or_else(|| PayrollError::not_found("paycheck", paycheck_id))
    }

    /// A period's paychecks, ordered by employee id.
    pub async fn list_paychecks(&self, period_id: &str) -> PayrollResult<Vec<Paycheck>> {
        self.repository.list_paychecks(period_id).await
    }

    /// Paychecks matching every filter that is set, across all periods.
    pub async fn search_paychecks(
        &self,
        employee_id: Option<&str>,
        status: Option<PaycheckStatus>,
        period_id: Option<&str>,
    ) -> PayrollResult<Vec<Paycheck>> {
        let paychecks = self
            .repository
            .list_paychecks_filtered(employee_id, status, period_id)
            .await?;
        debug!(
            employee_id,
            status = ?status,
            period_id,
            matched = paychecks.len(),
            "Searched paychecks"
        );
        Ok(paychecks)
    }

    /// Calculates one employee's paycheck for a period outside any batch.
    ///
    /// Creates the draft if none exists. Input errors are reported before
    /// anything is stored; a paycheck that already left `draft` is rejected
    /// with `RecalculationRejected`.
    pub async fn calculate(&self, employee_id: &str, period_id: &str) -> PayrollResult<Paycheck> {
        let started = Instant::now();
        let period = self.active_period(period_id).await?;
        let context = self.calculation_context(employee_id, &period).await?;
        context.breakdown(Decimal::ZERO)?;

        let seed_base = context.compensation.base_salary.unwrap_or(Decimal::ZERO);
        let draft = Paycheck::draft(
            employee_id,
            period_id,
            seed_base,
            self.config.policy().standard_working_days,
            Utc::now(),
        );
        let (paycheck, created) = self.repository.insert_paycheck_if_absent(draft).await?;

        let calculated = self
            .repository
            .update_paycheck(
                paycheck.id,
                Box::new(move |p| context.apply(p, Utc::now())),
            )
            .await?;

        info!(
            paycheck_id = %calculated.id,
            employee_id,
            period_id,
            created,
            gross_pay = %calculated.figures.gross_pay,
            net_pay = %calculated.figures.net_pay,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Calculated paycheck"
        );
        Ok(calculated)
    }

    /// Applies a requested lifecycle transition.
    pub async fn transition(
        &self,
        paycheck_id: Uuid,
        target: PaycheckStatus,
        actor: &str,
    ) -> PayrollResult<Paycheck> {
        let allow_void_paid = self.config.policy().allow_void_paid;
        let actor_name = actor.to_string();

        let result = self
            .repository
            .update_paycheck(
                paycheck_id,
                Box::new(move |p| p.transition(target, &actor_name, allow_void_paid, Utc::now())),
            )
            .await;

        let paycheck = match result {
            Ok(paycheck) => paycheck,
            Err(error) => {
                warn!(%paycheck_id, requested = %target, error = %error, "Rejected paycheck transition");
                return Err(error);
            }
        };

        info!(
            %paycheck_id,
            employee_id = %paycheck.employee_id,
            status = %paycheck.status,
            actor,
            "Paycheck transitioned"
        );
        self.refresh_batch_totals(&paycheck.period_id).await?;
        Ok(paycheck)
    }

    /// Sets the ad-hoc deduction amount on a draft paycheck.
    ///
    /// A paycheck that was already calculated is recalculated in the same
    /// atomic update so its figures never disagree with the new amount.
    pub async fn set_other_deductions(
        &self,
        paycheck_id: Uuid,
        amount: Decimal,
        note: Option<String>,
    ) -> PayrollResult<Paycheck> {
        let paycheck = self.get_paycheck(paycheck_id).await?;
        let context = if paycheck.is_calculated() && paycheck.status == PaycheckStatus::Draft {
            let period = self.get_period(&paycheck.period_id).await?;
            Some(self.calculation_context(&paycheck.employee_id, &period).await?)
        } else {
            None
        };

        let updated = self
            .repository
            .update_paycheck(
                paycheck_id,
                Box::new(move |p| {
                    let at = Utc::now();
                    p.set_adhoc_deductions(amount, at)?;
                    if let Some(context) = context {
                        if p.is_calculated() {
                            context.apply(p, at)?;
                        }
                    }
                    if let Some(note) = note {
                        p.annotate(&note, at);
                    }
                    Ok(())
                }),
            )
            .await?;

        info!(
            %paycheck_id,
            other_deductions = %updated.adhoc_deductions,
            net_pay = %updated.figures.net_pay,
            "Updated ad-hoc deductions"
        );
        Ok(updated)
    }

    /// Appends a note to a paycheck in any state.
    pub async fn annotate(&self, paycheck_id: Uuid, note: &str) -> PayrollResult<Paycheck> {
        let note = note.trim().to_string();
        if note.is_empty() {
            return Err(PayrollError::invalid_input("note", "must not be empty"));
        }

        let updated = self
            .repository
            .update_paycheck(
                paycheck_id,
                Box::new(move |p| {
                    p.annotate(&note, Utc::now());
                    Ok(())
                }),
            )
            .await?;

        debug!(%paycheck_id, "Annotated paycheck");
        Ok(updated)
    }

    // Reports

    /// Fetches a batch by id.
    pub async fn get_batch(&self, batch_id: Uuid) -> PayrollResult<PayrollBatch> {
        self.repository
            .get_batch(batch_id)
            .await?
            .ok_or_else(|| PayrollError::not_found("payroll batch", batch_id))
    }

    /// Aggregates a period's paychecks.
    pub async fn period_summary(&self, period_id: &str) -> PayrollResult<PeriodSummary> {
        self.get_period(period_id).await?;
        let paychecks = self.repository.list_paychecks(period_id).await?;
        Ok(PeriodSummary::from_paychecks(period_id, &paychecks))
    }

    /// A batch reconciled against its paychecks, with the period summary.
    pub async fn batch_report(&self, batch_id: Uuid) -> PayrollResult<BatchReport> {
        let mut batch = self.get_batch(batch_id).await?;
        let paychecks = self.repository.list_paychecks(&batch.period_id).await?;
        let pending = batch.reconcile(&paychecks, Utc::now());

        Ok(BatchReport {
            summary: PeriodSummary::from_paychecks(&batch.period_id, &paychecks),
            failures: batch.failures.clone(),
            pending,
            batch,
        })
    }

    // Internals shared with the batch runner

    /// Gathers everything needed to calculate one employee's paycheck.
    pub(super) async fn calculation_context(
        &self,
        employee_id: &str,
        period: &PayrollPeriod,
    ) -> PayrollResult<CalculationContext> {
        let compensation = self
            .compensation
            .get_compensation(employee_id)
            .await?
            .ok_or_else(|| PayrollError::not_found("compensation profile", employee_id))?;
        let attendance = self.attendance.get_attendance(employee_id, period).await?;

        Ok(CalculationContext {
            employee_id: employee_id.to_string(),
            compensation,
            attendance,
            rates: self.config.rates().clone(),
            bonus_policy: self.bonus_policy.clone(),
            default_working_days: self.config.policy().standard_working_days,
            as_of: period.end_date,
        })
    }

    /// Recomputes the aggregates of the period's batch, if there is one.
    pub(super) async fn refresh_batch_totals(&self, period_id: &str) -> PayrollResult<()> {
        let Some(batch) = self.repository.find_batch_for_period(period_id).await? else {
            return Ok(());
        };
        let paychecks = self.repository.list_paychecks(period_id).await?;

        let batch = self
            .repository
            .update_batch(
                batch.id,
                Box::new(move |b| {
                    b.reconcile(&paychecks, Utc::now());
                    Ok(())
                }),
            )
            .await?;

        debug!(
            batch_id = %batch.id,
            processed_count = batch.processed_count,
            total_amount = %batch.total_amount,
            "Refreshed batch totals"
        );
        Ok(())
    }
}

/// Inputs captured for one calculation, owned so they can move into an
/// atomic repository update.
pub(super) struct CalculationContext {
    employee_id: String,
    compensation: CompensationInput,
    attendance: Option<AttendanceInput>,
    rates: RateConfig,
    bonus_policy: Arc<dyn BonusPolicy>,
    default_working_days: u32,
    as_of: NaiveDate,
}

impl CalculationContext {
    fn breakdown(&self, adhoc_deductions: Decimal) -> PayrollResult<SalaryBreakdown> {
        calculate_salary(
            &SalaryInputs {
                employee_id: &self.employee_id,
                compensation: &self.compensation,
                attendance: self.attendance.as_ref(),
                default_working_days: self.default_working_days,
                adhoc_deductions,
                as_of: self.as_of,
            },
            &self.rates,
            self.bonus_policy.as_ref(),
        )
    }

    /// Calculates and stores the figures on a draft paycheck.
    pub(super) fn apply(&self, paycheck: &mut Paycheck, at: DateTime<Utc>) -> PayrollResult<()> {
        let breakdown = self.breakdown(paycheck.adhoc_deductions)?;
        paycheck.apply_calculation(breakdown.settle(), breakdown.audit_trace, at)
    }
}
