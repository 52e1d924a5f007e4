//! Period and batch reporting.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{BatchFailure, Paycheck, PaycheckStatus, PayrollBatch};

/// Aggregate figures over one period's paychecks.
///
/// Monetary totals cover `processed` and `paid` paychecks only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSummary {
    /// The summarized period.
    pub period_id: String,
    /// Paychecks of any status.
    pub paycheck_count: u32,
    /// Paychecks still in `draft`.
    pub draft_count: u32,
    /// Paychecks in `processed`.
    pub processed_count: u32,
    /// Paychecks in `paid`.
    pub paid_count: u32,
    /// Paychecks in `voided`.
    pub voided_count: u32,
    /// Paychecks in `failed`.
    pub failed_count: u32,
    /// Sum of gross pay.
    pub total_gross: Decimal,
    /// Sum of income tax.
    pub total_income_tax: Decimal,
    /// Sum of total deductions.
    pub total_deductions: Decimal,
    /// Sum of performance bonuses.
    pub total_bonus: Decimal,
    /// Sum of net pay.
    pub total_net: Decimal,
}

impl PeriodSummary {
    /// Builds the summary from a period's paychecks.
    pub fn from_paychecks(period_id: &str, paychecks: &[Paycheck]) -> Self {
        let mut summary = PeriodSummary {
            period_id: period_id.to_string(),
            ..Default::default()
        };

        for paycheck in paychecks.iter().filter(|p| p.period_id == period_id) {
            summary.paycheck_count += 1;
            match paycheck.status {
                PaycheckStatus::Draft => summary.draft_count += 1,
                PaycheckStatus::Processed => summary.processed_count += 1,
                PaycheckStatus::Paid => summary.paid_count += 1,
                PaycheckStatus::Voided => summary.voided_count += 1,
                PaycheckStatus::Failed => summary.failed_count += 1,
            }

            if paycheck.status.counts_toward_totals() {
                let figures = &paycheck.figures;
                // Totals saturate rather than overflow at the decimal range
                summary.total_gross = summary.total_gross.saturating_add(figures.gross_pay);
                summary.total_income_tax =
                    summary.total_income_tax.saturating_add(figures.income_tax);
                summary.total_deductions =
                    summary.total_deductions.saturating_add(figures.total_deductions);
                summary.total_bonus = summary.total_bonus.saturating_add(figures.performance_bonus);
                summary.total_net = summary.total_net.saturating_add(figures.net_pay);
            }
        }

        summary
    }
}

/// A batch with its period summary and per-employee failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// The batch with reconciled counters.
    pub batch: PayrollBatch,
    /// Summary of the batch's period.
    pub summary: PeriodSummary,
    /// Employees whose paycheck failed, with the reason.
    pub failures: Vec<BatchFailure>,
    /// In-scope employees whose paycheck is still a draft.
    pub pending: u32,
}
