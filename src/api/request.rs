//! Request types for the payroll HTTP API.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{PayFrequency, PaycheckStatus, PayrollPeriod};

fn default_actor() -> String {
    "system".to_string()
}

fn default_active() -> bool {
    true
}

/// Request body for `POST /periods`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodRequest {
    /// Unique period identifier, e.g. `2026-01`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Pay frequency.
    pub frequency: PayFrequency,
    /// First day of the period.
    pub start_date: NaiveDate,
    /// Last day of the period, inclusive.
    pub end_date: NaiveDate,
    /// Day the period is paid.
    pub payment_date: NaiveDate,
    /// Defaults to `true`.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl From<PeriodRequest> for PayrollPeriod {
    fn from(req: PeriodRequest) -> Self {
        PayrollPeriod {
            id: req.id,
            name: req.name,
            frequency: req.frequency,
            start_date: req.start_date,
            end_date: req.end_date,
            payment_date: req.payment_date,
            is_active: req.is_active,
        }
    }
}

/// Query string for `GET /periods/current`. Without a date, today (UTC) is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentPeriodQuery {
    /// Date the period must contain.
    pub date: Option<NaiveDate>,
}

/// Query string for `GET /paychecks`. Unset filters match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaycheckQuery {
    /// Only this employee's paychecks.
    pub employee_id: Option<String>,
    /// Only paychecks in this status.
    pub status: Option<PaycheckStatus>,
    /// Only paychecks of this period.
    pub period_id: Option<String>,
}

/// Request body for `POST /batches`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenBatchRequest {
    /// Period to open the batch for.
    pub period_id: String,
    /// Who opened the batch; defaults to `system`.
    #[serde(default = "default_actor")]
    pub created_by: String,
}

/// Request body for `POST /batches/:id/run`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunBatchRequest {
    /// Who ran the batch; defaults to `system`.
    #[serde(default = "default_actor")]
    pub processed_by: String,
}

/// Request body for `POST /paychecks/calculate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateRequest {
    /// Employee to calculate.
    pub employee_id: String,
    /// Period to calculate for.
    pub period_id: String,
}

/// Request body for `POST /paychecks/:id/transition`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    /// Target status: `processed`, `paid` or `voided`.
    pub status: PaycheckStatus,
    /// Who requested the transition; defaults to `system`.
    #[serde(default = "default_actor")]
    pub actor: String,
}

/// Request body for `POST /paychecks/:id/other-deductions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtherDeductionsRequest {
    /// New ad-hoc deduction amount; must not be negative.
    pub amount: Decimal,
    /// Optional note appended to the paycheck.
    #[serde(default)]
    pub note: Option<String>,
}

/// Request body for `POST /paychecks/:id/notes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteRequest {
    /// Text to append.
    pub note: String,
}
