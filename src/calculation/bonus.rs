//! Performance bonus policies.
//!
//! The bonus is a pluggable strategy. The default policy pays a flat
//! fraction of gross pay; a richer policy can look up performance scores.

use rust_decimal::Decimal;

use crate::error::PayrollResult;
use crate::models::AuditStep;

use super::checked_amount;

/// What a bonus policy sees when sizing a bonus.
#[derive(Debug, Clone)]
pub struct BonusContext<'a> {
    /// The employee being paid.
    pub employee_id: &'a str,
    /// Base salary for a full period.
    pub base_salary: Decimal,
    /// Unrounded gross pay.
    pub gross_pay: Decimal,
}

/// Strategy deciding the performance bonus for one paycheck.
pub trait BonusPolicy: Send + Sync {
    /// Short identifier recorded in the audit trace.
    fn name(&self) -> &str;

    /// The unrounded bonus amount.
    fn bonus(&self, context: &BonusContext<'_>) -> PayrollResult<Decimal>;
}

/// Pays `gross_pay * rate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatRateBonus {
    rate: Decimal,
}

impl FlatRateBonus {
    /// Creates a flat-rate policy.
    pub fn new(rate: Decimal) -> Self {
        Self { rate }
    }

    /// The configured rate.
    pub fn rate(&self) -> Decimal {
        self.rate
    }
}

impl BonusPolicy for FlatRateBonus {
    fn name(&self) -> &str {
        "flat_rate"
    }

    fn bonus(&self, context: &BonusContext<'_>) -> PayrollResult<Decimal> {
        checked_amount(
            context.gross_pay.checked_mul(self.rate),
            "base_salary",
            "performance bonus",
        )
    }
}

/// The bonus amount and its audit step.
#[derive(Debug, Clone)]
pub struct BonusResult {
    /// Unrounded bonus.
    pub performance_bonus: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Applies a bonus policy and records the decision.
pub fn calculate_bonus(
    policy: &dyn BonusPolicy,
    context: &BonusContext<'_>,
    step_number: u32,
) -> PayrollResult<BonusResult> {
    let performance_bonus = policy.bonus(context)?;

    let audit_step = AuditStep {
        step_number,
        rule_id: "performance_bonus".to_string(),
        rule_name: "Performance Bonus".to_string(),
        input: serde_json::json!({
            "policy": policy.name(),
            "employee_id": context.employee_id,
            "gross_pay": context.gross_pay.round_dp(4).normalize().to_string()
        }),
        output: serde_json::json!({
            "performance_bonus": performance_bonus.round_dp(4).normalize().to_string()
        }),
        reasoning: format!(
            "{} policy on gross ${} = ${}",
            policy.name(),
            context.gross_pay.round_dp(4).normalize(),
            performance_bonus.round_dp(4).normalize()
        ),
    };

    Ok(BonusResult {
        performance_bonus,
        audit_step,
    })
}
