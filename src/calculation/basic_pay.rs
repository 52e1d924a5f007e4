//! Basic pay proration.

use rust_decimal::Decimal;

use crate::error::PayrollResult;
use crate::models::AuditStep;

use super::checked_amount;

/// The prorated basic pay and its audit step.
#[derive(Debug, Clone)]
pub struct BasicPayResult {
    /// Unrounded basic pay.
    pub basic_salary: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Prorates the base salary by the ratio of worked to contracted days.
///
/// The product is taken before the division, so full attendance yields the
/// base salary exactly. With zero contracted days the base salary is paid
/// unprorated. A base salary so large that the product leaves the decimal
/// range is rejected as invalid input.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::prorate_basic_pay;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let base = Decimal::from_str("3000.00").unwrap();
/// let full = prorate_basic_pay(base, 22, Decimal::from(22), 2).unwrap();
/// assert_eq!(full.basic_salary, base);
/// ```
pub fn prorate_basic_pay(
    base_salary: Decimal,
    contracted_working_days: u32,
    actual_working_days: Decimal,
    step_number: u32,
) -> PayrollResult<BasicPayResult> {
    if contracted_working_days == 0 {
        let audit_step = AuditStep {
            step_number,
            rule_id: "basic_pay".to_string(),
            rule_name: "Basic Pay Proration".to_string(),
            input: serde_json::json!({
                "base_salary": base_salary.normalize().to_string(),
                "contracted_working_days": 0,
                "actual_working_days": actual_working_days.normalize().to_string()
            }),
            output: serde_json::json!({
                "basic_salary": base_salary.normalize().to_string(),
                "prorated": false
            }),
            reasoning: "No contracted working days - full base salary paid".to_string(),
        };

        return Ok(BasicPayResult {
            basic_salary: base_salary,
            audit_step,
        });
    }

    let contracted = Decimal::from(contracted_working_days);
    let basic_salary = checked_amount(
        base_salary
            .checked_mul(actual_working_days)
            .and_then(|product| product.checked_div(contracted)),
        "base_salary",
        "prorated basic pay",
    )?;

    let audit_step = AuditStep {
        step_number,
        rule_id: "basic_pay".to_string(),
        rule_name: "Basic Pay Proration".to_string(),
        input: serde_json::json!({
            "base_salary": base_salary.normalize().to_string(),
            "contracted_working_days": contracted_working_days,
            "actual_working_days": actual_working_days.normalize().to_string()
        }),
        output: serde_json::json!({
            "basic_salary": basic_salary.normalize().to_string(),
            "prorated": true
        }),
        reasoning: format!(
            "${} / {} days x {} days = ${}",
            base_salary.normalize(),
            contracted_working_days,
            actual_working_days.normalize(),
            basic_salary.round_dp(4).normalize()
        ),
    };

    Ok(BasicPayResult {
        basic_salary,
        audit_step,
    })
}
