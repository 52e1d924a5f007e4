//! Deduction calculation.
//!
//! Statutory deductions are fixed fractions of gross pay taken from the rate
//! configuration. Profile deductions active on the reference date and the
//! ad-hoc amount entered on the paycheck make up `other_deductions`.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::RateConfig;
use crate::error::PayrollResult;
use crate::models::{AuditStep, DeductionDefinition};

use super::checked_amount;

/// Unrounded deduction components and their audit step.
#[derive(Debug, Clone)]
pub struct DeductionsResult {
    /// Income tax withheld.
    pub income_tax: Decimal,
    /// Health-insurance contribution.
    pub health_insurance: Decimal,
    /// Social-security contribution.
    pub social_security: Decimal,
    /// Active profile deductions plus the ad-hoc amount.
    pub other_deductions: Decimal,
    /// Names of the profile deductions that applied.
    pub applied_deductions: Vec<String>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates every deduction from the unrounded gross pay.
///
/// Fails with `InvalidInput` when a component leaves the decimal range.
///
/// # Arguments
///
/// * `gross_pay` - Unrounded gross pay
/// * `rates` - The configured statutory rates
/// * `profile_deductions` - Recurring deductions from the compensation profile
/// * `adhoc_deductions` - Amount entered directly on the paycheck
/// * `as_of` - Date used to decide which profile deductions are active
/// * `step_number` - The step number for audit trail sequencing
pub fn calculate_deductions(
    gross_pay: Decimal,
    rates: &RateConfig,
    profile_deductions: &[DeductionDefinition],
    adhoc_deductions: Decimal,
    as_of: NaiveDate,
    step_number: u32,
) -> PayrollResult<DeductionsResult> {
    let income_tax = checked_amount(
        gross_pay.checked_mul(rates.income_tax_rate),
        "base_salary",
        "income tax",
    )?;
    let health_insurance = checked_amount(
        gross_pay.checked_mul(rates.health_insurance_rate),
        "base_salary",
        "health insurance",
    )?;
    let social_security = checked_amount(
        gross_pay.checked_mul(rates.social_security_rate),
        "base_salary",
        "social security",
    )?;

    let active: Vec<&DeductionDefinition> = profile_deductions
        .iter()
        .filter(|d| d.is_active_on(as_of))
        .collect();
    let mut other_deductions = adhoc_deductions;
    for deduction in &active {
        let amount = checked_amount(
            deduction.amount_for(gross_pay),
            "active_deductions",
            &format!("deduction '{}'", deduction.name),
        )?;
        other_deductions = checked_amount(
            other_deductions.checked_add(amount),
            "other_deductions",
            "other deductions total",
        )?;
    }
    let applied_deductions: Vec<String> = active.iter().map(|d| d.name.clone()).collect();

    let audit_step = AuditStep {
        step_number,
        rule_id: "deductions".to_string(),
        rule_name: "Deductions".to_string(),
        input: serde_json::json!({
            "gross_pay": gross_pay.round_dp(4).normalize().to_string(),
            "income_tax_rate": rates.income_tax_rate.normalize().to_string(),
            "health_insurance_rate": rates.health_insurance_rate.normalize().to_string(),
            "social_security_rate": rates.social_security_rate.normalize().to_string(),
            "adhoc_deductions": adhoc_deductions.normalize().to_string(),
            "as_of": as_of.to_string()
        }),
        output: serde_json::json!({
            "income_tax": income_tax.round_dp(4).normalize().to_string(),
            "health_insurance": health_insurance.round_dp(4).normalize().to_string(),
            "social_security": social_security.round_dp(4).normalize().to_string(),
            "other_deductions": other_deductions.round_dp(4).normalize().to_string(),
            "applied_deductions": applied_deductions
        }),
        reasoning: format!(
            "Statutory rates {} / {} / {} on gross; {} profile deduction(s) active on {} plus ${} ad-hoc",
            rates.income_tax_rate.normalize(),
            rates.health_insurance_rate.normalize(),
            rates.social_security_rate.normalize(),
            applied_deductions.len(),
            as_of,
            adhoc_deductions.normalize()
        ),
    };

    Ok(DeductionsResult {
        income_tax,
        health_insurance,
        social_security,
        other_deductions,
        applied_deductions,
        audit_step,
    })
}
