//! The salary calculator.
//!
//! Combines worked-day resolution, basic pay proration, allowances,
//! deductions and the bonus policy into one itemized breakdown. All steps
//! work on unrounded decimals; [`SalaryBreakdown::settle`] rounds each
//! persisted figure once and derives the totals from the rounded parts.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::RateConfig;
use crate::error::{PayrollError, PayrollResult};
use crate::models::{AttendanceInput, AuditStep, CompensationInput, PaycheckFigures};

use super::{
    BonusContext, BonusPolicy, calculate_bonus, calculate_deductions, checked_amount,
    prorate_basic_pay, resolve_worked_days, round_currency,
};

/// Everything the calculator needs for one employee and one period.
#[derive(Debug, Clone)]
pub struct SalaryInputs<'a> {
    /// The employee being paid.
    pub employee_id: &'a str,
    /// The employee's compensation profile.
    pub compensation: &'a CompensationInput,
    /// Attendance for the period, if the source had a record.
    pub attendance: Option<&'a AttendanceInput>,
    /// Contracted days used when the profile does not specify them.
    pub default_working_days: u32,
    /// Deductions entered directly on the paycheck.
    pub adhoc_deductions: Decimal,
    /// Reference date for profile deduction validity (the period end date).
    pub as_of: NaiveDate,
}

/// Unrounded salary components with the audit trace that produced them.
#[derive(Debug, Clone)]
pub struct SalaryBreakdown {
    /// Base salary for a full period.
    pub base_salary: Decimal,
    /// Contracted working days used for proration.
    pub contracted_working_days: u32,
    /// Days worked.
    pub actual_working_days: Decimal,
    /// True when no attendance record existed.
    pub assumed_full_attendance: bool,
    /// Prorated basic pay.
    pub basic_salary: Decimal,
    /// Fixed allowances.
    pub allowances: Decimal,
    /// Basic pay plus allowances.
    pub gross_pay: Decimal,
    /// Income tax.
    pub income_tax: Decimal,
    /// Health-insurance contribution.
    pub health_insurance: Decimal,
    /// Social-security contribution.
    pub social_security: Decimal,
    /// Profile plus ad-hoc deductions.
    pub other_deductions: Decimal,
    /// Performance bonus.
    pub performance_bonus: Decimal,
    /// Ordered audit steps.
    pub audit_trace: Vec<AuditStep>,
    figures: PaycheckFigures,
}

impl SalaryBreakdown {
    /// The figures rounded to cents, with totals derived from the rounded
    /// values so the persisted identities hold exactly.
    pub fn settle(&self) -> PaycheckFigures {
        self.figures.clone()
    }

    /// Rounds each component and sums the rounded parts with checked
    /// arithmetic.
    fn round_figures(&self) -> PayrollResult<PaycheckFigures> {
        let basic_salary = round_currency(self.basic_salary);
        let allowances = round_currency(self.allowances);
        let gross_pay = checked_amount(
            basic_salary.checked_add(allowances),
            "allowances",
            "gross pay",
        )?;

        let income_tax = round_currency(self.income_tax);
        let health_insurance = round_currency(self.health_insurance);
        let social_security = round_currency(self.social_security);
        let other_deductions = round_currency(self.other_deductions);
        let total_deductions = checked_amount(
            income_tax
                .checked_add(health_insurance)
                .and_then(|sum| sum.checked_add(social_security))
                .and_then(|sum| sum.checked_add(other_deductions)),
            "other_deductions",
            "total deductions",
        )?;

        let performance_bonus = round_currency(self.performance_bonus);
        let net_pay = checked_amount(
            gross_pay
                .checked_add(performance_bonus)
                .and_then(|sum| sum.checked_sub(total_deductions)),
            "base_salary",
            "net pay",
        )?;

        let figures = PaycheckFigures {
            base_salary: self.base_salary,
            contracted_working_days: self.contracted_working_days,
            actual_working_days: self.actual_working_days,
            basic_salary,
            allowances,
            gross_pay,
            income_tax,
            health_insurance,
            social_security,
            other_deductions,
            total_deductions,
            performance_bonus,
            net_pay,
        };
        debug_assert!(figures.is_consistent());
        Ok(figures)
    }
}

/// Calculates one employee's salary for one period.
///
/// Missing attendance is not an error: full attendance is assumed. A
/// missing or negative base salary and a negative contracted day count
/// are rejected with [`PayrollError::InvalidInput`].
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use payroll_engine::calculation::{FlatRateBonus, SalaryInputs, calculate_salary};
/// use payroll_engine::config::RateConfig;
/// use payroll_engine::models::{AttendanceInput, CompensationInput};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let rates = RateConfig::default();
/// let bonus = FlatRateBonus::new(rates.performance_bonus_rate);
/// let compensation = CompensationInput::with_base_salary(Decimal::from_str("3000.00").unwrap());
/// let attendance = AttendanceInput { present_days: 20, half_days: 2, ..Default::default() };
///
/// let breakdown = calculate_salary(
///     &SalaryInputs {
///         employee_id: "emp_001",
///         compensation: &compensation,
///         attendance: Some(&attendance),
///         default_working_days: 22,
///         adhoc_deductions: Decimal::ZERO,
///         as_of: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
///     },
///     &rates,
///     &bonus,
/// )
/// .unwrap();
///
/// let figures = breakdown.settle();
/// assert_eq!(figures.basic_salary, Decimal::from_str("2863.64").unwrap());
/// assert_eq!(figures.net_pay, Decimal::from_str("2348.18").unwrap());
/// ```
pub fn calculate_salary(
    inputs: &SalaryInputs<'_>,
    rates: &RateConfig,
    bonus_policy: &dyn BonusPolicy,
) -> PayrollResult<SalaryBreakdown> {
    let base_salary = match inputs.compensation.base_salary {
        None => {
            return Err(PayrollError::invalid_input(
                "base_salary",
                format!("missing for employee {}", inputs.employee_id),
            ));
        }
        Some(salary) if salary < Decimal::ZERO => {
            return Err(PayrollError::invalid_input(
                "base_salary",
                format!("must not be negative, got {}", salary),
            ));
        }
        Some(salary) => salary,
    };

    let contracted_working_days = match inputs.compensation.contracted_working_days {
        None => inputs.default_working_days,
        Some(days) => u32::try_from(days).map_err(|_| {
            PayrollError::invalid_input(
                "contracted_working_days",
                format!("must not be negative, got {}", days),
            )
        })?,
    };

    let mut audit_trace = Vec::with_capacity(6);

    let worked = resolve_worked_days(inputs.attendance, contracted_working_days, 1);
    audit_trace.push(worked.audit_step);

    let basic = prorate_basic_pay(
        base_salary,
        contracted_working_days,
        worked.actual_working_days,
        2,
    )?;
    audit_trace.push(basic.audit_step);

    let allowances = checked_amount(
        inputs.compensation.allowances.total(),
        "allowances",
        "allowance total",
    )?;
    let gross_pay = checked_amount(
        basic.basic_salary.checked_add(allowances),
        "allowances",
        "gross pay",
    )?;
    audit_trace.push(AuditStep {
        step_number: 3,
        rule_id: "gross_pay".to_string(),
        rule_name: "Gross Pay".to_string(),
        input: serde_json::json!({
            "basic_salary": basic.basic_salary.round_dp(4).normalize().to_string(),
            "health_insurance_allowance": inputs.compensation.allowances.health_insurance.normalize().to_string(),
            "pension_allowance": inputs.compensation.allowances.pension.normalize().to_string(),
            "other_allowance": inputs.compensation.allowances.other.normalize().to_string()
        }),
        output: serde_json::json!({
            "allowances": allowances.normalize().to_string(),
            "gross_pay": gross_pay.round_dp(4).normalize().to_string()
        }),
        reasoning: format!(
            "${} basic + ${} allowances = ${}",
            basic.basic_salary.round_dp(4).normalize(),
            allowances.normalize(),
            gross_pay.round_dp(4).normalize()
        ),
    });

    let deductions = calculate_deductions(
        gross_pay,
        rates,
        &inputs.compensation.active_deductions,
        inputs.adhoc_deductions,
        inputs.as_of,
        4,
    )?;
    audit_trace.push(deductions.audit_step);

    let bonus = calculate_bonus(
        bonus_policy,
        &BonusContext {
            employee_id: inputs.employee_id,
            base_salary,
            gross_pay,
        },
        5,
    )?;
    audit_trace.push(bonus.audit_step);

    let mut breakdown = SalaryBreakdown {
        base_salary,
        contracted_working_days,
        actual_working_days: worked.actual_working_days,
        assumed_full_attendance: worked.assumed_full_attendance,
        basic_salary: basic.basic_salary,
        allowances,
        gross_pay,
        income_tax: deductions.income_tax,
        health_insurance: deductions.health_insurance,
        social_security: deductions.social_security,
        other_deductions: deductions.other_deductions,
        performance_bonus: bonus.performance_bonus,
        audit_trace,
        figures: PaycheckFigures::default(),
    };

    let figures = breakdown.round_figures()?;
    breakdown.audit_trace.push(AuditStep {
        step_number: 6,
        rule_id: "net_pay".to_string(),
        rule_name: "Net Pay".to_string(),
        input: serde_json::json!({
            "gross_pay": figures.gross_pay.to_string(),
            "performance_bonus": figures.performance_bonus.to_string(),
            "total_deductions": figures.total_deductions.to_string()
        }),
        output: serde_json::json!({
            "net_pay": figures.net_pay.to_string()
        }),
        reasoning: format!(
            "${} gross + ${} bonus - ${} deductions = ${} (rounded half-even to cents)",
            figures.gross_pay, figures.performance_bonus, figures.total_deductions, figures.net_pay
        ),
    });
    breakdown.figures = figures;

    Ok(breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::FlatRateBonus;
    use crate::models::{Allowances, DeductionAmount, DeductionDefinition};
    use proptest::prelude::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn period_end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()
    }

    fn calculate(
        compensation: &CompensationInput,
        attendance: Option<&AttendanceInput>,
        rates: &RateConfig,
    ) -> PayrollResult<SalaryBreakdown> {
        let bonus = FlatRateBonus::new(rates.performance_bonus_rate);
        calculate_salary(
            &SalaryInputs {
                employee_id: "emp_001",
                compensation,
                attendance,
                default_working_days: 22,
                adhoc_deductions: Decimal::ZERO,
                as_of: period_end(),
            },
            rates,
            &bonus,
        )
    }

    fn scenario_attendance() -> AttendanceInput {
        AttendanceInput {
            present_days: 20,
            half_days: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_scenario_with_default_rates() {
        let compensation = CompensationInput::with_base_salary(dec("3000.00"));
        let figures = calculate(&compensation, Some(&scenario_attendance()), &RateConfig::default())
            .unwrap()
            .settle();

        assert_eq!(figures.actual_working_days, dec("21"));
        assert_eq!(figures.basic_salary, dec("2863.64"));
        assert_eq!(figures.gross_pay, dec("2863.64"));
        assert_eq!(figures.income_tax, dec("429.55"));
        assert_eq!(figures.health_insurance, dec("143.18"));
        assert_eq!(figures.social_security, dec("229.09"));
        assert_eq!(figures.total_deductions, dec("801.82"));
        assert_eq!(figures.performance_bonus, dec("286.36"));
        assert_eq!(figures.net_pay, dec("2348.18"));
    }

    #[test]
    fn test_scenario_with_zero_rates() {
        let compensation = CompensationInput::with_base_salary(dec("3000.00"));
        let figures = calculate(&compensation, Some(&scenario_attendance()), &RateConfig::zero())
            .unwrap()
            .settle();

        assert_eq!(figures.gross_pay, dec("2863.64"));
        assert_eq!(figures.total_deductions, Decimal::ZERO);
        assert_eq!(figures.net_pay, dec("2863.64"));
    }

    #[test]
    fn test_missing_attendance_pays_full_base() {
        let compensation = CompensationInput::with_base_salary(dec("3000.00"));
        let breakdown = calculate(&compensation, None, &RateConfig::zero()).unwrap();

        assert!(breakdown.assumed_full_attendance);
        assert_eq!(breakdown.settle().basic_salary, dec("3000.00"));
    }

    #[test]
    fn test_profile_contracted_days_override_default() {
        let mut compensation = CompensationInput::with_base_salary(dec("2000.00"));
        compensation.contracted_working_days = Some(20);
        let attendance = AttendanceInput {
            present_days: 10,
            ..Default::default()
        };

        let figures = calculate(&compensation, Some(&attendance), &RateConfig::zero())
            .unwrap()
            .settle();

        assert_eq!(figures.contracted_working_days, 20);
        assert_eq!(figures.basic_salary, dec("1000.00"));
    }

    #[test]
    fn test_zero_contracted_days_pays_base_unprorated() {
        let mut compensation = CompensationInput::with_base_salary(dec("1500.00"));
        compensation.contracted_working_days = Some(0);

        let figures = calculate(&compensation, Some(&scenario_attendance()), &RateConfig::zero())
            .unwrap()
            .settle();

        assert_eq!(figures.basic_salary, dec("1500.00"));
    }

    #[test]
    fn test_allowances_are_not_prorated() {
        let mut compensation = CompensationInput::with_base_salary(dec("2200.00"));
        compensation.allowances = Allowances {
            health_insurance: dec("100.00"),
            pension: dec("50.00"),
            other: dec("0.00"),
        };
        let attendance = AttendanceInput {
            present_days: 11,
            ..Default::default()
        };

        let figures = calculate(&compensation, Some(&attendance), &RateConfig::zero())
            .unwrap()
            .settle();

        assert_eq!(figures.basic_salary, dec("1100.00"));
        assert_eq!(figures.allowances, dec("150.00"));
        assert_eq!(figures.gross_pay, dec("1250.00"));
    }

    #[test]
    fn test_profile_and_adhoc_deductions_land_in_other() {
        let mut compensation = CompensationInput::with_base_salary(dec("2000.00"));
        compensation.active_deductions = vec![DeductionDefinition {
            name: "retirement_401k".to_string(),
            amount: DeductionAmount::Percentage(dec("0.03")),
            effective_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            expiry_date: None,
        }];
        let rates = RateConfig::zero();
        let bonus = FlatRateBonus::new(Decimal::ZERO);

        let figures = calculate_salary(
            &SalaryInputs {
                employee_id: "emp_001",
                compensation: &compensation,
                attendance: None,
                default_working_days: 22,
                adhoc_deductions: dec("15.00"),
                as_of: period_end(),
            },
            &rates,
            &bonus,
        )
        .unwrap()
        .settle();

        assert_eq!(figures.other_deductions, dec("75.00"));
        assert_eq!(figures.total_deductions, dec("75.00"));
        assert_eq!(figures.net_pay, dec("1925.00"));
    }

    #[test]
    fn test_missing_base_salary_is_invalid() {
        let compensation = CompensationInput {
            base_salary: None,
            contracted_working_days: None,
            allowances: Allowances::default(),
            active_deductions: vec![],
        };

        match calculate(&compensation, None, &RateConfig::default()) {
            Err(PayrollError::InvalidInput { field, .. }) => assert_eq!(field, "base_salary"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_base_salary_is_invalid() {
        let compensation = CompensationInput::with_base_salary(dec("-1.00"));
        assert!(matches!(
            calculate(&compensation, None, &RateConfig::default()),
            Err(PayrollError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_negative_contracted_days_is_invalid() {
        let mut compensation = CompensationInput::with_base_salary(dec("3000.00"));
        compensation.contracted_working_days = Some(-5);

        match calculate(&compensation, None, &RateConfig::default()) {
            Err(PayrollError::InvalidInput { field, message }) => {
                assert_eq!(field, "contracted_working_days");
                assert!(message.contains("-5"));
            }
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_audit_trace_is_ordered() {
        let compensation = CompensationInput::with_base_salary(dec("3000.00"));
        let breakdown =
            calculate(&compensation, Some(&scenario_attendance()), &RateConfig::default()).unwrap();

        let rule_ids: Vec<&str> = breakdown
            .audit_trace
            .iter()
            .map(|s| s.rule_id.as_str())
            .collect();
        assert_eq!(
            rule_ids,
            vec![
                "worked_days",
                "basic_pay",
                "gross_pay",
                "deductions",
                "performance_bonus",
                "net_pay"
            ]
        );
        for (i, step) in breakdown.audit_trace.iter().enumerate() {
            assert_eq!(step.step_number, i as u32 + 1);
        }
        assert_eq!(
            breakdown.audit_trace[5].output["net_pay"].as_str(),
            Some("2348.18")
        );
    }

    #[test]
    fn test_recalculation_is_identical() {
        let compensation = CompensationInput::with_base_salary(dec("3187.33"));
        let attendance = AttendanceInput {
            present_days: 17,
            half_days: 3,
            ..Default::default()
        };

        let first = calculate(&compensation, Some(&attendance), &RateConfig::default())
            .unwrap()
            .settle();
        let second = calculate(&compensation, Some(&attendance), &RateConfig::default())
            .unwrap()
            .settle();

        assert_eq!(first, second);
        assert_eq!(first.net_pay.to_string(), second.net_pay.to_string());
    }

    fn cents() -> impl Strategy<Value = Decimal> {
        (0i64..100_000_000).prop_map(|c| Decimal::new(c, 2))
    }

    fn rate() -> impl Strategy<Value = Decimal> {
        (0i64..=1000).prop_map(|r| Decimal::new(r, 3))
    }

    proptest! {
        #[test]
        fn prop_full_attendance_pays_base(base in cents(), days in 1u32..31) {
            let mut compensation = CompensationInput::with_base_salary(base);
            compensation.contracted_working_days = Some(days as i32);
            let attendance = AttendanceInput { present_days: days, ..Default::default() };

            let figures = calculate(&compensation, Some(&attendance), &RateConfig::zero())
                .unwrap()
                .settle();

            prop_assert_eq!(figures.basic_salary, base);
        }

        #[test]
        fn prop_persisted_identities_hold(
            base in cents(),
            allowance in cents(),
            adhoc in cents(),
            present in 0u32..31,
            half in 0u32..10,
            tax in rate(),
            health in rate(),
            social in rate(),
            bonus in rate(),
        ) {
            let mut compensation = CompensationInput::with_base_salary(base);
            compensation.allowances.other = allowance;
            let attendance = AttendanceInput { present_days: present, half_days: half, ..Default::default() };
            let rates = RateConfig {
                income_tax_rate: tax,
                health_insurance_rate: health,
                social_security_rate: social,
                performance_bonus_rate: bonus,
            };
            let policy = FlatRateBonus::new(bonus);

            let figures = calculate_salary(
                &SalaryInputs {
                    employee_id: "emp_001",
                    compensation: &compensation,
                    attendance: Some(&attendance),
                    default_working_days: 22,
                    adhoc_deductions: adhoc,
                    as_of: period_end(),
                },
                &rates,
                &policy,
            )
            .unwrap()
            .settle();

            prop_assert_eq!(
                figures.total_deductions,
                figures.income_tax + figures.health_insurance + figures.social_security + figures.other_deductions
            );
            prop_assert_eq!(
                figures.net_pay,
                figures.gross_pay + figures.performance_bonus - figures.total_deductions
            );
            prop_assert_eq!(figures.gross_pay, figures.basic_salary + figures.allowances);
            prop_assert!(figures.net_pay.scale() <= 2);
        }
    }
}
