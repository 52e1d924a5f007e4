//! Inputs read from the attendance and compensation collaborators.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Attendance counts for one employee over one period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceInput {
    /// Full days present.
    pub present_days: u32,
    /// Half days, each counting 0.5 towards worked days.
    pub half_days: u32,
    /// Days absent.
    pub absent_days: u32,
    /// Days the employee arrived late.
    pub late_days: u32,
    /// Days on leave.
    pub leave_days: u32,
}

impl AttendanceInput {
    /// Worked days: `present_days + 0.5 * half_days`.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::models::AttendanceInput;
    /// use rust_decimal::Decimal;
    ///
    /// let attendance = AttendanceInput {
    ///     present_days: 20,
    ///     half_days: 3,
    ///     ..Default::default()
    /// };
    /// assert_eq!(attendance.worked_days(), Decimal::new(215, 1));
    /// ```
    pub fn worked_days(&self) -> Decimal {
        Decimal::from(self.present_days) + Decimal::from(self.half_days) * Decimal::new(5, 1)
    }
}

/// Fixed recurring allowances paid every period without proration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Allowances {
    /// Employer-funded health allowance.
    pub health_insurance: Decimal,
    /// Pension allowance.
    pub pension: Decimal,
    /// Any other fixed addition.
    pub other: Decimal,
}

impl Allowances {
    /// Sum of all allowance components, or `None` if it overflows.
    pub fn total(&self) -> Option<Decimal> {
        self.health_insurance
            .checked_add(self.pension)?
            .checked_add(self.other)
    }
}

/// How a recurring deduction is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DeductionAmount {
    /// A fraction of gross pay (0.02 = 2%).
    Percentage(Decimal),
    /// A fixed amount per paycheck.
    Fixed(Decimal),
}

/// A recurring deduction attached to an employee's compensation profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionDefinition {
    /// What the deduction is for (e.g. "retirement_401k").
    pub name: String,
    /// How the deduction is sized.
    pub amount: DeductionAmount,
    /// First day the deduction applies.
    pub effective_date: NaiveDate,
    /// Last day the deduction applies, if it expires.
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
}

impl DeductionDefinition {
    /// Checks whether the deduction applies on the given date (inclusive bounds).
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.effective_date <= date && self.expiry_date.is_none_or(|expiry| date <= expiry)
    }

    /// The deduction amount for a paycheck with the given gross pay, or
    /// `None` if it overflows.
    pub fn amount_for(&self, gross_pay: Decimal) -> Option<Decimal> {
        match self.amount {
            DeductionAmount::Percentage(rate) => gross_pay.checked_mul(rate),
            DeductionAmount::Fixed(amount) => Some(amount),
        }
    }
}

/// Compensation data for one employee.
///
/// `base_salary` is optional because the profile may be incomplete; the
/// calculator rejects a missing or negative salary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationInput {
    /// Base salary for a full period.
    pub base_salary: Option<Decimal>,
    /// Contracted working days for the period; `None` uses the policy's
    /// `standard_working_days`.
    #[serde(default)]
    pub contracted_working_days: Option<i32>,
    /// Fixed recurring allowances.
    #[serde(default)]
    pub allowances: Allowances,
    /// Recurring deductions with their validity windows.
    #[serde(default)]
    pub active_deductions: Vec<DeductionDefinition>,
}

impl CompensationInput {
    /// A profile with only a base salary.
    pub fn with_base_salary(base_salary: Decimal) -> Self {
        Self {
            base_salary: Some(base_salary),
            contracted_working_days: None,
            allowances: Allowances::default(),
            active_deductions: vec![],
        }
    }
}
