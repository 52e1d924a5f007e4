//! Calculation logic for the payroll engine.
//!
//! This module contains the salary calculator and the steps it is built
//! from: worked-day resolution, basic pay proration, deductions, the
//! performance bonus policy and currency rounding.

mod basic_pay;
mod bonus;
mod deductions;
mod rounding;
mod salary;
mod worked_days;

pub use basic_pay::{BasicPayResult, prorate_basic_pay};
pub use bonus::{BonusContext, BonusPolicy, BonusResult, FlatRateBonus, calculate_bonus};
pub use deductions::{DeductionsResult, calculate_deductions};
pub use rounding::{CURRENCY_SCALE, checked_amount, round_currency};
pub use salary::{SalaryBreakdown, SalaryInputs, calculate_salary};
pub use worked_days::{WorkedDaysResult, resolve_worked_days};
