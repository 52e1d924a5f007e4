//! Currency rounding applied when figures are persisted.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{PayrollError, PayrollResult};

/// Number of fraction digits kept on persisted currency amounts.
pub const CURRENCY_SCALE: u32 = 2;

/// Rounds an amount to cents using banker's rounding (round half to even).
///
/// Intermediate results are never rounded; this is applied once per
/// persisted figure.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::round_currency;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round_currency(Decimal::from_str("2863.6363").unwrap()), Decimal::from_str("2863.64").unwrap());
/// assert_eq!(round_currency(Decimal::from_str("0.125").unwrap()), Decimal::from_str("0.12").unwrap());
/// ```
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Turns the result of a checked decimal operation into a
/// `PayrollResult`, blaming `field` when the value left the decimal range.
///
/// Overflow is treated as bad employee data, so inside a batch run the
/// paycheck is marked failed and the run continues.
pub fn checked_amount(value: Option<Decimal>, field: &str, what: &str) -> PayrollResult<Decimal> {
    value.ok_or_else(|| {
        PayrollError::invalid_input(field, format!("{} exceeds the supported decimal range", what))
    })
}
