//! Payroll period model.
//!
//! This module contains the [`PayrollPeriod`] and [`PayFrequency`] types that
//! anchor a batch and its paychecks to a calendar window and payment date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{PayrollError, PayrollResult};

/// How often a payroll cycle repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayFrequency {
    /// Every week.
    Weekly,
    /// Every two weeks.
    BiWeekly,
    /// Twice a month.
    SemiMonthly,
    /// Once a month.
    Monthly,
}

/// Represents a payroll period: the window worked and the date it is paid.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{PayFrequency, PayrollPeriod};
/// use chrono::NaiveDate;
///
/// let period = PayrollPeriod {
///     id: "2026-01".to_string(),
///     name: "January 2026".to_string(),
///     frequency: PayFrequency::Monthly,
///     start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
///     end_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
///     payment_date: NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
///     is_active: true,
/// };
///
/// assert!(period.validate().is_ok());
/// assert!(period.contains_date(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollPeriod {
    /// Unique identifier for the period (e.g. "2026-01").
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// The payroll cycle this period belongs to.
    pub frequency: PayFrequency,
    /// The first day of the period (inclusive).
    pub start_date: NaiveDate,
    /// The last day of the period (inclusive).
    pub end_date: NaiveDate,
    /// The day paychecks for this period are paid.
    pub payment_date: NaiveDate,
    /// Inactive periods cannot be settled.
    pub is_active: bool,
}

impl PayrollPeriod {
    /// Checks `start_date <= end_date <= payment_date` and a non-empty id.
    pub fn validate(&self) -> PayrollResult<()> {
        if self.id.trim().is_empty() {
            return Err(PayrollError::invalid_input("id", "period id must not be empty"));
        }
        if self.start_date > self.end_date {
            return Err(PayrollError::invalid_input(
                "end_date",
                format!(
                    "end date {} is before start date {}",
                    self.end_date, self.start_date
                ),
            ));
        }
        if self.end_date > self.payment_date {
            return Err(PayrollError::invalid_input(
                "payment_date",
                format!(
                    "payment date {} is before end date {}",
                    self.payment_date, self.end_date
                ),
            ));
        }
        Ok(())
    }

    /// Checks if a given date falls within this period (inclusive).
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}
