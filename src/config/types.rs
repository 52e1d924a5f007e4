//! Configuration types for payroll settlement.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Percentage rates applied to gross pay, expressed as fractions (0.15 = 15%).
///
/// Rates are a policy object rather than per-employee data, so one set
/// applies to every paycheck calculated with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateConfig {
    /// Income tax withheld from gross pay.
    pub income_tax_rate: Decimal,
    /// Employee health-insurance contribution.
    pub health_insurance_rate: Decimal,
    /// Employee social-security contribution.
    pub social_security_rate: Decimal,
    /// Flat performance bonus paid on top of gross pay.
    pub performance_bonus_rate: Decimal,
}

impl RateConfig {
    /// A rate configuration with every rate at zero.
    pub fn zero() -> Self {
        Self {
            income_tax_rate: Decimal::ZERO,
            health_insurance_rate: Decimal::ZERO,
            social_security_rate: Decimal::ZERO,
            performance_bonus_rate: Decimal::ZERO,
        }
    }

    /// Returns the first rate outside `0..=1`, as `(name, value)`.
    pub fn out_of_range(&self) -> Option<(&'static str, Decimal)> {
        [
            ("income_tax_rate", self.income_tax_rate),
            ("health_insurance_rate", self.health_insurance_rate),
            ("social_security_rate", self.social_security_rate),
            ("performance_bonus_rate", self.performance_bonus_rate),
        ]
        .into_iter()
        .find(|(_, rate)| *rate < Decimal::ZERO || *rate > Decimal::ONE)
    }
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            income_tax_rate: Decimal::new(15, 2),
            health_insurance_rate: Decimal::new(5, 2),
            social_security_rate: Decimal::new(8, 2),
            performance_bonus_rate: Decimal::new(10, 2),
        }
    }
}

/// Operational policy for batches and the paycheck lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayrollPolicy {
    /// Contracted working days seeded onto paychecks, and used by the
    /// calculator when a profile does not set its own.
    pub standard_working_days: u32,
    /// Upper bound on employees settled in parallel during a batch run.
    pub worker_concurrency: usize,
    /// Whether a paid paycheck may be voided.
    pub allow_void_paid: bool,
}

impl Default for PayrollPolicy {
    fn default() -> Self {
        Self {
            standard_working_days: 22,
            worker_concurrency: 8,
            allow_void_paid: false,
        }
    }
}

/// The complete payroll configuration loaded from YAML files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayrollConfig {
    rates: RateConfig,
    policy: PayrollPolicy,
}

impl PayrollConfig {
    /// Creates a new PayrollConfig from its component parts.
    pub fn new(rates: RateConfig, policy: PayrollPolicy) -> Self {
        Self { rates, policy }
    }

    /// Returns the deduction and bonus rates.
    pub fn rates(&self) -> &RateConfig {
        &self.rates
    }

    /// Returns the batch and lifecycle policy.
    pub fn policy(&self) -> &PayrollPolicy {
        &self.policy
    }
}
