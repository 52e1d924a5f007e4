//! Core data models for the payroll engine.
//!
//! This module contains all the domain models used throughout the engine.

mod audit;
mod inputs;
mod paycheck;
mod payroll_batch;
mod payroll_period;

pub use audit::AuditStep;
pub use inputs::{
    Allowances, AttendanceInput, CompensationInput, DeductionAmount, DeductionDefinition,
};
pub use paycheck::{Paycheck, PaycheckFigures, PaycheckStatus};
pub use payroll_batch::{BatchFailure, BatchStatus, PayrollBatch, SettlementOutcome};
pub use payroll_period::{PayFrequency, PayrollPeriod};
