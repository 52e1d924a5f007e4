//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every error condition that can occur while calculating, settling
//! or reporting on paychecks.

use thiserror::Error;
use uuid::Uuid;

use crate::models::PaycheckStatus;

/// The main error type for the payroll engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use payroll_engine::error::PayrollError;
///
/// let error = PayrollError::InvalidInput {
///     field: "base_salary".to_string(),
///     message: "must not be negative".to_string(),
/// };
/// assert_eq!(error.to_string(), "Invalid input 'base_salary': must not be negative");
/// ```
#[derive(Debug, Error)]
pub enum PayrollError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed or holds out-of-range values.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Input data was missing or malformed.
    #[error("Invalid input '{field}': {message}")]
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of record (e.g. "compensation profile", "paycheck").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// A paycheck lifecycle transition is not allowed from its current state.
    #[error("Illegal transition for paycheck {paycheck_id}: {from} -> {to} ({reason})")]
    IllegalTransition {
        /// The paycheck the transition was attempted on.
        paycheck_id: Uuid,
        /// The current status.
        from: PaycheckStatus,
        /// The requested status.
        to: PaycheckStatus,
        /// Why the transition was rejected.
        reason: String,
    },

    /// The calculator was asked to re-run on a paycheck that is no longer a draft.
    #[error("Paycheck {paycheck_id} cannot be recalculated in status {status}")]
    RecalculationRejected {
        /// The paycheck that was targeted.
        paycheck_id: Uuid,
        /// Its current status.
        status: PaycheckStatus,
    },

    /// A batch already exists for the period.
    #[error("A payroll batch already exists for period {period_id}")]
    DuplicatePeriod {
        /// The period that already has a batch.
        period_id: String,
    },

    /// An external collaborator (attendance, compensation, directory) failed.
    #[error("Source '{source_name}' unavailable: {message}")]
    SourceUnavailable {
        /// The name of the collaborator.
        source_name: String,
        /// A description of the failure.
        message: String,
    },

    /// A batch worker panicked or the worker pool was shut down.
    #[error("Batch worker failed: {message}")]
    WorkerFailed {
        /// A description of the failure.
        message: String,
    },
}

impl PayrollError {
    /// Creates a `NotFound` error for the given entity kind and id.
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        PayrollError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Creates an `InvalidInput` error for the given field.
    pub fn invalid_input(field: &str, message: impl Into<String>) -> Self {
        PayrollError::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Returns true if the error concerns a single employee's data.
    ///
    /// Inside a batch run these errors mark the employee's paycheck as
    /// failed and the sweep continues with the remaining employees.
    pub fn is_record_failure(&self) -> bool {
        matches!(
            self,
            PayrollError::InvalidInput { .. }
                | PayrollError::NotFound { .. }
                | PayrollError::SourceUnavailable { .. }
        )
    }

    /// Returns true if the error means another writer already moved the paycheck on.
    pub fn is_stale_state(&self) -> bool {
        matches!(
            self,
            PayrollError::IllegalTransition { .. } | PayrollError::RecalculationRejected { .. }
        )
    }
}

/// A type alias for Results that return PayrollError.
pub type PayrollResult<T> = Result<T, PayrollError>;
