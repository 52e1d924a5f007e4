//! Payroll settlement: periods, batches, and the paycheck lifecycle.
//!
//! [`PayrollService`] is the single entry point used by the HTTP layer and
//! by embedding applications. It ties the salary calculator to the
//! collaborator sources and the repository.

mod batch;
mod report;
mod service;

pub use batch::{BatchOpening, RunSignal};
pub use report::{BatchReport, PeriodSummary};
pub use service::PayrollService;
