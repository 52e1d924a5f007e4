//! HTTP API module for the payroll engine.
//!
//! This module exposes periods, batches and paychecks as REST endpoints
//! over the [`PayrollService`](crate::settlement::PayrollService).

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    CalculateRequest, CurrentPeriodQuery, NoteRequest, OpenBatchRequest, OtherDeductionsRequest,
    PaycheckQuery, PeriodRequest, RunBatchRequest, TransitionRequest,
};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
