//! Application state for the payroll HTTP API.

use crate::settlement::PayrollService;

/// Shared application state.
///
/// Wraps the payroll service, which is itself cheap to clone.
#[derive(Clone)]
pub struct AppState {
    service: PayrollService,
}

impl AppState {
    /// Creates a new application state around the given service.
    pub fn new(service: PayrollService) -> Self {
        Self { service }
    }

    /// Returns the payroll service.
    pub fn service(&self) -> &PayrollService {
        &self.service
    }
}
