//! External collaborators the settlement core reads from.
//!
//! Attendance, compensation and the employee directory live outside this
//! crate. Each is a trait so deployments can plug in their own systems.

mod memory;

use async_trait::async_trait;

use crate::error::PayrollResult;
use crate::models::{AttendanceInput, CompensationInput, PayrollPeriod};

pub use memory::InMemoryDirectory;

/// Source of per-period attendance counts.
#[async_trait]
pub trait AttendanceSource: Send + Sync {
    /// Attendance for the employee over the period. `Ok(None)` means no
    /// record exists, which is a valid answer and not an error.
    async fn get_attendance(
        &self,
        employee_id: &str,
        period: &PayrollPeriod,
    ) -> PayrollResult<Option<AttendanceInput>>;
}

/// Source of compensation profiles.
#[async_trait]
pub trait CompensationSource: Send + Sync {
    /// The employee's current profile, or `Ok(None)` if there is none.
    async fn get_compensation(&self, employee_id: &str) -> PayrollResult<Option<CompensationInput>>;
}

/// Source of the active workforce.
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    /// Ids of every currently active employee.
    async fn list_active_employees(&self) -> PayrollResult<Vec<String>>;
}
