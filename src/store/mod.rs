//! Storage seam for periods, paychecks and batches.
//!
//! The repository owns record identity and atomicity: paychecks are unique
//! per `(employee_id, period_id)`, batches are unique per period, and every
//! update is an atomic read-modify-write that commits only on success.

mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::PayrollResult;
use crate::models::{Paycheck, PaycheckStatus, PayrollBatch, PayrollPeriod};

pub use memory::InMemoryRepository;

/// A mutation applied to a paycheck inside an atomic update.
///
/// Returning an error discards every change the closure made.
pub type PaycheckMutation = Box<dyn FnOnce(&mut Paycheck) -> PayrollResult<()> + Send>;

/// A mutation applied to a batch inside an atomic update.
pub type BatchMutation = Box<dyn FnOnce(&mut PayrollBatch) -> PayrollResult<()> + Send>;

/// Persistent storage used by the settlement service.
#[async_trait]
pub trait PayrollRepository: Send + Sync {
    /// Stores a new period. Fails with `DuplicatePeriod` if the id exists.
    async fn insert_period(&self, period: PayrollPeriod) -> PayrollResult<()>;

    /// Overwrites an existing period. Fails with `NotFound` if absent.
    async fn save_period(&self, period: PayrollPeriod) -> PayrollResult<()>;

    /// Fetches a period by id.
    async fn get_period(&self, period_id: &str) -> PayrollResult<Option<PayrollPeriod>>;

    /// All periods, ordered by start date.
    async fn list_periods(&self) -> PayrollResult<Vec<PayrollPeriod>>;

    /// Inserts the paycheck unless one already exists for its
    /// `(employee_id, period_id)`. Returns the stored record and whether
    /// it was newly created.
    async fn insert_paycheck_if_absent(&self, paycheck: Paycheck) -> PayrollResult<(Paycheck, bool)>;

    /// Fetches a paycheck by id.
    async fn get_paycheck(&self, paycheck_id: Uuid) -> PayrollResult<Option<Paycheck>>;

    /// Fetches an employee's paycheck for a period.
    async fn find_paycheck(
        &self,
        employee_id: &str,
        period_id: &str,
    ) -> PayrollResult<Option<Paycheck>>;

    /// All paychecks of a period, ordered by employee id.
    async fn list_paychecks(&self, period_id: &str) -> PayrollResult<Vec<Paycheck>>;

    /// Paychecks matching every filter that is `Some`, ordered by period id
    /// and then employee id.
    async fn list_paychecks_filtered(
        &self,
        employee_id: Option<&str>,
        status: Option<PaycheckStatus>,
        period_id: Option<&str>,
    ) -> PayrollResult<Vec<Paycheck>>;

    /// Atomically applies `mutate` to the stored paycheck and returns the
    /// committed record.
    async fn update_paycheck(
        &self,
        paycheck_id: Uuid,
        mutate: PaycheckMutation,
    ) -> PayrollResult<Paycheck>;

    /// Stores a new batch. Fails with `DuplicatePeriod` if the period already has one.
    async fn insert_batch(&self, batch: PayrollBatch) -> PayrollResult<()>;

    /// Fetches a batch by id.
    async fn get_batch(&self, batch_id: Uuid) -> PayrollResult<Option<PayrollBatch>>;

    /// Fetches the batch opened for a period, if any.
    async fn find_batch_for_period(&self, period_id: &str) -> PayrollResult<Option<PayrollBatch>>;

    /// Atomically applies `mutate` to the stored batch and returns the
    /// committed record.
    async fn update_batch(&self, batch_id: Uuid, mutate: BatchMutation)
    -> PayrollResult<PayrollBatch>;

    /// How many writes the store can safely run in parallel.
    fn write_concurrency(&self) -> usize;
}
