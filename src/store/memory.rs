//! In-memory repository backed by a `tokio` read-write lock.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{PayrollError, PayrollResult};
use crate::models::{Paycheck, PaycheckStatus, PayrollBatch, PayrollPeriod};

use super::{BatchMutation, PayrollRepository, PaycheckMutation};

const DEFAULT_WRITE_CONCURRENCY: usize = 16;

#[derive(Debug, Default)]
struct Tables {
    periods: HashMap<String, PayrollPeriod>,
    paychecks: HashMap<Uuid, Paycheck>,
    paycheck_keys: HashMap<(String, String), Uuid>,
    batches: HashMap<Uuid, PayrollBatch>,
    batch_by_period: HashMap<String, Uuid>,
}

/// Repository holding every record in process memory.
///
/// Mutations run against a copy of the record under the write lock and
/// are committed only when the closure returns `Ok`.
#[derive(Debug)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
    write_concurrency: usize,
}

impl InMemoryRepository {
    /// Creates an empty repository with the default write concurrency.
    pub fn new() -> Self {
        Self::with_write_concurrency(DEFAULT_WRITE_CONCURRENCY)
    }

    /// Creates a repository reporting the given safe write concurrency.
    pub fn with_write_concurrency(write_concurrency: usize) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            write_concurrency: write_concurrency.max(1),
        }
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PayrollRepository for InMemoryRepository {
    async fn insert_period(&self, period: PayrollPeriod) -> PayrollResult<()> {
        let mut tables = self.tables.write().await;
        if tables.periods.contains_key(&period.id) {
            return Err(PayrollError::DuplicatePeriod {
                period_id: period.id,
            });
        }
        tables.periods.insert(period.id.clone(), period);
        Ok(())
    }

    async fn save_period(&self, period: PayrollPeriod) -> PayrollResult<()> {
        let mut tables = self.tables.write().await;
        match tables.periods.get_mut(&period.id) {
            Some(existing) => {
                *existing = period;
                Ok(())
            }
            None => Err(PayrollError::not_found("payroll period", &period.id)),
        }
    }

    async fn get_period(&self, period_id: &str) -> PayrollResult<Option<PayrollPeriod>> {
        Ok(self.tables.read().await.periods.get(period_id).cloned())
    }

    async fn list_periods(&self) -> PayrollResult<Vec<PayrollPeriod>> {
        let tables = self.tables.read().await;
        let mut periods: Vec<PayrollPeriod> = tables.periods.values().cloned().collect();
        periods.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));
        Ok(periods)
    }

    async fn insert_paycheck_if_absent(&self, paycheck: Paycheck) -> PayrollResult<(Paycheck, bool)> {
        let mut tables = self.tables.write().await;
        let key = (paycheck.employee_id.clone(), paycheck.period_id.clone());

        if let Some(existing) = tables
            .paycheck_keys
            .get(&key)
            .and_then(|id| tables.paychecks.get(id))
        {
            return Ok((existing.clone(), false));
        }

        tables.paycheck_keys.insert(key, paycheck.id);
        tables.paychecks.insert(paycheck.id, paycheck.clone());
        Ok((paycheck, true))
    }

    async fn get_paycheck(&self, paycheck_id: Uuid) -> PayrollResult<Option<Paycheck>> {
        Ok(self.tables.read().await.paychecks.get(&paycheck_id).cloned())
    }

    async fn find_paycheck(
        &self,
        employee_id: &str,
        period_id: &str,
    ) -> PayrollResult<Option<Paycheck>> {
        let tables = self.tables.read().await;
        let key = (employee_id.to_string(), period_id.to_string());
        Ok(tables
            .paycheck_keys
            .get(&key)
            .and_then(|id| tables.paychecks.get(id))
            .cloned())
    }

    async fn list_paychecks(&self, period_id: &str) -> PayrollResult<Vec<Paycheck>> {
        let tables = self.tables.read().await;
        let mut paychecks: Vec<Paycheck> = tables
            .paychecks
            .values()
            .filter(|p| p.period_id == period_id)
            .cloned()
            .collect();
        paychecks.sort_by(|a, b| a.employee_id.cmp(&b.employee_id));
        Ok(paychecks)
    }

    async fn list_paychecks_filtered(
        &self,
        employee_id: Option<&str>,
        status: Option<PaycheckStatus>,
        period_id: Option<&str>,
    ) -> PayrollResult<Vec<Paycheck>> {
        let tables = self.tables.read().await;
        let mut paychecks: Vec<Paycheck> = tables
            .paychecks
            .values()
            .filter(|p| employee_id.is_none_or(|id| p.employee_id == id))
            .filter(|p| status.is_none_or(|s| p.status == s))
            .filter(|p| period_id.is_none_or(|id| p.period_id == id))
            .cloned()
            .collect();
        paychecks.sort_by(|a, b| {
            a.period_id
                .cmp(&b.period_id)
                .then_with(|| a.employee_id.cmp(&b.employee_id))
        });
        Ok(paychecks)
    }

    async fn update_paycheck(
        &self,
        paycheck_id: Uuid,
        mutate: PaycheckMutation,
    ) -> PayrollResult<Paycheck> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .paychecks
            .get_mut(&paycheck_id)
            .ok_or_else(|| PayrollError::not_found("paycheck", paycheck_id))?;

        let mut working = stored.clone();
        mutate(&mut working)?;
        *stored = working.clone();
        Ok(working)
    }

    async fn insert_batch(&self, batch: PayrollBatch) -> PayrollResult<()> {
        let mut tables = self.tables.write().await;
        if tables.batch_by_period.contains_key(&batch.period_id) {
            return Err(PayrollError::DuplicatePeriod {
                period_id: batch.period_id,
            });
        }
        tables.batch_by_period.insert(batch.period_id.clone(), batch.id);
        tables.batches.insert(batch.id, batch);
        Ok(())
    }

    async fn get_batch(&self, batch_id: Uuid) -> PayrollResult<Option<PayrollBatch>> {
        Ok(self.tables.read().await.batches.get(&batch_id).cloned())
    }

    async fn find_batch_for_period(&self, period_id: &str) -> PayrollResult<Option<PayrollBatch>> {
        let tables = self.tables.read().await;
        Ok(tables
            .batch_by_period
            .get(period_id)
            .and_then(|id| tables.batches.get(id))
            .cloned())
    }

    async fn update_batch(
        &self,
        batch_id: Uuid,
        mutate: BatchMutation,
    ) -> PayrollResult<PayrollBatch> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .batches
            .get_mut(&batch_id)
            .ok_or_else(|| PayrollError::not_found("payroll batch", batch_id))?;

        let mut working = stored.clone();
        mutate(&mut working)?;
        *stored = working.clone();
        Ok(working)
    }

    fn write_concurrency(&self) -> usize {
        self.write_concurrency
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PayFrequency, PaycheckStatus};
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn period(id: &str) -> PayrollPeriod {
        PayrollPeriod {
            id: id.to_string(),
            name: format!("Period {}", id),
            frequency: PayFrequency::Monthly,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            payment_date: NaiveDate::from_ymd_opt(2026, 2, 5).unwrap(),
            is_active: true,
        }
    }

    fn draft(employee_id: &str) -> Paycheck {
        Paycheck::draft(employee_id, "2026-01", Decimal::from(3000), 22, Utc::now())
    }

    #[tokio::test]
    async fn test_duplicate_period_is_rejected() {
        let repo = InMemoryRepository::new();
        repo.insert_period(period("2026-01")).await.unwrap();

        let result = repo.insert_period(period("2026-01")).await;
        assert!(matches!(result, Err(PayrollError::DuplicatePeriod { .. })));
    }

    #[tokio::test]
    async fn test_save_unknown_period_is_not_found() {
        let repo = InMemoryRepository::new();
        let result = repo.save_period(period("2026-01")).await;
        assert!(matches!(result, Err(PayrollError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_insert_paycheck_if_absent_returns_existing() {
        let repo = InMemoryRepository::new();
        let first = draft("emp_001");

        let (stored, created) = repo.insert_paycheck_if_absent(first.clone()).await.unwrap();
        assert!(created);
        assert_eq!(stored.id, first.id);

        let (again, created) = repo.insert_paycheck_if_absent(draft("emp_001")).await.unwrap();
        assert!(!created);
        assert_eq!(again.id, first.id);
        assert_eq!(repo.list_paychecks("2026-01").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_create_one_paycheck() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut handles = vec![];
        for _ in 0..16 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.insert_paycheck_if_absent(draft("emp_001")).await.unwrap()
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().1 {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(repo.list_paychecks("2026-01").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_filtered_listing_combines_filters() {
        let repo = InMemoryRepository::new();
        repo.insert_paycheck_if_absent(draft("emp_002")).await.unwrap();
        repo.insert_paycheck_if_absent(draft("emp_001")).await.unwrap();
        let february = Paycheck::draft("emp_001", "2026-02", Decimal::from(3000), 22, Utc::now());
        let (february, _) = repo.insert_paycheck_if_absent(february).await.unwrap();
        repo.update_paycheck(
            february.id,
            Box::new(|p| {
                p.status = PaycheckStatus::Failed;
                Ok(())
            }),
        )
        .await
        .unwrap();

        let all = repo.list_paychecks_filtered(None, None, None).await.unwrap();
        let keys: Vec<(&str, &str)> = all
            .iter()
            .map(|p| (p.period_id.as_str(), p.employee_id.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![("2026-01", "emp_001"), ("2026-01", "emp_002"), ("2026-02", "emp_001")]
        );

        let by_employee = repo
            .list_paychecks_filtered(Some("emp_001"), None, None)
            .await
            .unwrap();
        assert_eq!(by_employee.len(), 2);

        let drafts = repo
            .list_paychecks_filtered(Some("emp_001"), Some(PaycheckStatus::Draft), None)
            .await
            .unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].period_id, "2026-01");

        let none = repo
            .list_paychecks_filtered(None, Some(PaycheckStatus::Paid), Some("2026-01"))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_failed_mutation_is_not_committed() {
        let repo = InMemoryRepository::new();
        let (paycheck, _) = repo.insert_paycheck_if_absent(draft("emp_001")).await.unwrap();

        let result = repo
            .update_paycheck(
                paycheck.id,
                Box::new(|p| {
                    p.notes.push_str("partial");
                    p.status = PaycheckStatus::Processed;
                    Err(PayrollError::invalid_input("base_salary", "rejected"))
                }),
            )
            .await;

        assert!(result.is_err());
        let stored = repo.get_paycheck(paycheck.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaycheckStatus::Draft);
        assert!(stored.notes.is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_paycheck_is_not_found() {
        let repo = InMemoryRepository::new();
        let result = repo.update_paycheck(Uuid::new_v4(), Box::new(|_| Ok(()))).await;
        assert!(matches!(result, Err(PayrollError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_batch_is_unique_per_period() {
        let repo = InMemoryRepository::new();
        let batch = PayrollBatch::open("2026-01", vec![], "admin", Utc::now());
        repo.insert_batch(batch.clone()).await.unwrap();

        let duplicate = PayrollBatch::open("2026-01", vec![], "admin", Utc::now());
        assert!(matches!(
            repo.insert_batch(duplicate).await,
            Err(PayrollError::DuplicatePeriod { .. })
        ));

        let found = repo.find_batch_for_period("2026-01").await.unwrap().unwrap();
        assert_eq!(found.id, batch.id);
    }

    #[test]
    fn test_write_concurrency_is_at_least_one() {
        assert_eq!(InMemoryRepository::with_write_concurrency(0).write_concurrency(), 1);
        assert_eq!(InMemoryRepository::new().write_concurrency(), 16);
    }
}
