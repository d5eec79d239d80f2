//! In-memory staging store

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

use super::StagingStore;
use crate::error::{JobError, Result};
use crate::model::{BillingPeriod, BillingRecord};

/// Staging store backed by a shared vector; clones see the same rows
#[derive(Debug, Clone, Default)]
pub struct MemoryStagingStore {
    rows: Arc<Mutex<Vec<BillingRecord>>>,
}

impl MemoryStagingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> Result<MutexGuard<'_, Vec<BillingRecord>>> {
        self.rows
            .lock()
            .map_err(|_| JobError::store("staging rows lock poisoned"))
    }
}

#[async_trait]
impl StagingStore for MemoryStagingStore {
    async fn insert_chunk(&self, records: &[BillingRecord]) -> Result<()> {
        self.rows()?.extend_from_slice(records);
        Ok(())
    }

    async fn count_period(&self, period: BillingPeriod) -> Result<u64> {
        let count = self.rows()?.iter().filter(|r| r.period() == period).count();
        Ok(count as u64)
    }

    async fn delete_period(&self, period: BillingPeriod) -> Result<u64> {
        let mut rows = self.rows()?;
        let before = rows.len();
        rows.retain(|r| r.period() != period);
        Ok((before - rows.len()) as u64)
    }

    async fn fetch_page(
        &self,
        period: BillingPeriod,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<BillingRecord>> {
        let offset = usize::try_from(offset).map_err(|e| JobError::store(e.to_string()))?;
        Ok(self
            .rows()?
            .iter()
            .filter(|r| r.period() == period)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_all(&self) -> Result<u64> {
        Ok(self.rows()?.len() as u64)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record(year: i32, month: i32, account_id: i64) -> BillingRecord {
        BillingRecord {
            data_year: year,
            data_month: month,
            account_id,
            phone_number: "555-0100".to_string(),
            data_usage: 1.0,
            call_duration: 1,
            sms_count: 1,
        }
    }

    #[tokio::test]
    async fn test_delete_only_touches_period() {
        let store = MemoryStagingStore::new();
        store
            .insert_chunk(&[record(2023, 1, 1), record(2023, 2, 2), record(2023, 1, 3)])
            .await
            .unwrap();

        let jan = BillingPeriod::new(2023, 1);
        assert_eq!(store.count_period(jan).await.unwrap(), 2);
        assert_eq!(store.delete_period(jan).await.unwrap(), 2);
        assert_eq!(store.delete_period(jan).await.unwrap(), 0);
        assert_eq!(store.count_all().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_fetch_page_windows() {
        let store = MemoryStagingStore::new();
        let rows: Vec<_> = (1..=5).map(|id| record(2023, 1, id)).collect();
        store.insert_chunk(&rows).await.unwrap();

        let jan = BillingPeriod::new(2023, 1);
        let page = store.fetch_page(jan, 3, 10).await.unwrap();
        assert_eq!(page.iter().map(|r| r.account_id).collect::<Vec<_>>(), vec![4, 5]);
        assert!(store.fetch_page(jan, 5, 10).await.unwrap().is_empty());
    }
}
