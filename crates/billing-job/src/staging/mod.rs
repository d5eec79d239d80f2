//! Staging table for ingested billing records
//!
//! Ingestion writes parsed records here one chunk at a time and the report
//! step pages them back out. Two stores are provided: [`MemoryStagingStore`]
//! and, with the `database` feature, a PostgreSQL store.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::error::{JobError, Result};
use crate::framework::{ItemReader, ItemWriter, StepContext};
use crate::model::{BillingPeriod, BillingRecord};
use crate::params;

pub mod memory;
#[cfg(feature = "database")]
pub mod postgres;

pub use memory::MemoryStagingStore;
#[cfg(feature = "database")]
pub use postgres::PgStagingStore;

/// Storage backend for staged billing records
#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Insert one chunk; either every record is stored or none is
    async fn insert_chunk(&self, records: &[BillingRecord]) -> Result<()>;

    async fn count_period(&self, period: BillingPeriod) -> Result<u64>;

    /// Delete every record of the period, returning how many were removed
    async fn delete_period(&self, period: BillingPeriod) -> Result<u64>;

    /// Records of the period in insertion order
    async fn fetch_page(
        &self,
        period: BillingPeriod,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<BillingRecord>>;

    async fn count_all(&self) -> Result<u64>;
}

/// Chunk writer that stages records
pub struct StagingWriter {
    store: Arc<dyn StagingStore>,
}

impl StagingWriter {
    pub fn new(store: Arc<dyn StagingStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ItemWriter for StagingWriter {
    type Item = BillingRecord;

    async fn write(&mut self, items: Vec<BillingRecord>) -> Result<()> {
        self.store.insert_chunk(&items).await?;
        debug!(records = items.len(), "Staged chunk");
        Ok(())
    }
}

/// Pages through the staged records of the job's billing period
///
/// The period comes from `data.year` and `data.month` when the step opens;
/// a run without them has nothing to report on and fails the step.
pub struct StagingReader {
    store: Arc<dyn StagingStore>,
    page_size: usize,
    period: Option<BillingPeriod>,
    offset: u64,
    page: std::vec::IntoIter<BillingRecord>,
    exhausted: bool,
}

impl StagingReader {
    pub fn new(store: Arc<dyn StagingStore>, page_size: usize) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
            period: None,
            offset: 0,
            page: Vec::new().into_iter(),
            exhausted: false,
        }
    }
}

#[async_trait]
impl ItemReader for StagingReader {
    type Item = BillingRecord;

    async fn open(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        let period = params::billing_period(ctx.parameters).ok_or_else(|| {
            JobError::parameter(format!(
                "{} and {} are required to read staged records",
                params::DATA_YEAR,
                params::DATA_MONTH
            ))
        })?;
        self.period = Some(period);
        self.offset = 0;
        self.page = Vec::new().into_iter();
        self.exhausted = false;
        Ok(())
    }

    async fn read(&mut self) -> Result<Option<BillingRecord>> {
        if let Some(record) = self.page.next() {
            return Ok(Some(record));
        }
        if self.exhausted {
            return Ok(None);
        }

        let period = self
            .period
            .ok_or_else(|| JobError::step("staging reader used before the step opened it"))?;
        let page = self
            .store
            .fetch_page(period, self.offset, self.page_size)
            .await?;

        if page.len() < self.page_size {
            self.exhausted = true;
        }
        self.offset += page.len() as u64;
        self.page = page.into_iter();

        Ok(self.page.next())
    }
}
