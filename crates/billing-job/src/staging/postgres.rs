//! PostgreSQL staging store

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};
use std::time::Duration;
use tracing::{debug, info};

use super::StagingStore;
use crate::config::DatabaseConfig;
use crate::error::{JobError, Result};
use crate::model::{BillingPeriod, BillingRecord};

/// Staging table name
pub const BILLING_TABLE: &str = "billing_data";

/// Record field to column mapping, in insert order
pub const BILLING_COLUMNS: [(&str, &str); 7] = [
    ("data_year", "data_year"),
    ("data_month", "data_month"),
    ("account_id", "account_id"),
    ("phone_number", "phone_number"),
    ("data_usage", "data_usage"),
    ("call_duration", "call_duration"),
    ("sms_count", "sms_count"),
];

fn column_list() -> String {
    BILLING_COLUMNS
        .iter()
        .map(|(_, column)| *column)
        .collect::<Vec<_>>()
        .join(", ")
}

fn map_row(row: &PgRow) -> std::result::Result<BillingRecord, sqlx::Error> {
    Ok(BillingRecord {
        data_year: row.try_get("data_year")?,
        data_month: row.try_get("data_month")?,
        account_id: row.try_get("account_id")?,
        phone_number: row.try_get("phone_number")?,
        data_usage: row.try_get("data_usage")?,
        call_duration: row.try_get("call_duration")?,
        sms_count: row.try_get("sms_count")?,
    })
}

/// Staging store on the `billing_data` table
#[derive(Debug, Clone)]
pub struct PgStagingStore {
    pool: PgPool,
}

impl PgStagingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a pool from configuration and bring the schema up to date
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| JobError::store("DATABASE_URL is not set"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(url)
            .await?;

        info!(
            max_connections = config.max_connections,
            "Database connection pool created"
        );

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl StagingStore for PgStagingStore {
    async fn insert_chunk(&self, records: &[BillingRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("INSERT INTO {} ({}) ", BILLING_TABLE, column_list()));

        query_builder.push_values(records.iter(), |mut b, record| {
            b.push_bind(record.data_year)
                .push_bind(record.data_month)
                .push_bind(record.account_id)
                .push_bind(&record.phone_number)
                .push_bind(record.data_usage)
                .push_bind(record.call_duration)
                .push_bind(record.sms_count);
        });

        query_builder.build().execute(&mut *tx).await?;
        tx.commit().await?;

        debug!(records = records.len(), "Inserted billing_data chunk");
        Ok(())
    }

    async fn count_period(&self, period: BillingPeriod) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} WHERE data_year = $1 AND data_month = $2",
            BILLING_TABLE
        ))
        .bind(period.year)
        .bind(period.month)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as u64)
    }

    async fn delete_period(&self, period: BillingPeriod) -> Result<u64> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE data_year = $1 AND data_month = $2",
            BILLING_TABLE
        ))
        .bind(period.year)
        .bind(period.month)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn fetch_page(
        &self,
        period: BillingPeriod,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<BillingRecord>> {
        let offset = i64::try_from(offset).map_err(|e| JobError::store(e.to_string()))?;
        let limit = i64::try_from(limit).map_err(|e| JobError::store(e.to_string()))?;

        let rows = sqlx::query(&format!(
            "SELECT {} FROM {} WHERE data_year = $1 AND data_month = $2 \
             ORDER BY id OFFSET $3 LIMIT $4",
            column_list(),
            BILLING_TABLE
        ))
        .bind(period.year)
        .bind(period.month)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(map_row)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(JobError::from)
    }

    async fn count_all(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", BILLING_TABLE))
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }
}
