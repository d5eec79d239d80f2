//! Launching the billing job from command line arguments

use std::sync::Arc;
use tracing::{info, warn};

use crate::billing_job::billing_job;
use crate::config::BatchConfig;
use crate::error::Result;
use crate::framework::{JobExecution, JobParameters};
use crate::params;
use crate::staging::{MemoryStagingStore, StagingStore};
use crate::RunArgs;

/// Job parameters for a command line run
pub fn job_parameters(args: &RunArgs) -> JobParameters {
    JobParameters::builder()
        .string(params::INPUT_FILE, args.input_file.as_str())
        .optional_string(params::OUTPUT_FILE, args.output_file.as_deref())
        .optional_integer(params::DATA_YEAR, args.year)
        .optional_integer(params::DATA_MONTH, args.month)
        .optional_string(params::SKIP_FILE, args.skip_file.as_deref())
        .build()
}

/// Staging store selected by configuration
///
/// PostgreSQL when built with the `database` feature and `DATABASE_URL` is
/// set, the in-memory store otherwise.
pub async fn open_store(config: &BatchConfig) -> Result<Arc<dyn StagingStore>> {
    #[cfg(feature = "database")]
    if config.database.url.is_some() {
        let store = crate::staging::PgStagingStore::connect(&config.database).await?;
        info!("Using PostgreSQL staging store");
        return Ok(Arc::new(store));
    }

    if config.database.url.is_some() {
        warn!("DATABASE_URL is set but the database feature is disabled");
    }
    info!("Using in-memory staging store");
    Ok(Arc::new(MemoryStagingStore::new()))
}

/// Build and launch the billing job once
pub async fn run(config: &BatchConfig, args: &RunArgs) -> Result<JobExecution> {
    let store = open_store(config).await?;
    let mut job = billing_job(config, store);
    Ok(job.launch(job_parameters(args)).await)
}
