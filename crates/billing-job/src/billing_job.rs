//! Billing job assembly
//!
//! ```text
//! filePreparation -> cleanupBillingTable -> fileIngestion -> reportGeneration
//! ```

use std::sync::Arc;

use crate::config::BatchConfig;
use crate::framework::{ChunkStep, FileSkipSink, Job, PassThrough, TaskletStep};
use crate::model::BillingRecord;
use crate::params::{self, BillingJobParametersValidator};
use crate::pricing::{BillingProcessor, PricingCalculator};
use crate::staging::{StagingReader, StagingStore, StagingWriter};
use crate::steps::{CleanupStagingTasklet, FilePreparationTasklet, FlatFileBillingReader, ReportFileWriter};

pub const JOB_NAME: &str = "BillingJob";

pub const FILE_PREPARATION_STEP: &str = "filePreparation";
pub const CLEANUP_STEP: &str = "cleanupBillingTable";
pub const INGESTION_STEP: &str = "fileIngestion";
pub const REPORT_STEP: &str = "reportGeneration";

/// Build the billing job over `store`
pub fn billing_job(config: &BatchConfig, store: Arc<dyn StagingStore>) -> Job {
    let staging_dir = config.staging_dir.clone();

    let skip_dir = staging_dir.clone();
    let skip_sink = FileSkipSink::with_resolver(move |p| params::skip_file_path(&skip_dir, p));

    let ingestion = ChunkStep::new(
        INGESTION_STEP,
        config.chunk_size,
        FlatFileBillingReader::new(&staging_dir),
        PassThrough::<BillingRecord>::new(),
        StagingWriter::new(store.clone()),
    )
    .with_skip_sink(skip_sink)
    .with_skip_limit(config.skip_limit);

    let calculator = PricingCalculator::new(config.pricing, config.spending_threshold);
    let report = ChunkStep::new(
        REPORT_STEP,
        config.chunk_size,
        StagingReader::new(store.clone(), config.chunk_size),
        BillingProcessor::new(calculator),
        ReportFileWriter::new(&staging_dir),
    );

    Job::builder(JOB_NAME)
        .validator(BillingJobParametersValidator)
        .step(TaskletStep::new(
            FILE_PREPARATION_STEP,
            FilePreparationTasklet::new(&staging_dir, config.checksum_algorithm),
        ))
        .step(TaskletStep::new(CLEANUP_STEP, CleanupStagingTasklet::new(store)))
        .step(ingestion)
        .step(report)
        .build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::staging::MemoryStagingStore;

    #[test]
    fn test_step_order() {
        let job = billing_job(&BatchConfig::default(), Arc::new(MemoryStagingStore::new()));
        assert_eq!(job.name(), JOB_NAME);
        assert_eq!(
            job.step_names(),
            vec![FILE_PREPARATION_STEP, CLEANUP_STEP, INGESTION_STEP, REPORT_STEP]
        );
    }
}
