//! Removes previously staged rows for the run's billing period

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::Result;
use crate::framework::{StepContext, Tasklet};
use crate::params;
use crate::staging::StagingStore;

/// Deletes the staging rows of `data.year`/`data.month` so a rerun starts clean
///
/// Running it again, or against an empty table, is a successful no-op.
pub struct CleanupStagingTasklet {
    store: Arc<dyn StagingStore>,
}

impl CleanupStagingTasklet {
    pub fn new(store: Arc<dyn StagingStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tasklet for CleanupStagingTasklet {
    async fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        let Some(period) = params::billing_period(ctx.parameters) else {
            warn!(
                "No {} / {} parameters, skipping staging cleanup",
                params::DATA_YEAR,
                params::DATA_MONTH
            );
            return Ok(());
        };

        let existing = self.store.count_period(period).await?;
        if existing == 0 {
            info!(%period, "No staged rows to clean up");
            return Ok(());
        }

        let deleted = self.store.delete_period(period).await?;
        info!(%period, deleted, "Staged rows deleted");
        Ok(())
    }
}
