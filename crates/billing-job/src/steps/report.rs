//! Report file writer for the report generation step

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::info;

use crate::codec;
use crate::error::{JobError, Result};
use crate::framework::{ItemWriter, StepContext};
use crate::model::ReportingRecord;
use crate::params;

/// Writes priced records to the run's report file
///
/// The file is truncated when the step opens it and flushed after every chunk.
pub struct ReportFileWriter {
    staging_dir: PathBuf,
    path: Option<PathBuf>,
    out: Option<BufWriter<File>>,
    rows: u64,
}

impl ReportFileWriter {
    pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            path: None,
            out: None,
            rows: 0,
        }
    }

    /// Report path resolved for the current run
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[async_trait]
impl ItemWriter for ReportFileWriter {
    type Item = ReportingRecord;

    async fn open(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        let path = params::report_file_path(&self.staging_dir, ctx.parameters);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = File::create(&path).await.map_err(|e| {
            JobError::sink_write(format!("Unable to create report {}: {}", path.display(), e))
        })?;

        self.out = Some(BufWriter::new(file));
        self.path = Some(path);
        self.rows = 0;
        Ok(())
    }

    async fn write(&mut self, items: Vec<ReportingRecord>) -> Result<()> {
        let out = self
            .out
            .as_mut()
            .ok_or_else(|| JobError::sink_write("report written before the step opened it"))?;

        for item in &items {
            let mut line = codec::format_report(item);
            line.push('\n');
            out.write_all(line.as_bytes()).await?;
        }
        out.flush().await?;

        self.rows += items.len() as u64;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut out) = self.out.take() {
            out.flush().await?;
            if let Some(path) = &self.path {
                info!(path = %path.display(), rows = self.rows, "Report written");
            }
        }
        Ok(())
    }
}
