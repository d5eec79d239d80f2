//! Durable log of skipped input lines

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::parameters::JobParameters;
use super::step::StepContext;
use crate::error::{JobError, Result};
use crate::model::SkipRecord;

/// Append-only destination for records the skip policy recovered from
///
/// An append failure is returned as [`JobError::SinkWrite`] and fails the
/// step: a line that cannot be logged must not disappear silently.
#[async_trait]
pub trait SkipSink: Send {
    async fn open(&mut self, _ctx: &StepContext<'_>) -> Result<()> {
        Ok(())
    }

    async fn append(&mut self, record: &SkipRecord) -> Result<()>;
}

type PathResolver = Box<dyn Fn(&JobParameters) -> PathBuf + Send + Sync>;

/// Skip log file with one `<line-number>|<raw-line>` entry per skipped line
///
/// The file is opened in append mode on the first skip of a run and is never
/// truncated, so entries from earlier runs are preserved.
pub struct FileSkipSink {
    resolve: PathResolver,
    path: Option<PathBuf>,
    file: Option<File>,
}

impl FileSkipSink {
    /// Sink writing to a fixed path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::with_resolver(move |_| path.clone())
    }

    /// Sink whose path is derived from the job parameters when the step opens
    pub fn with_resolver<F>(resolve: F) -> Self
    where
        F: Fn(&JobParameters) -> PathBuf + Send + Sync + 'static,
    {
        Self {
            resolve: Box::new(resolve),
            path: None,
            file: None,
        }
    }

    /// Path resolved for the current run
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn writer(&mut self) -> Result<&mut File> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| JobError::sink_write("skip log used before the step opened it"))?;

        if self.file.is_none() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    JobError::sink_write(format!("Unable to create {}: {}", parent.display(), e))
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await
                .map_err(|e| {
                    JobError::sink_write(format!("Unable to open skip log {}: {}", path.display(), e))
                })?;
            self.file = Some(file);
        }

        self.file
            .as_mut()
            .ok_or_else(|| JobError::sink_write("skip log is not open"))
    }
}

#[async_trait]
impl SkipSink for FileSkipSink {
    async fn open(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        self.path = Some((self.resolve)(ctx.parameters));
        self.file = None;
        Ok(())
    }

    async fn append(&mut self, record: &SkipRecord) -> Result<()> {
        let entry = record.to_log_line();
        let file = self.writer().await?;
        let written = match file.write_all(format!("{}\n", entry).as_bytes()).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };
        written
            .map_err(|e| JobError::sink_write(format!("Unable to write skipped line '{}': {}", entry, e)))?;
        debug!(line = record.line_number, "Skipped line recorded");
        Ok(())
    }
}

/// In-memory skip sink; clones share the same entries
#[derive(Debug, Clone, Default)]
pub struct MemorySkipSink {
    records: Arc<Mutex<Vec<SkipRecord>>>,
}

impl MemorySkipSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the appended records
    pub fn records(&self) -> Vec<SkipRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SkipSink for MemorySkipSink {
    async fn append(&mut self, record: &SkipRecord) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| JobError::sink_write("skip record store poisoned"))?
            .push(record.clone());
        Ok(())
    }
}
