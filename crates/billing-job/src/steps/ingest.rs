//! Flat file reader for the ingestion step

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use super::file_preparation::staged_input_path;
use crate::codec;
use crate::error::{JobError, Result};
use crate::framework::{ItemReader, StepContext};
use crate::model::BillingRecord;

/// Reads the staged copy of `input.file` one line at a time
///
/// Blank lines are ignored. Line numbers count physical lines from 1, blank
/// ones included, so skip log entries point at the right place in the file.
/// A line that is not valid UTF-8 is reported as a malformed record.
pub struct FlatFileBillingReader {
    staging_dir: PathBuf,
    input: Option<BufReader<File>>,
    buf: Vec<u8>,
    line_number: usize,
}

impl FlatFileBillingReader {
    pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            input: None,
            buf: Vec::new(),
            line_number: 0,
        }
    }
}

#[async_trait]
impl ItemReader for FlatFileBillingReader {
    type Item = BillingRecord;

    async fn open(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        let path = staged_input_path(&self.staging_dir, ctx.parameters)?;
        let file = File::open(&path).await.map_err(|e| {
            JobError::step(format!("Unable to open {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Reading billing file");

        self.input = Some(BufReader::new(file));
        self.line_number = 0;
        Ok(())
    }

    async fn read(&mut self) -> Result<Option<BillingRecord>> {
        let input = self
            .input
            .as_mut()
            .ok_or_else(|| JobError::step("billing file read before the step opened it"))?;

        loop {
            self.buf.clear();
            if input.read_until(b'\n', &mut self.buf).await? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            if self.buf.last() == Some(&b'\n') {
                self.buf.pop();
                if self.buf.last() == Some(&b'\r') {
                    self.buf.pop();
                }
            }

            let line = match std::str::from_utf8(&self.buf) {
                Ok(line) => line,
                Err(_) => {
                    return Err(JobError::skippable(
                        self.line_number,
                        String::from_utf8_lossy(&self.buf),
                        "invalid UTF-8",
                    ))
                },
            };
            if line.trim().is_empty() {
                continue;
            }
            return codec::parse(line, self.line_number).map(Some);
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.input = None;
        Ok(())
    }
}
