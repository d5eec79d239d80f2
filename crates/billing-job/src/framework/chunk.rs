//! Chunk-oriented step executor
//!
//! Reads up to `chunk_size` items, runs each through the processor, and hands
//! the survivors to the writer in one call. A chunk is committed once the
//! writer accepts it; there is no partial commit inside a chunk.
//!
//! Only read failures flagged as skippable are recovered: they go to the skip
//! sink and reading continues. Processor and writer failures end the step.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::item::{ItemProcessor, ItemReader, ItemWriter};
use super::skip::SkipSink;
use super::step::{Step, StepContext};
use super::types::{StepExecution, StepKind};
use crate::error::{JobError, Result};

/// Default number of items per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Upper bound on the buffer reserved up front for a chunk
const MAX_PREALLOCATED_ITEMS: usize = 1024;

/// Chunked read → process → write step
pub struct ChunkStep<R, P, W> {
    name: String,
    chunk_size: usize,
    reader: R,
    processor: P,
    writer: W,
    skip_sink: Option<Box<dyn SkipSink>>,
    skip_limit: Option<usize>,
}

impl<R, P, W> ChunkStep<R, P, W>
where
    R: ItemReader,
    P: ItemProcessor<R::Item>,
    W: ItemWriter<Item = P::Output>,
{
    /// `chunk_size` is clamped to at least one item
    pub fn new(name: impl Into<String>, chunk_size: usize, reader: R, processor: P, writer: W) -> Self {
        Self {
            name: name.into(),
            chunk_size: chunk_size.max(1),
            reader,
            processor,
            writer,
            skip_sink: None,
            skip_limit: None,
        }
    }

    /// Enable the skip policy: skippable read failures are logged to `sink`
    pub fn with_skip_sink(mut self, sink: impl SkipSink + 'static) -> Self {
        self.skip_sink = Some(Box::new(sink));
        self
    }

    /// Fail the step once more than `limit` items were skipped
    pub fn with_skip_limit(mut self, limit: Option<usize>) -> Self {
        self.skip_limit = limit;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Read the next chunk. The flag is true once the reader is exhausted.
    async fn read_chunk(&mut self, execution: &mut StepExecution) -> Result<(Vec<R::Item>, bool)> {
        let mut items = Vec::with_capacity(self.chunk_size.min(MAX_PREALLOCATED_ITEMS));

        while items.len() < self.chunk_size {
            match self.reader.read().await {
                Ok(Some(item)) => {
                    execution.read_count += 1;
                    items.push(item);
                },
                Ok(None) => return Ok((items, true)),
                Err(err) => self.skip(err, execution).await?,
            }
        }

        Ok((items, false))
    }

    async fn skip(&mut self, err: JobError, execution: &mut StepExecution) -> Result<()> {
        let (Some(record), Some(sink)) = (err.skip_record(), self.skip_sink.as_mut()) else {
            return Err(err);
        };

        if let Some(limit) = self.skip_limit {
            if execution.skip_count >= limit {
                return Err(JobError::SkipLimitExceeded { limit });
            }
        }

        warn!(
            step = %self.name,
            line = record.line_number,
            error = %err,
            "Skipping malformed record"
        );
        sink.append(&record).await.map_err(JobError::into_sink_write)?;
        execution.skip_count += 1;
        Ok(())
    }

    async fn run_chunks(&mut self, execution: &mut StepExecution) -> Result<()> {
        loop {
            let (items, exhausted) = self.read_chunk(execution).await?;
            if items.is_empty() {
                break;
            }

            let mut outputs = Vec::with_capacity(items.len());
            for item in items {
                let processed = self.processor.process(item).map_err(|err| match err {
                    JobError::StepExecution(_) => err,
                    other => JobError::step(other.to_string()),
                })?;
                match processed {
                    Some(output) => outputs.push(output),
                    None => execution.filter_count += 1,
                }
            }

            let written = outputs.len();
            if written > 0 {
                self.writer
                    .write(outputs)
                    .await
                    .map_err(JobError::into_sink_write)?;
            }
            execution.write_count += written;
            execution.commit_count += 1;

            debug!(
                step = %self.name,
                commit = execution.commit_count,
                written,
                "Chunk committed"
            );

            if exhausted {
                break;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl<R, P, W> Step for ChunkStep<R, P, W>
where
    R: ItemReader,
    P: ItemProcessor<R::Item>,
    W: ItemWriter<Item = P::Output>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StepKind {
        StepKind::Chunked
    }

    async fn execute(&mut self, ctx: &StepContext<'_>, execution: &mut StepExecution) -> Result<()> {
        self.reader.open(ctx).await?;

        if let Err(err) = self.writer.open(ctx).await {
            if let Err(close_err) = self.reader.close().await {
                warn!(step = %self.name, error = %close_err, "Reader close failed");
            }
            return Err(err);
        }

        let opened = match self.skip_sink.as_mut() {
            Some(sink) => sink.open(ctx).await,
            None => Ok(()),
        };
        let result = match opened {
            Ok(()) => self.run_chunks(execution).await,
            Err(err) => Err(err),
        };

        let reader_closed = self.reader.close().await;
        let writer_closed = self.writer.close().await;

        result?;
        reader_closed?;
        writer_closed.map_err(JobError::into_sink_write)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::framework::item::PassThrough;
    use crate::framework::parameters::JobParameters;
    use crate::framework::skip::MemorySkipSink;
    use crate::model::SkipRecord;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    /// Yields integers; `None` entries stand for unparsable lines
    struct VecReader {
        items: VecDeque<Option<i32>>,
        line: usize,
        closed: Arc<AtomicBool>,
    }

    impl VecReader {
        fn new(items: Vec<Option<i32>>) -> Self {
            Self {
                items: items.into(),
                line: 0,
                closed: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    #[async_trait]
    impl ItemReader for VecReader {
        type Item = i32;

        async fn read(&mut self) -> Result<Option<i32>> {
            match self.items.pop_front() {
                None => Ok(None),
                Some(entry) => {
                    self.line += 1;
                    entry
                        .map(Some)
                        .ok_or_else(|| JobError::skippable(self.line, format!("bad-{}", self.line), "not a number"))
                },
            }
        }

        async fn close(&mut self) -> Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingWriter {
        chunks: Arc<Mutex<Vec<Vec<i32>>>>,
        fail_on_call: Option<usize>,
        fail_open: bool,
        closed: Arc<AtomicBool>,
    }

    #[async_trait]
    impl ItemWriter for RecordingWriter {
        type Item = i32;

        async fn open(&mut self, _ctx: &StepContext<'_>) -> Result<()> {
            if self.fail_open {
                return Err(JobError::store("connection refused"));
            }
            Ok(())
        }

        async fn close(&mut self) -> Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn write(&mut self, items: Vec<i32>) -> Result<()> {
            let mut chunks = self.chunks.lock().unwrap();
            if Some(chunks.len()) == self.fail_on_call {
                return Err(JobError::store("insert rejected"));
            }
            chunks.push(items);
            Ok(())
        }
    }

    /// Skip sink that can fail on open or on every append
    #[derive(Default)]
    struct BrokenSink {
        fail_open: bool,
    }

    #[async_trait]
    impl SkipSink for BrokenSink {
        async fn open(&mut self, _ctx: &StepContext<'_>) -> Result<()> {
            if self.fail_open {
                return Err(JobError::sink_write("skip log directory is read-only"));
            }
            Ok(())
        }

        async fn append(&mut self, _record: &SkipRecord) -> Result<()> {
            Err(JobError::sink_write("disk full"))
        }
    }

    struct DropOdd;

    impl ItemProcessor<i32> for DropOdd {
        type Output = i32;

        fn process(&mut self, item: i32) -> Result<Option<i32>> {
            if item < 0 {
                return Err(JobError::step("negative item"));
            }
            Ok((item % 2 == 0).then_some(item))
        }
    }

    async fn run<P>(step: &mut ChunkStep<VecReader, P, RecordingWriter>) -> (Result<()>, StepExecution)
    where
        P: ItemProcessor<i32, Output = i32>,
    {
        let params = JobParameters::default();
        let ctx = StepContext::new("job", Uuid::new_v4(), &params);
        let mut execution = StepExecution::new(step.name(), step.kind());
        let result = step.execute(&ctx, &mut execution).await;
        (result, execution)
    }

    #[tokio::test]
    async fn test_items_are_committed_in_chunks() {
        let writer = RecordingWriter::default();
        let reader = VecReader::new((1..=7).map(Some).collect());
        let mut step = ChunkStep::new("ingest", 3, reader, PassThrough::new(), writer.clone());

        let (result, execution) = run(&mut step).await;
        result.unwrap();

        assert_eq!(
            *writer.chunks.lock().unwrap(),
            vec![vec![1, 2, 3], vec![4, 5, 6], vec![7]]
        );
        assert_eq!(execution.read_count, 7);
        assert_eq!(execution.write_count, 7);
        assert_eq!(execution.commit_count, 3);
    }

    #[tokio::test]
    async fn test_exact_multiple_does_not_commit_empty_chunk() {
        let writer = RecordingWriter::default();
        let reader = VecReader::new((1..=4).map(Some).collect());
        let mut step = ChunkStep::new("ingest", 2, reader, PassThrough::new(), writer.clone());

        let (result, execution) = run(&mut step).await;
        result.unwrap();
        assert_eq!(execution.commit_count, 2);
        assert_eq!(writer.chunks.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_source_completes_without_commits() {
        let writer = RecordingWriter::default();
        let mut step = ChunkStep::new("ingest", 10, VecReader::new(vec![]), PassThrough::new(), writer.clone());

        let (result, execution) = run(&mut step).await;
        result.unwrap();
        assert_eq!(execution.commit_count, 0);
        assert!(writer.chunks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_processor_filters_items() {
        let writer = RecordingWriter::default();
        let reader = VecReader::new((1..=6).map(Some).collect());
        let mut step = ChunkStep::new("report", 4, reader, DropOdd, writer.clone());

        let (result, execution) = run(&mut step).await;
        result.unwrap();

        assert_eq!(*writer.chunks.lock().unwrap(), vec![vec![2, 4], vec![6]]);
        assert_eq!(execution.filter_count, 3);
        assert_eq!(execution.write_count, 3);
        assert_eq!(execution.skip_count, 0);
    }

    #[tokio::test]
    async fn test_fully_filtered_chunk_is_committed_without_write() {
        let writer = RecordingWriter::default();
        let reader = VecReader::new(vec![Some(1), Some(3), Some(4)]);
        let mut step = ChunkStep::new("report", 2, reader, DropOdd, writer.clone());

        let (result, execution) = run(&mut step).await;
        result.unwrap();

        assert_eq!(*writer.chunks.lock().unwrap(), vec![vec![4]]);
        assert_eq!(execution.commit_count, 2);
    }

    #[tokio::test]
    async fn test_skippable_reads_are_logged_and_do_not_fill_chunks() {
        let writer = RecordingWriter::default();
        let sink = MemorySkipSink::new();
        let reader = VecReader::new(vec![Some(1), None, Some(2), None, Some(3)]);
        let mut step = ChunkStep::new("ingest", 2, reader, PassThrough::new(), writer.clone())
            .with_skip_sink(sink.clone());

        let (result, execution) = run(&mut step).await;
        result.unwrap();

        assert_eq!(*writer.chunks.lock().unwrap(), vec![vec![1, 2], vec![3]]);
        assert_eq!(execution.skip_count, 2);
        assert_eq!(execution.read_count, 3);
        let lines: Vec<usize> = sink.records().iter().map(|r| r.line_number).collect();
        assert_eq!(lines, vec![2, 4]);
        assert_eq!(sink.records()[0].raw_line, "bad-2");
    }

    #[tokio::test]
    async fn test_read_failure_without_skip_sink_is_fatal() {
        let writer = RecordingWriter::default();
        let reader = VecReader::new(vec![Some(1), None, Some(2)]);
        let mut step = ChunkStep::new("ingest", 5, reader, PassThrough::new(), writer.clone());

        let (result, execution) = run(&mut step).await;
        assert!(matches!(result, Err(JobError::SkippableRecord { line_number: 2, .. })));
        assert_eq!(execution.commit_count, 0);
        assert!(writer.chunks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_skip_limit_is_enforced() {
        let writer = RecordingWriter::default();
        let reader = VecReader::new(vec![Some(1), None, Some(2), None, None, Some(3)]);
        let mut step = ChunkStep::new("ingest", 1, reader, PassThrough::new(), writer.clone())
            .with_skip_sink(MemorySkipSink::new())
            .with_skip_limit(Some(2));

        let (result, execution) = run(&mut step).await;
        assert!(matches!(result, Err(JobError::SkipLimitExceeded { limit: 2 })));
        assert_eq!(execution.skip_count, 2);
        assert_eq!(execution.commit_count, 2);
    }

    #[tokio::test]
    async fn test_writer_failure_stops_step_and_keeps_commit_count() {
        let writer = RecordingWriter {
            fail_on_call: Some(1),
            ..Default::default()
        };
        let reader = VecReader::new((1..=9).map(Some).collect());
        let mut step = ChunkStep::new("ingest", 3, reader, PassThrough::new(), writer.clone());

        let (result, execution) = run(&mut step).await;
        assert!(matches!(result, Err(JobError::SinkWrite(ref m)) if m.contains("insert rejected")));
        assert_eq!(execution.commit_count, 1);
        assert_eq!(execution.write_count, 3);
        assert_eq!(execution.read_count, 6);
    }

    #[tokio::test]
    async fn test_processor_failure_is_fatal_not_skipped() {
        let writer = RecordingWriter::default();
        let sink = MemorySkipSink::new();
        let reader = VecReader::new(vec![Some(2), Some(-1), Some(4)]);
        let mut step = ChunkStep::new("report", 10, reader, DropOdd, writer.clone())
            .with_skip_sink(sink.clone());

        let (result, execution) = run(&mut step).await;
        assert!(matches!(result, Err(JobError::StepExecution(_))));
        assert_eq!(execution.commit_count, 0);
        assert!(sink.records().is_empty());
        assert!(writer.chunks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_skip_append_fails_step_after_committed_chunks() {
        let writer = RecordingWriter::default();
        let reader = VecReader::new(vec![Some(1), Some(2), Some(3), Some(4), None, Some(5), Some(6)]);
        let mut step = ChunkStep::new("ingest", 2, reader, PassThrough::new(), writer.clone())
            .with_skip_sink(BrokenSink::default());

        let (result, execution) = run(&mut step).await;
        assert!(matches!(result, Err(JobError::SinkWrite(ref m)) if m.contains("disk full")));
        assert_eq!(execution.commit_count, 2);
        assert_eq!(execution.skip_count, 0);
        assert_eq!(*writer.chunks.lock().unwrap(), vec![vec![1, 2], vec![3, 4]]);
    }

    #[tokio::test]
    async fn test_writer_open_failure_closes_reader() {
        let writer = RecordingWriter {
            fail_open: true,
            ..Default::default()
        };
        let reader = VecReader::new(vec![Some(1)]);
        let reader_closed = reader.closed.clone();
        let mut step = ChunkStep::new("ingest", 2, reader, PassThrough::new(), writer.clone());

        let (result, execution) = run(&mut step).await;
        assert!(matches!(result, Err(JobError::Store(_))));
        assert!(reader_closed.load(Ordering::SeqCst));
        assert_eq!(execution.read_count, 0);
    }

    #[tokio::test]
    async fn test_skip_sink_open_failure_closes_reader_and_writer() {
        let writer = RecordingWriter::default();
        let reader = VecReader::new(vec![Some(1), Some(2)]);
        let reader_closed = reader.closed.clone();
        let mut step = ChunkStep::new("ingest", 2, reader, PassThrough::new(), writer.clone())
            .with_skip_sink(BrokenSink { fail_open: true });

        let (result, execution) = run(&mut step).await;
        assert!(matches!(result, Err(JobError::SinkWrite(_))));
        assert!(reader_closed.load(Ordering::SeqCst));
        assert!(writer.closed.load(Ordering::SeqCst));
        assert_eq!(execution.read_count, 0);
        assert!(writer.chunks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unbounded_chunk_size_reads_whole_source_in_one_chunk() {
        let writer = RecordingWriter::default();
        let reader = VecReader::new((1..=5).map(Some).collect());
        let mut step = ChunkStep::new("ingest", usize::MAX, reader, PassThrough::new(), writer.clone());

        let (result, execution) = run(&mut step).await;
        result.unwrap();
        assert_eq!(*writer.chunks.lock().unwrap(), vec![vec![1, 2, 3, 4, 5]]);
        assert_eq!(execution.commit_count, 1);
    }
}
