//! Reader, processor and writer contracts for chunked steps

use async_trait::async_trait;
use std::marker::PhantomData;

use super::step::StepContext;
use crate::error::Result;

/// Lazily produces the items of a chunked step
///
/// `open` runs when the step starts, so implementations resolve paths and
/// scopes from the job parameters there rather than at construction.
#[async_trait]
pub trait ItemReader: Send {
    type Item: Send;

    async fn open(&mut self, _ctx: &StepContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Next item, or `None` once the source is exhausted
    ///
    /// A [`JobError::SkippableRecord`](crate::error::JobError::SkippableRecord)
    /// reports one bad item; the reader must stay usable afterwards.
    async fn read(&mut self) -> Result<Option<Self::Item>>;

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Transforms one item; returning `None` filters it out of the chunk
pub trait ItemProcessor<I>: Send {
    type Output: Send;

    fn process(&mut self, item: I) -> Result<Option<Self::Output>>;
}

/// Receives each committed chunk in a single call
#[async_trait]
pub trait ItemWriter: Send {
    type Item: Send;

    async fn open(&mut self, _ctx: &StepContext<'_>) -> Result<()> {
        Ok(())
    }

    async fn write(&mut self, items: Vec<Self::Item>) -> Result<()>;

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Processor for steps without a transform
pub struct PassThrough<T> {
    _item: PhantomData<fn(T) -> T>,
}

impl<T> PassThrough<T> {
    pub fn new() -> Self {
        Self { _item: PhantomData }
    }
}

impl<T> Default for PassThrough<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> ItemProcessor<T> for PassThrough<T> {
    type Output = T;

    fn process(&mut self, item: T) -> Result<Option<T>> {
        Ok(Some(item))
    }
}
