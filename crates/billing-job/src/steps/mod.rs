//! Steps of the billing job
//!
//! Tasklets and item readers/writers plugged into the generic framework by
//! [`crate::billing_job`].

pub mod cleanup;
pub mod file_preparation;
pub mod ingest;
pub mod report;

pub use cleanup::CleanupStagingTasklet;
pub use file_preparation::{staged_input_path, FilePreparationTasklet};
pub use ingest::FlatFileBillingReader;
pub use report::ReportFileWriter;
