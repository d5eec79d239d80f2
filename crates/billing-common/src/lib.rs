//! Billing Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared utilities and error handling for the billing batch workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`BillingError`] and the crate [`Result`] alias
//! - **Logging**: tracing subscriber setup shared by every binary
//! - **Checksums**: file integrity verification for staged input files
//!
//! # Example
//!
//! ```no_run
//! use billing_common::checksum::compute_file_checksum;
//! use billing_common::types::ChecksumAlgorithm;
//!
//! fn fingerprint(path: &str) -> billing_common::Result<String> {
//!     compute_file_checksum(path, ChecksumAlgorithm::Sha256)
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{BillingError, Result};
