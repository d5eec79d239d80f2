//! Error types shared by the billing crates

use thiserror::Error;

/// Result type alias for common billing operations
pub type Result<T> = std::result::Result<T, BillingError>;

/// Main error type for shared billing utilities
#[derive(Error, Debug)]
pub enum BillingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}
