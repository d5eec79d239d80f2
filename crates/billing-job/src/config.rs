//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use billing_common::types::ChecksumAlgorithm;

use crate::pricing::PricingRates;

// ============================================================================
// Batch Configuration Constants
// ============================================================================

/// Default number of items per chunk commit.
pub const DEFAULT_CHUNK_SIZE: usize = crate::framework::DEFAULT_CHUNK_SIZE;

/// Largest accepted chunk size; a chunk is held in memory while it is processed.
pub const MAX_CHUNK_SIZE: usize = 1_000_000;

/// Default price per MB of data.
pub const DEFAULT_PRICING_DATA: f64 = 0.01;

/// Default price per call minute.
pub const DEFAULT_PRICING_CALL: f64 = 0.5;

/// Default price per SMS.
pub const DEFAULT_PRICING_SMS: f64 = 0.1;

/// Default spending threshold below which records are left out of the report.
pub const DEFAULT_SPENDING_THRESHOLD: f64 = 150.0;

/// Default staging directory for copied input files and skip logs.
pub const DEFAULT_STAGING_DIR: &str = "staging";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Batch job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub chunk_size: usize,
    pub pricing: PricingRates,
    pub spending_threshold: f64,
    pub staging_dir: PathBuf,
    /// Maximum skipped lines per step; `None` means unlimited
    pub skip_limit: Option<usize>,
    pub checksum_algorithm: ChecksumAlgorithm,
    pub database: DatabaseConfig,
}

/// Staging database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Unset selects the in-memory staging store
    #[serde(skip_serializing)]
    pub url: Option<String>,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_opt<T: FromStr>(key: &str) -> anyhow::Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {} ({})", key, raw, e)),
        _ => Ok(None),
    }
}

impl BatchConfig {
    /// Load configuration from environment and defaults
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = BatchConfig {
            chunk_size: env_or("BILLING_CHUNK_SIZE", DEFAULT_CHUNK_SIZE),
            pricing: PricingRates {
                data: env_or("BILLING_PRICING_DATA", DEFAULT_PRICING_DATA),
                call: env_or("BILLING_PRICING_CALL", DEFAULT_PRICING_CALL),
                sms: env_or("BILLING_PRICING_SMS", DEFAULT_PRICING_SMS),
            },
            spending_threshold: env_or("BILLING_SPENDING_THRESHOLD", DEFAULT_SPENDING_THRESHOLD),
            staging_dir: std::env::var("BILLING_STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STAGING_DIR)),
            skip_limit: env_opt("BILLING_SKIP_LIMIT")?,
            checksum_algorithm: env_opt::<ChecksumAlgorithm>("BILLING_CHECKSUM_ALGORITHM")?
                .unwrap_or_default(),
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty()),
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                connect_timeout_secs: env_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chunk_size == 0 {
            anyhow::bail!("Chunk size must be greater than 0");
        }

        if self.chunk_size > MAX_CHUNK_SIZE {
            anyhow::bail!(
                "Chunk size must be at most {}, got {}",
                MAX_CHUNK_SIZE,
                self.chunk_size
            );
        }

        let rates = [
            ("data", self.pricing.data),
            ("call", self.pricing.call),
            ("sms", self.pricing.sms),
        ];
        for (name, rate) in rates {
            if !rate.is_finite() {
                anyhow::bail!("Pricing rate for {} must be a finite number, got {}", name, rate);
            }
        }

        if !self.spending_threshold.is_finite() {
            anyhow::bail!(
                "Spending threshold must be a finite number, got {}",
                self.spending_threshold
            );
        }

        if self.spending_threshold < 0.0 {
            anyhow::bail!(
                "Spending threshold cannot be negative, got {}",
                self.spending_threshold
            );
        }

        if self.staging_dir.as_os_str().is_empty() {
            anyhow::bail!("Staging directory cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        Ok(())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            pricing: PricingRates {
                data: DEFAULT_PRICING_DATA,
                call: DEFAULT_PRICING_CALL,
                sms: DEFAULT_PRICING_SMS,
            },
            spending_threshold: DEFAULT_SPENDING_THRESHOLD,
            staging_dir: PathBuf::from(DEFAULT_STAGING_DIR),
            skip_limit: None,
            checksum_algorithm: ChecksumAlgorithm::default(),
            database: DatabaseConfig {
                url: None,
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "BILLING_CHUNK_SIZE",
        "BILLING_PRICING_DATA",
        "BILLING_PRICING_CALL",
        "BILLING_PRICING_SMS",
        "BILLING_SPENDING_THRESHOLD",
        "BILLING_STAGING_DIR",
        "BILLING_SKIP_LIMIT",
        "BILLING_CHECKSUM_ALGORITHM",
        "DATABASE_URL",
        "DATABASE_MAX_CONNECTIONS",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = BatchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 100);
        assert_eq!(config.spending_threshold, 150.0);
        assert!(config.skip_limit.is_none());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("BILLING_CHUNK_SIZE", "25");
        std::env::set_var("BILLING_PRICING_CALL", "0.75");
        std::env::set_var("BILLING_SKIP_LIMIT", "10");
        std::env::set_var("BILLING_STAGING_DIR", "/var/lib/billing");

        let config = BatchConfig::from_env().unwrap();
        assert_eq!(config.chunk_size, 25);
        assert_eq!(config.pricing.call, 0.75);
        assert_eq!(config.pricing.data, DEFAULT_PRICING_DATA);
        assert_eq!(config.skip_limit, Some(10));
        assert_eq!(config.staging_dir, PathBuf::from("/var/lib/billing"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_zero_chunk_size() {
        clear_env();
        std::env::set_var("BILLING_CHUNK_SIZE", "0");
        assert!(BatchConfig::from_env().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_malformed_skip_limit() {
        clear_env();
        std::env::set_var("BILLING_SKIP_LIMIT", "lots");
        let err = BatchConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("BILLING_SKIP_LIMIT"));
        clear_env();
    }

    #[test]
    fn test_validate_rejects_non_finite_threshold() {
        let config = BatchConfig {
            spending_threshold: f64::NAN,
            ..BatchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_threshold() {
        let config = BatchConfig {
            spending_threshold: -100.0,
            ..BatchConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("negative"));

        let zero = BatchConfig {
            spending_threshold: 0.0,
            ..BatchConfig::default()
        };
        assert!(zero.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_negative_threshold() {
        clear_env();
        std::env::set_var("BILLING_SPENDING_THRESHOLD", "-1");
        assert!(BatchConfig::from_env().is_err());
        clear_env();
    }

    #[test]
    fn test_validate_rejects_oversized_chunk_size() {
        let config = BatchConfig {
            chunk_size: usize::MAX,
            ..BatchConfig::default()
        };
        assert!(config.validate().is_err());

        let largest = BatchConfig {
            chunk_size: MAX_CHUNK_SIZE,
            ..BatchConfig::default()
        };
        assert!(largest.validate().is_ok());
    }
}
