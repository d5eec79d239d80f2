//! Billing Job Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Monthly billing batch: ingest a delimited usage file into a staging table,
//! price every staged record and write a report of the accounts whose total
//! reaches the spending threshold.
//!
//! # Overview
//!
//! - **Framework** ([`framework`]): jobs, tasklet steps and chunk steps with a
//!   skip policy for malformed input lines
//! - **Codec** ([`codec`]): delimited line parsing and formatting
//! - **Pricing** ([`pricing`]): billing totals and the spending threshold filter
//! - **Staging** ([`staging`]): in-memory and PostgreSQL staging stores
//! - **Billing job** ([`billing_job`]): the four billing steps wired in order
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use billing_job::{BatchConfig, JobParameters, MemoryStagingStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = BatchConfig::from_env()?;
//!     let mut job = billing_job::billing_job(&config, Arc::new(MemoryStagingStore::new()));
//!
//!     let params = JobParameters::builder()
//!         .string("input.file", "input/billing-2023-01.csv")
//!         .string("output.file", "output/billing-report-2023-01.csv")
//!         .integer("data.year", 2023)
//!         .integer("data.month", 1)
//!         .build();
//!
//!     let execution = job.launch(params).await;
//!     println!("{}", execution);
//!     Ok(())
//! }
//! ```

pub mod billing_job;
pub mod codec;
pub mod config;
pub mod error;
pub mod framework;
pub mod launcher;
pub mod model;
pub mod params;
pub mod pricing;
pub mod staging;
pub mod steps;

// Re-export commonly used types
pub use billing_job::billing_job;
pub use config::BatchConfig;
pub use error::{JobError, Result};
pub use framework::{BatchStatus, JobExecution, JobParameters};
pub use model::{BillingPeriod, BillingRecord, ReportingRecord, SkipRecord};
pub use staging::{MemoryStagingStore, StagingStore};

use clap::{Args, Parser, Subcommand};

/// Billing batch job runner
#[derive(Parser, Debug)]
#[command(name = "billing-job")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the billing job once
    Run(RunArgs),

    /// Print the effective batch configuration
    Config,
}

/// Job parameters for one run
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Billing usage file to ingest
    #[arg(long)]
    pub input_file: String,

    /// Report destination (defaults to the staging directory)
    #[arg(long)]
    pub output_file: Option<String>,

    /// Billing year
    #[arg(long)]
    pub year: Option<i64>,

    /// Billing month
    #[arg(long)]
    pub month: Option<i64>,

    /// Skip log destination (defaults to the staging directory)
    #[arg(long)]
    pub skip_file: Option<String>,

    /// Print the execution as JSON
    #[arg(long)]
    pub json: bool,
}
