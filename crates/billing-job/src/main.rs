//! Billing Job - command line entry point

use anyhow::Result;
use billing_common::logging::{init_logging, LogConfig, LogLevel};
use billing_job::{launcher, BatchConfig, Cli, Commands};
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbose flag
    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over the flag
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("billing-job")
        .build()
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    let config = BatchConfig::from_env()?;

    match cli.command {
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        },
        Commands::Run(args) => {
            info!(input = %args.input_file, "Starting billing job");
            let execution = launcher::run(&config, &args).await?;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&execution)?);
            } else {
                println!("{}", execution);
            }

            if !execution.is_completed() {
                let reason = execution
                    .failure
                    .as_ref()
                    .map(|f| f.message.clone())
                    .unwrap_or_else(|| "unknown failure".to_string());
                error!(execution_id = %execution.id, "Billing job failed");
                anyhow::bail!("Billing job {} failed: {}", execution.id, reason);
            }

            info!(execution_id = %execution.id, "Billing job completed");
        },
    }

    Ok(())
}
