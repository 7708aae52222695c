//! jobfeed CLI
//!
//! Local execution entry point: one-off runs, scheduled runs and inspection.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use jobfeed::{
    config::load_config,
    error::{AppError, Result},
    models::Config,
    pipeline::{self, Pipeline},
    services::{SourceAdapter, build_sources},
    storage::{JobStorage, LocalStorage},
    utils::http,
};

/// jobfeed - job posting ingestion and notification
#[derive(Parser, Debug)]
#[command(
    name = "jobfeed",
    version,
    about = "Collect, summarize and announce new job postings"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one pass over every enabled source
    Run {
        /// Only run this source
        #[arg(long)]
        source: Option<String>,
    },

    /// Run passes on a fixed interval until Ctrl-C
    Watch {
        /// Override schedule.interval_secs
        #[arg(long)]
        interval_secs: Option<u64>,
    },

    /// Validate configuration and selectors
    Validate,

    /// Show ledger and record counts per source
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            log::warn!("Ignoring unreadable .env file: {}", e);
        }
    }
}

fn select_sources(
    sources: Vec<Box<dyn SourceAdapter>>,
    only: Option<&str>,
) -> Result<Vec<Box<dyn SourceAdapter>>> {
    let Some(name) = only else {
        return Ok(sources);
    };
    let selected: Vec<_> = sources.into_iter().filter(|s| s.name() == name).collect();
    if selected.is_empty() {
        return Err(AppError::config(format!(
            "No enabled source named '{name}'"
        )));
    }
    Ok(selected)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    load_dotenv();

    log::info!("jobfeed starting...");

    let config: Config = load_config(&cli.config)?;
    config.validate()?;
    log::info!("Loaded configuration from {}", cli.config.display());

    let client = http::create_async_client(&config.crawler)?;
    let sources = build_sources(&config, &client)?;

    match cli.command {
        Command::Run { source } => {
            let sources = select_sources(sources, source.as_deref())?;
            let pipeline = Pipeline::from_config(&config, &client)?;

            let results = pipeline.run_all(&sources).await;
            pipeline::log_pass_summary(&results);
        }

        Command::Watch { interval_secs } => {
            let interval =
                Duration::from_secs(interval_secs.unwrap_or(config.schedule.interval_secs).max(1));
            let pipeline = Pipeline::from_config(&config, &client)?;

            log::info!("Watching {} sources every {}s", sources.len(), interval.as_secs());
            let passes = pipeline::run_scheduled(&pipeline, &sources, interval).await?;
            log::info!("Stopped after {} passes", passes);
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            log::info!("✓ Config OK, {} sources with valid selectors", sources.len());

            if config.ai.api_key.trim().is_empty() {
                log::warn!("AI API key is not set; `run` and `watch` will refuse to start");
            }
            if !config.notifier.enabled {
                log::warn!("Notifier disabled; messages will only be logged");
            }

            log::info!("All validations passed!");
        }

        Command::Info => {
            let storage = LocalStorage::new(&config.storage.root);
            log::info!("Storage directory: {}", storage.root().display());

            for source in &sources {
                let ledger = storage.load_ledger(source.name()).await?;
                let records = storage.record_count(source.name()).await?;
                log::info!(
                    "  {}: {} listings seen, {} records",
                    source.name(),
                    ledger.len(),
                    records
                );
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
