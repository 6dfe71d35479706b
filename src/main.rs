//! Watchlist Sync - fills in missing metadata for a Notion watchlist
//!
//! Queries the watchlist database for entries with an empty Title or Poster,
//! scrapes each entry's IMDb page, and writes the title, poster and genres back.
//!
//! Exit codes: 0 when every pending record was updated, 1 when the run could
//! not start or the watchlist could not be queried, 2 when the run finished
//! but some records failed.

mod app_mode;
mod cli;
mod config;
mod error;
mod models;
mod services;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::app_mode::RunMode;
use crate::cli::CliOptions;
use crate::config::{Config, HttpConfig};
use crate::models::SyncOutcome;
use crate::services::{ImdbScraper, MetadataSource, NotionClient, SyncOrchestrator, init_tracing};

const EXIT_FATAL: u8 = 1;
const EXIT_PARTIAL_FAILURE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env first so RUST_LOG and LOG_FORMAT from it apply to the subscriber
    dotenvy::dotenv().ok();
    let options = CliOptions::from_args();
    init_tracing(options.verbose, options.log_format());

    match run(&options).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Sync aborted");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

async fn run(options: &CliOptions) -> Result<ExitCode> {
    let run_mode = options.run_mode();
    match &run_mode {
        // Lookup never touches the watchlist, so it needs no Notion credentials
        RunMode::Lookup(reference_url) => {
            let http = HttpConfig::from_env().context("Failed to load configuration")?;
            lookup(&http, reference_url).await
        }
        RunMode::Find(link) => find(&load_config()?, link).await,
        RunMode::Sync | RunMode::DryRun => {
            let config = load_config()?;
            tracing::info!(writes = run_mode.writes(), "Starting watchlist sync");
            let store = Arc::new(NotionClient::new(&config)?);
            let source = Arc::new(ImdbScraper::new(&config.http)?);

            let summary = SyncOrchestrator::new(store, source)
                .with_dry_run(run_mode == RunMode::DryRun)
                .run()
                .await
                .context("Failed to query the watchlist")?;

            Ok(match summary.outcome() {
                SyncOutcome::Clean => ExitCode::SUCCESS,
                SyncOutcome::PartialFailure => ExitCode::from(EXIT_PARTIAL_FAILURE),
            })
        }
    }
}

fn load_config() -> Result<Config> {
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::debug!(config = ?config, "Configuration loaded");
    Ok(config)
}

/// Scrape a single reference and print the result as JSON
async fn lookup(http: &HttpConfig, reference_url: &str) -> Result<ExitCode> {
    let scraper = ImdbScraper::new(http)?;
    match scraper.extract(reference_url).await {
        Ok(metadata) => {
            println!("{}", serde_json::to_string_pretty(&metadata)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!(reference_url = %reference_url, kind = e.kind(), error = %e, "Lookup failed");
            Ok(ExitCode::from(EXIT_PARTIAL_FAILURE))
        }
    }
}

/// Print watchlist records whose link contains `link`
async fn find(config: &Config, link: &str) -> Result<ExitCode> {
    let client = NotionClient::new(config)?;
    let records = client
        .find_by_link(link)
        .await
        .context("Failed to query the watchlist")?;

    if records.is_empty() {
        tracing::info!(link = %link, "No matching records");
    }
    for record in &records {
        let title = if record.title.is_empty() { "<untitled>" } else { record.title.as_str() };
        let state = if record.is_pending() { "pending" } else { "complete" };
        println!(
            "{}\t{}\t{}\t{}\t{}",
            record.id,
            state,
            title,
            record.reference_url,
            record.genres.join(", ")
        );
    }
    Ok(ExitCode::SUCCESS)
}
