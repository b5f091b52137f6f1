//! Prospector command line interface
//!
//! Reads a CSV of tax identifiers, enriches every row through the record
//! service, and writes the result next to the input columns. A background
//! task keeps the session alive for the whole run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use prospector_core::{EnrichmentPipeline, RowSource, SessionRefresher};
use prospector_infra::auth::{CredentialManager, SessionStore};
use prospector_infra::io::{CsvRowSink, CsvRowSource};
use prospector_infra::queries::RecordClient;
use prospector_infra::scheduling::{RefreshScheduler, RefreshSchedulerConfig};
use prospector_infra::HttpClient;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Enrich a CSV of CPF/CNPJ values with prospect, negotiation and
/// installation data from the record service.
#[derive(Debug, Parser)]
#[command(name = "prospector", version, about)]
struct Cli {
    /// Input CSV file; must contain a CPF_CNPJ column
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV file
    #[arg(short, long, default_value = "output.csv")]
    output: PathBuf,

    /// Session refresh interval in seconds (overrides configuration)
    #[arg(long)]
    refresh_interval: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load environment variables from .env file
    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "Loaded .env file"),
        Err(e) => warn!(error = %e, "Could not load .env file"),
    }

    let cli = Cli::parse();

    let mut config = prospector_infra::config::load().context("loading configuration")?;
    if let Some(interval) = cli.refresh_interval {
        config.refresh.interval_seconds = interval;
    }

    let http = HttpClient::builder()
        .timeout(Duration::from_secs(config.api.timeout_secs))
        .build()
        .context("building HTTP client")?;
    let store = SessionStore::new();
    let manager = Arc::new(CredentialManager::new(http.clone(), config.api.clone(), store.clone()));

    // The first login must succeed before any row is processed
    manager.refresh().await.context("initial authentication failed")?;

    let refresher: Arc<dyn SessionRefresher> = manager;
    let mut scheduler = RefreshScheduler::new(
        refresher,
        RefreshSchedulerConfig {
            interval: Duration::from_secs(config.refresh.interval_seconds),
            ..RefreshSchedulerConfig::default()
        },
    );
    scheduler.start().await.context("starting refresh scheduler")?;

    let mut source = CsvRowSource::open(&cli.input)
        .with_context(|| format!("opening input {}", cli.input.display()))?;
    let mut sink = CsvRowSink::create(&cli.output, source.headers())
        .with_context(|| format!("creating output {}", cli.output.display()))?;

    let lookup = Arc::new(RecordClient::new(http, config.api, store));
    let pipeline = EnrichmentPipeline::new(lookup);
    let run_result = pipeline.run(&mut source, &mut sink).await;

    // Stop the keep-alive task before reporting the run's outcome
    if let Err(e) = scheduler.stop().await {
        warn!(error = %e, "refresh scheduler did not stop cleanly");
    }

    let summary = run_result.context("enrichment run failed")?;
    info!(
        rows = summary.rows,
        enriched = summary.enriched,
        failed = summary.failed,
        output = %cli.output.display(),
        "done"
    );
    println!(
        "{} rows processed ({} enriched, {} with errors) -> {}",
        summary.rows,
        summary.enriched,
        summary.failed,
        cli.output.display()
    );

    Ok(())
}
