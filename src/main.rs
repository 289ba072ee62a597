//! label-adapter-rs — Rust rewrite of the BlackBerry Radar label adapter.
//!
//! One-shot batch job: derives maintenance-due labels per tracked asset from
//! CSV reports, reconciles them against the Radar REST API (create missing
//! labels, delete stale ones), then archives the processed reports. Token
//! minting uses an ES256-signed OAuth2 JWT-bearer assertion; each API call
//! retries exactly once after refreshing its scoped token on 401/403.

#![warn(clippy::all)]

mod archive;
mod cli;
mod config;
mod radar;
mod reports;
mod sync;
mod types;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use archive::Archiver;
use config::Config;
use radar::RadarClient;
use reports::{DesiredLabels, Whitelist};
use types::{LogLevel, TestLevel};

/// Log to stderr and to `app.log` inside the run's archive directory.
/// The returned guard must stay alive until exit so buffered lines flush.
fn init_logging(
    level: LogLevel,
    run_dir: &std::path::Path,
) -> tracing_appender::non_blocking::WorkerGuard {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(run_dir, "app.log"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();
    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = Config::from_cli(cli)?;

    let archiver = Archiver::create(&config.archive_dir)?;
    let _log_guard = init_logging(config.log_level, archiver.run_dir());
    archiver.prune(config.max_archived_runs);

    tracing::info!(
        "Updating labels from CSVs in {}. Files will be archived to {}.",
        config.report_dir.display(),
        archiver.run_dir().display()
    );

    let csv_files = reports::find_csv_files(&config.report_dir)?;
    if csv_files.is_empty() {
        tracing::info!("No CSV reports found in {}", config.report_dir.display());
        return Ok(());
    }

    let whitelist = Whitelist::load(&config.whitelist_path)?;
    let mut desired = DesiredLabels::default();
    for file in &csv_files {
        if let Err(e) = reports::process_report(file, &whitelist, &mut desired) {
            tracing::error!("Failed to process report {}: {e}", file.display());
        }
    }
    tracing::debug!(
        "{} report(s) yielded labels for {} asset(s)",
        csv_files.len(),
        desired.asset_count()
    );

    let mut client = RadarClient::new(&config.key_path, &config.client_id, config.test_level)?;
    let totals = sync::reconcile(&mut client, &desired).await;
    tracing::info!(
        assets = totals.assets,
        added = totals.labels_added,
        deleted = totals.labels_deleted,
        "Label sync complete"
    );

    // Best-effort sync: archive even when individual label operations failed
    archiver.archive(&csv_files, config.test_level != TestLevel::Production);
    Ok(())
}
