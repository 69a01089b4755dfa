//! SBF scraper command line entry point.
//!
//! Thin shell: loads configuration, owns the browser session for the crawl
//! and hands the collected records to the exporter. Crawl logic lives in the
//! `crates/` directory.

use anyhow::Context;
use clap::Parser;
use sbf_browser::BrowserEngine;
use sbf_core::AppConfig;
use sbf_export::TabularExporter;
use sbf_scanner::{CrawlReport, Orchestrator};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{error, info};

/// Error log written next to the working directory.
const ERROR_LOG: &str = "app.log";

#[derive(Parser)]
#[command(
    name = "sbf",
    about = "Scrape HDB sale-of-balance flats into an xlsx workbook",
    version
)]
struct Cli {
    /// Name of file to save to (".xlsx" is appended when missing).
    #[arg(short = 'f', long = "file")]
    file: Option<String>,

    /// Path to a config file instead of the platform default.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the default configuration (to --config or the platform path) and exit.
    #[arg(long)]
    init_config: bool,
}

/// Initialize tracing: console output plus errors appended to `app.log`.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sbf=debug"));

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(ERROR_LOG)
        .with_context(|| format!("opening {ERROR_LOG}"))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file))
                .with_filter(LevelFilter::ERROR),
        )
        .with(filter)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    info!("Starting sbf v{}", env!("CARGO_PKG_VERSION"));

    if cli.init_config {
        let path = match cli.config.as_deref() {
            Some(path) => {
                AppConfig::default().save_to(path)?;
                path.to_path_buf()
            }
            None => AppConfig::default().save()?,
        };
        info!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config =
        AppConfig::load_with_env(cli.config.as_deref()).context("loading configuration")?;

    let engine = BrowserEngine::launch(&config.browser)
        .await
        .context("launching browser")?;

    let crawl = Orchestrator::new(&engine, &config).run().await;

    // The browser is closed before export, whether or not the crawl finished
    let report = finish_crawl(crawl, engine.shutdown().await)?;

    info!(
        "{} towns crawled, {} faulty",
        report.towns,
        report.faulty_links.len()
    );

    let path = TabularExporter::new(&config.output)
        .export(&report.dataset, cli.file.as_deref())
        .context("exporting workbook")?;

    info!("Saved {} units to {}", report.dataset.len(), path.display());
    Ok(())
}

/// A failed browser close is logged and never discards a finished crawl.
fn finish_crawl(
    crawl: sbf_scanner::Result<CrawlReport>,
    closed: sbf_browser::Result<()>,
) -> anyhow::Result<CrawlReport> {
    if let Err(e) = closed {
        error!("Failed to close browser: {}", e);
    }
    crawl.context("crawl aborted")
}
