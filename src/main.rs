//! # Region Recon CLI (`region-recon`)
//!
//! Runs one reconciliation and writes the discrepancy report.
//!
//! ## Usage
//!
//! ```bash
//! region-recon [REPORT_PATH] --config ./config/recon.toml
//! ```
//!
//! The process exits 0 when the report has no discrepancies and no failed
//! sources, and 1 otherwise, so a scheduled pipeline can gate on it.
//!
//! ## Examples
//!
//! ```bash
//! # Default config, report at ./discrepancy-report.json
//! region-recon
//!
//! # Explicit report path and catalog directory
//! region-recon out/report.json --catalog ./data/regions
//!
//! # Show what would be scraped
//! region-recon --list-sources
//!
//! # Log every match decision
//! RUST_LOG=region_recon=debug region-recon
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use region_recon::config::load_config;
use region_recon::fetch::http_fetcher;
use region_recon::run::{print_summary, run_reconciliation, write_report};
use region_recon::sources::list_sources;

/// Reconcile documented region availability against the region catalog.
#[derive(Parser)]
#[command(name = "region-recon", version)]
struct Cli {
    /// Where to write the JSON report. Overrides `report.path`.
    report_path: Option<PathBuf>,

    /// Path to configuration file (TOML). Built-in defaults apply when the
    /// file does not exist.
    #[arg(long, default_value = "./config/recon.toml")]
    config: PathBuf,

    /// Catalog directory. Overrides `catalog.root`.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// List tracked sources and exit.
    #[arg(long)]
    list_sources: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut cfg = load_config(&cli.config)?;
    if let Some(path) = cli.report_path {
        cfg.report.path = path;
    }
    if let Some(root) = cli.catalog {
        cfg.catalog.root = root;
    }

    if cli.list_sources {
        list_sources(&cfg);
        return Ok(ExitCode::SUCCESS);
    }

    let fetcher = Arc::new(http_fetcher(&cfg.fetch)?);
    let outcome = run_reconciliation(&cfg, fetcher).await?;
    write_report(&outcome.report, &cfg.report.path)?;
    print_summary(&outcome, &cfg.report.path);

    Ok(ExitCode::from(outcome.report.exit_code()))
}
