//! One reconciliation run, end to end.
//!
//! Loads the catalog, fetches and parses every tracked source concurrently,
//! reconciles the collected facts, and builds the report. A source that
//! cannot be fetched is recorded in the report's `errors` and the remaining
//! sources are still reconciled; a failed service contributes no facts, so
//! it is also never flagged for extra services.

use anyhow::{Context, Result};
use chrono::Utc;
use region_recon_core::matcher::RegionMatcher;
use region_recon_core::models::{AvailabilityFact, CanonicalRegion};
use region_recon_core::report::{DiscrepancyReport, FetchFailure};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::catalog::{load_catalog, CatalogError};
use crate::config::{Config, SourceConfig};
use crate::fetch::PageFetcher;

/// The report plus catalog files that were skipped while loading.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: DiscrepancyReport,
    pub catalog_errors: Vec<CatalogError>,
}

type SourceResult = Result<Vec<AvailabilityFact>, FetchFailure>;

pub async fn run_reconciliation(
    config: &Config,
    fetcher: Arc<dyn PageFetcher>,
) -> Result<RunOutcome> {
    let catalog = load_catalog(&config.catalog)?;

    let results = collect_sources(&config.sources, fetcher).await;

    let mut facts = Vec::new();
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(mut source_facts) => facts.append(&mut source_facts),
            Err(failure) => errors.push(failure),
        }
    }

    log_matches(&facts, &catalog.regions);

    let report = DiscrepancyReport::build(&facts, &catalog.regions, errors, Utc::now());
    info!(
        scraped = report.scraped_count,
        catalog = report.current_count,
        discrepancies = report.discrepancies.len(),
        failed_sources = report.errors.len(),
        "reconciliation complete"
    );

    Ok(RunOutcome {
        report,
        catalog_errors: catalog.errors,
    })
}

/// Fetch and parse every source, one task each. Results come back in
/// source order regardless of completion order.
async fn collect_sources(
    sources: &[SourceConfig],
    fetcher: Arc<dyn PageFetcher>,
) -> Vec<SourceResult> {
    let mut tasks = JoinSet::new();
    for (index, source) in sources.iter().enumerate() {
        let source = source.clone();
        let fetcher = Arc::clone(&fetcher);
        tasks.spawn(async move { (index, scrape_source(&source, fetcher.as_ref()).await) });
    }

    let mut slots: Vec<Option<SourceResult>> = sources.iter().map(|_| None).collect();
    let mut join_errors = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(e) => {
                warn!(error = %e, "source task did not complete");
                join_errors.push(e.to_string());
            }
        }
    }

    // A task that panicked never reported its index; every empty slot
    // belongs to one of them.
    let join_error = join_errors.join("; ");
    slots
        .into_iter()
        .zip(sources)
        .map(|(slot, source)| {
            slot.unwrap_or_else(|| {
                Err(FetchFailure {
                    service_key: source.service.clone(),
                    url: source.url.clone(),
                    error: format!("source task did not complete: {}", join_error),
                })
            })
        })
        .collect()
}

async fn scrape_source(source: &SourceConfig, fetcher: &dyn PageFetcher) -> SourceResult {
    let markup = match fetcher.fetch_text(&source.url).await {
        Ok(markup) => markup,
        Err(e) => {
            warn!(service = %source.service, url = %source.url, error = %e, "fetch failed");
            return Err(FetchFailure {
                service_key: source.service.clone(),
                url: source.url.clone(),
                error: e.to_string(),
            });
        }
    };

    let facts: Vec<AvailabilityFact> = source
        .parse(&markup)
        .into_iter()
        .map(|fact| fact.with_source(&source.url))
        .collect();

    if facts.is_empty() {
        // Usually a page layout change, not a service with no regions.
        warn!(service = %source.service, url = %source.url, "page yielded no regions");
    } else {
        info!(service = %source.service, facts = facts.len(), "scraped");
    }
    Ok(facts)
}

fn log_matches(facts: &[AvailabilityFact], catalog: &[CanonicalRegion]) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    let matcher = RegionMatcher::new(catalog);
    for fact in facts {
        match matcher.find_with_rule(fact) {
            Some((region, rule)) => debug!(
                service = %fact.service_key,
                name = %fact.region_name,
                region = %region.id,
                %rule,
                "matched"
            ),
            None => debug!(service = %fact.service_key, name = %fact.region_name, "unmatched"),
        }
    }
}

/// Write `report` as pretty JSON, creating parent directories.
pub fn write_report(report: &DiscrepancyReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create report directory: {}", parent.display())
            })?;
        }
    }
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(path, json + "\n")
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    info!(path = %path.display(), "report written");
    Ok(())
}

/// Human-readable run summary for stdout.
pub fn print_summary(outcome: &RunOutcome, report_path: &Path) {
    let report = &outcome.report;
    let d = &report.discrepancies;
    println!("reconcile");
    println!("  scraped facts: {}", report.scraped_count);
    println!("  catalog regions: {}", report.current_count);
    println!("  missing regions: {}", d.missing_regions.len());
    println!("  missing services: {}", d.missing_services.len());
    println!("  extra services: {}", d.extra_services.len());
    if !report.errors.is_empty() {
        println!("  failed sources: {}", report.errors.len());
        for failure in &report.errors {
            println!("    {}: {}", failure.service_key, failure.error);
        }
    }
    if !outcome.catalog_errors.is_empty() {
        println!("  skipped catalog files: {}", outcome.catalog_errors.len());
    }
    println!("  report: {}", report_path.display());
}
