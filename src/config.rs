//! TOML configuration.
//!
//! Every setting has a default, so the tool runs with no config file at all.
//! A file at the `--config` path (default `./config/recon.toml`) overrides
//! any subset of sections:
//!
//! ```toml
//! [catalog]
//! root = "data/regions"
//!
//! [report]
//! path = "discrepancy-report.json"
//!
//! [fetch]
//! max_attempts = 3
//! base_delay_ms = 1000
//!
//! [[sources]]
//! service = "vdc_m365"
//! url = "https://example.com/m365-regions.html"
//! parser = "table"
//! provider = "Azure"
//! ```
//!
//! Declaring any `[[sources]]` replaces the built-in list entirely.

use anyhow::{bail, Context, Result};
use region_recon_core::models::Provider;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::sources::builtin_sources;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default = "builtin_sources")]
    pub sources: Vec<SourceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            report: ReportConfig::default(),
            fetch: FetchConfig::default(),
            sources: builtin_sources(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_root")]
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            root: default_catalog_root(),
            include_globs: default_include_globs(),
        }
    }
}

fn default_catalog_root() -> PathBuf {
    PathBuf::from("data/regions")
}

fn default_include_globs() -> Vec<String> {
    vec![
        "**/*.yaml".to_string(),
        "**/*.yml".to_string(),
        "**/*.json".to_string(),
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    #[serde(default = "default_report_path")]
    pub path: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: default_report_path(),
        }
    }
}

fn default_report_path() -> PathBuf {
    PathBuf::from("discrepancy-report.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    1000
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0 Safari/537.36"
        .to_string()
}

/// Which parser reads a source page.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    Table,
    Tiered,
}

/// One tracked service: its key in the catalog, the page it is scraped
/// from, and how that page is parsed.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub service: String,
    pub url: String,
    pub parser: ParserKind,
    /// Provider stamped on every fact from a `table` page. Tiered pages name
    /// their providers inline.
    #[serde(default)]
    pub provider: Option<Provider>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.fetch.max_attempts == 0 {
            bail!("fetch.max_attempts must be >= 1");
        }
        if self.fetch.timeout_secs == 0 {
            bail!("fetch.timeout_secs must be >= 1");
        }
        if self.catalog.include_globs.is_empty() {
            bail!("catalog.include_globs must not be empty");
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if source.service.trim().is_empty() {
                bail!("sources: service key must not be empty");
            }
            if !seen.insert(source.service.as_str()) {
                bail!("sources: duplicate service '{}'", source.service);
            }
            if !(source.url.starts_with("http://") || source.url.starts_with("https://")) {
                bail!(
                    "sources.{}: url must be http(s), got '{}'",
                    source.service,
                    source.url
                );
            }
            if source.parser == ParserKind::Table && source.provider.is_none() {
                bail!(
                    "sources.{}: provider is required for table sources",
                    source.service
                );
            }
        }

        Ok(())
    }
}

/// Load and validate the config at `path`, falling back to built-in
/// defaults when the file does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Config::default()
    };

    config.validate()?;
    Ok(config)
}
