//! Tracked services and their source pages.
//!
//! Each tracked service is scraped from exactly one documentation page with
//! exactly one parser. Services recorded in the catalog but absent from this
//! list are maintained by hand and never scraped.
//!
//! | Service | Parser | Provider |
//! |---------|--------|----------|
//! | `vdc_m365` | table | Azure |
//! | `vdc_entra_id` | table | Azure |
//! | `vdc_azure_backup` | table | Azure |
//! | `vdc_salesforce` | table | AWS |
//! | `vdc_vault` | tiered | per page section |

use region_recon_core::models::{AvailabilityFact, Provider};
use region_recon_core::parse::{parse_availability_table, parse_tiered_availability};
use serde::Serialize;

use crate::config::{Config, ParserKind, SourceConfig};

const DOCS_BASE: &str = "https://helpcenter.veeam.com/docs/vdc/userguide";

fn table_source(service: &str, page: &str, provider: Provider) -> SourceConfig {
    SourceConfig {
        service: service.to_string(),
        url: format!("{}/{}", DOCS_BASE, page),
        parser: ParserKind::Table,
        provider: Some(provider),
    }
}

/// The services tracked when the config declares no `[[sources]]`.
pub fn builtin_sources() -> Vec<SourceConfig> {
    vec![
        table_source("vdc_m365", "m365_regions.html", Provider::Azure),
        table_source("vdc_entra_id", "entra_id_regions.html", Provider::Azure),
        table_source("vdc_azure_backup", "azure_regions.html", Provider::Azure),
        table_source("vdc_salesforce", "salesforce_regions.html", Provider::Aws),
        SourceConfig {
            service: "vdc_vault".to_string(),
            url: format!("{}/vault_regions.html", DOCS_BASE),
            parser: ParserKind::Tiered,
            provider: None,
        },
    ]
}

impl SourceConfig {
    /// Run this source's parser over fetched markup.
    ///
    /// Table sources are validated to carry a provider; a missing one yields
    /// no facts rather than unattributed ones.
    pub fn parse(&self, markup: &str) -> Vec<AvailabilityFact> {
        match (self.parser, self.provider) {
            (ParserKind::Table, Some(provider)) => {
                parse_availability_table(markup, &self.service, provider)
            }
            (ParserKind::Table, None) => Vec::new(),
            (ParserKind::Tiered, _) => parse_tiered_availability(markup, &self.service),
        }
    }
}

/// One row of `region-recon --list-sources`.
#[derive(Debug, Clone, Serialize)]
pub struct SourceStatus {
    pub service: String,
    pub parser: &'static str,
    pub provider: Option<String>,
    pub url: String,
}

pub fn get_sources(config: &Config) -> Vec<SourceStatus> {
    config
        .sources
        .iter()
        .map(|source| SourceStatus {
            service: source.service.clone(),
            parser: match source.parser {
                ParserKind::Table => "table",
                ParserKind::Tiered => "tiered",
            },
            provider: source.provider.map(|p| p.to_string()),
            url: source.url.clone(),
        })
        .collect()
}

pub fn list_sources(config: &Config) {
    println!("{:<20} {:<8} {:<9} URL", "SERVICE", "PARSER", "PROVIDER");
    for status in get_sources(config) {
        println!(
            "{:<20} {:<8} {:<9} {}",
            status.service,
            status.parser,
            status.provider.as_deref().unwrap_or("-"),
            status.url
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_sources_are_unique_and_https() {
        let sources = builtin_sources();
        let mut services: Vec<&str> = sources.iter().map(|s| s.service.as_str()).collect();
        services.sort();
        services.dedup();
        assert_eq!(services.len(), sources.len());
        assert!(sources.iter().all(|s| s.url.starts_with("https://")));
        assert_eq!(
            sources
                .iter()
                .filter(|s| s.parser == ParserKind::Tiered)
                .count(),
            1
        );
    }

    #[test]
    fn test_table_source_dispatch() {
        let source = table_source("vdc_salesforce", "x.html", Provider::Aws);
        let facts = source.parse("<table><tr><td>AMER</td><td>US East 1</td></tr></table>");
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].provider, Some(Provider::Aws));
        assert_eq!(facts[0].service_key, "vdc_salesforce");
    }

    #[test]
    fn test_tiered_source_dispatch() {
        let source = SourceConfig {
            service: "vdc_vault".to_string(),
            url: "https://example.com/vault".to_string(),
            parser: ParserKind::Tiered,
            provider: None,
        };
        let html = "<h2>Microsoft Azure</h2><h3>Core Regions</h3><ul><li>East US</li></ul>";
        let facts = source.parse(html);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].provider, Some(Provider::Azure));
        assert!(facts[0].tier.is_some());
    }

    #[test]
    fn test_get_sources_lists_config_order() {
        let config = Config::default();
        let statuses = get_sources(&config);
        assert_eq!(statuses.len(), config.sources.len());
        assert_eq!(statuses[0].service, config.sources[0].service);
    }
}
