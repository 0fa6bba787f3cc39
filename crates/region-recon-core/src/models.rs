//! Core data models for availability reconciliation.
//!
//! Two inputs meet in this crate: [`AvailabilityFact`]s scraped from provider
//! documentation and [`CanonicalRegion`] records from the curated catalog.
//! Both are plain data; neither is mutated once built.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Cloud provider hosting a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "AWS")]
    Aws,
    #[serde(rename = "Azure")]
    Azure,
    /// Any provider this engine does not scrape. Catalog records with an
    /// unknown provider still load; provider-scoped facts never match them.
    #[serde(other)]
    Other,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Aws => "AWS",
            Provider::Azure => "Azure",
            Provider::Other => "Other",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edition level of the tiered service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Edition {
    Foundation,
    Advanced,
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edition::Foundation => f.write_str("Foundation"),
            Edition::Advanced => f.write_str("Advanced"),
        }
    }
}

/// Pricing tier of the tiered service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Core,
    #[serde(rename = "Non-Core")]
    NonCore,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Core => f.write_str("Core"),
            Tier::NonCore => f.write_str("Non-Core"),
        }
    }
}

/// One assertion scraped from a documentation page: `service_key` is
/// available in the region called `region_name`.
///
/// `edition` is a list because a single bullet can assert several edition
/// levels at once (a region offering both Foundation and Advanced at a tier).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityFact {
    pub provider: Option<Provider>,
    pub region_name: String,
    pub region_code: Option<String>,
    pub service_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edition: Option<Vec<Edition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    /// URL of the page the fact was scraped from. Attached by the caller
    /// after parsing; parsers leave it empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl AvailabilityFact {
    /// A boolean-service fact with no edition or tier.
    pub fn new(provider: Option<Provider>, region_name: &str, service_key: &str) -> Self {
        Self {
            provider,
            region_name: region_name.to_string(),
            region_code: None,
            service_key: service_key.to_string(),
            edition: None,
            tier: None,
            source: None,
        }
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.region_code = Some(code.to_string());
        self
    }

    pub fn with_tiering(mut self, editions: Vec<Edition>, tier: Tier) -> Self {
        self.edition = Some(editions);
        self.tier = Some(tier);
        self
    }

    pub fn with_source(mut self, url: &str) -> Self {
        self.source = Some(url.to_string());
        self
    }
}

/// One recorded edition × tier combination of the tiered service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EditionTier {
    pub edition: Edition,
    pub tier: Tier,
}

/// Availability of one service in a catalog region.
///
/// Simple services are a boolean flag; the tiered service lists its
/// edition × tier combinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceAvailability {
    Flag(bool),
    Tiers(Vec<EditionTier>),
}

impl ServiceAvailability {
    /// `false` flags and empty tier lists mean the service is not offered.
    pub fn is_offered(&self) -> bool {
        match self {
            ServiceAvailability::Flag(flag) => *flag,
            ServiceAvailability::Tiers(tiers) => !tiers.is_empty(),
        }
    }

    /// Whether the combination is recorded. A plain `true` flag carries no
    /// tier detail and counts as offering every combination.
    pub fn offers(&self, edition: Edition, tier: Tier) -> bool {
        match self {
            ServiceAvailability::Flag(flag) => *flag,
            ServiceAvailability::Tiers(tiers) => tiers
                .iter()
                .any(|et| et.edition == edition && et.tier == tier),
        }
    }
}

/// Map position of a region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

/// One row of the curated region catalog. Read-only to this engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRegion {
    pub id: String,
    pub name: String,
    pub provider: Provider,
    #[serde(default)]
    pub coords: Option<Coords>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub services: BTreeMap<String, ServiceAvailability>,
}

impl CanonicalRegion {
    pub fn new(id: &str, name: &str, provider: Provider) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            provider,
            coords: None,
            aliases: Vec::new(),
            services: BTreeMap::new(),
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn with_service(mut self, key: &str, availability: ServiceAvailability) -> Self {
        self.services.insert(key.to_string(), availability);
        self
    }

    /// The service entry, if the region records it as offered.
    pub fn offered_service(&self, key: &str) -> Option<&ServiceAvailability> {
        self.services.get(key).filter(|s| s.is_offered())
    }
}
