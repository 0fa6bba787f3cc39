//! Discrepancy classification.
//!
//! [`reconcile`] resolves every scraped fact against the catalog and sorts
//! the mismatches into three buckets:
//!
//! - **Missing region**: no catalog region matched the fact.
//! - **Missing service**: the region matched but does not record the
//!   service, or (tiered service) does not record one of the fact's
//!   edition × tier combinations.
//! - **Extra service**: the catalog records a service for a region but no
//!   fact of this run corroborates it.
//!
//! The extra-service check deliberately over-reports: anything not seen in
//! the latest scrape is flagged for a human to confirm.
//!
//! Only services that produced at least one fact in the run take part in the
//! extra-service check. A service whose page failed to fetch, or whose page
//! parsed to nothing, would otherwise flag every region that records it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::matcher::RegionMatcher;
use crate::models::{AvailabilityFact, CanonicalRegion, Edition, Provider, Tier};
use crate::normalize::normalize_code;

/// A fact whose region is not in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingRegion {
    pub provider: Option<Provider>,
    pub region_name: String,
    pub region_code: Option<String>,
    pub service: String,
    pub source: Option<String>,
}

/// A catalog region that lacks a scraped service or edition × tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingService {
    pub region_id: String,
    pub region_name: String,
    pub provider: Provider,
    pub service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edition: Option<Vec<Edition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A catalog service the latest scrape did not corroborate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraService {
    pub region_id: String,
    pub region_name: String,
    pub provider: Provider,
    pub service: String,
    pub note: String,
}

/// One detected mismatch between the scrape and the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Discrepancy {
    MissingRegion(MissingRegion),
    MissingService(MissingService),
    ExtraService(ExtraService),
}

impl Discrepancy {
    /// Catalog id of the region involved. Always `None` for a missing
    /// region, always present otherwise.
    pub fn region_id(&self) -> Option<&str> {
        match self {
            Discrepancy::MissingRegion(_) => None,
            Discrepancy::MissingService(d) => Some(&d.region_id),
            Discrepancy::ExtraService(d) => Some(&d.region_id),
        }
    }

    pub fn service(&self) -> &str {
        match self {
            Discrepancy::MissingRegion(d) => &d.service,
            Discrepancy::MissingService(d) => &d.service,
            Discrepancy::ExtraService(d) => &d.service,
        }
    }

    /// URL of the page the discrepancy was derived from, when known.
    pub fn source(&self) -> Option<&str> {
        match self {
            Discrepancy::MissingRegion(d) => d.source.as_deref(),
            Discrepancy::MissingService(d) => d.source.as_deref(),
            Discrepancy::ExtraService(_) => None,
        }
    }
}

/// The three discrepancy buckets of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discrepancies {
    pub missing_regions: Vec<Discrepancy>,
    pub missing_services: Vec<Discrepancy>,
    pub extra_services: Vec<Discrepancy>,
}

impl Discrepancies {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.missing_regions.len() + self.missing_services.len() + self.extra_services.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Discrepancy> {
        self.missing_regions
            .iter()
            .chain(&self.missing_services)
            .chain(&self.extra_services)
    }
}

/// Services seen per region, built fresh for each run.
///
/// A matched fact counts for exactly the region it matched. An unmatched
/// fact counts under its scraped region code, which corroborates any region
/// whose normalized id contains it. Unmatched facts without a code count
/// for nothing.
#[derive(Debug, Default)]
pub struct ServiceCodeIndex {
    by_region: BTreeMap<String, BTreeSet<String>>,
    by_code: BTreeMap<String, BTreeSet<String>>,
}

impl ServiceCodeIndex {
    pub fn record(&mut self, fact: &AvailabilityFact, matched: Option<&CanonicalRegion>) {
        let entry = match matched {
            Some(region) => self.by_region.entry(region.id.clone()),
            None => {
                let code = fact
                    .region_code
                    .as_deref()
                    .map(normalize_code)
                    .unwrap_or_default();
                if code.is_empty() {
                    return;
                }
                self.by_code.entry(code)
            }
        };
        entry.or_default().insert(fact.service_key.clone());
    }

    /// Whether a fact matched to `region` listed `service`, or some scraped
    /// code contained in the region's normalized id did.
    pub fn corroborates(&self, region: &CanonicalRegion, service: &str) -> bool {
        if self
            .by_region
            .get(&region.id)
            .is_some_and(|services| services.contains(service))
        {
            return true;
        }
        let id = normalize_code(&region.id);
        self.by_code
            .iter()
            .any(|(code, services)| id.contains(code.as_str()) && services.contains(service))
    }
}

/// Classify every fact against the catalog.
///
/// Facts are processed in order and the catalog is read-only; the result
/// depends only on the two inputs.
pub fn reconcile(facts: &[AvailabilityFact], catalog: &[CanonicalRegion]) -> Discrepancies {
    let matcher = RegionMatcher::new(catalog);
    let mut index = ServiceCodeIndex::default();
    let mut seen: HashSet<(String, String, Option<Vec<Edition>>, Option<Tier>)> = HashSet::new();
    let mut out = Discrepancies::default();

    for fact in facts {
        let matched = matcher.find(fact);
        index.record(fact, matched);

        let Some(region) = matched else {
            out.missing_regions.push(Discrepancy::MissingRegion(MissingRegion {
                provider: fact.provider,
                region_name: fact.region_name.clone(),
                region_code: fact.region_code.clone(),
                service: fact.service_key.clone(),
                source: fact.source.clone(),
            }));
            continue;
        };

        for missing in missing_services(fact, region) {
            let key = (
                missing.region_id.clone(),
                missing.service.clone(),
                missing.edition.clone(),
                missing.tier,
            );
            if seen.insert(key) {
                out.missing_services.push(Discrepancy::MissingService(missing));
            }
        }
    }

    let scraped: BTreeSet<&str> = facts.iter().map(|f| f.service_key.as_str()).collect();
    out.extra_services = extra_services(catalog, &index, &scraped);
    out
}

fn missing_services(fact: &AvailabilityFact, region: &CanonicalRegion) -> Vec<MissingService> {
    let base = MissingService {
        region_id: region.id.clone(),
        region_name: region.name.clone(),
        provider: region.provider,
        service: fact.service_key.clone(),
        edition: None,
        tier: None,
        source: fact.source.clone(),
        note: None,
    };

    let Some(availability) = region.offered_service(&fact.service_key) else {
        return vec![MissingService {
            edition: fact.edition.clone(),
            tier: fact.tier,
            ..base
        }];
    };

    let (Some(editions), Some(tier)) = (&fact.edition, fact.tier) else {
        return Vec::new();
    };

    editions
        .iter()
        .filter(|edition| !availability.offers(**edition, tier))
        .map(|edition| MissingService {
            edition: Some(vec![*edition]),
            tier: Some(tier),
            note: Some(format!(
                "{} edition is listed for the {} tier but not recorded for this region",
                edition, tier
            )),
            ..base.clone()
        })
        .collect()
}

fn extra_services(
    catalog: &[CanonicalRegion],
    index: &ServiceCodeIndex,
    scraped: &BTreeSet<&str>,
) -> Vec<Discrepancy> {
    let mut extras = Vec::new();
    for region in catalog {
        for (service, availability) in &region.services {
            if !availability.is_offered() || !scraped.contains(service.as_str()) {
                continue;
            }
            if index.corroborates(region, service) {
                continue;
            }
            extras.push(Discrepancy::ExtraService(ExtraService {
                region_id: region.id.clone(),
                region_name: region.name.clone(),
                provider: region.provider,
                service: service.clone(),
                note: format!(
                    "{} is recorded for {} but was not found in the latest scrape; \
                     it may be stale or the page parser may have missed it",
                    service, region.name
                ),
            }));
        }
    }
    extras
}
