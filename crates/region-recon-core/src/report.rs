//! The discrepancy report produced by one run.
//!
//! A report is built fresh for every run and handed to the caller; this
//! crate never persists it. Field names are camelCase so the serialized
//! document can be read by the downstream notification formatter as is:
//!
//! ```json
//! {
//!   "timestamp": "2026-10-19T06:00:00Z",
//!   "scrapedCount": 182,
//!   "currentCount": 96,
//!   "discrepancies": {
//!     "missingRegions": [],
//!     "missingServices": [],
//!     "extraServices": []
//!   },
//!   "errors": []
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{AvailabilityFact, CanonicalRegion};
use crate::reconcile::{reconcile, Discrepancies};

/// A tracked service whose page could not be fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchFailure {
    pub service_key: String,
    pub url: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscrepancyReport {
    pub timestamp: DateTime<Utc>,
    /// Facts scraped across all services that fetched successfully.
    pub scraped_count: usize,
    /// Regions in the catalog.
    pub current_count: usize,
    pub discrepancies: Discrepancies,
    pub errors: Vec<FetchFailure>,
}

impl DiscrepancyReport {
    /// Reconcile `facts` against `catalog` and wrap the result with the
    /// run's fetch failures.
    pub fn build(
        facts: &[AvailabilityFact],
        catalog: &[CanonicalRegion],
        errors: Vec<FetchFailure>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp,
            scraped_count: facts.len(),
            current_count: catalog.len(),
            discrepancies: reconcile(facts, catalog),
            errors,
        }
    }

    /// Any discrepancy or fetch failure.
    pub fn has_findings(&self) -> bool {
        !self.discrepancies.is_empty() || !self.errors.is_empty()
    }

    /// Process exit code for pipeline gating: 0 when clean, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.has_findings() {
            1
        } else {
            0
        }
    }
}
