//! # Region Recon Core
//!
//! Pure reconciliation logic for region-recon: availability models, region
//! name normalization, documentation page parsers, the ordered region
//! matcher, and discrepancy classification.
//!
//! This crate contains no tokio, reqwest, filesystem I/O, or logging. Every
//! function is deterministic given its inputs, so the whole pipeline below
//! can be exercised from plain unit tests.
//!
//! ```text
//! markup ──▶ parse ──▶ AvailabilityFact ──▶ matcher ──▶ reconcile ──▶ report
//!                                             ▲
//!                              CanonicalRegion catalog
//! ```

pub mod matcher;
pub mod models;
pub mod normalize;
pub mod parse;
pub mod reconcile;
pub mod report;
