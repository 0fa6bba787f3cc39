//! # Region Recon
//!
//! Reconciles provider region availability published in vendor
//! documentation against a curated catalog of canonical regions.
//!
//! Pure logic (normalization, parsing, matching, reconciliation, the report
//! shape) lives in `region-recon-core`. This crate adds the I/O around it:
//! configuration, the catalog directory, HTTP fetching with retry, and the
//! concurrent run that ties them together.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌─────────────┐
//! │ Source pages │──▶│ Parse (table, │──▶│  Reconcile  │──▶ report.json
//! │ fetch+retry  │   │ tiered lists) │   │ vs. catalog │
//! └──────────────┘   └───────────────┘   └──────▲──────┘
//!                                               │
//!                                        ┌──────┴──────┐
//!                                        │ data/regions│
//!                                        └─────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`sources`] | Tracked services and their parsers |
//! | [`catalog`] | Canonical region catalog loading |
//! | [`fetch`] | Page fetching with retry and backoff |
//! | [`run`] | Run orchestration and report output |

pub mod catalog;
pub mod config;
pub mod fetch;
pub mod run;
pub mod sources;
