//! Canonical region catalog loading.
//!
//! The catalog is a directory tree with one region record per file. Files
//! are walked recursively, filtered by `catalog.include_globs`, and loaded in
//! sorted path order so the matcher breaks ties the same way on every run.
//!
//! A file that cannot be read or parsed is skipped and reported in
//! [`CatalogLoad::errors`]: one broken record should not hide every other
//! region, but a skipped region lowers match accuracy and must be visible.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use region_recon_core::models::CanonicalRegion;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::CatalogConfig;

/// A region file that was skipped.
#[derive(Debug, Clone)]
pub struct CatalogError {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct CatalogLoad {
    pub regions: Vec<CanonicalRegion>,
    pub errors: Vec<CatalogError>,
}

pub fn load_catalog(config: &CatalogConfig) -> Result<CatalogLoad> {
    let root = &config.root;
    if !root.is_dir() {
        bail!("Catalog root does not exist: {}", root.display());
    }

    let include_set = build_globset(&config.include_globs)?;
    let exclude_set = build_globset(&["**/.git/**".to_string()])?;

    let mut load = CatalogLoad::default();

    let walker = WalkDir::new(root).sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                warn!(path = %path.display(), error = %e, "skipping unreadable catalog entry");
                load.errors.push(CatalogError {
                    path,
                    error: e.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy();

        if exclude_set.is_match(rel_str.as_ref()) || !include_set.is_match(rel_str.as_ref()) {
            continue;
        }

        match load_region(path) {
            Ok(region) => {
                debug!(id = %region.id, path = %rel_str, "loaded region");
                load.regions.push(region);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %format!("{:#}", e), "skipping catalog file");
                load.errors.push(CatalogError {
                    path: path.to_path_buf(),
                    error: format!("{:#}", e),
                });
            }
        }
    }

    info!(
        regions = load.regions.len(),
        skipped = load.errors.len(),
        root = %root.display(),
        "catalog loaded"
    );
    Ok(load)
}

/// Load one region record. JSON files parse too, as YAML is a superset.
fn load_region(path: &Path) -> Result<CanonicalRegion> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let region: CanonicalRegion = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    if region.id.trim().is_empty() {
        bail!("{}: region id is empty", path.display());
    }
    Ok(region)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config(root: &Path) -> CatalogConfig {
        CatalogConfig {
            root: root.to_path_buf(),
            ..CatalogConfig::default()
        }
    }

    #[test]
    fn test_loads_recursively_in_sorted_order() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("azure")).unwrap();
        fs::create_dir_all(root.join("aws")).unwrap();
        fs::write(
            root.join("azure/east-us.yaml"),
            "id: azure-east-us\nname: East US\nprovider: Azure\n",
        )
        .unwrap();
        fs::write(
            root.join("aws/us-east-1.yml"),
            "id: aws-us-east-1\nname: US East 1 (N. Virginia)\nprovider: AWS\n",
        )
        .unwrap();
        fs::write(
            root.join("aws/eu-central-1.json"),
            r#"{"id": "aws-eu-central-1", "name": "EU Central 1 (Frankfurt)", "provider": "AWS"}"#,
        )
        .unwrap();
        fs::write(root.join("README.md"), "# Regions").unwrap();

        let load = load_catalog(&config(root)).unwrap();
        assert!(load.errors.is_empty());
        let ids: Vec<&str> = load.regions.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["aws-eu-central-1", "aws-us-east-1", "azure-east-us"]);
    }

    #[test]
    fn test_bad_file_is_reported_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(
            root.join("a.yaml"),
            "id: azure-east-us\nname: East US\nprovider: Azure\n",
        )
        .unwrap();
        fs::write(root.join("b.yaml"), "id: [unterminated\n").unwrap();
        fs::write(root.join("c.yaml"), "id: ''\nname: Nowhere\nprovider: AWS\n").unwrap();

        let load = load_catalog(&config(root)).unwrap();
        assert_eq!(load.regions.len(), 1);
        assert_eq!(load.errors.len(), 2);
        assert!(load.errors[0].path.ends_with("b.yaml"));
        assert!(load.errors[1].error.contains("region id is empty"));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_catalog(&config(&tmp.path().join("nope"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
