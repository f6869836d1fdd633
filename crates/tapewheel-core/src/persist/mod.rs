//! Archive document persistence.
//!
//! The canonical format is YAML (`.yml` / `.yaml`). A read-only importer
//! for the legacy line-oriented `key>value` format (`.object`) is kept so
//! existing fleets can migrate without rewriting documents by hand; the
//! manager never writes that format back.

mod legacy;
mod yaml;

pub use legacy::load_legacy;
pub use yaml::{load_yaml, store_yaml, to_yaml_string};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::archive::ArchiveRecord;
use crate::error::{Error, Result};

/// Canonical document extensions, in preference order.
pub const YAML_EXTENSIONS: [&str; 2] = ["yml", "yaml"];

/// Legacy read-only document extension.
pub const LEGACY_EXTENSION: &str = "object";

/// Result of scanning a configuration directory.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Loadable documents, sorted by file name for a stable run order.
    pub documents: Vec<PathBuf>,
    /// Stems present in both legacy and YAML form; these are configuration
    /// errors and are excluded from `documents`.
    pub conflicts: Vec<String>,
}

/// Enumerate every archive document in a configuration directory.
pub fn discover(dir: &Path) -> Result<Discovery> {
    let mut by_stem: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !YAML_EXTENSIONS.contains(&ext) && ext != LEGACY_EXTENSION {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        // Diverted error documents are never picked up as configuration.
        if stem.ends_with(".error") {
            debug!("ignoring error document {}", path.display());
            continue;
        }
        by_stem.entry(stem.to_string()).or_default().push(path);
    }

    let mut discovery = Discovery::default();
    for (stem, mut paths) in by_stem {
        let has_legacy = paths.iter().any(|p| has_extension(p, LEGACY_EXTENSION));
        let has_yaml = paths
            .iter()
            .any(|p| YAML_EXTENSIONS.iter().any(|e| has_extension(p, e)));
        if has_legacy && has_yaml {
            discovery.conflicts.push(stem);
            continue;
        }
        paths.sort();
        discovery.documents.extend(paths);
    }
    discovery.documents.sort();
    Ok(discovery)
}

/// Load one archive document, dispatching on its extension.
pub fn load(path: &Path) -> Result<ArchiveRecord> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if YAML_EXTENSIONS.contains(&ext) => load_yaml(path),
        Some(LEGACY_EXTENSION) => load_legacy(path),
        other => Err(Error::UnsupportedExtension(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

/// Where a failed run's state is diverted instead of overwriting the
/// canonical document.
pub fn error_document_path(log_dir: &str, name: &str) -> PathBuf {
    Path::new(log_dir).join(format!("{name}.error.yml"))
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_sorts_and_filters() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.yml"), "x").unwrap();
        std::fs::write(dir.path().join("a.yaml"), "x").unwrap();
        std::fs::write(dir.path().join("c.object"), "x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        std::fs::write(dir.path().join("a.error.yml"), "x").unwrap();

        let discovery = discover(dir.path()).unwrap();
        let names: Vec<_> = discovery
            .documents
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["a.yaml", "b.yml", "c.object"]);
        assert!(discovery.conflicts.is_empty());
    }

    #[test]
    fn test_discover_flags_conflicting_formats() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("prod.yml"), "x").unwrap();
        std::fs::write(dir.path().join("prod.object"), "x").unwrap();
        std::fs::write(dir.path().join("other.yml"), "x").unwrap();

        let discovery = discover(dir.path()).unwrap();
        assert_eq!(discovery.conflicts, ["prod"]);
        assert_eq!(discovery.documents.len(), 1);
    }

    #[test]
    fn test_error_document_path() {
        assert_eq!(
            error_document_path("/var/log/tw", "prod"),
            Path::new("/var/log/tw/prod.error.yml")
        );
    }
}
