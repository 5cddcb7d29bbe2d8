//! Asset catalog
//!
//! Walks input paths and yields candidate audio assets in a stable order.
//! Directories are walked recursively in lexical order; a file named directly
//! is accepted whatever its extension. Unreadable entries are reported and
//! skipped.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use afx_common::config::CatalogConfig;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::CatalogError;
use crate::types::AssetPath;

/// Catalog walk output
#[derive(Debug, Clone, Default)]
pub struct CatalogScan {
    /// Candidates in walk order, canonical paths, no duplicates
    pub assets: Vec<AssetPath>,
    /// Entries that were skipped
    pub errors: Vec<CatalogError>,
}

/// Audio file catalog
pub struct AssetCatalog {
    extensions: HashSet<String>,
    ignore_patterns: Vec<String>,
}

impl AssetCatalog {
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            ignore_patterns: config.ignore_patterns.clone(),
        }
    }

    /// Collect candidates from every root, in root order
    pub fn scan(&self, roots: &[PathBuf]) -> CatalogScan {
        let mut scan = CatalogScan::default();
        let mut seen = HashSet::new();

        for root in roots {
            if !root.exists() {
                warn!(path = %root.display(), "Input path not found");
                scan.errors.push(CatalogError::PathNotFound(root.clone()));
                continue;
            }

            if root.is_file() {
                self.accept(root, &mut scan, &mut seen);
                continue;
            }

            self.walk(root, &mut scan, &mut seen);
        }

        debug!(
            assets = scan.assets.len(),
            errors = scan.errors.len(),
            "Catalog scan complete"
        );
        scan
    }

    fn walk(&self, root: &Path, scan: &mut CatalogScan, seen: &mut HashSet<PathBuf>) {
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_ignored(e));

        for entry in walker {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    let is_file = entry.file_type().is_file()
                        || (entry.file_type().is_symlink() && path.is_file());
                    if is_file && self.is_audio_extension(path) {
                        self.accept(path, scan, seen);
                    }
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| root.to_path_buf());
                    warn!(path = %path.display(), error = %e, "Skipping unreadable entry");
                    scan.errors.push(CatalogError::Unreadable {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    fn accept(&self, path: &Path, scan: &mut CatalogScan, seen: &mut HashSet<PathBuf>) {
        match AssetPath::canonicalize(path) {
            Ok(asset) => {
                if seen.insert(asset.path.clone()) {
                    scan.assets.push(asset);
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unresolvable path");
                scan.errors.push(CatalogError::Unreadable {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        }
    }

    fn is_ignored(&self, entry: &DirEntry) -> bool {
        let file_name = entry.file_name().to_string_lossy();
        self.ignore_patterns
            .iter()
            .any(|pattern| file_name.contains(pattern.as_str()))
    }

    /// Check if the extension is on the allow-list
    fn is_audio_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| self.extensions.contains(&ext.to_string_lossy().to_lowercase()))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_extension_detection() {
        let catalog = AssetCatalog::new(&CatalogConfig::default());
        assert!(catalog.is_audio_extension(Path::new("a.mp3")));
        assert!(catalog.is_audio_extension(Path::new("a.FLAC")));
        assert!(catalog.is_audio_extension(Path::new("a.aiff")));
        assert!(!catalog.is_audio_extension(Path::new("a.txt")));
        assert!(!catalog.is_audio_extension(Path::new("noext")));
    }

    #[test]
    fn test_custom_allow_list() {
        let config = CatalogConfig {
            extensions: vec![".WAV".to_string()],
            ignore_patterns: vec![],
        };
        let catalog = AssetCatalog::new(&config);
        assert!(catalog.is_audio_extension(Path::new("a.wav")));
        assert!(!catalog.is_audio_extension(Path::new("a.mp3")));
    }

    #[test]
    fn test_scan_nonexistent_path() {
        let catalog = AssetCatalog::new(&CatalogConfig::default());
        let scan = catalog.scan(&[PathBuf::from("/nonexistent/afx/path")]);
        assert!(scan.assets.is_empty());
        assert!(matches!(scan.errors[0], CatalogError::PathNotFound(_)));
    }
}
