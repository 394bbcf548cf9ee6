use std::path::{Component, Path, PathBuf};
use anyhow::Result;
use log::{debug, trace, warn};
use walkdir::WalkDir;

use crate::overrides::types::ScanOptions;

/// Files found under a source directory, split by the reserved-subtree filter
#[derive(Debug, Default, Clone)]
pub struct CollectedFiles {
    /// Files eligible for scanning
    pub files: Vec<PathBuf>,

    /// Files skipped because they sit under a reserved subtree
    pub reserved: Vec<PathBuf>,
}

/// File collector for finding mod source files
#[derive(Debug, Clone)]
pub struct FileCollector {
    /// Valid file extensions to collect
    valid_extensions: Vec<String>,

    /// Directory names that are never descended into
    reserved_subtrees: Vec<String>,
}

impl Default for FileCollector {
    fn default() -> Self {
        Self::new(&ScanOptions::default())
    }
}

impl FileCollector {
    /// Create a file collector using the extensions and reserved subtrees of `options`
    pub fn new(options: &ScanOptions) -> Self {
        Self {
            valid_extensions: options.source_extensions.clone(),
            reserved_subtrees: options.reserved_subtrees.clone(),
        }
    }

    /// Collect all files with valid extensions under `source_dir`
    pub fn collect_files(&self, source_dir: impl AsRef<Path>) -> Result<CollectedFiles> {
        let source_dir = source_dir.as_ref();
        debug!("Collecting files from directory: {}", source_dir.display());

        let mut collected = CollectedFiles::default();

        for entry in WalkDir::new(source_dir).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", source_dir.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.has_valid_extension(entry.path()) {
                continue;
            }

            let path = entry.path();
            if self.is_reserved(source_dir, path) {
                trace!("Skipping reserved file: {}", path.display());
                collected.reserved.push(path.to_owned());
            } else {
                trace!("Found file: {}", path.display());
                collected.files.push(path.to_owned());
            }
        }

        debug!(
            "Collected {} files for processing ({} in reserved subtrees)",
            collected.files.len(),
            collected.reserved.len()
        );
        Ok(collected)
    }

    /// Whether the path has one of the valid extensions, ignoring case
    pub fn has_valid_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.valid_extensions.iter().any(|valid| ext.eq_ignore_ascii_case(valid)))
    }

    /// Whether any directory between `source_dir` and `path` is a reserved subtree
    pub fn is_reserved(&self, source_dir: &Path, path: &Path) -> bool {
        let relative = path.strip_prefix(source_dir).unwrap_or(path);
        let Some(parent) = relative.parent() else {
            return false;
        };

        parent.components().any(|component| match component {
            Component::Normal(name) => name.to_str().is_some_and(|name| {
                self.reserved_subtrees.iter().any(|reserved| name.eq_ignore_ascii_case(reserved))
            }),
            _ => false,
        })
    }

    /// Get the list of reserved subtree names
    pub fn reserved_subtrees(&self) -> &[String] {
        &self.reserved_subtrees
    }
}
