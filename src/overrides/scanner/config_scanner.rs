use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use log::{debug, trace, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::overrides::types::{ModHandle, ModOverride, OverrideKind, ScanOptions};
use crate::utils::file_utils;

// Applied to lines with all whitespace removed
static CLASS_OVERRIDE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^[+]?ModClassOverrides=\(BaseGameClass="([^"]+)",ModClass="([^"]+)"\)"#)
        .expect("class override pattern is valid")
});

/// Extracts `ModClassOverrides` entries from a mod's engine config
#[derive(Debug, Clone)]
pub struct ClassOverrideConfigScanner {
    /// Config file path relative to the mod root
    config_file: PathBuf,

    /// Whether to log every match
    verbose: bool,
}

impl Default for ClassOverrideConfigScanner {
    fn default() -> Self {
        Self::new(&ScanOptions::default())
    }
}

impl ClassOverrideConfigScanner {
    pub fn new(options: &ScanOptions) -> Self {
        Self {
            config_file: options.config_file.clone(),
            verbose: options.verbose,
        }
    }

    /// Full path of the config file for the given mod
    pub fn config_path(&self, handle: &ModHandle) -> PathBuf {
        handle.path.join(&self.config_file)
    }

    /// Scan the mod's config file.
    ///
    /// A missing file yields no overrides. A file that exists but cannot be read
    /// is logged and also yields no overrides.
    pub fn scan(&self, handle: &Arc<ModHandle>) -> Result<Vec<ModOverride>> {
        let path = self.config_path(handle);

        if !path.is_file() {
            debug!("No config file at {}", path.display());
            return Ok(Vec::new());
        }

        let content = match file_utils::read_file_lossy(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Ignoring unreadable config file for {}: {:#}", handle, e);
                return Ok(Vec::new());
            }
        };

        let overrides = self.parse_content(handle, &content);
        debug!("Found {} class overrides in {}", overrides.len(), path.display());
        Ok(overrides)
    }

    /// Extract class overrides from config text
    pub fn parse_content(&self, handle: &Arc<ModHandle>, content: &str) -> Vec<ModOverride> {
        content
            .lines()
            .filter_map(|line| self.parse_line(handle, line))
            .collect()
    }

    /// Extract a class override from a single config line, if it declares one
    pub fn parse_line(&self, handle: &Arc<ModHandle>, line: &str) -> Option<ModOverride> {
        let compact: String = line
            .trim_start_matches('\u{feff}')
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        let caps = CLASS_OVERRIDE_RE.captures(&compact)?;
        let record = ModOverride::new(handle, &caps[2], &caps[1], OverrideKind::ClassOverride)?;

        if self.verbose {
            trace!("Class override in {}: {} replaces {}", handle, record.new_class, record.base_class);
        }
        Some(record)
    }
}
