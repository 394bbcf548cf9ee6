//! Loading [`ScanOptions`] from TOML or YAML files.
//!
//! Every field is optional; missing fields keep their defaults.
//!
//! ```toml
//! reserved_subtrees = ["XComGame", "Core"]
//! source_extensions = ["uc", "uci"]
//! parallel_threads = 4
//! ```

use std::path::Path;

use anyhow::{Result, Context, bail};
use log::debug;

use crate::overrides::types::ScanOptions;
use crate::utils::file_utils;

impl ScanOptions {
    /// Load options from a `.toml`, `.yaml` or `.yml` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading scan options from {}", path.display());

        let content = file_utils::read_file_to_string(path)?;
        let extension = path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        let options = match extension.as_deref() {
            Some("toml") => Self::from_toml_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => bail!("Unsupported options file format: {}", path.display()),
        };
        options.with_context(|| format!("Failed to load scan options from {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML scan options")
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("Invalid YAML scan options")
    }
}
