use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Result, Context, anyhow};
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::overrides::types::{ModHandle, ModOverride, OverrideKind, OverrideScanStats};

/// One override line in a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub new_class: String,
    pub base_class: String,
    pub kind: OverrideKind,
}

impl From<&ModOverride> for ReportEntry {
    fn from(record: &ModOverride) -> Self {
        Self {
            new_class: record.new_class.clone(),
            base_class: record.base_class.clone(),
            kind: record.kind,
        }
    }
}

/// Serializable snapshot of one mod's overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideReport {
    /// Identifier of the scanned mod
    pub mod_id: String,

    /// Root directory of the scanned mod
    pub mod_path: PathBuf,

    /// When the snapshot was taken
    pub scanned_at: DateTime<Utc>,

    /// Overrides in the snapshot
    pub overrides: Vec<ReportEntry>,

    /// Stats of the scan that produced the snapshot
    pub stats: OverrideScanStats,
}

impl OverrideReport {
    /// Build a report from override records
    pub fn new<'a>(
        handle: &ModHandle,
        overrides: impl IntoIterator<Item = &'a ModOverride>,
        stats: OverrideScanStats,
        scanned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            mod_id: handle.id.clone(),
            mod_path: handle.path.clone(),
            scanned_at,
            overrides: overrides.into_iter().map(ReportEntry::from).collect(),
            stats,
        }
    }

    /// Render the report in the given format
    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Json => serde_json::to_string_pretty(self).context("Failed to serialize report as JSON"),
            ReportFormat::Yaml => serde_yaml::to_string(self).context("Failed to serialize report as YAML"),
            ReportFormat::Table => Ok(self.render_table()),
        }
    }

    fn render_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Mod: {} ({})", self.mod_id, self.mod_path.display());

        if self.overrides.is_empty() {
            let _ = writeln!(out, "No overrides found");
            return out;
        }

        let kind_width = "Kind".len().max(
            self.overrides.iter().map(|e| e.kind.as_str().len()).max().unwrap_or(0),
        );
        let base_width = "Base class".len().max(
            self.overrides.iter().map(|e| e.base_class.len()).max().unwrap_or(0),
        );

        let _ = writeln!(out, "{:<kind_width$}  {:<base_width$}  New class", "Kind", "Base class");
        for entry in &self.overrides {
            let _ = writeln!(
                out,
                "{:<kind_width$}  {:<base_width$}  {}",
                entry.kind.as_str(),
                entry.base_class,
                entry.new_class
            );
        }

        let _ = writeln!(
            out,
            "{} overrides ({} class overrides, {} screen listeners)",
            self.overrides.len(),
            self.overrides.iter().filter(|e| e.kind == OverrideKind::ClassOverride).count(),
            self.overrides.iter().filter(|e| e.kind == OverrideKind::UIScreenListener).count(),
        );
        if self.stats.reserved_files > 0 {
            let _ = writeln!(out, "{} source files skipped under reserved directories", self.stats.reserved_files);
        }
        out
    }
}

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

impl std::str::FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" | "text" => Ok(ReportFormat::Table),
            "json" => Ok(ReportFormat::Json),
            "yaml" | "yml" => Ok(ReportFormat::Yaml),
            other => Err(anyhow!("Unknown report format: {}", other)),
        }
    }
}
