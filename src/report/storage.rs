use std::path::{Path, PathBuf};

use anyhow::{Result, Context};
use log::{debug, info};

use super::types::{OverrideReport, ReportFormat};
use crate::utils::file_utils;

/// Report file storage; the format follows the file extension
#[derive(Debug)]
pub struct ReportStorage {
    /// Path to the report file
    report_path: PathBuf,
}

impl ReportStorage {
    pub fn new(report_path: impl AsRef<Path>) -> Self {
        Self {
            report_path: report_path.as_ref().to_path_buf(),
        }
    }

    /// Format implied by the file extension, JSON unless `.yaml`/`.yml`
    pub fn format(&self) -> ReportFormat {
        match self.report_path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => ReportFormat::Yaml,
            _ => ReportFormat::Json,
        }
    }

    /// Load a report from disk
    pub fn load(&self) -> Result<OverrideReport> {
        let path = &self.report_path;
        debug!("Loading report from {}", path.display());

        let content = file_utils::read_file_to_string(path)?;
        let report: OverrideReport = match self.format() {
            ReportFormat::Yaml => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse report file {}", path.display()))?,
            _ => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse report file {}", path.display()))?,
        };
        Ok(report)
    }

    /// Save a report to disk
    pub fn save(&self, report: &OverrideReport) -> Result<()> {
        let path = &self.report_path;
        let content = report.render(self.format())?;
        file_utils::write_string_to_file(path, &content)?;

        info!("Saved report with {} overrides to {}", report.overrides.len(), path.display());
        Ok(())
    }
}
