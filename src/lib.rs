pub mod config;
pub mod overrides;
pub mod report;
pub mod utils;

#[cfg(test)]
mod tests;

// Re-export main types and functions for easier access
pub use overrides::types::{ModHandle, ModOverride, OverrideKind, OverrideScanResult, OverrideScanStats, ScanOptions};
pub use overrides::scanner::{ClassOverrideConfigScanner, UIScreenListenerSourceScanner};
pub use overrides::processor::OverrideSet;

pub use report::{OverrideQuery, OverrideReport, ReportFormat, ReportStorage};

// Re-export utility functions
pub use utils::file_utils;
