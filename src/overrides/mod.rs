pub mod types;
pub mod scanner;
pub mod processor;

// Re-export the main API for easier access
pub use types::{ModHandle, ModOverride, OverrideKind, OverrideScanResult, OverrideScanStats, ScanOptions};
pub use scanner::{ClassOverrideConfigScanner, UIScreenListenerSourceScanner};
pub use processor::OverrideSet;
