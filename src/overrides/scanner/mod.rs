mod config_scanner;
mod file_collector;
mod progress;
mod source_scanner;

// Re-export from submodules
pub use config_scanner::ClassOverrideConfigScanner;
pub use file_collector::{CollectedFiles, FileCollector};
pub use progress::ProgressTracker;
pub use source_scanner::UIScreenListenerSourceScanner;
