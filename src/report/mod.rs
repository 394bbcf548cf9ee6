pub mod types;
pub mod storage;
pub mod query;

// Re-export main types and functions for easier access
pub use types::{OverrideReport, ReportEntry, ReportFormat};
pub use query::{OverrideQuery, SortField};
pub use storage::ReportStorage;
