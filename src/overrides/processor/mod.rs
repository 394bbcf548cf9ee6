mod override_set;

// Re-export from submodules
pub use override_set::OverrideSet;
