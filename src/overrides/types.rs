use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use serde::{Serialize, Deserialize};

/// Sentinel screen name meaning "every UI screen"
pub const ALL_SCREENS_SENTINEL: &str = "none";

/// Opaque handle to an installed mod
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModHandle {
    /// Mod identifier
    pub id: String,

    /// Root directory of the mod installation
    pub path: PathBuf,
}

impl ModHandle {
    pub fn new(id: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self {
            id: id.into(),
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Build a handle using the root directory name as the identifier
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let id = path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(id, path)
    }
}

impl fmt::Display for ModHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// How an override was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OverrideKind {
    /// `ModClassOverrides` entry in the engine config
    ClassOverride,

    /// `ScreenClass = X` declaration in a source file
    UIScreenListener,
}

impl OverrideKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideKind::ClassOverride => "ClassOverride",
            OverrideKind::UIScreenListener => "UIScreenListener",
        }
    }
}

impl fmt::Display for OverrideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OverrideKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "classoverride" | "class" => Ok(OverrideKind::ClassOverride),
            "uiscreenlistener" | "listener" | "ui" => Ok(OverrideKind::UIScreenListener),
            other => Err(anyhow::anyhow!("Unknown override kind: {}", other)),
        }
    }
}

/// A single override declared by a mod against a base-game class or UI screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModOverride {
    /// Mod that declares this override
    pub owning_mod: Arc<ModHandle>,

    /// Overriding class (or listener file stem)
    pub new_class: String,

    /// Base-game class or UI screen being overridden
    pub base_class: String,

    /// Declaration mechanism
    pub kind: OverrideKind,
}

impl ModOverride {
    /// Build a record, trimming both names.
    ///
    /// Returns `None` when either name is empty after trimming or when the base
    /// class is the all-screens sentinel.
    pub fn new(
        owning_mod: &Arc<ModHandle>,
        new_class: &str,
        base_class: &str,
        kind: OverrideKind,
    ) -> Option<Self> {
        let new_class = new_class.trim();
        let base_class = base_class.trim();

        if new_class.is_empty() || base_class.is_empty() {
            return None;
        }
        if base_class.eq_ignore_ascii_case(ALL_SCREENS_SENTINEL) {
            return None;
        }

        Some(Self {
            owning_mod: Arc::clone(owning_mod),
            new_class: new_class.to_string(),
            base_class: base_class.to_string(),
            kind,
        })
    }

    /// Lowercase key for the overridden class
    pub fn base_class_key(&self) -> String {
        self.base_class.to_ascii_lowercase()
    }

    /// Lowercase key for the overriding class
    pub fn new_class_key(&self) -> String {
        self.new_class.to_ascii_lowercase()
    }

    /// Whether this override targets the given base class, ignoring case
    pub fn targets(&self, base_class: &str) -> bool {
        self.base_class.eq_ignore_ascii_case(base_class.trim())
    }

    /// Whether both records override the same base class, ignoring case and kind
    pub fn same_target(&self, other: &ModOverride) -> bool {
        self.base_class.eq_ignore_ascii_case(&other.base_class)
    }
}

impl fmt::Display for ModOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({}, {})", self.new_class, self.base_class, self.kind, self.owning_mod)
    }
}

/// Configuration options for override scanning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Engine config file, relative to the mod root
    pub config_file: PathBuf,

    /// Source directory, relative to the mod root
    pub source_dir: PathBuf,

    /// Source file extensions to scan, without the dot
    pub source_extensions: Vec<String>,

    /// Directory names under the source directory that are never scanned
    pub reserved_subtrees: Vec<String>,

    /// Number of parallel threads to use for scanning
    pub parallel_threads: Option<usize>,

    /// Whether to display a progress bar for large source trees
    pub show_progress: bool,

    /// Whether to log every match and skipped file
    pub verbose: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from("Config").join("XComEngine.ini"),
            source_dir: PathBuf::from("Src"),
            source_extensions: vec!["uc".to_string()],
            reserved_subtrees: vec!["XComGame".to_string()],
            parallel_threads: None,
            show_progress: false,
            verbose: false,
        }
    }
}

/// Statistics about a scan
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideScanStats {
    /// Source files found under the source directory
    pub total_files: usize,

    /// Source files skipped because they live under a reserved subtree
    pub reserved_files: usize,

    /// Source files that contained at least one listener declaration
    pub files_with_overrides: usize,

    /// Number of source files that could not be read
    pub error_files: usize,

    /// Paths to source files that could not be read
    pub error_file_paths: Vec<PathBuf>,

    /// Overrides found in the engine config
    pub class_overrides: usize,

    /// Overrides found in source files
    pub listener_overrides: usize,

    /// Whether the source scan was cancelled before finishing
    pub cancelled: bool,
}

impl OverrideScanStats {
    /// Total number of overrides found
    pub fn total_overrides(&self) -> usize {
        self.class_overrides + self.listener_overrides
    }

    /// Merge another stats instance into this one
    pub fn merge(&mut self, other: &Self) {
        self.total_files += other.total_files;
        self.reserved_files += other.reserved_files;
        self.files_with_overrides += other.files_with_overrides;
        self.error_files += other.error_files;
        self.error_file_paths.extend(other.error_file_paths.iter().cloned());
        self.class_overrides += other.class_overrides;
        self.listener_overrides += other.listener_overrides;
        self.cancelled |= other.cancelled;
    }
}

/// Result of an override scanning operation
#[derive(Debug, Clone, Default)]
pub struct OverrideScanResult {
    /// The overrides found during scanning
    pub overrides: Vec<ModOverride>,

    /// Statistics about the scanning process
    pub stats: OverrideScanStats,
}
