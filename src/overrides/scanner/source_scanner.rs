use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, Context};
use log::{debug, info, trace, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::overrides::types::{
    ModHandle, ModOverride, OverrideKind, OverrideScanResult, OverrideScanStats, ScanOptions,
    ALL_SCREENS_SENTINEL,
};
use crate::utils::file_utils;
use super::{CollectedFiles, FileCollector, ProgressTracker};

static SCREEN_CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*ScreenClass\s*=\s*(?:class')?([a-z_][a-z0-9_]*)")
        .expect("screen class pattern is valid")
});

/// Outcome of scanning one source file
#[derive(Debug)]
enum FileOutcome {
    Scanned(Vec<ModOverride>),
    Failed(PathBuf),
    Cancelled,
}

/// Extracts UI screen listener declarations from a mod's source tree
#[derive(Debug, Clone)]
pub struct UIScreenListenerSourceScanner {
    /// Source directory relative to the mod root
    source_dir: PathBuf,

    /// File collector for finding source files
    file_collector: FileCollector,

    /// Progress tracker for the parallel scan
    progress_tracker: ProgressTracker,

    /// Number of parallel threads to use
    parallel_threads: Option<usize>,

    /// Whether to log every match
    verbose: bool,
}

impl Default for UIScreenListenerSourceScanner {
    fn default() -> Self {
        Self::new(&ScanOptions::default())
    }
}

impl UIScreenListenerSourceScanner {
    pub fn new(options: &ScanOptions) -> Self {
        Self {
            source_dir: options.source_dir.clone(),
            file_collector: FileCollector::new(options),
            progress_tracker: ProgressTracker::new(options.show_progress),
            parallel_threads: options.parallel_threads,
            verbose: options.verbose,
        }
    }

    /// Full path of the source directory for the given mod
    pub fn source_path(&self, handle: &ModHandle) -> PathBuf {
        handle.path.join(&self.source_dir)
    }

    /// Scan every source file of the mod
    pub fn scan(&self, handle: &Arc<ModHandle>) -> Result<OverrideScanResult> {
        self.scan_with_cancel(handle, &AtomicBool::new(false))
    }

    /// Scan every source file of the mod, stopping early once `cancel` is set.
    ///
    /// Files not yet started when cancellation is observed are skipped; the
    /// result then holds only the overrides of files that completed, and
    /// `stats.cancelled` is set.
    pub fn scan_with_cancel(&self, handle: &Arc<ModHandle>, cancel: &AtomicBool) -> Result<OverrideScanResult> {
        let source_dir = self.source_path(handle);

        if !source_dir.is_dir() {
            debug!("No source directory at {}", source_dir.display());
            return Ok(OverrideScanResult::default());
        }

        let collected = self.file_collector.collect_files(&source_dir)?;
        if !collected.reserved.is_empty() {
            info!(
                "Skipping {} source files of {} under reserved directories {:?}",
                collected.reserved.len(),
                handle,
                self.file_collector.reserved_subtrees()
            );
        }

        self.scan_collected(handle, &collected, cancel)
    }

    /// Scan already collected files; unreadable files are counted and skipped
    fn scan_collected(&self, handle: &Arc<ModHandle>, collected: &CollectedFiles, cancel: &AtomicBool) -> Result<OverrideScanResult> {
        let outcomes = self.scan_files(handle, &collected.files, cancel)?;

        let mut stats = OverrideScanStats {
            total_files: collected.files.len() + collected.reserved.len(),
            reserved_files: collected.reserved.len(),
            ..OverrideScanStats::default()
        };
        let mut overrides = Vec::new();

        for outcome in outcomes {
            match outcome {
                FileOutcome::Scanned(found) => {
                    if !found.is_empty() {
                        stats.files_with_overrides += 1;
                    }
                    overrides.extend(found);
                }
                FileOutcome::Failed(path) => {
                    stats.error_files += 1;
                    stats.error_file_paths.push(path);
                }
                FileOutcome::Cancelled => stats.cancelled = true,
            }
        }
        stats.listener_overrides = overrides.len();

        if stats.cancelled {
            warn!("Source scan of {} cancelled, returning {} partial results", handle, overrides.len());
        } else {
            debug!(
                "Scanned {} source files of {}, found {} screen listeners",
                stats.total_files - stats.reserved_files,
                handle,
                overrides.len()
            );
        }

        Ok(OverrideScanResult { overrides, stats })
    }

    /// Fan out one task per file on a dedicated pool and join the local results
    fn scan_files(&self, handle: &Arc<ModHandle>, files: &[PathBuf], cancel: &AtomicBool) -> Result<Vec<FileOutcome>> {
        let thread_count = self.parallel_threads.unwrap_or_else(file_utils::default_thread_count);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(thread_count)
            .build()
            .context("Failed to build scan thread pool")?;

        Ok(pool.install(|| {
            self.progress_tracker.track_path_progress(files, |file| {
                if cancel.load(Ordering::Relaxed) {
                    return Some(FileOutcome::Cancelled);
                }

                match self.scan_file(handle, file) {
                    Ok(found) => Some(FileOutcome::Scanned(found)),
                    Err(e) => {
                        warn!("Failed to scan source file {}: {:#}", file.display(), e);
                        Some(FileOutcome::Failed(file.clone()))
                    }
                }
            })
        }))
    }

    /// Scan a single source file, top to bottom
    pub fn scan_file(&self, handle: &Arc<ModHandle>, file: impl AsRef<Path>) -> Result<Vec<ModOverride>> {
        let file = file.as_ref();
        trace!("Processing file: {}", file.display());

        let content = file_utils::read_file_lossy(file)?;
        let new_class = file.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(self.parse_content(handle, &new_class, &content))
    }

    /// Extract listener declarations from source text, attributing them to `new_class`
    pub fn parse_content(&self, handle: &Arc<ModHandle>, new_class: &str, content: &str) -> Vec<ModOverride> {
        let mut overrides = Vec::new();

        for line in content.lines() {
            let Some(caps) = SCREEN_CLASS_RE.captures(line) else {
                continue;
            };

            let screen = &caps[1];
            if screen.eq_ignore_ascii_case(ALL_SCREENS_SENTINEL) {
                // listens to every screen
                continue;
            }

            if let Some(record) = ModOverride::new(handle, new_class, screen, OverrideKind::UIScreenListener) {
                if self.verbose {
                    trace!("Screen listener in {}: {} listens to {}", handle, record.new_class, record.base_class);
                }
                overrides.push(record);
            }
        }

        overrides
    }
}
