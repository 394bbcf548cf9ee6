use std::fs;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::sync::atomic::AtomicBool;
use std::thread;

use anyhow::{Result, Context, anyhow, bail};
use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::overrides::scanner::{ClassOverrideConfigScanner, UIScreenListenerSourceScanner};
use crate::overrides::types::{ModHandle, ModOverride, OverrideScanResult, OverrideScanStats, ScanOptions};

#[derive(Debug, Default)]
struct CacheState {
    /// Last computed overrides, `None` until the first scan
    overrides: Option<Arc<[ModOverride]>>,

    /// Stats of the last completed scan
    stats: OverrideScanStats,

    /// When the last completed scan finished
    scanned_at: Option<DateTime<Utc>>,
}

/// Lazily computed, explicitly refreshed set of overrides declared by one mod
#[derive(Debug)]
pub struct OverrideSet {
    /// Mod whose overrides are cached
    handle: Arc<ModHandle>,

    /// Scanner for engine config declarations
    config_scanner: ClassOverrideConfigScanner,

    /// Scanner for source file listener declarations
    source_scanner: UIScreenListenerSourceScanner,

    /// Cached snapshot; held for the whole refresh so concurrent callers never scan twice
    state: Mutex<CacheState>,
}

impl OverrideSet {
    /// Create an empty override set for the given mod
    pub fn new(handle: Arc<ModHandle>, options: &ScanOptions) -> Self {
        Self {
            handle,
            config_scanner: ClassOverrideConfigScanner::new(options),
            source_scanner: UIScreenListenerSourceScanner::new(options),
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Create an empty override set with default options
    pub fn with_defaults(handle: Arc<ModHandle>) -> Self {
        Self::new(handle, &ScanOptions::default())
    }

    /// The mod this set belongs to
    pub fn mod_handle(&self) -> &Arc<ModHandle> {
        &self.handle
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the mod's overrides, scanning the mod first if nothing is cached
    /// yet or `force_refresh` is set.
    ///
    /// The returned slice is a snapshot; later file changes are only picked up
    /// by calling again with `force_refresh`.
    pub fn get(&self, force_refresh: bool) -> Result<Arc<[ModOverride]>> {
        self.get_with_cancel(force_refresh, &AtomicBool::new(false))
    }

    /// Like [`OverrideSet::get`], but a refresh stops early once `cancel` is set.
    ///
    /// A cancelled refresh returns the partial overrides found so far and leaves
    /// the cache untouched, so the next call scans again.
    pub fn get_with_cancel(&self, force_refresh: bool, cancel: &AtomicBool) -> Result<Arc<[ModOverride]>> {
        let mut state = self.lock_state();

        if let Some(cached) = &state.overrides {
            if !force_refresh {
                debug!("Using cached overrides for {}", self.handle);
                return Ok(Arc::clone(cached));
            }
        }

        let result = self.refresh(cancel)?;
        let overrides: Arc<[ModOverride]> = result.overrides.into();

        if result.stats.cancelled {
            return Ok(overrides);
        }

        info!(
            "Found {} overrides for {} ({} class overrides, {} screen listeners)",
            result.stats.total_overrides(),
            self.handle,
            result.stats.class_overrides,
            result.stats.listener_overrides
        );

        state.overrides = Some(Arc::clone(&overrides));
        state.stats = result.stats;
        state.scanned_at = Some(Utc::now());

        Ok(overrides)
    }

    /// Whether a scan has completed at least once
    pub fn is_populated(&self) -> bool {
        self.lock_state().overrides.is_some()
    }

    /// Stats of the last completed scan
    pub fn last_stats(&self) -> OverrideScanStats {
        self.lock_state().stats.clone()
    }

    /// When the last completed scan finished
    pub fn scanned_at(&self) -> Option<DateTime<Utc>> {
        self.lock_state().scanned_at
    }

    /// Run the scan on a thread outside any rayon pool.
    ///
    /// The caller holds the cache lock while waiting here. A rayon worker that
    /// waited on a join or install instead would pick up queued tasks, and a
    /// queued `get` on this set would then block on a lock its own thread holds.
    fn refresh(&self, cancel: &AtomicBool) -> Result<OverrideScanResult> {
        thread::scope(|scope| -> Result<OverrideScanResult> {
            scope
                .spawn(|| self.scan(cancel))
                .join()
                .map_err(|_| anyhow!("Override scan of {} panicked", self.handle))?
        })
    }

    /// Run both scanners against the mod root and concatenate their output
    fn scan(&self, cancel: &AtomicBool) -> Result<OverrideScanResult> {
        self.check_root()?;
        debug!("Scanning overrides for {} at {}", self.handle, self.handle.path.display());

        let (config_result, source_result) = thread::scope(|scope| {
            let config = scope.spawn(|| self.config_scanner.scan(&self.handle));
            let source = self.source_scanner.scan_with_cancel(&self.handle, cancel);
            let config = config
                .join()
                .unwrap_or_else(|_| Err(anyhow!("Config scan of {} panicked", self.handle)));
            (config, source)
        });
        let config_overrides = config_result?;
        let source_result = source_result?;

        let mut stats = source_result.stats;
        stats.merge(&OverrideScanStats {
            class_overrides: config_overrides.len(),
            ..OverrideScanStats::default()
        });

        let mut overrides = config_overrides;
        overrides.extend(source_result.overrides);

        Ok(OverrideScanResult { overrides, stats })
    }

    /// Fail when the mod root is missing, not a directory, or unreadable
    fn check_root(&self) -> Result<()> {
        let root = &self.handle.path;

        let metadata = fs::metadata(root)
            .with_context(|| format!("Mod root {} is not accessible", root.display()))?;
        if !metadata.is_dir() {
            bail!("Mod root {} is not a directory", root.display());
        }
        fs::read_dir(root)
            .with_context(|| format!("Failed to read mod root {}", root.display()))?;

        Ok(())
    }
}
