use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use rayon::prelude::*;

/// Below this many files no progress bar is drawn
const PROGRESS_THRESHOLD: usize = 10;

/// Progress tracker for displaying progress during scanning
#[derive(Debug, Default, Clone)]
pub struct ProgressTracker {
    enabled: bool,
}

impl ProgressTracker {
    /// Create a new progress tracker
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn progress_bar(&self, len: usize) -> Option<ProgressBar> {
        if !self.enabled || len <= PROGRESS_THRESHOLD {
            return None;
        }

        let pb = ProgressBar::new(len as u64);
        match ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({eta}) {msg}")
        {
            Ok(style) => pb.set_style(style.progress_chars("#>-")),
            Err(e) => debug!("Falling back to default progress style: {}", e),
        }
        Some(pb)
    }

    /// Run `operation` over every path in parallel, keeping the `Some` results
    pub fn track_path_progress<F, R>(&self, paths: &[PathBuf], operation: F) -> Vec<R>
    where
        F: Fn(&PathBuf) -> Option<R> + Sync + Send,
        R: Send,
    {
        let progress_bar = self.progress_bar(paths.len());
        let processed_count = AtomicUsize::new(0);

        let results: Vec<_> = paths.par_iter()
            .filter_map(|path| {
                let result = operation(path);

                let current_count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(pb) = &progress_bar {
                    pb.set_position(current_count as u64);
                    if current_count % 10 == 0 || current_count == paths.len() {
                        if let Some(file_name) = path.file_name() {
                            pb.set_message(file_name.to_string_lossy().into_owned());
                        }
                    }
                }

                result
            })
            .collect();

        if let Some(pb) = progress_bar {
            pb.finish_with_message("Scan complete");
        }

        results
    }
}
