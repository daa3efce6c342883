//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`ProgressCallback`] trait the pipeline reports
//! through, and [`Progress`], a terminal implementation with one bar per
//! phase. The library never draws anything itself; callers inject a
//! callback or leave it out.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Phase name for directory listing.
pub const PHASE_LISTING: &str = "listing";
/// Phase name for content hashing.
pub const PHASE_HASHING: &str = "hashing";
/// Phase name for quarantine transfers.
pub const PHASE_MOVING: &str = "moving";

/// Progress callback for pipeline phases.
///
/// Implement this trait to receive progress updates during a run.
/// Methods may be called from worker threads.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase (`listing`, `hashing`, `moving`)
    /// * `total` - Total number of items to process (0 if unknown)
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based)
    /// * `name` - File name being processed
    fn on_progress(&self, current: usize, name: &str);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);
}

/// Terminal progress reporter.
pub struct Progress {
    multi: MultiProgress,
    active: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupsweep::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            active: Mutex::new(None),
            quiet,
        }
    }

    fn active(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        let pb = if phase == PHASE_LISTING || total == 0 {
            let pb = self.multi.add(ProgressBar::new_spinner());
            pb.set_style(Self::spinner_style());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            let pb = self.multi.add(ProgressBar::new(total as u64));
            pb.set_style(Self::bar_style());
            pb
        };
        pb.set_message(phase_label(phase));

        if let Some(previous) = self.active().replace(pb) {
            previous.finish_and_clear();
        }
    }

    fn on_progress(&self, current: usize, name: &str) {
        if self.quiet {
            return;
        }

        if let Some(ref pb) = *self.active() {
            // Workers finish out of order; never move the bar backwards
            if current as u64 > pb.position() {
                pb.set_position(current as u64);
            }
            pb.set_message(truncate_name(name, 30));
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        if let Some(pb) = self.active().take() {
            pb.finish_with_message(format!("{} complete", phase_label(phase)));
        }
    }
}

fn phase_label(phase: &str) -> String {
    match phase {
        PHASE_LISTING => "Reading directory".to_string(),
        PHASE_HASHING => "Hashing".to_string(),
        PHASE_MOVING => "Transferring".to_string(),
        other => other.to_string(),
    }
}

/// Truncate a file name for display in the progress bar.
fn truncate_name(name: &str, max_len: usize) -> String {
    let count = name.chars().count();
    if count <= max_len {
        return name.to_string();
    }
    let tail: String = name.chars().skip(count - (max_len - 3)).collect();
    format!("...{tail}")
}
