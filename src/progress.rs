//! Progress bar and logging utilities.
//!
//! Provides helpers for creating progress bars, with support for log-only
//! mode where progress bars are hidden for tail-friendly output. The mode is
//! carried by a [`Reporter`] value handed to each job.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// How a long-running job reports progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reporter {
    /// Hide bars, print periodic `[PHASE] n/total` lines instead
    pub log_only: bool,
}

impl Reporter {
    pub fn new(log_only: bool) -> Self {
        Self { log_only }
    }

    /// Reporter that draws nothing at all (tests, nested jobs).
    pub fn hidden() -> Self {
        Self { log_only: true }
    }

    /// Create a progress bar with consistent styling.
    /// In log-only mode, the progress bar is hidden.
    pub fn progress_bar(&self, len: u64, msg: &str) -> ProgressBar {
        let pb = ProgressBar::new(len);
        if self.log_only {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        } else if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, ETA: {eta})")
        {
            pb.set_style(style.progress_chars("=> "));
        }
        pb.set_message(msg.to_string());
        pb
    }

    /// Whether a periodic progress line is due.
    pub fn should_log(&self, current: u64, total: u64, interval: u64) -> bool {
        self.log_only && interval > 0 && (current % interval == 0 || current == total)
    }

    /// Log progress periodically for tail-friendly output.
    /// Only logs when in log-only mode and at specified intervals.
    pub fn log_progress(&self, phase: &str, current: u64, total: u64, interval: u64) {
        if self.should_log(current, total, interval) {
            let pct = if total == 0 {
                100.0
            } else {
                100.0 * current as f64 / total as f64
            };
            eprintln!("[{}] {}/{} ({:.1}%)", phase, current, total, pct);
        }
    }
}

/// Format duration in human-readable format
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = secs / 60.0;
        format!("{:.1}m", mins)
    }
}
