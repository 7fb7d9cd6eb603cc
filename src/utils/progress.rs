//! Progress indicators for downloads.
//!
//! Wraps `indicatif` with consistent styling. All bars are hidden when the
//! `VSIX_FETCH_NO_PROGRESS` environment variable is set, so output stays
//! clean in scripts and CI.

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};

use crate::constants::NO_PROGRESS_ENV;

/// Checks if progress bars should be disabled.
fn is_progress_disabled() -> bool {
    std::env::var_os(NO_PROGRESS_ENV).is_some()
}

/// A progress bar with consistent styling.
///
/// ```rust
/// use vsix_fetch::utils::progress::ProgressBar;
///
/// let progress = ProgressBar::hidden();
/// progress.set_message("golang.go");
/// progress.inc(1024);
/// progress.finish_and_clear();
/// ```
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Byte counter for a download whose size is not known yet; see
    /// [`set_length`](Self::set_length).
    pub fn new_download() -> Self {
        if is_progress_disabled() {
            return Self::hidden();
        }
        let bar = IndicatifBar::new_spinner();
        bar.set_style(counter_style());
        Self {
            inner: bar,
        }
    }

    /// A bar that never draws.
    pub fn hidden() -> Self {
        Self {
            inner: IndicatifBar::hidden(),
        }
    }

    /// Sets the message displayed alongside the bar.
    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    /// Switch to a proportional bar once the total size is known.
    pub fn set_length(&self, len: Option<u64>) {
        if let Some(len) = len {
            self.inner.set_length(len);
            self.inner.set_style(download_style());
        }
    }

    /// Advances the bar by `delta` bytes.
    pub fn inc(&self, delta: u64) {
        self.inner.inc(delta);
    }

    /// Resets the position, used when a download is retried.
    pub fn reset(&self) {
        self.inner.set_position(0);
    }

    /// Current position.
    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    /// Removes the bar from the terminal.
    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

fn download_style() -> IndicatifStyle {
    IndicatifStyle::default_bar()
        .template("{msg:30} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})")
        .unwrap_or_else(|_| IndicatifStyle::default_bar())
        .progress_chars("█▓▒░  ")
}

fn counter_style() -> IndicatifStyle {
    IndicatifStyle::default_spinner()
        .template("{spinner:.green} {msg:30} {bytes} ({bytes_per_sec})")
        .unwrap_or_else(|_| IndicatifStyle::default_spinner())
}
