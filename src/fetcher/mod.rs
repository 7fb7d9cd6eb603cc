//! Resilient package download.
//!
//! [`Fetcher::fetch`] writes one package into the destination directory:
//!
//! 1. If `<dest>/<file name>` already exists it is returned untouched; no
//!    request is made. Re-running after a partial failure only downloads what
//!    is missing.
//! 2. Otherwise the body is streamed into `<file name>.tmp`, its length is
//!    checked against `Content-Length`, the file is synced and then renamed
//!    into place. The rename is the commit point: a file with the final name
//!    is always complete.
//! 3. Transport errors and short transfers are retried with a fixed delay up
//!    to [`FetchConfig::max_attempts`] attempts in total. Filesystem errors are
//!    not retried. The temp file is removed after every failed attempt.

use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_retry::RetryIf;
use tokio_retry::strategy::FixedInterval;
use tracing::{debug, info, warn};

use crate::constants::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};
use crate::core::VsixError;
use crate::models::ResolvedExtension;
use crate::utils::fs::{ensure_dir, file_exists, remove_if_exists, temp_path};
use crate::utils::progress::ProgressBar;

/// Retry policy for downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Total attempts per package, including the first (at least 1)
    pub max_attempts: u32,
    /// Fixed pause between attempts
    pub retry_delay: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Downloads packages with retries and atomic commit.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
    show_progress: bool,
}

impl Fetcher {
    /// Create a fetcher sharing `client`'s connection pool.
    pub fn new(client: Client, config: FetchConfig) -> Self {
        Self {
            client,
            config,
            show_progress: true,
        }
    }

    /// Draw a byte progress bar per download.
    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Retry policy in use.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Download `node` as the `position`-th package (1-based) into `dest_dir`.
    ///
    /// Returns the path of the final file.
    ///
    /// # Errors
    ///
    /// - [`VsixError::TransportFailure`] / [`VsixError::TransferIncomplete`]
    ///   once all attempts are used up (the error of the last attempt)
    /// - [`VsixError::FileSystemError`] when the directory or file cannot be
    ///   written, without retrying
    pub async fn fetch(
        &self,
        node: &ResolvedExtension,
        position: usize,
        dest_dir: &Path,
    ) -> Result<PathBuf, VsixError> {
        let final_path = dest_dir.join(node.file_name(position));
        if file_exists(&final_path).await {
            info!("{} already present at {}, skipping download", node, final_path.display());
            return Ok(final_path);
        }

        ensure_dir(dest_dir).await?;
        let temp = temp_path(&final_path);

        let progress = if self.show_progress {
            ProgressBar::new_download()
        } else {
            ProgressBar::hidden()
        };
        progress.set_message(node.key());

        let retries = self.config.max_attempts.max(1) - 1;
        let strategy = FixedInterval::new(self.config.retry_delay).take(retries as usize);

        let (final_ref, temp_ref, progress_ref) = (&final_path, &temp, &progress);
        let result = RetryIf::spawn(
            strategy,
            move || self.attempt(node, final_ref, temp_ref, progress_ref),
            |e: &VsixError| {
                if e.is_retryable() {
                    warn!("Download of {} failed, retrying: {}", node, e);
                    true
                } else {
                    false
                }
            },
        )
        .await;

        progress.finish_and_clear();
        match &result {
            Ok(path) => info!("Downloaded {} to {}", node, path.display()),
            Err(e) => warn!("Giving up on {}: {}", node, e),
        }
        result
    }

    /// One download attempt. Leaves no temp file behind on failure.
    async fn attempt(
        &self,
        node: &ResolvedExtension,
        final_path: &Path,
        temp: &Path,
        progress: &ProgressBar,
    ) -> Result<PathBuf, VsixError> {
        progress.reset();
        let result = self.download_to(node, final_path, temp, progress).await;
        if result.is_err()
            && let Err(e) = remove_if_exists(temp).await
        {
            debug!("Could not remove {}: {}", temp.display(), e);
        }
        result
    }

    async fn download_to(
        &self,
        node: &ResolvedExtension,
        final_path: &Path,
        temp: &Path,
        progress: &ProgressBar,
    ) -> Result<PathBuf, VsixError> {
        let transport = |reason: String| VsixError::TransportFailure {
            key: node.key(),
            reason,
        };

        debug!("GET {}", node.download_url);
        let mut response = self
            .client
            .get(&node.download_url)
            .send()
            .await
            .map_err(|e| transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(transport(format!("HTTP {status}")));
        }

        let expected = response.content_length();
        progress.set_length(expected);
        let mut file = tokio::fs::File::create(temp)
            .await
            .map_err(|e| VsixError::file_system("create file", temp, &e))?;

        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await.map_err(|e| transport(e.to_string()))? {
            file.write_all(&chunk)
                .await
                .map_err(|e| VsixError::file_system("write file", temp, &e))?;
            written += chunk.len() as u64;
            progress.inc(chunk.len() as u64);
        }

        if let Some(expected) = expected
            && written != expected
        {
            return Err(VsixError::TransferIncomplete {
                key: node.key(),
                expected,
                actual: written,
            });
        }

        file.flush().await.map_err(|e| VsixError::file_system("write file", temp, &e))?;
        file.sync_all().await.map_err(|e| VsixError::file_system("sync file", temp, &e))?;
        drop(file);

        tokio::fs::rename(temp, final_path)
            .await
            .map_err(|e| VsixError::file_system("rename file", final_path, &e))?;

        debug!("Wrote {} bytes to {}", written, final_path.display());
        Ok(final_path.to_path_buf())
    }
}
