//! User configuration for vsix-fetch.
//!
//! Settings are read from a TOML file:
//!
//! - **Unix/macOS**: `~/.vsix-fetch/config.toml`
//! - **Windows**: `%LOCALAPPDATA%\vsix-fetch\config.toml`
//!
//! The location can be overridden with `--config` or the `VSIX_FETCH_CONFIG`
//! environment variable. A missing default file means "all defaults"; every
//! key is optional.
//!
//! ```toml
//! marketplace_url = "https://marketplace.visualstudio.com/_apis/public/gallery/extensionquery"
//! api_version = "7.0-preview.1"
//! request_timeout_secs = 300
//! max_attempts = 3
//! retry_delay_ms = 1000
//! max_parallel = 4
//! platform = "linux-x64"
//! code_executable = "code"
//! output_dir = "/tmp/vsix"
//! ```
//!
//! Command-line flags take precedence over file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::constants::{
    CONFIG_DIR, CONFIG_ENV, CONFIG_FILE, DEFAULT_API_VERSION, DEFAULT_CODE_EXECUTABLE,
    DEFAULT_MARKETPLACE_URL, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_PARALLEL, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_RETRY_DELAY,
};
use crate::core::VsixError;
use crate::fetcher::FetchConfig;

/// Settings loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gallery `extensionquery` endpoint
    pub marketplace_url: String,
    /// Gallery API version sent in the `Accept` header
    pub api_version: String,
    /// Deadline for marketplace lookups, and how long a download may stall,
    /// in seconds
    pub request_timeout_secs: u64,
    /// Download attempts per package
    pub max_attempts: u32,
    /// Pause between download attempts, in milliseconds
    pub retry_delay_ms: u64,
    /// Concurrent marketplace lookups while resolving
    pub max_parallel: usize,
    /// Target platform; detected from the host when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Editor executable used by `--install`
    pub code_executable: String,
    /// Download directory; the current directory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            marketplace_url: DEFAULT_MARKETPLACE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY.as_millis() as u64,
            max_parallel: DEFAULT_MAX_PARALLEL,
            platform: None,
            code_executable: DEFAULT_CODE_EXECUTABLE.to_string(),
            output_dir: None,
        }
    }
}

impl Config {
    /// Load the configuration.
    ///
    /// `explicit` (from `--config`) wins over `VSIX_FETCH_CONFIG`, which wins
    /// over the default location. An explicitly named file must exist; a
    /// missing default file yields [`Config::default`].
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read, contains invalid TOML or
    /// holds invalid values.
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let config = match named {
            Some(path) => Self::load_from(&path).await?,
            None => {
                let path = Self::default_path()?;
                if fs::try_exists(&path).await.unwrap_or(false) {
                    Self::load_from(&path).await?
                } else {
                    tracing::debug!("No config file at {}, using defaults", path.display());
                    Self::default()
                }
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Default location of the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the home (or local data) directory is unknown.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("vsix-fetch")
        } else {
            crate::utils::platform::get_home_dir()?.join(CONFIG_DIR)
        };

        Ok(config_dir.join(CONFIG_FILE))
    }

    /// Reject values no run can work with.
    ///
    /// # Errors
    ///
    /// [`VsixError::ConfigError`] naming the offending key.
    pub fn validate(&self) -> Result<(), VsixError> {
        let invalid = |message: String| Err(VsixError::ConfigError {
            message,
        });

        if !self.marketplace_url.starts_with("http://")
            && !self.marketplace_url.starts_with("https://")
        {
            return invalid(format!(
                "marketplace_url must be an http(s) URL, got '{}'",
                self.marketplace_url
            ));
        }
        if self.api_version.trim().is_empty() {
            return invalid("api_version must not be empty".to_string());
        }
        if self.max_attempts == 0 {
            return invalid("max_attempts must be at least 1".to_string());
        }
        if self.max_parallel == 0 {
            return invalid("max_parallel must be at least 1".to_string());
        }
        if self.request_timeout_secs == 0 {
            return invalid("request_timeout_secs must be at least 1".to_string());
        }
        Ok(())
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Download retry policy.
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            max_attempts: self.max_attempts,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}
