//! Error handling for vsix-fetch
//!
//! This module provides the strongly-typed error enum used by every component
//! and the user-facing presentation layer used by the CLI. The design follows
//! two principles:
//! 1. **Strongly-typed errors** so callers can decide what is fatal, what is
//!    retried and what is merely reported
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Error Taxonomy
//!
//! | Variant | Scope | Retried |
//! |---------|-------|---------|
//! | [`VsixError::InvalidReference`] | whole run, before any network activity | no |
//! | [`VsixError::ExtensionNotFound`] | subtree (whole run for the root) | no |
//! | [`VsixError::NotFoundForPlatform`] | subtree (whole run for the root) | no |
//! | [`VsixError::MarketplaceQuery`] | subtree (whole run for the root) | no |
//! | [`VsixError::ManifestUnavailable`] | warning only | no |
//! | [`VsixError::MalformedDependencyDeclaration`] | warning only | no |
//! | [`VsixError::TransferIncomplete`] | one artifact | yes |
//! | [`VsixError::TransportFailure`] | one artifact | yes |
//! | [`VsixError::FileSystemError`] | one artifact | no |
//!
//! Use [`user_friendly_error`] to convert any error into an [`ErrorContext`]
//! for display.
//!
//! # Examples
//!
//! ```rust,no_run
//! use vsix_fetch::core::{VsixError, user_friendly_error};
//!
//! let error = VsixError::NotFoundForPlatform {
//!     key: "ms-python.python".to_string(),
//!     platform: "linux-riscv64".to_string(),
//! };
//! let context = user_friendly_error(anyhow::Error::from(error));
//! context.display(); // colored error, details and suggestion on stderr
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for vsix-fetch operations.
///
/// Every variant names the extension key (or path) it concerns so that a
/// recorded failure can always be reported with the offending identity and
/// its underlying cause.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VsixError {
    /// The extension identifier given by the user could not be parsed.
    #[error("Invalid extension reference '{input}': {reason}")]
    InvalidReference {
        /// The raw input
        input: String,
        /// Why it was rejected
        reason: String,
    },

    /// The marketplace returned no extension for the identifier.
    #[error("Extension '{key}' was not found in the marketplace")]
    ExtensionNotFound {
        /// Extension key (`publisher.id`)
        key: String,
    },

    /// No published version targets the requested platform.
    #[error("No package found for '{key}' on platform '{platform}'")]
    NotFoundForPlatform {
        /// Extension key (`publisher.id`)
        key: String,
        /// Requested target platform
        platform: String,
    },

    /// The marketplace lookup itself failed or returned something unreadable.
    #[error("Marketplace query for '{key}' failed: {reason}")]
    MarketplaceQuery {
        /// Extension key (`publisher.id`)
        key: String,
        /// Underlying cause
        reason: String,
    },

    /// The package manifest could not be fetched or decoded.
    #[error("Manifest for '{key}' is unavailable: {reason}")]
    ManifestUnavailable {
        /// Extension key (`publisher.id`)
        key: String,
        /// Underlying cause
        reason: String,
    },

    /// A dependency entry in a manifest is not of the form `publisher.id`.
    #[error("Extension '{key}' declares malformed dependency '{declaration}'")]
    MalformedDependencyDeclaration {
        /// Key of the declaring extension
        key: String,
        /// The raw dependency string
        declaration: String,
    },

    /// The body ended before the advertised content length was reached.
    #[error("Incomplete download of '{key}': expected {expected} bytes, got {actual}")]
    TransferIncomplete {
        /// Extension key (`publisher.id`)
        key: String,
        /// Bytes advertised by `Content-Length`
        expected: u64,
        /// Bytes actually written
        actual: u64,
    },

    /// Connection error, non-2xx status or broken body stream.
    #[error("Transfer of '{key}' failed: {reason}")]
    TransportFailure {
        /// Extension key (`publisher.id`)
        key: String,
        /// Underlying cause
        reason: String,
    },

    /// A local filesystem operation failed.
    #[error("File system error during {operation} on {path}: {reason}")]
    FileSystemError {
        /// What was being attempted
        operation: String,
        /// Path involved
        path: String,
        /// Underlying cause
        reason: String,
    },

    /// The external installer rejected a package.
    #[error("Installing {path} failed: {reason}")]
    InstallFailed {
        /// Package path handed to the installer
        path: String,
        /// Underlying cause
        reason: String,
    },

    /// The configuration file could not be read or parsed.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },

    /// Catch-all for messages that have no dedicated variant.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl VsixError {
    /// Whether a failed download attempt with this error should be retried.
    ///
    /// Only transfer-level problems are transient. Filesystem errors are
    /// terminal for the artifact on the first occurrence.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::TransferIncomplete { .. } | Self::TransportFailure { .. })
    }

    /// Build a [`VsixError::FileSystemError`] from an I/O error.
    pub fn file_system(
        operation: impl Into<String>,
        path: &std::path::Path,
        error: &std::io::Error,
    ) -> Self {
        Self::FileSystemError {
            operation: operation.into(),
            path: path.display().to_string(),
            reason: error.to_string(),
        }
    }
}

/// User-facing wrapper around a [`VsixError`] with optional details and a
/// suggestion for resolving it.
///
/// # Examples
///
/// ```rust,no_run
/// use vsix_fetch::core::{ErrorContext, VsixError};
///
/// let context = ErrorContext::new(VsixError::ExtensionNotFound {
///     key: "foo.bar".to_string(),
/// })
/// .with_suggestion("Check the spelling of the publisher and extension id");
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: VsixError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: VsixError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr: error in red, details in yellow,
    /// suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into a user-friendly [`ErrorContext`].
///
/// [`VsixError`]s get tailored suggestions, I/O errors get filesystem
/// guidance, and anything else is shown with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(vsix_error) = error.downcast_ref::<VsixError>() {
        return create_error_context(vsix_error.clone());
    }

    // Bare I/O errors only; wrapped ones keep their context message below.
    if let Some(io_error) = error.downcast_ref::<std::io::Error>()
        && error.chain().count() == 1
    {
        let context = ErrorContext::new(VsixError::FileSystemError {
            operation: "file access".to_string(),
            path: "unknown".to_string(),
            reason: io_error.to_string(),
        });
        return match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => context
                .with_suggestion("Check that the output directory is writable by the current user"),
            std::io::ErrorKind::NotFound => {
                context.with_suggestion("Check that the file or directory exists")
            }
            _ => context,
        };
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(VsixError::Other {
        message,
    })
}

fn create_error_context(error: VsixError) -> ErrorContext {
    let (suggestion, details) = match &error {
        VsixError::InvalidReference { .. } => (
            Some(
                "Use the form 'publisher.extension' (e.g. 'ms-python.python') or paste the \
                 marketplace URL containing '?itemName=publisher.extension'",
            ),
            None,
        ),
        VsixError::ExtensionNotFound { .. } => (
            Some("Check the spelling of the publisher and extension id"),
            Some("The identifier is matched exactly against the marketplace catalogue"),
        ),
        VsixError::NotFoundForPlatform { .. } => (
            Some(
                "Pass --platform with one of the platforms the extension is published for, \
                 or --allow-universal to accept a platform-neutral package",
            ),
            Some("Platform tags look like 'linux-x64', 'darwin-arm64' or 'win32-x64'"),
        ),
        VsixError::MarketplaceQuery { .. } => {
            (Some("Check your network connection and the configured marketplace_url"), None)
        }
        VsixError::TransferIncomplete { .. } | VsixError::TransportFailure { .. } => (
            Some(
                "Re-run the command; completed packages are kept and will not be downloaded again",
            ),
            None,
        ),
        VsixError::FileSystemError { .. } => {
            (Some("Check permissions and free space in the output directory"), None)
        }
        VsixError::InstallFailed { .. } => (
            Some("Make sure the editor CLI is on your PATH or pass its location with --code-bin"),
            None,
        ),
        VsixError::ConfigError { .. } => {
            (Some("Fix the configuration file or point --config at a different one"), None)
        }
        VsixError::ManifestUnavailable { .. }
        | VsixError::MalformedDependencyDeclaration { .. }
        | VsixError::Other { .. } => (None, None),
    };

    let mut context = ErrorContext::new(error);
    if let Some(suggestion) = suggestion {
        context = context.with_suggestion(suggestion);
    }
    if let Some(details) = details {
        context = context.with_details(details);
    }
    context
}
