//! Shared data models for extension identities and resolved packages.
//!
//! - [`ExtensionRef`] names an extension (`publisher.id`) and is the identity
//!   used for deduplication everywhere.
//! - [`ResolvedExtension`] is an extension after a successful marketplace
//!   lookup: version, download URL and the keys of its resolved dependencies.
//! - [`DownloadRecord`] is the outcome of fetching one resolved extension.

use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use crate::constants::VSIX_EXTENSION;
use crate::core::VsixError;
use crate::utils::fs::sanitize_file_name;

static MARKETPLACE_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"marketplace\.visualstudio\.com/items\?(?:[^#]*&)?itemName=([^&#]+)")
        .expect("marketplace URL pattern is valid")
});

/// Identifies a marketplace extension by publisher and extension id.
///
/// The derived [`key`](Self::key) (`publisher.id`) is the unique identity used
/// for graph membership and deduplication. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtensionRef {
    publisher: String,
    id: String,
}

impl ExtensionRef {
    /// Create a reference from its two components.
    pub fn new(publisher: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            publisher: publisher.into(),
            id: id.into(),
        }
    }

    /// Parse user input: either `publisher.id` or a marketplace item URL
    /// such as `https://marketplace.visualstudio.com/items?itemName=ms-python.python`.
    ///
    /// # Errors
    ///
    /// Returns [`VsixError::InvalidReference`] when neither form matches.
    pub fn from_input(input: &str) -> Result<Self, VsixError> {
        let input = input.trim();
        if let Some(captures) = MARKETPLACE_URL_PATTERN.captures(input) {
            return captures[1].parse().map_err(|_| VsixError::InvalidReference {
                input: input.to_string(),
                reason: "itemName must be of the form 'publisher.extension'".to_string(),
            });
        }
        if input.contains("://") {
            return Err(VsixError::InvalidReference {
                input: input.to_string(),
                reason: "not a marketplace item URL".to_string(),
            });
        }
        input.parse()
    }

    /// Publisher name.
    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    /// Extension id within the publisher.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Unique identity: `publisher.id`.
    pub fn key(&self) -> String {
        format!("{}.{}", self.publisher, self.id)
    }
}

impl fmt::Display for ExtensionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.publisher, self.id)
    }
}

impl FromStr for ExtensionRef {
    type Err = VsixError;

    /// Accepts exactly two non-empty dot-separated components.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        match parts.as_slice() {
            [publisher, id] if !publisher.is_empty() && !id.is_empty() => {
                Ok(Self::new(*publisher, *id))
            }
            _ => Err(VsixError::InvalidReference {
                input: s.to_string(),
                reason: "expected exactly 'publisher.extension'".to_string(),
            }),
        }
    }
}

/// An extension whose marketplace lookup succeeded.
///
/// Nodes live in the resolution arena
/// ([`DependencyGraph`](crate::resolver::DependencyGraph)); `dependencies`
/// holds the keys of children that resolved successfully, in the order the
/// manifest declared them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedExtension {
    /// Identity of the extension
    pub reference: ExtensionRef,
    /// Version string as published (treated as opaque)
    pub version: String,
    /// Location of the `.vsix` package
    pub download_url: String,
    /// Keys of resolved dependencies, in declaration order
    pub dependencies: Vec<String>,
}

impl ResolvedExtension {
    /// Create a node without dependencies.
    pub fn new(
        reference: ExtensionRef,
        version: impl Into<String>,
        download_url: impl Into<String>,
    ) -> Self {
        Self {
            reference,
            version: version.into(),
            download_url: download_url.into(),
            dependencies: Vec::new(),
        }
    }

    /// Unique identity: `publisher.id`.
    pub fn key(&self) -> String {
        self.reference.key()
    }

    /// File name for this package at a 1-based `position` in the download
    /// order: `<02d-position>-<publisher>-<id>-<version>.vsix`.
    ///
    /// Sorting these names lexically reproduces install order. Path
    /// separators and other unsafe characters are dropped from each part, so
    /// the name never escapes the destination directory.
    pub fn file_name(&self, position: usize) -> String {
        format!(
            "{:02}-{}-{}-{}.{}",
            position,
            sanitize_file_name(self.reference.publisher()),
            sanitize_file_name(self.reference.id()),
            sanitize_file_name(&self.version),
            VSIX_EXTENSION
        )
    }
}

impl fmt::Display for ResolvedExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.reference, self.version)
    }
}

/// Outcome of fetching one sequenced extension: a path on success or the
/// permanent error, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRecord {
    /// Key of the extension
    pub key: String,
    /// 1-based position in the download order
    pub position: usize,
    /// Final package path, or why it could not be fetched
    pub outcome: Result<PathBuf, VsixError>,
}

impl DownloadRecord {
    /// Whether the package was written.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The written package, if any.
    pub fn path(&self) -> Option<&Path> {
        self.outcome.as_ref().ok().map(PathBuf::as_path)
    }

    /// The permanent error, if any.
    pub fn error(&self) -> Option<&VsixError> {
        self.outcome.as_ref().err()
    }
}
