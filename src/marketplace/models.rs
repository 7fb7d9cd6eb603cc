//! Wire types for the gallery query response and the package manifest.
//!
//! Only the fields the resolver consumes are modelled; everything else in the
//! (large) gallery response is ignored by serde.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Top-level gallery query response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    /// One result set per filter in the request
    #[serde(default)]
    pub results: Vec<QueryResult>,
}

/// Result set for one filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    /// Matching extensions
    #[serde(default)]
    pub extensions: Vec<MarketplaceExtension>,
}

impl QueryResponse {
    /// The first extension of the first result set, as consumed by the locator.
    pub fn into_first_extension(self) -> Option<MarketplaceExtension> {
        self.results.into_iter().next()?.extensions.into_iter().next()
    }
}

/// An extension entry with all of its published versions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketplaceExtension {
    /// Published versions, newest first
    #[serde(default)]
    pub versions: Vec<ExtensionVersion>,
}

/// One published version, possibly specific to a target platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionVersion {
    /// Version string
    pub version: String,
    /// Platform tag, absent for platform-neutral packages
    #[serde(default)]
    pub target_platform: Option<String>,
    /// Assets belonging to this version
    #[serde(default)]
    pub files: Vec<ExtensionFile>,
}

impl ExtensionVersion {
    /// Source URL of the first asset of the given type.
    pub fn asset_source(&self, asset_type: &str) -> Option<&str> {
        self.files.iter().find(|f| f.asset_type == asset_type).map(|f| f.source.as_str())
    }
}

/// A single asset of a version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionFile {
    /// Asset type, e.g. `Microsoft.VisualStudio.Services.VSIXPackage`
    pub asset_type: String,
    /// Download URL of the asset
    pub source: String,
}

/// The subset of an extension's `package.json` that declares dependencies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    /// Entries of `extensionDependencies`, in declaration order. A `null`
    /// field reads as an empty list.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub extension_dependencies: Vec<DependencyDeclaration>,
}

/// One `extensionDependencies` entry as written in the manifest.
///
/// Entries that are not strings are kept rather than failing the whole
/// manifest, so the locator can report them one by one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyDeclaration {
    /// A string entry, expected to be `publisher.id`
    Name(String),
    /// Any other JSON value
    Other(serde_json::Value),
}

impl DependencyDeclaration {
    /// The entry's text when it is a string.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Other(_) => None,
        }
    }
}

impl fmt::Display for DependencyDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Other(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for DependencyDeclaration {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl PartialEq<&str> for DependencyDeclaration {
    fn eq(&self, other: &&str) -> bool {
        self.as_name() == Some(*other)
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
