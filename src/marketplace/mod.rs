//! Marketplace access.
//!
//! The resolver talks to the marketplace only through the [`Marketplace`]
//! trait: one metadata lookup per extension and one manifest fetch per
//! resolved version. [`HttpMarketplace`] implements it against the public
//! gallery API; tests substitute an in-memory implementation.

mod http;
pub mod models;

pub use http::{HttpMarketplace, build_client};
pub use models::{
    DependencyDeclaration, ExtensionFile, ExtensionVersion, MarketplaceExtension, PackageManifest,
    QueryResponse,
};

use std::future::Future;

use crate::core::VsixError;
use crate::models::ExtensionRef;

/// Read-only access to extension metadata.
///
/// Implementations must be safe to call concurrently; the graph builder issues
/// lookups for independent siblings in parallel.
pub trait Marketplace: Send + Sync {
    /// Look up an extension. `Ok(None)` means the marketplace does not know it.
    fn query(
        &self,
        reference: &ExtensionRef,
    ) -> impl Future<Output = Result<Option<MarketplaceExtension>, VsixError>> + Send;

    /// Fetch and decode the manifest asset at `url` for `reference`.
    ///
    /// Failures are reported as [`VsixError::ManifestUnavailable`].
    fn fetch_manifest(
        &self,
        reference: &ExtensionRef,
        url: &str,
    ) -> impl Future<Output = Result<PackageManifest, VsixError>> + Send;
}
