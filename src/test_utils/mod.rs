//! Test utilities for vsix-fetch
//!
//! - [`init_test_logging`] wires `tracing` output into the test harness
//! - [`FakeMarketplace`] is an in-memory [`Marketplace`] with call counting
//!   and failure injection
//! - [`package_version`] / [`universal_version`] build gallery version entries
//!
//! # Example
//!
//! ```rust,no_run
//! use vsix_fetch::resolver::GraphBuilder;
//! use vsix_fetch::test_utils::FakeMarketplace;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let marketplace = FakeMarketplace::new()
//!     .with_extension("pub.a", "1.0.0", "linux-x64", &["pub.b"])
//!     .with_extension("pub.b", "2.0.0", "linux-x64", &[]);
//!
//! let resolution = GraphBuilder::new(marketplace.clone(), "linux-x64")
//!     .build(&"pub.a".parse()?)
//!     .await?;
//! assert_eq!(resolution.graph.len(), 2);
//! assert_eq!(marketplace.query_count("pub.a"), 1);
//! # Ok(())
//! # }
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, Once};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::constants::{MANIFEST_ASSET, VSIX_PACKAGE_ASSET};
use crate::core::VsixError;
use crate::marketplace::{
    DependencyDeclaration, ExtensionFile, ExtensionVersion, Marketplace, MarketplaceExtension,
    PackageManifest,
};
use crate::models::ExtensionRef;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Respects `RUST_LOG` when set, otherwise uses `level`. Without either,
/// logging stays off.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

const FAKE_HOST: &str = "https://fake.marketplace.test";

/// Gallery version entry for `platform` with a package and a manifest asset.
pub fn package_version(version: &str, platform: &str) -> ExtensionVersion {
    ExtensionVersion {
        version: version.to_string(),
        target_platform: Some(platform.to_string()),
        files: vec![
            ExtensionFile {
                asset_type: VSIX_PACKAGE_ASSET.to_string(),
                source: format!("{FAKE_HOST}/{platform}/{version}/package.vsix"),
            },
            ExtensionFile {
                asset_type: MANIFEST_ASSET.to_string(),
                source: format!("{FAKE_HOST}/{platform}/{version}/package.json"),
            },
        ],
    }
}

/// Gallery version entry without a target platform.
pub fn universal_version(version: &str) -> ExtensionVersion {
    let mut entry = package_version(version, "universal");
    entry.target_platform = None;
    entry
}

#[derive(Default)]
struct FakeState {
    extensions: HashMap<String, Vec<ExtensionVersion>>,
    manifests: HashMap<String, PackageManifest>,
    manifest_failures: HashSet<String>,
    query_failures: HashSet<String>,
    queries: HashMap<String, usize>,
    manifest_fetches: HashMap<String, usize>,
}

/// In-memory marketplace.
///
/// Clones share state, so a clone handed to the code under test still
/// reports the calls it received.
#[derive(Clone, Default)]
pub struct FakeMarketplace {
    state: Arc<Mutex<FakeState>>,
}

impl FakeMarketplace {
    /// Empty marketplace: every lookup returns "not found".
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extension with a single version for `platform` whose
    /// manifest declares `dependencies` verbatim.
    #[must_use]
    pub fn with_extension(
        self,
        key: &str,
        version: &str,
        platform: &str,
        dependencies: &[&str],
    ) -> Self {
        let mut entry = package_version(version, platform);
        for file in &mut entry.files {
            file.source = format!("{FAKE_HOST}/{key}/{version}/{}", file_name(&file.asset_type));
        }
        self.with_manifest(
            &format!("{FAKE_HOST}/{key}/{version}/package.json"),
            dependencies,
        )
        .with_versions(key, vec![entry])
    }

    /// Register an extension with explicit gallery versions.
    #[must_use]
    pub fn with_versions(self, key: &str, versions: Vec<ExtensionVersion>) -> Self {
        self.state.lock().unwrap().extensions.insert(key.to_string(), versions);
        self
    }

    /// Register the manifest served at `url`.
    #[must_use]
    pub fn with_manifest(self, url: &str, dependencies: &[&str]) -> Self {
        self.state.lock().unwrap().manifests.insert(
            url.to_string(),
            PackageManifest {
                extension_dependencies: dependencies
                    .iter()
                    .map(|d| DependencyDeclaration::from(*d))
                    .collect(),
            },
        );
        self
    }

    /// Replace the manifest of an extension registered with
    /// [`with_extension`](Self::with_extension) by a raw JSON document.
    ///
    /// # Panics
    ///
    /// If `document` is not a decodable manifest.
    #[must_use]
    pub fn with_manifest_document(
        self,
        key: &str,
        version: &str,
        document: serde_json::Value,
    ) -> Self {
        let manifest: PackageManifest =
            serde_json::from_value(document).expect("manifest document should decode");
        self.state
            .lock()
            .unwrap()
            .manifests
            .insert(format!("{FAKE_HOST}/{key}/{version}/package.json"), manifest);
        self
    }

    /// Point the package asset of every version of `key` at `url`.
    #[must_use]
    pub fn with_package_url(self, key: &str, url: &str) -> Self {
        if let Some(versions) = self.state.lock().unwrap().extensions.get_mut(key) {
            for version in versions {
                for file in &mut version.files {
                    if file.asset_type == VSIX_PACKAGE_ASSET {
                        file.source = url.to_string();
                    }
                }
            }
        }
        self
    }

    /// Make manifest fetches for `key` fail as if the server answered 404.
    #[must_use]
    pub fn with_manifest_failure(self, key: &str) -> Self {
        self.state.lock().unwrap().manifest_failures.insert(key.to_string());
        self
    }

    /// Make the metadata lookup for `key` fail.
    #[must_use]
    pub fn with_query_failure(self, key: &str) -> Self {
        self.state.lock().unwrap().query_failures.insert(key.to_string());
        self
    }

    /// Number of metadata lookups received for `key`.
    pub fn query_count(&self, key: &str) -> usize {
        self.state.lock().unwrap().queries.get(key).copied().unwrap_or(0)
    }

    /// Total number of metadata lookups received.
    pub fn total_queries(&self) -> usize {
        self.state.lock().unwrap().queries.values().sum()
    }

    /// Number of manifest fetches received for `key`.
    pub fn manifest_fetch_count(&self, key: &str) -> usize {
        self.state.lock().unwrap().manifest_fetches.get(key).copied().unwrap_or(0)
    }
}

fn file_name(asset_type: &str) -> &'static str {
    if asset_type == MANIFEST_ASSET {
        "package.json"
    } else {
        "package.vsix"
    }
}

impl Marketplace for FakeMarketplace {
    async fn query(
        &self,
        reference: &ExtensionRef,
    ) -> Result<Option<MarketplaceExtension>, VsixError> {
        let key = reference.key();
        let mut state = self.state.lock().unwrap();
        *state.queries.entry(key.clone()).or_default() += 1;

        if state.query_failures.contains(&key) {
            return Err(VsixError::MarketplaceQuery {
                key,
                reason: "HTTP 500 Internal Server Error".to_string(),
            });
        }

        Ok(state.extensions.get(&key).map(|versions| MarketplaceExtension {
            versions: versions.clone(),
        }))
    }

    async fn fetch_manifest(
        &self,
        reference: &ExtensionRef,
        url: &str,
    ) -> Result<PackageManifest, VsixError> {
        let key = reference.key();
        let mut state = self.state.lock().unwrap();
        *state.manifest_fetches.entry(key.clone()).or_default() += 1;

        if state.manifest_failures.contains(&key) {
            return Err(VsixError::ManifestUnavailable {
                key,
                reason: "HTTP 404 Not Found".to_string(),
            });
        }

        Ok(state.manifests.get(url).cloned().unwrap_or_default())
    }
}
