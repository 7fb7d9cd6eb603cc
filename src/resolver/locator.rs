//! Artifact location: from an extension reference and a target platform to a
//! concrete package URL, version and declared dependencies.

use tracing::{debug, warn};

use crate::constants::{MANIFEST_ASSET, VSIX_PACKAGE_ASSET};
use crate::core::VsixError;
use crate::marketplace::{ExtensionVersion, Marketplace};
use crate::models::ExtensionRef;

/// Outcome of a successful [`Locator::locate`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedArtifact {
    /// URL of the `.vsix` package for the requested platform
    pub download_url: String,
    /// Version of that package
    pub version: String,
    /// Well-formed dependency references, in declaration order
    pub dependencies: Vec<ExtensionRef>,
    /// Non-fatal problems: an unavailable manifest or malformed entries
    pub warnings: Vec<VsixError>,
}

/// Resolves extensions against a [`Marketplace`] for one target platform.
#[derive(Debug, Clone)]
pub struct Locator<M> {
    marketplace: M,
    platform: String,
    accept_universal: bool,
    read_dependencies: bool,
}

impl<M: Marketplace> Locator<M> {
    /// Create a locator selecting packages built for `platform`.
    pub fn new(marketplace: M, platform: impl Into<String>) -> Self {
        Self {
            marketplace,
            platform: platform.into(),
            accept_universal: false,
            read_dependencies: true,
        }
    }

    /// Also accept a platform-neutral version (one without `targetPlatform`)
    /// when no version matches the requested platform exactly.
    #[must_use]
    pub fn accept_universal(mut self, accept: bool) -> Self {
        self.accept_universal = accept;
        self
    }

    /// Skip the manifest fetch when disabled; located artifacts then report
    /// no dependencies.
    #[must_use]
    pub fn read_dependencies(mut self, read: bool) -> Self {
        self.read_dependencies = read;
        self
    }

    /// Target platform this locator selects for.
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Locate the package of `reference` for the configured platform.
    ///
    /// Issues at most two marketplace calls: the metadata lookup and the
    /// manifest fetch.
    ///
    /// # Errors
    ///
    /// - [`VsixError::ExtensionNotFound`] when the marketplace doesn't know it
    /// - [`VsixError::NotFoundForPlatform`] when no version targets the
    ///   platform, or the matching version carries no package asset
    /// - [`VsixError::MarketplaceQuery`] when the lookup itself fails
    ///
    /// Manifest problems never fail the call; they end up in
    /// [`LocatedArtifact::warnings`].
    pub async fn locate(&self, reference: &ExtensionRef) -> Result<LocatedArtifact, VsixError> {
        let key = reference.key();
        let extension = self.marketplace.query(reference).await?.ok_or_else(|| {
            VsixError::ExtensionNotFound {
                key: key.clone(),
            }
        })?;

        let not_for_platform = || VsixError::NotFoundForPlatform {
            key: key.clone(),
            platform: self.platform.clone(),
        };

        let version = self.select_version(&extension.versions).ok_or_else(not_for_platform)?;
        let download_url = version.asset_source(VSIX_PACKAGE_ASSET).ok_or_else(not_for_platform)?;

        debug!("Located {}@{} for {}", key, version.version, self.platform);

        let mut warnings = Vec::new();
        let declarations = match version.asset_source(MANIFEST_ASSET) {
            _ if !self.read_dependencies => Vec::new(),
            Some(manifest_url) => {
                match self.marketplace.fetch_manifest(reference, manifest_url).await {
                    Ok(manifest) => manifest.extension_dependencies,
                    Err(e) => {
                        warn!("{}; assuming no dependencies", e);
                        warnings.push(e);
                        Vec::new()
                    }
                }
            }
            None => {
                debug!("{} has no manifest asset; assuming no dependencies", key);
                Vec::new()
            }
        };

        let mut dependencies = Vec::with_capacity(declarations.len());
        for declaration in declarations {
            match declaration.as_name().map(str::parse::<ExtensionRef>) {
                Some(Ok(dependency)) => dependencies.push(dependency),
                _ => {
                    let error = VsixError::MalformedDependencyDeclaration {
                        key: key.clone(),
                        declaration: declaration.to_string(),
                    };
                    warn!("{}; skipping it", error);
                    warnings.push(error);
                }
            }
        }

        Ok(LocatedArtifact {
            download_url: download_url.to_string(),
            version: version.version.clone(),
            dependencies,
            warnings,
        })
    }

    /// First version (marketplace order, newest first) built for the
    /// platform, falling back to a platform-neutral one when allowed.
    fn select_version<'a>(&self, versions: &'a [ExtensionVersion]) -> Option<&'a ExtensionVersion> {
        let exact = versions.iter().find(|v| {
            v.target_platform.as_deref().is_some_and(|p| p.eq_ignore_ascii_case(&self.platform))
        });

        match exact {
            Some(version) => Some(version),
            None if self.accept_universal => {
                versions.iter().find(|v| v.target_platform.as_deref().is_none_or(str::is_empty))
            }
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeMarketplace, package_version, universal_version};

    fn locator(marketplace: FakeMarketplace) -> Locator<FakeMarketplace> {
        Locator::new(marketplace, "linux-x64")
    }

    #[tokio::test]
    async fn test_selects_matching_platform_case_insensitively() {
        let marketplace = FakeMarketplace::new().with_versions(
            "pub.ext",
            vec![
                package_version("2.0.0", "win32-x64"),
                package_version("2.0.0", "Linux-X64"),
                package_version("1.0.0", "linux-x64"),
            ],
        );

        let located = locator(marketplace).locate(&"pub.ext".parse().unwrap()).await.unwrap();
        assert_eq!(located.version, "2.0.0");
        assert!(located.download_url.contains("Linux-X64"));
        assert!(located.dependencies.is_empty());
        assert!(located.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_no_matching_platform() {
        let marketplace = FakeMarketplace::new()
            .with_versions("pub.ext", vec![package_version("1.0.0", "darwin-arm64")]);

        let result = locator(marketplace).locate(&"pub.ext".parse().unwrap()).await;
        assert_eq!(
            result.unwrap_err(),
            VsixError::NotFoundForPlatform {
                key: "pub.ext".into(),
                platform: "linux-x64".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_universal_version_requires_opt_in() {
        let marketplace =
            FakeMarketplace::new().with_versions("pub.ext", vec![universal_version("3.1.0")]);

        let strict = locator(marketplace.clone()).locate(&"pub.ext".parse().unwrap()).await;
        assert!(matches!(strict, Err(VsixError::NotFoundForPlatform { .. })));

        let relaxed = locator(marketplace)
            .accept_universal(true)
            .locate(&"pub.ext".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(relaxed.version, "3.1.0");
    }

    #[tokio::test]
    async fn test_unknown_extension() {
        let result = locator(FakeMarketplace::new()).locate(&"nobody.home".parse().unwrap()).await;
        assert_eq!(
            result.unwrap_err(),
            VsixError::ExtensionNotFound {
                key: "nobody.home".into()
            }
        );
    }

    #[tokio::test]
    async fn test_version_without_package_asset() {
        let mut version = package_version("1.0.0", "linux-x64");
        version.files.retain(|f| f.asset_type != VSIX_PACKAGE_ASSET);
        let marketplace = FakeMarketplace::new().with_versions("pub.ext", vec![version]);

        let result = locator(marketplace).locate(&"pub.ext".parse().unwrap()).await;
        assert!(matches!(result, Err(VsixError::NotFoundForPlatform { .. })));
    }

    #[tokio::test]
    async fn test_manifest_failure_is_a_warning() {
        let marketplace = FakeMarketplace::new()
            .with_extension("pub.ext", "1.0.0", "linux-x64", &["a.b"])
            .with_manifest_failure("pub.ext");

        let located = locator(marketplace).locate(&"pub.ext".parse().unwrap()).await.unwrap();
        assert!(located.dependencies.is_empty());
        assert_eq!(located.warnings.len(), 1);
        assert!(matches!(located.warnings[0], VsixError::ManifestUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_malformed_dependencies_are_skipped() {
        let marketplace = FakeMarketplace::new().with_extension(
            "pub.ext",
            "1.0.0",
            "linux-x64",
            &["good.one", "malformed-no-dot", "too.many.dots", "good.two"],
        );

        let located = locator(marketplace).locate(&"pub.ext".parse().unwrap()).await.unwrap();
        let keys: Vec<String> = located.dependencies.iter().map(ExtensionRef::key).collect();
        assert_eq!(keys, vec!["good.one", "good.two"]);
        assert_eq!(located.warnings.len(), 2);
        assert!(located.warnings.iter().all(|w| matches!(
            w,
            VsixError::MalformedDependencyDeclaration { key, .. } if key == "pub.ext"
        )));
    }

    #[tokio::test]
    async fn test_non_string_declaration_does_not_drop_siblings() {
        let marketplace = FakeMarketplace::new()
            .with_extension("pub.ext", "1.0.0", "linux-x64", &[])
            .with_manifest_document(
                "pub.ext",
                "1.0.0",
                serde_json::json!({ "extensionDependencies": ["a.b", 42, "c.d"] }),
            );

        let located = locator(marketplace).locate(&"pub.ext".parse().unwrap()).await.unwrap();
        let keys: Vec<String> = located.dependencies.iter().map(ExtensionRef::key).collect();
        assert_eq!(keys, vec!["a.b", "c.d"]);
        assert_eq!(
            located.warnings,
            vec![VsixError::MalformedDependencyDeclaration {
                key: "pub.ext".into(),
                declaration: "42".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_read_dependencies_disabled_skips_manifest() {
        let marketplace =
            FakeMarketplace::new().with_extension("pub.ext", "1.0.0", "linux-x64", &["a.b"]);

        let located = locator(marketplace.clone())
            .read_dependencies(false)
            .locate(&"pub.ext".parse().unwrap())
            .await
            .unwrap();
        assert!(located.dependencies.is_empty());
        assert_eq!(marketplace.manifest_fetch_count("pub.ext"), 0);
    }

    #[tokio::test]
    async fn test_missing_manifest_asset_means_no_dependencies() {
        let mut version = package_version("1.0.0", "linux-x64");
        version.files.retain(|f| f.asset_type != MANIFEST_ASSET);
        let marketplace = FakeMarketplace::new().with_versions("pub.ext", vec![version]);

        let located = locator(marketplace).locate(&"pub.ext".parse().unwrap()).await.unwrap();
        assert!(located.dependencies.is_empty());
        assert!(located.warnings.is_empty());
    }
}
