//! End-to-end run: resolve, sequence, fetch.
//!
//! [`Pipeline::run`] builds the dependency graph of the root extension,
//! flattens it into install order and downloads each package in turn. A
//! failed download is recorded and the run moves on to the next package; only
//! a failure to resolve the root aborts the run.

pub mod installer;

use reqwest::Client;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants::DEFAULT_MAX_PARALLEL;
use crate::core::VsixError;
use crate::fetcher::{FetchConfig, Fetcher};
use crate::marketplace::Marketplace;
use crate::models::{DownloadRecord, ExtensionRef, ResolvedExtension};
use crate::resolver::{
    DependencyGraph, GraphBuilder, Locator, Resolution, ResolutionReport, sequence, single,
};

pub use installer::{CodeCliInstaller, Installer};

/// Knobs of a run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Marketplace target platform, e.g. `linux-x64`
    pub platform: String,
    /// Directory receiving the packages
    pub dest_dir: PathBuf,
    /// Follow `extensionDependencies`; when false only the root is fetched
    pub resolve_dependencies: bool,
    /// Fall back to platform-neutral versions
    pub accept_universal: bool,
    /// Concurrent marketplace lookups while resolving
    pub max_parallel: usize,
    /// Download retry policy
    pub fetch: FetchConfig,
    /// Draw download progress bars
    pub show_progress: bool,
}

impl PipelineOptions {
    /// Options with defaults for everything but the platform and directory.
    pub fn new(platform: impl Into<String>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            platform: platform.into(),
            dest_dir: dest_dir.into(),
            resolve_dependencies: true,
            accept_universal: false,
            max_parallel: DEFAULT_MAX_PARALLEL,
            fetch: FetchConfig::default(),
            show_progress: true,
        }
    }
}

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// The resolved graph
    pub graph: DependencyGraph,
    /// Install order, root last
    pub order: Vec<ResolvedExtension>,
    /// One record per entry of `order`, same order
    pub records: Vec<DownloadRecord>,
    /// Resolution warnings and skipped dependencies
    pub report: ResolutionReport,
}

impl RunSummary {
    /// Records of packages that were written.
    pub fn succeeded(&self) -> impl Iterator<Item = &DownloadRecord> {
        self.records.iter().filter(|r| r.is_success())
    }

    /// Records of packages that could not be fetched.
    pub fn failed(&self) -> impl Iterator<Item = &DownloadRecord> {
        self.records.iter().filter(|r| !r.is_success())
    }

    /// Whether any download failed or any dependency could not be resolved.
    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some() || !self.report.failures.is_empty()
    }

    /// Paths of written packages, in install order.
    pub fn installable_paths(&self) -> Vec<PathBuf> {
        self.records.iter().filter_map(|r| r.path().map(Path::to_path_buf)).collect()
    }
}

/// Resolves and downloads an extension with its dependencies.
#[derive(Debug)]
pub struct Pipeline<M> {
    builder: GraphBuilder<M>,
    fetcher: Fetcher,
    dest_dir: PathBuf,
    resolve_dependencies: bool,
}

impl<M: Marketplace> Pipeline<M> {
    /// Create a pipeline. `client` is used for downloads; share it with the
    /// marketplace implementation to pool connections.
    pub fn new(marketplace: M, client: Client, options: PipelineOptions) -> Self {
        let locator = Locator::new(marketplace, options.platform)
            .accept_universal(options.accept_universal);
        let builder = GraphBuilder::from_locator(locator)
            .max_parallel(options.max_parallel)
            .follow_dependencies(options.resolve_dependencies);
        let fetcher = Fetcher::new(client, options.fetch).with_progress(options.show_progress);

        Self {
            builder,
            fetcher,
            dest_dir: options.dest_dir,
            resolve_dependencies: options.resolve_dependencies,
        }
    }

    /// Destination directory.
    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    /// Resolve `root` and compute the install order without downloading.
    ///
    /// # Errors
    ///
    /// Fails only when the root itself cannot be located.
    pub async fn plan(
        &self,
        root: &ExtensionRef,
    ) -> Result<(Resolution, Vec<ResolvedExtension>), VsixError> {
        let resolution = self.builder.build(root).await?;
        let order = if self.resolve_dependencies {
            sequence(&resolution.graph)
        } else {
            single(resolution.graph.root())
        };
        Ok((resolution, order))
    }

    /// Resolve, sequence and download.
    ///
    /// # Errors
    ///
    /// Fails only when the root itself cannot be located. Download failures
    /// are reported per package in [`RunSummary::records`].
    pub async fn run(&self, root: &ExtensionRef) -> Result<RunSummary, VsixError> {
        let (resolution, order) = self.plan(root).await?;
        info!("Fetching {} package(s) into {}", order.len(), self.dest_dir.display());

        let mut records = Vec::with_capacity(order.len());
        for (index, node) in order.iter().enumerate() {
            let position = index + 1;
            let outcome = self.fetcher.fetch(node, position, &self.dest_dir).await;
            if let Err(e) = &outcome {
                warn!("Failed to fetch {}: {}", node, e);
            }
            records.push(DownloadRecord {
                key: node.key(),
                position,
                outcome,
            });
        }

        Ok(RunSummary {
            graph: resolution.graph,
            order,
            records,
            report: resolution.report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeMarketplace;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn options(dest: &Path) -> PipelineOptions {
        PipelineOptions {
            fetch: FetchConfig {
                max_attempts: 2,
                retry_delay: Duration::from_millis(10),
            },
            show_progress: false,
            ..PipelineOptions::new("linux-x64", dest)
        }
    }

    async fn serve(server: &MockServer, route: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_bytes(route.as_bytes().to_vec()))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_run_downloads_in_dependency_order() {
        let server = MockServer::start().await;
        serve(&server, "/a.vsix", 200).await;
        serve(&server, "/b.vsix", 200).await;

        let marketplace = FakeMarketplace::new()
            .with_extension("p.a", "1.0.0", "linux-x64", &["p.b"])
            .with_extension("p.b", "2.0.0", "linux-x64", &[])
            .with_package_url("p.a", &format!("{}/a.vsix", server.uri()))
            .with_package_url("p.b", &format!("{}/b.vsix", server.uri()));

        let temp = TempDir::new().unwrap();
        let pipeline = Pipeline::new(marketplace, Client::new(), options(temp.path()));
        let summary = pipeline.run(&"p.a".parse().unwrap()).await.unwrap();

        let names: Vec<String> = summary
            .installable_paths()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["01-p-b-2.0.0.vsix", "02-p-a-1.0.0.vsix"]);
        assert!(!summary.has_failures());
        assert_eq!(summary.succeeded().count(), 2);
    }

    #[tokio::test]
    async fn test_failed_download_does_not_stop_the_run() {
        let server = MockServer::start().await;
        serve(&server, "/a.vsix", 200).await;
        serve(&server, "/b.vsix", 404).await;

        let marketplace = FakeMarketplace::new()
            .with_extension("p.a", "1.0.0", "linux-x64", &["p.b"])
            .with_extension("p.b", "1.0.0", "linux-x64", &[])
            .with_package_url("p.a", &format!("{}/a.vsix", server.uri()))
            .with_package_url("p.b", &format!("{}/b.vsix", server.uri()));

        let temp = TempDir::new().unwrap();
        let pipeline = Pipeline::new(marketplace, Client::new(), options(temp.path()));
        let summary = pipeline.run(&"p.a".parse().unwrap()).await.unwrap();

        assert!(summary.has_failures());
        let failed: Vec<&str> = summary.failed().map(|r| r.key.as_str()).collect();
        assert_eq!(failed, vec!["p.b"]);
        assert_eq!(summary.records[1].key, "p.a");
        assert!(summary.records[1].is_success());
        assert_eq!(summary.installable_paths().len(), 1);
    }

    #[tokio::test]
    async fn test_no_deps_fetches_only_root() {
        let server = MockServer::start().await;
        serve(&server, "/a.vsix", 200).await;

        let marketplace = FakeMarketplace::new()
            .with_extension("p.a", "1.0.0", "linux-x64", &["p.b"])
            .with_extension("p.b", "1.0.0", "linux-x64", &[])
            .with_package_url("p.a", &format!("{}/a.vsix", server.uri()));

        let temp = TempDir::new().unwrap();
        let opts = PipelineOptions {
            resolve_dependencies: false,
            ..options(temp.path())
        };
        let pipeline = Pipeline::new(marketplace.clone(), Client::new(), opts);
        let summary = pipeline.run(&"p.a".parse().unwrap()).await.unwrap();

        assert_eq!(summary.order.len(), 1);
        assert_eq!(summary.records[0].position, 1);
        assert_eq!(marketplace.query_count("p.b"), 0);
    }

    #[tokio::test]
    async fn test_root_failure_aborts_before_any_download() {
        let marketplace = FakeMarketplace::new();
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");

        let pipeline = Pipeline::new(marketplace, Client::new(), options(&dest));
        let result = pipeline.run(&"nobody.home".parse().unwrap()).await;

        assert!(matches!(result, Err(VsixError::ExtensionNotFound { .. })));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_dependency_resolution_failure_counts_as_failure() {
        let server = MockServer::start().await;
        serve(&server, "/a.vsix", 200).await;

        let marketplace = FakeMarketplace::new()
            .with_extension("p.a", "1.0.0", "linux-x64", &["p.missing"])
            .with_package_url("p.a", &format!("{}/a.vsix", server.uri()));

        let temp = TempDir::new().unwrap();
        let pipeline = Pipeline::new(marketplace, Client::new(), options(temp.path()));
        let summary = pipeline.run(&"p.a".parse().unwrap()).await.unwrap();

        assert_eq!(summary.failed().count(), 0);
        assert_eq!(summary.report.failures.len(), 1);
        assert!(summary.has_failures());
    }
}
