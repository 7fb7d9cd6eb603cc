//! Transitive dependency resolution.
//!
//! [`GraphBuilder`] walks the dependency declarations of the root extension
//! wave by wave. All not-yet-visited references of one wave are claimed in
//! declaration order, then located concurrently (bounded by `max_parallel`);
//! results are consumed in the same order, so the resulting graph does not
//! depend on network timing.

use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use super::dependency_graph::DependencyGraph;
use super::locator::Locator;
use crate::constants::DEFAULT_MAX_PARALLEL;
use crate::core::VsixError;
use crate::marketplace::Marketplace;
use crate::models::{ExtensionRef, ResolvedExtension};

/// A dependency that could not be resolved. Its subtree is missing from the
/// graph; everything else is unaffected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionFailure {
    /// Key of the dependency that failed
    pub key: String,
    /// Key of the extension that first declared it
    pub required_by: String,
    /// Why it failed
    pub error: VsixError,
}

/// Non-fatal outcomes collected while building the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    /// Manifest and declaration problems, in discovery order
    pub warnings: Vec<VsixError>,
    /// Dependencies that were skipped, in discovery order
    pub failures: Vec<ResolutionFailure>,
}

/// Result of a successful build: the graph and what went wrong on the way.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// All resolved extensions
    pub graph: DependencyGraph,
    /// Warnings and skipped dependencies
    pub report: ResolutionReport,
}

/// Builds a [`DependencyGraph`] from a root reference.
#[derive(Debug)]
pub struct GraphBuilder<M> {
    locator: Locator<M>,
    max_parallel: usize,
    follow_dependencies: bool,
}

impl<M: Marketplace> GraphBuilder<M> {
    /// Create a builder resolving packages for `platform`.
    pub fn new(marketplace: M, platform: impl Into<String>) -> Self {
        Self::from_locator(Locator::new(marketplace, platform))
    }

    /// Create a builder around a configured [`Locator`].
    pub fn from_locator(locator: Locator<M>) -> Self {
        Self {
            locator,
            max_parallel: DEFAULT_MAX_PARALLEL,
            follow_dependencies: true,
        }
    }

    /// Maximum number of concurrent lookups per wave (at least 1).
    #[must_use]
    pub fn max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    /// When disabled, only the root is resolved and its manifest is not read.
    #[must_use]
    pub fn follow_dependencies(mut self, follow: bool) -> Self {
        self.follow_dependencies = follow;
        self.locator = self.locator.read_dependencies(follow);
        self
    }

    /// The locator used for every lookup.
    pub fn locator(&self) -> &Locator<M> {
        &self.locator
    }

    /// Resolve `root` and, unless disabled, everything it transitively
    /// depends on.
    ///
    /// Each distinct key is looked up at most once per build, which also
    /// terminates dependency cycles.
    ///
    /// # Errors
    ///
    /// Only a failure to locate the root itself is returned. Failures of
    /// dependencies are recorded in [`ResolutionReport::failures`].
    pub async fn build(&self, root: &ExtensionRef) -> Result<Resolution, VsixError> {
        let mut report = ResolutionReport::default();
        let mut visited: HashSet<String> = HashSet::from([root.key()]);

        info!("Resolving {} for {}", root, self.locator.platform());
        let located = self.locator.locate(root).await?;
        report.warnings.extend(located.warnings);

        let mut graph = DependencyGraph::new(ResolvedExtension::new(
            root.clone(),
            located.version,
            located.download_url,
        ));

        if !self.follow_dependencies {
            return Ok(Resolution {
                graph,
                report,
            });
        }

        // Declarations per resolved node, linked once every wave is done so
        // edges to nodes resolved in later waves keep their declared order.
        let mut declarations: Vec<(String, Vec<ExtensionRef>)> = Vec::new();
        let mut wave: Vec<(String, ExtensionRef)> =
            located.dependencies.iter().map(|dep| (root.key(), dep.clone())).collect();
        declarations.push((root.key(), located.dependencies));

        while !wave.is_empty() {
            let claimed: Vec<(String, ExtensionRef)> =
                wave.into_iter().filter(|(_, dep)| visited.insert(dep.key())).collect();
            debug!("Resolving wave of {} extension(s)", claimed.len());

            let locator = &self.locator;
            let results: Vec<_> = stream::iter(claimed)
                .map(|(parent, dep)| async move {
                    let result = locator.locate(&dep).await;
                    (parent, dep, result)
                })
                .buffered(self.max_parallel)
                .collect()
                .await;

            let mut next_wave = Vec::new();
            for (parent, dep, result) in results {
                match result {
                    Ok(located) => {
                        debug!("Resolved {}@{} (required by {})", dep, located.version, parent);
                        report.warnings.extend(located.warnings);
                        graph.insert(ResolvedExtension::new(
                            dep.clone(),
                            located.version,
                            located.download_url,
                        ));
                        next_wave.extend(
                            located.dependencies.iter().map(|d| (dep.key(), d.clone())),
                        );
                        declarations.push((dep.key(), located.dependencies));
                    }
                    Err(error) => {
                        warn!("Skipping dependency {} of {}: {}", dep, parent, error);
                        report.failures.push(ResolutionFailure {
                            key: dep.key(),
                            required_by: parent,
                            error,
                        });
                    }
                }
            }
            wave = next_wave;
        }

        for (parent, deps) in &declarations {
            for dep in deps {
                graph.link(parent, &dep.key());
            }
        }

        if graph.has_cycles() {
            warn!("Circular dependencies detected below {}", root);
        }
        info!(
            "Resolved {} extension(s), {} dependency failure(s)",
            graph.len(),
            report.failures.len()
        );

        Ok(Resolution {
            graph,
            report,
        })
    }
}
