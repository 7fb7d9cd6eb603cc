//! vsix-fetch - VS Code marketplace extension downloader
//!
//! Downloads an extension's `.vsix` package for a given target platform
//! together with every extension it transitively depends on, named so that
//! installing the files in name order installs dependencies first.
//!
//! # Architecture Overview
//!
//! A run moves through four stages:
//!
//! 1. **Locate** ([`resolver::Locator`]): query the marketplace for one
//!    extension, select the version built for the target platform and read the
//!    `extensionDependencies` of its manifest.
//! 2. **Build** ([`resolver::GraphBuilder`]): locate the root and then all of
//!    its dependencies, each distinct `publisher.id` once, into a
//!    [`resolver::DependencyGraph`] arena.
//! 3. **Sequence** ([`resolver::sequence`]): order the graph dependency-first,
//!    root last.
//! 4. **Fetch** ([`fetcher::Fetcher`]): download each package with retries,
//!    writing to a temp file and renaming it into place.
//!
//! [`pipeline::Pipeline`] drives the four stages and collects a
//! [`pipeline::RunSummary`]. A failure of the root is fatal; failures of
//! dependencies and of individual downloads are recorded and the run goes on.
//!
//! # Core Modules
//!
//! - [`cli`] - Command-line interface
//! - [`config`] - User configuration (`~/.vsix-fetch/config.toml`)
//! - [`core`] - Error types and user-facing error rendering
//! - [`marketplace`] - Marketplace trait and the gallery HTTP client
//! - [`resolver`] - Locating, graph building and sequencing
//! - [`fetcher`] - Resilient downloads
//! - [`pipeline`] - Orchestration and the optional install step
//!
//! ## Supporting Modules
//! - [`models`] - Extension identities, resolved nodes and download records
//! - [`utils`] - File system, platform detection and progress bars
//! - [`constants`] - Defaults
//!
//! # Example
//!
//! ```rust,no_run
//! use vsix_fetch::marketplace::{HttpMarketplace, build_client};
//! use vsix_fetch::pipeline::{Pipeline, PipelineOptions};
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = build_client(Duration::from_secs(60))?;
//! let marketplace = HttpMarketplace::new(
//!     client.clone(),
//!     vsix_fetch::constants::DEFAULT_MARKETPLACE_URL,
//!     vsix_fetch::constants::DEFAULT_API_VERSION,
//! );
//! let pipeline = Pipeline::new(marketplace, client, PipelineOptions::new("linux-x64", "./vsix"));
//!
//! let summary = pipeline.run(&"ms-python.python".parse()?).await?;
//! for path in summary.installable_paths() {
//!     println!("{}", path.display());
//! }
//! # Ok(())
//! # }
//! ```

// Core functionality modules
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod fetcher;
pub mod marketplace;
pub mod pipeline;
pub mod resolver;

// Supporting modules
pub mod models;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
