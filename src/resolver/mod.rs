//! Dependency resolution for marketplace extensions.
//!
//! Resolution runs in three steps:
//!
//! 1. **Locate** ([`Locator`]): pick the newest version built for the target
//!    platform, its package URL and its declared `extensionDependencies`.
//! 2. **Build** ([`GraphBuilder`]): locate the root, then every dependency
//!    transitively, wave by wave with bounded concurrency. Each distinct
//!    `publisher.id` is looked up once; the result is a [`DependencyGraph`]
//!    arena in which shared and circular dependencies are plain edges.
//! 3. **Sequence** ([`sequence`]): flatten the graph into a dependency-first
//!    order ending with the root, which is the order packages are fetched and
//!    installed in.
//!
//! # Failure handling
//!
//! | Situation                         | Effect                                  |
//! |-----------------------------------|-----------------------------------------|
//! | Root cannot be located            | [`GraphBuilder::build`] returns `Err`   |
//! | Dependency cannot be located      | Recorded in [`ResolutionReport::failures`], subtree skipped |
//! | Manifest unavailable              | Warning, extension treated as leaf      |
//! | Malformed dependency declaration  | Warning, entry skipped                  |

pub mod builder;
pub mod dependency_graph;
pub mod locator;
pub mod sequence;

pub use builder::{GraphBuilder, Resolution, ResolutionFailure, ResolutionReport};
pub use dependency_graph::DependencyGraph;
pub use locator::{LocatedArtifact, Locator};
pub use sequence::{sequence, single};
