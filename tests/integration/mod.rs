//! Integration test suite for vsix-fetch
//!
//! Every test runs against a local `wiremock` server standing in for the
//! marketplace gallery, its manifests and its package CDN.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! - **pipeline**: library-level runs (ordering, deduplication, failures)
//! - **cli**: the `vsix-fetch` binary, its flags and exit status

mod cli;
mod common;
mod pipeline;
