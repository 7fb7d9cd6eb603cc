//! Core types shared by every vsix-fetch component.
//!
//! At the moment this is the error system:
//! - [`VsixError`] - strongly-typed failure modes, each naming the extension
//!   or path it concerns
//! - [`ErrorContext`] - user-facing wrapper with details and a suggestion
//! - [`user_friendly_error`] - converts any `anyhow::Error` for CLI display

pub mod error;

pub use error::{ErrorContext, VsixError, user_friendly_error};
