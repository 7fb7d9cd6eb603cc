//! Global constants used throughout the vsix-fetch codebase.
//!
//! These are the defaults behind [`crate::config::Config`]. Components never
//! read them directly at runtime; they receive their values through explicit
//! configuration so tests can substitute endpoints and bounds.

use std::time::Duration;

/// Public gallery endpoint used to look up extension metadata.
pub const DEFAULT_MARKETPLACE_URL: &str =
    "https://marketplace.visualstudio.com/_apis/public/gallery/extensionquery";

/// Gallery API version sent in the `Accept` header.
pub const DEFAULT_API_VERSION: &str = "7.0-preview.1";

/// Asset type of the installable `.vsix` package.
pub const VSIX_PACKAGE_ASSET: &str = "Microsoft.VisualStudio.Services.VSIXPackage";

/// Asset type of the `package.json` manifest.
pub const MANIFEST_ASSET: &str = "Microsoft.VisualStudio.Code.Manifest";

/// Filter type selecting an extension by its `publisher.id` name.
pub const FILTER_TYPE_EXTENSION_NAME: u32 = 7;

/// Query flags requesting versions, files, asset URIs and version properties.
pub const QUERY_FLAGS: u32 = 2151;

/// Page size requested from the gallery.
pub const QUERY_PAGE_SIZE: u32 = 100;

/// Download attempts per artifact before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Fixed delay between download attempts (1 second).
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Request timeout (5 minutes): the whole deadline of a marketplace lookup,
/// and the connect/stall limit of a download.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Maximum number of concurrent marketplace lookups during resolution.
pub const DEFAULT_MAX_PARALLEL: usize = 4;

/// Executable used for the optional install step.
pub const DEFAULT_CODE_EXECUTABLE: &str = "code";

/// Extension of downloaded packages.
pub const VSIX_EXTENSION: &str = "vsix";

/// Suffix appended to in-flight downloads.
pub const TEMP_SUFFIX: &str = ".tmp";

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("vsix-fetch/", env!("CARGO_PKG_VERSION"));

/// Environment variable that hides all progress bars when set.
pub const NO_PROGRESS_ENV: &str = "VSIX_FETCH_NO_PROGRESS";

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV: &str = "VSIX_FETCH_CONFIG";

/// Directory under the home directory holding the configuration file.
pub const CONFIG_DIR: &str = ".vsix-fetch";

/// Name of the configuration file.
pub const CONFIG_FILE: &str = "config.toml";
