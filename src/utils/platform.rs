//! Platform helpers: marketplace target platform, home directory and
//! executable lookup.

use std::path::PathBuf;

use crate::core::VsixError;

/// Platform tag used when the host OS is none of the known ones.
pub const FALLBACK_PLATFORM: &str = "web";

/// Marketplace target platform of the running host.
///
/// ```rust
/// let platform = vsix_fetch::utils::platform::detect_target_platform();
/// assert!(!platform.is_empty());
/// ```
pub fn detect_target_platform() -> &'static str {
    platform_tag(std::env::consts::OS, std::env::consts::ARCH)
}

/// Maps a Rust `(OS, ARCH)` pair to a marketplace target platform tag.
///
/// | OS        | x86_64       | aarch64        | arm          |
/// |-----------|--------------|----------------|--------------|
/// | `macos`   | `darwin-x64` | `darwin-arm64` |              |
/// | `windows` | `win32-x64`  | `win32-arm64`  |              |
/// | `linux`   | `linux-x64`  | `linux-arm64`  | `linux-armhf`|
///
/// Other architectures on a known OS map to that OS's x64 tag; an unknown OS
/// maps to [`FALLBACK_PLATFORM`].
pub fn platform_tag(os: &str, arch: &str) -> &'static str {
    match (os, arch) {
        ("macos", "aarch64") => "darwin-arm64",
        ("macos", _) => "darwin-x64",
        ("windows", "aarch64") => "win32-arm64",
        ("windows", _) => "win32-x64",
        ("linux", "aarch64") => "linux-arm64",
        ("linux", "arm") => "linux-armhf",
        ("linux", _) => "linux-x64",
        _ => FALLBACK_PLATFORM,
    }
}

/// Home directory of the current user.
pub fn get_home_dir() -> Result<PathBuf, VsixError> {
    dirs::home_dir().ok_or_else(|| {
        let platform_help = if cfg!(windows) {
            "On Windows: Check that the USERPROFILE environment variable is set"
        } else {
            "On Unix/Linux: Check that the HOME environment variable is set"
        };
        VsixError::ConfigError {
            message: format!("Could not determine home directory. {platform_help}"),
        }
    })
}

/// Locate an executable on `PATH` (or validate an explicit path).
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}
