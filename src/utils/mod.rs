//! Cross-platform utilities and helpers
//!
//! - [`fs`] - Download directory handling and temp-file helpers
//! - [`platform`] - Target platform detection and executable lookup
//! - [`progress`] - Download progress bars

pub mod fs;
pub mod platform;
pub mod progress;

pub use fs::{ensure_dir, remove_if_exists, sanitize_file_name, temp_path};
pub use platform::{detect_target_platform, find_executable, get_home_dir};
pub use progress::ProgressBar;
