//! File system helpers for the download directory.
//!
//! Packages are written next to their final location under a `.tmp` name and
//! renamed once complete, so a file with the final name is always a whole
//! package.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::constants::TEMP_SUFFIX;
use crate::core::VsixError;

/// Keeps only characters that are safe in a single path component:
/// alphanumerics, `-`, `_` and `.`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars().filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.')).collect()
}

/// Ensures that a directory exists, creating it and its parents if needed.
///
/// # Errors
///
/// [`VsixError::FileSystemError`] when the directory cannot be created or the
/// path exists but is not a directory.
pub async fn ensure_dir(path: &Path) -> Result<(), VsixError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(VsixError::FileSystemError {
            operation: "create directory".to_string(),
            path: path.display().to_string(),
            reason: "path exists but is not a directory".to_string(),
        }),
        Err(_) => tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| VsixError::file_system("create directory", path, &e)),
    }
}

/// The temporary sibling a download is written to: `<final name>.tmp`.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut name = final_path.as_os_str().to_os_string();
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

/// Removes a file, treating "not found" as success.
pub async fn remove_if_exists(path: &Path) -> Result<(), VsixError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(VsixError::file_system("remove file", path, &e)),
    }
}

/// Whether a regular file exists at `path`.
pub async fn file_exists(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok_and(|meta| meta.is_file())
}
