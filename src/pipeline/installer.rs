//! Handing downloaded packages to an editor for installation.

use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use crate::core::VsixError;
use crate::utils::platform::find_executable;

/// Installs packages in the order given.
pub trait Installer: Send + Sync {
    /// Install every package in `paths`, in order, stopping at the first
    /// failure. Returns the number of packages installed.
    fn install(&self, paths: &[PathBuf]) -> impl Future<Output = Result<usize, VsixError>> + Send;
}

/// Installs through an editor CLI: `<executable> --install-extension <path>`.
#[derive(Debug, Clone)]
pub struct CodeCliInstaller {
    executable: PathBuf,
}

impl CodeCliInstaller {
    /// Use `executable` as-is.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Find `name` on `PATH` (or validate an explicit path).
    ///
    /// # Errors
    ///
    /// [`VsixError::InstallFailed`] when no such executable exists.
    pub fn locate(name: &str) -> Result<Self, VsixError> {
        find_executable(name).map(Self::new).ok_or_else(|| VsixError::InstallFailed {
            path: name.to_string(),
            reason: format!("executable '{name}' not found on PATH"),
        })
    }

    /// Executable being invoked.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    async fn install_one(&self, path: &Path) -> Result<(), VsixError> {
        let failed = |reason: String| VsixError::InstallFailed {
            path: path.display().to_string(),
            reason,
        };

        debug!("Running {} --install-extension {}", self.executable.display(), path.display());
        let output = Command::new(&self.executable)
            .arg("--install-extension")
            .arg(path)
            .output()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = match stderr.trim() {
            "" => format!("exited with {}", output.status),
            message => message.to_string(),
        };
        Err(failed(reason))
    }
}

impl Installer for CodeCliInstaller {
    async fn install(&self, paths: &[PathBuf]) -> Result<usize, VsixError> {
        for (installed, path) in paths.iter().enumerate() {
            self.install_one(path)
                .await
                .inspect_err(|_| debug!("Installed {} package(s) before failing", installed))?;
            info!("Installed {}", path.display());
        }
        Ok(paths.len())
    }
}
