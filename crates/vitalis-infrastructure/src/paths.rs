//! Path resolution for Vitalis configuration files.
//!
//! Paths follow the platform conventions reported by `dirs` (XDG on Linux,
//! `~/Library/Application Support` on macOS, `%APPDATA%` on Windows).

use anyhow::Context;
use std::path::PathBuf;

/// Application directory name under the platform config directory.
const APP_DIR: &str = "vitalis";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Path management for Vitalis.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/vitalis/      # Config directory
/// ├── config.toml         # Orchestrator configuration
/// └── logs/               # Application logs
/// ```
pub struct VitalisPaths;

impl VitalisPaths {
    /// Returns the Vitalis configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/vitalis/`)
    /// - `Err(PathError::ConfigDirNotFound)`: Could not determine directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Creates the parent directory of `file` if it does not exist.
    pub fn ensure_parent(file: &std::path::Path) -> anyhow::Result<()> {
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        Ok(())
    }
}
