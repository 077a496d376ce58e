//! Configuration service implementation.
//!
//! This module provides a ConfigService that loads the orchestrator
//! configuration from the configuration file (~/.config/vitalis/config.toml).

use crate::paths::VitalisPaths;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use vitalis_core::config::OrchestratorConfig;
use vitalis_core::error::{CoreError, Result};

/// Configuration service that loads and caches the orchestrator configuration.
///
/// Missing keys fall back to their defaults, and a missing file means the
/// default configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<OrchestratorConfig>>>,
    /// Explicit file location. `None` resolves through `VitalisPaths`.
    path: Option<PathBuf>,
}

impl ConfigService {
    /// Creates a ConfigService reading the platform config file.
    ///
    /// The file is read lazily on first access.
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(None)),
            path: None,
        }
    }

    /// Creates a ConfigService reading `path` instead of the platform file.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config: Arc::new(RwLock::new(None)),
            path: Some(path.into()),
        }
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// A file that cannot be read or does not validate is logged and the
    /// defaults are used instead.
    pub fn get_config(&self) -> OrchestratorConfig {
        {
            let read_lock = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = match self.load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("[ConfigService] Using default configuration: {}", e);
                OrchestratorConfig::default()
            }
        };

        {
            let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
            *write_lock = Some(loaded.clone());
        }

        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = None;
    }

    /// Reads and validates the configuration file, bypassing the cache.
    ///
    /// # Errors
    ///
    /// - `Serialization` if the file is not valid TOML for the config shape
    /// - `Config` if a value is out of range or the path cannot be resolved
    pub fn load(&self) -> Result<OrchestratorConfig> {
        let path = self.config_path()?;
        if !path.exists() {
            tracing::debug!(
                "[ConfigService] {} not found, using defaults",
                path.display()
            );
            return Ok(OrchestratorConfig::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: OrchestratorConfig = toml::from_str(&content)?;
        config.validate()?;

        tracing::debug!("[ConfigService] Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Writes `config` to the configuration file and refreshes the cache.
    pub fn save(&self, config: &OrchestratorConfig) -> Result<()> {
        config.validate()?;
        let path = self.config_path()?;

        let content = toml::to_string_pretty(config).map_err(|e| CoreError::Serialization {
            format: "TOML".to_string(),
            message: e.to_string(),
        })?;
        VitalisPaths::ensure_parent(&path).map_err(|e| CoreError::config(format!("{:#}", e)))?;
        std::fs::write(&path, content)?;

        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = Some(config.clone());
        Ok(())
    }

    /// Location of the configuration file.
    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => VitalisPaths::config_file().map_err(|e| CoreError::config(e.to_string())),
        }
    }

    /// Location override, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}
