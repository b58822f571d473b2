//! Configuration management for drivepick

pub mod schema;

pub use schema::{Config, ProviderKind};

use crate::error::{DrivepickError, DrivepickResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("drivepick")
            .join("config.toml")
    }

    /// Get the state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("drivepick")
    }

    /// Folder cache document path
    pub fn cache_file_path(config: &Config) -> PathBuf {
        config
            .cache
            .file
            .clone()
            .unwrap_or_else(|| Self::state_dir().join("cache.json"))
    }

    /// Directory holding downloaded picks
    pub fn download_dir(config: &Config) -> PathBuf {
        config
            .download
            .dir
            .clone()
            .unwrap_or_else(|| Self::state_dir().join("downloads"))
    }

    /// Pick history path
    pub fn history_path() -> PathBuf {
        Self::state_dir().join("history.log")
    }

    /// Load configuration, creating default if not exists
    pub async fn load(&self) -> DrivepickResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load and validate configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> DrivepickResult<Config> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            DrivepickError::io(format!("reading config from {}", path.display()), e)
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| DrivepickError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config
            .validate()
            .map_err(|reason| DrivepickError::ConfigInvalid {
                path: path.to_path_buf(),
                reason,
            })?;

        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> DrivepickResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            DrivepickError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> DrivepickResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DrivepickError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Ensure the state, cache and download directories exist
    pub async fn ensure_state_dirs(config: &Config) -> DrivepickResult<()> {
        let mut dirs = vec![Self::state_dir(), Self::download_dir(config)];
        if let Some(parent) = Self::cache_file_path(config).parent() {
            dirs.push(parent.to_path_buf());
        }

        for dir in dirs.iter().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await.map_err(|e| {
                DrivepickError::io(format!("creating directory {}", dir.display()), e)
            })?;
        }

        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
