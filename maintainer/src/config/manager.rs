// File: maintainer/src/config/manager.rs
use super::Config;
use crate::errors::ConfigError;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};

pub struct ConfigManager {
    current_config: Arc<Config>,
}

impl ConfigManager {
    /// Load `path`, falling back to built-in defaults when the file is absent.
    pub async fn new(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load_configuration(path).await?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    pub fn get_current_config(&self) -> Arc<Config> {
        self.current_config.clone()
    }

    async fn load_configuration(path: &Path) -> Result<Config, ConfigError> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            warn!(
                "Config file not found at {}, using built-in defaults",
                path.display()
            );
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::LoadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        if !(0.0..=100.0).contains(&config.disk_usage_threshold_percent) {
            return Err(ConfigError::InvalidValue {
                field: "disk_usage_threshold_percent".to_string(),
                reason: format!("{} is outside 0-100", config.disk_usage_threshold_percent),
            });
        }

        if config.poll_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_seconds".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if config.logging.max_files == 0 {
            return Err(ConfigError::InvalidValue {
                field: "logging.max_files".to_string(),
                reason: "must keep at least one file".to_string(),
            });
        }

        info!(
            "Loaded config from {} (backup root: {}, poll interval: {}s)",
            path.display(),
            config.backup_root.display(),
            config.poll_interval_seconds
        );

        Ok(config)
    }
}
