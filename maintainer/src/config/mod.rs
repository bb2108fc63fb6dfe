// File: maintainer/src/config/mod.rs
pub mod connection;
pub mod env;
pub mod manager;

use crate::constants::defaults;
use crate::errors::ConfigError;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use connection::{ConnectionInfo, ReplicaInfo};
pub use env::{
    default_dotenv_candidates, DotenvEnv, EnableFlag, EnvSource, MapEnv, TaskSettings,
};
pub use manager::ConfigManager;

/// Static agent configuration read from `config/main.toml`.
///
/// Everything operators toggle day to day (enable flags, frequencies,
/// credentials) lives in the environment instead and is read per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_backup_root")]
    pub backup_root: PathBuf,
    #[serde(default = "default_disk_usage_path")]
    pub disk_usage_path: PathBuf,
    #[serde(default = "default_disk_usage_threshold")]
    pub disk_usage_threshold_percent: f64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_notification_timeout")]
    pub notification_timeout_seconds: u64,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Wall-clock trigger times, `HH:MM` in local time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub announcement: String,
    pub repack: String,
    pub daily_backup: String,
    pub reindex: String,
    pub weekly_backup: String,
    pub monthly_backup: String,
    pub daily_report: String,
}

/// Rolling log file written next to the console output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file_enabled: bool,
    pub directory: PathBuf,
    pub file_prefix: String,
    /// Rotated files kept on disk, the active one included
    pub max_files: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backup_root: default_backup_root(),
            disk_usage_path: default_disk_usage_path(),
            disk_usage_threshold_percent: default_disk_usage_threshold(),
            poll_interval_seconds: default_poll_interval(),
            notification_timeout_seconds: default_notification_timeout(),
            schedule: ScheduleConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            announcement: defaults::ANNOUNCEMENT_TIME.to_string(),
            repack: defaults::REPACK_TIME.to_string(),
            daily_backup: defaults::DAILY_BACKUP_TIME.to_string(),
            reindex: defaults::REINDEX_TIME.to_string(),
            weekly_backup: defaults::WEEKLY_BACKUP_TIME.to_string(),
            monthly_backup: defaults::MONTHLY_BACKUP_TIME.to_string(),
            daily_report: defaults::DAILY_REPORT_TIME.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file_enabled: true,
            directory: PathBuf::from(defaults::LOG_DIRECTORY),
            file_prefix: defaults::LOG_FILE_PREFIX.to_string(),
            max_files: defaults::LOG_MAX_FILES,
        }
    }
}

/// Parse a `HH:MM` trigger time, naming the offending field on failure
pub fn parse_trigger_time(field: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|e| ConfigError::InvalidValue {
        field: format!("schedule.{}", field),
        reason: format!("'{}' is not a HH:MM time ({})", value, e),
    })
}

fn default_backup_root() -> PathBuf {
    PathBuf::from(defaults::BACKUP_ROOT)
}

fn default_disk_usage_path() -> PathBuf {
    PathBuf::from(defaults::DISK_USAGE_PATH)
}

fn default_disk_usage_threshold() -> f64 {
    defaults::DISK_USAGE_THRESHOLD_PERCENT
}

fn default_poll_interval() -> u64 {
    defaults::POLL_INTERVAL_SECONDS
}

fn default_notification_timeout() -> u64 {
    defaults::NOTIFICATION_TIMEOUT_SECONDS
}
