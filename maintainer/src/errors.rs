//! Custom error types for the maintenance agent
//!
//! `MaintenanceError` covers startup failures. External process and
//! notification failures have their own types and travel through
//! `anyhow` or are logged where they occur.

use std::fmt;
use std::time::Duration;

/// Main error type for the maintenance agent
#[derive(Debug)]
pub enum MaintenanceError {
    /// Configuration-related errors
    Config(ConfigError),
}

/// Configuration error variants
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to load configuration file
    LoadFailed { path: String, reason: String },

    /// Invalid configuration value
    InvalidValue { field: String, reason: String },

    /// One or more required environment variables are absent
    MissingEnv { keys: Vec<String> },
}

/// External process error variants
#[derive(Debug)]
pub enum OperationError {
    /// The program could not be started at all
    SpawnFailed { program: String, reason: String },

    /// The program exited with a non-zero status
    CommandFailed {
        program: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The program ran past its ceiling and was killed
    Timeout { program: String, limit: Duration },

    /// Filesystem work around the command failed
    Io { context: String, reason: String },
}

/// Notification error variants
#[derive(Debug)]
pub enum NotificationError {
    /// The notes API answered with a non-success status
    Rejected { status: u16, body: String },

    /// The request never completed
    Transport { reason: String },
}

impl fmt::Display for MaintenanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaintenanceError::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::LoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path, reason)
            }
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
            ConfigError::MissingEnv { keys } => {
                write!(
                    f,
                    "Missing required environment variables: {}",
                    keys.join(", ")
                )
            }
        }
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationError::SpawnFailed { program, reason } => {
                write!(f, "Failed to start {}: {}", program, reason)
            }
            OperationError::CommandFailed {
                program,
                exit_code,
                stderr,
            } => match exit_code {
                Some(code) => write!(f, "{} failed (exit code {}): {}", program, code, stderr),
                None => write!(f, "{} terminated by signal: {}", program, stderr),
            },
            OperationError::Timeout { program, limit } => {
                write!(f, "{} timed out after {}s", program, limit.as_secs())
            }
            OperationError::Io { context, reason } => {
                write!(f, "{}: {}", context, reason)
            }
        }
    }
}

impl fmt::Display for NotificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationError::Rejected { status, body } => {
                write!(f, "Notes API returned status {}: {}", status, body)
            }
            NotificationError::Transport { reason } => {
                write!(f, "Failed to reach notes API: {}", reason)
            }
        }
    }
}

impl std::error::Error for MaintenanceError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for OperationError {}
impl std::error::Error for NotificationError {}

impl From<ConfigError> for MaintenanceError {
    fn from(err: ConfigError) -> Self {
        MaintenanceError::Config(err)
    }
}
