// File: maintainer/src/config/env.rs
//! Environment-backed settings.
//!
//! Flags and frequencies are read through [`EnvSource`] on every task
//! invocation so that edits to the environment apply on the next trigger
//! without a restart.

use crate::constants::defaults;
use crate::scheduler::{FrequencyMode, MaintenanceTask};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{info, warn};

/// Key-value lookup over the process environment (or a stand-in)
pub trait EnvSource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Process environment layered over a `.env` file.
///
/// Variables set in the process environment win. Everything else is looked
/// up in the `.env` file, which is re-read on every lookup so that edits
/// apply without a restart.
#[derive(Debug, Clone, Default)]
pub struct DotenvEnv {
    path: Option<PathBuf>,
}

impl DotenvEnv {
    /// Use the first existing file among `candidates`.
    pub fn discover(candidates: &[PathBuf]) -> Self {
        match candidates.iter().find(|path| path.is_file()) {
            Some(path) => {
                info!("Found .env file at: {}", path.display());
                Self::at(path.clone())
            }
            None => {
                warn!(
                    "Could not find .env file. Searched in: {}",
                    candidates
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                Self::default()
            }
        }
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn file_value(&self, key: &str) -> Option<String> {
        let path = self.path.as_ref()?;
        let entries = match dotenvy::from_path_iter(path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read .env file {}: {}", path.display(), e);
                return None;
            }
        };

        for entry in entries {
            match entry {
                Ok((name, value)) if name == key => return Some(value),
                Ok(_) => {}
                Err(e) => {
                    warn!("Failed to parse .env file {}: {}", path.display(), e);
                    return None;
                }
            }
        }
        None
    }
}

impl EnvSource for DotenvEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().or_else(|| self.file_value(key))
    }
}

/// In-memory environment, mutable through a shared reference
#[derive(Debug, Default)]
pub struct MapEnv {
    vars: RwLock<HashMap<String, String>>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&self, key: &str, value: &str) {
        if let Ok(mut vars) = self.vars.write() {
            vars.insert(key.to_string(), value.to_string());
        }
    }

    pub fn remove(&self, key: &str) {
        if let Ok(mut vars) = self.vars.write() {
            vars.remove(key);
        }
    }
}

impl EnvSource for MapEnv {
    fn get(&self, key: &str) -> Option<String> {
        self.vars.read().ok().and_then(|vars| vars.get(key).cloned())
    }
}

/// Tri-state enable flag decoded from the raw environment string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnableFlag {
    /// The variable is absent: a misconfiguration
    Unset,
    /// Present but not exactly `True`
    Disabled,
    Enabled,
}

impl EnableFlag {
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            None => EnableFlag::Unset,
            Some("True") => EnableFlag::Enabled,
            Some(_) => EnableFlag::Disabled,
        }
    }

    pub fn read(env: &dyn EnvSource, key: &str) -> Self {
        Self::from_raw(env.get(key).as_deref())
    }
}

/// Per-invocation view of a task's configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSettings {
    pub enabled: EnableFlag,
    pub frequency: FrequencyMode,
}

impl TaskSettings {
    pub fn load(env: &dyn EnvSource, task: MaintenanceTask) -> Self {
        Self {
            enabled: EnableFlag::read(env, task.enable_key()),
            frequency: FrequencyMode::from_raw(env.get(task.frequency_key()).as_deref()),
        }
    }
}

/// The default `.env` search list
pub fn default_dotenv_candidates() -> Vec<PathBuf> {
    defaults::DOTENV_CANDIDATES
        .iter()
        .map(|p| Path::new(p).to_path_buf())
        .collect()
}
