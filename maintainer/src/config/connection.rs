// File: maintainer/src/config/connection.rs
use super::EnvSource;
use crate::constants::env_keys;
use crate::errors::ConfigError;
use std::fmt;

/// Validated PostgreSQL connection parameters
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: String,
    pub db: String,
    pub replica: Option<ReplicaInfo>,
}

/// Optional read replica, enabled by `POSTGRES_REPLICA=true`
#[derive(Clone, PartialEq, Eq)]
pub struct ReplicaInfo {
    pub host: Option<String>,
    pub port: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub db: Option<String>,
}

impl ConnectionInfo {
    /// Read the connection settings, reporting every missing key at once.
    pub fn from_env(env: &dyn EnvSource) -> Result<Self, ConfigError> {
        let required = [
            env_keys::POSTGRES_USER,
            env_keys::POSTGRES_PASSWORD,
            env_keys::POSTGRES_DB,
            env_keys::POSTGRES_HOST,
            env_keys::POSTGRES_PORT,
        ];

        let missing: Vec<String> = required
            .iter()
            .filter(|key| env.get(key).is_none())
            .map(|key| key.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(ConfigError::MissingEnv { keys: missing });
        }

        let value = |key: &str| env.get(key).unwrap_or_default();

        let replica_enabled = env
            .get(env_keys::POSTGRES_REPLICA)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let replica = replica_enabled.then(|| ReplicaInfo {
            host: env.get(env_keys::POSTGRES_REPLICA_HOST),
            port: env.get(env_keys::POSTGRES_REPLICA_PORT),
            user: env.get(env_keys::POSTGRES_REPLICA_USER),
            password: env.get(env_keys::POSTGRES_REPLICA_PASSWORD),
            db: env.get(env_keys::POSTGRES_REPLICA_DB),
        });

        Ok(Self {
            host: value(env_keys::POSTGRES_HOST),
            port: value(env_keys::POSTGRES_PORT),
            user: value(env_keys::POSTGRES_USER),
            password: value(env_keys::POSTGRES_PASSWORD),
            db: value(env_keys::POSTGRES_DB),
            replica,
        })
    }

    /// `host:port` for log lines
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Replica `host:port`, unset parts taken from the primary
    pub fn replica_address(&self) -> Option<String> {
        self.replica.as_ref().map(|replica| {
            format!(
                "{}:{}",
                replica.host.as_deref().unwrap_or(&self.host),
                replica.port.as_deref().unwrap_or(&self.port)
            )
        })
    }
}

// Keep passwords out of logs
impl fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("db", &self.db)
            .field("replica", &self.replica)
            .finish()
    }
}

impl fmt::Debug for ReplicaInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicaInfo")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("db", &self.db)
            .finish()
    }
}
