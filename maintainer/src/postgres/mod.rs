//! PostgreSQL maintenance operations backed by the stock client tools.
//!
//! Every operation shells out (`psql`, `pg_dumpall`, `gzip`, `pg_repack`)
//! with the password passed through `PGPASSWORD`. The scheduler only sees
//! the [`DatabaseOperations`] trait.

pub mod commands;
pub mod retention;

use crate::config::ConnectionInfo;
use crate::constants::{retention as keep, timeouts};
use crate::errors::OperationError;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Local;
use commands::{connection_args, run_pg_command};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;
use tracing::{error, info, instrument, warn};

/// Retention tier for automatic backups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackupType {
    Daily,
    Weekly,
    Monthly,
}

impl BackupType {
    pub fn as_str(self) -> &'static str {
        match self {
            BackupType::Daily => "daily",
            BackupType::Weekly => "weekly",
            BackupType::Monthly => "monthly",
        }
    }

    /// Generations kept in this tier's directory
    pub fn retention(self) -> usize {
        match self {
            BackupType::Daily => keep::DAILY,
            BackupType::Weekly => keep::WEEKLY,
            BackupType::Monthly => keep::MONTHLY,
        }
    }
}

impl FromStr for BackupType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            // Older deployments spelled the daily tier "diary" or "dairy"
            "daily" | "diary" | "dairy" => Ok(BackupType::Daily),
            "weekly" => Ok(BackupType::Weekly),
            "monthly" => Ok(BackupType::Monthly),
            other => Err(anyhow!(
                "Invalid backup type: {}. Must be one of: daily, weekly, monthly",
                other
            )),
        }
    }
}

impl fmt::Display for BackupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finished compressed dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArtifact {
    pub path: PathBuf,
    pub compressed_size: u64,
}

/// Operations the task runners delegate to
#[async_trait]
pub trait DatabaseOperations: Send + Sync {
    /// Dump every database into the tier's directory and apply retention.
    async fn run_backup(
        &self,
        connection: &ConnectionInfo,
        backup_type: BackupType,
    ) -> Result<BackupArtifact>;

    /// Ad-hoc dump outside the retention tiers.
    async fn run_manual_backup(&self, connection: &ConnectionInfo) -> Result<BackupArtifact>;

    async fn run_repack(&self, connection: &ConnectionInfo) -> Result<()>;

    /// Rebuild every PGroonga index.
    async fn run_reindex(&self, connection: &ConnectionInfo) -> Result<()>;

    async fn check_connection(&self, connection: &ConnectionInfo) -> Result<()>;
}

/// [`DatabaseOperations`] implemented with the PostgreSQL command-line tools
#[derive(Debug, Clone)]
pub struct PostgresOperations {
    backup_root: PathBuf,
}

impl PostgresOperations {
    pub fn new(backup_root: PathBuf) -> Self {
        Self { backup_root }
    }

    pub fn auto_backup_dir(&self, backup_type: BackupType) -> PathBuf {
        self.backup_root.join("auto").join(backup_type.as_str())
    }

    pub fn manual_backup_dir(&self) -> PathBuf {
        self.backup_root.join("manual")
    }

    fn psql_args(connection: &ConnectionInfo) -> Vec<String> {
        let mut args = connection_args(connection);
        args.push(format!("--dbname={}", connection.db));
        args.push("--no-password".to_string());
        args
    }

    /// `pg_dumpall` into `<dir>/<stem>.sql`, then gzip it in place.
    async fn dump_and_compress(
        &self,
        connection: &ConnectionInfo,
        dir: &Path,
        stem: &str,
    ) -> Result<BackupArtifact> {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| OperationError::Io {
                context: format!("Failed to create backup directory {}", dir.display()),
                reason: e.to_string(),
            })?;

        let sql_file = dir.join(format!("{}.sql", stem));
        let gz_file = dir.join(format!("{}.sql.gz", stem));

        info!("Starting PostgreSQL backup to {}", sql_file.display());

        let mut args = connection_args(connection);
        args.push("--clean".to_string());
        args.push("--if-exists".to_string());
        args.push(format!("--file={}", sql_file.display()));

        if let Err(e) = run_pg_command(
            "pg_dumpall",
            &args,
            Some(&connection.password),
            timeouts::BACKUP_DUMP,
        )
        .await
        {
            remove_partial(&sql_file).await;
            return Err(e);
        }

        info!("Database dump completed successfully. Compressing the file...");

        let gzip_args = vec!["--force".to_string(), sql_file.display().to_string()];
        if let Err(e) = run_pg_command("gzip", &gzip_args, None, timeouts::BACKUP_COMPRESS).await {
            remove_partial(&sql_file).await;
            remove_partial(&gz_file).await;
            return Err(e);
        }

        let compressed_size = fs::metadata(&gz_file)
            .await
            .map_err(|e| OperationError::Io {
                context: format!("Compressed backup missing at {}", gz_file.display()),
                reason: e.to_string(),
            })?
            .len();

        info!("Compression complete. Backup saved to: {}", gz_file.display());

        Ok(BackupArtifact {
            path: gz_file,
            compressed_size,
        })
    }

    async fn pgroonga_indexes(&self, connection: &ConnectionInfo) -> Result<Vec<String>> {
        let mut args = Self::psql_args(connection);
        args.extend([
            "--tuples-only".to_string(),
            "--no-align".to_string(),
            "--command".to_string(),
            "SELECT format('%I.%I', schemaname, indexname) FROM pg_indexes \
             WHERE indexdef ILIKE '%USING pgroonga%' ORDER BY 1"
                .to_string(),
        ]);

        let output = run_pg_command(
            "psql",
            &args,
            Some(&connection.password),
            timeouts::PSQL_QUERY,
        )
        .await?;

        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

#[async_trait]
impl DatabaseOperations for PostgresOperations {
    #[instrument(skip(self, connection), fields(host = %connection.address()))]
    async fn run_backup(
        &self,
        connection: &ConnectionInfo,
        backup_type: BackupType,
    ) -> Result<BackupArtifact> {
        let dir = self.auto_backup_dir(backup_type);
        let stem = format!(
            "pg_dump_{}_{}",
            backup_type,
            Local::now().format("%Y%m%d_%H%M%S")
        );

        let artifact = self.dump_and_compress(connection, &dir, &stem).await?;

        // Retention problems are logged, the backup itself succeeded
        if let Err(e) = retention::prune_backups(&dir, backup_type.retention()) {
            warn!("Failed to apply {} retention in {}: {}", backup_type, dir.display(), e);
        }

        Ok(artifact)
    }

    #[instrument(skip(self, connection), fields(host = %connection.address()))]
    async fn run_manual_backup(&self, connection: &ConnectionInfo) -> Result<BackupArtifact> {
        let dir = self.manual_backup_dir();
        let stem = format!("pg_dump_{}", Local::now().format("%Y%m%d"));
        self.dump_and_compress(connection, &dir, &stem).await
    }

    #[instrument(skip(self, connection), fields(host = %connection.address()))]
    async fn run_repack(&self, connection: &ConnectionInfo) -> Result<()> {
        info!(
            "Starting pg_repack for all tables in database: {}",
            connection.db
        );

        let mut args = connection_args(connection);
        args.push(format!("--dbname={}", connection.db));
        args.push("--jobs=2".to_string());
        args.push("--wait-timeout=30000".to_string());
        args.push("-a".to_string());

        run_pg_command(
            "pg_repack",
            &args,
            Some(&connection.password),
            timeouts::REPACK,
        )
        .await?;

        info!("pg_repack completed successfully");
        Ok(())
    }

    #[instrument(skip(self, connection), fields(host = %connection.address()))]
    async fn run_reindex(&self, connection: &ConnectionInfo) -> Result<()> {
        let indexes = self.pgroonga_indexes(connection).await?;
        if indexes.is_empty() {
            info!("No PGroonga indexes found in {}", connection.db);
            return Ok(());
        }

        info!("Rebuilding {} PGroonga index(es)", indexes.len());

        let mut failed = Vec::new();
        for index in &indexes {
            let mut args = Self::psql_args(connection);
            args.extend([
                "--set=ON_ERROR_STOP=1".to_string(),
                "--command".to_string(),
                format!("REINDEX INDEX CONCURRENTLY {}", index),
            ]);

            match run_pg_command(
                "psql",
                &args,
                Some(&connection.password),
                timeouts::REINDEX_PER_INDEX,
            )
            .await
            {
                Ok(_) => info!("Rebuilt index {}", index),
                Err(e) => {
                    error!("Failed to rebuild index {}: {}", index, e);
                    failed.push(index.clone());
                }
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(anyhow!(
                "{} of {} PGroonga index(es) failed to rebuild: {}",
                failed.len(),
                indexes.len(),
                failed.join(", ")
            ))
        }
    }

    async fn check_connection(&self, connection: &ConnectionInfo) -> Result<()> {
        let mut args = Self::psql_args(connection);
        args.extend(["--command".to_string(), "SELECT 1".to_string()]);

        run_pg_command(
            "psql",
            &args,
            Some(&connection.password),
            timeouts::PSQL_QUERY,
        )
        .await?;

        info!(
            "Successfully connected to PostgreSQL at {}",
            connection.address()
        );
        Ok(())
    }
}

async fn remove_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove partial backup {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_type_retention_table() {
        assert_eq!(BackupType::Daily.retention(), 7);
        assert_eq!(BackupType::Weekly.retention(), 5);
        assert_eq!(BackupType::Monthly.retention(), 12);
    }

    #[test]
    fn test_legacy_daily_spellings_parse_to_daily() {
        for raw in ["daily", "diary", "dairy"] {
            assert_eq!(raw.parse::<BackupType>().unwrap(), BackupType::Daily);
        }
        assert_eq!(BackupType::Daily.to_string(), "daily");
        assert!("hourly".parse::<BackupType>().is_err());
    }

    #[test]
    fn test_backup_directories() {
        let ops = PostgresOperations::new(PathBuf::from("/backup/postgres"));
        assert_eq!(
            ops.auto_backup_dir(BackupType::Weekly),
            PathBuf::from("/backup/postgres/auto/weekly")
        );
        assert_eq!(ops.manual_backup_dir(), PathBuf::from("/backup/postgres/manual"));
    }
}
