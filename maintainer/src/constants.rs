//! Central repository for timeouts, thresholds, retention counts and
//! configuration keys used by the maintenance agent.

use std::time::Duration;

/// External process timeouts
pub mod timeouts {
    use super::Duration;

    /// Ceiling for a full `pg_dumpall` run
    pub const BACKUP_DUMP: Duration = Duration::from_secs(6 * 3600);

    /// Ceiling for compressing a dump with gzip
    pub const BACKUP_COMPRESS: Duration = Duration::from_secs(3 * 3600);

    /// Ceiling for `pg_repack` over all tables
    pub const REPACK: Duration = Duration::from_secs(6 * 3600);

    /// Ceiling for rebuilding a single PGroonga index
    pub const REINDEX_PER_INDEX: Duration = Duration::from_secs(30 * 60);

    /// Ceiling for metadata queries and the connection check
    pub const PSQL_QUERY: Duration = Duration::from_secs(60);
}

/// Backup retention (generations kept per backup type)
pub mod retention {
    pub const DAILY: usize = 7;
    pub const WEEKLY: usize = 5;
    pub const MONTHLY: usize = 12;

    /// Glob pattern matching compressed dumps inside a retention directory
    pub const BACKUP_FILE_PATTERN: &str = "*.sql.gz";
}

/// Default configuration values
pub mod defaults {
    pub const CONFIG_PATH: &str = "config/main.toml";
    pub const BACKUP_ROOT: &str = "/backup/postgres";
    pub const DISK_USAGE_PATH: &str = "/";
    pub const DISK_USAGE_THRESHOLD_PERCENT: f64 = 90.0;
    pub const POLL_INTERVAL_SECONDS: u64 = 60;
    pub const NOTIFICATION_TIMEOUT_SECONDS: u64 = 10;

    pub const ANNOUNCEMENT_TIME: &str = "01:50";
    pub const REPACK_TIME: &str = "02:00";
    pub const DAILY_BACKUP_TIME: &str = "03:00";
    pub const REINDEX_TIME: &str = "04:00";
    pub const WEEKLY_BACKUP_TIME: &str = "05:00";
    pub const MONTHLY_BACKUP_TIME: &str = "06:00";
    pub const DAILY_REPORT_TIME: &str = "08:00";

    pub const LOG_DIRECTORY: &str = "/scripts/logs";
    pub const LOG_FILE_PREFIX: &str = "maintainer";
    pub const LOG_MAX_FILES: usize = 3;

    /// Locations searched for a `.env` file, in order
    pub const DOTENV_CANDIDATES: &[&str] = &["/scripts/.env", "/home/web/mensis/.env", ".env"];
}

/// Environment variable names
pub mod env_keys {
    pub const PG_REPACK: &str = "PG_REPACK";
    pub const PG_REPACK_FREQUENCY: &str = "PG_REPACK_FREQUENCY";
    pub const PG_PGROONGA_REINDEX: &str = "PG_PGROONGA_REINDEX";
    pub const PG_PGROONGA_REINDEX_FREQUENCY: &str = "PG_PGROONGA_REINDEX_FREQUENCY";
    pub const PG_BACKUP_DAILY: &str = "PG_BACKUP_DAILY";
    pub const PG_BACKUP_DAILY_FREQUENCY: &str = "PG_BACKUP_DAILY_FREQUENCY";
    pub const PG_BACKUP_WEEKLY: &str = "PG_BACKUP_WEEKLY";
    pub const PG_BACKUP_WEEKLY_FREQUENCY: &str = "PG_BACKUP_WEEKLY_FREQUENCY";
    pub const PG_BACKUP_MONTHLY: &str = "PG_BACKUP_MONTHLY";
    pub const PG_BACKUP_MONTHLY_FREQUENCY: &str = "PG_BACKUP_MONTHLY_FREQUENCY";
    pub const MAINTENANCE_REPORT: &str = "MAINTENANCE_REPORT";
    pub const MAINTENANCE_ANNOUNCEMENT: &str = "MAINTENANCE_ANNOUNCEMENT";

    pub const POSTGRES_USER: &str = "POSTGRES_USER";
    pub const POSTGRES_PASSWORD: &str = "POSTGRES_PASSWORD";
    pub const POSTGRES_DB: &str = "POSTGRES_DB";
    pub const POSTGRES_HOST: &str = "POSTGRES_HOST";
    pub const POSTGRES_PORT: &str = "POSTGRES_PORT";
    pub const POSTGRES_REPLICA: &str = "POSTGRES_REPLICA";
    pub const POSTGRES_REPLICA_USER: &str = "POSTGRES_REPLICA_USER";
    pub const POSTGRES_REPLICA_PASSWORD: &str = "POSTGRES_REPLICA_PASSWORD";
    pub const POSTGRES_REPLICA_DB: &str = "POSTGRES_REPLICA_DB";
    pub const POSTGRES_REPLICA_HOST: &str = "POSTGRES_REPLICA_HOST";
    pub const POSTGRES_REPLICA_PORT: &str = "POSTGRES_REPLICA_PORT";

    pub const MISSKEY_HOST: &str = "MISSKEY_HOST";
    pub const MISSKEY_NOTICE_USER_TOKEN: &str = "MISSKEY_NOTICE_USER_TOKEN";
    pub const MISSKEY_TARGET_USER_ID: &str = "MISSKEY_TARGET_USER_ID";
    /// Misspelled key still present in deployed `.env` files
    pub const MISSKEY_TARGET_USER_ID_LEGACY: &str = "MISSKEY_TEARGET_USER_ID";
}

/// Result detail strings recorded for non-operational failures
pub mod reasons {
    pub const FLAG_NOT_SET: &str = "flag not set";
    pub const DISABLED_BY_CONFIGURATION: &str = "disabled by configuration";
    pub const DISK_USAGE_EXCEEDS_THRESHOLD: &str = "disk usage exceeds threshold";
    pub const UNEXPECTED_FAULT: &str = "unexpected fault";

    /// Longest failure reason kept in a task result
    pub const MAX_DETAIL_CHARS: usize = 200;
}
