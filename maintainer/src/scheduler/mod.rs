//! Wall-clock scheduling for the PostgreSQL maintenance tasks
//!
//! This module provides:
//! - The fixed task registry used by the scheduler and the `--run` flag
//! - The frequency policy deciding whether a task runs on a given day
//! - Trigger bookkeeping for the single-threaded polling loop
//!
//! # Execution model
//!
//! Every task runs to completion on the scheduler's thread before the next
//! trigger is evaluated. A multi-hour reindex therefore delays anything
//! scheduled behind it; trigger density is low enough (seven per day) that
//! this is acceptable. Sub-minute precision is not a goal.
//!
//! # Configuration
//!
//! Trigger times come from `config/main.toml`:
//!
//! ```toml
//! [schedule]
//! repack = "02:00"
//! daily_backup = "03:00"
//! weekly_backup = "05:00"   # Sundays only
//! monthly_backup = "06:00"  # 1st of the month only
//! ```

pub mod frequency;
pub mod operations;
pub mod triggers;

pub use frequency::{should_run, FrequencyMode, TaskFamily};
pub use operations::MaintenanceScheduler;
pub use triggers::{Trigger, TriggerDay};

use crate::constants::env_keys;
use clap::ValueEnum;
use std::fmt;

/// Every task the agent knows how to run, scheduled or one-shot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum TaskId {
    #[value(name = "maintenance_announcement")]
    MaintenanceAnnouncement,
    #[value(name = "pg_repack_all_db")]
    PgRepackAllDb,
    #[value(name = "auto_backup_daily")]
    AutoBackupDaily,
    #[value(name = "pgroonga_reindex")]
    PgroongaReindex,
    #[value(name = "auto_backup_weekly")]
    AutoBackupWeekly,
    #[value(name = "auto_backup_monthly")]
    AutoBackupMonthly,
    #[value(name = "daily_report")]
    DailyReport,
    #[value(name = "check_postgres_connection")]
    CheckPostgresConnection,
    #[value(name = "manual_backup_postgres")]
    ManualBackupPostgres,
}

impl TaskId {
    pub fn name(self) -> &'static str {
        match self {
            TaskId::MaintenanceAnnouncement => "maintenance_announcement",
            TaskId::PgRepackAllDb => "pg_repack_all_db",
            TaskId::AutoBackupDaily => "auto_backup_daily",
            TaskId::PgroongaReindex => "pgroonga_reindex",
            TaskId::AutoBackupWeekly => "auto_backup_weekly",
            TaskId::AutoBackupMonthly => "auto_backup_monthly",
            TaskId::DailyReport => "daily_report",
            TaskId::CheckPostgresConnection => "check_postgres_connection",
            TaskId::ManualBackupPostgres => "manual_backup_postgres",
        }
    }

    /// The result-tracked task behind this id, if any
    pub fn tracked(self) -> Option<MaintenanceTask> {
        match self {
            TaskId::PgRepackAllDb => Some(MaintenanceTask::PgRepackAllDb),
            TaskId::AutoBackupDaily => Some(MaintenanceTask::AutoBackupDaily),
            TaskId::PgroongaReindex => Some(MaintenanceTask::PgroongaReindex),
            TaskId::AutoBackupWeekly => Some(MaintenanceTask::AutoBackupWeekly),
            TaskId::AutoBackupMonthly => Some(MaintenanceTask::AutoBackupMonthly),
            TaskId::MaintenanceAnnouncement
            | TaskId::DailyReport
            | TaskId::CheckPostgresConnection
            | TaskId::ManualBackupPostgres => None,
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tasks whose outcome is tracked for the daily report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaintenanceTask {
    PgRepackAllDb,
    AutoBackupDaily,
    AutoBackupWeekly,
    AutoBackupMonthly,
    PgroongaReindex,
}

impl MaintenanceTask {
    /// Report order
    pub const ALL: [MaintenanceTask; 5] = [
        MaintenanceTask::PgRepackAllDb,
        MaintenanceTask::AutoBackupDaily,
        MaintenanceTask::PgroongaReindex,
        MaintenanceTask::AutoBackupWeekly,
        MaintenanceTask::AutoBackupMonthly,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MaintenanceTask::PgRepackAllDb => "pg_repack_all_db",
            MaintenanceTask::AutoBackupDaily => "auto_backup_daily",
            MaintenanceTask::AutoBackupWeekly => "auto_backup_weekly",
            MaintenanceTask::AutoBackupMonthly => "auto_backup_monthly",
            MaintenanceTask::PgroongaReindex => "pgroonga_reindex",
        }
    }

    pub fn enable_key(self) -> &'static str {
        match self {
            MaintenanceTask::PgRepackAllDb => env_keys::PG_REPACK,
            MaintenanceTask::AutoBackupDaily => env_keys::PG_BACKUP_DAILY,
            MaintenanceTask::AutoBackupWeekly => env_keys::PG_BACKUP_WEEKLY,
            MaintenanceTask::AutoBackupMonthly => env_keys::PG_BACKUP_MONTHLY,
            MaintenanceTask::PgroongaReindex => env_keys::PG_PGROONGA_REINDEX,
        }
    }

    pub fn frequency_key(self) -> &'static str {
        match self {
            MaintenanceTask::PgRepackAllDb => env_keys::PG_REPACK_FREQUENCY,
            MaintenanceTask::AutoBackupDaily => env_keys::PG_BACKUP_DAILY_FREQUENCY,
            MaintenanceTask::AutoBackupWeekly => env_keys::PG_BACKUP_WEEKLY_FREQUENCY,
            MaintenanceTask::AutoBackupMonthly => env_keys::PG_BACKUP_MONTHLY_FREQUENCY,
            MaintenanceTask::PgroongaReindex => env_keys::PG_PGROONGA_REINDEX_FREQUENCY,
        }
    }

    /// Family used by the `every_second` policy
    pub fn family(self) -> TaskFamily {
        match self {
            MaintenanceTask::AutoBackupWeekly => TaskFamily::Weekly,
            MaintenanceTask::AutoBackupMonthly => TaskFamily::Monthly,
            MaintenanceTask::PgRepackAllDb
            | MaintenanceTask::AutoBackupDaily
            | MaintenanceTask::PgroongaReindex => TaskFamily::Daily,
        }
    }
}

impl fmt::Display for MaintenanceTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a single task invocation ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    Failed,
    /// Frequency policy said not today
    Skipped,
    /// Enable flag present but not `True`
    Disabled,
}
