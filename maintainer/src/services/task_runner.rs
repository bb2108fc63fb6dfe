// File: maintainer/src/services/task_runner.rs
//
// Runs the tracked maintenance tasks with configuration gating, the
// frequency policy, timing, result recording and operator notification.
//
use crate::config::{Config, ConnectionInfo, EnableFlag, EnvSource, TaskSettings};
use crate::constants::reasons;
use crate::postgres::{BackupType, DatabaseOperations};
use crate::scheduler::{should_run, MaintenanceTask, TaskOutcome};
use crate::services::notification_service::Notifier;
use crate::system::{format_bytes, DiskUsageProvider};
use crate::task_tracker::TaskResultStore;
use anyhow::Result;
use chrono::NaiveDateTime;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};

/// Format an elapsed duration as `HH:MM:SS`
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// First line of an error message, capped for storage in a task result
fn short_reason(message: &str) -> String {
    let first_line = message.lines().next().unwrap_or_default().trim();
    if first_line.chars().count() > reasons::MAX_DETAIL_CHARS {
        let truncated: String = first_line.chars().take(reasons::MAX_DETAIL_CHARS).collect();
        format!("{}…", truncated)
    } else {
        first_line.to_string()
    }
}

#[derive(Clone)]
pub struct TaskRunner {
    config: Arc<Config>,
    env: Arc<dyn EnvSource>,
    database: Arc<dyn DatabaseOperations>,
    disk: Arc<dyn DiskUsageProvider>,
    notifier: Arc<dyn Notifier>,
}

impl TaskRunner {
    pub fn new(
        config: Arc<Config>,
        env: Arc<dyn EnvSource>,
        database: Arc<dyn DatabaseOperations>,
        disk: Arc<dyn DiskUsageProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            env,
            database,
            disk,
            notifier,
        }
    }

    /// Run one tracked task as of `now`.
    ///
    /// Every path except a frequency skip leaves exactly one entry in
    /// `results`. Errors from the collaborator never escape; they become a
    /// recorded failure plus a direct notification.
    #[instrument(skip(self, results), fields(task = %task))]
    pub async fn run(
        &self,
        task: MaintenanceTask,
        results: &mut TaskResultStore,
        now: NaiveDateTime,
    ) -> TaskOutcome {
        let settings = TaskSettings::load(self.env.as_ref(), task);

        match settings.enabled {
            EnableFlag::Unset => {
                error!(
                    "{} is not set; cannot decide whether to run {}",
                    task.enable_key(),
                    task
                );
                self.send_direct(&format!(
                    "⚠️ {}: environment variable {} is not set. Please check the configuration.",
                    task,
                    task.enable_key()
                ))
                .await;
                results.record_at(task, false, Some(reasons::FLAG_NOT_SET.to_string()), now);
                return TaskOutcome::Failed;
            }
            EnableFlag::Disabled => {
                info!("{} is disabled by {}", task, task.enable_key());
                results.record_at(
                    task,
                    false,
                    Some(reasons::DISABLED_BY_CONFIGURATION.to_string()),
                    now,
                );
                return TaskOutcome::Disabled;
            }
            EnableFlag::Enabled => {}
        }

        if !should_run(task.family(), settings.frequency, now.date()) {
            info!(
                "Skipping {} on {} (frequency: {})",
                task,
                now.date(),
                settings.frequency.as_str()
            );
            return TaskOutcome::Skipped;
        }

        let connection = match ConnectionInfo::from_env(self.env.as_ref()) {
            Ok(connection) => connection,
            Err(e) => {
                error!("Cannot run {}: {}", task, e);
                self.send_direct(&format!("⚠️ {}: {}", task, e)).await;
                results.record_at(task, false, Some(e.to_string()), now);
                return TaskOutcome::Failed;
            }
        };

        let backup_type = match task {
            MaintenanceTask::AutoBackupDaily => BackupType::Daily,
            MaintenanceTask::AutoBackupWeekly => BackupType::Weekly,
            MaintenanceTask::AutoBackupMonthly => BackupType::Monthly,
            MaintenanceTask::PgRepackAllDb => {
                let started = Instant::now();
                let result = self.database.run_repack(&connection).await;
                return self
                    .finish(task, result.map(|()| None), started.elapsed(), results, now)
                    .await;
            }
            MaintenanceTask::PgroongaReindex => {
                let started = Instant::now();
                let result = self.database.run_reindex(&connection).await;
                return self
                    .finish(task, result.map(|()| None), started.elapsed(), results, now)
                    .await;
            }
        };

        self.run_backup(task, backup_type, &connection, results, now)
            .await
    }

    async fn run_backup(
        &self,
        task: MaintenanceTask,
        backup_type: BackupType,
        connection: &ConnectionInfo,
        results: &mut TaskResultStore,
        now: NaiveDateTime,
    ) -> TaskOutcome {
        let path = &self.config.disk_usage_path;
        match self.disk.disk_usage(path) {
            Ok(snapshot) if snapshot.percent > self.config.disk_usage_threshold_percent => {
                warn!(
                    "Disk usage at {} is {:.1}% (threshold {:.1}%), aborting {}",
                    path.display(),
                    snapshot.percent,
                    self.config.disk_usage_threshold_percent,
                    task
                );
                self.send_direct(&format!(
                    "⚠️ {} aborted: disk usage is {:.1}% (threshold {:.1}%)\n{}",
                    task,
                    snapshot.percent,
                    self.config.disk_usage_threshold_percent,
                    snapshot.summary()
                ))
                .await;
                results.record_at(
                    task,
                    false,
                    Some(format!(
                        "{} ({:.1}%)",
                        reasons::DISK_USAGE_EXCEEDS_THRESHOLD,
                        snapshot.percent
                    )),
                    now,
                );
                return TaskOutcome::Failed;
            }
            Ok(snapshot) => {
                info!("Disk usage before {} backup: {}", backup_type, snapshot.summary());
            }
            Err(e) => {
                warn!(
                    "Could not read disk usage at {} ({}), continuing with {}",
                    path.display(),
                    e,
                    task
                );
            }
        }

        let started = Instant::now();
        let result = self
            .database
            .run_backup(connection, backup_type)
            .await
            .map(|artifact| Some(artifact.compressed_size));
        self.finish(task, result, started.elapsed(), results, now)
            .await
    }

    /// Record and announce the result of an operation that actually ran.
    async fn finish(
        &self,
        task: MaintenanceTask,
        result: Result<Option<u64>>,
        elapsed: Duration,
        results: &mut TaskResultStore,
        now: NaiveDateTime,
    ) -> TaskOutcome {
        let elapsed = format_elapsed(elapsed);
        match result {
            Ok(size) => {
                let details = match size {
                    Some(bytes) => format!("{}, {}", elapsed, format_bytes(bytes)),
                    None => elapsed.clone(),
                };
                info!("{} completed in {}", task, details);
                results.record_at(task, true, Some(details), now);

                let mut message = format!("✅ {} completed\nElapsed: {}", task, elapsed);
                if let Some(bytes) = size {
                    message.push_str(&format!("\nCompressed size: {}", format_bytes(bytes)));
                }
                self.send_direct(&message).await;
                TaskOutcome::Succeeded
            }
            Err(e) => {
                let reason = short_reason(&e.to_string());
                error!("{} failed after {}: {:#}", task, elapsed, e);
                results.record_at(task, false, Some(format!("{}, {}", elapsed, reason)), now);
                self.send_direct(&format!(
                    "❌ {} failed\nElapsed: {}\nReason: {}",
                    task, elapsed, reason
                ))
                .await;
                TaskOutcome::Failed
            }
        }
    }

    /// Connectivity check, not tracked in the result store.
    pub async fn check_connection(&self) -> TaskOutcome {
        let connection = match ConnectionInfo::from_env(self.env.as_ref()) {
            Ok(connection) => connection,
            Err(e) => {
                error!("Cannot check PostgreSQL connection: {}", e);
                return TaskOutcome::Failed;
            }
        };
        if let Some(replica) = connection.replica_address() {
            info!(
                "Read replica configured at {}; checking the primary only",
                replica
            );
        }

        match self.database.check_connection(&connection).await {
            Ok(()) => TaskOutcome::Succeeded,
            Err(e) => {
                error!(
                    "Failed to connect to PostgreSQL at {}: {}",
                    connection.address(),
                    e
                );
                TaskOutcome::Failed
            }
        }
    }

    /// On-demand dump into the manual directory, not tracked in the result store.
    pub async fn manual_backup(&self) -> TaskOutcome {
        let connection = match ConnectionInfo::from_env(self.env.as_ref()) {
            Ok(connection) => connection,
            Err(e) => {
                error!("Cannot run manual backup: {}", e);
                self.send_direct(&format!("⚠️ manual_backup_postgres: {}", e))
                    .await;
                return TaskOutcome::Failed;
            }
        };

        let started = Instant::now();
        let result = self.database.run_manual_backup(&connection).await;
        let elapsed = format_elapsed(started.elapsed());

        match result {
            Ok(artifact) => {
                info!(
                    "Manual backup saved to {} in {}",
                    artifact.path.display(),
                    elapsed
                );
                self.send_direct(&format!(
                    "✅ manual_backup_postgres completed\nElapsed: {}\nCompressed size: {}",
                    elapsed,
                    format_bytes(artifact.compressed_size)
                ))
                .await;
                TaskOutcome::Succeeded
            }
            Err(e) => {
                error!("Manual backup failed after {}: {:#}", elapsed, e);
                self.send_direct(&format!(
                    "❌ manual_backup_postgres failed\nElapsed: {}\nReason: {}",
                    elapsed,
                    short_reason(&e.to_string())
                ))
                .await;
                TaskOutcome::Failed
            }
        }
    }

    async fn send_direct(&self, text: &str) {
        if let Err(e) = self.notifier.notify_direct(text).await {
            error!("Failed to send notification: {}", e);
        }
    }
}
