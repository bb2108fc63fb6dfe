// File: maintainer/src/services/report_service.rs
use crate::config::{Config, EnableFlag, EnvSource};
use crate::constants::env_keys;
use crate::scheduler::{MaintenanceTask, TaskOutcome};
use crate::services::notification_service::Notifier;
use crate::system::{DiskSnapshot, DiskUsageProvider};
use crate::task_tracker::{TaskResult, TaskResultStore};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Broadcast messages: the morning report and the pre-maintenance notice
#[derive(Clone)]
pub struct ReportService {
    config: Arc<Config>,
    env: Arc<dyn EnvSource>,
    disk: Arc<dyn DiskUsageProvider>,
    notifier: Arc<dyn Notifier>,
}

impl ReportService {
    pub fn new(
        config: Arc<Config>,
        env: Arc<dyn EnvSource>,
        disk: Arc<dyn DiskUsageProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            env,
            disk,
            notifier,
        }
    }

    /// Summarise yesterday's results and broadcast them.
    pub async fn run_daily_report(
        &self,
        results: &TaskResultStore,
        now: NaiveDateTime,
    ) -> TaskOutcome {
        if let Some(outcome) = self.gate(env_keys::MAINTENANCE_REPORT, "daily report").await {
            return outcome;
        }

        let disk = match self.disk.disk_usage(&self.config.disk_usage_path) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Disk usage unavailable for daily report: {}", e);
                None
            }
        };

        let report = compose_daily_report(results, now.date(), disk.as_ref(), now);
        info!("Daily report generated for {}", now.date());

        match self.notifier.notify_broadcast(&report).await {
            Ok(()) => TaskOutcome::Succeeded,
            Err(e) => {
                error!("Failed to send daily report: {}", e);
                TaskOutcome::Failed
            }
        }
    }

    /// Tell users that maintenance is about to start.
    pub async fn run_announcement(&self) -> TaskOutcome {
        if let Some(outcome) = self
            .gate(env_keys::MAINTENANCE_ANNOUNCEMENT, "maintenance announcement")
            .await
        {
            return outcome;
        }

        let text = format!(
            "🔧 Scheduled database maintenance starts at {}.\n\
             The server may be slow or briefly unavailable while it runs.",
            self.config.schedule.repack
        );

        match self.notifier.notify_broadcast(&text).await {
            Ok(()) => {
                info!("Maintenance announcement sent");
                TaskOutcome::Succeeded
            }
            Err(e) => {
                error!("Failed to send maintenance announcement: {}", e);
                TaskOutcome::Failed
            }
        }
    }

    /// `None` means proceed; otherwise the outcome to return immediately.
    async fn gate(&self, key: &str, label: &str) -> Option<TaskOutcome> {
        match EnableFlag::read(self.env.as_ref(), key) {
            EnableFlag::Enabled => None,
            EnableFlag::Disabled => {
                info!("{} is disabled by {}", label, key);
                Some(TaskOutcome::Disabled)
            }
            EnableFlag::Unset => {
                error!("{} is not set; skipping {}", key, label);
                if let Err(e) = self
                    .notifier
                    .notify_direct(&format!(
                        "⚠️ {}: environment variable {} is not set. Please check the configuration.",
                        label, key
                    ))
                    .await
                {
                    error!("Failed to send notification: {}", e);
                }
                Some(TaskOutcome::Failed)
            }
        }
    }
}

/// Compose the report covering the day before `today`.
///
/// The weekly line appears only when yesterday was a Sunday and the
/// monthly line only when yesterday was the 1st.
pub fn compose_daily_report(
    results: &TaskResultStore,
    today: NaiveDate,
    disk: Option<&DiskSnapshot>,
    generated_at: NaiveDateTime,
) -> String {
    let yesterday = today - Duration::days(1);

    let mut lines = vec![format!("📊 Maintenance report for {}", yesterday), String::new()];

    for task in MaintenanceTask::ALL {
        let included = match task {
            MaintenanceTask::AutoBackupWeekly => yesterday.weekday() == Weekday::Sun,
            MaintenanceTask::AutoBackupMonthly => yesterday.day() == 1,
            _ => true,
        };
        if included {
            lines.push(render_line(task, &results.get(task), yesterday));
        }
    }

    lines.push(String::new());
    match disk {
        Some(snapshot) => lines.push(format!("💾 Disk usage: {}", snapshot.summary())),
        None => lines.push("💾 Disk usage: unavailable".to_string()),
    }
    lines.push(format!(
        "🕒 Generated at {}",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));

    lines.join("\n")
}

fn render_line(task: MaintenanceTask, result: &TaskResult, yesterday: NaiveDate) -> String {
    if !result.ran_on(yesterday) {
        return format!("{}: ⚠️ not run", task);
    }

    let status = if result.success == Some(true) {
        "✅ success"
    } else {
        "❌ failure"
    };

    match result.details.as_deref() {
        Some(details) if !details.is_empty() => format!("{}: {} ({})", task, status, details),
        _ => format!("{}: {}", task, status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_not_run_when_never_recorded() {
        let store = TaskResultStore::new();
        // 2026-10-17 is a Saturday, yesterday a Friday
        let today = day(2026, 10, 17);
        let report = compose_daily_report(&store, today, None, today.and_hms_opt(8, 0, 0).unwrap());

        assert!(report.contains("pg_repack_all_db: ⚠️ not run"));
        assert!(report.contains("auto_backup_daily: ⚠️ not run"));
        assert!(report.contains("pgroonga_reindex: ⚠️ not run"));
        assert!(!report.contains("auto_backup_weekly"));
        assert!(!report.contains("auto_backup_monthly"));
        assert!(report.contains("💾 Disk usage: unavailable"));
        assert!(report.contains("🕒 Generated at 2026-10-17 08:00:00"));
    }

    #[test]
    fn test_results_older_than_yesterday_count_as_not_run() {
        let mut store = TaskResultStore::new();
        store.record_at(
            MaintenanceTask::PgRepackAllDb,
            true,
            Some("00:01:00".into()),
            day(2026, 10, 15).and_hms_opt(2, 1, 0).unwrap(),
        );
        let report = compose_daily_report(
            &store,
            day(2026, 10, 17),
            None,
            day(2026, 10, 17).and_hms_opt(8, 0, 0).unwrap(),
        );
        assert!(report.contains("pg_repack_all_db: ⚠️ not run"));
    }

    #[test]
    fn test_monthly_line_after_first_of_month() {
        let mut store = TaskResultStore::new();
        store.record_at(
            MaintenanceTask::AutoBackupMonthly,
            false,
            Some("disk usage exceeds threshold (93.0%)".into()),
            day(2026, 11, 1).and_hms_opt(6, 0, 5).unwrap(),
        );
        let snapshot = DiskSnapshot::from_bytes(1024, 512, 512);
        let report = compose_daily_report(
            &store,
            day(2026, 11, 2),
            Some(&snapshot),
            day(2026, 11, 2).and_hms_opt(8, 0, 0).unwrap(),
        );

        assert!(report
            .contains("auto_backup_monthly: ❌ failure (disk usage exceeds threshold (93.0%))"));
        assert!(report.contains("50.0%"));
    }
}
