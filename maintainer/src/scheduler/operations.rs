// File: maintainer/src/scheduler/operations.rs
use crate::config::{Config, EnvSource};
use crate::constants::reasons;
use crate::errors::MaintenanceError;
use crate::postgres::DatabaseOperations;
use crate::scheduler::triggers::{build_triggers, Trigger};
use crate::scheduler::{MaintenanceTask, TaskId, TaskOutcome};
use crate::services::{Notifier, ReportService, TaskRunner};
use crate::system::DiskUsageProvider;
use crate::task_tracker::TaskResultStore;
use chrono::{Local, NaiveDateTime};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, instrument, warn};

/// Owns the task result store and the trigger table, and runs due tasks
/// one after another on the caller's thread.
pub struct MaintenanceScheduler {
    config: Arc<Config>,
    runner: TaskRunner,
    reports: ReportService,
    notifier: Arc<dyn Notifier>,
    results: TaskResultStore,
    triggers: Vec<Trigger>,
}

impl MaintenanceScheduler {
    /// Trigger times are validated here, so a bad schedule fails at startup.
    pub fn new(
        config: Arc<Config>,
        env: Arc<dyn EnvSource>,
        database: Arc<dyn DatabaseOperations>,
        disk: Arc<dyn DiskUsageProvider>,
        notifier: Arc<dyn Notifier>,
        now: NaiveDateTime,
    ) -> Result<Self, MaintenanceError> {
        let triggers = build_triggers(&config.schedule, now)?;

        let runner = TaskRunner::new(
            config.clone(),
            env.clone(),
            database,
            disk.clone(),
            notifier.clone(),
        );
        let reports = ReportService::new(config.clone(), env, disk, notifier.clone());

        Ok(Self {
            config,
            runner,
            reports,
            notifier,
            results: TaskResultStore::new(),
            triggers,
        })
    }

    pub fn results(&self) -> &TaskResultStore {
        &self.results
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    /// Poll forever. Only returns if the runtime shuts down.
    pub async fn run(&mut self) {
        self.announce_startup().await;

        let poll = Duration::from_secs(self.config.poll_interval_seconds);
        let mut interval = tokio::time::interval(poll);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Scheduler loop started with {}s poll interval",
            self.config.poll_interval_seconds
        );

        loop {
            interval.tick().await;
            let ran = self.run_pending(Local::now().naive_local()).await;
            if !ran.is_empty() {
                let next = self.triggers.iter().min_by_key(|t| t.next_run);
                if let Some(next) = next {
                    info!("Next trigger: {} at {}", next.task, next.next_run);
                }
            }
        }
    }

    /// Run every trigger due at `now`, earliest first, and reschedule it.
    ///
    /// Returns the tasks dispatched, in dispatch order.
    pub async fn run_pending(&mut self, now: NaiveDateTime) -> Vec<TaskId> {
        let mut due: Vec<usize> = self
            .triggers
            .iter()
            .enumerate()
            .filter(|(_, trigger)| trigger.is_due(now))
            .map(|(index, _)| index)
            .collect();
        due.sort_by_key(|&index| self.triggers[index].next_run);

        let mut ran = Vec::with_capacity(due.len());
        for index in due {
            let task = self.triggers[index].task;
            let outcome = self.dispatch_isolated(task, now).await;
            info!("{} finished: {:?}", task, outcome);
            self.triggers[index].reschedule(now);
            ran.push(task);
        }
        ran
    }

    /// Run one task immediately, outside the loop.
    pub async fn run_once(&mut self, task: TaskId) -> TaskOutcome {
        info!("Running {} once", task);
        let outcome = self
            .dispatch_isolated(task, Local::now().naive_local())
            .await;
        info!("{} finished: {:?}", task, outcome);
        outcome
    }

    /// A panic inside a task is contained here and becomes a failure.
    async fn dispatch_isolated(&mut self, task: TaskId, now: NaiveDateTime) -> TaskOutcome {
        let result = AssertUnwindSafe(self.dispatch(task, now))
            .catch_unwind()
            .await;

        match result {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("{} aborted by an unexpected fault: {}", task, message);

                if let Some(tracked) = task.tracked() {
                    self.results.record_at(
                        tracked,
                        false,
                        Some(format!("{}: {}", reasons::UNEXPECTED_FAULT, message)),
                        now,
                    );
                }
                if let Err(e) = self
                    .notifier
                    .notify_direct(&format!("❌ {} aborted by an unexpected fault\n{}", task, message))
                    .await
                {
                    error!("Failed to send notification: {}", e);
                }
                TaskOutcome::Failed
            }
        }
    }

    #[instrument(skip(self), fields(task = %task))]
    async fn dispatch(&mut self, task: TaskId, now: NaiveDateTime) -> TaskOutcome {
        match task {
            TaskId::MaintenanceAnnouncement => self.reports.run_announcement().await,
            TaskId::DailyReport => self.reports.run_daily_report(&self.results, now).await,
            TaskId::CheckPostgresConnection => self.runner.check_connection().await,
            TaskId::ManualBackupPostgres => self.runner.manual_backup().await,
            TaskId::PgRepackAllDb => self.run_tracked(MaintenanceTask::PgRepackAllDb, now).await,
            TaskId::AutoBackupDaily => {
                self.run_tracked(MaintenanceTask::AutoBackupDaily, now)
                    .await
            }
            TaskId::PgroongaReindex => {
                self.run_tracked(MaintenanceTask::PgroongaReindex, now)
                    .await
            }
            TaskId::AutoBackupWeekly => {
                self.run_tracked(MaintenanceTask::AutoBackupWeekly, now)
                    .await
            }
            TaskId::AutoBackupMonthly => {
                self.run_tracked(MaintenanceTask::AutoBackupMonthly, now)
                    .await
            }
        }
    }

    async fn run_tracked(&mut self, task: MaintenanceTask, now: NaiveDateTime) -> TaskOutcome {
        self.runner.run(task, &mut self.results, now).await
    }

    async fn announce_startup(&self) {
        let mut lines = vec!["🚀 PostgreSQL maintenance agent started".to_string()];
        for trigger in &self.triggers {
            lines.push(format!(
                "{}: next at {}",
                trigger.task,
                trigger.next_run.format("%Y-%m-%d %H:%M")
            ));
        }

        match self.notifier.notify_direct(&lines.join("\n")).await {
            Ok(()) => info!("Startup notification sent"),
            Err(e) => warn!("Failed to send startup notification: {}", e),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
