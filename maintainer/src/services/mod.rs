pub mod notification_service;
pub mod report_service;
pub mod task_runner;

pub use notification_service::{MisskeyNotifier, MisskeySettings, Notifier};
pub use report_service::{compose_daily_report, ReportService};
pub use task_runner::{format_elapsed, TaskRunner};
