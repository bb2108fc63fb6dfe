pub mod config;
pub mod constants;
pub mod errors;
pub mod logging;
pub mod postgres;
pub mod scheduler;
pub mod services;
pub mod system;
pub mod task_tracker;

// Re-export commonly used types
pub use config::{Config, ConfigManager, ConnectionInfo, EnableFlag, EnvSource};
pub use errors::MaintenanceError;
pub use postgres::{BackupType, DatabaseOperations, PostgresOperations};
pub use scheduler::{MaintenanceScheduler, MaintenanceTask, TaskId, TaskOutcome};
pub use services::{MisskeyNotifier, Notifier, ReportService, TaskRunner};
pub use system::{DiskSnapshot, DiskUsageProvider, StatvfsDiskUsage};
pub use task_tracker::{TaskResult, TaskResultStore};
