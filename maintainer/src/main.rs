// File: maintainer/src/main.rs
use anyhow::Result;
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::fmt;

use maintainer::config::{default_dotenv_candidates, ConfigManager, DotenvEnv};
use maintainer::constants::defaults;
use maintainer::logging;
use maintainer::scheduler::{MaintenanceScheduler, TaskId};
use maintainer::services::{MisskeyNotifier, MisskeySettings};
use maintainer::{PostgresOperations, StatvfsDiskUsage};

/// Scheduled PostgreSQL maintenance for a Misskey instance
#[derive(Parser, Debug)]
#[command(name = "maintainer", version, about)]
struct Args {
    /// Run a single task immediately and exit instead of starting the scheduler
    #[arg(long, value_enum)]
    run: Option<TaskId>,

    /// Path to the TOML configuration file
    #[arg(long, default_value = defaults::CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Console-only until the config names the log file
    let config = {
        let startup = fmt().with_env_filter(logging::env_filter()?).finish();
        let _default = tracing::subscriber::set_default(startup);
        ConfigManager::new(&args.config).await?.get_current_config()
    };

    let _log_guard = logging::init(&config.logging)?;
    info!(
        "Configuration loaded: backups under {}, disk threshold {:.1}% on {}",
        config.backup_root.display(),
        config.disk_usage_threshold_percent,
        config.disk_usage_path.display()
    );

    let env = Arc::new(DotenvEnv::discover(&default_dotenv_candidates()));
    let notifier = Arc::new(MisskeyNotifier::new(
        MisskeySettings::from_env(env.as_ref()),
        Duration::from_secs(config.notification_timeout_seconds),
    )?);
    if notifier.is_enabled() {
        info!("Misskey notifications enabled");
    } else {
        warn!("⚠️  NOTIFICATIONS DISABLED ⚠️");
        warn!("Set MISSKEY_HOST and MISSKEY_NOTICE_USER_TOKEN to enable them");
    }

    let database = Arc::new(PostgresOperations::new(config.backup_root.clone()));
    let disk = Arc::new(StatvfsDiskUsage);

    let mut scheduler = MaintenanceScheduler::new(
        config.clone(),
        env,
        database,
        disk,
        notifier,
        Local::now().naive_local(),
    )?;

    if let Some(task) = args.run {
        let outcome = scheduler.run_once(task).await;
        info!("One-shot run of {} ended: {:?}", task, outcome);
        return Ok(());
    }

    info!("Starting PostgreSQL maintenance scheduler");
    tokio::select! {
        _ = scheduler.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
