//! In-process fakes for the agent's collaborators
//!
//! Each fake records how it was called so tests can assert both the
//! recorded task results and the side effects that did (or did not) happen.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use maintainer::config::ConnectionInfo;
use maintainer::errors::NotificationError;
use maintainer::postgres::{BackupArtifact, BackupType, DatabaseOperations};
use maintainer::services::Notifier;
use maintainer::system::{DiskSnapshot, DiskUsageProvider};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Which channel a captured notification went to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Direct,
    Broadcast,
}

/// Notifier that keeps every message in memory
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(Channel, String)>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures messages but reports every send as rejected
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn messages(&self) -> Vec<(Channel, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn direct(&self) -> Vec<String> {
        self.on(Channel::Direct)
    }

    pub fn broadcast(&self) -> Vec<String> {
        self.on(Channel::Broadcast)
    }

    fn on(&self, channel: Channel) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, text)| text)
            .collect()
    }

    fn push(&self, channel: Channel, text: &str) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push((channel, text.to_string()));
        if self.fail {
            Err(NotificationError::Rejected {
                status: 500,
                body: "unavailable".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_direct(&self, text: &str) -> Result<(), NotificationError> {
        self.push(Channel::Direct, text)
    }

    async fn notify_broadcast(&self, text: &str) -> Result<(), NotificationError> {
        self.push(Channel::Broadcast, text)
    }
}

/// Database operation a fake was asked to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbCall {
    Backup(BackupType),
    ManualBackup,
    Repack,
    Reindex,
    CheckConnection,
}

/// Scripted database operations
pub struct FakeDatabase {
    calls: Mutex<Vec<DbCall>>,
    backup_size: u64,
    fail_with: Option<String>,
    panic_on_reindex: bool,
}

impl Default for FakeDatabase {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            backup_size: 512 * 1024 * 1024,
            fail_with: None,
            panic_on_reindex: false,
        }
    }
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation fails with `reason`
    pub fn failing(reason: &str) -> Self {
        Self {
            fail_with: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn with_backup_size(mut self, bytes: u64) -> Self {
        self.backup_size = bytes;
        self
    }

    pub fn panicking_reindex() -> Self {
        Self {
            panic_on_reindex: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<DbCall> {
        self.calls.lock().unwrap().clone()
    }

    fn call(&self, call: DbCall) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        match &self.fail_with {
            Some(reason) => Err(anyhow!("{}", reason)),
            None => Ok(()),
        }
    }

    fn artifact(&self, name: &str) -> BackupArtifact {
        BackupArtifact {
            path: PathBuf::from("/backup/postgres").join(name),
            compressed_size: self.backup_size,
        }
    }
}

#[async_trait]
impl DatabaseOperations for FakeDatabase {
    async fn run_backup(
        &self,
        _connection: &ConnectionInfo,
        backup_type: BackupType,
    ) -> Result<BackupArtifact> {
        self.call(DbCall::Backup(backup_type))?;
        Ok(self.artifact(&format!("pg_dump_{}.sql.gz", backup_type)))
    }

    async fn run_manual_backup(&self, _connection: &ConnectionInfo) -> Result<BackupArtifact> {
        self.call(DbCall::ManualBackup)?;
        Ok(self.artifact("pg_dump_manual.sql.gz"))
    }

    async fn run_repack(&self, _connection: &ConnectionInfo) -> Result<()> {
        self.call(DbCall::Repack)
    }

    async fn run_reindex(&self, _connection: &ConnectionInfo) -> Result<()> {
        if self.panic_on_reindex {
            self.calls.lock().unwrap().push(DbCall::Reindex);
            panic!("index catalogue returned garbage");
        }
        self.call(DbCall::Reindex)
    }

    async fn check_connection(&self, _connection: &ConnectionInfo) -> Result<()> {
        self.call(DbCall::CheckConnection)
    }
}

/// Disk usage provider returning a fixed snapshot, or an error
pub struct FixedDisk {
    snapshot: Option<DiskSnapshot>,
}

impl FixedDisk {
    /// 1 TiB volume at the given fill percentage
    pub fn at_percent(percent: u64) -> Self {
        let total: u64 = 1 << 40;
        let used = total / 100 * percent;
        Self {
            snapshot: Some(DiskSnapshot::from_bytes(total, used, total - used)),
        }
    }

    pub fn unreadable() -> Self {
        Self { snapshot: None }
    }
}

impl DiskUsageProvider for FixedDisk {
    fn disk_usage(&self, path: &Path) -> Result<DiskSnapshot> {
        self.snapshot
            .clone()
            .ok_or_else(|| anyhow!("statvfs failed for {}", path.display()))
    }
}
