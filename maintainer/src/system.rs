//! Host checks: filesystem usage and byte formatting.

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Point-in-time filesystem usage, in bytes and percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiskSnapshot {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f64,
}

impl DiskSnapshot {
    /// Build a snapshot, computing percent the way `df` does:
    /// used over space visible to unprivileged users.
    pub fn from_bytes(total: u64, used: u64, free: u64) -> Self {
        let visible = used.saturating_add(free);
        let percent = if visible == 0 {
            0.0
        } else {
            ((used as f64 / visible as f64) * 1000.0).round() / 10.0
        };
        Self {
            total,
            used,
            free,
            percent,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} / {} used ({:.1}%), {} free",
            format_bytes(self.used),
            format_bytes(self.total),
            self.percent,
            format_bytes(self.free)
        )
    }
}

/// Source of disk usage figures
pub trait DiskUsageProvider: Send + Sync {
    fn disk_usage(&self, path: &Path) -> Result<DiskSnapshot>;
}

/// Reads usage with `statvfs(3)`
#[derive(Debug, Clone, Copy, Default)]
pub struct StatvfsDiskUsage;

#[cfg(unix)]
impl DiskUsageProvider for StatvfsDiskUsage {
    fn disk_usage(&self, path: &Path) -> Result<DiskSnapshot> {
        use std::ffi::CString;
        use std::os::unix::ffi::OsStrExt;

        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| anyhow!("invalid path for statvfs: {e}"))?;

        let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
        let ret = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
        if ret != 0 {
            return Err(anyhow!(
                "failed to check disk usage at {}: {}",
                path.display(),
                std::io::Error::last_os_error()
            ));
        }

        // Field widths differ between platforms
        let frsize: u64 = stat.f_frsize as _;
        let blocks: u64 = stat.f_blocks as _;
        let bfree: u64 = stat.f_bfree as _;
        let bavail: u64 = stat.f_bavail as _;

        let total = blocks.saturating_mul(frsize);
        let used = blocks.saturating_sub(bfree).saturating_mul(frsize);
        let free = bavail.saturating_mul(frsize);

        let snapshot = DiskSnapshot::from_bytes(total, used, free);
        debug!("Disk usage at {}: {:?}", path.display(), snapshot);
        Ok(snapshot)
    }
}

#[cfg(not(unix))]
impl DiskUsageProvider for StatvfsDiskUsage {
    fn disk_usage(&self, path: &Path) -> Result<DiskSnapshot> {
        Err(anyhow!(
            "disk usage is not supported on this platform ({})",
            path.display()
        ))
    }
}

/// Render a byte count as `1.23 GB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes_units() {
        assert_eq!(format_bytes(0), "0.00 B");
        assert_eq!(format_bytes(1023), "1023.00 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(512 * 1024 * 1024), "512.00 MB");
        assert_eq!(format_bytes(3 * 1024u64.pow(5)), "3072.00 TB");
    }

    #[test]
    fn test_percent_uses_visible_space() {
        let snapshot = DiskSnapshot::from_bytes(1000, 450, 450);
        assert_eq!(snapshot.percent, 50.0);

        let empty = DiskSnapshot::from_bytes(0, 0, 0);
        assert_eq!(empty.percent, 0.0);
    }

    #[cfg(unix)]
    #[test]
    fn test_statvfs_reads_temp_dir() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = StatvfsDiskUsage.disk_usage(dir.path()).unwrap();
        assert!(snapshot.total > 0);
        assert!(snapshot.percent >= 0.0 && snapshot.percent <= 100.0);
    }

    #[test]
    fn test_statvfs_missing_path_is_error() {
        assert!(StatvfsDiskUsage
            .disk_usage(Path::new("/definitely/not/here"))
            .is_err());
    }
}
