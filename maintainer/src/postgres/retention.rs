use crate::constants::retention::BACKUP_FILE_PATTERN;
use anyhow::{anyhow, Result};
use glob::{glob, Pattern};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{info, warn};

/// Compressed backups in `dir`, oldest first by modification time.
pub fn list_backups(dir: &Path) -> Result<Vec<PathBuf>> {
    let dir_str = dir
        .to_str()
        .ok_or_else(|| anyhow!("Backup directory is not valid UTF-8: {}", dir.display()))?;
    // Only the file name part is a pattern
    let pattern = format!("{}/{}", Pattern::escape(dir_str), BACKUP_FILE_PATTERN);

    let mut backups: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in glob(&pattern).map_err(|e| anyhow!("Glob pattern error: {}", e))? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping unreadable backup entry: {}", e);
                continue;
            }
        };
        let modified = fs::metadata(&path)
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        backups.push((modified, path));
    }

    backups.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    Ok(backups.into_iter().map(|(_, path)| path).collect())
}

/// Delete all but the `keep` most recently modified backups in `dir`.
///
/// Individual deletion failures are logged and skipped. Returns how many
/// files were removed.
pub fn prune_backups(dir: &Path, keep: usize) -> Result<usize> {
    let backups = list_backups(dir)?;
    if backups.len() <= keep {
        return Ok(0);
    }

    let excess = backups.len() - keep;
    let mut removed = 0;
    for path in &backups[..excess] {
        info!("Removing old backup: {}", path.display());
        match fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to remove old backup {}: {}", path.display(), e),
        }
    }

    info!(
        "Removed {} old backup(s). Keeping {} most recent backups.",
        removed, keep
    );
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    fn backup_aged(dir: &Path, name: &str, age_days: u64) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(age_days * 86_400);
        file.set_modified(mtime).unwrap();
        path
    }

    #[test]
    fn test_keeps_most_recent_by_mtime() {
        let dir = tempfile::tempdir().unwrap();
        // Names sort opposite to age so only mtime can explain the result
        let oldest = backup_aged(dir.path(), "c.sql.gz", 30);
        let middle = backup_aged(dir.path(), "b.sql.gz", 20);
        let newest = backup_aged(dir.path(), "a.sql.gz", 10);

        let removed = prune_backups(dir.path(), 2).unwrap();

        assert_eq!(removed, 1);
        assert!(!oldest.exists());
        assert!(middle.exists());
        assert!(newest.exists());
    }

    #[test]
    fn test_nothing_removed_under_limit() {
        let dir = tempfile::tempdir().unwrap();
        backup_aged(dir.path(), "one.sql.gz", 1);
        assert_eq!(prune_backups(dir.path(), 7).unwrap(), 0);
        assert_eq!(list_backups(dir.path()).unwrap().len(), 1);
    }

    #[test]
    fn test_ignores_files_outside_pattern() {
        let dir = tempfile::tempdir().unwrap();
        backup_aged(dir.path(), "old.sql.gz", 5);
        backup_aged(dir.path(), "new.sql.gz", 1);
        let partial = backup_aged(dir.path(), "in-progress.sql", 9);

        prune_backups(dir.path(), 1).unwrap();

        assert!(partial.exists());
        assert_eq!(
            list_backups(dir.path()).unwrap(),
            vec![dir.path().join("new.sql.gz")]
        );
    }

    #[test]
    fn test_directory_with_glob_metacharacters() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("backups [daily] *");
        fs::create_dir_all(&dir).unwrap();
        let older = backup_aged(&dir, "older.sql.gz", 3);
        let newer = backup_aged(&dir, "newer.sql.gz", 1);

        assert_eq!(list_backups(&dir).unwrap(), vec![older.clone(), newer.clone()]);
        assert_eq!(prune_backups(&dir, 1).unwrap(), 1);
        assert!(!older.exists());
        assert!(newer.exists());
    }

    #[test]
    fn test_missing_directory_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_backups(&dir.path().join("absent")).unwrap().is_empty());
    }
}
