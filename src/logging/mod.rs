//! Logging utilities for the workbench
//! Installs the subscriber and handles log file retention

use crate::utils::get_logs_dir;
use log::info;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Install a global subscriber honouring `RUST_LOG`. `log` records are forwarded to it.
/// Returns false when a subscriber was already installed.
pub fn init() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

pub fn cleanup_old_logs(retention_days: u64) {
    cleanup_logs_in(&get_logs_dir(), retention_days);
}

pub fn cleanup_logs_in(logs_dir: &Path, retention_days: u64) -> usize {
    if !logs_dir.exists() {
        return 0;
    }

    let retention = Duration::from_secs(retention_days * 24 * 60 * 60);
    let now = SystemTime::now();
    let mut removed = 0;

    if let Ok(entries) = fs::read_dir(logs_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "log") {
                if let Ok(modified) = fs::metadata(&path).and_then(|meta| meta.modified()) {
                    if let Ok(age) = now.duration_since(modified) {
                        if age > retention && fs::remove_file(&path).is_ok() {
                            info!("Cleaned up old log: {:?}", path.file_name());
                            removed += 1;
                        }
                    }
                }
            }
        }
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_day_retention_removes_only_log_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("old.log"), "x").unwrap();
        fs::write(dir.path().join("keep.json"), "{}").unwrap();
        std::thread::sleep(Duration::from_millis(20));

        let removed = cleanup_logs_in(dir.path(), 0);

        assert_eq!(removed, 1);
        assert!(dir.path().join("keep.json").exists());
    }

    #[test]
    fn test_recent_logs_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("today.log"), "x").unwrap();
        assert_eq!(cleanup_logs_in(dir.path(), 7), 0);
    }
}
