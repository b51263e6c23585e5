//! C13: process marker.
//!
//! A JSON file is the sole coordination mechanism between collector
//! instances and CLI commands (`status`, `stop`) — no socket, no lock file,
//! no IPC channel. Liveness is a `kill(pid, 0)` signal probe, not a
//! heartbeat or socket handshake.

use crate::error::{ContentionError, CCT_LOCK_001_CONTENDED};
use nix::sys::signal::kill;
use nix::unistd::Pid;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessMarker {
    pub pid: u32,
    pub started_at_unix_ms: i64,
    pub working_directory: PathBuf,
    pub watch_paths: Vec<PathBuf>,
    pub config_path: Option<PathBuf>,
}

impl ProcessMarker {
    pub fn for_current_process(
        working_directory: PathBuf,
        watch_paths: Vec<PathBuf>,
        config_path: Option<PathBuf>,
    ) -> Self {
        Self {
            pid: std::process::id(),
            started_at_unix_ms: chrono::Utc::now().timestamp_millis(),
            working_directory,
            watch_paths,
            config_path,
        }
    }

    /// Write this marker to `path`, creating parent directories as needed.
    ///
    /// Callers should check [`is_live_at`] first; writing without that check
    /// races a concurrent start.
    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    pub fn read(path: &Path) -> std::io::Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(serde_json::from_str(&contents).ok()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub fn remove(path: &Path) -> std::io::Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

/// Probe whether `pid` is a live process via a signal-0 `kill`, not by
/// parsing `/proc` or touching a socket.
pub fn is_pid_live(pid: u32) -> bool {
    kill(Pid::from_raw(pid as i32), None).is_ok()
}

/// Check a marker file at `path` and return a [`ContentionError`] if a live
/// process already holds it.
pub fn check_contention(path: &Path) -> std::io::Result<Option<ContentionError>> {
    match ProcessMarker::read(path)? {
        Some(marker) if is_pid_live(marker.pid) => {
            tracing::warn!(code = CCT_LOCK_001_CONTENDED, pid = marker.pid, "collector already running");
            Ok(Some(ContentionError { pid: marker.pid }))
        }
        Some(_stale) => {
            // Marker left behind by a process that is no longer alive; the
            // caller may overwrite it.
            Ok(None)
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.pid");
        let marker = ProcessMarker::for_current_process(
            PathBuf::from("/tmp/project"),
            vec![PathBuf::from(".")],
            None,
        );
        marker.write(&path).unwrap();
        let read_back = ProcessMarker::read(&path).unwrap().unwrap();
        assert_eq!(read_back.pid, marker.pid);
        assert_eq!(read_back.working_directory, marker.working_directory);
    }

    #[test]
    fn missing_marker_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.pid");
        assert_eq!(ProcessMarker::read(&path).unwrap(), None);
    }

    #[test]
    fn current_process_is_live() {
        assert!(is_pid_live(std::process::id()));
    }

    #[test]
    fn contention_detected_for_own_live_pid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.pid");
        let marker = ProcessMarker::for_current_process(PathBuf::from("."), vec![], None);
        marker.write(&path).unwrap();
        let contention = check_contention(&path).unwrap();
        assert!(contention.is_some());
        assert_eq!(contention.unwrap().pid, std::process::id());
    }

    #[test]
    fn stale_marker_is_not_contention() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.pid");
        // PID 0 is never a process we can signal as live in this context,
        // and very large unused pids reliably fail the kill probe too.
        let marker = ProcessMarker {
            pid: 999_999,
            started_at_unix_ms: 0,
            working_directory: PathBuf::from("."),
            watch_paths: vec![],
            config_path: None,
        };
        marker.write(&path).unwrap();
        let contention = check_contention(&path).unwrap();
        assert!(contention.is_none());
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.pid");
        ProcessMarker::remove(&path).unwrap();
        ProcessMarker::remove(&path).unwrap();
    }
}
