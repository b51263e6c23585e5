//! Raw filesystem watcher.
//!
//! Wraps `notify`'s low-level API directly — not `notify-debouncer-mini` —
//! because coalescing is the classifier's job (§ [`crate::classifier`]), not
//! the watcher's. This layer's only responsibility is turning OS-level
//! events into inode-addressed signals; a single rename, a single write, a
//! burst of writes all pass through untouched.

use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Event, EventKind as NotifyEventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSignal {
    Added { path: PathBuf, inode: u64 },
    Changed { path: PathBuf, inode: u64 },
    /// `inode` is the last inode this watcher observed at `path`; `notify`
    /// cannot stat a path that is already gone.
    Removed { path: PathBuf, inode: u64 },
}

fn inode_of(path: &Path) -> Option<u64> {
    #[cfg(unix)]
    {
        std::fs::metadata(path).ok().map(|m| m.ino())
    }
    #[cfg(not(unix))]
    {
        let _ = path;
        None
    }
}

/// Background filesystem watcher. Owns the `notify` watcher and a
/// path-&gt;inode cache (needed to resolve the inode of a path that just
/// disappeared).
pub struct FileSystemWatcher {
    _inner: RecommendedWatcher,
    receiver: Receiver<RawSignal>,
}

impl FileSystemWatcher {
    pub fn new(roots: &[PathBuf]) -> notify::Result<Self> {
        let (tx, rx) = channel();
        let known_inodes: Arc<Mutex<HashMap<PathBuf, u64>>> = Arc::new(Mutex::new(HashMap::new()));
        let forward = known_inodes.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(e) => e,
                Err(_) => return,
            };
            forward_event(event, &forward, &tx);
        })?;

        for root in roots {
            watcher.watch(root, RecursiveMode::Recursive)?;
        }

        Ok(Self {
            _inner: watcher,
            receiver: rx,
        })
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<RawSignal, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    pub fn try_recv(&self) -> Option<RawSignal> {
        self.receiver.try_recv().ok()
    }
}

fn forward_event(event: Event, known_inodes: &Arc<Mutex<HashMap<PathBuf, u64>>>, tx: &Sender<RawSignal>) {
    match event.kind {
        NotifyEventKind::Create(CreateKind::File) | NotifyEventKind::Create(CreateKind::Any) => {
            for path in event.paths {
                if let Some(inode) = inode_of(&path) {
                    known_inodes.lock().unwrap().insert(path.clone(), inode);
                    let _ = tx.send(RawSignal::Added { path, inode });
                }
            }
        }
        NotifyEventKind::Modify(ModifyKind::Data(_)) | NotifyEventKind::Modify(ModifyKind::Any) => {
            for path in event.paths {
                if let Some(inode) = inode_of(&path) {
                    known_inodes.lock().unwrap().insert(path.clone(), inode);
                    let _ = tx.send(RawSignal::Changed { path, inode });
                }
            }
        }
        NotifyEventKind::Remove(RemoveKind::File) | NotifyEventKind::Remove(RemoveKind::Any) => {
            for path in event.paths {
                let inode = known_inodes.lock().unwrap().remove(&path);
                if let Some(inode) = inode {
                    let _ = tx.send(RawSignal::Removed { path, inode });
                }
            }
        }
        NotifyEventKind::Modify(ModifyKind::Name(_)) => {
            // notify on some platforms reports a rename as a single Name-modify
            // event carrying both the old and new path; treat the first as a
            // disappearance and the second as an appearance so the classifier's
            // move-pairing logic handles it uniformly with the two-event case.
            let mut paths = event.paths.into_iter();
            if let (Some(from), Some(to)) = (paths.next(), paths.next()) {
                let inode = known_inodes.lock().unwrap().remove(&from);
                if let Some(inode) = inode {
                    let _ = tx.send(RawSignal::Removed { path: from, inode });
                }
                if let Some(inode) = inode_of(&to) {
                    known_inodes.lock().unwrap().insert(to.clone(), inode);
                    let _ = tx.send(RawSignal::Added { path: to, inode });
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn watcher_observes_file_creation() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = FileSystemWatcher::new(&[dir.path().to_path_buf()]).unwrap();

        let file_path = dir.path().join("new_file.txt");
        std::fs::write(&file_path, b"hello").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut saw_add = false;
        while Instant::now() < deadline {
            if let Ok(signal) = watcher.recv_timeout(Duration::from_millis(200)) {
                if let RawSignal::Added { path, .. } = signal {
                    if path == file_path {
                        saw_add = true;
                        break;
                    }
                }
            }
        }
        assert!(saw_add, "expected an Added signal for the new file");
    }
}
