//! C5: the collector runtime.
//!
//! Wires together the exclude filter, the reconciler, the raw watcher, the
//! classifier, and the store into one blocking loop. Single-threaded except
//! for the watcher's own background thread (owned by `notify`) and the
//! signal-handling thread; no async runtime.

use crate::classifier::{ClassifiedEvent, Classifier};
use crate::config::CollectorConfig;
use crate::error::FatalError;
use crate::exclude::ExcludeFilter;
use crate::marker::{check_contention, ProcessMarker};
use crate::measurement;
use crate::model::EventKind;
use crate::reconciler::{self, ActiveFileSet};
use crate::store::{insert::insert_event, Store};
use crate::watcher::{FileSystemWatcher, RawSignal};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::Duration;

/// How often the main loop wakes up even with no watcher signal pending, so
/// `tick()`-driven deletes/modifies still surface promptly.
const TICK_INTERVAL: Duration = Duration::from_millis(50);

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub struct CollectorRuntime {
    config: CollectorConfig,
}

impl CollectorRuntime {
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    /// Run until `shutdown` is set, a live collector already holds the
    /// process marker (contention), or a fatal store error occurs.
    pub fn run(&self, shutdown: Arc<AtomicBool>) -> anyhow::Result<()> {
        if let Some(contention) = check_contention(&self.config.pid_file)? {
            tracing::error!(pid = contention.pid, "refusing to start: collector already running");
            return Err(contention.into());
        }

        let marker = ProcessMarker::for_current_process(
            std::env::current_dir().unwrap_or_default(),
            self.config.watch_paths.clone(),
            None,
        );
        if let Err(err) = marker.write(&self.config.pid_file) {
            tracing::warn!(error = %err, "failed to write process marker");
        }

        let result = self.run_inner(shutdown).map_err(anyhow::Error::from);

        if let Err(err) = ProcessMarker::remove(&self.config.pid_file) {
            tracing::warn!(error = %err, "failed to remove process marker on shutdown");
        }

        result
    }

    fn run_inner(&self, shutdown: Arc<AtomicBool>) -> Result<(), FatalError> {
        let mut store = Store::open(&self.config.db_path)?;
        let exclude = ExcludeFilter::new(&self.config.exclude_patterns);
        let mut classifier = Classifier::new(self.config.move_threshold_ms, self.config.debounce_ms);

        for root in &self.config.watch_paths {
            self.reconcile_root(root, &exclude, &mut store, &mut classifier)?;
        }

        let watcher = FileSystemWatcher::new(&self.config.watch_paths).map_err(|e| FatalError::Corrupt {
            message: format!("failed to start filesystem watcher: {e}"),
        })?;

        tracing::info!(paths = ?self.config.watch_paths, "collector running");

        while !shutdown.load(Ordering::SeqCst) {
            match watcher.recv_timeout(TICK_INTERVAL) {
                Ok(signal) => self.handle_signal(signal, &exclude, &mut store, &mut classifier),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            for event in classifier.tick(now_ms()) {
                self.persist(&mut store, event);
            }
        }

        // Drain anything still pending so a clean shutdown doesn't lose a
        // debounced modify or an unconfirmed delete sitting in the window.
        for event in classifier.drain_all() {
            self.persist(&mut store, event);
        }

        tracing::info!("collector shutting down");
        Ok(())
    }

    fn reconcile_root(
        &self,
        root: &std::path::Path,
        exclude: &ExcludeFilter,
        store: &mut Store,
        classifier: &mut Classifier,
    ) -> Result<(), FatalError> {
        let previously_active = self.load_active_set(store)?;
        for (&inode, _) in &previously_active {
            classifier.seed_known_active(inode, true);
        }
        for path in self.load_deleted_paths(store)? {
            classifier.seed_deleted_path(path);
        }

        let events = reconciler::reconcile(root, self.config.max_depth, exclude, &previously_active, now_ms())
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, root = %root.display(), "reconciliation walk failed");
                Vec::new()
            });

        for event in events {
            if event.kind == EventKind::Delete {
                classifier.seed_known_active(event.inode, false);
                classifier.seed_deleted_path(event.path.clone());
            }
            self.persist(store, event);
        }
        Ok(())
    }

    fn load_active_set(&self, store: &Store) -> Result<ActiveFileSet, FatalError> {
        let mut set = ActiveFileSet::new();
        let mut stmt = store
            .connection()
            .prepare("SELECT f.inode, e.path FROM files f JOIN events e ON e.file_id = f.id WHERE f.is_active = 1 AND e.id = (SELECT MAX(id) FROM events WHERE file_id = f.id)")
            .map_err(|e| FatalError::Corrupt {
                message: format!("failed to load active file set: {e}"),
            })?;
        let rows = stmt
            .query_map([], |row| {
                let inode: i64 = row.get(0)?;
                let path: String = row.get(1)?;
                Ok((inode as u64, std::path::PathBuf::from(path)))
            })
            .map_err(|e| FatalError::Corrupt {
                message: format!("failed to load active file set: {e}"),
            })?;
        for row in rows {
            if let Ok((inode, path)) = row {
                set.insert(inode, path);
            }
        }
        Ok(set)
    }

    /// Paths whose most recent recorded event is a `delete`, so a recreate
    /// under a new inode is still recognized as a `restore` (§4.2).
    fn load_deleted_paths(&self, store: &Store) -> Result<Vec<std::path::PathBuf>, FatalError> {
        let mut stmt = store
            .connection()
            .prepare(
                "SELECT e.path FROM files f JOIN events e ON e.file_id = f.id \
                 WHERE f.is_active = 0 AND e.id = (SELECT MAX(id) FROM events WHERE file_id = f.id)",
            )
            .map_err(|e| FatalError::Corrupt {
                message: format!("failed to load deleted path set: {e}"),
            })?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| FatalError::Corrupt {
                message: format!("failed to load deleted path set: {e}"),
            })?;
        Ok(rows.filter_map(Result::ok).map(std::path::PathBuf::from).collect())
    }

    fn handle_signal(
        &self,
        signal: RawSignal,
        exclude: &ExcludeFilter,
        store: &mut Store,
        classifier: &mut Classifier,
    ) {
        let now = now_ms();
        match signal {
            RawSignal::Added { path, inode } => {
                if exclude.is_excluded(&path) {
                    return;
                }
                let event = classifier.on_added(inode, path, now);
                self.persist(store, event);
            }
            RawSignal::Changed { path, inode } => {
                if exclude.is_excluded(&path) {
                    return;
                }
                classifier.on_modified(inode, path, now);
            }
            RawSignal::Removed { path, inode } => {
                classifier.on_removed(inode, path, now);
            }
        }
    }

    fn persist(&self, store: &mut Store, event: ClassifiedEvent) {
        let measurement = if event.kind.has_measurement() {
            match measurement::measure(&event.path) {
                Ok(m) => Some(m),
                Err(err) => {
                    tracing::warn!(
                        code = crate::error::CCT_IO_001_MEASUREMENT_FAILED,
                        path = %event.path.display(),
                        error = %err,
                        "measurement failed, storing event without it"
                    );
                    None
                }
            }
        } else {
            None
        };

        let path_str = event.path.to_string_lossy().into_owned();
        let file_name = event
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let directory = event
            .path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();

        if let Err(err) = insert_event(
            store.connection_mut(),
            event.inode,
            event.kind,
            event.timestamp,
            &path_str,
            &file_name,
            &directory,
            measurement,
        ) {
            tracing::warn!(
                code = crate::error::CCT_STORE_001_BUSY,
                error = %err,
                "event insert failed, continuing"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_interval_is_sub_second() {
        assert!(TICK_INTERVAL < Duration::from_secs(1));
    }
}
