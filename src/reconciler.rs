//! C4: startup reconciler.
//!
//! On collector start, the store's last-known active set is compared
//! against a fresh `walkdir` scan: newly discovered files become `find`
//! events, and files the store still thinks are active but that the scan no
//! longer finds become `delete` events. Runs once at startup, before the
//! live watcher takes over.

use crate::classifier::ClassifiedEvent;
use crate::exclude::ExcludeFilter;
use crate::model::EventKind;
use std::collections::HashMap;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// inode -> path, as currently persisted active in the store.
pub type ActiveFileSet = HashMap<u64, PathBuf>;

/// Walk `root` to depth `max_depth` (unbounded if `None`), skipping anything
/// matched by `exclude`, and reconcile against `previously_active`.
///
/// Returns one `find` per newly discovered file and one `delete` per file
/// `previously_active` no longer has on disk.
pub fn reconcile(
    root: &Path,
    max_depth: Option<usize>,
    exclude: &ExcludeFilter,
    previously_active: &ActiveFileSet,
    now_ms: i64,
) -> std::io::Result<Vec<ClassifiedEvent>> {
    let mut found: HashMap<u64, PathBuf> = HashMap::new();

    let mut walker = WalkDir::new(root);
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }

    for entry in walker.into_iter().filter_entry(|e| !exclude.is_excluded(e.path())) {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if exclude.is_excluded(entry.path()) {
            continue;
        }
        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };
        found.insert(metadata.ino(), entry.path().to_path_buf());
    }

    let mut events = Vec::new();

    for (inode, path) in &found {
        if !previously_active.contains_key(inode) {
            events.push(ClassifiedEvent {
                kind: EventKind::Find,
                inode: *inode,
                path: path.clone(),
                timestamp: now_ms,
            });
        }
    }

    for (inode, path) in previously_active {
        if !found.contains_key(inode) {
            events.push(ClassifiedEvent {
                kind: EventKind::Delete,
                inode: *inode,
                path: path.clone(),
                timestamp: now_ms,
            });
        }
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newly_discovered_file_is_find() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hi").unwrap();
        let exclude = ExcludeFilter::new(&[]);
        let events = reconcile(dir.path(), None, &exclude, &ActiveFileSet::new(), 0).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Find);
    }

    #[test]
    fn previously_active_file_now_missing_is_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut previously_active = ActiveFileSet::new();
        previously_active.insert(12345, dir.path().join("gone.txt"));
        let exclude = ExcludeFilter::new(&[]);
        let events = reconcile(dir.path(), None, &exclude, &previously_active, 0).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Delete);
        assert_eq!(events[0].inode, 12345);
    }

    #[test]
    fn file_present_in_both_sets_emits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("steady.txt");
        std::fs::write(&file_path, b"hi").unwrap();
        let inode = std::fs::metadata(&file_path).unwrap().ino();

        let mut previously_active = ActiveFileSet::new();
        previously_active.insert(inode, file_path);
        let exclude = ExcludeFilter::new(&[]);
        let events = reconcile(dir.path(), None, &exclude, &previously_active, 0).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn excluded_paths_are_skipped_during_reconciliation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("target")).unwrap();
        std::fs::write(dir.path().join("target").join("built.bin"), b"x").unwrap();
        let exclude = ExcludeFilter::new(&["**/target/**".to_string()]);
        let events = reconcile(dir.path(), None, &exclude, &ActiveFileSet::new(), 0).unwrap();
        assert!(events.is_empty());
    }
}
