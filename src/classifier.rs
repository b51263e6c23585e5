//! C2: event classifier.
//!
//! Raw filesystem signals (add/modify/remove, by inode) are turned into the
//! six semantic event kinds. Two coalescing maps, both keyed by inode and
//! drained by [`Classifier::tick`], give the classifier a notion of time
//! without pulling in an async runtime:
//!
//! - `pending_deletes`: a remove waits out `move_window_ms` before becoming a
//!   real `delete`, in case a matching add for the same inode arrives first
//!   (a `move`).
//! - `debounced_modifies`: repeated modifies to the same inode collapse into
//!   one `modify`, emitted `debounce_ms` after the *last* one seen.

use crate::model::EventKind;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEvent {
    pub kind: EventKind,
    pub inode: u64,
    pub path: PathBuf,
    pub timestamp: i64,
}

struct PendingDelete {
    path: PathBuf,
    removed_at: i64,
}

struct DebouncedModify {
    path: PathBuf,
    last_seen: i64,
}

pub struct Classifier {
    move_window_ms: i64,
    debounce_ms: i64,
    pending_deletes: HashMap<u64, PendingDelete>,
    debounced_modifies: HashMap<u64, DebouncedModify>,
    /// Last known activity state per inode, so a reappearing inode can be
    /// told apart from a genuinely new one (`restore` vs `create`).
    known_active: HashMap<u64, bool>,
    /// Paths with a recorded delete that hasn't since been re-occupied.
    /// Lets a brand-new inode landing on a previously-deleted path classify
    /// as `restore` rather than `create` (§4.2).
    deleted_paths: std::collections::HashSet<PathBuf>,
}

impl Classifier {
    pub fn new(move_window_ms: u64, debounce_ms: u64) -> Self {
        Self {
            move_window_ms: move_window_ms as i64,
            debounce_ms: debounce_ms as i64,
            pending_deletes: HashMap::new(),
            debounced_modifies: HashMap::new(),
            known_active: HashMap::new(),
            deleted_paths: std::collections::HashSet::new(),
        }
    }

    /// Seed activity state from the store at startup, so the first event for
    /// a previously-known inode classifies correctly.
    pub fn seed_known_active(&mut self, inode: u64, is_active: bool) {
        self.known_active.insert(inode, is_active);
    }

    /// Seed a path as having a prior, unresolved delete, so a later `restore`
    /// is recognized even if it lands on a brand-new inode.
    pub fn seed_deleted_path(&mut self, path: PathBuf) {
        self.deleted_paths.insert(path);
    }

    /// A path came into existence (notify create, or first stat during a
    /// walk). Pairs with a pending delete of the same inode as a `move`.
    pub fn on_added(&mut self, inode: u64, path: PathBuf, now_ms: i64) -> ClassifiedEvent {
        let kind = if let Some(pending) = self.pending_deletes.remove(&inode) {
            let _ = pending;
            EventKind::Move
        } else if matches!(self.known_active.get(&inode), Some(false)) || self.deleted_paths.contains(&path) {
            EventKind::Restore
        } else {
            EventKind::Create
        };
        self.known_active.insert(inode, true);
        self.deleted_paths.remove(&path);
        ClassifiedEvent {
            kind,
            inode,
            path,
            timestamp: now_ms,
        }
    }

    /// A path's content changed. Does not emit immediately; coalesced by
    /// [`Classifier::tick`].
    pub fn on_modified(&mut self, inode: u64, path: PathBuf, now_ms: i64) {
        self.debounced_modifies
            .entry(inode)
            .and_modify(|m| {
                m.last_seen = now_ms;
                m.path = path.clone();
            })
            .or_insert(DebouncedModify {
                path,
                last_seen: now_ms,
            });
    }

    /// A path was removed. Does not emit immediately; becomes a `delete` via
    /// [`Classifier::tick`] unless a matching add arrives first.
    pub fn on_removed(&mut self, inode: u64, path: PathBuf, now_ms: i64) {
        self.pending_deletes.insert(
            inode,
            PendingDelete {
                path,
                removed_at: now_ms,
            },
        );
    }

    /// Drain anything whose waiting window has elapsed as of `now_ms`.
    /// Must be called periodically (the daemon's main loop tick) for
    /// deletes and coalesced modifies to ever surface.
    pub fn tick(&mut self, now_ms: i64) -> Vec<ClassifiedEvent> {
        let mut emitted = Vec::new();

        let expired: Vec<u64> = self
            .pending_deletes
            .iter()
            .filter(|(_, p)| now_ms - p.removed_at >= self.move_window_ms)
            .map(|(inode, _)| *inode)
            .collect();
        for inode in expired {
            if let Some(pending) = self.pending_deletes.remove(&inode) {
                self.known_active.insert(inode, false);
                self.deleted_paths.insert(pending.path.clone());
                emitted.push(ClassifiedEvent {
                    kind: EventKind::Delete,
                    inode,
                    path: pending.path,
                    timestamp: pending.removed_at,
                });
            }
        }

        let quiet: Vec<u64> = self
            .debounced_modifies
            .iter()
            .filter(|(_, m)| now_ms - m.last_seen >= self.debounce_ms)
            .map(|(inode, _)| *inode)
            .collect();
        for inode in quiet {
            if let Some(modified) = self.debounced_modifies.remove(&inode) {
                emitted.push(ClassifiedEvent {
                    kind: EventKind::Modify,
                    inode,
                    path: modified.path,
                    timestamp: modified.last_seen,
                });
            }
        }

        emitted
    }

    pub fn has_pending_work(&self) -> bool {
        !self.pending_deletes.is_empty() || !self.debounced_modifies.is_empty()
    }

    /// Force-emit everything still waiting, regardless of elapsed time.
    /// Used on graceful shutdown so a debounced modify or an unconfirmed
    /// delete sitting in its window isn't silently dropped.
    pub fn drain_all(&mut self) -> Vec<ClassifiedEvent> {
        let mut emitted = Vec::new();
        for (inode, pending) in self.pending_deletes.drain() {
            self.known_active.insert(inode, false);
            self.deleted_paths.insert(pending.path.clone());
            emitted.push(ClassifiedEvent {
                kind: EventKind::Delete,
                inode,
                path: pending.path,
                timestamp: pending.removed_at,
            });
        }
        for (inode, modified) in self.debounced_modifies.drain() {
            emitted.push(ClassifiedEvent {
                kind: EventKind::Modify,
                inode,
                path: modified.path,
                timestamp: modified.last_seen,
            });
        }
        emitted
    }
}
