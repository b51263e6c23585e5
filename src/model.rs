//! Shared data model for the activity store.
//!
//! Mirrors the five-table schema owned by [`crate::store`]: event kinds, files,
//! events, measurements, and aggregates. Kept separate from the store module so
//! the classifier, reconciler, and query engine can share these types without
//! depending on rusqlite directly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the six semantic categories of filesystem activity.
///
/// Stored with stable integer identities 1..6, in this declaration order.
/// The ids are part of the database's external contract (see `cctop::store::schema`)
/// and must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum EventKind {
    Find,
    Create,
    Modify,
    Delete,
    Move,
    Restore,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Find,
        EventKind::Create,
        EventKind::Modify,
        EventKind::Delete,
        EventKind::Move,
        EventKind::Restore,
    ];

    /// Stable integer identity, 1-based, matching the `event_types` table.
    pub fn id(self) -> i64 {
        match self {
            EventKind::Find => 1,
            EventKind::Create => 2,
            EventKind::Modify => 3,
            EventKind::Delete => 4,
            EventKind::Move => 5,
            EventKind::Restore => 6,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(EventKind::Find),
            2 => Some(EventKind::Create),
            3 => Some(EventKind::Modify),
            4 => Some(EventKind::Delete),
            5 => Some(EventKind::Move),
            6 => Some(EventKind::Restore),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Find => "find",
            EventKind::Create => "create",
            EventKind::Modify => "modify",
            EventKind::Delete => "delete",
            EventKind::Move => "move",
            EventKind::Restore => "restore",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "find" => Some(EventKind::Find),
            "create" => Some(EventKind::Create),
            "modify" => Some(EventKind::Modify),
            "delete" => Some(EventKind::Delete),
            "move" => Some(EventKind::Move),
            "restore" => Some(EventKind::Restore),
            _ => None,
        }
    }

    /// True for event kinds that carry a [`Measurement`].
    pub fn has_measurement(self) -> bool {
        matches!(
            self,
            EventKind::Find | EventKind::Create | EventKind::Modify | EventKind::Restore
        )
    }

    /// True if an event of this kind leaves the file active (§3 invariant).
    pub fn leaves_active(self) -> bool {
        !matches!(self, EventKind::Delete)
    }

    /// Single-character toggle key used by the viewer's kind-filter editor (§6).
    pub fn toggle_key(self) -> char {
        match self {
            EventKind::Find => 'f',
            EventKind::Create => 'c',
            EventKind::Modify => 'm',
            EventKind::Delete => 'd',
            EventKind::Move => 'v',
            EventKind::Restore => 'r',
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// File identity row. Keyed by inode; never deleted once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRow {
    pub id: i64,
    pub inode: u64,
    pub is_active: bool,
}

/// One immutable event row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: i64,
    pub timestamp: i64,
    pub kind: EventKind,
    pub file_id: i64,
    pub path: String,
    pub file_name: String,
    pub directory: String,
    pub measurement: Option<Measurement>,
}

/// Size/lines/blocks measurement associated with a content-bearing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Measurement {
    pub size_bytes: u64,
    pub line_count: u64,
    pub block_count: u64,
    pub is_binary: bool,
}

/// Per-file running totals maintained by the store's insert triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Aggregate {
    pub file_id: i64,
    pub find_count: i64,
    pub create_count: i64,
    pub modify_count: i64,
    pub delete_count: i64,
    pub move_count: i64,
    pub restore_count: i64,
    pub first_event_timestamp: i64,
    pub last_event_timestamp: i64,
    pub size_min: i64,
    pub size_first: i64,
    pub size_last: i64,
}

impl Aggregate {
    pub fn total_events(&self) -> i64 {
        self.find_count
            + self.create_count
            + self.modify_count
            + self.delete_count
            + self.move_count
            + self.restore_count
    }

    pub fn count_for(&self, kind: EventKind) -> i64 {
        match kind {
            EventKind::Find => self.find_count,
            EventKind::Create => self.create_count,
            EventKind::Modify => self.modify_count,
            EventKind::Delete => self.delete_count,
            EventKind::Move => self.move_count,
            EventKind::Restore => self.restore_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_ids_are_stable() {
        assert_eq!(EventKind::Find.id(), 1);
        assert_eq!(EventKind::Create.id(), 2);
        assert_eq!(EventKind::Modify.id(), 3);
        assert_eq!(EventKind::Delete.id(), 4);
        assert_eq!(EventKind::Move.id(), 5);
        assert_eq!(EventKind::Restore.id(), 6);
    }

    #[test]
    fn event_kind_round_trips_through_id() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_id(kind.id()), Some(kind));
        }
    }

    #[test]
    fn measurement_presence_matches_kind() {
        assert!(EventKind::Find.has_measurement());
        assert!(EventKind::Create.has_measurement());
        assert!(EventKind::Modify.has_measurement());
        assert!(EventKind::Restore.has_measurement());
        assert!(!EventKind::Delete.has_measurement());
        assert!(!EventKind::Move.has_measurement());
    }
}
