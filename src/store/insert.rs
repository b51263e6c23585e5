//! Transactional insert path: the only way new rows enter the store.
//!
//! A single event (and optional measurement) is written inside one
//! transaction so a crash mid-write never leaves a dangling measurement or
//! an aggregate update without its event.

use crate::model::{EventKind, EventRecord, Measurement};
use rusqlite::{params, Connection, TransactionBehavior};

/// Look up the file row for `inode`, creating it (active) if this is the
/// first time this inode has been seen.
fn ensure_file(conn: &Connection, inode: u64) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO files (inode, is_active) VALUES (?1, 1)
         ON CONFLICT(inode) DO NOTHING",
        params![inode as i64],
    )?;
    conn.query_row(
        "SELECT id FROM files WHERE inode = ?1",
        params![inode as i64],
        |row| row.get(0),
    )
}

/// Insert one event, updating `files.is_active` per [`EventKind::leaves_active`]
/// and writing a measurement row when the kind carries one.
pub fn insert_event(
    conn: &mut Connection,
    inode: u64,
    kind: EventKind,
    timestamp: i64,
    path: &str,
    file_name: &str,
    directory: &str,
    measurement: Option<Measurement>,
) -> rusqlite::Result<EventRecord> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let file_id = ensure_file(&tx, inode)?;

    tx.execute(
        "UPDATE files SET is_active = ?1 WHERE id = ?2",
        params![kind.leaves_active(), file_id],
    )?;

    tx.execute(
        "INSERT INTO events (timestamp, kind_id, file_id, path, file_name, directory)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![timestamp, kind.id(), file_id, path, file_name, directory],
    )?;
    let event_id = tx.last_insert_rowid();

    if let Some(m) = measurement {
        tx.execute(
            "INSERT INTO measurements (event_id, size_bytes, line_count, block_count, is_binary)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event_id,
                m.size_bytes as i64,
                m.line_count as i64,
                m.block_count as i64,
                m.is_binary,
            ],
        )?;
    }

    tx.commit()?;

    Ok(EventRecord {
        id: event_id,
        timestamp,
        kind,
        file_id,
        path: path.to_string(),
        file_name: file_name.to_string(),
        directory: directory.to_string(),
        measurement,
    })
}
