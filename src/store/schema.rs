//! DDL for the activity store: five content tables, one version table, and
//! the triggers that keep `aggregates` in sync with every event/measurement
//! insert so query time never has to scan `events` to compute totals.

use rusqlite::Connection;

/// Bumped whenever the DDL below changes incompatibly. Checked against
/// `schema_meta` on every open; a mismatch is a [`crate::error::FatalError::SchemaMismatch`].
pub const SCHEMA_VERSION: i64 = 1;

pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_meta (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS event_types (
            id   INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );

        INSERT OR IGNORE INTO event_types (id, name) VALUES
            (1, 'find'),
            (2, 'create'),
            (3, 'modify'),
            (4, 'delete'),
            (5, 'move'),
            (6, 'restore');

        CREATE TABLE IF NOT EXISTS files (
            id        INTEGER PRIMARY KEY,
            inode     INTEGER NOT NULL UNIQUE,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS events (
            id        INTEGER PRIMARY KEY,
            timestamp INTEGER NOT NULL,
            kind_id   INTEGER NOT NULL REFERENCES event_types(id),
            file_id   INTEGER NOT NULL REFERENCES files(id),
            path      TEXT NOT NULL,
            file_name TEXT NOT NULL,
            directory TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events (timestamp DESC, id DESC);
        CREATE INDEX IF NOT EXISTS idx_events_file_id ON events (file_id, id DESC);
        CREATE INDEX IF NOT EXISTS idx_events_kind_id ON events (kind_id);

        CREATE TABLE IF NOT EXISTS measurements (
            event_id    INTEGER PRIMARY KEY REFERENCES events(id),
            size_bytes  INTEGER NOT NULL,
            line_count  INTEGER NOT NULL,
            block_count INTEGER NOT NULL,
            is_binary   INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS aggregates (
            file_id               INTEGER PRIMARY KEY REFERENCES files(id),
            find_count            INTEGER NOT NULL DEFAULT 0,
            create_count          INTEGER NOT NULL DEFAULT 0,
            modify_count          INTEGER NOT NULL DEFAULT 0,
            delete_count          INTEGER NOT NULL DEFAULT 0,
            move_count            INTEGER NOT NULL DEFAULT 0,
            restore_count         INTEGER NOT NULL DEFAULT 0,
            first_event_timestamp INTEGER NOT NULL,
            last_event_timestamp  INTEGER NOT NULL,
            size_min              INTEGER,
            size_first            INTEGER,
            size_last             INTEGER
        );

        CREATE TRIGGER IF NOT EXISTS trg_events_aggregate_insert
        AFTER INSERT ON events
        BEGIN
            INSERT INTO aggregates (
                file_id, find_count, create_count, modify_count,
                delete_count, move_count, restore_count,
                first_event_timestamp, last_event_timestamp,
                size_min, size_first, size_last
            )
            VALUES (
                NEW.file_id, 0, 0, 0, 0, 0, 0,
                NEW.timestamp, NEW.timestamp,
                NULL, NULL, NULL
            )
            ON CONFLICT(file_id) DO UPDATE SET
                last_event_timestamp = NEW.timestamp;

            UPDATE aggregates SET
                find_count    = find_count    + (NEW.kind_id = 1),
                create_count  = create_count  + (NEW.kind_id = 2),
                modify_count  = modify_count  + (NEW.kind_id = 3),
                delete_count  = delete_count  + (NEW.kind_id = 4),
                move_count    = move_count    + (NEW.kind_id = 5),
                restore_count = restore_count + (NEW.kind_id = 6)
            WHERE file_id = NEW.file_id;
        END;

        CREATE TRIGGER IF NOT EXISTS trg_measurements_aggregate_insert
        AFTER INSERT ON measurements
        BEGIN
            UPDATE aggregates SET
                size_first = COALESCE(size_first, NEW.size_bytes),
                size_last  = NEW.size_bytes,
                size_min   = CASE
                    WHEN size_min IS NULL OR NEW.size_bytes < size_min THEN NEW.size_bytes
                    ELSE size_min
                END
            WHERE file_id = (SELECT file_id FROM events WHERE id = NEW.event_id);
        END;
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

/// Read the persisted schema version, if any table has been created yet.
pub fn stored_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_meta')",
        [],
        |row| row.get(0),
    )?;
    if !exists {
        return Ok(None);
    }
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'schema_version'",
        [],
        |row| row.get::<_, String>(0),
    )
    .map(|v| v.parse::<i64>().ok())
    .or(Ok(None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        let version = stored_schema_version(&conn).unwrap();
        assert_eq!(version, Some(SCHEMA_VERSION));
    }

    #[test]
    fn event_types_are_seeded() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM event_types", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 6);
    }

    #[test]
    fn fresh_database_has_no_version() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(stored_schema_version(&conn).unwrap(), None);
    }
}
