//! C3/C6: the activity store.
//!
//! One writer connection (held by the collector) and any number of reader
//! connections (held by the viewer), matching the single-writer/multi-reader
//! discipline described for this schema. Every connection opens in WAL mode
//! so readers never block on the writer's transaction.

pub mod insert;
pub mod query;
pub mod schema;

use crate::config::CollectorConfig;
use crate::error::FatalError;
use rusqlite::Connection;
use std::path::Path;

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if absent) the database at `path`, apply pragmas for
    /// durability, and verify/establish the schema.
    ///
    /// A schema-version mismatch or detected corruption is a
    /// [`FatalError`]; per the propagation rule, this is the only error kind
    /// in this module allowed to end the collector process.
    pub fn open(path: &Path) -> Result<Self, FatalError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FatalError::Corrupt {
                message: format!("failed to create database directory: {e}"),
            })?;
        }
        let conn = Connection::open(path).map_err(|e| FatalError::Corrupt {
            message: format!("failed to open database: {e}"),
        })?;
        Self::configure_pragmas(&conn)?;
        Self::verify_or_init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open for read-only access (the viewer never writes).
    pub fn open_read_only(path: &Path) -> Result<Self, FatalError> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| FatalError::Corrupt {
            message: format!("failed to open database read-only: {e}"),
        })?;
        Self::verify_schema_exists(&conn)?;
        Ok(Self { conn })
    }

    fn configure_pragmas(conn: &Connection) -> Result<(), FatalError> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(|e| FatalError::Corrupt {
            message: format!("failed to configure database: {e}"),
        })?;
        Ok(())
    }

    fn verify_or_init_schema(conn: &Connection) -> Result<(), FatalError> {
        match schema::stored_schema_version(conn) {
            Ok(None) => {
                schema::ensure_schema(conn).map_err(|e| FatalError::Corrupt {
                    message: format!("failed to initialize schema: {e}"),
                })?;
                Ok(())
            }
            Ok(Some(version)) if version == schema::SCHEMA_VERSION => {
                schema::ensure_schema(conn).map_err(|e| FatalError::Corrupt {
                    message: format!("failed to re-assert schema: {e}"),
                })?;
                Ok(())
            }
            Ok(Some(version)) => Err(FatalError::SchemaMismatch {
                message: format!(
                    "database schema version {version} does not match expected {}",
                    schema::SCHEMA_VERSION
                ),
            }),
            Err(e) => Err(FatalError::Corrupt {
                message: format!("failed to read schema version: {e}"),
            }),
        }
    }

    fn verify_schema_exists(conn: &Connection) -> Result<(), FatalError> {
        match schema::stored_schema_version(conn) {
            Ok(Some(version)) if version == schema::SCHEMA_VERSION => Ok(()),
            Ok(Some(version)) => Err(FatalError::SchemaMismatch {
                message: format!(
                    "database schema version {version} does not match expected {}",
                    schema::SCHEMA_VERSION
                ),
            }),
            Ok(None) => Err(FatalError::Corrupt {
                message: "database has no activity schema; has the collector run yet?".to_string(),
            }),
            Err(e) => Err(FatalError::Corrupt {
                message: format!("failed to read schema version: {e}"),
            }),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

/// Convenience: open the store at the path named in a [`CollectorConfig`].
pub fn open_for_collector(config: &CollectorConfig) -> Result<Store, FatalError> {
    Store::open(&config.db_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_schema_on_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.db");
        let store = Store::open(&path).unwrap();
        let version = schema::stored_schema_version(store.connection()).unwrap();
        assert_eq!(version, Some(schema::SCHEMA_VERSION));
    }

    #[test]
    fn reopen_on_existing_schema_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.db");
        let _ = Store::open(&path).unwrap();
        let reopened = Store::open(&path);
        assert!(reopened.is_ok());
    }

    #[test]
    fn read_only_open_requires_existing_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.db");
        let result = Store::open_read_only(&path);
        assert!(result.is_err());
    }

    #[test]
    fn read_only_open_succeeds_after_writer_initializes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.db");
        let _writer = Store::open(&path).unwrap();
        let reader = Store::open_read_only(&path);
        assert!(reader.is_ok());
    }
}
