//! C6: query engine.
//!
//! Two presentation modes share one row shape:
//!
//! - `All`: every event, newest first, ordered by `(timestamp DESC, id DESC)`.
//! - `LatestPerFile`: reduce to the newest event per file *first*, by
//!   `MAX(id)` grouped over `file_id` with no kind filter applied, and only
//!   then apply the kind filter to that reduced set. Filtering before
//!   reducing would silently hide a file whose latest event is an excluded
//!   kind even though an earlier, included-kind event exists — the opposite
//!   of what "latest per file, of these kinds" means.

use crate::cache::QueryMode;
use crate::keyword::KeywordFilter;
use crate::model::{EventKind, EventRecord, Measurement};
use rusqlite::Connection;
use std::collections::HashSet;

pub struct QueryParams<'a> {
    pub mode: QueryMode,
    /// Empty means "no kind filter" (all six kinds visible).
    pub kinds: &'a HashSet<EventKind>,
    pub keyword: &'a KeywordFilter,
    pub limit: Option<usize>,
    /// Rows to skip before `limit` is applied, for paged reads (§4.5).
    pub offset: usize,
}

/// Run a paged `(limit, offset)` read. The whole read — mode reduction,
/// kind filter, keyword filter, and paging — happens inside one read
/// transaction, so the page reflects a single stable snapshot even if the
/// collector writes concurrently.
pub fn run_query(conn: &Connection, params: &QueryParams) -> rusqlite::Result<Vec<EventRecord>> {
    let txn = conn.unchecked_transaction()?;
    let mut rows = fetch_filtered(&txn, params.mode, params.kinds, params.keyword)?;

    if params.offset > 0 {
        if params.offset >= rows.len() {
            rows.clear();
        } else {
            rows.drain(0..params.offset);
        }
    }

    if let Some(limit) = params.limit {
        rows.truncate(limit);
    }

    Ok(rows)
}

/// Count of events matching the mode/kind/keyword filters, ignoring paging —
/// what the viewer compares its loaded-row count against to decide
/// `has-more-data` (§4.5, §4.7).
pub fn count_matching(conn: &Connection, params: &QueryParams) -> rusqlite::Result<usize> {
    let txn = conn.unchecked_transaction()?;
    Ok(fetch_filtered(&txn, params.mode, params.kinds, params.keyword)?.len())
}

fn fetch_filtered(
    conn: &Connection,
    mode: QueryMode,
    kinds: &HashSet<EventKind>,
    keyword: &KeywordFilter,
) -> rusqlite::Result<Vec<EventRecord>> {
    let mut rows = match mode {
        QueryMode::All => fetch_all(conn, kinds)?,
        QueryMode::LatestPerFile => fetch_latest_per_file(conn, kinds)?,
    };
    if !keyword.is_empty() {
        rows.retain(|r| keyword.matches(&r.file_name, &r.directory));
    }
    Ok(rows)
}

const ROW_COLUMNS: &str = "e.id, e.timestamp, e.kind_id, e.file_id, e.path, e.file_name, e.directory,
         m.size_bytes, m.line_count, m.block_count, m.is_binary";

fn fetch_all(conn: &Connection, kinds: &HashSet<EventKind>) -> rusqlite::Result<Vec<EventRecord>> {
    if kinds.is_empty() {
        let sql = format!(
            "SELECT {ROW_COLUMNS}
             FROM events e LEFT JOIN measurements m ON m.event_id = e.id
             ORDER BY e.timestamp DESC, e.id DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_event)?;
        rows.collect()
    } else {
        let placeholders = kind_placeholders(kinds.len());
        let sql = format!(
            "SELECT {ROW_COLUMNS}
             FROM events e LEFT JOIN measurements m ON m.event_id = e.id
             WHERE e.kind_id IN ({placeholders})
             ORDER BY e.timestamp DESC, e.id DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let ids = kind_ids(kinds);
        let rows = stmt.query_map(rusqlite::params_from_iter(ids.iter()), row_to_event)?;
        rows.collect()
    }
}

fn fetch_latest_per_file(
    conn: &Connection,
    kinds: &HashSet<EventKind>,
) -> rusqlite::Result<Vec<EventRecord>> {
    let base_sql = format!(
        "SELECT {ROW_COLUMNS}
         FROM events e
         LEFT JOIN measurements m ON m.event_id = e.id
         WHERE e.id IN (SELECT MAX(id) FROM events GROUP BY file_id)"
    );

    let mut rows: Vec<EventRecord> = if kinds.is_empty() {
        let sql = format!("{base_sql} ORDER BY e.timestamp DESC, e.id DESC");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_event)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
    } else {
        // Kind filter applies to the already-reduced latest-per-file set,
        // not to `events` before reduction.
        let placeholders = kind_placeholders(kinds.len());
        let sql = format!(
            "{base_sql} AND e.kind_id IN ({placeholders}) ORDER BY e.timestamp DESC, e.id DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let ids = kind_ids(kinds);
        let rows = stmt.query_map(rusqlite::params_from_iter(ids.iter()), row_to_event)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
    };

    rows.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
    Ok(rows)
}

fn kind_ids(kinds: &HashSet<EventKind>) -> Vec<i64> {
    kinds.iter().map(|k| k.id()).collect()
}

fn kind_placeholders(n: usize) -> String {
    std::iter::repeat("?").take(n).collect::<Vec<_>>().join(",")
}

fn row_to_event(row: &rusqlite::Row) -> rusqlite::Result<EventRecord> {
    let kind_id: i64 = row.get(2)?;
    let kind = EventKind::from_id(kind_id).unwrap_or(EventKind::Modify);
    let size_bytes: Option<i64> = row.get(7)?;
    let measurement = size_bytes.map(|size_bytes| Measurement {
        size_bytes: size_bytes as u64,
        line_count: row.get::<_, i64>(8).unwrap_or(0) as u64,
        block_count: row.get::<_, i64>(9).unwrap_or(0) as u64,
        is_binary: row.get::<_, bool>(10).unwrap_or(false),
    });
    Ok(EventRecord {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        kind,
        file_id: row.get(3)?,
        path: row.get(4)?,
        file_name: row.get(5)?,
        directory: row.get(6)?,
        measurement,
    })
}

/// Total event count, ignoring filters — used by the viewer's status line.
pub fn total_event_count(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))
}
