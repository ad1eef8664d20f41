//! Pause rows, always scoped to their owning time entry.

use crate::db::seconds_at;
use crate::errors::AppResult;
use crate::models::Pause;
use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

const PAUSE_COLUMNS: &str = "id, time_entry_id, pause_start, pause_end, duration, created_at";

fn map_pause(row: &Row) -> rusqlite::Result<Pause> {
    Ok(Pause {
        id: row.get(0)?,
        time_entry_id: row.get(1)?,
        pause_start: row.get(2)?,
        pause_end: row.get(3)?,
        duration: seconds_at(row, 4)?,
        created_at: row.get(5)?,
    })
}

pub fn insert(conn: &Connection, entry_id: i64, start: DateTime<Utc>) -> AppResult<Pause> {
    conn.execute(
        "INSERT INTO pauses (time_entry_id, pause_start, created_at) VALUES (?1, ?2, ?2)",
        params![entry_id, start],
    )?;

    Ok(Pause {
        id: conn.last_insert_rowid(),
        time_entry_id: entry_id,
        pause_start: start,
        pause_end: None,
        duration: None,
        created_at: start,
    })
}

/// The open pause of an entry, if any (at most one exists).
pub fn find_open(conn: &Connection, entry_id: i64) -> AppResult<Option<Pause>> {
    let sql = format!(
        "SELECT {PAUSE_COLUMNS} FROM pauses
         WHERE time_entry_id = ?1 AND pause_end IS NULL
         ORDER BY pause_start DESC
         LIMIT 1"
    );
    Ok(conn.query_row(&sql, [entry_id], map_pause).optional()?)
}

pub fn close(conn: &Connection, pause_id: i64, end: DateTime<Utc>, duration: TimeDelta) -> AppResult<()> {
    conn.execute(
        "UPDATE pauses SET pause_end = ?1, duration = ?2 WHERE id = ?3",
        params![end, duration.num_seconds(), pause_id],
    )?;
    Ok(())
}

pub fn list_for_entry(conn: &Connection, entry_id: i64) -> AppResult<Vec<Pause>> {
    let sql = format!(
        "SELECT {PAUSE_COLUMNS} FROM pauses WHERE time_entry_id = ?1 ORDER BY pause_start ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([entry_id], map_pause)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Sum of closed pause durations for an entry.
pub fn total_closed(conn: &Connection, entry_id: i64) -> AppResult<TimeDelta> {
    let secs: i64 = conn.query_row(
        "SELECT COALESCE(SUM(duration), 0) FROM pauses
         WHERE time_entry_id = ?1 AND pause_end IS NOT NULL",
        [entry_id],
        |r| r.get(0),
    )?;
    Ok(TimeDelta::seconds(secs))
}

pub fn count_open(conn: &Connection, entry_id: i64) -> AppResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM pauses WHERE time_entry_id = ?1 AND pause_end IS NULL",
        [entry_id],
        |r| r.get(0),
    )?)
}

pub fn delete_all(conn: &Connection) -> AppResult<usize> {
    Ok(conn.execute("DELETE FROM pauses", [])?)
}
