pub mod entries;
pub mod migrate;
pub mod pauses;
pub mod pool;
pub mod projects;

use rusqlite::Row;

/// Column list shared by every query returning a project-joined time entry.
pub(crate) const ENTRY_COLUMNS: &str = "te.id, te.project_id, te.start_time, te.end_time, te.duration, \
     te.category, te.created_at, p.id, p.name, p.created_at";

/// Read an optional duration stored as whole seconds.
pub(crate) fn seconds_at(row: &Row, idx: usize) -> rusqlite::Result<Option<chrono::TimeDelta>> {
    let secs: Option<i64> = row.get(idx)?;
    Ok(secs.map(chrono::TimeDelta::seconds))
}
