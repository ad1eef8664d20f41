//! Time entry persistence and the aggregate queries used by reports.

use crate::db::{ENTRY_COLUMNS, seconds_at};
use crate::errors::AppResult;
use crate::models::{Project, SortOrder, TimeEntry, TimeEntryWithPauses};
use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::types::ToSql;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

/// Aggregate of all pauses per entry; open pauses count but add no duration.
const PAUSE_STATS: &str = "LEFT JOIN (
        SELECT time_entry_id, COUNT(*) AS cnt, COALESCE(SUM(duration), 0) AS total
        FROM pauses
        GROUP BY time_entry_id
    ) ps ON ps.time_entry_id = te.id";

fn map_entry(row: &Row) -> rusqlite::Result<TimeEntry> {
    let project = Project {
        id: row.get(7)?,
        name: row.get(8)?,
        created_at: row.get(9)?,
        last_tracked_at: None,
    };

    Ok(TimeEntry {
        id: row.get(0)?,
        project_id: row.get(1)?,
        project,
        start_time: row.get(2)?,
        end_time: row.get(3)?,
        duration: seconds_at(row, 4)?,
        category: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub fn insert(
    conn: &Connection,
    project: &Project,
    start: DateTime<Utc>,
    category: Option<&str>,
) -> AppResult<TimeEntry> {
    conn.execute(
        "INSERT INTO time_entries (project_id, start_time, category, created_at)
         VALUES (?1, ?2, ?3, ?2)",
        params![project.id, start, category],
    )?;

    Ok(TimeEntry {
        id: conn.last_insert_rowid(),
        project_id: project.id,
        project: project.clone(),
        start_time: start,
        end_time: None,
        duration: None,
        category: category.map(str::to_string),
        created_at: start,
    })
}

pub fn find_by_id(conn: &Connection, id: i64) -> AppResult<Option<TimeEntry>> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM time_entries te
         JOIN projects p ON p.id = te.project_id
         WHERE te.id = ?1"
    );
    Ok(conn.query_row(&sql, [id], map_entry).optional()?)
}

/// The entry with no end time. Absence is not an error.
pub fn find_active(conn: &Connection) -> AppResult<Option<TimeEntry>> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM time_entries te
         JOIN projects p ON p.id = te.project_id
         WHERE te.end_time IS NULL
         ORDER BY te.start_time DESC
         LIMIT 1"
    );
    Ok(conn.query_row(&sql, [], map_entry).optional()?)
}

pub fn count_active(conn: &Connection) -> AppResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM time_entries WHERE end_time IS NULL",
        [],
        |r| r.get(0),
    )?)
}

/// Set end time and worked duration. Only touches entries that are still open.
pub fn close(conn: &Connection, id: i64, end: DateTime<Utc>, worked: TimeDelta) -> AppResult<usize> {
    Ok(conn.execute(
        "UPDATE time_entries SET end_time = ?1, duration = ?2
         WHERE id = ?3 AND end_time IS NULL",
        params![end, worked.num_seconds(), id],
    )?)
}

/// Filters shared by `times`, `project times` and the exports.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub project_id: Option<i64>,
    pub category: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub sort: SortOrder,
    pub limit: Option<usize>,
}

pub fn list_with_pauses(conn: &Connection, filter: &EntryFilter) -> AppResult<Vec<TimeEntryWithPauses>> {
    let mut sql = format!(
        "SELECT {ENTRY_COLUMNS}, COALESCE(ps.cnt, 0), COALESCE(ps.total, 0)
         FROM time_entries te
         JOIN projects p ON p.id = te.project_id
         {PAUSE_STATS}
         WHERE 1 = 1"
    );
    let mut args: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(pid) = filter.project_id {
        args.push(Box::new(pid));
        sql.push_str(&format!(" AND te.project_id = ?{}", args.len()));
    }
    if let Some(cat) = &filter.category {
        args.push(Box::new(cat.clone()));
        sql.push_str(&format!(" AND te.category = ?{}", args.len()));
    }
    if let Some(since) = filter.since {
        args.push(Box::new(since));
        sql.push_str(&format!(" AND te.start_time >= ?{}", args.len()));
    }

    sql.push_str(&format!(" ORDER BY te.start_time {}", filter.sort.as_sql()));

    if let Some(limit) = filter.limit {
        args.push(Box::new(limit as i64));
        sql.push_str(&format!(" LIMIT ?{}", args.len()));
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
        Ok(TimeEntryWithPauses {
            entry: map_entry(row)?,
            pause_count: row.get(10)?,
            pause_time: TimeDelta::seconds(row.get::<_, i64>(11)?),
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Gross tracked time (worked + paused) over the closed entries of one project.
pub fn total_tracked(
    conn: &Connection,
    project_id: i64,
    since: Option<DateTime<Utc>>,
) -> AppResult<TimeDelta> {
    let secs: i64 = conn.query_row(
        &format!(
            "SELECT COALESCE(SUM(te.duration + COALESCE(ps.total, 0)), 0)
             FROM time_entries te
             {PAUSE_STATS}
             WHERE te.project_id = ?1
               AND te.end_time IS NOT NULL
               AND (?2 IS NULL OR te.start_time >= ?2)"
        ),
        params![project_id, since],
        |r| r.get(0),
    )?;
    Ok(TimeDelta::seconds(secs))
}

pub fn categories(conn: &Connection) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT category FROM time_entries
         WHERE category IS NOT NULL AND category <> ''
         ORDER BY category ASC",
    )?;
    let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn delete_all(conn: &Connection) -> AppResult<usize> {
    Ok(conn.execute("DELETE FROM time_entries", [])?)
}
