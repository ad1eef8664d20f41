//! Read-only aggregations behind `times`, `project ...` and `export`.

use crate::db::entries::{self, EntryFilter};
use crate::db::projects;
use crate::errors::AppResult;
use crate::models::{Project, TimeEntryWithPauses};
use crate::utils::formatting::or_dash;
use crate::utils::table::Table;
use crate::utils::{format_duration, format_local};
use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::Connection;
use serde::Serialize;

pub const TIME_HEADERS: [&str; 8] = [
    "Start Time",
    "End Time",
    "Project",
    "Category",
    "Duration",
    "Pauses",
    "Pause Time",
    "Effective Work Time",
];

/// One rendered line of a times report, shared by the table and the exports.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TimeRow {
    pub start_time: String,
    pub end_time: String,
    pub project: String,
    pub category: String,
    /// Worked plus paused time.
    pub duration: String,
    pub pauses: i64,
    pub pause_time: String,
    pub effective_work_time: String,
}

impl From<&TimeEntryWithPauses> for TimeRow {
    fn from(e: &TimeEntryWithPauses) -> Self {
        let (end_time, duration, effective) = match (e.entry.end_time, e.entry.duration) {
            (Some(end), Some(worked)) => (
                format_local(end),
                format_duration(e.gross_duration().unwrap_or(worked)),
                format_duration(worked),
            ),
            (Some(end), None) => (format_local(end), "Unknown".into(), "Unknown".into()),
            (None, _) => ("Active".into(), "In progress".into(), "In progress".into()),
        };

        let pause_time = if e.pause_count == 0 {
            "-".to_string()
        } else {
            format_duration(e.pause_time)
        };

        Self {
            start_time: format_local(e.entry.start_time),
            end_time,
            project: e.entry.project.name.clone(),
            category: or_dash(e.entry.category.as_deref()),
            duration,
            pauses: e.pause_count,
            pause_time,
            effective_work_time: effective,
        }
    }
}

impl TimeRow {
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.start_time.clone(),
            self.end_time.clone(),
            self.project.clone(),
            self.category.clone(),
            self.duration.clone(),
            self.pauses.to_string(),
            self.pause_time.clone(),
            self.effective_work_time.clone(),
        ]
    }
}

pub fn time_rows(conn: &Connection, filter: &EntryFilter) -> AppResult<Vec<TimeRow>> {
    let list = entries::list_with_pauses(conn, filter)?;
    Ok(list.iter().map(TimeRow::from).collect())
}

pub fn times_table(rows: &[TimeRow]) -> Table {
    let mut table = Table::new(TIME_HEADERS);
    for row in rows {
        table.add_row(row.cells());
    }
    table
}

pub fn projects_table(list: &[Project]) -> Table {
    let mut table = Table::new(["ID", "Name", "Created", "Last Tracked"]);
    for p in list {
        table.add_row(vec![
            p.id.to_string(),
            p.name.clone(),
            format_local(p.created_at),
            p.last_tracked_at
                .map(format_local)
                .unwrap_or_else(|| "Never".to_string()),
        ]);
    }
    table
}

pub fn project_total(
    conn: &Connection,
    id_or_name: &str,
    since: Option<DateTime<Utc>>,
) -> AppResult<(Project, TimeDelta)> {
    let project = projects::resolve(conn, id_or_name)?;
    let total = entries::total_tracked(conn, project.id, since)?;
    Ok((project, total))
}
