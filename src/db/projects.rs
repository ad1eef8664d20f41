//! Project lookups and creation.

use crate::errors::{AppError, AppResult};
use crate::models::Project;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

const PROJECT_SELECT: &str = "SELECT p.id, p.name, p.created_at,
            (SELECT MAX(te.end_time) FROM time_entries te WHERE te.project_id = p.id)
     FROM projects p";

fn map_project(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
        last_tracked_at: row.get(3)?,
    })
}

pub fn find_by_name(conn: &Connection, name: &str) -> AppResult<Option<Project>> {
    let sql = format!("{PROJECT_SELECT} WHERE p.name = ?1");
    Ok(conn.query_row(&sql, [name], map_project).optional()?)
}

pub fn find_by_id(conn: &Connection, id: i64) -> AppResult<Option<Project>> {
    let sql = format!("{PROJECT_SELECT} WHERE p.id = ?1");
    Ok(conn.query_row(&sql, [id], map_project).optional()?)
}

/// Resolve a user-supplied reference: a purely numeric value is an id, anything else a name.
pub fn resolve(conn: &Connection, id_or_name: &str) -> AppResult<Project> {
    let trimmed = id_or_name.trim();
    let found = match trimmed.parse::<i64>() {
        Ok(id) => find_by_id(conn, id)?,
        Err(_) => find_by_name(conn, trimmed)?,
    };
    found.ok_or_else(|| AppError::ProjectNotFound(trimmed.to_string()))
}

pub fn create(conn: &Connection, name: &str, now: DateTime<Utc>) -> AppResult<Project> {
    conn.execute(
        "INSERT INTO projects (name, created_at) VALUES (?1, ?2)",
        params![name, now],
    )?;

    Ok(Project {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        created_at: now,
        last_tracked_at: None,
    })
}

/// Projects are created on first use.
pub fn get_or_create(conn: &Connection, name: &str, now: DateTime<Utc>) -> AppResult<Project> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::EmptyProjectName);
    }

    match find_by_name(conn, name)? {
        Some(p) => Ok(p),
        None => create(conn, name, now),
    }
}

pub fn list_all(conn: &Connection) -> AppResult<Vec<Project>> {
    let sql = format!("{PROJECT_SELECT} ORDER BY p.name ASC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], map_project)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Delete a project; entries and pauses go with it through the FK cascade.
pub fn delete(conn: &Connection, id: i64) -> AppResult<usize> {
    Ok(conn.execute("DELETE FROM projects WHERE id = ?1", [id])?)
}
