//! Ordered schema migrations, recorded by name in the `migrations` table.

use crate::errors::{AppError, AppResult};
use rusqlite::Connection;
use std::collections::HashSet;
use tracing::info;

struct Migration {
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "001_create_projects_table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS projects (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL UNIQUE,
            created_at  TEXT NOT NULL
        );
        "#,
    },
    Migration {
        name: "002_create_time_entries_table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS time_entries (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id  INTEGER NOT NULL,
            start_time  TEXT NOT NULL,
            end_time    TEXT,
            duration    INTEGER, -- worked seconds
            created_at  TEXT NOT NULL,
            FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_time_entries_project_id ON time_entries(project_id);
        CREATE INDEX IF NOT EXISTS idx_time_entries_start_time ON time_entries(start_time);
        "#,
    },
    Migration {
        name: "003_create_pauses_table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS pauses (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            time_entry_id  INTEGER NOT NULL,
            pause_start    TEXT NOT NULL,
            pause_end      TEXT,
            duration       INTEGER, -- seconds
            created_at     TEXT NOT NULL,
            FOREIGN KEY (time_entry_id) REFERENCES time_entries(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_pauses_time_entry_id ON pauses(time_entry_id);
        CREATE INDEX IF NOT EXISTS idx_pauses_pause_start ON pauses(pause_start);
        "#,
    },
    Migration {
        name: "004_add_category_to_time_entries",
        sql: r#"
        ALTER TABLE time_entries ADD COLUMN category VARCHAR(50);
        CREATE INDEX IF NOT EXISTS idx_time_entries_category ON time_entries(category);
        "#,
    },
];

fn ensure_migrations_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS migrations (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL UNIQUE,
            applied_at  TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        "#,
    )
}

fn applied_migrations(conn: &Connection) -> rusqlite::Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT name FROM migrations")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut out = HashSet::new();
    for r in rows {
        out.insert(r?);
    }
    Ok(out)
}

fn apply(conn: &Connection, migration: &Migration) -> rusqlite::Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(migration.sql)?;
    tx.execute("INSERT INTO migrations (name) VALUES (?1)", [migration.name])?;
    tx.commit()
}

/// Public entry point: run all pending migrations in name order.
pub fn run_pending_migrations(conn: &Connection) -> AppResult<()> {
    ensure_migrations_table(conn)?;
    let applied = applied_migrations(conn)?;

    for migration in MIGRATIONS {
        if applied.contains(migration.name) {
            continue;
        }

        apply(conn, migration)
            .map_err(|e| AppError::Migration(format!("{}: {}", migration.name, e)))?;
        info!(migration = migration.name, "Migration applied");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_pending_migrations(&conn).unwrap();
        run_pending_migrations(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count as usize, MIGRATIONS.len());

        // category column exists after 004
        conn.execute(
            "INSERT INTO projects (name, created_at) VALUES ('p', '2025-01-01 00:00:00+00:00')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO time_entries (project_id, start_time, created_at, category)
             VALUES (1, '2025-01-01 00:00:00+00:00', '2025-01-01 00:00:00+00:00', 'dev')",
            [],
        )
        .unwrap();
    }
}
