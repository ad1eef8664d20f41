//! Pause intervals of a single time entry.

use crate::db::pauses;
use crate::errors::{AppError, AppResult};
use crate::models::Pause;
use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::Connection;

pub struct PauseLedger<'a> {
    conn: &'a Connection,
    entry_id: i64,
}

impl<'a> PauseLedger<'a> {
    pub fn for_entry(conn: &'a Connection, entry_id: i64) -> Self {
        Self { conn, entry_id }
    }

    pub fn open_pause(&self) -> AppResult<Option<Pause>> {
        pauses::find_open(self.conn, self.entry_id)
    }

    /// Open a new pause. Fails if one is already open.
    pub fn begin(&self, at: DateTime<Utc>) -> AppResult<Pause> {
        if self.open_pause()?.is_some() {
            return Err(AppError::AlreadyPaused);
        }
        pauses::insert(self.conn, self.entry_id, at)
    }

    /// Close the open pause. Fails if there is none.
    pub fn end(&self, at: DateTime<Utc>) -> AppResult<Pause> {
        self.close_open(at)?.ok_or(AppError::NoActivePause)
    }

    /// Close the open pause if there is one.
    pub fn close_open(&self, at: DateTime<Utc>) -> AppResult<Option<Pause>> {
        let Some(mut pause) = self.open_pause()? else {
            return Ok(None);
        };

        let duration = (at - pause.pause_start).max(TimeDelta::zero());
        pauses::close(self.conn, pause.id, at, duration)?;

        pause.pause_end = Some(at);
        pause.duration = Some(TimeDelta::seconds(duration.num_seconds()));
        Ok(Some(pause))
    }

    /// Aggregate of the closed pauses.
    pub fn total_paused(&self) -> AppResult<TimeDelta> {
        pauses::total_closed(self.conn, self.entry_id)
    }
}
