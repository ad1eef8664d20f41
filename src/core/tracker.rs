//! Session state machine: one active time entry system-wide, at most one
//! open pause per entry.

use crate::core::category::validate_category;
use crate::core::clock::{Clock, SystemClock};
use crate::core::ledger::PauseLedger;
use crate::db::pool::DbPool;
use crate::db::{entries, projects};
use crate::errors::{AppError, AppResult};
use crate::models::{Pause, TimeEntry};
use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Elapsed wall time minus paused time, never negative.
pub fn worked_duration(start: DateTime<Utc>, end: DateTime<Utc>, paused: TimeDelta) -> TimeDelta {
    (end - start - paused).max(TimeDelta::zero())
}

/// Snapshot of the active session for `status`.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub entry: TimeEntry,
    pub open_pause: Option<Pause>,
    pub paused: TimeDelta,
    pub worked: TimeDelta,
}

impl SessionStatus {
    pub fn is_paused(&self) -> bool {
        self.open_pause.is_some()
    }
}

/// Shared by the daemon threads, hence the mutex around the connection.
pub struct SessionTracker {
    pool: Mutex<DbPool>,
    clock: Arc<dyn Clock>,
}

impl SessionTracker {
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool: Mutex::new(pool),
            clock,
        }
    }

    /// Open the database at `path` with the system clock.
    pub fn open(path: &Path) -> AppResult<Self> {
        Ok(Self::new(DbPool::open(path)?, Arc::new(SystemClock)))
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    fn pool(&self) -> MutexGuard<'_, DbPool> {
        self.pool.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read-only access for reports.
    pub fn with_conn<F, T>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T>,
    {
        f(&self.pool().conn)
    }

    /// Release the database connection.
    pub fn close(self) -> AppResult<()> {
        self.pool
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .close()
    }

    pub fn start(&self, project: &str, force: bool, category: Option<&str>) -> AppResult<TimeEntry> {
        if let Some(cat) = category {
            validate_category(cat)?;
        }

        let now = self.clock.now();
        let entry = self.pool().with_transaction(|tx| {
            if let Some(active) = entries::find_active(tx)? {
                if !force {
                    return Err(AppError::AlreadyActive(active.project.name));
                }
                let closed = close_entry(tx, active, now)?;
                info!(
                    project = %closed.project.name,
                    worked_secs = closed.duration.map(|d| d.num_seconds()),
                    "Active session closed by forced start"
                );
            }

            let project = projects::get_or_create(tx, project, now)?;
            entries::insert(tx, &project, now, category)
        })?;

        info!(project = %entry.project.name, entry_id = entry.id, "Session started");
        Ok(entry)
    }

    /// Stop the active session, closing a dangling pause first.
    pub fn stop(&self) -> AppResult<TimeEntry> {
        let now = self.clock.now();
        let entry = self.pool().with_transaction(|tx| {
            let active = entries::find_active(tx)?.ok_or(AppError::NoActiveSession)?;
            close_entry(tx, active, now)
        })?;

        info!(
            project = %entry.project.name,
            worked_secs = entry.duration.map(|d| d.num_seconds()),
            "Session stopped"
        );
        Ok(entry)
    }

    /// Stop the active session only while `pause_id` is still its open pause.
    ///
    /// Returns `None` when the pause was closed in the meantime, so a watcher
    /// that fires late has no effect.
    pub fn stop_paused(&self, pause_id: i64) -> AppResult<Option<TimeEntry>> {
        let now = self.clock.now();
        self.pool().with_transaction(|tx| {
            let Some(active) = entries::find_active(tx)? else {
                return Ok(None);
            };
            let open = PauseLedger::for_entry(tx, active.id).open_pause()?;
            match open {
                Some(p) if p.id == pause_id => close_entry(tx, active, now).map(Some),
                _ => {
                    debug!(pause_id, "Watched pause no longer open, nothing to stop");
                    Ok(None)
                }
            }
        })
    }

    /// Stop the active session only if it is `entry_id`.
    pub fn stop_entry(&self, entry_id: i64) -> AppResult<Option<TimeEntry>> {
        let now = self.clock.now();
        self.pool().with_transaction(|tx| match entries::find_active(tx)? {
            Some(active) if active.id == entry_id => close_entry(tx, active, now).map(Some),
            _ => Ok(None),
        })
    }

    pub fn pause(&self) -> AppResult<Pause> {
        let now = self.clock.now();
        let pause = self.pool().with_transaction(|tx| {
            let active = entries::find_active(tx)?.ok_or(AppError::NoActiveSession)?;
            PauseLedger::for_entry(tx, active.id).begin(now)
        })?;

        info!(entry_id = pause.time_entry_id, pause_id = pause.id, "Session paused");
        Ok(pause)
    }

    /// Close the open pause of the active session.
    pub fn resume(&self) -> AppResult<Pause> {
        let now = self.clock.now();
        let pause = self.pool().with_transaction(|tx| {
            let active = entries::find_active(tx)?.ok_or(AppError::NoActiveSession)?;
            PauseLedger::for_entry(tx, active.id).end(now)
        })?;

        info!(
            entry_id = pause.time_entry_id,
            paused_secs = pause.duration.map(|d| d.num_seconds()),
            "Session continued"
        );
        Ok(pause)
    }

    pub fn active_entry(&self) -> AppResult<Option<TimeEntry>> {
        entries::find_active(&self.pool().conn)
    }

    pub fn open_pause(&self) -> AppResult<Option<Pause>> {
        let pool = self.pool();
        match entries::find_active(&pool.conn)? {
            Some(active) => PauseLedger::for_entry(&pool.conn, active.id).open_pause(),
            None => Ok(None),
        }
    }

    pub fn status(&self) -> AppResult<Option<SessionStatus>> {
        let now = self.clock.now();
        let pool = self.pool();
        let Some(entry) = entries::find_active(&pool.conn)? else {
            return Ok(None);
        };

        let ledger = PauseLedger::for_entry(&pool.conn, entry.id);
        let open_pause = ledger.open_pause()?;
        let running = open_pause
            .as_ref()
            .map(|p| p.elapsed(now))
            .unwrap_or_else(TimeDelta::zero);
        let paused = ledger.total_paused()? + running;
        let worked = worked_duration(entry.start_time, now, paused);

        Ok(Some(SessionStatus {
            entry,
            open_pause,
            paused,
            worked,
        }))
    }

    /// Delete every entry and pause. Projects survive.
    pub fn clear_all(&self, force: bool) -> AppResult<(usize, usize)> {
        self.pool().with_transaction(|tx| {
            if !force && let Some(active) = entries::find_active(tx)? {
                return Err(AppError::AlreadyActive(active.project.name));
            }
            let pauses = crate::db::pauses::delete_all(tx)?;
            let entries = entries::delete_all(tx)?;
            Ok((entries, pauses))
        })
    }

    pub fn remove_project(&self, id_or_name: &str) -> AppResult<crate::models::Project> {
        self.pool().with_transaction(|tx| {
            let project = projects::resolve(tx, id_or_name)?;
            projects::delete(tx, project.id)?;
            Ok(project)
        })
    }
}

/// Close the open pause, sum the closed ones and persist end + worked time.
fn close_entry(conn: &Connection, mut entry: TimeEntry, now: DateTime<Utc>) -> AppResult<TimeEntry> {
    let ledger = PauseLedger::for_entry(conn, entry.id);
    ledger.close_open(now)?;
    let paused = ledger.total_paused()?;
    let worked = worked_duration(entry.start_time, now, paused);

    entries::close(conn, entry.id, now, worked)?;

    entry.end_time = Some(now);
    entry.duration = Some(TimeDelta::seconds(worked.num_seconds()));
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::db::pauses;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
    }

    fn tracker() -> (SessionTracker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(t0()));
        let pool = DbPool::open_in_memory().unwrap();
        (SessionTracker::new(pool, clock.clone()), clock)
    }

    fn active_count(t: &SessionTracker) -> i64 {
        t.with_conn(entries::count_active).unwrap()
    }

    #[test]
    fn second_start_is_rejected_with_project_name() {
        let (t, _) = tracker();
        t.start("alpha", false, None).unwrap();

        let err = t.start("beta", false, None).unwrap_err();
        assert!(matches!(err, AppError::AlreadyActive(ref p) if p == "alpha"));
        assert_eq!(active_count(&t), 1);
    }

    #[test]
    fn forced_start_closes_prior_session_with_real_duration() {
        let (t, clock) = tracker();
        let a = t.start("alpha", false, None).unwrap();
        clock.advance(TimeDelta::minutes(30));

        let b = t.start("beta", true, None).unwrap();
        assert_eq!(active_count(&t), 1);
        assert_eq!(t.active_entry().unwrap().unwrap().id, b.id);

        let closed = t.with_conn(|c| entries::find_by_id(c, a.id)).unwrap().unwrap();
        assert_eq!(closed.end_time, Some(t0() + TimeDelta::minutes(30)));
        assert_eq!(closed.duration, Some(TimeDelta::minutes(30)));
    }

    #[test]
    fn pause_accounting_round_trip() {
        let (t, clock) = tracker();
        t.start("alpha", false, Some("dev")).unwrap();

        clock.advance(TimeDelta::minutes(10));
        t.pause().unwrap();
        clock.advance(TimeDelta::minutes(5));
        t.resume().unwrap();
        clock.advance(TimeDelta::minutes(20));
        t.pause().unwrap();
        clock.advance(TimeDelta::minutes(7));
        t.resume().unwrap();
        clock.advance(TimeDelta::minutes(3));

        let entry = t.stop().unwrap();
        // 45 elapsed, 12 paused
        assert_eq!(entry.duration, Some(TimeDelta::minutes(33)));
        assert_eq!(entry.category.as_deref(), Some("dev"));

        let recorded = t.with_conn(|c| pauses::list_for_entry(c, entry.id)).unwrap();
        let lengths: Vec<_> = recorded.iter().map(|p| p.duration).collect();
        assert_eq!(lengths, vec![Some(TimeDelta::minutes(5)), Some(TimeDelta::minutes(7))]);
    }

    #[test]
    fn stop_closes_dangling_pause() {
        let (t, clock) = tracker();
        let entry = t.start("alpha", false, None).unwrap();
        clock.advance(TimeDelta::minutes(10));
        t.pause().unwrap();
        clock.advance(TimeDelta::minutes(15));

        let stopped = t.stop().unwrap();
        assert_eq!(stopped.duration, Some(TimeDelta::minutes(10)));

        let open = t.with_conn(|c| pauses::count_open(c, entry.id)).unwrap();
        assert_eq!(open, 0);
    }

    #[test]
    fn worked_duration_never_negative() {
        let (t, clock) = tracker();
        let entry = t.start("alpha", false, None).unwrap();
        clock.advance(TimeDelta::minutes(5));

        // a pause longer than the whole session
        t.with_conn(|c| {
            let p = pauses::insert(c, entry.id, t0())?;
            pauses::close(c, p.id, t0() + TimeDelta::hours(2), TimeDelta::hours(2))
        })
        .unwrap();

        let stopped = t.stop().unwrap();
        assert_eq!(stopped.duration, Some(TimeDelta::zero()));
    }

    #[test]
    fn pause_and_continue_guard_their_preconditions() {
        let (t, _) = tracker();
        assert!(matches!(t.pause(), Err(AppError::NoActiveSession)));
        assert!(matches!(t.resume(), Err(AppError::NoActiveSession)));
        assert!(matches!(t.stop(), Err(AppError::NoActiveSession)));

        let entry = t.start("alpha", false, None).unwrap();
        assert!(matches!(t.resume(), Err(AppError::NoActivePause)));

        t.pause().unwrap();
        assert!(matches!(t.pause(), Err(AppError::AlreadyPaused)));
        let open = t.with_conn(|c| pauses::count_open(c, entry.id)).unwrap();
        assert_eq!(open, 1);
    }

    #[test]
    fn stop_paused_ignores_a_pause_that_already_ended() {
        let (t, clock) = tracker();
        t.start("alpha", false, None).unwrap();
        let first = t.pause().unwrap();
        clock.advance(TimeDelta::minutes(1));
        t.resume().unwrap();

        assert!(t.stop_paused(first.id).unwrap().is_none());
        assert!(t.active_entry().unwrap().is_some());

        let second = t.pause().unwrap();
        clock.advance(TimeDelta::minutes(2));
        let stopped = t.stop_paused(second.id).unwrap().unwrap();
        assert_eq!(stopped.duration, Some(TimeDelta::zero()));
        assert!(t.active_entry().unwrap().is_none());
    }

    #[test]
    fn stop_entry_leaves_someone_elses_session_alone() {
        let (t, clock) = tracker();
        let a = t.start("alpha", false, None).unwrap();
        clock.advance(TimeDelta::minutes(5));
        let b = t.start("beta", true, None).unwrap();

        assert!(t.stop_entry(a.id).unwrap().is_none());
        assert_eq!(t.active_entry().unwrap().unwrap().id, b.id);

        clock.advance(TimeDelta::minutes(10));
        let stopped = t.stop_entry(b.id).unwrap().unwrap();
        assert_eq!(stopped.duration, Some(TimeDelta::minutes(10)));
        assert_eq!(active_count(&t), 0);
    }

    #[test]
    fn status_counts_the_running_pause() {
        let (t, clock) = tracker();
        t.start("alpha", false, None).unwrap();
        clock.advance(TimeDelta::minutes(20));
        t.pause().unwrap();
        clock.advance(TimeDelta::minutes(5));

        let status = t.status().unwrap().unwrap();
        assert!(status.is_paused());
        assert_eq!(status.paused, TimeDelta::minutes(5));
        assert_eq!(status.worked, TimeDelta::minutes(20));
    }

    #[test]
    fn invalid_category_rejected_before_insert() {
        let (t, _) = tracker();
        assert!(matches!(
            t.start("alpha", false, Some("bad tag")),
            Err(AppError::InvalidCategory(_))
        ));
        assert!(t.active_entry().unwrap().is_none());
    }

    #[test]
    fn clear_refuses_while_active_unless_forced() {
        let (t, _) = tracker();
        t.start("alpha", false, None).unwrap();
        t.pause().unwrap();

        assert!(matches!(t.clear_all(false), Err(AppError::AlreadyActive(_))));
        assert_eq!(t.clear_all(true).unwrap(), (1, 1));
        assert!(t.active_entry().unwrap().is_none());
    }

    #[test]
    fn killed_daemon_leaves_session_open_until_manual_stop() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("rhora.db");

        {
            let t = SessionTracker::open(&db).unwrap();
            t.start("alpha", false, None).unwrap();
            t.pause().unwrap();
            // dropped without any shutdown handling
        }

        let t = SessionTracker::open(&db).unwrap();
        let status = t.status().unwrap().unwrap();
        assert_eq!(status.entry.project.name, "alpha");
        assert!(status.is_paused());

        let stopped = t.stop().unwrap();
        assert!(stopped.end_time.is_some());
        assert!(t.open_pause().unwrap().is_none());
    }
}
