//! Clean exit path of the background tracker: close the session, drop the marker.

use crate::core::tracker::SessionTracker;
use crate::daemon::marker::PidMarker;
use crate::daemon::monitor::PauseMonitor;
use std::process;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct ShutdownCoordinator {
    tracker: Arc<SessionTracker>,
    marker: Arc<dyn PidMarker>,
    monitor: PauseMonitor,
    entry_id: i64,
    pid: i32,
}

impl ShutdownCoordinator {
    /// `entry_id` is the session this tracker started; no other session is touched.
    pub fn new(
        tracker: Arc<SessionTracker>,
        marker: Arc<dyn PidMarker>,
        monitor: PauseMonitor,
        entry_id: i64,
    ) -> Self {
        Self {
            tracker,
            marker,
            monitor,
            entry_id,
            pid: process::id() as i32,
        }
    }

    /// Pid this coordinator considers its own marker value.
    pub fn with_pid(mut self, pid: i32) -> Self {
        self.pid = pid;
        self
    }

    /// Never fails: there is no caller left to report to, so problems are logged.
    pub fn shutdown(&self) {
        self.monitor.cancel();

        match self.tracker.stop_entry(self.entry_id) {
            Ok(Some(entry)) => info!(
                project = %entry.project.name,
                worked_secs = entry.duration.map(|d| d.num_seconds()),
                "Active session stopped on shutdown"
            ),
            Ok(None) => info!(entry_id = self.entry_id, "Own session no longer active on shutdown"),
            Err(e) => error!(error = %e, "Failed to stop active session on shutdown"),
        }

        release_marker(self.marker.as_ref(), self.pid);
    }
}

/// Remove the marker unless a newer tracker has already taken it over.
pub(crate) fn release_marker(marker: &dyn PidMarker, pid: i32) {
    if let Ok(Some(owner)) = marker.read()
        && owner != pid
    {
        warn!(owner, pid, "Marker belongs to another tracker, leaving it");
        return;
    }

    match marker.clear() {
        Ok(()) => info!(pid, "Tracker marker removed"),
        Err(e) => error!(error = %e, "Failed to remove tracker marker"),
    }
}

/// Forward SIGTERM / SIGINT as an exit request.
#[cfg(unix)]
pub fn spawn_signal_listener(
    exit_tx: std::sync::mpsc::Sender<super::DaemonExit>,
) -> crate::errors::AppResult<std::thread::JoinHandle<()>> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGTERM, SIGINT])?;
    let handle = std::thread::Builder::new()
        .name("signals".into())
        .spawn(move || {
            if let Some(sig) = signals.forever().next() {
                info!(signal = sig, "Termination signal received");
                let _ = exit_tx.send(super::DaemonExit::Signal(sig));
            }
        })?;
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::daemon::marker::MemoryMarker;
    use crate::daemon::monitor::{MonitorSettings, MonitorState};
    use crate::db::pool::DbPool;
    use chrono::{TimeDelta, TimeZone, Utc};
    use std::time::Duration;

    fn settings() -> MonitorSettings {
        MonitorSettings {
            enabled: true,
            limit: TimeDelta::hours(2),
            tick: Duration::from_secs(3600),
        }
    }

    struct Fixture {
        tracker: Arc<SessionTracker>,
        marker: Arc<MemoryMarker>,
        monitor: PauseMonitor,
        clock: Arc<ManualClock>,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap(),
        ));
        let tracker = Arc::new(SessionTracker::new(
            DbPool::open_in_memory().unwrap(),
            clock.clone(),
        ));
        Fixture {
            tracker,
            marker: Arc::new(MemoryMarker::with_pid(500)),
            monitor: PauseMonitor::new(settings(), clock.clone(), |_| {}),
            clock,
        }
    }

    fn coordinator(f: &Fixture, entry_id: i64) -> ShutdownCoordinator {
        ShutdownCoordinator::new(f.tracker.clone(), f.marker.clone(), f.monitor.clone(), entry_id)
            .with_pid(500)
    }

    #[test]
    fn stops_paused_session_and_removes_marker() {
        let f = fixture();
        let entry = f.tracker.start("alpha", false, None).unwrap();
        f.clock.advance(TimeDelta::minutes(40));
        let pause = f.tracker.pause().unwrap();
        f.monitor.start(pause.id, pause.pause_start);
        f.clock.advance(TimeDelta::minutes(5));

        coordinator(&f, entry.id).shutdown();

        assert!(f.tracker.active_entry().unwrap().is_none());
        assert!(!f.marker.exists());
        assert!(matches!(f.monitor.state(), MonitorState::Cancelled { .. }));
    }

    #[test]
    fn without_session_still_removes_marker() {
        let f = fixture();
        coordinator(&f, 1).shutdown();
        assert!(!f.marker.exists());
    }

    #[test]
    fn leaves_a_marker_owned_by_another_tracker() {
        let f = fixture();
        f.marker.write(501).unwrap();
        coordinator(&f, 1).shutdown();
        assert_eq!(f.marker.read().unwrap(), Some(501));
    }

    #[test]
    fn late_exit_of_a_replaced_tracker_spares_the_new_session() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("rhora.db");
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap(),
        ));

        let old = Arc::new(SessionTracker::new(DbPool::open(&db).unwrap(), clock.clone()));
        let alpha = old.start("alpha", false, None).unwrap();

        // the replacement took over the marker and force-started its own session
        let marker = Arc::new(MemoryMarker::with_pid(200));
        let new = SessionTracker::new(DbPool::open(&db).unwrap(), clock.clone());
        clock.advance(TimeDelta::minutes(15));
        let beta = new.start("beta", true, None).unwrap();

        let monitor = PauseMonitor::new(settings(), clock.clone(), |_| {});
        ShutdownCoordinator::new(old.clone(), marker.clone(), monitor, alpha.id)
            .with_pid(100)
            .shutdown();

        assert_eq!(marker.read().unwrap(), Some(200));
        let active = new.active_entry().unwrap().unwrap();
        assert_eq!(active.id, beta.id);
        assert_eq!(active.project.name, "beta");
    }

    #[cfg(unix)]
    #[test]
    fn sigterm_is_forwarded_as_exit_request() {
        use crate::daemon::DaemonExit;
        use nix::sys::signal::{Signal, raise};
        use signal_hook::consts::SIGTERM;
        use std::sync::mpsc;

        let (tx, rx) = mpsc::channel();
        spawn_signal_listener(tx).unwrap();
        raise(Signal::SIGTERM).unwrap();

        let exit = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(exit, DaemonExit::Signal(SIGTERM));
    }
}
