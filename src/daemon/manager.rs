//! Lifecycle of the background tracker as seen from a foreground command.

use crate::config::Config;
use crate::daemon::marker::{FileMarker, PidMarker};
use crate::daemon::process::{Detached, ProcessControl, ProcessDetacher, system_process_control};
use crate::errors::{AppError, AppResult};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const STOP_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The daemon removed its own marker.
    Clean,
    /// The daemon did not clean up in time; the marker was removed here.
    MarkerForced,
}

pub struct DaemonManager {
    marker: Arc<dyn PidMarker>,
    process: Box<dyn ProcessControl>,
    poll_interval: Duration,
    stop_timeout: Duration,
}

impl DaemonManager {
    pub fn new(marker: Arc<dyn PidMarker>, process: Box<dyn ProcessControl>) -> Self {
        Self {
            marker,
            process,
            poll_interval: POLL_INTERVAL,
            stop_timeout: STOP_TIMEOUT,
        }
    }

    pub fn with_timing(mut self, poll_interval: Duration, stop_timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.stop_timeout = stop_timeout;
        self
    }

    pub fn for_config(cfg: &Config) -> Self {
        Self::new(
            Arc::new(FileMarker::new(cfg.marker_file())),
            system_process_control(),
        )
    }

    pub fn marker(&self) -> Arc<dyn PidMarker> {
        Arc::clone(&self.marker)
    }

    /// Pid of a live daemon. A stale or unreadable marker means "not running".
    pub fn running_pid(&self) -> Option<i32> {
        match self.marker.read() {
            Ok(Some(pid)) if self.process.is_alive(pid) => Some(pid),
            Ok(Some(pid)) => {
                debug!(pid, "Stale tracker marker");
                None
            }
            Ok(None) => None,
            Err(e) => {
                debug!(error = %e, "Unreadable tracker marker");
                None
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running_pid().is_some()
    }

    /// Remove a marker whose process is gone or whose content is garbage.
    /// Returns true when something was removed.
    pub fn clear_stale(&self) -> AppResult<bool> {
        let stale = match self.marker.read() {
            Ok(Some(pid)) => !self.process.is_alive(pid),
            Ok(None) => false,
            Err(_) => true,
        };
        if stale {
            self.marker.clear()?;
            info!("Stale tracker marker removed");
        }
        Ok(stale)
    }

    /// Stop the running daemon, if any, so a new one can take over.
    ///
    /// Fails while the previous process is still alive after the stop
    /// attempt. Its marker is put back so it stays tracked.
    pub fn replace_running(&self) -> AppResult<Option<StopOutcome>> {
        let Some(pid) = self.running_pid() else {
            self.clear_stale()?;
            return Ok(None);
        };

        let outcome = self.stop();
        if !self.wait_for_exit(pid) {
            if !self.marker.exists() {
                self.marker.write(pid)?;
            }
            return Err(AppError::Daemon(format!(
                "previous background tracker (pid {}) is still running",
                pid
            )));
        }

        match outcome {
            Ok(o) => Ok(Some(o)),
            Err(e) => {
                debug!(pid, error = %e, "Previous tracker exited on its own");
                self.marker.clear()?;
                Ok(Some(StopOutcome::MarkerForced))
            }
        }
    }

    fn wait_for_exit(&self, pid: i32) -> bool {
        let deadline = Instant::now() + self.stop_timeout;
        while self.process.is_alive(pid) {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(self.poll_interval);
        }
        true
    }

    /// Detach a background copy and record its pid.
    pub fn daemonize(&self, detacher: &dyn ProcessDetacher) -> AppResult<Detached> {
        let detached = detacher.detach()?;
        if let Detached::Parent { child_pid } = detached {
            let pid = i32::try_from(child_pid)
                .map_err(|_| AppError::Daemon(format!("pid {} out of range", child_pid)))?;
            self.marker.write(pid)?;
            info!(pid, "Background tracker detached");
        }
        Ok(detached)
    }

    /// Signal the daemon and wait for it to remove its marker.
    pub fn stop(&self) -> AppResult<StopOutcome> {
        let pid = self.marker.read()?.ok_or(AppError::DaemonNotRunning)?;

        if let Err(e) = self.process.terminate(pid) {
            if !self.process.is_alive(pid) {
                self.marker.clear()?;
            }
            return Err(e);
        }
        debug!(pid, "Termination requested");

        let deadline = Instant::now() + self.stop_timeout;
        while Instant::now() < deadline {
            if !self.marker.exists() {
                info!(pid, "Background tracker stopped");
                return Ok(StopOutcome::Clean);
            }
            thread::sleep(self.poll_interval);
        }

        if !self.marker.exists() {
            return Ok(StopOutcome::Clean);
        }

        warn!(pid, "Background tracker did not clean up in time, removing marker");
        self.marker.clear()?;
        Ok(StopOutcome::MarkerForced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::marker::MemoryMarker;
    use crate::daemon::process::NoopDetacher;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Pretend processes. `cooperative` ones remove the marker when terminated.
    struct FakeProcesses {
        alive: Mutex<HashSet<i32>>,
        cooperative: bool,
        marker: Arc<MemoryMarker>,
    }

    impl ProcessControl for FakeProcesses {
        fn is_alive(&self, pid: i32) -> bool {
            self.alive.lock().unwrap().contains(&pid)
        }

        fn terminate(&self, pid: i32) -> AppResult<()> {
            if !self.alive.lock().unwrap().contains(&pid) {
                return Err(AppError::Daemon(format!("no such process {}", pid)));
            }
            if self.cooperative {
                self.alive.lock().unwrap().remove(&pid);
                self.marker.clear()?;
            }
            Ok(())
        }
    }

    struct FixedDetacher(u32);

    impl ProcessDetacher for FixedDetacher {
        fn detach(&self) -> AppResult<Detached> {
            Ok(Detached::Parent { child_pid: self.0 })
        }
    }

    fn manager(marker: Arc<MemoryMarker>, alive: &[i32], cooperative: bool) -> DaemonManager {
        let process = FakeProcesses {
            alive: Mutex::new(alive.iter().copied().collect()),
            cooperative,
            marker: Arc::clone(&marker),
        };
        DaemonManager::new(marker, Box::new(process))
            .with_timing(Duration::from_millis(5), Duration::from_millis(50))
    }

    #[test]
    fn stale_marker_is_not_running() {
        let marker = Arc::new(MemoryMarker::with_pid(777));
        let m = manager(marker, &[], true);
        assert!(!m.is_running());
        assert_eq!(m.running_pid(), None);
    }

    #[test]
    fn live_marker_is_running() {
        let marker = Arc::new(MemoryMarker::with_pid(777));
        let m = manager(marker, &[777], true);
        assert_eq!(m.running_pid(), Some(777));
    }

    #[test]
    fn stop_without_marker_is_an_error() {
        let m = manager(Arc::new(MemoryMarker::default()), &[], true);
        assert!(matches!(m.stop(), Err(AppError::DaemonNotRunning)));
    }

    #[test]
    fn cooperative_daemon_stops_cleanly() {
        let marker = Arc::new(MemoryMarker::with_pid(10));
        let m = manager(marker.clone(), &[10], true);
        assert_eq!(m.stop().unwrap(), StopOutcome::Clean);
        assert!(!marker.exists());
    }

    #[test]
    fn stuck_daemon_gets_its_marker_removed() {
        let marker = Arc::new(MemoryMarker::with_pid(10));
        let m = manager(marker.clone(), &[10], false);
        assert_eq!(m.stop().unwrap(), StopOutcome::MarkerForced);
        assert!(!marker.exists());
    }

    #[test]
    fn signalling_a_dead_daemon_fails_and_drops_stale_marker() {
        let marker = Arc::new(MemoryMarker::with_pid(99));
        let m = manager(marker.clone(), &[], true);
        assert!(m.stop().is_err());
        assert!(!marker.exists());
    }

    #[test]
    fn replacing_a_stuck_daemon_is_refused_and_keeps_it_tracked() {
        let marker = Arc::new(MemoryMarker::with_pid(10));
        let m = manager(marker.clone(), &[10], false);

        assert!(matches!(m.replace_running(), Err(AppError::Daemon(_))));
        assert_eq!(marker.read().unwrap(), Some(10));
        assert_eq!(m.running_pid(), Some(10));
    }

    #[test]
    fn replacing_a_cooperative_daemon_succeeds() {
        let marker = Arc::new(MemoryMarker::with_pid(10));
        let m = manager(marker.clone(), &[10], true);

        assert_eq!(m.replace_running().unwrap(), Some(StopOutcome::Clean));
        assert!(!marker.exists());
    }

    #[test]
    fn replacing_nothing_drops_a_stale_marker() {
        let marker = Arc::new(MemoryMarker::with_pid(99));
        let m = manager(marker.clone(), &[], true);

        assert_eq!(m.replace_running().unwrap(), None);
        assert!(!marker.exists());
    }

    #[test]
    fn clear_stale_keeps_a_live_marker() {
        let marker = Arc::new(MemoryMarker::with_pid(10));
        let m = manager(marker.clone(), &[10], true);
        assert!(!m.clear_stale().unwrap());
        assert_eq!(marker.read().unwrap(), Some(10));

        let marker = Arc::new(MemoryMarker::with_pid(11));
        let m = manager(marker.clone(), &[10], true);
        assert!(m.clear_stale().unwrap());
        assert!(!marker.exists());

        let m = manager(Arc::new(MemoryMarker::default()), &[], true);
        assert!(!m.clear_stale().unwrap());
    }

    #[test]
    fn daemonize_records_child_pid() {
        let marker = Arc::new(MemoryMarker::default());
        let m = manager(marker.clone(), &[], true);

        let out = m.daemonize(&FixedDetacher(4321)).unwrap();
        assert_eq!(out, Detached::Parent { child_pid: 4321 });
        assert_eq!(marker.read().unwrap(), Some(4321));
    }

    #[test]
    fn unsupported_platform_writes_no_marker() {
        let marker = Arc::new(MemoryMarker::default());
        let m = manager(marker.clone(), &[], true);

        assert_eq!(m.daemonize(&NoopDetacher).unwrap(), Detached::Unsupported);
        assert!(!marker.exists());
    }
}
