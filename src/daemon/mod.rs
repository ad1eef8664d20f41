//! Background tracker: a detached copy of the program that pauses the
//! session while the screen is locked.

pub mod bridge;
pub mod lock_source;
pub mod manager;
pub mod marker;
pub mod monitor;
pub mod process;
pub mod shutdown;

use crate::core::tracker::SessionTracker;
use crate::errors::{AppError, AppResult};
use crate::models::TimeEntry;
use bridge::{LockEvent, ScreenLockBridge};
use lock_source::LockEventSource;
use marker::PidMarker;
use monitor::{MonitorSettings, PauseMonitor};
use shutdown::ShutdownCoordinator;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info};

/// Why the daemon main loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonExit {
    Signal(i32),
    PauseLimitReached,
}

/// Exit requests for the main loop. Exists before the session starts, so a
/// termination signal that arrives during startup is not lost.
pub struct ExitChannel {
    tx: Sender<DaemonExit>,
    rx: Receiver<DaemonExit>,
}

impl ExitChannel {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<DaemonExit> {
        self.tx.clone()
    }

    /// Turn SIGTERM / SIGINT into exit requests instead of the default action.
    #[cfg(unix)]
    pub fn listen_for_signals(&self) -> AppResult<()> {
        shutdown::spawn_signal_listener(self.sender())?;
        Ok(())
    }
}

impl Default for ExitChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Body of the background copy: listen for signals, start the session with
/// `begin`, then host it until an exit request arrives.
pub fn serve<F>(
    tracker: Arc<SessionTracker>,
    marker: Arc<dyn PidMarker>,
    settings: MonitorSettings,
    source: Option<Box<dyn LockEventSource>>,
    begin: F,
) -> AppResult<DaemonExit>
where
    F: FnOnce(&SessionTracker) -> AppResult<TimeEntry>,
{
    let exit = ExitChannel::new();
    #[cfg(unix)]
    exit.listen_for_signals()?;

    let entry = match begin(tracker.as_ref()) {
        Ok(entry) => entry,
        Err(e) => {
            error!(error = %e, "Could not start session, background tracker exiting");
            shutdown::release_marker(marker.as_ref(), std::process::id() as i32);
            return Err(e);
        }
    };

    run(tracker, entry.id, marker, settings, source, exit)
}

/// Host the bridge and the pause monitor for session `entry_id` until an
/// exit request arrives, then shut down cleanly.
pub fn run(
    tracker: Arc<SessionTracker>,
    entry_id: i64,
    marker: Arc<dyn PidMarker>,
    settings: MonitorSettings,
    source: Option<Box<dyn LockEventSource>>,
    exit: ExitChannel,
) -> AppResult<DaemonExit> {
    let ExitChannel {
        tx: exit_tx,
        rx: exit_rx,
    } = exit;

    let monitor = {
        let tracker = Arc::clone(&tracker);
        PauseMonitor::new(settings, tracker.clock(), move |pause_id| {
            expire(&tracker, &exit_tx, pause_id)
        })
    };
    let coordinator =
        ShutdownCoordinator::new(Arc::clone(&tracker), marker, monitor.clone(), entry_id);

    let (event_tx, event_rx) = mpsc::channel::<LockEvent>();
    let bridge = ScreenLockBridge::new(Arc::clone(&tracker), monitor);
    thread::Builder::new()
        .name("lock-bridge".into())
        .spawn(move || bridge.run(event_rx))?;

    match source {
        Some(source) => {
            let name = source.name();
            thread::Builder::new()
                .name(format!("lock-source-{}", name))
                .spawn(move || {
                    if let Err(e) = source.run(event_tx) {
                        error!(source = name, error = %e, "Lock event source stopped");
                    }
                })?;
        }
        None => info!("Screen lock notifications are not available on this platform"),
    }

    info!(pid = std::process::id(), entry_id, "Background tracker running");
    let received = exit_rx.recv();
    info!(exit = ?received, "Background tracker shutting down");

    coordinator.shutdown();
    received.map_err(|_| AppError::Daemon("control channel closed unexpectedly".into()))
}

fn expire(tracker: &SessionTracker, exit_tx: &Sender<DaemonExit>, pause_id: i64) {
    match tracker.stop_paused(pause_id) {
        Ok(Some(entry)) => {
            info!(
                project = %entry.project.name,
                worked_secs = entry.duration.map(|d| d.num_seconds()),
                "Session auto-stopped after long pause"
            );
            let _ = exit_tx.send(DaemonExit::PauseLimitReached);
        }
        Ok(None) => debug!(pause_id, "Pause ended before the limit took effect"),
        Err(e) => error!(error = %e, "Auto-stop failed"),
    }
}
