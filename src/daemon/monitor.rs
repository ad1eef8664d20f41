//! Pause-duration watcher: forces the session to stop when a pause runs
//! past the configured limit.
//!
//! At most one watcher exists. Starting a new one cancels the previous
//! one, and a watcher only fires if it still owns the slot when the limit
//! is reached.

use crate::config::Config;
use crate::core::clock::Clock;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const DEFAULT_TICK: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
pub struct MonitorSettings {
    pub enabled: bool,
    pub limit: TimeDelta,
    pub tick: Duration,
}

impl MonitorSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            enabled: cfg.background_tracker_auto_stop,
            limit: TimeDelta::minutes(i64::from(cfg.background_tracker_auto_stop_after)),
            tick: DEFAULT_TICK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Watching { pause_id: i64 },
    Expired { pause_id: i64 },
    Cancelled { pause_id: i64 },
}

struct Watcher {
    generation: u64,
    pause_id: i64,
    cancel_tx: Sender<()>,
}

struct Slot {
    current: Option<Watcher>,
    next_generation: u64,
    state: MonitorState,
}

type ExpireAction = dyn Fn(i64) + Send + Sync;

struct Inner {
    settings: MonitorSettings,
    clock: Arc<dyn Clock>,
    on_expire: Box<ExpireAction>,
    slot: Mutex<Slot>,
}

#[derive(Clone)]
pub struct PauseMonitor {
    inner: Arc<Inner>,
}

impl PauseMonitor {
    /// `on_expire` receives the id of the pause that ran too long.
    pub fn new<F>(settings: MonitorSettings, clock: Arc<dyn Clock>, on_expire: F) -> Self
    where
        F: Fn(i64) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                settings,
                clock,
                on_expire: Box::new(on_expire),
                slot: Mutex::new(Slot {
                    current: None,
                    next_generation: 0,
                    state: MonitorState::Idle,
                }),
            }),
        }
    }

    /// Watch `pause_id`, replacing any running watcher. Returns false when auto-stop is off.
    pub fn start(&self, pause_id: i64, started_at: DateTime<Utc>) -> bool {
        if !self.inner.settings.enabled {
            debug!(pause_id, "Auto-stop disabled, pause not watched");
            return false;
        }

        let (cancel_tx, cancel_rx) = mpsc::channel();
        let generation = {
            let mut slot = self.inner.slot();
            if let Some(prev) = slot.current.take() {
                let _ = prev.cancel_tx.send(());
                debug!(pause_id = prev.pause_id, "Previous watcher replaced");
            }
            let generation = slot.next_generation;
            slot.next_generation += 1;
            slot.current = Some(Watcher {
                generation,
                pause_id,
                cancel_tx,
            });
            slot.state = MonitorState::Watching { pause_id };
            generation
        };

        let inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name("pause-monitor".into())
            .spawn(move || inner.watch(generation, pause_id, started_at, cancel_rx));

        if let Err(e) = spawned {
            error!(error = %e, pause_id, "Failed to spawn pause monitor");
            let mut slot = self.inner.slot();
            if slot.current.as_ref().is_some_and(|w| w.generation == generation) {
                slot.current = None;
                slot.state = MonitorState::Idle;
            }
            return false;
        }

        info!(
            pause_id,
            limit_mins = self.inner.settings.limit.num_minutes(),
            "Watching pause"
        );
        true
    }

    /// Cancel the running watcher. Returns false when nothing was watched.
    pub fn cancel(&self) -> bool {
        let mut slot = self.inner.slot();
        match slot.current.take() {
            Some(w) => {
                let _ = w.cancel_tx.send(());
                slot.state = MonitorState::Cancelled {
                    pause_id: w.pause_id,
                };
                debug!(pause_id = w.pause_id, "Pause watcher cancelled");
                true
            }
            None => false,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.inner.slot().state
    }

    pub fn is_watching(&self) -> bool {
        matches!(self.state(), MonitorState::Watching { .. })
    }
}

impl Inner {
    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn watch(&self, generation: u64, pause_id: i64, started_at: DateTime<Utc>, cancel_rx: Receiver<()>) {
        loop {
            match cancel_rx.recv_timeout(self.settings.tick) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
            }

            let elapsed = self.clock.now() - started_at;
            if elapsed < self.settings.limit {
                continue;
            }

            if !self.claim(generation) {
                return;
            }

            warn!(
                pause_id,
                paused_mins = elapsed.num_minutes(),
                "Pause limit reached, stopping session"
            );
            (self.on_expire)(pause_id);
            return;
        }
    }

    /// Take the slot if this watcher still owns it.
    fn claim(&self, generation: u64) -> bool {
        let mut slot = self.slot();
        match slot.current.take() {
            Some(w) if w.generation == generation => {
                slot.state = MonitorState::Expired {
                    pause_id: w.pause_id,
                };
                true
            }
            other => {
                slot.current = other;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use chrono::TimeZone;

    const TICK: Duration = Duration::from_millis(5);

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn monitor(enabled: bool) -> (PauseMonitor, Arc<ManualClock>, Receiver<i64>) {
        let clock = Arc::new(ManualClock::new(t0()));
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let settings = MonitorSettings {
            enabled,
            limit: TimeDelta::minutes(30),
            tick: TICK,
        };
        let m = PauseMonitor::new(settings, clock.clone(), move |id| {
            let _ = tx.lock().unwrap().send(id);
        });
        (m, clock, rx)
    }

    #[test]
    fn fires_once_the_limit_is_reached() {
        let (m, clock, rx) = monitor(true);
        assert!(m.start(7, t0()));
        assert!(m.is_watching());

        clock.advance(TimeDelta::minutes(29));
        assert!(rx.recv_timeout(TICK * 10).is_err());

        clock.advance(TimeDelta::minutes(1));
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), 7);
        assert_eq!(m.state(), MonitorState::Expired { pause_id: 7 });
        assert!(rx.recv_timeout(TICK * 10).is_err());
    }

    #[test]
    fn cancelled_watcher_never_fires() {
        let (m, clock, rx) = monitor(true);
        m.start(7, t0());
        assert!(m.cancel());

        clock.advance(TimeDelta::hours(5));
        assert!(rx.recv_timeout(TICK * 20).is_err());
        assert_eq!(m.state(), MonitorState::Cancelled { pause_id: 7 });
        assert!(!m.cancel());
    }

    #[test]
    fn new_watcher_replaces_the_old_one() {
        let (m, clock, rx) = monitor(true);
        m.start(1, t0());
        m.start(2, t0());
        assert_eq!(m.state(), MonitorState::Watching { pause_id: 2 });

        clock.advance(TimeDelta::hours(1));
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), 2);
        assert!(rx.recv_timeout(TICK * 20).is_err());
    }

    #[test]
    fn disabled_monitor_does_not_watch() {
        let (m, clock, rx) = monitor(false);
        assert!(!m.start(1, t0()));
        assert_eq!(m.state(), MonitorState::Idle);

        clock.advance(TimeDelta::hours(5));
        assert!(rx.recv_timeout(TICK * 10).is_err());
    }

    #[test]
    fn settings_follow_config() {
        let cfg = Config {
            background_tracker_auto_stop: true,
            background_tracker_auto_stop_after: 45,
            ..Config::default()
        };
        let s = MonitorSettings::from_config(&cfg);
        assert!(s.enabled);
        assert_eq!(s.limit, TimeDelta::minutes(45));
        assert_eq!(s.tick, DEFAULT_TICK);
    }
}
