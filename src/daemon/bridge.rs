//! Translates screen lock notifications into pause / continue calls.

use crate::core::tracker::SessionTracker;
use crate::daemon::monitor::PauseMonitor;
use crate::errors::AppError;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockEvent {
    Locked,
    Unlocked,
}

pub struct ScreenLockBridge {
    tracker: Arc<SessionTracker>,
    monitor: PauseMonitor,
}

impl ScreenLockBridge {
    pub fn new(tracker: Arc<SessionTracker>, monitor: PauseMonitor) -> Self {
        Self { tracker, monitor }
    }

    /// Consume events until every sender is gone.
    pub fn run(&self, events: Receiver<LockEvent>) {
        for event in events {
            self.handle(event);
        }
        info!("Lock event stream closed");
    }

    pub fn handle(&self, event: LockEvent) {
        match event {
            LockEvent::Locked => self.on_locked(),
            LockEvent::Unlocked => self.on_unlocked(),
        }
    }

    fn on_locked(&self) {
        match self.tracker.pause() {
            Ok(pause) => {
                info!(pause_id = pause.id, "Screen locked, tracking paused");
                self.monitor.start(pause.id, pause.pause_start);
            }
            Err(AppError::NoActiveSession) => info!("Screen locked, no active session to pause"),
            Err(AppError::AlreadyPaused) => info!("Screen locked, session already paused"),
            Err(e) => error!(error = %e, "Failed to pause on screen lock"),
        }
    }

    fn on_unlocked(&self) {
        self.monitor.cancel();
        match self.tracker.resume() {
            Ok(pause) => info!(
                pause_id = pause.id,
                paused_secs = pause.duration.map(|d| d.num_seconds()),
                "Screen unlocked, tracking continued"
            ),
            Err(AppError::NoActivePause) => info!("Screen unlocked, no active pause"),
            Err(AppError::NoActiveSession) => info!("Screen unlocked, no active session"),
            Err(e) => error!(error = %e, "Failed to continue on screen unlock"),
        }
    }
}
