//! Platform sources of screen lock notifications.

use crate::daemon::bridge::LockEvent;
use crate::errors::AppResult;
use std::sync::mpsc::Sender;

pub trait LockEventSource: Send {
    fn name(&self) -> &'static str;
    /// Block, forwarding events until the receiving side hangs up.
    fn run(self: Box<Self>, events: Sender<LockEvent>) -> AppResult<()>;
}

/// Turns sampled lock states into transition events.
#[derive(Debug, Default)]
pub struct LockStateTracker {
    last: Option<bool>,
}

impl LockStateTracker {
    /// The first sample only sets the baseline.
    pub fn observe(&mut self, locked: bool) -> Option<LockEvent> {
        let prev = self.last.replace(locked);
        match (prev, locked) {
            (Some(false), true) => Some(LockEvent::Locked),
            (Some(true), false) => Some(LockEvent::Unlocked),
            _ => None,
        }
    }
}

/// Parse `loginctl ... -p LockedHint --value` output.
pub fn parse_locked_hint(s: &str) -> Option<bool> {
    match s.trim() {
        "yes" => Some(true),
        "no" => Some(false),
        _ => None,
    }
}

#[cfg(target_os = "linux")]
pub use logind::LogindLockSource;

#[cfg(target_os = "linux")]
mod logind {
    use super::{LockEventSource, LockStateTracker, parse_locked_hint};
    use crate::daemon::bridge::LockEvent;
    use crate::errors::{AppError, AppResult};
    use std::env;
    use std::process::Command;
    use std::sync::mpsc::Sender;
    use std::thread;
    use std::time::Duration;
    use tracing::{debug, info, warn};

    const POLL_INTERVAL: Duration = Duration::from_secs(2);

    /// Polls systemd-logind's `LockedHint` for the current session.
    pub struct LogindLockSource {
        session: String,
        interval: Duration,
    }

    impl LogindLockSource {
        pub fn from_env() -> Self {
            let session = env::var("XDG_SESSION_ID")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "auto".to_string());
            Self {
                session,
                interval: POLL_INTERVAL,
            }
        }

        fn query(&self) -> AppResult<bool> {
            let out = Command::new("loginctl")
                .args(["show-session", &self.session, "-p", "LockedHint", "--value"])
                .output()?;

            if !out.status.success() {
                return Err(AppError::Daemon(format!(
                    "loginctl failed: {}",
                    String::from_utf8_lossy(&out.stderr).trim()
                )));
            }

            let stdout = String::from_utf8_lossy(&out.stdout);
            parse_locked_hint(&stdout).ok_or_else(|| {
                AppError::Daemon(format!("unexpected LockedHint value '{}'", stdout.trim()))
            })
        }
    }

    impl LockEventSource for LogindLockSource {
        fn name(&self) -> &'static str {
            "logind"
        }

        fn run(self: Box<Self>, events: Sender<LockEvent>) -> AppResult<()> {
            info!(session = %self.session, "Watching screen lock state");
            let mut state = LockStateTracker::default();
            let mut failing = false;

            loop {
                match self.query() {
                    Ok(locked) => {
                        if failing {
                            info!("Lock state available again");
                            failing = false;
                        }
                        if let Some(event) = state.observe(locked) {
                            debug!(?event, "Lock state changed");
                            if events.send(event).is_err() {
                                return Ok(());
                            }
                        }
                    }
                    Err(e) if !failing => {
                        warn!(error = %e, "Cannot read lock state");
                        failing = true;
                    }
                    Err(e) => debug!(error = %e, "Lock state still unavailable"),
                }
                thread::sleep(self.interval);
            }
        }
    }
}

/// The lock source for this platform, if there is one.
pub fn platform_source() -> Option<Box<dyn LockEventSource>> {
    #[cfg(target_os = "linux")]
    {
        Some(Box::new(LogindLockSource::from_env()))
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}
