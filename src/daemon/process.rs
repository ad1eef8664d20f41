//! OS process control: liveness probes, termination and detaching.

use crate::errors::{AppError, AppResult};
use std::env;

/// Set in the environment of the re-executed background copy.
pub const DAEMON_ENV: &str = "RHORA_DAEMON";

pub fn is_daemon_process() -> bool {
    env::var(DAEMON_ENV).is_ok_and(|v| v == "1")
}

pub trait ProcessControl: Send + Sync {
    /// Probe without side effects (signal 0).
    fn is_alive(&self, pid: i32) -> bool;
    /// Ask the process to shut down gracefully.
    fn terminate(&self, pid: i32) -> AppResult<()>;
}

#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct UnixProcessControl;

#[cfg(unix)]
impl ProcessControl for UnixProcessControl {
    fn is_alive(&self, pid: i32) -> bool {
        use nix::errno::Errno;
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        if pid <= 0 {
            return false;
        }
        // EPERM: exists but belongs to someone else
        matches!(kill(Pid::from_raw(pid), None), Ok(()) | Err(Errno::EPERM)) && !is_zombie(pid)
    }

    fn terminate(&self, pid: i32) -> AppResult<()> {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        if pid <= 0 {
            return Err(AppError::Daemon(format!("refusing to signal pid {}", pid)));
        }
        kill(Pid::from_raw(pid), Signal::SIGTERM)?;
        Ok(())
    }
}

/// An exited process nobody has reaped yet still answers signal 0.
#[cfg(target_os = "linux")]
fn is_zombie(pid: i32) -> bool {
    std::fs::read_to_string(format!("/proc/{}/stat", pid))
        .ok()
        .and_then(|stat| {
            // the command name may contain spaces and parentheses
            stat.rsplit_once(')')
                .map(|(_, rest)| rest.trim_start().starts_with('Z'))
        })
        .unwrap_or(false)
}

#[cfg(all(unix, not(target_os = "linux")))]
fn is_zombie(_pid: i32) -> bool {
    false
}

#[cfg(not(unix))]
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedProcessControl;

#[cfg(not(unix))]
impl ProcessControl for UnsupportedProcessControl {
    fn is_alive(&self, _pid: i32) -> bool {
        false
    }

    fn terminate(&self, _pid: i32) -> AppResult<()> {
        Err(AppError::Daemon(
            "process control is not supported on this platform".into(),
        ))
    }
}

pub fn system_process_control() -> Box<dyn ProcessControl> {
    #[cfg(unix)]
    {
        Box::new(UnixProcessControl)
    }
    #[cfg(not(unix))]
    {
        Box::new(UnsupportedProcessControl)
    }
}

/// Outcome of a detach attempt, seen from the launcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detached {
    /// A background copy is running with this pid.
    Parent { child_pid: u32 },
    /// The platform cannot detach; the caller stays in the foreground.
    Unsupported,
}

pub trait ProcessDetacher {
    fn detach(&self) -> AppResult<Detached>;
}

/// Re-executes the current program with the same arguments in a new session.
/// The copy keeps no handle on the launcher's terminal; it logs to its own file.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct ReexecDetacher;

#[cfg(unix)]
impl ProcessDetacher for ReexecDetacher {
    fn detach(&self) -> AppResult<Detached> {
        use std::os::unix::process::CommandExt;
        use std::process::{Command, Stdio};

        let exe = env::current_exe()?;
        let mut cmd = Command::new(exe);
        cmd.args(env::args_os().skip(1))
            .env(DAEMON_ENV, "1")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // SAFETY: setsid is async-signal-safe and touches no parent state.
        unsafe {
            cmd.pre_exec(|| {
                nix::unistd::setsid()
                    .map(|_| ())
                    .map_err(std::io::Error::from)
            });
        }

        let child = cmd.spawn()?;
        Ok(Detached::Parent {
            child_pid: child.id(),
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDetacher;

impl ProcessDetacher for NoopDetacher {
    fn detach(&self) -> AppResult<Detached> {
        Ok(Detached::Unsupported)
    }
}

/// Detaching is only useful where a screen-lock source exists.
pub fn platform_detacher() -> Box<dyn ProcessDetacher> {
    #[cfg(target_os = "linux")]
    {
        Box::new(ReexecDetacher)
    }
    #[cfg(not(target_os = "linux"))]
    {
        Box::new(NoopDetacher)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn own_process_is_alive() {
        assert!(UnixProcessControl.is_alive(std::process::id() as i32));
    }

    #[test]
    fn reaped_child_is_not_alive() {
        let mut child = Command::new("true").spawn().unwrap();
        let pid = child.id() as i32;
        child.wait().unwrap();

        assert!(!UnixProcessControl.is_alive(pid));
        assert!(UnixProcessControl.terminate(pid).is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn unreaped_child_is_not_alive() {
        use std::time::{Duration, Instant};

        let mut child = Command::new("true").spawn().unwrap();
        let pid = child.id() as i32;

        let deadline = Instant::now() + Duration::from_secs(5);
        while !is_zombie(pid) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(is_zombie(pid));
        assert!(!UnixProcessControl.is_alive(pid));

        child.wait().unwrap();
    }

    #[test]
    fn nonsense_pids_are_rejected() {
        assert!(!UnixProcessControl.is_alive(0));
        assert!(!UnixProcessControl.is_alive(-1));
        assert!(UnixProcessControl.terminate(0).is_err());
    }

    #[test]
    fn noop_detacher_reports_unsupported() {
        assert_eq!(NoopDetacher.detach().unwrap(), Detached::Unsupported);
    }
}
