//! Identity marker of the background tracker: the daemon's pid, stored
//! outside the database.

use crate::errors::{AppError, AppResult};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

pub trait PidMarker: Send + Sync {
    /// `Ok(None)` when no marker exists; an error when it exists but is unreadable.
    fn read(&self) -> AppResult<Option<i32>>;
    fn write(&self, pid: i32) -> AppResult<()>;
    /// Removing a missing marker is not an error.
    fn clear(&self) -> AppResult<()>;
    fn exists(&self) -> bool;
}

/// Pid file on disk.
#[derive(Debug, Clone)]
pub struct FileMarker {
    path: PathBuf,
}

impl FileMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PidMarker for FileMarker {
    fn read(&self) -> AppResult<Option<i32>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        content.trim().parse::<i32>().map(Some).map_err(|_| {
            AppError::Daemon(format!(
                "invalid pid '{}' in {}",
                content.trim(),
                self.path.display()
            ))
        })
    }

    fn write(&self, pid: i32) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, pid.to_string())?;
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// In-process marker for tests.
#[derive(Debug, Default)]
pub struct MemoryMarker {
    pid: Mutex<Option<i32>>,
}

impl MemoryMarker {
    pub fn with_pid(pid: i32) -> Self {
        Self {
            pid: Mutex::new(Some(pid)),
        }
    }
}

impl PidMarker for MemoryMarker {
    fn read(&self) -> AppResult<Option<i32>> {
        Ok(*self.pid.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn write(&self, pid: i32) -> AppResult<()> {
        *self.pid.lock().unwrap_or_else(PoisonError::into_inner) = Some(pid);
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        *self.pid.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }

    fn exists(&self) -> bool {
        self.pid
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
