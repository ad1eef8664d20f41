//! tracing setup. Foreground commands log to stderr, the background
//! tracker to its own file.

use crate::errors::{AppError, AppResult};
use std::fs;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

fn filter(debug: bool, default: &str) -> EnvFilter {
    if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    }
}

pub fn init_cli(debug: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(debug, "warn"))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn init_daemon(log_file: &Path, debug: bool) -> AppResult<()> {
    let dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = log_file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::Daemon(format!("invalid log file {}", log_file.display())))?;

    fs::create_dir_all(dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
        .map_err(|e| AppError::Daemon(format!("cannot open log file: {}", e)))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(debug, "info"))
        .with_writer(appender)
        .with_ansi(false)
        .try_init();
    Ok(())
}
