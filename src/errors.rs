//! Unified application error type.
//! All modules (db, core, daemon, cli) return AppError to keep the error
//! handling consistent and easy to manage.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Session state
    // ---------------------------
    #[error("a time tracking session is already active for project '{0}'")]
    AlreadyActive(String),

    #[error("time tracking is already paused")]
    AlreadyPaused,

    #[error("no active time tracking session found")]
    NoActiveSession,

    #[error("no active pause found")]
    NoActivePause,

    // ---------------------------
    // Lookup / parsing errors
    // ---------------------------
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Invalid date format: {0} (use YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Project name cannot be empty")]
    EmptyProjectName,

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration: {0}")]
    ConfigLoad(String),

    #[error("Failed to save configuration: {0}")]
    ConfigSave(String),

    // ---------------------------
    // Background tracker
    // ---------------------------
    #[error("Background tracker error: {0}")]
    Daemon(String),

    #[error("Background tracker is not running")]
    DaemonNotRunning,

    #[cfg(unix)]
    #[error("Failed to signal process: {0}")]
    Signal(#[from] nix::errno::Errno),

    // ---------------------------
    // Export errors
    // ---------------------------
    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON export error: {0}")]
    Json(#[from] serde_json::Error),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

pub type AppResult<T> = Result<T, AppError>;
