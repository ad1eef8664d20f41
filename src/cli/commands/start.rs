use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::category::validate_category;
use crate::core::tracker::SessionTracker;
use crate::daemon;
use crate::daemon::lock_source::platform_source;
use crate::daemon::manager::{DaemonManager, StopOutcome};
use crate::daemon::monitor::MonitorSettings;
use crate::daemon::process::{Detached, is_daemon_process, platform_detacher};
use crate::errors::{AppError, AppResult};
use crate::logging;
use crate::ui::messages::{info, success, warning};
use std::sync::Arc;
use tracing::info as log_info;

use super::open_tracker;

/// Handle the `start` subcommand
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Start {
        project,
        force,
        category,
        no_daemon,
    } = cmd
    {
        if is_daemon_process() {
            return run_background(cfg, project, *force, category.as_deref());
        }

        if cfg.use_background_tracker && !*no_daemon && launch_background(cfg, project, *force, category.as_deref())? {
            return Ok(());
        }

        let tracker = open_tracker(cfg)?;
        let entry = tracker.start(project, *force, category.as_deref())?;
        success(format!(
            "Started tracking time for project '{}'",
            entry.project.name
        ));
        tracker.close()?;
    }
    Ok(())
}

/// Returns false when the platform cannot detach and the caller should track in the foreground.
fn launch_background(cfg: &Config, project: &str, force: bool, category: Option<&str>) -> AppResult<bool> {
    // Refuse here, so the user sees the error instead of the detached copy.
    {
        let tracker = open_tracker(cfg)?;
        if let Some(c) = category {
            validate_category(c)?;
        }
        if project.trim().is_empty() {
            return Err(AppError::EmptyProjectName);
        }
        if !force && let Some(active) = tracker.active_entry()? {
            return Err(AppError::AlreadyActive(active.project.name));
        }
        // the detached copy opens its own connection
        tracker.close()?;
    }

    // a still running predecessor would stop this session on its way out
    let manager = DaemonManager::for_config(cfg);
    match manager.replace_running()? {
        Some(StopOutcome::Clean) => info("Previous background tracker stopped"),
        Some(StopOutcome::MarkerForced) => {
            warning("Previous background tracker exited without cleaning up; marker removed")
        }
        None => {}
    }

    match manager.daemonize(platform_detacher().as_ref())? {
        Detached::Parent { child_pid } => {
            success(format!(
                "Started tracking time for project '{}' in the background (pid {})",
                project.trim(),
                child_pid
            ));
            Ok(true)
        }
        Detached::Unsupported => {
            info("Background tracker not supported on this platform, tracking in the foreground");
            Ok(false)
        }
    }
}

/// Body of the detached copy: start the session, then host the tracker until told to stop.
fn run_background(cfg: &Config, project: &str, force: bool, category: Option<&str>) -> AppResult<()> {
    logging::init_daemon(&cfg.log_file(), cfg.debug)?;
    log_info!(pid = std::process::id(), project, "Background tracker starting");

    let manager = DaemonManager::for_config(cfg);
    let tracker = Arc::new(SessionTracker::open(&cfg.database_file())?);

    let exit = daemon::serve(
        tracker,
        manager.marker(),
        MonitorSettings::from_config(cfg),
        platform_source(),
        |t| t.start(project, force, category),
    )?;
    log_info!(?exit, "Background tracker exited");
    Ok(())
}
