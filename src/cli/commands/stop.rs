use crate::cli::parser::Commands;
use crate::config::Config;
use crate::daemon::manager::{DaemonManager, StopOutcome};
use crate::errors::AppResult;
use crate::ui::messages::{info, success, warning};
use crate::utils::format_duration;
use chrono::TimeDelta;

use super::open_tracker;

/// Handle the `stop` subcommand
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Stop = cmd {
        let tracker = open_tracker(cfg)?;
        let entry = tracker.stop()?;
        tracker.close()?;

        success(format!(
            "Stopped tracking time for project '{}'. Worked: {}",
            entry.project.name,
            format_duration(entry.duration.unwrap_or_else(TimeDelta::zero))
        ));

        let manager = DaemonManager::for_config(cfg);
        if manager.is_running() {
            match manager.stop() {
                Ok(StopOutcome::Clean) => info("Background tracker stopped"),
                Ok(StopOutcome::MarkerForced) => {
                    warning("Background tracker did not exit in time; marker removed")
                }
                Err(e) => warning(format!("Failed to stop background tracker: {}", e)),
            }
        } else if let Err(e) = manager.clear_stale() {
            warning(format!("Failed to remove stale tracker marker: {}", e));
        }
    }
    Ok(())
}
