use crate::cli::parser::Commands;
use crate::config::Config;
use crate::daemon::manager::DaemonManager;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success, warning};

use super::{ask_confirmation, open_tracker};

/// Handle the `clear` subcommand
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Clear { force } = cmd {
        let tracker = open_tracker(cfg)?;

        if !*force {
            if let Some(active) = tracker.active_entry()? {
                return Err(AppError::AlreadyActive(active.project.name));
            }
            if !ask_confirmation("This will delete ALL time entries and pauses.") {
                info("Operation cancelled");
                return Ok(());
            }
        } else {
            // the tracker would otherwise keep running without a session
            let manager = DaemonManager::for_config(cfg);
            if manager.is_running()
                && let Err(e) = manager.stop()
            {
                warning(format!("Failed to stop background tracker: {}", e));
            }
        }

        let (entries, pauses) = tracker.clear_all(*force)?;
        tracker.close()?;
        success(format!(
            "Deleted {} time entries and {} pauses",
            entries, pauses
        ));
    }
    Ok(())
}
