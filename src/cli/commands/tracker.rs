use crate::cli::parser::{Commands, TrackerAction};
use crate::config::Config;
use crate::daemon::manager::{DaemonManager, StopOutcome};
use crate::errors::AppResult;
use crate::ui::messages::{info, success, warning};

/// Handle the `tracker` subcommands
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Tracker { action } = cmd else {
        return Ok(());
    };
    let manager = DaemonManager::for_config(cfg);

    match action {
        TrackerAction::Status => match manager.running_pid() {
            Some(pid) => info(format!("Background tracker is running (pid {})", pid)),
            None => info("Background tracker is not running"),
        },
        TrackerAction::Stop => {
            if manager.running_pid().is_none() {
                manager.clear_stale()?;
                info("Background tracker is not running");
                return Ok(());
            }
            match manager.stop()? {
                StopOutcome::Clean => success("Background tracker stopped"),
                StopOutcome::MarkerForced => {
                    warning("Background tracker did not exit in time; marker removed")
                }
            }
        }
    }
    Ok(())
}
