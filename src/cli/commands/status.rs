use crate::cli::parser::Commands;
use crate::config::Config;
use crate::daemon::manager::DaemonManager;
use crate::errors::AppResult;
use crate::ui::messages::info;
use crate::utils::formatting::{bold, or_dash};
use crate::utils::{format_duration, format_local};

use super::open_tracker;

/// Handle the `status` subcommand
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Status = cmd {
        let tracker = open_tracker(cfg)?;

        match tracker.status()? {
            None => info("No active time tracking session"),
            Some(s) => {
                println!("{} {}", bold("Project: "), s.entry.project.name);
                println!("{} {}", bold("Category:"), or_dash(s.entry.category.as_deref()));
                println!("{} {}", bold("Started: "), format_local(s.entry.start_time));
                println!("{} {}", bold("Worked:  "), format_duration(s.worked));
                match &s.open_pause {
                    Some(p) => println!(
                        "{} paused since {} ({})",
                        bold("State:   "),
                        format_local(p.pause_start),
                        format_duration(p.elapsed(tracker.clock().now()))
                    ),
                    None => println!("{} running", bold("State:   ")),
                }
            }
        }
        tracker.close()?;

        match DaemonManager::for_config(cfg).running_pid() {
            Some(pid) => println!("{} running (pid {})", bold("Tracker: "), pid),
            None => println!("{} not running", bold("Tracker: ")),
        }
    }
    Ok(())
}
