use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::success;
use crate::utils::format_duration;
use chrono::TimeDelta;

use super::open_tracker;

/// Handle the `pause` and `continue` subcommands
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let tracker = open_tracker(cfg)?;

    match cmd {
        Commands::Pause => {
            tracker.pause()?;
            success("Time tracking paused");
        }
        Commands::Continue => {
            let pause = tracker.resume()?;
            success(format!(
                "Time tracking continued (paused for {})",
                format_duration(pause.duration.unwrap_or_else(TimeDelta::zero))
            ));
        }
        _ => {}
    }

    tracker.close()
}
