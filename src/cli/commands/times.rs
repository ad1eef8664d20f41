use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::report;
use crate::db::entries;
use crate::errors::AppResult;
use crate::ui::messages::info;

use super::{entry_filter, open_tracker};

/// Handle the `times` and `categories` subcommands
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let tracker = open_tracker(cfg)?;

    match cmd {
        Commands::Times { list, category } => {
            let filter = entry_filter(cfg, list, None, category.as_deref(), Some(cfg.list_limit))?;
            let rows = tracker.with_conn(|c| report::time_rows(c, &filter))?;
            if rows.is_empty() {
                info("No time entries found");
            } else {
                print!("{}", report::times_table(&rows).render());
            }
        }
        Commands::Categories => {
            let cats = tracker.with_conn(entries::categories)?;
            if cats.is_empty() {
                info("No categories found");
            } else {
                for c in cats {
                    println!("{}", c);
                }
            }
        }
        _ => {}
    }

    tracker.close()
}
