pub mod clear;
pub mod config;
pub mod export;
pub mod logs;
pub mod pause;
pub mod project;
pub mod start;
pub mod status;
pub mod stop;
pub mod times;
pub mod tracker;

use crate::cli::parser::ListArgs;
use crate::config::Config;
use crate::core::tracker::SessionTracker;
use crate::db::entries::EntryFilter;
use crate::errors::AppResult;
use crate::ui::messages::warning;
use crate::utils::date::parse_since_opt;
use std::io::{self, Write};

pub(crate) fn open_tracker(cfg: &Config) -> AppResult<SessionTracker> {
    SessionTracker::open(&cfg.database_file())
}

pub(crate) fn ask_confirmation(prompt: &str) -> bool {
    warning(prompt);
    print!("Confirm [y/N]: ");
    let _ = io::stdout().flush();

    let mut s = String::new();
    if io::stdin().read_line(&mut s).is_ok() {
        matches!(s.trim().to_lowercase().as_str(), "y" | "yes")
    } else {
        false
    }
}

/// Build the entry filter from command-line arguments and config defaults.
/// `default_limit` is `None` for exports, which are unbounded unless asked.
pub(crate) fn entry_filter(
    cfg: &Config,
    list: &ListArgs,
    project_id: Option<i64>,
    category: Option<&str>,
    default_limit: Option<usize>,
) -> AppResult<EntryFilter> {
    Ok(EntryFilter {
        project_id,
        category: category.map(str::to_string),
        since: parse_since_opt(list.since.as_deref())?,
        sort: list.sort.unwrap_or(cfg.list_order),
        limit: list.limit.or(default_limit),
    })
}
