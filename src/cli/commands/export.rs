use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::export::{ExportFormat, default_file_name, export};
use crate::core::report;
use crate::core::tracker::SessionTracker;
use crate::db::entries::EntryFilter;
use crate::errors::AppResult;
use crate::ui::messages::{success, warning};
use chrono::Local;
use std::path::{Path, PathBuf};

use super::{entry_filter, open_tracker};

/// Handle the `export` subcommand
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Export {
        list,
        category,
        output,
        format,
    } = cmd
    {
        let tracker = open_tracker(cfg)?;
        let filter = entry_filter(cfg, list, None, category.as_deref(), None)?;
        write_export(&tracker, &filter, output.as_deref(), *format)?;
        tracker.close()?;
    }
    Ok(())
}

/// Shared with `project export`.
pub(crate) fn write_export(
    tracker: &SessionTracker,
    filter: &EntryFilter,
    output: Option<&Path>,
    format: ExportFormat,
) -> AppResult<()> {
    let rows = tracker.with_conn(|c| report::time_rows(c, filter))?;
    if rows.is_empty() {
        warning("No time entries to export");
        return Ok(());
    }

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(default_file_name(Local::now(), format)));
    let count = export(&rows, &path, format)?;

    success(format!("Exported {} entries to {}", count, path.display()));
    Ok(())
}
