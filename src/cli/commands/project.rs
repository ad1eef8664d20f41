use crate::cli::parser::{Commands, ProjectAction};
use crate::config::Config;
use crate::core::report;
use crate::db::projects;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success};
use crate::utils::date::parse_since_opt;
use crate::utils::format_duration;

use super::export::write_export;
use super::{ask_confirmation, entry_filter, open_tracker};

/// Handle the `project` subcommands
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Project { action } = cmd else {
        return Ok(());
    };
    let tracker = open_tracker(cfg)?;

    match action {
        ProjectAction::List => {
            let list = tracker.with_conn(projects::list_all)?;
            if list.is_empty() {
                info("No projects found");
            } else {
                print!("{}", report::projects_table(&list).render());
            }
        }

        ProjectAction::Times { project, list } => {
            let p = tracker.with_conn(|c| projects::resolve(c, project))?;
            let filter = entry_filter(cfg, list, Some(p.id), None, Some(cfg.list_limit))?;
            let rows = tracker.with_conn(|c| report::time_rows(c, &filter))?;
            if rows.is_empty() {
                info(format!("No time entries found for project '{}'", p.name));
            } else {
                print!("{}", report::times_table(&rows).render());
            }
        }

        ProjectAction::Total { project, since } => {
            let since = parse_since_opt(since.as_deref())?;
            let (p, total) = tracker.with_conn(|c| report::project_total(c, project, since))?;
            println!("Total time for project '{}': {}", p.name, format_duration(total));
        }

        ProjectAction::Export {
            project,
            list,
            output,
            format,
        } => {
            let p = tracker.with_conn(|c| projects::resolve(c, project))?;
            let filter = entry_filter(cfg, list, Some(p.id), None, None)?;
            write_export(&tracker, &filter, output.as_deref(), *format)?;
        }

        ProjectAction::Remove { project, force } => {
            let p = tracker.with_conn(|c| projects::resolve(c, project))?;

            if let Some(active) = tracker.active_entry()?
                && active.project_id == p.id
                && !*force
            {
                return Err(AppError::AlreadyActive(p.name));
            }

            if !*force
                && !ask_confirmation(&format!(
                    "This will delete project '{}' and all of its time entries.",
                    p.name
                ))
            {
                info("Operation cancelled");
                return Ok(());
            }

            let removed = tracker.remove_project(&p.id.to_string())?;
            success(format!("Project '{}' removed", removed.name));
        }
    }

    tracker.close()
}
