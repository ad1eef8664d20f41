use crate::core::export::ExportFormat;
use crate::models::SortOrder;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line interface definition for rhora
/// Track time spent on projects, with pause/continue and a screen-lock aware background tracker
#[derive(Parser)]
#[command(
    name = "rhora",
    version = env!("CARGO_PKG_VERSION"),
    about = "A simple project time tracker with pause/continue and an optional background tracker",
    long_about = None
)]
pub struct Cli {
    /// Use this configuration file instead of ~/.rhora/config.yaml
    #[arg(global = true, short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Filters shared by listing and export commands.
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Maximum number of entries (default: list_limit from config)
    #[arg(short = 'l', long = "limit")]
    pub limit: Option<usize>,

    /// Only entries started on or after this date (YYYY-MM-DD)
    #[arg(short = 's', long = "since")]
    pub since: Option<String>,

    /// Sort by start time (default: list_order from config)
    #[arg(long = "sort", value_enum)]
    pub sort: Option<SortOrder>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start tracking time for a project
    Start {
        /// Project name (created on first use)
        project: String,

        /// Stop the currently active session first
        #[arg(short = 'f', long = "force")]
        force: bool,

        /// Optional category tag (letters, digits, '_' and '-')
        #[arg(long = "category")]
        category: Option<String>,

        /// Track in the foreground even if the background tracker is enabled
        #[arg(long = "no-daemon")]
        no_daemon: bool,
    },

    /// Stop the active session
    Stop,

    /// Pause the active session
    Pause,

    /// Continue a paused session
    #[command(alias = "resume")]
    Continue,

    /// Show the active session
    Status,

    /// List tracked times across all projects
    Times {
        #[command(flatten)]
        list: ListArgs,

        /// Only entries with this category
        #[arg(long = "category")]
        category: Option<String>,
    },

    /// List the categories in use
    Categories,

    /// Export tracked times to a file
    Export {
        #[command(flatten)]
        list: ListArgs,

        /// Only entries with this category
        #[arg(long = "category")]
        category: Option<String>,

        /// Output file (default: <timestamp>_times.<ext>)
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long = "format", value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
    },

    /// Delete all time entries and pauses (projects are kept)
    Clear {
        /// Do not ask for confirmation; also clears an active session
        #[arg(short = 'f', long = "force")]
        force: bool,
    },

    /// Manage projects
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Inspect or stop the background tracker
    Tracker {
        #[command(subcommand)]
        action: TrackerAction,
    },

    /// Show the background tracker log
    Logs {
        /// Keep printing new lines as they are written
        #[arg(short = 'f', long = "follow")]
        follow: bool,

        /// Number of trailing lines to show
        #[arg(short = 'n', long = "lines", default_value_t = 20)]
        lines: usize,
    },
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// List all projects
    List,

    /// List tracked times of a project
    Times {
        /// Project id or name
        project: String,

        #[command(flatten)]
        list: ListArgs,
    },

    /// Total tracked time of a project
    Total {
        /// Project id or name
        project: String,

        /// Only entries started on or after this date (YYYY-MM-DD)
        #[arg(short = 's', long = "since")]
        since: Option<String>,
    },

    /// Export tracked times of a project
    Export {
        /// Project id or name
        project: String,

        #[command(flatten)]
        list: ListArgs,

        /// Output file (default: <timestamp>_times.<ext>)
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long = "format", value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
    },

    /// Remove a project with all its entries
    #[command(alias = "rm")]
    Remove {
        /// Project id or name
        project: String,

        /// Do not ask for confirmation
        #[arg(short = 'f', long = "force")]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init {
        /// Directory to write config.yaml into (default: ~/.rhora)
        #[arg(short = 'd', long = "directory")]
        directory: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short = 'f', long = "force")]
        force: bool,
    },

    /// Print the effective configuration
    Print,

    /// Print the configuration file path
    Path,
}

#[derive(Subcommand)]
pub enum TrackerAction {
    /// Show whether the background tracker is running
    Status,

    /// Stop the background tracker (the active session is stopped with it)
    Stop,
}
