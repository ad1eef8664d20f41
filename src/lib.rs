//! rhora library root.
//! Exposes the CLI parser, the high-level run() function and the internal modules.

pub mod cli;
pub mod config;
pub mod core;
pub mod daemon;
pub mod db;
pub mod errors;
pub mod logging;
pub mod models;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::parser::{Cli, Commands, ConfigAction};
use config::Config;
use errors::AppResult;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    match &cli.command {
        Commands::Start { .. } => cli::commands::start::handle(&cli.command, cfg),
        Commands::Stop => cli::commands::stop::handle(&cli.command, cfg),
        Commands::Pause | Commands::Continue => cli::commands::pause::handle(&cli.command, cfg),
        Commands::Status => cli::commands::status::handle(&cli.command, cfg),
        Commands::Times { .. } | Commands::Categories => {
            cli::commands::times::handle(&cli.command, cfg)
        }
        Commands::Export { .. } => cli::commands::export::handle(&cli.command, cfg),
        Commands::Clear { .. } => cli::commands::clear::handle(&cli.command, cfg),
        Commands::Project { .. } => cli::commands::project::handle(&cli.command, cfg),
        Commands::Config { .. } => {
            cli::commands::config::handle(&cli.command, cfg, cli.config.as_deref())
        }
        Commands::Tracker { .. } => cli::commands::tracker::handle(&cli.command, cfg),
        Commands::Logs { .. } => cli::commands::logs::handle(&cli.command, cfg),
    }
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();

    // writing a fresh config must work even when the current one is broken
    if let Commands::Config {
        action: ConfigAction::Init { directory, force },
    } = &cli.command
    {
        return cli::commands::config::init(directory.as_deref(), *force);
    }

    let cfg = Config::load(cli.config.as_deref())?.with_database(cli.db.as_deref());

    // the background copy sets up its own file logger
    if !daemon::process::is_daemon_process() {
        logging::init_cli(cfg.debug);
    }

    dispatch(&cli, &cfg)
}
