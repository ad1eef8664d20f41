use crate::cli::parser::{Commands, ConfigAction};
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::success;
use std::path::Path;

/// `config init` runs before any configuration is loaded.
pub fn init(directory: Option<&Path>, force: bool) -> AppResult<()> {
    let path = Config::create_default(directory, force)?;
    success(format!("Configuration file created at {}", path.display()));
    Ok(())
}

/// Handle the `config` subcommand
pub fn handle(cmd: &Commands, cfg: &Config, config_path: Option<&Path>) -> AppResult<()> {
    if let Commands::Config { action } = cmd {
        match action {
            ConfigAction::Init { directory, force } => init(directory.as_deref(), *force)?,
            ConfigAction::Print => {
                print!("{}", cfg.to_yaml()?);
                println!("# database file: {}", cfg.database_file().display());
            }
            ConfigAction::Path => {
                let path = config_path
                    .map(Path::to_path_buf)
                    .unwrap_or_else(Config::default_config_file);
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}
