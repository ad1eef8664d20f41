//! YAML configuration, loaded once per process and passed down explicitly.

use crate::errors::{AppError, AppResult};
use crate::models::SortOrder;
use crate::utils::path::expand_tilde;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.yaml";
const DATABASE_FILE: &str = "rhora.db";
const MARKER_FILE: &str = "rhora-tracker.pid";
const LOG_FILE: &str = "rhora-tracker.log";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub database_dir: PathBuf,
    pub debug: bool,
    pub list_limit: usize,
    pub list_order: SortOrder,
    pub use_background_tracker: bool,
    pub background_tracker_auto_stop: bool,
    /// Minutes.
    pub background_tracker_auto_stop_after: u32,

    /// `--db` from the command line; never written to disk.
    #[serde(skip)]
    pub database_override: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_dir: Self::default_data_dir(),
            debug: false,
            list_limit: 50,
            list_order: SortOrder::Desc,
            use_background_tracker: true,
            background_tracker_auto_stop: false,
            background_tracker_auto_stop_after: 120,
            database_override: None,
        }
    }
}

impl Config {
    /// `~/.rhora`
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".rhora")
    }

    pub fn default_config_file() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE)
    }

    fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("rhora"))
            .unwrap_or_else(Self::config_dir)
    }

    /// Load `path`, or the default file. Only the default file may be missing.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let (file, explicit) = match path {
            Some(p) => (expand_tilde(p), true),
            None => (Self::default_config_file(), false),
        };

        if !file.exists() {
            if explicit {
                return Err(AppError::ConfigLoad(format!(
                    "{} does not exist",
                    file.display()
                )));
            }
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&file)
            .map_err(|e| AppError::ConfigLoad(format!("{}: {}", file.display(), e)))?;
        Self::from_yaml(&content)
            .map_err(|e| AppError::ConfigLoad(format!("{}: {}", file.display(), e)))
    }

    pub fn from_yaml(content: &str) -> AppResult<Self> {
        let mut cfg = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str::<Self>(content).map_err(|e| AppError::Config(e.to_string()))?
        };
        cfg.database_dir = expand_tilde(&cfg.database_dir);
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_yaml(&self) -> AppResult<String> {
        serde_yaml::to_string(self).map_err(|e| AppError::Config(e.to_string()))
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.list_limit < 1 {
            return Err(AppError::Config("list_limit must be at least 1".into()));
        }
        if self.background_tracker_auto_stop_after < 1 {
            return Err(AppError::Config(
                "background_tracker_auto_stop_after must be at least 1 minute".into(),
            ));
        }
        Ok(())
    }

    pub fn with_database(mut self, db: Option<&Path>) -> Self {
        self.database_override = db.map(expand_tilde);
        self
    }

    pub fn database_file(&self) -> PathBuf {
        match &self.database_override {
            Some(p) => p.clone(),
            None => self.database_dir.join(DATABASE_FILE),
        }
    }

    /// Directory holding the database, the tracker marker and the tracker log.
    pub fn data_dir(&self) -> PathBuf {
        match self.database_override.as_ref().and_then(|p| p.parent()) {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            Some(_) => PathBuf::from("."),
            None => self.database_dir.clone(),
        }
    }

    pub fn marker_file(&self) -> PathBuf {
        self.data_dir().join(MARKER_FILE)
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir().join(LOG_FILE)
    }

    /// Write a default config file into `dir` (or `~/.rhora`).
    pub fn create_default(dir: Option<&Path>, force: bool) -> AppResult<PathBuf> {
        let dir = dir.map(expand_tilde).unwrap_or_else(Self::config_dir);
        let path = dir.join(CONFIG_FILE);

        if path.exists() && !force {
            return Err(AppError::ConfigSave(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }

        let yaml = Self::default().to_yaml()?;
        fs::create_dir_all(&dir).map_err(|e| AppError::ConfigSave(e.to_string()))?;
        fs::write(&path, yaml).map_err(|e| AppError::ConfigSave(e.to_string()))?;
        Ok(path)
    }
}
