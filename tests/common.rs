#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Isolated home + database for one test.
pub struct TestEnv {
    dir: TempDir,
    pub db: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("data").join("rhora.db");
        Self { dir, db }
    }

    pub fn home(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// `rhora --db <tmp>` with HOME pointing into the temp dir.
    pub fn rhora(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("rhora");
        cmd.env("HOME", self.dir.path())
            .env("XDG_DATA_HOME", self.dir.path().join("xdg"))
            .env_remove("RHORA_DAEMON")
            .env_remove("RUST_LOG")
            .arg("--db")
            .arg(&self.db);
        cmd
    }

    pub fn marker_file(&self) -> PathBuf {
        self.db.with_file_name("rhora-tracker.pid")
    }

    pub fn log_file(&self) -> PathBuf {
        self.db.with_file_name("rhora-tracker.log")
    }

    pub fn write_config(&self, yaml: &str) -> PathBuf {
        let path = self.dir.path().join("custom.yaml");
        fs::write(&path, yaml).expect("write config");
        path
    }

    pub fn start(&self, project: &str) {
        self.rhora()
            .args(["start", project, "--no-daemon"])
            .assert()
            .success();
    }

    pub fn stop(&self) {
        self.rhora().arg("stop").assert().success();
    }
}
