#![allow(dead_code)]

use assert_cmd::Command;
use chrono::{Duration, NaiveDate, Utc};
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;
use uuid::Uuid;

/// Test harness for running CLI commands with temporary databases
pub struct CliTestHarness {
    temp_dir: TempDir,
    db_path: PathBuf,
    env: Vec<(String, String)>,
}

impl CliTestHarness {
    /// Create a new test harness with a temporary database
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");

        Self {
            temp_dir,
            db_path,
            env: Vec::new(),
        }
    }

    /// Adds an environment variable to every command this harness runs
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    /// Writes a `tilth.toml` into the working directory of the commands
    pub fn with_config_file(self, contents: &str) -> Self {
        std::fs::write(self.temp_dir.path().join("tilth.toml"), contents)
            .expect("Failed to write config file");
        self
    }

    /// Get a Command instance configured for testing
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("tilth").expect("Failed to find tilth binary");

        cmd.current_dir(self.temp_dir.path());
        cmd.env_remove("TILTH_LOG");
        cmd.env("TILTH_DATABASE_PATH", &self.db_path);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        cmd
    }

    pub fn db_path(&self) -> &std::path::Path {
        &self.db_path
    }

    /// Helper to run a command and assert success
    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    /// Helper to run a command and assert failure
    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Runs a command that prints an `ID: <uuid>` line and returns the id
    pub fn run_for_id(&self, args: &[&str]) -> Uuid {
        let output = self.run_success(args).get_output().stdout.clone();
        extract_ids(&String::from_utf8_lossy(&output))
            .into_iter()
            .next()
            .expect("command output should contain an ID line")
    }

    /// Runs a command and returns its stdout
    pub fn stdout(&self, args: &[&str]) -> String {
        let output = self.run_success(args).get_output().stdout.clone();
        String::from_utf8_lossy(&output).into_owned()
    }
}

/// Every id printed after an `ID: ` label, in output order
pub fn extract_ids(output: &str) -> Vec<Uuid> {
    output
        .lines()
        .filter_map(|line| line.split("ID: ").nth(1))
        .filter_map(|rest| rest.split_whitespace().next())
        .filter_map(|token| Uuid::parse_str(token).ok())
        .collect()
}

/// Every uuid appearing in the first column of a rendered table
pub fn table_ids(output: &str) -> Vec<Uuid> {
    output
        .lines()
        .filter_map(|line| line.trim_start_matches('│').trim_start_matches('|').split_whitespace().next())
        .filter_map(|token| Uuid::parse_str(token).ok())
        .collect()
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// ISO text of the date `days` from today
pub fn days_from_today(days: i64) -> String {
    (today() + Duration::days(days)).to_string()
}

/// Utility functions for test assertions
pub mod assertions {
    use super::*;

    pub fn has_task_table_headers() -> impl Predicate<str> {
        predicate::str::contains("ID")
            .and(predicate::str::contains("Name"))
            .and(predicate::str::contains("Status"))
            .and(predicate::str::contains("Due Date"))
    }

    pub fn created_successfully() -> impl Predicate<str> {
        predicate::str::contains("✓").and(predicate::str::contains("Created"))
    }

    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error")
    }
}
