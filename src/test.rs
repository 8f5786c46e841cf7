//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::db::Db;
use crate::model::{Task, TaskDraft, DATE_FORMAT, TIMESTAMP_FORMAT};
use crate::Config;
use chrono::{NaiveDate, NaiveDateTime};
use std::path::PathBuf;
use tempfile::TempDir;

/// Test environment that sets up a daybook home directory with Config, database and expenses file.
/// Holds TempDir to keep the directory alive for the duration of the test.
pub struct TestEnv {
    temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a test environment with Config and initialized database.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("daybook");
        let config = Config::create(&root).await.unwrap();
        Self { temp_dir, config }
    }

    /// Returns a clone of the Config.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    pub fn db(&self) -> &Db {
        self.config.db()
    }

    /// A path for scratch files, outside the daybook home.
    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Adds a task with default fields.
    pub async fn add(&self, title: &str) -> Task {
        self.db().add_task(&TaskDraft::new(title)).await.unwrap()
    }

    /// Adds a task with default fields and a fixed creation time.
    pub async fn add_at(&self, title: &str, created: &str) -> Task {
        let fields = TaskDraft::new(title).validate().unwrap();
        self.db()
            .add_task_at(&fields, timestamp(created))
            .await
            .unwrap()
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
}

pub fn timestamp(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()
}
