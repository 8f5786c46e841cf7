//! Configuration file handling for daybook.
//!
//! The configuration file is stored at `$DAYBOOK_HOME/config.json`. It names the expenses file and
//! holds the reminder settings. The task database always lives at `$DAYBOOK_HOME/tasks.sqlite`.

use crate::db::Db;
use crate::error::{ErrorType, IntoResult};
use crate::ledger::Ledger;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "daybook";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const EXPENSES_CSV: &str = "expenses.csv";
const TASKS_SQLITE: &str = "tasks.sqlite";
const REMINDER_INTERVAL_SECS: u64 = 3600;

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$DAYBOOK_HOME` and from there it loads `$DAYBOOK_HOME/config.json`. It opens the
/// task database and points the expense ledger at its file.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    db: Db,
    ledger: Ledger,
    sqlite_path: PathBuf,
}

impl Config {
    /// Creates the home directory and:
    /// - Creates an initial `config.json` file with default settings
    /// - Creates the SQLite task database
    /// - Creates the expenses file with its header row
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the home directory, e.g. `$HOME/daybook`
    ///
    /// # Errors
    /// - `ErrorType::Config` if any part of the home directory already exists in a conflicting
    ///   state or cannot be written.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::create_impl(dir.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn create_impl(maybe_relative: PathBuf) -> anyhow::Result<Self> {
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the daybook home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if utils::exists(&config_path).await? {
            bail!("A daybook home already exists at '{}'", root.display());
        }
        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        let sqlite_path = root.join(TASKS_SQLITE);
        let db = Db::init(&sqlite_path)
            .await
            .context("Unable to create SQLite DB")?;

        let ledger = Ledger::new(config_file.expenses_path(&root));
        ledger
            .initialize()
            .await
            .context("Unable to create the expenses file")?;

        Ok(Self {
            root,
            config_path,
            config_file,
            db,
            ledger,
            sqlite_path,
        })
    }

    /// This will
    /// - validate that `daybook_home` exists and that the config file exists
    /// - load the config file
    /// - open the task database, migrating it if it is out-of-date
    /// - make sure the expenses file exists
    /// - return the loaded configuration object
    pub async fn load(daybook_home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_impl(daybook_home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_impl(maybe_relative: PathBuf) -> anyhow::Result<Self> {
        if !maybe_relative.is_dir() {
            bail!(
                "The daybook home is missing '{}', run 'daybook init' first",
                maybe_relative.display()
            );
        }
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let sqlite_path = root.join(TASKS_SQLITE);
        let db = Db::load(&sqlite_path)
            .await
            .context("Unable to load SQLite DB")?;

        let ledger = Ledger::new(config_file.expenses_path(&root));
        ledger
            .initialize()
            .await
            .context("Unable to prepare the expenses file")?;

        Ok(Self {
            root,
            config_path,
            config_file,
            db,
            ledger,
            sqlite_path,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    pub fn reminder_interval(&self) -> Duration {
        Duration::from_secs(self.config_file.reminder_interval_secs)
    }

    /// Whether a reminder scan flags the tasks it reported so they are not reported again.
    pub fn mark_reminders_sent(&self) -> bool {
        self.config_file.mark_reminders_sent
    }

    /// Closes the task database.
    pub async fn close(&self) {
        self.db.close().await;
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "daybook",
///   "config_version": 1,
///   "expenses_path": "expenses.csv",
///   "reminder_interval_secs": 3600,
///   "mark_reminders_sent": true
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "daybook"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Path to the expenses file (optional, relative to the home directory or absolute)
    /// Defaults to $DAYBOOK_HOME/expenses.csv if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expenses_path: Option<PathBuf>,

    /// Seconds between reminder scans
    #[serde(default = "default_reminder_interval_secs")]
    reminder_interval_secs: u64,

    /// Flag reminded tasks so they are reminded only once
    #[serde(default = "default_mark_reminders_sent")]
    mark_reminders_sent: bool,
}

fn default_reminder_interval_secs() -> u64 {
    REMINDER_INTERVAL_SECS
}

fn default_mark_reminders_sent() -> bool {
    true
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            expenses_path: None,
            reminder_interval_secs: REMINDER_INTERVAL_SECS,
            mark_reminders_sent: true,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app
    async fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = utils::read(path)
            .await
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.reminder_interval_secs > 0,
            "Invalid reminder_interval_secs in config file: must be greater than zero"
        );

        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    /// Returns the stored `expenses_path` resolved against `root` if it is relative.
    fn expenses_path(&self, root: &Path) -> PathBuf {
        match &self.expenses_path {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => root.join(p),
            None => root.join(EXPENSES_CSV),
        }
    }
}
