//! This module is responsible for reading, writing and managing the SQLite task database.

mod migrations;
mod stats;
mod tasks;
mod transfer;

use crate::error::Error;
use crate::model::{ListedTask, Priority, Progress, Status, Task, DATE_FORMAT, TIMESTAMP_FORMAT};
use anyhow::{bail, Context};
use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

const MAX_CONNECTIONS: u32 = 4;

/// The task store. Cloning is cheap and clones share one connection pool, so a clone can be handed
/// to the reminder loop while this one keeps serving the foreground.
#[derive(Debug, Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// - Validates that no file currently exists at `path`
    /// - Creates a new SQLite file at `path`
    /// - Initializes the database schema
    /// - Returns a constructed `Db` object for further operations
    pub(crate) async fn init(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!("A database already exists at {}", path.display());
        }
        let pool = connect(path, true).await?;
        bootstrap_schema_version(&pool).await?;
        migrations::run(&pool, 0, migrations::CURRENT_VERSION).await?;
        debug!("Created task database {}", path.display());
        Ok(Self { pool })
    }

    /// - Validates that there is a SQLite file at `path`
    /// - Creates a SQLite client
    /// - Updates the database schema with migrations if it is out-of-date
    /// - Returns a constructed `Db` object for further operations
    pub(crate) async fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("The task database is missing '{}'", path.display());
        }
        let pool = connect(path, false).await?;
        let version = schema_version(&pool).await?;
        if version > migrations::CURRENT_VERSION {
            bail!(
                "The task database is at schema version {version}, which is newer than this \
                program supports ({}). Is a newer version of daybook available?",
                migrations::CURRENT_VERSION
            );
        }
        migrations::run(&pool, version, migrations::CURRENT_VERSION).await?;
        Ok(Self { pool })
    }

    /// Closes the connection pool, waiting for open connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn connect(path: &Path, create: bool) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create);
    SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .with_context(|| format!("Unable to open SQLite database {}", path.display()))
}

/// Creates the `schema_version` table at version 0.
pub(crate) async fn bootstrap_schema_version(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query("CREATE TABLE schema_version (version INTEGER NOT NULL)")
        .execute(pool)
        .await
        .context("Failed to create schema_version table")?;

    sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
        .execute(pool)
        .await
        .context("Failed to insert initial schema version")?;
    Ok(())
}

async fn schema_version(pool: &SqlitePool) -> anyhow::Result<i32> {
    let version: Option<i32> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await
        .context("Failed to query schema version")?;
    version.context("The schema_version table is empty")
}

/// The current local time, truncated to whole seconds so it survives a round trip through the
/// database text format.
pub(crate) fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// A row of the `tasks` table exactly as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct TaskRow {
    id: i64,
    title: String,
    description: Option<String>,
    priority: String,
    due_date: Option<String>,
    category: String,
    status: String,
    created_date: String,
    completed_date: Option<String>,
    estimated_time: i64,
    actual_time: i64,
    tags: Option<String>,
    reminder_sent: bool,
}

impl TaskRow {
    /// Converts the row and derives its progress label from the stored due date text.
    pub(crate) fn into_listed(self, today: NaiveDate) -> crate::Result<ListedTask> {
        let status = parse_status(self.id, &self.status)?;
        let progress = Progress::compute(status, self.due_date.as_deref(), today);
        Ok(ListedTask {
            task: Task::try_from(self)?,
            progress,
        })
    }
}

impl TryFrom<TaskRow> for Task {
    type Error = Error;

    /// Fails with `ErrorType::Corrupt` if a stored value is outside the model. A stored due date
    /// that is not a date is read as no due date; `TaskRow::into_listed` reports it as `Unknown`.
    fn try_from(row: TaskRow) -> crate::Result<Self> {
        let id = row.id;
        let priority = Priority::from_str(&row.priority).map_err(|_| {
            Error::corrupt(format!(
                "Task {id} has an unknown priority '{}'",
                row.priority
            ))
        })?;
        let status = parse_status(id, &row.status)?;
        let created_at = parse_timestamp(id, "created date", &row.created_date)?;
        let completed_at = match row.completed_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => Some(parse_timestamp(id, "completed date", s)?),
        };
        let due_date = row
            .due_date
            .as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok());
        Ok(Task {
            id,
            title: row.title,
            description: row.description.filter(|d| !d.is_empty()),
            priority,
            due_date,
            category: row.category,
            status,
            created_at,
            completed_at,
            estimated_time: hours(id, "estimated time", row.estimated_time)?,
            actual_time: hours(id, "actual time", row.actual_time)?,
            tags: row.tags,
            reminder_sent: row.reminder_sent,
        })
    }
}

fn parse_status(id: i64, s: &str) -> crate::Result<Status> {
    Status::from_str(s)
        .map_err(|_| Error::corrupt(format!("Task {id} has an unknown status '{s}'")))
}

fn parse_timestamp(id: i64, what: &str, s: &str) -> crate::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT)
        .map_err(|_| Error::corrupt(format!("Task {id} has an invalid {what} '{s}'")))
}

fn hours(id: i64, what: &str, value: i64) -> crate::Result<u32> {
    u32::try_from(value)
        .map_err(|_| Error::corrupt(format!("Task {id} has an invalid {what} {value}")))
}
