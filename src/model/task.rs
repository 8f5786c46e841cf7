use crate::error::Error;
use crate::Result;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Format of `due_date` values.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format of `created_date` and `completed_date` values.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A due date input equal to this placeholder means "no due date".
pub const DUE_DATE_PLACEHOLDER: &str = "YYYY-MM-DD";

pub const DEFAULT_CATEGORY: &str = "General";

/// The header row of task export files.
pub const EXPORT_HEADERS: [&str; 11] = [
    "ID",
    "Title",
    "Description",
    "Priority",
    "Due Date",
    "Category",
    "Status",
    "Created Date",
    "Completed Date",
    "Estimated Time",
    "Actual Time",
];

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

serde_plain::derive_display_from_serialize!(Priority);
serde_plain::derive_fromstr_from_deserialize!(Priority);

impl Priority {
    /// Parses user input case-insensitively. Empty input means `Medium`.
    pub fn parse_input(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "low" => Ok(Priority::Low),
            _ => Err(Error::validation(format!(
                "Invalid priority '{}', expected one of High, Medium, Low",
                s.trim()
            ))),
        }
    }
}

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Status {
    #[default]
    Pending,
    Completed,
}

serde_plain::derive_display_from_serialize!(Status);
serde_plain::derive_fromstr_from_deserialize!(Status);

/// A named predicate selecting which tasks to list.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    #[value(name = "high")]
    #[serde(rename = "high")]
    HighPriority,
    #[value(name = "medium")]
    #[serde(rename = "medium")]
    MediumPriority,
    #[value(name = "low")]
    #[serde(rename = "low")]
    LowPriority,
    Pending,
    Completed,
    /// Due before today and not completed, soonest due first.
    Overdue,
}

serde_plain::derive_display_from_serialize!(Filter);
serde_plain::derive_fromstr_from_deserialize!(Filter);

/// A stored task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) priority: Priority,
    pub(crate) due_date: Option<NaiveDate>,
    pub(crate) category: String,
    pub(crate) status: Status,
    pub(crate) created_at: NaiveDateTime,
    pub(crate) completed_at: Option<NaiveDateTime>,
    pub(crate) estimated_time: u32,
    pub(crate) actual_time: u32,
    pub(crate) tags: Option<String>,
    pub(crate) reminder_sent: bool,
}

impl Task {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<NaiveDateTime> {
        self.completed_at
    }

    pub fn estimated_time(&self) -> u32 {
        self.estimated_time
    }

    pub fn actual_time(&self) -> u32 {
        self.actual_time
    }

    pub fn tags(&self) -> Option<&str> {
        self.tags.as_deref()
    }

    pub fn reminder_sent(&self) -> bool {
        self.reminder_sent
    }

    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    /// Creates a draft pre-filled with this task's editable fields.
    pub fn to_draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            description: self.description.clone().unwrap_or_default(),
            priority: self.priority.to_string(),
            category: self.category.clone(),
            due_date: self
                .due_date
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            estimated_time: self.estimated_time.to_string(),
        }
    }
}

/// Raw, unvalidated input for creating or editing a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: String,
    pub category: String,
    pub due_date: String,
    pub estimated_time: String,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = priority.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = due_date.into();
        self
    }

    pub fn estimated_time(mut self, estimated_time: impl Into<String>) -> Self {
        self.estimated_time = estimated_time.into();
        self
    }

    /// Validates the draft.
    ///
    /// # Errors
    /// - The trimmed title is empty.
    /// - The priority is not one of High, Medium, Low.
    /// - The due date is neither empty, the placeholder, nor a `YYYY-MM-DD` date.
    pub fn validate(&self) -> Result<TaskFields> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::validation("Task title is required"));
        }
        let description = Some(self.description.trim())
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        let priority = Priority::parse_input(&self.priority)?;
        let category = match self.category.trim() {
            "" => DEFAULT_CATEGORY.to_string(),
            c => c.to_string(),
        };
        let due_date = parse_due_date(&self.due_date)?;
        let estimated_time = self.estimated_time.trim().parse::<u32>().unwrap_or(0);
        Ok(TaskFields {
            title: title.to_string(),
            description,
            priority,
            category,
            due_date,
            estimated_time,
        })
    }
}

/// Parses a due date input. Empty input and the `YYYY-MM-DD` placeholder mean no due date.
pub fn parse_due_date(s: &str) -> Result<Option<NaiveDate>> {
    let s = s.trim();
    if s.is_empty() || s == DUE_DATE_PLACEHOLDER {
        return Ok(None);
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map(Some)
        .map_err(|_| Error::validation(format!("Invalid date format '{s}', use YYYY-MM-DD")))
}

/// The validated, editable fields of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFields {
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) priority: Priority,
    pub(crate) category: String,
    pub(crate) due_date: Option<NaiveDate>,
    pub(crate) estimated_time: u32,
}

/// How a task is doing relative to its due date. Derived when listing, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Progress {
    Done,
    Overdue,
    DaysRemaining(i64),
    /// A due date is stored but cannot be read as a date.
    Unknown,
    /// No due date.
    Ongoing,
}

impl Progress {
    /// Computes the progress of a task from its status and its stored due date text.
    pub fn compute(status: Status, due_date: Option<&str>, today: NaiveDate) -> Self {
        if status == Status::Completed {
            return Progress::Done;
        }
        match due_date.map(str::trim).filter(|s| !s.is_empty()) {
            None => Progress::Ongoing,
            Some(text) => match NaiveDate::parse_from_str(text, DATE_FORMAT) {
                Ok(due) if due < today => Progress::Overdue,
                Ok(due) => Progress::DaysRemaining((due - today).num_days()),
                Err(_) => Progress::Unknown,
            },
        }
    }
}

impl Display for Progress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Progress::Done => f.write_str("Done"),
            Progress::Overdue => f.write_str("Overdue"),
            Progress::DaysRemaining(n) => write!(f, "{n} days remaining"),
            Progress::Unknown => f.write_str("Unknown"),
            Progress::Ongoing => f.write_str("Ongoing"),
        }
    }
}

/// A task together with its derived progress label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedTask {
    pub task: Task,
    pub progress: Progress,
}

/// Aggregate statistics over all tasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
    pub overdue: u64,
    pub by_priority: BTreeMap<Priority, u64>,
    pub by_category: BTreeMap<String, u64>,
    /// Percentage of tasks that are completed, 0 when there are no tasks.
    pub completion_rate: f64,
}

impl Analytics {
    pub(crate) fn completion_rate(completed: u64, total: u64) -> f64 {
        if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64 * 100.0
        }
    }

    /// Short suggestions based on the numbers.
    pub fn tips(&self) -> Vec<&'static str> {
        let mut tips = Vec::new();
        if self.overdue > 0 {
            tips.push("Focus on overdue tasks first!");
        }
        if self.completion_rate < 50.0 {
            tips.push("Break large tasks into smaller ones");
        }
        if self.completion_rate > 80.0 {
            tips.push("Great job! Keep up the momentum");
        }
        tips
    }
}

/// A row of a task export file. The column order matches [`EXPORT_HEADERS`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct TaskCsvRow {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) priority: String,
    pub(crate) due_date: String,
    pub(crate) category: String,
    pub(crate) status: String,
    pub(crate) created_date: String,
    pub(crate) completed_date: String,
    pub(crate) estimated_time: u32,
    pub(crate) actual_time: u32,
}

impl From<&Task> for TaskCsvRow {
    fn from(t: &Task) -> Self {
        Self {
            id: t.id,
            title: t.title.clone(),
            description: t.description.clone().unwrap_or_default(),
            priority: t.priority.to_string(),
            due_date: t
                .due_date
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            category: t.category.clone(),
            status: t.status.to_string(),
            created_date: t.created_at.format(TIMESTAMP_FORMAT).to_string(),
            completed_date: t
                .completed_at
                .map(|d| d.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default(),
            estimated_time: t.estimated_time,
            actual_time: t.actual_time,
        }
    }
}

/// A task read from an import file, before it is given an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportedTask {
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) priority: Priority,
    pub(crate) due_date: Option<NaiveDate>,
    pub(crate) category: String,
    pub(crate) status: Status,
    pub(crate) created_at: NaiveDateTime,
}

impl ImportedTask {
    /// Reads an import record. Returns `None` for rows that cannot become a valid task: fewer than
    /// seven fields, an empty title, or an unknown priority or status. A bad due date is dropped
    /// and a missing or bad created timestamp falls back to `now`.
    pub(crate) fn from_record(record: &csv::StringRecord, now: NaiveDateTime) -> Option<Self> {
        if record.len() < 7 {
            return None;
        }
        let field = |ix: usize| record.get(ix).unwrap_or_default().trim();
        let title = field(1);
        if title.is_empty() {
            return None;
        }
        let priority = Priority::from_str(field(3)).ok()?;
        let status = Status::from_str(field(6)).ok()?;
        let created_at = record
            .get(7)
            .and_then(|s| NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT).ok())
            .unwrap_or(now);
        Some(Self {
            title: title.to_string(),
            description: Some(field(2)).filter(|d| !d.is_empty()).map(str::to_string),
            priority,
            due_date: parse_due_date(field(4)).ok().flatten(),
            category: match field(5) {
                "" => DEFAULT_CATEGORY.to_string(),
                c => c.to_string(),
            },
            status,
            created_at,
        })
    }
}
