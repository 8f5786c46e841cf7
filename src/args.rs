//! These structs provide the CLI interface for the daybook CLI.

use crate::model::{Filter, Task, TaskDraft};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// daybook: A command-line ledger for expenses and tasks.
///
/// Expenses are kept in a CSV file and addressed by their row position. Tasks are kept in a SQLite
/// database with priorities, due dates and categories. A reminder loop can watch for tasks that
/// are due tomorrow.
///
/// Run `daybook init` once to create the home directory before using the other commands.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory with its config file, expenses file and task database.
    ///
    /// By default the home directory is $HOME/daybook. Pass --daybook-home or set DAYBOOK_HOME to
    /// put it somewhere else, and use the same setting for every later command.
    Init,
    /// Add, list, delete and summarize expenses.
    #[command(subcommand)]
    Expense(ExpenseCommand),
    /// Add, edit, complete, list and report on tasks.
    #[command(subcommand)]
    Task(TaskCommand),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where daybook data and configuration is held. Defaults to ~/daybook
    #[arg(long, env = "DAYBOOK_HOME", default_value_t = default_daybook_home())]
    daybook_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, daybook_home: PathBuf) -> Self {
        Self {
            log_level,
            daybook_home: daybook_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn daybook_home(&self) -> &DisplayPath {
        &self.daybook_home
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ExpenseCommand {
    /// Record an expense dated today.
    Add(ExpenseAddArgs),
    /// List every expense with its position.
    List,
    /// Delete the expense at a position shown by `expense list`. Later positions move up by one.
    Delete(ExpenseDeleteArgs),
    /// Total the expenses of each month.
    Summary,
}

/// (Not shown): Args for the `daybook expense add` command.
#[derive(Debug, Parser, Clone, Serialize, Deserialize)]
pub struct ExpenseAddArgs {
    /// A short label, e.g. food. It is stored title-cased.
    #[arg(long)]
    category: String,

    /// Free text describing the expense.
    #[arg(long, default_value = "")]
    description: String,

    /// The amount spent, e.g. 12.50
    #[arg(long, allow_hyphen_values = true)]
    amount: String,
}

impl ExpenseAddArgs {
    pub fn new(
        category: impl Into<String>,
        description: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            description: description.into(),
            amount: amount.into(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }
}

/// (Not shown): Args for the `daybook expense delete` command.
#[derive(Debug, Parser, Clone, Serialize, Deserialize)]
pub struct ExpenseDeleteArgs {
    /// The 1-based position of the expense.
    #[arg(allow_hyphen_values = true)]
    position: String,
}

impl ExpenseDeleteArgs {
    pub fn new(position: impl Into<String>) -> Self {
        Self {
            position: position.into(),
        }
    }

    pub fn position(&self) -> &str {
        &self.position
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum TaskCommand {
    /// Add a new Pending task.
    Add(TaskAddArgs),
    /// Edit a task. Options that are not given keep their current values.
    Update(TaskUpdateArgs),
    /// Permanently delete a task.
    Delete(TaskIdArgs),
    /// Mark a task as Completed.
    Complete(TaskIdArgs),
    /// Show one task.
    Show(TaskIdArgs),
    /// List tasks, newest first, with their progress.
    List(TaskListArgs),
    /// Show task statistics and productivity tips.
    Stats,
    /// Write every task to a CSV file.
    Export(TaskFileArgs),
    /// Add tasks from a CSV file written by `task export`.
    Import(TaskFileArgs),
    /// Watch for tasks that are due tomorrow until interrupted with Ctrl-C.
    Remind(RemindArgs),
}

/// (Not shown): Args for the `daybook task add` command.
#[derive(Debug, Parser, Clone, Default, Serialize, Deserialize)]
pub struct TaskAddArgs {
    #[arg(long)]
    title: String,

    #[arg(long, default_value = "")]
    description: String,

    /// High, Medium or Low. Defaults to Medium.
    #[arg(long, default_value = "")]
    priority: String,

    /// Defaults to General.
    #[arg(long, default_value = "")]
    category: String,

    /// The due date as YYYY-MM-DD.
    #[arg(long, default_value = "")]
    due: String,

    /// Estimated hours of work.
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    estimate: String,
}

impl TaskAddArgs {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = priority.into();
        self
    }

    pub fn due(mut self, due: impl Into<String>) -> Self {
        self.due = due.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// The raw input as a draft for validation.
    pub fn draft(&self) -> TaskDraft {
        TaskDraft::new(&self.title)
            .description(&self.description)
            .priority(&self.priority)
            .category(&self.category)
            .due_date(&self.due)
            .estimated_time(&self.estimate)
    }
}

/// (Not shown): Args for the `daybook task update` command.
#[derive(Debug, Parser, Clone, Default, Serialize, Deserialize)]
pub struct TaskUpdateArgs {
    id: i64,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    priority: Option<String>,

    #[arg(long)]
    category: Option<String>,

    /// The due date as YYYY-MM-DD. Pass an empty string to clear it.
    #[arg(long)]
    due: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    estimate: Option<String>,
}

impl TaskUpdateArgs {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn due(mut self, due: impl Into<String>) -> Self {
        self.due = Some(due.into());
        self
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    /// Builds the replacement draft: given options win, the rest come from `current`.
    pub fn draft(&self, current: &Task) -> TaskDraft {
        let mut draft = current.to_draft();
        let overlay = [
            (&mut draft.title, &self.title),
            (&mut draft.description, &self.description),
            (&mut draft.priority, &self.priority),
            (&mut draft.category, &self.category),
            (&mut draft.due_date, &self.due),
            (&mut draft.estimated_time, &self.estimate),
        ];
        for (field, given) in overlay {
            if let Some(value) = given {
                field.clone_from(value);
            }
        }
        draft
    }
}

/// (Not shown): Args for task commands that take only an id.
#[derive(Debug, Parser, Clone, Serialize, Deserialize)]
pub struct TaskIdArgs {
    id: i64,
}

impl TaskIdArgs {
    pub fn new(id: i64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> i64 {
        self.id
    }
}

/// (Not shown): Args for the `daybook task list` command.
#[derive(Debug, Parser, Clone, Default, Serialize, Deserialize)]
pub struct TaskListArgs {
    /// Which tasks to show.
    #[arg(long, value_enum, default_value_t = Filter::All)]
    filter: Filter,
}

impl TaskListArgs {
    pub fn new(filter: Filter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }
}

/// (Not shown): Args for the `daybook task export` and `daybook task import` commands.
#[derive(Debug, Parser, Clone, Serialize, Deserialize)]
pub struct TaskFileArgs {
    /// The CSV file to write or read.
    path: PathBuf,
}

impl TaskFileArgs {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// (Not shown): Args for the `daybook task remind` command.
#[derive(Debug, Parser, Clone, Default, Serialize, Deserialize)]
pub struct RemindArgs {
    /// Run a single scan and exit.
    #[arg(long)]
    once: bool,

    /// Seconds between scans. Defaults to reminder_interval_secs from config.json.
    #[arg(long)]
    interval_secs: Option<u64>,
}

impl RemindArgs {
    pub fn new(once: bool, interval_secs: Option<u64>) -> Self {
        Self {
            once,
            interval_secs,
        }
    }

    pub fn once(&self) -> bool {
        self.once
    }

    pub fn interval_secs(&self) -> Option<u64> {
        self.interval_secs
    }
}

fn default_daybook_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("daybook"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --daybook-home or DAYBOOK_HOME instead of relying on the default \
                daybook home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("daybook")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["daybook", "--daybook-home", "/tmp/dbk"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_parse_expense_add() {
        let args = parse(&["expense", "add", "--category", "food", "--amount", "-3.5"]);
        assert_eq!(args.common().daybook_home().path(), Path::new("/tmp/dbk"));
        assert_eq!(args.common().log_level(), LevelFilter::INFO);
        match args.command() {
            Command::Expense(ExpenseCommand::Add(add)) => {
                assert_eq!(add.category(), "food");
                assert_eq!(add.description(), "");
                assert_eq!(add.amount(), "-3.5");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_task_list_filter() {
        let args = parse(&["task", "list", "--filter", "overdue"]);
        match args.command() {
            Command::Task(TaskCommand::List(list)) => assert_eq!(list.filter(), Filter::Overdue),
            other => panic!("unexpected command {other:?}"),
        }
        let args = parse(&["task", "list"]);
        match args.command() {
            Command::Task(TaskCommand::List(list)) => assert_eq!(list.filter(), Filter::All),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_remind() {
        let args = parse(&["--log-level", "debug", "task", "remind", "--once"]);
        assert_eq!(args.common().log_level(), LevelFilter::DEBUG);
        match args.command() {
            Command::Task(TaskCommand::Remind(remind)) => {
                assert!(remind.once());
                assert_eq!(remind.interval_secs(), None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_update_draft_overlays_given_options() {
        let current = TaskAddArgs::new("Old title")
            .priority("Low")
            .due("2025-01-01")
            .category("Home")
            .draft()
            .validate()
            .unwrap();
        let task = Task {
            id: 1,
            title: current.title,
            description: Some("keep".to_string()),
            priority: current.priority,
            due_date: current.due_date,
            category: current.category,
            status: Default::default(),
            created_at: chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            completed_at: None,
            estimated_time: 2,
            actual_time: 0,
            tags: None,
            reminder_sent: false,
        };

        let draft = TaskUpdateArgs::new(1)
            .title("New title")
            .due("")
            .draft(&task);
        assert_eq!(draft.title, "New title");
        assert_eq!(draft.description, "keep");
        assert_eq!(draft.due_date, "");
        let fields = draft.validate().unwrap();
        assert_eq!(fields.priority, Priority::Low);
        assert_eq!(fields.category, "Home");
        assert_eq!(fields.due_date, None);
        assert_eq!(fields.estimated_time, 2);
    }
}
