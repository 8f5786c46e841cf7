//! Types that represent the core data model, such as `Expense` and `Task`.
mod amount;
mod expense;
mod task;

pub use amount::{Amount, AmountError};
pub use expense::{title_case, Expense, MonthTotal, MonthlySummary, EXPENSE_HEADERS};
pub(crate) use expense::ExpenseRow;
pub use task::{
    parse_due_date, Analytics, Filter, ListedTask, Priority, Progress, Status, Task, TaskDraft,
    TaskFields, DATE_FORMAT, DEFAULT_CATEGORY, DUE_DATE_PLACEHOLDER, EXPORT_HEADERS,
    TIMESTAMP_FORMAT,
};
pub(crate) use task::{ImportedTask, TaskCsvRow};
