//! Single-task operations and filtered listing on the `tasks` table.

use crate::db::{format_date, format_timestamp, now, today, Db, TaskRow};
use crate::error::{Error, ErrorType, IntoResult};
use crate::model::{Filter, ListedTask, Priority, Status, Task, TaskDraft, TaskFields};
use crate::Result;
use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{QueryBuilder, Sqlite};
use tracing::debug;

impl Db {
    /// Validates `draft` and inserts it as a new Pending task.
    ///
    /// # Errors
    /// - `ErrorType::Validation` if the draft is rejected, in which case nothing is written.
    pub async fn add_task(&self, draft: &TaskDraft) -> Result<Task> {
        let fields = draft.validate()?;
        self.add_task_at(&fields, now()).await
    }

    pub(crate) async fn add_task_at(
        &self,
        fields: &TaskFields,
        created_at: NaiveDateTime,
    ) -> Result<Task> {
        let row: TaskRow = sqlx::query_as(
            "INSERT INTO tasks \
             (title, description, priority, due_date, category, status, created_date, \
             estimated_time) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING *",
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.priority.to_string())
        .bind(fields.due_date.map(format_date))
        .bind(&fields.category)
        .bind(Status::Pending.to_string())
        .bind(format_timestamp(created_at))
        .bind(i64::from(fields.estimated_time))
        .fetch_one(&self.pool)
        .await
        .context("Unable to insert task")
        .pub_result(ErrorType::Io)?;
        let task = Task::try_from(row)?;
        debug!("Added task {}", task.id());
        Ok(task)
    }

    /// Validates `draft` and replaces the editable fields of task `id`. Status and timestamps are
    /// left alone. Moving the due date clears `reminder_sent` so the new date gets its reminder.
    pub async fn update_task(&self, id: i64, draft: &TaskDraft) -> Result<Task> {
        let fields = draft.validate()?;
        let row: Option<TaskRow> = sqlx::query_as(
            "UPDATE tasks \
             SET title = ?, description = ?, priority = ?, due_date = ?, category = ?, \
             estimated_time = ?, \
             reminder_sent = CASE WHEN due_date IS ? THEN reminder_sent ELSE 0 END \
             WHERE id = ? \
             RETURNING *",
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.priority.to_string())
        .bind(fields.due_date.map(format_date))
        .bind(&fields.category)
        .bind(i64::from(fields.estimated_time))
        .bind(fields.due_date.map(format_date))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Unable to update task {id}"))
        .pub_result(ErrorType::Io)?;
        Task::try_from(row.ok_or_else(|| missing(id))?)
    }

    /// Permanently removes task `id` and returns what was removed.
    pub async fn delete_task(&self, id: i64) -> Result<Task> {
        let row: Option<TaskRow> = sqlx::query_as("DELETE FROM tasks WHERE id = ? RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Unable to delete task {id}"))
            .pub_result(ErrorType::Io)?;
        Task::try_from(row.ok_or_else(|| missing(id))?)
    }

    /// Marks task `id` Completed. Completing a task again re-stamps its completion time.
    pub async fn complete_task(&self, id: i64) -> Result<Task> {
        self.complete_task_at(id, now()).await
    }

    pub(crate) async fn complete_task_at(
        &self,
        id: i64,
        completed_at: NaiveDateTime,
    ) -> Result<Task> {
        let row: Option<TaskRow> = sqlx::query_as(
            "UPDATE tasks SET status = ?, completed_date = ? WHERE id = ? RETURNING *",
        )
        .bind(Status::Completed.to_string())
        .bind(format_timestamp(completed_at))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Unable to complete task {id}"))
        .pub_result(ErrorType::Io)?;
        Task::try_from(row.ok_or_else(|| missing(id))?)
    }

    pub async fn get_task(&self, id: i64) -> Result<Task> {
        let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Unable to read task {id}"))
            .pub_result(ErrorType::Io)?;
        Task::try_from(row.ok_or_else(|| missing(id))?)
    }

    /// Lists the tasks selected by `filter`, each with its progress label as of today.
    pub async fn list_tasks(&self, filter: Filter) -> Result<Vec<ListedTask>> {
        self.list_tasks_on(filter, today()).await
    }

    pub(crate) async fn list_tasks_on(
        &self,
        filter: Filter,
        today: NaiveDate,
    ) -> Result<Vec<ListedTask>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM tasks");
        match filter {
            Filter::All => {}
            Filter::HighPriority => push_priority(&mut query, Priority::High),
            Filter::MediumPriority => push_priority(&mut query, Priority::Medium),
            Filter::LowPriority => push_priority(&mut query, Priority::Low),
            Filter::Pending | Filter::Completed => {
                let status = if filter == Filter::Pending {
                    Status::Pending
                } else {
                    Status::Completed
                };
                query.push(" WHERE status = ").push_bind(status.to_string());
            }
            Filter::Overdue => {
                push_overdue(&mut query, today);
            }
        }
        if filter == Filter::Overdue {
            query.push(" ORDER BY due_date ASC, id ASC");
        } else {
            query.push(" ORDER BY created_date DESC, id DESC");
        }

        let rows: Vec<TaskRow> = query
            .build_query_as::<TaskRow>()
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Unable to list tasks with filter '{filter}'"))
            .pub_result(ErrorType::Io)?;
        rows.into_iter().map(|row| row.into_listed(today)).collect()
    }

    /// Every task in id order.
    pub async fn all_tasks(&self) -> Result<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as("SELECT * FROM tasks ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .context("Unable to read tasks")
            .pub_result(ErrorType::Io)?;
        rows.into_iter().map(Task::try_from).collect()
    }

    /// Pending tasks due on `date` that have not been reminded about yet.
    pub async fn due_for_reminder(&self, date: NaiveDate) -> Result<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT * FROM tasks \
             WHERE status = ? AND due_date = ? AND reminder_sent = 0 \
             ORDER BY id ASC",
        )
        .bind(Status::Pending.to_string())
        .bind(format_date(date))
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Unable to query tasks due on {date}"))
        .pub_result(ErrorType::Io)?;
        rows.into_iter().map(Task::try_from).collect()
    }

    pub async fn mark_reminder_sent(&self, id: i64) -> Result<()> {
        let result = sqlx::query("UPDATE tasks SET reminder_sent = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Unable to flag the reminder for task {id}"))
            .pub_result(ErrorType::Io)?;
        if result.rows_affected() == 0 {
            return Err(missing(id));
        }
        Ok(())
    }

    /// Flags every task in `ids` in one transaction. Nothing is flagged if any id is missing.
    pub async fn mark_reminders_sent(&self, ids: &[i64]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Unable to start reminder transaction")
            .pub_result(ErrorType::Io)?;
        for &id in ids {
            let result = sqlx::query("UPDATE tasks SET reminder_sent = 1 WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Unable to flag the reminder for task {id}"))
                .pub_result(ErrorType::Io)?;
            if result.rows_affected() == 0 {
                return Err(missing(id));
            }
        }
        tx.commit()
            .await
            .context("Unable to commit reminder flags")
            .pub_result(ErrorType::Io)
    }
}

fn push_priority(query: &mut QueryBuilder<'_, Sqlite>, priority: Priority) {
    query.push(" WHERE priority = ").push_bind(priority.to_string());
}

/// Appends the overdue predicate. Dates are stored as `YYYY-MM-DD`, so text comparison orders them.
pub(super) fn push_overdue(query: &mut QueryBuilder<'_, Sqlite>, today: NaiveDate) {
    query
        .push(" WHERE due_date IS NOT NULL AND due_date < ")
        .push_bind(format_date(today))
        .push(" AND status != ")
        .push_bind(Status::Completed.to_string());
}

fn missing(id: i64) -> Error {
    Error::not_found(format!("Task with ID {id} not found"))
}
