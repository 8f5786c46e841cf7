//! Bulk export and import of tasks as CSV.

use crate::db::{format_date, format_timestamp, now, Db};
use crate::error::{ErrorType, IntoResult};
use crate::model::{ImportedTask, Status, TaskCsvRow, EXPORT_HEADERS};
use crate::{utils, Result};
use anyhow::Context;
use chrono::NaiveDateTime;
use std::path::Path;
use tracing::{debug, info};

impl Db {
    /// Writes every task, in id order, to a CSV file at `path`. Returns the number of tasks
    /// written.
    pub async fn export(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let tasks = self.all_tasks().await?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer
            .write_record(EXPORT_HEADERS)
            .context("Unable to write export header")
            .pub_result(ErrorType::Io)?;
        for task in &tasks {
            writer
                .serialize(TaskCsvRow::from(task))
                .with_context(|| format!("Unable to serialize task {}", task.id()))
                .pub_result(ErrorType::Io)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Unable to flush the export writer: {e}"))
            .pub_result(ErrorType::Io)?;
        utils::write(path, bytes).await.pub_result(ErrorType::Io)?;
        info!("Exported {} tasks to {}", tasks.len(), path.display());
        Ok(tasks.len())
    }

    /// Reads tasks from a CSV file at `path` and inserts each as a new task with a fresh id. The
    /// first row is a header. Rows that cannot become a valid task are skipped. Returns the number
    /// of tasks imported. Either every accepted row is inserted or none is.
    pub async fn import(&self, path: impl AsRef<Path>) -> Result<usize> {
        self.import_at(path.as_ref(), now()).await
    }

    pub(crate) async fn import_at(&self, path: &Path, now: NaiveDateTime) -> Result<usize> {
        let bytes = utils::read_bytes(path).await.pub_result(ErrorType::Io)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes.as_slice());

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Unable to start import transaction")
            .pub_result(ErrorType::Io)?;
        let mut imported = 0;
        for (ix, record) in reader.records().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    debug!("Skipping unreadable import row {}: {e}", ix + 2);
                    continue;
                }
            };
            let Some(task) = ImportedTask::from_record(&record, now) else {
                debug!("Skipping import row {} with {} fields", ix + 2, record.len());
                continue;
            };
            let created = format_timestamp(task.created_at);
            let completed = (task.status == Status::Completed).then(|| created.clone());
            sqlx::query(
                "INSERT INTO tasks \
                 (title, description, priority, due_date, category, status, created_date, \
                 completed_date) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.priority.to_string())
            .bind(task.due_date.map(format_date))
            .bind(&task.category)
            .bind(task.status.to_string())
            .bind(created)
            .bind(completed)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Unable to import row {}", ix + 2))
            .pub_result(ErrorType::Io)?;
            imported += 1;
        }
        tx.commit()
            .await
            .context("Unable to commit import")
            .pub_result(ErrorType::Io)?;
        info!("Imported {imported} tasks from {}", path.display());
        Ok(imported)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Filter, Priority, Status, TaskDraft, EXPORT_HEADERS};
    use crate::test::{timestamp, TestEnv};
    use crate::utils;

    #[tokio::test]
    async fn test_export_writes_header_and_rows() {
        let env = TestEnv::new().await;
        let db = env.db();
        let first = db
            .add_task(&TaskDraft::new("Pay, rent").priority("High").due_date("2025-04-01"))
            .await
            .unwrap();
        db.add_task(&TaskDraft::new("Call mom")).await.unwrap();
        db.complete_task(first.id()).await.unwrap();

        let path = env.path("tasks.csv");
        assert_eq!(db.export(&path).await.unwrap(), 2);

        let text = utils::read(&path).await.unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), EXPORT_HEADERS.join(","));
        let row = lines.next().unwrap();
        let expected = format!(
            "{},\"Pay, rent\",,High,2025-04-01,General,Completed,",
            first.id()
        );
        assert!(row.starts_with(&expected), "{row}");
        assert!(lines.next().unwrap().contains("Call mom"));
        assert!(lines.next().is_none());
    }

    #[tokio::test]
    async fn test_export_then_import_reproduces_tasks() {
        let source = TestEnv::new().await;
        let db = source.db();
        db.add_task(&TaskDraft::new("one").priority("Low").category("Home"))
            .await
            .unwrap();
        let two = db
            .add_task(&TaskDraft::new("two").due_date("2025-06-30"))
            .await
            .unwrap();
        db.complete_task(two.id()).await.unwrap();
        let path = source.path("export.csv");
        db.export(&path).await.unwrap();

        let target = TestEnv::new().await;
        assert_eq!(target.db().import(&path).await.unwrap(), 2);
        let mut imported = target.db().all_tasks().await.unwrap();
        imported.sort_by(|a, b| a.title().cmp(b.title()));
        assert_eq!(imported[0].title(), "one");
        assert_eq!(imported[0].priority(), Priority::Low);
        assert_eq!(imported[0].category(), "Home");
        assert_eq!(imported[0].status(), Status::Pending);
        assert_eq!(imported[1].title(), "two");
        assert_eq!(imported[1].status(), Status::Completed);
        assert_eq!(imported[1].created_at(), two.created_at());
        assert_eq!(imported[1].completed_at(), Some(two.created_at()));
        assert_eq!(imported[1].due_date(), two.due_date());
    }

    #[tokio::test]
    async fn test_import_skips_short_and_invalid_rows() {
        let env = TestEnv::new().await;
        let path = env.path("import.csv");
        let text = "\
ID,Title,Description,Priority,Due Date,Category,Status,Created Date
1,short,row,High,2025-01-01
2,Full row,desc,High,not-a-date,Work,Pending,2024-12-01 10:00:00
3,,no title,High,,Work,Pending
4,bad priority,,Urgent,,Work,Pending
";
        utils::write(&path, text).await.unwrap();

        let now = timestamp("2025-01-15 12:00:00");
        assert_eq!(env.db().import_at(&path, now).await.unwrap(), 1);

        let tasks = env.db().all_tasks().await.unwrap();
        assert_eq!(tasks.len(), 1);
        let task = &tasks[0];
        assert_eq!(task.title(), "Full row");
        assert_eq!(task.description(), Some("desc"));
        assert_eq!(task.due_date(), None);
        assert_eq!(task.created_at(), timestamp("2024-12-01 10:00:00"));
    }

    #[tokio::test]
    async fn test_import_assigns_new_ids_and_defaults_created() {
        let env = TestEnv::new().await;
        let existing = env.add("existing").await;
        let path = env.path("import.csv");
        let text = format!(
            "ID,Title,Description,Priority,Due Date,Category,Status\n{},copy,,Medium,,,Pending\n",
            existing.id()
        );
        utils::write(&path, text).await.unwrap();

        let now = timestamp("2025-01-15 12:00:00");
        assert_eq!(env.db().import_at(&path, now).await.unwrap(), 1);
        let listed = env.db().list_tasks(Filter::All).await.unwrap();
        assert_eq!(listed.len(), 2);
        let copy = listed.iter().find(|l| l.task.title() == "copy").unwrap();
        assert_ne!(copy.task.id(), existing.id());
        assert_eq!(copy.task.created_at(), now);
        assert_eq!(copy.task.category(), "General");
    }

    #[tokio::test]
    async fn test_import_missing_file() {
        let env = TestEnv::new().await;
        let err = env.db().import(env.path("nope.csv")).await.unwrap_err();
        assert_eq!(err.error_type(), crate::ErrorType::Io);
    }
}
