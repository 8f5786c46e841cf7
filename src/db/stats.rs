use crate::db::tasks::push_overdue;
use crate::db::{today, Db};
use crate::error::{Error, ErrorType, IntoResult};
use crate::model::{Analytics, Priority, Status};
use crate::Result;
use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite};
use std::collections::BTreeMap;
use std::str::FromStr;

impl Db {
    /// Counts tasks by status, priority and category as of today.
    pub async fn analytics(&self) -> Result<Analytics> {
        self.analytics_on(today()).await
    }

    pub(crate) async fn analytics_on(&self, today: NaiveDate) -> Result<Analytics> {
        let total = self.count_where(None).await?;
        let completed = self.count_where(Some(Status::Completed)).await?;
        let pending = self.count_where(Some(Status::Pending)).await?;

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM tasks");
        push_overdue(&mut query, today);
        let overdue: i64 = query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .context("Unable to count overdue tasks")
            .pub_result(ErrorType::Io)?;

        let mut by_priority = BTreeMap::new();
        for (priority, n) in self.group_count("priority").await? {
            let priority = Priority::from_str(&priority).map_err(|_| {
                Error::corrupt(format!("A task has an unknown priority '{priority}'"))
            })?;
            by_priority.insert(priority, n);
        }
        let by_category = self.group_count("category").await?.into_iter().collect();

        Ok(Analytics {
            total,
            completed,
            pending,
            overdue: count(overdue),
            by_priority,
            by_category,
            completion_rate: Analytics::completion_rate(completed, total),
        })
    }

    async fn count_where(&self, status: Option<Status>) -> Result<u64> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM tasks");
        if let Some(status) = status {
            query.push(" WHERE status = ").push_bind(status.to_string());
        }
        let n: i64 = query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .context("Unable to count tasks")
            .pub_result(ErrorType::Io)?;
        Ok(count(n))
    }

    /// `column` is one of our own column names, never user input.
    async fn group_count(&self, column: &'static str) -> Result<Vec<(String, u64)>> {
        let sql =
            format!("SELECT {column}, COUNT(*) FROM tasks GROUP BY {column} ORDER BY {column}");
        let rows: Vec<(String, i64)> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Unable to count tasks by {column}"))
            .pub_result(ErrorType::Io)?;
        Ok(rows.into_iter().map(|(k, n)| (k, count(n))).collect())
    }
}

fn count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use crate::model::{Priority, TaskDraft};
    use crate::test::{date, TestEnv};

    #[tokio::test]
    async fn test_analytics_empty() {
        let env = TestEnv::new().await;
        let stats = env.db().analytics().await.unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completion_rate, 0.0);
        assert!(stats.by_priority.is_empty());
        assert!(stats.by_category.is_empty());
    }

    #[tokio::test]
    async fn test_analytics_counts() {
        let env = TestEnv::new().await;
        let db = env.db();
        let a = db
            .add_task(&TaskDraft::new("a").priority("High").category("Work"))
            .await
            .unwrap();
        db.add_task(&TaskDraft::new("b").priority("High").due_date("2025-01-01"))
            .await
            .unwrap();
        db.add_task(&TaskDraft::new("c").category("Work")).await.unwrap();
        let d = db
            .add_task(&TaskDraft::new("d").priority("low").due_date("2025-01-01"))
            .await
            .unwrap();
        db.complete_task(a.id()).await.unwrap();
        db.complete_task(d.id()).await.unwrap();

        let stats = db.analytics_on(date("2025-02-01")).await.unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.completion_rate, 50.0);
        assert_eq!(stats.by_priority.get(&Priority::High), Some(&2));
        assert_eq!(stats.by_priority.get(&Priority::Medium), Some(&1));
        assert_eq!(stats.by_priority.get(&Priority::Low), Some(&1));
        assert_eq!(stats.by_category.get("Work"), Some(&2));
        assert_eq!(stats.by_category.get("General"), Some(&2));
        assert_eq!(stats.tips(), vec!["Focus on overdue tasks first!"]);
    }
}
