//! Task command handlers.

use crate::args::{
    RemindArgs, TaskAddArgs, TaskFileArgs, TaskIdArgs, TaskListArgs, TaskUpdateArgs,
};
use crate::commands::{plural, table, Out};
use crate::db::today;
use crate::error::Error;
use crate::model::{Analytics, ListedTask, Progress, Task};
use crate::reminder::{self, Reminder};
use crate::{Config, Result};
use comfy_table::{Cell, Color};
use std::time::Duration;
use tracing::{info, warn};

const LIST_HEADERS: [&str; 7] = [
    "ID", "Title", "Priority", "Due", "Category", "Status", "Progress",
];

/// Adds a new Pending task.
pub async fn task_add(config: &Config, args: &TaskAddArgs) -> Result<Out<Task>> {
    let task = config.db().add_task(&args.draft()).await?;
    let message = format!("Added task {}: {}", task.id(), task.title());
    Ok(Out::new(message, task))
}

/// Edits a task. Options that were not given keep the task's current values.
pub async fn task_update(config: &Config, args: &TaskUpdateArgs) -> Result<Out<Task>> {
    let current = config.db().get_task(args.id()).await?;
    let task = config
        .db()
        .update_task(args.id(), &args.draft(&current))
        .await?;
    let message = format!("Updated task {}: {}", task.id(), task.title());
    Ok(Out::new(message, task))
}

pub async fn task_delete(config: &Config, args: &TaskIdArgs) -> Result<Out<Task>> {
    let task = config.db().delete_task(args.id()).await?;
    let message = format!("Deleted task {}: {}", task.id(), task.title());
    Ok(Out::new(message, task))
}

pub async fn task_complete(config: &Config, args: &TaskIdArgs) -> Result<Out<Task>> {
    let task = config.db().complete_task(args.id()).await?;
    let message = format!("Completed task {}: {}", task.id(), task.title());
    Ok(Out::new(message, task))
}

pub async fn task_show(config: &Config, args: &TaskIdArgs) -> Result<Out<Task>> {
    let task = config.db().get_task(args.id()).await?;
    Ok(Out::new(describe(&task), task))
}

/// Lists the tasks selected by the filter, each with its progress label.
pub async fn task_list(config: &Config, args: &TaskListArgs) -> Result<Out<Vec<ListedTask>>> {
    let listed = config.db().list_tasks(args.filter()).await?;
    if listed.is_empty() {
        return Ok(Out::new(
            format!("No tasks match the filter '{}'", args.filter()),
            listed,
        ));
    }
    let mut rendered = table(&LIST_HEADERS);
    for l in &listed {
        let t = &l.task;
        let progress_color = match l.progress {
            Progress::Done => Color::Green,
            Progress::Overdue => Color::Red,
            _ => Color::Reset,
        };
        rendered.add_row(vec![
            Cell::new(t.id()),
            Cell::new(t.title()),
            Cell::new(t.priority()),
            Cell::new(t.due_date().map(|d| d.to_string()).unwrap_or_default()),
            Cell::new(t.category()),
            Cell::new(t.status()),
            Cell::new(l.progress).fg(progress_color),
        ]);
    }
    let message = format!(
        "{} task{}\n{rendered}",
        listed.len(),
        plural(listed.len()),
    );
    Ok(Out::new(message, listed))
}

/// Shows task counts, the completion rate and productivity tips.
pub async fn task_stats(config: &Config) -> Result<Out<Analytics>> {
    let stats = config.db().analytics().await?;
    let mut lines = vec![
        format!("Total tasks: {}", stats.total),
        format!("Completed: {}", stats.completed),
        format!("Pending: {}", stats.pending),
        format!("Overdue: {}", stats.overdue),
        format!("Completion rate: {:.1}%", stats.completion_rate),
    ];
    if !stats.by_priority.is_empty() {
        lines.push("By priority:".to_string());
        for (priority, n) in &stats.by_priority {
            lines.push(format!("  {priority}: {n}"));
        }
    }
    if !stats.by_category.is_empty() {
        lines.push("By category:".to_string());
        for (category, n) in &stats.by_category {
            lines.push(format!("  {category}: {n}"));
        }
    }
    let tips = stats.tips();
    if !tips.is_empty() {
        lines.push("Tips:".to_string());
        lines.extend(tips.into_iter().map(|tip| format!("  {tip}")));
    }
    Ok(Out::new(lines.join("\n"), stats))
}

pub async fn task_export(config: &Config, args: &TaskFileArgs) -> Result<Out<usize>> {
    let count = config.db().export(args.path()).await?;
    let message = format!(
        "Exported {count} task{} to {}",
        plural(count),
        args.path().display()
    );
    Ok(Out::new(message, count))
}

pub async fn task_import(config: &Config, args: &TaskFileArgs) -> Result<Out<usize>> {
    let count = config.db().import(args.path()).await?;
    let message = format!(
        "Imported {count} task{} from {}",
        plural(count),
        args.path().display()
    );
    Ok(Out::new(message, count))
}

/// Reports tasks due tomorrow. With `--once` a single scan runs; otherwise the reminder loop runs
/// until Ctrl-C.
pub async fn task_remind(config: &Config, args: &RemindArgs) -> Result<Out<Vec<Reminder>>> {
    let mark_sent = config.mark_reminders_sent();
    if args.once() {
        let reminders = reminder::scan(config.db(), today(), mark_sent).await?;
        let mut lines = vec![format!(
            "{} task{} due tomorrow",
            reminders.len(),
            plural(reminders.len())
        )];
        lines.extend(reminders.iter().map(Reminder::to_string));
        return Ok(Out::new(lines.join("\n"), reminders));
    }

    let interval = match args.interval_secs() {
        Some(0) => return Err(Error::validation("--interval-secs must be greater than zero")),
        Some(secs) => Duration::from_secs(secs),
        None => config.reminder_interval(),
    };
    let mut handle = reminder::spawn(config.db().clone(), interval, mark_sent);
    info!(
        "Watching for tasks due tomorrow every {}s, press Ctrl-C to stop",
        interval.as_secs()
    );
    let mut sent = Vec::new();
    loop {
        tokio::select! {
            next = handle.recv() => match next {
                Some(reminder) => {
                    info!("Reminder: {reminder}");
                    sent.push(reminder);
                }
                None => break,
            },
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!("Unable to listen for Ctrl-C: {e}");
                }
                break;
            }
        }
    }
    for reminder in handle.shutdown().await {
        info!("Reminder: {reminder}");
        sent.push(reminder);
    }
    let message = format!(
        "Reminder loop stopped after {} reminder{}",
        sent.len(),
        plural(sent.len())
    );
    Ok(Out::new(message, sent))
}

fn describe(task: &Task) -> String {
    let mut lines = vec![
        format!("Task {}: {}", task.id(), task.title()),
        format!("  Priority: {}", task.priority()),
        format!("  Category: {}", task.category()),
        format!("  Status: {}", task.status()),
    ];
    if let Some(description) = task.description() {
        lines.push(format!("  Description: {description}"));
    }
    if let Some(due) = task.due_date() {
        lines.push(format!("  Due: {due}"));
    }
    lines.push(format!("  Created: {}", task.created_at()));
    if let Some(completed) = task.completed_at() {
        lines.push(format!("  Completed: {completed}"));
    }
    lines.push(format!("  Estimated hours: {}", task.estimated_time()));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Filter, Priority, Progress, Status};
    use crate::test::TestEnv;
    use crate::ErrorType;

    #[tokio::test]
    async fn test_task_add_and_show() {
        let env = TestEnv::new().await;
        let config = env.config();
        let args = TaskAddArgs::new("Write report")
            .priority("high")
            .due("2030-01-01");
        let added = task_add(&config, &args).await.unwrap();
        let task = added.structure().unwrap().clone();
        assert_eq!(task.priority(), Priority::High);
        assert!(added.message().contains("Write report"));

        let shown = task_show(&config, &TaskIdArgs::new(task.id()))
            .await
            .unwrap();
        assert_eq!(shown.structure().unwrap(), &task);
        assert!(shown.message().contains("Due: 2030-01-01"));
        assert!(!shown.message().contains("Completed:"));
    }

    #[tokio::test]
    async fn test_task_add_invalid() {
        let env = TestEnv::new().await;
        let err = task_add(&env.config(), &TaskAddArgs::new("t").due("tomorrow"))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_task_update_keeps_omitted_fields() {
        let env = TestEnv::new().await;
        let config = env.config();
        let task = task_add(
            &config,
            &TaskAddArgs::new("Plan trip")
                .priority("Low")
                .category("Travel"),
        )
        .await
        .unwrap()
        .structure()
        .unwrap()
        .clone();

        let out = task_update(&config, &TaskUpdateArgs::new(task.id()).due("2030-05-05"))
            .await
            .unwrap();
        let updated = out.structure().unwrap();
        assert_eq!(updated.title(), "Plan trip");
        assert_eq!(updated.priority(), Priority::Low);
        assert_eq!(updated.category(), "Travel");
        assert_eq!(updated.due_date().unwrap().to_string(), "2030-05-05");

        let err = task_update(&config, &TaskUpdateArgs::new(999).title("x"))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::NotFound);
    }

    #[tokio::test]
    async fn test_task_complete_and_delete() {
        let env = TestEnv::new().await;
        let config = env.config();
        let task = env.add("Laundry").await;

        let done = task_complete(&config, &TaskIdArgs::new(task.id()))
            .await
            .unwrap();
        assert_eq!(done.structure().unwrap().status(), Status::Completed);

        task_delete(&config, &TaskIdArgs::new(task.id()))
            .await
            .unwrap();
        let err = task_show(&config, &TaskIdArgs::new(task.id()))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_task_list_table() {
        let env = TestEnv::new().await;
        let config = env.config();
        let empty = task_list(&config, &TaskListArgs::new(Filter::All))
            .await
            .unwrap();
        assert!(empty.message().contains("No tasks"));

        env.add("first").await;
        let late = task_add(&config, &TaskAddArgs::new("late").due("2000-01-01"))
            .await
            .unwrap();
        let out = task_list(&config, &TaskListArgs::new(Filter::All))
            .await
            .unwrap();
        assert!(out.message().starts_with("2 tasks\n"));
        assert!(out.message().contains("Overdue"));
        assert!(out.message().contains("Ongoing"));

        let overdue = task_list(&config, &TaskListArgs::new(Filter::Overdue))
            .await
            .unwrap();
        let listed = overdue.structure().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].task.id(), late.structure().unwrap().id());
        assert_eq!(listed[0].progress, Progress::Overdue);
    }

    #[tokio::test]
    async fn test_task_stats() {
        let env = TestEnv::new().await;
        let config = env.config();
        let a = env.add("a").await;
        env.add("b").await;
        task_complete(&config, &TaskIdArgs::new(a.id()))
            .await
            .unwrap();
        let out = task_stats(&config).await.unwrap();
        assert_eq!(out.structure().unwrap().completion_rate, 50.0);
        assert!(out.message().contains("Completion rate: 50.0%"));
        assert!(out.message().contains("Medium: 2"));
    }

    #[tokio::test]
    async fn test_task_export_import() {
        let env = TestEnv::new().await;
        let config = env.config();
        env.add("a").await;
        env.add("b").await;
        let path = env.path("out.csv");
        let out = task_export(&config, &TaskFileArgs::new(&path))
            .await
            .unwrap();
        assert_eq!(out.structure(), Some(&2));

        let out = task_import(&config, &TaskFileArgs::new(&path))
            .await
            .unwrap();
        assert_eq!(out.structure(), Some(&2));
        assert_eq!(config.db().all_tasks().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_task_remind_once() {
        let env = TestEnv::new().await;
        let config = env.config();
        let tomorrow = today().succ_opt().unwrap();
        env.config()
            .db()
            .add_task(&TaskAddArgs::new("Soon").due(tomorrow.to_string()).draft())
            .await
            .unwrap();

        let args = RemindArgs::new(true, None);
        let out = task_remind(&config, &args).await.unwrap();
        assert_eq!(out.structure().unwrap().len(), 1);
        assert!(out.message().contains("Soon"));

        let again = task_remind(&config, &args).await.unwrap();
        assert!(again.structure().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_task_remind_rejects_zero_interval() {
        let env = TestEnv::new().await;
        let err = task_remind(&env.config(), &RemindArgs::new(false, Some(0)))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
