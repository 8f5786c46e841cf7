//! The background reminder loop.
//!
//! A scan looks for Pending tasks due tomorrow and emits one [`Reminder`] per task. [`spawn`] runs
//! a scan immediately and then on a fixed interval, sending reminders over a channel until the
//! returned [`ReminderHandle`] is shut down or dropped.

use crate::db::{today, Db};
use crate::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

const CHANNEL_CAPACITY: usize = 64;

/// A notice that a task is due tomorrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub task_id: i64,
    pub title: String,
    pub due_date: NaiveDate,
}

impl Display for Reminder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Task '{}' (ID {}) is due tomorrow ({})",
            self.title, self.task_id, self.due_date
        )
    }
}

/// The reminders that are due as of `today`, without flagging anything.
pub async fn due(db: &Db, today: NaiveDate) -> Result<Vec<Reminder>> {
    let Some(tomorrow) = today.succ_opt() else {
        return Ok(Vec::new());
    };
    let reminders: Vec<Reminder> = db
        .due_for_reminder(tomorrow)
        .await?
        .into_iter()
        .map(|task| Reminder {
            task_id: task.id(),
            title: task.title().to_string(),
            due_date: tomorrow,
        })
        .collect();
    debug!("Reminder scan for {tomorrow} found {} tasks", reminders.len());
    Ok(reminders)
}

/// Runs one reminder scan as of `today` and hands the reminders to the caller. When `mark_sent`
/// is true the reported tasks are flagged together, so either all of them are skipped by later
/// scans or, on error, none of them are.
pub async fn scan(db: &Db, today: NaiveDate, mark_sent: bool) -> Result<Vec<Reminder>> {
    let reminders = due(db, today).await?;
    if mark_sent {
        let ids: Vec<i64> = reminders.iter().map(|r| r.task_id).collect();
        db.mark_reminders_sent(&ids).await?;
    }
    Ok(reminders)
}

/// Starts the reminder loop on the tokio runtime.
pub fn spawn(db: Db, interval: Duration, mark_sent: bool) -> ReminderHandle {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (stop_tx, stop_rx) = watch::channel(false);
    let join = tokio::spawn(run(db, interval, mark_sent, tx, stop_rx));
    ReminderHandle {
        rx,
        stop_tx,
        join: Some(join),
    }
}

async fn run(
    db: Db,
    interval: Duration,
    mark_sent: bool,
    tx: mpsc::Sender<Reminder>,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = stop.changed() => break,
        }
        let reminders = match due(&db, today()).await {
            Ok(reminders) => reminders,
            Err(e) => {
                warn!("Reminder scan failed: {e}");
                continue;
            }
        };
        // A task is flagged only after its reminder is in the channel.
        for reminder in reminders {
            let id = reminder.task_id;
            tokio::select! {
                sent = tx.send(reminder) => {
                    if sent.is_err() {
                        return;
                    }
                }
                _ = stop.changed() => return,
            }
            if mark_sent {
                if let Err(e) = db.mark_reminder_sent(id).await {
                    warn!("Unable to flag the reminder for task {id}: {e}");
                }
            }
        }
    }
    debug!("Reminder loop stopped");
}

/// Owns the running reminder loop. Dropping the handle stops the loop.
#[derive(Debug)]
pub struct ReminderHandle {
    rx: mpsc::Receiver<Reminder>,
    stop_tx: watch::Sender<bool>,
    join: Option<JoinHandle<()>>,
}

impl ReminderHandle {
    /// Waits for the next reminder. Returns `None` once the loop has stopped.
    pub async fn recv(&mut self) -> Option<Reminder> {
        self.rx.recv().await
    }

    /// Signals the loop to stop and waits for it to finish. Returns the reminders that were sent
    /// but not yet received.
    pub async fn shutdown(mut self) -> Vec<Reminder> {
        let _ = self.stop_tx.send(true);
        if let Some(join) = self.join.take() {
            if let Err(e) = join.await {
                warn!("Reminder loop ended abnormally: {e}");
            }
        }
        let mut undelivered = Vec::new();
        while let Ok(reminder) = self.rx.try_recv() {
            undelivered.push(reminder);
        }
        undelivered
    }
}
