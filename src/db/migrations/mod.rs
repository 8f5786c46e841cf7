//! Versioned schema changes for `tasks.sqlite`.
//!
//! Each schema version `N` ships a pair of scripts in this directory: `migration_NN_up.sql`
//! takes the database from `N-1` to `N` and `migration_NN_down.sql` reverses it.

use anyhow::{bail, Context};
use sqlx::{Executor, SqlitePool};
use tracing::debug;

/// The schema version this build reads and writes.
pub(crate) const CURRENT_VERSION: i32 = 1;

struct Migration {
    version: i32,
    up: &'static str,
    down: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    up: include_str!("migration_01_up.sql"),
    down: include_str!("migration_01_down.sql"),
}];

/// One script to execute and the version recorded once it has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Step {
    sql: &'static str,
    lands_on: i32,
}

/// Moves the schema from version `from` to version `to`, upgrading or downgrading as needed.
/// Every script runs in its own transaction together with the `schema_version` update, and the
/// whole path is checked before anything executes.
pub(crate) async fn run(pool: &SqlitePool, from: i32, to: i32) -> anyhow::Result<()> {
    let steps = plan(from, to)?;
    if steps.is_empty() {
        debug!("Schema already at version {to}");
        return Ok(());
    }
    for step in steps {
        debug!("Migrating schema to version {}", step.lands_on);
        apply(pool, step).await?;
    }
    debug!("Schema is at version {to}");
    Ok(())
}

fn plan(from: i32, to: i32) -> anyhow::Result<Vec<Step>> {
    let find = |version: i32| -> anyhow::Result<&'static Migration> {
        match MIGRATIONS.iter().find(|m| m.version == version) {
            Some(m) => Ok(m),
            None => bail!("No migration for schema version {version} (moving {from} -> {to})"),
        }
    };

    let mut steps = Vec::new();
    if from < to {
        for version in from + 1..=to {
            let m = find(version)?;
            steps.push(Step {
                sql: m.up,
                lands_on: version,
            });
        }
    } else {
        for version in (to + 1..=from).rev() {
            let m = find(version)?;
            steps.push(Step {
                sql: m.down,
                lands_on: version - 1,
            });
        }
    }
    Ok(steps)
}

async fn apply(pool: &SqlitePool, step: Step) -> anyhow::Result<()> {
    let mut tx = pool
        .begin()
        .await
        .context("Unable to open a migration transaction")?;
    tx.execute(step.sql)
        .await
        .with_context(|| format!("Migration to schema version {} failed", step.lands_on))?;
    sqlx::query("UPDATE schema_version SET version = ?")
        .bind(step.lands_on)
        .execute(&mut *tx)
        .await
        .context("Unable to record the schema version")?;
    tx.commit()
        .await
        .with_context(|| format!("Unable to commit schema version {}", step.lands_on))
}
