//! Reminder schema history.
//!
//! # Schema
//! - `0001_init`: `spaces` and `reminders`, with `reminders.space_id`
//!   referencing `spaces(id) ON DELETE SET NULL`.
//! - `0002_completed_at`: nullable `reminders.completed_at` plus an index,
//!   used to order the `recent` category. Existing rows keep `NULL`.
//!
//! # Invariants
//! - Steps are listed in strictly increasing version order.
//! - All pending steps run in one transaction; `PRAGMA user_version` only
//!   advances together with the schema it describes.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "init",
        sql: include_str!("0001_init.sql"),
    },
    SchemaStep {
        version: 2,
        name: "completed_at",
        sql: include_str!("0002_completed_at.sql"),
    },
];

/// Schema version written by this build.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Brings the reminder schema on `conn` up to `latest_version()`.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file was written by a newer build.
/// - `Sqlite` when a step fails; nothing from the run is kept.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from_version = schema_version(conn)?;
    let latest = latest_version();
    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    let pending = pending_steps(from_version);
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in pending {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={from_version} to_version={latest}");
    Ok(())
}

fn pending_steps(from_version: u32) -> Vec<SchemaStep> {
    SCHEMA_STEPS
        .iter()
        .copied()
        .filter(|step| step.version > from_version)
        .collect()
}

fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?)
}
