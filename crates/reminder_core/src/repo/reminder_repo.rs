//! Reminder store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and batch APIs over canonical `reminders` storage.
//! - Publish a full snapshot to subscribers after every committed write.
//!
//! # Invariants
//! - Write paths call `Reminder::validate()` before SQL mutations.
//! - A reminder can only reference an existing space.
//! - `save_reminders` and `move_space_reminders` are all-or-nothing.
//! - Listing order is `scheduled_time ASC, id ASC`.

use crate::model::reminder::{Reminder, ReminderId, ReminderStatus};
use crate::model::space::SpaceId;
use crate::repo::feed::Subscription;
use crate::repo::store::{bool_to_int, parse_uuid, RepoError, RepoResult, SqliteStore};
use log::debug;
use std::collections::BTreeSet;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const REMINDER_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    scheduled_time,
    created_at,
    status,
    snoozed_until,
    completed_at,
    is_notification_enabled,
    space_id
FROM reminders";

const REMINDER_UPSERT_SQL: &str = "INSERT INTO reminders (
        id,
        title,
        description,
        scheduled_time,
        created_at,
        status,
        snoozed_until,
        completed_at,
        is_notification_enabled,
        space_id
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
    ON CONFLICT(id) DO UPDATE SET
        title = excluded.title,
        description = excluded.description,
        scheduled_time = excluded.scheduled_time,
        created_at = excluded.created_at,
        status = excluded.status,
        snoozed_until = excluded.snoozed_until,
        completed_at = excluded.completed_at,
        is_notification_enabled = excluded.is_notification_enabled,
        space_id = excluded.space_id,
        updated_at = (strftime('%s', 'now') * 1000);";

/// Persistent reminder collection.
pub trait ReminderStore {
    fn list_reminders(&self) -> RepoResult<Vec<Reminder>>;
    fn reminders_in_space(&self, space_id: SpaceId) -> RepoResult<Vec<Reminder>>;
    fn get_reminder(&self, id: ReminderId) -> RepoResult<Option<Reminder>>;
    fn add_reminder(&self, reminder: &Reminder) -> RepoResult<ReminderId>;
    fn update_reminder(&self, reminder: &Reminder) -> RepoResult<()>;
    fn delete_reminder(&self, id: ReminderId) -> RepoResult<()>;
    /// Upserts every reminder in one transaction.
    fn save_reminders(&self, reminders: &[Reminder]) -> RepoResult<()>;
    /// Full-collection snapshots delivered after each write.
    fn subscribe_reminders(&self) -> Subscription<Vec<Reminder>>;

    /// Moves every reminder filed under one of `sources` to `target` in one
    /// batch write; returns how many moved.
    ///
    /// The default reads the collection once and saves back only the moved
    /// reminders through `save_reminders`.
    fn move_space_reminders(
        &self,
        sources: &BTreeSet<SpaceId>,
        target: SpaceId,
    ) -> RepoResult<usize> {
        let moved = self
            .list_reminders()?
            .into_iter()
            .filter(|reminder| reminder.space_id.is_some_and(|id| sources.contains(&id)))
            .map(|mut reminder| {
                reminder.space_id = Some(target);
                reminder
            })
            .collect::<Vec<_>>();
        self.save_reminders(&moved)?;
        Ok(moved.len())
    }
}

impl<T: ReminderStore + ?Sized> ReminderStore for &T {
    fn list_reminders(&self) -> RepoResult<Vec<Reminder>> {
        (**self).list_reminders()
    }

    fn reminders_in_space(&self, space_id: SpaceId) -> RepoResult<Vec<Reminder>> {
        (**self).reminders_in_space(space_id)
    }

    fn get_reminder(&self, id: ReminderId) -> RepoResult<Option<Reminder>> {
        (**self).get_reminder(id)
    }

    fn add_reminder(&self, reminder: &Reminder) -> RepoResult<ReminderId> {
        (**self).add_reminder(reminder)
    }

    fn update_reminder(&self, reminder: &Reminder) -> RepoResult<()> {
        (**self).update_reminder(reminder)
    }

    fn delete_reminder(&self, id: ReminderId) -> RepoResult<()> {
        (**self).delete_reminder(id)
    }

    fn save_reminders(&self, reminders: &[Reminder]) -> RepoResult<()> {
        (**self).save_reminders(reminders)
    }

    fn subscribe_reminders(&self) -> Subscription<Vec<Reminder>> {
        (**self).subscribe_reminders()
    }

    fn move_space_reminders(
        &self,
        sources: &BTreeSet<SpaceId>,
        target: SpaceId,
    ) -> RepoResult<usize> {
        (**self).move_space_reminders(sources, target)
    }
}

impl ReminderStore for SqliteStore<'_> {
    fn list_reminders(&self) -> RepoResult<Vec<Reminder>> {
        let mut stmt = self.conn.prepare(&format!(
            "{REMINDER_SELECT_SQL} ORDER BY scheduled_time ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut reminders = Vec::new();
        while let Some(row) = rows.next()? {
            reminders.push(parse_reminder_row(row)?);
        }
        Ok(reminders)
    }

    fn reminders_in_space(&self, space_id: SpaceId) -> RepoResult<Vec<Reminder>> {
        let mut stmt = self.conn.prepare(&format!(
            "{REMINDER_SELECT_SQL}
             WHERE space_id = ?1
             ORDER BY scheduled_time ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([space_id.to_string()])?;
        let mut reminders = Vec::new();
        while let Some(row) = rows.next()? {
            reminders.push(parse_reminder_row(row)?);
        }
        Ok(reminders)
    }

    fn get_reminder(&self, id: ReminderId) -> RepoResult<Option<Reminder>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REMINDER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_reminder_row(row)?));
        }
        Ok(None)
    }

    fn add_reminder(&self, reminder: &Reminder) -> RepoResult<ReminderId> {
        reminder.validate()?;
        ensure_space_reference(self.conn, reminder.space_id)?;

        self.conn.execute(
            "INSERT INTO reminders (
                id,
                title,
                description,
                scheduled_time,
                created_at,
                status,
                snoozed_until,
                completed_at,
                is_notification_enabled,
                space_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                reminder.id.to_string(),
                reminder.title.as_str(),
                reminder.description.as_deref(),
                reminder.scheduled_time,
                reminder.created_at,
                reminder.status.as_str(),
                reminder.snoozed_until,
                reminder.completed_at,
                bool_to_int(reminder.is_notification_enabled),
                reminder.space_id.map(|value| value.to_string()),
            ],
        )?;

        debug!(
            "event=reminder_add module=repo status=ok reminder_id={}",
            reminder.id
        );
        self.publish_reminders();
        Ok(reminder.id)
    }

    fn update_reminder(&self, reminder: &Reminder) -> RepoResult<()> {
        reminder.validate()?;
        ensure_space_reference(self.conn, reminder.space_id)?;

        let changed = self.conn.execute(
            "UPDATE reminders
             SET
                title = ?1,
                description = ?2,
                scheduled_time = ?3,
                created_at = ?4,
                status = ?5,
                snoozed_until = ?6,
                completed_at = ?7,
                is_notification_enabled = ?8,
                space_id = ?9,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?10;",
            params![
                reminder.title.as_str(),
                reminder.description.as_deref(),
                reminder.scheduled_time,
                reminder.created_at,
                reminder.status.as_str(),
                reminder.snoozed_until,
                reminder.completed_at,
                bool_to_int(reminder.is_notification_enabled),
                reminder.space_id.map(|value| value.to_string()),
                reminder.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::ReminderNotFound(reminder.id));
        }

        self.publish_reminders();
        Ok(())
    }

    fn delete_reminder(&self, id: ReminderId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM reminders WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::ReminderNotFound(id));
        }

        self.publish_reminders();
        Ok(())
    }

    fn save_reminders(&self, reminders: &[Reminder]) -> RepoResult<()> {
        for reminder in reminders {
            reminder.validate()?;
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for reminder in reminders {
            ensure_space_reference(&tx, reminder.space_id)?;
            tx.execute(
                REMINDER_UPSERT_SQL,
                params![
                    reminder.id.to_string(),
                    reminder.title.as_str(),
                    reminder.description.as_deref(),
                    reminder.scheduled_time,
                    reminder.created_at,
                    reminder.status.as_str(),
                    reminder.snoozed_until,
                    reminder.completed_at,
                    bool_to_int(reminder.is_notification_enabled),
                    reminder.space_id.map(|value| value.to_string()),
                ],
            )?;
        }
        tx.commit()?;

        debug!(
            "event=reminder_save_all module=repo status=ok count={}",
            reminders.len()
        );
        self.publish_reminders();
        Ok(())
    }

    fn subscribe_reminders(&self) -> Subscription<Vec<Reminder>> {
        self.reminder_feed().subscribe()
    }

    /// Rewrites only `space_id`, selecting rows inside the write lock, so
    /// edits made through other connections since the caller's last read
    /// are kept.
    fn move_space_reminders(
        &self,
        sources: &BTreeSet<SpaceId>,
        target: SpaceId,
    ) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_space_reference(&tx, Some(target))?;
        let mut moved = 0;
        for source in sources.iter().filter(|id| **id != target) {
            moved += tx.execute(
                "UPDATE reminders
                 SET
                    space_id = ?1,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE space_id = ?2;",
                params![target.to_string(), source.to_string()],
            )?;
        }
        tx.commit()?;

        debug!(
            "event=reminder_move_space module=repo status=ok target_id={target} sources={} moved={moved}",
            sources.len()
        );
        self.publish_reminders();
        Ok(moved)
    }
}

fn ensure_space_reference(conn: &Connection, space_id: Option<SpaceId>) -> RepoResult<()> {
    let Some(space_id) = space_id else {
        return Ok(());
    };
    let exists = conn
        .query_row(
            "SELECT 1 FROM spaces WHERE id = ?1;",
            [space_id.to_string()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    if exists.is_none() {
        return Err(RepoError::SpaceNotFound(space_id));
    }
    Ok(())
}

fn parse_reminder_row(row: &Row<'_>) -> RepoResult<Reminder> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "reminders.id")?;

    let status_text: String = row.get("status")?;
    let status = ReminderStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid reminder status `{status_text}` in reminders.status"
        ))
    })?;

    let is_notification_enabled = match row.get::<_, i64>("is_notification_enabled")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_notification_enabled value `{other}` in reminders.is_notification_enabled"
            )));
        }
    };

    let space_id = row
        .get::<_, Option<String>>("space_id")?
        .map(|value| parse_uuid(&value, "reminders.space_id"))
        .transpose()?;

    let reminder = Reminder {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        scheduled_time: row.get("scheduled_time")?,
        created_at: row.get("created_at")?,
        status,
        snoozed_until: row.get("snoozed_until")?,
        completed_at: row.get("completed_at")?,
        is_notification_enabled,
        space_id,
    };
    reminder.validate()?;
    Ok(reminder)
}
