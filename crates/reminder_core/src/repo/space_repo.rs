//! Space store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over canonical `spaces` storage.
//! - Delete spaces without ever leaving a reminder pointing at a missing
//!   space.
//!
//! # Invariants
//! - Write paths call `Space::validate()` before SQL mutations.
//! - `SpaceDeleteMode::Unassign` keeps reminders and clears their reference.
//! - `SpaceDeleteMode::DeleteReminders` is the only cascading delete.
//! - Listing order is `created_at ASC, id ASC`.

use crate::model::space::{Space, SpaceId};
use crate::repo::feed::Subscription;
use crate::repo::store::{parse_uuid, RepoError, RepoResult, SqliteStore};
use log::info;
use rusqlite::{params, OptionalExtension, Row, Transaction, TransactionBehavior};

const SPACE_SELECT_SQL: &str = "SELECT
    id,
    name,
    color,
    icon,
    created_at
FROM spaces";

/// What happens to a deleted space's reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceDeleteMode {
    /// Keep reminders and mark them unassigned.
    Unassign,
    /// Delete reminders together with the space.
    DeleteReminders,
}

/// Persistent space collection.
pub trait SpaceStore {
    fn list_spaces(&self) -> RepoResult<Vec<Space>>;
    fn get_space(&self, id: SpaceId) -> RepoResult<Option<Space>>;
    fn create_space(&self, space: &Space) -> RepoResult<SpaceId>;
    fn update_space(&self, space: &Space) -> RepoResult<()>;
    /// Deletes one space; returns how many reminders were unassigned or
    /// deleted alongside it.
    fn delete_space(&self, id: SpaceId, mode: SpaceDeleteMode) -> RepoResult<usize>;
    fn subscribe_spaces(&self) -> Subscription<Vec<Space>>;
}

impl<T: SpaceStore + ?Sized> SpaceStore for &T {
    fn list_spaces(&self) -> RepoResult<Vec<Space>> {
        (**self).list_spaces()
    }

    fn get_space(&self, id: SpaceId) -> RepoResult<Option<Space>> {
        (**self).get_space(id)
    }

    fn create_space(&self, space: &Space) -> RepoResult<SpaceId> {
        (**self).create_space(space)
    }

    fn update_space(&self, space: &Space) -> RepoResult<()> {
        (**self).update_space(space)
    }

    fn delete_space(&self, id: SpaceId, mode: SpaceDeleteMode) -> RepoResult<usize> {
        (**self).delete_space(id, mode)
    }

    fn subscribe_spaces(&self) -> Subscription<Vec<Space>> {
        (**self).subscribe_spaces()
    }
}

impl SpaceStore for SqliteStore<'_> {
    fn list_spaces(&self) -> RepoResult<Vec<Space>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SPACE_SELECT_SQL} ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut spaces = Vec::new();
        while let Some(row) = rows.next()? {
            spaces.push(parse_space_row(row)?);
        }
        Ok(spaces)
    }

    fn get_space(&self, id: SpaceId) -> RepoResult<Option<Space>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SPACE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_space_row(row)?));
        }
        Ok(None)
    }

    fn create_space(&self, space: &Space) -> RepoResult<SpaceId> {
        space.validate()?;
        self.conn.execute(
            "INSERT INTO spaces (id, name, color, icon, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                space.id.to_string(),
                space.name.as_str(),
                i64::from(space.color),
                space.icon.as_str(),
                space.created_at,
            ],
        )?;
        self.publish_spaces();
        Ok(space.id)
    }

    fn update_space(&self, space: &Space) -> RepoResult<()> {
        space.validate()?;
        let changed = self.conn.execute(
            "UPDATE spaces
             SET
                name = ?1,
                color = ?2,
                icon = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?4;",
            params![
                space.name.as_str(),
                i64::from(space.color),
                space.icon.as_str(),
                space.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::SpaceNotFound(space.id));
        }
        self.publish_spaces();
        Ok(())
    }

    fn delete_space(&self, id: SpaceId, mode: SpaceDeleteMode) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let exists = tx
            .query_row(
                "SELECT 1 FROM spaces WHERE id = ?1;",
                [id.to_string()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(RepoError::SpaceNotFound(id));
        }

        let affected = match mode {
            SpaceDeleteMode::Unassign => tx.execute(
                "UPDATE reminders
                 SET space_id = NULL,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE space_id = ?1;",
                [id.to_string()],
            )?,
            SpaceDeleteMode::DeleteReminders => tx.execute(
                "DELETE FROM reminders WHERE space_id = ?1;",
                [id.to_string()],
            )?,
        };
        tx.execute("DELETE FROM spaces WHERE id = ?1;", [id.to_string()])?;
        tx.commit()?;

        info!(
            "event=space_delete module=repo status=ok space_id={id} mode={mode:?} reminders_affected={affected}"
        );
        self.publish_spaces();
        if affected > 0 {
            self.publish_reminders();
        }
        Ok(affected)
    }

    fn subscribe_spaces(&self) -> Subscription<Vec<Space>> {
        self.space_feed().subscribe()
    }
}

fn parse_space_row(row: &Row<'_>) -> RepoResult<Space> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "spaces.id")?;

    let color_value: i64 = row.get("color")?;
    let color = u32::try_from(color_value).map_err(|_| {
        RepoError::InvalidData(format!("invalid color value `{color_value}` in spaces.color"))
    })?;

    let space = Space {
        id,
        name: row.get("name")?,
        color,
        icon: row.get("icon")?,
        created_at: row.get("created_at")?,
    };
    space.validate()?;
    Ok(space)
}
