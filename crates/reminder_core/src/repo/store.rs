//! SQLite-backed store shared by reminder and space repositories.
//!
//! # Responsibility
//! - Own the connection borrow and the two snapshot feeds.
//! - Define the repository error taxonomy.
//! - Reject connections that were not bootstrapped by `db::open_db*`.
//!
//! # Invariants
//! - Feeds publish only after a write has committed.
//! - A failed snapshot read after a committed write is logged, never surfaced
//!   as a write failure.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::reminder::{Reminder, ReminderId, ReminderValidationError};
use crate::model::space::{Space, SpaceId, SpaceValidationError};
use crate::repo::feed::SnapshotFeed;
use crate::repo::reminder_repo::ReminderStore;
use crate::repo::space_repo::SpaceStore;
use log::warn;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from store reads and writes.
#[derive(Debug)]
pub enum RepoError {
    InvalidReminder(ReminderValidationError),
    InvalidSpace(SpaceValidationError),
    Db(DbError),
    ReminderNotFound(ReminderId),
    SpaceNotFound(SpaceId),
    /// Persisted row cannot be converted to a valid record.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidReminder(err) => write!(f, "{err}"),
            Self::InvalidSpace(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::ReminderNotFound(id) => write!(f, "reminder not found: {id}"),
            Self::SpaceNotFound(id) => write!(f, "space not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "store requires schema version {expected_version}, got {actual_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidReminder(err) => Some(err),
            Self::InvalidSpace(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ReminderValidationError> for RepoError {
    fn from(value: ReminderValidationError) -> Self {
        Self::InvalidReminder(value)
    }
}

impl From<SpaceValidationError> for RepoError {
    fn from(value: SpaceValidationError) -> Self {
        Self::InvalidSpace(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// SQLite store implementing both `ReminderStore` and `SpaceStore`.
pub struct SqliteStore<'conn> {
    pub(crate) conn: &'conn Connection,
    reminder_feed: SnapshotFeed<Vec<Reminder>>,
    space_feed: SnapshotFeed<Vec<Space>>,
}

impl<'conn> SqliteStore<'conn> {
    /// Creates a store over a migrated connection with fresh feeds.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Self::try_with_feeds(conn, SnapshotFeed::new(), SnapshotFeed::new())
    }

    /// Creates a store publishing into existing feeds, so subscribers survive
    /// across store instances over the same database.
    pub fn try_with_feeds(
        conn: &'conn Connection,
        reminder_feed: SnapshotFeed<Vec<Reminder>>,
        space_feed: SnapshotFeed<Vec<Space>>,
    ) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self {
            conn,
            reminder_feed,
            space_feed,
        })
    }

    pub fn reminder_feed(&self) -> &SnapshotFeed<Vec<Reminder>> {
        &self.reminder_feed
    }

    pub fn space_feed(&self) -> &SnapshotFeed<Vec<Space>> {
        &self.space_feed
    }

    pub(crate) fn publish_reminders(&self) {
        if !self.reminder_feed.has_subscribers() {
            return;
        }
        match self.list_reminders() {
            Ok(snapshot) => {
                self.reminder_feed.publish(&snapshot);
            }
            Err(err) => warn!(
                "event=store_publish module=repo status=error feed=reminders error={err}"
            ),
        }
    }

    pub(crate) fn publish_spaces(&self) {
        if !self.space_feed.has_subscribers() {
            return;
        }
        match self.list_spaces() {
            Ok(snapshot) => {
                self.space_feed.publish(&snapshot);
            }
            Err(err) => warn!("event=store_publish module=repo status=error feed=spaces error={err}"),
        }
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<uuid::Uuid> {
    uuid::Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}
