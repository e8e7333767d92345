//! On-disk home of the reminder and space collections.
//!
//! A database file holds two tables, `spaces` and `reminders`. Every
//! connection handed out by `open_db` has foreign keys enforced and the
//! reminder schema at `migrations::latest_version()`. Files written by a
//! newer build are refused rather than downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Why a reminder database could not be opened.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file carries a schema this build does not know.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "reminder database is at schema {db_version}; this build reads up to {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
