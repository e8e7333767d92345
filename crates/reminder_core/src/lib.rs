//! Core domain logic for the reminders app.
//! This crate is the single source of truth for reminder and space invariants.

pub mod classify;
pub mod clock;
pub mod config;
pub mod db;
pub mod filter;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;
pub mod session;

pub use classify::{classify, derive_display, ReminderDisplay, ReminderState};
pub use clock::{now_epoch_ms, EpochMs};
pub use config::CoreConfig;
pub use db::{open_db, open_db_in_memory, DbError};
pub use filter::{apply_filter, count_filters, FilterCounts, ReminderFilter, SpaceScope};
pub use logging::{default_log_level, flush_logs, init_logging, logging_status, LoggingError};
pub use model::reminder::{Reminder, ReminderId, ReminderStatus, ReminderValidationError};
pub use model::space::{Space, SpaceId, SpaceValidationError};
pub use notify::{LogNotifier, NotificationCommand, Notifier, NotifyError, OutboxNotifier};
pub use repo::feed::{SnapshotFeed, Subscription};
pub use repo::reminder_repo::ReminderStore;
pub use repo::space_repo::{SpaceDeleteMode, SpaceStore};
pub use repo::store::{RepoError, RepoResult, SqliteStore};
pub use service::bulk_service::{BulkError, BulkReport, BulkService};
pub use service::reminder_service::{
    DeleteOutcome, MutationOutcome, NotificationOutcome, ReminderDraft, ReminderService,
    ServiceError, UndoToken,
};
pub use service::selection::SelectionSet;
pub use service::space_service::{
    MergeOutcome, MergeRequest, MergeTarget, NewSpace, SpaceService, SpaceServiceError,
};
pub use session::{CountdownTicker, TickerHandle, ViewLiveness};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
