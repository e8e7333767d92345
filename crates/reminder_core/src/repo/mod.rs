//! Store contracts and the SQLite reference implementation.
//!
//! # Responsibility
//! - Define the reminder/space store collaborators the services depend on.
//! - Isolate SQLite query details from service orchestration.
//! - Fan out full snapshots to push-update subscribers.
//!
//! # Invariants
//! - Repository writes enforce model validation before persistence.
//! - Repository APIs return semantic errors (`*NotFound`) in addition to DB
//!   transport errors.

pub mod feed;
pub mod reminder_repo;
pub mod space_repo;
pub mod store;
