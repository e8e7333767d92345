//! Domain model for reminders and the spaces that group them.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep lifecycle predicates next to the data they read.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - A reminder's `space_id` is either `None` or the id of an existing space.

pub mod reminder;
pub mod space;
