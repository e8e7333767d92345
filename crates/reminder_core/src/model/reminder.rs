//! Reminder domain model.
//!
//! # Responsibility
//! - Define the canonical reminder record and its lifecycle status.
//! - Provide the clock predicates every other layer builds on
//!   (effective trigger time, overdue/pending classification).
//!
//! # Invariants
//! - `id` is stable and never reused for another reminder.
//! - `snoozed_until`, when set, replaces `scheduled_time` as the effective
//!   trigger time.
//! - `is_overdue` and `is_pending` are mutually exclusive and both false for
//!   completed reminders.
//! - `created_at <= scheduled_time` is expected but not enforced.

use crate::clock::EpochMs;
use crate::model::space::SpaceId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Stable reminder identifier.
pub type ReminderId = Uuid;

/// Reminder lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    Pending,
    Completed,
}

impl ReminderStatus {
    /// Stable storage/wire key.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// The other state.
    pub fn toggled(self) -> Self {
        match self {
            Self::Pending => Self::Completed,
            Self::Completed => Self::Pending,
        }
    }
}

/// Validation failures for reminder records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderValidationError {
    NilId,
    EmptyTitle,
    /// Snooze target is not after the instant it was requested at.
    SnoozeNotInFuture { until: EpochMs, now: EpochMs },
}

impl Display for ReminderValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "reminder id must not be nil"),
            Self::EmptyTitle => write!(f, "reminder title must not be blank"),
            Self::SnoozeNotInFuture { until, now } => {
                write!(f, "snooze target ({until}) must be after now ({now})")
            }
        }
    }
}

impl Error for ReminderValidationError {}

/// Canonical reminder record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: ReminderId,
    pub title: String,
    pub description: Option<String>,
    /// Nominal trigger time.
    pub scheduled_time: EpochMs,
    /// Set once at creation; start of the progress window.
    pub created_at: EpochMs,
    pub status: ReminderStatus,
    /// Effective trigger time override while snoozed.
    pub snoozed_until: Option<EpochMs>,
    /// Set on transition to `Completed`, cleared on transition back.
    pub completed_at: Option<EpochMs>,
    pub is_notification_enabled: bool,
    /// `None` means unassigned.
    pub space_id: Option<SpaceId>,
}

impl Reminder {
    /// Creates a pending reminder with a generated id.
    pub fn new(title: impl Into<String>, scheduled_time: EpochMs, created_at: EpochMs) -> Self {
        Self::with_id(Uuid::new_v4(), title, scheduled_time, created_at)
    }

    /// Creates a pending reminder with a caller-provided id.
    ///
    /// Used by import paths where identity already exists externally. Does
    /// not validate; call `validate()` before persisting.
    pub fn with_id(
        id: ReminderId,
        title: impl Into<String>,
        scheduled_time: EpochMs,
        created_at: EpochMs,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            scheduled_time,
            created_at,
            status: ReminderStatus::Pending,
            snoozed_until: None,
            completed_at: None,
            is_notification_enabled: true,
            space_id: None,
        }
    }

    pub fn validate(&self) -> Result<(), ReminderValidationError> {
        if self.id.is_nil() {
            return Err(ReminderValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(ReminderValidationError::EmptyTitle);
        }
        Ok(())
    }

    /// `snoozed_until` if present, else `scheduled_time`.
    pub fn effective_time(&self) -> EpochMs {
        self.snoozed_until.unwrap_or(self.scheduled_time)
    }

    pub fn is_completed(&self) -> bool {
        self.status == ReminderStatus::Completed
    }

    pub fn is_overdue(&self, now: EpochMs) -> bool {
        !self.is_completed() && self.effective_time() < now
    }

    pub fn is_pending(&self, now: EpochMs) -> bool {
        !self.is_completed() && self.effective_time() >= now
    }

    /// Whether a device alert should exist for this reminder at `now`.
    pub fn wants_notification(&self, now: EpochMs) -> bool {
        self.is_notification_enabled && !self.is_completed() && self.effective_time() > now
    }

    /// Copy transitioned to `Completed` at `now`.
    pub fn completed(&self, now: EpochMs) -> Self {
        Self {
            status: ReminderStatus::Completed,
            completed_at: Some(now),
            ..self.clone()
        }
    }

    /// Copy transitioned back to `Pending`; snooze state is kept.
    pub fn reopened(&self) -> Self {
        Self {
            status: ReminderStatus::Pending,
            completed_at: None,
            ..self.clone()
        }
    }

    /// Copy with the effective trigger time moved to `until`.
    pub fn snoozed(&self, until: EpochMs) -> Self {
        Self {
            snoozed_until: Some(until),
            ..self.clone()
        }
    }
}

/// Trims and collapses internal whitespace of a user-facing label.
pub fn normalize_label(value: &str) -> String {
    WHITESPACE_RE.replace_all(value.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::{normalize_label, Reminder, ReminderStatus};
    use crate::clock::MS_PER_MINUTE;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn snooze_overrides_scheduled_time() {
        let reminder = Reminder::new("stretch", NOW - MS_PER_MINUTE, NOW - 60 * MS_PER_MINUTE);
        assert!(reminder.is_overdue(NOW));

        let snoozed = reminder.snoozed(NOW + 10 * MS_PER_MINUTE);
        assert_eq!(snoozed.effective_time(), NOW + 10 * MS_PER_MINUTE);
        assert!(snoozed.is_pending(NOW));
        assert!(!snoozed.is_overdue(NOW));
    }

    #[test]
    fn effective_time_equal_to_now_is_pending() {
        let reminder = Reminder::new("edge", NOW, NOW - MS_PER_MINUTE);
        assert!(reminder.is_pending(NOW));
        assert!(!reminder.is_overdue(NOW));
    }

    #[test]
    fn completed_reminder_is_neither_pending_nor_overdue() {
        let reminder = Reminder::new("done", NOW - MS_PER_MINUTE, NOW - 2 * MS_PER_MINUTE);
        let done = reminder.completed(NOW);
        assert_eq!(done.status, ReminderStatus::Completed);
        assert_eq!(done.completed_at, Some(NOW));
        assert!(!done.is_pending(NOW));
        assert!(!done.is_overdue(NOW));

        let reopened = done.reopened();
        assert_eq!(reopened.completed_at, None);
        assert!(reopened.is_overdue(NOW));
    }

    #[test]
    fn status_keys_roundtrip() {
        for status in [ReminderStatus::Pending, ReminderStatus::Completed] {
            assert_eq!(ReminderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ReminderStatus::parse("done"), None);
    }

    #[test]
    fn normalize_label_collapses_whitespace() {
        assert_eq!(normalize_label("  pay \n\t rent  "), "pay rent");
    }
}
