//! Single-reminder use-case service.
//!
//! # Responsibility
//! - Create, edit, snooze, complete/reopen and delete one reminder.
//! - Keep the device alert in step with the reminder's effective trigger time.
//! - Issue and redeem delete-undo tokens.
//!
//! # Invariants
//! - The store write always precedes the notification side effect.
//! - A store failure aborts the mutation before any notification call.
//! - A notifier failure is logged and reported, never rolled back.
//! - An undo token is redeemable only until `expires_at`.

use crate::clock::EpochMs;
use crate::config::CoreConfig;
use crate::model::reminder::{normalize_label, Reminder, ReminderId, ReminderValidationError};
use crate::model::space::SpaceId;
use crate::notify::{Notifier, NotifyError};
use crate::repo::reminder_repo::ReminderStore;
use crate::repo::store::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from single-reminder use-cases.
#[derive(Debug)]
pub enum ServiceError {
    Validation(ReminderValidationError),
    /// Store rejected the read or write; the mutation did not take effect.
    Repo(RepoError),
    /// Undo window elapsed before the token was redeemed.
    UndoExpired {
        reminder_id: ReminderId,
        expired_at: EpochMs,
    },
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::UndoExpired {
                reminder_id,
                expired_at,
            } => write!(
                f,
                "undo window for reminder {reminder_id} expired at {expired_at}"
            ),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::UndoExpired { .. } => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ReminderValidationError> for ServiceError {
    fn from(value: ReminderValidationError) -> Self {
        Self::Validation(value)
    }
}

/// What happened to the device alert after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    Scheduled,
    Cancelled,
    /// No alert was wanted, so nothing was requested.
    Skipped,
    Failed(NotifyError),
}

impl NotificationOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn failure(&self) -> Option<&NotifyError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Result of a successful single-reminder mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    /// Reminder as persisted.
    pub reminder: Reminder,
    pub notification: NotificationOutcome,
}

/// Input for the add flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderDraft {
    pub title: String,
    pub description: Option<String>,
    pub scheduled_time: EpochMs,
    pub is_notification_enabled: bool,
    pub space_id: Option<SpaceId>,
}

impl ReminderDraft {
    pub fn new(title: impl Into<String>, scheduled_time: EpochMs) -> Self {
        Self {
            title: title.into(),
            description: None,
            scheduled_time,
            is_notification_enabled: true,
            space_id: None,
        }
    }
}

/// Capability to re-insert one deleted reminder within the undo window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoToken {
    reminder: Reminder,
    issued_at: EpochMs,
    expires_at: EpochMs,
}

impl UndoToken {
    /// Full value captured at delete time.
    pub fn reminder(&self) -> &Reminder {
        &self.reminder
    }

    pub fn issued_at(&self) -> EpochMs {
        self.issued_at
    }

    pub fn expires_at(&self) -> EpochMs {
        self.expires_at
    }

    pub fn is_expired(&self, now: EpochMs) -> bool {
        now > self.expires_at
    }
}

/// Result of a single delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub undo: UndoToken,
    pub notification: NotificationOutcome,
}

/// Single-reminder use-case service.
pub struct ReminderService<S: ReminderStore, N: Notifier> {
    store: S,
    notifier: N,
    config: CoreConfig,
}

impl<S: ReminderStore, N: Notifier> ReminderService<S, N> {
    pub fn new(store: S, notifier: N) -> Self {
        Self::with_config(store, notifier, CoreConfig::default())
    }

    pub fn with_config(store: S, notifier: N, config: CoreConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Creates a reminder from the add flow and schedules its alert.
    ///
    /// # Contract
    /// - Title is normalized; a blank title is rejected before any write.
    /// - `created_at` is `now`.
    pub fn create_reminder(
        &self,
        draft: ReminderDraft,
        now: EpochMs,
    ) -> Result<MutationOutcome, ServiceError> {
        let mut reminder = Reminder::new(normalize_label(&draft.title), draft.scheduled_time, now);
        reminder.description = normalize_description(draft.description.as_deref());
        reminder.is_notification_enabled = draft.is_notification_enabled;
        reminder.space_id = draft.space_id;
        reminder.validate()?;

        self.store.add_reminder(&reminder)?;
        let notification = schedule_if_wanted(&self.notifier, &reminder, now);
        info!(
            "event=reminder_create module=service status=ok reminder_id={}",
            reminder.id
        );
        Ok(MutationOutcome {
            reminder,
            notification,
        })
    }

    /// Persists an edited reminder and re-syncs its alert.
    pub fn update_reminder(
        &self,
        reminder: &Reminder,
        now: EpochMs,
    ) -> Result<MutationOutcome, ServiceError> {
        let mut next = reminder.clone();
        next.title = normalize_label(&reminder.title);
        next.description = normalize_description(reminder.description.as_deref());
        next.validate()?;

        self.store.update_reminder(&next)?;
        let notification = if next.wants_notification(now) {
            schedule_alert(&self.notifier, &next)
        } else {
            cancel_alert(&self.notifier, next.id)
        };
        Ok(MutationOutcome {
            reminder: next,
            notification,
        })
    }

    /// Flips `Pending <-> Completed`.
    ///
    /// # Contract
    /// - To `Completed`: write, then cancel the alert.
    /// - To `Pending`: write, then reschedule when the effective time is
    ///   still ahead of `now`.
    pub fn toggle_status(
        &self,
        reminder: &Reminder,
        now: EpochMs,
    ) -> Result<MutationOutcome, ServiceError> {
        let next = if reminder.is_completed() {
            reminder.reopened()
        } else {
            reminder.completed(now)
        };

        self.store.update_reminder(&next)?;
        let notification = if next.is_completed() {
            cancel_alert(&self.notifier, next.id)
        } else {
            schedule_if_wanted(&self.notifier, &next, now)
        };

        info!(
            "event=reminder_toggle module=service status=ok reminder_id={} to={}",
            next.id,
            next.status.as_str()
        );
        Ok(MutationOutcome {
            reminder: next,
            notification,
        })
    }

    /// Moves the effective trigger time to `until` and moves the alert with it.
    pub fn snooze(
        &self,
        reminder: &Reminder,
        until: EpochMs,
        now: EpochMs,
    ) -> Result<MutationOutcome, ServiceError> {
        if until <= now {
            return Err(ReminderValidationError::SnoozeNotInFuture { until, now }.into());
        }

        let next = reminder.snoozed(until);
        self.store.update_reminder(&next)?;
        let notification = schedule_if_wanted(&self.notifier, &next, now);
        info!(
            "event=reminder_snooze module=service status=ok reminder_id={} until={until}",
            next.id
        );
        Ok(MutationOutcome {
            reminder: next,
            notification,
        })
    }

    /// Deletes one reminder and returns an undo token valid for the
    /// configured window.
    pub fn delete_reminder(
        &self,
        reminder: &Reminder,
        now: EpochMs,
    ) -> Result<DeleteOutcome, ServiceError> {
        self.store.delete_reminder(reminder.id)?;
        let notification = cancel_alert(&self.notifier, reminder.id);

        info!(
            "event=reminder_delete module=service status=ok reminder_id={}",
            reminder.id
        );
        Ok(DeleteOutcome {
            undo: UndoToken {
                reminder: reminder.clone(),
                issued_at: now,
                expires_at: now.saturating_add(self.config.undo_window_ms),
            },
            notification,
        })
    }

    /// Re-inserts the captured reminder and restores its alert when still
    /// relevant.
    pub fn undo_delete(
        &self,
        token: UndoToken,
        now: EpochMs,
    ) -> Result<MutationOutcome, ServiceError> {
        if token.is_expired(now) {
            info!(
                "event=reminder_undo_delete module=service status=skipped reminder_id={} reason=expired",
                token.reminder.id
            );
            return Err(ServiceError::UndoExpired {
                reminder_id: token.reminder.id,
                expired_at: token.expires_at,
            });
        }

        let reminder = token.reminder;
        self.store.add_reminder(&reminder)?;
        let notification = schedule_if_wanted(&self.notifier, &reminder, now);
        info!(
            "event=reminder_undo_delete module=service status=ok reminder_id={}",
            reminder.id
        );
        Ok(MutationOutcome {
            reminder,
            notification,
        })
    }
}

pub(crate) fn schedule_if_wanted<N: Notifier>(
    notifier: &N,
    reminder: &Reminder,
    now: EpochMs,
) -> NotificationOutcome {
    if reminder.wants_notification(now) {
        schedule_alert(notifier, reminder)
    } else {
        NotificationOutcome::Skipped
    }
}

pub(crate) fn schedule_alert<N: Notifier>(
    notifier: &N,
    reminder: &Reminder,
) -> NotificationOutcome {
    match notifier.schedule(reminder) {
        Ok(()) => NotificationOutcome::Scheduled,
        Err(err) => {
            warn!(
                "event=notification_schedule module=service status=error reminder_id={} error={}",
                reminder.id, err.message
            );
            NotificationOutcome::Failed(err)
        }
    }
}

pub(crate) fn cancel_alert<N: Notifier>(notifier: &N, id: ReminderId) -> NotificationOutcome {
    match notifier.cancel(id) {
        Ok(()) => NotificationOutcome::Cancelled,
        Err(err) => {
            warn!(
                "event=notification_cancel module=service status=error reminder_id={id} error={}",
                err.message
            );
            NotificationOutcome::Failed(err)
        }
    }
}

/// Trims a free-text description; blank becomes `None`.
fn normalize_description(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
