//! Notification dispatcher contract and in-process implementations.
//!
//! # Responsibility
//! - Define how the core asks for a device alert to be scheduled or
//!   cancelled.
//! - Provide an outbox notifier that hands commands to a host runtime, and a
//!   log-only notifier for headless tools.
//!
//! # Invariants
//! - Notifier failures never roll back store state; callers log and report.
//! - Alerts are scheduled for the reminder's effective trigger time.

use crate::clock::EpochMs;
use crate::model::reminder::{Reminder, ReminderId};
use log::info;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, PoisonError};

/// Failure reported by a notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyError {
    pub reminder_id: ReminderId,
    pub message: String,
}

impl NotifyError {
    pub fn new(reminder_id: ReminderId, message: impl Into<String>) -> Self {
        Self {
            reminder_id,
            message: message.into(),
        }
    }
}

impl Display for NotifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "notification failed for reminder {}: {}",
            self.reminder_id, self.message
        )
    }
}

impl Error for NotifyError {}

/// Device alert collaborator.
pub trait Notifier {
    /// Schedules (or replaces) the alert for `reminder.effective_time()`.
    fn schedule(&self, reminder: &Reminder) -> Result<(), NotifyError>;
    fn cancel(&self, id: ReminderId) -> Result<(), NotifyError>;
}

impl<T: Notifier + ?Sized> Notifier for &T {
    fn schedule(&self, reminder: &Reminder) -> Result<(), NotifyError> {
        (**self).schedule(reminder)
    }

    fn cancel(&self, id: ReminderId) -> Result<(), NotifyError> {
        (**self).cancel(id)
    }
}

/// Command a host runtime executes against the device alert API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum NotificationCommand {
    Schedule {
        reminder_id: ReminderId,
        title: String,
        fire_at: EpochMs,
    },
    Cancel {
        reminder_id: ReminderId,
    },
}

impl NotificationCommand {
    pub fn reminder_id(&self) -> ReminderId {
        match self {
            Self::Schedule { reminder_id, .. } | Self::Cancel { reminder_id } => *reminder_id,
        }
    }
}

/// Collects commands for the host to drain after each operation.
#[derive(Debug, Default)]
pub struct OutboxNotifier {
    commands: Mutex<Vec<NotificationCommand>>,
}

impl OutboxNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes every queued command, oldest first.
    pub fn drain(&self) -> Vec<NotificationCommand> {
        std::mem::take(
            &mut *self
                .commands
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    fn push(&self, command: NotificationCommand) {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command);
    }
}

impl Notifier for OutboxNotifier {
    fn schedule(&self, reminder: &Reminder) -> Result<(), NotifyError> {
        self.push(NotificationCommand::Schedule {
            reminder_id: reminder.id,
            title: reminder.title.clone(),
            fire_at: reminder.effective_time(),
        });
        Ok(())
    }

    fn cancel(&self, id: ReminderId) -> Result<(), NotifyError> {
        self.push(NotificationCommand::Cancel { reminder_id: id });
        Ok(())
    }
}

/// Notifier that only records intent in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn schedule(&self, reminder: &Reminder) -> Result<(), NotifyError> {
        info!(
            "event=notification_schedule module=notify status=ok reminder_id={} fire_at={}",
            reminder.id,
            reminder.effective_time()
        );
        Ok(())
    }

    fn cancel(&self, id: ReminderId) -> Result<(), NotifyError> {
        info!("event=notification_cancel module=notify status=ok reminder_id={id}");
        Ok(())
    }
}
