//! Bulk complete/uncomplete/delete over a reminder selection.
//!
//! # Responsibility
//! - Resolve the selection against the caller's current collection.
//! - Apply the single-item write + notification sequence per selected id.
//! - Leave selection mode after a bulk action runs to completion.
//!
//! # Invariants
//! - Ids are processed in ascending order.
//! - A selected id missing from the collection fails before any write.
//! - The first store failure stops the loop; already-applied ids are reported
//!   in the error and the selection stays active.
//! - Notification failures never stop the loop.
//! - Bulk delete issues no undo token.

use crate::clock::EpochMs;
use crate::model::reminder::{Reminder, ReminderId, ReminderStatus};
use crate::notify::{Notifier, NotifyError};
use crate::repo::reminder_repo::ReminderStore;
use crate::repo::store::RepoError;
use crate::service::reminder_service::{cancel_alert, schedule_if_wanted, NotificationOutcome};
use crate::service::selection::SelectionSet;
use crate::session::{still_alive, ViewLiveness};
use log::{info, warn};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from bulk reminder operations.
#[derive(Debug)]
pub enum BulkError {
    /// Selection references an id absent from the supplied collection.
    SelectionOutOfSync(ReminderId),
    /// Store rejected one item; later items were not attempted. The other
    /// fields describe the items handled before the failure.
    Aborted {
        applied: Vec<ReminderId>,
        skipped: Vec<ReminderId>,
        notification_failures: Vec<NotifyError>,
        failed: ReminderId,
        source: RepoError,
    },
}

impl Display for BulkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelectionOutOfSync(id) => {
                write!(f, "selected reminder is not in the current list: {id}")
            }
            Self::Aborted {
                applied,
                failed,
                source,
                ..
            } => write!(
                f,
                "bulk operation stopped at reminder {failed} after {} item(s): {source}",
                applied.len()
            ),
        }
    }
}

impl Error for BulkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SelectionOutOfSync(_) => None,
            Self::Aborted { source, .. } => Some(source),
        }
    }
}

/// Summary of a bulk operation that did not hit a store failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    /// Ids written, in processing order.
    pub applied: Vec<ReminderId>,
    /// Ids already in the target state.
    pub skipped: Vec<ReminderId>,
    pub notification_failures: Vec<NotifyError>,
    /// The owning view closed mid-run; remaining ids were left untouched and
    /// the selection was not cleared.
    pub interrupted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BulkAction {
    Complete,
    Uncomplete,
    Delete,
}

impl BulkAction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Uncomplete => "uncomplete",
            Self::Delete => "delete",
        }
    }
}

/// Bulk use-case service.
pub struct BulkService<S: ReminderStore, N: Notifier> {
    store: S,
    notifier: N,
    liveness: Option<ViewLiveness>,
}

impl<S: ReminderStore, N: Notifier> BulkService<S, N> {
    pub fn new(store: S, notifier: N) -> Self {
        Self {
            store,
            notifier,
            liveness: None,
        }
    }

    /// Stops bulk loops once `liveness` is closed.
    pub fn with_liveness(mut self, liveness: ViewLiveness) -> Self {
        self.liveness = Some(liveness);
        self
    }

    /// Marks every selected pending reminder completed and cancels its alert.
    pub fn bulk_complete(
        &self,
        selection: &mut SelectionSet<ReminderId>,
        reminders: &[Reminder],
        now: EpochMs,
    ) -> Result<BulkReport, BulkError> {
        self.run(BulkAction::Complete, selection, reminders, |reminder| {
            if reminder.is_completed() {
                return Ok(None);
            }
            self.store.update_reminder(&reminder.completed(now))?;
            Ok(Some(cancel_alert(&self.notifier, reminder.id)))
        })
    }

    /// Reopens every selected completed reminder, clearing any snooze, and
    /// reschedules its alert from the un-snoozed time.
    pub fn bulk_uncomplete(
        &self,
        selection: &mut SelectionSet<ReminderId>,
        reminders: &[Reminder],
        now: EpochMs,
    ) -> Result<BulkReport, BulkError> {
        self.run(BulkAction::Uncomplete, selection, reminders, |reminder| {
            if !reminder.is_completed() {
                return Ok(None);
            }
            let next = Reminder {
                status: ReminderStatus::Pending,
                snoozed_until: None,
                completed_at: None,
                ..reminder.clone()
            };
            self.store.update_reminder(&next)?;
            Ok(Some(schedule_if_wanted(&self.notifier, &next, now)))
        })
    }

    /// Deletes every selected reminder and cancels its alert.
    pub fn bulk_delete(
        &self,
        selection: &mut SelectionSet<ReminderId>,
        reminders: &[Reminder],
    ) -> Result<BulkReport, BulkError> {
        self.run(BulkAction::Delete, selection, reminders, |reminder| {
            self.store.delete_reminder(reminder.id)?;
            Ok(Some(cancel_alert(&self.notifier, reminder.id)))
        })
    }

    fn run(
        &self,
        action: BulkAction,
        selection: &mut SelectionSet<ReminderId>,
        reminders: &[Reminder],
        mut apply: impl FnMut(&Reminder) -> Result<Option<NotificationOutcome>, RepoError>,
    ) -> Result<BulkReport, BulkError> {
        let started_at = Instant::now();
        let targets = resolve_selection(selection, reminders)?;
        let mut report = BulkReport::default();

        for reminder in targets {
            if !still_alive(self.liveness.as_ref()) {
                report.interrupted = true;
                break;
            }

            match apply(reminder) {
                Ok(None) => report.skipped.push(reminder.id),
                Ok(Some(notification)) => {
                    report.applied.push(reminder.id);
                    if let NotificationOutcome::Failed(err) = notification {
                        report.notification_failures.push(err);
                    }
                }
                Err(source) => {
                    warn!(
                        "event=bulk_{} module=service status=error applied={} failed_id={} error={source}",
                        action.as_str(),
                        report.applied.len(),
                        reminder.id
                    );
                    return Err(BulkError::Aborted {
                        applied: report.applied,
                        skipped: report.skipped,
                        notification_failures: report.notification_failures,
                        failed: reminder.id,
                        source,
                    });
                }
            }
        }

        if !report.interrupted && still_alive(self.liveness.as_ref()) {
            selection.exit();
        } else {
            report.interrupted = true;
        }

        info!(
            "event=bulk_{} module=service status=ok applied={} skipped={} notification_failures={} interrupted={} duration_ms={}",
            action.as_str(),
            report.applied.len(),
            report.skipped.len(),
            report.notification_failures.len(),
            report.interrupted,
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }
}

/// Looks up every selected id in `reminders`, in selection order.
fn resolve_selection<'a>(
    selection: &SelectionSet<ReminderId>,
    reminders: &'a [Reminder],
) -> Result<Vec<&'a Reminder>, BulkError> {
    let by_id = reminders
        .iter()
        .map(|reminder| (reminder.id, reminder))
        .collect::<HashMap<_, _>>();
    selection
        .ids()
        .into_iter()
        .map(|id| by_id.get(&id).copied().ok_or(BulkError::SelectionOutOfSync(id)))
        .collect()
}
