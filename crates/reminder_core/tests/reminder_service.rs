use reminder_core::db::open_db_in_memory;
use reminder_core::repo::feed::Subscription;
use reminder_core::{
    CoreConfig, NotificationCommand, NotificationOutcome, Notifier, NotifyError, OutboxNotifier,
    RepoError, RepoResult, Reminder, ReminderDraft, ReminderId, ReminderService, ReminderStatus,
    ReminderStore, ServiceError, SqliteStore,
};

const NOW: i64 = 1_700_000_000_000;
const HOUR: i64 = 3_600_000;

/// Notifier whose every call fails.
struct UnavailableNotifier;

impl Notifier for UnavailableNotifier {
    fn schedule(&self, reminder: &Reminder) -> Result<(), NotifyError> {
        Err(NotifyError::new(reminder.id, "alerts unavailable"))
    }

    fn cancel(&self, id: ReminderId) -> Result<(), NotifyError> {
        Err(NotifyError::new(id, "alerts unavailable"))
    }
}

/// Store that reads through but rejects every write.
struct ReadOnlyStore<'a> {
    inner: SqliteStore<'a>,
}

impl ReminderStore for ReadOnlyStore<'_> {
    fn list_reminders(&self) -> RepoResult<Vec<Reminder>> {
        self.inner.list_reminders()
    }

    fn reminders_in_space(&self, space_id: uuid::Uuid) -> RepoResult<Vec<Reminder>> {
        self.inner.reminders_in_space(space_id)
    }

    fn get_reminder(&self, id: ReminderId) -> RepoResult<Option<Reminder>> {
        self.inner.get_reminder(id)
    }

    fn add_reminder(&self, _reminder: &Reminder) -> RepoResult<ReminderId> {
        Err(RepoError::InvalidData("read-only".to_string()))
    }

    fn update_reminder(&self, _reminder: &Reminder) -> RepoResult<()> {
        Err(RepoError::InvalidData("read-only".to_string()))
    }

    fn delete_reminder(&self, _id: ReminderId) -> RepoResult<()> {
        Err(RepoError::InvalidData("read-only".to_string()))
    }

    fn save_reminders(&self, _reminders: &[Reminder]) -> RepoResult<()> {
        Err(RepoError::InvalidData("read-only".to_string()))
    }

    fn subscribe_reminders(&self) -> Subscription<Vec<Reminder>> {
        self.inner.subscribe_reminders()
    }
}

#[test]
fn create_normalizes_title_and_schedules_alert() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let outbox = OutboxNotifier::new();
    let service = ReminderService::new(&store, &outbox);

    let mut draft = ReminderDraft::new("  Pay   rent ", NOW + HOUR);
    draft.description = Some("   ".to_string());
    let outcome = service.create_reminder(draft, NOW).unwrap();

    assert_eq!(outcome.reminder.title, "Pay rent");
    assert_eq!(outcome.reminder.description, None);
    assert_eq!(outcome.reminder.created_at, NOW);
    assert_eq!(outcome.notification, NotificationOutcome::Scheduled);
    assert_eq!(
        store.get_reminder(outcome.reminder.id).unwrap(),
        Some(outcome.reminder.clone())
    );
    assert_eq!(
        outbox.drain(),
        vec![NotificationCommand::Schedule {
            reminder_id: outcome.reminder.id,
            title: "Pay rent".to_string(),
            fire_at: NOW + HOUR,
        }]
    );
}

#[test]
fn create_rejects_blank_title_without_side_effects() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let outbox = OutboxNotifier::new();
    let service = ReminderService::new(&store, &outbox);

    let err = service
        .create_reminder(ReminderDraft::new(" \t ", NOW + HOUR), NOW)
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert!(store.list_reminders().unwrap().is_empty());
    assert!(outbox.drain().is_empty());
}

#[test]
fn create_without_alert_or_in_past_skips_scheduling() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let outbox = OutboxNotifier::new();
    let service = ReminderService::new(&store, &outbox);

    let mut silent = ReminderDraft::new("silent", NOW + HOUR);
    silent.is_notification_enabled = false;
    let outcome = service.create_reminder(silent, NOW).unwrap();
    assert_eq!(outcome.notification, NotificationOutcome::Skipped);

    let outcome = service
        .create_reminder(ReminderDraft::new("past", NOW - HOUR), NOW)
        .unwrap();
    assert_eq!(outcome.notification, NotificationOutcome::Skipped);
    assert!(outbox.drain().is_empty());
}

#[test]
fn toggle_completes_then_reopens_with_alert() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let outbox = OutboxNotifier::new();
    let service = ReminderService::new(&store, &outbox);

    let created = service
        .create_reminder(ReminderDraft::new("Stretch", NOW + HOUR), NOW)
        .unwrap()
        .reminder;
    outbox.drain();

    let completed = service.toggle_status(&created, NOW + 10).unwrap();
    assert_eq!(completed.reminder.status, ReminderStatus::Completed);
    assert_eq!(completed.reminder.completed_at, Some(NOW + 10));
    assert_eq!(completed.notification, NotificationOutcome::Cancelled);
    assert_eq!(
        outbox.drain(),
        vec![NotificationCommand::Cancel {
            reminder_id: created.id
        }]
    );

    let reopened = service.toggle_status(&completed.reminder, NOW + 20).unwrap();
    assert_eq!(reopened.reminder.status, ReminderStatus::Pending);
    assert_eq!(reopened.reminder.completed_at, None);
    assert_eq!(reopened.notification, NotificationOutcome::Scheduled);
    assert_eq!(
        store.get_reminder(created.id).unwrap().unwrap().status,
        ReminderStatus::Pending
    );
}

#[test]
fn reopening_past_reminder_does_not_schedule() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let outbox = OutboxNotifier::new();
    let service = ReminderService::new(&store, &outbox);

    let created = service
        .create_reminder(ReminderDraft::new("Old", NOW + HOUR), NOW)
        .unwrap()
        .reminder;
    let completed = service.toggle_status(&created, NOW).unwrap().reminder;
    outbox.drain();

    let reopened = service.toggle_status(&completed, NOW + 2 * HOUR).unwrap();
    assert_eq!(reopened.notification, NotificationOutcome::Skipped);
    assert!(outbox.drain().is_empty());
}

#[test]
fn notifier_failure_keeps_the_write() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let service = ReminderService::new(&store, UnavailableNotifier);

    let outcome = service
        .create_reminder(ReminderDraft::new("Dentist", NOW + HOUR), NOW)
        .unwrap();
    assert!(outcome.notification.is_failure());
    assert!(store.get_reminder(outcome.reminder.id).unwrap().is_some());

    let toggled = service.toggle_status(&outcome.reminder, NOW).unwrap();
    assert_eq!(
        toggled.notification.failure().map(|err| err.reminder_id),
        Some(outcome.reminder.id)
    );
    assert_eq!(
        store.get_reminder(outcome.reminder.id).unwrap().unwrap().status,
        ReminderStatus::Completed
    );
}

#[test]
fn store_failure_skips_notification() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let existing = Reminder::new("Existing", NOW + HOUR, NOW);
    store.add_reminder(&existing).unwrap();

    let outbox = OutboxNotifier::new();
    let service = ReminderService::new(ReadOnlyStore { inner: store }, &outbox);

    assert!(matches!(
        service.toggle_status(&existing, NOW),
        Err(ServiceError::Repo(_))
    ));
    assert!(matches!(
        service.delete_reminder(&existing, NOW),
        Err(ServiceError::Repo(_))
    ));
    assert!(outbox.drain().is_empty());
}

#[test]
fn snooze_moves_alert_to_new_time() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let outbox = OutboxNotifier::new();
    let service = ReminderService::new(&store, &outbox);

    let created = service
        .create_reminder(ReminderDraft::new("Laundry", NOW + HOUR), NOW)
        .unwrap()
        .reminder;
    outbox.drain();

    let snoozed = service
        .snooze(&created, NOW + 2 * HOUR, NOW + 1_000)
        .unwrap();
    assert_eq!(snoozed.reminder.snoozed_until, Some(NOW + 2 * HOUR));
    assert_eq!(snoozed.reminder.scheduled_time, NOW + HOUR);
    assert_eq!(
        outbox.drain(),
        vec![NotificationCommand::Schedule {
            reminder_id: created.id,
            title: "Laundry".to_string(),
            fire_at: NOW + 2 * HOUR,
        }]
    );

    let err = service.snooze(&created, NOW, NOW).unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[test]
fn delete_then_undo_restores_reminder_and_alert() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let outbox = OutboxNotifier::new();
    let service = ReminderService::new(&store, &outbox);

    let created = service
        .create_reminder(ReminderDraft::new("Groceries", NOW + HOUR), NOW)
        .unwrap()
        .reminder;
    outbox.drain();

    let deleted = service.delete_reminder(&created, NOW + 100).unwrap();
    assert_eq!(deleted.notification, NotificationOutcome::Cancelled);
    assert_eq!(deleted.undo.expires_at(), NOW + 100 + 4_000);
    assert!(store.get_reminder(created.id).unwrap().is_none());

    let restored = service.undo_delete(deleted.undo, NOW + 2_000).unwrap();
    assert_eq!(restored.reminder, created);
    assert_eq!(store.get_reminder(created.id).unwrap(), Some(created.clone()));
    assert_eq!(
        outbox
            .drain()
            .into_iter()
            .map(|command| command.reminder_id())
            .collect::<Vec<_>>(),
        vec![created.id, created.id]
    );
}

#[test]
fn undo_after_window_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let outbox = OutboxNotifier::new();
    let config = CoreConfig {
        undo_window_ms: 1_000,
        ..CoreConfig::default()
    };
    let service = ReminderService::with_config(&store, &outbox, config);

    let created = service
        .create_reminder(ReminderDraft::new("Bins", NOW + HOUR), NOW)
        .unwrap()
        .reminder;
    let deleted = service.delete_reminder(&created, NOW).unwrap();
    assert!(!deleted.undo.is_expired(NOW + 1_000));

    let err = service.undo_delete(deleted.undo, NOW + 1_001).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::UndoExpired { reminder_id, .. } if reminder_id == created.id
    ));
    assert!(store.get_reminder(created.id).unwrap().is_none());
}

#[test]
fn update_resyncs_alert_with_edit() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let outbox = OutboxNotifier::new();
    let service = ReminderService::new(&store, &outbox);

    let created = service
        .create_reminder(ReminderDraft::new("Meeting", NOW + HOUR), NOW)
        .unwrap()
        .reminder;
    outbox.drain();

    let mut edited = created.clone();
    edited.is_notification_enabled = false;
    let outcome = service.update_reminder(&edited, NOW).unwrap();
    assert_eq!(outcome.notification, NotificationOutcome::Cancelled);
    assert!(!store
        .get_reminder(created.id)
        .unwrap()
        .unwrap()
        .is_notification_enabled);
}

#[test]
fn update_trims_description_and_drops_blank() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let outbox = OutboxNotifier::new();
    let service = ReminderService::new(&store, &outbox);

    let created = service
        .create_reminder(ReminderDraft::new("Dentist", NOW + HOUR), NOW)
        .unwrap()
        .reminder;

    let mut edited = created.clone();
    edited.description = Some("  bring x-rays \n".to_string());
    let outcome = service.update_reminder(&edited, NOW).unwrap();
    assert_eq!(outcome.reminder.description.as_deref(), Some("bring x-rays"));

    edited.description = Some("   ".to_string());
    service.update_reminder(&edited, NOW).unwrap();
    let stored = store.get_reminder(created.id).unwrap().unwrap();
    assert_eq!(stored.description, None);
}
