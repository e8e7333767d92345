use reminder_core::db::open_db_in_memory;
use reminder_core::{
    RepoError, Reminder, ReminderStatus, ReminderStore, Space, SpaceDeleteMode, SpaceStore,
    SqliteStore,
};
use std::collections::BTreeSet;
use uuid::Uuid;

const NOW: i64 = 1_700_000_000_000;

fn space(name: &str) -> Space {
    Space::new(name, 0xFF33_6699, "work", NOW)
}

fn reminder(title: &str, offset_ms: i64, space_id: Option<Uuid>) -> Reminder {
    let mut reminder = Reminder::new(title, NOW + offset_ms, NOW);
    reminder.space_id = space_id;
    reminder
}

#[test]
fn reminder_crud_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();

    let mut stored = reminder("Call mom", 60_000, None);
    stored.description = Some("about Sunday".to_string());
    stored.snoozed_until = Some(NOW + 120_000);
    store.add_reminder(&stored).unwrap();

    let loaded = store.get_reminder(stored.id).unwrap().unwrap();
    assert_eq!(loaded, stored);

    let completed = loaded.completed(NOW + 5_000);
    store.update_reminder(&completed).unwrap();
    let loaded = store.get_reminder(stored.id).unwrap().unwrap();
    assert_eq!(loaded.status, ReminderStatus::Completed);
    assert_eq!(loaded.completed_at, Some(NOW + 5_000));

    store.delete_reminder(stored.id).unwrap();
    assert!(store.get_reminder(stored.id).unwrap().is_none());
}

#[test]
fn list_is_ordered_by_scheduled_time() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();

    let late = reminder("late", 3_000, None);
    let early = reminder("early", 1_000, None);
    let middle = reminder("middle", 2_000, None);
    for item in [&late, &early, &middle] {
        store.add_reminder(item).unwrap();
    }

    let titles = store
        .list_reminders()
        .unwrap()
        .into_iter()
        .map(|item| item.title)
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["early", "middle", "late"]);
}

#[test]
fn missing_rows_and_spaces_are_reported() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();

    let ghost = reminder("ghost", 1_000, None);
    assert!(matches!(
        store.update_reminder(&ghost),
        Err(RepoError::ReminderNotFound(id)) if id == ghost.id
    ));
    assert!(matches!(
        store.delete_reminder(ghost.id),
        Err(RepoError::ReminderNotFound(_))
    ));

    let unknown_space = Uuid::new_v4();
    let orphan = reminder("orphan", 1_000, Some(unknown_space));
    assert!(matches!(
        store.add_reminder(&orphan),
        Err(RepoError::SpaceNotFound(id)) if id == unknown_space
    ));
    assert!(store.list_reminders().unwrap().is_empty());
}

#[test]
fn blank_title_is_rejected_before_write() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();

    let blank = reminder("   ", 1_000, None);
    assert!(matches!(
        store.add_reminder(&blank),
        Err(RepoError::InvalidReminder(_))
    ));
}

#[test]
fn save_reminders_is_all_or_nothing() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();

    let existing = reminder("existing", 1_000, None);
    store.add_reminder(&existing).unwrap();

    let mut renamed = existing.clone();
    renamed.title = "renamed".to_string();
    let fresh = reminder("fresh", 2_000, None);
    let orphan = reminder("orphan", 3_000, Some(Uuid::new_v4()));

    assert!(store
        .save_reminders(&[renamed.clone(), fresh.clone(), orphan])
        .is_err());
    let titles = store
        .list_reminders()
        .unwrap()
        .into_iter()
        .map(|item| item.title)
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["existing"]);

    store.save_reminders(&[renamed, fresh]).unwrap();
    let titles = store
        .list_reminders()
        .unwrap()
        .into_iter()
        .map(|item| item.title)
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["renamed", "fresh"]);
}

#[test]
fn subscribers_receive_full_snapshots_after_writes() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let subscription = store.subscribe_reminders();

    let first = reminder("first", 1_000, None);
    let second = reminder("second", 2_000, None);
    store.add_reminder(&first).unwrap();
    store.add_reminder(&second).unwrap();

    let snapshot = subscription.try_next().unwrap();
    assert_eq!(snapshot.len(), 1);
    let snapshot = subscription.latest().unwrap();
    assert_eq!(snapshot.len(), 2);
    assert!(subscription.try_next().is_none());

    store.delete_reminder(first.id).unwrap();
    assert_eq!(subscription.try_next().unwrap(), vec![second]);

    assert_eq!(store.reminder_feed().subscriber_count(), 1);
    subscription.cancel();
    assert_eq!(store.reminder_feed().subscriber_count(), 0);
}

#[test]
fn space_crud_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let subscription = store.subscribe_spaces();

    let mut work = space("Work");
    store.create_space(&work).unwrap();
    assert_eq!(subscription.try_next().unwrap(), vec![work.clone()]);

    work.name = "Office".to_string();
    work.color = 0xFF00_0000;
    store.update_space(&work).unwrap();
    assert_eq!(store.get_space(work.id).unwrap().unwrap(), work);

    let ghost = space("Ghost");
    assert!(matches!(
        store.update_space(&ghost),
        Err(RepoError::SpaceNotFound(_))
    ));
}

#[test]
fn deleting_space_unassigns_its_reminders() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();

    let work = space("Work");
    let home = space("Home");
    store.create_space(&work).unwrap();
    store.create_space(&home).unwrap();
    let in_work = reminder("in work", 1_000, Some(work.id));
    let in_home = reminder("in home", 2_000, Some(home.id));
    store.add_reminder(&in_work).unwrap();
    store.add_reminder(&in_home).unwrap();

    let affected = store.delete_space(work.id, SpaceDeleteMode::Unassign).unwrap();
    assert_eq!(affected, 1);
    assert!(store.get_space(work.id).unwrap().is_none());

    let loaded = store.get_reminder(in_work.id).unwrap().unwrap();
    assert_eq!(loaded.space_id, None);
    assert_eq!(
        store.get_reminder(in_home.id).unwrap().unwrap().space_id,
        Some(home.id)
    );
}

#[test]
fn deleting_space_with_reminders_removes_them() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let reminder_feed = store.subscribe_reminders();

    let work = space("Work");
    store.create_space(&work).unwrap();
    let first = reminder("first", 1_000, Some(work.id));
    let second = reminder("second", 2_000, Some(work.id));
    let loose = reminder("loose", 3_000, None);
    for item in [&first, &second, &loose] {
        store.add_reminder(item).unwrap();
    }
    reminder_feed.latest();

    let affected = store
        .delete_space(work.id, SpaceDeleteMode::DeleteReminders)
        .unwrap();
    assert_eq!(affected, 2);
    assert_eq!(store.list_reminders().unwrap(), vec![loose.clone()]);
    assert_eq!(reminder_feed.latest().unwrap(), vec![loose]);

    assert!(matches!(
        store.delete_space(work.id, SpaceDeleteMode::Unassign),
        Err(RepoError::SpaceNotFound(_))
    ));
}

#[test]
fn reminders_in_space_filters_by_reference() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();

    let work = space("Work");
    store.create_space(&work).unwrap();
    let inside = reminder("inside", 1_000, Some(work.id));
    let outside = reminder("outside", 2_000, None);
    store.add_reminder(&inside).unwrap();
    store.add_reminder(&outside).unwrap();

    assert_eq!(store.reminders_in_space(work.id).unwrap(), vec![inside]);
}

#[test]
fn move_space_reminders_rewrites_only_the_space_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reminders.sqlite3");
    let conn = reminder_core::open_db(&path).unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();

    let (work, home) = (space("Work"), space("Home"));
    store.create_space(&work).unwrap();
    store.create_space(&home).unwrap();
    let filed = reminder("filed", 1_000, Some(work.id));
    let loose = reminder("loose", 2_000, None);
    store.add_reminder(&filed).unwrap();
    store.add_reminder(&loose).unwrap();

    // Edit lands through a second connection after this one last read.
    let other_conn = reminder_core::open_db(&path).unwrap();
    let other = SqliteStore::try_new(&other_conn).unwrap();
    other.update_reminder(&filed.completed(NOW + 7)).unwrap();

    let ghost = Uuid::new_v4();
    assert!(matches!(
        store.move_space_reminders(&BTreeSet::from([work.id]), ghost),
        Err(RepoError::SpaceNotFound(id)) if id == ghost
    ));
    assert_eq!(
        store.get_reminder(filed.id).unwrap().unwrap().space_id,
        Some(work.id)
    );

    let moved = store
        .move_space_reminders(&BTreeSet::from([work.id]), home.id)
        .unwrap();
    assert_eq!(moved, 1);

    let after = store.get_reminder(filed.id).unwrap().unwrap();
    assert_eq!(after.space_id, Some(home.id));
    assert_eq!(after.status, ReminderStatus::Completed);
    assert_eq!(after.completed_at, Some(NOW + 7));
    assert_eq!(store.get_reminder(loose.id).unwrap().unwrap().space_id, None);
}
