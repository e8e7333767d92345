use reminder_core::{NotificationCommand, Reminder, ReminderStatus, Space};
use serde_json::json;

const NOW: i64 = 1_700_000_000_000;

#[test]
fn reminder_wire_shape_is_stable() {
    let mut reminder = Reminder::new("Buy milk", NOW + 1_000, NOW);
    reminder.snoozed_until = Some(NOW + 2_000);

    let value = serde_json::to_value(&reminder).unwrap();
    assert_eq!(value["id"], json!(reminder.id.to_string()));
    assert_eq!(value["title"], json!("Buy milk"));
    assert_eq!(value["description"], json!(null));
    assert_eq!(value["scheduled_time"], json!(NOW + 1_000));
    assert_eq!(value["status"], json!("pending"));
    assert_eq!(value["snoozed_until"], json!(NOW + 2_000));
    assert_eq!(value["is_notification_enabled"], json!(true));
    assert_eq!(value["space_id"], json!(null));

    let decoded: Reminder = serde_json::from_value(value).unwrap();
    assert_eq!(decoded, reminder);
}

#[test]
fn completed_status_serializes_as_snake_case() {
    let reminder = Reminder::new("Done", NOW, NOW).completed(NOW + 5);
    let value = serde_json::to_value(&reminder).unwrap();
    assert_eq!(value["status"], json!("completed"));
    assert_eq!(value["completed_at"], json!(NOW + 5));
    assert_eq!(reminder.status, ReminderStatus::Completed);
}

#[test]
fn space_and_commands_serialize_for_host() {
    let space = Space::new("Work", 0xFF33_6699, "briefcase", NOW);
    let value = serde_json::to_value(&space).unwrap();
    assert_eq!(value["color"], json!(0xFF33_6699_u32));
    assert_eq!(value["icon"], json!("briefcase"));

    let reminder = Reminder::new("Call", NOW + 10, NOW);
    let schedule = NotificationCommand::Schedule {
        reminder_id: reminder.id,
        title: reminder.title.clone(),
        fire_at: reminder.effective_time(),
    };
    let value = serde_json::to_value(&schedule).unwrap();
    assert_eq!(value["action"], json!("schedule"));
    assert_eq!(value["fire_at"], json!(NOW + 10));

    let cancel = NotificationCommand::Cancel {
        reminder_id: reminder.id,
    };
    let value = serde_json::to_value(&cancel).unwrap();
    assert_eq!(
        value,
        json!({"action": "cancel", "reminder_id": reminder.id.to_string()})
    );
}
