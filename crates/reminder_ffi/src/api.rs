//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level reminder and space functions to Dart via FRB.
//! - Hand device alert commands back to the host with every mutation.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every failure becomes an envelope with `ok = false` and a message.
//! - Undo tokens live in one process-wide registry and expire with the
//!   configured undo window.

use chrono::Local;
use log::warn;
use reminder_core::db::open_db;
use reminder_core::filter::{apply_filter_in, count_by_space, count_filters_in, scope_reminders};
use reminder_core::{
    core_version as core_version_inner, derive_display, init_logging as init_logging_inner,
    now_epoch_ms, ping as ping_inner, BulkError, BulkReport, BulkService, CoreConfig, MergeRequest,
    MergeTarget, NewSpace, NotificationCommand, OutboxNotifier, Reminder, ReminderDraft,
    ReminderFilter, ReminderId, ReminderService, ReminderStore, SelectionSet, Space, SpaceId,
    SpaceScope, SpaceService, SpaceStore, SqliteStore, UndoToken,
};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock, PoisonError};

const DB_PATH_ENV: &str = "REMINDERS_DB_PATH";
const DB_FILE_NAME: &str = "reminders.sqlite3";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static CONFIG: OnceLock<CoreConfig> = OnceLock::new();
static UNDO_TOKENS: OnceLock<Mutex<HashMap<String, UndoToken>>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Device alert command the host must execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationItem {
    /// `schedule|cancel`.
    pub action: String,
    pub reminder_id: String,
    /// Alert title; set for `schedule`.
    pub title: Option<String>,
    /// Trigger instant in epoch ms; set for `schedule`.
    pub fire_at: Option<i64>,
}

/// Reminder row with derived display state.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderItem {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_time: i64,
    pub snoozed_until: Option<i64>,
    pub effective_time: i64,
    pub created_at: i64,
    /// `pending|completed`.
    pub status: String,
    pub is_notification_enabled: bool,
    pub space_id: Option<String>,
    /// `pending|overdue|completed` at response time.
    pub state: String,
    pub remaining_text: String,
    pub progress: f64,
}

/// Category size for the filter chips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCountItem {
    pub filter: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemindersListResponse {
    pub ok: bool,
    pub message: String,
    /// Filter key actually applied (`total` when the input was unknown).
    pub applied_filter: String,
    pub items: Vec<ReminderItem>,
    /// Counts for every category within the same space scope.
    pub counts: Vec<FilterCountItem>,
}

/// Envelope for single-reminder mutations.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderActionResponse {
    pub ok: bool,
    pub message: String,
    pub reminder: Option<ReminderItem>,
    /// Set by `reminder_delete`; redeem with `reminder_undo_delete`.
    pub undo_token: Option<String>,
    pub notifications: Vec<NotificationItem>,
}

impl ReminderActionResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            reminder: None,
            undo_token: None,
            notifications: Vec::new(),
        }
    }
}

/// Envelope for bulk reminder actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkActionResponse {
    pub ok: bool,
    pub message: String,
    /// Ids written before completion or failure.
    pub applied_ids: Vec<String>,
    pub skipped_ids: Vec<String>,
    pub notification_failures: u32,
    pub notifications: Vec<NotificationItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceItem {
    pub id: String,
    pub name: String,
    pub color: u32,
    pub icon: String,
    pub reminder_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpacesListResponse {
    pub ok: bool,
    pub message: String,
    pub items: Vec<SpaceItem>,
    /// Reminders without a space.
    pub unassigned_count: u32,
}

/// Envelope for space create and merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceActionResponse {
    pub ok: bool,
    pub message: String,
    pub space_id: Option<String>,
    /// Reminders moved by a merge.
    pub moved: u32,
}

impl SpaceActionResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            space_id: None,
            moved: 0,
        }
    }
}

/// Creates a reminder and schedules its alert.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - `space_id` must name an existing space when set.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_create(
    title: String,
    description: Option<String>,
    scheduled_time: i64,
    notification_enabled: bool,
    space_id: Option<String>,
) -> ReminderActionResponse {
    let result = with_store(|store| {
        let space_id = space_id.as_deref().map(parse_id).transpose()?;
        let draft = ReminderDraft {
            title,
            description,
            scheduled_time,
            is_notification_enabled: notification_enabled,
            space_id,
        };
        let outbox = OutboxNotifier::new();
        let now = now_epoch_ms();
        let outcome = ReminderService::with_config(store, &outbox, config())
            .create_reminder(draft, now)
            .map_err(|err| err.to_string())?;
        Ok(mutation_response(
            "Reminder created.",
            &outcome.reminder,
            now,
            &outbox,
        ))
    });
    result.unwrap_or_else(|err| {
        ReminderActionResponse::failure(format!("reminder_create failed: {err}"))
    })
}

/// Lists reminders in one category and space scope.
///
/// Input semantics:
/// - `filter`: category key; unknown keys fall back to `total`.
/// - `space_id`: restrict to one space; `unassigned_only` restricts to
///   reminders without a space when `space_id` is `None`.
#[flutter_rust_bridge::frb(sync)]
pub fn reminders_list(
    filter: String,
    space_id: Option<String>,
    unassigned_only: bool,
) -> RemindersListResponse {
    let applied = ReminderFilter::parse(&filter).unwrap_or(ReminderFilter::Total);
    let result = with_store(|store| {
        let scope = match space_id.as_deref().map(parse_id).transpose()? {
            Some(id) => SpaceScope::Space(id),
            None if unassigned_only => SpaceScope::Unassigned,
            None => SpaceScope::All,
        };
        let scoped = scope_reminders(&list_all(store)?, scope);
        let now = now_epoch_ms();
        let recent_limit = config().recent_limit;
        let items = apply_filter_in(&scoped, applied, now, recent_limit, &Local)
            .into_iter()
            .map(|reminder| to_reminder_item(reminder, now))
            .collect::<Vec<_>>();
        let counts = count_filters_in(&scoped, now, recent_limit, &Local);
        let counts = ReminderFilter::ALL
            .iter()
            .map(|filter| FilterCountItem {
                filter: filter.as_str().to_string(),
                count: to_u32(counts.get(*filter)),
            })
            .collect();
        Ok(RemindersListResponse {
            ok: true,
            message: format!("{} reminder(s).", items.len()),
            applied_filter: applied.as_str().to_string(),
            items,
            counts,
        })
    });
    result.unwrap_or_else(|err| RemindersListResponse {
        ok: false,
        message: format!("reminders_list failed: {err}"),
        applied_filter: applied.as_str().to_string(),
        items: Vec::new(),
        counts: Vec::new(),
    })
}

/// Flips one reminder between pending and completed.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_toggle(reminder_id: String) -> ReminderActionResponse {
    let result = with_store(|store| {
        let reminder = load_reminder(store, &reminder_id)?;
        let outbox = OutboxNotifier::new();
        let now = now_epoch_ms();
        let outcome = ReminderService::with_config(store, &outbox, config())
            .toggle_status(&reminder, now)
            .map_err(|err| err.to_string())?;
        Ok(mutation_response(
            "Reminder updated.",
            &outcome.reminder,
            now,
            &outbox,
        ))
    });
    result.unwrap_or_else(|err| {
        ReminderActionResponse::failure(format!("reminder_toggle failed: {err}"))
    })
}

/// Moves one reminder's effective trigger time to `until_epoch_ms`.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_snooze(reminder_id: String, until_epoch_ms: i64) -> ReminderActionResponse {
    let result = with_store(|store| {
        let reminder = load_reminder(store, &reminder_id)?;
        let outbox = OutboxNotifier::new();
        let now = now_epoch_ms();
        let outcome = ReminderService::with_config(store, &outbox, config())
            .snooze(&reminder, until_epoch_ms, now)
            .map_err(|err| err.to_string())?;
        Ok(mutation_response(
            "Reminder snoozed.",
            &outcome.reminder,
            now,
            &outbox,
        ))
    });
    result.unwrap_or_else(|err| {
        ReminderActionResponse::failure(format!("reminder_snooze failed: {err}"))
    })
}

/// Deletes one reminder and returns an undo token.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_delete(reminder_id: String) -> ReminderActionResponse {
    let result = with_store(|store| {
        let reminder = load_reminder(store, &reminder_id)?;
        let outbox = OutboxNotifier::new();
        let now = now_epoch_ms();
        let outcome = ReminderService::with_config(store, &outbox, config())
            .delete_reminder(&reminder, now)
            .map_err(|err| err.to_string())?;
        let token_id = register_undo(outcome.undo, now);
        Ok(ReminderActionResponse {
            ok: true,
            message: "Reminder deleted.".to_string(),
            reminder: Some(to_reminder_item(&reminder, now)),
            undo_token: Some(token_id),
            notifications: drain_notifications(&outbox),
        })
    });
    result.unwrap_or_else(|err| {
        ReminderActionResponse::failure(format!("reminder_delete failed: {err}"))
    })
}

/// Restores a reminder deleted by `reminder_delete`.
///
/// # FFI contract
/// - A token is consumed by its first use, successful or not.
/// - Unknown or expired tokens return `ok = false`.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_undo_delete(undo_token: String) -> ReminderActionResponse {
    let Some(token) = take_undo(&undo_token) else {
        return ReminderActionResponse::failure("reminder_undo_delete failed: unknown undo token");
    };
    let result = with_store(|store| {
        let outbox = OutboxNotifier::new();
        let now = now_epoch_ms();
        let outcome = ReminderService::with_config(store, &outbox, config())
            .undo_delete(token, now)
            .map_err(|err| err.to_string())?;
        Ok(mutation_response(
            "Reminder restored.",
            &outcome.reminder,
            now,
            &outbox,
        ))
    });
    result.unwrap_or_else(|err| {
        ReminderActionResponse::failure(format!("reminder_undo_delete failed: {err}"))
    })
}

/// Completes every listed reminder.
#[flutter_rust_bridge::frb(sync)]
pub fn reminders_bulk_complete(reminder_ids: Vec<String>) -> BulkActionResponse {
    run_bulk("reminders_bulk_complete", reminder_ids, |service, selection, reminders| {
        service.bulk_complete(selection, reminders, now_epoch_ms())
    })
}

/// Reopens every listed reminder and clears its snooze.
#[flutter_rust_bridge::frb(sync)]
pub fn reminders_bulk_uncomplete(reminder_ids: Vec<String>) -> BulkActionResponse {
    run_bulk("reminders_bulk_uncomplete", reminder_ids, |service, selection, reminders| {
        service.bulk_uncomplete(selection, reminders, now_epoch_ms())
    })
}

/// Deletes every listed reminder; no undo token is issued.
#[flutter_rust_bridge::frb(sync)]
pub fn reminders_bulk_delete(reminder_ids: Vec<String>) -> BulkActionResponse {
    run_bulk("reminders_bulk_delete", reminder_ids, |service, selection, reminders| {
        service.bulk_delete(selection, reminders)
    })
}

/// Creates a space.
#[flutter_rust_bridge::frb(sync)]
pub fn space_create(name: String, color: u32, icon: String) -> SpaceActionResponse {
    let result = with_store(|store| {
        let space = SpaceService::new(store)
            .create_space(NewSpace { name, color, icon }, now_epoch_ms())
            .map_err(|err| err.to_string())?;
        Ok(SpaceActionResponse {
            ok: true,
            message: "Space created.".to_string(),
            space_id: Some(space.id.to_string()),
            moved: 0,
        })
    });
    result.unwrap_or_else(|err| {
        SpaceActionResponse::failure(format!("space_create failed: {err}"))
    })
}

/// Lists spaces with their reminder counts.
#[flutter_rust_bridge::frb(sync)]
pub fn spaces_list() -> SpacesListResponse {
    let result = with_store(|store| {
        let spaces = store.list_spaces().map_err(|err| err.to_string())?;
        let counts = count_by_space(&list_all(store)?);
        let items = spaces
            .into_iter()
            .map(|space| {
                let count = counts.get(&Some(space.id)).copied().unwrap_or(0);
                to_space_item(space, count)
            })
            .collect::<Vec<_>>();
        Ok(SpacesListResponse {
            ok: true,
            message: format!("{} space(s).", items.len()),
            items,
            unassigned_count: to_u32(counts.get(&None).copied().unwrap_or(0)),
        })
    });
    result.unwrap_or_else(|err| SpacesListResponse {
        ok: false,
        message: format!("spaces_list failed: {err}"),
        items: Vec::new(),
        unassigned_count: 0,
    })
}

/// Merges the selected spaces into one target.
///
/// Input semantics:
/// - `target_space_id`: existing target; may also appear in `space_ids`.
/// - When `target_space_id` is `None`, a new space named `new_space_name`
///   with `new_space_color` and `new_space_icon` is created as the target.
/// - `delete_source_spaces`: remove the emptied sources afterwards.
#[flutter_rust_bridge::frb(sync)]
pub fn spaces_merge(
    space_ids: Vec<String>,
    target_space_id: Option<String>,
    new_space_name: Option<String>,
    new_space_color: u32,
    new_space_icon: String,
    delete_source_spaces: bool,
) -> SpaceActionResponse {
    let result = with_store(|store| {
        let selected = space_ids
            .iter()
            .map(|id| parse_id(id))
            .collect::<Result<BTreeSet<SpaceId>, _>>()?;
        let target = match target_space_id.as_deref().map(parse_id).transpose()? {
            Some(id) => MergeTarget::Existing(id),
            None => MergeTarget::New(NewSpace {
                name: new_space_name.unwrap_or_default(),
                color: new_space_color,
                icon: new_space_icon,
            }),
        };
        let request = MergeRequest {
            selected,
            target,
            delete_source_spaces,
        };
        let outcome = SpaceService::new(store)
            .merge_spaces(&request, now_epoch_ms())
            .map_err(|err| err.to_string())?;
        Ok(SpaceActionResponse {
            ok: true,
            message: format!(
                "Merged {} reminder(s); removed {} space(s).",
                outcome.moved,
                outcome.deleted_sources.len()
            ),
            space_id: Some(outcome.target_id.to_string()),
            moved: to_u32(outcome.moved),
        })
    });
    result.unwrap_or_else(|err| {
        SpaceActionResponse::failure(format!("spaces_merge failed: {err}"))
    })
}

fn run_bulk(
    operation: &str,
    reminder_ids: Vec<String>,
    action: impl FnOnce(
        &BulkService<&SqliteStore<'_>, &OutboxNotifier>,
        &mut SelectionSet<ReminderId>,
        &[Reminder],
    ) -> Result<BulkReport, BulkError>,
) -> BulkActionResponse {
    let outbox = OutboxNotifier::new();
    let result = with_store(|store| {
        let ids = reminder_ids
            .iter()
            .map(|id| parse_id(id))
            .collect::<Result<Vec<ReminderId>, _>>()?;
        let mut selection = ids.into_iter().collect::<SelectionSet<_>>();
        let reminders = list_all(store)?;
        let service = BulkService::new(store, &outbox);
        Ok(action(&service, &mut selection, &reminders))
    });

    match result {
        Ok(Ok(report)) => BulkActionResponse {
            ok: true,
            message: format!("{} reminder(s) updated.", report.applied.len()),
            applied_ids: ids_to_strings(&report.applied),
            skipped_ids: ids_to_strings(&report.skipped),
            notification_failures: to_u32(report.notification_failures.len()),
            notifications: drain_notifications(&outbox),
        },
        Ok(Err(BulkError::Aborted {
            applied,
            skipped,
            notification_failures,
            failed,
            source,
        })) => BulkActionResponse {
            ok: false,
            message: format!("{operation} stopped at {failed}: {source}"),
            applied_ids: ids_to_strings(&applied),
            skipped_ids: ids_to_strings(&skipped),
            notification_failures: to_u32(notification_failures.len()),
            notifications: drain_notifications(&outbox),
        },
        Ok(Err(err)) => bulk_failure(operation, err.to_string()),
        Err(err) => bulk_failure(operation, err),
    }
}

fn bulk_failure(operation: &str, message: String) -> BulkActionResponse {
    BulkActionResponse {
        ok: false,
        message: format!("{operation} failed: {message}"),
        applied_ids: Vec::new(),
        skipped_ids: Vec::new(),
        notification_failures: 0,
        notifications: Vec::new(),
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn config() -> CoreConfig {
    *CONFIG.get_or_init(CoreConfig::from_env)
}

fn with_store<T>(f: impl FnOnce(&SqliteStore<'_>) -> Result<T, String>) -> Result<T, String> {
    let conn = open_db(resolve_db_path()).map_err(|err| {
        warn!("event=ffi_store_open module=ffi status=error error={err}");
        format!("DB open failed: {err}")
    })?;
    let store = SqliteStore::try_new(&conn).map_err(|err| format!("store init failed: {err}"))?;
    f(&store)
}

fn list_all(store: &SqliteStore<'_>) -> Result<Vec<Reminder>, String> {
    store.list_reminders().map_err(|err| err.to_string())
}

fn load_reminder(store: &SqliteStore<'_>, id: &str) -> Result<Reminder, String> {
    let id = parse_id(id)?;
    store
        .get_reminder(id)
        .map_err(|err| err.to_string())?
        .ok_or_else(|| format!("reminder not found: {id}"))
}

fn parse_id(value: &str) -> Result<uuid::Uuid, String> {
    uuid::Uuid::parse_str(value.trim()).map_err(|_| format!("invalid id `{value}`"))
}

fn undo_registry() -> &'static Mutex<HashMap<String, UndoToken>> {
    UNDO_TOKENS.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Stores `token` and drops any that already expired.
fn register_undo(token: UndoToken, now: i64) -> String {
    let token_id = uuid::Uuid::new_v4().to_string();
    let mut tokens = undo_registry()
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    tokens.retain(|_, existing| !existing.is_expired(now));
    tokens.insert(token_id.clone(), token);
    token_id
}

fn take_undo(token_id: &str) -> Option<UndoToken> {
    undo_registry()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(token_id)
}

fn mutation_response(
    message: &str,
    reminder: &Reminder,
    now: i64,
    outbox: &OutboxNotifier,
) -> ReminderActionResponse {
    ReminderActionResponse {
        ok: true,
        message: message.to_string(),
        reminder: Some(to_reminder_item(reminder, now)),
        undo_token: None,
        notifications: drain_notifications(outbox),
    }
}

fn drain_notifications(outbox: &OutboxNotifier) -> Vec<NotificationItem> {
    outbox.drain().into_iter().map(to_notification_item).collect()
}

fn to_notification_item(command: NotificationCommand) -> NotificationItem {
    match command {
        NotificationCommand::Schedule {
            reminder_id,
            title,
            fire_at,
        } => NotificationItem {
            action: "schedule".to_string(),
            reminder_id: reminder_id.to_string(),
            title: Some(title),
            fire_at: Some(fire_at),
        },
        NotificationCommand::Cancel { reminder_id } => NotificationItem {
            action: "cancel".to_string(),
            reminder_id: reminder_id.to_string(),
            title: None,
            fire_at: None,
        },
    }
}

fn to_reminder_item(reminder: &Reminder, now: i64) -> ReminderItem {
    let display = derive_display(reminder, now);
    ReminderItem {
        id: reminder.id.to_string(),
        title: reminder.title.clone(),
        description: reminder.description.clone(),
        scheduled_time: reminder.scheduled_time,
        snoozed_until: reminder.snoozed_until,
        effective_time: reminder.effective_time(),
        created_at: reminder.created_at,
        status: reminder.status.as_str().to_string(),
        is_notification_enabled: reminder.is_notification_enabled,
        space_id: reminder.space_id.map(|id| id.to_string()),
        state: display.state.as_str().to_string(),
        remaining_text: display.remaining_text,
        progress: display.progress,
    }
}

fn to_space_item(space: Space, reminder_count: usize) -> SpaceItem {
    SpaceItem {
        id: space.id.to_string(),
        name: space.name,
        color: space.color,
        icon: space.icon,
        reminder_count: to_u32(reminder_count),
    }
}

fn ids_to_strings(ids: &[ReminderId]) -> Vec<String> {
    ids.iter().map(ToString::to_string).collect()
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
