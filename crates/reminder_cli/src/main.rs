//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `reminder_core` linkage.
//! - Print per-category counts for the database named by `REMINDERS_DB_PATH`.
//! - Replay the pending alert plan through `LogNotifier` into the CLI log
//!   directory.

use reminder_core::db::open_db;
use reminder_core::{
    count_filters, default_log_level, flush_logs, init_logging, now_epoch_ms, EpochMs,
    LogNotifier, Notifier, NotifyError, Reminder, ReminderFilter, ReminderStore, SpaceStore,
    SqliteStore,
};
use std::path::PathBuf;
use std::process::ExitCode;

const DB_PATH_ENV: &str = "REMINDERS_DB_PATH";
const LOG_DIR_NAME: &str = "reminders-cli-logs";

fn main() -> ExitCode {
    println!("reminder_core ping={}", reminder_core::ping());
    println!("reminder_core version={}", reminder_core::core_version());

    let Some(path) = std::env::var(DB_PATH_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
    else {
        return ExitCode::SUCCESS;
    };

    let log_dir = cli_log_dir();
    match init_logging(default_log_level(), &log_dir.to_string_lossy()) {
        Ok(()) => println!("log_dir={}", log_dir.display()),
        Err(err) => eprintln!("reminder_cli warning: logging disabled: {err}"),
    }

    let result = print_counts(path.trim());
    flush_logs();
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("reminder_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn cli_log_dir() -> PathBuf {
    std::env::temp_dir().join(LOG_DIR_NAME)
}

fn print_counts(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db(path)?;
    let store = SqliteStore::try_new(&conn)?;
    let reminders = store.list_reminders()?;
    let now = now_epoch_ms();
    let counts = count_filters(&reminders, now);

    for filter in ReminderFilter::ALL {
        println!("{filter}={}", counts.get(filter));
    }
    println!("spaces={}", store.list_spaces()?.len());

    let alerts = replay_alerts(&LogNotifier, &reminders, now)?;
    println!("alerts={alerts}");
    Ok(())
}

/// Schedules every reminder that wants an alert at `now`.
fn replay_alerts<N: Notifier>(
    notifier: &N,
    reminders: &[Reminder],
    now: EpochMs,
) -> Result<usize, NotifyError> {
    let mut alerts = 0;
    for reminder in reminders.iter().filter(|r| r.wants_notification(now)) {
        notifier.schedule(reminder)?;
        alerts += 1;
    }
    Ok(alerts)
}
