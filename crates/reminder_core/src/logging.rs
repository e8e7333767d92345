//! Rolling file logs for the reminder core.
//!
//! # Responsibility
//! - Start the `flexi_logger` backend once per process.
//! - Capture panics as a single sanitized log line.
//!
//! # Invariants
//! - Repeating `init_logging` with the same level and directory is a no-op.
//! - A second call with a different level or directory is rejected.
//! - Initialization never panics.
//! - Log lines carry ids and counts, never reminder titles or descriptions.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "reminders";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

struct LoggingState {
    level: &'static str,
    log_dir: PathBuf,
    logger: LoggerHandle,
}

/// Why logging could not be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    UnsupportedLevel(String),
    InvalidDirectory(String),
    /// Already running with a different level or directory.
    Conflict { active: String, requested: String },
    Backend(String),
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::InvalidDirectory(message) => write!(f, "invalid log directory: {message}"),
            Self::Conflict { active, requested } => write!(
                f,
                "logging already initialized with `{active}`; refusing to switch to `{requested}`"
            ),
            Self::Backend(message) => write!(f, "failed to start logger: {message}"),
        }
    }
}

impl Error for LoggingError {}

/// Active logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingStatus {
    pub level: &'static str,
    pub log_dir: PathBuf,
}

/// Starts file logging under `log_dir` at `level`.
///
/// # Errors
/// - `level` is not one of trace|debug|info|warn|error.
/// - `log_dir` is blank, relative, or cannot be created.
/// - Logging already runs with another level or directory.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), LoggingError> {
    let level = normalize_level(level)?;
    let log_dir = normalize_log_dir(log_dir)?;

    let state = LOGGING_STATE.get_or_try_init(|| start_backend(level, &log_dir))?;
    ensure_same_config(state, level, &log_dir)
}

/// `None` until `init_logging` succeeds.
pub fn logging_status() -> Option<LoggingStatus> {
    LOGGING_STATE.get().map(|state| LoggingStatus {
        level: state.level,
        log_dir: state.log_dir.clone(),
    })
}

/// Writes buffered records to disk; a no-op before `init_logging`.
///
/// Short-lived processes call this before exiting.
pub fn flush_logs() {
    if let Some(state) = LOGGING_STATE.get() {
        state.logger.flush();
    }
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start_backend(level: &'static str, log_dir: &Path) -> Result<LoggingState, LoggingError> {
    std::fs::create_dir_all(log_dir).map_err(|err| {
        LoggingError::InvalidDirectory(format!("cannot create `{}`: {err}", log_dir.display()))
    })?;

    let logger = Logger::try_with_str(level)
        .map_err(|err| LoggingError::Backend(err.to_string()))?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| LoggingError::Backend(err.to_string()))?;

    install_panic_hook_once();

    info!(
        "event=core_init module=core status=ok level={level} platform={} version={}",
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION")
    );

    Ok(LoggingState {
        level,
        log_dir: log_dir.to_path_buf(),
        logger,
    })
}

fn ensure_same_config(
    state: &LoggingState,
    level: &'static str,
    log_dir: &Path,
) -> Result<(), LoggingError> {
    if state.log_dir != log_dir {
        return Err(LoggingError::Conflict {
            active: state.log_dir.display().to_string(),
            requested: log_dir.display().to_string(),
        });
    }
    if state.level != level {
        return Err(LoggingError::Conflict {
            active: state.level.to_string(),
            requested: level.to_string(),
        });
    }
    Ok(())
}

fn normalize_level(level: &str) -> Result<&'static str, LoggingError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(LoggingError::UnsupportedLevel(other.to_string())),
    }
}

fn normalize_log_dir(log_dir: &str) -> Result<PathBuf, LoggingError> {
    let trimmed = log_dir.trim();
    if trimmed.is_empty() {
        return Err(LoggingError::InvalidDirectory("path is empty".to_string()));
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(LoggingError::InvalidDirectory(format!(
            "`{trimmed}` is not absolute"
        )));
    }
    Ok(path.to_path_buf())
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.set(()).is_err() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = if let Some(message) = panic_info.payload().downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = panic_info.payload().downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        error!(
            "event=panic_captured module=core status=error location={location} payload={}",
            single_line(&payload, MAX_PANIC_PAYLOAD_CHARS)
        );
        previous_hook(panic_info);
    }));
}

/// Flattens newlines and caps length at `max_chars`.
fn single_line(value: &str, max_chars: usize) -> String {
    let flattened = value.replace(['\n', '\r'], " ");
    let mut capped = flattened.chars().take(max_chars).collect::<String>();
    if flattened.chars().count() > max_chars {
        capped.push_str("...");
    }
    capped
}
