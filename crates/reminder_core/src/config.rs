//! Runtime tunables for the reminder core.
//!
//! Values come from defaults, optionally overridden by environment variables
//! the host sets before the first call. Invalid overrides are ignored with a
//! warning so a typo never blocks startup.

use crate::filter::DEFAULT_RECENT_LIMIT;
use log::warn;
use std::str::FromStr;
use std::time::Duration;

pub const UNDO_WINDOW_ENV: &str = "REMINDERS_UNDO_WINDOW_MS";
pub const RECENT_LIMIT_ENV: &str = "REMINDERS_RECENT_LIMIT";
pub const TICK_INTERVAL_ENV: &str = "REMINDERS_TICK_INTERVAL_MS";

const DEFAULT_UNDO_WINDOW_MS: i64 = 4_000;
const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreConfig {
    /// How long a single-delete undo token stays valid.
    pub undo_window_ms: i64,
    /// Maximum size of the `Recent` category.
    pub recent_limit: usize,
    /// Countdown recompute period.
    pub tick_interval_ms: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            undo_window_ms: DEFAULT_UNDO_WINDOW_MS,
            recent_limit: DEFAULT_RECENT_LIMIT,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl CoreConfig {
    /// Defaults overridden by process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`; split out so tests avoid touching the
    /// real environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            undo_window_ms: positive_override(&lookup, UNDO_WINDOW_ENV)
                .unwrap_or(defaults.undo_window_ms),
            recent_limit: positive_override(&lookup, RECENT_LIMIT_ENV)
                .unwrap_or(defaults.recent_limit),
            tick_interval_ms: positive_override(&lookup, TICK_INTERVAL_ENV)
                .unwrap_or(defaults.tick_interval_ms),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

fn positive_override<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr + PartialOrd + Default,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Some(value),
        _ => {
            warn!("event=config_override module=config status=skipped key={key} reason=invalid_value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, RECENT_LIMIT_ENV, TICK_INTERVAL_ENV, UNDO_WINDOW_ENV};

    #[test]
    fn defaults_apply_without_overrides() {
        let config = CoreConfig::from_lookup(|_| None);
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.undo_window_ms, 4_000);
        assert_eq!(config.recent_limit, 10);
        assert_eq!(config.tick_interval().as_millis(), 1_000);
    }

    #[test]
    fn valid_overrides_win_and_invalid_ones_fall_back() {
        let config = CoreConfig::from_lookup(|key| match key {
            UNDO_WINDOW_ENV => Some(" 8000 ".to_string()),
            RECENT_LIMIT_ENV => Some("0".to_string()),
            TICK_INTERVAL_ENV => Some("fast".to_string()),
            _ => None,
        });
        assert_eq!(config.undo_window_ms, 8_000);
        assert_eq!(config.recent_limit, 10);
        assert_eq!(config.tick_interval_ms, 1_000);
    }
}
