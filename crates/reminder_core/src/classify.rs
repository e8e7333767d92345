//! Derived display state for one reminder at one instant.
//!
//! # Responsibility
//! - Classify a reminder as pending, overdue or completed.
//! - Compute the countdown progress ratio and the time-remaining label.
//!
//! # Invariants
//! - Every function is a pure function of `(reminder, now)` (plus the zone
//!   used for calendar labels), so a view can re-run them on every tick.
//! - `progress` always lies in `[0, 1]`.

use crate::clock::{
    short_month_day_in, EpochMs, MS_PER_DAY, MS_PER_HOUR, MS_PER_MINUTE, MS_PER_SECOND,
};
use crate::model::reminder::Reminder;
use chrono::{Local, TimeZone};
use serde::Serialize;

/// Classification of a reminder at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderState {
    Pending,
    Overdue,
    Completed,
}

impl ReminderState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Overdue => "overdue",
            Self::Completed => "completed",
        }
    }
}

/// Values a list row re-renders on every tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReminderDisplay {
    pub state: ReminderState,
    pub remaining_text: String,
    pub progress: f64,
}

pub fn classify(reminder: &Reminder, now: EpochMs) -> ReminderState {
    if reminder.is_completed() {
        ReminderState::Completed
    } else if reminder.is_overdue(now) {
        ReminderState::Overdue
    } else {
        ReminderState::Pending
    }
}

/// Fraction of the `created_at..scheduled_time` window that has elapsed.
///
/// Completed reminders report `1.0`. Empty or reversed windows report `0.0`.
pub fn progress(reminder: &Reminder, now: EpochMs) -> f64 {
    if reminder.is_completed() {
        return 1.0;
    }
    let total = reminder.scheduled_time.saturating_sub(reminder.created_at);
    if total <= 0 {
        return 0.0;
    }
    let elapsed = now.saturating_sub(reminder.created_at);
    (elapsed as f64 / total as f64).clamp(0.0, 1.0)
}

/// Tiered countdown label for `effective_time` seen from `now`.
///
/// Far-future labels (7 days or more) render as a short date in `tz`.
pub fn format_remaining_in<Tz: TimeZone>(
    effective_time: EpochMs,
    now: EpochMs,
    tz: &Tz,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let delta = effective_time.saturating_sub(now);

    if delta < 0 {
        let overdue = delta.saturating_neg();
        let days = overdue / MS_PER_DAY;
        if days >= 1 {
            return format!("Overdue {days}d");
        }
        let hours = overdue / MS_PER_HOUR;
        if hours >= 1 {
            return format!("Overdue {hours}h");
        }
        return format!("Overdue {}m", overdue / MS_PER_MINUTE);
    }

    let days = delta / MS_PER_DAY;
    if days >= 7 {
        if let Some(label) = short_month_day_in(effective_time, tz) {
            return label;
        }
        return format!("{days} days");
    }
    if days >= 1 {
        return if days == 1 {
            "1 day".to_string()
        } else {
            format!("{days} days")
        };
    }

    let hours = delta / MS_PER_HOUR;
    let minutes = (delta % MS_PER_HOUR) / MS_PER_MINUTE;
    if hours >= 1 {
        return if minutes > 0 {
            format!("{hours}h {minutes}m")
        } else {
            format!("{hours}h")
        };
    }

    if minutes >= 10 {
        return format!("{minutes} min");
    }

    let seconds = (delta % MS_PER_MINUTE) / MS_PER_SECOND;
    if minutes == 0 {
        format!("{seconds}s")
    } else {
        format!("{minutes} min {seconds}s")
    }
}

/// `format_remaining_in` using the process local zone.
pub fn format_remaining(effective_time: EpochMs, now: EpochMs) -> String {
    format_remaining_in(effective_time, now, &Local)
}

pub fn derive_display_in<Tz: TimeZone>(
    reminder: &Reminder,
    now: EpochMs,
    tz: &Tz,
) -> ReminderDisplay
where
    Tz::Offset: std::fmt::Display,
{
    ReminderDisplay {
        state: classify(reminder, now),
        remaining_text: format_remaining_in(reminder.effective_time(), now, tz),
        progress: progress(reminder, now),
    }
}

pub fn derive_display(reminder: &Reminder, now: EpochMs) -> ReminderDisplay {
    derive_display_in(reminder, now, &Local)
}

#[cfg(test)]
mod tests {
    use super::{classify, format_remaining_in, progress, ReminderState};
    use crate::clock::{MS_PER_DAY, MS_PER_HOUR, MS_PER_MINUTE, MS_PER_SECOND};
    use crate::model::reminder::Reminder;
    use chrono::{TimeZone, Utc};

    const NOW: i64 = 1_700_000_000_000;

    fn label(offset_ms: i64) -> String {
        format_remaining_in(NOW + offset_ms, NOW, &Utc)
    }

    #[test]
    fn progress_is_half_way_through_window() {
        let reminder = Reminder::new("halfway", NOW + 2 * MS_PER_HOUR, NOW - 2 * MS_PER_HOUR);
        let value = progress(&reminder, NOW);
        assert!((value - 0.5).abs() < 1e-9, "unexpected progress {value}");
    }

    #[test]
    fn progress_guards_empty_and_reversed_windows() {
        let zero_width = Reminder::new("zero", NOW, NOW);
        for now in [NOW - MS_PER_DAY, NOW, NOW + MS_PER_DAY] {
            assert_eq!(progress(&zero_width, now), 0.0);
        }

        let reversed = Reminder::new("reversed", NOW - MS_PER_HOUR, NOW);
        assert_eq!(progress(&reversed, NOW + MS_PER_HOUR), 0.0);
    }

    #[test]
    fn progress_clamps_and_completed_is_full() {
        let reminder = Reminder::new("late", NOW - MS_PER_HOUR, NOW - 2 * MS_PER_HOUR);
        assert_eq!(progress(&reminder, NOW), 1.0);
        assert_eq!(progress(&reminder, NOW - 3 * MS_PER_HOUR), 0.0);

        let completed = Reminder::new("done", NOW + MS_PER_DAY, NOW).completed(NOW);
        assert_eq!(progress(&completed, NOW), 1.0);
    }

    #[test]
    fn overdue_labels_use_largest_unit() {
        assert_eq!(label(-90 * MS_PER_MINUTE), "Overdue 1h");
        assert_eq!(label(-3 * MS_PER_DAY - MS_PER_HOUR), "Overdue 3d");
        assert_eq!(label(-5 * MS_PER_MINUTE), "Overdue 5m");
        assert_eq!(label(-30 * MS_PER_SECOND), "Overdue 0m");
    }

    #[test]
    fn future_labels_follow_tiers() {
        assert_eq!(label(45 * MS_PER_SECOND), "45s");
        assert_eq!(label(3 * MS_PER_MINUTE + 7 * MS_PER_SECOND), "3 min 7s");
        assert_eq!(label(25 * MS_PER_MINUTE), "25 min");
        assert_eq!(label(2 * MS_PER_HOUR), "2h");
        assert_eq!(label(2 * MS_PER_HOUR + 15 * MS_PER_MINUTE), "2h 15m");
        assert_eq!(label(MS_PER_DAY + MS_PER_HOUR), "1 day");
        assert_eq!(label(3 * MS_PER_DAY), "3 days");
        assert_eq!(label(0), "0s");
    }

    #[test]
    fn far_future_label_is_short_date() {
        let now = Utc
            .with_ymd_and_hms(2026, 1, 1, 9, 0, 0)
            .single()
            .expect("valid date")
            .timestamp_millis();
        let target = now + 14 * MS_PER_DAY;
        assert_eq!(format_remaining_in(target, now, &Utc), "Jan 15");
    }

    #[test]
    fn classify_partitions_states() {
        let pending = Reminder::new("p", NOW + MS_PER_MINUTE, NOW - MS_PER_MINUTE);
        let overdue = Reminder::new("o", NOW - MS_PER_MINUTE, NOW - MS_PER_HOUR);
        let completed = overdue.completed(NOW);
        assert_eq!(classify(&pending, NOW), ReminderState::Pending);
        assert_eq!(classify(&overdue, NOW), ReminderState::Overdue);
        assert_eq!(classify(&completed, NOW), ReminderState::Completed);
    }
}
