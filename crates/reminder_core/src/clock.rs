//! Time primitives shared by the model, classifier and filters.
//!
//! # Responsibility
//! - Fix one timestamp representation (epoch milliseconds) for the core.
//! - Answer local-calendar questions (same day, Monday-start week) through
//!   `chrono`, with an explicit time zone so callers and tests stay
//!   deterministic.
//!
//! # Invariants
//! - Functions here are pure; "now" is always passed in by the caller.
//! - Out-of-range timestamps never panic; they degrade to `None`/`false`.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Unix epoch milliseconds.
pub type EpochMs = i64;

pub const MS_PER_SECOND: i64 = 1_000;
pub const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
pub const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
pub const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Reads the wall clock.
///
/// Only host-facing entry points call this; core operations take `now` as a
/// parameter.
pub fn now_epoch_ms() -> EpochMs {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX),
        Err(err) => -i64::try_from(err.duration().as_millis()).unwrap_or(i64::MAX),
    }
}

/// Converts epoch milliseconds to a zoned date-time.
pub fn to_zoned<Tz: TimeZone>(ms: EpochMs, tz: &Tz) -> Option<DateTime<Tz>> {
    DateTime::<Utc>::from_timestamp_millis(ms).map(|utc| utc.with_timezone(tz))
}

/// Calendar date of `ms` in the given zone.
pub fn local_date_in<Tz: TimeZone>(ms: EpochMs, tz: &Tz) -> Option<NaiveDate> {
    to_zoned(ms, tz).map(|value| value.date_naive())
}

/// Returns whether both instants fall on the same calendar day in `tz`.
pub fn is_same_day_in<Tz: TimeZone>(a: EpochMs, b: EpochMs, tz: &Tz) -> bool {
    match (local_date_in(a, tz), local_date_in(b, tz)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

/// Returns the `[monday, next_monday)` date window containing `now`.
pub fn week_window_in<Tz: TimeZone>(now: EpochMs, tz: &Tz) -> Option<(NaiveDate, NaiveDate)> {
    let today = local_date_in(now, tz)?;
    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    let next_monday = monday + Duration::days(7);
    Some((monday, next_monday))
}

/// Returns whether `ms` falls inside the Monday-start week containing `now`.
pub fn is_same_week_in<Tz: TimeZone>(ms: EpochMs, now: EpochMs, tz: &Tz) -> bool {
    let Some((start, end)) = week_window_in(now, tz) else {
        return false;
    };
    match local_date_in(ms, tz) {
        Some(date) => date >= start && date < end,
        None => false,
    }
}

/// Short month/day label such as `Jan 15`.
pub fn short_month_day_in<Tz: TimeZone>(ms: EpochMs, tz: &Tz) -> Option<String>
where
    Tz::Offset: std::fmt::Display,
{
    to_zoned(ms, tz).map(|value| value.format("%b %-d").to_string())
}

/// `is_same_day_in` using the process local zone.
pub fn is_same_day(a: EpochMs, b: EpochMs) -> bool {
    is_same_day_in(a, b, &Local)
}

/// `is_same_week_in` using the process local zone.
pub fn is_same_week(ms: EpochMs, now: EpochMs) -> bool {
    is_same_week_in(ms, now, &Local)
}

#[cfg(test)]
mod tests {
    use super::{
        is_same_day_in, is_same_week_in, short_month_day_in, week_window_in, MS_PER_DAY,
        MS_PER_HOUR,
    };
    use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};

    fn utc_ms(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0)
            .single()
            .expect("valid date")
            .timestamp_millis()
    }

    #[test]
    fn same_day_respects_zone_offset() {
        let late_evening = utc_ms(2026, 3, 4, 23, 30);
        let next_morning = late_evening + 2 * MS_PER_HOUR;
        assert!(!is_same_day_in(late_evening, next_morning, &Utc));

        let tokyo = FixedOffset::east_opt(9 * 3600).expect("valid offset");
        assert!(is_same_day_in(late_evening, next_morning, &tokyo));
    }

    #[test]
    fn week_window_starts_on_monday() {
        // 2026-03-04 is a Wednesday.
        let wednesday = utc_ms(2026, 3, 4, 12, 0);
        let (start, end) = week_window_in(wednesday, &Utc).expect("window");
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 3, 2).expect("date"));
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 3, 9).expect("date"));

        let sunday = utc_ms(2026, 3, 8, 23, 59);
        assert!(is_same_week_in(sunday, wednesday, &Utc));
        assert!(!is_same_week_in(sunday + MS_PER_DAY, wednesday, &Utc));
        assert!(!is_same_week_in(utc_ms(2026, 3, 1, 23, 59), wednesday, &Utc));
    }

    #[test]
    fn short_label_drops_day_padding() {
        assert_eq!(
            short_month_day_in(utc_ms(2026, 1, 5, 8, 0), &Utc).as_deref(),
            Some("Jan 5")
        );
        assert_eq!(
            short_month_day_in(utc_ms(2026, 1, 15, 8, 0), &Utc).as_deref(),
            Some("Jan 15")
        );
    }
}
