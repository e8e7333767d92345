//! Category filters over reminder collections.
//!
//! # Responsibility
//! - Partition a reminder collection into the named list categories.
//! - Scope a collection to one space (or to unassigned reminders).
//!
//! # Invariants
//! - Filters are evaluated fresh on every call; nothing is cached.
//! - `Pending` and `Overdue` compare against the snooze-aware effective
//!   trigger time, the same rule the classifier uses.
//! - `Recent` is ordered by `completed_at DESC, scheduled_time DESC, id ASC`.
//! - Space scoping and category filtering compose by intersection.

use crate::clock::{is_same_day_in, is_same_week_in, EpochMs};
use crate::model::reminder::Reminder;
use crate::model::space::SpaceId;
use chrono::{Local, TimeZone};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Default number of reminders kept by the `Recent` category.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Named list category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReminderFilter {
    Total,
    Pending,
    Completed,
    Overdue,
    Today,
    ThisWeek,
    Recent,
}

impl ReminderFilter {
    pub const ALL: [ReminderFilter; 7] = [
        Self::Total,
        Self::Pending,
        Self::Completed,
        Self::Overdue,
        Self::Today,
        Self::ThisWeek,
        Self::Recent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Total => "total",
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Overdue => "overdue",
            Self::Today => "today",
            Self::ThisWeek => "this_week",
            Self::Recent => "recent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "total" | "all" => Some(Self::Total),
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "overdue" => Some(Self::Overdue),
            "today" => Some(Self::Today),
            "this_week" | "week" => Some(Self::ThisWeek),
            "recent" => Some(Self::Recent),
            _ => None,
        }
    }
}

impl Display for ReminderFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Space pre-scope applied before category filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpaceScope {
    #[default]
    All,
    Unassigned,
    Space(SpaceId),
}

impl SpaceScope {
    pub fn contains(self, reminder: &Reminder) -> bool {
        match self {
            Self::All => true,
            Self::Unassigned => reminder.space_id.is_none(),
            Self::Space(id) => reminder.space_id == Some(id),
        }
    }
}

/// Per-category sizes for one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterCounts {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub overdue: usize,
    pub today: usize,
    pub this_week: usize,
    pub recent: usize,
}

impl FilterCounts {
    pub fn get(&self, filter: ReminderFilter) -> usize {
        match filter {
            ReminderFilter::Total => self.total,
            ReminderFilter::Pending => self.pending,
            ReminderFilter::Completed => self.completed,
            ReminderFilter::Overdue => self.overdue,
            ReminderFilter::Today => self.today,
            ReminderFilter::ThisWeek => self.this_week,
            ReminderFilter::Recent => self.recent,
        }
    }
}

pub fn is_pending_match(reminder: &Reminder, now: EpochMs) -> bool {
    !reminder.is_completed() && reminder.effective_time() > now
}

pub fn is_completed_match(reminder: &Reminder) -> bool {
    reminder.is_completed()
}

pub fn is_overdue_match(reminder: &Reminder, now: EpochMs) -> bool {
    reminder.is_overdue(now)
}

pub fn is_today_match_in<Tz: TimeZone>(reminder: &Reminder, now: EpochMs, tz: &Tz) -> bool {
    is_same_day_in(reminder.scheduled_time, now, tz)
}

pub fn is_this_week_match_in<Tz: TimeZone>(reminder: &Reminder, now: EpochMs, tz: &Tz) -> bool {
    is_same_week_in(reminder.scheduled_time, now, tz)
}

/// Completed reminders, most recently completed first, capped at `limit`.
pub fn recent_completed<'a>(reminders: &'a [Reminder], limit: usize) -> Vec<&'a Reminder> {
    let mut completed = reminders
        .iter()
        .filter(|reminder| reminder.is_completed())
        .collect::<Vec<_>>();
    completed.sort_by(|left, right| {
        right
            .completed_at
            .cmp(&left.completed_at)
            .then_with(|| right.scheduled_time.cmp(&left.scheduled_time))
            .then_with(|| left.id.cmp(&right.id))
    });
    completed.truncate(limit);
    completed
}

/// Applies `filter` to `reminders` using calendar rules in `tz`.
///
/// Source order is preserved for every category except `Recent`.
pub fn apply_filter_in<'a, Tz: TimeZone>(
    reminders: &'a [Reminder],
    filter: ReminderFilter,
    now: EpochMs,
    recent_limit: usize,
    tz: &Tz,
) -> Vec<&'a Reminder> {
    match filter {
        ReminderFilter::Recent => recent_completed(reminders, recent_limit),
        other => reminders
            .iter()
            .filter(|reminder| matches_in(reminder, other, now, tz))
            .collect(),
    }
}

/// `apply_filter_in` using the local zone and the default `Recent` limit.
pub fn apply_filter(
    reminders: &[Reminder],
    filter: ReminderFilter,
    now: EpochMs,
) -> Vec<&Reminder> {
    apply_filter_in(reminders, filter, now, DEFAULT_RECENT_LIMIT, &Local)
}

/// Membership test for every category except `Recent`, which depends on the
/// whole collection and always answers by completion state here.
pub fn matches_in<Tz: TimeZone>(
    reminder: &Reminder,
    filter: ReminderFilter,
    now: EpochMs,
    tz: &Tz,
) -> bool {
    match filter {
        ReminderFilter::Total => true,
        ReminderFilter::Pending => is_pending_match(reminder, now),
        ReminderFilter::Completed | ReminderFilter::Recent => is_completed_match(reminder),
        ReminderFilter::Overdue => is_overdue_match(reminder, now),
        ReminderFilter::Today => is_today_match_in(reminder, now, tz),
        ReminderFilter::ThisWeek => is_this_week_match_in(reminder, now, tz),
    }
}

/// Reminders inside `scope`, source order preserved.
pub fn scope_reminders(reminders: &[Reminder], scope: SpaceScope) -> Vec<Reminder> {
    reminders
        .iter()
        .filter(|reminder| scope.contains(reminder))
        .cloned()
        .collect()
}

pub fn count_filters_in<Tz: TimeZone>(
    reminders: &[Reminder],
    now: EpochMs,
    recent_limit: usize,
    tz: &Tz,
) -> FilterCounts {
    let mut counts = FilterCounts {
        total: reminders.len(),
        ..FilterCounts::default()
    };
    for reminder in reminders {
        if is_pending_match(reminder, now) {
            counts.pending += 1;
        }
        if is_completed_match(reminder) {
            counts.completed += 1;
        }
        if is_overdue_match(reminder, now) {
            counts.overdue += 1;
        }
        if is_today_match_in(reminder, now, tz) {
            counts.today += 1;
        }
        if is_this_week_match_in(reminder, now, tz) {
            counts.this_week += 1;
        }
    }
    counts.recent = counts.completed.min(recent_limit);
    counts
}

pub fn count_filters(reminders: &[Reminder], now: EpochMs) -> FilterCounts {
    count_filters_in(reminders, now, DEFAULT_RECENT_LIMIT, &Local)
}

/// Reminder counts keyed by space; `None` collects unassigned reminders.
pub fn count_by_space(reminders: &[Reminder]) -> BTreeMap<Option<SpaceId>, usize> {
    let mut counts = BTreeMap::new();
    for reminder in reminders {
        *counts.entry(reminder.space_id).or_insert(0) += 1;
    }
    counts
}
