//! Achievement log entries and milestone rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::habit::Period;

/// Title recorded when an established streak is broken.
pub const BREAK_THE_HABIT: &str = "Break The Habit";

/// Append-only achievement record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Achievement {
    pub id: i64,
    pub habit_id: i64,
    pub streak_length: u32,
    pub title: String,
    pub date: DateTime<Utc>,
}

impl Achievement {
    /// Create an unsaved achievement (id 0).
    pub fn new(
        habit_id: i64,
        title: impl Into<String>,
        streak_length: u32,
        date: DateTime<Utc>,
    ) -> Self {
        Achievement {
            id: 0,
            habit_id,
            streak_length,
            title: title.into(),
            date,
        }
    }
}

const DAILY: [(u32, &str); 3] = [
    (7, "7-Day Streak"),
    (14, "14-Day Streak"),
    (30, "30-Day Streak"),
];

const WEEKLY: [(u32, &str); 3] = [
    (1, "1-Week Streak"),
    (2, "2-Week's Streak"),
    (4, "4-Week's Streak"),
];

const MONTHLY: [(u32, &str); 3] = [
    (1, "1-Month Streak"),
    (2, "2-Month's Streak"),
    (4, "4-Month's Streak"),
];

/// Milestone title reached by `current_streak`, if any.
///
/// Daily and weekly milestones require the streak to be an exact multiple of
/// `frequency`; monthly ones compare the floored quotient. Must be evaluated
/// once per single completion or crossings are missed.
pub fn milestone_title(period: Period, frequency: u32, current_streak: u32) -> Option<&'static str> {
    if frequency == 0 || current_streak == 0 {
        return None;
    }
    let exact = (current_streak % frequency == 0).then_some(current_streak / frequency);
    let (table, ratio) = match period {
        Period::Daily => (&DAILY, exact?),
        Period::Weekly => (&WEEKLY, exact?),
        Period::Monthly => (&MONTHLY, current_streak / frequency),
        Period::Annual => return None,
    };
    table
        .iter()
        .find(|(threshold, _)| *threshold == ratio)
        .map(|(_, title)| *title)
}
