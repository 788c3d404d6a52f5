//! Habit definitions: period model, goal arithmetic and validation.
//!
//! A habit is described by how often it should happen (`frequency`) within a
//! recurrence granularity (`period`) for how long (`goal_days`). Everything
//! else on a [`Habit`] is derived from those three numbers plus a start date.

pub mod goal;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

pub use goal::{parse_goal, GOAL_PRESETS};

/// Recurrence granularity of a habit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    Annual,
}

impl Period {
    pub const ALL: [Period; 4] = [Period::Daily, Period::Weekly, Period::Monthly, Period::Annual];

    /// Number of days one period spans.
    pub fn length_days(self) -> u32 {
        match self {
            Period::Daily => 1,
            Period::Weekly => 7,
            Period::Monthly => 30,
            Period::Annual => 365,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::Annual => "annual",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Period::Daily),
            "weekly" => Ok(Period::Weekly),
            "monthly" => Ok(Period::Monthly),
            "annual" => Ok(Period::Annual),
            _ => Err(ValidationError::InvalidPeriod(s.to_string())),
        }
    }
}

/// Longest goal a habit may have, in days.
pub const MAX_GOAL_DAYS: u32 = 36_500;

/// Most tasks a single habit may be split into.
pub const MAX_NUM_OF_TASKS: u32 = 100_000;

/// Number of tasks a goal decomposes into.
///
/// `floor(goal_days / period_length) * frequency`, or `None` on overflow.
pub fn num_of_tasks(goal_days: u32, period: Period, frequency: u32) -> Option<u32> {
    (goal_days / period.length_days()).checked_mul(frequency)
}

/// `start + goal_days`, or [`ValidationError::DateOutOfRange`] past chrono's range.
pub fn completion_date(
    start: DateTime<Utc>,
    goal_days: u32,
) -> Result<DateTime<Utc>, ValidationError> {
    start
        .checked_add_signed(Duration::days(i64::from(goal_days)))
        .ok_or(ValidationError::DateOutOfRange)
}

/// A goal is achievable only when it spans more than one full period.
pub fn is_goal_achievable(goal_days: u32, period: Period) -> bool {
    period.length_days() < goal_days
}

/// Lower-cased, trimmed habit name used for storage and uniqueness checks.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// User-supplied description of a habit, validated before anything is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitDraft {
    pub name: String,
    pub frequency: u32,
    pub period: Period,
    pub goal_days: u32,
    #[serde(default)]
    pub notes: String,
    pub start_date: DateTime<Utc>,
}

impl HabitDraft {
    /// Check positivity and achievability.
    ///
    /// # Errors
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if normalize_name(&self.name).is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.frequency == 0 {
            return Err(ValidationError::NotPositive {
                field: "frequency",
                value: 0,
            });
        }
        if self.goal_days == 0 {
            return Err(ValidationError::NotPositive {
                field: "goal",
                value: 0,
            });
        }
        if self.goal_days > MAX_GOAL_DAYS {
            return Err(ValidationError::TooLarge {
                field: "goal",
                max: MAX_GOAL_DAYS,
            });
        }
        if !is_goal_achievable(self.goal_days, self.period) {
            return Err(ValidationError::GoalNotAchievable {
                goal_days: self.goal_days,
                period: self.period.to_string(),
            });
        }
        self.num_of_tasks()?;
        self.completion_date()?;
        Ok(())
    }

    /// Task count of this draft, bounded by [`MAX_NUM_OF_TASKS`].
    ///
    /// # Errors
    /// [`ValidationError::TooLarge`] on overflow or above the bound.
    pub fn num_of_tasks(&self) -> Result<u32, ValidationError> {
        num_of_tasks(self.goal_days, self.period, self.frequency)
            .filter(|&n| n <= MAX_NUM_OF_TASKS)
            .ok_or(ValidationError::TooLarge {
                field: "num_of_tasks",
                max: MAX_NUM_OF_TASKS,
            })
    }

    /// # Errors
    /// [`ValidationError::DateOutOfRange`] when the goal runs past chrono's range.
    pub fn completion_date(&self) -> Result<DateTime<Utc>, ValidationError> {
        completion_date(self.start_date, self.goal_days)
    }
}

/// A tracked habit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Habit {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub frequency: u32,
    pub period: Period,
    pub goal_days: u32,
    pub num_of_tasks: u32,
    pub notes: String,
    pub creation_time: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    pub completion_date: DateTime<Utc>,
}

impl Habit {
    /// Build an unsaved habit (id 0) from a draft, deriving task count and
    /// completion date.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] if either derived value is out of range.
    pub fn from_draft(
        user_id: i64,
        draft: &HabitDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        Ok(Habit {
            id: 0,
            user_id,
            name: normalize_name(&draft.name),
            frequency: draft.frequency,
            period: draft.period,
            goal_days: draft.goal_days,
            num_of_tasks: draft.num_of_tasks()?,
            notes: draft.notes.clone(),
            creation_time: now,
            start_date: draft.start_date,
            completion_date: draft.completion_date()?,
        })
    }

    /// Still being tracked at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.completion_date >= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft(period: Period, frequency: u32, goal_days: u32) -> HabitDraft {
        HabitDraft {
            name: "  Read Books ".into(),
            frequency,
            period,
            goal_days,
            notes: String::new(),
            start_date: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn period_lengths() {
        assert_eq!(Period::Daily.length_days(), 1);
        assert_eq!(Period::Weekly.length_days(), 7);
        assert_eq!(Period::Monthly.length_days(), 30);
        assert_eq!(Period::Annual.length_days(), 365);
    }

    #[test]
    fn period_parses_case_insensitively() {
        assert_eq!("Weekly".parse::<Period>().unwrap(), Period::Weekly);
        assert_eq!(" annual ".parse::<Period>().unwrap(), Period::Annual);
        assert_eq!(
            "fortnightly".parse::<Period>(),
            Err(ValidationError::InvalidPeriod("fortnightly".into()))
        );
    }

    #[test]
    fn task_count_floors_partial_periods() {
        assert_eq!(num_of_tasks(3, Period::Daily, 1), Some(3));
        assert_eq!(num_of_tasks(30, Period::Weekly, 2), Some(8));
        assert_eq!(num_of_tasks(90, Period::Monthly, 3), Some(9));
        assert_eq!(num_of_tasks(365, Period::Annual, 1), Some(1));
        assert_eq!(num_of_tasks(365, Period::Daily, 20_000_000), None);
    }

    #[test]
    fn oversized_drafts_are_rejected_not_panicking() {
        let huge_frequency = draft(Period::Daily, 20_000_000, 365);
        assert_eq!(
            huge_frequency.validate(),
            Err(ValidationError::TooLarge {
                field: "num_of_tasks",
                max: MAX_NUM_OF_TASKS
            })
        );
        assert!(Habit::from_draft(1, &huge_frequency, huge_frequency.start_date).is_err());

        let huge_goal = draft(Period::Daily, 1, 4_000_000_000);
        assert_eq!(
            huge_goal.validate(),
            Err(ValidationError::TooLarge {
                field: "goal",
                max: MAX_GOAL_DAYS
            })
        );
        assert!(Habit::from_draft(1, &huge_goal, huge_goal.start_date).is_err());

        let mut far_future = draft(Period::Daily, 1, MAX_GOAL_DAYS);
        far_future.start_date = DateTime::<Utc>::MAX_UTC - Duration::days(1);
        assert_eq!(far_future.validate(), Err(ValidationError::DateOutOfRange));
    }

    #[test]
    fn bounds_are_inclusive() {
        assert!(draft(Period::Daily, 1, MAX_GOAL_DAYS).validate().is_ok());
        assert!(draft(Period::Daily, 1, MAX_GOAL_DAYS + 1).validate().is_err());
        let at_limit = draft(Period::Daily, MAX_NUM_OF_TASKS / 3, 3);
        assert_eq!(at_limit.num_of_tasks(), Ok(MAX_NUM_OF_TASKS / 3 * 3));
        assert!(draft(Period::Daily, MAX_NUM_OF_TASKS, 3).validate().is_err());
    }

    #[test]
    fn goal_must_exceed_one_period() {
        assert!(is_goal_achievable(3, Period::Daily));
        assert!(!is_goal_achievable(7, Period::Weekly));
        assert!(is_goal_achievable(30, Period::Weekly));
        assert!(!is_goal_achievable(30, Period::Monthly));
    }

    #[test]
    fn draft_validation() {
        assert!(draft(Period::Daily, 1, 3).validate().is_ok());
        assert_eq!(
            draft(Period::Daily, 0, 3).validate(),
            Err(ValidationError::NotPositive {
                field: "frequency",
                value: 0
            })
        );
        assert!(matches!(
            draft(Period::Monthly, 1, 30).validate(),
            Err(ValidationError::GoalNotAchievable { .. })
        ));
        let mut blank = draft(Period::Daily, 1, 3);
        blank.name = "   ".into();
        assert_eq!(blank.validate(), Err(ValidationError::EmptyName));
    }

    #[test]
    fn from_draft_derives_fields() {
        let d = draft(Period::Weekly, 2, 30);
        let now = Utc.with_ymd_and_hms(2024, 2, 28, 12, 0, 0).unwrap();
        let habit = Habit::from_draft(7, &d, now).unwrap();
        assert_eq!(habit.name, "read books");
        assert_eq!(habit.num_of_tasks, 8);
        assert_eq!(habit.creation_time, now);
        assert_eq!(habit.completion_date, d.start_date + Duration::days(30));
        assert!(habit.is_active(now));
    }
}
