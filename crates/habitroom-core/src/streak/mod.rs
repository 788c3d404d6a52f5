//! Streak counters and the reactions to task outcomes.
//!
//! Completions extend the current streak and may unlock a milestone.
//! Failures reset it; the earliest task failed in a sweep decides whether the
//! break is logged as an achievement.

pub mod achievement;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::error::NotFoundError;
use crate::habit::Habit;
use crate::task::{Task, TaskStatus, TaskTransitionError};

pub use achievement::{milestone_title, Achievement, BREAK_THE_HABIT};

/// Run-length counters for one habit.
///
/// `longest_streak >= current_streak` holds after every mutating method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    pub habit_id: i64,
    pub num_of_completed_tasks: u32,
    pub num_of_failed_tasks: u32,
    pub longest_streak: u32,
    pub current_streak: u32,
}

impl Streak {
    pub fn new(habit_id: i64) -> Self {
        Streak {
            habit_id,
            ..Default::default()
        }
    }

    pub fn record_completion(&mut self) {
        self.current_streak += 1;
        self.num_of_completed_tasks += 1;
        self.clamp_longest();
    }

    pub fn record_failure(&mut self) {
        self.current_streak = 0;
        self.num_of_failed_tasks += 1;
        self.clamp_longest();
    }

    /// Raise `longest_streak` to `current_streak` if it fell behind.
    pub fn clamp_longest(&mut self) {
        self.longest_streak = self.longest_streak.max(self.current_streak);
    }
}

/// Completion of a single task and what it unlocked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionEffect {
    pub streak: Streak,
    pub milestone: Option<Achievement>,
}

/// Complete `task` at `now`, extend the streak and evaluate milestones.
///
/// # Errors
/// Returns the transition error untouched when the task is already terminal;
/// nothing is mutated in that case.
pub fn apply_completion(
    habit: &Habit,
    streak: &mut Streak,
    task: &mut Task,
    now: DateTime<Utc>,
) -> Result<CompletionEffect, TaskTransitionError> {
    task.complete(now)?;
    streak.record_completion();

    let milestone = milestone_title(habit.period, habit.frequency, streak.current_streak)
        .map(|title| Achievement::new(habit.id, title, streak.current_streak, now));
    if let Some(ref m) = milestone {
        info!(habit_id = habit.id, title = %m.title, streak = m.streak_length, "milestone reached");
    }

    Ok(CompletionEffect {
        streak: streak.clone(),
        milestone,
    })
}

/// Earliest (lowest `task_number`) failed task per habit, ordered by habit id.
pub fn first_failed_tasks(failed: &[Task]) -> Vec<&Task> {
    let mut firsts: BTreeMap<i64, &Task> = BTreeMap::new();
    for task in failed {
        firsts
            .entry(task.habit_id)
            .and_modify(|current| {
                if task.task_number < current.task_number {
                    *current = task;
                }
            })
            .or_insert(task);
    }
    firsts.into_values().collect()
}

/// "Break The Habit" record for a habit's first failed task, if the break is new.
///
/// No record when the preceding task had already failed (the streak was
/// broken earlier) or when there is no streak left to lose.
pub fn break_achievement(
    first_failed: &Task,
    previous_status: Option<TaskStatus>,
    streak: &Streak,
) -> Option<Achievement> {
    if previous_status == Some(TaskStatus::Failed) || streak.current_streak == 0 {
        return None;
    }
    Some(Achievement::new(
        first_failed.habit_id,
        BREAK_THE_HABIT,
        streak.current_streak,
        first_failed.due_date,
    ))
}

/// React to a sweep's failed tasks.
///
/// Break achievements are decided against the streak as it was before this
/// batch; then every failed task resets the streak and bumps the failure
/// counter. `previous_status` looks up the status of the task numbered one
/// below, within the same habit.
///
/// # Errors
/// Returns [`NotFoundError::Streak`] if a failed task's habit has no streak in
/// `streaks`; `streaks` is left untouched in that case.
pub fn apply_failures<F>(
    failed: &[Task],
    streaks: &mut BTreeMap<i64, Streak>,
    mut previous_status: F,
) -> Result<Vec<Achievement>, NotFoundError>
where
    F: FnMut(&Task) -> Option<TaskStatus>,
{
    if let Some(missing) = failed.iter().find(|t| !streaks.contains_key(&t.habit_id)) {
        return Err(NotFoundError::Streak(missing.habit_id));
    }

    let mut achievements = Vec::new();
    for first in first_failed_tasks(failed) {
        let prev = if first.task_number > 1 {
            previous_status(first)
        } else {
            None
        };
        if let Some(a) = break_achievement(first, prev, &streaks[&first.habit_id]) {
            info!(habit_id = a.habit_id, streak = a.streak_length, "streak broken");
            achievements.push(a);
        }
    }

    for task in failed {
        if let Some(streak) = streaks.get_mut(&task.habit_id) {
            streak.record_failure();
        }
    }
    Ok(achievements)
}
