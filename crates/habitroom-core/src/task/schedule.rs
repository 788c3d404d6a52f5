//! Task schedule generator.
//!
//! Spreads `num_of_tasks` evenly over `goal_days`, starting at the habit's
//! start date. Task `n` starts where task `n-1` is due.

use chrono::Duration;
use tracing::debug;

use super::Task;
use crate::habit::Habit;

const MICROS_PER_DAY: i64 = 86_400_000_000;

/// Spacing between consecutive due dates: `goal_days / num_of_tasks` days.
///
/// Computed in whole microseconds so every delta is identical once stored.
/// Returns `None` when the habit has no tasks or the goal overflows.
pub fn step_duration(goal_days: u32, num_of_tasks: u32) -> Option<Duration> {
    if num_of_tasks == 0 {
        return None;
    }
    let micros = i64::from(goal_days).checked_mul(MICROS_PER_DAY)? / i64::from(num_of_tasks);
    Some(Duration::microseconds(micros))
}

/// Build the task rows for `habit`, numbered from `start_index + 1`.
///
/// A habit with `num_of_tasks == 0` yields nothing. Tasks are unsaved (id 0)
/// and in progress. Streak state is not touched.
pub fn generate_tasks(habit: &Habit, start_index: u32) -> Vec<Task> {
    let Some(step) = step_duration(habit.goal_days, habit.num_of_tasks) else {
        return Vec::new();
    };

    let mut tasks = Vec::with_capacity(habit.num_of_tasks as usize);
    let mut start = habit.start_date;
    for offset in 1..=habit.num_of_tasks {
        let due = habit.start_date + step * offset as i32;
        tasks.push(Task::new(habit.id, start_index + offset, start, due));
        start = due;
    }

    debug!(
        habit_id = habit.id,
        count = tasks.len(),
        first_number = start_index + 1,
        "generated task schedule"
    );
    tasks
}
