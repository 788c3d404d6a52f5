//! Task lifecycle sweep.
//!
//! There is no background scheduler: every read path calls the sweep with a
//! single sampled `now`, and any in-progress task whose due date has passed is
//! expired at exactly that due date.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::Task;

/// What a sweep changed.
///
/// `habit_ids` and `task_ids` are parallel: one entry per failed task, so a
/// habit that lost two tasks appears twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepOutcome {
    pub habit_ids: Vec<i64>,
    pub task_ids: Vec<i64>,
}

impl SweepOutcome {
    pub fn is_empty(&self) -> bool {
        self.task_ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.task_ids.len()
    }

    pub(crate) fn record(&mut self, task: &Task) {
        self.habit_ids.push(task.habit_id);
        self.task_ids.push(task.id);
    }
}

/// Expire every overdue in-progress task in `tasks`.
///
/// Tasks already terminal, or not yet due, are left alone, so running this
/// twice with the same `now` changes nothing the second time.
pub fn sweep_tasks(tasks: &mut [Task], now: DateTime<Utc>) -> SweepOutcome {
    let mut outcome = SweepOutcome::default();
    for task in tasks.iter_mut().filter(|t| t.is_overdue(now)) {
        if task.fail().is_ok() {
            outcome.record(task);
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskStatus;
    use chrono::{Duration, TimeZone};

    fn three_daily_tasks() -> (DateTime<Utc>, Vec<Task>) {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let tasks = (1..=3)
            .map(|n| {
                let mut t = Task::new(
                    5,
                    n,
                    start + Duration::days(i64::from(n) - 1),
                    start + Duration::days(i64::from(n)),
                );
                t.id = 100 + i64::from(n);
                t
            })
            .collect();
        (start, tasks)
    }

    #[test]
    fn fails_overdue_and_leaves_future_tasks() {
        let (start, mut tasks) = three_daily_tasks();
        let now = start + Duration::days(2) + Duration::minutes(1);

        let outcome = sweep_tasks(&mut tasks, now);

        assert_eq!(outcome.task_ids, vec![101, 102]);
        assert_eq!(outcome.habit_ids, vec![5, 5]);
        assert_eq!(tasks[0].status, TaskStatus::Failed);
        assert_eq!(tasks[0].completion_date, Some(tasks[0].due_date));
        assert_eq!(tasks[1].status, TaskStatus::Failed);
        assert_eq!(tasks[2].status, TaskStatus::InProgress);
    }

    #[test]
    fn second_sweep_at_same_instant_is_empty() {
        let (start, mut tasks) = three_daily_tasks();
        let now = start + Duration::days(2) + Duration::minutes(1);
        assert_eq!(sweep_tasks(&mut tasks, now).len(), 2);
        assert!(sweep_tasks(&mut tasks, now).is_empty());
    }

    #[test]
    fn due_exactly_now_is_not_overdue() {
        let (start, mut tasks) = three_daily_tasks();
        let outcome = sweep_tasks(&mut tasks, start + Duration::days(1));
        assert!(outcome.is_empty());
    }

    #[test]
    fn completed_tasks_are_never_failed() {
        let (start, mut tasks) = three_daily_tasks();
        tasks[0].complete(start + Duration::hours(2)).unwrap();
        let outcome = sweep_tasks(&mut tasks, start + Duration::days(10));
        assert_eq!(outcome.task_ids, vec![102, 103]);
        assert_eq!(tasks[0].status, TaskStatus::Completed);
    }
}
