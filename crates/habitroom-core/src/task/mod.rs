//! Task types: one dated obligation derived from a habit's schedule.
//!
//! Status transitions are one-way:
//!
//! ```text
//!   IN_PROGRESS ───── complete ────> COMPLETED
//!        |
//!        +────────── expire ──────> FAILED
//! ```
//!
//! Both terminal states reject any further transition, which is what makes
//! repeated sweeps and double completions harmless.

pub mod schedule;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use schedule::{generate_tasks, step_duration};

/// Task status enumeration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, not yet completed or expired (initial state)
    #[default]
    InProgress,
    /// Completed by the user (terminal)
    Completed,
    /// Expired at its due date (terminal)
    Failed,
}

impl TaskStatus {
    /// Check if a transition is valid.
    pub fn can_transition_to(&self, to: &TaskStatus) -> bool {
        match self {
            TaskStatus::InProgress => matches!(to, TaskStatus::Completed | TaskStatus::Failed),
            TaskStatus::Completed | TaskStatus::Failed => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::InProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

/// One scheduled obligation of a habit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: i64,
    pub habit_id: i64,
    /// 1-based, unique per habit, increasing with time
    pub task_number: u32,
    pub start_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub status: TaskStatus,
    /// Set only when the task leaves `InProgress`
    pub completion_date: Option<DateTime<Utc>>,
}

impl Task {
    /// Create an unsaved, in-progress task (id 0).
    pub fn new(
        habit_id: i64,
        task_number: u32,
        start_date: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> Self {
        Task {
            id: 0,
            habit_id,
            task_number,
            start_date,
            due_date,
            status: TaskStatus::InProgress,
            completion_date: None,
        }
    }

    /// Still open and past its due date.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::InProgress && self.due_date < now
    }

    /// `at` falls inside `[start_date, due_date)`.
    pub fn window_contains(&self, at: DateTime<Utc>) -> bool {
        self.start_date <= at && at < self.due_date
    }

    /// Transition to a terminal status, stamping the completion date.
    ///
    /// Returns an error if the task has already left `InProgress`.
    pub fn transition_to(
        &mut self,
        new_status: TaskStatus,
        at: DateTime<Utc>,
    ) -> Result<(), TaskTransitionError> {
        if !self.status.can_transition_to(&new_status) {
            return Err(TaskTransitionError {
                from: self.status,
                to: new_status,
            });
        }
        self.status = new_status;
        self.completion_date = Some(at);
        Ok(())
    }

    /// Expire the task at its own due date.
    pub fn fail(&mut self) -> Result<(), TaskTransitionError> {
        let due = self.due_date;
        self.transition_to(TaskStatus::Failed, due)
    }

    /// Mark the task completed at `now`.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), TaskTransitionError> {
        self.transition_to(TaskStatus::Completed, now)
    }
}

/// Error returned when an invalid status transition is attempted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskTransitionError {
    pub from: TaskStatus,
    pub to: TaskStatus,
}

impl fmt::Display for TaskTransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid status transition: {} → {}", self.from, self.to)
    }
}

impl std::error::Error for TaskTransitionError {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn task() -> Task {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        Task::new(1, 1, start, start + Duration::days(1))
    }

    #[test]
    fn status_default_is_in_progress() {
        assert_eq!(TaskStatus::default(), TaskStatus::InProgress);
    }

    #[test]
    fn status_transitions() {
        assert!(TaskStatus::InProgress.can_transition_to(&TaskStatus::Completed));
        assert!(TaskStatus::InProgress.can_transition_to(&TaskStatus::Failed));
        assert!(!TaskStatus::InProgress.can_transition_to(&TaskStatus::InProgress));
        assert!(!TaskStatus::Completed.can_transition_to(&TaskStatus::Failed));
        assert!(!TaskStatus::Failed.can_transition_to(&TaskStatus::Completed));
    }

    #[test]
    fn status_string_roundtrip() {
        for status in [TaskStatus::InProgress, TaskStatus::Completed, TaskStatus::Failed] {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
        assert!("done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn fail_stamps_due_date() {
        let mut t = task();
        t.fail().unwrap();
        assert_eq!(t.status, TaskStatus::Failed);
        assert_eq!(t.completion_date, Some(t.due_date));
    }

    #[test]
    fn complete_stamps_now() {
        let mut t = task();
        let now = t.start_date + Duration::hours(3);
        t.complete(now).unwrap();
        assert_eq!(t.status, TaskStatus::Completed);
        assert_eq!(t.completion_date, Some(now));
    }

    #[test]
    fn terminal_tasks_reject_transitions() {
        let mut t = task();
        t.fail().unwrap();
        let err = t.complete(t.due_date).unwrap_err();
        assert_eq!(err.from, TaskStatus::Failed);
        assert_eq!(t.status, TaskStatus::Failed);
    }

    #[test]
    fn overdue_only_while_in_progress() {
        let mut t = task();
        let later = t.due_date + Duration::seconds(1);
        assert!(t.is_overdue(later));
        assert!(!t.is_overdue(t.due_date));
        t.fail().unwrap();
        assert!(!t.is_overdue(later));
    }

    #[test]
    fn window_is_half_open() {
        let t = task();
        assert!(t.window_contains(t.start_date));
        assert!(!t.window_contains(t.due_date));
    }
}
