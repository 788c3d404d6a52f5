//! Tracker: sequences storage and the engine components.
//!
//! Every public operation takes the `now` it should reason about. Reads that
//! are scoped to a user sweep that user's overdue tasks first, inside the same
//! transaction, so nothing returned here is stale with respect to `now`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::error::{NotFoundError, Result, ValidationError};
use crate::habit::{completion_date, normalize_name, Habit, HabitDraft, Period};
use crate::lifecycle::{sweep_tasks, SweepOutcome};
use crate::scoring::{in_ranking_window, rank_habits, RankedHabit, ScoreWeights};
use crate::stats::{streak_leaders, HabitProgress, Profile, StreakKind};
use crate::storage::{HabitDb, User};
use crate::streak::{apply_completion, apply_failures, first_failed_tasks, Achievement, Streak};
use crate::task::{generate_tasks, Task, TaskStatus};

/// Result of one sweep: what failed and which breaks were logged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    #[serde(flatten)]
    pub outcome: SweepOutcome,
    pub achievements: Vec<Achievement>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.outcome.is_empty()
    }
}

/// Result of a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionReport {
    /// `false` when the task was already terminal (possibly just swept)
    pub completed: bool,
    pub task: Task,
    pub streak: Streak,
    pub milestone: Option<Achievement>,
    pub sweep: SweepReport,
}

/// Everything known about one habit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitDetail {
    #[serde(flatten)]
    pub progress: HabitProgress,
    pub tasks: Vec<Task>,
    pub achievements: Vec<Achievement>,
}

/// Habit tracking façade over a [`HabitDb`].
pub struct Tracker {
    db: HabitDb,
}

impl Tracker {
    pub fn new(db: HabitDb) -> Self {
        Self { db }
    }

    /// Open the tracker on the default database file.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened.
    pub fn open() -> Result<Self> {
        Ok(Self::new(HabitDb::open()?))
    }

    /// Tracker over a fresh in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        Ok(Self::new(HabitDb::open_memory()?))
    }

    pub fn db(&self) -> &HabitDb {
        &self.db
    }

    // === Users ===

    /// Register a username.
    ///
    /// # Errors
    /// [`ValidationError::EmptyName`] for a blank name,
    /// [`ValidationError::DuplicateUser`] if it is taken.
    pub fn create_user(&self, username: &str, now: DateTime<Utc>) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        self.db.with_transaction(|db| {
            if db.find_user_by_name(username)?.is_some() {
                return Err(ValidationError::DuplicateUser(username.to_string()).into());
            }
            let user = db.insert_user(username, now)?;
            info!(user_id = user.id, username = %user.username, "user created");
            Ok(user)
        })
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        self.db.list_users()
    }

    // === Habit lifecycle ===

    /// Validate a draft, then store the habit, its zeroed streak and its full
    /// task schedule in one transaction.
    ///
    /// # Errors
    /// Validation errors leave no trace; an unknown user is not-found.
    pub fn create_habit(&self, user_id: i64, draft: &HabitDraft, now: DateTime<Utc>) -> Result<Habit> {
        draft.validate()?;
        self.db.with_transaction(|db| {
            require_user(db, user_id)?;
            let name = normalize_name(&draft.name);
            if db.habit_name_exists(user_id, &name, None)? {
                return Err(ValidationError::DuplicateName(name).into());
            }

            let mut habit = Habit::from_draft(user_id, draft, now)?;
            habit.id = db.insert_habit(&habit)?;
            db.insert_streak(&Streak::new(habit.id))?;
            for task in generate_tasks(&habit, 0) {
                db.insert_task(&task)?;
            }

            info!(
                habit_id = habit.id,
                user_id,
                period = %habit.period,
                num_of_tasks = habit.num_of_tasks,
                "habit created"
            );
            Ok(habit)
        })
    }

    /// Replace a habit's description and regenerate its open tasks.
    ///
    /// Completed and failed tasks are kept; every in-progress task is dropped
    /// and a new tail is numbered after the highest remaining task. The stored
    /// goal and task count then include the history already behind the habit.
    ///
    /// # Errors
    /// Validation errors, or not-found for an unknown habit.
    pub fn update_habit(&self, habit_id: i64, draft: &HabitDraft, now: DateTime<Utc>) -> Result<Habit> {
        draft.validate()?;
        self.db.with_transaction(|db| {
            let existing = require_habit(db, habit_id)?;
            let name = normalize_name(&draft.name);
            if db.habit_name_exists(existing.user_id, &name, Some(habit_id))? {
                return Err(ValidationError::DuplicateName(name).into());
            }

            sweep_user(db, existing.user_id, now)?;
            let streak = require_streak(db, habit_id)?;

            let removed = db.delete_in_progress_tasks(habit_id)?;
            let start_index = db.max_terminal_task_number(habit_id)?;

            let mut habit = Habit::from_draft(existing.user_id, draft, existing.creation_time)?;
            habit.id = habit_id;
            habit.completion_date = completion_date(now, draft.goal_days)?;

            // The tail runs from the draft's start; kept history predates it
            let tail = generate_tasks(&habit, start_index);
            for task in &tail {
                db.insert_task(task)?;
            }
            habit.start_date = existing.start_date.min(draft.start_date);

            let elapsed = (now - existing.creation_time).num_days().max(0);
            habit.goal_days = draft
                .goal_days
                .saturating_add(u32::try_from(elapsed).unwrap_or(u32::MAX));
            habit.num_of_tasks = (tail.len() as u32)
                .saturating_add(streak.num_of_completed_tasks)
                .saturating_add(streak.num_of_failed_tasks);
            db.update_habit(&habit)?;

            info!(
                habit_id,
                removed,
                added = tail.len(),
                start_index,
                "habit updated"
            );
            Ok(habit)
        })
    }

    /// Delete a habit with its tasks, streak and achievements.
    ///
    /// # Errors
    /// [`NotFoundError::Habit`] if it does not exist.
    pub fn delete_habit(&self, habit_id: i64) -> Result<()> {
        if !self.db.delete_habit(habit_id)? {
            return Err(NotFoundError::Habit(habit_id).into());
        }
        info!(habit_id, "habit deleted");
        Ok(())
    }

    // === Sweep and completion ===

    /// Fail every overdue in-progress task of `user_id` and react to the
    /// failures, all in one transaction.
    ///
    /// # Errors
    /// Not-found for an unknown user or a habit without a streak.
    pub fn sweep(&self, user_id: i64, now: DateTime<Utc>) -> Result<SweepReport> {
        self.db.with_transaction(|db| {
            require_user(db, user_id)?;
            sweep_user(db, user_id, now)
        })
    }

    /// Complete one task at `now`.
    ///
    /// The owner is swept first, so a task already past its due date ends up
    /// failed and the completion is a no-op (`completed == false`), as is
    /// completing a task that is already terminal.
    ///
    /// # Errors
    /// Not-found for an unknown task, or a task whose habit or streak is gone.
    pub fn complete_task(&self, task_id: i64, now: DateTime<Utc>) -> Result<CompletionReport> {
        self.db.with_transaction(|db| {
            let task = require_task(db, task_id)?;
            let habit = require_habit(db, task.habit_id)?;
            let sweep = sweep_user(db, habit.user_id, now)?;

            let mut task = require_task(db, task_id)?;
            let mut streak = require_streak(db, habit.id)?;

            let effect = match apply_completion(&habit, &mut streak, &mut task, now) {
                Ok(effect) => effect,
                Err(e) => {
                    debug!(task_id, status = %e.from, "completion ignored");
                    return Ok(CompletionReport {
                        completed: false,
                        task,
                        streak,
                        milestone: None,
                        sweep,
                    });
                }
            };

            if !db.finish_task(task.id, TaskStatus::Completed, now)? {
                let task = require_task(db, task_id)?;
                let streak = require_streak(db, habit.id)?;
                return Ok(CompletionReport {
                    completed: false,
                    task,
                    streak,
                    milestone: None,
                    sweep,
                });
            }
            db.save_streak(&effect.streak)?;

            let milestone = match effect.milestone {
                Some(mut m) => {
                    m.id = db.insert_achievement(&m)?;
                    Some(m)
                }
                None => None,
            };

            info!(
                task_id,
                habit_id = habit.id,
                current_streak = effect.streak.current_streak,
                "task completed"
            );
            Ok(CompletionReport {
                completed: true,
                task,
                streak: effect.streak,
                milestone,
                sweep,
            })
        })
    }

    // === Ranking ===

    /// Rank the `period` habits created within the last `window_days`.
    pub fn rank(
        &self,
        weights: &ScoreWeights,
        period: Period,
        now: DateTime<Utc>,
        window_days: u32,
    ) -> Result<Vec<RankedHabit>> {
        let since = now - Duration::days(i64::from(window_days));
        let mut candidates = Vec::new();
        for habit in self.db.habits_created_between(period, since, now)? {
            if !in_ranking_window(&habit, period, now, window_days) {
                continue;
            }
            let streak = self.db.get_streak(habit.id)?;
            candidates.push((habit, streak));
        }
        Ok(rank_habits(candidates, weights, now))
    }

    // === Queries ===

    /// In-progress tasks due within `[now, now + window]`.
    pub fn due_tasks(&self, user_id: i64, now: DateTime<Utc>, window: Duration) -> Result<Vec<Task>> {
        self.swept_read(user_id, now, |db| db.tasks_due_between(user_id, now, now + window))
    }

    /// In-progress tasks whose window contains `now + lead`.
    pub fn active_tasks(&self, user_id: i64, now: DateTime<Utc>, lead: Duration) -> Result<Vec<Task>> {
        self.swept_read(user_id, now, |db| db.tasks_open_at(user_id, now + lead))
    }

    /// First tasks of habits that start at or after `now + lead`.
    pub fn upcoming_tasks(&self, user_id: i64, now: DateTime<Utc>, lead: Duration) -> Result<Vec<Task>> {
        self.swept_read(user_id, now, |db| db.first_tasks_starting_from(user_id, now + lead))
    }

    /// Every habit of the user with its streak and progress.
    pub fn habits(&self, user_id: i64, now: DateTime<Utc>) -> Result<Vec<HabitProgress>> {
        self.swept_read(user_id, now, |db| habit_progress(db, db.list_habits(user_id)?))
    }

    /// Tracked habits (completion date not yet passed), optionally of one period.
    pub fn habits_by_period(
        &self,
        user_id: i64,
        period: Option<Period>,
        now: DateTime<Utc>,
    ) -> Result<Vec<HabitProgress>> {
        self.swept_read(user_id, now, |db| {
            let habits = db
                .list_habits(user_id)?
                .into_iter()
                .filter(|h| h.is_active(now) && period.map_or(true, |p| h.period == p))
                .collect();
            habit_progress(db, habits)
        })
    }

    /// Habits whose completion date has passed.
    pub fn completed_habits(&self, user_id: i64, now: DateTime<Utc>) -> Result<Vec<HabitProgress>> {
        self.swept_read(user_id, now, |db| {
            let habits = db
                .list_habits(user_id)?
                .into_iter()
                .filter(|h| !h.is_active(now))
                .collect();
            habit_progress(db, habits)
        })
    }

    /// Habits holding the highest current (or longest) streak across all users.
    pub fn streak_leaders(&self, kind: StreakKind) -> Result<Vec<HabitProgress>> {
        let entries = self
            .db
            .habits_with_streaks()?
            .into_iter()
            .map(|(habit, streak)| HabitProgress::new(habit, streak))
            .collect();
        Ok(streak_leaders(entries, kind))
    }

    /// Streak and completion percentage of one habit, after sweeping its owner.
    ///
    /// # Errors
    /// Not-found for an unknown habit or a missing streak.
    pub fn progress(&self, habit_id: i64, now: DateTime<Utc>) -> Result<HabitProgress> {
        self.db.with_transaction(|db| {
            let habit = require_habit(db, habit_id)?;
            sweep_user(db, habit.user_id, now)?;
            let streak = require_streak(db, habit_id)?;
            Ok(HabitProgress::new(habit, streak))
        })
    }

    /// Habit with tasks, streak and achievements, after sweeping its owner.
    pub fn habit_detail(&self, habit_id: i64, now: DateTime<Utc>) -> Result<HabitDetail> {
        self.db.with_transaction(|db| {
            let habit = require_habit(db, habit_id)?;
            sweep_user(db, habit.user_id, now)?;
            let streak = require_streak(db, habit_id)?;
            Ok(HabitDetail {
                progress: HabitProgress::new(habit, streak),
                tasks: db.list_tasks(habit_id)?,
                achievements: db.list_achievements(habit_id)?,
            })
        })
    }

    pub fn profile(&self, user_id: i64, now: DateTime<Utc>) -> Result<Profile> {
        self.swept_read(user_id, now, |db| {
            let user = require_user(db, user_id)?;
            Ok(Profile {
                user_id,
                username: user.username,
                active_habits: db.count_habits(user_id)?,
                tracked_tasks: db.count_tasks(user_id)?,
            })
        })
    }

    fn swept_read<T, F>(&self, user_id: i64, now: DateTime<Utc>, read: F) -> Result<T>
    where
        F: FnOnce(&HabitDb) -> Result<T>,
    {
        self.db.with_transaction(|db| {
            require_user(db, user_id)?;
            sweep_user(db, user_id, now)?;
            read(db)
        })
    }
}

fn require_user(db: &HabitDb, user_id: i64) -> Result<User> {
    db.get_user(user_id)?
        .ok_or_else(|| NotFoundError::User(user_id).into())
}

fn require_habit(db: &HabitDb, habit_id: i64) -> Result<Habit> {
    db.get_habit(habit_id)?
        .ok_or_else(|| NotFoundError::Habit(habit_id).into())
}

fn require_task(db: &HabitDb, task_id: i64) -> Result<Task> {
    db.get_task(task_id)?
        .ok_or_else(|| NotFoundError::Task(task_id).into())
}

fn require_streak(db: &HabitDb, habit_id: i64) -> Result<Streak> {
    db.get_streak(habit_id)?
        .ok_or_else(|| NotFoundError::Streak(habit_id).into())
}

fn habit_progress(db: &HabitDb, habits: Vec<Habit>) -> Result<Vec<HabitProgress>> {
    habits
        .into_iter()
        .map(|habit| {
            let streak = require_streak(db, habit.id)?;
            Ok(HabitProgress::new(habit, streak))
        })
        .collect()
}

/// Sweep and streak reaction for one user; the caller owns the transaction.
fn sweep_user(db: &HabitDb, user_id: i64, now: DateTime<Utc>) -> Result<SweepReport> {
    let mut overdue = db.overdue_tasks(user_id, now)?;
    if overdue.is_empty() {
        return Ok(SweepReport::default());
    }
    sweep_tasks(&mut overdue, now);

    let mut outcome = SweepOutcome::default();
    let mut failed = Vec::with_capacity(overdue.len());
    for task in overdue {
        if task.status != TaskStatus::Failed {
            continue;
        }
        if db.finish_task(task.id, TaskStatus::Failed, task.due_date)? {
            outcome.record(&task);
            failed.push(task);
        }
    }
    if failed.is_empty() {
        return Ok(SweepReport::default());
    }

    let mut streaks = BTreeMap::new();
    for &habit_id in &outcome.habit_ids {
        if !streaks.contains_key(&habit_id) {
            streaks.insert(habit_id, require_streak(db, habit_id)?);
        }
    }

    let mut previous = HashMap::new();
    for first in first_failed_tasks(&failed) {
        if first.task_number > 1 {
            if let Some(status) = db.task_status(first.habit_id, first.task_number - 1)? {
                previous.insert(first.habit_id, status);
            }
        }
    }

    let mut achievements = apply_failures(&failed, &mut streaks, |t| previous.get(&t.habit_id).copied())?;
    for streak in streaks.values() {
        db.save_streak(streak)?;
    }
    for achievement in &mut achievements {
        achievement.id = db.insert_achievement(achievement)?;
    }

    info!(
        user_id,
        failed = outcome.len(),
        breaks = achievements.len(),
        "swept overdue tasks"
    );
    Ok(SweepReport {
        outcome,
        achievements,
    })
}
