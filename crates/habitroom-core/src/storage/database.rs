//! SQLite-based habit storage.
//!
//! Provides persistent storage for:
//! - Users and their habits
//! - Generated tasks and their status transitions
//! - Per-habit streak counters
//! - The append-only achievement log
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings with microsecond
//! precision, so comparing the text columns compares the instants.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{data_dir, migrations};
use crate::error::{CoreError, DatabaseError, Result};
use crate::habit::{Habit, Period};
use crate::streak::{Achievement, Streak};
use crate::task::{Task, TaskStatus};

const HABIT_COLUMNS: &str = "h.id, h.user_id, h.name, h.frequency, h.period, h.goal_days, \
     h.num_of_tasks, h.notes, h.creation_time, h.start_date, h.completion_date";

const TASK_COLUMNS: &str =
    "t.id, t.habit_id, t.task_number, t.start_date, t.due_date, t.status, t.completion_date";

const STREAK_COLUMNS: &str = "s.habit_id, s.num_of_completed_tasks, s.num_of_failed_tasks, \
     s.longest_streak, s.current_streak";

/// Habit owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

// === Helper Functions ===

/// Format a timestamp for storage.
pub(crate) fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn corrupt(idx: usize, column: &str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        Box::new(DatabaseError::CorruptValue {
            column: column.to_string(),
            value: value.to_string(),
        }),
    )
}

fn get_datetime(row: &Row, idx: usize, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| corrupt(idx, column, &raw))
}

fn get_optional_datetime(
    row: &Row,
    idx: usize,
    column: &str,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| corrupt(idx, column, &s))
    })
    .transpose()
}

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        created_at: get_datetime(row, 2, "created_at")?,
    })
}

fn row_to_habit(row: &Row) -> rusqlite::Result<Habit> {
    let period_str: String = row.get(4)?;
    let period: Period = period_str
        .parse()
        .map_err(|_| corrupt(4, "period", &period_str))?;
    Ok(Habit {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        frequency: row.get(3)?,
        period,
        goal_days: row.get(5)?,
        num_of_tasks: row.get(6)?,
        notes: row.get(7)?,
        creation_time: get_datetime(row, 8, "creation_time")?,
        start_date: get_datetime(row, 9, "start_date")?,
        completion_date: get_datetime(row, 10, "completion_date")?,
    })
}

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    let status_str: String = row.get(5)?;
    let status: TaskStatus = status_str
        .parse()
        .map_err(|_| corrupt(5, "status", &status_str))?;
    Ok(Task {
        id: row.get(0)?,
        habit_id: row.get(1)?,
        task_number: row.get(2)?,
        start_date: get_datetime(row, 3, "start_date")?,
        due_date: get_datetime(row, 4, "due_date")?,
        status,
        completion_date: get_optional_datetime(row, 6, "completion_date")?,
    })
}

/// Streak columns starting at `offset`.
fn row_to_streak(row: &Row, offset: usize) -> rusqlite::Result<Streak> {
    Ok(Streak {
        habit_id: row.get(offset)?,
        num_of_completed_tasks: row.get(offset + 1)?,
        num_of_failed_tasks: row.get(offset + 2)?,
        longest_streak: row.get(offset + 3)?,
        current_streak: row.get(offset + 4)?,
    })
}

fn row_to_achievement(row: &Row) -> rusqlite::Result<Achievement> {
    Ok(Achievement {
        id: row.get(0)?,
        habit_id: row.get(1)?,
        streak_length: row.get(2)?,
        title: row.get(3)?,
        date: get_datetime(row, 4, "date")?,
    })
}

/// SQLite database for habits, tasks, streaks and achievements.
///
/// Methods never open their own transaction; callers group writes with
/// [`HabitDb::with_transaction`].
pub struct HabitDb {
    conn: Connection,
}

impl HabitDb {
    /// Open the database at `<data_dir>/habitroom.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("habitroom.db");
        Self::open_at(&path)
    }

    /// Open (or create) the database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::init(conn)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Run `f` inside one transaction, committing only if it succeeds.
    ///
    /// # Errors
    /// Returns the closure's error (after rolling back) or a commit failure.
    pub fn with_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    // === Users ===

    pub fn insert_user(&self, username: &str, now: DateTime<Utc>) -> Result<User> {
        self.conn.execute(
            "INSERT INTO users (username, created_at) VALUES (?1, ?2)",
            params![username, format_datetime(now)],
        )?;
        Ok(User {
            id: self.conn.last_insert_rowid(),
            username: username.to_string(),
            created_at: now,
        })
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, username, created_at FROM users WHERE id = ?1",
                params![id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn find_user_by_name(&self, username: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, username, created_at FROM users WHERE username = ?1",
                params![username],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, username, created_at FROM users ORDER BY id")?;
        let users = stmt
            .query_map([], row_to_user)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    // === Habits ===

    /// Insert a habit row and return its id.
    pub fn insert_habit(&self, habit: &Habit) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO habits (user_id, name, frequency, period, goal_days, num_of_tasks,
                                 notes, creation_time, start_date, completion_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                habit.user_id,
                habit.name,
                habit.frequency,
                habit.period.as_str(),
                habit.goal_days,
                habit.num_of_tasks,
                habit.notes,
                format_datetime(habit.creation_time),
                format_datetime(habit.start_date),
                format_datetime(habit.completion_date),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Overwrite every mutable column; `creation_time` and owner never change.
    pub fn update_habit(&self, habit: &Habit) -> Result<()> {
        self.conn.execute(
            "UPDATE habits
             SET name = ?1, frequency = ?2, period = ?3, goal_days = ?4, num_of_tasks = ?5,
                 notes = ?6, start_date = ?7, completion_date = ?8
             WHERE id = ?9",
            params![
                habit.name,
                habit.frequency,
                habit.period.as_str(),
                habit.goal_days,
                habit.num_of_tasks,
                habit.notes,
                format_datetime(habit.start_date),
                format_datetime(habit.completion_date),
                habit.id,
            ],
        )?;
        Ok(())
    }

    pub fn get_habit(&self, id: i64) -> Result<Option<Habit>> {
        let sql = format!("SELECT {HABIT_COLUMNS} FROM habits h WHERE h.id = ?1");
        let habit = self
            .conn
            .query_row(&sql, params![id], row_to_habit)
            .optional()?;
        Ok(habit)
    }

    /// All habits of a user, by id.
    pub fn list_habits(&self, user_id: i64) -> Result<Vec<Habit>> {
        let sql = format!("SELECT {HABIT_COLUMNS} FROM habits h WHERE h.user_id = ?1 ORDER BY h.id");
        let mut stmt = self.conn.prepare(&sql)?;
        let habits = stmt
            .query_map(params![user_id], row_to_habit)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(habits)
    }

    /// Whether `user_id` already owns a habit called `name`, ignoring `except`.
    pub fn habit_name_exists(&self, user_id: i64, name: &str, except: Option<i64>) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM habits WHERE user_id = ?1 AND name = ?2 AND id != ?3",
            params![user_id, name, except.unwrap_or(0)],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Delete a habit; tasks, streak and achievements cascade.
    ///
    /// Returns `false` if no habit had that id.
    pub fn delete_habit(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM habits WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// Habits of `period` across every user, created within `[since, until]`.
    pub fn habits_created_between(
        &self,
        period: Period,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Habit>> {
        let sql = format!(
            "SELECT {HABIT_COLUMNS} FROM habits h
             WHERE h.period = ?1 AND h.creation_time >= ?2 AND h.creation_time <= ?3
             ORDER BY h.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let habits = stmt
            .query_map(
                params![period.as_str(), format_datetime(since), format_datetime(until)],
                row_to_habit,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(habits)
    }

    /// Every habit that has a streak row, paired with it, by habit id.
    pub fn habits_with_streaks(&self) -> Result<Vec<(Habit, Streak)>> {
        let sql = format!(
            "SELECT {HABIT_COLUMNS}, {STREAK_COLUMNS}
             FROM habits h JOIN streaks s ON s.habit_id = h.id
             ORDER BY h.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| Ok((row_to_habit(row)?, row_to_streak(row, 11)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn count_habits(&self, user_id: i64) -> Result<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM habits WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // === Tasks ===

    /// Insert a task row and return its id.
    pub fn insert_task(&self, task: &Task) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO tasks (habit_id, task_number, start_date, due_date, status, completion_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                task.habit_id,
                task.task_number,
                format_datetime(task.start_date),
                format_datetime(task.due_date),
                task.status.as_str(),
                task.completion_date.map(format_datetime),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = ?1");
        let task = self
            .conn
            .query_row(&sql, params![id], row_to_task)
            .optional()?;
        Ok(task)
    }

    /// Tasks of a habit in `task_number` order.
    pub fn list_tasks(&self, habit_id: i64) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks t WHERE t.habit_id = ?1 ORDER BY t.task_number"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let tasks = stmt
            .query_map(params![habit_id], row_to_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    fn user_tasks(&self, user_id: i64, condition: &str, extra: &[&dyn rusqlite::ToSql]) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks t JOIN habits h ON h.id = t.habit_id
             WHERE h.user_id = ?1 AND {condition}
             ORDER BY t.due_date, t.habit_id, t.task_number"
        );
        let mut bound: Vec<&dyn rusqlite::ToSql> = Vec::with_capacity(extra.len() + 1);
        bound.push(&user_id);
        bound.extend_from_slice(extra);
        let mut stmt = self.conn.prepare(&sql)?;
        let tasks = stmt
            .query_map(bound.as_slice(), row_to_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    /// In-progress tasks of `user_id` with `due_date < now`.
    pub fn overdue_tasks(&self, user_id: i64, now: DateTime<Utc>) -> Result<Vec<Task>> {
        let now = format_datetime(now);
        self.user_tasks(user_id, "t.status = 'in_progress' AND t.due_date < ?2", &[&now])
    }

    /// In-progress tasks of `user_id` due within `[from, to]`.
    pub fn tasks_due_between(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Task>> {
        let (from, to) = (format_datetime(from), format_datetime(to));
        self.user_tasks(
            user_id,
            "t.status = 'in_progress' AND t.due_date >= ?2 AND t.due_date <= ?3",
            &[&from, &to],
        )
    }

    /// In-progress tasks of `user_id` whose window `[start, due)` contains `at`.
    pub fn tasks_open_at(&self, user_id: i64, at: DateTime<Utc>) -> Result<Vec<Task>> {
        let at = format_datetime(at);
        self.user_tasks(
            user_id,
            "t.status = 'in_progress' AND t.start_date <= ?2 AND t.due_date > ?2",
            &[&at],
        )
    }

    /// First tasks of `user_id`'s habits that start at or after `at`.
    pub fn first_tasks_starting_from(&self, user_id: i64, at: DateTime<Utc>) -> Result<Vec<Task>> {
        let at = format_datetime(at);
        self.user_tasks(user_id, "t.task_number = 1 AND t.start_date >= ?2", &[&at])
    }

    /// Status of task `task_number` in `habit_id`, if it exists.
    pub fn task_status(&self, habit_id: i64, task_number: u32) -> Result<Option<TaskStatus>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT status FROM tasks WHERE habit_id = ?1 AND task_number = ?2",
                params![habit_id, task_number],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|s| {
            s.parse::<TaskStatus>().map_err(|_| {
                CoreError::from(DatabaseError::CorruptValue {
                    column: "status".into(),
                    value: s.clone(),
                })
            })
        })
        .transpose()
    }

    /// Move an in-progress task to `status`.
    ///
    /// Guarded on the current status, so it returns `false` and writes
    /// nothing when the task is already terminal.
    pub fn finish_task(&self, id: i64, status: TaskStatus, at: DateTime<Utc>) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE tasks SET status = ?1, completion_date = ?2
             WHERE id = ?3 AND status = 'in_progress'",
            params![status.as_str(), format_datetime(at), id],
        )?;
        Ok(changed > 0)
    }

    /// Highest task number among a habit's completed or failed tasks, 0 if none.
    pub fn max_terminal_task_number(&self, habit_id: i64) -> Result<u32> {
        let max: u32 = self.conn.query_row(
            "SELECT COALESCE(MAX(task_number), 0) FROM tasks
             WHERE habit_id = ?1 AND status != 'in_progress'",
            params![habit_id],
            |row| row.get(0),
        )?;
        Ok(max)
    }

    /// Remove every in-progress task of a habit, returning how many went.
    pub fn delete_in_progress_tasks(&self, habit_id: i64) -> Result<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM tasks WHERE habit_id = ?1 AND status = 'in_progress'",
            params![habit_id],
        )?;
        Ok(deleted)
    }

    pub fn count_tasks(&self, user_id: i64) -> Result<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks t JOIN habits h ON h.id = t.habit_id WHERE h.user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // === Streaks ===

    pub fn insert_streak(&self, streak: &Streak) -> Result<()> {
        self.conn.execute(
            "INSERT INTO streaks (habit_id, num_of_completed_tasks, num_of_failed_tasks,
                                  longest_streak, current_streak)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                streak.habit_id,
                streak.num_of_completed_tasks,
                streak.num_of_failed_tasks,
                streak.longest_streak.max(streak.current_streak),
                streak.current_streak,
            ],
        )?;
        Ok(())
    }

    pub fn get_streak(&self, habit_id: i64) -> Result<Option<Streak>> {
        let sql = format!("SELECT {STREAK_COLUMNS} FROM streaks s WHERE s.habit_id = ?1");
        let streak = self
            .conn
            .query_row(&sql, params![habit_id], |row| row_to_streak(row, 0))
            .optional()?;
        Ok(streak)
    }

    /// Persist counters; `longest_streak` is clamped up to `current_streak`.
    pub fn save_streak(&self, streak: &Streak) -> Result<()> {
        self.conn.execute(
            "UPDATE streaks
             SET num_of_completed_tasks = ?1, num_of_failed_tasks = ?2,
                 longest_streak = ?3, current_streak = ?4
             WHERE habit_id = ?5",
            params![
                streak.num_of_completed_tasks,
                streak.num_of_failed_tasks,
                streak.longest_streak.max(streak.current_streak),
                streak.current_streak,
                streak.habit_id,
            ],
        )?;
        Ok(())
    }

    // === Achievements ===

    /// Append an achievement and return its id.
    pub fn insert_achievement(&self, achievement: &Achievement) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO achievements (habit_id, streak_length, title, date)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                achievement.habit_id,
                achievement.streak_length,
                achievement.title,
                format_datetime(achievement.date),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Achievements of a habit in insertion order.
    pub fn list_achievements(&self, habit_id: i64) -> Result<Vec<Achievement>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, habit_id, streak_length, title, date
             FROM achievements WHERE habit_id = ?1 ORDER BY id",
        )?;
        let achievements = stmt
            .query_map(params![habit_id], row_to_achievement)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(achievements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::HabitDraft;
    use crate::task::generate_tasks;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 6, 0, 0).unwrap()
    }

    fn seeded() -> (HabitDb, Habit) {
        let db = HabitDb::open_memory().unwrap();
        let user = db.insert_user("ana", start()).unwrap();
        let draft = HabitDraft {
            name: "Journal".into(),
            frequency: 2,
            period: Period::Daily,
            goal_days: 3,
            notes: "evenings".into(),
            start_date: start(),
        };
        let mut habit = Habit::from_draft(user.id, &draft, start()).unwrap();
        habit.id = db.insert_habit(&habit).unwrap();
        db.insert_streak(&Streak::new(habit.id)).unwrap();
        for task in generate_tasks(&habit, 0) {
            db.insert_task(&task).unwrap();
        }
        (db, habit)
    }

    #[test]
    fn habit_roundtrip_preserves_timestamps() {
        let (db, habit) = seeded();
        let loaded = db.get_habit(habit.id).unwrap().unwrap();
        assert_eq!(loaded, habit);
        assert!(db.get_habit(999).unwrap().is_none());
    }

    #[test]
    fn fractional_step_survives_storage() {
        let (db, habit) = seeded();
        let tasks = db.list_tasks(habit.id).unwrap();
        assert_eq!(tasks.len(), 6);
        assert_eq!(tasks[0].due_date - tasks[0].start_date, Duration::hours(12));
        assert_eq!(tasks[5].due_date, habit.completion_date);
        assert!(tasks.iter().all(|t| t.status == TaskStatus::InProgress));
    }

    #[test]
    fn overdue_selection_is_strict_and_user_scoped() {
        let (db, habit) = seeded();
        let first_due = start() + Duration::hours(12);

        assert!(db.overdue_tasks(habit.user_id, first_due).unwrap().is_empty());
        let overdue = db
            .overdue_tasks(habit.user_id, first_due + Duration::microseconds(1))
            .unwrap();
        assert_eq!(overdue.len(), 1);
        assert!(db
            .overdue_tasks(habit.user_id + 1, start() + Duration::days(10))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn finish_task_is_guarded() {
        let (db, habit) = seeded();
        let task = &db.list_tasks(habit.id).unwrap()[0];
        let at = start() + Duration::hours(1);

        assert!(db.finish_task(task.id, TaskStatus::Completed, at).unwrap());
        assert!(!db.finish_task(task.id, TaskStatus::Failed, at).unwrap());

        let stored = db.get_task(task.id).unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Completed);
        assert_eq!(stored.completion_date, Some(at));
        assert_eq!(db.task_status(habit.id, 1).unwrap(), Some(TaskStatus::Completed));
        assert_eq!(db.task_status(habit.id, 42).unwrap(), None);
    }

    #[test]
    fn tail_helpers() {
        let (db, habit) = seeded();
        let tasks = db.list_tasks(habit.id).unwrap();
        db.finish_task(tasks[0].id, TaskStatus::Completed, start()).unwrap();
        db.finish_task(tasks[1].id, TaskStatus::Failed, tasks[1].due_date)
            .unwrap();

        assert_eq!(db.max_terminal_task_number(habit.id).unwrap(), 2);
        assert_eq!(db.delete_in_progress_tasks(habit.id).unwrap(), 4);
        assert_eq!(db.list_tasks(habit.id).unwrap().len(), 2);
    }

    #[test]
    fn streak_save_clamps_longest() {
        let (db, habit) = seeded();
        let mut streak = db.get_streak(habit.id).unwrap().unwrap();
        streak.current_streak = 4;
        db.save_streak(&streak).unwrap();
        let stored = db.get_streak(habit.id).unwrap().unwrap();
        assert_eq!(stored.longest_streak, 4);
    }

    #[test]
    fn delete_cascades() {
        let (db, habit) = seeded();
        db.insert_achievement(&Achievement::new(habit.id, "7-Day Streak", 7, start()))
            .unwrap();

        assert!(db.delete_habit(habit.id).unwrap());
        assert!(db.list_tasks(habit.id).unwrap().is_empty());
        assert!(db.get_streak(habit.id).unwrap().is_none());
        assert!(db.list_achievements(habit.id).unwrap().is_empty());
        assert!(!db.delete_habit(habit.id).unwrap());
    }

    #[test]
    fn name_uniqueness_is_per_user() {
        let (db, habit) = seeded();
        assert!(db.habit_name_exists(habit.user_id, "journal", None).unwrap());
        assert!(!db
            .habit_name_exists(habit.user_id, "journal", Some(habit.id))
            .unwrap());
        let other = db.insert_user("ben", start()).unwrap();
        assert!(!db.habit_name_exists(other.id, "journal", None).unwrap());
    }

    #[test]
    fn transaction_rolls_back_on_error() {
        let db = HabitDb::open_memory().unwrap();
        let result: Result<()> = db.with_transaction(|db| {
            db.insert_user("temp", start())?;
            Err(DatabaseError::QueryFailed("boom".into()).into())
        });
        assert!(result.is_err());
        assert!(db.list_users().unwrap().is_empty());
    }

    #[test]
    fn datetime_format_is_fixed_width() {
        let a = format_datetime(start());
        let b = format_datetime(start() + Duration::microseconds(1));
        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert!(a.ends_with('Z'));
    }
}
