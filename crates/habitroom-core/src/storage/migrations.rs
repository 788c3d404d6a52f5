//! Database schema migrations for habitroom.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};
use tracing::{debug, warn};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Create the schema_version table if it doesn't exist.
fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

/// Set the schema version in the database.
fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    debug!(version, "schema version set");
    Ok(())
}

/// Migration v1: users, habits, tasks, streaks and achievements.
///
/// Every child table cascades on habit (or user) deletion.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            username   TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS habits (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name            TEXT NOT NULL,
            frequency       INTEGER NOT NULL,
            period          TEXT NOT NULL,
            goal_days       INTEGER NOT NULL,
            num_of_tasks    INTEGER NOT NULL,
            notes           TEXT NOT NULL DEFAULT '',
            creation_time   TEXT NOT NULL,
            start_date      TEXT NOT NULL,
            completion_date TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            habit_id        INTEGER NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
            task_number     INTEGER NOT NULL,
            start_date      TEXT NOT NULL,
            due_date        TEXT NOT NULL,
            status          TEXT NOT NULL DEFAULT 'in_progress',
            completion_date TEXT,
            UNIQUE (habit_id, task_number)
        );

        CREATE TABLE IF NOT EXISTS streaks (
            habit_id               INTEGER PRIMARY KEY REFERENCES habits(id) ON DELETE CASCADE,
            num_of_completed_tasks INTEGER NOT NULL DEFAULT 0,
            num_of_failed_tasks    INTEGER NOT NULL DEFAULT 0,
            longest_streak         INTEGER NOT NULL DEFAULT 0,
            current_streak         INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS achievements (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            habit_id      INTEGER NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
            streak_length INTEGER NOT NULL DEFAULT 0,
            title         TEXT NOT NULL,
            date          TEXT NOT NULL
        );",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}

/// Migration v2: indexes for the sweep and read paths.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_habits_user ON habits(user_id);
         CREATE INDEX IF NOT EXISTS idx_habits_period_created ON habits(period, creation_time);
         CREATE INDEX IF NOT EXISTS idx_tasks_status_due ON tasks(status, due_date);
         CREATE INDEX IF NOT EXISTS idx_achievements_habit ON achievements(habit_id);",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()?;
    Ok(())
}
