//! Core error types for habitroom-core.
//!
//! This module defines the error hierarchy using thiserror. Validation and
//! not-found conditions are kept distinct so callers can decide how to
//! present them; idempotent no-ops never surface as errors.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for habitroom-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(#[from] NotFoundError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Stored value could not be decoded into a domain type
    #[error("Corrupt value in column '{column}': {value}")]
    CorruptValue { column: String, value: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Home/data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors raised before any state is written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Period string is not one of daily/weekly/monthly/annual
    #[error("Invalid period '{0}': expected daily, weekly, monthly or annual")]
    InvalidPeriod(String),

    /// Goal preset label is not recognised
    #[error("Invalid goal '{0}': expected a day count or a preset such as '1 month'")]
    InvalidGoal(String),

    /// Field must be strictly positive
    #[error("'{field}' must be positive, got {value}")]
    NotPositive { field: &'static str, value: i64 },

    /// Goal is not longer than a single period
    #[error("Goal of {goal_days} days is not achievable with a {period} period; choose a longer goal")]
    GoalNotAchievable { goal_days: u32, period: String },

    /// Value exceeds the supported maximum
    #[error("'{field}' exceeds the maximum of {max}")]
    TooLarge { field: &'static str, max: u32 },

    /// Derived date falls outside the representable range
    #[error("Habit dates fall outside the supported range")]
    DateOutOfRange,

    /// Habit name already used by this user
    #[error("A habit named '{0}' already exists")]
    DuplicateName(String),

    /// Name is empty after normalization
    #[error("Habit name must not be empty")]
    EmptyName,

    /// Username already taken
    #[error("User '{0}' already exists")]
    DuplicateUser(String),
}

/// Not-found errors for referenced records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    #[error("user {0}")]
    User(i64),

    #[error("habit {0}")]
    Habit(i64),

    #[error("task {0}")]
    Task(i64),

    /// Every habit owns a streak; a missing one means the store is inconsistent
    #[error("streak for habit {0}")]
    Streak(i64),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked
                    || err.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

impl CoreError {
    /// True when the error is a not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound(_))
    }

    /// True when the error is a validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, CoreError::Validation(_))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_converts_into_core_error() {
        let err: CoreError = ValidationError::EmptyName.into();
        assert!(err.is_validation());
        assert!(!err.is_not_found());
    }

    #[test]
    fn not_found_message_names_the_record() {
        let err: CoreError = NotFoundError::Task(42).into();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: task 42");
    }

    #[test]
    fn sqlite_no_rows_maps_to_query_failed() {
        let err: DatabaseError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, DatabaseError::QueryFailed(_)));
    }

    #[test]
    fn goal_not_achievable_mentions_period() {
        let err = ValidationError::GoalNotAchievable {
            goal_days: 7,
            period: "weekly".into(),
        };
        assert!(err.to_string().contains("weekly"));
    }
}
