//! # Habitroom Core Library
//!
//! This library provides the core logic for the Habitroom habit tracker.
//! It follows a CLI-first philosophy: every operation is available through the
//! standalone `habitroom` binary, which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Task Schedule Generator**: spreads a habit's goal into evenly spaced
//!   tasks with start and due timestamps
//! - **Lifecycle Sweep**: expires overdue in-progress tasks on every read
//! - **Streak & Achievement Engine**: reacts to completions and sweep failures,
//!   logging milestones and streak breaks
//! - **Ranking**: weighted, z-normalized scores across a cohort of habits
//! - **Storage**: SQLite persistence and TOML-based configuration
//!
//! The engine components are pure functions over in-memory values and take
//! the current time explicitly. Only [`Tracker`] and [`storage`] touch SQLite.
//!
//! ## Key Components
//!
//! - [`Tracker`]: Orchestrates storage and the engine components
//! - [`HabitDb`]: Habit, task, streak and achievement persistence
//! - [`Config`]: Application configuration management

pub mod error;
pub mod habit;
pub mod lifecycle;
pub mod scoring;
pub mod stats;
pub mod storage;
pub mod streak;
pub mod task;
pub mod tracker;

pub use error::{ConfigError, CoreError, DatabaseError, NotFoundError, ValidationError};
pub use habit::{parse_goal, Habit, HabitDraft, Period};
pub use lifecycle::{sweep_tasks, SweepOutcome};
pub use scoring::{rank_habits, RankedHabit, ScoreWeights};
pub use stats::{HabitProgress, Profile, StreakKind};
pub use storage::{Config, HabitDb, User};
pub use streak::{Achievement, Streak, BREAK_THE_HABIT};
pub use task::{generate_tasks, Task, TaskStatus};
pub use tracker::{CompletionReport, HabitDetail, SweepReport, Tracker};
