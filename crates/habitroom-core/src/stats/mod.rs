//! Habit statistics: progress and streak leaders.

use serde::{Deserialize, Serialize};

use crate::habit::Habit;
use crate::streak::Streak;

/// Completed share of a habit's tasks, as a percentage rounded to 2 places.
pub fn progress_percentage(streak: &Streak, num_of_tasks: u32) -> f64 {
    if num_of_tasks == 0 {
        return 0.0;
    }
    let pct = f64::from(streak.num_of_completed_tasks) / f64::from(num_of_tasks) * 100.0;
    (pct * 100.0).round() / 100.0
}

/// A habit together with its streak and derived progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitProgress {
    pub habit: Habit,
    pub streak: Streak,
    pub progress_percentage: f64,
}

impl HabitProgress {
    pub fn new(habit: Habit, streak: Streak) -> Self {
        let progress_percentage = progress_percentage(&streak, habit.num_of_tasks);
        Self {
            habit,
            streak,
            progress_percentage,
        }
    }
}

/// Which streak counter to compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakKind {
    Current,
    Longest,
}

impl StreakKind {
    fn value(self, streak: &Streak) -> u32 {
        match self {
            StreakKind::Current => streak.current_streak,
            StreakKind::Longest => streak.longest_streak,
        }
    }
}

/// Every entry holding the maximum of `kind`, ordered by habit id.
pub fn streak_leaders(entries: Vec<HabitProgress>, kind: StreakKind) -> Vec<HabitProgress> {
    let Some(best) = entries.iter().map(|e| kind.value(&e.streak)).max() else {
        return Vec::new();
    };
    let mut leaders: Vec<HabitProgress> = entries
        .into_iter()
        .filter(|e| kind.value(&e.streak) == best)
        .collect();
    leaders.sort_by_key(|e| e.habit.id);
    leaders
}

/// Per-user summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: i64,
    pub username: String,
    pub active_habits: u32,
    pub tracked_tasks: u32,
}
