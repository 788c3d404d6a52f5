//! Habit struggle scoring and ranking.
//!
//! Each candidate habit gets a weighted linear score over its streak counters,
//! scaled by how many tasks it has and how long it has existed:
//!
//! ```text
//! raw = (w_completed·completed + w_failed·failed
//!        + w_longest·longest + w_current·current) / (num_of_tasks · duration_days)
//! ```
//!
//! Raw scores are z-normalized across the cohort (population standard
//! deviation) and ranked descending. A cohort with zero spread has no
//! meaningful z-score, so every entry gets `NaN`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::warn;

use crate::habit::{Habit, Period};
use crate::streak::Streak;

/// Weights for each score term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub completed_tasks: f64,
    pub failed_tasks: f64,
    pub longest_streak: f64,
    pub current_streak: f64,
}

impl ScoreWeights {
    /// Weights that rank the habits the user struggles with most first:
    /// failures push a habit up, completions and streaks pull it down.
    pub fn struggle() -> Self {
        Self {
            completed_tasks: -0.2,
            failed_tasks: 0.8,
            longest_streak: -0.2,
            current_streak: -0.1,
        }
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::struggle()
    }
}

/// Whole days between `creation_time - 1 day` and `now`.
///
/// The one-day backdate keeps same-day habits at a duration of 1.
pub fn duration_days(creation_time: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - (creation_time - Duration::days(1))).num_days()
}

/// Habits of `period` created within `[now - window_days, now]`.
pub fn in_ranking_window(habit: &Habit, period: Period, now: DateTime<Utc>, window_days: u32) -> bool {
    let since = now - Duration::days(i64::from(window_days));
    habit.period == period && habit.creation_time >= since && habit.creation_time <= now
}

/// Weighted raw score, or `None` when the denominator would be zero.
pub fn raw_score(streak: &Streak, num_of_tasks: u32, duration_days: i64, weights: &ScoreWeights) -> Option<f64> {
    let denominator = f64::from(num_of_tasks) * duration_days as f64;
    if denominator == 0.0 {
        return None;
    }
    let numerator = weights.completed_tasks * f64::from(streak.num_of_completed_tasks)
        + weights.failed_tasks * f64::from(streak.num_of_failed_tasks)
        + weights.longest_streak * f64::from(streak.longest_streak)
        + weights.current_streak * f64::from(streak.current_streak);
    Some(numerator / denominator)
}

/// Z-scores using the population mean and standard deviation.
///
/// Zero standard deviation yields `NaN` for every entry.
pub fn normalize_scores(scores: &[f64]) -> Vec<f64> {
    let Some(&first) = scores.first() else {
        return Vec::new();
    };
    // The float mean of identical values need not equal them exactly
    if scores.iter().all(|&x| x == first) {
        return vec![f64::NAN; scores.len()];
    }
    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    let variance = scores.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    scores
        .iter()
        .map(|x| if std_dev != 0.0 { (x - mean) / std_dev } else { f64::NAN })
        .collect()
}

/// A ranked habit with its raw and normalized score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedHabit {
    pub habit: Habit,
    pub raw_score: f64,
    /// `NaN` (serialized as `null`) when the cohort has no spread
    pub normalized_score: f64,
}

/// Descending by normalized score; `NaN` after every number; then habit id.
fn rank_order(a: &RankedHabit, b: &RankedHabit) -> Ordering {
    let by_score = match (a.normalized_score.is_nan(), b.normalized_score.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b
            .normalized_score
            .partial_cmp(&a.normalized_score)
            .unwrap_or(Ordering::Equal),
    };
    by_score.then_with(|| a.habit.id.cmp(&b.habit.id))
}

/// Score, normalize and rank an already-windowed cohort.
///
/// Habits without a streak, or with no tasks, are skipped silently.
pub fn rank_habits(
    candidates: Vec<(Habit, Option<Streak>)>,
    weights: &ScoreWeights,
    now: DateTime<Utc>,
) -> Vec<RankedHabit> {
    let mut scored = Vec::with_capacity(candidates.len());
    for (habit, streak) in candidates {
        let Some(streak) = streak else {
            warn!(habit_id = habit.id, "no streak row, skipped from ranking");
            continue;
        };
        let duration = duration_days(habit.creation_time, now);
        match raw_score(&streak, habit.num_of_tasks, duration, weights) {
            Some(score) => scored.push((habit, score)),
            None => warn!(habit_id = habit.id, "zero score denominator, skipped from ranking"),
        }
    }

    let raw: Vec<f64> = scored.iter().map(|(_, s)| *s).collect();
    let normalized = normalize_scores(&raw);

    let mut ranked: Vec<RankedHabit> = scored
        .into_iter()
        .zip(normalized)
        .map(|((habit, raw_score), normalized_score)| RankedHabit {
            habit,
            raw_score,
            normalized_score,
        })
        .collect();
    ranked.sort_by(rank_order);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::HabitDraft;
    use chrono::TimeZone;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 28, 1, 38, 47).unwrap()
    }

    fn habit(id: i64, period: Period, frequency: u32, goal_days: u32) -> Habit {
        let draft = HabitDraft {
            name: format!("habit {id}"),
            frequency,
            period,
            goal_days,
            notes: String::new(),
            start_date: created(),
        };
        let mut h = Habit::from_draft(1, &draft, created()).unwrap();
        h.id = id;
        h
    }

    fn streak(habit_id: i64, completed: u32, failed: u32, longest: u32, current: u32) -> Streak {
        Streak {
            habit_id,
            num_of_completed_tasks: completed,
            num_of_failed_tasks: failed,
            longest_streak: longest,
            current_streak: current,
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[test]
    fn duration_backdates_one_day() {
        let c = created();
        assert_eq!(duration_days(c, c), 1);
        assert_eq!(duration_days(c, c + Duration::hours(23)), 1);
        assert_eq!(duration_days(c, c + Duration::days(1)), 2);
    }

    #[test]
    fn raw_score_formula() {
        let s = streak(1, 16, 14, 9, 0);
        let score = raw_score(&s, 30, 2, &ScoreWeights::struggle()).unwrap();
        assert_close(score, 6.2 / 60.0);
        assert!(raw_score(&s, 0, 2, &ScoreWeights::struggle()).is_none());
    }

    #[test]
    fn zero_variance_yields_nan_for_all() {
        for x in [0.0, 0.1, 0.4, 0.7, 1.0 / 3.0, -2.5] {
            let z = normalize_scores(&[x, x, x]);
            assert_eq!(z.len(), 3);
            assert!(z.iter().all(|v| v.is_nan()), "x = {x}: {z:?}");
        }
        assert!(normalize_scores(&[0.1]).iter().all(|v| v.is_nan()));
        assert!(normalize_scores(&[]).is_empty());
    }

    #[test]
    fn normalization_uses_population_std_dev() {
        let z = normalize_scores(&[6.2, 4.6, 4.2]);
        assert_close(z[0], 1.3887301496588267);
        assert_close(z[1], -0.4629100498862762);
        assert_close(z[2], -0.9258200997725524);
    }

    #[test]
    fn daily_cohort_ranks_strugglers_first() {
        let now = created() + Duration::days(10);
        let candidates = vec![
            (habit(55, Period::Daily, 1, 30), Some(streak(55, 16, 14, 9, 0))),
            (habit(58, Period::Daily, 1, 30), Some(streak(58, 18, 12, 7, 0))),
            (habit(76, Period::Daily, 1, 30), Some(streak(76, 18, 12, 6, 6))),
        ];
        let ranked = rank_habits(candidates, &ScoreWeights::struggle(), now);
        let ids: Vec<i64> = ranked.iter().map(|r| r.habit.id).collect();
        assert_eq!(ids, vec![55, 58, 76]);
        assert_close(ranked[0].normalized_score, 1.3887301496588267);
        assert_close(ranked[2].normalized_score, -0.9258200997725524);
    }

    #[test]
    fn weekly_cohort_matches_expected_order() {
        let now = created() + Duration::days(10);
        let candidates = vec![
            (habit(56, Period::Weekly, 2, 30), Some(streak(56, 6, 2, 3, 3))),
            (habit(57, Period::Weekly, 2, 30), Some(streak(57, 5, 3, 3, 2))),
            (habit(59, Period::Weekly, 2, 30), Some(streak(59, 7, 1, 4, 0))),
        ];
        let ranked = rank_habits(candidates, &ScoreWeights::struggle(), now);
        let ids: Vec<i64> = ranked.iter().map(|r| r.habit.id).collect();
        assert_eq!(ids, vec![57, 56, 59]);
        assert_close(ranked[0].normalized_score, 1.2634656762057948);
        assert_close(ranked[1].normalized_score, -0.08151391459392247);
    }

    #[test]
    fn missing_streak_is_skipped_and_pairs_stay_aligned() {
        let now = created() + Duration::days(3);
        let candidates = vec![
            (habit(1, Period::Daily, 1, 30), None),
            (habit(2, Period::Daily, 1, 30), Some(streak(2, 0, 5, 0, 0))),
            (habit(3, Period::Daily, 1, 30), Some(streak(3, 5, 0, 5, 5))),
        ];
        let ranked = rank_habits(candidates, &ScoreWeights::struggle(), now);
        let ids: Vec<i64> = ranked.iter().map(|r| r.habit.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert!(ranked[0].raw_score > ranked[1].raw_score);
    }

    #[test]
    fn equal_scores_fall_back_to_habit_id() {
        let now = created() + Duration::days(3);
        let candidates = vec![
            (habit(9, Period::Daily, 1, 30), Some(streak(9, 1, 1, 1, 1))),
            (habit(4, Period::Daily, 1, 30), Some(streak(4, 1, 1, 1, 1))),
        ];
        let ranked = rank_habits(candidates, &ScoreWeights::struggle(), now);
        assert!(ranked.iter().all(|r| r.normalized_score.is_nan()));
        assert_eq!(ranked[0].habit.id, 4);
        assert_eq!(ranked[1].habit.id, 9);
    }

    #[test]
    fn window_is_inclusive_and_period_scoped() {
        let now = created() + Duration::days(30);
        let h = habit(1, Period::Daily, 1, 30);
        assert!(in_ranking_window(&h, Period::Daily, now, 30));
        assert!(!in_ranking_window(&h, Period::Weekly, now, 30));
        assert!(!in_ranking_window(&h, Period::Daily, now + Duration::seconds(1), 30));
        assert!(!in_ranking_window(&h, Period::Daily, created() - Duration::seconds(1), 30));
    }
}
