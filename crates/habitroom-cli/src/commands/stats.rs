use clap::Subcommand;
use habitroom_core::{Config, Period, StreakKind, Tracker};
use serde_json::json;

use super::{print_json, Context};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Rank recent habits of one period, most struggled-with first
    Rank {
        #[arg(long, default_value = "daily")]
        period: Period,
        /// Cohort window in days (default: ranking.window_days)
        #[arg(long)]
        window_days: Option<u32>,
    },
    /// Habits holding the highest current and longest streak
    Longest,
    /// Completion percentage of one habit, or of every habit of the user
    Progress {
        /// Habit ID
        id: Option<i64>,
    },
}

pub fn run(action: StatsAction, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = Tracker::open()?;
    let config = Config::load()?;

    match action {
        StatsAction::Rank {
            period,
            window_days,
        } => {
            let window_days = window_days.unwrap_or(config.ranking.window_days);
            let weights = config.ranking.weights();
            print_json(&tracker.rank(&weights, period, ctx.now, window_days)?)?;
        }
        StatsAction::Longest => {
            let current = tracker.streak_leaders(StreakKind::Current)?;
            let longest = tracker.streak_leaders(StreakKind::Longest)?;
            print_json(&json!({
                "current_streak": current,
                "longest_streak": longest,
            }))?;
        }
        StatsAction::Progress { id: Some(id) } => {
            print_json(&tracker.progress(id, ctx.now)?)?;
        }
        StatsAction::Progress { id: None } => {
            let user_id = ctx.user_id(&config)?;
            print_json(&tracker.habits(user_id, ctx.now)?)?;
        }
    }
    Ok(())
}
