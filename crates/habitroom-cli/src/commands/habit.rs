//! Habit management commands for CLI.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use habitroom_core::{parse_goal, Config, HabitDraft, NotFoundError, Period, Tracker};

use super::{parse_time, print_json, Context};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a habit and its task schedule
    Add {
        /// Habit name (stored lower-cased)
        name: String,
        /// daily, weekly, monthly or annual
        #[arg(long, default_value = "daily")]
        period: Period,
        /// Occurrences per period
        #[arg(long, default_value = "1")]
        frequency: u32,
        /// Goal in days, or a preset such as "1 month"
        #[arg(long)]
        goal: String,
        #[arg(long, default_value = "")]
        notes: String,
        /// Start of the first task (RFC 3339, default: now)
        #[arg(long, value_parser = parse_time)]
        start: Option<DateTime<Utc>>,
    },
    /// List tracked habits
    List {
        /// Only habits of this period
        #[arg(long)]
        period: Option<Period>,
    },
    /// Habit with tasks, streak and achievements
    Show {
        /// Habit ID
        id: i64,
    },
    /// Change a habit and regenerate its open tasks
    Update {
        /// Habit ID
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        period: Option<Period>,
        #[arg(long)]
        frequency: Option<u32>,
        /// New goal in days, or a preset
        #[arg(long)]
        goal: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Start of the regenerated tasks (RFC 3339, default: now)
        #[arg(long, value_parser = parse_time)]
        start: Option<DateTime<Utc>>,
    },
    /// Delete a habit with its tasks, streak and achievements
    Delete {
        /// Habit ID
        id: i64,
    },
    /// Habits whose goal period has ended
    Completed,
}

pub fn run(action: HabitAction, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = Tracker::open()?;

    match action {
        HabitAction::Add {
            name,
            period,
            frequency,
            goal,
            notes,
            start,
        } => {
            let config = Config::load()?;
            let user_id = ctx.user_id(&config)?;
            let draft = HabitDraft {
                name,
                frequency,
                period,
                goal_days: parse_goal(&goal)?,
                notes,
                start_date: start.unwrap_or(ctx.now),
            };
            let habit = tracker.create_habit(user_id, &draft, ctx.now)?;
            print_json(&habit)?;
        }
        HabitAction::List { period } => {
            let config = Config::load()?;
            let user_id = ctx.user_id(&config)?;
            print_json(&tracker.habits_by_period(user_id, period, ctx.now)?)?;
        }
        HabitAction::Show { id } => {
            print_json(&tracker.habit_detail(id, ctx.now)?)?;
        }
        HabitAction::Update {
            id,
            name,
            period,
            frequency,
            goal,
            notes,
            start,
        } => {
            let existing = tracker
                .db()
                .get_habit(id)?
                .ok_or(NotFoundError::Habit(id))?;
            let goal_days = match goal {
                Some(goal) => parse_goal(&goal)?,
                None => existing.goal_days,
            };
            let draft = HabitDraft {
                name: name.unwrap_or(existing.name),
                frequency: frequency.unwrap_or(existing.frequency),
                period: period.unwrap_or(existing.period),
                goal_days,
                notes: notes.unwrap_or(existing.notes),
                start_date: start.unwrap_or(ctx.now),
            };
            let habit = tracker.update_habit(id, &draft, ctx.now)?;
            print_json(&habit)?;
        }
        HabitAction::Delete { id } => {
            tracker.delete_habit(id)?;
            println!("Habit deleted: {id}");
        }
        HabitAction::Completed => {
            let config = Config::load()?;
            let user_id = ctx.user_id(&config)?;
            print_json(&tracker.completed_habits(user_id, ctx.now)?)?;
        }
    }
    Ok(())
}
