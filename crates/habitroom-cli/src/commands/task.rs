//! Task query and completion commands for CLI.

use chrono::Duration;
use clap::Subcommand;
use habitroom_core::{Config, Tracker};

use super::{print_json, Context};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Open tasks due soon
    Due {
        /// Look-ahead window in hours (default: queries.due_window_hours)
        #[arg(long)]
        hours: Option<u32>,
    },
    /// Open tasks whose window is running
    Active,
    /// First tasks of habits that have not started yet
    Upcoming,
    /// Mark a task completed
    Complete {
        /// Task ID
        id: i64,
    },
}

pub fn run(action: TaskAction, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = Tracker::open()?;
    let config = Config::load()?;

    match action {
        TaskAction::Due { hours } => {
            let user_id = ctx.user_id(&config)?;
            let window = hours
                .map(|h| Duration::hours(i64::from(h)))
                .unwrap_or_else(|| config.queries.due_window());
            print_json(&tracker.due_tasks(user_id, ctx.now, window)?)?;
        }
        TaskAction::Active => {
            let user_id = ctx.user_id(&config)?;
            let lead = config.queries.active_lead();
            print_json(&tracker.active_tasks(user_id, ctx.now, lead)?)?;
        }
        TaskAction::Upcoming => {
            let user_id = ctx.user_id(&config)?;
            let lead = config.queries.upcoming_lead();
            print_json(&tracker.upcoming_tasks(user_id, ctx.now, lead)?)?;
        }
        TaskAction::Complete { id } => {
            let report = tracker.complete_task(id, ctx.now)?;
            if !report.completed {
                eprintln!("Task {id} is already {}", report.task.status);
            }
            print_json(&report)?;
        }
    }
    Ok(())
}
