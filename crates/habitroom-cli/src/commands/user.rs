use clap::Subcommand;
use habitroom_core::{Config, Tracker};

use super::{print_json, Context};

#[derive(Subcommand)]
pub enum UserAction {
    /// Register a user
    Create {
        /// Username
        name: String,
        /// Make this the default user even if one is already configured
        #[arg(long)]
        default: bool,
    },
    /// List users
    List,
    /// Habit and task counts for a user
    Profile,
}

pub fn run(action: UserAction, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = Tracker::open()?;

    match action {
        UserAction::Create { name, default } => {
            let user = tracker.create_user(&name, ctx.now)?;
            let mut config = Config::load()?;
            if default || config.user.default_user_id.is_none() {
                config.user.default_user_id = Some(user.id);
                config.save()?;
            }
            print_json(&user)?;
        }
        UserAction::List => {
            print_json(&tracker.list_users()?)?;
        }
        UserAction::Profile => {
            let config = Config::load()?;
            let user_id = ctx.user_id(&config)?;
            print_json(&tracker.profile(user_id, ctx.now)?)?;
        }
    }
    Ok(())
}
