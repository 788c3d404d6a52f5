use habitroom_core::{Config, Tracker};

use super::{print_json, Context};

pub fn run(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = Tracker::open()?;
    let config = Config::load()?;
    let user_id = ctx.user_id(&config)?;
    print_json(&tracker.sweep(user_id, ctx.now)?)
}
