use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "habitroom", version, about = "Habitroom habit tracker CLI")]
struct Cli {
    /// User id (defaults to config `user.default_user_id`)
    #[arg(long, global = true)]
    user: Option<i64>,

    /// Evaluate as of this instant (RFC 3339) instead of the current time
    #[arg(long, global = true, value_parser = commands::parse_time)]
    now: Option<DateTime<Utc>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User management
    User {
        #[command(subcommand)]
        action: commands::user::UserAction,
    },
    /// Habit management
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Task queries and completion
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Fail overdue tasks now
    Sweep,
    /// Rankings, streak leaders and progress
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Log to stderr so stdout stays machine-readable; `RUST_LOG` overrides `warn`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let ctx = Context {
        user: cli.user,
        now: cli.now.unwrap_or_else(Utc::now),
    };
    tracing::debug!(now = %ctx.now, user = ?ctx.user, "dispatching command");
    let result = match cli.command {
        Commands::User { action } => commands::user::run(action, &ctx),
        Commands::Habit { action } => commands::habit::run(action, &ctx),
        Commands::Task { action } => commands::task::run(action, &ctx),
        Commands::Sweep => commands::sweep::run(&ctx),
        Commands::Stats { action } => commands::stats::run(action, &ctx),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
