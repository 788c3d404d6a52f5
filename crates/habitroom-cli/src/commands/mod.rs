pub mod config;
pub mod habit;
pub mod stats;
pub mod sweep;
pub mod task;
pub mod user;

use chrono::{DateTime, Utc};
use habitroom_core::Config;
use serde::Serialize;

/// Per-invocation settings shared by every command.
pub struct Context {
    pub user: Option<i64>,
    /// Sampled once; every command reasons about this instant.
    pub now: DateTime<Utc>,
}

impl Context {
    /// `--user`, else the configured default.
    pub fn user_id(&self, config: &Config) -> Result<i64, Box<dyn std::error::Error>> {
        self.user
            .or(config.user.default_user_id)
            .ok_or_else(|| "no user selected: pass --user or run `habitroom user create`".into())
    }
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp '{s}': {e}"))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
