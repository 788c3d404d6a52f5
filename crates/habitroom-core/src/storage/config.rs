//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Ranking weights and the ranking cohort window
//! - Query windows for due / active / upcoming tasks
//! - The default user for CLI commands
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::{ConfigError, CoreError, Result};
use crate::scoring::ScoreWeights;

/// Ranking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_completed_weight")]
    pub completed_weight: f64,
    #[serde(default = "default_failed_weight")]
    pub failed_weight: f64,
    #[serde(default = "default_longest_streak_weight")]
    pub longest_streak_weight: f64,
    #[serde(default = "default_current_streak_weight")]
    pub current_streak_weight: f64,
    /// Only habits created within this many days are ranked together.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
}

/// Task query windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueriesConfig {
    #[serde(default = "default_due_window_hours")]
    pub due_window_hours: u32,
    #[serde(default = "default_lead_minutes")]
    pub active_lead_minutes: u32,
    #[serde(default = "default_lead_minutes")]
    pub upcoming_lead_minutes: u32,
}

/// User selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    /// Used when a command is run without `--user`.
    #[serde(default)]
    pub default_user_id: Option<i64>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub queries: QueriesConfig,
    #[serde(default)]
    pub user: UserConfig,
}

// Default functions
fn default_completed_weight() -> f64 {
    ScoreWeights::struggle().completed_tasks
}
fn default_failed_weight() -> f64 {
    ScoreWeights::struggle().failed_tasks
}
fn default_longest_streak_weight() -> f64 {
    ScoreWeights::struggle().longest_streak
}
fn default_current_streak_weight() -> f64 {
    ScoreWeights::struggle().current_streak
}
fn default_window_days() -> u32 {
    30
}
fn default_due_window_hours() -> u32 {
    24
}
fn default_lead_minutes() -> u32 {
    60
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            completed_weight: default_completed_weight(),
            failed_weight: default_failed_weight(),
            longest_streak_weight: default_longest_streak_weight(),
            current_streak_weight: default_current_streak_weight(),
            window_days: default_window_days(),
        }
    }
}

impl Default for QueriesConfig {
    fn default() -> Self {
        Self {
            due_window_hours: default_due_window_hours(),
            active_lead_minutes: default_lead_minutes(),
            upcoming_lead_minutes: default_lead_minutes(),
        }
    }
}

impl RankingConfig {
    pub fn weights(&self) -> ScoreWeights {
        ScoreWeights {
            completed_tasks: self.completed_weight,
            failed_tasks: self.failed_weight,
            longest_streak: self.longest_streak_weight,
            current_streak: self.current_streak_weight,
        }
    }
}

impl QueriesConfig {
    pub fn due_window(&self) -> Duration {
        Duration::hours(i64::from(self.due_window_hours))
    }

    pub fn active_lead(&self) -> Duration {
        Duration::minutes(i64::from(self.active_lead_minutes))
    }

    pub fn upcoming_lead(&self) -> Duration {
        Duration::minutes(i64::from(self.upcoming_lead_minutes))
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let clears = value.is_empty() || value.eq_ignore_ascii_case("none");
                let new_value = match existing {
                    // Non-optional fields reject null when deserialized back
                    serde_json::Value::Number(_) | serde_json::Value::Null if clears => {
                        serde_json::Value::Null
                    }
                    serde_json::Value::Bool(_) => value
                        .parse::<bool>()
                        .map(serde_json::Value::Bool)
                        .map_err(|e| invalid(e.to_string()))?,
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else {
                            value
                                .parse::<f64>()
                                .ok()
                                .and_then(serde_json::Number::from_f64)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        }
                    }
                    // Optional numeric fields are stored as null until set
                    serde_json::Value::Null => value
                        .parse::<i64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|e| invalid(e.to_string()))?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    serde_json::Value::String(_) => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Location of the config file.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return (and persist) the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                CoreError::from(ConfigError::LoadFailed {
                    path,
                    message: e.to_string(),
                })
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a config value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.ranking.window_days, 30);
        assert_eq!(parsed.queries.due_window_hours, 24);
        assert!(parsed.user.default_user_id.is_none());
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("[queries]\ndue_window_hours = 48\n").unwrap();
        assert_eq!(parsed.queries.due_window_hours, 48);
        assert_eq!(parsed.queries.active_lead_minutes, 60);
        assert_eq!(parsed.ranking.weights(), ScoreWeights::struggle());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("ranking.window_days").as_deref(), Some("30"));
        assert_eq!(cfg.get("ranking.failed_weight").as_deref(), Some("0.8"));
        assert_eq!(cfg.get("user.default_user_id").as_deref(), Some("null"));
        assert!(cfg.get("ranking.missing_key").is_none());
    }

    #[test]
    fn apply_updates_nested_number() {
        let mut cfg = Config::default();
        cfg.apply("queries.due_window_hours", "12").unwrap();
        assert_eq!(cfg.queries.due_window_hours, 12);
        assert_eq!(cfg.queries.due_window(), Duration::hours(12));
    }

    #[test]
    fn apply_updates_float_weight() {
        let mut cfg = Config::default();
        cfg.apply("ranking.completed_weight", "-0.5").unwrap();
        assert_eq!(cfg.ranking.weights().completed_tasks, -0.5);
    }

    #[test]
    fn apply_sets_and_clears_optional_user() {
        let mut cfg = Config::default();
        cfg.apply("user.default_user_id", "3").unwrap();
        assert_eq!(cfg.user.default_user_id, Some(3));
        cfg.apply("user.default_user_id", "none").unwrap();
        assert!(cfg.user.default_user_id.is_none());
        cfg.apply("user.default_user_id", "5").unwrap();
        cfg.apply("user.default_user_id", "").unwrap();
        assert!(cfg.user.default_user_id.is_none());
    }

    #[test]
    fn clearing_a_required_value_is_rejected() {
        let mut cfg = Config::default();
        let err = cfg.apply("ranking.window_days", "none").unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::InvalidValue { .. })));
        assert_eq!(cfg.ranking.window_days, 30);
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        let err = cfg.apply("ranking.nonexistent", "1").unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn apply_rejects_invalid_number() {
        let mut cfg = Config::default();
        assert!(cfg.apply("queries.due_window_hours", "soon").is_err());
        assert!(cfg.apply("queries.due_window_hours", "-4").is_err());
        assert_eq!(cfg.queries.due_window_hours, 24);
    }
}
