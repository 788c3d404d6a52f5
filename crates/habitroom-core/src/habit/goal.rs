//! Goal duration presets.

use super::MAX_GOAL_DAYS;
use crate::error::ValidationError;

/// Preset labels offered for goal selection and their length in days.
pub const GOAL_PRESETS: [(&str, u32); 7] = [
    ("3 days", 3),
    ("1 week", 7),
    ("1 month", 30),
    ("2 months", 60),
    ("3 months", 90),
    ("6 months", 180),
    ("1 year", 365),
];

/// Parse a goal given either as a preset label or as a raw day count.
///
/// # Errors
/// Returns [`ValidationError::InvalidGoal`] for unknown labels and
/// [`ValidationError::NotPositive`] for a zero or negative count and
/// [`ValidationError::TooLarge`] above [`MAX_GOAL_DAYS`].
pub fn parse_goal(value: &str) -> Result<u32, ValidationError> {
    let normalized = value.trim().to_ascii_lowercase();
    if let Some((_, days)) = GOAL_PRESETS.iter().find(|(label, _)| *label == normalized) {
        return Ok(*days);
    }
    match normalized.parse::<i64>() {
        Ok(days) if days > i64::from(MAX_GOAL_DAYS) => Err(ValidationError::TooLarge {
            field: "goal",
            max: MAX_GOAL_DAYS,
        }),
        Ok(days) if days > 0 => {
            u32::try_from(days).map_err(|_| ValidationError::InvalidGoal(value.to_string()))
        }
        Ok(days) => Err(ValidationError::NotPositive {
            field: "goal",
            value: days,
        }),
        Err(_) => Err(ValidationError::InvalidGoal(value.to_string())),
    }
}
