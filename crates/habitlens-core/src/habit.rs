//! Habit series as supplied by the surrounding application.
//!
//! The engine only reads these. Values arrive as raw text, exactly as a
//! user logged them, and are interpreted according to the habit's
//! [`ValueKind`].

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Declared type of a habit's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Free numeric value (minutes, milligrams, hours slept...)
    Numeric,
    /// Yes/no value
    Boolean,
    /// One label out of a small open set
    Categorical,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Numeric => "numeric",
            ValueKind::Boolean => "boolean",
            ValueKind::Categorical => "categorical",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "numeric" => Ok(ValueKind::Numeric),
            "boolean" => Ok(ValueKind::Boolean),
            "categorical" => Ok(ValueKind::Categorical),
            other => Err(CoreError::InvalidConfiguration(format!(
                "unknown value kind '{other}'"
            ))),
        }
    }
}

/// Textual forms counted as `true` for boolean habits.
pub const TRUTHY_VALUES: [&str; 3] = ["true", "1", "yes"];

/// Case-insensitive truthiness of a raw boolean value.
pub fn is_truthy(raw: &str) -> bool {
    let raw = raw.trim();
    TRUTHY_VALUES.iter().any(|t| raw.eq_ignore_ascii_case(t))
}

/// One logged value on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: String,
}

/// Dated observation history for one tracked habit.
///
/// At most one observation per date is expected; the engine does not
/// deduplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitSeries {
    #[serde(alias = "id")]
    pub habit_id: i64,
    pub name: String,
    pub value_kind: ValueKind,
    #[serde(default)]
    pub observations: Vec<Observation>,
}

impl HabitSeries {
    /// Create an empty series.
    pub fn new(habit_id: i64, name: impl Into<String>, value_kind: ValueKind) -> Self {
        Self {
            habit_id,
            name: name.into(),
            value_kind,
            observations: Vec::new(),
        }
    }

    /// Append an observation.
    pub fn with_observation(mut self, date: NaiveDate, value: impl Into<String>) -> Self {
        self.observations.push(Observation {
            date,
            value: value.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Metadata view used by the schedule synthesizer.
    pub fn meta(&self) -> HabitMeta {
        HabitMeta {
            id: self.habit_id,
            name: self.name.clone(),
            value_kind: self.value_kind,
        }
    }
}

/// Habit identity without its history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitMeta {
    pub id: i64,
    pub name: String,
    pub value_kind: ValueKind,
}

impl HabitMeta {
    /// Unit suffix inferred from the last word of a multi-word name.
    ///
    /// "Exercise minutes" -> `Some("minutes")`, "Meditation" -> `None`.
    pub fn unit_suffix(&self) -> Option<&str> {
        let name = self.name.trim();
        if !name.contains(' ') {
            return None;
        }
        name.split_whitespace().last()
    }
}
