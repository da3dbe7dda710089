//! Daily schedule synthesis from a template and per-habit constraints.
//!
//! This is a template adjustment, not an optimizer: each constrained habit
//! whose name matches a template activity gets that activity's value
//! replaced by a value resolved from the constraint bounds.

use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ScheduleConfig;
use crate::error::{CoreError, Result};
use crate::habit::{HabitMeta, ValueKind};
use crate::recommend::Recommendation;

/// One slot of the daily template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntry {
    pub time: String, // HH:mm
    pub activity: String,
    pub value: String,
}

impl TemplateEntry {
    pub fn new(time: &str, activity: &str, value: &str) -> Self {
        Self {
            time: time.to_string(),
            activity: activity.to_string(),
            value: value.to_string(),
        }
    }
}

/// The stock day used when no template is configured.
pub fn default_template() -> Vec<TemplateEntry> {
    [
        ("06:00", "Wake up", "Yes"),
        ("06:30", "Morning routine", "30 minutes"),
        ("07:00", "Exercise", "45 minutes"),
        ("08:00", "Breakfast", "Healthy meal"),
        ("09:00", "Deep work", "3 hours"),
        ("12:00", "Lunch", "45 minutes"),
        ("13:00", "Meetings/Calls", "2 hours"),
        ("15:00", "Deep work", "2 hours"),
        ("17:00", "Exercise", "30 minutes"),
        ("18:00", "Dinner", "Balanced meal"),
        ("19:00", "Family/Social time", "2 hours"),
        ("21:00", "Wind down routine", "1 hour"),
        ("22:00", "Sleep", "8 hours"),
    ]
    .into_iter()
    .map(|(time, activity, value)| TemplateEntry::new(time, activity, value))
    .collect()
}

/// User bounds for one habit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HabitConstraint {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl HabitConstraint {
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

/// Value a constraint resolves to for display in the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedValue {
    Flag(bool),
    Quantity { amount: f64, unit: Option<String> },
}

impl fmt::Display for ResolvedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedValue::Flag(true) => f.write_str("Yes"),
            ResolvedValue::Flag(false) => f.write_str("No"),
            ResolvedValue::Quantity { amount, unit: None } => write!(f, "{amount}"),
            ResolvedValue::Quantity {
                amount,
                unit: Some(unit),
            } => write!(f, "{amount} {unit}"),
        }
    }
}

/// Resolve a constraint against a habit's kind.
///
/// Both bounds resolve to their midpoint, a single bound to itself. Boolean
/// habits become `Yes` when the lower bound (or the only bound) is positive.
/// Categorical habits and constraints without bounds resolve to nothing.
pub fn resolve_constraint(habit: &HabitMeta, constraint: &HabitConstraint) -> Option<ResolvedValue> {
    let (amount, flag_bound) = match (constraint.min, constraint.max) {
        (Some(min), Some(max)) => ((min + max) / 2.0, min),
        (Some(min), None) => (min, min),
        (None, Some(max)) => (max, max),
        (None, None) => return None,
    };

    match habit.value_kind {
        ValueKind::Numeric => Some(ResolvedValue::Quantity {
            amount,
            unit: habit.unit_suffix().map(str::to_string),
        }),
        ValueKind::Boolean => Some(ResolvedValue::Flag(flag_bound > 0.0)),
        ValueKind::Categorical => None,
    }
}

/// Where a schedule's predicted value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionBasis {
    /// Taken from a model-backed recommendation
    Model,
    /// Placeholder for display only; no model was consulted
    Illustrative,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulePrediction {
    pub value: f64,
    pub basis: PredictionBasis,
}

/// One line of the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub time_of_day: String,
    pub activity_label: String,
    pub assigned_value: String,
}

/// A daily plan for one target habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub target_habit_name: String,
    pub predicted: SchedulePrediction,
    pub daily_plan: Vec<PlanEntry>,
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let note = match self.predicted.basis {
            PredictionBasis::Model => "model estimate",
            PredictionBasis::Illustrative => "illustrative only",
        };
        writeln!(
            f,
            "Plan for {} (predicted {:.1}, {note})",
            self.target_habit_name, self.predicted.value
        )?;
        for entry in &self.daily_plan {
            writeln!(
                f,
                "{:<6} {:<20} {}",
                entry.time_of_day, entry.activity_label, entry.assigned_value
            )?;
        }
        Ok(())
    }
}

/// How the target habit is identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitKey {
    Id(i64),
    /// Case-insensitive name match
    Name(String),
}

impl From<i64> for HabitKey {
    fn from(id: i64) -> Self {
        HabitKey::Id(id)
    }
}

impl From<&str> for HabitKey {
    fn from(name: &str) -> Self {
        HabitKey::Name(name.to_string())
    }
}

impl HabitKey {
    fn matches(&self, habit: &HabitMeta) -> bool {
        match self {
            HabitKey::Id(id) => habit.id == *id,
            HabitKey::Name(name) => habit.name.trim().eq_ignore_ascii_case(name.trim()),
        }
    }
}

impl fmt::Display for HabitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HabitKey::Id(id) => write!(f, "id {id}"),
            HabitKey::Name(name) => write!(f, "'{name}'"),
        }
    }
}

/// Applies constraints to a template.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleSynthesizer {
    template: Vec<TemplateEntry>,
    illustrative_range: [f64; 2],
}

impl Default for ScheduleSynthesizer {
    fn default() -> Self {
        Self::from_config(&ScheduleConfig::default())
    }
}

impl ScheduleSynthesizer {
    pub fn new(template: Vec<TemplateEntry>, illustrative_range: [f64; 2]) -> Self {
        Self {
            template,
            illustrative_range,
        }
    }

    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self::new(config.template.clone(), config.illustrative_range)
    }

    pub fn template(&self) -> &[TemplateEntry] {
        &self.template
    }

    /// Build the plan for `target`.
    ///
    /// Constraints are keyed by habit id. Each constrained habit updates the
    /// first template entry whose activity equals its name (ignoring case),
    /// or its name without the unit word ("Exercise minutes" fills
    /// "Exercise"). Habits without a matching entry are skipped.
    ///
    /// When `recommendation` is given its predicted value is attached with
    /// [`PredictionBasis::Model`]. Otherwise a value is drawn from the
    /// illustrative range and tagged [`PredictionBasis::Illustrative`].
    ///
    /// # Errors
    ///
    /// `NotFound` if `target` is not among `habits`.
    pub fn synthesize<R: Rng + ?Sized>(
        &self,
        target: impl Into<HabitKey>,
        constraints: &BTreeMap<i64, HabitConstraint>,
        habits: &[HabitMeta],
        recommendation: Option<&Recommendation>,
        rng: &mut R,
    ) -> Result<Schedule> {
        let target = target.into();
        let target_habit = habits
            .iter()
            .find(|h| target.matches(h))
            .ok_or_else(|| CoreError::NotFound(format!("target habit {target}")))?;

        let mut plan = self.template.clone();
        for habit in habits {
            let Some(constraint) = constraints.get(&habit.id) else {
                continue;
            };
            let Some(slot) = plan
                .iter_mut()
                .find(|entry| activity_matches(habit, &entry.activity))
            else {
                debug!(habit = %habit.name, "no template activity matches constraint");
                continue;
            };
            match resolve_constraint(habit, constraint) {
                Some(value) => slot.value = value.to_string(),
                None => warn!(
                    habit = %habit.name,
                    kind = %habit.value_kind,
                    "constraint does not resolve to a value; template entry kept"
                ),
            }
        }

        let predicted = match recommendation {
            Some(rec) => SchedulePrediction {
                value: rec.predicted_value,
                basis: PredictionBasis::Model,
            },
            None => {
                let [lo, hi] = self.illustrative_range;
                let raw = if hi > lo { rng.gen_range(lo..=hi) } else { lo };
                SchedulePrediction {
                    value: (raw * 10.0).round() / 10.0,
                    basis: PredictionBasis::Illustrative,
                }
            }
        };

        Ok(Schedule {
            target_habit_name: target_habit.name.clone(),
            predicted,
            daily_plan: plan
                .into_iter()
                .map(|e| PlanEntry {
                    time_of_day: e.time,
                    activity_label: e.activity,
                    assigned_value: e.value,
                })
                .collect(),
        })
    }
}

fn activity_matches(habit: &HabitMeta, activity: &str) -> bool {
    let name = habit.name.trim();
    if name.eq_ignore_ascii_case(activity) {
        return true;
    }
    habit.unit_suffix().is_some_and(|unit| {
        name[..name.len() - unit.len()]
            .trim_end()
            .eq_ignore_ascii_case(activity)
    })
}
