//! Encoding of raw habit values into numeric columns.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::error::{CoreError, Result};
use crate::habit::{is_truthy, HabitSeries, ValueKind};

/// One numeric column derived from a habit series, keyed by date.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedColumn {
    pub name: String,
    pub habit_id: i64,
    pub values: BTreeMap<NaiveDate, f64>,
}

/// Encode a series into its numeric column(s).
///
/// Numeric and boolean series give one column named after the habit.
/// Categorical series give one 0/1 indicator column per distinct value,
/// in the order values were first seen, named `{habit}_{category}`.
pub fn encode_series(series: &HabitSeries) -> Result<Vec<EncodedColumn>> {
    if series.is_empty() {
        return Err(CoreError::InsufficientData(format!(
            "habit '{}' has no observations",
            series.name
        )));
    }

    match series.value_kind {
        ValueKind::Numeric => {
            let mut values = BTreeMap::new();
            for obs in &series.observations {
                let parsed = parse_number(&obs.value).ok_or_else(|| {
                    CoreError::InvalidConfiguration(format!(
                        "habit '{}' has non-numeric value '{}' on {}",
                        series.name, obs.value, obs.date
                    ))
                })?;
                values.insert(obs.date, parsed);
            }
            Ok(vec![single_column(series, values)])
        }
        ValueKind::Boolean => {
            let values = series
                .observations
                .iter()
                .map(|obs| (obs.date, if is_truthy(&obs.value) { 1.0 } else { 0.0 }))
                .collect();
            Ok(vec![single_column(series, values)])
        }
        ValueKind::Categorical => Ok(one_hot(series)),
    }
}

/// Distinct category values in first-seen order.
pub fn categories(series: &HabitSeries) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for obs in &series.observations {
        let value = obs.value.trim();
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

fn one_hot(series: &HabitSeries) -> Vec<EncodedColumn> {
    categories(series)
        .into_iter()
        .map(|category| EncodedColumn {
            name: format!("{}_{}", series.name, category),
            habit_id: series.habit_id,
            values: series
                .observations
                .iter()
                .map(|obs| {
                    let hit = obs.value.trim() == category;
                    (obs.date, if hit { 1.0 } else { 0.0 })
                })
                .collect(),
        })
        .collect()
}

fn single_column(series: &HabitSeries, values: BTreeMap<NaiveDate, f64>) -> EncodedColumn {
    EncodedColumn {
        name: series.name.clone(),
        habit_id: series.habit_id,
        values,
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn numeric_values_pass_through() {
        let series = HabitSeries::new(1, "Caffeine mg", ValueKind::Numeric)
            .with_observation(day(1), "120")
            .with_observation(day(2), " 80.5 ");
        let cols = encode_series(&series).unwrap();
        assert_eq!(cols.len(), 1);
        assert_eq!(cols[0].name, "Caffeine mg");
        assert_eq!(cols[0].values[&day(2)], 80.5);
    }

    #[test]
    fn numeric_garbage_is_rejected() {
        let series =
            HabitSeries::new(1, "Steps", ValueKind::Numeric).with_observation(day(1), "lots");
        let err = encode_series(&series).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("lots"));
    }

    #[test]
    fn booleans_map_truthy_forms() {
        let series = HabitSeries::new(2, "Slept well", ValueKind::Boolean)
            .with_observation(day(1), "Yes")
            .with_observation(day(2), "no")
            .with_observation(day(3), "1");
        let cols = encode_series(&series).unwrap();
        let values: Vec<f64> = cols[0].values.values().copied().collect();
        assert_eq!(values, vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn categories_keep_discovery_order() {
        let series = HabitSeries::new(3, "Mood", ValueKind::Categorical)
            .with_observation(day(1), "good")
            .with_observation(day(2), "bad")
            .with_observation(day(3), "good");
        let cols = encode_series(&series).unwrap();
        let names: Vec<&str> = cols.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Mood_good", "Mood_bad"]);
        assert_eq!(cols[1].values[&day(2)], 1.0);
        assert_eq!(cols[1].values[&day(3)], 0.0);
        assert!(cols.iter().all(|c| c.habit_id == 3));
    }

    #[test]
    fn empty_series_is_insufficient() {
        let series = HabitSeries::new(4, "Reading", ValueKind::Numeric);
        assert!(matches!(
            encode_series(&series),
            Err(CoreError::InsufficientData(_))
        ));
    }
}
