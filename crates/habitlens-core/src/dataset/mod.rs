//! Dataset assembly: one target series and N feature series aligned on a
//! shared date axis.
//!
//! The axis is the sorted union of every observed date. Each column is
//! reindexed onto it and gaps are filled forward, then backward, so the
//! resulting matrix never contains missing values.

pub mod encode;

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::habit::{HabitSeries, ValueKind};

pub use encode::{encode_series, EncodedColumn};

/// One aligned feature column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    /// Habit the column was derived from
    pub habit_id: i64,
    pub values: Vec<f64>,
}

/// Observed range of one feature, in original units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRange {
    pub min: f64,
    pub max: f64,
}

/// Aligned, gap-free tabular view of a target and its features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub dates: Vec<NaiveDate>,
    pub target_name: String,
    pub target_kind: ValueKind,
    pub target: Vec<f64>,
    pub features: Vec<FeatureColumn>,
}

impl Dataset {
    pub fn n_rows(&self) -> usize {
        self.dates.len()
    }

    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    pub fn feature_names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn feature(&self, name: &str) -> Option<&FeatureColumn> {
        self.features.iter().find(|f| f.name == name)
    }

    /// Every column must hold exactly one value per date.
    pub fn check_shape(&self) -> Result<()> {
        let n = self.n_rows();
        if self.target.len() != n {
            return Err(CoreError::modeling(format!(
                "target '{}' has {} values for {n} dates",
                self.target_name,
                self.target.len()
            )));
        }
        if let Some(f) = self.features.iter().find(|f| f.values.len() != n) {
            return Err(CoreError::modeling(format!(
                "feature '{}' has {} values for {n} dates",
                f.name,
                f.values.len()
            )));
        }
        Ok(())
    }

    /// Feature values of one row, in column order.
    pub fn row(&self, index: usize) -> Vec<f64> {
        self.features.iter().map(|f| f.values[index]).collect()
    }

    /// Row-major feature matrix.
    pub fn rows(&self) -> Vec<Vec<f64>> {
        (0..self.n_rows()).map(|i| self.row(i)).collect()
    }

    /// Per-feature `[min, max]` over all rows.
    pub fn feature_ranges(&self) -> Vec<FeatureRange> {
        self.features
            .iter()
            .map(|f| {
                let (min, max) = f
                    .values
                    .iter()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                        (lo.min(v), hi.max(v))
                    });
                FeatureRange { min, max }
            })
            .collect()
    }
}

/// Align a target and its features into a [`Dataset`].
///
/// # Errors
///
/// - `InsufficientData` if the target or any feature has no observations.
/// - `InvalidConfiguration` for a categorical target, non-numeric values in
///   a numeric habit, or two feature columns with the same name.
pub fn assemble(target: &HabitSeries, features: &[HabitSeries]) -> Result<Dataset> {
    if target.is_empty() {
        return Err(CoreError::InsufficientData(format!(
            "target habit '{}' has no observations",
            target.name
        )));
    }
    if target.value_kind == ValueKind::Categorical {
        return Err(CoreError::InvalidConfiguration(format!(
            "target habit '{}' is categorical; only numeric and boolean targets can be modeled",
            target.name
        )));
    }

    let target_column = encode_series(target)?
        .pop()
        .ok_or_else(|| CoreError::InsufficientData("target produced no column".into()))?;

    let mut columns: Vec<EncodedColumn> = Vec::new();
    let mut names = HashSet::new();
    for series in features {
        for column in encode_series(series)? {
            if !names.insert(column.name.clone()) {
                return Err(CoreError::InvalidConfiguration(format!(
                    "duplicate feature column '{}'",
                    column.name
                )));
            }
            columns.push(column);
        }
    }

    let axis: Vec<NaiveDate> = std::iter::once(&target_column)
        .chain(columns.iter())
        .flat_map(|c| c.values.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let target_values = fill_gaps(&reindex(&target_column.values, &axis))
        .ok_or_else(|| CoreError::InsufficientData("target column is entirely missing".into()))?;

    let features = columns
        .into_iter()
        .map(|column| {
            let values = fill_gaps(&reindex(&column.values, &axis)).ok_or_else(|| {
                CoreError::InsufficientData(format!(
                    "feature column '{}' is entirely missing",
                    column.name
                ))
            })?;
            Ok(FeatureColumn {
                name: column.name,
                habit_id: column.habit_id,
                values,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        target = %target.name,
        rows = axis.len(),
        columns = features.len(),
        "assembled dataset"
    );

    Ok(Dataset {
        dates: axis,
        target_name: target.name.clone(),
        target_kind: target.value_kind,
        target: target_values,
        features,
    })
}

fn reindex(values: &BTreeMap<NaiveDate, f64>, axis: &[NaiveDate]) -> Vec<Option<f64>> {
    axis.iter().map(|d| values.get(d).copied()).collect()
}

/// Forward-fill then backward-fill. `None` if nothing is known at all.
pub fn fill_gaps(column: &[Option<f64>]) -> Option<Vec<f64>> {
    let first_known = column.iter().find_map(|v| *v)?;

    let mut last = first_known;
    Some(
        column
            .iter()
            .map(|v| {
                if let Some(v) = v {
                    last = *v;
                }
                last
            })
            .collect(),
    )
}
