//! Recommendation search over a trained model.
//!
//! The model may be a forest or a kernel machine, neither of which is
//! differentiable, so the search is zeroth-order: draw feature settings
//! uniformly inside each feature's observed range, score them all, keep the
//! best. The random source is passed in by the caller so each call owns its
//! own sequence and tests can seed it.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::{ensure_finite, CoreError, Result};
use crate::model::TrainedModel;

/// Whether to seek the highest or the lowest predicted target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Maximize,
    Minimize,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Maximize => "maximize",
            Direction::Minimize => "minimize",
        }
    }

    /// Strictly better, so earlier samples win ties.
    fn improves(&self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Direction::Maximize => candidate > incumbent,
            Direction::Minimize => candidate < incumbent,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "maximize" | "max" => Ok(Direction::Maximize),
            "minimize" | "min" => Ok(Direction::Minimize),
            other => Err(CoreError::InvalidConfiguration(format!(
                "unknown optimization direction '{other}'"
            ))),
        }
    }
}

/// One feature of the winning setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedFeature {
    /// Habit the feature column came from
    pub habit_id: i64,
    pub name: String,
    /// Suggested value in original units
    pub suggested_value: f64,
    /// Suggested value rounded for display
    pub display_value: String,
    pub importance: f64,
}

/// Best feature setting found and how much each feature matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub direction: Direction,
    /// Model output at the suggested setting
    pub predicted_value: f64,
    /// Mean feature importance. A coarse proxy, not a confidence interval.
    pub confidence: f64,
    pub ranked_features: Vec<RankedFeature>,
    pub explanation: String,
}

/// Search `samples` random feature settings for the best predicted target.
///
/// # Errors
///
/// - `InvalidConfiguration` if `samples` is zero or the model was trained
///   on different feature columns than `dataset` holds.
/// - `ModelingFailure` if the model produces a non-finite prediction.
pub fn recommend<R: Rng + ?Sized>(
    model: &TrainedModel,
    dataset: &Dataset,
    direction: Direction,
    samples: usize,
    rng: &mut R,
) -> Result<Recommendation> {
    if samples == 0 {
        return Err(CoreError::InvalidConfiguration(
            "recommendation search needs at least one sample".into(),
        ));
    }
    dataset.check_shape()?;
    let names = dataset.feature_names();
    if model.feature_names.iter().map(String::as_str).ne(names.iter().copied()) {
        return Err(CoreError::InvalidConfiguration(
            "model was trained on different feature columns than the dataset".into(),
        ));
    }

    let ranges = dataset.feature_ranges();
    let scaler = model.scaler();

    let mut best: Option<(Vec<f64>, f64)> = None;
    for _ in 0..samples {
        let raw: Vec<f64> = ranges
            .iter()
            .map(|r| r.min + rng.gen::<f64>() * (r.max - r.min))
            .collect();
        let scaled = scaler.transform(&raw);
        let predicted = ensure_finite(model.predict_scaled(&scaled), "search prediction")?;

        let better = best
            .as_ref()
            .map_or(true, |(_, incumbent)| direction.improves(predicted, *incumbent));
        if better {
            best = Some((scaled, predicted));
        }
    }
    let (scaled, predicted_value) =
        best.ok_or_else(|| CoreError::modeling("search produced no candidates"))?;
    let suggested = scaler.inverse_transform(&scaled);

    let n = dataset.n_features();
    let importances = model
        .feature_importances()
        .filter(|imp| imp.len() == n)
        .unwrap_or_else(|| vec![1.0 / n as f64; n]);
    let confidence = ensure_finite(
        importances.iter().sum::<f64>() / n as f64,
        "recommendation confidence",
    )?;

    let mut ranked_features: Vec<RankedFeature> = dataset
        .features
        .iter()
        .zip(&importances)
        .zip(&suggested)
        .map(|((column, &importance), &value)| RankedFeature {
            habit_id: column.habit_id,
            name: column.name.clone(),
            suggested_value: value,
            display_value: format!("{value:.2}"),
            importance,
        })
        .collect();
    // Stable: equal importances keep column order.
    ranked_features.sort_by(|a, b| b.importance.total_cmp(&a.importance));

    debug!(
        %direction,
        samples,
        predicted_value,
        top = ranked_features.first().map(|f| f.name.as_str()).unwrap_or(""),
        "recommendation search finished"
    );

    Ok(Recommendation {
        direction,
        predicted_value,
        confidence,
        ranked_features,
        explanation: explanation(direction, model),
    })
}

fn explanation(direction: Direction, model: &TrainedModel) -> String {
    let mut text = format!(
        "Based on your historical data, we've identified the optimal habit settings to {direction} your target variable."
    );
    if !model.is_reliable() {
        text.push_str(&format!(
            " The model scored {:.2} on held-out days, worse than always predicting the average, so treat these settings as unreliable.",
            model.test_score
        ));
    }
    text
}
