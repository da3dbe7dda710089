//! Held-out quality scores.

use crate::error::{ensure_finite, CoreError, Result};

/// Fraction of exact label matches.
pub fn accuracy(truth: &[f64], predicted: &[f64]) -> Result<f64> {
    if truth.is_empty() || truth.len() != predicted.len() {
        return Err(CoreError::modeling(format!(
            "cannot score {} predictions against {} labels",
            predicted.len(),
            truth.len()
        )));
    }
    let hits = truth
        .iter()
        .zip(predicted)
        .filter(|(t, p)| (*t - *p).abs() < 0.5)
        .count();
    Ok(hits as f64 / truth.len() as f64)
}

pub fn mean_squared_error(truth: &[f64], predicted: &[f64]) -> f64 {
    let n = truth.len().max(1) as f64;
    truth
        .iter()
        .zip(predicted)
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / n
}

/// `1 - MSE / Var(truth)`. Negative when worse than predicting the mean.
///
/// A constant test target has no variance to explain, so the score is
/// undefined and reported as a modeling failure.
pub fn r2_score(truth: &[f64], predicted: &[f64]) -> Result<f64> {
    if truth.is_empty() || truth.len() != predicted.len() {
        return Err(CoreError::modeling(format!(
            "cannot score {} predictions against {} targets",
            predicted.len(),
            truth.len()
        )));
    }
    let n = truth.len() as f64;
    let mean = truth.iter().sum::<f64>() / n;
    let variance = truth.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / n;
    if variance <= f64::EPSILON {
        return Err(CoreError::modeling(
            "test target has zero variance; regression score is undefined",
        ));
    }
    ensure_finite(
        1.0 - mean_squared_error(truth, predicted) / variance,
        "regression score",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_counts_matches() {
        let acc = accuracy(&[1.0, 0.0, 1.0, 1.0], &[1.0, 1.0, 1.0, 0.0]).unwrap();
        assert_eq!(acc, 0.5);
    }

    #[test]
    fn r2_perfect_and_negative() {
        assert_eq!(r2_score(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap(), 1.0);
        assert!(r2_score(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap() < 0.0);
    }

    #[test]
    fn r2_constant_target_is_failure() {
        let err = r2_score(&[2.0, 2.0], &[2.0, 2.0]).unwrap_err();
        assert!(matches!(err, CoreError::ModelingFailure { .. }));
    }
}
