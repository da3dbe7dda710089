//! Ordinary least squares and L2-regularized logistic regression, fitted with
//! linfa on the standardized training rows.

use linfa::prelude::*;
use linfa_linear::{FittedLinearRegression, LinearError, LinearRegression};
use linfa_logistic::{FittedLogisticRegression, LogisticRegression};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::{records, single_row, Predictor};
use crate::error::{CoreError, Result};

/// Least-squares fit with an intercept.
#[derive(Debug, Clone)]
pub struct LeastSquares {
    model: FittedLinearRegression<f64>,
}

impl LeastSquares {
    pub fn fit(rows: &[Vec<f64>], targets: &[f64]) -> Result<Self> {
        let dataset = Dataset::new(records(rows)?, Array1::from_vec(targets.to_vec()));
        let model = LinearRegression::default()
            .with_intercept(true)
            .fit(&dataset)
            .map_err(|e: LinearError<f64>| {
                CoreError::modeling(format!("least squares fit failed: {e}"))
            })?;
        Ok(Self { model })
    }

    pub fn weights(&self) -> Vec<f64> {
        self.model.params().to_vec()
    }

    pub fn intercept(&self) -> f64 {
        self.model.intercept()
    }
}

impl Predictor for LeastSquares {
    fn predict(&self, row: &[f64]) -> f64 {
        let out: Array1<f64> = self.model.predict(&single_row(row));
        out[0]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticParams {
    /// Inverse regularization strength
    pub c: f64,
    pub max_iterations: u64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iterations: 100,
        }
    }
}

/// Binary logistic regression on 0/1 targets.
#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    model: FittedLogisticRegression<f64, bool>,
}

impl LogisticClassifier {
    /// Fit on 0/1 targets. Both classes must be present.
    pub fn fit(rows: &[Vec<f64>], targets: &[f64], params: &LogisticParams) -> Result<Self> {
        let labels: Array1<bool> = targets.iter().map(|&t| t > 0.5).collect();
        let dataset = Dataset::new(records(rows)?, labels);
        let model = LogisticRegression::default()
            .alpha(1.0 / params.c)
            .max_iterations(params.max_iterations)
            .fit(&dataset)
            .map_err(|e| CoreError::modeling(format!("logistic regression fit failed: {e}")))?;
        Ok(Self { model })
    }

    pub fn weights(&self) -> Vec<f64> {
        self.model.params().to_vec()
    }
}

impl Predictor for LogisticClassifier {
    fn predict(&self, row: &[f64]) -> f64 {
        let out: Array1<bool> = self.model.predict(&single_row(row));
        if out[0] {
            1.0
        } else {
            0.0
        }
    }
}
