//! Gaussian-kernel support vector machines fitted with linfa-svm.
//!
//! Classification uses C-SVC on boolean labels. Regression uses C-SVR with an
//! epsilon-insensitive tube on targets standardized internally, so `epsilon`
//! is measured in target standard deviations.

use linfa::prelude::*;
use linfa_svm::Svm;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::{records, single_row, Predictor};
use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmParams {
    /// Inverse regularization strength
    pub c: f64,
    /// Half-width of the regression tube, in standardized target units
    pub epsilon: f64,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            epsilon: 0.1,
        }
    }
}

#[derive(Debug, Clone)]
enum FittedSvm {
    Classifier(Svm<f64, bool>),
    Regressor {
        model: Svm<f64, f64>,
        target_mean: f64,
        target_scale: f64,
    },
}

#[derive(Debug, Clone)]
pub struct SupportVectorMachine {
    fitted: FittedSvm,
}

impl SupportVectorMachine {
    /// Fit on scaled rows. `classify` expects 0/1 targets.
    pub fn fit(
        rows: &[Vec<f64>],
        targets: &[f64],
        params: &SvmParams,
        classify: bool,
    ) -> Result<Self> {
        let x = records(rows)?;
        // Inputs are standardized, so the "scale" heuristic gamma = 1/d becomes
        // a kernel width of d in linfa's exp(-|a-b|^2 / width) form.
        let width = x.ncols().max(1) as f64;

        let fitted = if classify {
            let labels: Array1<bool> = targets.iter().map(|&t| t > 0.5).collect();
            let model = Svm::<f64, bool>::params()
                .pos_neg_weights(params.c, params.c)
                .gaussian_kernel(width)
                .fit(&Dataset::new(x, labels))
                .map_err(|e| CoreError::modeling(format!("support vector fit failed: {e}")))?;
            FittedSvm::Classifier(model)
        } else {
            let n = targets.len().max(1) as f64;
            let mean = targets.iter().sum::<f64>() / n;
            let std = (targets.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / n).sqrt();
            let scale = if std > f64::EPSILON { std } else { 1.0 };
            let y: Array1<f64> = targets.iter().map(|t| (t - mean) / scale).collect();

            let model = Svm::<f64, f64>::params()
                .c_svr(params.c, Some(params.epsilon))
                .gaussian_kernel(width)
                .fit(&Dataset::new(x, y))
                .map_err(|e| CoreError::modeling(format!("support vector fit failed: {e}")))?;
            FittedSvm::Regressor {
                model,
                target_mean: mean,
                target_scale: scale,
            }
        };
        Ok(Self { fitted })
    }

    pub fn is_classifier(&self) -> bool {
        matches!(self.fitted, FittedSvm::Classifier(_))
    }
}

impl Predictor for SupportVectorMachine {
    fn predict(&self, row: &[f64]) -> f64 {
        let x = single_row(row);
        match &self.fitted {
            FittedSvm::Classifier(model) => {
                let out: Array1<bool> = model.predict(&x);
                if out[0] {
                    1.0
                } else {
                    0.0
                }
            }
            FittedSvm::Regressor {
                model,
                target_mean,
                target_scale,
            } => {
                let out: Array1<f64> = model.predict(&x);
                out[0] * target_scale + target_mean
            }
        }
    }
}
