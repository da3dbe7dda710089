//! Model training on an assembled [`Dataset`].
//!
//! Rows are split 80/20 with a fixed seed, features are standardized on the
//! training rows only, and one of three algorithm families is fitted:
//!
//! | Algorithm      | Regression               | Classification           |
//! |----------------|--------------------------|--------------------------|
//! | `TreeEnsemble` | random forest (mean)     | random forest (vote)     |
//! | `SupportVector`| Gaussian C-SVR           | Gaussian C-SVC           |
//! | `Linear`       | least squares            | logistic regression      |
//!
//! The support vector and linear families are fitted with linfa. Only the
//! tree ensemble reports per-feature importance.

pub mod forest;
pub mod linear;
pub mod metrics;
pub mod scaler;
pub mod split;
pub mod svm;

use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::TrainingConfig;
use crate::dataset::Dataset;
use crate::error::{ensure_finite, CoreError, Result};
use crate::habit::ValueKind;

pub use forest::{ForestParams, MaxFeatures, RandomForest};
pub use linear::{LeastSquares, LogisticClassifier, LogisticParams};
pub use scaler::StandardScaler;
pub use split::{train_test_split, TrainTestSplit};
pub use svm::{SupportVectorMachine, SvmParams};

/// Capability every fitted estimator offers on scaled rows.
pub trait Predictor {
    fn predict(&self, row: &[f64]) -> f64;

    /// Per-feature importance, when the algorithm has a notion of it.
    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }
}

/// Algorithm family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    #[default]
    TreeEnsemble,
    SupportVector,
    Linear,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::TreeEnsemble => "tree_ensemble",
            Algorithm::SupportVector => "support_vector",
            Algorithm::Linear => "linear",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = CoreError;

    /// Accepts the canonical names and the product's historical aliases
    /// (`random_forest`, `svm`, `linear_regression`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "tree_ensemble" | "random_forest" => Ok(Algorithm::TreeEnsemble),
            "support_vector" | "svm" => Ok(Algorithm::SupportVector),
            "linear" | "linear_regression" | "logistic_regression" => Ok(Algorithm::Linear),
            other => Err(CoreError::InvalidConfiguration(format!(
                "unknown algorithm '{other}'"
            ))),
        }
    }
}

/// Regression or classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemKind {
    Regression,
    Classification,
}

impl ProblemKind {
    /// Boolean targets are classified; numeric targets are regressed.
    pub fn for_target(kind: ValueKind) -> Result<Self> {
        match kind {
            ValueKind::Boolean => Ok(ProblemKind::Classification),
            ValueKind::Numeric => Ok(ProblemKind::Regression),
            ValueKind::Categorical => Err(CoreError::InvalidConfiguration(
                "categorical targets cannot be modeled".into(),
            )),
        }
    }
}

impl FromStr for ProblemKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regression" => Ok(ProblemKind::Regression),
            "classification" => Ok(ProblemKind::Classification),
            other => Err(CoreError::InvalidConfiguration(format!(
                "unknown problem kind '{other}'"
            ))),
        }
    }
}

/// Row-major rows as an ndarray record matrix.
pub(crate) fn records(rows: &[Vec<f64>]) -> Result<Array2<f64>> {
    let n_features = rows.first().map_or(0, Vec::len);
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), n_features), flat)
        .map_err(|e| CoreError::modeling_with("rows do not form a matrix", e))
}

/// One row as a 1 x d record matrix.
pub(crate) fn single_row(row: &[f64]) -> Array2<f64> {
    Array1::from_vec(row.to_vec()).insert_axis(Axis(0))
}

/// Fitted estimator, one variant per algorithm family.
#[derive(Debug, Clone)]
pub enum Estimator {
    Forest(RandomForest),
    SupportVector(SupportVectorMachine),
    LeastSquares(LeastSquares),
    Logistic(LogisticClassifier),
}

impl Predictor for Estimator {
    fn predict(&self, row: &[f64]) -> f64 {
        match self {
            Estimator::Forest(m) => m.predict(row),
            Estimator::SupportVector(m) => m.predict(row),
            Estimator::LeastSquares(m) => m.predict(row),
            Estimator::Logistic(m) => m.predict(row),
        }
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        match self {
            Estimator::Forest(m) => m.feature_importances(),
            Estimator::SupportVector(m) => m.feature_importances(),
            Estimator::LeastSquares(m) => m.feature_importances(),
            Estimator::Logistic(m) => m.feature_importances(),
        }
    }
}

/// A fitted model with its scaler and held-out score.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub problem_kind: ProblemKind,
    pub algorithm: Algorithm,
    pub feature_names: Vec<String>,
    /// Accuracy in [0, 1] for classification; R²-style score in (-inf, 1]
    /// for regression.
    pub test_score: f64,
    pub train_rows: usize,
    pub test_rows: usize,
    estimator: Estimator,
    scaler: StandardScaler,
}

impl TrainedModel {
    /// Predict from a row in original feature units.
    pub fn predict(&self, row: &[f64]) -> f64 {
        self.estimator.predict(&self.scaler.transform(row))
    }

    /// Predict from an already standardized row.
    pub fn predict_scaled(&self, row: &[f64]) -> f64 {
        self.estimator.predict(row)
    }

    pub fn feature_importances(&self) -> Option<Vec<f64>> {
        self.estimator.feature_importances()
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }

    /// Negative regression scores mean the model loses to the mean.
    pub fn is_reliable(&self) -> bool {
        match self.problem_kind {
            ProblemKind::Regression => self.test_score >= 0.0,
            ProblemKind::Classification => true,
        }
    }
}

/// Fit `algorithm` on `dataset` and score it on held-out rows.
///
/// # Errors
///
/// - `InsufficientData` when the dataset has fewer than `config.min_rows`
///   rows or no feature columns.
/// - `InvalidConfiguration` when classification is requested for a
///   non-boolean target.
/// - `InsufficientData` when classifying and the training rows hold a single
///   class.
/// - `ModelingFailure` when the dataset columns differ in length, or fitting
///   or scoring produces no usable number.
pub fn train(
    dataset: &Dataset,
    algorithm: Algorithm,
    problem_kind: ProblemKind,
    config: &TrainingConfig,
) -> Result<TrainedModel> {
    dataset.check_shape()?;
    let n_rows = dataset.n_rows();
    if n_rows < config.min_rows {
        return Err(CoreError::InsufficientData(format!(
            "{n_rows} rows available, at least {} required to train",
            config.min_rows
        )));
    }
    if dataset.n_features() == 0 {
        return Err(CoreError::InsufficientData(
            "dataset has no feature columns".into(),
        ));
    }
    if problem_kind == ProblemKind::Classification && dataset.target_kind != ValueKind::Boolean {
        return Err(CoreError::InvalidConfiguration(format!(
            "classification requires a boolean target, '{}' is {}",
            dataset.target_name, dataset.target_kind
        )));
    }

    let split = train_test_split(n_rows, config.test_ratio, config.seed);
    let rows = dataset.rows();
    let pick = |idx: &[usize]| -> (Vec<Vec<f64>>, Vec<f64>) {
        idx.iter()
            .map(|&i| (rows[i].clone(), dataset.target[i]))
            .unzip()
    };
    let (x_train, y_train) = pick(&split.train);
    let (x_test, y_test) = pick(&split.test);

    let scaler = StandardScaler::fit(&x_train);
    let x_train = scaler.transform_rows(&x_train);
    let x_test = scaler.transform_rows(&x_test);

    debug!(
        %algorithm,
        train = x_train.len(),
        test = x_test.len(),
        features = dataset.n_features(),
        "fitting model"
    );

    let classify = problem_kind == ProblemKind::Classification;
    if classify && y_train.iter().all(|&y| (y > 0.5) == (y_train[0] > 0.5)) {
        return Err(CoreError::InsufficientData(format!(
            "training rows for '{}' contain a single class",
            dataset.target_name
        )));
    }
    let mut rng = Mcg128Xsl64::seed_from_u64(config.seed);
    let estimator = match algorithm {
        Algorithm::TreeEnsemble => {
            let params = ForestParams {
                n_estimators: config.n_estimators,
                max_depth: config.max_depth,
                min_samples_leaf: config.min_samples_leaf,
                max_features: if classify {
                    MaxFeatures::Sqrt
                } else {
                    MaxFeatures::All
                },
            };
            Estimator::Forest(RandomForest::fit(
                &x_train, &y_train, &params, classify, &mut rng,
            ))
        }
        Algorithm::SupportVector => Estimator::SupportVector(SupportVectorMachine::fit(
            &x_train,
            &y_train,
            &SvmParams::default(),
            classify,
        )?),
        Algorithm::Linear if classify => Estimator::Logistic(LogisticClassifier::fit(
            &x_train,
            &y_train,
            &LogisticParams::default(),
        )?),
        Algorithm::Linear => Estimator::LeastSquares(LeastSquares::fit(&x_train, &y_train)?),
    };

    let predicted: Vec<f64> = x_test
        .iter()
        .map(|r| ensure_finite(estimator.predict(r), "test prediction"))
        .collect::<Result<_>>()?;

    let test_score = if classify {
        metrics::accuracy(&y_test, &predicted)?
    } else {
        metrics::r2_score(&y_test, &predicted)?
    };

    if problem_kind == ProblemKind::Regression && test_score < 0.0 {
        warn!(
            %algorithm,
            test_score,
            "model scores below the mean baseline; treat its suggestions as unreliable"
        );
    }
    info!(%algorithm, ?problem_kind, test_score, "model trained");

    Ok(TrainedModel {
        problem_kind,
        algorithm,
        feature_names: dataset.features.iter().map(|f| f.name.clone()).collect(),
        test_score,
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        estimator,
        scaler,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::FeatureColumn;
    use chrono::NaiveDate;

    fn linear_dataset(n: usize) -> Dataset {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let xs: Vec<f64> = (0..n).map(|i| i as f64).collect();
        Dataset {
            dates: (0..n)
                .map(|i| start + chrono::Duration::days(i as i64))
                .collect(),
            target_name: "Focus score".into(),
            target_kind: ValueKind::Numeric,
            target: xs.iter().map(|x| 1.0 + 0.5 * x).collect(),
            features: vec![FeatureColumn {
                name: "Sleep hours".into(),
                habit_id: 2,
                values: xs,
            }],
        }
    }

    #[test]
    fn algorithm_names_and_aliases() {
        assert_eq!("random_forest".parse::<Algorithm>().unwrap(), Algorithm::TreeEnsemble);
        assert_eq!("SVM".parse::<Algorithm>().unwrap(), Algorithm::SupportVector);
        assert_eq!("linear-regression".parse::<Algorithm>().unwrap(), Algorithm::Linear);
        assert!(matches!(
            "gradient_boosting".parse::<Algorithm>(),
            Err(CoreError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn problem_kind_follows_target() {
        assert_eq!(
            ProblemKind::for_target(ValueKind::Boolean).unwrap(),
            ProblemKind::Classification
        );
        assert_eq!(
            ProblemKind::for_target(ValueKind::Numeric).unwrap(),
            ProblemKind::Regression
        );
        assert!(ProblemKind::for_target(ValueKind::Categorical).is_err());
    }

    #[test]
    fn three_rows_is_insufficient() {
        let err = train(
            &linear_dataset(3),
            Algorithm::TreeEnsemble,
            ProblemKind::Regression,
            &TrainingConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientData(_)));
    }

    #[test]
    fn classification_needs_boolean_target() {
        let err = train(
            &linear_dataset(20),
            Algorithm::Linear,
            ProblemKind::Classification,
            &TrainingConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfiguration(_)));
    }

    #[test]
    fn linear_fit_scores_perfectly() {
        let model = train(
            &linear_dataset(20),
            Algorithm::Linear,
            ProblemKind::Regression,
            &TrainingConfig::default(),
        )
        .unwrap();
        assert_eq!(model.train_rows, 16);
        assert_eq!(model.test_rows, 4);
        assert!(model.test_score > 0.999);
        assert!(model.is_reliable());
        assert!(model.feature_importances().is_none());
        assert!((model.predict(&[10.0]) - 6.0).abs() < 1e-6);
    }

    #[test]
    fn every_algorithm_uses_same_contract() {
        let ds = linear_dataset(30);
        for algorithm in [Algorithm::TreeEnsemble, Algorithm::SupportVector, Algorithm::Linear] {
            let model = train(&ds, algorithm, ProblemKind::Regression, &TrainingConfig::default())
                .unwrap();
            assert_eq!(model.algorithm, algorithm);
            assert!(model.test_score <= 1.0);
            assert_eq!(model.feature_names, vec!["Sleep hours".to_string()]);
        }
    }

    #[test]
    fn constant_target_cannot_be_scored() {
        let mut ds = linear_dataset(20);
        ds.target = vec![4.0; 20];
        let err = train(&ds, Algorithm::TreeEnsemble, ProblemKind::Regression, &TrainingConfig::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::ModelingFailure { .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn training_is_deterministic() {
        let ds = linear_dataset(25);
        let cfg = TrainingConfig::default();
        let a = train(&ds, Algorithm::TreeEnsemble, ProblemKind::Regression, &cfg).unwrap();
        let b = train(&ds, Algorithm::TreeEnsemble, ProblemKind::Regression, &cfg).unwrap();
        assert_eq!(a.test_score, b.test_score);
        assert_eq!(a.feature_importances(), b.feature_importances());
    }

    /// Target with no relationship to the feature, and a forest whose leaves
    /// can never split, so every prediction is a bootstrap mean of the training
    /// targets. Any constant that misses the held-out mean scores below zero.
    fn mean_only_setup() -> (Dataset, TrainingConfig) {
        let mut ds = linear_dataset(20);
        ds.target = (0..20)
            .map(|i| ((i * 7) % 11) as f64 + (i as f64).sqrt() * 0.37)
            .collect();
        let config = TrainingConfig {
            min_samples_leaf: 1000,
            ..TrainingConfig::default()
        };
        (ds, config)
    }

    #[test]
    fn below_baseline_regression_is_kept_but_flagged() {
        let (ds, config) = mean_only_setup();
        let model = train(&ds, Algorithm::TreeEnsemble, ProblemKind::Regression, &config).unwrap();
        assert!(model.test_score < 0.0, "score {}", model.test_score);
        assert!(!model.is_reliable());
    }

    #[test]
    fn classification_is_always_reliable() {
        let mut ds = linear_dataset(20);
        ds.target_kind = ValueKind::Boolean;
        ds.target = (0..20).map(|i| if i >= 10 { 1.0 } else { 0.0 }).collect();
        let model = train(&ds, Algorithm::Linear, ProblemKind::Classification, &TrainingConfig::default())
            .unwrap();
        assert!((0.0..=1.0).contains(&model.test_score));
        assert!(model.is_reliable());
    }

    #[test]
    fn single_class_training_rows_are_insufficient() {
        let mut ds = linear_dataset(20);
        ds.target_kind = ValueKind::Boolean;
        ds.target = vec![1.0; 20];
        for algorithm in [Algorithm::TreeEnsemble, Algorithm::SupportVector, Algorithm::Linear] {
            let err = train(&ds, algorithm, ProblemKind::Classification, &TrainingConfig::default())
                .unwrap_err();
            assert!(matches!(err, CoreError::InsufficientData(_)), "{algorithm}: {err}");
        }
    }

    #[test]
    fn ragged_dataset_is_a_modeling_failure() {
        let mut short_feature = linear_dataset(20);
        short_feature.features[0].values.truncate(12);
        let err = train(
            &short_feature,
            Algorithm::Linear,
            ProblemKind::Regression,
            &TrainingConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ModelingFailure { .. }));

        let mut short_target = linear_dataset(20);
        short_target.target.truncate(15);
        let err = train(
            &short_target,
            Algorithm::TreeEnsemble,
            ProblemKind::Regression,
            &TrainingConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ModelingFailure { .. }));
    }
}
