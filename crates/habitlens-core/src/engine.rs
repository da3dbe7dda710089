//! Engine facade running the full pipeline per call.
//!
//! A [`HabitEngine`] only holds configuration. Every call builds its own
//! dataset, model and random source, so one engine can be shared across
//! threads.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::EngineConfig;
use crate::dataset::{assemble, Dataset};
use crate::error::Result;
use crate::habit::{HabitMeta, HabitSeries};
use crate::model::{train, Algorithm, ProblemKind, TrainedModel};
use crate::recommend::{recommend, Direction, Recommendation};
use crate::schedule::{HabitConstraint, HabitKey, Schedule, ScheduleSynthesizer};

/// Options for one analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub algorithm: Algorithm,
    /// Derived from the target's value kind when absent
    #[serde(default)]
    pub problem_kind: Option<ProblemKind>,
    #[serde(default)]
    pub direction: Direction,
    /// Overrides `search.seed` for this call
    #[serde(default)]
    pub seed: Option<u64>,
}

/// What was fitted and how well it scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub algorithm: Algorithm,
    pub problem_kind: ProblemKind,
    pub test_score: f64,
    pub train_rows: usize,
    pub test_rows: usize,
    /// False when a regression model loses to the mean baseline
    pub reliable: bool,
}

impl From<&TrainedModel> for ModelSummary {
    fn from(model: &TrainedModel) -> Self {
        Self {
            algorithm: model.algorithm,
            problem_kind: model.problem_kind,
            test_score: model.test_score,
            train_rows: model.train_rows,
            test_rows: model.test_rows,
            reliable: model.is_reliable(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub model_summary: ModelSummary,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, Default)]
pub struct HabitEngine {
    config: EngineConfig,
}

impl HabitEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Align `target` with `features`.
    pub fn assemble(&self, target: &HabitSeries, features: &[HabitSeries]) -> Result<Dataset> {
        assemble(target, features)
    }

    /// Fit a model with the configured training settings.
    pub fn train(
        &self,
        dataset: &Dataset,
        algorithm: Algorithm,
        problem_kind: ProblemKind,
    ) -> Result<TrainedModel> {
        train(dataset, algorithm, problem_kind, &self.config.training)
    }

    /// Assemble, train and search in one call.
    ///
    /// # Errors
    ///
    /// Propagates the errors of each stage: `InsufficientData` from assembly
    /// or training, `InvalidConfiguration` for an unusable target or problem
    /// kind, `ModelingFailure` for degenerate numbers.
    pub fn analyze(
        &self,
        target: &HabitSeries,
        features: &[HabitSeries],
        request: &AnalysisRequest,
    ) -> Result<Analysis> {
        let dataset = self.assemble(target, features)?;
        let problem_kind = match request.problem_kind {
            Some(kind) => kind,
            None => ProblemKind::for_target(target.value_kind)?,
        };
        let model = self.train(&dataset, request.algorithm, problem_kind)?;

        let mut rng = self.call_rng(request.seed);
        let recommendation = recommend(
            &model,
            &dataset,
            request.direction,
            self.config.search.samples,
            &mut rng,
        )?;

        info!(
            target = %target.name,
            features = dataset.n_features(),
            predicted = recommendation.predicted_value,
            "analysis complete"
        );

        Ok(Analysis {
            model_summary: ModelSummary::from(&model),
            recommendation,
        })
    }

    /// Build a daily plan from the configured template.
    ///
    /// Passing the [`Recommendation`] of an earlier analysis of the same
    /// target attaches its model-backed prediction to the schedule.
    pub fn schedule(
        &self,
        target: impl Into<HabitKey>,
        constraints: &BTreeMap<i64, HabitConstraint>,
        habits: &[HabitMeta],
        recommendation: Option<&Recommendation>,
        seed: Option<u64>,
    ) -> Result<Schedule> {
        let mut rng = self.call_rng(seed);
        ScheduleSynthesizer::from_config(&self.config.schedule).synthesize(
            target,
            constraints,
            habits,
            recommendation,
            &mut rng,
        )
    }

    fn call_rng(&self, seed: Option<u64>) -> Mcg128Xsl64 {
        match seed.or(self.config.search.seed) {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        }
    }
}
