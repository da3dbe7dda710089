//! # HabitLens Core Library
//!
//! This library provides the analysis engine behind HabitLens: it learns how
//! tracked habits relate to a chosen target habit and suggests settings that
//! push the target in the desired direction. The `habitlens-cli` binary is a
//! thin driver over the same library.
//!
//! ## Architecture
//!
//! - **Dataset**: encodes habit series into numeric columns and aligns them
//!   on a shared, gap-filled date axis
//! - **Model**: tree ensemble, support vector and linear/logistic estimators
//!   behind one training contract, scored on a held-out split
//! - **Recommend**: random search over observed feature ranges for the best
//!   predicted target
//! - **Schedule**: template-based daily plan shaped by per-habit constraints
//!
//! ## Key Components
//!
//! - [`HabitEngine`]: Per-call pipeline facade
//! - [`Dataset`]: Aligned target and feature matrix
//! - [`TrainedModel`]: Fitted estimator with its scaler and test score
//! - [`EngineConfig`]: TOML configuration
//!
//! Every call is self-contained; nothing is cached between calls.

pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod habit;
pub mod model;
pub mod recommend;
pub mod schedule;

pub use config::{EngineConfig, ScheduleConfig, SearchConfig, TrainingConfig};
pub use dataset::{assemble, Dataset, FeatureColumn, FeatureRange};
pub use engine::{Analysis, AnalysisRequest, HabitEngine, ModelSummary};
pub use error::{ConfigError, CoreError, Result};
pub use habit::{HabitMeta, HabitSeries, Observation, ValueKind};
pub use model::{train, Algorithm, Predictor, ProblemKind, TrainedModel};
pub use recommend::{recommend, Direction, RankedFeature, Recommendation};
pub use schedule::{
    default_template, resolve_constraint, HabitConstraint, HabitKey, PlanEntry, PredictionBasis,
    ResolvedValue, Schedule, SchedulePrediction, ScheduleSynthesizer, TemplateEntry,
};
