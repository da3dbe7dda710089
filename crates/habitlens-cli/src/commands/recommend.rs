//! Recommendation command for CLI.

use std::path::{Path, PathBuf};

use clap::Args;
use habitlens_core::{Algorithm, AnalysisRequest, Direction, HabitEngine, ProblemKind};

use crate::input::{load_config, HabitFile};

#[derive(Args)]
pub struct RecommendArgs {
    /// Habit history JSON file
    #[arg(long)]
    pub input: PathBuf,
    /// Target habit id
    #[arg(long)]
    pub target: i64,
    /// Feature habit id (repeatable; defaults to every other habit)
    #[arg(long = "feature")]
    pub features: Vec<i64>,
    /// tree_ensemble, support_vector or linear
    #[arg(long, default_value = "tree_ensemble")]
    pub algorithm: Algorithm,
    /// regression or classification (derived from the target when omitted)
    #[arg(long)]
    pub problem_kind: Option<ProblemKind>,
    /// maximize or minimize
    #[arg(long, default_value = "maximize")]
    pub direction: Direction,
    /// Seed for the recommendation search
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run(args: RecommendArgs, config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let engine = HabitEngine::new(load_config(config)?);
    let file = HabitFile::load(&args.input)?;

    let target = file.habit(args.target)?;
    let features = file.features(args.target, &args.features)?;
    let request = AnalysisRequest {
        algorithm: args.algorithm,
        problem_kind: args.problem_kind,
        direction: args.direction,
        seed: args.seed,
    };

    let analysis = engine.analyze(target, &features, &request)?;
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}
