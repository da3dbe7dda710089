//! Schedule command for CLI.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::Args;
use habitlens_core::{AnalysisRequest, HabitConstraint, HabitEngine, HabitMeta};

use crate::input::{load_config, HabitFile};

#[derive(Args)]
pub struct ScheduleArgs {
    /// Habit history JSON file
    #[arg(long)]
    pub input: PathBuf,
    /// Target habit id
    #[arg(long)]
    pub target: i64,
    /// Constraint as ID:MIN:MAX; leave a bound empty to omit it (e.g. 3::45)
    #[arg(long = "constraint", value_parser = parse_constraint)]
    pub constraints: Vec<(i64, HabitConstraint)>,
    /// Train a model on the history and attach its prediction
    #[arg(long)]
    pub with_model: bool,
    /// Seed for the illustrative prediction and the model search
    #[arg(long)]
    pub seed: Option<u64>,
    /// Print a plain-text plan instead of JSON
    #[arg(long)]
    pub text: bool,
}

pub fn run(args: ScheduleArgs, config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let engine = HabitEngine::new(load_config(config)?);
    let file = HabitFile::load(&args.input)?;

    let habits: Vec<HabitMeta> = file.habits.iter().map(|h| h.meta()).collect();
    let constraints: BTreeMap<i64, HabitConstraint> = args.constraints.into_iter().collect();

    let recommendation = if args.with_model {
        let target = file.habit(args.target)?;
        let features = file.features(args.target, &[])?;
        let request = AnalysisRequest {
            seed: args.seed,
            ..Default::default()
        };
        Some(engine.analyze(target, &features, &request)?.recommendation)
    } else {
        None
    };

    let schedule = engine.schedule(
        args.target,
        &constraints,
        &habits,
        recommendation.as_ref(),
        args.seed,
    )?;

    if args.text {
        print!("{schedule}");
    } else {
        println!("{}", serde_json::to_string_pretty(&schedule)?);
    }
    Ok(())
}

fn parse_constraint(raw: &str) -> Result<(i64, HabitConstraint), String> {
    let parts: Vec<&str> = raw.split(':').collect();
    let [id, min, max] = parts.as_slice() else {
        return Err(format!("expected ID:MIN:MAX, got '{raw}'"));
    };
    let id = id
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid habit id '{id}': {e}"))?;
    let bound = |s: &str| -> Result<Option<f64>, String> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(None);
        }
        s.parse::<f64>()
            .map(Some)
            .map_err(|e| format!("invalid bound '{s}': {e}"))
    };
    Ok((
        id,
        HabitConstraint {
            min: bound(min)?,
            max: bound(max)?,
        },
    ))
}
