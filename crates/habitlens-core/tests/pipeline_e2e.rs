//! End-to-end tests for the analysis pipeline.
//!
//! Covers assemble -> train -> recommend through the public API and the
//! `HabitEngine` facade, for both classification and regression targets.

use chrono::NaiveDate;
use habitlens_core::{
    assemble, recommend, train, Algorithm, AnalysisRequest, CoreError, Direction, EngineConfig,
    HabitEngine, HabitSeries, ProblemKind, TrainingConfig, ValueKind,
};
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;

fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, n).unwrap()
}

fn slept_well() -> HabitSeries {
    (1..=15).fold(
        HabitSeries::new(1, "Slept well", ValueKind::Boolean),
        |s, d| s.with_observation(day(d), if d % 2 == 0 { "true" } else { "false" }),
    )
}

fn caffeine() -> HabitSeries {
    (1..=15).fold(
        HabitSeries::new(2, "Caffeine mg", ValueKind::Numeric),
        |s, d| s.with_observation(day(d), format!("{}", 50 + (d % 2) * 100 + d)),
    )
}

#[test]
fn boolean_target_with_tree_ensemble() {
    let dataset = assemble(&slept_well(), &[caffeine()]).unwrap();
    assert_eq!(dataset.n_rows(), 15);

    let model = train(
        &dataset,
        Algorithm::TreeEnsemble,
        ProblemKind::Classification,
        &TrainingConfig::default(),
    )
    .unwrap();
    assert!((0.0..=1.0).contains(&model.test_score));
    assert_eq!(model.train_rows + model.test_rows, 15);

    let mut rng = Mcg128Xsl64::seed_from_u64(42);
    let rec = recommend(&model, &dataset, Direction::Maximize, 1000, &mut rng).unwrap();
    assert_eq!(rec.ranked_features.len(), 1);
    assert_eq!(rec.ranked_features[0].name, "Caffeine mg");
    assert_eq!(rec.ranked_features[0].habit_id, 2);
    assert!(rec.predicted_value == 0.0 || rec.predicted_value == 1.0);

    let range = dataset.feature_ranges()[0];
    let value = rec.ranked_features[0].suggested_value;
    assert!(value >= range.min - 1e-9 && value <= range.max + 1e-9);
}

#[test]
fn every_algorithm_classifies_the_same_target() {
    let dataset = assemble(&slept_well(), &[caffeine()]).unwrap();
    for algorithm in [Algorithm::TreeEnsemble, Algorithm::SupportVector, Algorithm::Linear] {
        let model = train(
            &dataset,
            algorithm,
            ProblemKind::Classification,
            &TrainingConfig::default(),
        )
        .unwrap();
        assert!(
            (0.0..=1.0).contains(&model.test_score),
            "{algorithm} scored {}",
            model.test_score
        );
    }
}

#[test]
fn three_rows_fail_with_insufficient_data() {
    let target = (1..=3).fold(HabitSeries::new(1, "Mood", ValueKind::Numeric), |s, d| {
        s.with_observation(day(d), d.to_string())
    });
    let feature = (1..=3).fold(HabitSeries::new(2, "Steps", ValueKind::Numeric), |s, d| {
        s.with_observation(day(d), (d * 1000).to_string())
    });
    let dataset = assemble(&target, &[feature]).unwrap();

    for algorithm in [Algorithm::TreeEnsemble, Algorithm::SupportVector, Algorithm::Linear] {
        let err = train(&dataset, algorithm, ProblemKind::Regression, &TrainingConfig::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientData(_)));
        assert!(err.is_recoverable());
    }
}

#[test]
fn unknown_algorithm_name_is_invalid_configuration() {
    let err = "gradient_boosting".parse::<Algorithm>().unwrap_err();
    assert!(matches!(err, CoreError::InvalidConfiguration(_)));
}

#[test]
fn engine_derives_problem_kind_from_target() {
    let engine = HabitEngine::new(EngineConfig::default());
    let request = AnalysisRequest {
        seed: Some(7),
        ..Default::default()
    };

    let analysis = engine.analyze(&slept_well(), &[caffeine()], &request).unwrap();
    assert_eq!(analysis.model_summary.problem_kind, ProblemKind::Classification);
    assert_eq!(analysis.model_summary.algorithm, Algorithm::TreeEnsemble);
    assert!(analysis.model_summary.reliable);
    assert!(analysis
        .recommendation
        .explanation
        .starts_with("Based on your historical data"));
}

#[test]
fn regression_on_mixed_feature_kinds() {
    let target = (1..=20).fold(HabitSeries::new(1, "Energy", ValueKind::Numeric), |s, d| {
        s.with_observation(day(d), format!("{}", d as f64 * 0.5))
    });
    let walked = (1..=20).fold(HabitSeries::new(2, "Walked", ValueKind::Boolean), |s, d| {
        s.with_observation(day(d), if d > 10 { "yes" } else { "no" })
    });
    let lunch = (1..=20).fold(HabitSeries::new(3, "Lunch", ValueKind::Categorical), |s, d| {
        s.with_observation(day(d), if d % 3 == 0 { "salad" } else { "pasta" })
    });

    // Lunch_pasta and Lunch_salad are exact complements, so no least squares here.
    let engine = HabitEngine::new(EngineConfig::default());
    let request = AnalysisRequest {
        algorithm: Algorithm::SupportVector,
        direction: Direction::Minimize,
        seed: Some(1),
        ..Default::default()
    };
    let analysis = engine.analyze(&target, &[walked, lunch], &request).unwrap();

    let rec = &analysis.recommendation;
    assert_eq!(rec.direction, Direction::Minimize);
    let mut names: Vec<&str> = rec.ranked_features.iter().map(|f| f.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["Lunch_pasta", "Lunch_salad", "Walked"]);
    assert!(rec
        .ranked_features
        .iter()
        .filter(|f| f.name.starts_with("Lunch_"))
        .all(|f| f.habit_id == 3));
    assert!((rec.confidence - 1.0 / 3.0).abs() < 1e-12);
}

#[test]
fn complementary_one_hot_columns_do_not_panic_linear_fit() {
    let target = (1..=20).fold(HabitSeries::new(1, "Energy", ValueKind::Numeric), |s, d| {
        s.with_observation(day(d), format!("{}", d as f64 * 0.5))
    });
    let lunch = (1..=20).fold(HabitSeries::new(3, "Lunch", ValueKind::Categorical), |s, d| {
        s.with_observation(day(d), if d % 3 == 0 { "salad" } else { "pasta" })
    });
    let dataset = assemble(&target, &[lunch]).unwrap();

    match train(&dataset, Algorithm::Linear, ProblemKind::Regression, &TrainingConfig::default()) {
        Ok(model) => assert!(model.test_score.is_finite()),
        Err(err) => assert!(matches!(err, CoreError::ModelingFailure { .. })),
    }
}
