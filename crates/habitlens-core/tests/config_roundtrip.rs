//! Config persistence tests against a temporary directory.

use habitlens_core::{ConfigError, CoreError, EngineConfig, TemplateEntry};
use indoc::indoc;

#[test]
fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let mut cfg = EngineConfig::default();
    cfg.set("training.n_estimators", "40").unwrap();
    cfg.set("search.seed", "123").unwrap();
    cfg.schedule.template = vec![TemplateEntry::new("05:30", "Run", "5 km")];
    cfg.save_to(&path).unwrap();

    let loaded = EngineConfig::load_from(&path).unwrap();
    assert_eq!(loaded, cfg);
    assert_eq!(loaded.get("search.seed").as_deref(), Some("123"));
}

#[test]
fn hand_written_file_is_validated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        indoc! {r#"
            [training]
            test_ratio = 0.0
        "#},
    )
    .unwrap();

    let err = EngineConfig::load_from(&path).unwrap_err();
    assert!(matches!(
        err,
        CoreError::Config(ConfigError::InvalidValue { ref key, .. }) if key == "training.test_ratio"
    ));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[training\nseed = ").unwrap();

    assert!(matches!(
        EngineConfig::load_from(&path),
        Err(CoreError::Config(ConfigError::ParseFailed(_)))
    ));
}

#[test]
fn missing_file_is_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        EngineConfig::load_from(&dir.path().join("absent.toml")),
        Err(CoreError::Config(ConfigError::LoadFailed { .. }))
    ));
}
