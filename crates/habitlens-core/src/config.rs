//! TOML-based engine configuration.
//!
//! Holds the tunables of each pipeline stage:
//! - training split, seed, row floor and forest shape
//! - recommendation search sample count and optional seed
//! - the daily schedule template and the illustrative prediction range
//!
//! Configuration is stored at `~/.config/habitlens/config.toml`
//! (`HABITLENS_ENV=dev` selects `~/.config/habitlens-dev/`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::schedule::{default_template, TemplateEntry};

/// Dot paths of `Option<u64>` settings. Unset values are skipped when
/// serializing, so `set` cannot infer their type from the current tree.
/// Setting one to `none` clears it.
const OPTIONAL_NUMBER_KEYS: &[&str] = &["search.seed"];

/// Model training configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Share of rows held out for scoring
    #[serde(default = "default_test_ratio")]
    pub test_ratio: f64,
    /// Seed for the split and for model fitting
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Minimum assembled rows before a model is trained
    #[serde(default = "default_min_rows")]
    pub min_rows: usize,
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
}

/// Recommendation search configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Random feature settings scored per call
    #[serde(default = "default_samples")]
    pub samples: usize,
    /// Fixed seed; fresh entropy per call when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Schedule synthesis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Range for the placeholder prediction shown when no model backs a schedule
    #[serde(default = "default_illustrative_range")]
    pub illustrative_range: [f64; 2],
    #[serde(default = "default_template")]
    pub template: Vec<TemplateEntry>,
}

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/habitlens/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

// Default functions
fn default_test_ratio() -> f64 {
    0.2
}
fn default_seed() -> u64 {
    42
}
fn default_min_rows() -> usize {
    10
}
fn default_n_estimators() -> usize {
    100
}
fn default_max_depth() -> usize {
    8
}
fn default_min_samples_leaf() -> usize {
    1
}
fn default_samples() -> usize {
    1000
}
fn default_illustrative_range() -> [f64; 2] {
    [7.5, 9.5]
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_ratio: default_test_ratio(),
            seed: default_seed(),
            min_rows: default_min_rows(),
            n_estimators: default_n_estimators(),
            max_depth: default_max_depth(),
            min_samples_leaf: default_min_samples_leaf(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            samples: default_samples(),
            seed: None,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            illustrative_range: default_illustrative_range(),
            template: default_template(),
        }
    }
}

/// Returns `~/.config/habitlens[-dev]/` based on HABITLENS_ENV.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("HABITLENS_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("habitlens-dev")
    } else {
        base_dir.join("habitlens")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

impl EngineConfig {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }
        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(invalid("config key is empty".into()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| invalid("unknown config key".into()))?;
                let optional = OPTIONAL_NUMBER_KEYS.contains(&key);
                if optional && value.trim().eq_ignore_ascii_case("none") {
                    obj.remove(part);
                    return Ok(());
                }
                let new_value = match obj.get(part) {
                    Some(serde_json::Value::Bool(_)) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    Some(serde_json::Value::Number(_)) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else {
                            value
                                .parse::<f64>()
                                .ok()
                                .and_then(serde_json::Number::from_f64)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        }
                    }
                    Some(serde_json::Value::Object(_)) | Some(serde_json::Value::Array(_)) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    Some(_) => serde_json::Value::String(value.into()),
                    None if optional => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|e| invalid(e.to_string()))?
                            .into(),
                    ),
                    None => return Err(invalid("unknown config key".into())),
                };
                obj.insert(part.to_string(), new_value);
                return Ok(());
            }
            current = current
                .get_mut(part)
                .ok_or_else(|| invalid("unknown config key".into()))?;
        }
        Err(invalid("unknown config key".into()))
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    /// Load and validate a config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let cfg: EngineConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| -> Result<(), ConfigError> {
            Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            })
        };

        let t = &self.training;
        if !(t.test_ratio > 0.0 && t.test_ratio < 1.0) {
            return invalid("training.test_ratio", "must be strictly between 0 and 1");
        }
        if t.min_rows < 2 {
            return invalid("training.min_rows", "must be at least 2");
        }
        if t.n_estimators == 0 {
            return invalid("training.n_estimators", "must be positive");
        }
        if t.max_depth == 0 {
            return invalid("training.max_depth", "must be positive");
        }
        if self.search.samples == 0 {
            return invalid("search.samples", "must be positive");
        }
        let [lo, hi] = self.schedule.illustrative_range;
        if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
            return invalid("schedule.illustrative_range", "must be a finite [low, high] pair");
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. The caller decides where to persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result fails validation.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: EngineConfig = serde_json::from_value(json)?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}
