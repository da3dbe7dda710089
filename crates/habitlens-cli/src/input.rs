//! Habit history and config loading shared by the commands.

use std::path::Path;

use habitlens_core::{CoreError, EngineConfig, HabitSeries};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// JSON export of tracked habits.
///
/// ```json
/// { "habits": [ { "id": 1, "name": "Slept well", "value_kind": "boolean",
///                 "observations": [ { "date": "2024-03-01", "value": "yes" } ] } ] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitFile {
    pub habits: Vec<HabitSeries>,
}

impl HabitFile {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        let file: HabitFile = serde_json::from_str(&content)
            .map_err(|e| format!("cannot parse {}: {e}", path.display()))?;
        debug!(path = %path.display(), habits = file.habits.len(), "loaded habit file");
        Ok(file)
    }

    pub fn habit(&self, id: i64) -> Result<&HabitSeries, CoreError> {
        self.habits
            .iter()
            .find(|h| h.habit_id == id)
            .ok_or_else(|| CoreError::NotFound(format!("habit id {id}")))
    }

    /// The listed habits, or every habit except `target` when none are listed.
    pub fn features(&self, target: i64, ids: &[i64]) -> Result<Vec<HabitSeries>, CoreError> {
        if ids.is_empty() {
            return Ok(self
                .habits
                .iter()
                .filter(|h| h.habit_id != target)
                .cloned()
                .collect());
        }
        ids.iter().map(|&id| self.habit(id).cloned()).collect()
    }
}

/// Load the config at `path`, or the default location when none is given.
///
/// An explicit path that does not exist yet yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, CoreError> {
    match path {
        Some(path) if path.exists() => EngineConfig::load_from(path),
        Some(_) => Ok(EngineConfig::default()),
        None => EngineConfig::load(),
    }
}

pub fn save_config(config: &EngineConfig, path: Option<&Path>) -> Result<(), CoreError> {
    match path {
        Some(path) => config.save_to(path),
        None => config.save(),
    }
}
