use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::drafts::DEFAULT_AUTOSAVE_SECS;
use crate::error::TripwizError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Owner recorded on reserved trips.
    #[serde(default = "default_owner")]
    pub owner: String,
    #[serde(default = "default_autosave_secs")]
    pub autosave_interval_secs: u64,
}

fn default_owner() -> String {
    "me".to_string()
}

fn default_autosave_secs() -> u64 {
    DEFAULT_AUTOSAVE_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            autosave_interval_secs: default_autosave_secs(),
        }
    }
}

impl Config {
    /// Read the config file; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, TripwizError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|e| TripwizError::storage(e.to_string()))?;
        let config: Config = serde_json::from_str(&raw)
            .map_err(|e| TripwizError::validation(format!("Invalid config {}: {e}", path.display())))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), TripwizError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| TripwizError::storage(e.to_string()))?;
        }
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw).map_err(|e| TripwizError::storage(e.to_string()))
    }
}
