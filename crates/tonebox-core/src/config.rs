use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const DEFAULT_GRAIN_SEED: u64 = 42;

/// Engine settings shared by every image in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for the grain noise generator. The same seed, image, and spec
    /// always produce the same output.
    pub grain_seed: u64,
    /// Fail on operation names the pipeline does not know instead of
    /// skipping them with a warning.
    pub reject_unknown_operations: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grain_seed: DEFAULT_GRAIN_SEED,
            reject_unknown_operations: false,
        }
    }
}

impl EngineConfig {
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        Ok(config)
    }
}
