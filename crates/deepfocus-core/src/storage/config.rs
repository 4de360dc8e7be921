//! TOML-based application configuration.
//!
//! Stores the engine tunables:
//! - Calibration durations, cadences, and pass thresholds
//! - Quiz tolerance window, poll cadence, and rewind penalty
//! - EXP increment per completion
//!
//! Configuration is stored at `~/.config/deepfocus/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::calibration::CalibrationConfig;
use crate::progress::EXP_PER_NODE;
use crate::quiz::QuizConfig;

/// Progression-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionConfig {
    #[serde(default = "default_exp_per_node")]
    pub exp_per_node: u64,
}

fn default_exp_per_node() -> u64 {
    EXP_PER_NODE
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            exp_per_node: default_exp_per_node(),
        }
    }
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/deepfocus/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub quiz: QuizConfig,
    #[serde(default)]
    pub progression: ProgressionConfig,
}

impl Config {
    /// Path to the config file.
    pub fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults on first run.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::path()?, content)?;
        Ok(())
    }

    /// Load, falling back to defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
