//! Config loading: deserializes the two fixed-shape JSON files the build
//! reads, plus a small CLI/env-sourced settings bundle resolved once at
//! startup.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ForgeError, Result};

/// `data/data-global.json`. Immutable once loaded.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfig {
    pub game_random_salt: String,
    pub level_count: usize,
    pub hint_thresholds: Vec<usize>,
    pub unlocked_levels: usize,
    pub languages: Vec<String>,
}

impl GlobalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.level_count == 0 {
            return Err(ForgeError::Config("levelCount must be > 0".into()));
        }
        if self.languages.is_empty() {
            return Err(ForgeError::Config("languages must be non-empty".into()));
        }
        for (i, &k) in self.hint_thresholds.iter().enumerate() {
            if k < 2 {
                return Err(ForgeError::Config(format!(
                    "hintThresholds[{i}] = {k} must be >= 2"
                )));
            }
            if k > self.level_count {
                return Err(ForgeError::Config(format!(
                    "hintThresholds[{i}] = {k} exceeds levelCount {}",
                    self.level_count
                )));
            }
        }
        Ok(())
    }
}

/// One row of `data/data-keys.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRecord {
    pub public_key: String,
    pub private_key: String,
}

pub fn load_global_config(data_dir: &Path) -> Result<GlobalConfig> {
    let path = data_dir.join("data-global.json");
    let bytes = std::fs::read(&path)
        .map_err(|e| ForgeError::Config(format!("reading {}: {e}", path.display())))?;
    let config: GlobalConfig = serde_json::from_slice(&bytes)
        .map_err(|e| ForgeError::Config(format!("parsing {}: {e}", path.display())))?;
    config.validate()?;
    Ok(config)
}

pub fn load_key_records(data_dir: &Path) -> Result<Vec<KeyRecord>> {
    let path = data_dir.join("data-keys.json");
    let bytes = std::fs::read(&path)
        .map_err(|e| ForgeError::Config(format!("reading {}: {e}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ForgeError::Config(format!("parsing {}: {e}", path.display())))
}

/// Root-level settings threaded through every pipeline stage: paths and
/// URLs resolved once at startup.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub data_dir: PathBuf,
    pub template_dir: PathBuf,
    pub output_dir: PathBuf,
    pub csv_base_url: Option<String>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        BuildSettings {
            data_dir: PathBuf::from("data"),
            template_dir: PathBuf::from("base-html"),
            output_dir: PathBuf::from("generated-html"),
            csv_base_url: None,
        }
    }
}
