//! Optional `tbc.toml` configuration.
//!
//! Looked up at `--config <path>` or `<root>/tbc.toml`. A missing file means
//! defaults: no retries, embedded template assets.

use crate::core::error::TbcError;
use crate::core::stage::StagePolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "tbc.toml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RetrySettings {
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default)]
    pub wait_ms: u64,
}

impl From<RetrySettings> for StagePolicy {
    fn from(s: RetrySettings) -> Self {
        StagePolicy::new(s.max_retries, Duration::from_millis(s.wait_ms))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RetryConfig {
    #[serde(flatten)]
    pub default: RetrySettings,
    #[serde(default)]
    pub stages: BTreeMap<String, RetrySettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AssetsConfig {
    /// Directory holding `specs/` and `tools/`; replaces the embedded set.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TbcConfig {
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
}

impl TbcConfig {
    pub fn stage_policy(&self, stage: &str) -> StagePolicy {
        self.retry
            .stages
            .get(stage)
            .copied()
            .unwrap_or(self.retry.default)
            .into()
    }
}

pub fn parse_config(content: &str) -> Result<TbcConfig, TbcError> {
    toml::from_str(content).map_err(|e| TbcError::ConfigError(e.to_string()))
}

/// Loads configuration from an explicit path, else from `<root>/tbc.toml`.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<TbcConfig, TbcError> {
    let path = match explicit {
        Some(p) => {
            if !p.exists() {
                return Err(TbcError::ConfigError(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p.to_path_buf()
        }
        None => {
            let default_path = root.join(CONFIG_FILE);
            if !default_path.exists() {
                return Ok(TbcConfig::default());
            }
            default_path
        }
    };

    let content = fs::read_to_string(&path)?;
    let mut config = parse_config(&content)?;
    // Relative asset dirs are relative to the config file.
    if let (Some(dir), Some(base)) = (config.assets.dir.as_ref(), path.parent()) {
        if dir.is_relative() {
            config.assets.dir = Some(base.join(dir));
        }
    }
    log::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}
