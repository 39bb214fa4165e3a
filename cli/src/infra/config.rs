//! Loading `StageConfig` from YAML.

use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::config::StageConfig;

/// Load staging configuration from `path`, or defaults when no path is given.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_stage_config(path: Option<&Path>) -> Result<StageConfig> {
    let Some(path) = path else {
        return Ok(StageConfig::default());
    };
    let content =
        std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
}
