// src/config.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Column-name lists that steer which columns count as devices.
///
/// Every field has a default, so a YAML file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Name of the required timestamp column.
    pub timestamp_column: String,
    /// Literal, case-sensitive substrings; any column containing one is dropped.
    pub water_keywords: Vec<String>,
    /// Exact names of bookkeeping columns (serial numbers, week index).
    pub drop_columns: Vec<String>,
    /// Exact names of helper columns that are kept but never treated as devices.
    pub helper_columns: Vec<String>,
    /// Device names (compared case-insensitively) left out of device listings and rankings.
    pub hidden_devices: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timestamp_column: "Date".into(),
            water_keywords: vec!["water".into(), "Water".into()],
            drop_columns: vec!["S. No.".into(), "Cwk".into()],
            helper_columns: vec!["Day".into()],
            hidden_devices: ["sno", "s.no", "s. no.", "serial", "c", "cwk"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl PipelineConfig {
    /// Parse a YAML document; missing keys fall back to defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).context("parsing pipeline config YAML")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("in {}", path.display()))
    }
}
