// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Replay configuration.
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! passes = 3
//! fail_on_violation = true
//!
//! [table]
//! name = "ip"
//!
//! [report]
//! format = "json"
//! include_nodes = true
//! include_ids = ["10-20"]
//! ```

use crate::filter::IdFilter;
use reassembly::TableConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Report rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Invalid(format!(
                "unknown report format '{}' (expected text or json)",
                other
            ))),
        }
    }
}

/// Report settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub format: ReportFormat,

    /// List every node of each completed message.
    #[serde(default)]
    pub include_nodes: bool,

    /// Only report these ids (patterns, see [`IdFilter`]).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_ids: Vec<String>,

    /// Never report these ids.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_ids: Vec<String>,
}

impl ReportConfig {
    /// Id filter described by this section, if any.
    pub fn id_filter(&self) -> Option<IdFilter> {
        if !self.include_ids.is_empty() {
            Some(IdFilter::include(self.include_ids.clone()))
        } else if !self.exclude_ids.is_empty() {
            Some(IdFilter::exclude(self.exclude_ids.clone()))
        } else {
            None
        }
    }
}

/// Replay driver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Total passes over the trace: one first pass plus replays.
    #[serde(default = "default_passes")]
    pub passes: u32,

    /// Exit non-zero when a replay diverges.
    #[serde(default = "default_true")]
    pub fail_on_violation: bool,

    /// Engine table settings (shared by both key schemes).
    #[serde(default)]
    pub table: TableConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

fn default_passes() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            passes: default_passes(),
            fail_on_violation: true,
            table: TableConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl ReplayConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.passes < 2 {
            return Err(ConfigError::Invalid(format!(
                "passes must be at least 2 (one first pass plus a replay), got {}",
                self.passes
            )));
        }
        if !self.report.include_ids.is_empty() && !self.report.exclude_ids.is_empty() {
            return Err(ConfigError::Invalid(
                "include_ids and exclude_ids are mutually exclusive".into(),
            ));
        }
        self.table
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
