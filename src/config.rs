// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `FACILITY_REGISTRY_*` environment variables.

use crate::types::{CodeReuse, HierarchyPolicy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix for settings
pub const ENV_PREFIX: &str = "FACILITY_REGISTRY";

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding `facilities.json`
    pub data_dir: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Parent/child level checking on create
    pub hierarchy_policy: HierarchyPolicy,
    /// Whether deleted facilities give their codes back
    pub code_reuse: CodeReuse,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: project_dirs()
                .map(|d| d.data_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".facility-registry")),
            log_level: "info".to_string(),
            hierarchy_policy: HierarchyPolicy::default(),
            code_reuse: CodeReuse::default(),
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("org", "hyperpolymath", "facility-registry")
}

/// Default location of the settings file
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join("config.toml"))
}

/// Load settings
///
/// An explicit `path` must exist; the default config file is optional.
pub fn load(path: Option<&Path>) -> Result<Settings> {
    let mut builder = config::Config::builder();

    match path {
        Some(path) => {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        None => {
            if let Some(default_path) = default_config_path() {
                builder = builder.add_source(config::File::from(default_path).required(false));
            }
        }
    }

    builder
        .add_source(config::Environment::with_prefix(ENV_PREFIX))
        .build()
        .context("Failed to read configuration")?
        .try_deserialize()
        .context("Invalid configuration")
}

/// Render settings as TOML
pub fn to_toml(settings: &Settings) -> Result<String> {
    toml::to_string_pretty(settings).context("Failed to serialize settings")
}
