// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Config command - shows the resolved settings

use super::Ctx;
use crate::config;
use anyhow::{Context, Result};
use serde_json::Value;

/// Print every setting as TOML, or the value of one key
pub fn run(ctx: &Ctx, key: Option<&str>) -> Result<()> {
    let Some(key) = key else {
        if ctx.json {
            return ctx.print_json(&ctx.settings);
        }
        print!("{}", config::to_toml(&ctx.settings)?);
        return Ok(());
    };

    let settings = serde_json::to_value(&ctx.settings).context("Failed to serialize settings")?;
    let value = settings.get(key).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown setting: {}. Known: data_dir, log_level, hierarchy_policy, code_reuse",
            key
        )
    })?;

    match value {
        Value::String(s) => println!("{s}"),
        other => println!("{other}"),
    }
    Ok(())
}
