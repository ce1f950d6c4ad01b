// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Layout commands - scan a layout document for location identifiers

use super::Ctx;
use crate::id_cache::{normalize, GlobalIdCache};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Read a layout document
pub fn read_layout(file: &Path) -> Result<Value> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", file.display()))
}

/// Scan a layout and report identifiers and duplicates
///
/// Fails when the layout claims an identifier more than once.
pub fn scan(ctx: &Ctx, file: &Path) -> Result<()> {
    let layout = read_layout(file)?;
    if !layout.is_array() {
        anyhow::bail!("Layout must be a JSON array of items: {}", file.display());
    }

    let mut cache = GlobalIdCache::new();
    let report = cache.initialize(&layout);

    if ctx.json {
        ctx.print_json(&report)?;
    } else {
        println!("Scanned {} layout items", report.items_scanned);
        println!("  identifiers: {} ({} distinct)", report.identifiers_seen, report.unique);
        if report.is_clean() {
            println!("  duplicates: none");
        } else {
            println!("  duplicates ({}):", report.duplicates.len());
            for id in &report.duplicates {
                println!("    {}", ctx.code(id));
            }
        }
    }

    if !report.is_clean() {
        anyhow::bail!("{} location id(s) claimed more than once", report.duplicates.len());
    }
    Ok(())
}

#[derive(Serialize)]
struct CheckResult {
    id: String,
    in_use: bool,
}

/// Check whether identifiers are free in a layout
pub fn check(ctx: &Ctx, file: &Path, ids: &[String]) -> Result<()> {
    let layout = read_layout(file)?;
    let mut cache = GlobalIdCache::new();
    cache.initialize(&layout);

    let results: Vec<CheckResult> = ids
        .iter()
        .map(|id| CheckResult {
            id: normalize(id).unwrap_or_default(),
            in_use: cache.is_id_in_use(id),
        })
        .collect();

    if ctx.json {
        return ctx.print_json(&results);
    }
    for result in &results {
        let status = if result.in_use { "in use" } else { "free" };
        println!("{}  {}", ctx.code(&result.id), status);
    }
    Ok(())
}
