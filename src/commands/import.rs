// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Import command - replaces the stored tree with an exported snapshot

use super::Ctx;
use crate::types::FacilitySnapshot;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Run the import command
pub fn run(ctx: &Ctx, file: &Path) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let snapshot: FacilitySnapshot = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    let mut session = ctx.load_session()?;
    let previous = session.hierarchy.len();
    session.hierarchy.import_data(snapshot);
    ctx.save_session(&session)?;

    info!("Imported {} from {}", session.hierarchy.len(), file.display());
    println!(
        "Imported {} facilities ({} location codes), replacing {}",
        session.hierarchy.len(),
        session.hierarchy.codes().len(),
        previous
    );
    Ok(())
}
