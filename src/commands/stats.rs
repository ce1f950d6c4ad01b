// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Statistics command - facility counts by level and type

use super::Ctx;
use anyhow::Result;

/// Print facility statistics
pub fn run(ctx: &Ctx) -> Result<()> {
    let session = ctx.load_session()?;
    let stats = session.hierarchy.statistics();

    if ctx.json {
        return ctx.print_json(&stats);
    }

    println!("Facilities: {}", stats.total);
    println!("  by level:");
    for (level, count) in &stats.by_level {
        println!("    {level:<14} {count}");
    }
    println!("  by type:");
    for (ty, count) in stats.by_type.iter().filter(|(_, count)| **count > 0) {
        println!("    {ty:<20} {count}");
    }
    println!("  location codes issued: {}", session.hierarchy.codes().len());
    Ok(())
}
