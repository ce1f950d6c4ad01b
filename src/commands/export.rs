// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Export command - writes the facility tree in various formats

use super::Ctx;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Snapshot JSON (re-importable)
    Json,
    /// Graphviz DOT format
    Dot,
    /// Indented text outline
    Tree,
}

impl ExportFormat {
    /// Parse format from string
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "dot" | "graphviz" => Some(Self::Dot),
            "tree" | "text" | "txt" => Some(Self::Tree),
            _ => None,
        }
    }

    /// Get file extension for format
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Dot => "dot",
            Self::Tree => "txt",
        }
    }
}

/// Run the export command
pub fn run(ctx: &Ctx, format: &str, output: Option<PathBuf>) -> Result<()> {
    info!("Exporting to {}", format);

    let export_format = ExportFormat::parse(format)
        .ok_or_else(|| anyhow::anyhow!("Unknown export format: {}. Supported: json, dot, tree", format))?;

    let session = ctx.load_session()?;
    if session.hierarchy.is_empty() {
        eprintln!("Warning: no facilities defined. Run 'facility-registry create' first.");
    }

    let content = match export_format {
        ExportFormat::Json => serde_json::to_string_pretty(&session.hierarchy.export_data())
            .context("Failed to serialize facilities")?,
        ExportFormat::Dot => session.hierarchy.to_dot(),
        ExportFormat::Tree => session.hierarchy.render_tree(),
    };

    match output {
        Some(path) => {
            fs::write(&path, &content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            println!("Exported to {} ({})", path.display(), export_format.extension());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }

    Ok(())
}
