// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod completions;
pub mod config;
pub mod export;
pub mod facility;
pub mod import;
pub mod layout;
pub mod stats;

use crate::config::Settings;
use crate::session::EditingSession;
use crate::types::FacilityNode;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::io::Write;

/// Shared context for every command
#[derive(Debug, Clone)]
pub struct Ctx {
    /// Resolved settings (data dir already overridden from the CLI)
    pub settings: Settings,
    /// Print JSON instead of text
    pub json: bool,
    /// Colorize text output
    pub color: bool,
}

impl Ctx {
    /// Load the persisted session from the data directory
    pub fn load_session(&self) -> Result<EditingSession> {
        EditingSession::load(&self.settings.data_dir, &self.settings).with_context(|| {
            format!("Failed to load facilities from {}", self.settings.data_dir.display())
        })
    }

    /// Persist the session to the data directory
    pub fn save_session(&self, session: &EditingSession) -> Result<()> {
        session.save(&self.settings.data_dir)
    }

    /// Highlight a location code
    #[must_use]
    pub fn code(&self, code: &str) -> String {
        if self.color {
            code.cyan().bold().to_string()
        } else {
            code.to_string()
        }
    }

    /// Dim secondary text
    #[must_use]
    pub fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    /// One-line summary of a facility
    #[must_use]
    pub fn line(&self, node: &FacilityNode) -> String {
        format!(
            "{}  {} {}",
            self.code(node.location_code()),
            node.name,
            self.dim(&format!("[{}/{}] {}", node.level(), node.facility_type, node.id()))
        )
    }

    /// Print a value as pretty JSON on stdout
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
