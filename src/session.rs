// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Editing session: one facility tree and one identifier cache
//!
//! The session is the context object handed to whatever drives an editing
//! session (CLI, UI bridge). It also owns on-disk persistence.

use crate::config::Settings;
use crate::error::IdCacheError;
use crate::hierarchy::FacilityHierarchy;
use crate::id_cache::{normalize, GlobalIdCache, ScanReport};
use crate::types::FacilitySnapshot;
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

/// File name of the persisted facility snapshot
pub const SNAPSHOT_FILE: &str = "facilities.json";

/// State of one editing session
#[derive(Debug, Clone, Default)]
pub struct EditingSession {
    /// The facility tree
    pub hierarchy: FacilityHierarchy,
    /// Location identifiers claimed in the current layout
    pub ids: GlobalIdCache,
}

impl EditingSession {
    /// Create an empty session using the configured policies
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            hierarchy: FacilityHierarchy::with_policies(settings.hierarchy_policy, settings.code_reuse),
            ids: GlobalIdCache::new(),
        }
    }

    /// Load the facility tree from `dir`, or start empty if nothing is saved yet
    pub fn load(dir: &Path, settings: &Settings) -> Result<Self> {
        let mut session = Self::new(settings);
        let path = dir.join(SNAPSHOT_FILE);

        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let snapshot: FacilitySnapshot = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            session.hierarchy.import_data(snapshot);
        }

        Ok(session)
    }

    /// Save the facility tree to `dir`
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;

        let path = dir.join(SNAPSHOT_FILE);
        let json = serde_json::to_string_pretty(&self.hierarchy.export_data())
            .context("Failed to serialize facilities")?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;

        info!("Saved {} facilities to {}", self.hierarchy.len(), path.display());
        Ok(())
    }

    /// Seed the identifier cache from a layout document
    pub fn seed_layout(&mut self, layout: &Value) -> ScanReport {
        self.ids.initialize(layout)
    }

    /// Claim a location id for a new layout element
    pub fn claim_location_id(&mut self, id: &str) -> Result<(), IdCacheError> {
        let normalized = normalize(id).ok_or(IdCacheError::EmptyId)?;
        if self.ids.is_id_in_use(&normalized) {
            return Err(IdCacheError::Collision(normalized));
        }
        self.ids.add_id(&normalized);
        Ok(())
    }

    /// Move a layout element from one location id to another
    pub fn reassign_location_id(&mut self, old_id: &str, new_id: &str) -> Result<(), IdCacheError> {
        self.ids.update_id(old_id, new_id)
    }

    /// Give up a location id when its layout element is deleted
    pub fn release_location_id(&mut self, id: &str) -> bool {
        self.ids.remove_id(id)
    }
}
