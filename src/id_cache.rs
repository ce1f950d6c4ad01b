// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Global location-identifier cache
//!
//! A layout document is an array of heterogeneous items (racks, units, …)
//! that carry location identifiers in several places. The cache collects every
//! identifier once per editing session and then answers "is this id taken?"
//! while the layout is edited.
//!
//! Identifiers are compared after trimming and upper-casing.

use crate::error::IdCacheError;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, warn};

/// One place on a layout item where identifiers can live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSource {
    /// Scalar at a dotted path (`locationData.location_id`)
    Field(&'static str),
    /// Array of scalar ids
    IdArray(&'static str),
    /// Array of `{ locationId | locId }` level mappings
    LevelMappings(&'static str),
    /// Mapping of compartment key → compartment, scanned with [`COMPARTMENT_SOURCES`]
    Compartments(&'static str),
}

/// Where identifiers live on a top-level layout item
pub const ITEM_SOURCES: [IdSource; 10] = [
    IdSource::Field("locationId"),
    IdSource::Field("locationCode"),
    IdSource::Field("locationTag"),
    IdSource::Field("primaryLocationId"),
    IdSource::Field("locationData.location_id"),
    IdSource::Field("properties.locationId"),
    IdSource::Field("data.locationId"),
    IdSource::IdArray("locationIds"),
    IdSource::LevelMappings("levelLocationMappings"),
    IdSource::Compartments("compartmentContents"),
];

/// Where identifiers live on a compartment (no further nesting)
pub const COMPARTMENT_SOURCES: [IdSource; 5] = [
    IdSource::Field("locationId"),
    IdSource::Field("uniqueId"),
    IdSource::Field("primaryLocationId"),
    IdSource::IdArray("locationIds"),
    IdSource::LevelMappings("levelLocationMappings"),
];

impl IdSource {
    /// Normalized identifiers this source yields for `value`
    #[must_use]
    pub fn tokens(self, value: &Value) -> Vec<String> {
        match self {
            Self::Field(path) => lookup(value, path).and_then(scalar_id).into_iter().collect(),
            Self::IdArray(key) => array(value, key).filter_map(scalar_id).collect(),
            Self::LevelMappings(key) => array(value, key)
                .filter_map(|mapping| {
                    mapping
                        .get("locationId")
                        .and_then(scalar_id)
                        .or_else(|| mapping.get("locId").and_then(scalar_id))
                })
                .collect(),
            Self::Compartments(key) => compartments(value, key)
                .flat_map(|compartment| {
                    COMPARTMENT_SOURCES
                        .into_iter()
                        .flat_map(move |source| source.tokens(compartment))
                })
                .collect(),
        }
    }
}

/// Identifiers grouped by claimant: the item's own fields first, then one
/// group per compartment. Empty groups are dropped.
#[must_use]
pub fn claims(item: &Value) -> Vec<Vec<String>> {
    let mut own = Vec::new();
    let mut groups = Vec::new();

    for source in ITEM_SOURCES {
        match source {
            IdSource::Compartments(key) => {
                for compartment in compartments(item, key) {
                    let tokens: Vec<String> = COMPARTMENT_SOURCES
                        .into_iter()
                        .flat_map(|s| s.tokens(compartment))
                        .collect();
                    if !tokens.is_empty() {
                        groups.push(tokens);
                    }
                }
            }
            other => own.extend(other.tokens(item)),
        }
    }

    if !own.is_empty() {
        groups.insert(0, own);
    }
    groups
}

/// Every normalized identifier found on a layout item, duplicates included
#[must_use]
pub fn extract_ids(item: &Value) -> Vec<String> {
    claims(item).into_iter().flatten().collect()
}

/// Trim and upper-case; `None` for blank input
#[must_use]
pub fn normalize(id: &str) -> Option<String> {
    let trimmed = id.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_uppercase())
}

fn scalar_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => normalize(s),
        Value::Number(n) => normalize(&n.to_string()),
        _ => None,
    }
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, key| current.get(key))
}

fn array<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn compartments<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get(key)
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(serde_json::Map::values)
}

/// Summary of a layout scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Layout items looked at
    pub items_scanned: usize,
    /// Identifiers found, counting repeats
    pub identifiers_seen: usize,
    /// Distinct identifiers now in the cache
    pub unique: usize,
    /// Identifiers claimed by more than one item or compartment, sorted
    pub duplicates: Vec<String>,
}

impl ScanReport {
    /// True when no identifier is claimed twice
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty()
    }
}

/// Uniqueness index over layout location identifiers
#[derive(Debug, Clone, Default)]
pub struct GlobalIdCache {
    ids: HashSet<String>,
    initialized: bool,
}

impl GlobalIdCache {
    /// Create an empty, uninitialized cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the cache from a layout document
    ///
    /// Anything other than a JSON array is logged and leaves the cache empty
    /// and uninitialized.
    pub fn initialize(&mut self, layout: &Value) -> ScanReport {
        if let Some(items) = layout.as_array() {
            self.initialize_items(items)
        } else {
            warn!("layout is not an array; identifier cache left empty");
            self.clear();
            ScanReport::default()
        }
    }

    /// Rebuild the cache from layout items
    pub fn initialize_items(&mut self, items: &[Value]) -> ScanReport {
        self.ids.clear();
        let mut claimants: BTreeMap<String, usize> = BTreeMap::new();
        let mut seen = 0;

        for item in items {
            for claim in claims(item) {
                seen += claim.len();
                let distinct: BTreeSet<String> = claim.into_iter().collect();
                for id in distinct {
                    *claimants.entry(id).or_default() += 1;
                }
            }
        }

        let duplicates = claimants
            .iter()
            .filter(|(_, count)| **count > 1)
            .map(|(id, _)| id.clone())
            .collect();
        self.ids = claimants.into_keys().collect();
        self.initialized = true;

        let report = ScanReport {
            items_scanned: items.len(),
            identifiers_seen: seen,
            unique: self.ids.len(),
            duplicates,
        };
        debug!(
            items = report.items_scanned,
            unique = report.unique,
            duplicates = report.duplicates.len(),
            "identifier cache initialized"
        );
        report
    }

    fn warn_if_uninitialized(&self, op: &str) {
        if !self.initialized {
            warn!(op, "identifier cache used before initialize");
        }
    }

    /// Whether an identifier is already claimed (false for blank input)
    #[must_use]
    pub fn is_id_in_use(&self, id: &str) -> bool {
        normalize(id).is_some_and(|id| self.ids.contains(&id))
    }

    /// Claim an identifier; returns false if blank or already present
    pub fn add_id(&mut self, id: &str) -> bool {
        self.warn_if_uninitialized("add_id");
        normalize(id).is_some_and(|id| self.ids.insert(id))
    }

    /// Release an identifier; returns false if it was not present
    pub fn remove_id(&mut self, id: &str) -> bool {
        self.warn_if_uninitialized("remove_id");
        normalize(id).is_some_and(|id| self.ids.remove(&id))
    }

    /// Rename an identifier in one step
    ///
    /// Renaming to the same identifier (after normalization) is a no-op.
    /// A collision leaves the cache untouched.
    pub fn update_id(&mut self, old_id: &str, new_id: &str) -> Result<(), IdCacheError> {
        self.warn_if_uninitialized("update_id");
        let new_id = normalize(new_id).ok_or(IdCacheError::EmptyId)?;
        let old_id = normalize(old_id);

        if old_id.as_deref() == Some(new_id.as_str()) {
            return Ok(());
        }
        if self.ids.contains(&new_id) {
            return Err(IdCacheError::Collision(new_id));
        }
        if let Some(old_id) = old_id {
            self.ids.remove(&old_id);
        }
        self.ids.insert(new_id);
        Ok(())
    }

    /// Number of distinct identifiers
    #[must_use]
    pub fn size(&self) -> usize {
        self.ids.len()
    }

    /// Whether `initialize` has run since creation or the last `clear`
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// All identifiers, sorted
    #[must_use]
    pub fn all_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Empty the cache and return to the uninitialized state
    pub fn clear(&mut self) {
        self.ids.clear();
        self.initialized = false;
    }
}
