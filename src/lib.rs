// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Facility registry library - facility hierarchy and layout identifiers
//!
//! This crate provides the core of a warehouse operations dashboard: a tree of
//! physical facilities with generated location codes, and a uniqueness index
//! over the location identifiers placed in a warehouse layout.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod codegen;
pub mod commands;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod id_cache;
pub mod session;

/// Core data types shared by the hierarchy, code generator and CLI
pub mod types {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use serde_json::{Map, Value};
    use std::collections::BTreeMap;
    use std::fmt;
    use std::str::FromStr;

    /// Free-form property bag attached to every facility
    pub type Properties = Map<String, Value>;

    // =========================================================================
    // Levels
    // =========================================================================

    /// Position of a facility in the organization → location tree
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum FacilityLevel {
        /// Company or tenant
        Organization,
        /// A single site building
        Building,
        /// One storey of a building
        Floor,
        /// Functional area on a floor
        Zone,
        /// Addressable storage position
        Location,
    }

    impl FacilityLevel {
        /// All levels, coarse to fine
        pub const ALL: [Self; 5] = [
            Self::Organization,
            Self::Building,
            Self::Floor,
            Self::Zone,
            Self::Location,
        ];

        /// Wire name of this level
        #[must_use]
        pub fn as_str(&self) -> &'static str {
            match self {
                Self::Organization => "organization",
                Self::Building => "building",
                Self::Floor => "floor",
                Self::Zone => "zone",
                Self::Location => "location",
            }
        }

        /// The level a parent of this level sits at (None for organizations)
        #[must_use]
        pub fn parent_level(&self) -> Option<Self> {
            match self {
                Self::Organization => None,
                Self::Building => Some(Self::Organization),
                Self::Floor => Some(Self::Building),
                Self::Zone => Some(Self::Floor),
                Self::Location => Some(Self::Zone),
            }
        }

        /// The level children of this level sit at (None for locations)
        #[must_use]
        pub fn child_level(&self) -> Option<Self> {
            match self {
                Self::Organization => Some(Self::Building),
                Self::Building => Some(Self::Floor),
                Self::Floor => Some(Self::Zone),
                Self::Zone => Some(Self::Location),
                Self::Location => None,
            }
        }
    }

    impl fmt::Display for FacilityLevel {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.pad(self.as_str())
        }
    }

    impl FromStr for FacilityLevel {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            Self::ALL
                .into_iter()
                .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
                .ok_or_else(|| {
                    format!(
                        "Unknown facility level: {s}. Valid: organization, building, floor, zone, location"
                    )
                })
        }
    }

    // =========================================================================
    // Types
    // =========================================================================

    /// Facility type tag (open vocabulary; unknown tags are kept verbatim)
    #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    #[serde(from = "String", into = "String")]
    pub enum FacilityType {
        /// Warehouse building
        Warehouse,
        /// Manufacturing plant
        Manufacturing,
        /// Office building
        Office,
        /// Distribution center
        DistributionCenter,
        /// Mixed-use building
        MixedUse,
        /// Storage zone
        Storage,
        /// Production zone
        Production,
        /// Shipping zone
        Shipping,
        /// Receiving zone
        Receiving,
        /// Office space zone
        OfficeSpace,
        /// Utilities zone
        Utilities,
        /// Safety zone
        Safety,
        /// Traffic lane zone
        Traffic,
        /// Any tag outside the known vocabulary
        Other(String),
    }

    impl FacilityType {
        /// Every known tag, in vocabulary order
        #[must_use]
        pub fn known() -> [Self; 13] {
            [
                Self::Warehouse,
                Self::Manufacturing,
                Self::Office,
                Self::DistributionCenter,
                Self::MixedUse,
                Self::Storage,
                Self::Production,
                Self::Shipping,
                Self::Receiving,
                Self::OfficeSpace,
                Self::Utilities,
                Self::Safety,
                Self::Traffic,
            ]
        }

        /// Wire name of this type
        #[must_use]
        pub fn as_str(&self) -> &str {
            match self {
                Self::Warehouse => "warehouse",
                Self::Manufacturing => "manufacturing",
                Self::Office => "office",
                Self::DistributionCenter => "distribution_center",
                Self::MixedUse => "mixed_use",
                Self::Storage => "storage",
                Self::Production => "production",
                Self::Shipping => "shipping",
                Self::Receiving => "receiving",
                Self::OfficeSpace => "office_space",
                Self::Utilities => "utilities",
                Self::Safety => "safety",
                Self::Traffic => "traffic",
                Self::Other(tag) => tag,
            }
        }
    }

    impl From<String> for FacilityType {
        fn from(tag: String) -> Self {
            Self::known()
                .into_iter()
                .find(|known| known.as_str() == tag)
                .unwrap_or(Self::Other(tag))
        }
    }

    impl From<&str> for FacilityType {
        fn from(tag: &str) -> Self {
            Self::from(tag.to_string())
        }
    }

    impl From<FacilityType> for String {
        fn from(ty: FacilityType) -> Self {
            match ty {
                FacilityType::Other(tag) => tag,
                known => known.as_str().to_string(),
            }
        }
    }

    impl FromStr for FacilityType {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let tag = s.trim();
            if tag.is_empty() {
                return Err("Facility type must not be empty".into());
            }
            Ok(Self::from(tag.to_lowercase()))
        }
    }

    impl fmt::Display for FacilityType {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.pad(self.as_str())
        }
    }

    // =========================================================================
    // Spatial metadata
    // =========================================================================

    /// Position on the layout canvas
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Coordinates {
        /// X coordinate
        pub x: f64,
        /// Y coordinate
        pub y: f64,
        /// Elevation, when known
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub z: Option<f64>,
    }

    /// Footprint of a facility
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Dimensions {
        /// Width
        pub width: f64,
        /// Length
        pub length: f64,
        /// Height, when known
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub height: Option<f64>,
    }

    // =========================================================================
    // Facility node
    // =========================================================================

    /// A node in the facility tree
    ///
    /// Identity, placement and the location code are fixed at construction and
    /// only readable afterwards; descriptive fields stay public.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FacilityNode {
        id: String,
        /// Display name
        pub name: String,
        /// Facility type tag
        #[serde(rename = "type")]
        pub facility_type: FacilityType,
        level: FacilityLevel,
        #[serde(default)]
        parent_id: Option<String>,
        /// Free-form properties, always carrying `createdAt` and `updatedAt`
        #[serde(default)]
        pub properties: Properties,
        /// Canvas position
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub coordinates: Option<Coordinates>,
        /// Footprint
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub dimensions: Option<Dimensions>,
        #[serde(default)]
        children: Vec<String>,
        location_code: String,
    }

    impl FacilityNode {
        pub(crate) fn new(
            id: String,
            config: FacilityConfig,
            location_code: String,
            now: DateTime<Utc>,
        ) -> Self {
            let mut properties = config.properties;
            let stamp = Value::String(now.to_rfc3339());
            properties.insert("createdAt".into(), stamp.clone());
            properties.insert("updatedAt".into(), stamp);

            Self {
                id,
                name: config.name,
                facility_type: config.facility_type,
                level: config.level,
                parent_id: config.parent_id,
                properties,
                coordinates: config.coordinates,
                dimensions: config.dimensions,
                children: Vec::new(),
                location_code,
            }
        }

        /// Unique identifier
        #[must_use]
        pub fn id(&self) -> &str {
            &self.id
        }

        /// Hierarchy level
        #[must_use]
        pub fn level(&self) -> FacilityLevel {
            self.level
        }

        /// Owning node, if any
        #[must_use]
        pub fn parent_id(&self) -> Option<&str> {
            self.parent_id.as_deref()
        }

        /// Child ids in the order they were attached
        #[must_use]
        pub fn children(&self) -> &[String] {
            &self.children
        }

        /// Location code assigned at creation
        #[must_use]
        pub fn location_code(&self) -> &str {
            &self.location_code
        }

        /// Creation timestamp as stored in the properties
        #[must_use]
        pub fn created_at(&self) -> Option<&str> {
            self.properties.get("createdAt").and_then(Value::as_str)
        }

        /// Last update timestamp as stored in the properties
        #[must_use]
        pub fn updated_at(&self) -> Option<&str> {
            self.properties.get("updatedAt").and_then(Value::as_str)
        }

        pub(crate) fn set_id(&mut self, id: String) {
            self.id = id;
        }

        pub(crate) fn attach_child(&mut self, child_id: &str) {
            if !self.children.iter().any(|c| c == child_id) {
                self.children.push(child_id.to_string());
            }
        }

        pub(crate) fn detach_child(&mut self, child_id: &str) {
            self.children.retain(|c| c != child_id);
        }
    }

    /// Input for creating a facility
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FacilityConfig {
        /// Explicit id; generated when absent
        #[serde(default)]
        pub id: Option<String>,
        /// Display name
        pub name: String,
        /// Facility type tag
        #[serde(rename = "type")]
        pub facility_type: FacilityType,
        /// Hierarchy level
        pub level: FacilityLevel,
        /// Owning node
        #[serde(default)]
        pub parent_id: Option<String>,
        /// Initial properties
        #[serde(default)]
        pub properties: Properties,
        /// Canvas position
        #[serde(default)]
        pub coordinates: Option<Coordinates>,
        /// Footprint
        #[serde(default)]
        pub dimensions: Option<Dimensions>,
    }

    impl FacilityConfig {
        /// Start a config with the required fields
        pub fn new(
            name: impl Into<String>,
            facility_type: impl Into<FacilityType>,
            level: FacilityLevel,
        ) -> Self {
            Self {
                id: None,
                name: name.into(),
                facility_type: facility_type.into(),
                level,
                parent_id: None,
                properties: Properties::new(),
                coordinates: None,
                dimensions: None,
            }
        }

        /// Use an explicit id
        #[must_use]
        pub fn with_id(mut self, id: impl Into<String>) -> Self {
            self.id = Some(id.into());
            self
        }

        /// Place under a parent
        #[must_use]
        pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
            self.parent_id = Some(parent_id.into());
            self
        }

        /// Add one property
        #[must_use]
        pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
            self.properties.insert(key.into(), value.into());
            self
        }

        /// Set the canvas position
        #[must_use]
        pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
            self.coordinates = Some(coordinates);
            self
        }

        /// Set the footprint
        #[must_use]
        pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
            self.dimensions = Some(dimensions);
            self
        }
    }

    /// Partial update of a facility; absent fields are left untouched
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FacilityUpdate {
        /// New display name
        #[serde(default)]
        pub name: Option<String>,
        /// New type tag
        #[serde(default, rename = "type")]
        pub facility_type: Option<FacilityType>,
        /// New canvas position
        #[serde(default)]
        pub coordinates: Option<Coordinates>,
        /// New footprint
        #[serde(default)]
        pub dimensions: Option<Dimensions>,
        /// Properties deep-merged onto the existing ones
        #[serde(default)]
        pub properties: Option<Properties>,
    }

    impl FacilityUpdate {
        /// Rename
        #[must_use]
        pub fn name(mut self, name: impl Into<String>) -> Self {
            self.name = Some(name.into());
            self
        }

        /// Retag
        #[must_use]
        pub fn facility_type(mut self, facility_type: impl Into<FacilityType>) -> Self {
            self.facility_type = Some(facility_type.into());
            self
        }

        /// Merge one property
        #[must_use]
        pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
            self.properties
                .get_or_insert_with(Properties::new)
                .insert(key.into(), value.into());
            self
        }
    }

    // =========================================================================
    // Policies
    // =========================================================================

    /// How strictly `create` checks parent/child levels
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum HierarchyPolicy {
        /// Any level under any parent; dangling parents allowed
        #[default]
        Permissive,
        /// Parent must exist and sit exactly one level coarser
        Strict,
    }

    /// What happens to a location code when its facility is deleted
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum CodeReuse {
        /// The code may be issued again
        #[default]
        Release,
        /// The code stays reserved for the life of the store
        Retire,
    }

    // =========================================================================
    // Snapshots and statistics
    // =========================================================================

    /// Whole-store snapshot used for export, import and on-disk persistence
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FacilitySnapshot {
        /// `[id, node]` pairs
        #[serde(default)]
        pub facilities: Vec<(String, FacilityNode)>,
        /// Every issued location code
        #[serde(default)]
        pub location_codes: Vec<String>,
        /// Codes kept out of circulation under the retire policy
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub retired_codes: Vec<String>,
        /// When the snapshot was taken
        pub timestamp: DateTime<Utc>,
    }

    /// Node counts per level and per type
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FacilityStatistics {
        /// Total number of nodes
        pub total: usize,
        /// Count per level (every level present)
        pub by_level: BTreeMap<FacilityLevel, usize>,
        /// Count per type tag (every known tag present)
        pub by_type: BTreeMap<String, usize>,
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::codegen::LocationCodeGenerator;
    pub use crate::error::{FacilityError, IdCacheError};
    pub use crate::hierarchy::FacilityHierarchy;
    pub use crate::id_cache::{GlobalIdCache, ScanReport};
    pub use crate::session::EditingSession;
    pub use crate::types::*;
    pub use anyhow::{Context, Result};
}
