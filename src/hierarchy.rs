// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Facility hierarchy store
//!
//! Nodes live in a petgraph `StableDiGraph` with parent → child edges, plus an
//! id → index map. Each node also keeps its ordered child id list, which is the
//! order used for traversal and display.

use crate::codegen::{LocationCodeGenerator, ParentContext};
use crate::error::FacilityError;
use crate::types::{
    CodeReuse, FacilityConfig, FacilityLevel, FacilityNode, FacilitySnapshot, FacilityStatistics,
    FacilityType, FacilityUpdate, HierarchyPolicy, Properties,
};
use chrono::Utc;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::DfsPostOrder;
use petgraph::Direction;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Write as _;
use tracing::debug;

type Graph = StableDiGraph<FacilityNode, ()>;

/// The facility tree with its location code generator
#[derive(Debug, Clone, Default)]
pub struct FacilityHierarchy {
    graph: Graph,
    node_indices: HashMap<String, NodeIndex>,
    codes: LocationCodeGenerator,
    policy: HierarchyPolicy,
    id_counter: u64,
}

impl FacilityHierarchy {
    /// Create an empty, permissive store that releases codes on delete
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with explicit policies
    #[must_use]
    pub fn with_policies(policy: HierarchyPolicy, reuse: CodeReuse) -> Self {
        Self {
            codes: LocationCodeGenerator::new(reuse),
            policy,
            ..Self::default()
        }
    }

    /// Create a facility and attach it to its parent
    ///
    /// Under the permissive policy only a duplicate explicit id is refused.
    /// Under the strict policy the parent must exist and be exactly one level
    /// coarser than the new node.
    pub fn create(&mut self, mut config: FacilityConfig) -> Result<FacilityNode, FacilityError> {
        if let Some(id) = &config.id {
            if self.node_indices.contains_key(id) {
                return Err(FacilityError::DuplicateId(id.clone()));
            }
        }

        let parent_idx = config
            .parent_id
            .as_deref()
            .and_then(|p| self.node_indices.get(p).copied());

        if self.policy == HierarchyPolicy::Strict {
            self.check_placement(config.level, config.parent_id.as_deref(), parent_idx)?;
        }

        let id = match config.id.take() {
            Some(id) => id,
            None => self.generate_id(&config.name, config.level),
        };

        let parent = parent_idx.map(|idx| parent_context(&self.graph, idx));
        let location_code = self
            .codes
            .generate(config.level, &config.facility_type, parent.as_ref());

        let node = FacilityNode::new(id.clone(), config, location_code, Utc::now());
        let idx = self.graph.add_node(node.clone());
        self.node_indices.insert(id.clone(), idx);

        if let Some(parent_idx) = parent_idx {
            self.graph.add_edge(parent_idx, idx, ());
            if let Some(parent) = self.graph.node_weight_mut(parent_idx) {
                parent.attach_child(&id);
            }
        }

        debug!(id = %id, code = node.location_code(), level = %node.level(), "created facility");
        Ok(node)
    }

    fn check_placement(
        &self,
        level: FacilityLevel,
        parent_id: Option<&str>,
        parent_idx: Option<NodeIndex>,
    ) -> Result<(), FacilityError> {
        let (Some(parent_id), parent_idx) = (parent_id, parent_idx) else {
            return Ok(());
        };
        let parent = parent_idx
            .and_then(|idx| self.graph.node_weight(idx))
            .ok_or_else(|| FacilityError::ParentNotFound(parent_id.to_string()))?;

        if parent.level().child_level() == Some(level) {
            Ok(())
        } else {
            Err(FacilityError::InvalidParentLevel {
                parent_level: parent.level(),
                level,
            })
        }
    }

    /// Short opaque id: `fac_` + 12 hex chars
    fn generate_id(&mut self, name: &str, level: FacilityLevel) -> String {
        loop {
            self.id_counter += 1;
            let mut hasher = Sha256::new();
            hasher.update(name.as_bytes());
            hasher.update(level.as_str().as_bytes());
            hasher.update(self.id_counter.to_le_bytes());
            hasher.update(Utc::now().timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
            let hash = hex::encode(hasher.finalize());
            let id = format!("fac_{}", &hash[..12]);
            if !self.node_indices.contains_key(&id) {
                return id;
            }
        }
    }

    /// Get a facility by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&FacilityNode> {
        self.node_indices
            .get(id)
            .and_then(|&idx| self.graph.node_weight(idx))
    }

    /// Resolved children of a facility, in attach order (empty for unknown ids)
    #[must_use]
    pub fn children(&self, parent_id: &str) -> Vec<&FacilityNode> {
        self.get(parent_id)
            .map(|parent| {
                parent
                    .children()
                    .iter()
                    .filter_map(|child| self.get(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every transitive descendant, pre-order
    #[must_use]
    pub fn descendants(&self, id: &str) -> Vec<&FacilityNode> {
        let mut out = Vec::new();
        let Some(root) = self.get(id) else {
            return out;
        };
        let mut seen: HashSet<&str> = HashSet::from([root.id()]);
        let mut stack: Vec<&str> = root.children().iter().rev().map(String::as_str).collect();

        while let Some(child_id) = stack.pop() {
            if !seen.insert(child_id) {
                continue;
            }
            if let Some(child) = self.get(child_id) {
                out.push(child);
                stack.extend(child.children().iter().rev().map(String::as_str));
            }
        }
        out
    }

    /// Path from the root down to `id` (empty for unknown ids)
    ///
    /// Stops at the first parent id that does not resolve.
    #[must_use]
    pub fn hierarchy_path(&self, id: &str) -> Vec<&FacilityNode> {
        let mut path = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.get(id);

        while let Some(node) = current {
            if !seen.insert(node.id()) {
                break;
            }
            path.push(node);
            current = node.parent_id().and_then(|p| self.get(p));
        }
        path.reverse();
        path
    }

    /// Nodes without a resolvable parent, sorted by location code
    #[must_use]
    pub fn roots(&self) -> Vec<&FacilityNode> {
        let mut roots: Vec<&FacilityNode> = self
            .nodes()
            .filter(|n| n.parent_id().and_then(|p| self.get(p)).is_none())
            .collect();
        roots.sort_by(|a, b| a.location_code().cmp(b.location_code()));
        roots
    }

    /// All facilities at a level
    #[must_use]
    pub fn by_level(&self, level: FacilityLevel) -> Vec<&FacilityNode> {
        self.nodes().filter(|n| n.level() == level).collect()
    }

    /// All facilities with a type tag
    #[must_use]
    pub fn by_type(&self, facility_type: &FacilityType) -> Vec<&FacilityNode> {
        self.nodes()
            .filter(|n| &n.facility_type == facility_type)
            .collect()
    }

    /// Apply a partial update
    ///
    /// Provided fields replace the stored ones, properties are deep-merged and
    /// `updatedAt` is refreshed. Returns the updated node, or `None` for an
    /// unknown id.
    pub fn update(&mut self, id: &str, updates: FacilityUpdate) -> Option<FacilityNode> {
        let idx = *self.node_indices.get(id)?;
        let node = self.graph.node_weight_mut(idx)?;

        if let Some(name) = updates.name {
            node.name = name;
        }
        if let Some(facility_type) = updates.facility_type {
            node.facility_type = facility_type;
        }
        if let Some(coordinates) = updates.coordinates {
            node.coordinates = Some(coordinates);
        }
        if let Some(dimensions) = updates.dimensions {
            node.dimensions = Some(dimensions);
        }

        let created_at = node.properties.get("createdAt").cloned();
        if let Some(properties) = updates.properties {
            deep_merge(&mut node.properties, properties);
        }
        if let Some(created_at) = created_at {
            node.properties.insert("createdAt".into(), created_at);
        }
        node.properties
            .insert("updatedAt".into(), Value::String(Utc::now().to_rfc3339()));

        debug!(id, "updated facility");
        Some(node.clone())
    }

    /// Delete a facility and all of its descendants
    ///
    /// Descendants go first. Each removed node releases its location code and
    /// is detached from its parent. Returns false for an unknown id.
    pub fn delete(&mut self, id: &str) -> bool {
        let Some(&root) = self.node_indices.get(id) else {
            return false;
        };

        let mut doomed = Vec::new();
        let mut dfs = DfsPostOrder::new(&self.graph, root);
        while let Some(idx) = dfs.next(&self.graph) {
            doomed.push(idx);
        }

        let count = doomed.len();
        for idx in doomed {
            self.remove_node(idx);
        }
        debug!(id, removed = count, "deleted facility subtree");
        true
    }

    fn remove_node(&mut self, idx: NodeIndex) {
        let Some(node) = self.graph.remove_node(idx) else {
            return;
        };
        self.codes.release(node.location_code());

        let parent_idx = node
            .parent_id()
            .and_then(|p| self.node_indices.get(p).copied());
        if let Some(parent) = parent_idx.and_then(|p| self.graph.node_weight_mut(p)) {
            parent.detach_child(node.id());
        }
        self.node_indices.remove(node.id());
    }

    /// Case-insensitive substring search over names and location codes
    ///
    /// An empty query matches every facility.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&FacilityNode> {
        let needle = query.to_lowercase();
        self.nodes()
            .filter(|n| {
                n.name.to_lowercase().contains(&needle)
                    || n.location_code().to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Counts per level and per type; every known key is present
    #[must_use]
    pub fn statistics(&self) -> FacilityStatistics {
        let mut by_level: BTreeMap<FacilityLevel, usize> =
            FacilityLevel::ALL.into_iter().map(|l| (l, 0)).collect();
        let mut by_type: BTreeMap<String, usize> = FacilityType::known()
            .into_iter()
            .map(|t| (String::from(t), 0))
            .collect();

        for node in self.nodes() {
            *by_level.entry(node.level()).or_default() += 1;
            *by_type
                .entry(node.facility_type.as_str().to_string())
                .or_default() += 1;
        }

        FacilityStatistics {
            total: self.len(),
            by_level,
            by_type,
        }
    }

    /// Snapshot the whole store
    #[must_use]
    pub fn export_data(&self) -> FacilitySnapshot {
        FacilitySnapshot {
            facilities: self
                .nodes()
                .map(|n| (n.id().to_string(), n.clone()))
                .collect(),
            location_codes: self.codes.issued_codes(),
            retired_codes: self.codes.retired_codes(),
            timestamp: Utc::now(),
        }
    }

    /// Replace the store's contents with a snapshot
    ///
    /// Graph links are rebuilt from each node's `children` list, the same
    /// relationship `create` records. Ids missing from the snapshot stay on the
    /// node but are not linked.
    pub fn import_data(&mut self, snapshot: FacilitySnapshot) {
        self.clear();

        for (id, mut node) in snapshot.facilities {
            node.set_id(id.clone());
            self.codes.reserve(node.location_code());
            if let Some(&idx) = self.node_indices.get(&id) {
                self.graph[idx] = node;
            } else {
                let idx = self.graph.add_node(node);
                self.node_indices.insert(id, idx);
            }
        }

        let mut links: Vec<(NodeIndex, NodeIndex)> = Vec::new();
        let mut linked = HashSet::new();
        for parent in self.graph.node_indices() {
            for child_id in self.graph[parent].children() {
                let Some(&child) = self.node_indices.get(child_id) else {
                    continue;
                };
                if child != parent && linked.insert((parent, child)) {
                    links.push((parent, child));
                }
            }
        }
        for (parent, child) in links {
            self.graph.add_edge(parent, child, ());
        }

        for code in snapshot.location_codes {
            self.codes.reserve(code);
        }
        for code in snapshot.retired_codes {
            self.codes.retire(code);
        }
        debug!(facilities = self.len(), codes = self.codes.len(), "imported facility snapshot");
    }

    /// Remove every node and forget every code
    pub fn clear(&mut self) {
        self.graph.clear();
        self.node_indices.clear();
        self.codes.clear();
    }

    /// Iterate over all nodes (unspecified order)
    pub fn nodes(&self) -> impl Iterator<Item = &FacilityNode> {
        self.graph.node_weights()
    }

    /// The code generator backing this store
    #[must_use]
    pub fn codes(&self) -> &LocationCodeGenerator {
        &self.codes
    }

    /// Level policy in force
    #[must_use]
    pub fn policy(&self) -> HierarchyPolicy {
        self.policy
    }

    /// Number of facilities
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// True when the store holds no facilities
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Indented text outline of the tree
    #[must_use]
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        let mut seen = HashSet::new();
        for root in self.roots() {
            self.render_node(root, 0, &mut out, &mut seen);
        }
        out
    }

    fn render_node<'a>(
        &'a self,
        node: &'a FacilityNode,
        depth: usize,
        out: &mut String,
        seen: &mut HashSet<&'a str>,
    ) {
        if !seen.insert(node.id()) {
            return;
        }
        let _ = writeln!(
            out,
            "{:indent$}{}  {} [{}/{}]",
            "",
            node.location_code(),
            node.name,
            node.level(),
            node.facility_type,
            indent = depth * 2
        );
        for child in self.children(node.id()) {
            self.render_node(child, depth + 1, out, seen);
        }
    }

    /// Export to DOT format for Graphviz
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph facilities {\n");
        dot.push_str("  rankdir=TB;\n");
        dot.push_str("  node [shape=box, style=rounded];\n\n");

        for node in self.nodes() {
            let _ = writeln!(
                dot,
                "  \"{}\" [label=\"{}\\n{}\"];",
                node.id(),
                node.location_code(),
                node.name.replace('"', "\\\"")
            );
        }

        dot.push('\n');

        for edge in self.graph.edge_indices() {
            if let Some((parent, child)) = self.graph.edge_endpoints(edge) {
                let _ = writeln!(
                    dot,
                    "  \"{}\" -> \"{}\";",
                    self.graph[parent].id(),
                    self.graph[child].id()
                );
            }
        }

        dot.push_str("}\n");
        dot
    }

    /// Number of direct children linked in the graph
    #[must_use]
    pub fn child_count(&self, id: &str) -> usize {
        self.node_indices.get(id).map_or(0, |&idx| {
            self.graph
                .neighbors_directed(idx, Direction::Outgoing)
                .count()
        })
    }
}

fn parent_context(graph: &Graph, idx: NodeIndex) -> ParentContext<'_> {
    let parent = &graph[idx];
    ParentContext {
        code: parent.location_code(),
        child_count: parent.children().len(),
        zone_codes: graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|child| &graph[child])
            .filter(|child| child.level() == FacilityLevel::Zone)
            .map(FacilityNode::location_code)
            .collect(),
    }
}

/// Merge `patch` into `target`; nested objects merge, other values replace
fn deep_merge(target: &mut Properties, patch: Properties) {
    for (key, value) in patch {
        match value {
            Value::Object(nested) => {
                if let Some(Value::Object(existing)) = target.get_mut(&key) {
                    deep_merge(existing, nested);
                    continue;
                }
                target.insert(key, Value::Object(nested));
            }
            other => {
                target.insert(key, other);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn building(store: &mut FacilityHierarchy, name: &str) -> FacilityNode {
        store
            .create(FacilityConfig::new(name, FacilityType::Warehouse, FacilityLevel::Building))
            .unwrap()
    }

    fn child(
        store: &mut FacilityHierarchy,
        parent: &FacilityNode,
        name: &str,
        ty: FacilityType,
        level: FacilityLevel,
    ) -> FacilityNode {
        store
            .create(FacilityConfig::new(name, ty, level).with_parent(parent.id()))
            .unwrap()
    }

    #[test]
    fn test_create_attaches_to_parent() {
        let mut store = FacilityHierarchy::new();
        let wh = building(&mut store, "Main");
        let floor = child(&mut store, &wh, "Ground", FacilityType::Warehouse, FacilityLevel::Floor);

        assert_eq!(store.len(), 2);
        assert_eq!(floor.location_code(), "WH-01-F01");
        assert_eq!(store.get(wh.id()).unwrap().children(), &[floor.id().to_string()]);
        assert_eq!(store.child_count(wh.id()), 1);
        assert!(floor.created_at().is_some());
        assert_eq!(floor.created_at(), floor.updated_at());
    }

    #[test]
    fn test_create_rejects_duplicate_explicit_id() {
        let mut store = FacilityHierarchy::new();
        store
            .create(FacilityConfig::new("A", FacilityType::Warehouse, FacilityLevel::Building).with_id("b1"))
            .unwrap();

        let err = store
            .create(FacilityConfig::new("B", FacilityType::Warehouse, FacilityLevel::Building).with_id("b1"))
            .unwrap_err();
        assert_eq!(err, FacilityError::DuplicateId("b1".into()));
        assert_eq!(store.len(), 1);
        assert_eq!(store.codes().len(), 1);
    }

    #[test]
    fn test_permissive_allows_level_skip_and_dangling_parent() {
        let mut store = FacilityHierarchy::new();
        let wh = building(&mut store, "Main");
        let loc = child(&mut store, &wh, "Bin", FacilityType::Storage, FacilityLevel::Location);
        assert_eq!(loc.location_code(), "WH-01-001");

        let orphan = store
            .create(FacilityConfig::new("Lost", FacilityType::Storage, FacilityLevel::Zone).with_parent("missing"))
            .unwrap();
        assert_eq!(orphan.location_code(), "Z-A");
        assert_eq!(orphan.parent_id(), Some("missing"));
        assert_eq!(store.hierarchy_path(orphan.id()).len(), 1);
    }

    #[test]
    fn test_strict_policy_checks_levels() {
        let mut store = FacilityHierarchy::with_policies(HierarchyPolicy::Strict, CodeReuse::Release);
        let wh = building(&mut store, "Main");

        let err = store
            .create(FacilityConfig::new("Bin", FacilityType::Storage, FacilityLevel::Location).with_parent(wh.id()))
            .unwrap_err();
        assert_eq!(
            err,
            FacilityError::InvalidParentLevel {
                parent_level: FacilityLevel::Building,
                level: FacilityLevel::Location,
            }
        );

        let err = store
            .create(FacilityConfig::new("F", FacilityType::Warehouse, FacilityLevel::Floor).with_parent("nope"))
            .unwrap_err();
        assert_eq!(err, FacilityError::ParentNotFound("nope".into()));

        assert_eq!(store.len(), 1);
        assert!(store.get(wh.id()).unwrap().children().is_empty());
        assert_eq!(store.codes().len(), 1);
    }

    #[test]
    fn test_update_merges_properties_and_keeps_created_at() {
        let mut store = FacilityHierarchy::new();
        let wh = store
            .create(
                FacilityConfig::new("Main", FacilityType::Warehouse, FacilityLevel::Building)
                    .with_property("capacity", json!({"pallets": 100, "bins": 20}))
                    .with_property("manager", "kim"),
            )
            .unwrap();

        let mut patch = Properties::new();
        patch.insert("capacity".into(), json!({"pallets": 150}));
        patch.insert("createdAt".into(), json!("1999-01-01T00:00:00Z"));
        let updated = store
            .update(
                wh.id(),
                FacilityUpdate {
                    name: Some("Main DC".into()),
                    properties: Some(patch),
                    ..FacilityUpdate::default()
                },
            )
            .unwrap();

        assert_eq!(updated.name, "Main DC");
        assert_eq!(updated.properties["capacity"], json!({"pallets": 150, "bins": 20}));
        assert_eq!(updated.properties["manager"], json!("kim"));
        assert_eq!(updated.created_at(), wh.created_at());
        assert_eq!(updated.location_code(), wh.location_code());
        assert!(store.update("missing", FacilityUpdate::default()).is_none());
    }

    #[test]
    fn test_delete_cascades_and_detaches() {
        let mut store = FacilityHierarchy::new();
        let wh = building(&mut store, "Main");
        let floor = child(&mut store, &wh, "Ground", FacilityType::Warehouse, FacilityLevel::Floor);
        let zone = child(&mut store, &floor, "Pick", FacilityType::Storage, FacilityLevel::Zone);
        let loc = child(&mut store, &zone, "Bin", FacilityType::Storage, FacilityLevel::Location);

        assert!(store.delete(floor.id()));

        for gone in [&floor, &zone, &loc] {
            assert!(store.get(gone.id()).is_none());
            assert!(!store.codes().is_issued(gone.location_code()));
        }
        assert!(store.get(wh.id()).unwrap().children().is_empty());
        assert_eq!(store.len(), 1);
        assert!(!store.delete(floor.id()));
    }

    #[test]
    fn test_descendants_pre_order() {
        let mut store = FacilityHierarchy::new();
        let wh = building(&mut store, "Main");
        let f1 = child(&mut store, &wh, "F1", FacilityType::Warehouse, FacilityLevel::Floor);
        let z1 = child(&mut store, &f1, "Z1", FacilityType::Storage, FacilityLevel::Zone);
        let f2 = child(&mut store, &wh, "F2", FacilityType::Warehouse, FacilityLevel::Floor);

        let names: Vec<&str> = store.descendants(wh.id()).iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["F1", "Z1", "F2"]);
        assert!(store.descendants(z1.id()).is_empty());
        assert!(store.descendants(f2.id()).is_empty());
    }

    #[test]
    fn test_search_and_filters() {
        let mut store = FacilityHierarchy::new();
        let wh = building(&mut store, "North Hub");
        child(&mut store, &wh, "Mezzanine", FacilityType::Warehouse, FacilityLevel::Floor);
        store
            .create(FacilityConfig::new("HQ", FacilityType::Office, FacilityLevel::Building))
            .unwrap();

        assert_eq!(store.search("north").len(), 1);
        assert_eq!(store.search("wh-01").len(), 2);
        assert_eq!(store.search("").len(), store.len());
        assert!(store.search("   ").is_empty());
        assert_eq!(store.by_level(FacilityLevel::Building).len(), 2);
        assert_eq!(store.by_type(&FacilityType::Office).len(), 1);
    }

    #[test]
    fn test_statistics_has_every_key() {
        let mut store = FacilityHierarchy::new();
        building(&mut store, "Main");
        store
            .create(FacilityConfig::new("Shed", "hangar", FacilityLevel::Building))
            .unwrap();

        let stats = store.statistics();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.by_level.len(), 5);
        assert_eq!(stats.by_level[&FacilityLevel::Building], 2);
        assert_eq!(stats.by_level[&FacilityLevel::Zone], 0);
        assert_eq!(stats.by_type["warehouse"], 1);
        assert_eq!(stats.by_type["traffic"], 0);
        assert_eq!(stats.by_type["hangar"], 1);
    }

    #[test]
    fn test_deep_merge_replaces_non_objects() {
        let mut target = Properties::new();
        target.insert("a".into(), json!({"x": 1}));
        target.insert("b".into(), json!([1, 2]));

        let mut patch = Properties::new();
        patch.insert("a".into(), json!(5));
        patch.insert("b".into(), json!({"y": 2}));
        deep_merge(&mut target, patch);

        assert_eq!(target["a"], json!(5));
        assert_eq!(target["b"], json!({"y": 2}));
    }

    #[test]
    fn test_to_dot() {
        let mut store = FacilityHierarchy::new();
        let wh = building(&mut store, "Main");
        child(&mut store, &wh, "Ground", FacilityType::Warehouse, FacilityLevel::Floor);

        let dot = store.to_dot();

        assert!(dot.contains("digraph facilities"));
        assert!(dot.contains("WH-01-F01"));
        assert!(dot.contains(&format!("\"{}\" ->", wh.id())));
    }
}
