// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Facility commands - create, inspect, update and delete facilities

use super::Ctx;
use crate::types::{FacilityConfig, FacilityLevel, FacilityNode, FacilityType, FacilityUpdate, Properties};
use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

/// Arguments for `create`
pub struct CreateArgs {
    /// Display name
    pub name: String,
    /// Type tag
    pub facility_type: FacilityType,
    /// Level
    pub level: FacilityLevel,
    /// Parent id
    pub parent: Option<String>,
    /// Explicit id
    pub id: Option<String>,
    /// Initial properties
    pub props: Vec<(String, Value)>,
}

/// Arguments for `update`
pub struct UpdateArgs {
    /// New display name
    pub name: Option<String>,
    /// New type tag
    pub facility_type: Option<FacilityType>,
    /// Properties to merge
    pub props: Vec<(String, Value)>,
}

/// Parse a `key=value` property; values that are valid JSON keep their type
pub fn parse_property(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("Expected key=value, got: {raw}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("Property key must not be empty: {raw}"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Create a facility
pub fn create(ctx: &Ctx, args: CreateArgs) -> Result<()> {
    let mut session = ctx.load_session()?;

    let mut config = FacilityConfig::new(args.name, args.facility_type, args.level);
    config.id = args.id;
    config.parent_id = args.parent;
    config.properties = args.props.into_iter().collect();

    let node = session
        .hierarchy
        .create(config)
        .context("Failed to create facility")?;
    ctx.save_session(&session)?;
    info!("Created facility {} ({})", node.id(), node.location_code());

    if ctx.json {
        return ctx.print_json(&node);
    }
    println!("Created facility: {}", ctx.line(&node));
    if let Some(parent_id) = node.parent_id() {
        if session.hierarchy.get(parent_id).is_none() {
            eprintln!("Warning: parent {parent_id} does not exist; stub code assigned");
        }
    }
    Ok(())
}

/// List facilities, optionally filtered
pub fn list(ctx: &Ctx, level: Option<FacilityLevel>, facility_type: Option<FacilityType>) -> Result<()> {
    let session = ctx.load_session()?;

    let mut nodes: Vec<&FacilityNode> = session
        .hierarchy
        .nodes()
        .filter(|n| level.map_or(true, |l| n.level() == l))
        .filter(|n| facility_type.as_ref().map_or(true, |t| &n.facility_type == t))
        .collect();
    nodes.sort_by(|a, b| a.location_code().cmp(b.location_code()));

    if ctx.json {
        return ctx.print_json(&nodes);
    }
    if nodes.is_empty() {
        println!("No facilities found. Use 'facility-registry create' to add one.");
        return Ok(());
    }
    println!("Facilities ({}):", nodes.len());
    for node in nodes {
        println!("  {}", ctx.line(node));
    }
    Ok(())
}

/// Show one facility with its path and children
pub fn show(ctx: &Ctx, id: &str) -> Result<()> {
    let session = ctx.load_session()?;
    let hierarchy = &session.hierarchy;
    let node = hierarchy
        .get(id)
        .ok_or_else(|| anyhow::anyhow!("Facility not found: {}", id))?;

    if ctx.json {
        return ctx.print_json(node);
    }

    let path: Vec<&str> = hierarchy
        .hierarchy_path(id)
        .iter()
        .map(|n| n.name.as_str())
        .collect();

    println!("Facility: {}", node.name);
    println!("  id: {}", node.id());
    println!("  code: {}", ctx.code(node.location_code()));
    println!("  level: {}", node.level());
    println!("  type: {}", node.facility_type);
    println!("  path: {}", path.join(" / "));
    if let Some(parent_id) = node.parent_id() {
        println!("  parent: {parent_id}");
    }
    if !node.properties.is_empty() {
        println!("  properties:");
        for (key, value) in &node.properties {
            println!("    {key}: {value}");
        }
    }
    let children = hierarchy.children(id);
    println!("  children ({}):", children.len());
    for child in children {
        println!("    {}", ctx.line(child));
    }
    Ok(())
}

/// Update descriptive fields of a facility
pub fn update(ctx: &Ctx, id: &str, args: UpdateArgs) -> Result<()> {
    let mut session = ctx.load_session()?;

    let properties: Option<Properties> = (!args.props.is_empty()).then(|| args.props.into_iter().collect());
    let updates = FacilityUpdate {
        name: args.name,
        facility_type: args.facility_type,
        properties,
        ..FacilityUpdate::default()
    };

    let node = session
        .hierarchy
        .update(id, updates)
        .ok_or_else(|| anyhow::anyhow!("Facility not found: {}", id))?;
    ctx.save_session(&session)?;

    if ctx.json {
        return ctx.print_json(&node);
    }
    println!("Updated facility: {}", ctx.line(&node));
    Ok(())
}

/// Delete a facility and everything under it
pub fn delete(ctx: &Ctx, id: &str) -> Result<()> {
    let mut session = ctx.load_session()?;
    let removed = 1 + session.hierarchy.descendants(id).len();

    if session.hierarchy.delete(id) {
        ctx.save_session(&session)?;
        println!("Deleted facility {id} ({removed} removed)");
    } else {
        println!("Facility not found: {id}");
    }
    Ok(())
}

/// Search facilities by name or code
pub fn search(ctx: &Ctx, query: &str) -> Result<()> {
    let session = ctx.load_session()?;
    let mut hits = session.hierarchy.search(query);
    hits.sort_by(|a, b| a.location_code().cmp(b.location_code()));

    if ctx.json {
        return ctx.print_json(&hits);
    }
    if hits.is_empty() {
        println!("No facilities match '{query}'");
        return Ok(());
    }
    println!("Matches ({}):", hits.len());
    for node in hits {
        println!("  {}", ctx.line(node));
    }
    Ok(())
}
