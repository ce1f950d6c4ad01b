// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Typed errors for the facility hierarchy and the identifier cache.
//!
//! Missing ids are not errors here: lookups return `Option`/`bool`. These
//! enums only cover requests the library refuses to carry out.

use crate::types::FacilityLevel;
use thiserror::Error;

/// Errors from creating facilities
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FacilityError {
    /// An explicit id is already taken
    #[error("Facility id already exists: {0}")]
    DuplicateId(String),

    /// Strict policy: the parent id does not resolve
    #[error("Parent facility not found: {0}")]
    ParentNotFound(String),

    /// Strict policy: the child is not exactly one level finer than its parent
    #[error("A {level} cannot be placed under a {parent_level}")]
    InvalidParentLevel {
        /// Level of the resolved parent
        parent_level: FacilityLevel,
        /// Level requested for the new node
        level: FacilityLevel,
    },
}

/// Errors from renaming or claiming layout identifiers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdCacheError {
    /// The new identifier is empty after trimming
    #[error("Location id must not be empty")]
    EmptyId,

    /// Another layout item already claims the identifier
    #[error("Location id already in use: {0}")]
    Collision(String),
}
