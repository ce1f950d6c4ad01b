// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Location code generation
//!
//! Codes are readable and hierarchical (`WH-01-F02-SA-003`) and unique among
//! the codes this generator has issued. Generation never fails: missing
//! parents fall back to stub codes and collisions get a numeric suffix.

use crate::types::{CodeReuse, FacilityLevel, FacilityType};
use chrono::Utc;
use std::collections::HashSet;
use tracing::debug;

/// What the generator needs to know about a resolved parent
#[derive(Debug, Clone)]
pub struct ParentContext<'a> {
    /// The parent's location code
    pub code: &'a str,
    /// Number of children currently attached to the parent
    pub child_count: usize,
    /// Location codes of the parent's zone-level children
    pub zone_codes: Vec<&'a str>,
}

/// Issues location codes and tracks which ones are taken
#[derive(Debug, Clone, Default)]
pub struct LocationCodeGenerator {
    issued: HashSet<String>,
    retired: HashSet<String>,
    reuse: CodeReuse,
}

impl LocationCodeGenerator {
    /// Create an empty generator
    #[must_use]
    pub fn new(reuse: CodeReuse) -> Self {
        Self {
            issued: HashSet::new(),
            retired: HashSet::new(),
            reuse,
        }
    }

    /// Produce and register a code for a new facility
    ///
    /// `parent` is `None` when the facility has no parent or the parent id
    /// does not resolve.
    pub fn generate(
        &mut self,
        level: FacilityLevel,
        facility_type: &FacilityType,
        parent: Option<&ParentContext<'_>>,
    ) -> String {
        let base = self.candidate(level, facility_type, parent);
        let code = self.make_unique(base);
        self.issued.insert(code.clone());
        debug!(%level, %facility_type, code = %code, "issued location code");
        code
    }

    fn candidate(
        &self,
        level: FacilityLevel,
        facility_type: &FacilityType,
        parent: Option<&ParentContext<'_>>,
    ) -> String {
        match (level, parent) {
            (FacilityLevel::Building, _) => {
                let prefix = building_prefix(facility_type);
                format!("{prefix}-{:02}", self.next_building_sequence(prefix))
            }
            (FacilityLevel::Floor, Some(p)) => format!("{}-F{:02}", p.code, p.child_count + 1),
            (FacilityLevel::Floor, None) => "F-01".into(),
            (FacilityLevel::Zone, Some(p)) => {
                let prefix = zone_prefix(facility_type);
                let marker = format!("-{prefix}");
                let existing = p
                    .zone_codes
                    .iter()
                    .filter(|code| code.contains(&marker))
                    .count();
                format!("{}-{prefix}{}", p.code, zone_letter(existing))
            }
            (FacilityLevel::Zone, None) => "Z-A".into(),
            (FacilityLevel::Location, Some(p)) => format!("{}-{:03}", p.code, p.child_count + 1),
            (FacilityLevel::Location, None) => "L-001".into(),
            (FacilityLevel::Organization, _) => fallback_code(),
        }
    }

    /// One past the highest sequence already used with this building prefix
    fn next_building_sequence(&self, prefix: &str) -> u32 {
        self.issued
            .iter()
            .chain(&self.retired)
            .filter_map(|code| building_sequence(code, prefix))
            .max()
            .map_or(1, |max| max.saturating_add(1))
    }

    fn make_unique(&self, base: String) -> String {
        if !self.is_taken(&base) {
            return base;
        }
        let mut counter = 1u32;
        loop {
            let candidate = format!("{base}-{counter:02}");
            if !self.is_taken(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    fn is_taken(&self, code: &str) -> bool {
        self.issued.contains(code) || self.retired.contains(code)
    }

    /// Give a code back after its facility was deleted
    ///
    /// Under [`CodeReuse::Retire`] the code is kept out of circulation.
    /// Returns false if the code was not issued.
    pub fn release(&mut self, code: &str) -> bool {
        if !self.issued.remove(code) {
            return false;
        }
        if self.reuse == CodeReuse::Retire {
            self.retired.insert(code.to_string());
        }
        debug!(code, reuse = ?self.reuse, "released location code");
        true
    }

    /// Mark a code as issued without generating it (used when restoring snapshots)
    pub fn reserve(&mut self, code: impl Into<String>) -> bool {
        self.issued.insert(code.into())
    }

    /// Mark a code as permanently retired (used when restoring snapshots)
    pub fn retire(&mut self, code: impl Into<String>) {
        let code = code.into();
        self.issued.remove(&code);
        self.retired.insert(code);
    }

    /// Whether a code is currently issued
    #[must_use]
    pub fn is_issued(&self, code: &str) -> bool {
        self.issued.contains(code)
    }

    /// Issued codes, sorted
    #[must_use]
    pub fn issued_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.issued.iter().cloned().collect();
        codes.sort();
        codes
    }

    /// Retired codes, sorted
    #[must_use]
    pub fn retired_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.retired.iter().cloned().collect();
        codes.sort();
        codes
    }

    /// Number of issued codes
    #[must_use]
    pub fn len(&self) -> usize {
        self.issued.len()
    }

    /// True when no code is issued
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }

    /// Forget every issued and retired code
    pub fn clear(&mut self) {
        self.issued.clear();
        self.retired.clear();
    }
}

/// Building code prefix for a facility type
#[must_use]
pub fn building_prefix(facility_type: &FacilityType) -> &'static str {
    match facility_type {
        FacilityType::Warehouse => "WH",
        FacilityType::Manufacturing => "MF",
        FacilityType::Office => "OF",
        FacilityType::DistributionCenter => "DC",
        FacilityType::MixedUse => "MX",
        _ => "BL",
    }
}

/// Zone code prefix for a facility type
#[must_use]
pub fn zone_prefix(facility_type: &FacilityType) -> &'static str {
    match facility_type {
        FacilityType::Storage => "S",
        FacilityType::Production => "P",
        FacilityType::Shipping => "SH",
        FacilityType::Receiving => "R",
        FacilityType::OfficeSpace => "O",
        FacilityType::Utilities => "U",
        FacilityType::Safety => "SF",
        FacilityType::Traffic => "T",
        _ => "Z",
    }
}

/// Zone suffix letters: 0 → A, 25 → Z, 26 → AA, 27 → AB, …
#[must_use]
pub fn zone_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index;
    loop {
        // n % 26 < 26, so the cast cannot truncate
        #[allow(clippy::cast_possible_truncation)]
        letters.push(char::from(b'A' + (n % 26) as u8));
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// Sequence number right after `{prefix}-` in a building-rooted code
fn building_sequence(code: &str, prefix: &str) -> Option<u32> {
    let rest = code.strip_prefix(prefix)?.strip_prefix('-')?;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn fallback_code() -> String {
    format!("GEN-{:06}", Utc::now().timestamp_millis().rem_euclid(1_000_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parent<'a>(code: &'a str, child_count: usize, zone_codes: Vec<&'a str>) -> ParentContext<'a> {
        ParentContext {
            code,
            child_count,
            zone_codes,
        }
    }

    #[test]
    fn test_building_sequence_increments_per_prefix() {
        let mut codes = LocationCodeGenerator::default();

        assert_eq!(codes.generate(FacilityLevel::Building, &FacilityType::Warehouse, None), "WH-01");
        assert_eq!(codes.generate(FacilityLevel::Building, &FacilityType::Warehouse, None), "WH-02");
        assert_eq!(codes.generate(FacilityLevel::Building, &FacilityType::Office, None), "OF-01");
        assert_eq!(
            codes.generate(FacilityLevel::Building, &FacilityType::from("hangar"), None),
            "BL-01"
        );
    }

    #[test]
    fn test_building_sequence_ignores_descendant_numbers() {
        let mut codes = LocationCodeGenerator::default();
        codes.reserve("WH-01");
        codes.reserve("WH-01-F01-SA-007");

        assert_eq!(codes.generate(FacilityLevel::Building, &FacilityType::Warehouse, None), "WH-02");
    }

    #[test]
    fn test_floor_and_location_use_child_count() {
        let mut codes = LocationCodeGenerator::default();

        let floor = codes.generate(FacilityLevel::Floor, &FacilityType::Warehouse, Some(&parent("WH-01", 1, vec![])));
        assert_eq!(floor, "WH-01-F02");

        let loc = codes.generate(FacilityLevel::Location, &FacilityType::Storage, Some(&parent("WH-01-F02-SA", 9, vec![])));
        assert_eq!(loc, "WH-01-F02-SA-010");
    }

    #[test]
    fn test_zone_letters_count_codes_containing_prefix() {
        let mut codes = LocationCodeGenerator::default();
        let zones = vec!["WH-01-F01-SA", "WH-01-F01-SHA", "WH-01-F01-RA"];

        // "-S" also appears in "-SHA", so storage sees two earlier zones
        let storage = codes.generate(FacilityLevel::Zone, &FacilityType::Storage, Some(&parent("WH-01-F01", 3, zones.clone())));
        assert_eq!(storage, "WH-01-F01-SC");

        let shipping = codes.generate(FacilityLevel::Zone, &FacilityType::Shipping, Some(&parent("WH-01-F01", 3, zones)));
        assert_eq!(shipping, "WH-01-F01-SHB");
    }

    #[test]
    fn test_zone_letter_wraps_to_two_letters() {
        assert_eq!(zone_letter(0), "A");
        assert_eq!(zone_letter(25), "Z");
        assert_eq!(zone_letter(26), "AA");
        assert_eq!(zone_letter(27), "AB");
        assert_eq!(zone_letter(52), "BA");
    }

    #[test]
    fn test_missing_parent_uses_stubs() {
        let mut codes = LocationCodeGenerator::default();

        assert_eq!(codes.generate(FacilityLevel::Floor, &FacilityType::Warehouse, None), "F-01");
        assert_eq!(codes.generate(FacilityLevel::Zone, &FacilityType::Storage, None), "Z-A");
        assert_eq!(codes.generate(FacilityLevel::Location, &FacilityType::Storage, None), "L-001");
        // Second stub collides and gets a suffix
        assert_eq!(codes.generate(FacilityLevel::Floor, &FacilityType::Warehouse, None), "F-01-01");
        assert_eq!(codes.generate(FacilityLevel::Floor, &FacilityType::Warehouse, None), "F-01-02");
    }

    #[test]
    fn test_organization_falls_back_to_gen_code() {
        let mut codes = LocationCodeGenerator::default();
        let code = codes.generate(FacilityLevel::Organization, &FacilityType::from("corporate"), None);

        assert!(code.starts_with("GEN-"));
        assert_eq!(code.len(), "GEN-".len() + 6);
        assert!(codes.is_issued(&code));
    }

    #[test]
    fn test_release_allows_reuse() {
        let mut codes = LocationCodeGenerator::new(CodeReuse::Release);
        codes.generate(FacilityLevel::Building, &FacilityType::Warehouse, None);
        let second = codes.generate(FacilityLevel::Building, &FacilityType::Warehouse, None);

        assert!(codes.release(&second));
        assert!(!codes.release(&second));
        assert_eq!(codes.generate(FacilityLevel::Building, &FacilityType::Warehouse, None), "WH-02");
    }

    #[test]
    fn test_retire_blocks_reuse() {
        let mut codes = LocationCodeGenerator::new(CodeReuse::Retire);
        codes.generate(FacilityLevel::Building, &FacilityType::Warehouse, None);
        let second = codes.generate(FacilityLevel::Building, &FacilityType::Warehouse, None);

        assert!(codes.release(&second));
        assert!(!codes.is_issued(&second));
        assert_eq!(codes.retired_codes(), vec!["WH-02".to_string()]);
        assert_eq!(codes.generate(FacilityLevel::Building, &FacilityType::Warehouse, None), "WH-03");

        let floor_parent = parent("WH-01", 0, vec![]);
        let floor = codes.generate(FacilityLevel::Floor, &FacilityType::Warehouse, Some(&floor_parent));
        codes.release(&floor);
        assert_eq!(
            codes.generate(FacilityLevel::Floor, &FacilityType::Warehouse, Some(&floor_parent)),
            "WH-01-F01-01"
        );
    }
}
