//! Substring based reconciliation of raw staff role names.
//!
//! This is ordered substring containment, not fuzzy matching: a raw value
//! maps to a lookup entry when the entry's fragment occurs in it verbatim
//! (case-sensitive). When several fragments match the same value the entry
//! listed last in the lookup table takes priority.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::error::Result;
use crate::table::RawTable;
use crate::types::LookupEntry;

/// Distinct values of `column` that contain `fragment`, in first-seen order.
pub fn search(table: &RawTable, column: &str, fragment: &str) -> Result<Vec<String>> {
    Ok(search_values(table.column(column)?, fragment)
        .into_iter()
        .map(str::to_string)
        .collect())
}

pub fn search_values<'a, I>(values: I, fragment: &str) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| v.contains(fragment))
        .filter(|v| seen.insert(*v))
        .collect()
}

/// Raw role value to canonical name, and canonical name to shorthand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleMap {
    value_to_canonical: HashMap<String, String>,
    canonical_to_shorthand: HashMap<String, String>,
}

impl RoleMap {
    pub fn canonical(&self, raw: &str) -> Option<&str> {
        self.value_to_canonical.get(raw).map(String::as_str)
    }

    pub fn shorthand(&self, canonical: &str) -> Option<&str> {
        self.canonical_to_shorthand.get(canonical).map(String::as_str)
    }

    /// Canonical role and shorthand for a raw value; both `None` if unmapped.
    pub fn resolve(&self, raw: &str) -> (Option<String>, Option<String>) {
        match self.canonical(raw) {
            Some(canonical) => (
                Some(canonical.to_string()),
                self.shorthand(canonical).map(str::to_string),
            ),
            None => (None, None),
        }
    }

    pub fn len(&self) -> usize {
        self.value_to_canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value_to_canonical.is_empty()
    }
}

/// Build the role map for `column` of `table`.
///
/// Each distinct raw value is tested against every fragment once. A fragment
/// that matches nothing contributes no mapping and is not an error.
pub fn build_role_map(table: &RawTable, column: &str, entries: &[LookupEntry]) -> Result<RoleMap> {
    Ok(build_role_map_from(table.column(column)?, entries))
}

pub fn build_role_map_from<'a, I>(values: I, entries: &[LookupEntry]) -> RoleMap
where
    I: IntoIterator<Item = &'a str>,
{
    let mut map = RoleMap::default();
    for e in entries {
        map.canonical_to_shorthand
            .insert(e.canonical_role.clone(), e.role_shorthand.clone());
    }

    let mut seen = HashSet::new();
    for value in values {
        if !seen.insert(value) {
            continue;
        }
        let mut matches = entries.iter().filter(|e| value.contains(e.raw_fragment.as_str()));
        // Last matching entry wins.
        let Some(winner) = matches.next_back() else {
            continue;
        };
        if let Some(other) = matches.next_back() {
            warn!(
                value,
                chosen = %winner.raw_fragment,
                shadowed = %other.raw_fragment,
                "role value matches more than one lookup fragment"
            );
        }
        map.value_to_canonical
            .insert(value.to_string(), winner.canonical_role.clone());
    }

    debug!(
        distinct = seen.len(),
        mapped = map.value_to_canonical.len(),
        "built staff role map"
    );
    map
}
