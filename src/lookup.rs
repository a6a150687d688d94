use std::collections::HashSet;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};
use crate::types::LookupEntry;

/// Shorthand codes are printed in chart legends and must stay this short.
pub const MAX_SHORTHAND_LEN: usize = 4;

/// Read the role lookup table: three ordered columns (fragment, front end
/// name, shorthand) under a header row. Column names are not checked.
pub fn load_lookup(path: &Path) -> Result<Vec<LookupEntry>> {
    let rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let entries = read_entries(rdr)?;
    debug!(path = %path.display(), entries = entries.len(), "loaded role lookup");
    Ok(entries)
}

pub fn read_entries<R: std::io::Read>(mut rdr: csv::Reader<R>) -> Result<Vec<LookupEntry>> {
    let mut entries = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let field = |i: usize| record.get(i).map(str::trim).filter(|s| !s.is_empty());
        let (Some(fragment), Some(canonical), Some(shorthand)) = (field(0), field(1), field(2))
        else {
            return Err(PipelineError::InvalidLookup {
                line,
                reason: format!("expected 3 non-empty columns, found {}", record.len()),
            });
        };
        entries.push(LookupEntry {
            raw_fragment: fragment.to_string(),
            canonical_role: canonical.to_string(),
            role_shorthand: shorthand.to_string(),
        });
    }
    warn_on_shorthands(&entries);
    Ok(entries)
}

fn warn_on_shorthands(entries: &[LookupEntry]) {
    let mut seen: HashSet<&str> = HashSet::new();
    for e in entries {
        if e.role_shorthand.chars().count() > MAX_SHORTHAND_LEN {
            warn!(
                shorthand = %e.role_shorthand,
                role = %e.canonical_role,
                "role shorthand longer than {} characters", MAX_SHORTHAND_LEN
            );
        }
        if !seen.insert(e.role_shorthand.as_str()) {
            warn!(shorthand = %e.role_shorthand, "role shorthand used by more than one lookup row");
        }
    }
}

/// Distinct shorthand codes in lookup order; used as the fixed role axis.
pub fn role_shorthands(entries: &[LookupEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter(|e| seen.insert(e.role_shorthand.as_str()))
        .map(|e| e.role_shorthand.clone())
        .collect()
}
