use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{NwfsColumns, OrgScope, Settings};
use crate::error::{PipelineError, Result};
use crate::reconcile::{build_role_map, search};
use crate::table::RawTable;
use crate::types::{LoadReport, LookupEntry, WorkforceRecord};
use crate::util::{afc_band, parse_f64_safe, parse_period, period_label};

/// Staff group values for allied health roles all contain this fragment.
pub const AHP_GROUP_FRAGMENT: &str = "_Allied";

const SRC_DATE: &str = "Date";
const SRC_ORG: &str = "Org code";
const SRC_FTE: &str = "Total FTE";

const COL_PERIOD: &str = "period";
const COL_ORG: &str = "org_code";
const COL_GROUP: &str = "staff_group_2";
const COL_ROLE: &str = "staff_role";
const COL_BAND: &str = "afc_band";
const COL_WTE: &str = "wte";

/// Every regular file in `dir`, sorted by name.
pub fn list_extract_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Concatenate every extract in `dir` into one table. No deduplication.
pub fn load_extracts(dir: &Path) -> Result<(RawTable, usize)> {
    let files = list_extract_files(dir)?;
    let mut combined = RawTable::default();
    for path in &files {
        let table = RawTable::read_csv(path)?;
        debug!(file = %path.display(), rows = table.len(), "read extract");
        combined.append(table, &path.display().to_string())?;
    }
    Ok((combined, files.len()))
}

/// Turn the concatenated raw extracts into canonical workforce records for
/// the configured organisations and allied health staff groups.
pub fn canonicalise(
    raw: &RawTable,
    columns: &NwfsColumns,
    scope: &OrgScope,
    lookup: &[LookupEntry],
) -> Result<(Vec<WorkforceRecord>, LoadReport)> {
    let table = raw.project(&[
        (SRC_DATE, COL_PERIOD),
        (SRC_ORG, COL_ORG),
        (columns.staff_group.as_str(), COL_GROUP),
        (columns.role.as_str(), COL_ROLE),
        (columns.band.as_str(), COL_BAND),
        (SRC_FTE, COL_WTE),
    ])?;

    let table = table.filter(COL_ORG, |code| scope.contains(code))?;

    let groups: HashSet<String> = search(&table, COL_GROUP, AHP_GROUP_FRAGMENT)?
        .into_iter()
        .collect();
    let table = table
        .filter(COL_GROUP, |g| groups.contains(g))?
        .drop_column(COL_GROUP)?;

    let roles = build_role_map(&table, COL_ROLE, lookup)?;

    let period = table.column_index(COL_PERIOD)?;
    let org = table.column_index(COL_ORG)?;
    let role = table.column_index(COL_ROLE)?;
    let band = table.column_index(COL_BAND)?;
    let wte = table.column_index(COL_WTE)?;

    let mut records = Vec::with_capacity(table.len());
    let mut unmapped = 0usize;
    for row in table.rows() {
        let date = parse_period(&row[period])?;
        let (staff_role, staff_role_shorthand) = roles.resolve(&row[role]);
        if staff_role.is_none() {
            unmapped += 1;
        }
        let org_code = row[org].clone();
        let org_shorthand = scope
            .shorthand(&org_code)
            .map(str::to_string)
            .unwrap_or_default();
        let value = parse_f64_safe(Some(row[wte].as_str())).ok_or_else(|| PipelineError::InvalidNumber {
            column: SRC_FTE.to_string(),
            value: row[wte].clone(),
        })?;
        records.push(WorkforceRecord {
            period: date,
            org_code,
            org_shorthand,
            staff_role,
            staff_role_shorthand,
            afc_band: afc_band(&row[band])?,
            wte: value,
            period_datapoint: period_label(date),
        });
    }

    if unmapped > 0 {
        warn!(rows = unmapped, "staff roles with no lookup match");
    }
    let report = LoadReport {
        files: 0,
        total_rows: raw.len(),
        retained_rows: records.len(),
        unmapped_rows: unmapped,
    };
    Ok((records, report))
}

/// Load, filter and reconcile the NWFS extract directory.
pub fn load_nwfs(
    settings: &Settings,
    lookup: &[LookupEntry],
) -> Result<(Vec<WorkforceRecord>, LoadReport)> {
    let (raw, files) = load_extracts(&settings.nwfs.extract_dir)?;
    info!(
        dir = %settings.nwfs.extract_dir.display(),
        files,
        rows = raw.len(),
        "loaded NWFS extracts"
    );
    let (records, mut report) = canonicalise(&raw, &settings.nwfs.columns, &settings.scope, lookup)?;
    report.files = files;
    Ok((records, report))
}
