//! Vacancy and contract extract sourced from the PWR forms database.

use std::path::{Path, PathBuf};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::{PipelineError, Result};
use crate::reconcile::build_role_map;
use crate::table::RawTable;
use crate::types::{LoadReport, LookupEntry, VacancyRecord};
use crate::util::{fiscal_month_start, fiscal_period_key, parse_optional_f64, parse_u32_safe, period_label};

const COL_FIN_YEAR: &str = "fin_year";
const COL_FIN_MONTH: &str = "fin_month";
const COL_CONTRACT: &str = "contract";
const COL_ROLE: &str = "staff_role";
const COL_VACANCY: &str = "vacancy";
const COL_WTE: &str = "wte";

/// Executes the fixed PWR query and hands back the row set as text.
pub trait QuerySource {
    fn run(&self, sql: &str) -> Result<RawTable>;
}

/// SQLite backed [`QuerySource`].
pub struct SqliteSource {
    conn: Connection,
}

impl SqliteSource {
    /// Open `address` directly when it is a database file, otherwise
    /// `<address>/<database>.db`. The database is opened read-only.
    pub fn open(address: &str, database: &str) -> Result<Self> {
        let path = database_path(Path::new(address), database);
        let conn = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        info!(path = %path.display(), "connected to PWR database");
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

fn database_path(address: &Path, database: &str) -> PathBuf {
    if address.is_dir() {
        address.join(format!("{}.db", database))
    } else {
        address.to_path_buf()
    }
}

impl QuerySource for SqliteSource {
    fn run(&self, sql: &str) -> Result<RawTable> {
        let mut stmt = self.conn.prepare(sql)?;
        let headers: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let width = headers.len();
        let mut table = RawTable::new(headers);
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(cell_text(row.get_ref(i)?));
            }
            table.push_row(values);
        }
        Ok(table)
    }
}

fn cell_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}

pub fn read_query(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))
}

/// Reconcile staff roles on the query result. Rows are not filtered; the
/// query already scopes organisations and staff groups.
pub fn canonicalise(raw: &RawTable, lookup: &[LookupEntry]) -> Result<(Vec<VacancyRecord>, LoadReport)> {
    let roles = build_role_map(raw, COL_ROLE, lookup)?;

    let fin_year = raw.column_index(COL_FIN_YEAR)?;
    let fin_month = raw.column_index(COL_FIN_MONTH)?;
    let contract = raw.column_index(COL_CONTRACT)?;
    let role = raw.column_index(COL_ROLE)?;
    let vacancy = raw.column_index(COL_VACANCY)?;
    let wte = raw.column_index(COL_WTE)?;

    let mut records = Vec::with_capacity(raw.len());
    let mut unmapped = 0usize;
    for row in raw.rows() {
        let month = parse_u32_safe(Some(row[fin_month].as_str())).ok_or_else(|| PipelineError::InvalidNumber {
            column: COL_FIN_MONTH.to_string(),
            value: row[fin_month].clone(),
        })?;
        let year = row[fin_year].trim().to_string();
        let start = fiscal_month_start(&year, month)?;
        let (staff_role, staff_role_shorthand) = roles.resolve(&row[role]);
        if staff_role.is_none() {
            unmapped += 1;
        }
        records.push(VacancyRecord {
            period: fiscal_period_key(&year, month),
            period_datapoint: period_label(start),
            fin_year: year,
            fin_month: month,
            contract: row[contract].trim().to_string(),
            staff_role,
            staff_role_shorthand,
            vacancy: parse_optional_f64(COL_VACANCY, &row[vacancy])?,
            wte: parse_optional_f64(COL_WTE, &row[wte])?,
        });
    }

    if unmapped > 0 {
        warn!(rows = unmapped, "PWR staff roles with no lookup match");
    }
    let report = LoadReport {
        files: 0,
        total_rows: raw.len(),
        retained_rows: records.len(),
        unmapped_rows: unmapped,
    };
    Ok((records, report))
}

/// Run the PWR query against `source` and reconcile the result.
pub fn load_pwr(
    settings: &Settings,
    source: &dyn QuerySource,
    lookup: &[LookupEntry],
) -> Result<(Vec<VacancyRecord>, LoadReport)> {
    let sql = read_query(&settings.pwr.query_path)?;
    let raw = source.run(&sql)?;
    info!(rows = raw.len(), database = %settings.pwr.database, "executed PWR query");
    canonicalise(&raw, lookup)
}
