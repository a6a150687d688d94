use chrono::NaiveDate;
use serde::Serialize;
use tabled::Tabled;

/// One row of the role lookup table: fragment, front end name, shorthand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupEntry {
    pub raw_fragment: String,
    pub canonical_role: String,
    pub role_shorthand: String,
}

/// Canonical NWFS row after filtering and name reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkforceRecord {
    pub period: NaiveDate,
    pub org_code: String,
    pub org_shorthand: String,
    pub staff_role: Option<String>,
    pub staff_role_shorthand: Option<String>,
    pub afc_band: String,
    pub wte: f64,
    pub period_datapoint: String,
}

/// Vacancy and contract row sourced from the PWR query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VacancyRecord {
    pub fin_year: String,
    pub fin_month: u32,
    pub contract: String,
    pub staff_role: Option<String>,
    pub staff_role_shorthand: Option<String>,
    pub vacancy: Option<f64>,
    pub wte: Option<f64>,
    pub period: String,
    pub period_datapoint: String,
}

/// Row counts reported after an extract has been canonicalised.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Tabled)]
pub struct LoadReport {
    #[tabled(rename = "Files")]
    pub files: usize,
    #[tabled(rename = "RowsLoaded")]
    pub total_rows: usize,
    #[tabled(rename = "RowsRetained")]
    pub retained_rows: usize,
    #[tabled(rename = "UnmappedRoles")]
    pub unmapped_rows: usize,
}

/// Written as `summary.json` next to each pipeline's chart files.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub pipeline: String,
    pub load: LoadReport,
    pub charts: Vec<String>,
    pub snapshot: Option<String>,
}
