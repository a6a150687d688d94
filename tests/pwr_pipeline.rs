use std::fs;

use ahp_report::aggregate::Dimension;
use ahp_report::config::Settings;
use ahp_report::output::CsvChartRenderer;
use ahp_report::pipeline::run_pwr;
use ahp_report::pwr::{load_pwr, SqliteSource};
use ahp_report::lookup::load_lookup;
use ahp_report::reports::pwr_charts;
use rusqlite::Connection;

const CONFIG: &str = r#"
[scope]
org_codes = ["A"]
org_shorts = ["OA"]

[nhs_workforce_statistics]
rel_path = "nwfs"
colname_ahp = "Staff Group 2"
colname_role = "Staff Role"
colname_band = "AfC Band"

[pwr_trends]
database = "Workforce"
query_path = "sql/pwr_extract.sql"
"#;

const QUERY: &str = "SELECT fin_year, fin_month, contract, staff_role, vacancy, wte
FROM pwr_forms
ORDER BY fin_year, fin_month";

fn fixture() -> (tempfile::TempDir, Settings) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("docs")).unwrap();
    fs::create_dir_all(root.join("sql")).unwrap();
    fs::create_dir_all(root.join("db")).unwrap();
    fs::write(
        root.join("docs/nwfs_lookup.csv"),
        "fuzzy_name,front_name,short\nPhysio,Physiotherapist,PT\nOccupational,Occupational Therapist,OT\n",
    )
    .unwrap();
    fs::write(root.join("sql/pwr_extract.sql"), QUERY).unwrap();

    let conn = Connection::open(root.join("db/Workforce.db")).unwrap();
    conn.execute_batch(
        "CREATE TABLE pwr_forms (fin_year TEXT, fin_month INTEGER, contract TEXT,
                                 staff_role TEXT, vacancy REAL, wte REAL);
         INSERT INTO pwr_forms VALUES ('2023-24', 1, 'Substantive', 'Physiotherapist B6', 2.0, 40.0);
         INSERT INTO pwr_forms VALUES ('2023-24', 1, 'Bank', 'Physiotherapist B6', NULL, 3.0);
         INSERT INTO pwr_forms VALUES ('2023-24', 2, 'Substantive', 'Occupational Therapist', 1.0, 20.0);
         INSERT INTO pwr_forms VALUES ('2023-24', 2, 'Agency', 'Occupational Therapist', NULL, 1.5);
         INSERT INTO pwr_forms VALUES ('2023-24', 2, 'Substantive', 'Physiotherapist B5', 0.5, 38.0);",
    )
    .unwrap();
    drop(conn);

    let address = root.join("db").display().to_string();
    let env = move |name: &str| match name {
        "PIPELINE_PWR" => Some("true".to_string()),
        "SQL_ADDRESS" => Some(address.clone()),
        _ => None,
    };
    let settings = Settings::from_toml_str(CONFIG, root, &env).unwrap();
    (dir, settings)
}

fn open(settings: &Settings) -> SqliteSource {
    SqliteSource::open(settings.pwr.sql_address.as_deref().unwrap(), &settings.pwr.database).unwrap()
}

#[test]
fn query_rows_are_reconciled() {
    let (_dir, settings) = fixture();
    let lookup = load_lookup(&settings.lookup_path).unwrap();
    let (records, report) = load_pwr(&settings, &open(&settings), &lookup).unwrap();
    assert_eq!(report.total_rows, 5);
    assert_eq!(report.unmapped_rows, 0);
    assert!(records
        .iter()
        .all(|r| matches!(r.staff_role_shorthand.as_deref(), Some("PT") | Some("OT"))));

    let charts = pwr_charts(&records, &lookup).unwrap();
    let substantive = charts.iter().find(|c| c.name == "wte_trend_substantive").unwrap();
    assert_eq!(
        substantive.table.values(Dimension::PeriodDatapoint).unwrap(),
        vec!["Apr 23", "May 23"]
    );
    assert_eq!(substantive.table.total(), 98.0);

    let vacancies = charts.iter().find(|c| c.name == "vacancy_by_role").unwrap();
    assert_eq!(vacancies.title, "AHP Vacancies by Staff Role (May 23)");
    assert_eq!(vacancies.table.total(), 1.5);
}

#[test]
fn pipeline_writes_outputs() {
    let (dir, settings) = fixture();
    let mut renderer = CsvChartRenderer::new(&settings.output_dir);
    let summary = run_pwr(&settings, &open(&settings), &mut renderer).unwrap();
    assert_eq!(summary.charts.len(), 3);
    let temp = fs::read_to_string(dir.path().join("output/pwr/wte_trend_bank_agency.csv")).unwrap();
    assert_eq!(
        temp,
        "period,period_datapoint,contract,wte\n\
         2023-24_01,Apr 23,Bank,3.0000\n\
         2023-24_02,May 23,Agency,1.5000\n"
    );
    assert!(dir.path().join("output/pwr/summary.json").exists());
}
