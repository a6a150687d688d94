use std::fs;
use std::path::Path;

use ahp_report::aggregate::{group_sum, Dimension, Measure};
use ahp_report::config::Settings;
use ahp_report::error::PipelineError;
use ahp_report::loader::{load_extracts, load_nwfs};
use ahp_report::lookup::load_lookup;
use ahp_report::output::CsvChartRenderer;
use ahp_report::pipeline::run_nwfs;

const CONFIG: &str = r#"
[scope]
org_codes = ["A", "B"]
org_shorts = ["OA", "OB"]

[nhs_workforce_statistics]
rel_path = "nwfs"
colname_ahp = "Staff Group 2"
colname_role = "Staff Role"
colname_band = "AfC Band"
snapshot = true

[pwr_trends]
database = "Workforce"
"#;

const HEADER: &str = "Date,Org code,Org name,Staff Group 2,Staff Role,AfC Band,Total FTE\n";

fn write(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn fixture() -> (tempfile::TempDir, Settings) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        &root.join("docs/nwfs_lookup.csv"),
        "fuzzy_name,front_name,short\nPhysio,Physiotherapist,PT\nDietit,Dietitian,DT\nRadiograph,Radiographer,RAD\n",
    );
    write(
        &root.join("data/nwfs/2024_01.csv"),
        &format!(
            "{HEADER}2024-01-31,A,Org A,04_Allied,Senior Physiotherapist,Band 5,1.0\n\
             2024-01-31,B,Org B,04_Allied,Dietitian,Band 6,2.0\n\
             2024-01-31,C,Org C,04_Allied,Physiotherapist,Band 6,4.0\n"
        ),
    );
    write(
        &root.join("data/nwfs/2024_02.csv"),
        &format!(
            "{HEADER}2024-02-29,A,Org A,04_Allied,Physiotherapist,Band 6,2.0\n\
             2024-02-29,A,Org A,04_Allied,Physiotherapy Assistant,Band 6,3.0\n\
             2024-02-29,A,Org A,01_Nursing,Staff Nurse,Band 5,9.0\n\
             2024-02-29,B,Org B,04_Allied,Art Therapist,Non-AfC,0.5\n"
        ),
    );
    let settings = Settings::from_toml_str(CONFIG, root, &|_: &str| None).unwrap();
    (dir, settings)
}

#[test]
fn extracts_concatenate_without_dedup() {
    let (_dir, settings) = fixture();
    let (raw, files) = load_extracts(&settings.nwfs.extract_dir).unwrap();
    assert_eq!(files, 2);
    assert_eq!(raw.len(), 7);
}

#[test]
fn canonical_records_are_scoped_and_reconciled() {
    let (_dir, settings) = fixture();
    let lookup = load_lookup(&settings.lookup_path).unwrap();
    let (records, report) = load_nwfs(&settings, &lookup).unwrap();

    assert_eq!(report.files, 2);
    assert_eq!(report.total_rows, 7);
    assert_eq!(report.retained_rows, 5);
    assert_eq!(report.unmapped_rows, 1);
    assert!(records.iter().all(|r| r.org_code == "A" || r.org_code == "B"));

    let first = &records[0];
    assert_eq!(first.staff_role.as_deref(), Some("Physiotherapist"));
    assert_eq!(first.staff_role_shorthand.as_deref(), Some("PT"));
    assert_eq!(first.afc_band, "5");
    assert_eq!(first.wte, 1.0);
    assert_eq!(first.org_shorthand, "OA");
    assert_eq!(first.period_datapoint, "Jan 24");

    let art = records.iter().find(|r| r.afc_band == "Non-AfC").unwrap();
    assert_eq!(art.staff_role, None);

    let agg = group_sum(
        records.iter().filter(|r| r.period_datapoint == "Feb 24"),
        &[Dimension::StaffRole, Dimension::AfcBand],
        Measure::Wte,
    );
    let physio = agg
        .rows
        .iter()
        .find(|r| r.key[0].as_deref() == Some("Physiotherapist"))
        .unwrap();
    assert_eq!(physio.value, 5.0);
}

#[test]
fn pipeline_writes_charts_snapshot_and_summary() {
    let (dir, settings) = fixture();
    let mut renderer = CsvChartRenderer::new(&settings.output_dir);
    let summary = run_nwfs(&settings, &mut renderer).unwrap();

    assert_eq!(summary.charts.len(), 5);
    for chart in &summary.charts {
        assert!(Path::new(chart).exists(), "missing {}", chart);
    }
    let out = dir.path().join("output/nwfs");
    assert!(out.join("nwfs_snapshot.csv").exists());
    let summary_json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary_json["load"]["retained_rows"], 5);

    let by_org = fs::read_to_string(out.join("wte_by_org.csv")).unwrap();
    assert_eq!(by_org, "org_shorthand,wte\nOA,5.0000\nOB,0.5000\n");

    let by_role = fs::read_to_string(out.join("wte_by_role.csv")).unwrap();
    assert_eq!(
        by_role,
        "staff_role_shorthand,wte\nPT,5.0000\nDT,0.0000\nRAD,0.0000\n,0.5000\n"
    );

    let by_band = fs::read_to_string(out.join("wte_by_band.csv")).unwrap();
    let bands: Vec<&str> = by_band
        .lines()
        .skip(1)
        .map(|l| l.split(',').next().unwrap())
        .collect();
    assert_eq!(
        bands,
        vec!["2", "3", "4", "5", "6", "7", "8a", "8b", "8c", "8d", "9", "Non-AfC"]
    );
    assert!(by_band.contains("\n6,5.0000\n"));
}

#[test]
fn mismatched_extract_schema_is_fatal() {
    let (dir, settings) = fixture();
    write(
        &dir.path().join("data/nwfs/2024_03.csv"),
        "Date,Org code,Role\n2024-03-31,A,Physio\n",
    );
    let lookup = load_lookup(&settings.lookup_path).unwrap();
    let err = load_nwfs(&settings, &lookup).unwrap_err();
    assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
}

#[test]
fn missing_extract_dir_is_io_error() {
    let (dir, settings) = fixture();
    fs::remove_dir_all(dir.path().join("data/nwfs")).unwrap();
    let err = load_extracts(&settings.nwfs.extract_dir).unwrap_err();
    assert!(matches!(err, PipelineError::Io { .. }));
}
