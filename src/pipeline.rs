//! Pipeline entry points. Each run loads its inputs fully, builds the report
//! views and hands them to a [`ChartRenderer`]; the two pipelines share
//! nothing but the settings and lookup table.

use tracing::info;

use crate::config::Settings;
use crate::error::Result;
use crate::loader::load_nwfs;
use crate::lookup::load_lookup;
use crate::output::{preview_table_rows, write_csv, write_json, ChartRenderer};
use crate::pwr::{load_pwr, QuerySource};
use crate::reports::{nwfs_charts, pwr_charts, Chart};
use crate::types::{LoadReport, RunSummary};
use crate::util::format_int;

pub const NWFS: &str = "nwfs";
pub const PWR: &str = "pwr";

pub fn run_nwfs(settings: &Settings, renderer: &mut dyn ChartRenderer) -> Result<RunSummary> {
    info!("executing NHS Workforce Statistics pipeline");
    let lookup = load_lookup(&settings.lookup_path)?;
    let (records, report) = load_nwfs(settings, &lookup)?;
    log_load(NWFS, &report);

    let snapshot = if settings.nwfs.snapshot {
        let path = settings.output_dir.join(NWFS).join("nwfs_snapshot.csv");
        write_csv(&path, &records)?;
        info!(path = %path.display(), "wrote NWFS snapshot");
        Some(path.display().to_string())
    } else {
        None
    };

    let charts = nwfs_charts(&records, &lookup, &settings.scope)?;
    let summary = RunSummary {
        pipeline: NWFS.to_string(),
        load: report,
        charts: render_all(renderer, &charts)?,
        snapshot,
    };
    write_json(&settings.output_dir.join(NWFS).join("summary.json"), &summary)?;
    Ok(summary)
}

pub fn run_pwr(
    settings: &Settings,
    source: &dyn QuerySource,
    renderer: &mut dyn ChartRenderer,
) -> Result<RunSummary> {
    info!("executing PWR Trends pipeline");
    let lookup = load_lookup(&settings.lookup_path)?;
    let (records, report) = load_pwr(settings, source, &lookup)?;
    log_load(PWR, &report);

    let charts = pwr_charts(&records, &lookup)?;
    let summary = RunSummary {
        pipeline: PWR.to_string(),
        load: report,
        charts: render_all(renderer, &charts)?,
        snapshot: None,
    };
    write_json(&settings.output_dir.join(PWR).join("summary.json"), &summary)?;
    Ok(summary)
}

fn render_all(renderer: &mut dyn ChartRenderer, charts: &[Chart]) -> Result<Vec<String>> {
    charts
        .iter()
        .map(|c| renderer.render(c).map(|p| p.display().to_string()))
        .collect()
}

fn log_load(pipeline: &str, report: &LoadReport) {
    info!(
        pipeline,
        rows = %format_int(report.total_rows),
        retained = %format_int(report.retained_rows),
        unmapped = report.unmapped_rows,
        "canonicalised extract"
    );
    preview_table_rows(std::slice::from_ref(report), 1);
}
