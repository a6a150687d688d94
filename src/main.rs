// Entry point for the scheduled AHP report run.
//
// Settings are read once from `config.toml` and the environment, then each
// enabled pipeline runs to completion in turn. Any failure stops the run
// with a non-zero exit status.
use std::path::Path;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ahp_report::config::Settings;
use ahp_report::error::{ConfigError, Result};
use ahp_report::output::CsvChartRenderer;
use ahp_report::pipeline::{run_nwfs, run_pwr};
use ahp_report::pwr::SqliteSource;

const PREVIEW_ROWS: usize = 5;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(settings: &Settings) -> Result<()> {
    let mut renderer = CsvChartRenderer::new(&settings.output_dir).with_preview(PREVIEW_ROWS);

    if settings.pipeline_nwfs {
        let summary = run_nwfs(settings, &mut renderer)?;
        info!(charts = summary.charts.len(), "NWFS pipeline complete");
    }

    if settings.pipeline_pwr {
        let address = settings
            .pwr
            .sql_address
            .as_deref()
            .ok_or(ConfigError::MissingEnv("SQL_ADDRESS"))?;
        let source = SqliteSource::open(address, &settings.pwr.database)?;
        let summary = run_pwr(settings, &source, &mut renderer)?;
        info!(charts = summary.charts.len(), "PWR pipeline complete");
    }

    if !settings.pipeline_nwfs && !settings.pipeline_pwr {
        info!("no pipelines enabled; set PIPELINE_NWFS or PIPELINE_PWR");
    }
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();

    let settings = match Settings::load(Path::new(".")) {
        Ok(s) => s,
        Err(e) => {
            error!("failed to load settings: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("pipeline failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
