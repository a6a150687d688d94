use std::path::{Path, PathBuf};

use serde::Serialize;
use tabled::{builder::Builder, settings::Style, Table, Tabled};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::reports::Chart;
use crate::util::format_number;

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush().map_err(|e| PipelineError::io(path, e))?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s).map_err(|e| PipelineError::io(path, e))?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

/// Header row plus one text row per aggregate row; nulls render empty.
pub fn chart_records<F>(chart: &Chart, format_value: F) -> Vec<Vec<String>>
where
    F: Fn(f64) -> String,
{
    let t = &chart.table;
    let mut out = Vec::with_capacity(t.rows.len() + 1);
    let mut header: Vec<String> = t.dimensions.iter().map(|d| d.name().to_string()).collect();
    header.push(t.measure.name().to_string());
    out.push(header);
    for row in &t.rows {
        let mut rec: Vec<String> = row.key.iter().map(|k| k.clone().unwrap_or_default()).collect();
        rec.push(format_value(row.value));
        out.push(rec);
    }
    out
}

/// Consumer of report views. Image drawing lives behind this seam.
pub trait ChartRenderer {
    /// Render `chart`, returning the path of the artifact written.
    fn render(&mut self, chart: &Chart) -> Result<PathBuf>;
}

/// Writes each chart's series to `<output>/<pipeline>/<name>.csv` for the
/// plotting step, and optionally prints a markdown preview.
pub struct CsvChartRenderer {
    out_dir: PathBuf,
    preview_rows: usize,
}

impl CsvChartRenderer {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            preview_rows: 0,
        }
    }

    pub fn with_preview(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    fn preview(&self, chart: &Chart) {
        let mut builder = Builder::default();
        for rec in chart_records(chart, |v| format_number(v, 2))
            .into_iter()
            .take(self.preview_rows + 1)
        {
            builder.push_record(rec);
        }
        println!("{}", chart.title);
        println!("{}\n", builder.build().with(Style::markdown()));
    }
}

impl ChartRenderer for CsvChartRenderer {
    fn render(&mut self, chart: &Chart) -> Result<PathBuf> {
        let path = self
            .out_dir
            .join(chart.pipeline)
            .join(format!("{}.csv", chart.name));
        ensure_parent(&path)?;
        let mut wtr = csv::Writer::from_path(&path)?;
        for rec in chart_records(chart, |v| format!("{:.4}", v)) {
            wtr.write_record(&rec)?;
        }
        wtr.flush().map_err(|e| PipelineError::io(&path, e))?;
        info!(chart = chart.name, rows = chart.table.rows.len(), path = %path.display(), "wrote chart data");
        if self.preview_rows > 0 {
            self.preview(chart);
        }
        Ok(path)
    }
}
