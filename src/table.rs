//! Header-addressed string table used for raw extracts and SQL row sets.
//!
//! Raw inputs are kept as text until the loaders have projected, filtered and
//! reconciled them; only then are rows parsed into typed records.

use std::collections::HashSet;
use std::path::Path;

use csv::ReaderBuilder;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Read a CSV extract with a header row. Short rows are padded with
    /// empty cells so every row has one value per header.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let mut table = Self::new(headers);
        for result in rdr.records() {
            let record = result?;
            table.push_row(record.iter().map(str::to_string).collect());
        }
        Ok(table)
    }

    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| PipelineError::MissingColumn {
                column: column.to_string(),
            })
    }

    /// Values of one column in row order.
    pub fn column(&self, column: &str) -> Result<impl Iterator<Item = &str> + '_> {
        let idx = self.column_index(column)?;
        Ok(self.rows.iter().map(move |r| r[idx].as_str()))
    }

    /// Append `other`'s rows, aligning columns by name. Both tables must
    /// carry the same set of headers; `source` names `other` in the error.
    pub fn append(&mut self, other: RawTable, source: &str) -> Result<()> {
        if self.headers.is_empty() && self.rows.is_empty() {
            *self = other;
            return Ok(());
        }
        let mine: HashSet<&str> = self.headers.iter().map(String::as_str).collect();
        let theirs: HashSet<&str> = other.headers.iter().map(String::as_str).collect();
        if mine != theirs || self.headers.len() != other.headers.len() {
            return Err(PipelineError::SchemaMismatch {
                path: source.to_string(),
            });
        }
        let order: Vec<usize> = self
            .headers
            .iter()
            .map(|h| other.column_index(h))
            .collect::<Result<_>>()?;
        for row in other.rows {
            self.rows.push(order.iter().map(|&i| row[i].clone()).collect());
        }
        Ok(())
    }

    /// Keep only the listed `(source, target)` columns, renamed to `target`.
    pub fn project(&self, columns: &[(&str, &str)]) -> Result<RawTable> {
        let idx: Vec<usize> = columns
            .iter()
            .map(|(source, _)| self.column_index(source))
            .collect::<Result<_>>()?;
        Ok(RawTable {
            headers: columns.iter().map(|(_, target)| target.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| idx.iter().map(|&i| r[i].clone()).collect())
                .collect(),
        })
    }

    /// Rows whose `column` value satisfies `keep`.
    pub fn filter<F>(&self, column: &str, keep: F) -> Result<RawTable>
    where
        F: Fn(&str) -> bool,
    {
        let idx = self.column_index(column)?;
        Ok(RawTable {
            headers: self.headers.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| keep(&r[idx]))
                .cloned()
                .collect(),
        })
    }

    pub fn drop_column(&self, column: &str) -> Result<RawTable> {
        let idx = self.column_index(column)?;
        let strip = |v: &Vec<String>| {
            v.iter()
                .enumerate()
                .filter(|(i, _)| *i != idx)
                .map(|(_, s)| s.clone())
                .collect::<Vec<_>>()
        };
        Ok(RawTable {
            headers: strip(&self.headers),
            rows: self.rows.iter().map(strip).collect(),
        })
    }
}
