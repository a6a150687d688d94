//! Grouped sums over canonical records, and zero filling of category axes.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use chrono::NaiveDate;

use crate::error::{PipelineError, Result};
use crate::types::{VacancyRecord, WorkforceRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Period,
    PeriodDatapoint,
    OrgCode,
    OrgShorthand,
    StaffRole,
    StaffRoleShorthand,
    AfcBand,
    FinYear,
    FinMonth,
    Contract,
}

impl Dimension {
    pub fn name(self) -> &'static str {
        match self {
            Dimension::Period => "period",
            Dimension::PeriodDatapoint => "period_datapoint",
            Dimension::OrgCode => "org_code",
            Dimension::OrgShorthand => "org_shorthand",
            Dimension::StaffRole => "staff_role",
            Dimension::StaffRoleShorthand => "staff_role_shorthand",
            Dimension::AfcBand => "afc_band",
            Dimension::FinYear => "fin_year",
            Dimension::FinMonth => "fin_month",
            Dimension::Contract => "contract",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Wte,
    Vacancy,
}

impl Measure {
    pub fn name(self) -> &'static str {
        match self {
            Measure::Wte => "wte",
            Measure::Vacancy => "vacancy",
        }
    }
}

/// A row that can be grouped. Dimensions the record does not carry, and
/// null values, read as `None`.
pub trait Record {
    fn dimension(&self, dim: Dimension) -> Option<String>;
    fn measure(&self, measure: Measure) -> Option<f64>;
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl Record for WorkforceRecord {
    fn dimension(&self, dim: Dimension) -> Option<String> {
        match dim {
            Dimension::Period => Some(iso(self.period)),
            Dimension::PeriodDatapoint => Some(self.period_datapoint.clone()),
            Dimension::OrgCode => Some(self.org_code.clone()),
            Dimension::OrgShorthand => Some(self.org_shorthand.clone()),
            Dimension::StaffRole => self.staff_role.clone(),
            Dimension::StaffRoleShorthand => self.staff_role_shorthand.clone(),
            Dimension::AfcBand => Some(self.afc_band.clone()),
            Dimension::FinYear | Dimension::FinMonth | Dimension::Contract => None,
        }
    }

    fn measure(&self, measure: Measure) -> Option<f64> {
        match measure {
            Measure::Wte => Some(self.wte),
            Measure::Vacancy => None,
        }
    }
}

impl Record for VacancyRecord {
    fn dimension(&self, dim: Dimension) -> Option<String> {
        match dim {
            Dimension::Period => Some(self.period.clone()),
            Dimension::PeriodDatapoint => Some(self.period_datapoint.clone()),
            Dimension::StaffRole => self.staff_role.clone(),
            Dimension::StaffRoleShorthand => self.staff_role_shorthand.clone(),
            Dimension::FinYear => Some(self.fin_year.clone()),
            Dimension::FinMonth => Some(format!("{:02}", self.fin_month)),
            Dimension::Contract => Some(self.contract.clone()),
            Dimension::OrgCode | Dimension::OrgShorthand | Dimension::AfcBand => None,
        }
    }

    fn measure(&self, measure: Measure) -> Option<f64> {
        match measure {
            Measure::Wte => self.wte,
            Measure::Vacancy => self.vacancy,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub key: Vec<Option<String>>,
    pub value: f64,
}

/// Result of [`group_sum`]: one row per key combination, sorted by key.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateTable {
    pub dimensions: Vec<Dimension>,
    pub measure: Measure,
    pub rows: Vec<AggregateRow>,
}

/// Group `records` by `dimensions` and sum `measure`.
///
/// Only combinations present in the input produce rows. Missing measure
/// values are skipped; a group whose values are all missing sums to zero.
pub fn group_sum<'a, R, I>(records: I, dimensions: &[Dimension], measure: Measure) -> AggregateTable
where
    R: Record + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let mut groups: BTreeMap<Vec<Option<String>>, f64> = BTreeMap::new();
    for r in records {
        let key = dimensions.iter().map(|d| r.dimension(*d)).collect();
        *groups.entry(key).or_insert(0.0) += r.measure(measure).unwrap_or(0.0);
    }
    AggregateTable {
        dimensions: dimensions.to_vec(),
        measure,
        rows: groups
            .into_iter()
            .map(|(key, value)| AggregateRow { key, value })
            .collect(),
    }
}

impl AggregateTable {
    fn position(&self, dim: Dimension) -> Result<usize> {
        self.dimensions
            .iter()
            .position(|d| *d == dim)
            .ok_or_else(|| PipelineError::UnknownDimension(dim.name().to_string()))
    }

    /// Distinct non-null values of `dim`, in row order.
    pub fn values(&self, dim: Dimension) -> Result<Vec<String>> {
        let idx = self.position(dim)?;
        let mut seen = HashSet::new();
        Ok(self
            .rows
            .iter()
            .filter_map(|r| r.key[idx].clone())
            .filter(|v| seen.insert(v.clone()))
            .collect())
    }

    /// Append a zero row for every expected value of `dim` not already
    /// present. Existing rows are untouched; other key parts are null.
    pub fn zero_fill<S: AsRef<str>>(mut self, dim: Dimension, expected: &[S]) -> Result<Self> {
        let idx = self.position(dim)?;
        let mut present: HashSet<String> = self
            .rows
            .iter()
            .filter_map(|r| r.key[idx].clone())
            .collect();
        for value in expected {
            let value = value.as_ref();
            if !present.insert(value.to_string()) {
                continue;
            }
            let mut key = vec![None; self.dimensions.len()];
            key[idx] = Some(value.to_string());
            self.rows.push(AggregateRow { key, value: 0.0 });
        }
        Ok(self)
    }

    /// Stable-sort rows so `dim` follows `axis`. Values off the axis, nulls
    /// included, keep their relative order after the axis values.
    pub fn order_by<S: AsRef<str>>(mut self, dim: Dimension, axis: &[S]) -> Result<Self> {
        let idx = self.position(dim)?;
        let rank: HashMap<&str, usize> = axis
            .iter()
            .enumerate()
            .rev()
            .map(|(i, v)| (v.as_ref(), i))
            .collect();
        self.rows.sort_by_key(|r| {
            r.key[idx]
                .as_deref()
                .and_then(|v| rank.get(v).copied())
                .unwrap_or(axis.len())
        });
        Ok(self)
    }

    /// Rows whose `dim` value satisfies `keep`; null values never match.
    pub fn filter<F>(&self, dim: Dimension, keep: F) -> Result<Self>
    where
        F: Fn(&str) -> bool,
    {
        let idx = self.position(dim)?;
        Ok(Self {
            dimensions: self.dimensions.clone(),
            measure: self.measure,
            rows: self
                .rows
                .iter()
                .filter(|r| r.key[idx].as_deref().is_some_and(&keep))
                .cloned()
                .collect(),
        })
    }

    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.value).sum()
    }
}
