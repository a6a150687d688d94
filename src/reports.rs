use crate::aggregate::{group_sum, AggregateTable, Dimension, Measure};
use crate::config::OrgScope;
use crate::error::Result;
use crate::lookup::role_shorthands;
use crate::types::{LookupEntry, VacancyRecord, WorkforceRecord};
use crate::util::{latest, period_label, NON_AFC};

/// Fixed AfC band axis for band charts.
pub const AFC_BANDS: [&str; 12] = [
    "2", "3", "4", "5", "6", "7", "8a", "8b", "8c", "8d", "9", NON_AFC,
];

pub const SUBSTANTIVE: &str = "Substantive";

/// One report view: the aggregate a single chart image is drawn from.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub pipeline: &'static str,
    pub name: &'static str,
    pub title: String,
    pub table: AggregateTable,
}

pub fn nwfs_charts(
    records: &[WorkforceRecord],
    lookup: &[LookupEntry],
    scope: &OrgScope,
) -> Result<Vec<Chart>> {
    let current_period = latest(records.iter().map(|r| r.period));
    let current: Vec<&WorkforceRecord> = records
        .iter()
        .filter(|r| Some(r.period) == current_period)
        .collect();
    let label = current_period.map(period_label).unwrap_or_default();
    let roles = role_shorthands(lookup);

    let chart = |name: &'static str, title: String, table: AggregateTable| Chart {
        pipeline: "nwfs",
        name,
        title,
        table,
    };

    Ok(vec![
        chart(
            "wte_by_role",
            format!("AHP WTE by Staff Role ({})", label),
            group_sum(current.iter().copied(), &[Dimension::StaffRoleShorthand], Measure::Wte)
                .zero_fill(Dimension::StaffRoleShorthand, &roles)?
                .order_by(Dimension::StaffRoleShorthand, &roles)?,
        ),
        chart(
            "wte_by_band",
            format!("AHP WTE by AfC Band ({})", label),
            group_sum(current.iter().copied(), &[Dimension::AfcBand], Measure::Wte)
                .zero_fill(Dimension::AfcBand, &AFC_BANDS)?
                .order_by(Dimension::AfcBand, &AFC_BANDS)?,
        ),
        chart(
            "wte_by_org",
            format!("AHP WTE by Organisation ({})", label),
            group_sum(current.iter().copied(), &[Dimension::OrgShorthand], Measure::Wte)
                .zero_fill(Dimension::OrgShorthand, scope.shorthands())?
                .order_by(Dimension::OrgShorthand, scope.shorthands())?,
        ),
        chart(
            "wte_by_role_band",
            format!("AHP WTE by Staff Role and AfC Band ({})", label),
            group_sum(
                current.iter().copied(),
                &[Dimension::StaffRoleShorthand, Dimension::AfcBand],
                Measure::Wte,
            )
            .zero_fill(Dimension::AfcBand, &AFC_BANDS)?
            .order_by(Dimension::AfcBand, &AFC_BANDS)?,
        ),
        chart(
            "wte_trend",
            "AHP WTE Trend".to_string(),
            group_sum(records, &[Dimension::Period, Dimension::PeriodDatapoint], Measure::Wte),
        ),
    ])
}

pub fn pwr_charts(records: &[VacancyRecord], lookup: &[LookupEntry]) -> Result<Vec<Chart>> {
    let by_contract = group_sum(
        records,
        &[Dimension::Period, Dimension::PeriodDatapoint, Dimension::Contract],
        Measure::Wte,
    );
    let substantive = by_contract.filter(Dimension::Contract, |c| c == SUBSTANTIVE)?;
    let temporary = by_contract.filter(Dimension::Contract, |c| c != SUBSTANTIVE)?;

    let current_period = records.iter().map(|r| r.period.as_str()).max();
    let current: Vec<&VacancyRecord> = records
        .iter()
        .filter(|r| Some(r.period.as_str()) == current_period)
        .collect();
    let label = current
        .first()
        .map(|r| r.period_datapoint.clone())
        .unwrap_or_default();
    let roles = role_shorthands(lookup);
    let vacancies = group_sum(current.iter().copied(), &[Dimension::StaffRoleShorthand], Measure::Vacancy)
        .zero_fill(Dimension::StaffRoleShorthand, &roles)?
        .order_by(Dimension::StaffRoleShorthand, &roles)?;

    Ok(vec![
        Chart {
            pipeline: "pwr",
            name: "wte_trend_substantive",
            title: "Secondary Care AHP - SIP Trend (Substantive)".to_string(),
            table: substantive,
        },
        Chart {
            pipeline: "pwr",
            name: "wte_trend_bank_agency",
            title: "Secondary Care AHP - SIP Trend (Bank & Agency)".to_string(),
            table: temporary,
        },
        Chart {
            pipeline: "pwr",
            name: "vacancy_by_role",
            title: format!("AHP Vacancies by Staff Role ({})", label),
            table: vacancies,
        },
    ])
}
