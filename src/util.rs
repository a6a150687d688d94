// Utility helpers for parsing, label formatting and number display.
//
// Band labels, extract dates and fiscal months all arrive as free text; this
// module turns them into the typed values the rest of the crate works with.
use chrono::{NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

use crate::error::{PipelineError, Result};

pub const NON_AFC: &str = "Non-AfC";

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in CSV exports (commas, spaces).
///
/// - Trims whitespace.
/// - Strips thousands separators like `","` before parsing.
/// - Accepts anything `f64::from_str` does, exponent notation included.
/// - Returns `None` for empty input, parse failures and non-finite values.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    s.replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Parse an optional numeric cell: blank is `None`, anything else must parse.
pub fn parse_optional_f64(column: &str, value: &str) -> Result<Option<f64>> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_f64_safe(Some(value))
        .map(Some)
        .ok_or_else(|| PipelineError::InvalidNumber {
            column: column.to_string(),
            value: value.to_string(),
        })
}

pub fn parse_u32_safe(s: Option<&str>) -> Option<u32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    // SQL drivers can hand integers back as `4.0`.
    s.parse::<u32>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u32))
}

/// Parse an extract date. NWFS vintages have shipped ISO dates, UK style
/// `DD/MM/YYYY` and full timestamps.
pub fn parse_period(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .map_err(|_| PipelineError::InvalidDate(s.to_string()))
}

/// Short month-year label, e.g. `Jan 24`.
pub fn period_label(date: NaiveDate) -> String {
    date.format("%b %y").to_string()
}

/// Reduce a raw AfC band label to the value shown on charts.
///
/// `Non-AfC ...` labels collapse to `Non-AfC`; `Band N` yields `N`
/// (including the `8a`..`8d` sub-bands). Anything else is rejected.
pub fn afc_band(label: &str) -> Result<String> {
    let label = label.trim();
    if label.starts_with('N') {
        return Ok(NON_AFC.to_string());
    }
    let mut tokens = label.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some("Band"), Some(band)) => Ok(band.to_string()),
        _ => Err(PipelineError::UnrecognisedBand(label.to_string())),
    }
}

/// Map a fiscal month (1 = April) and fiscal year (`2023-24`) to the
/// calendar date of the first of that month.
pub fn fiscal_month_start(fin_year: &str, fin_month: u32) -> Result<NaiveDate> {
    if !(1..=12).contains(&fin_month) {
        return Err(PipelineError::InvalidNumber {
            column: "fin_month".to_string(),
            value: fin_month.to_string(),
        });
    }
    let start_year: i32 = fin_year
        .trim()
        .get(..4)
        .and_then(|y| y.parse().ok())
        .ok_or_else(|| PipelineError::InvalidNumber {
            column: "fin_year".to_string(),
            value: fin_year.to_string(),
        })?;
    let (year, month) = if fin_month <= 9 {
        (start_year, fin_month + 3)
    } else {
        (start_year + 1, fin_month - 9)
    };
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| PipelineError::InvalidNumber {
        column: "fin_year".to_string(),
        value: fin_year.to_string(),
    })
}

/// Sortable fiscal period key, e.g. `2023-24_01` for April 2023.
pub fn fiscal_period_key(fin_year: &str, fin_month: u32) -> String {
    format!("{}_{:02}", fin_year.trim(), fin_month)
}

/// Latest date in a set, if any.
pub fn latest<I: IntoIterator<Item = NaiveDate>>(dates: I) -> Option<NaiveDate> {
    dates.into_iter().max()
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_labels() {
        assert_eq!(afc_band("Band 6").unwrap(), "6");
        assert_eq!(afc_band("Band 8a").unwrap(), "8a");
        assert_eq!(afc_band("Non-AfC Band").unwrap(), NON_AFC);
        assert_eq!(afc_band("Non AfC grade").unwrap(), NON_AFC);
        assert!(matches!(
            afc_band("Grade 6"),
            Err(PipelineError::UnrecognisedBand(_))
        ));
        assert!(afc_band("Band").is_err());
        assert!(afc_band("").is_err());
    }

    #[test]
    fn period_formats() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(parse_period("2024-01-31").unwrap(), d);
        assert_eq!(parse_period("31/01/2024").unwrap(), d);
        assert_eq!(parse_period("2024-01-31T00:00:00").unwrap(), d);
        assert!(parse_period("January").is_err());
        assert_eq!(period_label(d), "Jan 24");
    }

    #[test]
    fn fiscal_months() {
        assert_eq!(
            fiscal_month_start("2023-24", 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 4, 1).unwrap()
        );
        assert_eq!(
            fiscal_month_start("2023-24", 9).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 1).unwrap()
        );
        assert_eq!(
            fiscal_month_start("2023-24", 12).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(fiscal_month_start("2023-24", 13).is_err());
        assert!(fiscal_month_start("FY", 3).is_err());
        assert_eq!(fiscal_period_key("2023-24", 3), "2023-24_03");
    }

    #[test]
    fn numbers() {
        assert_eq!(parse_f64_safe(Some(" 1,234.5 ")), Some(1234.5));
        assert_eq!(parse_f64_safe(Some("n/a")), None);
        assert_eq!(parse_f64_safe(Some("1.5e-3")), Some(0.0015));
        assert_eq!(parse_f64_safe(Some("1E2")), Some(100.0));
        assert_eq!(parse_f64_safe(Some("inf")), None);
        assert_eq!(parse_optional_f64("wte", " ").unwrap(), None);
        assert_eq!(parse_optional_f64("wte", "2.5e1").unwrap(), Some(25.0));
        assert!(matches!(
            parse_optional_f64("wte", "abc"),
            Err(PipelineError::InvalidNumber { column, value }) if column == "wte" && value == "abc"
        ));
        assert_eq!(parse_u32_safe(Some("4.0")), Some(4));
        assert_eq!(parse_u32_safe(Some("4.5")), None);
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-2.5, 1), "-2.5");
        assert_eq!(format_number(0.0, 2), "0.00");
        assert_eq!(format_int(9855usize), "9,855");
    }
}
