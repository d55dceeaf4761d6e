//! Raw rows -> `PriceSeries`.
//!
//! Row-level problems never fail the pass: rows with an unparseable date or a
//! missing/invalid price are skipped and counted in the `NormalizeReport`.
//! Duplicate dates keep the price of the last row seen in source order.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::domain::{NormalizeReport, PricePoint, PriceSeries, RawCell, RawRecord};

/// Output of a normalization pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub series: PriceSeries,
    pub report: NormalizeReport,
}

/// Normalize raw rows into a date-ordered, duplicate-free series.
pub fn normalize(records: &[RawRecord]) -> Normalized {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut report = NormalizeReport {
        rows_read: records.len(),
        ..NormalizeReport::default()
    };

    for record in records {
        let Some(date) = parse_date_cell(&record.date) else {
            report.dropped_invalid_date += 1;
            debug!(line = record.line, "dropping row with missing/invalid date");
            continue;
        };
        let Some(price) = parse_price_cell(&record.price) else {
            report.dropped_missing_price += 1;
            debug!(line = record.line, %date, "dropping row with missing/invalid price");
            continue;
        };
        if by_date.insert(date, price).is_some() {
            report.duplicate_dates += 1;
        }
    }

    let points: Vec<PricePoint> = by_date
        .into_iter()
        .map(|(date, price)| PricePoint { date, price })
        .collect();

    report.rows_normalized = points.len();
    report.rows_in_window = points.len();

    let dropped = report.dropped_invalid_date + report.dropped_missing_price;
    if dropped > 0 {
        warn!(
            dropped,
            invalid_date = report.dropped_invalid_date,
            missing_price = report.dropped_missing_price,
            "skipped rows during normalization"
        );
    }
    if report.duplicate_dates > 0 {
        warn!(duplicates = report.duplicate_dates, "duplicate dates resolved (last row wins)");
    }

    Normalized {
        series: PriceSeries::from_sorted_unique(points),
        report,
    }
}

fn parse_date_cell(cell: &RawCell) -> Option<NaiveDate> {
    match cell {
        RawCell::DateTime(dt) => Some(dt.date()),
        RawCell::Text(s) => parse_date(s.trim()),
        RawCell::Number(_) | RawCell::Empty => None,
    }
}

/// Parse a textual date.
///
/// ISO dates are the norm, but spreadsheet exports frequently carry a time
/// component or day-first layouts; a small fixed set keeps parsing
/// deterministic.
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    const DATE_FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    const DATETIME_FMTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

fn parse_price_cell(cell: &RawCell) -> Option<f64> {
    let v = match cell {
        RawCell::Number(v) => *v,
        RawCell::Text(s) => s.trim().parse::<f64>().ok()?,
        RawCell::DateTime(_) | RawCell::Empty => return None,
    };
    if v.is_finite() { Some(v) } else { None }
}
