use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{DEFAULT_WINDOW_START, PriceSeries};
use crate::error::AppError;

/// Fixed lower-bound date scoping statistics and charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub start: NaiveDate,
}

impl AnalysisWindow {
    pub fn new(start: NaiveDate) -> Self {
        Self { start }
    }

    /// Parse a `YYYY-MM-DD` lower bound.
    pub fn parse(start: &str) -> Result<Self, AppError> {
        let start = NaiveDate::parse_from_str(start.trim(), "%Y-%m-%d")
            .map_err(|e| AppError::config(format!("Invalid window start '{start}': {e}")))?;
        Ok(Self { start })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start
    }

    /// Keep only observations dated on or after the lower bound.
    pub fn apply(&self, series: &PriceSeries) -> PriceSeries {
        let kept = series
            .points()
            .iter()
            .filter(|p| self.contains(p.date))
            .copied()
            .collect();
        PriceSeries::from_sorted_unique(kept)
    }
}

impl Default for AnalysisWindow {
    fn default() -> Self {
        let start = NaiveDate::parse_from_str(DEFAULT_WINDOW_START, "%Y-%m-%d").unwrap_or(NaiveDate::MIN);
        Self { start }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RawCell, RawRecord};
    use crate::series::normalize;

    fn series(rows: &[(&str, f64)]) -> PriceSeries {
        let records: Vec<RawRecord> = rows
            .iter()
            .enumerate()
            .map(|(i, (date, price))| RawRecord {
                line: i + 2,
                date: RawCell::Text(date.to_string()),
                price: RawCell::Number(*price),
            })
            .collect();
        normalize(&records).series
    }

    #[test]
    fn default_window_starts_2021() {
        assert_eq!(
            AnalysisWindow::default().start,
            NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()
        );
    }

    #[test]
    fn filter_is_exact_date_predicate() {
        let full = series(&[
            ("2020-12-30", 48.0),
            ("2020-12-31", 49.0),
            ("2021-01-01", 50.0),
            ("2021-06-15", 70.0),
        ]);
        let window = AnalysisWindow::default();
        let filtered = window.apply(&full);

        assert!(filtered.dates().all(|d| window.contains(d)));
        for p in full.points() {
            if window.contains(p.date) {
                assert!(filtered.points().contains(p));
            }
        }
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn all_dates_before_window_yields_empty() {
        let full = series(&[("2019-01-02", 60.0), ("2020-05-05", 30.0)]);
        assert!(AnalysisWindow::default().apply(&full).is_empty());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(AnalysisWindow::parse("01/01/2021").is_err());
        assert!(AnalysisWindow::parse("2022-03-01").is_ok());
    }
}
