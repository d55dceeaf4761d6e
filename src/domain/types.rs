//! Shared domain types.
//!
//! These types are plain values: the pipeline produces them and the report/TUI
//! layers only read them.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Lower bound of the default analysis window.
pub const DEFAULT_WINDOW_START: &str = "2021-01-01";

/// Default forecast horizon: "today" and "next day".
pub const DEFAULT_HORIZON: usize = 2;

/// Trailing windows used for the moving-average panel.
pub const SHORT_MA_WINDOW: usize = 7;
pub const LONG_MA_WINDOW: usize = 30;

/// Column holding the observation date in the source spreadsheet.
pub const DATE_COLUMN: &str = "data";
/// Column holding the observed price in the source spreadsheet.
pub const PRICE_COLUMN: &str = "preco";

/// A single cell as decoded from the source table, before any validation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

/// One `(data, preco)` row as received from the source.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// 1-based line/row number in the source (header is line 1).
    pub line: usize,
    pub date: RawCell,
    pub price: RawCell,
}

/// A validated observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Date-ordered price observations.
///
/// Invariants: dates are unique and strictly increasing; every price is
/// finite. Only the normalizer and the analysis window build values of this
/// type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Wrap points that already satisfy the ordering/uniqueness invariants.
    pub(crate) fn from_sorted_unique(points: Vec<PricePoint>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].date < w[1].date));
        debug_assert!(points.iter().all(|p| p.price.is_finite()));
        Self { points }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.price)
    }
}

/// A model prediction for one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Direction of the next-step forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
}

/// Descriptive statistics over the filtered price column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedStatistics {
    pub count: usize,
    pub max: f64,
    pub min: f64,
    pub mean: f64,
    /// Sample standard deviation (N-1 denominator); `None` with fewer than two observations.
    pub std_dev: Option<f64>,
}

/// Highest price observed in a calendar month, across all years.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPeak {
    /// Month number, 1-12.
    pub month: u32,
    pub max: f64,
}

/// Prices of a single calendar year, keyed by day of year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearTrace {
    pub year: i32,
    /// `(day_of_year, price)`, day 1 = January 1st.
    pub points: Vec<(u32, f64)>,
}

/// One bar of the price distribution histogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Row accounting for a normalization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeReport {
    pub rows_read: usize,
    pub dropped_invalid_date: usize,
    pub dropped_missing_price: usize,
    /// Rows replaced by a later row carrying the same date.
    pub duplicate_dates: usize,
    /// Rows in the normalized series (before the analysis window).
    pub rows_normalized: usize,
    /// Rows remaining after the analysis window.
    pub rows_in_window: usize,
}

/// Resolved configuration for one dashboard run.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub dataset_url: String,
    pub model_url: String,
    pub cache_dir: PathBuf,
    pub window_start: NaiveDate,
    pub horizon: usize,
    pub recent_days: usize,
    pub histogram_bins: usize,
}
