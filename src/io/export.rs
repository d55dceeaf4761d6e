//! Export dashboard outputs.
//!
//! - per-date CSV (price + moving averages), easy to open in a spreadsheet
//! - JSON summary (statistics, forecast, trend, row accounting)

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::app::pipeline::DashboardData;
use crate::domain::{DerivedStatistics, ForecastPoint, NormalizeReport, Trend};
use crate::error::AppError;

#[derive(Debug, Serialize)]
struct SeriesRow {
    date: NaiveDate,
    price: f64,
    ma_short: Option<f64>,
    ma_long: Option<f64>,
}

/// Write one row per filtered observation with its moving averages.
pub fn write_series_csv(path: &Path, data: &DashboardData) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::output(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);

    let short: HashMap<NaiveDate, f64> = data.ma_short.iter().map(|p| (p.date, p.price)).collect();
    let long: HashMap<NaiveDate, f64> = data.ma_long.iter().map(|p| (p.date, p.price)).collect();

    for p in data.series.points() {
        writer
            .serialize(SeriesRow {
                date: p.date,
                price: p.price,
                ma_short: short.get(&p.date).copied(),
                ma_long: long.get(&p.date).copied(),
            })
            .map_err(|e| AppError::output(format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::output(format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

/// Portable summary of one dashboard run.
#[derive(Debug, Serialize)]
pub struct SummaryFile {
    pub tool: String,
    pub window_start: NaiveDate,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub statistics: DerivedStatistics,
    pub horizon: usize,
    pub today: ForecastPoint,
    pub tomorrow: ForecastPoint,
    pub trend: Trend,
    pub rows: NormalizeReport,
}

impl SummaryFile {
    pub fn from_dashboard(data: &DashboardData) -> Self {
        Self {
            tool: env!("CARGO_PKG_NAME").to_string(),
            window_start: data.window.start,
            first_date: data.series.first().map(|p| p.date),
            last_date: data.series.last().map(|p| p.date),
            statistics: data.statistics,
            horizon: data.forecast.horizon,
            today: data.forecast.today,
            tomorrow: data.forecast.tomorrow,
            trend: data.trend,
            rows: data.normalize,
        }
    }
}

/// Write the JSON summary.
pub fn write_summary_json(path: &Path, data: &DashboardData) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::output(format!("Failed to create summary JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, &SummaryFile::from_dashboard(data))
        .map_err(|e| AppError::output(format!("Failed to write summary JSON: {e}")))?;

    Ok(())
}
