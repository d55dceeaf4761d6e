//! Shared dashboard pipeline used by both the report and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load dataset + model -> normalize -> window -> forecast -> statistics -> display series
//!
//! The front-ends then only deal with presentation.

use tracing::info;

use crate::analysis;
use crate::data::Loaders;
use crate::domain::{
    DashboardConfig, DerivedStatistics, HistogramBin, LONG_MA_WINDOW, MonthlyPeak, NormalizeReport, PricePoint,
    PriceSeries, RawRecord, SHORT_MA_WINDOW, Trend, YearTrace,
};
use crate::error::AppError;
use crate::forecast::{ForecastOutcome, forecast_next};
use crate::models::Forecaster;
use crate::series::{AnalysisWindow, normalize};

/// Everything a presentation layer needs, as plain values.
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub window: AnalysisWindow,
    pub normalize: NormalizeReport,
    /// Normalized series restricted to the analysis window.
    pub series: PriceSeries,
    pub statistics: DerivedStatistics,
    pub forecast: ForecastOutcome,
    pub trend: Trend,
    pub ma_short: Vec<PricePoint>,
    pub ma_long: Vec<PricePoint>,
    pub monthly_peaks: Vec<MonthlyPeak>,
    pub yearly: Vec<YearTrace>,
    pub recent: Vec<PricePoint>,
    pub histogram: Vec<HistogramBin>,
}

/// Load (memoized) dataset and model, then run the full pipeline.
pub fn run_dashboard(loaders: &Loaders, config: &DashboardConfig) -> Result<DashboardData, AppError> {
    let dataset = loaders.dataset(&config.dataset_url)?;
    let model = loaders.model(&config.model_url)?;
    run_dashboard_with_inputs(&dataset.records, model.as_ref(), config)
}

/// Run the pipeline over already-loaded inputs.
pub fn run_dashboard_with_inputs(
    records: &[RawRecord],
    model: &dyn Forecaster,
    config: &DashboardConfig,
) -> Result<DashboardData, AppError> {
    // 1) Normalize and restrict to the analysis window.
    let normalized = normalize(records);
    let window = AnalysisWindow::new(config.window_start);
    let series = window.apply(&normalized.series);

    let mut report = normalized.report;
    report.rows_in_window = series.len();
    info!(
        rows_read = report.rows_read,
        rows_normalized = report.rows_normalized,
        rows_in_window = report.rows_in_window,
        window_start = %window.start,
        "series normalized"
    );

    if series.is_empty() {
        return Err(AppError::data_quality(format!(
            "No valid observations on or after {} ({} rows read, {} valid).",
            window.start, report.rows_read, report.rows_normalized
        )));
    }

    // 2) Forecast and classify the trend.
    let forecast = forecast_next(model, &series, config.horizon)?;
    let trend = analysis::classify_trend(forecast.today.value, forecast.tomorrow.value);

    // 3) Statistics and display series.
    let statistics = analysis::compute_statistics(&series)?;

    Ok(DashboardData {
        window,
        normalize: report,
        statistics,
        trend,
        ma_short: analysis::moving_average(&series, SHORT_MA_WINDOW),
        ma_long: analysis::moving_average(&series, LONG_MA_WINDOW),
        monthly_peaks: analysis::monthly_peaks(&series),
        yearly: analysis::yearly_comparison(&series),
        recent: analysis::recent(&series, config.recent_days),
        histogram: analysis::histogram(&series, config.histogram_bins),
        forecast,
        series,
    })
}
