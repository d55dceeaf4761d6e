//! The forecasting capability and its shipped implementation.
//!
//! The pipeline only needs two primitive operations from a model:
//! - extend its date axis `periods` steps past its training history
//! - predict a point value for each of those dates
//!
//! `AdditiveModel` is a decomposable additive model (piecewise-linear trend
//! plus Fourier seasonalities) loaded from a JSON artifact. Any other type
//! implementing `Forecaster` can be swapped in, including test doubles.

use std::f64::consts::PI;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::domain::{ForecastPoint, PriceSeries};
use crate::error::AppError;

/// Point-forecast capability.
pub trait Forecaster: Send + Sync {
    /// In-sample dates followed by exactly `periods` future dates, contiguous
    /// at the model's native frequency.
    fn extend_horizon(&self, series: &PriceSeries, periods: usize) -> Result<Vec<NaiveDate>, AppError>;

    /// One prediction per input date, in input order.
    fn predict(&self, dates: &[NaiveDate]) -> Result<Vec<ForecastPoint>, AppError>;
}

/// Date step used when extending the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    /// Monday-Friday.
    BusinessDaily,
}

impl Frequency {
    pub fn next_after(self, date: NaiveDate) -> Option<NaiveDate> {
        let mut next = date.succ_opt()?;
        if self == Frequency::BusinessDaily {
            while matches!(next.weekday(), Weekday::Sat | Weekday::Sun) {
                next = next.succ_opt()?;
            }
        }
        Some(next)
    }
}

/// Trend change at scaled time `t`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Changepoint {
    pub t: f64,
    pub delta: f64,
}

/// Piecewise-linear trend in scaled time and scaled value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendParams {
    /// Origin of scaled time (`t = 0`).
    pub start: NaiveDate,
    /// Days per unit of scaled time.
    pub t_scale_days: f64,
    /// Multiplier from scaled to price units.
    pub y_scale: f64,
    /// Base growth rate.
    pub k: f64,
    /// Base offset.
    pub m: f64,
    #[serde(default)]
    pub changepoints: Vec<Changepoint>,
}

/// Fourier seasonal component.
///
/// Coefficients are laid out `[sin_1, cos_1, sin_2, cos_2, ...]` and are
/// evaluated at days since 1970-01-01.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seasonality {
    pub name: String,
    pub period_days: f64,
    pub coefficients: Vec<f64>,
}

fn default_frequency() -> Frequency {
    Frequency::Daily
}

fn default_min_history() -> usize {
    2
}

/// Serialized additive forecasting model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditiveModel {
    #[serde(default = "default_frequency")]
    pub frequency: Frequency,
    /// Minimum number of observations the model accepts as input.
    #[serde(default = "default_min_history")]
    pub min_history: usize,
    /// Training dates (the model's in-sample axis).
    pub history_dates: Vec<NaiveDate>,
    pub trend: TrendParams,
    #[serde(default)]
    pub seasonalities: Vec<Seasonality>,
}

impl AdditiveModel {
    /// Deserialize and validate a JSON artifact.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, AppError> {
        let mut model: AdditiveModel = serde_json::from_slice(bytes)
            .map_err(|e| AppError::ingestion(format!("Invalid model artifact: {e}")))?;
        model.history_dates.sort_unstable();
        model.history_dates.dedup();
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.history_dates.is_empty() {
            return Err(AppError::ingestion("Model artifact has no history dates."));
        }
        let trend = &self.trend;
        if !(trend.t_scale_days.is_finite() && trend.t_scale_days > 0.0) {
            return Err(AppError::ingestion("Model `t_scale_days` must be finite and > 0."));
        }
        if ![trend.y_scale, trend.k, trend.m].iter().all(|v| v.is_finite()) {
            return Err(AppError::ingestion("Model trend parameters must be finite."));
        }
        if !trend.changepoints.iter().all(|c| c.t.is_finite() && c.delta.is_finite()) {
            return Err(AppError::ingestion("Model changepoints must be finite."));
        }
        for s in &self.seasonalities {
            if !(s.period_days.is_finite() && s.period_days > 0.0) {
                return Err(AppError::ingestion(format!(
                    "Seasonality `{}` must have a finite, positive period.",
                    s.name
                )));
            }
            if s.coefficients.len() % 2 != 0 || !s.coefficients.iter().all(|c| c.is_finite()) {
                return Err(AppError::ingestion(format!(
                    "Seasonality `{}` needs an even number of finite coefficients.",
                    s.name
                )));
            }
        }
        Ok(())
    }

    /// Last training date.
    pub fn last_history_date(&self) -> Option<NaiveDate> {
        self.history_dates.last().copied()
    }

    fn scaled_time(&self, date: NaiveDate) -> f64 {
        (date - self.trend.start).num_days() as f64 / self.trend.t_scale_days
    }

    /// Trend value in scaled units.
    fn trend_at(&self, t: f64) -> f64 {
        let mut slope = self.trend.k;
        let mut offset = self.trend.m;
        for cp in &self.trend.changepoints {
            if t >= cp.t {
                slope += cp.delta;
                // Keeps the trend continuous at the changepoint.
                offset -= cp.t * cp.delta;
            }
        }
        slope * t + offset
    }

    /// Sum of all seasonal components in scaled units.
    fn seasonal_at(&self, date: NaiveDate) -> f64 {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN);
        let days = (date - epoch).num_days() as f64;

        let mut total = 0.0;
        for s in &self.seasonalities {
            for (i, pair) in s.coefficients.chunks_exact(2).enumerate() {
                let x = 2.0 * PI * (i as f64 + 1.0) * days / s.period_days;
                total += pair[0] * x.sin() + pair[1] * x.cos();
            }
        }
        total
    }

    pub fn yhat(&self, date: NaiveDate) -> f64 {
        let t = self.scaled_time(date);
        self.trend.y_scale * (self.trend_at(t) + self.seasonal_at(date))
    }
}

impl Forecaster for AdditiveModel {
    fn extend_horizon(&self, series: &PriceSeries, periods: usize) -> Result<Vec<NaiveDate>, AppError> {
        if series.len() < self.min_history {
            return Err(AppError::forecast(format!(
                "Model needs at least {} observations, got {}.",
                self.min_history,
                series.len()
            )));
        }

        let mut dates = self.history_dates.clone();
        let mut cursor = self
            .last_history_date()
            .ok_or_else(|| AppError::forecast("Model has no history dates."))?;
        for _ in 0..periods {
            cursor = self
                .frequency
                .next_after(cursor)
                .ok_or_else(|| AppError::forecast("Date overflow while extending horizon."))?;
            dates.push(cursor);
        }
        Ok(dates)
    }

    fn predict(&self, dates: &[NaiveDate]) -> Result<Vec<ForecastPoint>, AppError> {
        if dates.is_empty() {
            return Err(AppError::forecast("No dates to predict."));
        }
        dates
            .iter()
            .map(|&date| {
                let value = self.yhat(date);
                if value.is_finite() {
                    Ok(ForecastPoint { date, value })
                } else {
                    Err(AppError::forecast(format!("Non-finite prediction for {date}.")))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PricePoint;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn linear_model() -> AdditiveModel {
        AdditiveModel {
            frequency: Frequency::Daily,
            min_history: 2,
            history_dates: vec![d(2021, 1, 1), d(2021, 1, 2), d(2021, 1, 3)],
            trend: TrendParams {
                start: d(2021, 1, 1),
                t_scale_days: 10.0,
                y_scale: 100.0,
                k: 0.5,
                m: 0.1,
                changepoints: Vec::new(),
            },
            seasonalities: Vec::new(),
        }
    }

    fn series(n: usize) -> PriceSeries {
        let points = (0..n)
            .map(|i| PricePoint {
                date: d(2021, 1, 1) + chrono::Duration::days(i as i64),
                price: 50.0,
            })
            .collect();
        PriceSeries::from_sorted_unique(points)
    }

    #[test]
    fn without_seasonality_prediction_is_linear_trend() {
        let model = linear_model();
        assert!((model.yhat(d(2021, 1, 1)) - 10.0).abs() < 1e-9);
        assert!((model.yhat(d(2021, 1, 11)) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn changepoint_keeps_trend_continuous() {
        let mut model = linear_model();
        model.trend.changepoints.push(Changepoint { t: 0.5, delta: 1.0 });
        let before = model.trend_at(0.5 - 1e-9);
        let at = model.trend_at(0.5);
        assert!((before - at).abs() < 1e-6);
        // Slope after the changepoint is k + delta.
        let slope = (model.trend_at(1.0) - model.trend_at(0.75)) / 0.25;
        assert!((slope - 1.5).abs() < 1e-9);
    }

    #[test]
    fn seasonality_vanishes_on_full_periods() {
        let mut model = linear_model();
        model.seasonalities.push(Seasonality {
            name: "weekly".to_string(),
            period_days: 7.0,
            coefficients: vec![1.0, 0.0],
        });
        // 1970-01-01 + 7k days: sin term is zero.
        let date = d(1970, 1, 1) + chrono::Duration::days(7 * 2700);
        let plain = linear_model().yhat(date);
        assert!((model.yhat(date) - plain).abs() < 1e-6);
    }

    #[test]
    fn extend_horizon_appends_future_dates() {
        let model = linear_model();
        let dates = model.extend_horizon(&series(3), 2).unwrap();
        assert_eq!(dates.len(), 5);
        assert_eq!(&dates[3..], &[d(2021, 1, 4), d(2021, 1, 5)]);
    }

    #[test]
    fn business_daily_skips_weekends() {
        // 2021-01-08 is a Friday.
        assert_eq!(Frequency::BusinessDaily.next_after(d(2021, 1, 8)), Some(d(2021, 1, 11)));
        assert_eq!(Frequency::Daily.next_after(d(2021, 1, 8)), Some(d(2021, 1, 9)));
    }

    #[test]
    fn short_series_is_forecast_error() {
        let model = linear_model();
        let err = model.extend_horizon(&series(1), 2).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Forecast);
    }

    #[test]
    fn artifact_round_trips_through_json_and_validates() {
        let json = r#"{
            "frequency": "business_daily",
            "history_dates": ["2021-01-05", "2021-01-04"],
            "trend": {"start": "2021-01-04", "t_scale_days": 365.0, "y_scale": 80.0, "k": 0.0, "m": 1.0},
            "seasonalities": [{"name": "yearly", "period_days": 365.25, "coefficients": [0.01, 0.02]}]
        }"#;
        let model = AdditiveModel::from_json_slice(json.as_bytes()).unwrap();
        assert_eq!(model.min_history, 2);
        assert_eq!(model.last_history_date(), Some(d(2021, 1, 5)));

        let bad = json.replace("[0.01, 0.02]", "[0.01]");
        let err = AdditiveModel::from_json_slice(bad.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Ingestion);
    }

    #[test]
    fn predict_rejects_empty_input() {
        assert!(linear_model().predict(&[]).is_err());
    }
}
