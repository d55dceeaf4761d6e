//! Forecast adapter: run a `Forecaster` over an extended horizon and pull out
//! the "today" and "tomorrow" predictions.
//!
//! - "today" is the prediction at the last observed date of the series
//! - "tomorrow" is the prediction at the furthest date of the extended horizon
//!
//! Every failure is an error; no prediction is ever replaced by a default.

use serde::Serialize;
use tracing::info;

use crate::domain::{ForecastPoint, PriceSeries};
use crate::error::AppError;
use crate::models::Forecaster;

/// All predictions of one forecast run plus the two extracted points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastOutcome {
    pub horizon: usize,
    /// One point per extended date (history fit + future).
    pub points: Vec<ForecastPoint>,
    pub today: ForecastPoint,
    pub tomorrow: ForecastPoint,
}

/// Forecast `horizon` steps past the model history and extract today/tomorrow.
pub fn forecast_next(
    model: &dyn Forecaster,
    series: &PriceSeries,
    horizon: usize,
) -> Result<ForecastOutcome, AppError> {
    let last = series
        .last()
        .ok_or_else(|| AppError::forecast("Cannot forecast an empty series."))?;
    if horizon == 0 {
        return Err(AppError::forecast("Forecast horizon must be at least 1."));
    }

    let dates = model.extend_horizon(series, horizon)?;
    let furthest = dates
        .iter()
        .max()
        .copied()
        .ok_or_else(|| AppError::forecast("Model returned an empty horizon."))?;

    let points = model.predict(&dates)?;
    if points.len() != dates.len() {
        return Err(AppError::forecast(format!(
            "Model returned {} predictions for {} dates.",
            points.len(),
            dates.len()
        )));
    }
    if let Some(bad) = points.iter().find(|p| !p.value.is_finite()) {
        return Err(AppError::forecast(format!("Non-finite prediction for {}.", bad.date)));
    }

    let today = find_point(&points, last.date).ok_or_else(|| {
        AppError::forecast(format!(
            "Model horizon does not cover the last observed date {}.",
            last.date
        ))
    })?;
    let tomorrow = find_point(&points, furthest)
        .ok_or_else(|| AppError::forecast(format!("No prediction for horizon end {furthest}.")))?;
    if tomorrow.date <= today.date {
        return Err(AppError::forecast(format!(
            "Model horizon ends at {}, not after the last observation {}.",
            tomorrow.date, today.date
        )));
    }

    info!(
        today = %today.date,
        today_value = today.value,
        tomorrow = %tomorrow.date,
        tomorrow_value = tomorrow.value,
        "forecast extracted"
    );

    Ok(ForecastOutcome {
        horizon,
        points,
        today,
        tomorrow,
    })
}

fn find_point(points: &[ForecastPoint], date: chrono::NaiveDate) -> Option<ForecastPoint> {
    points.iter().find(|p| p.date == date).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::domain::PricePoint;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Returns fixed predictions; history ends one day before the series.
    struct TableModel {
        history: Vec<NaiveDate>,
        values: Vec<(NaiveDate, f64)>,
    }

    impl Forecaster for TableModel {
        fn extend_horizon(&self, _series: &PriceSeries, periods: usize) -> Result<Vec<NaiveDate>, AppError> {
            let mut dates = self.history.clone();
            let mut cursor = *dates.last().unwrap();
            for _ in 0..periods {
                cursor = cursor.succ_opt().unwrap();
                dates.push(cursor);
            }
            Ok(dates)
        }

        fn predict(&self, dates: &[NaiveDate]) -> Result<Vec<ForecastPoint>, AppError> {
            dates
                .iter()
                .map(|date| {
                    self.values
                        .iter()
                        .find(|(d, _)| d == date)
                        .map(|&(date, value)| ForecastPoint { date, value })
                        .ok_or_else(|| AppError::forecast(format!("no value for {date}")))
                })
                .collect()
        }
    }

    fn scenario_series() -> PriceSeries {
        PriceSeries::from_sorted_unique(vec![
            PricePoint { date: d(2021, 1, 4), price: 50.0 },
            PricePoint { date: d(2021, 1, 5), price: 52.0 },
            PricePoint { date: d(2021, 1, 6), price: 51.0 },
        ])
    }

    fn scenario_model(tomorrow: f64) -> TableModel {
        TableModel {
            history: vec![d(2021, 1, 4), d(2021, 1, 5)],
            values: vec![
                (d(2021, 1, 4), 50.2),
                (d(2021, 1, 5), 51.8),
                (d(2021, 1, 6), 51.5),
                (d(2021, 1, 7), tomorrow),
            ],
        }
    }

    #[test]
    fn extracts_today_and_tomorrow() {
        let out = forecast_next(&scenario_model(53.0), &scenario_series(), 2).unwrap();
        assert_eq!(out.today, ForecastPoint { date: d(2021, 1, 6), value: 51.5 });
        assert_eq!(out.tomorrow, ForecastPoint { date: d(2021, 1, 7), value: 53.0 });
        assert_eq!(out.points.len(), 4);
        assert_eq!(out.points.iter().filter(|p| p.date > out.today.date).count(), 1);
    }

    #[test]
    fn missing_today_is_forecast_error() {
        let mut model = scenario_model(53.0);
        model.history = vec![d(2021, 1, 1), d(2021, 1, 2)];
        model.values.push((d(2021, 1, 1), 1.0));
        model.values.push((d(2021, 1, 2), 1.0));
        model.values.push((d(2021, 1, 3), 1.0));
        let err = forecast_next(&model, &scenario_series(), 1).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Forecast);
    }

    #[test]
    fn non_finite_prediction_is_not_masked() {
        let err = forecast_next(&scenario_model(f64::NAN), &scenario_series(), 2).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Forecast);
    }

    #[test]
    fn empty_series_and_zero_horizon_fail() {
        let model = scenario_model(53.0);
        assert!(forecast_next(&model, &PriceSeries::default(), 2).is_err());
        assert!(forecast_next(&model, &scenario_series(), 0).is_err());
    }
}
