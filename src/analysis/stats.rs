//! Descriptive statistics and the trend call.

use crate::domain::{DerivedStatistics, PriceSeries, Trend};
use crate::error::AppError;

/// Max, min, mean and sample standard deviation of the price column.
pub fn compute_statistics(series: &PriceSeries) -> Result<DerivedStatistics, AppError> {
    if series.is_empty() {
        return Err(AppError::data_quality(
            "Cannot compute statistics of an empty series.",
        ));
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for price in series.prices() {
        min = min.min(price);
        max = max.max(price);
        sum += price;
    }

    let n = series.len() as f64;
    // Rounding in `sum / n` can step one ulp outside [min, max] for constant series.
    let mean = (sum / n).clamp(min, max);

    let std_dev = if series.len() < 2 {
        None
    } else {
        let variance = series.prices().map(|p| (p - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Some(variance.sqrt())
    };

    Ok(DerivedStatistics {
        count: series.len(),
        max,
        min,
        mean,
        std_dev,
    })
}

/// `Rising` only when tomorrow is strictly above today; ties are `Falling`.
pub fn classify_trend(today: f64, tomorrow: f64) -> Trend {
    if tomorrow - today > 0.0 {
        Trend::Rising
    } else {
        Trend::Falling
    }
}
