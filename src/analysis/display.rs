//! Resampled series backing the dashboard panels.
//!
//! None of these feed back into the statistics or the forecast; they are pure
//! functions of the filtered series.

use std::collections::BTreeMap;

use chrono::Datelike;

use crate::domain::{HistogramBin, MonthlyPeak, PricePoint, PriceSeries, YearTrace};

/// Trailing simple moving average over `window` rows.
///
/// The first `window - 1` observations have no value and are omitted, so the
/// output has `len - window + 1` points (or none).
pub fn moving_average(series: &PriceSeries, window: usize) -> Vec<PricePoint> {
    if window == 0 || series.len() < window {
        return Vec::new();
    }
    series
        .points()
        .windows(window)
        .map(|w| {
            let sum: f64 = w.iter().map(|p| p.price).sum();
            PricePoint {
                date: w[window - 1].date,
                price: sum / window as f64,
            }
        })
        .collect()
}

/// Maximum price per month number (1-12), pooled across all years.
pub fn monthly_peaks(series: &PriceSeries) -> Vec<MonthlyPeak> {
    let mut peaks: BTreeMap<u32, f64> = BTreeMap::new();
    for p in series.points() {
        let entry = peaks.entry(p.date.month()).or_insert(p.price);
        *entry = entry.max(p.price);
    }
    peaks
        .into_iter()
        .map(|(month, max)| MonthlyPeak { month, max })
        .collect()
}

/// One `(day_of_year, price)` trace per calendar year, years ascending.
pub fn yearly_comparison(series: &PriceSeries) -> Vec<YearTrace> {
    let mut years: BTreeMap<i32, Vec<(u32, f64)>> = BTreeMap::new();
    for p in series.points() {
        years
            .entry(p.date.year())
            .or_default()
            .push((p.date.ordinal(), p.price));
    }
    years
        .into_iter()
        .map(|(year, points)| YearTrace { year, points })
        .collect()
}

/// The last `n` observations.
pub fn recent(series: &PriceSeries, n: usize) -> Vec<PricePoint> {
    let points = series.points();
    points[points.len().saturating_sub(n)..].to_vec()
}

/// Equal-width price histogram over `[min, max]`; the last bin is closed.
pub fn histogram(series: &PriceSeries, bins: usize) -> Vec<HistogramBin> {
    if series.is_empty() || bins == 0 {
        return Vec::new();
    }

    let (min, max) = series
        .prices()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p), hi.max(p)));

    if max <= min {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: series.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for price in series.prices() {
        let idx = (((price - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn daily(prices: &[f64]) -> PriceSeries {
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PricePoint {
                date: d(2021, 1, 1) + chrono::Duration::days(i as i64),
                price,
            })
            .collect();
        PriceSeries::from_sorted_unique(points)
    }

    #[test]
    fn moving_average_omits_warmup() {
        let s = daily(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let ma = moving_average(&s, 7);
        assert_eq!(ma.len(), 2);
        assert_eq!(ma[0].date, d(2021, 1, 7));
        assert!((ma[0].price - 4.0).abs() < 1e-12);
        assert!((ma[1].price - 5.0).abs() < 1e-12);

        assert!(moving_average(&daily(&[1.0, 2.0]), 30).is_empty());
        assert!(moving_average(&s, 0).is_empty());
    }

    #[test]
    fn monthly_peaks_pool_years_together() {
        let s = PriceSeries::from_sorted_unique(vec![
            PricePoint { date: d(2021, 8, 2), price: 70.0 },
            PricePoint { date: d(2021, 9, 1), price: 72.0 },
            PricePoint { date: d(2022, 8, 1), price: 99.0 },
            PricePoint { date: d(2023, 8, 1), price: 85.0 },
        ]);
        let peaks = monthly_peaks(&s);
        assert_eq!(
            peaks,
            vec![
                MonthlyPeak { month: 8, max: 99.0 },
                MonthlyPeak { month: 9, max: 72.0 },
            ]
        );
    }

    #[test]
    fn yearly_comparison_groups_by_year() {
        let s = PriceSeries::from_sorted_unique(vec![
            PricePoint { date: d(2021, 12, 31), price: 77.0 },
            PricePoint { date: d(2022, 1, 1), price: 78.0 },
            PricePoint { date: d(2022, 1, 3), price: 79.0 },
        ]);
        let traces = yearly_comparison(&s);
        assert_eq!(traces.len(), 2);
        assert_eq!(traces[0].year, 2021);
        assert_eq!(traces[0].points, vec![(365, 77.0)]);
        assert_eq!(traces[1].points, vec![(1, 78.0), (3, 79.0)]);
    }

    #[test]
    fn recent_takes_tail() {
        let s = daily(&[1.0, 2.0, 3.0]);
        assert_eq!(recent(&s, 2).len(), 2);
        assert_eq!(recent(&s, 2)[0].price, 2.0);
        assert_eq!(recent(&s, 15).len(), 3);
    }

    #[test]
    fn histogram_counts_every_observation() {
        let s = daily(&[1.0, 2.0, 2.5, 3.0, 5.0]);
        let bins = histogram(&s, 4);
        assert_eq!(bins.len(), 4);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 5);
        assert_eq!(bins[0].lower, 1.0);
        assert_eq!(bins[3].upper, 5.0);
        // Max lands in the closed last bin.
        assert_eq!(bins[3].count, 1);
    }

    #[test]
    fn constant_series_histogram_is_single_bin() {
        let bins = histogram(&daily(&[4.0, 4.0]), 10);
        assert_eq!(bins, vec![HistogramBin { lower: 4.0, upper: 4.0, count: 2 }]);
    }
}
