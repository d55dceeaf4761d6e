//! Formatted terminal output for the `report` command.
//!
//! We keep formatting code in one place so the pipeline stays free of
//! presentation concerns and output changes are localized.

use crate::app::pipeline::DashboardData;
use crate::domain::{MonthlyPeak, PricePoint, Trend};

const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Format the run summary: coverage, statistics, forecast and trend.
pub fn format_summary(data: &DashboardData) -> String {
    let mut out = String::new();
    let stats = &data.statistics;

    out.push_str("=== brent - Brent crude price dashboard ===\n");
    if let (Some(first), Some(last)) = (data.series.first(), data.series.last()) {
        out.push_str(&format!(
            "Window: {} -> {} (since {}) | n={}\n",
            first.date, last.date, data.window.start, stats.count
        ));
    }
    out.push_str(&format!(
        "Rows: read={} | invalid date={} | missing price={} | duplicates={} | in window={}\n",
        data.normalize.rows_read,
        data.normalize.dropped_invalid_date,
        data.normalize.dropped_missing_price,
        data.normalize.duplicate_dates,
        data.normalize.rows_in_window,
    ));

    out.push_str("\nStatistics (USD/bbl):\n");
    out.push_str(&format!("- max : {:.2}\n", stats.max));
    out.push_str(&format!("- min : {:.2}\n", stats.min));
    out.push_str(&format!("- mean: {:.2}\n", stats.mean));
    out.push_str(&format!("- std : {}\n", fmt_opt(stats.std_dev)));

    out.push_str("\nForecast:\n");
    out.push_str(&format!(
        "- today    ({}): {:.2}\n",
        data.forecast.today.date, data.forecast.today.value
    ));
    out.push_str(&format!(
        "- tomorrow ({}): {:.2}\n",
        data.forecast.tomorrow.date, data.forecast.tomorrow.value
    ));
    out.push_str(&format!(
        "- trend: {} ({:+.2})\n",
        trend_label(data.trend),
        data.forecast.tomorrow.value - data.forecast.today.value
    ));
    out.push('\n');

    out
}

/// Format the monthly peaks as a two-column table.
pub fn format_monthly_peaks(peaks: &[MonthlyPeak]) -> String {
    let mut out = String::from("Monthly peak (all years pooled):\n");
    for p in peaks {
        out.push_str(&format!("  {:<4} {:>8.2}\n", month_name(p.month), p.max));
    }
    out
}

/// Format the most recent observations.
pub fn format_recent(points: &[PricePoint]) -> String {
    let mut out = format!("Last {} observations:\n", points.len());
    for p in points {
        out.push_str(&format!("  {}  {:>8.2}\n", p.date, p.price));
    }
    out
}

pub fn trend_label(trend: Trend) -> &'static str {
    match trend {
        Trend::Rising => "rising ▲",
        Trend::Falling => "falling ▼",
    }
}

pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_ABBR.get(i as usize))
        .copied()
        .unwrap_or("?")
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.2}")).unwrap_or_else(|| "n/a".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn month_names_cover_range() {
        assert_eq!(month_name(1), "Jan");
        assert_eq!(month_name(12), "Dec");
        assert_eq!(month_name(0), "?");
        assert_eq!(month_name(13), "?");
    }

    #[test]
    fn recent_table_lists_each_row() {
        let points = vec![
            PricePoint { date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), price: 83.5 },
            PricePoint { date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(), price: 82.25 },
        ];
        let txt = format_recent(&points);
        assert_eq!(
            txt,
            "Last 2 observations:\n  2024-03-01     83.50\n  2024-03-04     82.25\n"
        );
    }
}
