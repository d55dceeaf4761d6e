use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use brent_dash::app::pipeline::{run_dashboard, run_dashboard_with_inputs};
use brent_dash::data::source::artifact_name;
use brent_dash::data::{ByteSource, HttpSource, Loaders};
use brent_dash::domain::{DashboardConfig, ForecastPoint, PriceSeries, RawCell, RawRecord, Trend};
use brent_dash::error::{AppError, ErrorKind};
use brent_dash::models::Forecaster;
use chrono::NaiveDate;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn config(dir: &Path, dataset_url: &str, model_url: &str) -> DashboardConfig {
    DashboardConfig {
        dataset_url: dataset_url.to_string(),
        model_url: model_url.to_string(),
        cache_dir: dir.join("cache"),
        window_start: d(2021, 1, 1),
        horizon: 2,
        recent_days: 15,
        histogram_bins: 5,
    }
}

fn record(line: usize, date: &str, price: f64) -> RawRecord {
    RawRecord {
        line,
        date: RawCell::Text(date.to_string()),
        price: RawCell::Number(price),
    }
}

/// History ends on 2021-01-05; predictions come from a fixed table.
struct TableModel;

impl Forecaster for TableModel {
    fn extend_horizon(&self, _series: &PriceSeries, periods: usize) -> Result<Vec<NaiveDate>, AppError> {
        let mut dates = vec![d(2021, 1, 4), d(2021, 1, 5)];
        for i in 0..periods {
            dates.push(d(2021, 1, 6 + i as u32));
        }
        Ok(dates)
    }

    fn predict(&self, dates: &[NaiveDate]) -> Result<Vec<ForecastPoint>, AppError> {
        Ok(dates
            .iter()
            .map(|&date| {
                let value = match date.to_string().as_str() {
                    "2021-01-06" => 51.5,
                    "2021-01-07" => 53.0,
                    _ => 50.0,
                };
                ForecastPoint { date, value }
            })
            .collect())
    }
}

#[test]
fn rising_forecast_over_three_observations() {
    let dir = tempfile::tempdir().unwrap();
    let records = vec![
        record(2, "2021-01-04", 50.0),
        record(3, "2021-01-05", 52.0),
        record(4, "2021-01-06", 51.0),
    ];
    let cfg = config(dir.path(), "unused", "unused");

    let data = run_dashboard_with_inputs(&records, &TableModel, &cfg).unwrap();

    assert_eq!(data.series.len(), 3);
    assert_eq!(data.forecast.today.value, 51.5);
    assert_eq!(data.forecast.tomorrow.value, 53.0);
    assert_eq!(data.trend, Trend::Rising);
    assert_eq!(data.statistics.count, 3);
    assert_eq!(data.statistics.max, 52.0);
    assert_eq!(data.statistics.min, 50.0);
    assert!((data.statistics.mean - 51.0).abs() < 1e-12);
}

#[test]
fn window_that_drops_every_row_is_data_quality_error() {
    let dir = tempfile::tempdir().unwrap();
    let records = vec![record(2, "2019-06-03", 60.0), record(3, "2020-12-31", 51.0)];
    let cfg = config(dir.path(), "unused", "unused");

    let err = run_dashboard_with_inputs(&records, &TableModel, &cfg).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataQuality);
}

const DATASET_CSV: &str = "data,preco\n\
2020-12-30,48.0\n\
2021-01-04,50.0\n\
not a date,49.0\n\
2021-01-05,52.0\n\
2021-01-06,\n\
2021-01-06,51.0\n";

/// Linear trend: yhat(2021-01-04 + n days) = 50 + n.
const MODEL_JSON: &str = r#"{
    "history_dates": ["2021-01-04", "2021-01-05"],
    "trend": { "start": "2021-01-04", "t_scale_days": 1.0, "y_scale": 1.0, "k": 1.0, "m": 50.0 }
}"#;

#[test]
fn local_artifacts_flow_through_loaders() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("brent.csv");
    let model = dir.path().join("model.json");
    fs::write(&dataset, DATASET_CSV).unwrap();
    fs::write(&model, MODEL_JSON).unwrap();

    let cfg = config(dir.path(), dataset.to_str().unwrap(), model.to_str().unwrap());
    let loaders = Loaders::new(Box::new(HttpSource::new().unwrap()), &cfg.cache_dir);

    let data = run_dashboard(&loaders, &cfg).unwrap();

    assert_eq!(data.normalize.rows_read, 6);
    assert_eq!(data.normalize.dropped_invalid_date, 1);
    assert_eq!(data.normalize.dropped_missing_price, 1);
    assert_eq!(data.series.len(), 3);
    assert_eq!(data.forecast.today.date, d(2021, 1, 6));
    assert!((data.forecast.today.value - 52.0).abs() < 1e-9);
    assert_eq!(data.forecast.tomorrow.date, d(2021, 1, 7));
    assert!((data.forecast.tomorrow.value - 53.0).abs() < 1e-9);
    assert_eq!(data.trend, Trend::Rising);

    assert!(cfg.cache_dir.join(artifact_name("dataset", &cfg.dataset_url, "csv")).exists());
    assert!(cfg.cache_dir.join(artifact_name("model", &cfg.model_url, "json")).exists());
}

struct CountingSource {
    calls: Arc<AtomicUsize>,
}

impl ByteSource for CountingSource {
    fn fetch(&self, identifier: &str) -> Result<Vec<u8>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match identifier {
            "dataset" => Ok(DATASET_CSV.as_bytes().to_vec()),
            "model" => Ok(MODEL_JSON.as_bytes().to_vec()),
            other => Err(AppError::ingestion(format!("unknown identifier {other}"))),
        }
    }
}

#[test]
fn repeated_runs_fetch_each_artifact_once() {
    let dir = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let cfg = config(dir.path(), "dataset", "model");
    let loaders = Loaders::new(Box::new(CountingSource { calls: calls.clone() }), &cfg.cache_dir);

    let first = run_dashboard(&loaders, &cfg).unwrap();
    let second = run_dashboard(&loaders, &cfg).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(first.forecast, second.forecast);

    loaders.clear();
    run_dashboard(&loaders, &cfg).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[test]
fn evicting_one_artifact_refetches_only_that_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let cfg = config(dir.path(), "dataset", "model");
    let loaders = Loaders::new(Box::new(CountingSource { calls: calls.clone() }), &cfg.cache_dir);

    run_dashboard(&loaders, &cfg).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    assert!(loaders.evict_model("model"));
    assert!(!loaders.evict_model("model"));
    run_dashboard(&loaders, &cfg).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let before = loaders.dataset("dataset").unwrap();
    assert!(loaders.evict_dataset("dataset"));
    let after = loaders.dataset("dataset").unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[test]
fn distinct_dataset_identifiers_keep_separate_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.csv");
    let second = dir.path().join("second.csv");
    fs::write(&first, DATASET_CSV).unwrap();
    fs::write(&second, "data,preco\n2021-02-01,60.0\n").unwrap();
    let loaders = Loaders::new(Box::new(HttpSource::new().unwrap()), dir.path().join("cache"));

    let a = loaders.dataset(first.to_str().unwrap()).unwrap();
    let b = loaders.dataset(second.to_str().unwrap()).unwrap();

    assert_ne!(a.artifact, b.artifact);
    assert_eq!(fs::read_to_string(&a.artifact).unwrap(), DATASET_CSV);
    assert_eq!(b.records.len(), 1);
}

#[test]
fn failed_load_is_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let cfg = config(dir.path(), "dataset", "missing");
    let loaders = Loaders::new(Box::new(CountingSource { calls: calls.clone() }), &cfg.cache_dir);

    let err = run_dashboard(&loaders, &cfg).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Ingestion);
    assert!(run_dashboard(&loaders, &cfg).is_err());
    // Dataset fetched once, the failing model fetched on every attempt.
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn exports_series_csv_and_summary_json() {
    let dir = tempfile::tempdir().unwrap();
    let records = vec![
        record(2, "2021-01-04", 50.0),
        record(3, "2021-01-05", 52.0),
        record(4, "2021-01-06", 51.0),
    ];
    let cfg = config(dir.path(), "unused", "unused");
    let data = run_dashboard_with_inputs(&records, &TableModel, &cfg).unwrap();

    let csv_path = dir.path().join("series.csv");
    let json_path = dir.path().join("summary.json");
    brent_dash::io::export::write_series_csv(&csv_path, &data).unwrap();
    brent_dash::io::export::write_summary_json(&json_path, &data).unwrap();

    let csv = fs::read_to_string(&csv_path).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("date,price,ma_short,ma_long"));
    assert_eq!(lines.next(), Some("2021-01-04,50.0,,"));
    assert_eq!(csv.lines().count(), 4);

    let summary: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(summary["trend"], "rising");
    assert_eq!(summary["tomorrow"]["value"], 53.0);
    assert_eq!(summary["statistics"]["count"], 3);
}
