//! Command-line parsing for the Brent price dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the pipeline code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_HORIZON, DEFAULT_WINDOW_START};

/// Environment fallback for `--dataset-url` (also read from `.env`).
pub const DATASET_URL_ENV: &str = "BRENT_DATASET_URL";
/// Environment fallback for `--model-url` (also read from `.env`).
pub const MODEL_URL_ENV: &str = "BRENT_MODEL_URL";

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "brent", version, about = "Brent crude price dashboard with next-day forecast")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print statistics, forecast and a recent-price plot; optionally export.
    Report(ReportArgs),
    /// Launch the interactive dashboard (default).
    Tui(SourceArgs),
}

/// Options shared by every command.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Spreadsheet URL or local path (columns `data` and `preco`).
    #[arg(long)]
    pub dataset_url: Option<String>,

    /// Forecast model artifact URL or local path.
    #[arg(long)]
    pub model_url: Option<String>,

    /// Directory for downloaded artifacts and the TUI log.
    #[arg(long, default_value = ".cache/brent")]
    pub cache_dir: PathBuf,

    /// First date of the analysis window (YYYY-MM-DD).
    #[arg(long, default_value = DEFAULT_WINDOW_START)]
    pub since: String,

    /// Forecast steps past the model history.
    #[arg(long, default_value_t = DEFAULT_HORIZON)]
    pub horizon: usize,

    /// Number of most recent observations in the short-range chart.
    #[arg(long, default_value_t = 15)]
    pub recent_days: usize,

    /// Histogram bin count.
    #[arg(long, default_value_t = 20)]
    pub bins: usize,

    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(short, long)]
    pub verbose: bool,
}

/// Options for the text report.
#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 16)]
    pub height: usize,

    /// Export the filtered series with moving averages to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export statistics, forecast and trend to JSON.
    #[arg(long = "export-summary")]
    pub export_summary: Option<PathBuf>,
}
