//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and resolves configuration
//! - sets up logging
//! - creates the process-wide `Loaders`
//! - runs the dashboard pipeline
//! - prints the report or hands over to the TUI

use clap::Parser;
use tracing::info;

use crate::cli::{Command, DATASET_URL_ENV, MODEL_URL_ENV, ReportArgs, SourceArgs};
use crate::data::{HttpSource, Loaders};
use crate::domain::DashboardConfig;
use crate::error::AppError;
use crate::logging::{self, LogTarget};
use crate::series::AnalysisWindow;

pub mod pipeline;

/// Entry point for the `brent` binary.
pub fn run() -> Result<(), AppError> {
    // `brent` and `brent --since 2023-01-01` behave like `brent tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Report(args) => handle_report(args),
        Command::Tui(args) => handle_tui(args),
    }
}

fn handle_report(args: ReportArgs) -> Result<(), AppError> {
    logging::init(LogTarget::Stderr, args.source.verbose)?;
    let config = dashboard_config_from_args(&args.source)?;
    let loaders = Loaders::new(Box::new(HttpSource::new()?), &config.cache_dir);

    let data = pipeline::run_dashboard(&loaders, &config)?;

    println!("{}", crate::report::format_summary(&data));
    println!("{}", crate::report::format_monthly_peaks(&data.monthly_peaks));
    println!("{}", crate::report::format_recent(&data.recent));

    if !args.no_plot {
        let first_recent = data.recent.first().map(|p| p.date);
        let overlay: Vec<_> = data
            .ma_short
            .iter()
            .filter(|p| first_recent.is_some_and(|d| p.date >= d))
            .copied()
            .collect();
        println!(
            "{}",
            crate::plot::render_price_plot(&data.recent, &overlay, args.width, args.height)
        );
    }

    if let Some(path) = &args.export {
        crate::io::export::write_series_csv(path, &data)?;
        info!(path = %path.display(), "wrote series CSV");
    }
    if let Some(path) = &args.export_summary {
        crate::io::export::write_summary_json(path, &data)?;
        info!(path = %path.display(), "wrote summary JSON");
    }

    Ok(())
}

fn handle_tui(args: SourceArgs) -> Result<(), AppError> {
    logging::init(LogTarget::File(args.cache_dir.join("brent.log")), args.verbose)?;
    let config = dashboard_config_from_args(&args)?;
    let loaders = Loaders::new(Box::new(HttpSource::new()?), &config.cache_dir);
    crate::tui::run(config, loaders)
}

/// Resolve CLI arguments (with `.env`/environment fallbacks) into a config.
pub fn dashboard_config_from_args(args: &SourceArgs) -> Result<DashboardConfig, AppError> {
    dotenvy::dotenv().ok();

    let dataset_url = resolve_identifier(args.dataset_url.as_deref(), DATASET_URL_ENV, "--dataset-url")?;
    let model_url = resolve_identifier(args.model_url.as_deref(), MODEL_URL_ENV, "--model-url")?;
    let window = AnalysisWindow::parse(&args.since)?;

    if args.horizon == 0 {
        return Err(AppError::config("`--horizon` must be at least 1."));
    }
    if args.bins == 0 {
        return Err(AppError::config("`--bins` must be at least 1."));
    }

    Ok(DashboardConfig {
        dataset_url,
        model_url,
        cache_dir: args.cache_dir.clone(),
        window_start: window.start,
        horizon: args.horizon,
        recent_days: args.recent_days,
        histogram_bins: args.bins,
    })
}

fn resolve_identifier(flag: Option<&str>, env_var: &str, flag_name: &str) -> Result<String, AppError> {
    if let Some(v) = flag.map(str::trim).filter(|v| !v.is_empty()) {
        return Ok(v.to_string());
    }
    std::env::var(env_var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::config(format!("Missing {flag_name} (or {env_var} in environment/.env).")))
}

/// Rewrite argv so `brent` defaults to `brent tui`.
///
/// Rules:
/// - `brent`                      -> `brent tui`
/// - `brent --since 2023-01-01`   -> `brent tui --since 2023-01-01`
/// - `brent --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
    }

    argv
}
