//! `brent-dash` library crate.
//!
//! The binary (`brent`) is a thin wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes or touching the network
//! - the report and TUI front-ends share one implementation

pub mod analysis;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod io;
pub mod logging;
pub mod models;
pub mod plot;
pub mod report;
pub mod series;
pub mod tui;
