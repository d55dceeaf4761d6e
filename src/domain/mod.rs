//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw source rows (`RawRecord`, `RawCell`)
//! - the normalized price series (`PriceSeries`)
//! - forecast and derived outputs (`ForecastPoint`, `Trend`, `DerivedStatistics`, ...)

pub mod types;

pub use types::*;
