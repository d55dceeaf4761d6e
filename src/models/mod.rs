//! Forecasting models.
//!
//! `Forecaster` is the seam between the pipeline and whatever produces point
//! forecasts; `AdditiveModel` is the artifact-backed implementation.

pub mod model;

pub use model::*;
