//! Metrics and trend derivation over the filtered series.

pub mod display;
pub mod stats;

pub use display::{histogram, monthly_peaks, moving_average, recent, yearly_comparison};
pub use stats::{classify_trend, compute_statistics};
