//! Series normalization and the analysis window.

pub mod normalize;
pub mod window;

pub use normalize::{Normalized, normalize};
pub use window::AnalysisWindow;
