//! Text reporting for the dashboard outputs.

pub mod format;

pub use format::*;
