//! Input/output helpers.
//!
//! - spreadsheet/CSV decoding (`ingest`)
//! - series CSV and summary JSON exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
