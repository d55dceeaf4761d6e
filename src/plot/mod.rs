//! Terminal plotting for the `report` command.

pub mod ascii;

pub use ascii::render_price_plot;
