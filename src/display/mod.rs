//! Display helpers for CLI output: colour handling and tables

pub mod colours;
pub mod table;

pub use colours::ColourManager;
pub use table::{format_compact_table, format_status_table};
