//! Terminal output for vacancy statistics.
//!
//! Provides themes, the ratatui report tables, the plain-text summary printed
//! to stdout, and the event loop that shows the report in the alternate
//! screen.

pub mod app;
pub mod plain;
pub mod table_view;
pub mod themes;

pub use vacancy_core as core;
