//! Data layer for vacancy statistics.
//!
//! Reads and validates vacancy CSV exports, builds rouble-normalized
//! records, aggregates them by year and city, ranks cities, lists filtered
//! and sorted vacancies, and writes the derived files (per-year splits,
//! converted datasets, JSON reports).

pub mod aggregator;
pub mod analysis;
pub mod export;
pub mod listing;
pub mod ranking;
pub mod rates;
pub mod reader;
pub mod records;
pub mod splitter;

pub use vacancy_core as core;
