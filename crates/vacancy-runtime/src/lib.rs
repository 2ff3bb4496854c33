//! Runtime layer for vacancy statistics.
//!
//! Runs the data pipeline over partitioned inputs on tokio worker tasks and
//! merges the per-file results.

pub mod orchestrator;

pub use vacancy_core as core;
pub use vacancy_data as data;
