use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the vacancy statistics pipeline.
#[derive(Error, Debug)]
pub enum StatsError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source has no header row at all.
    #[error("Empty input: {0} has no header row")]
    EmptyInput(PathBuf),

    /// The source has a header but no row survived validation.
    #[error("No data: {0} has no valid rows")]
    NoData(PathBuf),

    /// The fixed rate table has no factor for a currency code.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// The monthly rate table has no factor for a currency in a given month.
    #[error("No {currency} rate for {period}")]
    MissingRateForPeriod { currency: String, period: String },

    /// A header label is not part of the known vacancy field table.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// The header lacks a column the pipeline needs.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A publication timestamp did not match the expected format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// A monthly rate file is structurally invalid.
    #[error("Invalid rate table: {0}")]
    InvalidRateTable(String),

    /// A delimited file could not be parsed or written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document could not be parsed or written.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A listing filter, sort key, range or column list could not be used.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StatsError {
    /// `true` for errors that exclude a single record instead of aborting
    /// the whole run.
    pub fn is_record_level(&self) -> bool {
        matches!(self, StatsError::MissingRateForPeriod { .. })
    }
}

/// Convenience alias used throughout the vacancy crates.
pub type Result<T> = std::result::Result<T, StatsError>;
