//! Domain types shared by the vacancy statistics crates: errors, the field
//! table, exchange-rate tables and salary normalization, time helpers,
//! display formatting and CLI settings.

pub mod currency;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use currency::{RateTable, SalaryNormalizer, REFERENCE_CURRENCY};
pub use error::{Result, StatsError};
pub use models::{RawRow, SalaryColumns, VacancyField, VacancyRecord};
pub use time_utils::YearMonth;
