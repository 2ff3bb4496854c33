//! Monthly exchange-rate files and the currency survey that plans them.
//!
//! A rate file has the header `date,<CODE>,<CODE>...` and one row per
//! `YYYY-MM` month; an empty or non-numeric cell means there is no rate for
//! that currency in that month.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};
use vacancy_core::currency::{parse_bound, RateTable, REFERENCE_CURRENCY};
use vacancy_core::error::{Result, StatsError};
use vacancy_core::models::VacancyField;
use vacancy_core::time_utils::{months_between, parse_published_at, YearMonth};

use crate::reader::{read_table, read_table_from, RawTable};

const MONTH_PATTERN: &str = r"^\d{4}-\d{2}$";
const CODE_PATTERN: &str = r"^[A-Z]{3}$";

// ── Rate file loader ──────────────────────────────────────────────────────────

/// Load a monthly [`RateTable`] from `path`.
pub fn load_monthly_rates(path: &Path) -> Result<RateTable> {
    rates_from_table(read_table(path)?)
}

/// Same as [`load_monthly_rates`] over any reader.
pub fn parse_monthly_rates<R: std::io::Read>(reader: R, source: &Path) -> Result<RateTable> {
    rates_from_table(read_table_from(reader, source)?)
}

fn rates_from_table(table: RawTable) -> Result<RateTable> {
    let month_re = compile(MONTH_PATTERN)?;
    let code_re = compile(CODE_PATTERN)?;

    let Some((first, codes)) = table.labels.split_first() else {
        return Err(StatsError::EmptyInput(table.source));
    };
    if first.trim() != "date" {
        return Err(StatsError::InvalidRateTable(format!(
            "first column must be \"date\", found \"{}\"",
            first
        )));
    }
    if let Some(bad) = codes.iter().find(|code| !code_re.is_match(code.trim())) {
        return Err(StatsError::InvalidRateTable(format!(
            "invalid currency code \"{}\"",
            bad
        )));
    }

    let mut months: HashMap<YearMonth, HashMap<String, f64>> = HashMap::new();
    for record in &table.records {
        let key = record.get(0).unwrap_or("").trim();
        if !month_re.is_match(key) {
            return Err(StatsError::InvalidRateTable(format!(
                "invalid month key \"{}\"",
                key
            )));
        }
        let month: YearMonth = key.parse()?;

        let rates = months.entry(month).or_default();
        for (code, cell) in codes.iter().zip(record.iter().skip(1)) {
            if let Some(rate) = parse_bound(cell) {
                rates.insert(code.trim().to_string(), rate);
            }
        }
    }

    info!(
        "Loaded rates for {} currencies over {} months from {}",
        codes.len(),
        months.len(),
        table.source.display()
    );
    Ok(RateTable::monthly(months))
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| StatsError::Other(e.into()))
}

// ── Currency survey ───────────────────────────────────────────────────────────

/// Which currencies are common enough to need monthly rates, and for which
/// months.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencySurvey {
    /// Occurrences per code above the threshold, sorted by code.
    pub counts: IndexMap<String, u64>,
    /// Earliest publication among vacancies in those currencies.
    pub first_published: Option<DateTime<FixedOffset>>,
    /// Latest publication among vacancies in those currencies.
    pub last_published: Option<DateTime<FixedOffset>>,
    /// Every month from the first to the last publication, inclusive.
    pub months: Vec<YearMonth>,
}

impl CurrencySurvey {
    /// The currency codes, in order.
    pub fn codes(&self) -> Vec<&str> {
        self.counts.keys().map(String::as_str).collect()
    }
}

/// Survey the currencies used across `files`.
///
/// Counts every non-empty, non-reference `salary_currency` value, keeps codes
/// whose count exceeds `min_count`, then finds the publication range of
/// vacancies in the kept codes.
pub fn survey_currencies(files: &[PathBuf], min_count: u64) -> Result<CurrencySurvey> {
    let tables = files
        .iter()
        .map(|path| read_table(path))
        .collect::<Result<Vec<_>>>()?;

    let mut columns = Vec::with_capacity(tables.len());
    for table in &tables {
        columns.push((
            table.column_of(VacancyField::SalaryCurrency)?,
            table.column_of(VacancyField::PublishedAt)?,
        ));
    }

    let mut all_counts: BTreeMap<String, u64> = BTreeMap::new();
    for (table, (currency_col, _)) in tables.iter().zip(&columns) {
        for record in &table.records {
            let code = record.get(*currency_col).unwrap_or("").trim();
            if code.is_empty() || code == REFERENCE_CURRENCY {
                continue;
            }
            *all_counts.entry(code.to_string()).or_insert(0) += 1;
        }
    }
    debug!("Currency occurrences: {:?}", all_counts);

    let counts: IndexMap<String, u64> = all_counts
        .into_iter()
        .filter(|(_, count)| *count > min_count)
        .collect();

    let mut first: Option<DateTime<FixedOffset>> = None;
    let mut last: Option<DateTime<FixedOffset>> = None;
    for (table, (currency_col, date_col)) in tables.iter().zip(&columns) {
        for record in &table.records {
            let code = record.get(*currency_col).unwrap_or("").trim().to_string();
            if !counts.contains_key(&code) {
                continue;
            }
            let published = parse_published_at(record.get(*date_col).unwrap_or(""))?;
            first = Some(first.map_or(published, |f| f.min(published)));
            last = Some(last.map_or(published, |l| l.max(published)));
        }
    }

    let months = match (first, last) {
        (Some(f), Some(l)) => {
            months_between(YearMonth::from_datetime(&f), YearMonth::from_datetime(&l))
        }
        _ => {
            warn!("No currency exceeds {} occurrences", min_count);
            Vec::new()
        }
    };

    Ok(CurrencySurvey {
        counts,
        first_published: first,
        last_published: last,
        months,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
