use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use tracing::debug;

use crate::error::{Result, StatsError};
use crate::time_utils::YearMonth;

/// Code of the currency every salary is converted into.
pub const REFERENCE_CURRENCY: &str = "RUR";

// ── Built-in rates (roubles per unit) ─────────────────────────────────────────

const BUILTIN_RATES: &[(&str, f64)] = &[
    ("AZN", 35.68),
    ("BYR", 23.91),
    ("EUR", 59.90),
    ("GEL", 21.74),
    ("KGS", 0.76),
    ("KZT", 0.13),
    ("RUR", 1.0),
    ("UAH", 1.64),
    ("USD", 60.66),
    ("UZS", 0.0055),
];

/// Display names of the currencies found in vacancy exports.
const CURRENCY_NAMES: &[(&str, &str)] = &[
    ("AZN", "Манаты"),
    ("BYR", "Белорусские рубли"),
    ("EUR", "Евро"),
    ("GEL", "Грузинский лари"),
    ("KGS", "Киргизский сом"),
    ("KZT", "Тенге"),
    ("RUR", "Рубли"),
    ("UAH", "Гривны"),
    ("USD", "Доллары"),
    ("UZS", "Узбекский сум"),
];

/// Russian display name of a currency code, if it is a known one.
pub fn currency_name(code: &str) -> Option<&'static str> {
    CURRENCY_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

// ── RateTable ─────────────────────────────────────────────────────────────────

/// Multiplicative factors from a currency into [`REFERENCE_CURRENCY`].
#[derive(Debug, Clone, PartialEq)]
pub enum RateTable {
    /// One factor per currency code, independent of date.
    Fixed(HashMap<String, f64>),
    /// One factor per currency code per calendar month.
    Monthly(HashMap<YearMonth, HashMap<String, f64>>),
}

impl RateTable {
    /// The built-in fixed table of historical averages.
    pub fn builtin() -> Self {
        Self::fixed(
            BUILTIN_RATES
                .iter()
                .map(|(code, rate)| (code.to_string(), *rate))
                .collect(),
        )
    }

    /// A fixed table; the reference currency is always present with factor 1.
    pub fn fixed(mut rates: HashMap<String, f64>) -> Self {
        rates.insert(REFERENCE_CURRENCY.to_string(), 1.0);
        Self::Fixed(rates)
    }

    /// A date-indexed table.
    pub fn monthly(rates: HashMap<YearMonth, HashMap<String, f64>>) -> Self {
        Self::Monthly(rates)
    }

    /// Factor converting one unit of `code` into roubles during `month`.
    ///
    /// The fixed table fails with [`StatsError::UnknownCurrency`]; the
    /// monthly table fails with [`StatsError::MissingRateForPeriod`], which
    /// callers treat as record-level.
    pub fn factor(&self, code: &str, month: YearMonth) -> Result<f64> {
        if code == REFERENCE_CURRENCY {
            return Ok(1.0);
        }
        match self {
            RateTable::Fixed(rates) => rates
                .get(code)
                .copied()
                .ok_or_else(|| StatsError::UnknownCurrency(code.to_string())),
            RateTable::Monthly(months) => months
                .get(&month)
                .and_then(|rates| rates.get(code))
                .copied()
                .ok_or_else(|| StatsError::MissingRateForPeriod {
                    currency: code.to_string(),
                    period: month.to_string(),
                }),
        }
    }

    /// Every currency code the table knows about, sorted.
    pub fn currencies(&self) -> Vec<String> {
        let codes: BTreeSet<&String> = match self {
            RateTable::Fixed(rates) => rates.keys().collect(),
            RateTable::Monthly(months) => months.values().flat_map(|m| m.keys()).collect(),
        };
        codes.into_iter().cloned().collect()
    }

    /// Number of months covered (0 for the fixed table).
    pub fn month_count(&self) -> usize {
        match self {
            RateTable::Fixed(_) => 0,
            RateTable::Monthly(months) => months.len(),
        }
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::builtin()
    }
}

// ── Salary helpers ────────────────────────────────────────────────────────────

/// Parse one salary bound. Empty, non-numeric and non-finite values are
/// treated as missing.
pub fn parse_bound(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Midpoint of a salary range: the mean of both bounds, or the single bound
/// that is present.
pub fn midpoint(salary_from: Option<f64>, salary_to: Option<f64>) -> Option<f64> {
    match (salary_from, salary_to) {
        (Some(from), Some(to)) => Some((from + to) / 2.0),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    }
}

// ── SalaryNormalizer ──────────────────────────────────────────────────────────

/// Converts raw salary ranges into rouble amounts using a shared, read-only
/// [`RateTable`].
#[derive(Debug, Clone)]
pub struct SalaryNormalizer {
    rates: Arc<RateTable>,
}

impl SalaryNormalizer {
    pub fn new(rates: Arc<RateTable>) -> Self {
        Self { rates }
    }

    /// Normalizer over the built-in fixed table.
    pub fn builtin() -> Self {
        Self::new(Arc::new(RateTable::builtin()))
    }

    pub fn rates(&self) -> &Arc<RateTable> {
        &self.rates
    }

    /// Rouble-equivalent midpoint of a salary range published at
    /// `published_at`.
    ///
    /// Returns `Ok(None)` when both bounds are missing, the currency code is
    /// empty, or the monthly table has no rate for that month. An unknown
    /// code in the fixed table is an error.
    pub fn normalize(
        &self,
        salary_from: Option<f64>,
        salary_to: Option<f64>,
        currency: &str,
        published_at: &DateTime<FixedOffset>,
    ) -> Result<Option<f64>> {
        let currency = currency.trim();
        if currency.is_empty() {
            return Ok(None);
        }
        let Some(mid) = midpoint(salary_from, salary_to) else {
            return Ok(None);
        };
        if currency == REFERENCE_CURRENCY {
            return Ok(Some(mid));
        }

        match self
            .rates
            .factor(currency, YearMonth::from_datetime(published_at))
        {
            Ok(factor) => Ok(Some(mid * factor)),
            Err(e) if e.is_record_level() => {
                debug!("Skipping salary: {}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
