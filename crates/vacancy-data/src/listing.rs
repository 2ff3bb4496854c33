//! Vacancy listing: filter, sort and slice the rows of one export and format
//! them for reading.
//!
//! A [`ListingQuery`] is parsed once from the user's strings:
//!
//! * **filter** `"Label: value"`, where the label is a column's display name.
//!   `Оклад` keeps rows whose salary range contains the value, `Навыки` keeps
//!   rows listing every comma-separated skill, any other column compares its
//!   formatted text.
//! * **sort** a display label, optionally reversed. The sort is stable.
//! * **range** `"start [end]"`, 1-based with `end` exclusive, applied after
//!   filtering and sorting.
//! * **columns** a comma-separated list of display labels.
//!
//! [`list_vacancies`] then applies it to every well-formed row of a file.

use std::cmp::Ordering;
use std::path::Path;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};
use vacancy_core::currency::{currency_name, parse_bound, SalaryNormalizer};
use vacancy_core::error::{Result, StatsError};
use vacancy_core::formatting;
use vacancy_core::models::{RawRow, VacancyField};
use vacancy_core::time_utils::parse_published_at;

use crate::reader::load_all_rows;

/// Longest cell text before it is cut and marked with `...`.
pub const MAX_CELL_CHARS: usize = 100;

/// Columns shown when none are requested.
pub const DEFAULT_COLUMNS: [VacancyField; 9] = [
    VacancyField::Name,
    VacancyField::Description,
    VacancyField::KeySkills,
    VacancyField::ExperienceId,
    VacancyField::Premium,
    VacancyField::EmployerName,
    VacancyField::Salary,
    VacancyField::AreaName,
    VacancyField::PublishedAt,
];

/// Columns that may be requested explicitly.
const LISTABLE_COLUMNS: [VacancyField; 10] = [
    VacancyField::Name,
    VacancyField::Description,
    VacancyField::KeySkills,
    VacancyField::ExperienceId,
    VacancyField::Premium,
    VacancyField::EmployerName,
    VacancyField::Salary,
    VacancyField::AreaName,
    VacancyField::PublishedAt,
    VacancyField::SalaryCurrency,
];

/// Experience codes with their display text, in ascending order.
const EXPERIENCE_LEVELS: [(&str, &str); 4] = [
    ("noExperience", "Нет опыта"),
    ("between1And3", "От 1 года до 3 лет"),
    ("between3And6", "От 3 до 6 лет"),
    ("moreThan6", "Более 6 лет"),
];

const HTML_TAG_PATTERN: &str = r"<.*?>";

// ── Query ─────────────────────────────────────────────────────────────────────

/// Row filter of a listing.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Salary range containing the value.
    Salary(f64),
    /// Every skill present in the row's skill list.
    Skills(Vec<String>),
    /// Formatted value of the column equal to the text.
    Equals(VacancyField, String),
}

impl Filter {
    /// Parse `"Label: value"`. An empty string means no filter.
    pub fn parse(text: &str) -> Result<Option<Filter>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let Some((label, value)) = text.split_once(": ") else {
            return Err(StatsError::InvalidQuery(format!(
                "filter must look like \"Column: value\", got \"{text}\""
            )));
        };
        let field = VacancyField::from_header(label)
            .map_err(|_| StatsError::InvalidQuery(format!("unknown filter column: {label}")))?;
        let value = value.trim();

        let filter = match field {
            VacancyField::Salary => {
                let amount = parse_bound(value).ok_or_else(|| {
                    StatsError::InvalidQuery(format!("salary filter needs a number, got \"{value}\""))
                })?;
                Filter::Salary(amount)
            }
            VacancyField::KeySkills => Filter::Skills(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            other => Filter::Equals(other, value.to_string()),
        };
        Ok(Some(filter))
    }

    fn field(&self) -> VacancyField {
        match self {
            Filter::Salary(_) => VacancyField::Salary,
            Filter::Skills(_) => VacancyField::KeySkills,
            Filter::Equals(field, _) => *field,
        }
    }
}

/// Slice of the filtered and sorted rows, 1-based with `end` exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowRange {
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl RowRange {
    /// Parse `""`, `"start"` or `"start end"`.
    pub fn parse(text: &str) -> Result<RowRange> {
        let bounds = text
            .split_whitespace()
            .map(|part| match part.parse::<usize>() {
                Ok(n) if n >= 1 => Ok(n),
                _ => Err(StatsError::InvalidQuery(format!(
                    "row numbers start at 1, got \"{part}\""
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        match bounds.as_slice() {
            [] => Ok(RowRange::default()),
            [start] => Ok(RowRange {
                start: Some(*start),
                end: None,
            }),
            [start, end] => Ok(RowRange {
                start: Some(*start),
                end: Some(*end),
            }),
            _ => Err(StatsError::InvalidQuery(format!(
                "range is \"start [end]\", got \"{}\"",
                text.trim()
            ))),
        }
    }

    fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let len = items.len();
        let from = self.start.map_or(0, |s| s - 1).min(len);
        let to = self.end.map_or(len, |e| e - 1).clamp(from, len);
        items.into_iter().skip(from).take(to - from).collect()
    }
}

/// Everything that shapes one listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    pub filter: Option<Filter>,
    pub sort: Option<VacancyField>,
    pub reverse: bool,
    pub range: RowRange,
    /// Requested columns; empty means [`DEFAULT_COLUMNS`].
    pub columns: Vec<VacancyField>,
}

impl ListingQuery {
    /// Build a query from the raw option strings; empty strings mean "not
    /// given".
    pub fn parse(filter: &str, sort: &str, reverse: bool, range: &str, columns: &str) -> Result<Self> {
        let sort = match sort.trim() {
            "" => None,
            label => Some(VacancyField::from_header(label).map_err(|_| {
                StatsError::InvalidQuery(format!("unknown sort column: {label}"))
            })?),
        };
        let columns = columns
            .split(',')
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(|label| match VacancyField::from_header(label) {
                Ok(field) if LISTABLE_COLUMNS.contains(&field) => Ok(field),
                _ => Err(StatsError::InvalidQuery(format!("unknown column: {label}"))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            filter: Filter::parse(filter)?,
            sort,
            reverse,
            range: RowRange::parse(range)?,
            columns,
        })
    }

    /// Columns to show for a file with `header`. Default columns the file
    /// cannot supply are left out; requested ones are an error.
    fn resolve_columns(&self, header: &[VacancyField]) -> Result<Vec<VacancyField>> {
        if self.columns.is_empty() {
            return Ok(DEFAULT_COLUMNS
                .iter()
                .copied()
                .filter(|field| available(header, *field))
                .collect());
        }
        for field in &self.columns {
            require_available(header, *field)?;
        }
        Ok(self.columns.clone())
    }
}

// ── Listing ───────────────────────────────────────────────────────────────────

/// One shown vacancy: its position after filtering and sorting, and the
/// formatted cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingRow {
    pub number: usize,
    pub cells: Vec<String>,
}

/// Result of [`list_vacancies`].
#[derive(Debug, Clone, Serialize)]
pub struct VacancyListing {
    pub columns: Vec<VacancyField>,
    /// Rows that passed the filter, before the range was applied.
    pub matched: usize,
    pub rows: Vec<ListingRow>,
}

impl VacancyListing {
    /// Table headers: the row number followed by the column labels.
    pub fn headers(&self) -> Vec<String> {
        std::iter::once("№".to_string())
            .chain(self.columns.iter().map(|f| f.label().to_string()))
            .collect()
    }
}

/// List the vacancies of `path` shaped by `query`.
///
/// `normalizer` puts salaries of different currencies on one scale when
/// sorting by `Оклад`.
pub fn list_vacancies(
    path: &Path,
    query: &ListingQuery,
    normalizer: &SalaryNormalizer,
) -> Result<VacancyListing> {
    let dataset = load_all_rows(path)?;
    let header = &dataset.header;
    let columns = query.resolve_columns(header)?;
    if let Some(filter) = &query.filter {
        require_available(header, filter.field())?;
    }
    if let Some(field) = query.sort {
        require_available(header, field)?;
    }

    let cells = CellFormatter::new()?;
    let mut matched: Vec<&RawRow> = dataset
        .rows
        .iter()
        .filter(|row| query.filter.as_ref().map_or(true, |f| cells.matches(row, f)))
        .collect();

    if let Some(field) = query.sort {
        let mut keyed = matched
            .into_iter()
            .map(|row| cells.sort_value(row, field, normalizer).map(|key| (key, row)))
            .collect::<Result<Vec<_>>>()?;
        // `sort_by` is stable in both directions.
        keyed.sort_by(|(a, _), (b, _)| {
            let order = a.partial_cmp(b).unwrap_or(Ordering::Equal);
            if query.reverse {
                order.reverse()
            } else {
                order
            }
        });
        matched = keyed.into_iter().map(|(_, row)| row).collect();
    }

    let total = matched.len();
    let numbered: Vec<(usize, &RawRow)> = matched
        .into_iter()
        .enumerate()
        .map(|(i, row)| (i + 1, row))
        .collect();
    let rows: Vec<ListingRow> = query
        .range
        .apply(numbered)
        .into_iter()
        .map(|(number, row)| ListingRow {
            number,
            cells: columns
                .iter()
                .map(|field| truncate_cell(&cells.format(row, *field)))
                .collect(),
        })
        .collect();

    debug!(
        "Listing {}: {} of {} rows matched, {} shown",
        path.display(),
        total,
        dataset.rows.len(),
        rows.len()
    );
    info!("Listed {} vacancies from {}", rows.len(), path.display());

    Ok(VacancyListing {
        columns,
        matched: total,
        rows,
    })
}

/// Cut `text` to [`MAX_CELL_CHARS`] characters, marking the cut with `...`.
pub fn truncate_cell(text: &str) -> String {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

// ── Availability ──────────────────────────────────────────────────────────────

fn has_salary_range(header: &[VacancyField]) -> bool {
    [
        VacancyField::SalaryFrom,
        VacancyField::SalaryTo,
        VacancyField::SalaryCurrency,
    ]
    .iter()
    .all(|f| header.contains(f))
}

fn available(header: &[VacancyField], field: VacancyField) -> bool {
    header.contains(&field) || (field == VacancyField::Salary && has_salary_range(header))
}

fn require_available(header: &[VacancyField], field: VacancyField) -> Result<()> {
    if available(header, field) {
        Ok(())
    } else {
        Err(StatsError::MissingColumn(field.key().to_string()))
    }
}

// ── Formatting ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, PartialOrd)]
enum SortValue {
    Number(f64),
    Text(String),
}

struct CellFormatter {
    tags: Regex,
}

impl CellFormatter {
    fn new() -> Result<Self> {
        let tags = Regex::new(HTML_TAG_PATTERN).map_err(|e| StatsError::Other(e.into()))?;
        Ok(Self { tags })
    }

    /// Drop HTML tags and collapse whitespace into single spaces.
    fn clean(&self, raw: &str) -> String {
        self.tags
            .replace_all(raw, "")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Cleaned skill list, one skill per input line.
    fn skills(&self, row: &RawRow) -> Vec<String> {
        let raw = row.get(VacancyField::KeySkills).unwrap_or("");
        self.tags
            .replace_all(raw, "")
            .lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|line| !line.is_empty())
            .collect()
    }

    /// Display text of `field`, before truncation.
    fn format(&self, row: &RawRow, field: VacancyField) -> String {
        let raw = row.get(field).unwrap_or("");
        match field {
            VacancyField::KeySkills => self.skills(row).join("\n"),
            VacancyField::ExperienceId => EXPERIENCE_LEVELS
                .iter()
                .find(|(code, _)| *code == raw.trim())
                .map(|(_, text)| text.to_string())
                .unwrap_or_else(|| self.clean(raw)),
            VacancyField::Premium => yes_no(raw, "Да", "Нет"),
            VacancyField::SalaryGross => yes_no(raw, "Без вычета налогов", "С вычетом налогов"),
            VacancyField::SalaryCurrency => {
                let code = raw.trim();
                currency_name(code).unwrap_or(code).to_string()
            }
            VacancyField::SalaryFrom | VacancyField::SalaryTo => format_amount(raw),
            VacancyField::Salary => self.format_salary(row),
            VacancyField::PublishedAt => parse_published_at(raw)
                .map(|dt| dt.format("%d.%m.%Y").to_string())
                .unwrap_or_else(|_| raw.to_string()),
            _ => self.clean(raw),
        }
    }

    /// `from - to (currency) (gross)` for a raw range, the amount alone for
    /// a converted dataset.
    fn format_salary(&self, row: &RawRow) -> String {
        let (Some(from), Some(to), Some(_)) = (
            row.get(VacancyField::SalaryFrom),
            row.get(VacancyField::SalaryTo),
            row.get(VacancyField::SalaryCurrency),
        ) else {
            return format_amount(row.get(VacancyField::Salary).unwrap_or(""));
        };
        let mut text = format!(
            "{} - {} ({})",
            format_amount(from),
            format_amount(to),
            self.format(row, VacancyField::SalaryCurrency)
        );
        if row.get(VacancyField::SalaryGross).is_some() {
            text.push_str(&format!(" ({})", self.format(row, VacancyField::SalaryGross)));
        }
        text
    }

    fn matches(&self, row: &RawRow, filter: &Filter) -> bool {
        match filter {
            Filter::Salary(amount) => {
                let (low, high) = salary_bounds(row);
                matches!((low, high), (Some(low), Some(high)) if low <= *amount && *amount <= high)
            }
            Filter::Skills(wanted) => {
                let skills = self.skills(row);
                wanted.iter().all(|skill| skills.contains(skill))
            }
            Filter::Equals(field, text) => self.format(row, *field) == *text,
        }
    }

    fn sort_value(
        &self,
        row: &RawRow,
        field: VacancyField,
        normalizer: &SalaryNormalizer,
    ) -> Result<SortValue> {
        let value = match field {
            VacancyField::KeySkills => SortValue::Number(self.skills(row).len() as f64),
            VacancyField::ExperienceId => {
                let raw = row.get(field).unwrap_or("").trim();
                let rank = EXPERIENCE_LEVELS
                    .iter()
                    .position(|(code, _)| *code == raw)
                    .map_or(-1.0, |i| i as f64);
                SortValue::Number(rank)
            }
            VacancyField::PublishedAt => {
                let published = parse_published_at(row.require(field)?)?;
                SortValue::Number(published.timestamp() as f64)
            }
            VacancyField::Salary => {
                let amount = match row.get(VacancyField::SalaryCurrency) {
                    Some(currency) => normalizer.normalize(
                        row.get(VacancyField::SalaryFrom).and_then(parse_bound),
                        row.get(VacancyField::SalaryTo).and_then(parse_bound),
                        currency,
                        &parse_published_at(row.require(VacancyField::PublishedAt)?)?,
                    )?,
                    None => row.get(VacancyField::Salary).and_then(parse_bound),
                };
                SortValue::Number(amount.unwrap_or(f64::NEG_INFINITY))
            }
            VacancyField::SalaryFrom | VacancyField::SalaryTo => SortValue::Number(
                row.get(field)
                    .and_then(parse_bound)
                    .unwrap_or(f64::NEG_INFINITY),
            ),
            _ => SortValue::Text(self.format(row, field)),
        };
        Ok(value)
    }
}

/// Raw bounds of a row's salary; a converted amount is both bounds.
fn salary_bounds(row: &RawRow) -> (Option<f64>, Option<f64>) {
    match (row.get(VacancyField::SalaryFrom), row.get(VacancyField::SalaryTo)) {
        (Some(from), Some(to)) => (parse_bound(from), parse_bound(to)),
        _ => {
            let amount = row.get(VacancyField::Salary).and_then(parse_bound);
            (amount, amount)
        }
    }
}

fn yes_no(raw: &str, yes: &str, no: &str) -> String {
    match raw.trim().to_lowercase().as_str() {
        "true" => yes.to_string(),
        "false" => no.to_string(),
        _ => raw.trim().to_string(),
    }
}

/// Whole roubles with space-separated thousands; unparseable text as is.
fn format_amount(raw: &str) -> String {
    parse_bound(raw)
        .map(|v| formatting::format_salary(v as i64))
        .unwrap_or_else(|| raw.trim().to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
