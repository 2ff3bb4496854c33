use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, StatsError};

// ── VacancyField ──────────────────────────────────────────────────────────────

/// A canonical column of a vacancy export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VacancyField {
    Name,
    Description,
    KeySkills,
    ExperienceId,
    Premium,
    EmployerName,
    Salary,
    SalaryFrom,
    SalaryTo,
    SalaryGross,
    SalaryCurrency,
    AreaName,
    PublishedAt,
}

/// Header label table: `(canonical key, display label, field)`.
///
/// Both spellings are accepted in a header row; anything else is rejected.
const FIELD_TABLE: &[(&str, &str, VacancyField)] = &[
    ("name", "Название", VacancyField::Name),
    ("description", "Описание", VacancyField::Description),
    ("key_skills", "Навыки", VacancyField::KeySkills),
    ("experience_id", "Опыт работы", VacancyField::ExperienceId),
    ("premium", "Премиум-вакансия", VacancyField::Premium),
    ("employer_name", "Компания", VacancyField::EmployerName),
    ("salary", "Оклад", VacancyField::Salary),
    ("salary_from", "Нижняя граница вилки оклада", VacancyField::SalaryFrom),
    ("salary_to", "Верхняя граница вилки оклада", VacancyField::SalaryTo),
    ("salary_gross", "Оклад указан до вычета налогов", VacancyField::SalaryGross),
    ("salary_currency", "Идентификатор валюты оклада", VacancyField::SalaryCurrency),
    ("area_name", "Название региона", VacancyField::AreaName),
    ("published_at", "Дата публикации вакансии", VacancyField::PublishedAt),
];

/// Columns every statistics input must carry.
pub const BASE_FIELDS: [VacancyField; 3] = [
    VacancyField::Name,
    VacancyField::AreaName,
    VacancyField::PublishedAt,
];

/// Columns of a raw salary range, used when no `salary` column is present.
pub const SALARY_RANGE_FIELDS: [VacancyField; 3] = [
    VacancyField::SalaryFrom,
    VacancyField::SalaryTo,
    VacancyField::SalaryCurrency,
];

/// How a statistics input states its salary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalaryColumns {
    /// A single `salary` column already in roubles (a converted dataset).
    Converted,
    /// `salary_from`, `salary_to` and `salary_currency`.
    Range,
}

impl VacancyField {
    /// Resolve a header label (canonical key or display label).
    pub fn from_header(label: &str) -> Result<Self> {
        let label = label.trim().trim_start_matches('\u{feff}');
        FIELD_TABLE
            .iter()
            .find(|(key, display, _)| *key == label || *display == label)
            .map(|(_, _, field)| *field)
            .ok_or_else(|| StatsError::UnknownField(label.to_string()))
    }

    /// Canonical snake_case key, e.g. `"salary_from"`.
    pub fn key(self) -> &'static str {
        self.entry().0
    }

    /// Human-readable display label.
    pub fn label(self) -> &'static str {
        self.entry().1
    }

    fn entry(self) -> &'static (&'static str, &'static str, VacancyField) {
        FIELD_TABLE
            .iter()
            .find(|(_, _, field)| *field == self)
            .unwrap_or(&FIELD_TABLE[0])
    }
}

impl fmt::Display for VacancyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Resolve a full header row into fields, failing on the first unknown label.
pub fn resolve_header<S: AsRef<str>>(labels: &[S]) -> Result<Vec<VacancyField>> {
    labels
        .iter()
        .map(|label| VacancyField::from_header(label.as_ref()))
        .collect()
}

/// Fail with [`StatsError::MissingColumn`] unless every field in `required`
/// is present in `header`.
pub fn ensure_columns(header: &[VacancyField], required: &[VacancyField]) -> Result<()> {
    match required.iter().find(|field| !header.contains(field)) {
        Some(missing) => Err(StatsError::MissingColumn(missing.key().to_string())),
        None => Ok(()),
    }
}

/// Check that `header` can feed the statistics pipeline and report which
/// salary layout it uses. A `salary` column takes precedence over a range.
pub fn statistics_columns(header: &[VacancyField]) -> Result<SalaryColumns> {
    ensure_columns(header, &BASE_FIELDS)?;
    if header.contains(&VacancyField::Salary) {
        return Ok(SalaryColumns::Converted);
    }
    ensure_columns(header, &SALARY_RANGE_FIELDS)?;
    Ok(SalaryColumns::Range)
}

// ── RawRow ────────────────────────────────────────────────────────────────────

/// One validated input row: field → value pairs in header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    fields: Vec<(VacancyField, String)>,
}

impl RawRow {
    pub fn new(fields: Vec<(VacancyField, String)>) -> Self {
        Self { fields }
    }

    /// Zip a header with a row of values. Callers guarantee equal lengths.
    pub fn from_parts(header: &[VacancyField], values: Vec<String>) -> Self {
        Self {
            fields: header.iter().copied().zip(values).collect(),
        }
    }

    /// Value of `field`, if the row carries that column.
    pub fn get(&self, field: VacancyField) -> Option<&str> {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.as_str())
    }

    /// Value of `field`, or [`StatsError::MissingColumn`].
    pub fn require(&self, field: VacancyField) -> Result<&str> {
        self.get(field)
            .ok_or_else(|| StatsError::MissingColumn(field.key().to_string()))
    }

    pub fn fields(&self) -> &[(VacancyField, String)] {
        &self.fields
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, v)| v.as_str())
    }
}

// ── VacancyRecord ─────────────────────────────────────────────────────────────

/// A vacancy with its salary already normalized to the reference currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VacancyRecord {
    /// Job title as published.
    pub job_title: String,
    /// Salary midpoint in roubles.
    pub salary: f64,
    /// Region / city name.
    pub area_name: String,
    /// Calendar year of publication.
    pub year: i32,
}

impl VacancyRecord {
    /// Literal, case-sensitive substring match of `profession` against the
    /// job title.
    pub fn matches_profession(&self, profession: &str) -> bool {
        self.job_title.contains(profession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_from_canonical_key() {
        assert_eq!(
            VacancyField::from_header("salary_from").unwrap(),
            VacancyField::SalaryFrom
        );
        assert_eq!(
            VacancyField::from_header("published_at").unwrap(),
            VacancyField::PublishedAt
        );
    }

    #[test]
    fn test_field_from_display_label() {
        assert_eq!(
            VacancyField::from_header("Название региона").unwrap(),
            VacancyField::AreaName
        );
        assert_eq!(
            VacancyField::from_header("Идентификатор валюты оклада").unwrap(),
            VacancyField::SalaryCurrency
        );
    }

    #[test]
    fn test_field_strips_bom() {
        assert_eq!(
            VacancyField::from_header("\u{feff}name").unwrap(),
            VacancyField::Name
        );
    }

    #[test]
    fn test_unknown_field_fails_fast() {
        let err = VacancyField::from_header("bonus").unwrap_err();
        assert!(matches!(err, StatsError::UnknownField(ref s) if s == "bonus"));
    }

    #[test]
    fn test_field_key_and_label() {
        assert_eq!(VacancyField::AreaName.key(), "area_name");
        assert_eq!(VacancyField::AreaName.label(), "Название региона");
        assert_eq!(VacancyField::PublishedAt.to_string(), "published_at");
    }

    #[test]
    fn test_ensure_columns_reports_first_missing() {
        let header = resolve_header(&["name", "salary_from", "salary_to"]).unwrap();
        let err = ensure_columns(&header, &SALARY_RANGE_FIELDS).unwrap_err();
        assert!(matches!(err, StatsError::MissingColumn(ref c) if c == "salary_currency"));
    }

    #[test]
    fn test_statistics_columns_accepts_range_or_converted() {
        let range = resolve_header(&[
            "name",
            "salary_from",
            "salary_to",
            "salary_currency",
            "area_name",
            "published_at",
        ])
        .unwrap();
        assert_eq!(statistics_columns(&range).unwrap(), SalaryColumns::Range);

        let converted = resolve_header(&["name", "salary", "area_name", "published_at"]).unwrap();
        assert_eq!(statistics_columns(&converted).unwrap(), SalaryColumns::Converted);
    }

    #[test]
    fn test_statistics_columns_without_salary_fails() {
        let header = resolve_header(&["name", "area_name", "published_at"]).unwrap();
        let err = statistics_columns(&header).unwrap_err();
        assert!(matches!(err, StatsError::MissingColumn(ref c) if c == "salary_from"));

        let header = resolve_header(&["name", "salary", "published_at"]).unwrap();
        let err = statistics_columns(&header).unwrap_err();
        assert!(matches!(err, StatsError::MissingColumn(ref c) if c == "area_name"));
    }

    #[test]
    fn test_raw_row_lookup() {
        let header = resolve_header(&["name", "area_name"]).unwrap();
        let row = RawRow::from_parts(&header, vec!["Аналитик".into(), "Казань".into()]);
        assert_eq!(row.get(VacancyField::AreaName), Some("Казань"));
        assert_eq!(row.get(VacancyField::SalaryTo), None);
        assert!(row.require(VacancyField::SalaryTo).is_err());
        assert_eq!(row.values().collect::<Vec<_>>(), vec!["Аналитик", "Казань"]);
    }

    #[test]
    fn test_profession_match_is_case_sensitive_substring() {
        let record = VacancyRecord {
            job_title: "Senior Программист 1С".to_string(),
            salary: 100_000.0,
            area_name: "Москва".to_string(),
            year: 2020,
        };
        assert!(record.matches_profession("Программист"));
        assert!(!record.matches_profession("программист"));
        assert!(record.matches_profession(""));
    }
}
