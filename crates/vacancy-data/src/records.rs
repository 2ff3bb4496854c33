//! Typed vacancy records built from validated rows.

use vacancy_core::currency::{parse_bound, SalaryNormalizer};
use vacancy_core::error::Result;
use vacancy_core::models::{RawRow, VacancyField, VacancyRecord};
use vacancy_core::time_utils::{parse_published_at, publication_year};

/// Builds [`VacancyRecord`]s, normalizing salaries on the way.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    normalizer: SalaryNormalizer,
}

impl RecordBuilder {
    pub fn new(normalizer: SalaryNormalizer) -> Self {
        Self { normalizer }
    }

    pub fn normalizer(&self) -> &SalaryNormalizer {
        &self.normalizer
    }

    /// Build one record.
    ///
    /// A row with a `salary` column (a converted dataset) takes that value
    /// as roubles. Otherwise the `salary_from`/`salary_to`/`salary_currency`
    /// range goes through the normalizer.
    ///
    /// Returns `Ok(None)` when the salary normalizes to nothing (no usable
    /// bounds, empty currency, or no rate for that month). An unparseable
    /// timestamp or an unknown fixed-table currency is an error.
    pub fn build(&self, row: &RawRow) -> Result<Option<VacancyRecord>> {
        let published_at = parse_published_at(row.require(VacancyField::PublishedAt)?)?;
        let salary = match row.get(VacancyField::Salary) {
            Some(converted) => parse_bound(converted),
            None => self.normalizer.normalize(
                parse_bound(row.require(VacancyField::SalaryFrom)?),
                parse_bound(row.require(VacancyField::SalaryTo)?),
                row.require(VacancyField::SalaryCurrency)?,
                &published_at,
            )?,
        };

        let Some(salary) = salary else {
            return Ok(None);
        };

        Ok(Some(VacancyRecord {
            job_title: row.require(VacancyField::Name)?.to_string(),
            salary,
            area_name: row.require(VacancyField::AreaName)?.to_string(),
            year: publication_year(&published_at),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use vacancy_core::currency::RateTable;
    use vacancy_core::error::StatsError;
    use vacancy_core::models::resolve_header;

    fn row(values: [&str; 6]) -> RawRow {
        let header = resolve_header(&[
            "name",
            "salary_from",
            "salary_to",
            "salary_currency",
            "area_name",
            "published_at",
        ])
        .unwrap();
        RawRow::from_parts(&header, values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn test_build_reference_currency_record() {
        let builder = RecordBuilder::new(SalaryNormalizer::builtin());
        let record = builder
            .build(&row([
                "Программист",
                "40000",
                "55000",
                "RUR",
                "Москва",
                "2012-04-09T13:49:00+0400",
            ]))
            .unwrap()
            .unwrap();
        assert_eq!(record.job_title, "Программист");
        assert_eq!(record.salary, 47_500.0);
        assert_eq!(record.area_name, "Москва");
        assert_eq!(record.year, 2012);
    }

    #[test]
    fn test_build_converts_foreign_currency() {
        let builder = RecordBuilder::new(SalaryNormalizer::builtin());
        let record = builder
            .build(&row([
                "Developer",
                "1000",
                "1000",
                "USD",
                "Минск",
                "2018-06-01T10:00:00+0300",
            ]))
            .unwrap()
            .unwrap();
        assert!((record.salary - 60_660.0).abs() < 1e-6);
    }

    #[test]
    fn test_build_unparseable_bounds_skip_record() {
        let builder = RecordBuilder::new(SalaryNormalizer::builtin());
        let record = builder
            .build(&row([
                "Developer",
                "nan",
                "n/a",
                "RUR",
                "Москва",
                "2018-06-01T10:00:00+0300",
            ]))
            .unwrap();
        assert!(record.is_none());
    }

    #[test]
    fn test_build_bad_timestamp_is_fatal() {
        let builder = RecordBuilder::new(SalaryNormalizer::builtin());
        let err = builder
            .build(&row(["Developer", "1", "2", "RUR", "Москва", "yesterday"]))
            .unwrap_err();
        assert!(matches!(err, StatsError::TimestampParse(_)));
    }

    #[test]
    fn test_build_unknown_currency_is_fatal() {
        let builder = RecordBuilder::new(SalaryNormalizer::builtin());
        let err = builder
            .build(&row([
                "Developer",
                "1",
                "2",
                "XXX",
                "Москва",
                "2018-06-01T10:00:00+0300",
            ]))
            .unwrap_err();
        assert!(matches!(err, StatsError::UnknownCurrency(_)));
    }

    #[test]
    fn test_build_missing_month_skips_record() {
        let builder = RecordBuilder::new(SalaryNormalizer::new(Arc::new(RateTable::monthly(
            HashMap::new(),
        ))));
        let record = builder
            .build(&row([
                "Developer",
                "1",
                "2",
                "EUR",
                "Москва",
                "2018-06-01T10:00:00+0300",
            ]))
            .unwrap();
        assert!(record.is_none());
    }

    #[test]
    fn test_build_from_converted_salary_column() {
        let header = resolve_header(&["name", "salary", "area_name", "published_at"]).unwrap();
        let builder = RecordBuilder::new(SalaryNormalizer::builtin());
        let converted = RawRow::from_parts(
            &header,
            vec![
                "Developer".into(),
                "30330.0".into(),
                "Минск".into(),
                "2018-06-01T10:00:00+0300".into(),
            ],
        );
        let record = builder.build(&converted).unwrap().unwrap();
        assert_eq!(record.salary, 30_330.0);
        assert_eq!(record.year, 2018);

        let garbled = RawRow::from_parts(
            &header,
            vec![
                "Developer".into(),
                "n/a".into(),
                "Минск".into(),
                "2018-06-01T10:00:00+0300".into(),
            ],
        );
        assert!(builder.build(&garbled).unwrap().is_none());
    }
}
