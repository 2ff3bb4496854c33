//! Writers for the converted dataset and the JSON report.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;
use vacancy_core::currency::{parse_bound, SalaryNormalizer};
use vacancy_core::error::Result;
use vacancy_core::models::{ensure_columns, resolve_header, RawRow, VacancyField};
use vacancy_core::time_utils::parse_published_at;

use crate::reader::read_table;

/// Default output path of the converted dataset.
pub const DEFAULT_CONVERTED_PATH: &str = "csv_result.csv";

/// Columns of the converted dataset.
pub const CONVERTED_COLUMNS: [VacancyField; 4] = [
    VacancyField::Name,
    VacancyField::Salary,
    VacancyField::AreaName,
    VacancyField::PublishedAt,
];

/// Columns the converter reads. Only `name`, `area_name`, `published_at`
/// and `salary_currency` must be filled in; either bound may be empty.
const CONVERT_INPUT_COLUMNS: [VacancyField; 6] = [
    VacancyField::Name,
    VacancyField::SalaryFrom,
    VacancyField::SalaryTo,
    VacancyField::SalaryCurrency,
    VacancyField::AreaName,
    VacancyField::PublishedAt,
];

const CONVERT_FILLED_COLUMNS: [VacancyField; 4] = [
    VacancyField::Name,
    VacancyField::SalaryCurrency,
    VacancyField::AreaName,
    VacancyField::PublishedAt,
];

/// Counters from [`write_converted`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    pub written: usize,
    /// Data rows not written: a wrong column count, an empty name, area,
    /// date or currency, or a salary that normalized to nothing.
    pub omitted: usize,
}

/// Rewrite `input` with a single rouble `salary` column in place of the
/// salary range and currency.
///
/// A row with only one bound is converted from that bound. Every data row
/// ends up in exactly one of `written` or `omitted`.
pub fn write_converted(
    input: &Path,
    normalizer: &SalaryNormalizer,
    output: &Path,
) -> Result<ConvertSummary> {
    let table = read_table(input)?;
    let header = resolve_header(&table.labels)?;
    ensure_columns(&header, &CONVERT_INPUT_COLUMNS)?;

    let mut writer = csv::Writer::from_path(output)?;
    writer.write_record(CONVERTED_COLUMNS.iter().map(|f| f.key()))?;

    let mut summary = ConvertSummary::default();
    for record in &table.records {
        if record.len() != header.len() {
            summary.omitted += 1;
            continue;
        }
        let row = RawRow::from_parts(&header, record.iter().map(str::to_string).collect());
        let filled = CONVERT_FILLED_COLUMNS
            .iter()
            .all(|field| row.get(*field).is_some_and(|v| !v.is_empty()));
        if !filled {
            summary.omitted += 1;
            continue;
        }

        let published_raw = row.require(VacancyField::PublishedAt)?;
        let published_at = parse_published_at(published_raw)?;
        let salary = normalizer.normalize(
            parse_bound(row.require(VacancyField::SalaryFrom)?),
            parse_bound(row.require(VacancyField::SalaryTo)?),
            row.require(VacancyField::SalaryCurrency)?,
            &published_at,
        )?;
        let Some(salary) = salary else {
            summary.omitted += 1;
            continue;
        };

        writer.write_record([
            row.require(VacancyField::Name)?,
            salary.to_string().as_str(),
            row.require(VacancyField::AreaName)?,
            published_raw,
        ])?;
        summary.written += 1;
    }
    writer.flush()?;

    info!(
        "Wrote {} converted rows to {} ({} omitted)",
        summary.written,
        output.display(),
        summary.omitted
    );
    Ok(summary)
}

/// Write `value` to `path` as pretty-printed JSON.
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, value)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tempfile::TempDir;
    use vacancy_core::currency::RateTable;
    use vacancy_core::time_utils::YearMonth;

    #[test]
    fn test_write_converted_applies_monthly_rates() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(
            &input,
            "name,salary_from,salary_to,salary_currency,area_name,published_at\n\
             Программист,40000,55000,RUR,Москва,2012-04-09T13:49:00+0400\n\
             Developer,1000,3000,USD,Минск,2012-04-10T10:00:00+0300\n\
             Developer,1000,3000,USD,Минск,2012-05-10T10:00:00+0300\n",
        )
        .unwrap();

        let mut rates = HashMap::new();
        rates.insert("USD".to_string(), 30.0);
        let mut months = HashMap::new();
        months.insert(YearMonth::new(2012, 4).unwrap(), rates);
        let normalizer = SalaryNormalizer::new(Arc::new(RateTable::monthly(months)));

        let output = dir.path().join("out.csv");
        let summary = write_converted(&input, &normalizer, &output).unwrap();
        assert_eq!(summary, ConvertSummary { written: 2, omitted: 1 });

        let content = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "name,salary,area_name,published_at");
        assert_eq!(lines[1], "Программист,47500,Москва,2012-04-09T13:49:00+0400");
        assert_eq!(lines[2], "Developer,60000,Минск,2012-04-10T10:00:00+0300");
        assert_eq!(lines.len(), 3);
    }

    fn usd_january_2010() -> SalaryNormalizer {
        let mut rates = HashMap::new();
        rates.insert("USD".to_string(), 30.0);
        let mut months = HashMap::new();
        months.insert(YearMonth::new(2010, 1).unwrap(), rates);
        SalaryNormalizer::new(Arc::new(RateTable::monthly(months)))
    }

    const ONE_BOUND_ROWS: &str = "name,salary_from,salary_to,salary_currency,area_name,published_at\n\
                                  A,1000,,USD,Москва,2010-01-15T10:00:00+0300\n\
                                  B,,2000,RUR,Москва,2010-01-16T10:00:00+0300\n\
                                  C,1000,3000,RUR,Казань,2010-01-17T10:00:00+0300\n\
                                  D,1000,2000,,Казань,2010-01-18T10:00:00+0300\n\
                                  E,,,RUR,Казань,2010-01-19T10:00:00+0300\n\
                                  F,1000,2000,RUR\n";

    #[test]
    fn test_write_converted_keeps_one_bound_rows() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, ONE_BOUND_ROWS).unwrap();

        let output = dir.path().join("out.csv");
        let summary = write_converted(&input, &usd_january_2010(), &output).unwrap();
        // D has no currency, E no bounds, F is short.
        assert_eq!(summary, ConvertSummary { written: 3, omitted: 3 });

        let content = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[1], "A,30000,Москва,2010-01-15T10:00:00+0300");
        assert_eq!(lines[2], "B,2000,Москва,2010-01-16T10:00:00+0300");
        assert_eq!(lines[3], "C,2000,Казань,2010-01-17T10:00:00+0300");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_converted_output_feeds_statistics() {
        use crate::analysis::analyze_file;

        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, ONE_BOUND_ROWS).unwrap();
        let output = dir.path().join("csv_result.csv");
        write_converted(&input, &usd_january_2010(), &output).unwrap();

        // The converted file carries no currency, so any normalizer works.
        let analysis = analyze_file(&output, &SalaryNormalizer::builtin(), "A").unwrap();
        let stats = &analysis.statistics;
        assert_eq!(analysis.metadata.ingest.records_used, 3);
        assert_eq!(stats.salary_by_year.get(&2010), Some(&11_333));
        assert_eq!(stats.count_by_year.get(&2010), Some(&3));
        assert_eq!(stats.profession_salary_by_year.get(&2010), Some(&30_000));
        assert_eq!(stats.salary_by_city.get("Москва"), Some(&16_000));
        assert_eq!(stats.salary_by_city.get("Казань"), Some(&2_000));
    }

    #[test]
    fn test_write_converted_requires_currency_column() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(
            &input,
            "name,salary,area_name,published_at\nA,1,B,2010-01-15T10:00:00+0300\n",
        )
        .unwrap();
        let err = write_converted(&input, &usd_january_2010(), &dir.path().join("out.csv"))
            .unwrap_err();
        assert!(matches!(
            err,
            vacancy_core::error::StatsError::MissingColumn(ref c) if c == "salary_from"
        ));
    }

    #[test]
    fn test_write_json_pretty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report").join("stats.json");
        let mut value = HashMap::new();
        value.insert("answer", 42);

        write_json(&value, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"answer\": 42"));
        assert!(content.ends_with('\n'));
    }
}
