//! CSV discovery and loading for vacancy exports.
//!
//! Reads delimited files into a [`RawTable`] of untyped records, then
//! validates them into [`RawRow`]s keyed by canonical [`VacancyField`]s.
//! Malformed rows are dropped here and never reach the pipeline.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use vacancy_core::error::{Result, StatsError};
use vacancy_core::models::{resolve_header, statistics_columns, RawRow, VacancyField};

// ── Public types ──────────────────────────────────────────────────────────────

/// A delimited file as read: header labels and every following record.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub source: PathBuf,
    /// Header labels exactly as written in the file.
    pub labels: Vec<String>,
    pub records: Vec<csv::StringRecord>,
}

impl RawTable {
    /// Index of the column whose label resolves to `field`.
    pub fn column_of(&self, field: VacancyField) -> Result<usize> {
        self.labels
            .iter()
            .position(|label| VacancyField::from_header(label).ok() == Some(field))
            .ok_or_else(|| StatsError::MissingColumn(field.key().to_string()))
    }
}

/// Validated rows of one source.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub source: PathBuf,
    pub header: Vec<VacancyField>,
    pub rows: Vec<RawRow>,
    /// Rows discarded as malformed.
    pub dropped: usize,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.csv` files recursively under `dir`, sorted by path.
pub fn find_csv_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Input path does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Read `path` into a [`RawTable`].
///
/// Fails with [`StatsError::EmptyInput`] when the file has no header row.
pub fn read_table(path: &Path) -> Result<RawTable> {
    let file = File::open(path).map_err(|source| StatsError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    read_table_from(file, path)
}

/// Same as [`read_table`] over any reader; `source` is used for messages.
pub fn read_table_from<R: Read>(reader: R, source: &Path) -> Result<RawTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = csv_reader.records();
    let header = match records.next() {
        Some(record) => record?,
        None => return Err(StatsError::EmptyInput(source.to_path_buf())),
    };
    if header.iter().all(|label| label.trim().is_empty()) {
        return Err(StatsError::EmptyInput(source.to_path_buf()));
    }

    let labels = header
        .iter()
        .enumerate()
        .map(|(i, label)| {
            if i == 0 {
                label.trim_start_matches('\u{feff}').to_string()
            } else {
                label.to_string()
            }
        })
        .collect();
    let records = records.collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(RawTable {
        source: source.to_path_buf(),
        labels,
        records,
    })
}

/// Load and validate the rows of a vacancy CSV for the statistics pipeline.
///
/// * Unknown header labels fail with [`StatsError::UnknownField`].
/// * Without `name`, `area_name`, `published_at` and either `salary` or the
///   `salary_from`/`salary_to`/`salary_currency` range, fails with
///   [`StatsError::MissingColumn`].
/// * Rows with the wrong column count or any empty field are dropped.
/// * Zero surviving rows fail with [`StatsError::NoData`].
pub fn load_rows(path: &Path) -> Result<Dataset> {
    validate(read_table(path)?)
}

/// Same as [`load_rows`] over any reader.
pub fn parse_rows<R: Read>(reader: R, source: &Path) -> Result<Dataset> {
    validate(read_table_from(reader, source)?)
}

/// Load the rows of any vacancy CSV whose labels all resolve, without
/// requiring particular columns. Malformed rows are dropped as in
/// [`load_rows`].
pub fn load_all_rows(path: &Path) -> Result<Dataset> {
    let table = read_table(path)?;
    let header = resolve_header(&table.labels)?;
    collect_rows(table, header)
}

/// `true` when `record` has exactly `width` fields and none of them is empty.
pub fn is_well_formed(record: &csv::StringRecord, width: usize) -> bool {
    record.len() == width && record.iter().all(|value| !value.is_empty())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn validate(table: RawTable) -> Result<Dataset> {
    let header = resolve_header(&table.labels)?;
    statistics_columns(&header)?;
    collect_rows(table, header)
}

fn collect_rows(table: RawTable, header: Vec<VacancyField>) -> Result<Dataset> {
    let width = header.len();
    let mut rows = Vec::with_capacity(table.records.len());
    let mut dropped = 0usize;

    for record in &table.records {
        if !is_well_formed(record, width) {
            dropped += 1;
            continue;
        }
        let values = record.iter().map(str::to_string).collect();
        rows.push(RawRow::from_parts(&header, values));
    }

    debug!(
        "Read {} rows from {} ({} dropped as malformed)",
        rows.len(),
        table.source.display(),
        dropped
    );

    if rows.is_empty() {
        return Err(StatsError::NoData(table.source));
    }

    Ok(Dataset {
        source: table.source,
        header,
        rows,
        dropped,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const HEADER: &str = "name,salary_from,salary_to,salary_currency,area_name,published_at";

    fn parse(content: &str) -> Result<Dataset> {
        parse_rows(content.as_bytes(), Path::new("test.csv"))
    }

    #[test]
    fn test_parse_valid_rows_in_order() {
        let content = format!(
            "{HEADER}\n\
             Программист,40000,55000,RUR,Москва,2012-04-09T13:49:00+0400\n\
             Аналитик,30000,35000,RUR,Казань,2013-01-10T09:00:00+0400\n"
        );
        let ds = parse(&content).unwrap();
        assert_eq!(ds.rows.len(), 2);
        assert_eq!(ds.dropped, 0);
        assert_eq!(ds.rows[0].get(VacancyField::Name), Some("Программист"));
        assert_eq!(ds.rows[1].get(VacancyField::AreaName), Some("Казань"));
        assert_eq!(ds.header.len(), 6);
    }

    #[test]
    fn test_short_row_and_empty_field_dropped() {
        let content = format!(
            "{HEADER}\n\
             Программист,40000,55000,RUR,Москва\n\
             Программист,,55000,RUR,Москва,2012-04-09T13:49:00+0400\n\
             Программист,40000,55000,RUR,Москва,2012-04-09T13:49:00+0400,extra\n\
             Аналитик,30000,35000,RUR,Казань,2013-01-10T09:00:00+0400\n"
        );
        let ds = parse(&content).unwrap();
        assert_eq!(ds.rows.len(), 1);
        assert_eq!(ds.dropped, 3);
        assert_eq!(ds.rows[0].get(VacancyField::Name), Some("Аналитик"));
    }

    #[test]
    fn test_quoted_fields_with_commas() {
        let content = format!(
            "{HEADER}\n\"Инженер, ведущий\",100,200,RUR,\"Москва\",2012-04-09T13:49:00+0400\n"
        );
        let ds = parse(&content).unwrap();
        assert_eq!(ds.rows[0].get(VacancyField::Name), Some("Инженер, ведущий"));
    }

    #[test]
    fn test_empty_source_is_empty_input() {
        let err = parse("").unwrap_err();
        assert!(matches!(err, StatsError::EmptyInput(_)));
    }

    #[test]
    fn test_header_only_is_no_data() {
        let err = parse(&format!("{HEADER}\n")).unwrap_err();
        assert!(matches!(err, StatsError::NoData(_)));
    }

    #[test]
    fn test_all_rows_malformed_is_no_data() {
        let err = parse(&format!("{HEADER}\nx,y\n,,,,,\n")).unwrap_err();
        assert!(matches!(err, StatsError::NoData(_)));
    }

    #[test]
    fn test_unknown_header_fails() {
        let err = parse("name,bonus\nx,1\n").unwrap_err();
        assert!(matches!(err, StatsError::UnknownField(ref f) if f == "bonus"));
    }

    #[test]
    fn test_missing_required_column_fails() {
        let err = parse("name,salary_from,salary_to,salary_currency,area_name\nx,1,2,RUR,Y\n")
            .unwrap_err();
        assert!(matches!(err, StatsError::MissingColumn(ref c) if c == "published_at"));
    }

    #[test]
    fn test_converted_salary_column_accepted() {
        let ds = parse("name,salary,area_name,published_at
x,1500.5,Y,2012-04-09T13:49:00+0400
")
            .unwrap();
        assert_eq!(ds.rows[0].get(VacancyField::Salary), Some("1500.5"));
    }

    #[test]
    fn test_load_all_rows_needs_no_salary() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("plain.csv");
        std::fs::write(&path, "name,area_name
Программист,Москва
,Казань
").unwrap();
        let ds = load_all_rows(&path).unwrap();
        assert_eq!(ds.rows.len(), 1);
        assert_eq!(ds.dropped, 1);
        assert!(load_rows(&path).is_err());
    }

    #[test]
    fn test_display_labels_and_bom_accepted() {
        let content = "\u{feff}Название,Нижняя граница вилки оклада,Верхняя граница вилки оклада,\
                       Идентификатор валюты оклада,Название региона,Дата публикации вакансии\n\
                       Программист,40000,55000,RUR,Москва,2012-04-09T13:49:00+0400\n";
        let ds = parse(content).unwrap();
        assert_eq!(ds.header[0], VacancyField::Name);
        assert_eq!(ds.rows[0].get(VacancyField::SalaryTo), Some("55000"));
    }

    #[test]
    fn test_extra_known_columns_are_kept() {
        let content = format!(
            "{HEADER},key_skills\nПрограммист,1,2,RUR,Москва,2012-04-09T13:49:00+0400,Rust\n"
        );
        let ds = parse(&content).unwrap();
        assert_eq!(ds.rows[0].get(VacancyField::KeySkills), Some("Rust"));
    }

    #[test]
    fn test_load_rows_missing_file() {
        let err = load_rows(Path::new("/nonexistent/vacancies.csv")).unwrap_err();
        assert!(matches!(err, StatsError::FileRead { .. }));
    }

    #[test]
    fn test_find_csv_files_sorted_recursive() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("nested");
        std::fs::create_dir_all(&nested).unwrap();
        for p in [
            tmp.path().join("2008.csv"),
            tmp.path().join("2007.csv"),
            nested.join("2009.csv"),
            tmp.path().join("notes.txt"),
        ] {
            let mut f = File::create(p).unwrap();
            writeln!(f, "{HEADER}").unwrap();
        }

        let files = find_csv_files(tmp.path());
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(tmp.path()).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 3);
        assert_eq!(names[0], "2007.csv");
        assert_eq!(names[1], "2008.csv");
        assert!(names[2].ends_with("2009.csv"));
    }

    #[test]
    fn test_find_csv_files_missing_dir() {
        assert!(find_csv_files(Path::new("/nonexistent/dir")).is_empty());
    }

    #[test]
    fn test_raw_table_column_of() {
        let table = read_table_from(
            format!("{HEADER}\n").as_bytes(),
            Path::new("t.csv"),
        )
        .unwrap();
        assert_eq!(table.column_of(VacancyField::PublishedAt).unwrap(), 5);
        assert!(table.column_of(VacancyField::KeySkills).is_err());
    }
}
