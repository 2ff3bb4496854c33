//! Splitting one vacancy CSV into per-year files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use vacancy_core::error::Result;
use vacancy_core::models::VacancyField;
use vacancy_core::time_utils::year_prefix;

use crate::reader::read_table;

/// Default directory for per-year files.
pub const DEFAULT_SPLIT_DIR: &str = "vacancies_data";

/// One file written by [`split_by_year`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearPartition {
    pub year: String,
    pub path: PathBuf,
    pub rows: usize,
}

/// Write every row of `input` into `<out_dir>/<year>.csv`, keyed by the
/// first four characters of `published_at`.
///
/// Each file carries the original header and keeps input row order. Rows
/// without a year prefix are skipped with a warning.
pub fn split_by_year(input: &Path, out_dir: &Path) -> Result<Vec<YearPartition>> {
    let table = read_table(input)?;
    let date_col = table.column_of(VacancyField::PublishedAt)?;

    let mut by_year: BTreeMap<String, Vec<&csv::StringRecord>> = BTreeMap::new();
    let mut skipped = 0usize;
    for record in &table.records {
        match record.get(date_col).and_then(year_prefix) {
            Some(year) => by_year.entry(year.to_string()).or_default().push(record),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!("Skipped {} rows without a publication year", skipped);
    }

    std::fs::create_dir_all(out_dir)?;

    let mut partitions = Vec::with_capacity(by_year.len());
    for (year, records) in by_year {
        let path = out_dir.join(format!("{year}.csv"));
        let mut writer = csv::WriterBuilder::new().flexible(true).from_path(&path)?;
        writer.write_record(&table.labels)?;
        for record in &records {
            writer.write_record(*record)?;
        }
        writer.flush()?;

        partitions.push(YearPartition {
            year,
            path,
            rows: records.len(),
        });
    }

    info!(
        "Split {} into {} yearly files under {}",
        input.display(),
        partitions.len(),
        out_dir.display()
    );
    Ok(partitions)
}
