//! Statistics pipeline for vacancy exports.
//!
//! Runs three strictly sequential phases over one source:
//!
//! 1. **Ingest**: load and validate rows, build [`VacancyRecord`]s.
//! 2. **Accumulate**: one pass feeding the year, profession and city
//!    aggregators held in [`Accumulators`]. The profession views only see
//!    records picked by the run's [`Selection`].
//! 3. **Finalize**: means, the empty-profession fallback, then the city
//!    filter and ranking, producing a [`PipelineResult`].
//!
//! Accumulators from independent sources can be merged before finalizing,
//! which is how the partitioned runner combines per-year files.

use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};
use vacancy_core::currency::SalaryNormalizer;
use vacancy_core::error::Result;
use indexmap::IndexMap;
use vacancy_core::models::VacancyRecord;

use crate::aggregator::GroupAggregator;
use crate::ranking::{filter_and_rank, surviving_keys, top_by_value};
use crate::reader::load_rows;
use crate::records::RecordBuilder;

// ── Public types ──────────────────────────────────────────────────────────────

/// The six statistics of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    /// Mean salary per year, ascending years.
    pub salary_by_year: IndexMap<i32, i64>,
    /// Vacancy count per year, ascending years.
    pub count_by_year: IndexMap<i32, u64>,
    /// Mean salary per year among profession matches.
    pub profession_salary_by_year: IndexMap<i32, i64>,
    /// Vacancy count per year among profession matches.
    pub profession_count_by_year: IndexMap<i32, u64>,
    /// Top cities by mean salary.
    pub salary_by_city: IndexMap<String, i64>,
    /// Top cities by share of all vacancies.
    pub share_by_city: IndexMap<String, f64>,
}

impl PipelineResult {
    /// `true` when no record contributed to any statistic.
    pub fn is_empty(&self) -> bool {
        self.count_by_year.is_empty()
    }
}

/// Row and record counters gathered while ingesting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Rows that passed validation.
    pub rows_read: usize,
    /// Rows dropped as malformed.
    pub rows_dropped: usize,
    /// Records that reached the aggregators.
    pub records_used: usize,
    /// Valid rows whose salary normalized to nothing.
    pub records_skipped: usize,
}

impl IngestStats {
    pub fn absorb(&mut self, other: &IngestStats) {
        self.rows_read += other.rows_read;
        self.rows_dropped += other.rows_dropped;
        self.records_used += other.records_used;
        self.records_skipped += other.records_skipped;
    }
}

/// Metadata produced alongside a [`PipelineResult`].
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMetadata {
    /// RFC 3339 timestamp of when the result was generated.
    pub generated_at: String,
    /// Number of source files processed.
    pub files_processed: usize,
    pub ingest: IngestStats,
    /// Wall-clock seconds spent on the whole run.
    pub elapsed_seconds: f64,
}

/// Which records feed the profession views: a title substring and, when
/// set, one exact area name. The year and city views ignore it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub profession: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
}

impl Selection {
    pub fn new(profession: impl Into<String>) -> Self {
        Self {
            profession: profession.into(),
            area: None,
        }
    }

    /// Restrict to one area. `None` or an empty name keeps every area.
    pub fn with_area(mut self, area: Option<String>) -> Self {
        self.area = area.filter(|a| !a.is_empty());
        self
    }

    pub fn matches(&self, record: &VacancyRecord) -> bool {
        record.matches_profession(&self.profession)
            && self.area.as_deref().map_or(true, |area| record.area_name == area)
    }
}

impl From<&str> for Selection {
    fn from(profession: &str) -> Self {
        Selection::new(profession)
    }
}

impl From<String> for Selection {
    fn from(profession: String) -> Self {
        Selection::new(profession)
    }
}

/// The complete output of a run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub profession: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    pub statistics: PipelineResult,
    pub metadata: AnalysisMetadata,
}

// ── Accumulators ──────────────────────────────────────────────────────────────

/// Aggregators fed by the accumulate phase.
#[derive(Debug, Clone)]
pub struct Accumulators {
    selection: Selection,
    by_year: GroupAggregator<i32>,
    profession_by_year: GroupAggregator<i32>,
    by_city: GroupAggregator<String>,
}

impl Accumulators {
    /// Empty accumulators whose profession views follow `selection`.
    pub fn new(selection: impl Into<Selection>) -> Self {
        Self {
            selection: selection.into(),
            by_year: GroupAggregator::new(),
            profession_by_year: GroupAggregator::new(),
            by_city: GroupAggregator::new(),
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Feed one record into every aggregator it belongs to.
    pub fn observe(&mut self, record: &VacancyRecord) {
        self.by_year.add(record.year, record.salary);
        if self.selection.matches(record) {
            self.profession_by_year.add(record.year, record.salary);
        }
        self.by_city.add(record.area_name.clone(), record.salary);
    }

    /// Number of records observed so far.
    pub fn records_seen(&self) -> u64 {
        self.by_year.total_count()
    }

    /// Fold another unit's accumulators into these, key-wise.
    pub fn merge(&mut self, other: &Accumulators) {
        self.by_year.merge(&other.by_year);
        self.profession_by_year.merge(&other.profession_by_year);
        self.by_city.merge(&other.by_city);
    }

    /// Compute the six statistics.
    pub fn finalize(&self) -> PipelineResult {
        let mut salary_by_year = self.by_year.mean_per_key();
        let mut count_by_year = self.by_year.count_per_key();
        salary_by_year.sort_keys();
        count_by_year.sort_keys();

        // Every year of the full data appears in the profession views, with
        // 0 where nothing matched.
        let profession_salary = self.profession_by_year.mean_per_key();
        let profession_count = self.profession_by_year.count_per_key();
        let profession_salary_by_year: IndexMap<i32, i64> = salary_by_year
            .keys()
            .map(|year| (*year, profession_salary.get(year).copied().unwrap_or(0)))
            .collect();
        let profession_count_by_year: IndexMap<i32, u64> = count_by_year
            .keys()
            .map(|year| (*year, profession_count.get(year).copied().unwrap_or(0)))
            .collect();

        let city_counts = self.by_city.count_per_key();
        let total = self.by_city.total_count();
        let cities = surviving_keys(&city_counts, total);
        let salary_by_city = top_by_value(&self.by_city.mean_per_key(), &cities);
        let share_by_city = filter_and_rank(&city_counts, total);

        PipelineResult {
            salary_by_year,
            count_by_year,
            profession_salary_by_year,
            profession_count_by_year,
            salary_by_city,
            share_by_city,
        }
    }
}

// ── Pipeline phases ───────────────────────────────────────────────────────────

/// Ingest phase: load, validate and build records from `path`.
///
/// Records whose salary normalizes to nothing are counted and left out.
pub fn ingest(path: &Path, builder: &RecordBuilder) -> Result<(Vec<VacancyRecord>, IngestStats)> {
    let dataset = load_rows(path)?;
    let mut stats = IngestStats {
        rows_read: dataset.rows.len(),
        rows_dropped: dataset.dropped,
        ..Default::default()
    };

    let mut records = Vec::with_capacity(dataset.rows.len());
    for row in &dataset.rows {
        match builder.build(row)? {
            Some(record) => records.push(record),
            None => stats.records_skipped += 1,
        }
    }
    stats.records_used = records.len();

    debug!(
        "Ingested {}: {} records used, {} skipped",
        path.display(),
        stats.records_used,
        stats.records_skipped
    );
    Ok((records, stats))
}

/// Ingest and accumulate one source without finalizing.
pub fn accumulate_file(
    path: &Path,
    normalizer: &SalaryNormalizer,
    selection: &Selection,
) -> Result<(Accumulators, IngestStats)> {
    let builder = RecordBuilder::new(normalizer.clone());
    let (records, stats) = ingest(path, &builder)?;

    let mut acc = Accumulators::new(selection.clone());
    for record in &records {
        acc.observe(record);
    }
    Ok((acc, stats))
}

/// Run the full pipeline over a single CSV file.
pub fn analyze_file(
    path: &Path,
    normalizer: &SalaryNormalizer,
    selection: impl Into<Selection>,
) -> Result<AnalysisResult> {
    let start = std::time::Instant::now();
    let selection = selection.into();
    let (acc, ingest) = accumulate_file(path, normalizer, &selection)?;
    let statistics = acc.finalize();

    info!(
        "Analyzed {}: {} records, {} years",
        path.display(),
        ingest.records_used,
        statistics.count_by_year.len()
    );

    Ok(AnalysisResult {
        profession: selection.profession,
        area: selection.area,
        statistics,
        metadata: AnalysisMetadata {
            generated_at: Utc::now().to_rfc3339(),
            files_processed: 1,
            ingest,
            elapsed_seconds: start.elapsed().as_secs_f64(),
        },
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
