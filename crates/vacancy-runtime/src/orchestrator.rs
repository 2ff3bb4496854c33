//! Fan-out/fan-in runner over partitioned vacancy files.
//!
//! Each CSV file is an independent unit of work processed on its own tokio
//! blocking task with its own [`Accumulators`]. Once every unit completes,
//! the accumulators are merged in file-name order and finalized once.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use tokio::task::JoinHandle;
use vacancy_core::currency::SalaryNormalizer;
use vacancy_core::error::{Result, StatsError};
use vacancy_data::analysis::{
    accumulate_file, Accumulators, AnalysisMetadata, AnalysisResult, IngestStats, Selection,
};
use vacancy_data::reader::find_csv_files;

type UnitOutput = Result<(Accumulators, IngestStats)>;

// ── PartitionedRunner ─────────────────────────────────────────────────────────

/// Runs the statistics pipeline over one file or a directory of files.
///
/// The rate table inside the normalizer is shared read-only by every unit.
#[derive(Debug, Clone)]
pub struct PartitionedRunner {
    normalizer: SalaryNormalizer,
    selection: Selection,
}

impl PartitionedRunner {
    pub fn new(normalizer: SalaryNormalizer, selection: impl Into<Selection>) -> Self {
        Self {
            normalizer,
            selection: selection.into(),
        }
    }

    /// Analyze `input`: a single CSV file, or every `*.csv` under a directory.
    pub async fn analyze_path(&self, input: &Path) -> Result<AnalysisResult> {
        let files = if input.is_dir() {
            let files = find_csv_files(input);
            if files.is_empty() {
                return Err(StatsError::NoData(input.to_path_buf()));
            }
            files
        } else {
            vec![input.to_path_buf()]
        };
        self.run(files).await
    }

    /// Process `files` concurrently and merge their accumulators in the
    /// order given.
    ///
    /// Any unit failure aborts the run; no partial result is produced.
    pub async fn run(&self, files: Vec<PathBuf>) -> Result<AnalysisResult> {
        let start = Instant::now();
        let file_count = files.len();

        let handles: Vec<(PathBuf, JoinHandle<UnitOutput>)> = files
            .into_iter()
            .map(|path| {
                let normalizer = self.normalizer.clone();
                let selection = self.selection.clone();
                let unit_path = path.clone();
                let handle = tokio::task::spawn_blocking(move || {
                    accumulate_file(&unit_path, &normalizer, &selection)
                });
                (path, handle)
            })
            .collect();

        let mut merged = Accumulators::new(self.selection.clone());
        let mut ingest = IngestStats::default();
        for (path, handle) in handles {
            let (acc, stats) = handle.await.map_err(|e| {
                StatsError::Other(anyhow::anyhow!(
                    "worker for {} failed: {}",
                    path.display(),
                    e
                ))
            })??;
            tracing::debug!(
                file = %path.display(),
                records = stats.records_used,
                "unit complete"
            );
            merged.merge(&acc);
            ingest.absorb(&stats);
        }

        let statistics = merged.finalize();
        tracing::info!(
            files = file_count,
            records = ingest.records_used,
            skipped = ingest.records_skipped,
            "statistics complete"
        );

        Ok(AnalysisResult {
            profession: self.selection.profession.clone(),
            area: self.selection.area.clone(),
            statistics,
            metadata: AnalysisMetadata {
                generated_at: Utc::now().to_rfc3339(),
                files_processed: file_count,
                ingest,
                elapsed_seconds: start.elapsed().as_secs_f64(),
            },
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
