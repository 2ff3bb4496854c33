mod bootstrap;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use vacancy_core::currency::SalaryNormalizer;
use vacancy_core::error::StatsError;
use vacancy_core::settings::{LastUsedParams, Settings};
use vacancy_data::analysis::Selection;
use vacancy_data::export::{write_converted, write_json, DEFAULT_CONVERTED_PATH};
use vacancy_data::listing::{list_vacancies, ListingQuery};
use vacancy_data::rates::{load_monthly_rates, survey_currencies};
use vacancy_data::reader::find_csv_files;
use vacancy_data::splitter::{split_by_year, DEFAULT_SPLIT_DIR};
use vacancy_runtime::orchestrator::PartitionedRunner;
use vacancy_ui::app::App;
use vacancy_ui::plain;

#[tokio::main]
async fn main() -> Result<()> {
    let mut settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("vacancy-stats v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::debug!(mode = %settings.mode, theme = %settings.theme, "settings loaded");

    fill_missing_inputs(&mut settings)?;
    let input = settings
        .input
        .clone()
        .context("no input file given")?;

    match settings.mode.as_str() {
        "stats" => run_stats(&settings, &input).await,
        "vacancies" => run_listing(&settings, &input),
        "split" => {
            let out_dir = settings
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SPLIT_DIR));
            let partitions = split_by_year(&input, &out_dir)?;
            for part in &partitions {
                println!("{}: {} rows -> {}", part.year, part.rows, part.path.display());
            }
            tracing::info!(files = partitions.len(), dir = %out_dir.display(), "split complete");
            Ok(())
        }
        "convert" => {
            if settings.rates.is_none() {
                return Err(StatsError::Config(
                    "convert mode needs a monthly rate table (--rates)".to_string(),
                )
                .into());
            }
            let normalizer = build_normalizer(&settings)?;
            let output = settings
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONVERTED_PATH));
            let summary = write_converted(&input, &normalizer, &output)?;
            println!(
                "Wrote {} rows to {} ({} malformed or without a salary omitted)",
                summary.written,
                output.display(),
                summary.omitted
            );
            Ok(())
        }
        "currencies" => {
            let files = input_files(&input)?;
            let survey = survey_currencies(&files, settings.min_currency_count)?;
            for line in plain::survey_lines(&survey) {
                println!("{line}");
            }
            if let Some(path) = &settings.output {
                write_json(&survey, path)?;
            }
            Ok(())
        }
        unknown => bail!("unknown mode: {unknown}"),
    }
}

// ── Modes ──────────────────────────────────────────────────────────────────────

async fn run_stats(settings: &Settings, input: &Path) -> Result<()> {
    let normalizer = build_normalizer(settings)?;
    let selection = Selection::new(settings.profession.clone().unwrap_or_default())
        .with_area(settings.area.clone());
    let runner = PartitionedRunner::new(normalizer, selection);

    let analysis = bootstrap::until_interrupted(
        async { Ok(runner.analyze_path(input).await?) },
        tokio::signal::ctrl_c(),
    )
    .await?;

    if analysis.metadata.ingest.records_skipped > 0 {
        tracing::warn!(
            skipped = analysis.metadata.ingest.records_skipped,
            "records without a usable salary were left out"
        );
    }

    if let Some(path) = &settings.output {
        write_json(&analysis, path)?;
        tracing::info!(path = %path.display(), "report written");
    }

    if settings.tui {
        App::new(&settings.theme, analysis).run_report()?;
    } else {
        for line in plain::summary_lines(&analysis.statistics) {
            println!("{line}");
        }
        println!();
        for line in plain::render_tables(&analysis) {
            println!("{line}");
        }
    }
    Ok(())
}

fn run_listing(settings: &Settings, input: &Path) -> Result<()> {
    let normalizer = build_normalizer(settings)?;
    let query = ListingQuery::parse(
        settings.filter.as_deref().unwrap_or(""),
        settings.sort.as_deref().unwrap_or(""),
        settings.reverse,
        settings.range.as_deref().unwrap_or(""),
        settings.columns.as_deref().unwrap_or(""),
    )?;
    let listing = list_vacancies(input, &query, &normalizer)?;

    if let Some(path) = &settings.output {
        write_json(&listing, path)?;
        tracing::info!(path = %path.display(), "listing written");
    }

    if settings.tui {
        App::new(&settings.theme, listing).run_report()?;
    } else {
        for line in plain::listing_lines(&listing) {
            println!("{line}");
        }
    }
    Ok(())
}

// ── Helpers ────────────────────────────────────────────────────────────────────

/// Prompt for the input path and, in stats mode, the profession when neither
/// the command line nor the last run supplied them.
fn fill_missing_inputs(settings: &mut Settings) -> Result<()> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut stdout = io::stdout();
    let mut prompted = false;

    if settings.input.is_none() {
        let answer = bootstrap::prompt(&mut reader, &mut stdout, "Enter file name")?;
        if answer.is_empty() {
            bail!("no input file given");
        }
        settings.input = Some(PathBuf::from(answer));
        prompted = true;
    }
    if settings.mode == "stats" && settings.profession.is_none() {
        let answer = bootstrap::prompt(&mut reader, &mut stdout, "Enter profession")?;
        settings.profession = Some(answer);
        prompted = true;
    }

    if prompted {
        if let Err(e) = settings.remember(&LastUsedParams::config_path()) {
            tracing::debug!(error = %e, "could not save last-used parameters");
        }
    }
    Ok(())
}

fn build_normalizer(settings: &Settings) -> Result<SalaryNormalizer> {
    match &settings.rates {
        Some(path) => {
            let table = load_monthly_rates(path)?;
            tracing::info!(
                months = table.month_count(),
                path = %path.display(),
                "loaded monthly exchange rates"
            );
            Ok(SalaryNormalizer::new(Arc::new(table)))
        }
        None => Ok(SalaryNormalizer::builtin()),
    }
}

fn input_files(input: &Path) -> Result<Vec<PathBuf>> {
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }
    let files = find_csv_files(input);
    if files.is_empty() {
        return Err(StatsError::NoData(input.to_path_buf()).into());
    }
    Ok(files)
}
