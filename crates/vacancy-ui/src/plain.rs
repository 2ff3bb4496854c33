//! Plain-text report for stdout.
//!
//! [`summary_lines`] prints the six statistics mappings one per line in a
//! stable `label: {key: value, ...}` form. [`render_tables`] lays the same
//! data out as aligned columns for reading in a terminal without the TUI,
//! and [`listing_lines`] does the same for a vacancy listing.

use std::fmt::Display;

use indexmap::IndexMap;
use unicode_width::UnicodeWidthStr;

use vacancy_core::formatting;
use vacancy_data::analysis::{AnalysisResult, PipelineResult};
use vacancy_data::listing::VacancyListing;
use vacancy_data::rates::CurrencySurvey;

use crate::table_view::year_rows;

// ── Summary lines ─────────────────────────────────────────────────────────────

fn mapping_line<K: Display, V: Display>(label: &str, map: &IndexMap<K, V>) -> String {
    let body = map
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{label}: {{{body}}}")
}

/// The six mappings, one line each, in pipeline order.
pub fn summary_lines(result: &PipelineResult) -> Vec<String> {
    vec![
        mapping_line("Salary by year", &result.salary_by_year),
        mapping_line("Vacancies by year", &result.count_by_year),
        mapping_line("Salary by year for profession", &result.profession_salary_by_year),
        mapping_line("Vacancies by year for profession", &result.profession_count_by_year),
        mapping_line("Salary by city (top 10)", &result.salary_by_city),
        mapping_line("Share of vacancies by city (top 10)", &result.share_by_city),
    ]
}

// ── Aligned tables ────────────────────────────────────────────────────────────

/// Pad `text` on the right to `width` display columns.
pub fn pad_right(text: &str, width: usize) -> String {
    let used = UnicodeWidthStr::width(text);
    format!("{text}{}", " ".repeat(width.saturating_sub(used)))
}

/// Pad `text` on the left to `width` display columns.
pub fn pad_left(text: &str, width: usize) -> String {
    let used = UnicodeWidthStr::width(text);
    format!("{}{text}", " ".repeat(width.saturating_sub(used)))
}

/// Format a table with the first column left-aligned and the rest
/// right-aligned.
pub fn format_table(headers: &[String], rows: &[Vec<String>]) -> Vec<String> {
    layout_table(headers, rows, |i| i > 0)
}

/// Lay out `rows` under `headers`. A cell containing newlines spans several
/// output lines; `right_aligned` picks the columns padded on the left.
fn layout_table(
    headers: &[String],
    rows: &[Vec<String>],
    right_aligned: impl Fn(usize) -> bool,
) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| UnicodeWidthStr::width(h.as_str())).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                let widest = cell.lines().map(UnicodeWidthStr::width).max().unwrap_or(0);
                *w = (*w).max(widest);
            }
        }
    }

    let render = |cells: &[String]| -> Vec<String> {
        let split: Vec<Vec<&str>> = cells.iter().map(|c| c.lines().collect()).collect();
        let height = split.iter().map(Vec::len).max().unwrap_or(0).max(1);
        (0..height)
            .map(|line| {
                split
                    .iter()
                    .zip(&widths)
                    .enumerate()
                    .map(|(i, (parts, w))| {
                        let text = parts.get(line).copied().unwrap_or("");
                        if right_aligned(i) {
                            pad_left(text, *w)
                        } else {
                            pad_right(text, *w)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("  ")
                    .trim_end()
                    .to_string()
            })
            .collect()
    };

    let rule = widths
        .iter()
        .map(|w| "─".repeat(*w))
        .collect::<Vec<_>>()
        .join("  ");

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.extend(render(headers));
    out.push(rule);
    for row in rows {
        out.extend(render(row));
    }
    out
}

/// The full report as aligned tables.
pub fn render_tables(analysis: &AnalysisResult) -> Vec<String> {
    let stats = &analysis.statistics;
    let profession = &analysis.profession;
    let mut out = Vec::new();

    let area = analysis
        .area
        .as_ref()
        .map(|a| format!("   Area: {a}"))
        .unwrap_or_default();
    out.push(format!(
        "Profession: {profession}{area}   Vacancies: {}   Files: {}",
        formatting::format_count(analysis.metadata.ingest.records_used as u64),
        analysis.metadata.files_processed
    ));
    out.push(String::new());

    let headers = vec![
        "Year".to_string(),
        "Mean salary".to_string(),
        "Vacancies".to_string(),
        format!("Salary: {profession}"),
        format!("Vacancies: {profession}"),
    ];
    let rows: Vec<Vec<String>> = year_rows(stats)
        .into_iter()
        .map(|r| {
            vec![
                r.year.to_string(),
                formatting::format_salary(r.salary),
                formatting::format_count(r.count),
                formatting::format_salary(r.profession_salary),
                formatting::format_count(r.profession_count),
            ]
        })
        .collect();
    out.extend(format_table(&headers, &rows));
    out.push(String::new());

    let rows: Vec<Vec<String>> = stats
        .salary_by_city
        .iter()
        .map(|(city, salary)| vec![city.clone(), formatting::format_salary(*salary)])
        .collect();
    out.extend(format_table(
        &["City".to_string(), "Mean salary".to_string()],
        &rows,
    ));
    out.push(String::new());

    let rows: Vec<Vec<String>> = stats
        .share_by_city
        .iter()
        .map(|(city, share)| vec![city.clone(), formatting::format_share(*share)])
        .collect();
    out.extend(format_table(&["City".to_string(), "Share".to_string()], &rows));
    out
}

// ── Vacancy listing ───────────────────────────────────────────────────────────

/// A vacancy listing as a numbered table, or a single line when nothing
/// matched.
pub fn listing_lines(listing: &VacancyListing) -> Vec<String> {
    if listing.matched == 0 {
        return vec!["Ничего не найдено".to_string()];
    }
    let rows: Vec<Vec<String>> = listing
        .rows
        .iter()
        .map(|row| {
            std::iter::once(row.number.to_string())
                .chain(row.cells.iter().cloned())
                .collect()
        })
        .collect();
    let mut out = layout_table(&listing.headers(), &rows, |i| i == 0);
    out.push(format!(
        "Shown {} of {} matching vacancies",
        listing.rows.len(),
        listing.matched
    ));
    out
}

// ── Currency survey ───────────────────────────────────────────────────────────

/// Lines describing a currency survey: the frequent codes with their counts
/// and the span of publication dates.
pub fn survey_lines(survey: &CurrencySurvey) -> Vec<String> {
    let mut out = Vec::new();
    let rows: Vec<Vec<String>> = survey
        .counts
        .iter()
        .map(|(code, count)| vec![code.clone(), formatting::format_count(*count)])
        .collect();
    out.extend(format_table(
        &["Currency".to_string(), "Vacancies".to_string()],
        &rows,
    ));
    match (&survey.first_published, &survey.last_published) {
        (Some(first), Some(last)) => {
            out.push(format!("Published: {first} .. {last} ({} months)", survey.months.len()));
        }
        _ => out.push("Published: no vacancies in the listed currencies".to_string()),
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────
