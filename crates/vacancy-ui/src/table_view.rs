//! Report tables for the vacancy statistics TUI.
//!
//! Renders three bordered [`ratatui::widgets::Table`]s: the by-year table
//! with the profession columns alongside, the top cities by mean salary and
//! the top cities by vacancy share. A vacancy listing gets a single
//! scrollable table of its own.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use indexmap::IndexMap;
use vacancy_core::formatting;
use vacancy_data::analysis::{AnalysisResult, PipelineResult};
use vacancy_data::listing::VacancyListing;

use crate::themes::Theme;

/// Width in cells of a full share bar.
const SHARE_BAR_WIDTH: usize = 20;

/// One row of the by-year table.
#[derive(Debug, Clone, PartialEq)]
pub struct YearRow {
    pub year: i32,
    pub salary: i64,
    pub count: u64,
    pub profession_salary: i64,
    pub profession_count: u64,
}

/// Zip the four year mappings into table rows, ascending by year.
pub fn year_rows(result: &PipelineResult) -> Vec<YearRow> {
    result
        .salary_by_year
        .iter()
        .map(|(year, salary)| YearRow {
            year: *year,
            salary: *salary,
            count: result.count_by_year.get(year).copied().unwrap_or(0),
            profession_salary: result
                .profession_salary_by_year
                .get(year)
                .copied()
                .unwrap_or(0),
            profession_count: result
                .profession_count_by_year
                .get(year)
                .copied()
                .unwrap_or(0),
        })
        .collect()
}

/// A bar of `#` proportional to `share` relative to `max_share`.
pub fn share_bar(share: f64, max_share: f64) -> String {
    if max_share <= 0.0 {
        return String::new();
    }
    let filled = ((share / max_share) * SHARE_BAR_WIDTH as f64).round() as usize;
    "#".repeat(filled.clamp(1, SHARE_BAR_WIDTH))
}

// ── Full report ───────────────────────────────────────────────────────────────

/// Render the whole report: a summary line, the year table on top and both
/// city tables side by side below.
pub fn render_report(frame: &mut Frame, area: Rect, analysis: &AnalysisResult, theme: &Theme) {
    if analysis.statistics.is_empty() {
        render_no_data(frame, area, theme);
        return;
    }

    let rows = year_rows(&analysis.statistics);
    let year_height = (rows.len() as u16).saturating_add(3);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(year_height),
            Constraint::Min(5),
        ])
        .split(area);
    let cities = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[2]);

    render_summary(frame, chunks[0], analysis, theme);
    render_year_table(frame, chunks[1], &rows, &analysis.profession, theme);
    render_city_salary_table(frame, cities[0], &analysis.statistics.salary_by_city, theme);
    render_city_share_table(frame, cities[1], &analysis.statistics.share_by_city, theme);
}

fn render_summary(frame: &mut Frame, area: Rect, analysis: &AnalysisResult, theme: &Theme) {
    let meta = &analysis.metadata;
    let mut spans = vec![
        Span::styled("Profession: ", theme.label),
        Span::styled(analysis.profession.clone(), theme.profession),
    ];
    if let Some(region) = &analysis.area {
        spans.push(Span::styled("  │  ", theme.separator));
        spans.push(Span::styled("Area: ", theme.label));
        spans.push(Span::styled(region.clone(), theme.profession));
    }
    spans.extend([
        Span::styled("  │  ", theme.separator),
        Span::styled("Vacancies: ", theme.label),
        Span::styled(
            formatting::format_count(meta.ingest.records_used as u64),
            theme.value,
        ),
        Span::styled("  │  ", theme.separator),
        Span::styled("Files: ", theme.label),
        Span::styled(meta.files_processed.to_string(), theme.value),
        Span::styled("  │  q to quit", theme.dim),
    ]);
    frame.render_widget(
        Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(Span::styled(" Vacancy Statistics ", theme.header)),
        ),
        area,
    );
}

// ── Individual tables ─────────────────────────────────────────────────────────

/// Render the by-year table into `area`.
pub fn render_year_table(
    frame: &mut Frame,
    area: Rect,
    rows: &[YearRow],
    profession: &str,
    theme: &Theme,
) {
    let header = Row::new(
        [
            "Year".to_string(),
            "Mean salary".to_string(),
            "Vacancies".to_string(),
            format!("Salary: {profession}"),
            format!("Vacancies: {profession}"),
        ]
        .into_iter()
        .map(|h| Cell::from(h).style(theme.table_header)),
    );

    let data_rows: Vec<Row> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            Row::new(vec![
                Cell::from(row.year.to_string()),
                Cell::from(formatting::format_salary(row.salary)),
                Cell::from(formatting::format_count(row.count)),
                Cell::from(formatting::format_salary(row.profession_salary))
                    .style(theme.profession),
                Cell::from(formatting::format_count(row.profession_count))
                    .style(theme.profession),
            ])
            .style(theme.row_style(i, false))
        })
        .collect();

    let widths = [
        Constraint::Length(6),
        Constraint::Length(14),
        Constraint::Length(11),
        Constraint::Min(16),
        Constraint::Min(16),
    ];

    let table = Table::new(data_rows, widths)
        .header(header)
        .block(bordered(" By year ", theme))
        .style(theme.text);
    frame.render_widget(table, area);
}

/// Render the top cities by mean salary.
pub fn render_city_salary_table(
    frame: &mut Frame,
    area: Rect,
    salaries: &IndexMap<String, i64>,
    theme: &Theme,
) {
    let header = Row::new(
        ["#", "City", "Mean salary"]
            .iter()
            .map(|h| Cell::from(*h).style(theme.table_header)),
    );
    let data_rows: Vec<Row> = salaries
        .iter()
        .enumerate()
        .map(|(i, (city, salary))| {
            Row::new(vec![
                Cell::from((i + 1).to_string()),
                Cell::from(city.clone()),
                Cell::from(formatting::format_salary(*salary)),
            ])
            .style(theme.row_style(i, true))
        })
        .collect();

    let widths = [
        Constraint::Length(3),
        Constraint::Min(14),
        Constraint::Length(14),
    ];
    let table = Table::new(data_rows, widths)
        .header(header)
        .block(bordered(" Salary by city ", theme))
        .style(theme.text);
    frame.render_widget(table, area);
}

/// Render the top cities by share of vacancies, with a proportional bar.
pub fn render_city_share_table(
    frame: &mut Frame,
    area: Rect,
    shares: &IndexMap<String, f64>,
    theme: &Theme,
) {
    let max_share = shares.values().copied().fold(0.0_f64, f64::max);
    let header = Row::new(
        ["#", "City", "Share", ""]
            .iter()
            .map(|h| Cell::from(*h).style(theme.table_header)),
    );
    let data_rows: Vec<Row> = shares
        .iter()
        .enumerate()
        .map(|(i, (city, share))| {
            Row::new(vec![
                Cell::from((i + 1).to_string()),
                Cell::from(city.clone()),
                Cell::from(formatting::format_share(*share)),
                Cell::from(share_bar(*share, max_share)).style(theme.share_bar),
            ])
            .style(theme.row_style(i, true))
        })
        .collect();

    let widths = [
        Constraint::Length(3),
        Constraint::Min(14),
        Constraint::Length(8),
        Constraint::Length(SHARE_BAR_WIDTH as u16),
    ];
    let table = Table::new(data_rows, widths)
        .header(header)
        .block(bordered(" Share of vacancies by city ", theme))
        .style(theme.text);
    frame.render_widget(table, area);
}

// ── Vacancy listing ───────────────────────────────────────────────────────────

/// Render `listing` from its `offset`-th shown row on. Multi-line cells make
/// taller rows.
pub fn render_listing(
    frame: &mut Frame,
    area: Rect,
    listing: &VacancyListing,
    offset: usize,
    theme: &Theme,
) {
    if listing.matched == 0 {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled("Ничего не найдено", theme.warning)),
            Line::from(""),
            Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
        ];
        frame.render_widget(
            Paragraph::new(ratatui::text::Text::from(text)).block(bordered(" Vacancies ", theme)),
            area,
        );
        return;
    }

    let header = Row::new(
        listing
            .headers()
            .into_iter()
            .map(|h| Cell::from(h).style(theme.table_header)),
    );
    let data_rows: Vec<Row> = listing
        .rows
        .iter()
        .skip(offset)
        .enumerate()
        .map(|(i, row)| {
            let height = row
                .cells
                .iter()
                .map(|c| c.lines().count())
                .max()
                .unwrap_or(1)
                .max(1);
            let cells = std::iter::once(Cell::from(row.number.to_string()))
                .chain(row.cells.iter().map(|c| Cell::from(c.clone())));
            Row::new(cells)
                .height(height as u16)
                .style(theme.row_style(i, false))
        })
        .collect();

    let widths: Vec<Constraint> = std::iter::once(Constraint::Length(5))
        .chain(listing.columns.iter().map(|_| Constraint::Fill(1)))
        .collect();
    let title = format!(
        " Vacancies: {} shown of {} matching  │  ↑/↓ to scroll, q to quit ",
        listing.rows.len(),
        listing.matched
    );
    let table = Table::new(data_rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(Span::styled(title, theme.header)),
        )
        .style(theme.text);
    frame.render_widget(table, area);
}

/// Render a "no data" placeholder when no record reached the statistics.
pub fn render_no_data(frame: &mut Frame, area: Rect, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("No vacancies with a usable salary", theme.warning)),
        Line::from(""),
        Line::from(Span::styled(
            "Check the input file and the exchange-rate table.",
            theme.dim,
        )),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(ratatui::text::Text::from(text)).block(bordered(" Vacancy Statistics ", theme)),
        area,
    );
}

fn bordered<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme.table_border)
        .title(Span::styled(title, theme.header))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
