//! Application state and TUI event loop for the vacancy reports.
//!
//! [`App`] owns the theme and a finished [`Report`]: the statistics of a run
//! or a vacancy listing. Reports are static, so the loop only redraws on
//! resize, scrolls listings and waits for a quit key.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};

use vacancy_data::analysis::AnalysisResult;
use vacancy_data::listing::VacancyListing;

use crate::table_view;
use crate::themes::Theme;

// ── App ───────────────────────────────────────────────────────────────────────

/// What the TUI shows.
#[derive(Debug, Clone)]
pub enum Report {
    Statistics(AnalysisResult),
    Listing(VacancyListing),
}

impl From<AnalysisResult> for Report {
    fn from(analysis: AnalysisResult) -> Self {
        Report::Statistics(analysis)
    }
}

impl From<VacancyListing> for Report {
    fn from(listing: VacancyListing) -> Self {
        Report::Listing(listing)
    }
}

/// Root application state for the report TUI.
pub struct App {
    /// Active colour theme.
    pub theme: Theme,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
    /// The report being displayed.
    pub report: Report,
    /// First listing row on screen.
    pub scroll: usize,
}

impl App {
    pub fn new(theme_name: &str, report: impl Into<Report>) -> Self {
        Self {
            theme: Theme::from_name(theme_name),
            should_quit: false,
            report: report.into(),
            scroll: 0,
        }
    }

    /// Show the report in the alternate screen until `q`, `Q` or `Ctrl+C`.
    pub fn run_report(mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(250);

        let result = loop {
            if let Err(e) = terminal.draw(|frame| self.render(frame)) {
                break Err(e);
            }

            match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) => self.handle_key(key),
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                Ok(false) => {}
                Err(e) => break Err(e),
            }

            if self.should_quit {
                break Ok(());
            }
        };

        // Restore terminal state unconditionally.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    /// Apply a key press to the application state.
    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') => self.scroll_by(1),
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::PageDown => self.scroll_by(10),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::Home => self.scroll = 0,
            _ => {}
        }
    }

    fn scroll_by(&mut self, step: usize) {
        let last = match &self.report {
            Report::Listing(listing) => listing.rows.len().saturating_sub(1),
            Report::Statistics(_) => 0,
        };
        self.scroll = (self.scroll + step).min(last);
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        match &self.report {
            Report::Statistics(analysis) => {
                table_view::render_report(frame, area, analysis, &self.theme)
            }
            Report::Listing(listing) => {
                table_view::render_listing(frame, area, listing, self.scroll, &self.theme)
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
