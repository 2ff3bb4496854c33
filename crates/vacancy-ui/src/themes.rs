use ratatui::style::{Color, Modifier, Style};

/// Terminal background type detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundType {
    Dark,
    Light,
}

/// Detect terminal background type from the `COLORFGBG` environment variable.
///
/// The variable has the format `"foreground;background"`. Background values
/// 0–6 are dark, 7–15 light. Absent or unparseable means dark.
pub fn detect_background() -> BackgroundType {
    background_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
}

fn background_from_colorfgbg(value: Option<&str>) -> BackgroundType {
    let bg = value
        .and_then(|v| v.split(';').next_back())
        .and_then(|bg| bg.parse::<u8>().ok());
    match bg {
        Some(n) if n > 6 => BackgroundType::Light,
        _ => BackgroundType::Dark,
    }
}

/// Styles used by the report views.
#[derive(Debug, Clone)]
pub struct Theme {
    // ── Header ───────────────────────────────────────────────────────────────
    pub header: Style,
    pub separator: Style,

    // ── Text ─────────────────────────────────────────────────────────────────
    pub text: Style,
    pub dim: Style,
    pub label: Style,
    pub value: Style,
    pub warning: Style,

    // ── Table ────────────────────────────────────────────────────────────────
    pub table_header: Style,
    pub table_border: Style,
    pub table_row: Style,
    pub table_row_alt: Style,
    /// Leading entry of a ranked table.
    pub table_leader: Style,
    /// Cells for the profession-filtered columns.
    pub profession: Style,
    /// Filled portion of a share bar.
    pub share_bar: Style,
}

impl Theme {
    /// Dark-background terminal theme (default).
    pub fn dark() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            label: Style::default().fg(Color::Gray),
            value: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            warning: Style::default().fg(Color::Yellow),

            table_header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),
            table_leader: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            profession: Style::default().fg(Color::Magenta),
            share_bar: Style::default().fg(Color::Green),
        }
    }

    /// Light-background terminal theme.
    pub fn light() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            separator: Style::default().fg(Color::Gray),

            text: Style::default().fg(Color::Black),
            dim: Style::default().fg(Color::Gray),
            label: Style::default().fg(Color::DarkGray),
            value: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            warning: Style::default().fg(Color::Rgb(180, 100, 0)),

            table_header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::Gray),
            table_row: Style::default().fg(Color::Black),
            table_row_alt: Style::default().fg(Color::DarkGray),
            table_leader: Style::default()
                .fg(Color::Rgb(180, 100, 0))
                .add_modifier(Modifier::BOLD),
            profession: Style::default().fg(Color::Magenta),
            share_bar: Style::default().fg(Color::Rgb(0, 130, 0)),
        }
    }

    /// Monochrome theme that relies on modifiers only.
    pub fn classic() -> Self {
        Self {
            header: Style::default().add_modifier(Modifier::BOLD),
            separator: Style::default(),

            text: Style::default(),
            dim: Style::default().add_modifier(Modifier::DIM),
            label: Style::default(),
            value: Style::default().add_modifier(Modifier::BOLD),
            warning: Style::default().add_modifier(Modifier::BOLD),

            table_header: Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            table_border: Style::default(),
            table_row: Style::default(),
            table_row_alt: Style::default(),
            table_leader: Style::default().add_modifier(Modifier::BOLD),
            profession: Style::default().add_modifier(Modifier::ITALIC),
            share_bar: Style::default(),
        }
    }

    /// Choose a theme from the detected terminal background.
    pub fn auto_detect() -> Self {
        match detect_background() {
            BackgroundType::Light => Self::light(),
            BackgroundType::Dark => Self::dark(),
        }
    }

    /// Construct a theme by name. Unknown names (including `"auto"`) detect.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            "dark" => Self::dark(),
            "classic" => Self::classic(),
            _ => Self::auto_detect(),
        }
    }

    /// Alternating row style, with the first row of a ranked table
    /// highlighted.
    pub fn row_style(&self, index: usize, ranked: bool) -> Style {
        if ranked && index == 0 {
            self.table_leader
        } else if index % 2 == 0 {
            self.table_row
        } else {
            self.table_row_alt
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
