use ratatui::style::{Color, Modifier, Style};

/// Console theme.
///
/// Plain terminal colours so the board palette stays readable on any
/// background; only the focused row gets a fill.
pub struct Theme;

impl Theme {
    pub const FG: Color = Color::Gray;
    pub const FG_MUTED: Color = Color::DarkGray;
    pub const FOCUS_BG: Color = Color::Blue;

    pub const ACCENT_CYAN: Color = Color::LightCyan;
    pub const ACCENT_GREEN: Color = Color::LightGreen;
    pub const ACCENT_YELLOW: Color = Color::LightYellow;
    pub const ACCENT_RED: Color = Color::LightRed;

    /// Panel borders.
    pub fn border() -> Style {
        Style::default().fg(Self::FG)
    }

    /// Titles (bold cyan).
    pub fn title() -> Style {
        Style::default()
            .fg(Self::ACCENT_CYAN)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn muted() -> Style {
        Style::default().fg(Self::FG_MUTED)
    }

    /// Column headers.
    pub fn header() -> Style {
        Style::default().add_modifier(Modifier::BOLD)
    }

    /// Focused table row.
    pub fn focus() -> Style {
        Style::default().bg(Self::FOCUS_BG)
    }

    pub fn ok() -> Style {
        Style::default()
            .fg(Self::ACCENT_GREEN)
            .add_modifier(Modifier::BOLD)
    }

    pub fn warn() -> Style {
        Style::default()
            .fg(Self::ACCENT_YELLOW)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error() -> Style {
        Style::default()
            .fg(Self::ACCENT_RED)
            .add_modifier(Modifier::BOLD)
    }

    pub fn score() -> Style {
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    }

    /// Hot (> 100) red, warm (> 1) yellow, cold cyan.
    pub fn temperature(t: f64) -> Style {
        let color = if t > 100.0 {
            Self::ACCENT_RED
        } else if t > 1.0 {
            Self::ACCENT_YELLOW
        } else {
            Self::ACCENT_CYAN
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    /// Healthy (> 10%) green, low (> 1%) yellow, frozen red.
    pub fn accept_rate(rate: f64) -> Style {
        if rate > 0.1 {
            Self::ok()
        } else if rate > 0.01 {
            Self::warn()
        } else {
            Style::default().fg(Self::ACCENT_RED)
        }
    }

    /// Style of an event log level.
    pub fn level(level: &str) -> Style {
        match level {
            "ERROR" => Self::error(),
            "WARN" => Self::warn(),
            _ => Self::muted(),
        }
    }
}
