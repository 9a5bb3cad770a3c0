//! Theme and styling definitions for the meeflow TUI.

use meeflow_engine::{RunState, Severity};
use ratatui::style::{Color, Modifier, Style};

/// Color palette for the TUI.
pub struct Palette;

impl Palette {
    // Base colors
    pub const BG: Color = Color::Rgb(15, 23, 42);
    pub const FG: Color = Color::Rgb(226, 232, 240);
    pub const DIM: Color = Color::Rgb(100, 116, 139);

    // Accent colors
    pub const ACCENT: Color = Color::Rgb(96, 165, 250);

    // Status bar colors (high contrast)
    pub const STATUS_BG: Color = Color::Rgb(30, 41, 59);
    pub const STATUS_KEY_BG: Color = Color::Rgb(37, 99, 235);

    // Severity colors
    pub const INFO: Color = Color::Rgb(147, 197, 253);
    pub const SUCCESS: Color = Color::Rgb(52, 211, 153);
    pub const WARNING: Color = Color::Rgb(251, 191, 36);
    pub const ERROR: Color = Color::Rgb(251, 113, 133);

    // Border colors
    pub const BORDER: Color = Color::Rgb(71, 85, 105);
    pub const BORDER_ACTIVE: Color = Color::Rgb(59, 130, 246);
}

/// Indicator symbols (ASCII only).
pub struct Symbols;

impl Symbols {
    pub const CHECK: &'static str = "[ok]";
    pub const SPINNER: [&'static str; 4] = ["|", "/", "-", "\\"];
}

/// Common styles used throughout the TUI.
pub struct Styles;

impl Styles {
    /// Default text style.
    pub fn default() -> Style {
        Style::default().fg(Palette::FG).bg(Palette::BG)
    }

    /// Dimmed text for secondary information.
    pub fn dim() -> Style {
        Style::default().fg(Palette::DIM).bg(Palette::BG)
    }

    /// Placeholder text.
    pub fn placeholder() -> Style {
        Self::dim().add_modifier(Modifier::ITALIC)
    }

    /// Highlighted/selected item.
    pub fn highlight() -> Style {
        Style::default()
            .fg(Palette::ACCENT)
            .bg(Palette::BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Success status.
    pub fn success() -> Style {
        Style::default().fg(Palette::SUCCESS).bg(Palette::BG)
    }

    /// Warning status.
    pub fn warning() -> Style {
        Style::default().fg(Palette::WARNING).bg(Palette::BG)
    }

    /// Title style.
    pub fn title() -> Style {
        Style::default()
            .fg(Palette::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    /// Key hint style (for status bar) - bright on dark for visibility.
    pub fn key_hint() -> Style {
        Style::default()
            .fg(Palette::FG)
            .bg(Palette::STATUS_KEY_BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Key hint label style - readable on status bar background.
    pub fn key_label() -> Style {
        Style::default().fg(Palette::FG).bg(Palette::STATUS_BG)
    }

    /// Status bar background style.
    pub fn status_bar() -> Style {
        Style::default().fg(Palette::FG).bg(Palette::STATUS_BG)
    }

    /// Border style for inactive elements.
    pub fn border() -> Style {
        Style::default().fg(Palette::BORDER)
    }

    /// Border style for active/focused elements.
    pub fn border_active() -> Style {
        Style::default()
            .fg(Palette::BORDER_ACTIVE)
            .add_modifier(Modifier::BOLD)
    }

    /// Text color for a log severity.
    pub fn severity(severity: Severity) -> Style {
        let fg = match severity {
            Severity::Info => Palette::INFO,
            Severity::Success => Palette::SUCCESS,
            Severity::Warning => Palette::WARNING,
            Severity::Error => Palette::ERROR,
        };
        Style::default().fg(fg).bg(Palette::BG)
    }

    /// Style for the run state label.
    pub fn run_state(state: RunState) -> Style {
        match state {
            RunState::Idle => Self::dim(),
            RunState::Running => Self::highlight(),
            RunState::Paused => Self::warning().add_modifier(Modifier::BOLD),
            RunState::Finished => Self::success().add_modifier(Modifier::BOLD),
        }
    }
}

/// Status label shown in the log pane and header.
pub fn run_state_label(state: RunState) -> &'static str {
    match state {
        RunState::Idle => "STATUS: IDLE",
        RunState::Running => "STATUS: PROCESSING",
        RunState::Paused => "STATUS: PAUSED",
        RunState::Finished => "STATUS: FINISHED",
    }
}

/// Progress bar rendering.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn progress_bar(progress: f32, width: usize) -> String {
    let filled = ((progress * width as f32).round() as usize).min(width);
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "=".repeat(filled), " ".repeat(empty))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0, 10), "[          ]");
        assert_eq!(progress_bar(0.5, 10), "[=====     ]");
        assert_eq!(progress_bar(1.0, 10), "[==========]");
    }

    #[test]
    fn test_run_state_label() {
        assert_eq!(run_state_label(RunState::Idle), "STATUS: IDLE");
        assert_eq!(run_state_label(RunState::Running), "STATUS: PROCESSING");
        assert_eq!(run_state_label(RunState::Paused), "STATUS: PAUSED");
        assert_eq!(run_state_label(RunState::Finished), "STATUS: FINISHED");
    }

    #[test]
    fn test_severity_styles_differ() {
        assert_ne!(
            Styles::severity(Severity::Info),
            Styles::severity(Severity::Warning)
        );
        assert_eq!(Styles::severity(Severity::Success).fg, Some(Palette::SUCCESS));
    }
}
