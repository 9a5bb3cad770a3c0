//! Screen definitions for the meeflow TUI.

pub mod simulation;

use crate::app::{App, Screen as AppScreen};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

/// Trait for screens that can be rendered.
pub trait Screen {
    /// Render the screen to the buffer.
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
}

/// Render the current screen plus the help overlay if visible.
pub fn render_app(app: &App, area: Rect, buf: &mut Buffer) {
    match app.screen {
        AppScreen::Simulation => simulation::SimulationScreen.render(app, area, buf),
        AppScreen::QuitConfirm => simulation::QuitConfirmScreen.render(app, area, buf),
    }

    if app.show_help {
        render_help_overlay(area, buf);
    }
}

/// Render the help overlay.
pub fn render_help_overlay(area: Rect, buf: &mut Buffer) {
    use crate::ui::centered_fixed;
    use crate::ui::theme::Styles;
    use ratatui::widgets::{Block, Borders, Clear, Paragraph};

    let help_text = r"
  Playback
    Enter / Space     Start, pause, resume
    x                 Reset to idle
  Log
    j/k or Up/Down    Scroll
    f                 Toggle follow
  General
    q / Ctrl+C        Quit
    ?                 Toggle this help

  [Press any key to close]
";

    let width = 50.min(area.width.saturating_sub(4));
    let height = 16.min(area.height.saturating_sub(4));
    let overlay_area = centered_fixed(width, height, area);

    Clear.render(overlay_area, buf);

    let block = Block::default()
        .title(" Help ")
        .title_style(Styles::title())
        .borders(Borders::ALL)
        .border_style(Styles::border_active())
        .style(Styles::default());

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .style(Styles::default());

    paragraph.render(overlay_area, buf);
}
