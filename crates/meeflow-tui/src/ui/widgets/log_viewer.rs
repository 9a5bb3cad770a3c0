//! Log viewer widget with scrolling.

use crate::ui::theme::Styles;
use meeflow_engine::LogEntry;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span, Text},
    widgets::{
        Block, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget, Widget,
    },
};
use unicode_width::UnicodeWidthStr;

/// A scrollable log viewer widget.
#[derive(Debug, Clone)]
pub struct LogViewer<'a> {
    lines: Vec<Line<'a>>,
    scroll: usize,
    auto_scroll: bool,
    block: Option<Block<'a>>,
}

impl<'a> LogViewer<'a> {
    /// Create a new log viewer.
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            scroll: 0,
            auto_scroll: true,
            block: None,
        }
    }

    /// Set the lines to display.
    #[must_use]
    pub fn lines(mut self, lines: Vec<Line<'a>>) -> Self {
        self.lines = lines;
        self
    }

    /// Set the scroll offset (ignored while auto-scrolling).
    #[must_use]
    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    /// Enable or disable auto-scroll.
    #[must_use]
    pub fn auto_scroll(mut self, enabled: bool) -> Self {
        self.auto_scroll = enabled;
        self
    }

    /// Set the block to wrap the viewer.
    #[must_use]
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Resolve the scroll position for a viewport.
    pub fn scroll_state(&self, viewport_height: usize) -> ScrollState {
        let total = self.lines.len();
        let max_scroll = total.saturating_sub(viewport_height);
        let scroll = if self.auto_scroll {
            max_scroll
        } else {
            self.scroll.min(max_scroll)
        };
        ScrollState {
            total,
            viewport: viewport_height,
            offset: scroll,
        }
    }
}

impl Default for LogViewer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for LogViewer<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = match &self.block {
            Some(b) => {
                let inner = b.inner(area);
                b.clone().render(area, buf);
                inner
            }
            None => area,
        };

        if area.height < 1 || area.width < 1 {
            return;
        }

        let viewport_height = area.height as usize;
        let state = self.scroll_state(viewport_height);

        let text = Text::from(self.lines);
        #[allow(clippy::cast_possible_truncation)]
        let scroll_offset = state.offset as u16;
        let paragraph = Paragraph::new(text)
            .style(Styles::default())
            .scroll((scroll_offset, 0));

        paragraph.render(area, buf);

        // Render scrollbar if content exceeds viewport
        if state.total > state.viewport {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight);
            let mut scrollbar_state = ScrollbarState::new(state.total).position(state.offset);

            let scrollbar_area = Rect {
                x: area.x + area.width.saturating_sub(1),
                y: area.y,
                width: 1,
                height: area.height,
            };
            scrollbar.render(scrollbar_area, buf, &mut scrollbar_state);
        }
    }
}

/// Scroll state for tracking position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollState {
    pub total: usize,
    pub viewport: usize,
    pub offset: usize,
}

/// Format log entries as `[HH:MM:SS] message`, wrapping messages to `width`.
///
/// Continuation lines are indented under the message.
pub fn log_lines(entries: &[LogEntry], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for entry in entries {
        let prefix = format!("[{}] ", entry.time_label());
        let indent = " ".repeat(prefix.width());
        let message_width = width.saturating_sub(prefix.width()).max(8);
        let style = Styles::severity(entry.severity);

        for (i, chunk) in textwrap::wrap(&entry.message, message_width)
            .into_iter()
            .enumerate()
        {
            let lead = if i == 0 {
                Span::styled(prefix.clone(), Styles::dim())
            } else {
                Span::styled(indent.clone(), Styles::dim())
            };
            lines.push(Line::from(vec![lead, Span::styled(chunk.into_owned(), style)]));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use meeflow_engine::{Script, Sequencer};

    fn logged_entries() -> Vec<LogEntry> {
        let mut seq = Sequencer::new(Script::mission_mint());
        seq.start().unwrap();
        seq.pause().unwrap();
        seq.log().to_vec()
    }

    #[test]
    fn test_scroll_state_auto_scroll_pins_bottom() {
        let lines = (0..10).map(|i| Line::from(format!("line {i}"))).collect();
        let viewer = LogViewer::new().lines(lines).scroll(2);
        assert_eq!(viewer.scroll_state(4).offset, 6);

        let viewer = viewer.auto_scroll(false);
        assert_eq!(viewer.scroll_state(4).offset, 2);
        assert_eq!(viewer.scroll_state(20).offset, 0);
    }

    #[test]
    fn test_log_lines_prefix_and_wrap() {
        let entries = logged_entries();
        let lines = log_lines(&entries, 30);
        // "User interaction detected: Mission Completed." wraps at 19 columns.
        assert!(lines.len() > entries.len());

        let first: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(first.starts_with('['));
        assert!(first.contains("] User"));

        let last: String = lines
            .last()
            .unwrap()
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect();
        assert!(last.ends_with("Simulation Paused."));
    }

    #[test]
    fn test_render_shows_latest_lines() {
        let entries = logged_entries();
        let area = Rect::new(0, 0, 60, 2);
        let mut buf = Buffer::empty(area);
        LogViewer::new()
            .lines(log_lines(&entries, 59))
            .render(area, &mut buf);

        let row: String = (0..60)
            .map(|x| buf.cell((x, 1)).unwrap().symbol().to_string())
            .collect();
        assert!(row.contains("Simulation Paused."));
    }
}
