//! Simulation screen - node strip, system log and data inspector.

use crate::app::App;
use crate::screens::Screen;
use crate::ui::theme::{progress_bar, run_state_label, Styles, Symbols};
use crate::ui::widgets::{log_lines, KeyHint, LogViewer, StatusBar};
use crate::ui::{centered_fixed, main_layout, simulation_layout};
use meeflow_engine::{RunState, NODES};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use serde_json::Value;

/// Shown in the inspector when the current step carries no payload.
pub const NO_DATA: &str = "No active data capture";

/// Shown in the log pane before anything has been logged.
pub const WAITING: &str = "Waiting for simulation to start...";

/// The main simulation screen.
pub struct SimulationScreen;

impl Screen for SimulationScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let (main_area, status_area) = main_layout(area);
        let (header_area, nodes_area, bottom_area) = simulation_layout(main_area);

        render_header(app, header_area, buf);
        render_nodes(app, nodes_area, buf);

        let (log_area, inspector_area) = bottom_panes(bottom_area);
        render_log_pane(app, log_area, buf);
        render_inspector_pane(app, inspector_area, buf);

        render_status_bar(app, status_area, buf);
    }
}

/// Split the bottom row into the log pane and the inspector pane.
fn bottom_panes(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(55), // System log
            Constraint::Percentage(45), // Data inspector
        ])
        .split(area);
    (chunks[0], chunks[1])
}

/// Block drawn around the log text.
fn log_block_inner(pane: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(pane)
}

/// Wrap width and visible height of the log text on a screen of `area`.
///
/// One column of the pane is kept for the scrollbar.
pub(crate) fn log_viewport(area: Rect) -> (usize, usize) {
    let (main_area, _) = main_layout(area);
    let (_, _, bottom_area) = simulation_layout(main_area);
    let (log_area, _) = bottom_panes(bottom_area);
    let inner = log_block_inner(log_area);
    (
        inner.width.saturating_sub(1) as usize,
        inner.height as usize,
    )
}

fn render_header(app: &App, area: Rect, buf: &mut Buffer) {
    let snapshot = &app.snapshot;

    let block = Block::default()
        .title(" MeeBot Mission Mint ")
        .title_style(Styles::title())
        .borders(Borders::ALL)
        .border_style(Styles::border())
        .style(Styles::default());

    let inner = block.inner(area);
    block.render(area, buf);

    let applied = snapshot.applied_steps();
    let total = snapshot.script_len;
    #[allow(clippy::cast_precision_loss)]
    let progress = if total == 0 {
        0.0
    } else {
        applied as f32 / total as f32
    };

    let mut spans = vec![
        Span::raw(" "),
        Span::styled(run_state_label(snapshot.state), Styles::run_state(snapshot.state)),
    ];
    if snapshot.state == RunState::Running {
        let frame = Symbols::SPINNER[app.tick % Symbols::SPINNER.len()];
        spans.push(Span::styled(format!(" {frame}"), Styles::highlight()));
    }
    spans.push(Span::styled("  Step ", Styles::dim()));
    spans.push(Span::styled(format!("{applied}/{total} "), Styles::default()));
    spans.push(Span::styled(progress_bar(progress, 20), Styles::dim()));

    Paragraph::new(Line::from(spans))
        .style(Styles::default())
        .render(inner, buf);
}

fn render_nodes(app: &App, area: Rect, buf: &mut Buffer) {
    let active = app.snapshot.active_node;

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 5); 5])
        .split(area);

    for (i, (node, column)) in NODES.iter().zip(columns.iter()).enumerate() {
        let number = i + 1;
        let is_active = number == active;
        let passed = number < active;

        let (border_style, title) = if is_active {
            (Styles::border_active(), format!(" {number} >> "))
        } else if passed {
            (Styles::success(), format!(" {number} {} ", Symbols::CHECK))
        } else {
            (Styles::border(), format!(" {number} "))
        };

        let label_style = if is_active {
            Styles::highlight()
        } else {
            Styles::default().add_modifier(Modifier::BOLD)
        };

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style)
            .style(Styles::default());

        let lines = vec![
            Line::from(Span::styled(node.label, label_style)),
            Line::from(Span::styled(node.description, Styles::dim())),
        ];

        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(*column, buf);
    }
}

fn render_log_pane(app: &App, area: Rect, buf: &mut Buffer) {
    let state = app.snapshot.state;
    let border_style = if state == RunState::Running {
        Styles::border_active()
    } else {
        Styles::border()
    };

    let state_title = Line::styled(
        format!(" {} ", run_state_label(state)),
        Styles::run_state(state),
    )
    .right_aligned();

    let block = Block::default()
        .title(" SYSTEM_LOGS ")
        .title_style(Styles::title())
        .title(state_title)
        .borders(Borders::ALL)
        .border_style(border_style)
        .style(Styles::default());

    if app.snapshot.log.is_empty() {
        Paragraph::new(Line::from(Span::styled(WAITING, Styles::placeholder())))
            .block(block)
            .render(area, buf);
        return;
    }

    let inner = log_block_inner(area);
    // Leave a column for the scrollbar.
    let lines = log_lines(&app.snapshot.log, inner.width.saturating_sub(1) as usize);
    let max_scroll = lines.len().saturating_sub(inner.height as usize);
    let top = max_scroll - app.log_scroll.min(max_scroll);

    LogViewer::new()
        .lines(lines)
        .auto_scroll(app.follow_log)
        .scroll(top)
        .block(block)
        .render(area, buf);
}

fn render_inspector_pane(app: &App, area: Rect, buf: &mut Buffer) {
    let payload = app.snapshot.payload.as_ref();

    let block = Block::default()
        .title(" DATA_INSPECTOR ")
        .title_style(Styles::title())
        .borders(Borders::ALL)
        .border_style(Styles::border())
        .style(Styles::default());

    let style = if payload.is_some() {
        Styles::success()
    } else {
        Styles::placeholder()
    };

    Paragraph::new(inspector_text(payload))
        .style(style)
        .block(block)
        .wrap(Wrap { trim: false })
        .render(area, buf);
}

/// Pretty JSON for the inspector, or the placeholder when there is no payload.
pub(crate) fn inspector_text(payload: Option<&Value>) -> String {
    match payload {
        Some(value) => serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
        None => NO_DATA.to_string(),
    }
}

fn render_status_bar(app: &App, area: Rect, buf: &mut Buffer) {
    let mut hints = match app.snapshot.state {
        RunState::Idle => vec![KeyHint::new("Enter", "Start")],
        RunState::Running => vec![KeyHint::new("Enter", "Pause"), KeyHint::new("x", "Reset")],
        RunState::Paused => vec![KeyHint::new("Enter", "Resume"), KeyHint::new("x", "Reset")],
        RunState::Finished => vec![KeyHint::new("Enter", "Restart"), KeyHint::new("x", "Reset")],
    };
    hints.extend([
        KeyHint::new("f", "Follow"),
        KeyHint::new("?", "Help"),
        KeyHint::new("q", "Quit"),
    ]);

    let progress = format!(
        "{}/{} steps",
        app.snapshot.applied_steps(),
        app.snapshot.script_len
    );

    let mut status_bar = StatusBar::new("Simulation").hints(hints);
    if let Some(notification) = &app.notification {
        status_bar = status_bar.right(notification);
    } else {
        status_bar = status_bar.right(&progress);
    }
    status_bar.render(area, buf);
}

/// Confirmation shown when quitting with playback in progress.
pub struct QuitConfirmScreen;

impl Screen for QuitConfirmScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        SimulationScreen.render(app, area, buf);

        let width = 44.min(area.width.saturating_sub(4));
        let height = 7.min(area.height.saturating_sub(4));
        let overlay_area = centered_fixed(width, height, area);

        Clear.render(overlay_area, buf);

        let block = Block::default()
            .title(" Quit ")
            .title_style(Styles::title())
            .borders(Borders::ALL)
            .border_style(Styles::border_active())
            .style(Styles::default());

        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "  Playback is still in progress.",
                Styles::default(),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("  ", Styles::default()),
                Span::styled("[Enter]", Styles::key_hint()),
                Span::styled(" Quit   ", Styles::default()),
                Span::styled("[Esc]", Styles::key_hint()),
                Span::styled(" Cancel", Styles::default()),
            ]),
        ];

        Paragraph::new(lines)
            .block(block)
            .style(Styles::default())
            .render(overlay_area, buf);
    }
}
