//! Test utilities for meeflow-tui rendering and integration testing.
//!
//! Apps in a given run state are built by driving a real [`Sequencer`], so
//! rendered snapshots always match what playback would produce.

use crate::app::App;
use crate::screens::Screen as ScreenTrait;
use meeflow_engine::{RunState, Script, Sequencer, Tick};
use ratatui::{buffer::Buffer, layout::Rect};

pub(crate) use crate::headless::buffer_to_string;

/// Default terminal width for tests.
pub const TEST_WIDTH: u16 = 80;

/// Default terminal height for tests.
pub const TEST_HEIGHT: u16 = 24;

/// Create a test app with no simulation attached.
pub fn create_test_app() -> App {
    App::new_for_test()
}

/// Fire the pending timer once.
fn fire(seq: &mut Sequencer) -> Tick {
    let token = seq.pending_timer().expect("timer armed").token;
    seq.fire(token)
}

/// Create a test app whose snapshot is in `state`.
///
/// Running is three steps in, Paused is two steps in, Finished has played the
/// whole built-in script.
pub fn create_test_app_with_state(state: RunState) -> App {
    let mut seq = Sequencer::new(Script::mission_mint());
    match state {
        RunState::Idle => {}
        RunState::Running => {
            seq.start().expect("start from idle");
            fire(&mut seq);
            fire(&mut seq);
        }
        RunState::Paused => {
            seq.start().expect("start from idle");
            fire(&mut seq);
            seq.pause().expect("pause while running");
        }
        RunState::Finished => {
            seq.start().expect("start from idle");
            while fire(&mut seq) != Tick::Finished {}
        }
    }
    assert_eq!(seq.state(), state);

    let mut app = App::new_for_test();
    app.snapshot = seq.snapshot();
    app
}

/// Render a screen to a buffer and return it as a string.
pub fn render_screen_to_string<S: ScreenTrait>(screen: &S, app: &App) -> String {
    render_screen_sized(screen, app, TEST_WIDTH, TEST_HEIGHT)
}

/// Render a screen at a given terminal size.
pub fn render_screen_sized<S: ScreenTrait>(
    screen: &S,
    app: &App,
    width: u16,
    height: u16,
) -> String {
    let area = Rect::new(0, 0, width, height);
    let mut buffer = Buffer::empty(area);
    screen.render(app, area, &mut buffer);
    buffer_to_string(&buffer)
}

/// Render the whole app (current screen and overlays) as a string.
pub fn render_app_to_string(app: &App) -> String {
    let area = Rect::new(0, 0, TEST_WIDTH, TEST_HEIGHT);
    let mut buffer = Buffer::empty(area);
    crate::screens::render_app(app, area, &mut buffer);
    buffer_to_string(&buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_app_with_state() {
        let app = create_test_app_with_state(RunState::Running);
        assert_eq!(app.snapshot.cursor, Some(2));

        let app = create_test_app_with_state(RunState::Paused);
        assert_eq!(app.snapshot.cursor, Some(1));

        let app = create_test_app_with_state(RunState::Finished);
        assert_eq!(app.snapshot.cursor, Some(6));
        assert_eq!(app.snapshot.active_node, 5);
    }

    #[test]
    fn test_buffer_to_string() {
        let area = Rect::new(0, 0, 10, 3);
        let mut buffer = Buffer::empty(area);
        buffer.set_string(0, 0, "Hello", ratatui::style::Style::default());
        buffer.set_string(0, 1, "World", ratatui::style::Style::default());

        let result = buffer_to_string(&buffer);
        assert_eq!(result, "Hello\nWorld\n");
    }
}
