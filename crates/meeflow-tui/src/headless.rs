//! Headless mode for the meeflow TUI.
//!
//! This module provides a way to run the TUI without a real terminal,
//! enabling E2E testing and automation. Actions are sent via channels
//! and screen state is captured after each render.

use crate::app::{App, Screen};
use crate::event::Action;
use crate::screens::render_app;
use meeflow_engine::{Config, RunState, Script};
use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Default terminal dimensions for headless mode.
pub const DEFAULT_WIDTH: u16 = 80;
pub const DEFAULT_HEIGHT: u16 = 24;

/// State captured from the headless TUI after each render.
#[derive(Debug, Clone, Default)]
pub struct HeadlessState {
    /// Current screen being displayed.
    pub screen: Screen,
    /// Playback state of the simulation.
    pub state: RunState,
    /// Text contents of the terminal buffer.
    pub screen_contents: String,
    /// Whether the TUI should quit.
    pub should_quit: bool,
    /// Whether help overlay is visible.
    pub show_help: bool,
}

/// Handle to control a headless TUI instance.
///
/// Use this to send actions and observe state changes.
pub struct HeadlessHandle {
    action_tx: mpsc::UnboundedSender<Action>,
    state_rx: watch::Receiver<HeadlessState>,
}

impl HeadlessHandle {
    /// Send an action to the TUI.
    ///
    /// Returns `true` if the action was sent successfully.
    pub fn send_action(&self, action: Action) -> bool {
        self.action_tx.send(action).is_ok()
    }

    /// Get the current state of the TUI.
    pub fn state(&self) -> HeadlessState {
        self.state_rx.borrow().clone()
    }

    /// Wait until a condition is met on the state.
    ///
    /// Returns the state when the condition is met, or `None` if timed out.
    pub async fn wait_for<F>(&mut self, condition: F, timeout: Duration) -> Option<HeadlessState>
    where
        F: Fn(&HeadlessState) -> bool,
    {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let state = self.state_rx.borrow_and_update().clone();
            if condition(&state) {
                return Some(state);
            }

            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return None;
            }

            match tokio::time::timeout(remaining, self.state_rx.changed()).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) | Err(_) => return None,
            }
        }
    }

    /// Wait for specific text to appear on screen.
    pub async fn wait_for_text(&mut self, text: &str, timeout: Duration) -> Option<HeadlessState> {
        self.wait_for(|s| s.screen_contents.contains(text), timeout)
            .await
    }

    /// Wait for the simulation to reach a run state.
    pub async fn wait_for_state(
        &mut self,
        state: RunState,
        timeout: Duration,
    ) -> Option<HeadlessState> {
        self.wait_for(|s| s.state == state, timeout).await
    }

    /// Check if the TUI has quit.
    pub fn has_quit(&self) -> bool {
        self.state().should_quit
    }
}

/// Configuration for headless mode.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Terminal width.
    pub width: u16,
    /// Terminal height.
    pub height: u16,
    /// Tick rate in milliseconds.
    pub tick_rate_ms: u64,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            tick_rate_ms: 50, // Faster tick rate for testing
        }
    }
}

/// Run the TUI in headless mode.
///
/// Returns a handle to control the TUI and a join handle for the background task.
///
/// # Example
///
/// ```ignore
/// let (mut handle, task) = run_tui_headless(config, script, HeadlessConfig::default());
///
/// handle.send_action(Action::Primary);
/// let state = handle.wait_for_state(RunState::Finished, Duration::from_secs(30)).await;
///
/// handle.send_action(Action::Quit);
/// task.await.unwrap();
/// ```
pub fn run_tui_headless(
    config: Config,
    script: Script,
    headless: HeadlessConfig,
) -> (HeadlessHandle, JoinHandle<Result<(), String>>) {
    let (action_tx, action_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(HeadlessState::default());

    let task = tokio::spawn(async move {
        run_headless_loop(config, script, headless, action_rx, state_tx)
            .await
            .map_err(|e| e.to_string())
    });

    let handle = HeadlessHandle {
        action_tx,
        state_rx,
    };

    (handle, task)
}

/// What woke the headless loop.
enum Wake {
    Action(Option<Action>),
    Update,
    Tick,
}

async fn run_headless_loop(
    config: Config,
    script: Script,
    headless: HeadlessConfig,
    mut action_rx: mpsc::UnboundedReceiver<Action>,
    state_tx: watch::Sender<HeadlessState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let backend = TestBackend::new(headless.width, headless.height);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, script);
    let tick_duration = Duration::from_millis(headless.tick_rate_ms);

    loop {
        terminal.draw(|frame| {
            let area = frame.area();
            app.set_area(area);
            render_app(&app, area, frame.buffer_mut());
        })?;

        let screen_contents = buffer_to_string(terminal.backend().buffer());
        state_tx.send_replace(HeadlessState {
            screen: app.screen,
            state: app.run_state(),
            screen_contents,
            should_quit: app.should_quit,
            show_help: app.show_help,
        });

        if app.should_quit {
            break;
        }

        let wake = tokio::select! {
            action = action_rx.recv() => Wake::Action(action),
            () = app.wait_for_update() => Wake::Update,
            () = tokio::time::sleep(tick_duration) => Wake::Tick,
        };

        match wake {
            Wake::Action(Some(action)) => app.handle_action(action),
            // Controller dropped its handle.
            Wake::Action(None) => break,
            Wake::Update => {}
            Wake::Tick => app.tick(),
        }
    }

    Ok(())
}

/// Convert a terminal buffer to a string representation.
pub(crate) fn buffer_to_string(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut result = String::new();

    for y in area.y..area.y + area.height {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buffer.cell((x, y)) {
                result.push_str(cell.symbol());
            }
        }
        // Trim trailing whitespace from each line
        while result.ends_with(' ') {
            result.pop();
        }
        result.push('\n');
    }

    if result.ends_with('\n') {
        result.pop();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use meeflow_engine::{Severity, Step};
    use serde_json::json;

    const TIMEOUT: Duration = Duration::from_secs(30);

    fn fast_config() -> Config {
        Config {
            step_delay_ms: 200,
            ..Config::default()
        }
    }

    fn two_step_script() -> Script {
        Script::new(vec![
            Step::new(1, "A", json!({ "missionId": 7 }), Severity::Info),
            Step::new(2, "B", json!(null), Severity::Success),
        ])
    }

    #[test]
    fn test_headless_state_default() {
        let state = HeadlessState::default();
        assert_eq!(state.screen, Screen::Simulation);
        assert_eq!(state.state, RunState::Idle);
        assert!(!state.should_quit);
        assert!(!state.show_help);
        assert!(state.screen_contents.is_empty());
    }

    #[test]
    fn test_headless_config_default() {
        let config = HeadlessConfig::default();
        assert_eq!(config.width, DEFAULT_WIDTH);
        assert_eq!(config.height, DEFAULT_HEIGHT);
        assert_eq!(config.tick_rate_ms, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_headless_plays_to_finished() {
        let (mut handle, task) =
            run_tui_headless(fast_config(), two_step_script(), HeadlessConfig::default());

        let idle = handle.wait_for_text("Waiting for simulation", TIMEOUT).await;
        assert!(idle.is_some());

        assert!(handle.send_action(Action::Primary));
        let running = handle.wait_for_text("\"missionId\": 7", TIMEOUT).await.unwrap();
        assert_eq!(running.state, RunState::Running);

        let finished = handle
            .wait_for_state(RunState::Finished, TIMEOUT)
            .await
            .unwrap();
        assert!(finished.screen_contents.contains("STATUS: FINISHED"));
        assert!(finished.screen_contents.contains("Simulation Finished."));
        // Step B carries no payload.
        assert!(finished.screen_contents.contains("No active data capture"));

        assert!(handle.send_action(Action::Quit));
        let quit = handle.wait_for(|s| s.should_quit, TIMEOUT).await;
        assert!(quit.is_some());
        task.await.unwrap().unwrap();
        assert!(handle.has_quit());
    }

    #[tokio::test(start_paused = true)]
    async fn test_headless_quit_confirm_while_running() {
        let (mut handle, task) =
            run_tui_headless(fast_config(), Script::mission_mint(), HeadlessConfig::default());

        handle.send_action(Action::Primary);
        handle
            .wait_for_state(RunState::Running, TIMEOUT)
            .await
            .unwrap();

        handle.send_action(Action::Quit);
        let confirm = handle
            .wait_for_text("Playback is still in progress.", TIMEOUT)
            .await
            .unwrap();
        assert_eq!(confirm.screen, Screen::QuitConfirm);
        assert!(!confirm.should_quit);

        handle.send_action(Action::Back);
        let back = handle
            .wait_for(|s| s.screen == Screen::Simulation, TIMEOUT)
            .await
            .unwrap();
        assert!(!back.should_quit);

        drop(handle);
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_headless_help_overlay() {
        let (mut handle, _task) =
            run_tui_headless(fast_config(), two_step_script(), HeadlessConfig::default());

        handle.send_action(Action::Help);
        let help = handle.wait_for(|s| s.show_help, TIMEOUT).await.unwrap();
        assert!(help.screen_contents.contains("Toggle follow"));

        // Any key closes help without acting on it.
        handle.send_action(Action::Primary);
        let closed = handle.wait_for(|s| !s.show_help, TIMEOUT).await.unwrap();
        assert_eq!(closed.state, RunState::Idle);
    }
}
