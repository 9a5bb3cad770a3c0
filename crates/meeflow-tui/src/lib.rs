//! meeflow-tui: Terminal UI for the mission-mint flow simulation
//!
//! This crate provides the TUI layer for meeflow, including:
//! - The simulation screen (node strip, system log, data inspector)
//! - Shared widgets (status bar, log viewer)
//! - Headless mode for testing and automation

mod app;
mod event;
pub mod headless;
mod screens;
#[cfg(test)]
pub mod test_utils;
mod ui;

pub use app::{App, Screen};
pub use event::{Action, Event, EventHandler};
pub use meeflow_engine;

use crossterm::{
    cursor::Show as ShowCursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use meeflow_engine::{Config, Script};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout};

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), DisableMouseCapture, LeaveAlternateScreen, ShowCursor);
    }
}

/// Run the TUI application.
///
/// This is the main entry point for the TUI. It sets up the terminal,
/// spawns the simulation, runs the event loop, and restores the terminal on exit.
pub async fn run_tui(config: Config, script: Script) -> Result<(), Box<dyn std::error::Error>> {
    // Setup terminal with RAII guard for cleanup
    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut events = EventHandler::new(config.tick_rate());
    let mut app = App::new(config, script);

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    // Restore cursor before guard drops
    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| {
            let area = frame.area();
            app.set_area(area);
            screens::render_app(app, area, frame.buffer_mut());
        })?;

        if app.should_quit {
            break;
        }

        // A published snapshot only needs a redraw.
        let event = tokio::select! {
            event = events.next() => Some(event),
            () = app.wait_for_update() => None,
        };
        let Some(event) = event else {
            continue;
        };
        let Some(event) = event else {
            break;
        };

        match event {
            Event::Key(key) => {
                let action = event::key_to_action(key);
                app.handle_action(action);
            }
            Event::Mouse(mouse) => {
                use crossterm::event::MouseEventKind;
                match mouse.kind {
                    MouseEventKind::ScrollUp => app.handle_action(Action::Up),
                    MouseEventKind::ScrollDown => app.handle_action(Action::Down),
                    _ => {}
                }
            }
            Event::Tick => app.tick(),
            Event::Resize(_, _) => {
                // Terminal will handle resize automatically
            }
        }
    }

    Ok(())
}

/// Get the TUI version.
pub fn tui_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tui_version() {
        let version = tui_version();
        assert!(!version.is_empty());
        assert!(version.starts_with("0."));
    }
}

#[cfg(test)]
mod snapshot_tests {
    use crate::app::Screen;
    use crate::screens::simulation::{inspector_text, SimulationScreen};
    use crate::event::Action;
    use crate::test_utils::*;
    use insta::assert_snapshot;
    use meeflow_engine::RunState;
    use ratatui::layout::Rect;

    #[test]
    fn test_render_idle() {
        let app = create_test_app();
        let result = render_screen_to_string(&SimulationScreen, &app);

        assert!(result.contains("MeeBot Mission Mint"));
        assert!(result.contains("STATUS: IDLE"));
        assert!(result.contains("Waiting for simulation to start..."));
        assert!(result.contains("No active data capture"));
        assert!(result.contains("Enter  Start"));
        assert!(result.contains("0/7 steps"));
        for label in ["User", "MeeBot UI", "MeeBot API", "IPFS Storage", "Smart Contract"] {
            assert!(result.contains(label), "missing node {label}");
        }
        assert!(!result.contains(">>"));
    }

    #[test]
    fn test_render_running() {
        let app = create_test_app_with_state(RunState::Running);
        let result = render_screen_to_string(&SimulationScreen, &app);

        assert!(result.contains("STATUS: PROCESSING"));
        assert!(result.contains(" 3 >> "));
        assert!(result.contains(" 2 [ok] "));
        assert!(result.contains("API Verifying off-chain"));
        assert!(result.contains("\"signer\": \"0xMeeBot_Admin\""));
        assert!(result.contains("Enter  Pause"));
        assert!(result.contains("3/7 steps"));
    }

    #[test]
    fn test_render_paused() {
        let app = create_test_app_with_state(RunState::Paused);
        let result = render_screen_to_string(&SimulationScreen, &app);

        assert!(result.contains("STATUS: PAUSED"));
        assert!(result.contains("Simulation Paused."));
        assert!(result.contains("Enter  Resume"));
        assert!(result.contains("\"proof\": \"0x_base64_proof_data\""));
    }

    #[test]
    fn test_render_finished() {
        let app = create_test_app_with_state(RunState::Finished);
        let result = render_screen_to_string(&SimulationScreen, &app);

        assert!(result.contains("STATUS: FINISHED"));
        assert!(result.contains(" 5 >> "));
        assert!(result.contains(" 4 [ok] "));
        assert!(result.contains("Simulation Finished."));
        assert!(result.contains("\"txHash\": \"0x88c...d91e\""));
        assert!(result.contains("Enter  Restart"));
        assert!(result.contains("7/7 steps"));
    }

    #[test]
    fn test_render_narrow_scrolled_to_first_entry() {
        let mut app = create_test_app_with_state(RunState::Finished);
        app.set_area(Rect::new(0, 0, 60, 24));
        for _ in 0..50 {
            app.handle_action(Action::Up);
        }
        let result = render_screen_sized(&SimulationScreen, &app, 60, 24);

        assert!(result.contains("User interaction"));
        assert!(result.contains("MeeBot UI sending"));
        assert!(!result.contains("Simulation Finished."));
    }

    #[test]
    fn test_render_narrow_inspector_wraps_payload() {
        let app = create_test_app_with_state(RunState::Finished);
        let result = render_screen_sized(&SimulationScreen, &app, 60, 24);

        assert!(result.contains("\"0x88c...d91e\""));
        assert!(result.contains("\"confirmed\""));
    }

    #[test]
    fn test_render_quit_confirm() {
        let mut app = create_test_app_with_state(RunState::Running);
        app.screen = Screen::QuitConfirm;
        let result = render_app_to_string(&app);

        assert!(result.contains("Playback is still in progress."));
        assert!(result.contains("[Enter] Quit"));
    }

    #[test]
    fn test_render_help_overlay() {
        let mut app = create_test_app();
        app.show_help = true;
        let result = render_app_to_string(&app);

        assert!(result.contains(" Help "));
        assert!(result.contains("Reset to idle"));
    }

    #[test]
    fn test_snapshot_inspector_verified_payload() {
        let app = create_test_app_with_state(RunState::Running);
        let payload = app.snapshot.payload.clone().unwrap();
        assert_snapshot!(
            "inspector_verified_payload",
            inspector_text(Some(&payload))
        );
    }
}

/// Navigation tests that exercise event handling and screen transitions.
#[cfg(test)]
mod navigation_tests {
    use crate::app::Screen;
    use crate::event::Action;
    use crate::test_utils::{create_test_app, create_test_app_with_state};
    use meeflow_engine::RunState;

    #[test]
    fn test_quit_when_idle_is_immediate() {
        let mut app = create_test_app();
        app.handle_action(Action::Quit);
        assert!(app.should_quit);
    }

    #[test]
    fn test_quit_while_running_shows_confirm() {
        let mut app = create_test_app_with_state(RunState::Running);

        app.handle_action(Action::Quit);
        assert_eq!(app.screen, Screen::QuitConfirm);
        assert!(!app.should_quit);

        // Enter confirms
        app.handle_action(Action::Primary);
        assert!(app.should_quit);
    }

    #[test]
    fn test_quit_confirm_cancel_returns_to_simulation() {
        let mut app = create_test_app_with_state(RunState::Paused);
        app.handle_action(Action::Quit);
        assert_eq!(app.screen, Screen::QuitConfirm);

        app.handle_action(Action::Back);
        assert_eq!(app.screen, Screen::Simulation);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_help_overlay_toggle() {
        let mut app = create_test_app();
        assert!(!app.show_help);

        app.handle_action(Action::Help);
        assert!(app.show_help);

        app.handle_action(Action::Back);
        assert!(!app.show_help);
    }

    #[test]
    fn test_help_closes_before_quit() {
        let mut app = create_test_app();
        app.show_help = true;

        app.handle_action(Action::Quit);
        assert!(!app.show_help);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_action_none_does_nothing() {
        let mut app = create_test_app();
        let initial_screen = app.screen;

        app.handle_action(Action::None);
        assert_eq!(app.screen, initial_screen);
        assert!(app.notification.is_none());
    }

    #[test]
    fn test_toggle_follow() {
        let mut app = create_test_app();
        let initial_follow = app.follow_log;

        app.handle_action(Action::ToggleFollow);
        assert_ne!(app.follow_log, initial_follow);

        app.handle_action(Action::ToggleFollow);
        assert_eq!(app.follow_log, initial_follow);
    }
}
