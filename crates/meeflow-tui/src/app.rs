//! Application state and update logic for the meeflow TUI.

use crate::event::Action;
use crate::headless::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::screens::simulation::log_viewport;
use crate::ui::widgets::log_lines;
use meeflow_engine::{
    spawn_simulation, Config, Operation, RunState, Script, Sequencer, SimulationEvent,
    SimulationHandle, SimulationSnapshot,
};
use ratatui::layout::Rect;
use tokio::sync::mpsc;

/// How long a notification stays visible.
const NOTIFICATION_MS: u64 = 3000;

/// The current screen being displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Simulation,
    QuitConfirm,
}

/// Application state.
#[derive(Debug)]
pub struct App {
    /// Whether the app should quit.
    pub should_quit: bool,

    /// Whether the help overlay is visible.
    pub show_help: bool,

    /// Current screen.
    pub screen: Screen,

    /// Effective configuration.
    pub config: Config,

    /// Latest snapshot published by the simulation.
    pub snapshot: SimulationSnapshot,

    /// Terminal area of the last draw.
    pub area: Rect,

    /// Lines scrolled back from the newest log line (when not following).
    pub log_scroll: usize,

    /// Whether the log view sticks to the newest entry.
    pub follow_log: bool,

    /// Tick counter for animations.
    pub tick: usize,

    /// Notification message (displayed temporarily, cleared after some ticks).
    pub notification: Option<String>,

    /// Ticks remaining until notification is cleared.
    notification_ttl: usize,

    /// Control handle for the simulation task.
    handle: Option<SimulationHandle>,

    /// Channel receiver for simulation events.
    event_rx: Option<mpsc::UnboundedReceiver<SimulationEvent>>,
}

impl App {
    /// Create an app and spawn its simulation task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: Config, script: Script) -> Self {
        let sequencer = Sequencer::with_delay(script, config.step_delay());
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let handle = spawn_simulation(sequencer, event_tx);

        let mut app = Self::detached(config, handle.snapshot());
        app.handle = Some(handle);
        app.event_rx = Some(event_rx);
        app
    }

    /// Create an app with no simulation task behind it.
    ///
    /// Control actions only produce a notification. Used for rendering tests.
    pub fn new_for_test() -> Self {
        let config = Config::default();
        let snapshot = Sequencer::new(Script::mission_mint()).snapshot();
        Self::detached(config, snapshot)
    }

    fn detached(config: Config, snapshot: SimulationSnapshot) -> Self {
        Self {
            should_quit: false,
            show_help: false,
            screen: Screen::default(),
            config,
            snapshot,
            area: Rect::new(0, 0, DEFAULT_WIDTH, DEFAULT_HEIGHT),
            log_scroll: 0,
            follow_log: true,
            tick: 0,
            notification: None,
            notification_ttl: 0,
            handle: None,
            event_rx: None,
        }
    }

    /// Current run state.
    pub fn run_state(&self) -> RunState {
        self.snapshot.state
    }

    /// Whether a simulation task is attached.
    pub fn is_attached(&self) -> bool {
        self.handle.is_some()
    }

    /// Record the terminal area, keeping the log scroll within range.
    pub fn set_area(&mut self, area: Rect) {
        self.area = area;
        self.log_scroll = self.log_scroll.min(self.max_log_scroll());
    }

    /// How many wrapped log lines lie above the viewport when following.
    pub fn max_log_scroll(&self) -> usize {
        let (width, height) = log_viewport(self.area);
        log_lines(&self.snapshot.log, width)
            .len()
            .saturating_sub(height)
    }

    /// Handle an action.
    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit if self.show_help => {
                self.show_help = false;
                return;
            }
            Action::Help => {
                self.show_help = !self.show_help;
                return;
            }
            _ => {}
        }

        // If help is showing, any key closes it
        if self.show_help {
            if action != Action::None {
                self.show_help = false;
            }
            return;
        }

        match self.screen {
            Screen::Simulation => self.handle_simulation_action(action),
            Screen::QuitConfirm => self.handle_quit_confirm_action(action),
        }
    }

    fn handle_simulation_action(&mut self, action: Action) {
        match action {
            Action::Quit => {
                if matches!(self.run_state(), RunState::Running | RunState::Paused) {
                    self.screen = Screen::QuitConfirm;
                } else {
                    self.should_quit = true;
                }
            }
            Action::Primary => {
                let operation = self.snapshot.primary_operation();
                self.send(operation);
            }
            Action::Reset => self.send(Operation::Reset),
            Action::ToggleFollow => {
                self.follow_log = !self.follow_log;
                if self.follow_log {
                    self.log_scroll = 0;
                }
            }
            Action::Up => {
                if self.log_scroll < self.max_log_scroll() {
                    self.log_scroll += 1;
                    self.follow_log = false;
                }
            }
            Action::Down => {
                self.log_scroll = self.log_scroll.saturating_sub(1);
            }
            Action::Help | Action::Back | Action::None => {}
        }
    }

    fn handle_quit_confirm_action(&mut self, action: Action) {
        match action {
            Action::Primary | Action::Quit => self.should_quit = true,
            Action::Back => self.screen = Screen::Simulation,
            _ => {}
        }
    }

    /// Queue an operation on the simulation task.
    fn send(&mut self, operation: Operation) {
        let queued = self
            .handle
            .as_ref()
            .is_some_and(|handle| handle.request(operation));
        if !queued {
            self.set_notification(format!("Cannot {operation}: simulation is not running"));
        }
    }

    /// Set a temporary notification message.
    fn set_notification(&mut self, msg: String) {
        self.notification = Some(msg);
        let tick_ms = self.config.tick_rate_ms.max(1);
        #[allow(clippy::cast_possible_truncation)]
        let ttl = (NOTIFICATION_MS / tick_ms).max(1) as usize;
        self.notification_ttl = ttl;
    }

    /// Increment tick counter and update time-based state.
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);

        // Clear notification after TTL expires
        if self.notification_ttl > 0 {
            self.notification_ttl -= 1;
            if self.notification_ttl == 0 {
                self.notification = None;
            }
        }

        self.process_simulation_events();
        if let Some(snapshot) = self.handle.as_mut().and_then(SimulationHandle::take_update) {
            self.snapshot = snapshot;
        }
    }

    /// Wait until the simulation publishes a new snapshot and apply it.
    ///
    /// Never resolves when no simulation is attached or the task has stopped.
    pub async fn wait_for_update(&mut self) {
        let Some(handle) = self.handle.as_mut() else {
            return std::future::pending().await;
        };
        if handle.changed().await.is_err() {
            return std::future::pending().await;
        }
        self.snapshot = handle.snapshot();
        self.process_simulation_events();
    }

    /// Drain pending simulation events.
    pub fn process_simulation_events(&mut self) {
        // Collect events first to avoid borrow issues
        let events: Vec<SimulationEvent> = {
            let Some(rx) = &mut self.event_rx else {
                return;
            };
            let mut events = Vec::new();
            while let Ok(event) = rx.try_recv() {
                events.push(event);
            }
            events
        };

        for event in events {
            self.handle_simulation_event(event);
        }
    }

    fn handle_simulation_event(&mut self, event: SimulationEvent) {
        match event {
            SimulationEvent::Rejected(e) => self.set_notification(e.to_string()),
            SimulationEvent::StateChanged {
                state: RunState::Idle,
            } => {
                self.log_scroll = 0;
                self.follow_log = true;
            }
            SimulationEvent::Logged(_)
            | SimulationEvent::StepApplied { .. }
            | SimulationEvent::StateChanged { .. } => {}
        }
    }
}
