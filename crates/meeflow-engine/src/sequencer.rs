//! Playback sequencer.
//!
//! The [`Sequencer`] walks a [`Script`] one step per timer tick. It is a plain
//! state machine: it never sleeps and never spawns. Instead it exclusively owns
//! at most one pending [`Timer`], identified by a [`TimerToken`], and whoever
//! drives it (see [`crate::driver`]) calls [`Sequencer::fire`] with that token
//! once the delay has elapsed.
//!
//! Cancelling or re-arming always replaces the stored token first, so a timer
//! that fires late carries a token the sequencer no longer holds and is
//! ignored as [`Tick::Stale`].

use crate::script::{Script, Severity};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Delay between two steps.
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(1500);

/// Narration appended on pause.
pub const MSG_PAUSED: &str = "Simulation Paused.";
/// Narration appended on resume.
pub const MSG_RESUMED: &str = "Simulation Resumed.";
/// Narration appended after reset.
pub const MSG_RESET: &str = "Simulation Reset.";
/// Terminal narration appended once the script is exhausted.
pub const MSG_FINISHED: &str = "Simulation Finished. NFT is now on-chain.";

/// Playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Not started, or reset.
    #[default]
    Idle,
    /// Advancing on the timer.
    Running,
    /// Timer cancelled, waiting for resume.
    Paused,
    /// Script exhausted.
    Finished,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// A caller-visible sequencer operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Start,
    Pause,
    Resume,
    Reset,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Pause => write!(f, "pause"),
            Self::Resume => write!(f, "resume"),
            Self::Reset => write!(f, "reset"),
        }
    }
}

/// One line of the system log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    /// Monotonic id, unique for the lifetime of the sequencer.
    pub id: u64,
    /// Wall-clock time the entry was appended.
    pub timestamp: DateTime<Local>,
    /// Message text.
    pub message: String,
    /// Severity tag.
    pub severity: Severity,
}

impl LogEntry {
    /// Timestamp formatted as `HH:MM:SS`.
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// Identifies one armed timer. Only the most recently armed token is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

/// The single pending timer owned by a sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    /// Token the driver must pass back to [`Sequencer::fire`].
    pub token: TimerToken,
    /// How long to wait before firing.
    pub delay: Duration,
}

/// Outcome of an advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The step at this index was applied.
    Step(usize),
    /// The script was exhausted and playback finished.
    Finished,
    /// The token was not the live timer; nothing changed.
    Stale,
}

/// Notifications produced by sequencer operations, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationEvent {
    /// A log entry was appended.
    Logged(LogEntry),
    /// A step was applied.
    StepApplied { index: usize, node: usize },
    /// The run state changed.
    StateChanged { state: RunState },
    /// A control request was rejected.
    Rejected(SequencerError),
}

/// Everything an observer needs to render the simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationSnapshot {
    pub state: RunState,
    /// Index of the most recently applied step (`None` = not started).
    pub cursor: Option<usize>,
    /// Node of the most recently applied step (0 = none).
    pub active_node: usize,
    pub log: Vec<LogEntry>,
    pub payload: Option<Value>,
    pub script_len: usize,
}

impl SimulationSnapshot {
    /// Operation a single primary control should trigger in this state.
    pub fn primary_operation(&self) -> Operation {
        match self.state {
            RunState::Idle | RunState::Finished => Operation::Start,
            RunState::Running => Operation::Pause,
            RunState::Paused => Operation::Resume,
        }
    }

    /// Number of steps applied so far.
    pub fn applied_steps(&self) -> usize {
        self.cursor.map_or(0, |c| c + 1)
    }
}

/// Timer-driven walk over a script.
#[derive(Debug)]
pub struct Sequencer {
    script: Script,
    delay: Duration,
    state: RunState,
    cursor: Option<usize>,
    active_node: usize,
    payload: Option<Value>,
    log: Vec<LogEntry>,
    timer: Option<Timer>,
    generation: u64,
    next_log_id: u64,
    events: Vec<SimulationEvent>,
}

impl Sequencer {
    /// Create an idle sequencer with the default step delay.
    pub fn new(script: Script) -> Self {
        Self::with_delay(script, DEFAULT_STEP_DELAY)
    }

    /// Create an idle sequencer with a custom step delay.
    pub fn with_delay(script: Script, delay: Duration) -> Self {
        Self {
            script,
            delay,
            state: RunState::Idle,
            cursor: None,
            active_node: 0,
            payload: None,
            log: Vec::new(),
            timer: None,
            generation: 0,
            next_log_id: 0,
            events: Vec::new(),
        }
    }

    /// Start playback from the first step.
    ///
    /// Valid from [`RunState::Idle`] and [`RunState::Finished`]. The first step
    /// is applied before this returns.
    pub fn start(&mut self) -> Result<Tick, SequencerError> {
        if !matches!(self.state, RunState::Idle | RunState::Finished) {
            return Err(self.reject(Operation::Start));
        }
        self.cancel_timer();
        self.log.clear();
        self.payload = None;
        self.cursor = None;
        self.active_node = 0;
        self.set_state(RunState::Running);
        info!(steps = self.script.len(), "simulation started");
        Ok(self.advance())
    }

    /// Pause a running playback. Cursor and payload are kept.
    pub fn pause(&mut self) -> Result<(), SequencerError> {
        if self.state != RunState::Running {
            return Err(self.reject(Operation::Pause));
        }
        self.cancel_timer();
        self.set_state(RunState::Paused);
        self.push_log(MSG_PAUSED, Severity::Warning);
        Ok(())
    }

    /// Resume a paused playback. The next step waits a full delay.
    pub fn resume(&mut self) -> Result<(), SequencerError> {
        if self.state != RunState::Paused {
            return Err(self.reject(Operation::Resume));
        }
        self.set_state(RunState::Running);
        self.push_log(MSG_RESUMED, Severity::Info);
        self.arm_timer();
        Ok(())
    }

    /// Return to idle from any state, leaving only the reset notice in the log.
    pub fn reset(&mut self) {
        self.cancel_timer();
        self.cursor = None;
        self.active_node = 0;
        self.log.clear();
        self.payload = None;
        self.set_state(RunState::Idle);
        self.push_log(MSG_RESET, Severity::Info);
        info!("simulation reset");
    }

    /// Apply the operation by name. Reset never fails.
    pub fn apply(&mut self, operation: Operation) -> Result<(), SequencerError> {
        match operation {
            Operation::Start => self.start().map(|_| ()),
            Operation::Pause => self.pause(),
            Operation::Resume => self.resume(),
            Operation::Reset => {
                self.reset();
                Ok(())
            }
        }
    }

    /// Deliver an elapsed timer.
    ///
    /// Advances only if `token` is the live timer; the token is consumed first,
    /// so delivering it twice advances at most once.
    pub fn fire(&mut self, token: TimerToken) -> Tick {
        match self.timer {
            Some(timer) if timer.token == token => {
                self.timer = None;
                self.advance()
            }
            _ => {
                debug!(token = token.0, "ignoring stale timer");
                Tick::Stale
            }
        }
    }

    /// The pending timer, if any.
    pub fn pending_timer(&self) -> Option<Timer> {
        self.timer
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Index of the most recently applied step (`None` = not started).
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Node of the most recently applied step (0 = none).
    pub fn active_node(&self) -> usize {
        self.active_node
    }

    /// Payload of the most recently applied step.
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// Log entries, oldest first.
    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// The script being played.
    pub fn script(&self) -> &Script {
        &self.script
    }

    /// Delay between steps.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Take the events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<SimulationEvent> {
        std::mem::take(&mut self.events)
    }

    /// Capture the observable state.
    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            state: self.state,
            cursor: self.cursor,
            active_node: self.active_node,
            log: self.log.clone(),
            payload: self.payload.clone(),
            script_len: self.script.len(),
        }
    }

    fn advance(&mut self) -> Tick {
        debug_assert_eq!(self.state, RunState::Running);
        let next = self.cursor.map_or(0, |c| c + 1);

        let Some(step) = self.script.get(next).cloned() else {
            self.set_state(RunState::Finished);
            self.push_log(MSG_FINISHED, Severity::Success);
            info!("simulation finished");
            return Tick::Finished;
        };

        self.cursor = Some(next);
        self.active_node = step.node;
        self.payload = (!step.payload.is_null()).then_some(step.payload);
        self.push_log(step.message, step.severity);
        self.events.push(SimulationEvent::StepApplied {
            index: next,
            node: step.node,
        });
        // One more tick after the last step is what finishes the run.
        self.arm_timer();
        Tick::Step(next)
    }

    fn arm_timer(&mut self) {
        self.cancel_timer();
        self.generation += 1;
        let token = TimerToken(self.generation);
        debug!(token = token.0, delay = ?self.delay, "timer armed");
        self.timer = Some(Timer {
            token,
            delay: self.delay,
        });
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            debug!(token = timer.token.0, "timer cancelled");
        }
    }

    fn set_state(&mut self, state: RunState) {
        if self.state != state {
            self.state = state;
            self.events.push(SimulationEvent::StateChanged { state });
        }
    }

    fn push_log(&mut self, message: impl Into<String>, severity: Severity) {
        self.next_log_id += 1;
        let entry = LogEntry {
            id: self.next_log_id,
            timestamp: Local::now(),
            message: message.into(),
            severity,
        };
        self.log.push(entry.clone());
        self.events.push(SimulationEvent::Logged(entry));
    }

    fn reject(&self, operation: Operation) -> SequencerError {
        warn!(%operation, state = %self.state, "rejected state transition");
        SequencerError::InvalidStateTransition {
            operation,
            state: self.state,
        }
    }
}

/// Errors returned by sequencer operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequencerError {
    /// The operation is not valid in the current state.
    #[error("cannot {operation} while {state}")]
    InvalidStateTransition {
        operation: Operation,
        state: RunState,
    },
}
