//! meeflow-engine: Headless playback engine for the mission-mint flow
//!
//! This crate provides the core simulation logic for meeflow, including:
//! - The playback script and node catalog
//! - The playback sequencer state machine
//! - An async driver that runs the sequencer on tokio timers
//! - Configuration loading

pub mod config;
pub mod driver;
pub mod script;
pub mod sequencer;

// Re-export commonly used types
pub use config::{Config, ConfigError, MEEFLOW_DIR};
pub use driver::{spawn_simulation, ControlError, SimulationHandle};
pub use script::{node, Node, Script, ScriptError, Severity, Step, NODES};
pub use sequencer::{
    LogEntry, Operation, RunState, Sequencer, SequencerError, SimulationEvent, SimulationSnapshot,
    Tick, Timer, TimerToken, DEFAULT_STEP_DELAY, MSG_FINISHED, MSG_PAUSED, MSG_RESET, MSG_RESUMED,
};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
