//! Reusable widgets for the meeflow TUI.

pub mod log_viewer;
pub mod status_bar;

pub use log_viewer::{log_lines, LogViewer};
pub use status_bar::{KeyHint, StatusBar};
