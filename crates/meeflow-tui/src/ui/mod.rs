//! UI module for the meeflow TUI.

pub mod layout;
pub mod theme;
pub mod widgets;

pub use layout::*;
