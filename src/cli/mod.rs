//! Terminal front end
//!
//! Display and cue sinks that render a running workout to stderr.

pub mod cues;
pub mod display;

pub use cues::TerminalCues;
pub use display::TerminalDisplay;
