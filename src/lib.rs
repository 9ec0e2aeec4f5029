//! Ringside - Interval timer for boxing workouts
//!
//! Ringside runs rounds of timed work and rest, calling out a punch combo
//! for each round and cueing its moves at a steady tempo while you train.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

pub mod cli;
pub mod log;
pub mod timer;
pub mod workout;

#[cfg(test)]
mod testutil;

// Re-export commonly used types
pub use cli::{TerminalCues, TerminalDisplay};
pub use log::{JsonlLogger, WorkoutOutcome};
pub use timer::{
    Countdown, CueFrame, CueSequencer, CueSink, DisplaySink, Orchestrator, TimerError, TimerState,
};
pub use workout::{Combo, Move, Overrides, PeriodType, Stance, Tempo, Workout, WorkoutConfig};
