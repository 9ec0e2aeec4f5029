//! Timing and sequencing core
//!
//! A pausable countdown, the round orchestrator built on it, and the cue
//! sequencer that paces combos inside work periods.

pub mod countdown;
pub mod error;
pub mod orchestrator;
pub mod sequencer;
pub mod sink;
pub mod token;

pub use countdown::{Countdown, TimerState};
pub use error::TimerError;
pub use orchestrator::Orchestrator;
pub use sequencer::{idle_duration, CueExit, CuePlan, CueSequencer, CueStep, PeriodWindow};
pub use sink::{CueFrame, CueSink, DisplaySink};
