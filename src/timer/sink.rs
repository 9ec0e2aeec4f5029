//! Collaborator interfaces driven by the timer core
//!
//! The core never renders or plays anything itself. It calls a display sink
//! for screen state and a cue sink for audio and animation cues.

use std::time::Duration;

use crate::workout::model::{Combo, Move, PeriodType, Stance};

/// Receives screen updates from the orchestrator
///
/// Calls arrive on timer threads and should return quickly.
pub trait DisplaySink: Send + Sync {
    /// A workout of `total_rounds` rounds is starting
    fn on_workout_start(&self, total_rounds: u32);

    /// A period begins; its first timer update follows immediately
    fn on_period_start(&self, period: PeriodType, round: u32, duration: Duration);

    /// Roughly once per second while a period runs
    fn on_timer_update(&self, remaining: Duration, period: PeriodType, round: u32);

    /// A period ran to completion
    fn on_period_end(&self, period: PeriodType, round: u32);

    /// Every round has finished
    fn on_workout_complete(&self);
}

/// Animation state set by the cue sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueFrame {
    /// The move at `index` of the active combo is being thrown
    Move {
        /// Position in the combo
        index: usize,
        /// The move itself
        mv: Move,
    },
    /// Guard up, waiting for the next cycle
    Idle,
    /// The work period is over
    Rest,
}

/// Plays audio and animation cues
///
/// `play_workout_start`, `play_period_transition`, `play_round_callout` and
/// `play_combo_callout` are called synchronously before a period's timer
/// starts and may block until the announcement has finished playing.
/// `play_beep` and `show_frame` are called at cadence and must not block.
pub trait CueSink: Send + Sync {
    /// The workout is starting
    fn play_workout_start(&self);

    /// A work or rest period is about to start
    fn play_period_transition(&self, period: PeriodType);

    /// Announce the round number
    fn play_round_callout(&self, round: u32, total: u32);

    /// Announce the combo for the coming work period
    fn play_combo_callout(&self, combo: &Combo, stance: Stance);

    /// Short beep: start of a cue cycle or rest countdown
    fn play_beep(&self);

    /// The workout is finished
    fn play_workout_complete(&self);

    /// Cancel any announcement still playing
    fn stop(&self);

    /// Set the animation state
    fn show_frame(&self, _frame: CueFrame) {}
}

/// Remaining time as whole seconds, rounding half-seconds up
#[must_use]
pub fn whole_seconds(remaining: Duration) -> u64 {
    u64::try_from((remaining.as_millis() + 500) / 1000).unwrap_or(u64::MAX)
}

/// Format a duration as `m:ss`
#[must_use]
pub fn format_clock(remaining: Duration) -> String {
    let secs = whole_seconds(remaining);
    format!("{}:{:02}", secs / 60, secs % 60)
}
