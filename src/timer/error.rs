//! Timer core errors

use thiserror::Error;

/// Errors reported by the round orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    /// `start()` was called on a workout with no rounds
    #[error("Cannot start an empty workout: no rounds to run")]
    EmptyWorkout,

    /// A period was requested for a round that does not exist, which happens
    /// when a stop races a pending callback
    #[error("Round {round} is out of range (workout has {total} rounds)")]
    RoundOutOfRange {
        /// Requested round number
        round: u32,
        /// Rounds in the workout
        total: u32,
    },

    /// `start()` was called while a workout is already in progress
    #[error("Workout already running (round {round})")]
    AlreadyRunning {
        /// Round in progress
        round: u32,
    },
}
