//! Workout definition
//!
//! This module holds the workout data model and the `workout.toml` parser.

pub mod config;
pub mod model;

pub use config::{Overrides, WorkoutConfig};
pub use model::{Combo, Move, PeriodType, Round, Stance, Tempo, Workout, WorkoutSettings};
