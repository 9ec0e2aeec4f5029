//! Workout history
//!
//! Append-only JSONL record of every workout session.

pub mod jsonl;

pub use jsonl::{JsonlLogger, WorkoutOutcome};
