//! JSONL (JSON Lines) workout history
//!
//! Provides append-only logging of finished workouts to `.ringside/history.jsonl`

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use crate::workout::model::{Tempo, Workout};

/// Represents one workout session, finished or interrupted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkoutOutcome {
    /// ISO 8601 timestamp of when the session ended
    pub timestamp: DateTime<Utc>,
    /// Whether every round was completed
    pub completed: bool,
    /// Rounds whose work period finished
    pub rounds_completed: u32,
    /// Rounds in the workout
    pub total_rounds: u32,
    /// Work period length in seconds
    pub work_secs: u64,
    /// Rest period length in seconds
    pub rest_secs: u64,
    /// Cue cadence used
    pub tempo: Tempo,
    /// Wall-clock length of the session in seconds, pauses included
    pub elapsed_secs: u64,
}

impl WorkoutOutcome {
    /// Build an outcome for `workout` ending now
    #[must_use]
    pub fn new(workout: &Workout, rounds_completed: u32, completed: bool, elapsed_secs: u64) -> Self {
        let settings = workout.settings();
        Self {
            timestamp: Utc::now(),
            completed,
            rounds_completed,
            total_rounds: workout.total_rounds(),
            work_secs: settings.work.as_secs(),
            rest_secs: settings.rest.as_secs(),
            tempo: settings.tempo,
            elapsed_secs,
        }
    }
}

/// JSONL logger for workout history
///
/// Provides append-only logging to `.ringside/history.jsonl`.
/// Each line is a JSON object representing a single workout.
pub struct JsonlLogger {
    log_path: PathBuf,
}

impl JsonlLogger {
    /// Create a new JSONL logger
    ///
    /// # Arguments
    /// * `log_dir` - Directory where history.jsonl will be stored (typically `.ringside`)
    ///
    /// # Errors
    /// Returns an error if the log directory cannot be created
    pub fn new<P: AsRef<Path>>(log_dir: P) -> Result<Self> {
        let log_dir = log_dir.as_ref();

        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

        Ok(Self {
            log_path: log_dir.join("history.jsonl"),
        })
    }

    /// Append a workout outcome to the log
    pub fn append(&self, outcome: &WorkoutOutcome) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open log file: {}", self.log_path.display()))?;

        let json = serde_json::to_string(outcome)
            .context("Failed to serialize workout outcome to JSON")?;

        writeln!(file, "{json}").context("Failed to write to log file")?;

        Ok(())
    }

    /// Read all workout outcomes from the log, oldest first
    ///
    /// # Errors
    /// Returns an error if:
    /// - The log file cannot be read
    /// - Any line cannot be parsed as valid JSON
    pub fn read_all(&self) -> Result<Vec<WorkoutOutcome>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.log_path)
            .with_context(|| format!("Failed to read log file: {}", self.log_path.display()))?;

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(line_num, line)| {
                serde_json::from_str(line)
                    .with_context(|| format!("Failed to parse line {} as JSON", line_num + 1))
            })
            .collect()
    }

    /// Get the path to the log file
    #[must_use]
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}
