//! Workout configuration parser
//!
//! Parses `workout.toml` into validated settings and combos.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use super::model::{Combo, Move, Stance, Tempo, Workout, WorkoutSettings};

/// The `[workout]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    /// Number of rounds (default: 3)
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    /// Work period length in seconds (default: 180)
    #[serde(default = "default_work_secs")]
    pub work_secs: u64,
    /// Rest period length in seconds (default: 60)
    #[serde(default = "default_rest_secs")]
    pub rest_secs: u64,
    /// Cue cadence during work periods
    #[serde(default)]
    pub tempo: Tempo,
    /// Stance used in combo callouts
    #[serde(default)]
    pub stance: Stance,
    /// How long each move's cue is held, in milliseconds (default: 400)
    #[serde(default = "default_move_millis")]
    pub move_millis: u64,
    /// Simulated narration time for terminal announcements (default: 0)
    #[serde(default)]
    pub announce_millis: u64,
}

const fn default_rounds() -> u32 {
    3
}

const fn default_work_secs() -> u64 {
    180
}

const fn default_rest_secs() -> u64 {
    60
}

const fn default_move_millis() -> u64 {
    400
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            work_secs: default_work_secs(),
            rest_secs: default_rest_secs(),
            tempo: Tempo::default(),
            stance: Stance::default(),
            move_millis: default_move_millis(),
            announce_millis: 0,
        }
    }
}

/// A `[[combo]]` entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComboConfig {
    /// Move names or punch numbers, in order
    pub moves: Vec<String>,
}

/// Top-level configuration parsed from workout.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkoutConfig {
    /// Session settings
    #[serde(default)]
    pub workout: SessionConfig,
    /// Combos assigned to rounds in rotation
    #[serde(default, rename = "combo")]
    pub combos: Vec<ComboConfig>,
}

/// Command-line overrides applied on top of the file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Replaces `rounds`
    pub rounds: Option<u32>,
    /// Replaces `work_secs`
    pub work_secs: Option<u64>,
    /// Replaces `rest_secs`
    pub rest_secs: Option<u64>,
    /// Replaces `tempo`
    pub tempo: Option<Tempo>,
}

impl WorkoutConfig {
    /// Parse a workout.toml file from a path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse workout.toml content from a string
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse workout.toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides and re-validate
    pub fn with_overrides(mut self, overrides: &Overrides) -> Result<Self> {
        if let Some(rounds) = overrides.rounds {
            self.workout.rounds = rounds;
        }
        if let Some(work) = overrides.work_secs {
            self.workout.work_secs = work;
        }
        if let Some(rest) = overrides.rest_secs {
            self.workout.rest_secs = rest;
        }
        if let Some(tempo) = overrides.tempo {
            self.workout.tempo = tempo;
        }
        self.validate()?;
        Ok(self)
    }

    /// Settings for building a workout
    #[must_use]
    pub const fn settings(&self) -> WorkoutSettings {
        WorkoutSettings {
            rounds: self.workout.rounds,
            work: Duration::from_secs(self.workout.work_secs),
            rest: Duration::from_secs(self.workout.rest_secs),
            tempo: self.workout.tempo,
            stance: self.workout.stance,
            move_duration: Duration::from_millis(self.workout.move_millis),
        }
    }

    /// Narration time the terminal cue sink holds each announcement for
    #[must_use]
    pub const fn announce_duration(&self) -> Duration {
        Duration::from_millis(self.workout.announce_millis)
    }

    /// Parse every `[[combo]]` into moves
    pub fn combos(&self) -> Result<Vec<Combo>> {
        self.combos
            .iter()
            .enumerate()
            .map(|(i, combo)| {
                combo
                    .moves
                    .iter()
                    .map(|name| name.parse::<Move>())
                    .collect::<Result<Combo>>()
                    .with_context(|| format!("in combo #{}", i + 1))
            })
            .collect()
    }

    /// Build the workout described by this configuration
    pub fn build_workout(&self) -> Result<Workout> {
        Ok(Workout::build(self.settings(), &self.combos()?))
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        let session = &self.workout;

        if session.rounds == 0 {
            bail!("Invalid rounds: a workout needs at least one round");
        }

        if session.work_secs == 0 {
            bail!("Invalid work_secs: the work period must be at least one second");
        }

        if session.move_millis == 0 {
            bail!("Invalid move_millis: a move cue must last at least one millisecond");
        }

        for (i, combo) in self.combos.iter().enumerate() {
            if combo.moves.is_empty() {
                bail!("Combo #{} has no moves", i + 1);
            }
        }

        // Surfaces unknown move names at load time rather than at round start
        self.combos()?;

        Ok(())
    }
}
