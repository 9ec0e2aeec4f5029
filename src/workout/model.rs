//! Workout data model
//!
//! Rounds, combos and the settings that produced them. Everything here is
//! immutable once built and shared read-only with the timer core.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Which half of a round is active
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    /// Punching period, combos are cued at the tempo
    #[default]
    Work,
    /// Recovery period between rounds
    Rest,
}

impl PeriodType {
    /// Upper-case label used by announcements and the display
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Work => "WORK",
            Self::Rest => "REST",
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Boxer stance, used when calling out combos
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    /// Left foot forward
    #[default]
    Orthodox,
    /// Right foot forward
    Southpaw,
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Orthodox => f.write_str("orthodox"),
            Self::Southpaw => f.write_str("southpaw"),
        }
    }
}

/// Cadence of combo cues during a work period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tempo {
    /// One combo every 4 seconds
    Slow,
    /// One combo every 3 seconds
    #[default]
    Medium,
    /// One combo every 2 seconds
    Fast,
    /// One combo every second
    Superfast,
}

impl Tempo {
    /// Interval between the starts of two cue cycles
    #[must_use]
    pub const fn interval(self) -> Duration {
        match self {
            Self::Slow => Duration::from_secs(4),
            Self::Medium => Duration::from_secs(3),
            Self::Fast => Duration::from_secs(2),
            Self::Superfast => Duration::from_secs(1),
        }
    }

    /// Lowercase name as written in `workout.toml`
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Slow => "slow",
            Self::Medium => "medium",
            Self::Fast => "fast",
            Self::Superfast => "superfast",
        }
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tempo {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "slow" => Ok(Self::Slow),
            "medium" => Ok(Self::Medium),
            "fast" => Ok(Self::Fast),
            "superfast" => Ok(Self::Superfast),
            other => bail!("Unknown tempo '{other}': expected slow, medium, fast or superfast"),
        }
    }
}

/// A single punch or defensive move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Move {
    /// 1
    Jab,
    /// 2
    Cross,
    /// 3
    LeadHook,
    /// 4
    RearHook,
    /// 5
    LeadUppercut,
    /// 6
    RearUppercut,
    /// Slip the incoming punch
    Slip,
    /// Roll under a hook
    Roll,
    /// Duck straight down
    Duck,
    /// Lean back out of range
    PullBack,
    /// High guard block
    Block,
}

impl Move {
    /// Name used in callouts and on screen
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Jab => "jab",
            Self::Cross => "cross",
            Self::LeadHook => "lead hook",
            Self::RearHook => "rear hook",
            Self::LeadUppercut => "lead uppercut",
            Self::RearUppercut => "rear uppercut",
            Self::Slip => "slip",
            Self::Roll => "roll",
            Self::Duck => "duck",
            Self::PullBack => "pull back",
            Self::Block => "block",
        }
    }

    /// True for the six numbered punches
    #[must_use]
    pub const fn is_punch(self) -> bool {
        matches!(
            self,
            Self::Jab
                | Self::Cross
                | Self::LeadHook
                | Self::RearHook
                | Self::LeadUppercut
                | Self::RearUppercut
        )
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Move {
    type Err = anyhow::Error;

    /// Accepts names (`"lead-hook"`, `"lead hook"`, `"lead_hook"`) and the
    /// boxing number system (`"1"` through `"6"`).
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        let mv = match normalized.as_str() {
            "1" | "jab" => Self::Jab,
            "2" | "cross" => Self::Cross,
            "3" | "lead-hook" | "hook" => Self::LeadHook,
            "4" | "rear-hook" => Self::RearHook,
            "5" | "lead-uppercut" | "uppercut" => Self::LeadUppercut,
            "6" | "rear-uppercut" => Self::RearUppercut,
            "slip" => Self::Slip,
            "roll" => Self::Roll,
            "duck" => Self::Duck,
            "pull-back" | "pullback" => Self::PullBack,
            "block" => Self::Block,
            _ => bail!("Unknown move '{}'", s.trim()),
        };
        Ok(mv)
    }
}

/// Ordered sequence of moves cued during one work period
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combo(Vec<Move>);

impl Combo {
    /// Build a combo from moves in order
    #[must_use]
    pub const fn new(moves: Vec<Move>) -> Self {
        Self(moves)
    }

    /// The moves in cue order
    #[must_use]
    pub fn moves(&self) -> &[Move] {
        &self.0
    }

    /// Number of moves
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the combo has no moves
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Combo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|m| m.name()).collect();
        f.write_str(&names.join(", "))
    }
}

impl FromIterator<Move> for Combo {
    fn from_iter<I: IntoIterator<Item = Move>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One work period followed by one rest period
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    /// 1-indexed round number
    pub number: u32,
    /// Combo cued during the work period
    pub combo: Combo,
    /// Work period length, always positive
    pub work: Duration,
    /// Rest period length, may be zero
    pub rest: Duration,
}

impl Round {
    /// Length of the given period of this round
    #[must_use]
    pub const fn duration_of(&self, period: PeriodType) -> Duration {
        match period {
            PeriodType::Work => self.work,
            PeriodType::Rest => self.rest,
        }
    }
}

/// Settings a workout was built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkoutSettings {
    /// Number of rounds
    pub rounds: u32,
    /// Work period length
    pub work: Duration,
    /// Rest period length
    pub rest: Duration,
    /// Cue cadence during work periods
    pub tempo: Tempo,
    /// Stance used in combo callouts
    pub stance: Stance,
    /// How long each move's cue is held
    pub move_duration: Duration,
}

impl Default for WorkoutSettings {
    fn default() -> Self {
        Self {
            rounds: 3,
            work: Duration::from_secs(180),
            rest: Duration::from_secs(60),
            tempo: Tempo::default(),
            stance: Stance::default(),
            move_duration: Duration::from_millis(400),
        }
    }
}

/// An ordered, immutable list of rounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workout {
    rounds: Vec<Round>,
    settings: WorkoutSettings,
}

impl Workout {
    /// Build a workout from settings, assigning combos to rounds in rotation.
    ///
    /// With no combos every round gets the empty combo.
    #[must_use]
    pub fn build(settings: WorkoutSettings, combos: &[Combo]) -> Self {
        let rounds = (1..=settings.rounds)
            .map(|number| Round {
                number,
                combo: if combos.is_empty() {
                    Combo::default()
                } else {
                    combos[(number as usize - 1) % combos.len()].clone()
                },
                work: settings.work,
                rest: settings.rest,
            })
            .collect();
        Self { rounds, settings }
    }

    /// Build a workout from explicit rounds.
    ///
    /// `settings.rounds` is overwritten with the actual round count.
    #[must_use]
    pub fn from_rounds(rounds: Vec<Round>, mut settings: WorkoutSettings) -> Self {
        settings.rounds = u32::try_from(rounds.len()).unwrap_or(u32::MAX);
        Self { rounds, settings }
    }

    /// All rounds in order
    #[must_use]
    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    /// Look up a round by its 1-indexed number
    #[must_use]
    pub fn round(&self, number: u32) -> Option<&Round> {
        let index = usize::try_from(number).ok()?.checked_sub(1)?;
        self.rounds.get(index)
    }

    /// Number of rounds
    #[must_use]
    pub fn total_rounds(&self) -> u32 {
        u32::try_from(self.rounds.len()).unwrap_or(u32::MAX)
    }

    /// Settings this workout was built from
    #[must_use]
    pub const fn settings(&self) -> &WorkoutSettings {
        &self.settings
    }

    /// Sum of all work and rest periods
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.rounds.iter().map(|r| r.work + r.rest).sum()
    }
}
