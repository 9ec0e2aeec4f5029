//! Terminal cue playback
//!
//! Announcements are printed and then held for a configurable narration
//! time, standing in for spoken audio. Beeps ring the terminal bell.

use std::io::Write;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use colored::Colorize;

use crate::timer::sink::{CueFrame, CueSink};
use crate::workout::model::{Combo, PeriodType, Stance};

/// Cue sink that writes to stderr
#[derive(Debug)]
pub struct TerminalCues {
    announce: Duration,
    bell: bool,
    /// Bumped by `stop` to cut short any announcement being held
    epoch: Mutex<u64>,
    wake: Condvar,
}

impl TerminalCues {
    /// Create a cue sink that holds each announcement for `announce`
    #[must_use]
    pub const fn new(announce: Duration) -> Self {
        Self {
            announce,
            bell: true,
            epoch: Mutex::new(0),
            wake: Condvar::new(),
        }
    }

    /// Disable the terminal bell on beeps
    #[must_use]
    pub fn without_bell(mut self) -> Self {
        self.bell = false;
        self
    }

    fn announce(&self, text: &str) {
        eprintln!("\n  {} {}", "»".magenta().bold(), text.bold());
        self.hold();
    }

    /// Block for the narration time unless `stop` is called first
    fn hold(&self) {
        if self.announce.is_zero() {
            return;
        }
        let guard = self.lock_epoch();
        let captured = *guard;
        let _ = self
            .wake
            .wait_timeout_while(guard, self.announce, |epoch| *epoch == captured);
    }

    fn lock_epoch(&self) -> MutexGuard<'_, u64> {
        self.epoch.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CueSink for TerminalCues {
    fn play_workout_start(&self) {
        self.announce("Get ready");
    }

    fn play_period_transition(&self, period: PeriodType) {
        self.announce(transition_text(period));
    }

    fn play_round_callout(&self, round: u32, total: u32) {
        self.announce(&round_text(round, total));
    }

    fn play_combo_callout(&self, combo: &Combo, stance: Stance) {
        self.announce(&combo_text(combo, stance));
    }

    fn play_beep(&self) {
        if self.bell {
            let mut stderr = std::io::stderr().lock();
            let _ = write!(stderr, "\x07");
            let _ = stderr.flush();
        }
    }

    fn play_workout_complete(&self) {
        self.announce("Workout complete. Good work");
    }

    fn stop(&self) {
        {
            let mut epoch = self.lock_epoch();
            *epoch = epoch.wrapping_add(1);
        }
        self.wake.notify_all();
    }

    fn show_frame(&self, frame: CueFrame) {
        if let CueFrame::Move { mv, .. } = frame {
            let name = mv.name().to_uppercase();
            let styled = if mv.is_punch() {
                name.red().bold()
            } else {
                name.blue().bold()
            };
            eprint!("\n    {} {styled}\n", "▸".dimmed());
        }
    }
}

const fn transition_text(period: PeriodType) -> &'static str {
    match period {
        PeriodType::Work => "Fight!",
        PeriodType::Rest => "Rest",
    }
}

fn round_text(round: u32, total: u32) -> String {
    if round == total {
        format!("Final round, {round} of {total}")
    } else {
        format!("Round {round} of {total}")
    }
}

fn combo_text(combo: &Combo, stance: Stance) -> String {
    if combo.is_empty() {
        format!("Free movement ({stance})")
    } else {
        format!("{combo} ({stance})")
    }
}
