//! Shared test utilities
//!
//! A recording sink that implements both collaborator interfaces and keeps
//! every call in a single ordered journal. Only compiled in test builds.

use std::sync::Mutex;
use std::time::Duration;

use crate::timer::sink::{CueFrame, CueSink, DisplaySink};
use crate::workout::model::{Combo, PeriodType, Stance};

/// One recorded sink call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `DisplaySink::on_workout_start`
    WorkoutStart(u32),
    /// `DisplaySink::on_period_start`
    PeriodStart(PeriodType, u32, Duration),
    /// `DisplaySink::on_timer_update`
    TimerUpdate(Duration, PeriodType, u32),
    /// `DisplaySink::on_period_end`
    PeriodEnd(PeriodType, u32),
    /// `DisplaySink::on_workout_complete`
    WorkoutComplete,
    /// `CueSink::play_workout_start`
    PlayWorkoutStart,
    /// `CueSink::play_period_transition`
    Transition(PeriodType),
    /// `CueSink::play_round_callout`
    RoundCallout(u32, u32),
    /// `CueSink::play_combo_callout`
    ComboCallout(Combo, Stance),
    /// `CueSink::play_beep`
    Beep,
    /// `CueSink::play_workout_complete`
    PlayWorkoutComplete,
    /// `CueSink::stop`
    StopAudio,
    /// `CueSink::show_frame`
    Frame(CueFrame),
}

impl Event {
    /// True for calls made on the display sink
    #[must_use]
    pub const fn is_display(&self) -> bool {
        matches!(
            self,
            Self::WorkoutStart(_)
                | Self::PeriodStart(..)
                | Self::TimerUpdate(..)
                | Self::PeriodEnd(..)
                | Self::WorkoutComplete
        )
    }
}

/// Records every display and cue call in order
#[derive(Debug, Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    /// Snapshot of everything recorded so far
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Only the display sink calls
    #[must_use]
    pub fn display_events(&self) -> Vec<Event> {
        self.events().into_iter().filter(Event::is_display).collect()
    }

    /// Number of recorded events equal to `wanted`
    #[must_use]
    pub fn count(&self, wanted: &Event) -> usize {
        self.events().iter().filter(|e| *e == wanted).count()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl DisplaySink for Recorder {
    fn on_workout_start(&self, total_rounds: u32) {
        self.push(Event::WorkoutStart(total_rounds));
    }

    fn on_period_start(&self, period: PeriodType, round: u32, duration: Duration) {
        self.push(Event::PeriodStart(period, round, duration));
    }

    fn on_timer_update(&self, remaining: Duration, period: PeriodType, round: u32) {
        self.push(Event::TimerUpdate(remaining, period, round));
    }

    fn on_period_end(&self, period: PeriodType, round: u32) {
        self.push(Event::PeriodEnd(period, round));
    }

    fn on_workout_complete(&self) {
        self.push(Event::WorkoutComplete);
    }
}

impl CueSink for Recorder {
    fn play_workout_start(&self) {
        self.push(Event::PlayWorkoutStart);
    }

    fn play_period_transition(&self, period: PeriodType) {
        self.push(Event::Transition(period));
    }

    fn play_round_callout(&self, round: u32, total: u32) {
        self.push(Event::RoundCallout(round, total));
    }

    fn play_combo_callout(&self, combo: &Combo, stance: Stance) {
        self.push(Event::ComboCallout(combo.clone(), stance));
    }

    fn play_beep(&self) {
        self.push(Event::Beep);
    }

    fn play_workout_complete(&self) {
        self.push(Event::PlayWorkoutComplete);
    }

    fn stop(&self) {
        self.push(Event::StopAudio);
    }

    fn show_frame(&self, frame: CueFrame) {
        self.push(Event::Frame(frame));
    }
}
