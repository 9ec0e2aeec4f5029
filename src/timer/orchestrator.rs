//! Round orchestrator
//!
//! Drives a workout round by round: work period, rest period, next round.
//! Each period gets a fresh countdown; work periods also run the cue
//! sequencer. Display and cue sinks are called at fixed points:
//!
//! ```text
//! start -> [announce -> on_period_start -> ticks -> on_period_end](work)
//!       -> [announce -> on_period_start -> ticks + 3/2/1 beeps -> on_period_end](rest)
//!       -> next round ... -> on_workout_complete
//! ```
//!
//! Pre-period announcements block the thread that starts the period, so
//! narration always finishes before the first tick or cue of that period.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::countdown::{Countdown, TimerState};
use super::error::TimerError;
use super::sequencer::{CuePlan, CueSequencer, PeriodWindow};
use super::sink::{whole_seconds, CueSink, DisplaySink};
use super::token::{Generation, Ticket};
use crate::workout::model::{PeriodType, Round, Workout};

/// Seconds of rest remaining at which a get-ready beep plays
const REST_BEEP_SECONDS: std::ops::RangeInclusive<u64> = 1..=3;

type CompletionHook = Arc<dyn Fn() + Send + Sync>;

/// Runs a workout against a display sink and a cue sink
///
/// Cloning yields another handle to the same run.
#[derive(Clone)]
pub struct Orchestrator {
    shared: Arc<Shared>,
}

struct Shared {
    workout: Arc<Workout>,
    display: Arc<dyn DisplaySink>,
    cues: Arc<dyn CueSink>,
    run: Generation,
    sequencer: CueSequencer,
    runtime: Handle,
    state: Mutex<RunState>,
    completion: watch::Sender<bool>,
    on_complete: Mutex<Option<CompletionHook>>,
}

#[derive(Default)]
struct RunState {
    round: u32,
    period: PeriodType,
    work: Option<Countdown>,
    rest: Option<Countdown>,
    last_beep: Option<u64>,
    completed: bool,
}

impl RunState {
    fn stop_countdowns(&mut self) {
        for countdown in [self.work.take(), self.rest.take()].into_iter().flatten() {
            countdown.stop();
        }
    }

    fn countdown(&self, period: PeriodType) -> Option<&Countdown> {
        match period {
            PeriodType::Work => self.work.as_ref(),
            PeriodType::Rest => self.rest.as_ref(),
        }
    }

    fn in_state(&self, period: PeriodType, state: TimerState) -> Option<&Countdown> {
        self.countdown(period).filter(|c| c.state() == state)
    }
}

impl Orchestrator {
    /// Create an orchestrator for `workout`.
    ///
    /// Must be called from within a Tokio runtime; the control methods may
    /// then be called from any thread.
    pub fn new(
        workout: Arc<Workout>,
        display: Arc<dyn DisplaySink>,
        cues: Arc<dyn CueSink>,
    ) -> Self {
        let (completion, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                workout,
                display,
                cues,
                run: Generation::new(),
                sequencer: CueSequencer::new(),
                runtime: Handle::current(),
                state: Mutex::new(RunState::default()),
                completion,
                on_complete: Mutex::new(None),
            }),
        }
    }

    /// Register a hook that runs once per completed workout, even when a
    /// sink panics while being told about the completion
    pub fn set_on_complete<F>(&self, hook: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.shared.lock_hook() = Some(Arc::new(hook));
    }

    /// The workout being run
    #[must_use]
    pub fn workout(&self) -> &Workout {
        &self.shared.workout
    }

    /// Start the workout at round 1.
    ///
    /// Blocks until the opening announcements for the first work period have
    /// played.
    pub fn start(&self) -> Result<(), TimerError> {
        let shared = &self.shared;
        let total = shared.workout.total_rounds();
        if total == 0 {
            return Err(TimerError::EmptyWorkout);
        }

        {
            let mut state = shared.lock();
            if state.round != 0 {
                return Err(TimerError::AlreadyRunning { round: state.round });
            }
            state.round = 1;
            state.period = PeriodType::Work;
            state.completed = false;
        }

        let ticket = shared.run.advance();
        shared.completion.send_replace(false);
        info!(total_rounds = total, "workout starting");
        shared.display.on_workout_start(total);
        shared.cues.play_workout_start();

        shared.begin_work(1, &ticket).inspect_err(|_| {
            shared.lock().round = 0;
        })
    }

    /// Pause whichever period is running. No-op if nothing is running.
    pub fn pause(&self) {
        let state = self.shared.lock();
        if let Some(work) = state.in_state(PeriodType::Work, TimerState::Running) {
            work.pause();
            self.shared.sequencer.stop();
            debug!(round = state.round, "work period paused");
        } else if let Some(rest) = state.in_state(PeriodType::Rest, TimerState::Running) {
            rest.pause();
            // The work period's last cycle may still be finishing
            self.shared.sequencer.stop();
            debug!(round = state.round, "rest period paused");
        }
    }

    /// Resume whichever period is paused. No-op if nothing is paused.
    ///
    /// A resumed work period restarts the cue sequencer with a window of the
    /// time the period has left.
    pub fn resume(&self) {
        let state = self.shared.lock();
        if let Some(work) = state.in_state(PeriodType::Work, TimerState::Paused) {
            let remaining = work.remaining();
            work.start();
            if let Some(round) = self.shared.workout.round(state.round) {
                self.shared.sequencer.start(
                    self.shared.cue_plan(round),
                    PeriodWindow::starting_now(remaining),
                    Arc::clone(&self.shared.cues),
                );
            }
            debug!(round = state.round, ?remaining, "work period resumed");
        } else if let Some(rest) = state.in_state(PeriodType::Rest, TimerState::Paused) {
            rest.start();
            debug!(round = state.round, "rest period resumed");
        }
    }

    /// Stop everything and reset to round 0. Safe at any time, any number
    /// of times, including from inside a sink callback.
    pub fn stop(&self) {
        let shared = &self.shared;
        shared.run.invalidate();
        {
            let mut state = shared.lock();
            state.stop_countdowns();
            shared.sequencer.stop();
            state.round = 0;
            state.period = PeriodType::Work;
            state.last_beep = None;
        }
        shared.cues.stop();
        debug!("workout stopped");
    }

    /// Round in progress, 0 when not running
    #[must_use]
    pub fn current_round(&self) -> u32 {
        self.shared.lock().round
    }

    /// Active period; `Work` when no round is active
    #[must_use]
    pub fn current_period(&self) -> PeriodType {
        let state = self.shared.lock();
        if self.shared.workout.round(state.round).is_none() {
            return PeriodType::default();
        }
        state.period
    }

    /// Time left in the active period; zero when no round is active
    #[must_use]
    pub fn remaining_time(&self) -> Duration {
        let state = self.shared.lock();
        if self.shared.workout.round(state.round).is_none() {
            return Duration::ZERO;
        }
        state
            .countdown(state.period)
            .map_or(Duration::ZERO, Countdown::remaining)
    }

    /// True while the active period is paused
    #[must_use]
    pub fn is_paused(&self) -> bool {
        let state = self.shared.lock();
        state.in_state(state.period, TimerState::Paused).is_some()
    }

    /// True once the last rest period has ended
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.shared.lock().completed
    }

    /// Resolve once the workout has completed
    pub async fn wait_for_completion(&self) {
        let mut rx = self.shared.completion.subscribe();
        // The sender lives as long as `self`, so this only returns on completion
        let _ = rx.wait_for(|done| *done).await;
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("round", &self.current_round())
            .field("period", &self.current_period())
            .field("total_rounds", &self.shared.workout.total_rounds())
            .finish_non_exhaustive()
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_hook(&self) -> MutexGuard<'_, Option<CompletionHook>> {
        self.on_complete.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn round(&self, number: u32) -> Result<&Round, TimerError> {
        self.workout
            .round(number)
            .ok_or(TimerError::RoundOutOfRange {
                round: number,
                total: self.workout.total_rounds(),
            })
    }

    fn cue_plan(&self, round: &Round) -> CuePlan {
        let settings = self.workout.settings();
        CuePlan {
            combo: round.combo.clone(),
            tempo: settings.tempo.interval(),
            move_duration: settings.move_duration,
        }
    }

    /// Announce and start the work period of `number`.
    fn begin_work(self: &Arc<Self>, number: u32, ticket: &Ticket) -> Result<(), TimerError> {
        let round = self.round(number)?;
        let total = self.workout.total_rounds();

        {
            // Checked under the lock so a concurrent stop cannot be overwritten
            let mut state = self.lock();
            if !ticket.is_live() {
                return Ok(());
            }
            state.stop_countdowns();
            self.sequencer.stop();
            state.round = number;
            state.period = PeriodType::Work;
            state.last_beep = None;
        }

        debug!(round = number, "announcing work period");
        self.cues.play_period_transition(PeriodType::Work);
        self.cues.play_round_callout(number, total);
        self.cues
            .play_combo_callout(&round.combo, self.workout.settings().stance);

        if !ticket.is_live() {
            debug!(round = number, "stopped during announcements");
            return Ok(());
        }
        self.display
            .on_period_start(PeriodType::Work, number, round.work);

        let countdown = self.work_countdown(number, round.work, ticket);
        let mut state = self.lock();
        if !ticket.is_live() {
            return Ok(());
        }
        self.sequencer.start(
            self.cue_plan(round),
            PeriodWindow::starting_now(round.work),
            Arc::clone(&self.cues),
        );
        countdown.start();
        state.work = Some(countdown);
        Ok(())
    }

    /// Announce and start the rest period of `number`.
    fn begin_rest(self: &Arc<Self>, number: u32, ticket: &Ticket) -> Result<(), TimerError> {
        let round = self.round(number)?;

        {
            let mut state = self.lock();
            if !ticket.is_live() {
                return Ok(());
            }
            state.stop_countdowns();
            state.period = PeriodType::Rest;
            state.last_beep = None;
        }

        self.cues.play_period_transition(PeriodType::Rest);

        if !ticket.is_live() {
            return Ok(());
        }
        self.display
            .on_period_start(PeriodType::Rest, number, round.rest);

        let countdown = self.rest_countdown(number, round.rest, ticket);
        let mut state = self.lock();
        if !ticket.is_live() {
            return Ok(());
        }
        countdown.start();
        state.rest = Some(countdown);
        Ok(())
    }

    fn work_countdown(
        self: &Arc<Self>,
        number: u32,
        duration: Duration,
        ticket: &Ticket,
    ) -> Countdown {
        let on_tick = {
            let weak = Arc::downgrade(self);
            let ticket = ticket.clone();
            move |remaining| {
                if let Some(shared) = live(&weak, &ticket) {
                    shared
                        .display
                        .on_timer_update(remaining, PeriodType::Work, number);
                }
            }
        };
        let on_complete = {
            let weak = Arc::downgrade(self);
            let ticket = ticket.clone();
            move || {
                let Some(shared) = live(&weak, &ticket) else {
                    return;
                };
                shared.display.on_period_end(PeriodType::Work, number);
                if let Err(err) = shared.begin_rest(number, &ticket) {
                    warn!(%err, "rest period not started");
                }
            }
        };
        let _runtime = self.runtime.enter();
        Countdown::new(duration, on_tick, on_complete)
    }

    fn rest_countdown(
        self: &Arc<Self>,
        number: u32,
        duration: Duration,
        ticket: &Ticket,
    ) -> Countdown {
        let on_tick = {
            let weak = Arc::downgrade(self);
            let ticket = ticket.clone();
            move |remaining| {
                if let Some(shared) = live(&weak, &ticket) {
                    shared
                        .display
                        .on_timer_update(remaining, PeriodType::Rest, number);
                    shared.rest_beep(remaining, &ticket);
                }
            }
        };
        let on_complete = {
            let weak = Arc::downgrade(self);
            let ticket = ticket.clone();
            move || {
                let Some(shared) = live(&weak, &ticket) else {
                    return;
                };
                shared.display.on_period_end(PeriodType::Rest, number);
                let next = number + 1;
                if next > shared.workout.total_rounds() {
                    shared.finish(&ticket);
                } else if let Err(err) = shared.begin_work(next, &ticket) {
                    warn!(%err, "work period not started");
                }
            }
        };
        let _runtime = self.runtime.enter();
        Countdown::new(duration, on_tick, on_complete)
    }

    /// Beep once for each of the last three whole seconds of rest.
    fn rest_beep(&self, remaining: Duration, ticket: &Ticket) {
        let second = whole_seconds(remaining);
        if !REST_BEEP_SECONDS.contains(&second) {
            return;
        }
        let fresh = {
            let mut state = self.lock();
            if !ticket.is_live() || state.last_beep == Some(second) {
                false
            } else {
                state.last_beep = Some(second);
                true
            }
        };
        if fresh {
            self.cues.play_beep();
        }
    }

    /// Mark the workout complete and notify, exactly once per run.
    fn finish(&self, ticket: &Ticket) {
        {
            let mut state = self.lock();
            if state.completed || !ticket.is_live() {
                return;
            }
            state.completed = true;
            state.round = 0;
            state.period = PeriodType::Work;
            state.stop_countdowns();
            self.sequencer.stop();
        }
        info!("workout complete");

        let display = panic::catch_unwind(AssertUnwindSafe(|| {
            self.display.on_workout_complete();
        }));
        let cues = panic::catch_unwind(AssertUnwindSafe(|| {
            self.cues.play_workout_complete();
        }));

        self.completion.send_replace(true);
        let hook = self.lock_hook().clone();
        if let Some(hook) = hook {
            hook();
        }

        if let Err(payload) = display.and(cues) {
            warn!("sink panicked while reporting workout completion");
            panic::resume_unwind(payload);
        }
    }
}

/// Upgrade a callback's back-reference if its run is still current
fn live(weak: &Weak<Shared>, ticket: &Ticket) -> Option<Arc<Shared>> {
    if !ticket.is_live() {
        return None;
    }
    weak.upgrade()
}
