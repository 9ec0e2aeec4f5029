//! Cue sequencer
//!
//! Cycles through a combo during a work period: a beep at the start of each
//! cycle, one animation frame per move held for a fixed time, then idle until
//! the next tempo boundary. Before every cycle it checks whether the work
//! period has elapsed and, if so, shows the rest frame and stops.
//!
//! The sequence is an explicit state machine driven by a single task, so a
//! cancellation is one ticket check rather than a chain of nested timers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use super::sink::{CueFrame, CueSink};
use super::token::{Generation, Ticket};
use crate::workout::model::Combo;

/// What to cue and how fast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CuePlan {
    /// Moves cued each cycle
    pub combo: Combo,
    /// Interval between cycle starts
    pub tempo: Duration,
    /// How long each move's frame is held
    pub move_duration: Duration,
}

impl CuePlan {
    /// Idle time after the last move of a cycle
    #[must_use]
    pub fn idle(&self) -> Duration {
        idle_duration(self.combo.len(), self.tempo, self.move_duration)
    }
}

/// Idle time left in a tempo interval after `moves` moves, floored at zero
#[must_use]
pub fn idle_duration(moves: usize, tempo: Duration, move_duration: Duration) -> Duration {
    let busy = u32::try_from(moves)
        .ok()
        .and_then(|m| move_duration.checked_mul(m))
        .unwrap_or(Duration::MAX);
    tempo.saturating_sub(busy)
}

/// Snapshot of the work period the sequencer runs inside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    started_at: Instant,
    duration: Duration,
}

impl PeriodWindow {
    /// A window of `duration` opening now
    #[must_use]
    pub fn starting_now(duration: Duration) -> Self {
        Self {
            started_at: Instant::now(),
            duration,
        }
    }

    /// True once wall-clock time since the window opened reaches its length
    #[must_use]
    pub fn has_elapsed(&self) -> bool {
        self.started_at.elapsed() >= self.duration
    }
}

/// Position in the cue cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueStep {
    /// Elapsed check, then the cycle beep
    CycleStart,
    /// Holding the frame for move `i`
    Move(usize),
    /// Holding idle until the tempo boundary
    Idle,
    /// Cancelled or finished
    Stopped,
}

impl CueStep {
    /// Step that follows this one in a combo of `moves` moves
    #[must_use]
    pub const fn next(self, moves: usize) -> Self {
        match self {
            Self::CycleStart if moves == 0 => Self::Idle,
            Self::CycleStart => Self::Move(0),
            Self::Move(i) if i + 1 < moves => Self::Move(i + 1),
            Self::Move(_) => Self::Idle,
            Self::Idle => Self::CycleStart,
            Self::Stopped => Self::Stopped,
        }
    }
}

/// Why a sequencer chain ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueExit {
    /// The work period elapsed and the rest frame was shown
    PeriodElapsed,
    /// Stopped, or superseded by a newer chain
    Cancelled,
}

/// Runs at most one cue chain at a time
pub struct CueSequencer {
    runtime: Handle,
    generation: Generation,
    task: Mutex<Option<JoinHandle<CueExit>>>,
}

impl CueSequencer {
    /// Create an idle sequencer bound to the current Tokio runtime
    #[must_use]
    pub fn new() -> Self {
        Self {
            runtime: Handle::current(),
            generation: Generation::new(),
            task: Mutex::new(None),
        }
    }

    /// Start cueing `plan` inside `window`, stopping any previous chain first
    pub fn start(&self, plan: CuePlan, window: PeriodWindow, cues: Arc<dyn CueSink>) {
        let mut task = self.lock();
        let ticket = self.generation.advance();
        if let Some(stale) = task.take() {
            stale.abort();
        }
        debug!(moves = plan.combo.len(), tempo = ?plan.tempo, "cue sequencer starting");
        *task = Some(self.runtime.spawn(drive(plan, window, cues, ticket)));
    }

    /// Cancel the running chain, if any. A frame already being emitted may
    /// still land; nothing scheduled after this call will.
    pub fn stop(&self) {
        let mut task = self.lock();
        self.generation.invalidate();
        if let Some(running) = task.take() {
            running.abort();
        }
    }

    /// True while a chain is still cueing
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.lock().as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Wait for the current chain to end. `None` if nothing was started.
    pub async fn wait(&self) -> Option<CueExit> {
        let task = self.lock().take()?;
        Some(task.await.unwrap_or(CueExit::Cancelled))
    }

    fn lock(&self) -> MutexGuard<'_, Option<JoinHandle<CueExit>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CueSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CueSequencer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Drive one chain until the window elapses or the ticket dies.
///
/// Frame deadlines are accumulated from the cycle start, so the cycle length
/// is exactly `max(tempo, moves * move_duration)`.
async fn drive(
    plan: CuePlan,
    window: PeriodWindow,
    cues: Arc<dyn CueSink>,
    ticket: Ticket,
) -> CueExit {
    let moves = plan.combo.moves();
    let idle = plan.idle();
    let mut step = CueStep::CycleStart;
    let mut deadline = Instant::now();

    loop {
        if !ticket.is_live() {
            step = CueStep::Stopped;
        }

        match step {
            CueStep::CycleStart => {
                if window.has_elapsed() {
                    cues.show_frame(CueFrame::Rest);
                    debug!("work period elapsed, cue sequencer yielding");
                    return CueExit::PeriodElapsed;
                }
                deadline = Instant::now();
                cues.play_beep();
            }
            CueStep::Move(index) => {
                if let Some(&mv) = moves.get(index) {
                    cues.show_frame(CueFrame::Move { index, mv });
                }
                deadline += plan.move_duration;
                tokio::time::sleep_until(deadline).await;
            }
            CueStep::Idle => {
                if !idle.is_zero() {
                    cues.show_frame(CueFrame::Idle);
                    deadline += idle;
                    tokio::time::sleep_until(deadline).await;
                }
            }
            CueStep::Stopped => return CueExit::Cancelled,
        }

        step = step.next(moves.len());
    }
}
