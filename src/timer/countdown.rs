//! Pausable countdown
//!
//! A single-period timer that ticks roughly once per second and completes
//! exactly once. Remaining time is always derived from the instant the
//! countdown (re)started and the time banked at that moment, so scheduler
//! jitter never accumulates into drift.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use super::token::{Generation, Ticket};

/// Interval between tick notifications
pub const TICK: Duration = Duration::from_secs(1);

/// Lifecycle of a countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// Not started, or stopped
    Idle,
    /// Counting down
    Running,
    /// Frozen with remaining time banked
    Paused,
    /// Reached zero
    Completed,
}

type TickFn = dyn Fn(Duration) + Send + Sync;
type CompleteFn = dyn Fn() + Send + Sync;

/// A pausable, cancellable countdown
///
/// Cloning yields another handle to the same countdown.
#[derive(Clone)]
pub struct Countdown {
    inner: Arc<Inner>,
}

struct Inner {
    duration: Duration,
    on_tick: Box<TickFn>,
    on_complete: Arc<CompleteFn>,
    runtime: Handle,
    generation: Generation,
    clock: Mutex<Clock>,
}

struct Clock {
    state: TimerState,
    started_at: Option<Instant>,
    banked: Duration,
    task: Option<JoinHandle<()>>,
}

impl Countdown {
    /// Create an idle countdown.
    ///
    /// `on_tick` receives the remaining time, first immediately on every
    /// start or resume and then at each elapsed second. `on_complete` runs
    /// once on the blocking pool when the countdown reaches zero, so it may
    /// block.
    ///
    /// Must be called from within a Tokio runtime; later control calls may
    /// come from any thread.
    pub fn new<T, C>(duration: Duration, on_tick: T, on_complete: C) -> Self
    where
        T: Fn(Duration) + Send + Sync + 'static,
        C: Fn() + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                duration,
                on_tick: Box::new(on_tick),
                on_complete: Arc::new(on_complete),
                runtime: Handle::current(),
                generation: Generation::new(),
                clock: Mutex::new(Clock {
                    state: TimerState::Idle,
                    started_at: None,
                    banked: duration,
                    task: None,
                }),
            }),
        }
    }

    /// Configured length of the countdown
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.inner.duration
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> TimerState {
        self.inner.lock().state
    }

    /// Start counting down.
    ///
    /// Idle or Completed countdowns start over from the full duration, a
    /// Paused one resumes with exactly the time it had left. No-op while
    /// Running.
    pub fn start(&self) {
        let mut clock = self.inner.lock();
        match clock.state {
            TimerState::Running => return,
            TimerState::Idle | TimerState::Completed => clock.banked = self.inner.duration,
            TimerState::Paused => {}
        }

        let ticket = self.inner.generation.advance();
        let started_at = Instant::now();
        clock.state = TimerState::Running;
        clock.started_at = Some(started_at);
        if let Some(stale) = clock.task.take() {
            stale.abort();
        }

        let banked = clock.banked;
        debug!(?banked, "countdown running");
        let inner = Arc::clone(&self.inner);
        clock.task = Some(
            self.inner
                .runtime
                .spawn(run(inner, ticket, started_at, banked)),
        );
    }

    /// Freeze the countdown, banking the exact time left. No-op unless Running.
    pub fn pause(&self) {
        let mut clock = self.inner.lock();
        if clock.state != TimerState::Running {
            return;
        }

        let elapsed = clock.started_at.map_or(Duration::ZERO, |t| t.elapsed());
        clock.banked = clock.banked.saturating_sub(elapsed);
        clock.state = TimerState::Paused;
        clock.started_at = None;
        self.inner.generation.invalidate();
        if let Some(task) = clock.task.take() {
            task.abort();
        }
        debug!(banked = ?clock.banked, "countdown paused");
    }

    /// Cancel the countdown and restore the full duration. Always safe.
    pub fn stop(&self) {
        let mut clock = self.inner.lock();
        self.inner.generation.invalidate();
        clock.state = TimerState::Idle;
        clock.started_at = None;
        clock.banked = self.inner.duration;
        if let Some(task) = clock.task.take() {
            task.abort();
        }
    }

    /// Alias for [`Countdown::stop`]
    pub fn reset(&self) {
        self.stop();
    }

    /// Time left, never negative
    #[must_use]
    pub fn remaining(&self) -> Duration {
        let clock = self.inner.lock();
        match clock.state {
            TimerState::Idle => self.inner.duration,
            TimerState::Running => clock
                .banked
                .saturating_sub(clock.started_at.map_or(Duration::ZERO, |t| t.elapsed())),
            TimerState::Paused => clock.banked,
            TimerState::Completed => Duration::ZERO,
        }
    }
}

impl std::fmt::Debug for Countdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Countdown")
            .field("duration", &self.inner.duration)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Clock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Transition Running -> Completed and hand the completion callback to
    /// the blocking pool. Only the chain holding the live ticket gets here.
    fn finish(&self, ticket: &Ticket) {
        {
            let mut clock = self.lock();
            if !ticket.is_live() || clock.state != TimerState::Running {
                return;
            }
            clock.state = TimerState::Completed;
            clock.started_at = None;
            clock.banked = Duration::ZERO;
            clock.task = None;
        }
        debug!("countdown completed");

        let on_complete = Arc::clone(&self.on_complete);
        let ticket = ticket.clone();
        self.runtime.spawn_blocking(move || {
            if ticket.is_live() {
                on_complete();
            }
        });
    }
}

/// Tick loop for one running stretch of a countdown.
///
/// Tick boundaries are measured from `started_at`, not from the previous
/// wake-up.
async fn run(inner: Arc<Inner>, ticket: Ticket, started_at: Instant, banked: Duration) {
    let deadline = started_at + banked;
    let mut boundary = started_at;
    let mut remaining = banked;

    loop {
        if remaining.is_zero() {
            inner.finish(&ticket);
            return;
        }
        if !ticket.is_live() {
            return;
        }
        (inner.on_tick)(remaining);

        boundary += TICK;
        let now = Instant::now();
        while boundary <= now {
            boundary += TICK;
        }
        tokio::time::sleep_until(boundary.min(deadline)).await;
        remaining = deadline.saturating_duration_since(Instant::now());
    }
}
