//! Terminal display for a running workout
//!
//! Renders timer updates as a single self-overwriting status line.
//! All output goes to stderr so stdout remains clean for piping.

use std::io::Write;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use colored::Colorize;

use crate::log::jsonl::WorkoutOutcome;
use crate::timer::sink::{format_clock, DisplaySink};
use crate::workout::model::{PeriodType, Workout};

/// Display handler for workout execution output
#[derive(Debug, Default)]
pub struct TerminalDisplay {
    total_rounds: AtomicU32,
}

impl TerminalDisplay {
    /// Create a new display handler
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Print the workout plan before the first announcement
    pub fn print_header(workout: &Workout) {
        let settings = workout.settings();
        eprintln!(
            "\n{} {}",
            "===".bold().cyan(),
            format!(
                "{} rounds | {} work | {} rest | {} tempo | {} total",
                workout.total_rounds(),
                format_clock(settings.work),
                format_clock(settings.rest),
                settings.tempo,
                format_clock(workout.total_duration())
            )
            .bold()
            .cyan()
        );
        for round in workout.rounds() {
            eprintln!("  {} {}", format!("Round {}:", round.number).dimmed(), round.combo);
        }
        eprintln!("  {}", "p = pause, r = resume, q = quit".dimmed());
        eprintln!("{}", "─".repeat(50).dimmed());
    }

    /// Note that the workout is paused
    pub fn print_paused() {
        eprintln!("\n  {}", "PAUSED".yellow().bold());
    }

    /// Note that the workout resumed
    pub fn print_resumed() {
        eprintln!("  {}", "RESUMED".green().bold());
    }

    /// Render the post-workout summary
    pub fn print_summary(outcome: &WorkoutOutcome) {
        eprintln!("\n{}", "─".repeat(50).dimmed());

        let status = if outcome.completed {
            "COMPLETED".green().bold().to_string()
        } else {
            "STOPPED".yellow().bold().to_string()
        };
        eprintln!("  {status} {}", summary_line(outcome));
        eprintln!();
    }

    fn total(&self) -> u32 {
        self.total_rounds.load(Ordering::Relaxed)
    }
}

impl DisplaySink for TerminalDisplay {
    fn on_workout_start(&self, total_rounds: u32) {
        self.total_rounds.store(total_rounds, Ordering::Relaxed);
    }

    fn on_period_start(&self, period: PeriodType, round: u32, duration: Duration) {
        let label = match period {
            PeriodType::Work => period.label().red().bold(),
            PeriodType::Rest => period.label().green().bold(),
        };
        eprintln!(
            "\n  {label} {} {}",
            format!("round {round}/{}", self.total()).bold(),
            format!("({})", format_clock(duration)).dimmed()
        );
    }

    fn on_timer_update(&self, remaining: Duration, period: PeriodType, round: u32) {
        let line = timer_line(period, round, self.total(), remaining);
        let mut stderr = std::io::stderr().lock();
        // A closed stderr is not worth interrupting the workout over
        let _ = write!(stderr, "\r  {line}  ");
        let _ = stderr.flush();
    }

    fn on_period_end(&self, period: PeriodType, round: u32) {
        eprintln!("\r  {} {}", period_end_line(period, round), "✓".green());
    }

    fn on_workout_complete(&self) {
        eprintln!("\n  {}", "WORKOUT COMPLETE".green().bold());
    }
}

/// Status line shown while a period runs, e.g. `WORK  2/3  1:05`
fn timer_line(period: PeriodType, round: u32, total: u32, remaining: Duration) -> String {
    format!(
        "{:<4}  {round}/{total}  {}",
        period.label(),
        format_clock(remaining)
    )
}

fn period_end_line(period: PeriodType, round: u32) -> String {
    match period {
        PeriodType::Work => format!("Round {round} done"),
        PeriodType::Rest => format!("Rest after round {round} done"),
    }
}

fn summary_line(outcome: &WorkoutOutcome) -> String {
    let mins = outcome.elapsed_secs / 60;
    let secs = outcome.elapsed_secs % 60;
    format!(
        "{}/{} rounds | {} tempo | {mins}m {secs}s",
        outcome.rounds_completed, outcome.total_rounds, outcome.tempo
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::model::{Tempo, WorkoutSettings};
    use chrono::Utc;

    fn outcome(completed: bool) -> WorkoutOutcome {
        WorkoutOutcome {
            timestamp: Utc::now(),
            completed,
            rounds_completed: 2,
            total_rounds: 3,
            work_secs: 180,
            rest_secs: 60,
            tempo: Tempo::Fast,
            elapsed_secs: 425,
        }
    }

    #[test]
    fn test_timer_line() {
        let line = timer_line(PeriodType::Work, 2, 3, Duration::from_secs(65));
        assert_eq!(line, "WORK  2/3  1:05");

        let line = timer_line(PeriodType::Rest, 1, 12, Duration::from_millis(2_600));
        assert_eq!(line, "REST  1/12  0:03");
    }

    #[test]
    fn test_period_end_line() {
        assert_eq!(period_end_line(PeriodType::Work, 3), "Round 3 done");
        assert_eq!(
            period_end_line(PeriodType::Rest, 1),
            "Rest after round 1 done"
        );
    }

    #[test]
    fn test_summary_line() {
        assert_eq!(summary_line(&outcome(false)), "2/3 rounds | fast tempo | 7m 5s");
    }

    #[test]
    fn test_total_rounds_recorded_on_start() {
        let display = TerminalDisplay::new();
        assert_eq!(display.total(), 0);
        display.on_workout_start(4);
        assert_eq!(display.total(), 4);
    }

    // Rendering must never panic, whatever the sequence of calls
    #[test]
    fn test_render_all_callbacks_no_panic() {
        let display = TerminalDisplay::new();
        let workout = Workout::build(WorkoutSettings::default(), &[]);

        TerminalDisplay::print_header(&workout);
        display.on_workout_start(1);
        display.on_period_start(PeriodType::Work, 1, Duration::from_secs(180));
        display.on_timer_update(Duration::from_secs(180), PeriodType::Work, 1);
        TerminalDisplay::print_paused();
        TerminalDisplay::print_resumed();
        display.on_period_end(PeriodType::Work, 1);
        display.on_period_start(PeriodType::Rest, 1, Duration::ZERO);
        display.on_timer_update(Duration::ZERO, PeriodType::Rest, 1);
        display.on_period_end(PeriodType::Rest, 1);
        display.on_workout_complete();
        TerminalDisplay::print_summary(&outcome(true));
        TerminalDisplay::print_summary(&outcome(false));
    }
}
