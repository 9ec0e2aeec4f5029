//! Ringside - Interval timer for boxing workouts
//!
//! CLI entry point for the Ringside timer.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ringside::cli::{TerminalCues, TerminalDisplay};
use ringside::log::{JsonlLogger, WorkoutOutcome};
use ringside::timer::Orchestrator;
use ringside::workout::{Overrides, PeriodType, Tempo, WorkoutConfig};

const DEFAULT_CONFIG: &str = "workout.toml";

/// Interval timer for boxing workouts
///
/// Runs rounds of work and rest, announcing a combo for each round and
/// cueing its moves at the chosen tempo. Type p, r or q and Enter to
/// pause, resume or quit.
#[derive(Parser, Debug)]
#[command(name = "ringside", version, about)]
struct Cli {
    /// Path to the workout.toml file (built-in defaults if omitted and absent)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for the workout history (.ringside by default)
    #[arg(long, default_value = ".ringside")]
    log_dir: PathBuf,

    /// Number of rounds
    #[arg(long)]
    rounds: Option<u32>,

    /// Work period length in seconds
    #[arg(long = "work")]
    work_secs: Option<u64>,

    /// Rest period length in seconds
    #[arg(long = "rest")]
    rest_secs: Option<u64>,

    /// Combo cadence: slow, medium, fast or superfast
    #[arg(long)]
    tempo: Option<Tempo>,

    /// Do not ring the terminal bell on beeps
    #[arg(long)]
    no_bell: bool,
}

impl Cli {
    const fn overrides(&self) -> Overrides {
        Overrides {
            rounds: self.rounds,
            work_secs: self.work_secs,
            rest_secs: self.rest_secs,
            tempo: self.tempo,
        }
    }
}

/// A line typed on stdin while the workout runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Pause,
    Resume,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_lowercase().as_str() {
        "p" | "pause" => Some(Command::Pause),
        "r" | "resume" => Some(Command::Resume),
        "q" | "quit" | "stop" => Some(Command::Quit),
        _ => None,
    }
}

/// What a pause or resume command actually did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Applied {
    Paused,
    Resumed,
    Ignored,
}

/// Apply a pause or resume, judged by the state it leaves behind.
///
/// Pausing is a no-op while announcements play, so the result is read back
/// from the orchestrator rather than assumed.
fn apply_command(orchestrator: &Orchestrator, command: Command) -> Applied {
    let was_paused = orchestrator.is_paused();
    match command {
        Command::Pause if !was_paused => orchestrator.pause(),
        Command::Resume if was_paused => orchestrator.resume(),
        _ => return Applied::Ignored,
    }
    match (was_paused, orchestrator.is_paused()) {
        (false, true) => Applied::Paused,
        (true, false) => Applied::Resumed,
        _ => Applied::Ignored,
    }
}

/// Load the workout file, falling back to defaults when no path was given
/// and the default file does not exist.
fn load_config(explicit: Option<&Path>) -> Result<WorkoutConfig> {
    match explicit {
        Some(path) => WorkoutConfig::from_path(path)
            .with_context(|| format!("Failed to load config from '{}'", path.display())),
        None if Path::new(DEFAULT_CONFIG).exists() => WorkoutConfig::from_path(DEFAULT_CONFIG)
            .with_context(|| format!("Failed to load config from '{DEFAULT_CONFIG}'")),
        None => {
            info!("no {DEFAULT_CONFIG} found, using built-in defaults");
            Ok(WorkoutConfig::default())
        }
    }
}

/// Rounds whose work period had finished when the workout ended
const fn rounds_completed(round: u32, period: PeriodType, completed: bool, total: u32) -> u32 {
    if completed {
        return total;
    }
    match period {
        PeriodType::Rest => round,
        PeriodType::Work => round.saturating_sub(1),
    }
}

/// Forward stdin lines from a detached thread.
///
/// A blocking read cannot be cancelled, so it must not hold up runtime
/// shutdown once the workout is over.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Run the workout until it completes or the user quits.
async fn run_workout(orchestrator: &Orchestrator) -> Result<()> {
    let starter = {
        let orchestrator = orchestrator.clone();
        tokio::task::spawn_blocking(move || orchestrator.start())
    };
    tokio::pin!(starter);
    let mut starting = true;

    let mut commands = spawn_stdin_reader();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            started = &mut starter, if starting => {
                starting = false;
                started
                    .context("Workout start task failed")?
                    .context("Failed to start workout")?;
            }
            () = orchestrator.wait_for_completion() => return Ok(()),
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                return Ok(());
            }
            line = commands.recv(), if stdin_open => {
                match line {
                    None => stdin_open = false,
                    Some(line) => match parse_command(&line) {
                        Some(Command::Quit) => return Ok(()),
                        Some(command) => match apply_command(orchestrator, command) {
                            Applied::Paused => TerminalDisplay::print_paused(),
                            Applied::Resumed => TerminalDisplay::print_resumed(),
                            Applied::Ignored => {}
                        },
                        None => warn!(input = %line.trim(), "unknown command"),
                    },
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = load_config(cli.config.as_deref())?
        .with_overrides(&cli.overrides())
        .context("Invalid command-line override")?;
    let workout = Arc::new(config.build_workout()?);
    let logger = JsonlLogger::new(&cli.log_dir).context("Failed to initialize JSONL logger")?;

    let mut cues = TerminalCues::new(config.announce_duration());
    if cli.no_bell {
        cues = cues.without_bell();
    }
    let orchestrator = Orchestrator::new(
        Arc::clone(&workout),
        Arc::new(TerminalDisplay::new()),
        Arc::new(cues),
    );

    TerminalDisplay::print_header(&workout);
    let started_at = Instant::now();
    let result = run_workout(&orchestrator).await;

    let completed = orchestrator.is_complete();
    let done = rounds_completed(
        orchestrator.current_round(),
        orchestrator.current_period(),
        completed,
        workout.total_rounds(),
    );
    orchestrator.stop();
    result?;

    let outcome = WorkoutOutcome::new(&workout, done, completed, started_at.elapsed().as_secs());
    logger
        .append(&outcome)
        .context("Failed to write to JSONL log")?;
    TerminalDisplay::print_summary(&outcome);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringside::workout::{Workout, WorkoutSettings};
    use std::time::Duration;

    fn quiet_orchestrator() -> Orchestrator {
        let settings = WorkoutSettings {
            rounds: 1,
            work: Duration::from_secs(5),
            rest: Duration::from_secs(1),
            ..WorkoutSettings::default()
        };
        Orchestrator::new(
            Arc::new(Workout::build(settings, &[])),
            Arc::new(TerminalDisplay::new()),
            Arc::new(TerminalCues::new(Duration::ZERO).without_bell()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_before_start_is_not_reported() {
        let orchestrator = quiet_orchestrator();
        assert_eq!(apply_command(&orchestrator, Command::Pause), Applied::Ignored);
        assert_eq!(apply_command(&orchestrator, Command::Resume), Applied::Ignored);
        assert!(!orchestrator.is_paused());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_and_resume_are_reported_once() {
        let orchestrator = quiet_orchestrator();
        orchestrator.start().unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(apply_command(&orchestrator, Command::Pause), Applied::Paused);
        assert_eq!(apply_command(&orchestrator, Command::Pause), Applied::Ignored);
        assert_eq!(apply_command(&orchestrator, Command::Resume), Applied::Resumed);
        assert_eq!(apply_command(&orchestrator, Command::Resume), Applied::Ignored);
        orchestrator.stop();
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("p"), Some(Command::Pause));
        assert_eq!(parse_command(" Pause \n"), Some(Command::Pause));
        assert_eq!(parse_command("r"), Some(Command::Resume));
        assert_eq!(parse_command("resume"), Some(Command::Resume));
        assert_eq!(parse_command("q"), Some(Command::Quit));
        assert_eq!(parse_command("STOP"), Some(Command::Quit));
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("jab"), None);
    }

    #[test]
    fn test_rounds_completed_mid_work() {
        assert_eq!(rounds_completed(1, PeriodType::Work, false, 3), 0);
        assert_eq!(rounds_completed(3, PeriodType::Work, false, 3), 2);
    }

    #[test]
    fn test_rounds_completed_mid_rest() {
        assert_eq!(rounds_completed(2, PeriodType::Rest, false, 3), 2);
    }

    #[test]
    fn test_rounds_completed_not_started_or_finished() {
        assert_eq!(rounds_completed(0, PeriodType::Work, false, 3), 0);
        assert_eq!(rounds_completed(0, PeriodType::Work, true, 3), 3);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "ringside", "--rounds", "5", "--work", "90", "--rest", "20", "--tempo", "fast",
        ]);
        let overrides = cli.overrides();
        assert_eq!(overrides.rounds, Some(5));
        assert_eq!(overrides.work_secs, Some(90));
        assert_eq!(overrides.rest_secs, Some(20));
        assert_eq!(overrides.tempo, Some(Tempo::Fast));
        assert_eq!(cli.log_dir, PathBuf::from(".ringside"));
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_rejects_unknown_tempo() {
        assert!(Cli::try_parse_from(["ringside", "--tempo", "glacial"]).is_err());
    }

    #[test]
    fn test_load_config_missing_explicit_path_fails() {
        let err = load_config(Some(Path::new("/nonexistent/workout.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }

    #[test]
    fn test_load_config_explicit_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("w.toml");
        std::fs::write(&path, "[workout]\nrounds = 2\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.workout.rounds, 2);
    }
}
