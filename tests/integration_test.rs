#![allow(missing_docs)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use tokio::time::{sleep, timeout, Instant};

use ringside::log::{JsonlLogger, WorkoutOutcome};
use ringside::timer::{CueFrame, CueSink, DisplaySink, Orchestrator};
use ringside::workout::{Combo, Move, Overrides, PeriodType, Stance, Tempo, WorkoutConfig};

const TEST_CONFIG: &str = r#"
[workout]
rounds = 2
work_secs = 3
rest_secs = 2
tempo = "fast"
stance = "southpaw"
move_millis = 300

[[combo]]
moves = ["jab", "cross", "lead-hook"]

[[combo]]
moves = ["1", "2", "slip"]
"#;

/// Journal of everything the orchestrator told its sinks
#[derive(Default)]
struct Journal {
    lines: Mutex<Vec<String>>,
    frames: Mutex<Vec<CueFrame>>,
}

impl Journal {
    fn push(&self, line: String) {
        self.lines.lock().unwrap().push(line);
    }

    fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    fn count(&self, wanted: &str) -> usize {
        self.lines().iter().filter(|l| *l == wanted).count()
    }

    fn frames(&self) -> Vec<CueFrame> {
        self.frames.lock().unwrap().clone()
    }
}

impl DisplaySink for Journal {
    fn on_workout_start(&self, total_rounds: u32) {
        self.push(format!("workout-start {total_rounds}"));
    }

    fn on_period_start(&self, period: PeriodType, round: u32, duration: Duration) {
        self.push(format!("start {period} {round} {}ms", duration.as_millis()));
    }

    fn on_timer_update(&self, remaining: Duration, period: PeriodType, round: u32) {
        self.push(format!("tick {period} {round} {}ms", remaining.as_millis()));
    }

    fn on_period_end(&self, period: PeriodType, round: u32) {
        self.push(format!("end {period} {round}"));
    }

    fn on_workout_complete(&self) {
        self.push("workout-complete".to_string());
    }
}

impl CueSink for Journal {
    fn play_workout_start(&self) {}

    fn play_period_transition(&self, _period: PeriodType) {}

    fn play_round_callout(&self, round: u32, total: u32) {
        self.push(format!("callout {round}/{total}"));
    }

    fn play_combo_callout(&self, combo: &Combo, stance: Stance) {
        self.push(format!("combo {combo} ({stance})"));
    }

    fn play_beep(&self) {
        self.push("beep".to_string());
    }

    fn play_workout_complete(&self) {}

    fn stop(&self) {}

    fn show_frame(&self, frame: CueFrame) {
        self.frames.lock().unwrap().push(frame);
    }
}

fn run(config: &WorkoutConfig) -> (Orchestrator, Arc<Journal>) {
    let workout = Arc::new(config.build_workout().unwrap());
    let journal = Arc::new(Journal::default());
    let orchestrator = Orchestrator::new(workout, journal.clone(), journal.clone());
    (orchestrator, journal)
}

/// Integration test: config file → workout → full run → history entry.
#[tokio::test(start_paused = true)]
async fn test_configured_workout_end_to_end() {
    let config = WorkoutConfig::parse(TEST_CONFIG).unwrap();
    let temp_dir = TempDir::new().unwrap();
    let logger = JsonlLogger::new(temp_dir.path()).unwrap();

    let (orchestrator, journal) = run(&config);
    let started = Instant::now();
    orchestrator.start().unwrap();
    timeout(Duration::from_secs(60), orchestrator.wait_for_completion())
        .await
        .expect("workout did not complete");

    // 2 × (3s work + 2s rest)
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(10), "took {elapsed:?}");
    assert!(elapsed < Duration::from_secs(12), "took {elapsed:?}");

    let lines = journal.lines();
    assert_eq!(lines.first().map(String::as_str), Some("workout-start 2"));
    assert_eq!(lines.last().map(String::as_str), Some("workout-complete"));
    assert_eq!(journal.count("combo jab, cross, lead hook (southpaw)"), 1);
    assert_eq!(journal.count("combo jab, cross, slip (southpaw)"), 1);
    assert_eq!(journal.count("callout 2/2"), 1);
    for round in 1..=2 {
        assert_eq!(journal.count(&format!("end WORK {round}")), 1);
        assert_eq!(journal.count(&format!("end REST {round}")), 1);
        assert_eq!(journal.count(&format!("tick WORK {round} 3000ms")), 1);
    }

    // Every cycle throws the combo in order
    let moves: Vec<Move> = journal
        .frames()
        .into_iter()
        .filter_map(|frame| match frame {
            CueFrame::Move { mv, .. } => Some(mv),
            _ => None,
        })
        .collect();
    assert!(moves.starts_with(&[Move::Jab, Move::Cross, Move::LeadHook]));

    let outcome = WorkoutOutcome::new(orchestrator.workout(), 2, true, elapsed.as_secs());
    logger.append(&outcome).unwrap();
    let history = logger.read_all().unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].completed);
    assert_eq!(history[0].tempo, Tempo::Fast);
    assert_eq!(history[0].work_secs, 3);
}

#[tokio::test(start_paused = true)]
async fn test_overrides_shape_the_run() {
    let config = WorkoutConfig::parse(TEST_CONFIG)
        .unwrap()
        .with_overrides(&Overrides {
            rounds: Some(1),
            work_secs: Some(2),
            rest_secs: Some(0),
            tempo: Some(Tempo::Superfast),
        })
        .unwrap();

    let (orchestrator, journal) = run(&config);
    orchestrator.start().unwrap();
    timeout(Duration::from_secs(60), orchestrator.wait_for_completion())
        .await
        .expect("workout did not complete");

    assert_eq!(journal.count("start WORK 1 2000ms"), 1);
    assert_eq!(journal.count("start REST 1 0ms"), 1);
    assert_eq!(journal.count("callout 1/1"), 1);
    assert_eq!(journal.count("workout-complete"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_pause_extends_the_workout() {
    let config = WorkoutConfig::parse(TEST_CONFIG)
        .unwrap()
        .with_overrides(&Overrides {
            rounds: Some(1),
            ..Overrides::default()
        })
        .unwrap();

    let (orchestrator, _journal) = run(&config);
    let started = Instant::now();
    orchestrator.start().unwrap();

    sleep(Duration::from_millis(1500)).await;
    orchestrator.pause();
    assert!(orchestrator.is_paused());
    let frozen = orchestrator.remaining_time();

    sleep(Duration::from_secs(10)).await;
    assert_eq!(orchestrator.remaining_time(), frozen);
    assert!(!orchestrator.is_complete());

    orchestrator.resume();
    assert!(!orchestrator.is_paused());
    timeout(Duration::from_secs(60), orchestrator.wait_for_completion())
        .await
        .expect("workout did not complete");

    // 3s work + 2s rest + 10s paused
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(15), "took {elapsed:?}");
    assert!(elapsed < Duration::from_secs(17), "took {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_stop_mid_workout_goes_quiet() {
    let config = WorkoutConfig::parse(TEST_CONFIG).unwrap();
    let (orchestrator, journal) = run(&config);
    orchestrator.start().unwrap();

    sleep(Duration::from_millis(4500)).await;
    assert_eq!(orchestrator.current_round(), 1);
    assert_eq!(orchestrator.current_period(), PeriodType::Rest);

    orchestrator.stop();
    let recorded = journal.lines().len();
    let frames = journal.frames().len();
    sleep(Duration::from_secs(30)).await;

    assert_eq!(journal.lines().len(), recorded);
    assert_eq!(journal.frames().len(), frames);
    assert_eq!(orchestrator.current_round(), 0);
    assert!(!orchestrator.is_complete());
    assert_eq!(journal.count("workout-complete"), 0);
}

#[test]
fn test_invalid_config_rejected() {
    let err = WorkoutConfig::parse("[workout]\nrounds = 0\n").unwrap_err();
    assert!(err.to_string().contains("rounds"));

    let err = WorkoutConfig::parse("[[combo]]\nmoves = [\"haymaker\"]\n").unwrap_err();
    assert!(format!("{err:#}").contains("haymaker"));
}
