//! Tests for the headless training pipeline

mod common;

use std::{
    fs,
    sync::{Arc, Mutex},
};

use climber::{
    Context,
    app::{AgentConfig, App},
    decision::FloorSummary,
    pipeline::{FloorRecord, JsonlObserver, MilestoneObserver, Observer, TrainingConfig, TrainingPipeline},
    q_learning::StatsSummary,
};
use tempfile::TempDir;

/// Records every floor summary for inspection after the run.
#[derive(Clone, Default)]
struct Recorder {
    floors: Arc<Mutex<Vec<(usize, FloorSummary)>>>,
    starts: Arc<Mutex<Vec<u32>>>,
    finished: Arc<Mutex<Option<StatsSummary>>>,
}

impl Observer for Recorder {
    fn on_floor_start(&mut self, _attempt: usize, floor: u32) -> climber::Result<()> {
        self.starts.lock().unwrap().push(floor);
        Ok(())
    }

    fn on_floor_end(&mut self, attempt: usize, summary: &FloorSummary) -> climber::Result<()> {
        self.floors.lock().unwrap().push((attempt, summary.clone()));
        Ok(())
    }

    fn on_training_end(&mut self, stats: &StatsSummary) -> climber::Result<()> {
        *self.finished.lock().unwrap() = Some(stats.clone());
        Ok(())
    }
}

fn run(seed: u64, attempts: usize) -> (climber::pipeline::TrainingResult, Recorder, climber::QLearningAgent) {
    let app = App::new();
    let config = AgentConfig::new().with_seed(seed);
    let mut agent = app.create_agent(&config).unwrap();
    let mut dl = app.create_decision_loop(&config);
    let recorder = Recorder::default();

    let mut pipeline = TrainingPipeline::new(TrainingConfig {
        attempts,
        ..TrainingConfig::default()
    })
    .with_observer(Box::new(recorder.clone()));

    let result = pipeline.run(&mut agent, &mut dl).unwrap();
    (result, recorder, agent)
}

#[test]
fn test_basic_training_run() {
    let (result, recorder, agent) = run(42, 10);

    assert_eq!(result.attempts, 10);
    assert_eq!(result.cleared + result.failed, 10);
    assert!((0.0..=1.0).contains(&result.clear_rate));
    assert_eq!(recorder.floors.lock().unwrap().len(), 10);
    assert!(recorder.finished.lock().unwrap().is_some());

    assert_eq!(agent.telemetry().total_battles, 10);
    assert_eq!(agent.telemetry().floors_cleared, result.cleared as u64);
    assert!(!agent.table(Context::Combat).is_empty());
    assert!((result.final_epsilon - 0.995f64.powi(10)).abs() < 1e-12);
    assert!((0.0..=100.0).contains(&result.intelligence_score));
}

#[test]
fn test_floors_advance_only_on_clear() {
    let (result, recorder, _) = run(7, 15);
    let starts = recorder.starts.lock().unwrap();
    let floors = recorder.floors.lock().unwrap();

    for window in floors.windows(2) {
        let ((_, previous), (_, next)) = (&window[0], &window[1]);
        let expected = if previous.cleared { previous.floor + 1 } else { previous.floor };
        assert_eq!(next.floor, expected);
    }
    assert_eq!(starts.first(), Some(&1));
    assert_eq!(result.next_floor, 1 + result.cleared as u32);
}

#[test]
fn test_same_seed_same_run() {
    let (a, _, agent_a) = run(99, 5);
    let (b, _, agent_b) = run(99, 5);

    assert_eq!(a.cleared, b.cleared);
    assert_eq!(a.highest_floor, b.highest_floor);
    assert_eq!(agent_a.table(Context::Combat), agent_b.table(Context::Combat));
}

#[test]
fn test_jsonl_observer_writes_one_line_per_floor() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("trace.jsonl");

    let app = App::new();
    let config = AgentConfig::new().with_seed(3);
    let mut agent = app.create_agent(&config).unwrap();
    let mut dl = app.create_decision_loop(&config);
    let mut pipeline = TrainingPipeline::new(TrainingConfig {
        attempts: 3,
        ..TrainingConfig::default()
    })
    .with_observer(Box::new(JsonlObserver::new(&path).unwrap()))
    .with_observer(Box::new(MilestoneObserver::new()));
    pipeline.run(&mut agent, &mut dl).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let records: Vec<FloorRecord> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 3);
    for (attempt, record) in records.iter().enumerate() {
        assert_eq!(record.attempt, attempt);
        assert!(!record.decisions.is_empty());
        assert!(record.decisions[0].updated_q.is_none());
        assert!(record.decisions.iter().all(|d| d.state.starts_with('(')));
    }
}

#[test]
fn test_zero_attempts() {
    let (result, recorder, agent) = run(1, 0);
    assert_eq!(result.attempts, 0);
    assert_eq!(result.clear_rate, 0.0);
    assert!(recorder.floors.lock().unwrap().is_empty());
    assert_eq!(agent.telemetry().total_learning_updates, 0);
}
