//! Save/load of learned tables through every repository adapter

mod common;

use std::{fs, path::Path};

use climber::{
    CombatAction, Context, Error, Observation,
    adapters::{InMemoryRepository, JsonRepository, MsgPackRepository},
    app::{AgentConfig, App},
    encoder::EncoderVariant,
    ports::AgentRepository,
    q_learning::{ContextShapes, Hyperparameters, QLearningAgent, SavedAgent},
};
use common::{populated_agent, seeded_agent};
use tempfile::TempDir;

fn assert_same_knowledge(a: &QLearningAgent, b: &QLearningAgent) {
    for context in Context::ALL {
        assert_eq!(a.table(context), b.table(context), "{context} table differs");
    }
    assert_eq!(a.telemetry(), b.telemetry());
    assert_eq!(a.epsilon(), b.epsilon());
}

fn round_trip(repo: &dyn AgentRepository, path: &Path) -> QLearningAgent {
    let agent = populated_agent();
    repo.save(&SavedAgent::from_agent(&agent), path).unwrap();
    assert!(repo.exists(path));

    let (restored, report) = repo
        .load(path)
        .unwrap()
        .into_agent(Hyperparameters::default(), ContextShapes::default())
        .unwrap();
    assert!(report.is_clean());
    assert_same_knowledge(&agent, &restored);
    restored
}

#[test]
fn test_json_round_trip_is_exact() {
    let dir = TempDir::new().unwrap();
    let restored = round_trip(&JsonRepository::new(), &dir.path().join("nested/agent.json"));
    assert_eq!(restored.telemetry().battles_won, 1);
    assert_eq!(restored.telemetry().highest_floor, 3);
}

#[test]
fn test_msgpack_round_trip_is_exact() {
    let dir = TempDir::new().unwrap();
    round_trip(&MsgPackRepository::new(), &dir.path().join("agent.msgpack"));
}

#[test]
fn test_in_memory_round_trip_is_exact() {
    round_trip(&InMemoryRepository::new(), Path::new("slot"));
}

#[test]
fn test_json_document_is_human_readable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("agent.json");
    JsonRepository::new()
        .save(&SavedAgent::from_agent(&populated_agent()), &path)
        .unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(doc["version"], 1);
    assert_eq!(doc["base"]["(1, 0, 2):1"], 4.5);
    assert_eq!(doc["minigame"]["(1, 1, 0, 3):0"], 12.0);
    assert!(doc["telemetry"]["total_battles"].is_u64());
}

#[test]
fn test_hand_edited_file_with_bad_key_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("agent.json");
    fs::write(
        &path,
        r#"{ "version": 1, "epsilon": 0.5, "combat": { "(0, 0, 0, 0):0": 1.0, "zero:0": 2.0 } }"#,
    )
    .unwrap();

    let saved = JsonRepository::new().load(&path).unwrap();
    let err = saved
        .into_agent(Hyperparameters::default(), ContextShapes::default())
        .unwrap_err();
    assert!(matches!(err, Error::MalformedKey { .. }), "{err}");
}

#[test]
fn test_truncated_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("agent.json");
    fs::write(&path, r#"{ "version": 1, "epsilon": "#).unwrap();
    assert!(JsonRepository::new().load(&path).is_err());
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = JsonRepository::new()
        .load(&dir.path().join("absent.json"))
        .unwrap_err();
    assert!(matches!(err, Error::Io { .. }), "{err}");
}

#[test]
fn test_app_discards_combat_table_after_variant_change() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("agent.json");
    let app = App::new();

    let agent = populated_agent();
    app.save_agent(&agent, &path).unwrap();

    let basic = AgentConfig::new().with_variant(EncoderVariant::Basic);
    let (restored, report) = app.load_agent(&path, &basic).unwrap();
    assert_eq!(report.discarded, vec![Context::Combat]);
    assert!(restored.table(Context::Combat).is_empty());
    assert_eq!(restored.table(Context::Combat).arity(), 4);
    assert_eq!(restored.table(Context::Base), agent.table(Context::Base));
    assert_eq!(restored.telemetry(), agent.telemetry());
}

#[test]
fn test_load_or_create_prefers_existing_save() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("agent.json");
    let app = App::for_testing().with_default_seed(11).build();
    let config = AgentConfig::new();

    let (fresh, _) = app.load_or_create_agent(&path, &config).unwrap();
    assert!(fresh.table(Context::Combat).is_empty());

    app.save_agent(&populated_agent(), &path).unwrap();
    let (loaded, report) = app.load_or_create_agent(&path, &config).unwrap();
    assert!(report.is_clean());
    assert!(!loaded.table(Context::Combat).is_empty());
    assert_eq!(loaded.rng_seed(), Some(11));
}

#[test]
fn test_wrong_arity_learning_cannot_corrupt_a_save() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("agent.json");
    let repo = JsonRepository::new();

    let mut agent = populated_agent();
    let before = agent.table(Context::Combat).clone();
    let short = Observation::from_array([0, 0, 1, 1]);
    let err = agent
        .learn(&short, CombatAction::Attack, 5.0, &short, false)
        .unwrap_err();
    assert!(matches!(err, Error::ArityMismatch { expected: 7, got: 4 }));

    repo.save(&SavedAgent::from_agent(&agent), &path).unwrap();
    let (restored, report) = repo
        .load(&path)
        .unwrap()
        .into_agent(Hyperparameters::default(), ContextShapes::default())
        .unwrap();
    assert!(report.is_clean());
    assert_eq!(restored.table(Context::Combat), &before);
}

#[test]
fn test_non_finite_reward_cannot_corrupt_a_save() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("agent.json");
    let repo = JsonRepository::new();

    let mut agent = seeded_agent(9);
    let state = Observation::from_array([0, 0, 1, 1, 0, 0, 0]);
    agent.learn(&state, CombatAction::Run, 2.0, &state, true).unwrap();
    assert!(agent.learn(&state, CombatAction::Attack, f64::NAN, &state, true).is_err());

    repo.save(&SavedAgent::from_agent(&agent), &path).unwrap();
    assert!(!fs::read_to_string(&path).unwrap().contains("null"));
    let (restored, _) = repo
        .load(&path)
        .unwrap()
        .into_agent(Hyperparameters::default(), ContextShapes::default())
        .unwrap();
    assert_eq!(restored.table(Context::Combat).size(), 1);
}
