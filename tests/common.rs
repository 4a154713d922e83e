//! Shared fixtures for the climber test suite.
#![allow(dead_code)]

use climber::{
    BaseAction, CombatAction, MinigameAction, Observation, QLearningAgent,
    q_learning::{ContextShapes, Hyperparameters},
};

/// A combat observation in the extended layout.
pub fn combat_state(hp: u8, enemy: u8, threat: u8) -> Observation {
    Observation::from_array([hp, enemy, threat, 0, 0, 1, 0])
}

pub fn seeded_agent(seed: u64) -> QLearningAgent {
    QLearningAgent::new(Hyperparameters::default(), ContextShapes::default()).with_seed(seed)
}

/// Agent with entries in every context and non-trivial telemetry.
pub fn populated_agent() -> QLearningAgent {
    let mut agent = seeded_agent(7);

    for hp in 0..4u8 {
        for threat in 0..3u8 {
            let state = combat_state(hp, hp % 3, threat);
            agent.set_q_value(state, CombatAction::Attack, f64::from(hp) * 1.25 - f64::from(threat)).unwrap();
            agent.set_q_value(state, CombatAction::Run, 0.1 + f64::from(threat) / 3.0).unwrap();
        }
    }
    // Values that only survive a bit-exact float encoding.
    agent.set_q_value(combat_state(2, 1, 1), CombatAction::Charge, 0.1 + 0.2).unwrap();
    agent.set_q_value(combat_state(3, 2, 2), CombatAction::Charge, -1.0e-17).unwrap();

    agent.set_q_value(Observation::from_array([1, 0, 2]), BaseAction::TrainIntelligence, 4.5).unwrap();
    agent.set_q_value(Observation::from_array([0, 0, 0]), BaseAction::StartClimb, -2.0 / 3.0).unwrap();
    agent.set_q_value(Observation::from_array([1, 1, 0, 3]), MinigameAction::Press, 12.0).unwrap();

    let state = combat_state(0, 0, 2);
    agent.record_taught_action(state, CombatAction::Run).unwrap();
    agent.learn_from_last(30.0, &state, true).unwrap();
    agent.record_battle(true);
    agent.record_battle(false);
    agent.record_floor_cleared(3);
    agent.decay_epsilon();
    agent
}
