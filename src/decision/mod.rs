//! Frame-driven decision loop
//!
//! The loop owns the state encoder and the tick cadence. Every `cadence`
//! frames it runs one decision tick to completion:
//!
//! ```text
//! Idle → Encode → Learn(previous) → Choose → Execute → Decay → Idle
//! ```
//!
//! The surrounding world is reached through [`CombatWorld`]. Learning for a
//! transition is deferred to the next tick, once its reward is known.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    context::{CombatAction, Context, ContextAction},
    encoder::{AgentVitals, EnemyView, StateEncoder, TerrainHints, ratio},
    error::{Error, Result},
    q_learning::{Priority, QLearningAgent},
    types::Observation,
};

/// Frames between decision ticks (0.25 s at 60 FPS).
pub const DEFAULT_CADENCE: u32 = 15;

/// What happened since the previous call to [`CombatWorld::take_outcome`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickOutcome {
    pub reward: f64,
    pub done: bool,
    pub damage_taken: f64,
}

/// Everything the encoder reads from the world.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatSnapshot {
    pub vitals: AgentVitals,
    pub enemies: Vec<EnemyView>,
    pub terrain: Option<TerrainHints>,
}

/// Port to the combat simulation driven by the decision loop.
pub trait CombatWorld {
    /// Current observables.
    fn snapshot(&self) -> CombatSnapshot;

    /// Drain the reward and damage accumulated since the last call.
    fn take_outcome(&mut self) -> TickOutcome;

    /// Apply an action; it stays in effect until the next one.
    fn execute(&mut self, action: CombatAction);
}

/// Whether recent-damage memory survives between encounters on one floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatMemory {
    #[default]
    PerFloor,
    PerEncounter,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    pub cadence: u32,
    pub priority: Priority,
    pub threat_memory: ThreatMemory,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            cadence: DEFAULT_CADENCE,
            priority: Priority::default(),
            threat_memory: ThreatMemory::default(),
        }
    }
}

/// Result of one decision tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub observation: Observation,
    pub action: CombatAction,
    /// The action came from a teaching override rather than the policy.
    pub taught: bool,
    pub reward: f64,
    pub done: bool,
    /// Q-value written by the deferred update, if one ran.
    pub updated_q: Option<f64>,
}

/// Outcome of a finished floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorSummary {
    pub floor: u32,
    pub cleared: bool,
    pub ticks: u64,
    pub cumulative_reward: f64,
    pub epsilon: f64,
    pub lessons: usize,
}

#[derive(Debug, Clone)]
pub struct DecisionLoop {
    encoder: StateEncoder,
    config: DecisionConfig,
    frame_counter: u32,
    taught: Option<CombatAction>,
    ticks: u64,
}

impl DecisionLoop {
    pub fn new(encoder: StateEncoder, config: DecisionConfig) -> Self {
        Self {
            encoder,
            config: DecisionConfig {
                cadence: config.cadence.max(1),
                ..config
            },
            frame_counter: 0,
            taught: None,
            ticks: 0,
        }
    }

    pub fn encoder(&self) -> &StateEncoder {
        &self.encoder
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    /// Decision ticks run since the floor began.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Fail unless the encoder's observations fit the agent's combat table.
    pub fn check_agent(&self, agent: &QLearningAgent) -> Result<()> {
        let expected = agent.shapes().combat;
        let got = self.encoder.arity();
        if expected == got {
            Ok(())
        } else {
            Err(Error::ArityMismatch { expected, got })
        }
    }

    /// Reset per-floor state in both the loop and the agent.
    pub fn begin_floor(&mut self, agent: &mut QLearningAgent) -> Result<()> {
        self.check_agent(agent)?;
        self.encoder.reset();
        agent.reset_episode();
        self.frame_counter = 0;
        self.taught = None;
        self.ticks = 0;
        Ok(())
    }

    /// Start a new encounter within the current floor.
    pub fn begin_encounter(&mut self) {
        if self.config.threat_memory == ThreatMemory::PerEncounter {
            self.encoder.reset();
        }
    }

    /// Override the policy's choice on the next tick.
    pub fn teach(&mut self, action: CombatAction) {
        self.taught = Some(action);
    }

    pub fn pending_teaching(&self) -> Option<CombatAction> {
        self.taught
    }

    /// Advance one frame; runs a tick when the cadence elapses.
    pub fn on_frame<W: CombatWorld>(
        &mut self,
        agent: &mut QLearningAgent,
        world: &mut W,
    ) -> Result<Option<TickReport>> {
        self.frame_counter += 1;
        if self.frame_counter < self.config.cadence {
            return Ok(None);
        }
        self.frame_counter = 0;
        self.tick(agent, world).map(Some)
    }

    /// Run one decision tick immediately.
    ///
    /// Nothing is executed in the world when the agent rejects the update or
    /// the observation.
    pub fn tick<W: CombatWorld>(
        &mut self,
        agent: &mut QLearningAgent,
        world: &mut W,
    ) -> Result<TickReport> {
        let snapshot = world.snapshot();
        let observation = self.encode(&snapshot);
        let outcome = world.take_outcome();

        let updated_q = if in_combat(agent) {
            agent.learn_from_last(outcome.reward, &observation, outcome.done)?
        } else {
            None
        };

        let (action, taught) = match self.taught.take() {
            Some(action) => {
                agent.record_taught_action(observation, action)?;
                (action, true)
            }
            None => {
                let hp_ratio = ratio(snapshot.vitals.hp, snapshot.vitals.max_hp);
                let action = agent.choose_action_with_priority(
                    &observation,
                    self.config.priority,
                    hp_ratio,
                )?;
                (action, false)
            }
        };
        world.execute(action);

        self.encoder.decay_damage();
        if outcome.damage_taken > 0.0 {
            self.encoder.record_damage(outcome.damage_taken);
        }
        self.ticks += 1;

        debug!(
            tick = self.ticks,
            %observation,
            action = action.name(),
            taught,
            reward = outcome.reward,
            "decision tick"
        );

        Ok(TickReport {
            observation,
            action,
            taught,
            reward: outcome.reward,
            done: outcome.done,
            updated_q,
        })
    }

    /// Close the floor: final terminal update, epsilon decay, and telemetry.
    pub fn end_floor<W: CombatWorld>(
        &mut self,
        agent: &mut QLearningAgent,
        world: &mut W,
        floor: u32,
        cleared: bool,
    ) -> Result<FloorSummary> {
        let snapshot = world.snapshot();
        let final_state = self.encode(&snapshot);
        let outcome = world.take_outcome();
        if in_combat(agent) {
            agent.learn_from_last(outcome.reward, &final_state, true)?;
        }

        agent.decay_epsilon();
        agent.record_battle(cleared);
        if cleared {
            agent.record_floor_cleared(floor);
        }

        self.frame_counter = 0;
        self.taught = None;

        let summary = FloorSummary {
            floor,
            cleared,
            ticks: self.ticks,
            cumulative_reward: agent.cumulative_reward(),
            epsilon: agent.epsilon(),
            lessons: agent.telemetry().lesson_count(),
        };
        debug!(?summary, "floor finished");
        Ok(summary)
    }

    fn encode(&self, snapshot: &CombatSnapshot) -> Observation {
        self.encoder
            .encode(&snapshot.vitals, &snapshot.enemies, snapshot.terrain.as_ref())
    }
}

fn in_combat(agent: &QLearningAgent) -> bool {
    agent
        .last_transition()
        .is_some_and(|transition| transition.context == Context::Combat)
}
