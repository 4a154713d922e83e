//! Multi-context Q-learning agent
//!
//! One agent owns a Q-table per decision context, the exploration schedule,
//! the single in-flight transition used for deferred updates, and the
//! telemetry derived from learning.

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    context::{Context, ContextAction},
    error::{Error, Result},
    q_learning::{
        priority::Priority,
        q_table::QTable,
        telemetry::{IntelligenceInputs, IntelligenceTier, Telemetry, combat_lesson},
    },
    types::Observation,
};

/// Minimum absolute combat Q-value change that triggers a lesson check.
pub const LESSON_DELTA: f64 = 5.0;

/// Learning-rate, discount, and exploration schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    /// Learning rate before the intelligence modifier.
    pub base_alpha: f64,
    /// Discount factor γ
    pub gamma: f64,
    /// Initial exploration rate
    pub epsilon_start: f64,
    /// Floor for exploration decay
    pub epsilon_min: f64,
    /// Multiplicative decay per completed episode
    pub epsilon_decay: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            base_alpha: 0.1,
            gamma: 0.95,
            epsilon_start: 1.0,
            epsilon_min: 0.05,
            epsilon_decay: 0.995,
        }
    }
}

/// Observation arity of each context's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextShapes {
    pub combat: usize,
    pub base: usize,
    pub minigame: usize,
}

impl Default for ContextShapes {
    fn default() -> Self {
        Self {
            combat: 7,
            base: 3,
            minigame: 4,
        }
    }
}

impl ContextShapes {
    pub fn arity(&self, context: Context) -> usize {
        match context {
            Context::Combat => self.combat,
            Context::Base => self.base,
            Context::Minigame => self.minigame,
        }
    }
}

/// The most recent decision, kept until its outcome is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub state: Observation,
    pub context: Context,
    pub action: u8,
}

#[derive(Debug, Clone)]
struct ContextTables {
    combat: QTable,
    base: QTable,
    minigame: QTable,
}

impl ContextTables {
    fn new(shapes: &ContextShapes) -> Self {
        Self {
            combat: QTable::new(shapes.combat),
            base: QTable::new(shapes.base),
            minigame: QTable::new(shapes.minigame),
        }
    }

    fn get(&self, context: Context) -> &QTable {
        match context {
            Context::Combat => &self.combat,
            Context::Base => &self.base,
            Context::Minigame => &self.minigame,
        }
    }

    fn get_mut(&mut self, context: Context) -> &mut QTable {
        match context {
            Context::Combat => &mut self.combat,
            Context::Base => &mut self.base,
            Context::Minigame => &mut self.minigame,
        }
    }
}

fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Telemetry snapshot with the derived intelligence tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total_battles: u64,
    pub battles_won: u64,
    pub win_rate: f64,
    pub floors_cleared: u64,
    pub highest_floor: u32,
    pub total_learning_updates: u64,
    pub player_taught_actions: u64,
    pub combat_entries: usize,
    pub base_entries: usize,
    pub minigame_entries: usize,
    pub epsilon: f64,
    pub alpha: f64,
    pub cumulative_reward: f64,
    pub intelligence_score: f64,
    pub intelligence_tier: IntelligenceTier,
    pub lessons: Vec<String>,
}

/// Q-learning agent (off-policy TD control) over several contexts
///
/// Learns Q* per context by always bootstrapping from the best next-state
/// value, regardless of the action actually taken next.
#[derive(Debug, Clone)]
pub struct QLearningAgent {
    tables: ContextTables,
    shapes: ContextShapes,
    hyperparameters: Hyperparameters,
    alpha: f64,
    epsilon: f64,
    last: Option<Transition>,
    last_reward: f64,
    cumulative_reward: f64,
    telemetry: Telemetry,
    rng: StdRng,
    rng_seed: Option<u64>,
}

impl QLearningAgent {
    /// Create an agent with empty tables of the given shapes
    pub fn new(hyperparameters: Hyperparameters, shapes: ContextShapes) -> Self {
        Self {
            tables: ContextTables::new(&shapes),
            shapes,
            hyperparameters,
            alpha: hyperparameters.base_alpha,
            epsilon: hyperparameters.epsilon_start,
            last: None,
            last_reward: 0.0,
            cumulative_reward: 0.0,
            telemetry: Telemetry::new(),
            rng: build_rng(None),
            rng_seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.set_rng_seed(seed);
        self
    }

    /// Reseed the exploration and tie-break stream.
    pub fn set_rng_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.rng_seed = Some(seed);
    }

    pub fn rng_seed(&self) -> Option<u64> {
        self.rng_seed
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    pub fn shapes(&self) -> &ContextShapes {
        &self.shapes
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn gamma(&self) -> f64 {
        self.hyperparameters.gamma
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Override the exploration rate, e.g. to evaluate greedily.
    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }

    pub fn table(&self, context: Context) -> &QTable {
        self.tables.get(context)
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn q_value<A: ContextAction>(&self, state: &Observation, action: A) -> f64 {
        self.tables.get(A::CONTEXT).get(state, action.index())
    }

    pub fn set_q_value<A: ContextAction>(
        &mut self,
        state: Observation,
        action: A,
        value: f64,
    ) -> Result<()> {
        self.tables.get_mut(A::CONTEXT).set(state, action.index(), value)
    }

    /// Q-values of every action of `A`'s context at `state`.
    pub fn q_values<A: ContextAction>(&self, state: &Observation) -> Vec<(A, f64)> {
        let table = self.tables.get(A::CONTEXT);
        A::ALL
            .iter()
            .map(|&action| (action, table.get(state, action.index())))
            .collect()
    }

    /// ε-greedy action selection
    ///
    /// Explores uniformly with probability ε; otherwise picks uniformly among
    /// all actions sharing the highest Q-value. The choice becomes the
    /// in-flight transition. Fails with [`Error::ArityMismatch`] when `state`
    /// does not fit the context's table.
    pub fn choose_action<A: ContextAction>(&mut self, state: &Observation) -> Result<A> {
        self.select(state, |_| 0.0)
    }

    /// ε-greedy selection with a priority overlay on the exploited values.
    ///
    /// The bias only affects this decision; stored Q-values are untouched.
    pub fn choose_action_with_priority<A: ContextAction>(
        &mut self,
        state: &Observation,
        priority: Priority,
        hp_ratio: f64,
    ) -> Result<A> {
        self.select(state, |action: A| priority.bias(action.stance(), hp_ratio))
    }

    fn select<A: ContextAction>(
        &mut self,
        state: &Observation,
        bias: impl Fn(A) -> f64,
    ) -> Result<A> {
        self.tables.get(A::CONTEXT).check_arity(state)?;
        let actions = A::ALL;
        let action = if self.rng.random::<f64>() < self.epsilon {
            // Explore: random action
            actions[self.rng.random_range(0..actions.len())]
        } else {
            // Exploit: uniform among the best actions
            let table = self.tables.get(A::CONTEXT);
            let scored: Vec<(A, f64)> = actions
                .iter()
                .map(|&action| (action, table.get(state, action.index()) + bias(action)))
                .collect();
            let best = scored
                .iter()
                .map(|(_, q)| *q)
                .fold(f64::NEG_INFINITY, f64::max);
            let ties: Vec<A> = scored
                .iter()
                .filter(|(_, q)| *q == best)
                .map(|(action, _)| *action)
                .collect();
            match ties.len() {
                0 => actions[0],
                1 => ties[0],
                n => ties[self.rng.random_range(0..n)],
            }
        };

        trace!(context = %A::CONTEXT, %state, action = action.name(), "chose action");
        self.remember(*state, A::CONTEXT, action.index());
        Ok(action)
    }

    /// Record an externally supplied action as the one actually taken.
    ///
    /// Used when the player overrides the policy; the next update learns
    /// against this action.
    pub fn record_taught_action<A: ContextAction>(
        &mut self,
        state: Observation,
        action: A,
    ) -> Result<()> {
        self.tables.get(A::CONTEXT).check_arity(&state)?;
        self.remember(state, A::CONTEXT, action.index());
        self.telemetry.player_taught_actions += 1;
        Ok(())
    }

    fn remember(&mut self, state: Observation, context: Context, action: u8) {
        self.last = Some(Transition {
            state,
            context,
            action,
        });
    }

    /// Q-learning update for one transition. Returns the new Q-value.
    ///
    /// Observations of the wrong arity and non-finite rewards are rejected
    /// before anything is written or counted.
    pub fn learn<A: ContextAction>(
        &mut self,
        state: &Observation,
        action: A,
        reward: f64,
        next_state: &Observation,
        done: bool,
    ) -> Result<f64> {
        self.learn_index(A::CONTEXT, state, action.index(), reward, next_state, done)
    }

    /// Apply the deferred update for the in-flight transition, if any.
    pub fn learn_from_last(
        &mut self,
        reward: f64,
        next_state: &Observation,
        done: bool,
    ) -> Result<Option<f64>> {
        let Some(Transition {
            state,
            context,
            action,
        }) = self.last
        else {
            return Ok(None);
        };
        self.learn_index(context, &state, action, reward, next_state, done)
            .map(Some)
    }

    fn learn_index(
        &mut self,
        context: Context,
        state: &Observation,
        action: u8,
        reward: f64,
        next_state: &Observation,
        done: bool,
    ) -> Result<f64> {
        if !context.is_valid_action(action) {
            return Err(Error::InvalidAction {
                context,
                index: i64::from(action),
            });
        }
        if !reward.is_finite() {
            return Err(Error::NonFiniteValue { value: reward });
        }

        let action_count = context.action_count() as u8;
        let (old_q, new_q) = self.tables.get_mut(context).q_learning_update(
            *state,
            action,
            reward,
            next_state,
            0..action_count,
            done,
            self.alpha,
            self.hyperparameters.gamma,
        )?;

        self.telemetry.total_learning_updates += 1;
        self.last_reward = reward;
        self.cumulative_reward += reward;

        if context == Context::Combat && (new_q - old_q).abs() > LESSON_DELTA {
            let lesson = combat_lesson(context.action_name(action), state.get(0), new_q, reward);
            if let Some(lesson) = lesson {
                debug!(%lesson, old_q, new_q, reward, "lesson candidate");
                self.telemetry.record_lesson(lesson);
            }
        }

        Ok(new_q)
    }

    pub fn last_transition(&self) -> Option<Transition> {
        self.last
    }

    /// The in-flight action, if it belongs to `A`'s context.
    pub fn last_action<A: ContextAction>(&self) -> Option<A> {
        self.last
            .filter(|transition| transition.context == A::CONTEXT)
            .and_then(|transition| A::from_index(transition.action))
    }

    pub fn last_reward(&self) -> f64 {
        self.last_reward
    }

    pub fn cumulative_reward(&self) -> f64 {
        self.cumulative_reward
    }

    /// Forget the in-flight transition and the episode's reward tally.
    pub fn reset_episode(&mut self) {
        self.last = None;
        self.last_reward = 0.0;
        self.cumulative_reward = 0.0;
    }

    /// Decay epsilon after an episode
    pub fn decay_epsilon(&mut self) {
        self.epsilon =
            (self.epsilon * self.hyperparameters.epsilon_decay).max(self.hyperparameters.epsilon_min);
    }

    /// Scale the learning rate by the intelligence stat: +10% per point above 1.
    pub fn set_alpha_from_intelligence(&mut self, intelligence: u32) {
        let modifier = 1.0 + (f64::from(intelligence) - 1.0) * 0.1;
        self.alpha = self.hyperparameters.base_alpha * modifier;
    }

    pub fn record_battle(&mut self, won: bool) {
        self.telemetry.record_battle(won);
    }

    pub fn record_floor_cleared(&mut self, floor: u32) {
        self.telemetry.record_floor_cleared(floor);
    }

    pub fn intelligence_inputs(&self) -> IntelligenceInputs {
        IntelligenceInputs {
            combat_entries: self.tables.combat.size(),
            minigame_entries: self.tables.minigame.size(),
            battles_won: self.telemetry.battles_won,
            total_battles: self.telemetry.total_battles,
            total_learning_updates: self.telemetry.total_learning_updates,
            epsilon: self.epsilon,
            player_taught_actions: self.telemetry.player_taught_actions,
        }
    }

    pub fn intelligence_score(&self) -> f64 {
        self.intelligence_inputs().score()
    }

    pub fn intelligence_tier(&self) -> IntelligenceTier {
        IntelligenceTier::from_score(self.intelligence_score())
    }

    pub fn stats_summary(&self) -> StatsSummary {
        let score = self.intelligence_score();
        StatsSummary {
            total_battles: self.telemetry.total_battles,
            battles_won: self.telemetry.battles_won,
            win_rate: self.telemetry.win_rate(),
            floors_cleared: self.telemetry.floors_cleared,
            highest_floor: self.telemetry.highest_floor,
            total_learning_updates: self.telemetry.total_learning_updates,
            player_taught_actions: self.telemetry.player_taught_actions,
            combat_entries: self.tables.combat.size(),
            base_entries: self.tables.base.size(),
            minigame_entries: self.tables.minigame.size(),
            epsilon: self.epsilon,
            alpha: self.alpha,
            cumulative_reward: self.cumulative_reward,
            intelligence_score: score,
            intelligence_tier: IntelligenceTier::from_score(score),
            lessons: self.telemetry.lessons().map(str::to_string).collect(),
        }
    }

    /// Install restored tables, exploration rate, and telemetry.
    pub(crate) fn restore(&mut self, tables: Vec<QTable>, epsilon: f64, telemetry: Telemetry) {
        for (context, table) in Context::ALL.into_iter().zip(tables) {
            *self.tables.get_mut(context) = table;
        }
        self.epsilon = epsilon;
        self.telemetry = telemetry;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BaseAction, CombatAction};

    fn agent() -> QLearningAgent {
        QLearningAgent::new(Hyperparameters::default(), ContextShapes::default()).with_seed(7)
    }

    fn combat_state(hp: u8) -> Observation {
        Observation::from_array([hp, 0, 1, 1, 0, 0, 0])
    }

    #[test]
    fn test_choose_records_transition() {
        let mut agent = agent();
        let s = combat_state(0);
        let action: CombatAction = agent.choose_action(&s).unwrap();
        let last = agent.last_transition().unwrap();
        assert_eq!(last.state, s);
        assert_eq!(last.context, Context::Combat);
        assert_eq!(agent.last_action::<CombatAction>(), Some(action));
        assert_eq!(agent.last_action::<BaseAction>(), None);
    }

    #[test]
    fn test_learn_from_last_uses_recorded_action() {
        let mut agent = agent();
        agent.set_epsilon(0.0);
        let s = combat_state(0);
        let next = combat_state(1);
        agent.set_q_value(s, CombatAction::Run, 1.0).unwrap();
        let chosen: CombatAction = agent.choose_action(&s).unwrap();
        assert_eq!(chosen, CombatAction::Run);

        let new_q = agent.learn_from_last(10.0, &next, false).unwrap().unwrap();
        // 1.0 + 0.1 * (10.0 + 0.95 * 0.0 - 1.0)
        assert!((new_q - 1.9).abs() < 1e-12);
        assert_eq!(agent.q_value(&s, CombatAction::Run), new_q);
        assert_eq!(agent.telemetry().total_learning_updates, 1);
        assert_eq!(agent.cumulative_reward(), 10.0);
    }

    #[test]
    fn test_learn_from_last_without_transition() {
        let mut agent = agent();
        assert_eq!(agent.learn_from_last(5.0, &combat_state(0), false).unwrap(), None);
        assert_eq!(agent.telemetry().total_learning_updates, 0);
    }

    #[test]
    fn test_contexts_do_not_share_tables() {
        let mut agent = agent();
        let s = Observation::from_array([1, 1, 1]);
        agent.learn(&s, BaseAction::StartClimb, 10.0, &s, true).unwrap();
        assert_eq!(agent.table(Context::Base).size(), 1);
        assert!(agent.table(Context::Combat).is_empty());
        assert!(agent.table(Context::Minigame).is_empty());
    }

    #[test]
    fn test_taught_action_overrides_bookkeeping() {
        let mut agent = agent();
        let s = combat_state(2);
        agent.record_taught_action(s, CombatAction::Charge).unwrap();
        assert_eq!(agent.last_action::<CombatAction>(), Some(CombatAction::Charge));
        assert_eq!(agent.telemetry().player_taught_actions, 1);
    }

    #[test]
    fn test_alpha_from_intelligence_is_stateless() {
        let mut agent = agent();
        agent.set_alpha_from_intelligence(6);
        assert!((agent.alpha() - 0.15).abs() < 1e-12);
        agent.set_alpha_from_intelligence(1);
        assert!((agent.alpha() - 0.1).abs() < 1e-12);
        agent.set_alpha_from_intelligence(6);
        assert!((agent.alpha() - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_reset_episode_keeps_telemetry() {
        let mut agent = agent();
        let s = combat_state(0);
        agent.learn(&s, CombatAction::Attack, 3.0, &s, false).unwrap();
        let _: CombatAction = agent.choose_action(&s).unwrap();
        agent.reset_episode();
        assert!(agent.last_transition().is_none());
        assert_eq!(agent.cumulative_reward(), 0.0);
        assert_eq!(agent.telemetry().total_learning_updates, 1);
    }

    #[test]
    fn test_priority_bias_is_not_written_back() {
        let mut agent = agent();
        agent.set_epsilon(0.0);
        let s = combat_state(3);
        agent.set_q_value(s, CombatAction::Attack, 2.0).unwrap();

        let action: CombatAction = agent
            .choose_action_with_priority(&s, Priority::Defensive, 0.0)
            .unwrap();
        assert_eq!(action, CombatAction::Run);
        assert_eq!(agent.q_value(&s, CombatAction::Run), 0.0);
        assert_eq!(agent.table(Context::Combat).size(), 1);
    }

    #[test]
    fn test_lesson_recorded_on_large_combat_change() {
        let mut agent = agent();
        let s = combat_state(3);
        agent.learn(&s, CombatAction::Charge, -100.0, &s, true).unwrap();
        assert_eq!(
            agent.telemetry().lessons().collect::<Vec<_>>(),
            vec!["CHARGE is a bad idea at critical HP"]
        );
    }

    #[test]
    fn test_no_lessons_outside_combat() {
        let mut agent = agent();
        let s = Observation::from_array([0, 0, 0]);
        agent.learn(&s, BaseAction::TrainLuck, 500.0, &s, true).unwrap();
        assert_eq!(agent.telemetry().lesson_count(), 0);
    }

    #[test]
    fn test_wrong_arity_is_rejected_before_writing() {
        let mut agent = agent();
        let short = Observation::from_array([0, 0, 1, 1]);

        let err = agent
            .learn(&short, CombatAction::Attack, 5.0, &short, false)
            .unwrap_err();
        assert!(matches!(err, Error::ArityMismatch { expected: 7, got: 4 }));
        assert!(agent.choose_action::<CombatAction>(&short).is_err());
        assert!(agent.record_taught_action(short, CombatAction::Run).is_err());

        assert!(agent.table(Context::Combat).is_empty());
        assert!(agent.last_transition().is_none());
        assert_eq!(agent.telemetry().total_learning_updates, 0);
        assert_eq!(agent.telemetry().player_taught_actions, 0);
    }

    #[test]
    fn test_wrong_arity_next_state_leaves_transition_pending() {
        let mut agent = agent();
        let s = combat_state(1);
        let _: CombatAction = agent.choose_action(&s).unwrap();
        let short = Observation::from_array([1, 1, 1, 1]);
        assert!(agent.learn_from_last(1.0, &short, false).is_err());
        assert!(agent.table(Context::Combat).is_empty());
        assert!(agent.last_transition().is_some());
    }

    #[test]
    fn test_non_finite_reward_is_rejected() {
        let mut agent = agent();
        let s = combat_state(0);
        for reward in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = agent
                .learn(&s, CombatAction::Attack, reward, &s, true)
                .unwrap_err();
            assert!(matches!(err, Error::NonFiniteValue { .. }));
        }
        assert!(agent.set_q_value(s, CombatAction::Run, f64::NAN).is_err());
        assert!(agent.table(Context::Combat).is_empty());
        assert_eq!(agent.cumulative_reward(), 0.0);
        assert_eq!(agent.telemetry().total_learning_updates, 0);
    }
}
