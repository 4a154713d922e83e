//! Q-table implementation for temporal difference learning

use std::collections::HashMap;

use crate::{
    error::{Error, Result},
    types::Observation,
};

/// Sparse Q-table mapping (observation, action index) pairs to Q-values.
///
/// Absent entries read as `0.0`. Every observation stored in one table shares
/// the table's declared arity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QTable {
    /// Q-values: (observation, action index) -> Q-value
    q_values: HashMap<(Observation, u8), f64>,
    /// Arity of every observation this table accepts
    arity: usize,
}

impl QTable {
    /// Create an empty Q-table for observations of the given arity
    pub fn new(arity: usize) -> Self {
        Self {
            q_values: HashMap::new(),
            arity,
        }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Get Q-value for a state-action pair
    pub fn get(&self, state: &Observation, action: u8) -> f64 {
        self.q_values.get(&(*state, action)).copied().unwrap_or(0.0)
    }

    /// Fail unless `state` has this table's arity.
    pub fn check_arity(&self, state: &Observation) -> Result<()> {
        if state.arity() == self.arity {
            Ok(())
        } else {
            Err(Error::ArityMismatch {
                expected: self.arity,
                got: state.arity(),
            })
        }
    }

    /// Set Q-value for a state-action pair
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArityMismatch`] for an observation of another arity
    /// and [`Error::NonFiniteValue`] for NaN or infinite values; the table is
    /// left unchanged.
    pub fn set(&mut self, state: Observation, action: u8, value: f64) -> Result<()> {
        self.check_arity(&state)?;
        if !value.is_finite() {
            return Err(Error::NonFiniteValue { value });
        }
        self.q_values.insert((state, action), value);
        Ok(())
    }

    /// Get maximum Q-value over the given actions in a state
    pub fn max_q(&self, state: &Observation, actions: impl IntoIterator<Item = u8>) -> f64 {
        actions
            .into_iter()
            .map(|action| self.get(state, action))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Q-learning update: off-policy TD control
    ///
    /// Q(s,a) ← Q(s,a) + α[r + γ max_a' Q(s',a') - Q(s,a)]
    ///
    /// Terminal transitions use `r` alone as the target. Returns the old and
    /// new Q-values. Both observations must have the table's arity and the
    /// new value must be finite, otherwise nothing is written.
    #[allow(clippy::too_many_arguments)]
    pub fn q_learning_update(
        &mut self,
        state: Observation,
        action: u8,
        reward: f64,
        next_state: &Observation,
        next_actions: impl IntoIterator<Item = u8>,
        done: bool,
        learning_rate: f64,
        discount_factor: f64,
    ) -> Result<(f64, f64)> {
        self.check_arity(&state)?;
        self.check_arity(next_state)?;
        let current_q = self.get(&state, action);
        let td_target = if done {
            reward
        } else {
            let max_next_q = self.max_q(next_state, next_actions);
            // An empty action set has no future value.
            let max_next_q = if max_next_q.is_finite() { max_next_q } else { 0.0 };
            reward + discount_factor * max_next_q
        };
        let td_error = td_target - current_q;
        let new_q = current_q + learning_rate * td_error;
        self.set(state, action, new_q)?;
        Ok((current_q, new_q))
    }

    /// Iterate over stored entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&Observation, u8, f64)> {
        self.q_values
            .iter()
            .map(|((state, action), value)| (state, *action, *value))
    }

    /// Distinct observations with at least one stored value.
    pub fn states(&self) -> Vec<Observation> {
        let mut states: Vec<Observation> = self.q_values.keys().map(|(state, _)| *state).collect();
        states.sort();
        states.dedup();
        states
    }

    /// Get total number of Q-values stored
    pub fn size(&self) -> usize {
        self.q_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q_values.is_empty()
    }
}
