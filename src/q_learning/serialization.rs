//! Save document for Q-learning agents.
//!
//! Each context table is a flat map from the canonical key
//! `"(b0, b1, ..., bn):action"` to its Q-value. Keys are parsed by
//! [`parse_key`], which splits on the last colon and rejects anything that
//! does not match the grammar exactly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    context::Context,
    error::{Error, Result},
    q_learning::{
        agent::{ContextShapes, Hyperparameters, QLearningAgent},
        q_table::QTable,
        telemetry::Telemetry,
    },
    types::Observation,
};

pub const SAVE_FORMAT_VERSION: u32 = 1;

/// Render a state-action pair as its persisted key.
pub fn format_key(state: &Observation, action: u8) -> String {
    format!("{state}:{action}")
}

/// Parse a persisted key back into its observation and action index.
///
/// # Errors
///
/// Returns [`Error::MalformedKey`] when the colon is missing, the action is
/// not an integer in `0..=255`, or the observation tuple is malformed.
pub fn parse_key(key: &str) -> Result<(Observation, u8)> {
    let malformed = |reason: &str| Error::MalformedKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    let (tuple, action) = key
        .rsplit_once(':')
        .ok_or_else(|| malformed("missing ':' before the action index"))?;
    let action: i64 = action
        .trim()
        .parse()
        .map_err(|_| malformed("action index is not an integer"))?;
    let action = u8::try_from(action).map_err(|_| malformed("action index out of range"))?;

    let state = tuple.parse::<Observation>().map_err(|err| match err {
        Error::MalformedKey { reason, .. } => malformed(&reason),
        other => malformed(&other.to_string()),
    })?;

    Ok((state, action))
}

/// Contexts whose stored tables were dropped during a load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub discarded: Vec<Context>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.discarded.is_empty()
    }
}

/// Persisted form of a [`QLearningAgent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedAgent {
    pub version: u32,
    pub epsilon: f64,
    #[serde(default)]
    pub combat: BTreeMap<String, f64>,
    #[serde(default)]
    pub base: BTreeMap<String, f64>,
    #[serde(default)]
    pub minigame: BTreeMap<String, f64>,
    #[serde(default)]
    pub telemetry: Telemetry,
}

impl SavedAgent {
    pub fn from_agent(agent: &QLearningAgent) -> Self {
        let dump = |context: Context| {
            agent
                .table(context)
                .iter()
                .map(|(state, action, value)| (format_key(state, action), value))
                .collect::<BTreeMap<_, _>>()
        };

        Self {
            version: SAVE_FORMAT_VERSION,
            epsilon: agent.epsilon(),
            combat: dump(Context::Combat),
            base: dump(Context::Base),
            minigame: dump(Context::Minigame),
            telemetry: agent.telemetry().clone(),
        }
    }

    pub fn table(&self, context: Context) -> &BTreeMap<String, f64> {
        match context {
            Context::Combat => &self.combat,
            Context::Base => &self.base,
            Context::Minigame => &self.minigame,
        }
    }

    /// Rebuild an agent configured with `hyperparameters` and `shapes`.
    ///
    /// # Errors
    ///
    /// Fails on an unsupported version, on any malformed key, on an action
    /// index outside its context, or on a table mixing observation arities.
    /// A table with a consistent arity that differs from `shapes` is not an
    /// error: it is dropped and listed in the returned [`LoadReport`].
    pub fn into_agent(
        &self,
        hyperparameters: Hyperparameters,
        shapes: ContextShapes,
    ) -> Result<(QLearningAgent, LoadReport)> {
        if self.version != SAVE_FORMAT_VERSION {
            return Err(Error::UnsupportedVersion {
                found: self.version,
                expected: SAVE_FORMAT_VERSION,
            });
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(Error::SerializationContext {
                operation: "restore exploration rate".to_string(),
                message: format!("epsilon {} is outside [0, 1]", self.epsilon),
            });
        }

        let mut report = LoadReport::default();
        let mut tables = Vec::with_capacity(Context::ALL.len());

        for context in Context::ALL {
            let expected = shapes.arity(context);
            let table = decode_table(context, self.table(context))?;
            if !table.is_empty() && table.arity() != expected {
                warn!(
                    %context,
                    stored = table.arity(),
                    expected,
                    entries = table.size(),
                    "discarding table with mismatched observation arity"
                );
                report.discarded.push(context);
                tables.push(QTable::new(expected));
            } else {
                let mut fresh = QTable::new(expected);
                for (state, action, value) in table.iter() {
                    fresh.set(*state, action, value)?;
                }
                tables.push(fresh);
            }
        }

        let mut agent = QLearningAgent::new(hyperparameters, shapes);
        agent.restore(tables, self.epsilon, self.telemetry.clone());
        info!(
            combat = agent.table(Context::Combat).size(),
            base = agent.table(Context::Base).size(),
            minigame = agent.table(Context::Minigame).size(),
            epsilon = agent.epsilon(),
            "restored agent"
        );

        Ok((agent, report))
    }
}

fn decode_table(context: Context, entries: &BTreeMap<String, f64>) -> Result<QTable> {
    let mut arity: Option<usize> = None;
    let mut decoded = Vec::with_capacity(entries.len());

    for (key, value) in entries {
        let (state, action) = parse_key(key)?;
        if !context.is_valid_action(action) {
            return Err(Error::InvalidAction {
                context,
                index: i64::from(action),
            });
        }
        match arity {
            None => arity = Some(state.arity()),
            Some(first) if first != state.arity() => {
                return Err(Error::MixedArity {
                    context,
                    first,
                    other: state.arity(),
                });
            }
            Some(_) => {}
        }
        decoded.push((state, action, *value));
    }

    let mut table = QTable::new(arity.unwrap_or(0));
    for (state, action, value) in decoded {
        table.set(state, action, value)?;
    }
    Ok(table)
}
