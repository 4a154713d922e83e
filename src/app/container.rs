//! Dependency injection container.
//!
//! The container owns infrastructure dependencies and provides factory
//! methods for agents and decision loops.

use std::{path::Path, sync::Arc};

use tracing::info;

use super::config::AgentConfig;
use crate::{
    Result,
    adapters::JsonRepository,
    decision::DecisionLoop,
    encoder::StateEncoder,
    ports::AgentRepository,
    q_learning::{LoadReport, QLearningAgent, SavedAgent},
};

/// Application with dependency injection.
///
/// # Examples
///
/// ## Production usage
///
/// ```
/// use climber::app::{AgentConfig, App};
///
/// let app = App::new();
/// let agent = app.create_agent(&AgentConfig::new().with_seed(42))?;
/// # Ok::<(), climber::Error>(())
/// ```
///
/// ## Testing with dependency injection
///
/// ```
/// use climber::{adapters::InMemoryRepository, app::App};
///
/// let app = App::for_testing()
///     .with_repository(InMemoryRepository::new())
///     .with_default_seed(42)
///     .build();
/// ```
pub struct App {
    /// Repository for agent persistence
    agent_repository: Arc<dyn AgentRepository + Send + Sync>,
    /// Default random seed (None = non-deterministic)
    default_seed: Option<u64>,
}

impl App {
    /// Create an app with production defaults: JSON persistence, unseeded RNG.
    pub fn new() -> Self {
        Self {
            agent_repository: Arc::new(JsonRepository::new()),
            default_seed: None,
        }
    }

    /// Create a builder for constructing an app with custom dependencies.
    pub fn for_testing() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn agent_repository(&self) -> Arc<dyn AgentRepository + Send + Sync> {
        Arc::clone(&self.agent_repository)
    }

    fn seed_for(&self, config: &AgentConfig) -> Option<u64> {
        config.seed.or(self.default_seed)
    }

    /// Create a fresh agent.
    ///
    /// The config seed wins over the container default. The learning rate is
    /// set from the configured intelligence stat.
    pub fn create_agent(&self, config: &AgentConfig) -> Result<QLearningAgent> {
        config.validate()?;
        let mut agent = QLearningAgent::new(config.hyperparameters, config.shapes());
        if let Some(seed) = self.seed_for(config) {
            agent.set_rng_seed(seed);
        }
        agent.set_alpha_from_intelligence(config.intelligence);
        Ok(agent)
    }

    /// Create a decision loop whose encoder matches the config.
    pub fn create_decision_loop(&self, config: &AgentConfig) -> DecisionLoop {
        DecisionLoop::new(StateEncoder::new(config.encoder), config.decision)
    }

    /// Load an agent saved at `path` and reconfigure it with `config`.
    ///
    /// Tables whose arity no longer matches `config` are dropped; the report
    /// lists them.
    pub fn load_agent(&self, path: &Path, config: &AgentConfig) -> Result<(QLearningAgent, LoadReport)> {
        config.validate()?;
        let saved = self.agent_repository.load(path)?;
        let (mut agent, report) = saved.into_agent(config.hyperparameters, config.shapes())?;
        if let Some(seed) = self.seed_for(config) {
            agent.set_rng_seed(seed);
        }
        agent.set_alpha_from_intelligence(config.intelligence);
        info!(path = %path.display(), discarded = ?report.discarded, "loaded agent");
        Ok((agent, report))
    }

    /// Load if a save exists at `path`, otherwise create a fresh agent.
    pub fn load_or_create_agent(
        &self,
        path: &Path,
        config: &AgentConfig,
    ) -> Result<(QLearningAgent, LoadReport)> {
        if self.agent_repository.exists(path) {
            self.load_agent(path, config)
        } else {
            Ok((self.create_agent(config)?, LoadReport::default()))
        }
    }

    pub fn save_agent(&self, agent: &QLearningAgent, path: &Path) -> Result<()> {
        self.agent_repository.save(&SavedAgent::from_agent(agent), path)?;
        info!(path = %path.display(), "saved agent");
        Ok(())
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing an app with custom dependencies.
pub struct AppBuilder {
    agent_repository: Option<Arc<dyn AgentRepository + Send + Sync>>,
    default_seed: Option<u64>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            agent_repository: None,
            default_seed: None,
        }
    }

    /// Set a custom agent repository.
    pub fn with_repository<R: AgentRepository + Send + Sync + 'static>(mut self, repo: R) -> Self {
        self.agent_repository = Some(Arc::new(repo));
        self
    }

    /// Seed used for agents whose config carries none.
    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = Some(seed);
        self
    }

    /// Build the app; without a repository, `JsonRepository` is used.
    pub fn build(self) -> App {
        App {
            agent_repository: self
                .agent_repository
                .unwrap_or_else(|| Arc::new(JsonRepository::new())),
            default_seed: self.default_seed,
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::InMemoryRepository,
        context::{CombatAction, Context},
        encoder::EncoderVariant,
        types::Observation,
    };

    #[test]
    fn test_app_creates_agent() {
        let app = App::new();
        let agent = app.create_agent(&AgentConfig::new()).unwrap();
        assert_eq!(agent.table(Context::Combat).arity(), 7);
        assert!((agent.alpha() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_app_applies_seed() {
        let app = App::for_testing().with_default_seed(42).build();
        let agent = app.create_agent(&AgentConfig::new()).unwrap();
        assert_eq!(agent.rng_seed(), Some(42));

        let agent = app.create_agent(&AgentConfig::new().with_seed(123)).unwrap();
        assert_eq!(agent.rng_seed(), Some(123));
    }

    #[test]
    fn test_intelligence_sets_alpha() {
        let app = App::new();
        let agent = app
            .create_agent(&AgentConfig::new().with_intelligence(11))
            .unwrap();
        assert!((agent.alpha() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_save_then_load_with_changed_encoder() {
        let repo = InMemoryRepository::new();
        let app = App::for_testing().with_repository(repo.clone()).build();
        let path = Path::new("slot");

        let config = AgentConfig::new();
        let mut agent = app.create_agent(&config).unwrap();
        agent.set_q_value(Observation::from_array([0, 0, 0, 0, 0, 0, 0]), CombatAction::Attack, 3.0).unwrap();
        app.save_agent(&agent, path).unwrap();
        assert!(repo.contains(path));

        let (same, report) = app.load_agent(path, &config).unwrap();
        assert!(report.is_clean());
        assert_eq!(same.table(Context::Combat).size(), 1);

        let basic = AgentConfig::new().with_variant(EncoderVariant::Basic);
        let (fresh, report) = app.load_agent(path, &basic).unwrap();
        assert_eq!(report.discarded, vec![Context::Combat]);
        assert!(fresh.table(Context::Combat).is_empty());
    }

    #[test]
    fn test_load_or_create_without_save() {
        let app = App::for_testing()
            .with_repository(InMemoryRepository::new())
            .build();
        let (agent, report) = app
            .load_or_create_agent(Path::new("missing"), &AgentConfig::new())
            .unwrap();
        assert!(report.is_clean());
        assert_eq!(agent.telemetry().total_learning_updates, 0);
    }
}
