//! Repository port for agent persistence.

use std::path::Path;

use crate::{Result, q_learning::SavedAgent};

/// Port for persisting and loading saved agents.
///
/// Implementations choose the storage medium and encoding; the document they
/// store is always a [`SavedAgent`].
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
///
/// use climber::{ports::AgentRepository, q_learning::SavedAgent};
///
/// fn backup<R: AgentRepository>(repo: &R, saved: &SavedAgent) -> climber::Result<()> {
///     repo.save(saved, Path::new("agent.bak.json"))
/// }
/// ```
pub trait AgentRepository {
    /// Save an agent document.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be written or encoding fails.
    fn save(&self, agent: &SavedAgent, path: &Path) -> Result<()>;

    /// Load an agent document.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is missing, unreadable, or not a valid
    /// document. Key-level validation happens later, in
    /// [`SavedAgent::into_agent`].
    fn load(&self, path: &Path) -> Result<SavedAgent>;

    /// Whether a document exists at `path`.
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}
