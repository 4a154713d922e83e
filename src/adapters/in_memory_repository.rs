//! In-memory agent repository for testing.
//!
//! Stores encoded documents in a shared map so tests avoid file system I/O.

use std::{
    collections::HashMap,
    io,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{Result, error::Error, ports::AgentRepository, q_learning::SavedAgent};

/// In-memory repository keyed by path.
///
/// Documents are stored as JSON bytes so a save exercises the same encoding
/// as the file repository. Clones share storage.
///
/// # Examples
///
/// ```
/// use std::path::Path;
///
/// use climber::{
///     adapters::InMemoryRepository,
///     ports::AgentRepository,
///     q_learning::{ContextShapes, Hyperparameters, QLearningAgent, SavedAgent},
/// };
///
/// let repo = InMemoryRepository::new();
/// let agent = QLearningAgent::new(Hyperparameters::default(), ContextShapes::default());
/// repo.save(&SavedAgent::from_agent(&agent), Path::new("slot-1"))?;
/// assert!(repo.contains(Path::new("slot-1")));
/// # Ok::<(), climber::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    storage: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn storage(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.storage.lock().map_err(|_| Error::Io {
            operation: "lock in-memory storage".to_string(),
            source: io::Error::other("storage mutex poisoned"),
        })
    }

    /// Number of stored documents.
    pub fn count(&self) -> usize {
        self.storage().map(|storage| storage.len()).unwrap_or(0)
    }

    pub fn clear(&self) {
        if let Ok(mut storage) = self.storage() {
            storage.clear();
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        let key = path.to_string_lossy();
        self.storage()
            .map(|storage| storage.contains_key(key.as_ref()))
            .unwrap_or(false)
    }
}

impl AgentRepository for InMemoryRepository {
    fn save(&self, agent: &SavedAgent, path: &Path) -> Result<()> {
        let key = path.to_string_lossy().to_string();
        let bytes = serde_json::to_vec(agent)?;
        self.storage()?.insert(key, bytes);
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<SavedAgent> {
        let key = path.to_string_lossy();
        let storage = self.storage()?;

        let bytes = storage.get(key.as_ref()).ok_or_else(|| Error::Io {
            operation: format!("load agent from in-memory storage at {path:?}"),
            source: io::Error::new(io::ErrorKind::NotFound, "key not found in memory"),
        })?;

        serde_json::from_slice(bytes).map_err(|e| Error::SerializationContext {
            operation: "deserialize agent from in-memory storage".to_string(),
            message: e.to_string(),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.contains(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::q_learning::{ContextShapes, Hyperparameters, QLearningAgent};

    fn saved() -> SavedAgent {
        let mut agent = QLearningAgent::new(Hyperparameters::default(), ContextShapes::default());
        agent.record_battle(true);
        SavedAgent::from_agent(&agent)
    }

    #[test]
    fn test_in_memory_save_and_load() {
        let repo = InMemoryRepository::new();
        let path = Path::new("slot");

        assert_eq!(repo.count(), 0);
        assert!(!repo.exists(path));

        repo.save(&saved(), path).unwrap();
        assert_eq!(repo.count(), 1);
        assert!(repo.exists(path));

        let loaded = repo.load(path).unwrap();
        assert_eq!(loaded.telemetry.battles_won, 1);
    }

    #[test]
    fn test_load_nonexistent_returns_error() {
        let repo = InMemoryRepository::new();
        assert!(repo.load(Path::new("nonexistent")).is_err());
    }

    #[test]
    fn test_clear_removes_all() {
        let repo = InMemoryRepository::new();
        repo.save(&saved(), Path::new("a")).unwrap();
        repo.save(&saved(), Path::new("b")).unwrap();
        assert_eq!(repo.count(), 2);
        repo.clear();
        assert_eq!(repo.count(), 0);
    }

    #[test]
    fn test_clone_shares_storage() {
        let repo1 = InMemoryRepository::new();
        let repo2 = repo1.clone();
        repo1.save(&saved(), Path::new("shared")).unwrap();
        assert!(repo2.load(Path::new("shared")).is_ok());
        assert_eq!(repo2.count(), 1);
    }
}
