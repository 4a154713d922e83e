//! MessagePack implementation of the agent repository.
//!
//! Compact binary storage via rmp_serde. The document carries the same
//! canonical keys as the JSON form.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use crate::{Result, error::Error, ports::AgentRepository, q_learning::SavedAgent};

/// MessagePack-based agent repository.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
///
/// use climber::{
///     adapters::MsgPackRepository,
///     ports::AgentRepository,
///     q_learning::{ContextShapes, Hyperparameters, QLearningAgent, SavedAgent},
/// };
///
/// let repo = MsgPackRepository;
/// let agent = QLearningAgent::new(Hyperparameters::default(), ContextShapes::default());
/// repo.save(&SavedAgent::from_agent(&agent), Path::new("agent.msgpack"))?;
/// let loaded = repo.load(Path::new("agent.msgpack"))?;
/// # Ok::<(), climber::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackRepository;

impl MsgPackRepository {
    pub fn new() -> Self {
        Self
    }
}

impl AgentRepository for MsgPackRepository {
    fn save(&self, agent: &SavedAgent, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create file {path:?}"),
            source,
        })?;
        let mut writer = BufWriter::new(file);

        rmp_serde::encode::write_named(&mut writer, agent).map_err(|e| {
            Error::SerializationContext {
                operation: "serialize agent to MessagePack".to_string(),
                message: e.to_string(),
            }
        })?;

        writer.flush().map_err(|source| Error::Io {
            operation: format!("write file {path:?}"),
            source,
        })
    }

    fn load(&self, path: &Path) -> Result<SavedAgent> {
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open file {path:?}"),
            source,
        })?;

        rmp_serde::decode::from_read(BufReader::new(file)).map_err(|e| {
            Error::SerializationContext {
                operation: "deserialize agent from MessagePack".to_string(),
                message: e.to_string(),
            }
        })
    }
}
