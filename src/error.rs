//! Error types for the climber crate

use thiserror::Error;

use crate::context::Context;

/// Main error type for the climber crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("malformed Q-table key '{key}': {reason}")]
    MalformedKey { key: String, reason: String },

    #[error("{context} table mixes observation arities {first} and {other}")]
    MixedArity {
        context: Context,
        first: usize,
        other: usize,
    },

    #[error("observation must have between 1 and {max} components, got {got}")]
    InvalidArity { got: usize, max: usize },

    #[error("observation has {got} components but the table expects {expected}")]
    ArityMismatch { expected: usize, got: usize },

    #[error("Q-value {value} is not finite")]
    NonFiniteValue { value: f64 },

    #[error("action index {index} is not valid for the {context} context")]
    InvalidAction { context: Context, index: i64 },

    #[error("unknown context '{name}' (expected one of: combat, base, minigame)")]
    UnknownContext { name: String },

    #[error("unknown priority '{name}' (expected one of: aggressive, defensive, balanced)")]
    UnknownPriority { name: String },

    #[error("unsupported save format version: {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
