//! Ports (trait boundaries) for external dependencies.
//!
//! The domain owns these traits; adapters in [`crate::adapters`] and the
//! training pipeline implement them.

pub mod observer;
pub mod repository;

pub use observer::Observer;
pub use repository::AgentRepository;
