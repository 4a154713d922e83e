//! CLI infrastructure for the climber toolkit
//!
//! Command implementations for headless training and for inspecting saved
//! agents.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::{
    adapters::MsgPackRepository,
    app::{AgentConfig, App, AppBuilder},
};

pub mod commands;
pub mod output;

/// Build an app whose repository matches the save file's extension.
///
/// `.msgpack` and `.mp` use MessagePack; anything else uses the JSON format.
pub fn app_for_path(path: &Path) -> App {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("msgpack" | "mp") => AppBuilder::new()
            .with_repository(MsgPackRepository::new())
            .build(),
        _ => App::new(),
    }
}

/// Load the configuration file if one was given, else defaults.
pub fn load_config(path: Option<&PathBuf>) -> Result<AgentConfig> {
    match path {
        Some(path) => AgentConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(AgentConfig::default()),
    }
}
