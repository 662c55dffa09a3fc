// src/config/file.rs
// File-based configuration from ~/.herald/config.toml

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Top-level config structure
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct HeraldConfig {
    /// Verbose logging
    #[serde(default)]
    pub debug: bool,

    /// List producers that declare a license but don't ask to inform users
    pub show_non_informing: Option<bool>,

    #[serde(default)]
    pub rotation: RotationSection,
}

/// Rotation timing section
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct RotationSection {
    pub initial_delay_ms: Option<u64>,
    pub period_ms: Option<u64>,
    /// "chat" or "action_bar"
    pub display: Option<String>,
}

impl HeraldConfig {
    /// Load config from ~/.herald/config.toml
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load config from an explicit path, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    debug!(path = %path.display(), "Loaded config from file");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse config file");
                    Self::default()
                }
            },
            Err(_) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
        }
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".herald")
            .join("config.toml")
    }
}
