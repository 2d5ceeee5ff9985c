//! Configuration management for the Antrail CLI.

use anyhow::{Context, Result};
use antrail::prelude::{PlaybackConfig, RouterConfig, ServiceConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "antrail.toml";

/// Antrail configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub routing: RouterConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

impl Config {
    /// Load antrail.toml from the current or parent directories, then the
    /// user config directory, falling back to defaults.
    pub fn load() -> Result<Self> {
        let found = std::env::current_dir()
            .ok()
            .and_then(|dir| find_config_file(&dir))
            .or_else(user_config_file);
        match found {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    /// Load and validate a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config
            .playback
            .validate()
            .with_context(|| format!("Invalid playback settings in {}", path.display()))?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Save config to the specified path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}

/// Find antrail.toml in `start` or its parents.
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// `<config dir>/antrail/antrail.toml`, if it exists.
fn user_config_file() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("antrail").join(CONFIG_FILE);
    path.exists().then_some(path)
}
