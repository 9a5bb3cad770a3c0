//! Configuration for the meeflow engine.
//!
//! Settings live in `.meeflow/config.json`. Every field has a default, so a
//! missing or partial file is valid.

use crate::script::{Script, ScriptError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Directory holding meeflow state, relative to the working directory.
pub const MEEFLOW_DIR: &str = ".meeflow";

/// Main configuration for meeflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Delay between two playback steps, in milliseconds.
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,

    /// UI tick rate in milliseconds.
    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,

    /// Optional JSON script replacing the built-in mission-mint script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_path: Option<PathBuf>,
}

fn default_step_delay_ms() -> u64 {
    1500
}

fn default_tick_rate_ms() -> u64 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            step_delay_ms: default_step_delay_ms(),
            tick_rate_ms: default_tick_rate_ms(),
            script_path: None,
        }
    }
}

impl Config {
    /// Path of the config file under `root`.
    pub fn path_in(root: &Path) -> PathBuf {
        root.join(MEEFLOW_DIR).join("config.json")
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let config: Self = serde_json::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that both intervals are non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step_delay_ms == 0 {
            return Err(ConfigError::Invalid("step_delay_ms must be greater than 0"));
        }
        if self.tick_rate_ms == 0 {
            return Err(ConfigError::Invalid("tick_rate_ms must be greater than 0"));
        }
        Ok(())
    }

    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }

    /// Delay between two playback steps.
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    /// UI tick rate.
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }

    /// The script to play: the configured file, or the built-in script.
    ///
    /// Relative script paths are resolved against `root`.
    pub fn script(&self, root: &Path) -> Result<Script, ConfigError> {
        match &self.script_path {
            Some(path) => {
                let path = if path.is_absolute() {
                    path.clone()
                } else {
                    root.join(path)
                };
                Script::load(&path).map_err(|source| ConfigError::Script { path, source })
            }
            None => Ok(Script::mission_mint()),
        }
    }

    /// Like [`Config::script`], but logs and falls back to the built-in script.
    pub fn script_or_builtin(&self, root: &Path) -> Script {
        self.script(root).unwrap_or_else(|e| {
            warn!(error = %e, "falling back to built-in script");
            Script::mission_mint()
        })
    }
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing config to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),

    /// A setting is out of range.
    #[error("Invalid config: {0}")]
    Invalid(&'static str),

    /// The configured script could not be loaded.
    #[error("Script {}: {source}", .path.display())]
    Script {
        path: PathBuf,
        #[source]
        source: ScriptError,
    },
}
