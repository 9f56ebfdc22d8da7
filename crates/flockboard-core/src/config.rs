//! Session configuration.

use crate::elements::ElementStyle;
use crate::sync::{TransportError, room_url};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const ENV_SERVER: &str = "FLOCKBOARD_SERVER";
pub const ENV_ROOM: &str = "FLOCKBOARD_ROOM";
pub const ENV_GRID: &str = "FLOCKBOARD_GRID";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid server URL: {0}")]
    Url(#[from] TransportError),
    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Everything a whiteboard session needs to start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Relay base URL (`ws://`).
    pub server: String,
    pub room: String,
    pub width: u32,
    pub height: u32,
    /// Delay before reconnecting after the channel closes, in milliseconds.
    pub reconnect_delay_ms: u64,
    /// Maximum number of history snapshots.
    pub history_limit: usize,
    /// Whether the grid is shown when the session starts.
    pub grid: bool,
    /// Style for the first element drawn.
    pub style: ElementStyle,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server: "ws://localhost:8000".to_string(),
            room: "lobby".to_string(),
            width: 1280,
            height: 800,
            reconnect_delay_ms: 3000,
            history_limit: 50,
            grid: false,
            style: ElementStyle::default(),
        }
    }
}

impl SessionConfig {
    /// Parse from a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Apply `FLOCKBOARD_*` overrides from the process environment.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any lookup (the environment in production).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(server) = lookup(ENV_SERVER) {
            self.server = server;
        }
        if let Some(room) = lookup(ENV_ROOM) {
            self.room = room;
        }
        if let Some(grid) = lookup(ENV_GRID) {
            self.grid = match grid.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => true,
                "0" | "false" | "off" | "no" | "" => false,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        name: ENV_GRID,
                        value: grid,
                    });
                }
            };
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 {
            return Err(ConfigError::Zero("width"));
        }
        if self.height == 0 {
            return Err(ConfigError::Zero("height"));
        }
        if self.history_limit == 0 {
            return Err(ConfigError::Zero("history_limit"));
        }
        self.room_url()?;
        Ok(())
    }

    /// The room channel address.
    pub fn room_url(&self) -> Result<Url, ConfigError> {
        Ok(room_url(&self.server, &self.room)?)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}
