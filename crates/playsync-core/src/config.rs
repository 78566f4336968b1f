//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/playsync/config.toml)
//! 3. Environment variables (PLAYSYNC_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::transport::TransportMode;

/// Environment variable prefix
const ENV_PREFIX: &str = "PLAYSYNC";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host of the room service (relay, landing pages, companion frame)
    #[serde(default = "default_host")]
    pub host: String,

    /// Room to join (optional, may be given on the command line)
    #[serde(default)]
    pub room: Option<String>,

    /// How to reach the relay
    #[serde(default)]
    pub transport: TransportMode,

    /// Use TLS (wss/https) when talking to the room service
    #[serde(default = "default_secure")]
    pub secure: bool,

    /// Log file (stderr when unset)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            room: None,
            transport: TransportMode::default(),
            secure: default_secure(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (PLAYSYNC_HOST, PLAYSYNC_ROOM, PLAYSYNC_TRANSPORT, PLAYSYNC_SECURE)
    /// 2. Config file (~/.config/playsync/config.toml or PLAYSYNC_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // PLAYSYNC_HOST
        if let Ok(val) = std::env::var(format!("{}_HOST", ENV_PREFIX)) {
            if !val.is_empty() {
                self.host = val;
            }
        }

        // PLAYSYNC_ROOM
        if let Ok(val) = std::env::var(format!("{}_ROOM", ENV_PREFIX)) {
            self.room = if val.is_empty() { None } else { Some(val) };
        }

        // PLAYSYNC_TRANSPORT
        if let Ok(val) = std::env::var(format!("{}_TRANSPORT", ENV_PREFIX)) {
            if let Ok(mode) = val.parse() {
                self.transport = mode;
            }
        }

        // PLAYSYNC_SECURE
        if let Ok(val) = std::env::var(format!("{}_SECURE", ENV_PREFIX)) {
            self.secure = val.eq_ignore_ascii_case("true") || val == "1";
        }
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with PLAYSYNC_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("playsync")
            .join("config.toml")
    }

    /// The room to join, with an explicit id taking precedence
    pub fn room(&self, id: Option<&str>) -> SyncResult<Room> {
        let id = id
            .or(self.room.as_deref())
            .filter(|id| !id.is_empty())
            .ok_or(SyncError::MissingRoom)?;

        Ok(Room {
            host: self.host.clone(),
            id: id.to_string(),
            secure: self.secure,
        })
    }
}

/// A room on the room service, and the addresses derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub host: String,
    pub id: String,
    pub secure: bool,
}

impl Room {
    fn http_scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    fn ws_scheme(&self) -> &'static str {
        if self.secure {
            "wss"
        } else {
            "ws"
        }
    }

    /// Relay endpoint for this room
    pub fn endpoint_url(&self) -> String {
        format!(
            "{}://{}/api/rooms/{}/ws",
            self.ws_scheme(),
            self.host,
            self.id
        )
    }

    /// Landing page users are sent to when a page has no video
    pub fn landing_url(&self) -> String {
        format!("{}://{}/r/{}", self.http_scheme(), self.host, self.id)
    }

    /// Companion page that relays for pages which cannot connect directly
    pub fn proxy_url(&self) -> String {
        format!("{}://{}/wsproxy", self.http_scheme(), self.host)
    }

    /// The only origin companion frame messages are accepted from
    pub fn allowed_origin(&self) -> String {
        format!("{}://{}", self.http_scheme(), self.host)
    }
}

fn default_host() -> String {
    "localhost:8080".to_string()
}

/// Plain ws/http, matching the local default host
fn default_secure() -> bool {
    false
}
