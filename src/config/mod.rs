//! Configuration management for snoosync.
//!
//! Configuration is read from `~/.config/snoosync/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.
//! The `SNOOSYNC_ACCESS_TOKEN` environment variable overrides the token in the file.

pub mod reddit;
pub mod sync;

pub use reddit::RedditConfig;
pub use sync::{SubredditConfig, SyncConfig};

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ACCESS_TOKEN_ENV: &str = "SNOOSYNC_ACCESS_TOKEN";

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reddit: RedditConfig,
    pub subreddits: SubredditConfig,
    pub sync: SyncConfig,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        let mut config = Self::load_from(&config_path)?;

        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.trim().is_empty() {
                config.reddit.access_token = Some(token.trim().to_string());
            }
        }

        Ok(config)
    }

    /// Load from `path`, writing the commented defaults there first if absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            Self::create_default_config(path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/snoosync/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("snoosync").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        fs::write(path, Self::default_config_content()).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn default_config_content() -> &'static str {
        r##"# snoosync configuration

[reddit]
# OAuth bearer token. Leave unset to browse logged out.
# The SNOOSYNC_ACCESS_TOKEN environment variable takes precedence.
# access_token = ""
user_agent = "snoosync/0.1.0"
oauth_url = "https://oauth.reddit.com"
public_url = "https://www.reddit.com"
timeout_secs = 10

[subreddits]
# Pseudo-subreddits always listed first, in this order
frontpage = "Frontpage"
popular = "Popular"

# Listing used when no account is logged in
logged_out_defaults = [
    "Frontpage",
    "Popular",
    "AskReddit",
    "worldnews",
    "todayilearned",
    "pics",
    "aww",
    "gifs",
    "videos",
    "science",
    "movies",
    "Showerthoughts",
    "EarthPorn",
    "mildlyinteresting",
]

[sync]
# Pending subscribes/unsubscribes replayed concurrently
replay_workers = 4

# How often `snoosync daemon` replays pending changes and refreshes
daemon_interval = "30m"
"##
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
