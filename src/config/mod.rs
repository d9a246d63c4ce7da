//! Configuration module - environment variable parsing and gameplay settings

pub mod game;

pub use game::{
    GameSettings, ModeSettings, ModesSettings, QueueSettings, RewardSettings, TimerSettings,
    ZoneSettings,
};

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Optional TOML file with gameplay settings; defaults apply when absent
    pub game_config_path: Option<PathBuf>,
    /// TOML file listing the arenas
    pub arenas_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // PORT wins over SERVER_ADDR so hosted environments can inject it
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            game_config_path: env::var("GAME_CONFIG").ok().map(PathBuf::from),
            arenas_path: env::var("ARENAS_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("arenas.toml")),
        })
    }

    /// Load gameplay settings from `game_config_path`, or defaults when unset
    pub fn game_settings(&self) -> Result<GameSettings, ConfigError> {
        match &self.game_config_path {
            Some(path) => GameSettings::load(path),
            None => Ok(GameSettings::default()),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid setting: {0}")]
    Invalid(String),
}
