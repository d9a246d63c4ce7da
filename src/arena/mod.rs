//! Arena geometry and the provider the matchmaking queue picks arenas from

pub mod provider;

pub use provider::{ArenaError, ArenaProvider, StaticArenaProvider};

use serde::{Deserialize, Serialize};

/// A point in arena space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const ORIGIN: Position = Position {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance in three dimensions
    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

fn default_max_players() -> usize {
    100
}

fn default_enabled() -> bool {
    true
}

/// Immutable per-map geometry. The core only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_max_players")]
    pub max_players: usize,
    #[serde(default)]
    pub center: Option<Position>,
    /// Where participants are returned once a match ends
    #[serde(default)]
    pub lobby: Option<Position>,
    #[serde(default)]
    pub spawns: Vec<Position>,
}

impl Arena {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            enabled: true,
            max_players: default_max_players(),
            center: None,
            lobby: None,
            spawns: Vec::new(),
        }
    }

    pub fn with_center(mut self, center: Position) -> Self {
        self.center = Some(center);
        self
    }

    pub fn with_lobby(mut self, lobby: Position) -> Self {
        self.lobby = Some(lobby);
        self
    }

    pub fn with_spawns(mut self, spawns: Vec<Position>) -> Self {
        self.spawns = spawns;
        self
    }

    pub fn with_max_players(mut self, max_players: usize) -> Self {
        self.max_players = max_players;
        self
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// An arena can host a match only when fully configured and enabled
    pub fn is_valid(&self) -> bool {
        self.center.is_some() && self.lobby.is_some() && !self.spawns.is_empty() && self.enabled
    }
}
