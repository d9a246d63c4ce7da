//! Arena provider trait and the static, file-backed implementation

use rand::seq::SliceRandom;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use super::Arena;

/// Source of arenas for new matches
pub trait ArenaProvider: Send + Sync {
    /// Whether at least one arena could host a match right now
    fn valid_arena_exists(&self) -> bool;

    /// Pick a valid arena at random, or `None` when there is none
    fn pick_random_arena(&self) -> Option<Arc<Arena>>;

    /// Every known arena, valid or not
    fn arenas(&self) -> Vec<Arc<Arena>>;

    /// Pick a valid arena at random among those seating at least `min_players`
    fn pick_arena_for(&self, min_players: usize) -> Option<Arc<Arena>> {
        let fitting: Vec<Arc<Arena>> = self
            .arenas()
            .into_iter()
            .filter(|a| a.is_valid() && a.max_players >= min_players)
            .collect();
        fitting.choose(&mut rand::thread_rng()).cloned()
    }
}

/// Arena load errors
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    #[error("Failed to read arenas file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse arenas file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize)]
struct ArenasFile {
    #[serde(default)]
    arenas: Vec<Arena>,
}

/// Fixed set of arenas, loaded once at startup
#[derive(Debug, Default)]
pub struct StaticArenaProvider {
    arenas: Vec<Arc<Arena>>,
}

impl StaticArenaProvider {
    pub fn new(arenas: Vec<Arena>) -> Self {
        Self {
            arenas: arenas.into_iter().map(Arc::new).collect(),
        }
    }

    /// Parse `[[arenas]]` tables from TOML text
    pub fn from_toml(raw: &str, origin: &Path) -> Result<Self, ArenaError> {
        let file: ArenasFile = toml::from_str(raw).map_err(|source| ArenaError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;

        for arena in file.arenas.iter().filter(|a| !a.is_valid()) {
            warn!(arena = %arena.name, "Arena is not fully configured and will not be picked");
        }

        let provider = Self::new(file.arenas);
        info!(
            arenas = provider.arenas.len(),
            valid = provider.valid_count(),
            "Loaded arenas"
        );
        Ok(provider)
    }

    /// Load arenas from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArenaError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ArenaError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw, path)
    }

    pub fn valid_count(&self) -> usize {
        self.arenas.iter().filter(|a| a.is_valid()).count()
    }
}

impl ArenaProvider for StaticArenaProvider {
    fn valid_arena_exists(&self) -> bool {
        self.arenas.iter().any(|a| a.is_valid())
    }

    fn pick_random_arena(&self) -> Option<Arc<Arena>> {
        let valid: Vec<&Arc<Arena>> = self.arenas.iter().filter(|a| a.is_valid()).collect();
        valid.choose(&mut rand::thread_rng()).map(|a| Arc::clone(a))
    }

    fn arenas(&self) -> Vec<Arc<Arena>> {
        self.arenas.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Position;

    const ARENAS: &str = r#"
        [[arenas]]
        name = "canyon"
        display_name = "Red Canyon"
        max_players = 40
        center = { x = 0.0, y = 64.0, z = 0.0 }
        lobby = { x = 500.0, y = 80.0, z = 500.0 }
        spawns = [
            { x = 10.0, y = 64.0, z = 10.0 },
            { x = -10.0, y = 64.0, z = -10.0 },
        ]

        [[arenas]]
        name = "unfinished"
        center = { x = 0.0, y = 64.0, z = 0.0 }
    "#;

    #[test]
    fn test_from_toml() {
        let provider = StaticArenaProvider::from_toml(ARENAS, Path::new("arenas.toml")).unwrap();
        assert_eq!(provider.arenas().len(), 2);
        assert_eq!(provider.valid_count(), 1);

        let canyon = &provider.arenas()[0];
        assert_eq!(canyon.display_name(), "Red Canyon");
        assert_eq!(canyon.max_players, 40);
        assert_eq!(canyon.spawns.len(), 2);
        assert_eq!(canyon.center, Some(Position::new(0.0, 64.0, 0.0)));

        let unfinished = &provider.arenas()[1];
        assert_eq!(unfinished.max_players, 100);
        assert!(unfinished.enabled);
    }

    #[test]
    fn test_pick_only_returns_valid_arenas() {
        let provider = StaticArenaProvider::from_toml(ARENAS, Path::new("arenas.toml")).unwrap();
        assert!(provider.valid_arena_exists());
        for _ in 0..20 {
            let picked = provider.pick_random_arena().unwrap();
            assert_eq!(picked.name, "canyon");
        }
    }

    #[test]
    fn test_no_valid_arena() {
        let provider = StaticArenaProvider::new(vec![Arena::new("empty")]);
        assert!(!provider.valid_arena_exists());
        assert!(provider.pick_random_arena().is_none());
    }

    #[test]
    fn test_pick_for_skips_small_arenas() {
        let spawned = |name: &str, max_players: usize| {
            Arena::new(name)
                .with_center(Position::ORIGIN)
                .with_lobby(Position::ORIGIN)
                .with_spawns(vec![Position::ORIGIN])
                .with_max_players(max_players)
        };
        let provider = StaticArenaProvider::new(vec![
            spawned("closet", 2),
            spawned("field", 40),
            Arena::new("unfinished"),
        ]);
        for _ in 0..20 {
            assert_eq!(provider.pick_arena_for(10).unwrap().name, "field");
        }
        assert!(provider.pick_arena_for(41).is_none());
    }

    #[test]
    fn test_parse_error_reports_path() {
        let err = StaticArenaProvider::from_toml("arenas = 5", Path::new("bad.toml")).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }
}
