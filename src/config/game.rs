//! Gameplay settings: population thresholds, timers, zone and reward parameters
//!
//! Every field has a default, so a settings file only needs the values it overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::game::MatchMode;

use super::ConfigError;

/// Population thresholds for one mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeSettings {
    /// Queue size (and match population) that triggers a start
    pub min_players: usize,
    /// Upper bound on participants popped into one match
    pub max_players: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModesSettings {
    pub battle_royale: ModeSettings,
    pub resurgence: ModeSettings,
}

impl Default for ModesSettings {
    fn default() -> Self {
        Self {
            battle_royale: ModeSettings {
                min_players: 10,
                max_players: 100,
            },
            resurgence: ModeSettings {
                min_players: 8,
                max_players: 50,
            },
        }
    }
}

/// Match lifecycle timers, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerSettings {
    pub countdown_secs: u64,
    pub grace_period_secs: u64,
    /// Delay between ENDING and cleanup
    pub cleanup_delay_secs: u64,
    /// Delay between cleanup and removal from the active-match table
    pub retire_delay_secs: u64,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            countdown_secs: 15,
            grace_period_secs: 60,
            cleanup_delay_secs: 5,
            retire_delay_secs: 10,
        }
    }
}

/// Play-area controller parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneSettings {
    pub initial_radius: f64,
    pub final_radius: f64,
    /// Each stage targets `max(current * shrink_factor, final_radius)`
    pub shrink_factor: f64,
    /// Radius units removed per second while a stage animates
    pub shrink_rate: f64,
    /// Pause between the end of one stage and the start of the next
    pub shrink_interval_secs: u64,
    pub damage_per_tick: f64,
    pub damage_interval_ticks: u64,
    pub show_border: bool,
    pub border_interval_ticks: u64,
}

impl Default for ZoneSettings {
    fn default() -> Self {
        Self {
            initial_radius: 1000.0,
            final_radius: 50.0,
            shrink_factor: 0.6,
            shrink_rate: 1.0,
            shrink_interval_secs: 120,
            damage_per_tick: 2.0,
            damage_interval_ticks: 20,
            show_border: true,
            border_interval_ticks: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardSettings {
    pub enabled: bool,
}

impl Default for RewardSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    /// Period of the safety-net start check; joins already trigger a check synchronously
    pub recheck_interval_ms: u64,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            recheck_interval_ms: 1000,
        }
    }
}

/// All numeric gameplay parameters pushed into the orchestration core
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub modes: ModesSettings,
    pub timers: TimerSettings,
    pub zone: ZoneSettings,
    pub rewards: RewardSettings,
    pub queue: QueueSettings,
}

impl GameSettings {
    /// Read and validate a TOML settings file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Thresholds for the given mode
    pub fn mode(&self, mode: MatchMode) -> &ModeSettings {
        match mode {
            MatchMode::BattleRoyale => &self.modes.battle_royale,
            MatchMode::Resurgence => &self.modes.resurgence,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for mode in MatchMode::ALL {
            let limits = self.mode(mode);
            if limits.min_players == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{}: min_players must be at least 1",
                    mode.key()
                )));
            }
            if limits.min_players > limits.max_players {
                return Err(ConfigError::Invalid(format!(
                    "{}: min_players ({}) exceeds max_players ({})",
                    mode.key(),
                    limits.min_players,
                    limits.max_players
                )));
            }
        }

        let zone = &self.zone;
        if !(zone.final_radius >= 0.0 && zone.final_radius <= zone.initial_radius) {
            return Err(ConfigError::Invalid(format!(
                "zone.final_radius ({}) must be within 0..=initial_radius ({})",
                zone.final_radius, zone.initial_radius
            )));
        }
        if !(zone.shrink_factor > 0.0 && zone.shrink_factor < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "zone.shrink_factor ({}) must be strictly between 0 and 1",
                zone.shrink_factor
            )));
        }
        if !(zone.shrink_rate > 0.0 && zone.shrink_rate.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "zone.shrink_rate ({}) must be positive",
                zone.shrink_rate
            )));
        }
        if !(zone.damage_per_tick > 0.0 && zone.damage_per_tick.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "zone.damage_per_tick ({}) must be positive",
                zone.damage_per_tick
            )));
        }
        if zone.damage_interval_ticks == 0 || zone.border_interval_ticks == 0 {
            return Err(ConfigError::Invalid(
                "zone tick intervals must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let settings = GameSettings::default();
        assert_eq!(settings.mode(MatchMode::BattleRoyale).min_players, 10);
        assert_eq!(settings.mode(MatchMode::BattleRoyale).max_players, 100);
        assert_eq!(settings.mode(MatchMode::Resurgence).min_players, 8);
        assert_eq!(settings.mode(MatchMode::Resurgence).max_players, 50);
        assert_eq!(settings.timers.countdown_secs, 15);
        assert_eq!(settings.timers.grace_period_secs, 60);
        assert_eq!(settings.zone.initial_radius, 1000.0);
        assert_eq!(settings.zone.final_radius, 50.0);
        assert_eq!(settings.zone.damage_interval_ticks, 20);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let raw = r#"
            [modes.battle_royale]
            min_players = 2
            max_players = 4

            [zone]
            final_radius = 10.0
        "#;
        let settings: GameSettings = toml::from_str(raw).unwrap();
        assert_eq!(settings.modes.battle_royale.min_players, 2);
        assert_eq!(settings.modes.battle_royale.max_players, 4);
        assert_eq!(settings.modes.resurgence.min_players, 8);
        assert_eq!(settings.zone.final_radius, 10.0);
        assert_eq!(settings.zone.initial_radius, 1000.0);
        assert_eq!(settings.timers.grace_period_secs, 60);
    }

    #[test]
    fn test_validate_rejects_inverted_population() {
        let mut settings = GameSettings::default();
        settings.modes.resurgence = ModeSettings {
            min_players: 12,
            max_players: 6,
        };
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_bad_zone() {
        let mut settings = GameSettings::default();
        settings.zone.final_radius = 2000.0;
        assert!(settings.validate().is_err());

        let mut settings = GameSettings::default();
        settings.zone.shrink_factor = 1.0;
        assert!(settings.validate().is_err());

        let mut settings = GameSettings::default();
        settings.zone.damage_interval_ticks = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nan_and_negative_rates() {
        for rate in [f64::NAN, -1.0, 0.0] {
            let mut settings = GameSettings::default();
            settings.zone.shrink_rate = rate;
            assert!(settings.validate().is_err(), "shrink_rate {rate}");
        }
        for damage in [f64::NAN, -2.0, f64::INFINITY] {
            let mut settings = GameSettings::default();
            settings.zone.damage_per_tick = damage;
            assert!(settings.validate().is_err(), "damage_per_tick {damage}");
        }
    }

    #[test]
    fn test_load_missing_file() {
        let err = GameSettings::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
