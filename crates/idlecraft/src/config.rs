//! # Game Configuration
//!
//! `game.toml`: where the catalogs live, how the RNG is seeded and how
//! mining hits are scored. Every key has a default, so an empty file is a
//! valid configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{GameError, GameResult};

/// Default event bus capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Default damage dealt without a matching tool.
pub const DEFAULT_BARE_HAND_DAMAGE: u32 = 10;

/// Default critical hit chance.
pub const DEFAULT_CRIT_CHANCE: f64 = 0.05;

/// Default critical damage multiplier.
pub const DEFAULT_CRIT_MULTIPLIER: u32 = 2;

/// Top-level game configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Directory holding `items.toml`, `resources.toml`, `crafts.toml`,
    /// `upgrades.toml` and `ages.toml`.
    pub data_dir: PathBuf,
    /// Fixed RNG seed; `None` derives one from the clock.
    pub seed: Option<u64>,
    /// Bounded capacity of the event bus.
    pub event_capacity: usize,
    /// Hit scoring.
    pub mining: MiningConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            seed: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            mining: MiningConfig::default(),
        }
    }
}

/// Mining hit scoring.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    /// Damage per hit without a tool in the node's effective slot.
    pub bare_hand_damage: u32,
    /// Chance in `[0, 1]` that a hit is critical.
    pub crit_chance: f64,
    /// Damage multiplier of a critical hit.
    pub crit_multiplier: u32,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            bare_hand_damage: DEFAULT_BARE_HAND_DAMAGE,
            crit_chance: DEFAULT_CRIT_CHANCE,
            crit_multiplier: DEFAULT_CRIT_MULTIPLIER,
        }
    }
}

impl GameConfig {
    /// Parses and validates a configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for malformed TOML or out-of-range values.
    pub fn from_toml_str(source: &str) -> GameResult<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| GameError::InvalidConfig(format!("game.toml: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file can't be read, or any error of
    /// [`GameConfig::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> GameResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| GameError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first bad value.
    pub fn validate(&self) -> GameResult<()> {
        if self.event_capacity == 0 {
            return Err(GameError::InvalidConfig(
                "event_capacity must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mining.crit_chance) {
            return Err(GameError::InvalidConfig(format!(
                "crit_chance {} outside [0, 1]",
                self.mining.crit_chance
            )));
        }
        if self.mining.crit_multiplier == 0 {
            return Err(GameError::InvalidConfig(
                "crit_multiplier must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// The configured seed, or one derived from the system clock.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn seed_or_clock(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_nanos() as u64)
        })
    }
}
