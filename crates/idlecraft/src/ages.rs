//! # Ages
//!
//! Progression stages. Each age names the resource node the player collects
//! while in it. The track only moves forward.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

use idlecraft_economy::ResourceKey;

use crate::error::{GameError, GameResult};

/// Stable key of an age (e.g. `stone`).
pub type AgeKey = String;

/// A progression stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Age {
    /// Unique age key.
    pub key: AgeKey,
    /// Display name.
    pub name: String,
    /// Resource node mined in this age.
    pub collectible: ResourceKey,
}

#[derive(Deserialize)]
struct AgesFile {
    #[serde(default, rename = "age")]
    ages: Vec<Age>,
}

/// The ordered ages and the player's position on them.
#[derive(Clone, Debug)]
pub struct AgeTrack {
    ages: Vec<Age>,
    current: usize,
}

impl AgeTrack {
    /// Creates a track starting at the first age.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if there are no ages or a key repeats.
    pub fn new(ages: Vec<Age>) -> GameResult<Self> {
        if ages.is_empty() {
            return Err(GameError::InvalidConfig("no ages defined".to_string()));
        }
        let mut seen = HashSet::new();
        for age in &ages {
            if !seen.insert(age.key.as_str()) {
                return Err(GameError::InvalidConfig(format!(
                    "age {} already exists",
                    age.key
                )));
            }
        }
        Ok(Self { ages, current: 0 })
    }

    /// Parses `ages.toml`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for malformed TOML, or any error of
    /// [`AgeTrack::new`].
    pub fn from_toml_str(source: &str) -> GameResult<Self> {
        let file: AgesFile = toml::from_str(source)
            .map_err(|e| GameError::InvalidConfig(format!("ages.toml: {e}")))?;
        Self::new(file.ages)
    }

    /// The age the player is in.
    #[must_use]
    pub fn current(&self) -> &Age {
        &self.ages[self.current]
    }

    /// Ages in order.
    pub fn iter(&self) -> impl Iterator<Item = &Age> {
        self.ages.iter()
    }

    /// Position of an age on the track.
    #[must_use]
    pub fn position(&self, key: &str) -> Option<usize> {
        self.ages.iter().position(|a| a.key == key)
    }

    /// Returns true if the player is in this age or a later one.
    #[must_use]
    pub fn has_reached(&self, key: &str) -> bool {
        self.position(key).is_some_and(|i| i <= self.current)
    }

    /// Moves to a later age. Moving to the current or an earlier age does
    /// nothing and returns `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAge` if the key is not on the track.
    pub fn advance_to(&mut self, key: &str) -> GameResult<bool> {
        let target = self
            .position(key)
            .ok_or_else(|| GameError::UnknownAge(key.to_string()))?;
        if target <= self.current {
            return Ok(false);
        }
        info!(from = %self.current().key, to = key, "age advanced");
        self.current = target;
        Ok(true)
    }

    /// Back to the first age.
    pub fn reset(&mut self) {
        self.current = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGES: &str = r#"
        [[age]]
        key = "wood"
        name = "Wood Age"
        collectible = "wood"

        [[age]]
        key = "stone"
        name = "Stone Age"
        collectible = "cobblestone"

        [[age]]
        key = "iron"
        name = "Iron Age"
        collectible = "iron"
    "#;

    #[test]
    fn test_starts_at_first_age() {
        let track = AgeTrack::from_toml_str(AGES).unwrap();
        assert_eq!(track.current().key, "wood");
        assert!(track.has_reached("wood"));
        assert!(!track.has_reached("stone"));
    }

    #[test]
    fn test_advance_only_moves_forward() {
        let mut track = AgeTrack::from_toml_str(AGES).unwrap();

        assert_eq!(track.advance_to("iron"), Ok(true));
        assert!(track.has_reached("stone"));
        assert_eq!(track.advance_to("stone"), Ok(false));
        assert_eq!(track.current().collectible, "iron");
        assert_eq!(
            track.advance_to("diamond"),
            Err(GameError::UnknownAge("diamond".to_string()))
        );
    }

    #[test]
    fn test_rejects_empty_and_duplicates() {
        assert!(AgeTrack::new(Vec::new()).is_err());

        let age = Age {
            key: "wood".to_string(),
            name: "Wood Age".to_string(),
            collectible: "wood".to_string(),
        };
        assert!(AgeTrack::new(vec![age.clone(), age]).is_err());
    }
}
