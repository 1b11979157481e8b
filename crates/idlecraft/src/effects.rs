//! # Effect Registries
//!
//! Items and upgrades name their effect by id; the registries map each id to
//! a handler acting on the world state.
//!
//! ## Built-in consumable effects
//!
//! | id            | Reads              | Does                                  |
//! |---------------|--------------------|---------------------------------------|
//! | `yield_boost` | `value`, `duration`| timed multiplier on every resource    |
//!
//! ## Built-in upgrade effects
//!
//! | id            | Reads             | Does                              |
//! |---------------|-------------------|-----------------------------------|
//! | `scale_yield` | `target`, `value` | multiplies one resource's yield   |
//! | `advance_age` | `target`          | moves to a later age              |

use std::collections::HashMap;
use tracing::warn;

use idlecraft_economy::{Inventory, ItemEffect, Upgrade};

use crate::world::WorldState;
use crate::yields::TimedBoost;

/// Handler for a consumable effect: `(state, value, duration, descriptor)`.
pub type EffectHandler =
    Box<dyn Fn(&mut WorldState, Option<f64>, Option<u64>, &ItemEffect) + Send + Sync>;

/// Handler for an upgrade effect.
pub type UpgradeEffectHandler = Box<dyn Fn(&mut WorldState, &Upgrade, &mut Inventory) + Send + Sync>;

/// Consumable effects by id.
pub struct EffectRegistry {
    handlers: HashMap<String, EffectHandler>,
}

impl EffectRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Creates a registry with the built-in effects.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("yield_boost", |state, value, duration, effect| {
            let factor = value.unwrap_or(1.0);
            match duration {
                Some(remaining_ms) => state.yields.add_boost(TimedBoost {
                    source: effect.id.clone(),
                    resource: None,
                    factor,
                    remaining_ms,
                }),
                None => {
                    let resources: Vec<String> =
                        state.ages.iter().map(|a| a.collectible.clone()).collect();
                    for resource in resources {
                        state.yields.scale(&resource, factor);
                    }
                }
            }
        });
        registry
    }

    /// Registers a handler, replacing any handler with the same id.
    pub fn register<F>(&mut self, id: impl Into<String>, handler: F)
    where
        F: Fn(&mut WorldState, Option<f64>, Option<u64>, &ItemEffect) + Send + Sync + 'static,
    {
        self.handlers.insert(id.into(), Box::new(handler));
    }

    /// Returns true if an effect id has a handler.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.handlers.contains_key(id)
    }

    /// Runs the handler for an effect. Returns false if none is registered.
    pub fn apply(
        &self,
        state: &mut WorldState,
        value: Option<f64>,
        duration: Option<u64>,
        effect: &ItemEffect,
    ) -> bool {
        let Some(handler) = self.handlers.get(&effect.id) else {
            warn!(effect = %effect.id, "no handler for consumable effect");
            return false;
        };
        handler(state, value, duration, effect);
        true
    }
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Upgrade effects by id.
pub struct UpgradeEffectRegistry {
    handlers: HashMap<String, UpgradeEffectHandler>,
}

impl UpgradeEffectRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Creates a registry with the built-in effects.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();

        registry.register("scale_yield", |state, upgrade, _| {
            let effect = &upgrade.effect;
            match (effect.target.as_deref(), effect.value) {
                (Some(resource), Some(by)) => state.yields.scale(resource, by),
                _ => warn!(upgrade = %upgrade.key, "scale_yield needs a target and a value"),
            }
        });

        registry.register("advance_age", |state, upgrade, _| {
            let Some(age) = upgrade.effect.target.as_deref() else {
                warn!(upgrade = %upgrade.key, "advance_age needs a target");
                return;
            };
            if let Err(e) = state.ages.advance_to(age) {
                warn!(upgrade = %upgrade.key, error = %e, "advance_age failed");
            }
        });

        registry
    }

    /// Registers a handler, replacing any handler with the same id.
    pub fn register<F>(&mut self, id: impl Into<String>, handler: F)
    where
        F: Fn(&mut WorldState, &Upgrade, &mut Inventory) + Send + Sync + 'static,
    {
        self.handlers.insert(id.into(), Box::new(handler));
    }

    /// Returns true if an effect id has a handler.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.handlers.contains_key(id)
    }

    /// Runs the handler for an upgrade's effect. Returns false if none is
    /// registered.
    pub fn apply(&self, state: &mut WorldState, upgrade: &Upgrade, inventory: &mut Inventory) -> bool {
        let Some(handler) = self.handlers.get(&upgrade.effect.id) else {
            warn!(upgrade = %upgrade.key, effect = %upgrade.effect.id, "no handler for upgrade effect");
            return false;
        };
        handler(state, upgrade, inventory);
        true
    }
}

impl Default for UpgradeEffectRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ages::{Age, AgeTrack};
    use idlecraft_economy::{UpgradeCost, UpgradeEffect, YieldMultiplier};

    fn state() -> WorldState {
        let ages = AgeTrack::new(vec![
            Age {
                key: "wood".to_string(),
                name: "Wood Age".to_string(),
                collectible: "wood".to_string(),
            },
            Age {
                key: "stone".to_string(),
                name: "Stone Age".to_string(),
                collectible: "cobblestone".to_string(),
            },
        ])
        .unwrap();
        WorldState::new(ages)
    }

    fn upgrade(effect: &str, target: Option<&str>, value: Option<f64>) -> Upgrade {
        Upgrade {
            key: "test".to_string(),
            name: "Test".to_string(),
            description: None,
            cost: UpgradeCost {
                item: "oak_log".to_string(),
                amount: 1,
            },
            unlocked: false,
            effect: UpgradeEffect {
                id: effect.to_string(),
                target: target.map(str::to_string),
                value,
            },
            age_requirement: None,
        }
    }

    fn melon_effect(duration: Option<u64>) -> ItemEffect {
        ItemEffect {
            id: "yield_boost".to_string(),
            name: "Sugar Rush".to_string(),
            description: String::new(),
            icon: "effect:haste".to_string(),
            duration,
            value: Some(2.0),
        }
    }

    #[test]
    fn test_scale_yield() {
        let registry = UpgradeEffectRegistry::with_builtins();
        let mut state = state();
        let mut inventory = Inventory::new();

        assert!(registry.apply(&mut state, &upgrade("scale_yield", Some("wood"), Some(1.5)), &mut inventory));
        assert!((state.yields.multiplier("wood") - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_advance_age() {
        let registry = UpgradeEffectRegistry::with_builtins();
        let mut state = state();
        let mut inventory = Inventory::new();

        registry.apply(&mut state, &upgrade("advance_age", Some("stone"), None), &mut inventory);
        assert_eq!(state.ages.current().key, "stone");
    }

    #[test]
    fn test_unknown_upgrade_effect() {
        let registry = UpgradeEffectRegistry::with_builtins();
        let mut state = state();
        let mut inventory = Inventory::new();

        assert!(!registry.apply(&mut state, &upgrade("teleport", None, None), &mut inventory));
    }

    #[test]
    fn test_timed_yield_boost() {
        let registry = EffectRegistry::with_builtins();
        let mut state = state();
        let effect = melon_effect(Some(30_000));

        assert!(registry.apply(&mut state, effect.value, effect.duration, &effect));
        assert_eq!(state.yields.boosts().len(), 1);
        assert!((state.yields.multiplier("cobblestone") - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_permanent_yield_boost() {
        let registry = EffectRegistry::with_builtins();
        let mut state = state();
        let effect = melon_effect(None);

        registry.apply(&mut state, effect.value, effect.duration, &effect);
        assert!(state.yields.boosts().is_empty());
        assert!((state.yields.factor("wood") - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_custom_handler() {
        let mut registry = EffectRegistry::empty();
        registry.register("reset_age", |state, _, _, _| state.ages.reset());
        let mut state = state();
        state.ages.advance_to("stone").unwrap();

        let effect = ItemEffect {
            id: "reset_age".to_string(),
            ..melon_effect(None)
        };
        assert!(registry.apply(&mut state, None, None, &effect));
        assert_eq!(state.ages.current().key, "wood");
    }
}
