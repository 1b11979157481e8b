//! # Game
//!
//! Ties the economy core to the world around it.
//!
//! ```text
//! click / hotkey ──> Game ──> Mining (hp, damage, crits)
//!                      │          │ broken
//!                      │          v
//!                      └────> Economy<World> ──> hooks ──> EventBus
//! ```
//!
//! [`Game`] is single-owner: every operation takes `&mut self`. Share it
//! through a [`GameHandle`], which takes the lock once per operation.

use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use idlecraft_economy::{
    Catalog, CraftReceipt, Economy, EconomyError, EconomyState, Inventory, InventoryFilters,
    ItemDefinition, ItemInstance, ItemKey, ItemKind, UnlockOutcome, UseOutcome,
    YieldMultiplier,
};

use crate::ages::{Age, AgeKey, AgeTrack};
use crate::builtin;
use crate::config::GameConfig;
use crate::error::{GameError, GameResult};
use crate::events::{EventBus, EventReceiver, GameEvent};
use crate::mining::{HitOutcome, Mining};
use crate::world::World;

/// Result of hitting a resource node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MineOutcome {
    /// The hit.
    pub hit: HitOutcome,
    /// Loot granted if the node broke.
    pub drops: Vec<(ItemKey, u32)>,
}

/// One loot table row as shown before mining.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DropPreview {
    /// Item id.
    pub item: ItemKey,
    /// Item display name.
    pub name: String,
    /// Smallest quantity of a successful roll.
    pub min: u32,
    /// Largest quantity of a successful roll.
    pub max: u32,
    /// Drop chance in whole percent.
    pub chance_percent: u32,
}

/// Persisted game state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Ledger and unlocked upgrades.
    pub economy: EconomyState,
    /// Current age.
    pub age: AgeKey,
    /// Instance ids of equipped entries.
    #[serde(default)]
    pub equipped: Vec<String>,
}

/// The game.
pub struct Game {
    economy: Economy<World>,
    mining: Mining,
    rng: ChaCha8Rng,
    receiver: EventReceiver,
}

impl Game {
    /// Builds a game from a configuration and loaded catalogs.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration is out of range, an age
    /// collects a resource missing from the catalog, or an upgrade requires
    /// an unknown age.
    pub fn new(config: &GameConfig, catalog: Catalog, ages: AgeTrack) -> GameResult<Self> {
        config.validate()?;

        for age in ages.iter() {
            if catalog.resource(&age.collectible).is_none() {
                return Err(GameError::InvalidConfig(format!(
                    "age {} collects unknown resource {}",
                    age.key, age.collectible
                )));
            }
        }
        for upgrade in catalog.upgrades().iter() {
            if let Some(required) = &upgrade.age_requirement {
                if ages.position(required).is_none() {
                    return Err(GameError::InvalidConfig(format!(
                        "upgrade {} requires unknown age {required}",
                        upgrade.key
                    )));
                }
            }
        }

        let bus = EventBus::new(config.event_capacity);
        let world = World::new(ages, bus.sender());

        for upgrade in catalog.upgrades().iter() {
            if !world.has_upgrade_effect(&upgrade.effect.id) {
                warn!(upgrade = %upgrade.key, effect = %upgrade.effect.id, "upgrade effect has no handler");
            }
        }
        for item in catalog.items() {
            if let ItemKind::Consumable { effect, .. } = &item.kind {
                if !world.has_effect(&effect.id) {
                    warn!(item = %item.id, effect = %effect.id, "consumable effect has no handler");
                }
            }
        }

        let seed = config.seed_or_clock();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(1);

        info!(seed, "game created");

        Ok(Self {
            economy: Economy::new(catalog, seed, world),
            mining: Mining::new(config.mining),
            rng,
            receiver: bus.receiver(),
        })
    }

    /// Loads the catalogs and ages from `config.data_dir`.
    ///
    /// # Errors
    ///
    /// Any catalog, age or configuration error.
    pub fn from_config(config: &GameConfig) -> GameResult<Self> {
        let catalog = Catalog::from_dir(&config.data_dir)?;
        let ages = load_ages(&config.data_dir)?;
        Self::new(config, catalog, ages)
    }

    /// A game over the built-in catalogs with default settings.
    ///
    /// # Errors
    ///
    /// Only if the shipped data is broken.
    pub fn builtin(seed: u64) -> GameResult<Self> {
        let config = GameConfig {
            seed: Some(seed),
            ..GameConfig::default()
        };
        Self::new(&config, builtin::catalog()?, builtin::ages()?)
    }

    // ========================================================================
    // Inventory
    // ========================================================================

    /// Adds units of an item.
    pub fn add_item(&mut self, item: &ItemDefinition, quantity: u32) {
        self.economy.add_item(item, quantity);
    }

    /// Adds units of a catalog item by key.
    ///
    /// # Errors
    ///
    /// Returns `UnknownItem` if the key is not in the catalog.
    pub fn grant(&mut self, item_id: &str, quantity: u32) -> GameResult<()> {
        Ok(self.economy.grant(item_id, quantity)?)
    }

    /// Removes up to `quantity` units. Returns the units removed.
    pub fn remove_item(&mut self, item_id: &str, quantity: u32) -> u32 {
        self.economy.remove_item(item_id, quantity)
    }

    /// Uses an inventory entry: equips equipment, applies consumables.
    ///
    /// # Errors
    ///
    /// Returns `UnknownInstance` if no entry has this id.
    pub fn use_item(&mut self, instance_id: &str) -> GameResult<UseOutcome> {
        Ok(self.economy.use_item(instance_id)?)
    }

    /// Returns true if at least `amount` units are held.
    #[must_use]
    pub fn has_item(&self, item_id: &str, amount: u32) -> bool {
        self.economy.has_item(item_id, amount)
    }

    /// Total units held.
    #[must_use]
    pub fn item_count(&self, item_id: &str) -> u32 {
        self.economy.item_count(item_id)
    }

    /// Entries passing the current filters.
    #[must_use]
    pub fn filtered_items(&self) -> Vec<&ItemInstance> {
        self.economy.filtered_items()
    }

    /// Patches the filter state.
    pub fn set_filters(&mut self, patch: impl FnOnce(&mut InventoryFilters)) {
        self.economy.set_filters(patch);
    }

    /// Resets the filter state.
    pub fn reset_filters(&mut self) {
        self.economy.reset_filters();
    }

    /// The ledger.
    #[must_use]
    pub fn inventory(&self) -> &Inventory {
        self.economy.inventory()
    }

    // ========================================================================
    // Crafting & upgrades
    // ========================================================================

    /// Performs a craft.
    ///
    /// # Errors
    ///
    /// `UnknownCraft` or `InsufficientResources`; nothing changes then.
    pub fn craft(&mut self, key: &str) -> GameResult<CraftReceipt> {
        let receipt = self.economy.craft(key)?;
        let (item, quantity) = receipt.produced.clone();
        self.world().emit(GameEvent::ItemCrafted {
            craft: receipt.craft.clone(),
            item,
            quantity,
        });
        Ok(receipt)
    }

    /// Unlocks an upgrade once its age requirement is met.
    ///
    /// # Errors
    ///
    /// `AgeLocked` before the required age, otherwise whatever the economy
    /// core declines with. Nothing changes on error.
    pub fn unlock_upgrade(&mut self, key: &str) -> GameResult<UnlockOutcome> {
        let upgrade = self
            .economy
            .upgrades()
            .get(key)
            .ok_or_else(|| EconomyError::UnknownUpgrade(key.to_string()))?;

        if !upgrade.unlocked {
            if let Some(required) = &upgrade.age_requirement {
                let ages = &self.economy.hooks().state().ages;
                if !ages.has_reached(required) {
                    warn!(upgrade = key, required = %required, "upgrade is age locked");
                    return Err(GameError::AgeLocked {
                        upgrade: key.to_string(),
                        required: required.clone(),
                        current: ages.current().key.clone(),
                    });
                }
            }
        }

        let outcome = self.economy.unlock_upgrade(key)?;
        if outcome == UnlockOutcome::Unlocked {
            self.world().emit(GameEvent::UpgradeUnlocked {
                upgrade: key.to_string(),
            });
        }
        Ok(outcome)
    }

    // ========================================================================
    // Mining
    // ========================================================================

    /// Hits a resource node once, granting its loot if it breaks.
    ///
    /// # Errors
    ///
    /// Returns `UnknownResource` if the key is not in the catalog.
    pub fn hit(&mut self, resource_key: &str) -> GameResult<MineOutcome> {
        let node = self
            .economy
            .resource(resource_key)
            .ok_or_else(|| EconomyError::UnknownResource(resource_key.to_string()))?;
        let equipment = &self.economy.hooks().state().equipment;
        let hit = self.mining.hit(node, equipment, &mut self.rng);

        self.world().emit(GameEvent::ResourceHit {
            resource: resource_key.to_string(),
            damage: hit.damage,
            critical: hit.critical,
            hp_remaining: hit.hp_remaining,
        });

        let drops = if hit.broken {
            self.break_resource(resource_key)?
        } else {
            Vec::new()
        };
        Ok(MineOutcome { hit, drops })
    }

    /// Hits the current age's collectible resource.
    ///
    /// # Errors
    ///
    /// Only if the age names a resource missing from the catalog.
    pub fn mine_current(&mut self) -> GameResult<MineOutcome> {
        let key = self.current_age().collectible.clone();
        self.hit(&key)
    }

    /// Breaks the current age's collectible outright, skipping hit points.
    /// This is the hotkey path.
    ///
    /// # Errors
    ///
    /// Only if the age names a resource missing from the catalog.
    pub fn collect_current(&mut self) -> GameResult<Vec<(ItemKey, u32)>> {
        let key = self.current_age().collectible.clone();
        self.break_resource(&key)
    }

    /// Damage a regular hit on a node would deal right now.
    ///
    /// # Errors
    ///
    /// Returns `UnknownResource` if the key is not in the catalog.
    pub fn mining_damage(&self, resource_key: &str) -> GameResult<u32> {
        let node = self
            .economy
            .resource(resource_key)
            .ok_or_else(|| EconomyError::UnknownResource(resource_key.to_string()))?;
        Ok(self
            .mining
            .damage_for(node, &self.economy.hooks().state().equipment))
    }

    /// Current hit points of a node.
    ///
    /// # Errors
    ///
    /// Returns `UnknownResource` if the key is not in the catalog.
    pub fn resource_hp(&self, resource_key: &str) -> GameResult<u32> {
        let node = self
            .economy
            .resource(resource_key)
            .ok_or_else(|| EconomyError::UnknownResource(resource_key.to_string()))?;
        Ok(self.mining.current_hp(node))
    }

    /// The loot table of a node with quantities scaled by the current yields.
    ///
    /// # Errors
    ///
    /// Returns `UnknownResource` if the key is not in the catalog.
    pub fn preview(&self, resource_key: &str) -> GameResult<Vec<DropPreview>> {
        let node = self
            .economy
            .resource(resource_key)
            .ok_or_else(|| EconomyError::UnknownResource(resource_key.to_string()))?;
        let yields = &self.economy.hooks().state().yields;

        Ok(node
            .loot_table
            .iter()
            .map(|drop| {
                let (min, max) = drop.preview(drop.multiplier(yields));
                DropPreview {
                    item: drop.item.id.clone(),
                    name: drop.item.name.clone(),
                    min,
                    max,
                    chance_percent: drop.chance_percent(),
                }
            })
            .collect())
    }

    fn break_resource(&mut self, resource_key: &str) -> GameResult<Vec<(ItemKey, u32)>> {
        let yields = self.economy.hooks().state().yields.clone();
        let drops = self.economy.resolve_break(resource_key, &yields)?;
        self.world().emit(GameEvent::ResourceBroken {
            resource: resource_key.to_string(),
            drops: drops.clone(),
        });
        Ok(drops)
    }

    // ========================================================================
    // World
    // ========================================================================

    /// Advances timed effects. Returns the ids of effects that ran out.
    pub fn tick(&mut self, elapsed_ms: u64) -> Vec<String> {
        let world = self.economy.hooks_mut();
        let expired = world.state_mut().yields.tick(elapsed_ms);
        expired
            .into_iter()
            .map(|boost| {
                world.emit(GameEvent::EffectExpired {
                    effect: boost.source.clone(),
                });
                boost.source
            })
            .collect()
    }

    /// The age the player is in.
    #[must_use]
    pub fn current_age(&self) -> &Age {
        self.economy.hooks().state().ages.current()
    }

    /// Current yield multiplier of a resource.
    #[must_use]
    pub fn yield_multiplier(&self, resource: &str) -> f64 {
        self.economy.hooks().state().yields.multiplier(resource)
    }

    /// Installs the achievement check, run after every addition.
    pub fn on_items_added(&mut self, hook: impl FnMut(&Inventory) + Send + 'static) {
        self.economy.hooks_mut().set_achievement_hook(Box::new(hook));
    }

    /// A receiver for game events.
    #[must_use]
    pub fn events(&self) -> EventReceiver {
        self.receiver.clone()
    }

    /// The economy core.
    #[must_use]
    pub fn economy(&self) -> &Economy<World> {
        &self.economy
    }

    /// The world.
    #[must_use]
    pub fn world(&self) -> &World {
        self.economy.hooks()
    }

    /// The world, mutably (effect registration).
    pub fn world_mut(&mut self) -> &mut World {
        self.economy.hooks_mut()
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Snapshot of the mutable state.
    #[must_use]
    pub fn save_state(&self) -> GameState {
        let state = self.world().state();
        GameState {
            economy: self.economy.save_state(),
            age: state.ages.current().key.clone(),
            equipped: state
                .equipment
                .iter()
                .map(|(_, instance)| instance.instance_id.clone())
                .collect(),
        }
    }

    /// Restores a snapshot. Upgrade effects are replayed on a fresh world;
    /// hit points and timed effects start over.
    ///
    /// # Errors
    ///
    /// `UnknownAge` or `UnknownUpgrade` if the snapshot doesn't match the
    /// catalogs; nothing changes then.
    pub fn load_state(&mut self, state: GameState) -> GameResult<()> {
        if self.world().state().ages.position(&state.age).is_none() {
            return Err(GameError::UnknownAge(state.age));
        }
        if let Some(missing) = state
            .economy
            .unlocked
            .iter()
            .find(|key| self.economy.upgrades().get(key).is_none())
        {
            return Err(EconomyError::UnknownUpgrade(missing.clone()).into());
        }

        self.world_mut().state_mut().reset();
        self.mining.reset();
        self.economy.load_state(state.economy)?;
        self.world_mut().state_mut().ages.advance_to(&state.age)?;

        let equipped: Vec<ItemInstance> = state
            .equipped
            .iter()
            .filter_map(|id| self.economy.inventory().get(id).cloned())
            .collect();
        let equipment = &mut self.world_mut().state_mut().equipment;
        for instance in equipped {
            equipment.equip(instance);
        }
        Ok(())
    }
}

fn load_ages(data_dir: &Path) -> GameResult<AgeTrack> {
    let path = data_dir.join("ages.toml");
    let source = std::fs::read_to_string(&path).map_err(|e| GameError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    AgeTrack::from_toml_str(&source)
}

/// Shared, thread-safe handle to a game.
#[derive(Clone)]
pub struct GameHandle {
    inner: Arc<Mutex<Game>>,
    receiver: EventReceiver,
}

impl GameHandle {
    /// Wraps a game.
    #[must_use]
    pub fn new(game: Game) -> Self {
        let receiver = game.events();
        Self {
            inner: Arc::new(Mutex::new(game)),
            receiver,
        }
    }

    /// Runs a closure under the lock.
    pub fn with<T>(&self, f: impl FnOnce(&mut Game) -> T) -> T {
        f(&mut self.inner.lock())
    }

    /// See [`Game::craft`].
    ///
    /// # Errors
    ///
    /// See [`Game::craft`].
    pub fn craft(&self, key: &str) -> GameResult<CraftReceipt> {
        self.inner.lock().craft(key)
    }

    /// See [`Game::unlock_upgrade`].
    ///
    /// # Errors
    ///
    /// See [`Game::unlock_upgrade`].
    pub fn unlock_upgrade(&self, key: &str) -> GameResult<UnlockOutcome> {
        self.inner.lock().unlock_upgrade(key)
    }

    /// See [`Game::mine_current`].
    ///
    /// # Errors
    ///
    /// See [`Game::mine_current`].
    pub fn mine_current(&self) -> GameResult<MineOutcome> {
        self.inner.lock().mine_current()
    }

    /// See [`Game::collect_current`].
    ///
    /// # Errors
    ///
    /// See [`Game::collect_current`].
    pub fn collect_current(&self) -> GameResult<Vec<(ItemKey, u32)>> {
        self.inner.lock().collect_current()
    }

    /// See [`Game::tick`].
    pub fn tick(&self, elapsed_ms: u64) -> Vec<String> {
        self.inner.lock().tick(elapsed_ms)
    }

    /// See [`Game::item_count`].
    #[must_use]
    pub fn item_count(&self, item_id: &str) -> u32 {
        self.inner.lock().item_count(item_id)
    }

    /// Receiver for game events. Draining it doesn't take the game lock.
    #[must_use]
    pub fn events(&self) -> &EventReceiver {
        &self.receiver
    }
}
