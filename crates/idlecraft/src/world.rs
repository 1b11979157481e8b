//! # World
//!
//! The game state the economy core calls out to.
//!
//! [`World`] implements [`EconomyHooks`]: every ledger change becomes a
//! [`GameEvent`], used equipment goes into its slot, and consumable and
//! upgrade effects are resolved through the registries against
//! [`WorldState`].

use tracing::debug;

use idlecraft_economy::{
    EconomyHooks, Inventory, ItemDefinition, ItemEffect, ItemInstance, Upgrade,
};

use crate::ages::AgeTrack;
use crate::effects::{EffectRegistry, UpgradeEffectRegistry};
use crate::equipment::Equipment;
use crate::events::{EventSender, GameEvent};
use crate::yields::YieldTable;

/// Callback run after every addition to the ledger.
pub type AchievementHook = Box<dyn FnMut(&Inventory) + Send>;

/// State effect handlers may change.
#[derive(Clone, Debug)]
pub struct WorldState {
    /// Age progression.
    pub ages: AgeTrack,
    /// Yield multipliers.
    pub yields: YieldTable,
    /// Equipped items.
    pub equipment: Equipment,
}

impl WorldState {
    /// Fresh state at the first age.
    #[must_use]
    pub fn new(ages: AgeTrack) -> Self {
        Self {
            ages,
            yields: YieldTable::new(),
            equipment: Equipment::new(),
        }
    }

    /// Back to the first age with no multipliers and nothing equipped.
    pub fn reset(&mut self) {
        self.ages.reset();
        self.yields = YieldTable::new();
        self.equipment.clear();
    }
}

/// Economy hooks backed by the game world.
pub struct World {
    state: WorldState,
    effects: EffectRegistry,
    upgrade_effects: UpgradeEffectRegistry,
    events: EventSender,
    achievements: Option<AchievementHook>,
}

impl World {
    /// Creates a world with the built-in effect registries.
    #[must_use]
    pub fn new(ages: AgeTrack, events: EventSender) -> Self {
        Self {
            state: WorldState::new(ages),
            effects: EffectRegistry::with_builtins(),
            upgrade_effects: UpgradeEffectRegistry::with_builtins(),
            events,
            achievements: None,
        }
    }

    /// The world state.
    #[must_use]
    pub fn state(&self) -> &WorldState {
        &self.state
    }

    /// The world state, mutably.
    pub fn state_mut(&mut self) -> &mut WorldState {
        &mut self.state
    }

    /// Consumable effect handlers.
    pub fn effects_mut(&mut self) -> &mut EffectRegistry {
        &mut self.effects
    }

    /// Upgrade effect handlers.
    pub fn upgrade_effects_mut(&mut self) -> &mut UpgradeEffectRegistry {
        &mut self.upgrade_effects
    }

    /// Returns true if an upgrade effect id has a handler.
    #[must_use]
    pub fn has_upgrade_effect(&self, id: &str) -> bool {
        self.upgrade_effects.contains(id)
    }

    /// Returns true if a consumable effect id has a handler.
    #[must_use]
    pub fn has_effect(&self, id: &str) -> bool {
        self.effects.contains(id)
    }

    /// Installs the achievement check.
    pub fn set_achievement_hook(&mut self, hook: AchievementHook) {
        self.achievements = Some(hook);
    }

    /// Emits an event.
    pub fn emit(&self, event: GameEvent) {
        self.events.send(event);
    }
}

impl EconomyHooks for World {
    fn items_added(&mut self, item: &ItemDefinition, quantity: u32, inventory: &Inventory) {
        self.emit(GameEvent::ItemAdded {
            item: item.id.clone(),
            quantity,
            total: inventory.count(&item.id),
        });
        if let Some(check) = self.achievements.as_mut() {
            check(inventory);
        }
    }

    fn items_removed(&mut self, item: &str, removed: u32, inventory: &Inventory) {
        self.emit(GameEvent::ItemRemoved {
            item: item.to_string(),
            quantity: removed,
            total: inventory.count(item),
        });
        for (slot, instance) in self.state.equipment.prune(inventory) {
            debug!(?slot, item = %instance.id(), "equipped item left the inventory");
            self.emit(GameEvent::ItemUnequipped {
                slot,
                item: instance.item.id,
            });
        }
    }

    fn equip(&mut self, instance: &ItemInstance) {
        if let Some((slot, _)) = self.state.equipment.equip(instance.clone()) {
            self.emit(GameEvent::ItemEquipped {
                slot,
                item: instance.item.id.clone(),
                instance_id: instance.instance_id.clone(),
            });
        }
    }

    fn apply_effect(&mut self, value: Option<f64>, duration: Option<u64>, effect: &ItemEffect) {
        if self.effects.apply(&mut self.state, value, duration, effect) {
            self.emit(GameEvent::EffectApplied {
                effect: effect.id.clone(),
                duration,
            });
        }
    }

    fn apply_upgrade(&mut self, upgrade: &Upgrade, inventory: &mut Inventory) {
        let before = self.state.ages.current().key.clone();
        self.upgrade_effects.apply(&mut self.state, upgrade, inventory);

        let after = &self.state.ages.current().key;
        if *after != before {
            self.emit(GameEvent::AgeAdvanced {
                from: before,
                to: after.clone(),
            });
        }
    }
}
