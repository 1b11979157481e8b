//! # Economy Service
//!
//! Owns the ledger, the static catalogs, the RNG and the filter state.
//!
//! Every mutation takes `&mut self`: the check and the change it guards run
//! inside one exclusive borrow, so no caller ever observes half a craft or
//! half an unlock. Side effects the core doesn't own (achievements, equipment,
//! effects) go out through [`EconomyHooks`].

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::crafting::{Craft, CraftBook, CraftReceipt};
use crate::error::{EconomyError, EconomyResult};
use crate::inventory::{Inventory, InventoryFilters, ItemInstance};
use crate::item::{ItemDefinition, ItemEffect, ItemKey, ItemKind};
use crate::loot::{roll_node, ResourceKey, ResourceNode, YieldMultiplier};
use crate::upgrades::{UnlockOutcome, Upgrade, UpgradeKey, UpgradeTree};

/// Callbacks into the surrounding game. Every method defaults to doing nothing.
pub trait EconomyHooks {
    /// Called after units were added to the ledger. This is where
    /// achievement checks run.
    fn items_added(&mut self, _item: &ItemDefinition, _quantity: u32, _inventory: &Inventory) {}

    /// Called after units were removed from the ledger.
    fn items_removed(&mut self, _item: &str, _removed: u32, _inventory: &Inventory) {}

    /// Called when a tool, weapon or armor entry is used.
    fn equip(&mut self, _instance: &ItemInstance) {}

    /// Called when a consumable is used, before any unit is consumed.
    fn apply_effect(&mut self, _value: Option<f64>, _duration: Option<u64>, _effect: &ItemEffect) {}

    /// Called once per unlock, after the cost was paid.
    fn apply_upgrade(&mut self, _upgrade: &Upgrade, _inventory: &mut Inventory) {}
}

impl EconomyHooks for () {}

/// What using an item did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UseOutcome {
    /// The entry was handed to the equip hook.
    Equipped,
    /// The effect ran; `consumed` is true if one unit was removed.
    Applied {
        /// Whether a unit was removed.
        consumed: bool,
    },
    /// Generic and resource items do nothing when used.
    Unusable,
}

/// Persisted economy state: the ledger and the unlocked upgrade keys.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EconomyState {
    /// Ledger entries with their instance ids.
    pub inventory: Inventory,
    /// Keys of unlocked upgrades.
    #[serde(default)]
    pub unlocked: Vec<UpgradeKey>,
}

/// The economy core.
pub struct Economy<H = ()> {
    items: HashMap<ItemKey, ItemDefinition>,
    resources: HashMap<ResourceKey, ResourceNode>,
    crafts: CraftBook,
    upgrades: UpgradeTree,
    inventory: Inventory,
    filters: InventoryFilters,
    rng: ChaCha8Rng,
    hooks: H,
}

impl<H: EconomyHooks> Economy<H> {
    /// Creates an economy with an empty ledger.
    #[must_use]
    pub fn new(catalog: Catalog, seed: u64, hooks: H) -> Self {
        let (items, resources, crafts, upgrades) = catalog.into_parts();
        Self {
            items,
            resources,
            crafts,
            upgrades,
            inventory: Inventory::new(),
            filters: InventoryFilters::initial(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            hooks,
        }
    }

    // ========================================================================
    // Ledger
    // ========================================================================

    /// Adds units of an item, then notifies the hooks. Never fails.
    pub fn add_item(&mut self, item: &ItemDefinition, quantity: u32) {
        if self.inventory.add(item, quantity, &mut self.rng).is_some() {
            let added = item.units_added(quantity);
            debug!(item = %item.id, added, "items added");
            self.hooks.items_added(item, added, &self.inventory);
        }
    }

    /// Adds units of a catalog item by key.
    ///
    /// # Errors
    ///
    /// Returns `UnknownItem` if the key is not in the catalog.
    pub fn grant(&mut self, item_id: &str, quantity: u32) -> EconomyResult<()> {
        let item = self
            .items
            .get(item_id)
            .ok_or_else(|| EconomyError::UnknownItem(item_id.to_string()))?;
        if self.inventory.add(item, quantity, &mut self.rng).is_some() {
            let added = item.units_added(quantity);
            debug!(item = %item.id, added, "items added");
            self.hooks.items_added(item, added, &self.inventory);
        }
        Ok(())
    }

    /// Removes up to `quantity` units of an item. Returns the units removed.
    pub fn remove_item(&mut self, item_id: &str, quantity: u32) -> u32 {
        let removed = self.inventory.remove(item_id, quantity);
        if removed > 0 {
            debug!(item = item_id, removed, "items removed");
            self.hooks.items_removed(item_id, removed, &self.inventory);
        }
        removed
    }

    /// Uses a ledger entry.
    ///
    /// # Errors
    ///
    /// Returns `UnknownInstance` if no entry has this instance id.
    pub fn use_item(&mut self, instance_id: &str) -> EconomyResult<UseOutcome> {
        let instance = self
            .inventory
            .get(instance_id)
            .cloned()
            .ok_or_else(|| EconomyError::UnknownInstance(instance_id.to_string()))?;

        match &instance.item.kind {
            ItemKind::Tool { .. } | ItemKind::Weapon { .. } | ItemKind::Armor { .. } => {
                self.hooks.equip(&instance);
                Ok(UseOutcome::Equipped)
            }
            ItemKind::Consumable {
                effect,
                consume_on_use,
            } => {
                self.hooks.apply_effect(effect.value, effect.duration, effect);
                let consumed = *consume_on_use && self.remove_item(instance.id(), 1) > 0;
                Ok(UseOutcome::Applied { consumed })
            }
            ItemKind::Generic | ItemKind::Resource => {
                info!(item = %instance.id(), "unusable item");
                Ok(UseOutcome::Unusable)
            }
        }
    }

    /// Returns true if at least `amount` units of the item are held.
    #[must_use]
    pub fn has_item(&self, item_id: &str, amount: u32) -> bool {
        self.inventory.has(item_id, amount)
    }

    /// Total units held of an item.
    #[must_use]
    pub fn item_count(&self, item_id: &str) -> u32 {
        self.inventory.count(item_id)
    }

    // ========================================================================
    // Filters
    // ========================================================================

    /// Entries passing the current filters.
    #[must_use]
    pub fn filtered_items(&self) -> Vec<&ItemInstance> {
        self.inventory.filtered(&self.filters)
    }

    /// Entries passing the given filters. The stored state is not touched.
    #[must_use]
    pub fn filtered_with(&self, filters: &InventoryFilters) -> Vec<&ItemInstance> {
        self.inventory.filtered(filters)
    }

    /// The current filter state.
    #[must_use]
    pub fn filters(&self) -> &InventoryFilters {
        &self.filters
    }

    /// Patches the filter state. Fields the closure leaves alone keep their
    /// values.
    pub fn set_filters(&mut self, patch: impl FnOnce(&mut InventoryFilters)) {
        patch(&mut self.filters);
    }

    /// Clears the search and sets every other filter back to "all".
    pub fn reset_filters(&mut self) {
        self.filters = InventoryFilters::default();
    }

    // ========================================================================
    // Crafting
    // ========================================================================

    /// Checks whether a craft is affordable.
    ///
    /// # Errors
    ///
    /// See [`CraftBook::can_craft`].
    pub fn can_craft(&self, key: &str) -> EconomyResult<&Craft> {
        self.crafts.can_craft(&self.inventory, key)
    }

    /// Performs a craft, then notifies the hooks about the produced items.
    ///
    /// # Errors
    ///
    /// See [`CraftBook::craft`]. A declined craft changes nothing.
    pub fn craft(&mut self, key: &str) -> EconomyResult<CraftReceipt> {
        let receipt = match self.crafts.craft(&mut self.inventory, key, &mut self.rng) {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(craft = key, error = %e, "craft declined");
                return Err(e);
            }
        };

        for (item, removed) in &receipt.consumed {
            self.hooks.items_removed(item, *removed, &self.inventory);
        }
        if let Some(craft) = self.crafts.get(key) {
            let item = &craft.result.item;
            self.hooks
                .items_added(item, item.units_added(craft.result.quantity), &self.inventory);
        }

        Ok(receipt)
    }

    // ========================================================================
    // Upgrades
    // ========================================================================

    /// Unlocks an upgrade, running its effect through the hooks.
    ///
    /// Age requirements are not checked here.
    ///
    /// # Errors
    ///
    /// See [`UpgradeTree::unlock`]. A declined unlock changes nothing.
    pub fn unlock_upgrade(&mut self, key: &str) -> EconomyResult<UnlockOutcome> {
        let hooks = &mut self.hooks;
        let result = self
            .upgrades
            .unlock(key, &mut self.inventory, |upgrade, inventory| {
                let cost = &upgrade.cost;
                hooks.items_removed(&cost.item, cost.amount, inventory);
                hooks.apply_upgrade(upgrade, inventory);
            });

        if let Err(e) = &result {
            warn!(upgrade = key, error = %e, "unlock declined");
        }
        result
    }

    // ========================================================================
    // Loot
    // ========================================================================

    /// Rolls a resource node's loot table and adds every successful drop.
    /// Returns the `(item, quantity)` grants in table order.
    ///
    /// # Errors
    ///
    /// Returns `UnknownResource` if the key is not in the catalog.
    pub fn resolve_break<Y>(
        &mut self,
        resource_key: &str,
        yields: &Y,
    ) -> EconomyResult<Vec<(ItemKey, u32)>>
    where
        Y: YieldMultiplier + ?Sized,
    {
        let node = self
            .resources
            .get(resource_key)
            .ok_or_else(|| EconomyError::UnknownResource(resource_key.to_string()))?;

        let grants = roll_node(node, &mut self.rng, yields);
        let mut granted = Vec::with_capacity(grants.len());
        for grant in grants {
            self.inventory.add(grant.item, grant.quantity, &mut self.rng);
            self.hooks
                .items_added(grant.item, grant.item.units_added(grant.quantity), &self.inventory);
            granted.push((grant.item.id.clone(), grant.quantity));
        }

        debug!(resource = resource_key, drops = granted.len(), "resource broken");
        Ok(granted)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The ledger.
    #[must_use]
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Looks up a catalog item.
    #[must_use]
    pub fn item(&self, id: &str) -> Option<&ItemDefinition> {
        self.items.get(id)
    }

    /// Looks up a resource node.
    #[must_use]
    pub fn resource(&self, key: &str) -> Option<&ResourceNode> {
        self.resources.get(key)
    }

    /// The recipes.
    #[must_use]
    pub fn crafts(&self) -> &CraftBook {
        &self.crafts
    }

    /// The upgrade tree.
    #[must_use]
    pub fn upgrades(&self) -> &UpgradeTree {
        &self.upgrades
    }

    /// The hooks.
    #[must_use]
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// The hooks, mutably.
    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Snapshot of the mutable state.
    #[must_use]
    pub fn save_state(&self) -> EconomyState {
        EconomyState {
            inventory: self.inventory.clone(),
            unlocked: self.upgrades.unlocked_keys(),
        }
    }

    /// Replaces the ledger and unlock flags with a saved snapshot.
    ///
    /// Restored upgrades replay their effect through
    /// [`EconomyHooks::apply_upgrade`] without being charged again.
    ///
    /// # Errors
    ///
    /// Returns `UnknownUpgrade` if the snapshot names an upgrade missing from
    /// the catalog; nothing is changed in that case.
    pub fn load_state(&mut self, state: EconomyState) -> EconomyResult<()> {
        let mut upgrades = self.upgrades.clone();
        upgrades.restore_unlocked(state.unlocked.iter().map(String::as_str))?;

        self.upgrades = upgrades;
        self.inventory = state.inventory;

        for key in &state.unlocked {
            if let Some(upgrade) = self.upgrades.get(key) {
                self.hooks.apply_upgrade(upgrade, &mut self.inventory);
            }
        }

        info!(
            entries = self.inventory.len(),
            unlocked = state.unlocked.len(),
            "economy state loaded"
        );
        Ok(())
    }
}
