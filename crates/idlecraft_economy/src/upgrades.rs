//! # Upgrade Tree
//!
//! One-shot unlocks paid for with items.
//!
//! `unlocked` only ever moves from `false` to `true`. The effect runs exactly
//! once, between paying the cost and flipping the flag, with mutable access to
//! the ledger and whatever game state the caller closes over.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use crate::error::{EconomyError, EconomyResult};
use crate::inventory::Inventory;
use crate::item::ItemKey;

/// Stable catalog key of an upgrade.
pub type UpgradeKey = String;

/// Price of an upgrade.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeCost {
    /// Item paid.
    pub item: ItemKey,
    /// Units paid.
    pub amount: u32,
}

/// Effect descriptor. The core never interprets it; the game resolves `id`
/// through its effect registry and reads the parameters it needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeEffect {
    /// Registry key of the effect handler.
    pub id: String,
    /// What the effect acts on (a resource type, an age, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Effect magnitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

/// An unlockable upgrade.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Upgrade {
    /// Unique upgrade key.
    pub key: UpgradeKey,
    /// Display name.
    pub name: String,
    /// Display description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Price.
    pub cost: UpgradeCost,
    /// Whether the upgrade has been bought.
    #[serde(default)]
    pub unlocked: bool,
    /// Applied once at unlock.
    pub effect: UpgradeEffect,
    /// Age the player must have reached. Enforced by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_requirement: Option<String>,
}

/// Result of an unlock attempt that was not declined.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// The cost was paid and the effect applied.
    Unlocked,
    /// Nothing happened; the upgrade was bought earlier.
    AlreadyUnlocked,
}

/// All upgrades, keyed and in catalog order.
#[derive(Clone, Debug, Default)]
pub struct UpgradeTree {
    upgrades: Vec<Upgrade>,
    index: HashMap<UpgradeKey, usize>,
}

impl UpgradeTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an upgrade.
    ///
    /// # Errors
    ///
    /// Returns error if the key already exists.
    pub fn add_upgrade(&mut self, upgrade: Upgrade) -> EconomyResult<()> {
        if self.index.contains_key(&upgrade.key) {
            return Err(EconomyError::InvalidConfig(format!(
                "upgrade {} already exists",
                upgrade.key
            )));
        }
        self.index.insert(upgrade.key.clone(), self.upgrades.len());
        self.upgrades.push(upgrade);
        Ok(())
    }

    /// Gets an upgrade by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Upgrade> {
        self.index.get(key).map(|&i| &self.upgrades[i])
    }

    /// Upgrades in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Upgrade> {
        self.upgrades.iter()
    }

    /// Number of upgrades.
    #[must_use]
    pub fn len(&self) -> usize {
        self.upgrades.len()
    }

    /// Returns true if there are no upgrades.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.upgrades.is_empty()
    }

    /// Returns true if the upgrade exists and is unlocked.
    #[must_use]
    pub fn is_unlocked(&self, key: &str) -> bool {
        self.get(key).is_some_and(|u| u.unlocked)
    }

    /// Keys of every unlocked upgrade, for persistence.
    #[must_use]
    pub fn unlocked_keys(&self) -> Vec<UpgradeKey> {
        self.upgrades
            .iter()
            .filter(|u| u.unlocked)
            .map(|u| u.key.clone())
            .collect()
    }

    /// Marks persisted upgrades as unlocked without charging or applying them.
    ///
    /// # Errors
    ///
    /// Returns `UnknownUpgrade` for a key not in the tree; keys before it are
    /// already marked.
    pub fn restore_unlocked<'a>(
        &mut self,
        keys: impl IntoIterator<Item = &'a str>,
    ) -> EconomyResult<()> {
        for key in keys {
            let index = *self
                .index
                .get(key)
                .ok_or_else(|| EconomyError::UnknownUpgrade(key.to_string()))?;
            self.upgrades[index].unlocked = true;
        }
        Ok(())
    }

    /// Unlocks an upgrade.
    ///
    /// Pays the cost, runs `apply` with the upgrade and the ledger, then sets
    /// `unlocked`. An already unlocked upgrade is a no-op regardless of funds.
    ///
    /// # Errors
    ///
    /// - `UnknownUpgrade` if the key doesn't exist
    /// - `InsufficientResources` if the cost is not covered (nothing changes)
    pub fn unlock<F>(
        &mut self,
        key: &str,
        inventory: &mut Inventory,
        apply: F,
    ) -> EconomyResult<UnlockOutcome>
    where
        F: FnOnce(&Upgrade, &mut Inventory),
    {
        let index = *self
            .index
            .get(key)
            .ok_or_else(|| EconomyError::UnknownUpgrade(key.to_string()))?;
        let upgrade = &mut self.upgrades[index];

        if upgrade.unlocked {
            return Ok(UnlockOutcome::AlreadyUnlocked);
        }

        let UpgradeCost { item, amount } = &upgrade.cost;
        if !inventory.has(item, *amount) {
            return Err(EconomyError::InsufficientResources {
                item: item.clone(),
                required: *amount,
                available: inventory.count(item),
            });
        }

        inventory.remove(item, *amount);
        apply(upgrade, inventory);
        upgrade.unlocked = true;
        info!(upgrade = %upgrade.key, "upgrade unlocked");

        Ok(UnlockOutcome::Unlocked)
    }
}
