//! # Crafting System
//!
//! **Transactional recipe exchange**
//!
//! 1. **Check first**: every cost entry must be covered before anything moves
//! 2. **All or nothing**: a declined craft leaves the ledger untouched
//! 3. **External configuration**: recipes are defined in TOML
//!
//! Cost entries are removed in list order and the result is added last. The
//! check and the exchange happen under the same `&mut Inventory`, so nothing
//! can interleave between them.
//!
//! ## Example
//!
//! ```rust,ignore
//! let receipt = book.craft(&mut inventory, "wooden_axe", &mut rng)?;
//! assert_eq!(receipt.produced.1, 1);
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::error::{EconomyError, EconomyResult};
use crate::inventory::Inventory;
use crate::item::{ItemDefinition, ItemKey};

/// Stable catalog key of a craft.
pub type CraftKey = String;

/// One entry of a craft cost.
///
/// An entry with no `amount` means one unit; for non-stackable items that
/// reads as "must own at least one".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostEntry {
    /// Item consumed.
    pub item: ItemKey,
    /// Units consumed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u32>,
}

impl CostEntry {
    /// Creates a cost entry.
    #[must_use]
    pub fn new(item: impl Into<ItemKey>, amount: u32) -> Self {
        Self {
            item: item.into(),
            amount: Some(amount),
        }
    }

    /// Creates a cost entry for a single unit.
    #[must_use]
    pub fn one(item: impl Into<ItemKey>) -> Self {
        Self {
            item: item.into(),
            amount: None,
        }
    }

    /// Units required, defaulting to one.
    #[inline]
    #[must_use]
    pub fn amount(&self) -> u32 {
        self.amount.unwrap_or(1)
    }
}

/// What a craft produces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CraftOutput {
    /// Produced item.
    pub item: ItemDefinition,
    /// Units produced.
    pub quantity: u32,
}

/// A crafting recipe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Craft {
    /// Unique craft key.
    pub key: CraftKey,
    /// Produced item and quantity.
    pub result: CraftOutput,
    /// Items consumed, in removal order. May be empty.
    pub cost: Vec<CostEntry>,
}

impl Craft {
    /// Units required per item, repeated entries summed, in order of first
    /// appearance.
    #[must_use]
    pub fn total_cost(&self) -> Vec<(&str, u32)> {
        let mut totals: Vec<(&str, u32)> = Vec::with_capacity(self.cost.len());
        for entry in &self.cost {
            match totals.iter_mut().find(|(item, _)| *item == entry.item) {
                Some((_, total)) => *total = total.saturating_add(entry.amount()),
                None => totals.push((entry.item.as_str(), entry.amount())),
            }
        }
        totals
    }
}

/// Units moved by a successful craft.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CraftReceipt {
    /// The craft that ran.
    pub craft: CraftKey,
    /// Items consumed as `(item, units)`, in cost order.
    pub consumed: Vec<(ItemKey, u32)>,
    /// Items produced.
    pub produced: (ItemKey, u32),
}

/// All recipes, keyed and in catalog order.
#[derive(Clone, Debug, Default)]
pub struct CraftBook {
    crafts: Vec<Craft>,
    index: HashMap<CraftKey, usize>,
}

impl CraftBook {
    /// Creates an empty craft book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a recipe.
    ///
    /// # Errors
    ///
    /// Returns error if the key already exists.
    pub fn add_craft(&mut self, craft: Craft) -> EconomyResult<()> {
        if self.index.contains_key(&craft.key) {
            return Err(EconomyError::InvalidConfig(format!(
                "craft {} already exists",
                craft.key
            )));
        }
        self.index.insert(craft.key.clone(), self.crafts.len());
        self.crafts.push(craft);
        Ok(())
    }

    /// Gets a recipe by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Craft> {
        self.index.get(key).map(|&i| &self.crafts[i])
    }

    /// Recipes in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Craft> {
        self.crafts.iter()
    }

    /// Number of recipes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.crafts.len()
    }

    /// Returns true if there are no recipes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.crafts.is_empty()
    }

    /// Checks whether the inventory covers a recipe's cost.
    ///
    /// # Errors
    ///
    /// - `UnknownCraft` if the key doesn't exist
    /// - `InsufficientResources` naming the first uncovered item, with the
    ///   amounts of repeated cost entries summed
    pub fn can_craft(&self, inventory: &Inventory, key: &str) -> EconomyResult<&Craft> {
        let craft = self
            .get(key)
            .ok_or_else(|| EconomyError::UnknownCraft(key.to_string()))?;

        for (item, required) in craft.total_cost() {
            if !inventory.has(item, required) {
                return Err(EconomyError::InsufficientResources {
                    item: item.to_string(),
                    required,
                    available: inventory.count(item),
                });
            }
        }

        Ok(craft)
    }

    /// Performs a craft.
    ///
    /// **ATOMIC**: either every cost entry is removed and the result added,
    /// or the inventory is left exactly as it was.
    ///
    /// # Errors
    ///
    /// - `UnknownCraft` if the key doesn't exist
    /// - `InsufficientResources` if any cost entry is not covered
    pub fn craft<R: Rng + ?Sized>(
        &self,
        inventory: &mut Inventory,
        key: &str,
        rng: &mut R,
    ) -> EconomyResult<CraftReceipt> {
        let craft = self.can_craft(inventory, key)?;

        let mut consumed = Vec::with_capacity(craft.cost.len());
        for entry in &craft.cost {
            let removed = inventory.remove(&entry.item, entry.amount());
            consumed.push((entry.item.clone(), removed));
        }

        inventory.add(&craft.result.item, craft.result.quantity, rng);
        debug!(craft = %craft.key, "craft completed");

        Ok(CraftReceipt {
            craft: craft.key.clone(),
            consumed,
            produced: (craft.result.item.id.clone(), craft.result.quantity),
        })
    }

    /// Finds a chain of recipes that turns an item back into itself.
    ///
    /// Loops are legal but worth a look when balancing: a loop with a net
    /// gain mints items from nothing.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<CraftKey>> {
        let mut consumers: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, craft) in self.crafts.iter().enumerate() {
            for entry in &craft.cost {
                consumers.entry(entry.item.as_str()).or_default().push(i);
            }
        }

        let mut visited = HashSet::new();
        let mut on_path = HashSet::new();
        let mut path = Vec::new();

        for start in 0..self.crafts.len() {
            if !visited.contains(&start) {
                if let Some(cycle) =
                    self.dfs_find_cycle(start, &consumers, &mut visited, &mut on_path, &mut path)
                {
                    return Some(cycle.into_iter().map(|i| self.crafts[i].key.clone()).collect());
                }
            }
        }

        None
    }

    fn dfs_find_cycle(
        &self,
        craft: usize,
        consumers: &HashMap<&str, Vec<usize>>,
        visited: &mut HashSet<usize>,
        on_path: &mut HashSet<usize>,
        path: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        visited.insert(craft);
        on_path.insert(craft);
        path.push(craft);

        let output = self.crafts[craft].result.item.id.as_str();
        for &next in consumers.get(output).into_iter().flatten() {
            if on_path.contains(&next) {
                let start = path.iter().position(|&i| i == next).unwrap_or(0);
                let mut cycle = path[start..].to_vec();
                cycle.push(next);
                return Some(cycle);
            }
            if !visited.contains(&next) {
                if let Some(cycle) = self.dfs_find_cycle(next, consumers, visited, on_path, path) {
                    return Some(cycle);
                }
            }
        }

        path.pop();
        on_path.remove(&craft);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{EquipmentSlot, ItemKind, ToolType};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn resource(id: &str) -> ItemDefinition {
        ItemDefinition::new(id, id, format!("block:{id}"), true, ItemKind::Resource)
    }

    fn tool(id: &str, tool_type: ToolType) -> ItemDefinition {
        ItemDefinition::new(
            id,
            id,
            format!("item:{id}"),
            false,
            ItemKind::Tool {
                tool_type,
                damage: 20,
                equipment_slot: None,
            },
        )
    }

    fn create_test_book() -> CraftBook {
        let mut book = CraftBook::new();

        book.add_craft(Craft {
            key: "wooden_axe".to_string(),
            result: CraftOutput {
                item: tool("wooden_axe", ToolType::Axe),
                quantity: 1,
            },
            cost: vec![CostEntry::new("oak_log", 10)],
        })
        .unwrap();

        book.add_craft(Craft {
            key: "stone_axe".to_string(),
            result: CraftOutput {
                item: tool("stone_axe", ToolType::Axe),
                quantity: 1,
            },
            cost: vec![
                CostEntry::new("cobblestone", 15),
                CostEntry::new("oak_log", 5),
                CostEntry::one("wooden_axe"),
            ],
        })
        .unwrap();

        book.add_craft(Craft {
            key: "watermelon".to_string(),
            result: CraftOutput {
                item: ItemDefinition::new(
                    "watermelon",
                    "Watermelon",
                    "item:melon_slice",
                    true,
                    ItemKind::Generic,
                ),
                quantity: 2,
            },
            cost: Vec::new(),
        })
        .unwrap();

        book
    }

    #[test]
    fn test_craft_consumes_and_produces() {
        let book = create_test_book();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut inventory = Inventory::new();
        inventory.add(&resource("oak_log"), 10, &mut rng);

        let receipt = book.craft(&mut inventory, "wooden_axe", &mut rng).unwrap();

        assert_eq!(receipt.consumed, vec![("oak_log".to_string(), 10)]);
        assert_eq!(receipt.produced, ("wooden_axe".to_string(), 1));
        assert_eq!(inventory.count("oak_log"), 0);
        assert_eq!(inventory.count("wooden_axe"), 1);
        // The emptied log stack is gone, only the axe remains.
        assert_eq!(inventory.len(), 1);
    }

    #[test]
    fn test_declined_craft_leaves_inventory_untouched() {
        let book = create_test_book();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut inventory = Inventory::new();
        inventory.add(&resource("cobblestone"), 15, &mut rng);
        inventory.add(&resource("oak_log"), 5, &mut rng);
        let before = inventory.clone();

        // Everything but the wooden axe is present.
        let result = book.craft(&mut inventory, "stone_axe", &mut rng);

        assert_eq!(
            result,
            Err(EconomyError::InsufficientResources {
                item: "wooden_axe".to_string(),
                required: 1,
                available: 0,
            })
        );
        assert_eq!(inventory, before);
    }

    #[test]
    fn test_craft_consumes_non_stackable_input() {
        let book = create_test_book();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut inventory = Inventory::new();
        inventory.add(&resource("cobblestone"), 20, &mut rng);
        inventory.add(&resource("oak_log"), 5, &mut rng);
        inventory.add(&tool("wooden_axe", ToolType::Axe), 1, &mut rng);

        book.craft(&mut inventory, "stone_axe", &mut rng).unwrap();

        assert_eq!(inventory.count("wooden_axe"), 0);
        assert_eq!(inventory.count("stone_axe"), 1);
        assert_eq!(inventory.count("cobblestone"), 5);
        assert_eq!(inventory.count("oak_log"), 0);
    }

    #[test]
    fn test_empty_cost_always_crafts() {
        let book = create_test_book();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut inventory = Inventory::new();

        book.craft(&mut inventory, "watermelon", &mut rng).unwrap();
        book.craft(&mut inventory, "watermelon", &mut rng).unwrap();

        assert_eq!(inventory.count("watermelon"), 4);
        assert_eq!(inventory.len(), 1);
    }

    #[test]
    fn test_repeated_cost_entries_are_summed() {
        let mut book = CraftBook::new();
        book.add_craft(Craft {
            key: "campfire".to_string(),
            result: CraftOutput {
                item: resource("campfire"),
                quantity: 1,
            },
            cost: vec![CostEntry::new("oak_log", 5), CostEntry::new("oak_log", 5)],
        })
        .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut inventory = Inventory::new();
        inventory.add(&resource("oak_log"), 7, &mut rng);
        let before = inventory.clone();

        assert_eq!(
            book.craft(&mut inventory, "campfire", &mut rng),
            Err(EconomyError::InsufficientResources {
                item: "oak_log".to_string(),
                required: 10,
                available: 7,
            })
        );
        assert_eq!(inventory, before);

        inventory.add(&resource("oak_log"), 3, &mut rng);
        book.craft(&mut inventory, "campfire", &mut rng).unwrap();
        assert_eq!(inventory.count("oak_log"), 0);
        assert_eq!(inventory.count("campfire"), 1);
    }

    #[test]
    fn test_unknown_craft() {
        let book = create_test_book();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut inventory = Inventory::new();

        assert_eq!(
            book.craft(&mut inventory, "diamond_axe", &mut rng),
            Err(EconomyError::UnknownCraft("diamond_axe".to_string()))
        );
    }

    #[test]
    fn test_duplicate_craft_rejected() {
        let mut book = create_test_book();
        let again = book.get("wooden_axe").unwrap().clone();
        assert!(matches!(
            book.add_craft(again),
            Err(EconomyError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_upgrade_chain_has_no_cycle() {
        assert_eq!(create_test_book().find_cycle(), None);
    }

    #[test]
    fn test_detect_cycle() {
        let mut book = CraftBook::new();
        book.add_craft(Craft {
            key: "planks".to_string(),
            result: CraftOutput {
                item: resource("planks"),
                quantity: 4,
            },
            cost: vec![CostEntry::new("oak_log", 1)],
        })
        .unwrap();
        book.add_craft(Craft {
            key: "glued_log".to_string(),
            result: CraftOutput {
                item: resource("oak_log"),
                quantity: 1,
            },
            cost: vec![CostEntry::new("planks", 2)],
        })
        .unwrap();

        let cycle = book.find_cycle().unwrap();
        assert_eq!(cycle.first(), cycle.last());
        assert_eq!(cycle.len(), 3);
    }

    #[test]
    fn test_shield_slot_survives_craft() {
        let mut book = CraftBook::new();
        let shield = ItemDefinition::new(
            "shield",
            "Shield",
            "item:shield",
            false,
            ItemKind::Armor {
                defense: 2,
                equipment_slot: EquipmentSlot::OffHand,
            },
        );
        book.add_craft(Craft {
            key: "shield".to_string(),
            result: CraftOutput {
                item: shield,
                quantity: 1,
            },
            cost: vec![CostEntry::new("oak_log", 15)],
        })
        .unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut inventory = Inventory::new();
        inventory.add(&resource("oak_log"), 15, &mut rng);
        book.craft(&mut inventory, "shield", &mut rng).unwrap();

        let entry = inventory.iter().next().unwrap();
        assert_eq!(entry.item.equipment_slot(), Some(EquipmentSlot::OffHand));
    }
}
