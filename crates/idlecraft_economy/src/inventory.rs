//! # Inventory Ledger
//!
//! Insertion-ordered item instances.
//!
//! Stackable definitions accumulate into one entry per item id.
//! Non-stackable definitions get one entry per unit, each with its own
//! instance id. A stackable entry never sits in the ledger at quantity zero:
//! removal deletes it instead.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::de::IntoDeserializer;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

use crate::error::{EconomyError, EconomyResult};
use crate::item::{EquipmentSlot, ItemDefinition, ItemType};

/// Length of generated instance ids.
pub const INSTANCE_ID_LEN: usize = 21;

/// Sentinel search string meaning "no search filter".
pub const SEARCH_ALL: &str = "all";

/// Sentinel type tag meaning "every type". Deserializes to `None`.
pub const TYPE_ALL: &str = "all";

/// An owned item in the ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemInstance {
    /// Unique id of this entry, distinct from the item's catalog id.
    pub instance_id: String,
    /// The catalog definition.
    pub item: ItemDefinition,
    /// Units held, present only for stackable definitions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

impl ItemInstance {
    /// Catalog id of the item.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.item.id
    }

    /// Units this entry represents. Non-stackable entries always count as one.
    #[inline]
    #[must_use]
    pub fn units(&self) -> u32 {
        if self.item.stackable {
            self.quantity.unwrap_or(1)
        } else {
            1
        }
    }
}

/// The player's inventory.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ItemInstance>", into = "Vec<ItemInstance>")]
pub struct Inventory {
    items: Vec<ItemInstance>,
}

impl Inventory {
    /// Creates an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds an inventory from persisted entries.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InvalidConfig` if an instance id is empty or
    /// repeated, a stackable entry carries no positive quantity, or a
    /// non-stackable entry carries any quantity.
    pub fn from_instances(items: Vec<ItemInstance>) -> EconomyResult<Self> {
        let mut seen = HashSet::with_capacity(items.len());
        for entry in &items {
            if entry.instance_id.is_empty() {
                return Err(EconomyError::InvalidConfig(format!(
                    "entry for {} has an empty instance id",
                    entry.id()
                )));
            }
            if !seen.insert(entry.instance_id.as_str()) {
                return Err(EconomyError::InvalidConfig(format!(
                    "duplicate instance id {}",
                    entry.instance_id
                )));
            }
            if entry.item.stackable && entry.quantity.unwrap_or(0) == 0 {
                return Err(EconomyError::InvalidConfig(format!(
                    "stackable entry {} has no quantity",
                    entry.instance_id
                )));
            }
            if !entry.item.stackable && entry.quantity.is_some() {
                return Err(EconomyError::InvalidConfig(format!(
                    "non-stackable entry {} carries a quantity",
                    entry.instance_id
                )));
            }
        }
        Ok(Self { items })
    }

    /// Number of entries (not units).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the ledger holds nothing.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All entries in insertion order.
    #[inline]
    #[must_use]
    pub fn items(&self) -> &[ItemInstance] {
        &self.items
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ItemInstance> {
        self.items.iter()
    }

    /// Finds an entry by instance id.
    #[must_use]
    pub fn get(&self, instance_id: &str) -> Option<&ItemInstance> {
        self.items.iter().find(|i| i.instance_id == instance_id)
    }

    /// Adds items to the ledger.
    ///
    /// Stackable items merge into the first entry with the same id, or open a
    /// new entry holding `quantity`. Non-stackable items always append exactly
    /// one entry, whatever `quantity` says.
    ///
    /// Returns the entry that received the units, or `None` when a stackable
    /// add of zero units left the ledger unchanged.
    pub fn add<R: Rng + ?Sized>(
        &mut self,
        item: &ItemDefinition,
        quantity: u32,
        rng: &mut R,
    ) -> Option<&ItemInstance> {
        if !item.stackable {
            let instance_id = self.fresh_instance_id(rng);
            self.items.push(ItemInstance {
                instance_id,
                item: item.clone(),
                quantity: None,
            });
            return self.items.last();
        }

        if quantity == 0 {
            return None;
        }

        if let Some(index) = self.items.iter().position(|i| i.item.id == item.id) {
            let entry = &mut self.items[index];
            entry.quantity = Some(entry.quantity.unwrap_or(0).saturating_add(quantity));
            return Some(&self.items[index]);
        }

        let instance_id = self.fresh_instance_id(rng);
        self.items.push(ItemInstance {
            instance_id,
            item: item.clone(),
            quantity: Some(quantity),
        });
        self.items.last()
    }

    /// Removes up to `quantity` units of an item, walking entries in order.
    ///
    /// Removing more than is held empties the item and stops; it is not an
    /// error. Returns the number of units actually removed.
    pub fn remove(&mut self, item_id: &str, quantity: u32) -> u32 {
        let mut remaining = quantity;
        let mut index = 0;

        while index < self.items.len() && remaining > 0 {
            let entry = &mut self.items[index];
            if entry.item.id != item_id {
                index += 1;
                continue;
            }

            match entry.quantity {
                Some(held) if entry.item.stackable && held > 0 => {
                    let taken = held.min(remaining);
                    remaining -= taken;
                    if held == taken {
                        self.items.remove(index);
                    } else {
                        entry.quantity = Some(held - taken);
                        index += 1;
                    }
                }
                _ => {
                    self.items.remove(index);
                    remaining -= 1;
                }
            }
        }

        quantity - remaining
    }

    /// Total units held of an item.
    #[must_use]
    pub fn count(&self, item_id: &str) -> u32 {
        self.items
            .iter()
            .filter(|i| i.item.id == item_id)
            .fold(0u32, |acc, i| acc.saturating_add(i.units()))
    }

    /// Returns true if at least `amount` units of the item are held.
    #[inline]
    #[must_use]
    pub fn has(&self, item_id: &str, amount: u32) -> bool {
        self.count(item_id) >= amount
    }

    /// Entries passing the filters, in ledger order. Never mutates.
    #[must_use]
    pub fn filtered(&self, filters: &InventoryFilters) -> Vec<&ItemInstance> {
        self.items.iter().filter(|i| filters.matches(i)).collect()
    }

    fn fresh_instance_id<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        loop {
            let candidate: String = (0..INSTANCE_ID_LEN)
                .map(|_| char::from(rng.sample(Alphanumeric)))
                .collect();
            if self.get(&candidate).is_none() {
                return candidate;
            }
        }
    }
}

impl TryFrom<Vec<ItemInstance>> for Inventory {
    type Error = EconomyError;

    fn try_from(items: Vec<ItemInstance>) -> EconomyResult<Self> {
        Self::from_instances(items)
    }
}

impl From<Inventory> for Vec<ItemInstance> {
    fn from(inventory: Inventory) -> Self {
        inventory.items
    }
}

/// Inventory view filters.
///
/// Only `search` and `item_type` are applied. `equipment_slot` and
/// `stackable` are carried for the view layer and not yet read here.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryFilters {
    /// Case-insensitive name substring; empty or `"all"` disables it.
    #[serde(default)]
    pub search: Option<String>,
    /// Exact type tag; `None` means all types. The serialized form also
    /// accepts `"all"`, read as `None`.
    #[serde(
        default,
        rename = "type",
        deserialize_with = "deserialize_type_filter",
        skip_serializing_if = "Option::is_none"
    )]
    pub item_type: Option<ItemType>,
    /// Equipment slot; `None` means all slots.
    #[serde(default)]
    pub equipment_slot: Option<EquipmentSlot>,
    /// Stackability; `None` means both.
    #[serde(default)]
    pub stackable: Option<bool>,
}

fn deserialize_type_filter<'de, D>(deserializer: D) -> Result<Option<ItemType>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(tag) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if tag == TYPE_ALL {
        return Ok(None);
    }
    ItemType::deserialize(tag.into_deserializer()).map(Some)
}

impl InventoryFilters {
    /// The initial filter state: search set to the `"all"` sentinel, every
    /// other field unrestricted.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            search: Some(SEARCH_ALL.to_string()),
            ..Self::default()
        }
    }

    /// Returns true if the entry passes the search and type filters.
    #[must_use]
    pub fn matches(&self, entry: &ItemInstance) -> bool {
        if let Some(search) = self.search.as_deref() {
            if !search.is_empty()
                && search != SEARCH_ALL
                && !entry
                    .item
                    .name
                    .to_lowercase()
                    .contains(&search.to_lowercase())
            {
                return false;
            }
        }

        if let Some(item_type) = self.item_type {
            if entry.item.item_type() != item_type {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemKind, ToolType};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    fn oak_log() -> ItemDefinition {
        ItemDefinition::new("oak_log", "Oak Log", "block:oak_log", true, ItemKind::Resource)
    }

    fn wooden_axe() -> ItemDefinition {
        ItemDefinition::new(
            "wooden_axe",
            "Wooden Axe",
            "item:wooden_axe",
            false,
            ItemKind::Tool {
                tool_type: ToolType::Axe,
                damage: 20,
                equipment_slot: None,
            },
        )
    }

    #[test]
    fn test_stackable_merges_into_one_entry() {
        let mut rng = rng();
        let mut inv = Inventory::new();
        inv.add(&oak_log(), 3, &mut rng);
        inv.add(&oak_log(), 4, &mut rng);
        inv.add(&oak_log(), 1, &mut rng);

        assert_eq!(inv.len(), 1);
        assert_eq!(inv.items()[0].quantity, Some(8));
        assert_eq!(inv.count("oak_log"), 8);
    }

    #[test]
    fn test_stackable_zero_add_is_noop() {
        let mut rng = rng();
        let mut inv = Inventory::new();
        assert!(inv.add(&oak_log(), 0, &mut rng).is_none());
        assert!(inv.is_empty());
    }

    #[test]
    fn test_non_stackable_adds_one_entry_per_call() {
        let mut rng = rng();
        let mut inv = Inventory::new();
        inv.add(&wooden_axe(), 5, &mut rng);
        inv.add(&wooden_axe(), 1, &mut rng);

        assert_eq!(inv.len(), 2);
        assert_eq!(inv.count("wooden_axe"), 2);
        assert_ne!(inv.items()[0].instance_id, inv.items()[1].instance_id);
        assert!(inv.items().iter().all(|i| i.quantity.is_none()));
        assert!(inv
            .items()
            .iter()
            .all(|i| i.instance_id.len() == INSTANCE_ID_LEN));
    }

    #[test]
    fn test_remove_partial_stack() {
        let mut rng = rng();
        let mut inv = Inventory::new();
        inv.add(&oak_log(), 10, &mut rng);

        assert_eq!(inv.remove("oak_log", 4), 4);
        assert_eq!(inv.count("oak_log"), 6);
        assert_eq!(inv.len(), 1);
    }

    #[test]
    fn test_remove_whole_stack_deletes_entry() {
        let mut rng = rng();
        let mut inv = Inventory::new();
        inv.add(&oak_log(), 10, &mut rng);

        inv.remove("oak_log", 10);
        assert!(inv.is_empty());
        assert_eq!(inv.count("oak_log"), 0);
    }

    #[test]
    fn test_remove_more_than_held_removes_everything() {
        let mut rng = rng();
        let mut inv = Inventory::new();
        inv.add(&oak_log(), 3, &mut rng);
        inv.add(&wooden_axe(), 1, &mut rng);

        assert_eq!(inv.remove("oak_log", 50), 3);
        assert_eq!(inv.count("oak_log"), 0);
        assert_eq!(inv.count("wooden_axe"), 1);
    }

    #[test]
    fn test_remove_non_stackable_spans_entries() {
        let mut rng = rng();
        let mut inv = Inventory::new();
        inv.add(&wooden_axe(), 1, &mut rng);
        inv.add(&oak_log(), 2, &mut rng);
        inv.add(&wooden_axe(), 1, &mut rng);
        inv.add(&wooden_axe(), 1, &mut rng);
        let last = inv.items()[3].instance_id.clone();

        assert_eq!(inv.remove("wooden_axe", 2), 2);
        assert_eq!(inv.count("wooden_axe"), 1);
        // Oldest entries go first.
        assert_eq!(inv.items()[1].instance_id, last);
        assert_eq!(inv.count("oak_log"), 2);
    }

    #[test]
    fn test_removal_conservation() {
        let mut rng = rng();
        for held in 0..6u32 {
            for take in 0..8u32 {
                let mut inv = Inventory::new();
                inv.add(&oak_log(), held, &mut rng);
                let before = inv.count("oak_log");
                inv.remove("oak_log", take);
                assert_eq!(inv.count("oak_log"), before - take.min(before));
                assert!(inv.items().iter().all(|i| i.units() > 0));
            }
        }
    }

    #[test]
    fn test_has_item() {
        let mut rng = rng();
        let mut inv = Inventory::new();
        inv.add(&oak_log(), 10, &mut rng);
        inv.add(&wooden_axe(), 1, &mut rng);

        assert!(inv.has("oak_log", 10));
        assert!(!inv.has("oak_log", 11));
        assert!(inv.has("wooden_axe", 1));
        assert!(!inv.has("cobblestone", 1));
        assert!(inv.has("cobblestone", 0));
    }

    #[test]
    fn test_filters_all_returns_everything_in_order() {
        let mut rng = rng();
        let mut inv = Inventory::new();
        inv.add(&wooden_axe(), 1, &mut rng);
        inv.add(&oak_log(), 2, &mut rng);
        let before = inv.clone();

        let all = inv.filtered(&InventoryFilters::initial());
        let ids: Vec<_> = all.iter().map(|i| i.instance_id.as_str()).collect();
        let expected: Vec<_> = before.iter().map(|i| i.instance_id.as_str()).collect();
        assert_eq!(ids, expected);

        let empty_search = InventoryFilters {
            search: Some(String::new()),
            ..InventoryFilters::default()
        };
        assert_eq!(inv.filtered(&empty_search).len(), 2);
        assert_eq!(inv, before);
    }

    #[test]
    fn test_filters_search_and_type() {
        let mut rng = rng();
        let mut inv = Inventory::new();
        inv.add(&wooden_axe(), 1, &mut rng);
        inv.add(&oak_log(), 2, &mut rng);

        let search = InventoryFilters {
            search: Some("WOOD".to_string()),
            ..InventoryFilters::default()
        };
        let hits = inv.filtered(&search);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), "wooden_axe");

        let resources = InventoryFilters {
            item_type: Some(ItemType::Resource),
            ..InventoryFilters::default()
        };
        let hits = inv.filtered(&resources);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), "oak_log");
    }

    #[test]
    fn test_filters_accept_all_type_tag() {
        let all: InventoryFilters = toml::from_str(
            r#"
            search = "all"
            type = "all"
        "#,
        )
        .unwrap();
        assert_eq!(all, InventoryFilters::initial());

        let tools: InventoryFilters = toml::from_str(r#"type = "tool""#).unwrap();
        assert_eq!(tools.item_type, Some(ItemType::Tool));

        assert!(toml::from_str::<InventoryFilters>(r#"type = "gem""#).is_err());
    }

    #[test]
    fn test_from_instances_rejects_duplicates() {
        let mut rng = rng();
        let mut inv = Inventory::new();
        inv.add(&wooden_axe(), 1, &mut rng);
        let mut items: Vec<ItemInstance> = inv.into();
        items.push(items[0].clone());

        assert!(matches!(
            Inventory::from_instances(items),
            Err(EconomyError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_instances_rejects_empty_stack() {
        let entry = ItemInstance {
            instance_id: "abc".to_string(),
            item: oak_log(),
            quantity: Some(0),
        };
        assert!(Inventory::from_instances(vec![entry]).is_err());
    }

    #[test]
    fn test_from_instances_rejects_quantity_on_single_item() {
        let entry = ItemInstance {
            instance_id: "abc".to_string(),
            item: wooden_axe(),
            quantity: Some(5),
        };
        assert_eq!(entry.units(), 1);
        assert!(matches!(
            Inventory::from_instances(vec![entry]),
            Err(EconomyError::InvalidConfig(_))
        ));

        let mut rng = rng();
        let mut inv = Inventory::new();
        inv.add(&wooden_axe(), 1, &mut rng);
        let restored = Inventory::from_instances(inv.clone().into()).unwrap();
        assert_eq!(restored.count("wooden_axe"), 1);
        assert_eq!(restored, inv);
    }
}
