//! # Catalog Loading
//!
//! Static game data, loaded once at startup from TOML:
//!
//! | File             | Table         | Contents                 |
//! |------------------|---------------|--------------------------|
//! | `items.toml`     | `[[item]]`    | item definitions         |
//! | `resources.toml` | `[[resource]]`| resource nodes and loot  |
//! | `crafts.toml`    | `[[craft]]`   | crafting recipes         |
//! | `upgrades.toml`  | `[[upgrade]]` | upgrade tree             |
//!
//! Loot drops and craft results reference items by key; loading resolves
//! those keys against the item table and rejects anything dangling.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::crafting::{CostEntry, Craft, CraftBook, CraftKey, CraftOutput};
use crate::error::{EconomyError, EconomyResult};
use crate::item::{ItemDefinition, ItemKey, ToolType};
use crate::loot::{LootDrop, ResourceKey, ResourceNode};
use crate::upgrades::{Upgrade, UpgradeTree};

#[derive(Deserialize)]
struct ItemsFile {
    #[serde(default, rename = "item")]
    items: Vec<ItemDefinition>,
}

#[derive(Deserialize)]
struct ResourcesFile {
    #[serde(default, rename = "resource")]
    resources: Vec<RawResource>,
}

#[derive(Deserialize)]
struct RawResource {
    key: ResourceKey,
    name: String,
    texture: String,
    hp: u32,
    effective_tool: ToolType,
    #[serde(default)]
    loot: Vec<RawLootDrop>,
}

#[derive(Deserialize)]
struct RawLootDrop {
    item: ItemKey,
    min_quantity: u32,
    max_quantity: u32,
    chance: f64,
    #[serde(default)]
    resource_type: Option<ResourceKey>,
}

#[derive(Deserialize)]
struct CraftsFile {
    #[serde(default, rename = "craft")]
    crafts: Vec<RawCraft>,
}

#[derive(Deserialize)]
struct RawCraft {
    key: CraftKey,
    result: RawCraftResult,
    #[serde(default)]
    cost: Vec<CostEntry>,
}

#[derive(Deserialize)]
struct RawCraftResult {
    item: ItemKey,
    #[serde(default = "default_quantity")]
    quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

#[derive(Deserialize)]
struct UpgradesFile {
    #[serde(default, rename = "upgrade")]
    upgrades: Vec<Upgrade>,
}

/// Raw TOML text of the four catalog files.
#[derive(Clone, Copy, Debug, Default)]
pub struct CatalogSources<'a> {
    /// Contents of `items.toml`.
    pub items: &'a str,
    /// Contents of `resources.toml`.
    pub resources: &'a str,
    /// Contents of `crafts.toml`.
    pub crafts: &'a str,
    /// Contents of `upgrades.toml`.
    pub upgrades: &'a str,
}

/// Every static catalog, validated and cross-referenced.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    items: HashMap<ItemKey, ItemDefinition>,
    resources: HashMap<ResourceKey, ResourceNode>,
    crafts: CraftBook,
    upgrades: UpgradeTree,
}

impl Catalog {
    /// Loads `items.toml`, `resources.toml`, `crafts.toml` and
    /// `upgrades.toml` from a directory.
    ///
    /// # Errors
    ///
    /// Returns `Io` if a file can't be read, or any error of
    /// [`Catalog::from_sources`].
    pub fn from_dir(dir: impl AsRef<Path>) -> EconomyResult<Self> {
        let dir = dir.as_ref();
        let read = |name: &str| {
            let path = dir.join(name);
            fs::read_to_string(&path).map_err(|e| EconomyError::Io {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        };

        let items = read("items.toml")?;
        let resources = read("resources.toml")?;
        let crafts = read("crafts.toml")?;
        let upgrades = read("upgrades.toml")?;

        Self::from_sources(CatalogSources {
            items: &items,
            resources: &resources,
            crafts: &crafts,
            upgrades: &upgrades,
        })
    }

    /// Parses and validates catalog TOML.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for malformed TOML, duplicate keys, dangling
    /// item references, chances outside `[0, 1]` or `min > max` ranges.
    pub fn from_sources(sources: CatalogSources<'_>) -> EconomyResult<Self> {
        let items_file: ItemsFile = parse("items.toml", sources.items)?;
        let resources_file: ResourcesFile = parse("resources.toml", sources.resources)?;
        let crafts_file: CraftsFile = parse("crafts.toml", sources.crafts)?;
        let upgrades_file: UpgradesFile = parse("upgrades.toml", sources.upgrades)?;

        let mut catalog = Self::default();

        for item in items_file.items {
            catalog.add_item(item)?;
        }

        for raw in resources_file.resources {
            let node = catalog.resolve_resource(raw)?;
            if catalog.resources.contains_key(&node.key) {
                return Err(EconomyError::InvalidConfig(format!(
                    "resource {} already exists",
                    node.key
                )));
            }
            catalog.resources.insert(node.key.clone(), node);
        }

        for raw in crafts_file.crafts {
            let craft = catalog.resolve_craft(raw)?;
            catalog.crafts.add_craft(craft)?;
        }

        for upgrade in upgrades_file.upgrades {
            catalog.require_item(&upgrade.cost.item, &upgrade.key)?;
            catalog.upgrades.add_upgrade(upgrade)?;
        }

        if let Some(cycle) = catalog.crafts.find_cycle() {
            warn!(?cycle, "crafting recipes form a loop");
        }

        debug!(
            items = catalog.items.len(),
            resources = catalog.resources.len(),
            crafts = catalog.crafts.len(),
            upgrades = catalog.upgrades.len(),
            "catalog loaded"
        );

        Ok(catalog)
    }

    /// Adds an item definition.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or already exists.
    pub fn add_item(&mut self, item: ItemDefinition) -> EconomyResult<()> {
        if item.id.is_empty() {
            return Err(EconomyError::InvalidConfig(
                "item with an empty id".to_string(),
            ));
        }
        if self.items.contains_key(&item.id) {
            return Err(EconomyError::InvalidConfig(format!(
                "item {} already exists",
                item.id
            )));
        }
        self.items.insert(item.id.clone(), item);
        Ok(())
    }

    /// Looks up an item definition.
    #[must_use]
    pub fn item(&self, id: &str) -> Option<&ItemDefinition> {
        self.items.get(id)
    }

    /// All item definitions.
    pub fn items(&self) -> impl Iterator<Item = &ItemDefinition> {
        self.items.values()
    }

    /// Looks up a resource node.
    #[must_use]
    pub fn resource(&self, key: &str) -> Option<&ResourceNode> {
        self.resources.get(key)
    }

    /// All resource nodes.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceNode> {
        self.resources.values()
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

    /// Splits the catalog into its parts.
    #[must_use]
    pub fn into_parts(
        self,
    ) -> (
        HashMap<ItemKey, ItemDefinition>,
        HashMap<ResourceKey, ResourceNode>,
        CraftBook,
        UpgradeTree,
    ) {
        (self.items, self.resources, self.crafts, self.upgrades)
    }

    fn require_item(&self, id: &str, referenced_by: &str) -> EconomyResult<&ItemDefinition> {
        self.items.get(id).ok_or_else(|| {
            EconomyError::InvalidConfig(format!("{referenced_by} references unknown item {id}"))
        })
    }

    fn resolve_resource(&self, raw: RawResource) -> EconomyResult<ResourceNode> {
        let mut loot_table = Vec::with_capacity(raw.loot.len());
        for drop in raw.loot {
            if !(0.0..=1.0).contains(&drop.chance) {
                return Err(EconomyError::InvalidConfig(format!(
                    "{}: drop chance {} outside [0, 1]",
                    raw.key, drop.chance
                )));
            }
            if drop.min_quantity > drop.max_quantity {
                return Err(EconomyError::InvalidConfig(format!(
                    "{}: min_quantity {} exceeds max_quantity {}",
                    raw.key, drop.min_quantity, drop.max_quantity
                )));
            }
            let item = self.require_item(&drop.item, &raw.key)?.clone();
            loot_table.push(LootDrop {
                item,
                min_quantity: drop.min_quantity,
                max_quantity: drop.max_quantity,
                chance: drop.chance,
                resource_type: drop.resource_type,
            });
        }

        Ok(ResourceNode {
            key: raw.key,
            name: raw.name,
            texture: raw.texture,
            hp: raw.hp,
            effective_tool: raw.effective_tool,
            loot_table,
        })
    }

    fn resolve_craft(&self, raw: RawCraft) -> EconomyResult<Craft> {
        for (i, entry) in raw.cost.iter().enumerate() {
            self.require_item(&entry.item, &raw.key)?;
            if raw.cost[..i].iter().any(|earlier| earlier.item == entry.item) {
                return Err(EconomyError::InvalidConfig(format!(
                    "{}: cost lists {} more than once",
                    raw.key, entry.item
                )));
            }
        }
        let item = self.require_item(&raw.result.item, &raw.key)?.clone();

        Ok(Craft {
            key: raw.key,
            result: CraftOutput {
                item,
                quantity: raw.result.quantity,
            },
            cost: raw.cost,
        })
    }
}

fn parse<T: for<'de> Deserialize<'de>>(file: &str, source: &str) -> EconomyResult<T> {
    toml::from_str(source).map_err(|e| EconomyError::InvalidConfig(format!("{file}: {e}")))
}
