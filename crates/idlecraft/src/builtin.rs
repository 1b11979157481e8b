//! Catalogs compiled into the binary, for running without a data directory.

use idlecraft_economy::{Catalog, CatalogSources};

use crate::ages::AgeTrack;
use crate::error::GameResult;

/// Built-in `items.toml`.
pub const ITEMS: &str = include_str!("../../../data/items.toml");
/// Built-in `resources.toml`.
pub const RESOURCES: &str = include_str!("../../../data/resources.toml");
/// Built-in `crafts.toml`.
pub const CRAFTS: &str = include_str!("../../../data/crafts.toml");
/// Built-in `upgrades.toml`.
pub const UPGRADES: &str = include_str!("../../../data/upgrades.toml");
/// Built-in `ages.toml`.
pub const AGES: &str = include_str!("../../../data/ages.toml");

/// The built-in catalog sources.
#[must_use]
pub fn sources() -> CatalogSources<'static> {
    CatalogSources {
        items: ITEMS,
        resources: RESOURCES,
        crafts: CRAFTS,
        upgrades: UPGRADES,
    }
}

/// Parses the built-in catalogs.
///
/// # Errors
///
/// Only if the shipped data is broken.
pub fn catalog() -> GameResult<Catalog> {
    Ok(Catalog::from_sources(sources())?)
}

/// Parses the built-in ages.
///
/// # Errors
///
/// Only if the shipped data is broken.
pub fn ages() -> GameResult<AgeTrack> {
    AgeTrack::from_toml_str(AGES)
}
