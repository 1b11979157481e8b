//! # IDLECRAFT
//!
//! The main game crate: everything around the economy core.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                              Game                                │
//! │                                                                  │
//! │  ┌────────────┐    ┌──────────────────────┐    ┌──────────────┐  │
//! │  │  Mining    │───>│  Economy<World>      │───>│  EventBus    │  │
//! │  │  hp, crits │    │  ledger, crafts,     │    │  (UI drains) │  │
//! │  └────────────┘    │  upgrades, loot      │    └──────────────┘  │
//! │                    └──────────┬───────────┘                      │
//! │                               │ hooks                            │
//! │                    ┌──────────┴───────────┐                      │
//! │                    │  World               │                      │
//! │                    │  ages, yields,       │                      │
//! │                    │  equipment, effects  │                      │
//! │                    └──────────────────────┘                      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `ages`: Progression stages and the current collectible
//! - `config`: `game.toml`
//! - `effects`: Consumable and upgrade effect registries
//! - `equipment`: Equipment slots
//! - `events`: Event bus
//! - `game`: The game and its shared handle
//! - `mining`: Hit points, tool damage, critical hits
//! - `world`: Economy hooks
//! - `yields`: Yield multipliers

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod ages;
pub mod builtin;
pub mod config;
pub mod effects;
pub mod equipment;
pub mod error;
pub mod events;
pub mod game;
pub mod mining;
pub mod world;
pub mod yields;

// Re-export the core
pub use idlecraft_economy as economy;

// Re-export commonly used types
pub use ages::{Age, AgeKey, AgeTrack};
pub use config::{GameConfig, MiningConfig};
pub use effects::{EffectRegistry, UpgradeEffectRegistry};
pub use equipment::Equipment;
pub use error::{GameError, GameResult};
pub use events::{EventBus, EventReceiver, EventSender, GameEvent};
pub use game::{DropPreview, Game, GameHandle, GameState, MineOutcome};
pub use mining::{HitOutcome, Mining};
pub use world::{World, WorldState};
pub use yields::{TimedBoost, YieldTable};
