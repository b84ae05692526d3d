//! Общие типы данных ботов
//!
//! Организация по доменам:
//! - actor: кто бот и состояние тела (BotIdentity, Intelligence, AgentState)
//! - command: исходящая команда (BotCommand, Buttons, LookAngles)
//! - world: идентификаторы и snapshot (WaypointId, PlayerSlot, PlayerSet, WorldSnapshot)
//! - flags: path/waypoint/entity flags
//! - items: EntityType, ItemHandle, ResourceKind, WeaponKind

pub mod actor;
pub mod command;
pub mod flags;
pub mod items;
pub mod world;

// Re-exports для удобного импорта
pub use actor::*;
pub use command::*;
pub use flags::*;
pub use items::*;
pub use world::*;
