//! Внешние коллабораторы bot core (только интерфейс, который нужен core)
//!
//! Core не знает про engine: граф, поиск пути, реестр предметов, line-of-sight и
//! правила мода приходят как `&dyn` handles. Все trait'ы `Send + Sync` — разные
//! боты могут тикаться параллельно, коллабораторы read-only.
//!
//! In-memory реализации (MemoryGraph, MemoryPathSearch, MemoryItems, OpenSight, BoxOccluders)
//! используются тестами и headless runner'ом.

use bevy::prelude::*;

use crate::bot::action::AtomicAction;
use crate::components::{
    AgentState, BotIdentity, EntityFlags, EntityType, ItemHandle, PathFlags, PlayerInfo,
    WaypointFlags, WaypointId,
};

pub mod memory_graph;
pub mod memory_items;
pub mod sight;

pub use memory_graph::{MemoryGraph, MemoryPathSearch};
pub use memory_items::MemoryItems;
pub use sight::{BoxOccluders, OpenSight};

/// Waypoint граф (precomputed, read-only)
pub trait WaypointGraph: Send + Sync {
    fn is_valid(&self, id: WaypointId) -> bool;
    fn position(&self, id: WaypointId) -> Option<Vec3>;
    fn flags(&self, id: WaypointId) -> WaypointFlags;
    /// Флаги ребра from → to (NONE если ребра нет)
    fn path_flags(&self, from: WaypointId, to: WaypointId) -> PathFlags;
    fn neighbors(&self, id: WaypointId) -> Vec<WaypointId>;
    /// Дешёвая проверка достижимости (компоненты связности)
    fn has_path(&self, from: WaypointId, to: WaypointId) -> bool;
    /// Ближайший waypoint к точке
    fn nearest(&self, point: Vec3) -> Option<WaypointId>;
}

/// Результат опроса поиска пути
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPoll {
    Pending,
    Done {
        next: WaypointId,
        after_next: Option<WaypointId>,
    },
    Failed,
}

/// Инкрементальный поиск пути (один на бота)
pub trait PathSearch: Send + Sync {
    fn start(&mut self, graph: &dyn WaypointGraph, from: WaypointId, to: WaypointId);
    /// Продвинуть поиск (ограниченная работа за вызов)
    fn poll(&mut self, graph: &dyn WaypointGraph) -> SearchPoll;
    /// Следующий waypoint после `id` в найденном пути
    fn waypoint_after(&self, id: WaypointId) -> Option<WaypointId>;
    fn cancel(&mut self);
    fn is_running(&self) -> bool;
}

/// Предмет/entity в реестре
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemInfo {
    pub handle: ItemHandle,
    pub position: Vec3,
    pub flags: EntityFlags,
    /// Радиус касания (pickup / "мешает пройти")
    pub radius: f32,
}

/// World/entity bookkeeping
pub trait ItemRegistry: Send + Sync {
    fn item(&self, handle: ItemHandle) -> Option<ItemInfo>;
    fn is_present(&self, handle: ItemHandle) -> bool;
    /// Ближайший предмет типа `kind` к `point`, исключая `exclude`
    fn nearest_item(&self, kind: EntityType, point: Vec3, exclude: &[ItemHandle]) -> Option<ItemInfo>;
    /// Объект в радиусе `radius` от `point`, который может мешать пройти
    fn disturbing_object(&self, point: Vec3, radius: f32) -> Option<ItemInfo>;
}

/// Line-of-sight тест (trace между двумя точками)
pub trait LineOfSight: Send + Sync {
    fn is_clear(&self, from: Vec3, to: Vec3) -> bool;
}

/// Как мод классифицирует entity для бота
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemClass {
    Ignore,
    Pickup,
    /// Можно сломать (атаковать)
    Breakable,
    /// Можно сдвинуть (USE + толкать)
    Pushable,
    /// Кнопка/дверь
    Usable,
}

/// Поза/режим движения на следующем сегменте пути
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostureRequest {
    pub duck: bool,
    pub walk: bool,
    pub sprint: bool,
    pub ladder: bool,
    pub stop: bool,
    pub flashlight: bool,
}

/// Что делать после касания waypoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrivalPlan {
    pub posture: PostureRequest,
    /// Actions для очереди (jump, duck, break, use)
    pub actions: Vec<AtomicAction>,
    /// Заблокировать movement пока actions не выполнены
    pub hold_movement: bool,
}

/// Всё, что мод знает о касании waypoint
pub struct WaypointArrival<'a> {
    pub bot: &'a BotIdentity,
    pub agent: &'a AgentState,
    pub waypoint: WaypointId,
    pub next: Option<WaypointId>,
    pub graph: &'a dyn WaypointGraph,
    /// USE у этого автомата уже был
    pub already_used: bool,
    pub dont_break_objects: bool,
    pub config: &'a crate::config::ActionConfig,
}

/// Mod-specific правила (deathmatch, team deathmatch, ...)
pub trait ModRules: Send + Sync {
    fn is_enemy(&self, bot: &BotIdentity, other: &PlayerInfo) -> bool;
    fn on_waypoint_arrival(&self, arrival: &WaypointArrival<'_>) -> ArrivalPlan;
    fn classify_item(&self, item: &ItemInfo) -> ItemClass;
}
