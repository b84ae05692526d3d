//! World-level идентификаторы и snapshot: WaypointId, PlayerSlot, PlayerSet, WorldSnapshot
//!
//! Core не владеет миром — каждый тик получает read-only snapshot игроков.
//! Waypoint cursors везде `Option<WaypointId>` (None = invalid sentinel).

use std::fmt;

use bevy::prelude::*;

/// Максимум игроков на сервере (размер PlayerSet bitset)
pub const MAX_PLAYERS: usize = 64;

/// Команда без назначения (free-for-all: враги все)
pub const UNASSIGNED_TEAM: u8 = 0;

/// Id узла waypoint графа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub struct WaypointId(pub u32);

impl fmt::Display for WaypointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wp#{}", self.0)
    }
}

/// Слот игрока на сервере (0..MAX_PLAYERS)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub struct PlayerSlot(pub u8);

impl PlayerSlot {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// Bitset игроков, индексированный по PlayerSlot
///
/// Используется для seen/known enemies (два disjoint множества).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerSet(u64);

impl PlayerSet {
    pub const EMPTY: Self = Self(0);

    pub fn insert(&mut self, slot: PlayerSlot) {
        if slot.index() < MAX_PLAYERS {
            self.0 |= 1 << slot.index();
        }
    }

    pub fn remove(&mut self, slot: PlayerSlot) {
        if slot.index() < MAX_PLAYERS {
            self.0 &= !(1 << slot.index());
        }
    }

    pub fn contains(&self, slot: PlayerSlot) -> bool {
        slot.index() < MAX_PLAYERS && self.0 & (1 << slot.index()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub fn is_disjoint(&self, other: &PlayerSet) -> bool {
        self.0 & other.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = PlayerSlot> + '_ {
        (0..MAX_PLAYERS)
            .filter(|i| self.0 & (1 << i) != 0)
            .map(|i| PlayerSlot(i as u8))
    }
}

/// Один игрок в snapshot мира (бот или человек)
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInfo {
    pub slot: PlayerSlot,
    pub name: String,
    pub team: u8,
    /// Позиция ног (world coordinates, Y-up)
    pub position: Vec3,
    /// Высота глаз над position
    pub eye_height: f32,
    pub health: i32,
    pub alive: bool,
}

impl PlayerInfo {
    pub fn new(slot: PlayerSlot, team: u8, position: Vec3) -> Self {
        Self {
            slot,
            name: format!("player{}", slot.0),
            team,
            position,
            eye_height: 1.6,
            health: 100,
            alive: true,
        }
    }

    pub fn eye_position(&self) -> Vec3 {
        self.position + Vec3::Y * self.eye_height
    }

    /// Точка прицеливания: голова или центр корпуса
    pub fn aim_point(&self, head: bool) -> Vec3 {
        if head {
            self.eye_position()
        } else {
            self.position + Vec3::Y * (self.eye_height * 0.6)
        }
    }
}

/// Snapshot живых игроков (обновляется engine binding перед тиком ботов)
#[derive(Resource, Debug, Clone, Default)]
pub struct WorldSnapshot {
    pub players: Vec<PlayerInfo>,
}

impl WorldSnapshot {
    pub fn player(&self, slot: PlayerSlot) -> Option<&PlayerInfo> {
        self.players.iter().find(|p| p.slot == slot)
    }

    pub fn player_mut(&mut self, slot: PlayerSlot) -> Option<&mut PlayerInfo> {
        self.players.iter_mut().find(|p| p.slot == slot)
    }

    pub fn upsert(&mut self, info: PlayerInfo) {
        match self.player_mut(info.slot) {
            Some(existing) => *existing = info,
            None => self.players.push(info),
        }
    }

    pub fn remove(&mut self, slot: PlayerSlot) {
        self.players.retain(|p| p.slot != slot);
    }
}
