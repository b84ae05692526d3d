//! Базовые компоненты агента: BotIdentity, Intelligence, AgentState

use std::fmt;

use bevy::prelude::*;

use super::world::{PlayerSlot, UNASSIGNED_TEAM};

/// Уровень интеллекта бота (difficulty tier)
///
/// Влияет на скорость поворота прицела, выбор головы/корпуса, приседание в бою.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Reflect)]
pub enum Intelligence {
    Fool,
    Stupid,
    #[default]
    Normal,
    Smart,
    Pro,
}

impl Intelligence {
    pub const ALL: [Intelligence; 5] = [
        Intelligence::Fool,
        Intelligence::Stupid,
        Intelligence::Normal,
        Intelligence::Smart,
        Intelligence::Pro,
    ];

    /// Индекс в таблицах конфига (turn speed и т.д.)
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Intelligence::Fool => "fool",
            Intelligence::Stupid => "stupid",
            Intelligence::Normal => "normal",
            Intelligence::Smart => "smart",
            Intelligence::Pro => "pro",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.as_str() == name)
    }
}

impl fmt::Display for Intelligence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Кто этот бот: слот, имя, команда, интеллект
#[derive(Debug, Clone, PartialEq)]
pub struct BotIdentity {
    pub slot: PlayerSlot,
    pub name: String,
    pub team: u8,
    pub intelligence: Intelligence,
}

impl BotIdentity {
    pub fn new(slot: PlayerSlot, name: impl Into<String>, intelligence: Intelligence) -> Self {
        Self {
            slot,
            name: name.into(),
            team: UNASSIGNED_TEAM,
            intelligence,
        }
    }

    pub fn with_team(mut self, team: u8) -> Self {
        self.team = team;
        self
    }
}

/// Состояние тела управляемого агента (пишет engine binding каждый тик)
///
/// Инвариант: 0 ≤ health ≤ max_health, 0 ≤ armor ≤ max_armor
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct AgentState {
    /// Позиция ног (Y-up)
    pub position: Vec3,
    pub eye_height: f32,
    pub health: i32,
    pub max_health: i32,
    pub armor: i32,
    pub max_armor: i32,
    pub alive: bool,
}

impl Default for AgentState {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

impl AgentState {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            eye_height: 1.6,
            health: 100,
            max_health: 100,
            armor: 0,
            max_armor: 100,
            alive: true,
        }
    }

    pub fn eye_position(&self) -> Vec3 {
        self.position + Vec3::Y * self.eye_height
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0 {
            return 0.0;
        }
        self.health as f32 / self.max_health as f32
    }

    pub fn needs_health(&self) -> bool {
        self.health < self.max_health
    }

    pub fn needs_armor(&self) -> bool {
        self.armor < self.max_armor
    }
}
