//! Item/entity типы: EntityType, ItemHandle, ResourceKind, WeaponKind

use std::fmt;

use bevy::prelude::*;

/// Класс world entity (индексирует per-type реестры предметов)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub enum EntityType {
    Health,
    Armor,
    Weapon,
    Ammo,
    Button,
    Door,
    /// Физический объект (ящик, бочка, стул)
    Object,
    Other,
}

impl EntityType {
    pub const COUNT: usize = 8;

    pub const ALL: [EntityType; Self::COUNT] = [
        EntityType::Health,
        EntityType::Armor,
        EntityType::Weapon,
        EntityType::Ammo,
        EntityType::Button,
        EntityType::Door,
        EntityType::Object,
        EntityType::Other,
    ];

    /// Типы, которые бот подбирает (отслеживаем pickup)
    pub const PICKUPS: [EntityType; 4] = [
        EntityType::Health,
        EntityType::Armor,
        EntityType::Weapon,
        EntityType::Ammo,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Health => "health",
            EntityType::Armor => "armor",
            EntityType::Weapon => "weapon",
            EntityType::Ammo => "ammo",
            EntityType::Button => "button",
            EntityType::Door => "door",
            EntityType::Object => "object",
            EntityType::Other => "other",
        }
    }
}

/// Ссылка на entity во внешнем реестре (тип + индекс в массиве типа)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub struct ItemHandle {
    pub kind: EntityType,
    pub index: u32,
}

impl ItemHandle {
    pub fn new(kind: EntityType, index: u32) -> Self {
        Self { kind, index }
    }
}

impl fmt::Display for ItemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind.as_str(), self.index)
    }
}

/// Ресурс агента, который восполняют автоматы (health/armor machine)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum ResourceKind {
    Health,
    Armor,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Health => "health",
            ResourceKind::Armor => "armor",
        }
    }
}

/// Тип оружия (определяет дистанцию боя и поведение)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum WeaponKind {
    /// Гравипушка — двигает объекты, не стреляет
    Physics,
    /// Ближний бой (монтировка)
    Manual,
    Grenade,
    Flash,
    Smoke,
    Remote,
    Pistol,
    Shotgun,
    Rifle,
    Sniper,
    Rocket,
}

impl WeaponKind {
    pub fn is_melee(self) -> bool {
        matches!(self, WeaponKind::Manual)
    }

    /// Оружие, которым можно атаковать врага
    pub fn is_offensive(self) -> bool {
        !matches!(self, WeaponKind::Physics | WeaponKind::Flash | WeaponKind::Smoke)
    }

    pub fn has_zoom(self) -> bool {
        matches!(self, WeaponKind::Sniper)
    }
}
