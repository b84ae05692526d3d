//! Bit flags для waypoint графа и entity: PathFlags, WaypointFlags, EntityFlags
//!
//! Path flag — metadata ребра графа (как проходить: crouch, jump, ladder...).
//! Waypoint flag — metadata узла (аптечка, автомат здоровья, кнопка...).

use std::ops::{BitOr, BitOrAssign};

use bevy::prelude::*;

macro_rules! flag_set {
    ($(#[$meta:meta])* $name:ident($repr:ty) { $($(#[$fmeta:meta])* $flag:ident = $bit:expr,)* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Reflect)]
        pub struct $name(pub $repr);

        impl $name {
            pub const NONE: Self = Self(0);
            $($(#[$fmeta])* pub const $flag: Self = Self(1 << $bit);)*

            pub fn contains(self, other: Self) -> bool {
                other.0 != 0 && self.0 & other.0 == other.0
            }

            pub fn intersects(self, other: Self) -> bool {
                self.0 & other.0 != 0
            }

            pub fn is_empty(self) -> bool {
                self.0 == 0
            }

            pub fn insert(&mut self, other: Self) {
                self.0 |= other.0;
            }

            pub fn remove(&mut self, other: Self) {
                self.0 &= !other.0;
            }
        }

        impl BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }
    };
}

flag_set! {
    /// Flags ребра графа (current → next)
    PathFlags(u16) {
        CROUCH = 0,
        JUMP = 1,
        /// Сломать объект на пути (ящик, стекло)
        BREAK = 2,
        SPRINT = 3,
        LADDER = 4,
        /// Остановиться перед прохождением ребра
        STOP = 5,
        /// Ребро наносит урон (падение)
        DAMAGE = 6,
        FLASHLIGHT = 7,
        /// Ребро проходит через дверь
        DOOR = 8,
        TOTEM = 9,
    }
}

flag_set! {
    /// Flags узла графа
    WaypointFlags(u16) {
        STOP = 0,
        CAMPER = 1,
        SNIPER = 2,
        WEAPON = 3,
        AMMO = 4,
        HEALTH = 5,
        ARMOR = 6,
        HEALTH_MACHINE = 7,
        ARMOR_MACHINE = 8,
        BUTTON = 9,
        SEE_BUTTON = 10,
    }
}

flag_set! {
    /// Flags world entity (предметы и физические объекты)
    EntityFlags(u16) {
        /// Объект можно "использовать" (толкнуть USE)
        USE = 0,
        RESPAWNABLE = 1,
        /// Никогда не ломаем, только двигаем
        EXPLOSIVE = 2,
        /// Нельзя сдвинуть
        HEAVY = 3,
        /// Ломается при атаке
        BOX = 4,
    }
}
