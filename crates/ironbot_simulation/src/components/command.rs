//! Исходящая команда бота: направление движения, углы взгляда, кнопки
//!
//! Архитектура:
//! - Controller собирает BotCommand в конце каждого тика
//! - Engine binding читает и применяет (физика не наша ответственность)

use std::fmt;

use bevy::prelude::*;

/// Максимальный pitch (градусы) — не смотрим строго вверх/вниз
pub const MAX_PITCH: f32 = 89.0;

/// Углы взгляда в градусах
///
/// Конвенция: Y-up, yaw = 0 смотрит вдоль +X, yaw растёт к +Z, pitch > 0 — вверх.
#[derive(Debug, Clone, Copy, Default, PartialEq, Reflect)]
pub struct LookAngles {
    pub pitch: f32,
    pub yaw: f32,
}

impl LookAngles {
    pub fn new(pitch: f32, yaw: f32) -> Self {
        Self {
            pitch: pitch.clamp(-MAX_PITCH, MAX_PITCH),
            yaw: wrap_yaw(yaw),
        }
    }

    /// Углы для направления `dir` (нулевой вектор → нулевые углы)
    pub fn from_direction(dir: Vec3) -> Self {
        let length = dir.length();
        if length <= f32::EPSILON {
            return Self::default();
        }
        let pitch = (dir.y / length).clamp(-1.0, 1.0).asin().to_degrees();
        let yaw = dir.z.atan2(dir.x).to_degrees();
        Self::new(pitch, yaw)
    }

    /// Единичный вектор взгляда
    pub fn forward(&self) -> Vec3 {
        let (sp, cp) = self.pitch.to_radians().sin_cos();
        let (sy, cy) = self.yaw.to_radians().sin_cos();
        Vec3::new(cp * cy, sp, cp * sy)
    }

    /// Разница углов (target - self), yaw по кратчайшей дуге
    pub fn delta_to(&self, target: &LookAngles) -> (f32, f32) {
        (target.pitch - self.pitch, wrap_yaw(target.yaw - self.yaw))
    }

    /// Угловое расстояние (градусы) — максимум из осей
    pub fn angular_distance(&self, target: &LookAngles) -> f32 {
        let (dp, dy) = self.delta_to(target);
        dp.abs().max(dy.abs())
    }
}

/// Wrap yaw в диапазон [-180, 180)
pub fn wrap_yaw(yaw: f32) -> f32 {
    let wrapped = (yaw + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped.is_finite() {
        wrapped
    } else {
        0.0
    }
}

/// Bitset кнопок (виртуальная клавиатура бота)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Reflect)]
pub struct Buttons(pub u32);

impl Buttons {
    pub const NONE: Self = Self(0);
    pub const ATTACK: Self = Self(1 << 0);
    pub const ATTACK2: Self = Self(1 << 1);
    pub const USE: Self = Self(1 << 2);
    pub const RELOAD: Self = Self(1 << 3);
    pub const JUMP: Self = Self(1 << 4);
    pub const DUCK: Self = Self(1 << 5);
    pub const SPRINT: Self = Self(1 << 6);
    pub const WALK: Self = Self(1 << 7);
    pub const FLASHLIGHT: Self = Self(1 << 8);

    pub fn press(&mut self, buttons: Buttons) {
        self.0 |= buttons.0;
    }

    pub fn release(&mut self, buttons: Buttons) {
        self.0 &= !buttons.0;
    }

    pub fn is_pressed(&self, buttons: Buttons) -> bool {
        buttons.0 != 0 && self.0 & buttons.0 == buttons.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for Buttons {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for Buttons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(Buttons, &str); 9] = [
            (Buttons::ATTACK, "attack"),
            (Buttons::ATTACK2, "attack2"),
            (Buttons::USE, "use"),
            (Buttons::RELOAD, "reload"),
            (Buttons::JUMP, "jump"),
            (Buttons::DUCK, "duck"),
            (Buttons::SPRINT, "sprint"),
            (Buttons::WALK, "walk"),
            (Buttons::FLASHLIGHT, "flashlight"),
        ];
        let pressed: Vec<&str> = NAMES
            .iter()
            .filter(|(b, _)| self.is_pressed(*b))
            .map(|(_, name)| *name)
            .collect();
        if pressed.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&pressed.join("+"))
        }
    }
}

/// Команда бота на один тик (consumer — engine binding)
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct BotCommand {
    /// Направление движения (world, горизонтальное, normalized или ZERO)
    pub move_direction: Vec3,
    /// Скорость (м/с), 0 = стоим
    pub speed: f32,
    /// Куда смотрим
    pub look: LookAngles,
    pub buttons: Buttons,
    /// Индекс оружия для переключения в этом тике
    pub weapon_select: Option<usize>,
}

impl BotCommand {
    pub fn is_moving(&self) -> bool {
        self.speed > 0.0 && self.move_direction != Vec3::ZERO
    }
}
