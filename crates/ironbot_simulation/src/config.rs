//! BotConfig — настройки bot core (serde + TOML)
//!
//! Все секции `#[serde(default)]`: в файле достаточно указать только то, что меняем.
//! Единицы: метры, секунды, градусы.

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::Intelligence;
use crate::error::Result;

/// Параметры bot core (shared между всеми ботами через Arc)
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Seed для per-bot RNG (смешивается со слотом бота)
    pub seed: u64,
    pub movement: MovementConfig,
    pub stuck: StuckConfig,
    pub aim: AimConfig,
    pub combat: CombatConfig,
    pub items: ItemsConfig,
    pub actions: ActionConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            movement: MovementConfig::default(),
            stuck: StuckConfig::default(),
            aim: AimConfig::default(),
            combat: CombatConfig::default(),
            items: ItemsConfig::default(),
            actions: ActionConfig::default(),
        }
    }
}

impl BotConfig {
    /// Парсинг из TOML строки
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Загрузка из файла
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

/// Движение по графу
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Радиус касания waypoint (горизонтальный)
    pub arrive_radius: f32,
    /// Вертикальный допуск на ладдере
    pub ladder_vertical_tolerance: f32,
    /// Радиус прибытия для DirectMove
    pub direct_arrive_radius: f32,
    /// Сколько можно стоять с locked movement до Failed
    pub move_lock_grace: f32,
    pub walk_speed: f32,
    pub run_speed: f32,
    pub sprint_speed: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            arrive_radius: 0.6,
            ladder_vertical_tolerance: 0.5,
            direct_arrive_radius: 0.5,
            move_lock_grace: 3.0,
            walk_speed: 1.5,
            run_speed: 4.0,
            sprint_speed: 6.0,
        }
    }
}

/// Stuck detection + recovery ladder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StuckConfig {
    /// Интервал проверки смещения
    pub check_interval: f32,
    /// Минимальное смещение за интервал
    pub epsilon: f32,
    /// Радиус поиска мешающего объекта
    pub object_radius: f32,
    pub allow_object_removal: bool,
    pub break_object_time: f32,
    /// Длительность шага в сторону
    pub side_step_time: f32,
    pub retouch_time: f32,
    /// Эпизодов на одном waypoint до эскалации
    pub max_episodes: u32,
}

impl Default for StuckConfig {
    fn default() -> Self {
        Self {
            check_interval: 1.0,
            epsilon: 0.1,
            object_radius: 1.2,
            allow_object_removal: true,
            break_object_time: 1.0,
            side_step_time: 0.5,
            retouch_time: 3.0,
            max_episodes: 3,
        }
    }
}

/// Прицеливание
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AimConfig {
    /// Скорость поворота (град/с) для fool, stupid, normal, smart, pro
    pub turn_speed: [f32; 5],
    /// Минимальное время прицеливания
    pub min_aim_time: f32,
    /// Допуск (градусы) чтобы считать цель "наведённой"
    pub aimed_tolerance: f32,
}

impl Default for AimConfig {
    fn default() -> Self {
        Self {
            turn_speed: [120.0, 200.0, 300.0, 450.0, 720.0],
            min_aim_time: 0.05,
            aimed_tolerance: 3.0,
        }
    }
}

impl AimConfig {
    pub fn turn_speed_for(&self, intelligence: Intelligence) -> f32 {
        self.turn_speed[intelligence.index()].max(1.0)
    }
}

/// Выбор цели и бой
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Сколько игроков проверяем за тик (амортизация)
    pub players_per_tick: usize,
    pub view_distance: f32,
    /// Полный угол конуса зрения
    pub fov_degrees: f32,
    /// Сколько помним последнюю позицию потерянной цели
    pub lost_target_grace: f32,
    /// Ближе этого — stop-and-shoot
    pub close_range: f32,
    /// Доля здоровья, ниже которой бот убегает
    pub flee_health_fraction: f32,
    /// Как часто strafe меняет сторону
    pub strafe_switch_time: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            players_per_tick: 4,
            view_distance: 60.0,
            fov_degrees: 120.0,
            lost_target_grace: 2.0,
            close_range: 4.0,
            flee_health_fraction: 0.125,
            strafe_switch_time: 1.0,
        }
    }
}

/// Подбор предметов
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemsConfig {
    /// Размер списка подобранных предметов
    pub picked_capacity: usize,
    /// Через сколько подобранный respawnable предмет снова "виден"
    pub respawn_time: f32,
}

impl Default for ItemsConfig {
    fn default() -> Self {
        Self {
            picked_capacity: 16,
            respawn_time: 30.0,
        }
    }
}

/// Timed actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Как часто проверяем что автомат ещё даёт health/armor
    pub machine_check_interval: f32,
    /// Максимальное время у автомата
    pub machine_use_time: f32,
    /// Сколько держим duck после прыжка
    pub jump_duck_time: f32,
    /// Сколько бьём объект на пути
    pub break_time: f32,
    /// Сколько жмём USE у двери/кнопки
    pub use_time: f32,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            machine_check_interval: 0.5,
            machine_use_time: 6.0,
            jump_duck_time: 0.6,
            break_time: 1.0,
            use_time: 0.3,
        }
    }
}
