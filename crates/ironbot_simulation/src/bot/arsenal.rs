//! Arsenal — оружие бота и выбор оружия под дистанцию

use crate::components::WeaponKind;
use crate::error::{BotError, Result};

/// Одно оружие в инвентаре бота
#[derive(Debug, Clone, PartialEq)]
pub struct WeaponSlot {
    pub name: String,
    pub kind: WeaponKind,
    /// Больше — предпочтительнее при прочих равных
    pub priority: i32,
    pub min_range: f32,
    pub max_range: f32,
    pub clip: i32,
    pub clip_size: i32,
    pub reserve: i32,
}

impl WeaponSlot {
    pub fn new(name: impl Into<String>, kind: WeaponKind, priority: i32, range: (f32, f32)) -> Self {
        Self {
            name: name.into(),
            kind,
            priority,
            min_range: range.0,
            max_range: range.1,
            clip: 0,
            clip_size: 0,
            reserve: 0,
        }
    }

    pub fn with_ammo(mut self, clip: i32, clip_size: i32, reserve: i32) -> Self {
        self.clip = clip;
        self.clip_size = clip_size;
        self.reserve = reserve;
        self
    }

    pub fn has_ammo(&self) -> bool {
        self.kind.is_melee() || self.clip > 0 || self.reserve > 0
    }

    /// Можно стрелять во врага прямо сейчас (или после перезарядки)
    pub fn is_usable(&self) -> bool {
        self.kind.is_offensive() && self.has_ammo()
    }

    pub fn in_range(&self, distance: f32) -> bool {
        distance >= self.min_range && distance <= self.max_range
    }

    pub fn needs_reload(&self) -> bool {
        !self.kind.is_melee() && self.clip == 0 && self.reserve > 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct Arsenal {
    weapons: Vec<WeaponSlot>,
    current: Option<usize>,
    previous: Option<usize>,
    best: Option<usize>,
    zoomed: bool,
}

impl Arsenal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, weapon: WeaponSlot) -> usize {
        self.weapons.push(weapon);
        let index = self.weapons.len() - 1;
        if self.current.is_none() {
            self.current = Some(index);
        }
        index
    }

    pub fn weapons(&self) -> &[WeaponSlot] {
        &self.weapons
    }

    pub fn get(&self, index: usize) -> Option<&WeaponSlot> {
        self.weapons.get(index)
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn current_weapon(&self) -> Option<&WeaponSlot> {
        self.current.and_then(|i| self.weapons.get(i))
    }

    pub fn previous(&self) -> Option<usize> {
        self.previous
    }

    pub fn best(&self) -> Option<usize> {
        self.best
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoomed
    }

    pub fn set_zoomed(&mut self, zoomed: bool) {
        self.zoomed = zoomed;
    }

    /// Переключиться на оружие (zoom сбрасывается)
    pub fn select(&mut self, index: usize) -> Result<()> {
        if index >= self.weapons.len() {
            return Err(BotError::UnknownWeapon(index));
        }
        if self.current != Some(index) {
            self.previous = self.current;
            self.current = Some(index);
            self.zoomed = false;
        }
        Ok(())
    }

    /// Лучшее оружие для дистанции: usable + in range, максимальный priority.
    /// Если ничего не в радиусе — лучший usable вообще.
    pub fn best_for_range(&mut self, distance: f32) -> Option<usize> {
        let pick = |in_range: bool| {
            self.weapons
                .iter()
                .enumerate()
                .filter(|(_, w)| w.is_usable() && (!in_range || w.in_range(distance)))
                .max_by_key(|(i, w)| (w.priority, std::cmp::Reverse(*i)))
                .map(|(i, _)| i)
        };
        let best = pick(true).or_else(|| pick(false));
        self.best = best;
        best
    }

    /// Синхронизация патронов от engine
    pub fn set_ammo(&mut self, index: usize, clip: i32, reserve: i32) -> Result<()> {
        let weapon = self.weapons.get_mut(index).ok_or(BotError::UnknownWeapon(index))?;
        weapon.clip = clip.max(0);
        weapon.reserve = reserve.max(0);
        Ok(())
    }

    /// Перезарядка текущего оружия (bookkeeping, саму анимацию делает engine)
    pub fn reload(&mut self) -> bool {
        let Some(weapon) = self.current.and_then(|i| self.weapons.get_mut(i)) else {
            return false;
        };
        let missing = (weapon.clip_size - weapon.clip).max(0);
        let loaded = missing.min(weapon.reserve);
        if loaded == 0 {
            return false;
        }
        weapon.clip += loaded;
        weapon.reserve -= loaded;
        true
    }
}
