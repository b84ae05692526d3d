//! Aim sub-controller — плавный поворот взгляда к цели
//!
//! Время поворота = угловое расстояние / turn speed (зависит от интеллекта).
//! Интерполяция линейная в пространстве углов, yaw по кратчайшей дуге, без overshoot.
//! Lock замораживает взгляд полностью (прыжок, USE у автомата).

use bevy::prelude::*;

use crate::components::{wrap_yaw, Intelligence, LookAngles};
use crate::config::AimConfig;

/// Состояние прицеливания
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AimState {
    /// Взгляд совпадает с целью (или цели нет)
    Settled,
    /// Поворачиваемся: from → from + delta за [start_time, end_time]
    Turning {
        from: LookAngles,
        to: LookAngles,
        delta_pitch: f32,
        delta_yaw: f32,
        start_time: f32,
        end_time: f32,
    },
}

#[derive(Debug, Clone)]
pub struct AimController {
    look: LookAngles,
    state: AimState,
    locked: bool,
}

impl Default for AimController {
    fn default() -> Self {
        Self::new(LookAngles::default())
    }
}

impl AimController {
    pub fn new(look: LookAngles) -> Self {
        Self {
            look,
            state: AimState::Settled,
            locked: false,
        }
    }

    pub fn look(&self) -> LookAngles {
        self.look
    }

    pub fn state(&self) -> &AimState {
        &self.state
    }

    /// Телепорт взгляда (respawn) — сбрасывает поворот и lock
    pub fn reset(&mut self, look: LookAngles) {
        self.look = look;
        self.state = AimState::Settled;
        self.locked = false;
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_turning(&self) -> bool {
        matches!(self.state, AimState::Turning { .. })
    }

    pub fn end_time(&self) -> Option<f32> {
        match self.state {
            AimState::Turning { end_time, .. } => Some(end_time),
            AimState::Settled => None,
        }
    }

    pub fn target(&self) -> Option<LookAngles> {
        match self.state {
            AimState::Turning { to, .. } => Some(to),
            AimState::Settled => None,
        }
    }

    /// Сколько займёт поворот к `target` с текущего взгляда
    pub fn turn_duration(&self, target: &LookAngles, intelligence: Intelligence, config: &AimConfig) -> f32 {
        let distance = self.look.angular_distance(target);
        if distance <= f32::EPSILON {
            return 0.0;
        }
        (distance / config.turn_speed_for(intelligence)).max(config.min_aim_time)
    }

    /// Новая цель по углам. false — взгляд locked, цель проигнорирована.
    pub fn set_target_angles(
        &mut self,
        target: LookAngles,
        now: f32,
        intelligence: Intelligence,
        config: &AimConfig,
    ) -> bool {
        if self.locked {
            return false;
        }

        let duration = self.turn_duration(&target, intelligence, config);
        if duration <= 0.0 {
            self.look = target;
            self.state = AimState::Settled;
            return true;
        }

        let (delta_pitch, delta_yaw) = self.look.delta_to(&target);
        self.state = AimState::Turning {
            from: self.look,
            to: target,
            delta_pitch,
            delta_yaw,
            start_time: now,
            end_time: now + duration,
        };
        true
    }

    /// Новая цель — точка в мире, смотрим из `eye`
    pub fn set_target_point(
        &mut self,
        eye: Vec3,
        point: Vec3,
        now: f32,
        intelligence: Intelligence,
        config: &AimConfig,
    ) -> bool {
        let target = LookAngles::from_direction(point - eye);
        self.set_target_angles(target, now, intelligence, config)
    }

    /// Интерполяция на текущий тик. Locked → взгляд не меняется.
    pub fn tick(&mut self, now: f32) -> LookAngles {
        if self.locked {
            return self.look;
        }

        if let AimState::Turning {
            from,
            to,
            delta_pitch,
            delta_yaw,
            start_time,
            end_time,
        } = self.state
        {
            if now >= end_time {
                self.look = to;
                self.state = AimState::Settled;
            } else {
                let span = (end_time - start_time).max(f32::EPSILON);
                let t = ((now - start_time) / span).clamp(0.0, 1.0);
                self.look = LookAngles {
                    pitch: from.pitch + delta_pitch * t,
                    yaw: wrap_yaw(from.yaw + delta_yaw * t),
                };
            }
        }

        self.look
    }

    /// Взгляд в пределах `tolerance` градусов от цели
    pub fn is_on_target(&self, target: &LookAngles, tolerance: f32) -> bool {
        self.look.angular_distance(target) <= tolerance
    }
}
