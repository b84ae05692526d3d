//! Combat target selector — кого видим, в кого стреляем, как двигаемся в бою
//!
//! Амортизация: за тик проверяем `players_per_tick` игроков round-robin,
//! текущую цель — каждый тик. seen/known — disjoint bitsets:
//! - seen: враг виден прямо сейчас
//! - known: враг был виден (или нас ударил), но сейчас не виден
//!
//! Смена цели → одна переоценка оружия + точка прицеливания + engagement.

use bevy::prelude::*;

use crate::bot::arsenal::Arsenal;
use crate::components::{
    AgentState, BotIdentity, Buttons, Intelligence, LookAngles, PlayerInfo, PlayerSet,
    PlayerSlot, WeaponKind, WorldSnapshot,
};
use crate::config::CombatConfig;
use crate::world::{LineOfSight, ModRules};

/// Как бот ведёт бой с текущей целью
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Engagement {
    #[default]
    None,
    StrafeAndShoot,
    StopAndShoot,
    Flee,
}

/// Текущая цель
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatTarget {
    pub slot: PlayerSlot,
    /// Последняя известная позиция (ноги)
    pub position: Vec3,
    pub aim_point: Vec3,
    pub distance_sq: f32,
    pub visible: bool,
    /// С какого момента цель не видна
    pub lost_since: Option<f32>,
}

/// Смена цели (None — цели нет)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetChange {
    pub from: Option<PlayerSlot>,
    pub to: Option<PlayerSlot>,
}

/// Результат тика selector'а
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CombatUpdate {
    pub change: Option<TargetChange>,
    /// Новое оружие после переоценки
    pub weapon_select: Option<usize>,
}

/// Входные данные тика
pub struct CombatContext<'a> {
    pub now: f32,
    pub bot: &'a BotIdentity,
    pub agent: &'a AgentState,
    pub look: LookAngles,
    pub world: &'a WorldSnapshot,
    pub rules: &'a dyn ModRules,
    pub sight: &'a dyn LineOfSight,
    pub config: &'a CombatConfig,
}

/// Smart и Pro целятся в голову
pub fn shoots_at_head(intelligence: Intelligence) -> bool {
    intelligence >= Intelligence::Smart
}

#[derive(Debug, Clone, Default)]
pub struct CombatSelector {
    seen: PlayerSet,
    known: PlayerSet,
    scan_cursor: usize,
    target: Option<CombatTarget>,
    engagement: Engagement,
    weapon_evaluations: u32,
    under_attack: bool,
    flee: bool,
    dont_attack: bool,
    strafe_left: bool,
    next_strafe_switch: f32,
}

impl CombatSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> PlayerSet {
        self.seen
    }

    pub fn known(&self) -> PlayerSet {
        self.known
    }

    pub fn target(&self) -> Option<&CombatTarget> {
        self.target.as_ref()
    }

    pub fn engagement(&self) -> Engagement {
        self.engagement
    }

    /// Сколько раз переоценивали оружие (по одному на смену цели)
    pub fn weapon_evaluations(&self) -> u32 {
        self.weapon_evaluations
    }

    pub fn is_under_attack(&self) -> bool {
        self.under_attack
    }

    pub fn is_fleeing(&self) -> bool {
        self.flee
    }

    pub fn dont_attack(&self) -> bool {
        self.dont_attack
    }

    pub fn set_dont_attack(&mut self, dont_attack: bool) {
        self.dont_attack = dont_attack;
    }

    pub fn set_flee(&mut self, flee: bool) {
        self.flee = flee;
    }

    /// Есть видимая цель
    pub fn is_engaging(&self) -> bool {
        self.target.is_some_and(|t| t.visible)
    }

    /// Полный сброс (смерть, respawn)
    pub fn reset(&mut self) {
        *self = Self {
            weapon_evaluations: self.weapon_evaluations,
            ..Self::default()
        };
    }

    /// Враг в конусе зрения, в радиусе и не заслонён
    pub fn is_visible(ctx: &CombatContext<'_>, other: &PlayerInfo) -> bool {
        let eye = ctx.agent.eye_position();
        let target_eye = other.eye_position();
        let to_target = target_eye - eye;
        let distance = to_target.length();
        if distance > ctx.config.view_distance {
            return false;
        }
        if distance > f32::EPSILON {
            let cos = ctx.look.forward().dot(to_target / distance);
            let half_fov = (ctx.config.fov_degrees * 0.5).to_radians();
            if cos < half_fov.cos() {
                return false;
            }
        }
        ctx.sight.is_clear(eye, target_eye)
    }

    fn scan(&mut self, ctx: &CombatContext<'_>, other: &PlayerInfo) {
        let slot = other.slot;
        if slot == ctx.bot.slot || !other.alive || !ctx.rules.is_enemy(ctx.bot, other) {
            self.seen.remove(slot);
            self.known.remove(slot);
            return;
        }
        if Self::is_visible(ctx, other) {
            self.seen.insert(slot);
            self.known.remove(slot);
        } else if self.seen.contains(slot) {
            self.seen.remove(slot);
            self.known.insert(slot);
        }
    }

    pub fn tick(&mut self, ctx: &CombatContext<'_>, arsenal: &mut Arsenal) -> CombatUpdate {
        let mut update = CombatUpdate::default();
        let players = &ctx.world.players;

        // Ушедшие из snapshot игроки
        for slot in self.seen.iter().chain(self.known.iter()).collect::<Vec<_>>() {
            if ctx.world.player(slot).is_none() {
                self.seen.remove(slot);
                self.known.remove(slot);
            }
        }

        if let Some(current) = self.target.and_then(|t| ctx.world.player(t.slot)) {
            self.scan(ctx, current);
        }
        if !players.is_empty() {
            let count = ctx.config.players_per_tick.min(players.len());
            for k in 0..count {
                let index = (self.scan_cursor + k) % players.len();
                self.scan(ctx, &players[index]);
            }
            self.scan_cursor = (self.scan_cursor + count) % players.len();
        }

        let origin = ctx.agent.position;
        let nearest = self
            .seen
            .iter()
            .filter_map(|slot| ctx.world.player(slot))
            .map(|p| (p, p.position.distance_squared(origin)))
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.slot.cmp(&b.0.slot)));

        let head = shoots_at_head(ctx.bot.intelligence);
        match nearest {
            Some((enemy, distance_sq)) => {
                let previous = self.target.map(|t| t.slot);
                if previous != Some(enemy.slot) {
                    // Смена цели — единственное место переоценки оружия
                    self.weapon_evaluations += 1;
                    let before = arsenal.current();
                    if let Some(best) = arsenal.best_for_range(distance_sq.sqrt()) {
                        if arsenal.select(best).is_ok() && before != Some(best) {
                            update.weapon_select = Some(best);
                        }
                    }
                    update.change = Some(TargetChange {
                        from: previous,
                        to: Some(enemy.slot),
                    });
                }
                self.target = Some(CombatTarget {
                    slot: enemy.slot,
                    position: enemy.position,
                    aim_point: enemy.aim_point(head),
                    distance_sq,
                    visible: true,
                    lost_since: None,
                });
            }
            None => {
                if let Some(target) = self.target.as_mut() {
                    target.visible = false;
                    let lost_since = *target.lost_since.get_or_insert(ctx.now);
                    if ctx.now - lost_since > ctx.config.lost_target_grace {
                        update.change = Some(TargetChange {
                            from: Some(target.slot),
                            to: None,
                        });
                        self.target = None;
                    }
                }
            }
        }

        self.engagement = self.evaluate_engagement(arsenal, ctx.config);
        update
    }

    fn evaluate_engagement(&self, arsenal: &Arsenal, config: &CombatConfig) -> Engagement {
        let Some(target) = self.target.filter(|t| t.visible) else {
            return Engagement::None;
        };
        if self.flee {
            return Engagement::Flee;
        }
        let sniper = arsenal
            .current_weapon()
            .is_some_and(|w| w.kind == WeaponKind::Sniper);
        if target.distance_sq <= config.close_range * config.close_range || sniper {
            Engagement::StopAndShoot
        } else {
            Engagement::StrafeAndShoot
        }
    }

    /// Поправка движения в бою. None — идём по маршруту.
    pub fn steer(&mut self, now: f32, position: Vec3, config: &CombatConfig) -> Option<Vec3> {
        let target = self.target.filter(|t| t.visible)?;
        let to_enemy = Vec3::new(target.position.x - position.x, 0.0, target.position.z - position.z)
            .normalize_or_zero();
        match self.engagement {
            Engagement::None => None,
            Engagement::Flee => Some(-to_enemy),
            Engagement::StopAndShoot => Some(Vec3::ZERO),
            Engagement::StrafeAndShoot => {
                if now >= self.next_strafe_switch {
                    self.strafe_left = !self.strafe_left;
                    self.next_strafe_switch = now + config.strafe_switch_time;
                }
                let left = Vec3::Y.cross(to_enemy);
                Some(if self.strafe_left { left } else { -left })
            }
        }
    }

    /// Кнопки стрельбы на этот тик
    pub fn fire_buttons(&self, intelligence: Intelligence, aim_on_target: bool, arsenal: &mut Arsenal) -> Buttons {
        let mut buttons = Buttons::NONE;
        if self.dont_attack || !self.is_engaging() {
            return buttons;
        }
        let Some(weapon) = arsenal.current_weapon() else {
            return buttons;
        };
        if weapon.needs_reload() {
            buttons.press(Buttons::RELOAD);
            return buttons;
        }
        if weapon.kind.has_zoom() && !arsenal.is_zoomed() {
            arsenal.set_zoomed(true);
            buttons.press(Buttons::ATTACK2);
            return buttons;
        }
        if aim_on_target {
            buttons.press(Buttons::ATTACK);
            if intelligence >= Intelligence::Smart && self.engagement == Engagement::StopAndShoot {
                buttons.press(Buttons::DUCK);
            }
        }
        buttons
    }

    /// Нас ударили: атакующий становится known, при малом здоровье — бежим
    pub fn hurt_by(&mut self, attacker: PlayerSlot, agent: &AgentState, config: &CombatConfig) {
        if !self.seen.contains(attacker) {
            self.known.insert(attacker);
        }
        self.under_attack = true;
        if agent.health_fraction() < config.flee_health_fraction {
            self.flee = true;
            self.dont_attack = true;
        }
    }

    /// Подобрали health — переоценка flee
    pub fn on_health_restored(&mut self, agent: &AgentState, config: &CombatConfig) {
        if !self.flee {
            return;
        }
        self.flee = agent.health_fraction() < config.flee_health_fraction;
        if !self.flee {
            self.dont_attack = false;
            self.under_attack = false;
        }
    }

    /// Игрок убит / отключился — забываем
    pub fn forget(&mut self, slot: PlayerSlot) -> Option<TargetChange> {
        self.seen.remove(slot);
        self.known.remove(slot);
        if self.target.is_some_and(|t| t.slot == slot) {
            self.target = None;
            self.engagement = Engagement::None;
            return Some(TargetChange {
                from: Some(slot),
                to: None,
            });
        }
        None
    }
}
