//! Stuck detection + recovery ladder
//!
//! Детекция: раз в check_interval (пока бот пытается идти) сравниваем позицию с
//! прошлым sample. Смещение < epsilon → stuck. Пока stuck, смещение проверяется
//! каждый тик — выход из stuck в тот же тик.
//!
//! Ladder (у каждой ступени свой timeout):
//! 1. BreakObject — мешающий объект рядом: ломаем или толкаем
//! 2. SideStep — шаг перпендикулярно курсу, лево/право чередуются
//! 3. RetouchCurrent — вернуться и коснуться current waypoint ещё раз
//! 4. Escalated — больше max_episodes эпизодов на одном waypoint
//!
//! Все ступени истекли в одном эпизоде → снова SideStep, это новый эпизод.
//!
//! SideStep держится до своего until, даже если смещение уже сняло stuck.
//! Заблокированы снова после side-step → RetouchCurrent в том же эпизоде.

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::components::{ItemHandle, WaypointId};
use crate::config::StuckConfig;
use crate::world::{ItemClass, ItemRegistry, ModRules};

/// Ступень recovery ladder
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StuckPhase {
    /// Не застряли
    Moving,
    BreakObject {
        object: ItemHandle,
        position: Vec3,
        /// true — толкаем (USE), false — ломаем (ATTACK)
        push: bool,
        until: f32,
    },
    SideStep { left: bool, until: f32 },
    RetouchCurrent { until: f32 },
    /// Ladder исчерпан — движение нужно прервать
    Escalated,
}

/// Что изменилось на этом тике
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StuckSignal {
    None,
    /// Начался новый эпизод (номер эпизода на этом waypoint)
    BecameStuck { episode: u32 },
    /// Перешли на новую ступень
    Rung(StuckPhase),
    Unstuck,
    Escalated,
}

/// Входные данные тика
pub struct StuckInput<'a> {
    pub now: f32,
    pub position: Vec3,
    /// Movement реально требует движения на этом тике
    pub moving: bool,
    pub current: Option<WaypointId>,
    pub items: &'a dyn ItemRegistry,
    pub rules: &'a dyn ModRules,
    /// allow_object_removal && !dont_break_objects
    pub allow_object_removal: bool,
}

/// Как изменить движение в текущей ступени
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Recovery {
    None,
    Break { target: Vec3, push: bool },
    SideStep(Vec3),
    Retouch,
}

#[derive(Debug, Clone)]
pub struct StuckDetector {
    phase: StuckPhase,
    stuck: bool,
    sample: Option<Vec3>,
    next_check: f32,
    episodes: u32,
    episode_waypoint: Option<WaypointId>,
    /// None — направление первого side-step ещё не выбрано
    next_side_left: Option<bool>,
    /// Side-step отработал, эпизод не закрыт: следующий stuck → RetouchCurrent
    retouch_pending: bool,
    rng: ChaCha8Rng,
}

impl StuckDetector {
    pub fn new(seed: u64) -> Self {
        Self {
            phase: StuckPhase::Moving,
            stuck: false,
            sample: None,
            next_check: 0.0,
            episodes: 0,
            episode_waypoint: None,
            next_side_left: None,
            retouch_pending: false,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn is_stuck(&self) -> bool {
        self.stuck
    }

    pub fn phase(&self) -> &StuckPhase {
        &self.phase
    }

    pub fn episodes(&self) -> u32 {
        self.episodes
    }

    /// Полный сброс (respawn, новая цель движения)
    pub fn reset(&mut self) {
        self.phase = StuckPhase::Moving;
        self.stuck = false;
        self.sample = None;
        self.episodes = 0;
        self.episode_waypoint = None;
        self.retouch_pending = false;
    }

    /// Ступень ladder ещё управляет движением (stuck мог уже сняться)
    pub fn is_recovering(&self) -> bool {
        !matches!(self.phase, StuckPhase::Moving | StuckPhase::Escalated)
    }

    /// Смена current waypoint — счётчик эпизодов заново
    pub fn on_waypoint_changed(&mut self, current: Option<WaypointId>) {
        if self.episode_waypoint != current {
            self.episode_waypoint = current;
            self.episodes = 0;
            self.retouch_pending = false;
        }
    }

    pub fn tick(&mut self, input: &StuckInput<'_>, config: &StuckConfig) -> StuckSignal {
        if self.phase == StuckPhase::Escalated {
            return StuckSignal::None;
        }

        if !input.moving {
            // Stuck требует запроса движения на всём окне
            self.sample = None;
            self.phase = StuckPhase::Moving;
            if self.stuck {
                self.stuck = false;
                return StuckSignal::Unstuck;
            }
            return StuckSignal::None;
        }

        let Some(sample) = self.sample else {
            self.sample = Some(input.position);
            self.next_check = input.now + config.check_interval;
            return StuckSignal::None;
        };
        let displacement = input.position.distance(sample);

        if self.stuck {
            if displacement > config.epsilon {
                self.stuck = false;
                if !matches!(self.phase, StuckPhase::SideStep { .. }) {
                    self.phase = StuckPhase::Moving;
                }
                self.sample = Some(input.position);
                self.next_check = input.now + config.check_interval;
                return StuckSignal::Unstuck;
            }
            return self.advance_ladder(input, config);
        }

        if let StuckPhase::SideStep { until, .. } = self.phase {
            if input.now < until {
                return StuckSignal::None;
            }
            // Side-step отработал — снова обычная проверка, с нового sample
            self.phase = StuckPhase::Moving;
            self.retouch_pending = true;
            self.sample = Some(input.position);
            self.next_check = input.now + config.check_interval;
            return StuckSignal::None;
        }

        if input.now < self.next_check {
            return StuckSignal::None;
        }
        if displacement >= config.epsilon {
            self.retouch_pending = false;
            self.sample = Some(input.position);
            self.next_check = input.now + config.check_interval;
            return StuckSignal::None;
        }

        self.stuck = true;
        self.on_waypoint_changed(input.current);
        if self.retouch_pending {
            self.retouch_pending = false;
            let rung = StuckPhase::RetouchCurrent {
                until: input.now + config.retouch_time,
            };
            self.phase = rung;
            self.sample = Some(input.position);
            return StuckSignal::Rung(rung);
        }
        self.begin_episode(input, config)
    }

    fn begin_episode(&mut self, input: &StuckInput<'_>, config: &StuckConfig) -> StuckSignal {
        self.retouch_pending = false;
        self.on_waypoint_changed(input.current);
        self.episodes += 1;
        if self.episodes > config.max_episodes {
            self.phase = StuckPhase::Escalated;
            return StuckSignal::Escalated;
        }

        let rung = match self.break_rung(input, config) {
            Some(rung) => rung,
            None => self.side_step_rung(input.now, config),
        };
        self.phase = rung;
        StuckSignal::BecameStuck {
            episode: self.episodes,
        }
    }

    fn break_rung(&self, input: &StuckInput<'_>, config: &StuckConfig) -> Option<StuckPhase> {
        if !input.allow_object_removal {
            return None;
        }
        let object = input.items.disturbing_object(input.position, config.object_radius)?;
        let push = match input.rules.classify_item(&object) {
            ItemClass::Breakable => false,
            ItemClass::Pushable => true,
            _ => return None,
        };
        Some(StuckPhase::BreakObject {
            object: object.handle,
            position: object.position,
            push,
            until: input.now + config.break_object_time,
        })
    }

    fn side_step_rung(&mut self, now: f32, config: &StuckConfig) -> StuckPhase {
        let left = match self.next_side_left {
            Some(left) => left,
            None => self.rng.gen_bool(0.5),
        };
        self.next_side_left = Some(!left);
        StuckPhase::SideStep {
            left,
            until: now + config.side_step_time,
        }
    }

    fn advance_ladder(&mut self, input: &StuckInput<'_>, config: &StuckConfig) -> StuckSignal {
        let now = input.now;
        let next = match self.phase {
            StuckPhase::BreakObject { object, until, .. } => {
                if now < until && input.items.is_present(object) {
                    return StuckSignal::None;
                }
                self.side_step_rung(now, config)
            }
            StuckPhase::SideStep { until, .. } => {
                if now < until {
                    return StuckSignal::None;
                }
                StuckPhase::RetouchCurrent {
                    until: now + config.retouch_time,
                }
            }
            StuckPhase::RetouchCurrent { until } => {
                if now < until {
                    return StuckSignal::None;
                }
                // Ladder истёк целиком — новый эпизод
                self.episodes += 1;
                if self.episodes > config.max_episodes {
                    self.phase = StuckPhase::Escalated;
                    return StuckSignal::Escalated;
                }
                self.side_step_rung(now, config)
            }
            StuckPhase::Moving => self.side_step_rung(now, config),
            StuckPhase::Escalated => return StuckSignal::None,
        };
        self.phase = next;
        // Новая ступень — новый отсчёт смещения
        self.sample = Some(input.position);
        StuckSignal::Rung(next)
    }

    /// Поправка к движению для текущей ступени
    pub fn recovery(&self, intended: Vec3) -> Recovery {
        match self.phase {
            StuckPhase::BreakObject { position, push, .. } => Recovery::Break {
                target: position,
                push,
            },
            StuckPhase::SideStep { left, .. } => {
                let forward = Vec3::new(intended.x, 0.0, intended.z).normalize_or_zero();
                let left_dir = Vec3::Y.cross(forward);
                Recovery::SideStep(if left { left_dir } else { -left_dir })
            }
            StuckPhase::RetouchCurrent { .. } => Recovery::Retouch,
            StuckPhase::Moving | StuckPhase::Escalated => Recovery::None,
        }
    }
}
