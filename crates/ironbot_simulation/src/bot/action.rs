//! Atomic action — дискретное действие бота + условие ожидания
//!
//! Архитектура:
//! - Decision layer создаёт AtomicAction и кладёт в ActionQueue
//! - Controller исполняет (aim/move/timed/weapon) и ждёт WaitCondition
//! - Аргумент — tagged union, kind проверяет вариант при создании

use bevy::prelude::*;

use crate::components::{ItemHandle, LookAngles, PlayerSlot, ResourceKind, WaypointId};
use crate::error::{BotError, Result};

/// Относительное временное окно (секунды от момента старта action)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: f32,
    pub end: f32,
}

impl TimeWindow {
    pub fn new(start: f32, end: f32) -> Self {
        Self {
            start: start.max(0.0),
            end: end.max(start.max(0.0)),
        }
    }

    /// One-shot окно (jump): end == start
    pub fn instant(at: f32) -> Self {
        Self::new(at, at)
    }

    pub fn duration(&self) -> f32 {
        self.end - self.start
    }
}

/// Кнопка для timed action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimedButton {
    Use,
    Attack,
    Attack2,
    /// One-shot
    Jump,
    Duck,
    /// Jump once + duck held до конца окна
    JumpDuck,
}

/// Тип атомарного действия
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Aim,
    Move,
    SwitchWeapon,
    WaitTime,
    WaitForEntityGone,
    /// Mod extension: зажать кнопку на окно
    Press(TimedButton),
    /// Mod extension: использовать автомат health/armor
    UseMachine(ResourceKind),
}

impl ActionKind {
    /// Проверка варианта аргумента для этого kind
    pub fn accepts(&self, argument: &ActionArgument) -> bool {
        match self {
            ActionKind::Aim => matches!(
                argument,
                ActionArgument::Position(_) | ActionArgument::Angles(_)
            ),
            ActionKind::Move => matches!(
                argument,
                ActionArgument::Waypoint(_) | ActionArgument::Position(_)
            ),
            ActionKind::SwitchWeapon => matches!(argument, ActionArgument::Weapon(_)),
            ActionKind::WaitTime | ActionKind::Press(_) | ActionKind::UseMachine(_) => {
                matches!(argument, ActionArgument::Window(_))
            }
            ActionKind::WaitForEntityGone => matches!(argument, ActionArgument::Position(_)),
        }
    }
}

/// Аргумент действия (ровно один вариант валиден для каждого kind)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionArgument {
    Waypoint(WaypointId),
    Weapon(usize),
    Position(Vec3),
    Angles(LookAngles),
    Window(TimeWindow),
}

impl ActionArgument {
    pub fn as_waypoint(&self) -> Option<WaypointId> {
        match self {
            ActionArgument::Waypoint(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_weapon(&self) -> Option<usize> {
        match self {
            ActionArgument::Weapon(index) => Some(*index),
            _ => None,
        }
    }

    pub fn as_position(&self) -> Option<Vec3> {
        match self {
            ActionArgument::Position(pos) => Some(*pos),
            _ => None,
        }
    }

    pub fn as_angles(&self) -> Option<LookAngles> {
        match self {
            ActionArgument::Angles(angles) => Some(*angles),
            _ => None,
        }
    }

    pub fn as_window(&self) -> Option<TimeWindow> {
        match self {
            ActionArgument::Window(window) => Some(*window),
            _ => None,
        }
    }
}

/// Условие, которое должно выполниться прежде чем очередь продвинется
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaitCondition {
    None,
    UntilPlayerDead(PlayerSlot),
    UntilEntityGone(ItemHandle),
    /// Секунды от начала исполнения action
    UntilTimeElapsed(f32),
}

/// Атомарное действие бота
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtomicAction {
    kind: ActionKind,
    argument: ActionArgument,
    wait: WaitCondition,
}

impl AtomicAction {
    /// Checked constructor: аргумент обязан соответствовать kind
    pub fn new(kind: ActionKind, argument: ActionArgument, wait: WaitCondition) -> Result<Self> {
        if !kind.accepts(&argument) {
            return Err(BotError::ActionArgumentMismatch { kind, argument });
        }
        Ok(Self {
            kind,
            argument,
            wait,
        })
    }

    pub fn aim_at(point: Vec3) -> Self {
        Self {
            kind: ActionKind::Aim,
            argument: ActionArgument::Position(point),
            wait: WaitCondition::None,
        }
    }

    pub fn aim_angles(angles: LookAngles) -> Self {
        Self {
            kind: ActionKind::Aim,
            argument: ActionArgument::Angles(angles),
            wait: WaitCondition::None,
        }
    }

    pub fn move_to_waypoint(id: WaypointId) -> Self {
        Self {
            kind: ActionKind::Move,
            argument: ActionArgument::Waypoint(id),
            wait: WaitCondition::None,
        }
    }

    pub fn move_to_point(point: Vec3) -> Self {
        Self {
            kind: ActionKind::Move,
            argument: ActionArgument::Position(point),
            wait: WaitCondition::None,
        }
    }

    pub fn switch_weapon(index: usize) -> Self {
        Self {
            kind: ActionKind::SwitchWeapon,
            argument: ActionArgument::Weapon(index),
            wait: WaitCondition::None,
        }
    }

    pub fn wait_for(seconds: f32) -> Self {
        Self {
            kind: ActionKind::WaitTime,
            argument: ActionArgument::Window(TimeWindow::new(0.0, seconds)),
            wait: WaitCondition::UntilTimeElapsed(seconds.max(0.0)),
        }
    }

    pub fn wait_for_entity_gone(entity: ItemHandle, position: Vec3) -> Self {
        Self {
            kind: ActionKind::WaitForEntityGone,
            argument: ActionArgument::Position(position),
            wait: WaitCondition::UntilEntityGone(entity),
        }
    }

    /// Зажать кнопку на окно; очередь ждёт конца окна
    pub fn press(button: TimedButton, window: TimeWindow) -> Self {
        Self {
            kind: ActionKind::Press(button),
            argument: ActionArgument::Window(window),
            wait: WaitCondition::UntilTimeElapsed(window.end),
        }
    }

    pub fn use_machine(resource: ResourceKind, window: TimeWindow) -> Self {
        Self {
            kind: ActionKind::UseMachine(resource),
            argument: ActionArgument::Window(window),
            wait: WaitCondition::UntilTimeElapsed(window.end),
        }
    }

    /// Заменить условие ожидания
    pub fn until(mut self, wait: WaitCondition) -> Self {
        self.wait = wait;
        self
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn argument(&self) -> &ActionArgument {
        &self.argument
    }

    pub fn wait(&self) -> WaitCondition {
        self.wait
    }
}
