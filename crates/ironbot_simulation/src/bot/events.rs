//! Bot events — исходящие события бота и входящие уведомления
//!
//! Controller копит BotEventKind за тик, ECS система публикует их как BotEvent.
//! BotNotification — то, что engine binding / чат сообщает боту.

use std::fmt;

use bevy::prelude::*;

use crate::components::{ItemHandle, PlayerSlot, ResourceKind, WaypointId};

/// Почему движение остановлено (без повторных попыток)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveFailure {
    /// Текущий или целевой waypoint не существует
    InvalidWaypoint(Option<WaypointId>),
    Unreachable { from: WaypointId, to: WaypointId },
    /// Recovery ladder исчерпан на этом waypoint
    Stuck(Option<WaypointId>),
    /// Movement заблокирован дольше grace
    LockedTooLong,
}

impl fmt::Display for MoveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveFailure::InvalidWaypoint(Some(id)) => write!(f, "invalid waypoint {id}"),
            MoveFailure::InvalidWaypoint(None) => f.write_str("no current waypoint"),
            MoveFailure::Unreachable { from, to } => write!(f, "no path {from} -> {to}"),
            MoveFailure::Stuck(Some(id)) => write!(f, "stuck near {id}"),
            MoveFailure::Stuck(None) => f.write_str("stuck"),
            MoveFailure::LockedTooLong => f.write_str("movement locked too long"),
        }
    }
}

/// Фразы чата (словарь — только enum, текст генерирует chat layer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatPhrase {
    Greeting,
    Bye,
    Busy,
    Affirmative,
    Negative,
    Help,
    Stop,
    Come,
    Follow,
    Attack,
    Wait,
    Done,
}

impl ChatPhrase {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatPhrase::Greeting => "greeting",
            ChatPhrase::Bye => "bye",
            ChatPhrase::Busy => "busy",
            ChatPhrase::Affirmative => "affirmative",
            ChatPhrase::Negative => "negative",
            ChatPhrase::Help => "help",
            ChatPhrase::Stop => "stop",
            ChatPhrase::Come => "come",
            ChatPhrase::Follow => "follow",
            ChatPhrase::Attack => "attack",
            ChatPhrase::Wait => "wait",
            ChatPhrase::Done => "done",
        }
    }
}

/// Что произошло с ботом за тик
#[derive(Debug, Clone, PartialEq)]
pub enum BotEventKind {
    PickedItem(ItemHandle),
    KilledEnemy(PlayerSlot),
    HurtBy(PlayerSlot),
    ArrivedAtWaypoint(WaypointId),
    /// None — DirectMove к точке
    ArrivedAtDestination(Option<WaypointId>),
    /// Начался stuck эпизод
    Stuck { waypoint: Option<WaypointId>, episode: u32 },
    MoveFailure(MoveFailure),
    ChatRequested { phrase: ChatPhrase, team_only: bool },
    MachineExhausted(ResourceKind),
    TargetChanged {
        from: Option<PlayerSlot>,
        to: Option<PlayerSlot>,
    },
    PathTestFinished { success: bool },
}

/// Событие бота для ECS (кто + что)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct BotEvent {
    pub bot: PlayerSlot,
    pub kind: BotEventKind,
}

/// Уведомления от engine binding / чата
#[derive(Event, Debug, Clone, PartialEq)]
pub enum BotNotification {
    KilledEnemy { bot: PlayerSlot, victim: PlayerSlot },
    HurtBy { bot: PlayerSlot, attacker: PlayerSlot },
    Died { bot: PlayerSlot },
    Respawned { bot: PlayerSlot },
    PlayerDisconnected { slot: PlayerSlot },
    /// Decision layer: идти к waypoint
    GoTo { bot: PlayerSlot, destination: WaypointId },
    Say { bot: PlayerSlot, phrase: ChatPhrase, team_only: bool },
}

impl BotNotification {
    /// Бот-адресат (None — broadcast всем ботам)
    pub fn target(&self) -> Option<PlayerSlot> {
        match self {
            BotNotification::KilledEnemy { bot, .. }
            | BotNotification::HurtBy { bot, .. }
            | BotNotification::Died { bot }
            | BotNotification::Respawned { bot }
            | BotNotification::GoTo { bot, .. }
            | BotNotification::Say { bot, .. } => Some(*bot),
            BotNotification::PlayerDisconnected { .. } => None,
        }
    }
}
