//! Error types для bot core
//!
//! Ничего не фатально: любая ошибка деградирует до "decision layer, выбери новую цель".

use thiserror::Error;

use crate::bot::action::{ActionArgument, ActionKind};
use crate::bot::events::MoveFailure;
use crate::components::WaypointId;

/// Bot core errors
#[derive(Debug, Error)]
pub enum BotError {
    /// Action queue заполнена (capacity 32) — producer обгоняет consumer
    #[error("action queue is full ({capacity} actions pending)")]
    QueueFull { capacity: usize },

    /// Waypoint удалён из графа или никогда не существовал
    #[error("invalid waypoint {0}")]
    InvalidWaypoint(WaypointId),

    /// Граф говорит что пути нет
    #[error("no path from {from} to {to}")]
    Unreachable { from: WaypointId, to: WaypointId },

    /// Движение прервано: stuck, lock дольше grace или нет current waypoint
    #[error("movement failed: {0}")]
    MoveFailed(MoveFailure),

    /// Аргумент action не соответствует его kind
    #[error("action {kind:?} does not accept argument {argument:?}")]
    ActionArgumentMismatch {
        kind: ActionKind,
        argument: ActionArgument,
    },

    /// Индекс оружия вне арсенала
    #[error("unknown weapon index {0}")]
    UnknownWeapon(usize),

    /// Ошибка парсинга конфига
    #[error("invalid bot configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Ошибка чтения конфига
    #[error("failed to read bot configuration: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MoveFailure> for BotError {
    fn from(failure: MoveFailure) -> Self {
        match failure {
            MoveFailure::InvalidWaypoint(Some(id)) => BotError::InvalidWaypoint(id),
            MoveFailure::Unreachable { from, to } => BotError::Unreachable { from, to },
            other => BotError::MoveFailed(other),
        }
    }
}

/// Result type для bot операций
pub type Result<T> = std::result::Result<T, BotError>;
