//! Bot core — per-tick control loop одного бота
//!
//! Sub-controllers (leaf-first):
//! - action / action_queue: атомарные действия + FIFO очередь (capacity 32)
//! - aim: плавный поворот взгляда
//! - movement: граф / прямое движение, arrival
//! - stuck: детекция застревания + recovery ladder
//! - timed_action: "держать кнопку от T0 до T1", автоматы
//! - combat / arsenal: выбор цели и оружия
//! - items: ближайшие предметы, pickups
//! - controller: tick orchestrator → BotCommand

pub mod action;
pub mod action_queue;
pub mod aim;
pub mod arsenal;
pub mod combat;
pub mod controller;
pub mod events;
pub mod items;
pub mod movement;
pub mod stuck;
pub mod timed_action;

#[cfg(test)]
mod combat_tests;
#[cfg(test)]
mod controller_tests;

// Re-export основных типов
pub use action::{ActionArgument, ActionKind, AtomicAction, TimeWindow, TimedButton, WaitCondition};
pub use action_queue::{ActionQueue, QueueStep, WaitProbe, ACTION_QUEUE_CAPACITY};
pub use aim::{AimController, AimState};
pub use arsenal::{Arsenal, WeaponSlot};
pub use combat::{CombatSelector, CombatTarget, Engagement, TargetChange};
pub use controller::{BotController, TickContext};
pub use events::{BotEvent, BotEventKind, BotNotification, ChatPhrase, MoveFailure};
pub use items::ItemTracker;
pub use movement::{MovementController, MovementState};
pub use stuck::{StuckDetector, StuckPhase};
pub use timed_action::{TimedActionExecutor, TimedOutcome};
