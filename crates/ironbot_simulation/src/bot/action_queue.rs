//! ActionQueue — circular buffer атомарных действий (capacity 32)
//!
//! Порядок строго FIFO:
//! 1. Нет action в работе → pop следующего, Started (controller исполняет)
//! 2. Action в работе → проверяем WaitCondition каждый тик
//! 3. Условие выполнено → Completed, следующий pop только на следующем тике
//!
//! Инвариант: pending WaitCondition максимум один (голова в работе).

use crate::bot::action::{AtomicAction, WaitCondition};
use crate::components::{ItemHandle, PlayerSlot};
use crate::error::{BotError, Result};

/// Размер circular buffer
pub const ACTION_QUEUE_CAPACITY: usize = 32;

/// Проверка условий ожидания против мира
pub trait WaitProbe {
    fn is_player_alive(&self, slot: PlayerSlot) -> bool;
    fn is_entity_present(&self, entity: ItemHandle) -> bool;
}

/// Результат одного тика очереди
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueueStep {
    /// Очередь пуста
    Idle,
    /// Action только что начат — controller должен его исполнить
    Started(AtomicAction),
    /// Action в работе, условие ещё не выполнено
    Waiting(AtomicAction),
    /// Условие выполнено, action завершён
    Completed(AtomicAction),
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    action: AtomicAction,
    started_at: f32,
}

/// Circular buffer + голова в работе
#[derive(Debug, Clone)]
pub struct ActionQueue {
    slots: [Option<AtomicAction>; ACTION_QUEUE_CAPACITY],
    head: usize,
    len: usize,
    in_flight: Option<InFlight>,
}

impl Default for ActionQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionQueue {
    pub fn new() -> Self {
        Self {
            slots: [None; ACTION_QUEUE_CAPACITY],
            head: 0,
            len: 0,
            in_flight: None,
        }
    }

    /// Добавить action в хвост. Полная очередь не трогается.
    pub fn enqueue(&mut self, action: AtomicAction) -> Result<()> {
        if self.is_full() {
            return Err(BotError::QueueFull {
                capacity: ACTION_QUEUE_CAPACITY,
            });
        }
        let tail = (self.head + self.len) % ACTION_QUEUE_CAPACITY;
        self.slots[tail] = Some(action);
        self.len += 1;
        Ok(())
    }

    /// Один шаг исполнения (вызывается раз в тик)
    pub fn tick(&mut self, now: f32, probe: &dyn WaitProbe) -> QueueStep {
        if let Some(current) = self.in_flight {
            if Self::is_satisfied(&current, now, probe) {
                self.in_flight = None;
                return QueueStep::Completed(current.action);
            }
            return QueueStep::Waiting(current.action);
        }

        match self.pop() {
            Some(action) => {
                self.in_flight = Some(InFlight {
                    action,
                    started_at: now,
                });
                QueueStep::Started(action)
            }
            None => QueueStep::Idle,
        }
    }

    fn is_satisfied(current: &InFlight, now: f32, probe: &dyn WaitProbe) -> bool {
        match current.action.wait() {
            WaitCondition::None => true,
            WaitCondition::UntilPlayerDead(slot) => !probe.is_player_alive(slot),
            WaitCondition::UntilEntityGone(entity) => !probe.is_entity_present(entity),
            WaitCondition::UntilTimeElapsed(seconds) => now - current.started_at >= seconds,
        }
    }

    fn pop(&mut self) -> Option<AtomicAction> {
        if self.len == 0 {
            return None;
        }
        let action = self.slots[self.head].take();
        self.head = (self.head + 1) % ACTION_QUEUE_CAPACITY;
        self.len -= 1;
        action
    }

    /// Отменить action в работе (очередь остаётся)
    pub fn cancel_current(&mut self) -> Option<AtomicAction> {
        self.in_flight.take().map(|f| f.action)
    }

    /// Сбросить всё: очередь + голову в работе
    pub fn clear(&mut self) {
        self.slots = [None; ACTION_QUEUE_CAPACITY];
        self.head = 0;
        self.len = 0;
        self.in_flight = None;
    }

    pub fn current(&self) -> Option<&AtomicAction> {
        self.in_flight.as_ref().map(|f| &f.action)
    }

    /// Ожидающие (ещё не начатые) actions в порядке исполнения
    pub fn pending(&self) -> impl Iterator<Item = &AtomicAction> + '_ {
        (0..self.len).filter_map(move |i| self.slots[(self.head + i) % ACTION_QUEUE_CAPACITY].as_ref())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == ACTION_QUEUE_CAPACITY
    }

    /// Есть action в работе или в очереди
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some() || self.len > 0
    }
}
