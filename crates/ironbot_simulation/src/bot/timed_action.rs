//! Timed action executor — "держать кнопку от T0 до T1"
//!
//! Общий механизм для use/attack/attack2/jump/duck:
//! - Jump — one-shot в start
//! - JumpDuck — jump в start + duck до end
//! - UseMachine — USE + наблюдение за health/armor; перестал расти → выходим раньше
//!
//! Окна хранятся в абсолютном времени (now + relative window при schedule).

use crate::bot::action::{TimeWindow, TimedButton};
use crate::components::{AgentState, Buttons, ResourceKind};

/// Чем закончился timed action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedOutcome {
    /// Окно кончилось штатно
    Finished(TimedButton),
    /// Автомат отработал до конца окна
    MachineFinished(ResourceKind),
    /// Автомат перестал давать ресурс до конца окна (ожидаемое завершение, не ошибка)
    MachineExhausted(ResourceKind),
}

/// Результат одного тика
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimedTick {
    pub buttons: Buttons,
    pub outcomes: Vec<TimedOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ResourceWatch {
    resource: ResourceKind,
    last_value: Option<i32>,
    next_check: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TimedAction {
    button: TimedButton,
    start: f32,
    end: f32,
    fired: bool,
    watch: Option<ResourceWatch>,
}

impl TimedButton {
    fn initial_press(self) -> Buttons {
        match self {
            TimedButton::Use => Buttons::USE,
            TimedButton::Attack => Buttons::ATTACK,
            TimedButton::Attack2 => Buttons::ATTACK2,
            TimedButton::Jump => Buttons::JUMP,
            TimedButton::Duck => Buttons::DUCK,
            TimedButton::JumpDuck => Buttons::JUMP | Buttons::DUCK,
        }
    }

    fn held(self) -> Buttons {
        match self {
            TimedButton::Jump => Buttons::NONE,
            TimedButton::JumpDuck => Buttons::DUCK,
            other => other.initial_press(),
        }
    }
}

fn resource_value(agent: &AgentState, resource: ResourceKind) -> i32 {
    match resource {
        ResourceKind::Health => agent.health,
        ResourceKind::Armor => agent.armor,
    }
}

/// Активные timed actions (по одному на кнопку)
#[derive(Debug, Clone, Default)]
pub struct TimedActionExecutor {
    actions: Vec<TimedAction>,
    already_used: bool,
}

impl TimedActionExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Запланировать нажатие; то же самое нажатие заменяется
    pub fn schedule(&mut self, button: TimedButton, window: TimeWindow, now: f32) {
        self.insert(TimedAction {
            button,
            start: now + window.start,
            end: now + window.end,
            fired: false,
            watch: None,
        });
    }

    /// USE у автомата health/armor с проверкой прироста ресурса
    pub fn schedule_machine(&mut self, resource: ResourceKind, window: TimeWindow, now: f32) {
        self.insert(TimedAction {
            button: TimedButton::Use,
            start: now + window.start,
            end: now + window.end,
            fired: false,
            watch: Some(ResourceWatch {
                resource,
                last_value: None,
                next_check: now + window.start,
            }),
        });
    }

    fn insert(&mut self, action: TimedAction) {
        self.actions.retain(|a| a.button != action.button);
        self.actions.push(action);
    }

    pub fn cancel(&mut self, button: TimedButton) {
        self.actions.retain(|a| a.button != button);
    }

    pub fn cancel_all(&mut self) {
        self.actions.clear();
    }

    pub fn is_active(&self, button: TimedButton) -> bool {
        self.actions.iter().any(|a| a.button == button)
    }

    pub fn is_idle(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn is_using_machine(&self) -> bool {
        self.actions.iter().any(|a| a.watch.is_some())
    }

    /// Прыжок уже начался и окно ещё не закрыто
    pub fn is_jumping(&self, now: f32) -> bool {
        self.actions
            .iter()
            .any(|a| matches!(a.button, TimedButton::Jump | TimedButton::JumpDuck) && a.start <= now)
    }

    /// USE уже выполнен в этом подходе (не повторяем у того же автомата)
    pub fn already_used(&self) -> bool {
        self.already_used
    }

    pub fn reset_already_used(&mut self) {
        self.already_used = false;
    }

    /// Кнопки на текущий тик + завершившиеся actions
    pub fn tick(&mut self, now: f32, agent: &AgentState, check_interval: f32) -> TimedTick {
        let mut result = TimedTick::default();
        let mut used = false;

        self.actions.retain_mut(|action| {
            if now < action.start {
                return true;
            }

            if let Some(watch) = action.watch.as_mut() {
                let value = resource_value(agent, watch.resource);
                match watch.last_value {
                    None => {
                        watch.last_value = Some(value);
                        watch.next_check = now + check_interval;
                    }
                    Some(last) if now >= watch.next_check => {
                        if value <= last {
                            used = true;
                            result.outcomes.push(TimedOutcome::MachineExhausted(watch.resource));
                            return false;
                        }
                        watch.last_value = Some(value);
                        watch.next_check = now + check_interval;
                    }
                    Some(_) => {}
                }
            }

            let mut keep = true;
            if !action.fired {
                action.fired = true;
                result.buttons.press(action.button.initial_press());
                keep = action.button != TimedButton::Jump;
            } else if now >= action.end {
                keep = false;
            } else {
                result.buttons.press(action.button.held());
            }

            if !keep {
                match action.watch {
                    Some(watch) => {
                        used = true;
                        result.outcomes.push(TimedOutcome::MachineFinished(watch.resource));
                    }
                    None => result.outcomes.push(TimedOutcome::Finished(action.button)),
                }
            }
            keep
        });

        if used {
            self.already_used = true;
        }
        result
    }
}
