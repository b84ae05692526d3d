//! BotController — tick orchestrator одного бота
//!
//! Порядок тика (ничего не блокирует):
//! 1. World refresh: nearest items, pickups
//! 2. Combat selector (цель, оружие, engagement)
//! 3. Movement + arrival policy мода + stuck detection/recovery
//! 4. Action queue: Started → исполнение (aim/move/weapon/timed)
//! 5. Aim, timed actions, сборка BotCommand
//!
//! События копятся за тик, ECS система забирает их через drain_events().

use std::sync::Arc;

use bevy::prelude::*;

use crate::bot::action::{ActionArgument, ActionKind, AtomicAction};
use crate::bot::action_queue::{ActionQueue, QueueStep, WaitProbe};
use crate::bot::aim::AimController;
use crate::bot::arsenal::Arsenal;
use crate::bot::combat::{CombatContext, CombatSelector, Engagement};
use crate::bot::events::{BotEventKind, ChatPhrase, MoveFailure};
use crate::bot::items::ItemTracker;
use crate::bot::movement::{MovementController, MovementState};
use crate::bot::stuck::{Recovery, StuckDetector, StuckInput, StuckPhase, StuckSignal};
use crate::bot::timed_action::{TimedActionExecutor, TimedOutcome};
use crate::components::{
    AgentState, BotCommand, BotIdentity, Buttons, EntityType, ItemHandle, LookAngles, PlayerSlot,
    WaypointId, WorldSnapshot,
};
use crate::config::BotConfig;
use crate::error::{BotError, Result};
use crate::logger;
use crate::world::{
    ItemRegistry, LineOfSight, ModRules, PathSearch, PostureRequest, WaypointArrival, WaypointGraph,
};

/// Цель aim сдвинулась меньше — поворот не перезапускаем
const AIM_RETARGET_DEGREES: f32 = 0.5;

/// Read-only входы одного тика
pub struct TickContext<'a> {
    pub now: f32,
    pub agent: &'a AgentState,
    pub world: &'a WorldSnapshot,
    pub graph: &'a dyn WaypointGraph,
    pub items: &'a dyn ItemRegistry,
    pub rules: &'a dyn ModRules,
    pub sight: &'a dyn LineOfSight,
}

impl WaitProbe for TickContext<'_> {
    fn is_player_alive(&self, slot: PlayerSlot) -> bool {
        self.world.player(slot).is_some_and(|p| p.alive)
    }

    fn is_entity_present(&self, entity: ItemHandle) -> bool {
        self.items.is_present(entity)
    }
}

/// Куда смотреть по команде из очереди
#[derive(Debug, Clone, Copy, PartialEq)]
enum QueuedAim {
    Point(Vec3),
    Angles(LookAngles),
}

pub struct BotController {
    identity: BotIdentity,
    config: Arc<BotConfig>,
    queue: ActionQueue,
    aim: AimController,
    movement: MovementController,
    stuck: StuckDetector,
    timed: TimedActionExecutor,
    combat: CombatSelector,
    arsenal: Arsenal,
    items: ItemTracker,
    posture: PostureRequest,
    queued_aim: Option<QueuedAim>,
    /// Arrival plan держит движение, пока очередь не опустеет
    hold: bool,
    last_current: Option<WaypointId>,
    alive: bool,
    lock_all: bool,
    dont_break_objects: bool,
    debugging: bool,
    path_test: bool,
    events: Vec<BotEventKind>,
}

impl BotController {
    pub fn new(identity: BotIdentity, config: Arc<BotConfig>, search: Box<dyn PathSearch>) -> Self {
        let seed = config.seed ^ u64::from(identity.slot.0).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        Self {
            identity,
            config,
            queue: ActionQueue::new(),
            aim: AimController::default(),
            movement: MovementController::new(search),
            stuck: StuckDetector::new(seed),
            timed: TimedActionExecutor::new(),
            combat: CombatSelector::new(),
            arsenal: Arsenal::new(),
            items: ItemTracker::new(),
            posture: PostureRequest::default(),
            queued_aim: None,
            hold: false,
            last_current: None,
            alive: true,
            lock_all: false,
            dont_break_objects: false,
            debugging: false,
            path_test: false,
            events: Vec::new(),
        }
    }

    pub fn identity(&self) -> &BotIdentity {
        &self.identity
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn queue(&self) -> &ActionQueue {
        &self.queue
    }

    pub fn aim(&self) -> &AimController {
        &self.aim
    }

    pub fn movement(&self) -> &MovementController {
        &self.movement
    }

    pub fn stuck(&self) -> &StuckDetector {
        &self.stuck
    }

    pub fn timed(&self) -> &TimedActionExecutor {
        &self.timed
    }

    pub fn combat(&self) -> &CombatSelector {
        &self.combat
    }

    pub fn arsenal(&self) -> &Arsenal {
        &self.arsenal
    }

    pub fn arsenal_mut(&mut self) -> &mut Arsenal {
        &mut self.arsenal
    }

    pub fn items(&self) -> &ItemTracker {
        &self.items
    }

    pub fn posture(&self) -> PostureRequest {
        self.posture
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_holding(&self) -> bool {
        self.hold
    }

    pub fn is_debugging(&self) -> bool {
        self.debugging
    }

    /// Per-bot debug output в logger
    pub fn set_debugging(&mut self, debugging: bool) {
        self.debugging = debugging;
        logger::log_info(&format!(
            "{}: debugging {}",
            self.identity.name,
            if debugging { "on" } else { "off" }
        ));
    }

    /// Мод забирает управление: ни движения, ни aim, ни атаки
    pub fn set_lock_all(&mut self, locked: bool) {
        self.lock_all = locked;
        if locked {
            self.aim.lock();
        } else {
            self.aim.unlock();
        }
    }

    pub fn is_locked_all(&self) -> bool {
        self.lock_all
    }

    pub fn set_dont_attack(&mut self, dont_attack: bool) {
        self.combat.set_dont_attack(dont_attack);
    }

    pub fn set_dont_break_objects(&mut self, dont_break: bool) {
        self.dont_break_objects = dont_break;
    }

    /// Заблокировать movement (decision layer); дольше grace → LockedTooLong
    pub fn lock_movement(&mut self) {
        self.movement.lock();
    }

    pub fn unlock_movement(&mut self) {
        self.movement.unlock();
    }

    /// Добавить action в очередь. Переполнение логируется и возвращается.
    pub fn enqueue(&mut self, action: AtomicAction) -> Result<()> {
        self.queue.enqueue(action).map_err(|err| {
            logger::log_warning(&format!("{}: {}", self.identity.name, err));
            err
        })
    }

    /// Отменить всё из очереди (и голову в работе)
    pub fn clear_actions(&mut self) {
        self.queue.clear();
        self.hold = false;
    }

    /// Идти по графу к waypoint (отменяет поиск и stuck timers)
    pub fn set_destination(&mut self, destination: WaypointId) {
        self.movement.set_destination(destination);
        self.stuck.reset();
        self.queued_aim = None;
        self.posture = PostureRequest::default();
        self.debug(|| format!("destination {destination}"));
    }

    pub fn move_to_point(&mut self, point: Vec3) {
        self.movement.move_to_point(point);
        self.stuck.reset();
        self.posture = PostureRequest::default();
    }

    pub fn stop(&mut self) {
        self.movement.stop();
        self.stuck.reset();
        self.posture = PostureRequest::default();
    }

    /// Проверка маршрута: телепорт в `from`, идём в `to`, результат — PathTestFinished
    pub fn test_path(&mut self, from: WaypointId, to: WaypointId) {
        self.movement.set_current(Some(from));
        self.set_destination(to);
        self.path_test = true;
        logger::log_info(&format!("{}: path test {} -> {}", self.identity.name, from, to));
    }

    pub fn drain_events(&mut self) -> Vec<BotEventKind> {
        std::mem::take(&mut self.events)
    }

    // --- Lifecycle / notifications ---

    /// Respawn: всё заново, current = ближайший waypoint
    pub fn respawned(&mut self, now: f32, agent: &AgentState, graph: &dyn WaypointGraph) {
        self.queue.clear();
        self.aim.reset(self.aim.look());
        self.timed.cancel_all();
        self.timed.reset_already_used();
        self.stuck.reset();
        self.combat.reset();
        self.items.clear();
        self.arsenal.set_zoomed(false);
        self.posture = PostureRequest::default();
        self.queued_aim = None;
        self.hold = false;
        self.alive = true;

        let nearest = graph.nearest(agent.position);
        self.movement.set_current(nearest);
        self.last_current = nearest;
        self.stuck.on_waypoint_changed(nearest);
        logger::log_info(&format!(
            "{}: respawned near {:?} at t={:.2}",
            self.identity.name, nearest, now
        ));
    }

    pub fn dead(&mut self) {
        self.alive = false;
        self.queue.clear();
        self.movement.stop();
        self.timed.cancel_all();
        self.combat.reset();
        self.stuck.reset();
        self.aim.unlock();
        self.posture = PostureRequest::default();
        self.queued_aim = None;
        self.hold = false;
        self.finish_path_test(false);
        self.debug(|| "died".to_string());
    }

    pub fn killed_enemy(&mut self, victim: PlayerSlot) {
        self.events.push(BotEventKind::KilledEnemy(victim));
        if let Some(change) = self.combat.forget(victim) {
            self.events.push(BotEventKind::TargetChanged {
                from: change.from,
                to: change.to,
            });
        }
    }

    pub fn hurt_by(&mut self, attacker: PlayerSlot, agent: &AgentState) {
        self.events.push(BotEventKind::HurtBy(attacker));
        self.combat.hurt_by(attacker, agent, &self.config.combat);
        if self.combat.is_fleeing() {
            self.debug(|| format!("low health ({}), fleeing from {attacker}", agent.health));
        }
    }

    pub fn player_disconnected(&mut self, slot: PlayerSlot) {
        if let Some(change) = self.combat.forget(slot) {
            self.events.push(BotEventKind::TargetChanged {
                from: change.from,
                to: change.to,
            });
        }
    }

    pub fn say(&mut self, phrase: ChatPhrase, team_only: bool) {
        self.events.push(BotEventKind::ChatRequested { phrase, team_only });
    }

    // --- Tick ---

    pub fn tick(&mut self, ctx: &TickContext<'_>) -> BotCommand {
        let config = Arc::clone(&self.config);
        let now = ctx.now;
        let agent = ctx.agent;

        if !agent.alive {
            if self.alive {
                self.dead();
            }
            return BotCommand {
                look: self.aim.look(),
                ..BotCommand::default()
            };
        }
        self.alive = true;

        // 1. World refresh
        for handle in self.items.refresh(now, agent.position, ctx.items, &config.items) {
            if handle.kind == EntityType::Health {
                self.combat.on_health_restored(agent, &config.combat);
            }
            self.debug(|| format!("picked {handle}"));
            self.events.push(BotEventKind::PickedItem(handle));
        }

        if self.lock_all {
            return BotCommand {
                look: self.aim.tick(now),
                ..BotCommand::default()
            };
        }

        // 2. Combat
        let update = self.combat.tick(
            &CombatContext {
                now,
                bot: &self.identity,
                agent,
                look: self.aim.look(),
                world: ctx.world,
                rules: ctx.rules,
                sight: ctx.sight,
                config: &config.combat,
            },
            &mut self.arsenal,
        );
        if let Some(change) = update.change {
            self.debug(|| format!("target {:?} -> {:?}", change.from, change.to));
            self.events.push(BotEventKind::TargetChanged {
                from: change.from,
                to: change.to,
            });
        }
        let mut weapon_select = update.weapon_select;

        // 3. Movement + stuck
        let mut direction = Vec3::ZERO;
        let mut move_target = None;
        if !self.hold && !self.timed.is_using_machine() {
            let out = self.movement.tick(now, agent.position, ctx.graph, &config.movement);
            direction = out.direction;
            move_target = out.target;
            if let Some(failure) = out.failure {
                self.on_move_failure(failure);
            }
            if out.reached_point {
                self.events.push(BotEventKind::ArrivedAtDestination(None));
            }
            self.handle_arrival(ctx);
        }
        self.sync_current_waypoint();

        let combat_steer = self.combat.steer(now, agent.position, &config.combat);
        let signal = self.stuck.tick(
            &StuckInput {
                now,
                position: agent.position,
                moving: combat_steer.is_none() && direction != Vec3::ZERO,
                current: self.movement.current(),
                items: ctx.items,
                rules: ctx.rules,
                allow_object_removal: config.stuck.allow_object_removal && !self.dont_break_objects,
            },
            &config.stuck,
        );
        self.on_stuck_signal(signal);

        let mut recovery_buttons = Buttons::NONE;
        let mut break_target = None;
        if let Some(steer) = combat_steer {
            direction = steer;
        } else if self.stuck.is_recovering() {
            match self.stuck.recovery(direction) {
                Recovery::Break { target, push } => {
                    break_target = Some(target);
                    recovery_buttons.press(if push { Buttons::USE } else { Buttons::ATTACK });
                }
                Recovery::SideStep(side) => direction = side,
                Recovery::Retouch | Recovery::None => {}
            }
        }

        // 4. Action queue
        match self.queue.tick(now, ctx) {
            QueueStep::Started(action) => {
                if let Some(index) = self.execute(action, now) {
                    weapon_select = Some(index);
                }
            }
            QueueStep::Completed(action) => self.debug(|| format!("done {:?}", action.kind())),
            QueueStep::Waiting(_) | QueueStep::Idle => {}
        }

        // 5. Aim: бой > ломаем объект > очередь > смотрим по ходу
        let eye = agent.eye_position();
        let combat_goal = self
            .combat
            .target()
            .map(|t| LookAngles::from_direction(t.aim_point - eye));
        let goal = combat_goal
            .or_else(|| break_target.map(|p| LookAngles::from_direction(p - eye)))
            .or_else(|| {
                self.queued_aim.map(|aim| match aim {
                    QueuedAim::Point(p) => LookAngles::from_direction(p - eye),
                    QueuedAim::Angles(angles) => angles,
                })
            })
            .or_else(|| move_target.and_then(|t| self.look_forward(eye, t)));

        // Во время USE у автомата и в прыжке взгляд не крутим
        if self.timed.is_using_machine() || self.timed.is_jumping(now) {
            self.aim.lock();
        } else {
            self.aim.unlock();
        }
        self.aim.tick(now);
        if let Some(goal) = goal {
            let reference = self.aim.target().unwrap_or_else(|| self.aim.look());
            if reference.angular_distance(&goal) > AIM_RETARGET_DEGREES {
                self.aim
                    .set_target_angles(goal, now, self.identity.intelligence, &config.aim);
            }
        }
        let look = self.aim.look();
        let aim_on_target = combat_goal.is_some_and(|g| self.aim.is_on_target(&g, config.aim.aimed_tolerance));

        // Timed actions
        let timed = self.timed.tick(now, agent, config.actions.machine_check_interval);
        for outcome in &timed.outcomes {
            if let TimedOutcome::MachineExhausted(resource) = *outcome {
                self.debug(|| format!("{} machine exhausted", resource.as_str()));
                self.events.push(BotEventKind::MachineExhausted(resource));
                // Автомат пуст — окно очереди не дожидаемся
                if matches!(self.queue.current().map(|a| a.kind()), Some(ActionKind::UseMachine(_))) {
                    self.queue.cancel_current();
                }
            }
        }
        if self.hold && !self.queue.is_busy() {
            self.hold = false;
        }

        // Сборка команды
        let mut buttons = timed.buttons | recovery_buttons;
        buttons.press(self.combat.fire_buttons(self.identity.intelligence, aim_on_target, &mut self.arsenal));
        if self.posture.duck {
            buttons.press(Buttons::DUCK);
        }
        if self.posture.walk {
            buttons.press(Buttons::WALK);
        }
        if self.posture.sprint && self.combat.engagement() == Engagement::None {
            buttons.press(Buttons::SPRINT);
        }
        if self.posture.flashlight {
            buttons.press(Buttons::FLASHLIGHT);
        }

        BotCommand {
            move_direction: direction,
            speed: self.speed_for(direction, buttons),
            look,
            buttons,
            weapon_select,
        }
    }

    fn speed_for(&self, direction: Vec3, buttons: Buttons) -> f32 {
        let movement = &self.config.movement;
        if direction == Vec3::ZERO {
            0.0
        } else if buttons.is_pressed(Buttons::SPRINT) {
            movement.sprint_speed
        } else if buttons.is_pressed(Buttons::WALK) || buttons.is_pressed(Buttons::DUCK) {
            movement.walk_speed
        } else {
            movement.run_speed
        }
    }

    /// Взгляд по ходу движения (горизонтально; на ладдере — прямо на waypoint)
    fn look_forward(&self, eye: Vec3, target: Vec3) -> Option<LookAngles> {
        let point = if self.posture.ladder {
            target
        } else {
            Vec3::new(target.x, eye.y, target.z)
        };
        let delta = point - eye;
        (delta.length_squared() > f32::EPSILON).then(|| LookAngles::from_direction(delta))
    }

    fn execute(&mut self, action: AtomicAction, now: f32) -> Option<usize> {
        self.debug(|| format!("start {:?} {:?}", action.kind(), action.argument()));
        match (action.kind(), *action.argument()) {
            (ActionKind::Aim, ActionArgument::Position(point)) => {
                self.queued_aim = Some(QueuedAim::Point(point));
            }
            (ActionKind::Aim, ActionArgument::Angles(angles)) => {
                self.queued_aim = Some(QueuedAim::Angles(angles));
            }
            (ActionKind::Move, ActionArgument::Waypoint(id)) => self.set_destination(id),
            (ActionKind::Move, ActionArgument::Position(point)) => self.move_to_point(point),
            (ActionKind::SwitchWeapon, ActionArgument::Weapon(index)) => match self.arsenal.select(index) {
                Ok(()) => return Some(index),
                Err(err) => logger::log_warning(&format!("{}: {}", self.identity.name, err)),
            },
            (ActionKind::WaitForEntityGone, ActionArgument::Position(point)) => {
                self.queued_aim = Some(QueuedAim::Point(point));
            }
            (ActionKind::Press(button), ActionArgument::Window(window)) => {
                self.timed.schedule(button, window, now);
            }
            (ActionKind::UseMachine(resource), ActionArgument::Window(window)) => {
                self.timed.schedule_machine(resource, window, now);
            }
            // WaitTime: только ожидание в очереди
            _ => {}
        }
        None
    }

    fn sync_current_waypoint(&mut self) {
        let current = self.movement.current();
        if current != self.last_current {
            self.last_current = current;
            self.timed.reset_already_used();
            self.stuck.on_waypoint_changed(current);
        }
    }

    fn handle_arrival(&mut self, ctx: &TickContext<'_>) {
        let MovementState::ArrivedAtWaypoint {
            waypoint,
            reached_destination,
        } = *self.movement.state()
        else {
            return;
        };
        self.sync_current_waypoint();

        let plan = ctx.rules.on_waypoint_arrival(&WaypointArrival {
            bot: &self.identity,
            agent: ctx.agent,
            waypoint,
            next: self.movement.next(),
            graph: ctx.graph,
            already_used: self.timed.already_used(),
            dont_break_objects: self.dont_break_objects,
            config: &self.config.actions,
        });
        self.movement.finish_arrival();
        self.events.push(BotEventKind::ArrivedAtWaypoint(waypoint));
        self.queued_aim = None;
        self.posture = plan.posture;

        let hold = plan.hold_movement && !plan.actions.is_empty();
        for action in plan.actions {
            if self.enqueue(action).is_err() {
                break;
            }
        }
        self.hold |= hold;

        if reached_destination {
            self.debug(|| format!("reached destination {waypoint}"));
            self.events.push(BotEventKind::ArrivedAtDestination(Some(waypoint)));
            self.finish_path_test(true);
        }
    }

    fn on_move_failure(&mut self, failure: MoveFailure) {
        logger::log_warning(&format!("{}: {}", self.identity.name, BotError::from(failure)));
        self.events.push(BotEventKind::MoveFailure(failure));
        self.hold = false;
        self.posture = PostureRequest::default();
        self.finish_path_test(false);
    }

    fn on_stuck_signal(&mut self, signal: StuckSignal) {
        match signal {
            StuckSignal::None => {}
            StuckSignal::BecameStuck { episode } => {
                let waypoint = self.movement.current();
                self.debug(|| format!("stuck near {waypoint:?} (episode {episode})"));
                self.events.push(BotEventKind::Stuck { waypoint, episode });
            }
            StuckSignal::Rung(StuckPhase::RetouchCurrent { .. }) => {
                self.movement.retouch_current();
            }
            StuckSignal::Rung(phase) => self.debug(|| format!("stuck recovery {phase:?}")),
            StuckSignal::Unstuck => self.debug(|| "unstuck".to_string()),
            StuckSignal::Escalated => {
                let failure = MoveFailure::Stuck(self.movement.current());
                self.movement.abort(failure);
                self.stuck.reset();
                self.on_move_failure(failure);
            }
        }
    }

    fn finish_path_test(&mut self, success: bool) {
        if self.path_test {
            self.path_test = false;
            self.events.push(BotEventKind::PathTestFinished { success });
        }
    }

    fn debug(&self, message: impl FnOnce() -> String) {
        if self.debugging {
            logger::log(&format!("{}: {}", self.identity.name, message()));
        }
    }
}
