//! Movement sub-controller — движение по waypoint графу или напрямую к точке
//!
//! GraphMove каждый тик:
//! 1. Re-validate cursors (current/destination/next) против графа
//! 2. destination_changed → has_path → старт поиска (destination == current → сразу arrival)
//! 3. Poll поиска; пока Pending — держим курс на последний известный waypoint
//! 4. Касание next → сдвиг cursors, ArrivedAtWaypoint (transient, controller вызывает finish_arrival)
//!
//! Failed не ретраится — решение за decision layer.

use std::fmt;

use bevy::prelude::*;

use crate::bot::events::MoveFailure;
use crate::components::{PathFlags, WaypointId};
use crate::config::MovementConfig;
use crate::error::Result;
use crate::world::{PathSearch, SearchPoll, WaypointGraph};

/// Состояние движения
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementState {
    Idle,
    DirectMove { target: Vec3 },
    GraphMove,
    /// Коснулись waypoint; держится до finish_arrival()
    ArrivedAtWaypoint {
        waypoint: WaypointId,
        reached_destination: bool,
    },
    Failed(MoveFailure),
}

/// Результат тика движения
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveOutput {
    /// Нормализованное направление (ZERO — не двигаемся)
    pub direction: Vec3,
    /// Куда идём сейчас (для look-forward)
    pub target: Option<Vec3>,
    /// Движение провалилось на этом тике
    pub failure: Option<MoveFailure>,
    /// DirectMove достиг точки на этом тике
    pub reached_point: bool,
}

pub struct MovementController {
    state: MovementState,
    current: Option<WaypointId>,
    next: Option<WaypointId>,
    after_next: Option<WaypointId>,
    destination: Option<WaypointId>,
    destination_changed: bool,
    search: Box<dyn PathSearch>,
    search_pending: bool,
    /// Последний известный next старого маршрута: курс, пока новый поиск не готов
    heading: Option<WaypointId>,
    retouch: bool,
    locked: bool,
    lock_started: Option<f32>,
}

impl fmt::Debug for MovementController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MovementController")
            .field("state", &self.state)
            .field("current", &self.current)
            .field("next", &self.next)
            .field("after_next", &self.after_next)
            .field("destination", &self.destination)
            .field("search_pending", &self.search_pending)
            .field("heading", &self.heading)
            .field("locked", &self.locked)
            .finish_non_exhaustive()
    }
}

/// Горизонтальное касание (на ладдере ещё и по вертикали)
fn touches(position: Vec3, target: Vec3, ladder: bool, config: &MovementConfig) -> bool {
    let planar = Vec2::new(target.x - position.x, target.z - position.z);
    if planar.length_squared() >= config.arrive_radius * config.arrive_radius {
        return false;
    }
    !ladder || (target.y - position.y).abs() < config.ladder_vertical_tolerance
}

fn steer(position: Vec3, target: Vec3, ladder: bool) -> Vec3 {
    let delta = target - position;
    if ladder {
        delta.normalize_or_zero()
    } else {
        Vec3::new(delta.x, 0.0, delta.z).normalize_or_zero()
    }
}

impl MovementController {
    pub fn new(search: Box<dyn PathSearch>) -> Self {
        Self {
            state: MovementState::Idle,
            current: None,
            next: None,
            after_next: None,
            destination: None,
            destination_changed: false,
            search,
            search_pending: false,
            heading: None,
            retouch: false,
            locked: false,
            lock_started: None,
        }
    }

    pub fn state(&self) -> &MovementState {
        &self.state
    }

    pub fn current(&self) -> Option<WaypointId> {
        self.current
    }

    pub fn next(&self) -> Option<WaypointId> {
        self.next
    }

    pub fn after_next(&self) -> Option<WaypointId> {
        self.after_next
    }

    pub fn destination(&self) -> Option<WaypointId> {
        self.destination
    }

    /// Destination сменился и ещё не обработан тиком
    pub fn destination_changed(&self) -> bool {
        self.destination_changed
    }

    pub fn is_searching(&self) -> bool {
        self.search_pending
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_retouching(&self) -> bool {
        self.retouch
    }

    /// Есть куда идти (GraphMove / DirectMove)
    pub fn wants_move(&self) -> bool {
        matches!(
            self.state,
            MovementState::GraphMove | MovementState::DirectMove { .. }
        )
    }

    pub fn move_failure(&self) -> Option<MoveFailure> {
        match self.state {
            MovementState::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// Err только в Failed
    pub fn result(&self) -> Result<()> {
        match self.move_failure() {
            Some(failure) => Err(failure.into()),
            None => Ok(()),
        }
    }

    /// Флаги текущего сегмента current → next
    pub fn segment_flags(&self, graph: &dyn WaypointGraph) -> PathFlags {
        match (self.current, self.next) {
            (Some(from), Some(to)) => graph.path_flags(from, to),
            _ => PathFlags::NONE,
        }
    }

    /// Телепорт / respawn: новый текущий waypoint, движение сброшено
    pub fn set_current(&mut self, current: Option<WaypointId>) {
        self.stop();
        self.current = current;
    }

    /// Идти по графу к `destination` (отменяет текущий поиск)
    pub fn set_destination(&mut self, destination: WaypointId) {
        let heading = match self.state {
            MovementState::GraphMove => self.next.or(self.heading),
            _ => None,
        };
        self.reset_route();
        self.heading = heading;
        self.destination = Some(destination);
        self.destination_changed = true;
        self.state = MovementState::GraphMove;
    }

    /// Идти напрямую к точке (без графа)
    pub fn move_to_point(&mut self, target: Vec3) {
        self.reset_route();
        self.destination = None;
        self.state = MovementState::DirectMove { target };
    }

    pub fn stop(&mut self) {
        self.reset_route();
        self.destination = None;
        self.state = MovementState::Idle;
    }

    fn reset_route(&mut self) {
        self.search.cancel();
        self.search_pending = false;
        self.destination_changed = false;
        self.heading = None;
        self.next = None;
        self.after_next = None;
        self.retouch = false;
        self.lock_started = None;
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
        self.lock_started = None;
    }

    /// Вернуться к current и коснуться его ещё раз (arrival policy без сдвига cursors)
    pub fn retouch_current(&mut self) -> bool {
        if self.state == MovementState::GraphMove && self.current.is_some() {
            self.retouch = true;
        }
        self.retouch
    }

    /// Закрыть transient arrival. Возвращает (waypoint, reached_destination).
    pub fn finish_arrival(&mut self) -> Option<(WaypointId, bool)> {
        let MovementState::ArrivedAtWaypoint {
            waypoint,
            reached_destination,
        } = self.state
        else {
            return None;
        };

        if reached_destination {
            self.stop();
        } else {
            self.state = MovementState::GraphMove;
            if self.next.is_none() && !self.search_pending {
                // Путь кончился раньше destination — ищем заново
                self.destination_changed = true;
            }
        }
        Some((waypoint, reached_destination))
    }

    /// Прервать движение извне (stuck escalation): destination брошен
    pub fn abort(&mut self, failure: MoveFailure) {
        self.reset_route();
        self.destination = None;
        self.state = MovementState::Failed(failure);
    }

    fn fail(&mut self, failure: MoveFailure, out: &mut MoveOutput) {
        self.search.cancel();
        self.search_pending = false;
        self.heading = None;
        self.retouch = false;
        self.state = MovementState::Failed(failure);
        out.failure = Some(failure);
    }

    /// Один тик движения
    pub fn tick(
        &mut self,
        now: f32,
        position: Vec3,
        graph: &dyn WaypointGraph,
        config: &MovementConfig,
    ) -> MoveOutput {
        let mut out = MoveOutput::default();
        if !self.wants_move() {
            return out;
        }

        if self.locked {
            let since = *self.lock_started.get_or_insert(now);
            if now - since > config.move_lock_grace {
                self.fail(MoveFailure::LockedTooLong, &mut out);
            }
            return out;
        }

        match self.state {
            MovementState::DirectMove { target } => {
                if position.distance(target) <= config.direct_arrive_radius {
                    self.state = MovementState::Idle;
                    out.reached_point = true;
                } else {
                    out.direction = steer(position, target, false);
                    out.target = Some(target);
                }
            }
            MovementState::GraphMove => self.graph_tick(position, graph, config, &mut out),
            _ => {}
        }
        out
    }

    fn graph_tick(
        &mut self,
        position: Vec3,
        graph: &dyn WaypointGraph,
        config: &MovementConfig,
        out: &mut MoveOutput,
    ) {
        let Some(destination) = self.destination else {
            self.state = MovementState::Idle;
            return;
        };
        let current = match self.current {
            Some(id) if graph.is_valid(id) => id,
            other => return self.fail(MoveFailure::InvalidWaypoint(other), out),
        };
        if !graph.is_valid(destination) {
            return self.fail(MoveFailure::InvalidWaypoint(Some(destination)), out);
        }
        if self.next.is_some_and(|next| !graph.is_valid(next)) {
            self.next = None;
            self.after_next = None;
            self.destination_changed = true;
        }

        if self.destination_changed {
            self.destination_changed = false;
            self.search.cancel();
            self.search_pending = false;

            if destination == current {
                self.state = MovementState::ArrivedAtWaypoint {
                    waypoint: current,
                    reached_destination: true,
                };
                return;
            }
            if !graph.has_path(current, destination) {
                return self.fail(
                    MoveFailure::Unreachable {
                        from: current,
                        to: destination,
                    },
                    out,
                );
            }
            self.search.start(graph, current, destination);
            self.search_pending = true;
        }

        if self.search_pending {
            match self.search.poll(graph) {
                SearchPoll::Pending => {}
                SearchPoll::Done { next, after_next } => {
                    self.next = Some(next);
                    self.after_next = after_next;
                    self.search_pending = false;
                    self.heading = None;
                }
                SearchPoll::Failed => {
                    return self.fail(
                        MoveFailure::Unreachable {
                            from: current,
                            to: destination,
                        },
                        out,
                    );
                }
            }
        }

        let Some(current_pos) = graph.position(current) else {
            return self.fail(MoveFailure::InvalidWaypoint(Some(current)), out);
        };

        if self.retouch {
            if touches(position, current_pos, false, config) {
                self.retouch = false;
                self.state = MovementState::ArrivedAtWaypoint {
                    waypoint: current,
                    reached_destination: current == destination,
                };
            } else {
                out.direction = steer(position, current_pos, false);
                out.target = Some(current_pos);
            }
            return;
        }

        let Some(next) = self.next else {
            // Поиск ещё идёт — держим прежний курс, иначе держимся current
            let (hold, ladder) = match self.heading.and_then(|id| graph.position(id).map(|pos| (id, pos))) {
                Some((id, pos)) if graph.is_valid(id) => {
                    (pos, graph.path_flags(current, id).contains(PathFlags::LADDER))
                }
                _ => (current_pos, false),
            };
            if !touches(position, hold, ladder, config) {
                out.direction = steer(position, hold, ladder);
                out.target = Some(hold);
            }
            return;
        };
        let Some(next_pos) = graph.position(next) else {
            return self.fail(MoveFailure::InvalidWaypoint(Some(next)), out);
        };

        let ladder = graph.path_flags(current, next).contains(PathFlags::LADDER);
        if touches(position, next_pos, ladder, config) {
            self.current = Some(next);
            self.next = self.after_next;
            self.after_next = self.next.and_then(|n| self.search.waypoint_after(n));
            self.state = MovementState::ArrivedAtWaypoint {
                waypoint: next,
                reached_destination: next == destination,
            };
            return;
        }

        out.direction = steer(position, next_pos, ladder);
        out.target = Some(next_pos);
    }
}
