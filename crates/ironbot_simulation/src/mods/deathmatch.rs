//! Deathmatch правила: кто враг, что делать на waypoint, как классифицировать entity
//!
//! Arrival policy (первое подходящее):
//! 1. Автомат health/armor, ресурс не полный, USE ещё не было → USE на machine_use_time
//! 2. Кнопка на waypoint → USE
//! 3. Path flags сегмента waypoint → next: поза + jump/break/door/stop actions

use crate::bot::action::{AtomicAction, TimeWindow, TimedButton};
use crate::components::{
    BotIdentity, EntityFlags, EntityType, PathFlags, PlayerInfo, ResourceKind, WaypointFlags,
    UNASSIGNED_TEAM,
};
use crate::world::{ArrivalPlan, ItemClass, ItemInfo, ModRules, PostureRequest, WaypointArrival};

/// Half-Life 2 Deathmatch style правила (free-for-all или команды)
#[derive(Debug, Clone, Copy, Default)]
pub struct DeathmatchRules;

impl DeathmatchRules {
    fn machine_plan(arrival: &WaypointArrival<'_>, flags: WaypointFlags) -> Option<ArrivalPlan> {
        if arrival.already_used {
            return None;
        }
        let resource = if flags.contains(WaypointFlags::HEALTH_MACHINE) && arrival.agent.needs_health() {
            ResourceKind::Health
        } else if flags.contains(WaypointFlags::ARMOR_MACHINE) && arrival.agent.needs_armor() {
            ResourceKind::Armor
        } else {
            return None;
        };

        Some(ArrivalPlan {
            posture: PostureRequest {
                stop: true,
                ..PostureRequest::default()
            },
            actions: vec![AtomicAction::use_machine(
                resource,
                TimeWindow::new(0.0, arrival.config.machine_use_time),
            )],
            hold_movement: true,
        })
    }

    fn path_plan(arrival: &WaypointArrival<'_>) -> ArrivalPlan {
        let Some(next) = arrival.next else {
            return ArrivalPlan::default();
        };
        let path = arrival.graph.path_flags(arrival.waypoint, next);
        let config = arrival.config;

        let mut plan = ArrivalPlan {
            posture: PostureRequest {
                duck: path.contains(PathFlags::CROUCH),
                walk: path.contains(PathFlags::TOTEM),
                sprint: path.intersects(PathFlags::SPRINT | PathFlags::DAMAGE),
                ladder: path.contains(PathFlags::LADDER),
                stop: path.contains(PathFlags::STOP),
                flashlight: path.contains(PathFlags::FLASHLIGHT),
            },
            ..ArrivalPlan::default()
        };

        if path.contains(PathFlags::STOP) {
            plan.actions.push(AtomicAction::wait_for(config.use_time));
            plan.hold_movement = true;
        }
        if path.contains(PathFlags::DOOR) {
            plan.actions
                .push(AtomicAction::press(TimedButton::Use, TimeWindow::new(0.0, config.use_time)));
            plan.hold_movement = true;
        }
        if path.contains(PathFlags::BREAK) && !arrival.dont_break_objects {
            plan.actions
                .push(AtomicAction::press(TimedButton::Attack, TimeWindow::new(0.0, config.break_time)));
            plan.hold_movement = true;
        }
        if path.contains(PathFlags::JUMP) {
            let button = if path.contains(PathFlags::CROUCH) {
                TimedButton::Jump
            } else {
                TimedButton::JumpDuck
            };
            plan.actions
                .push(AtomicAction::press(button, TimeWindow::new(0.0, config.jump_duck_time)));
        }
        plan
    }
}

impl ModRules for DeathmatchRules {
    fn is_enemy(&self, bot: &BotIdentity, other: &PlayerInfo) -> bool {
        if other.slot == bot.slot {
            return false;
        }
        bot.team == UNASSIGNED_TEAM || other.team == UNASSIGNED_TEAM || bot.team != other.team
    }

    fn on_waypoint_arrival(&self, arrival: &WaypointArrival<'_>) -> ArrivalPlan {
        let flags = arrival.graph.flags(arrival.waypoint);

        // Автомат важнее path flags
        if let Some(plan) = Self::machine_plan(arrival, flags) {
            return plan;
        }
        if flags.contains(WaypointFlags::BUTTON) && !arrival.already_used {
            return ArrivalPlan {
                actions: vec![AtomicAction::press(
                    TimedButton::Use,
                    TimeWindow::new(0.0, arrival.config.use_time),
                )],
                hold_movement: true,
                ..ArrivalPlan::default()
            };
        }
        Self::path_plan(arrival)
    }

    fn classify_item(&self, item: &ItemInfo) -> ItemClass {
        match item.handle.kind {
            EntityType::Health | EntityType::Armor | EntityType::Weapon | EntityType::Ammo => ItemClass::Pickup,
            EntityType::Button | EntityType::Door => ItemClass::Usable,
            EntityType::Object => {
                if item.flags.contains(EntityFlags::HEAVY) {
                    ItemClass::Ignore
                } else if item.flags.contains(EntityFlags::BOX) && !item.flags.contains(EntityFlags::EXPLOSIVE) {
                    ItemClass::Breakable
                } else {
                    ItemClass::Pushable
                }
            }
            EntityType::Other => ItemClass::Ignore,
        }
    }
}

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use super::*;
    use crate::bot::action::ActionKind;
    use crate::components::{AgentState, Intelligence, ItemHandle, PlayerSlot, WaypointId};
    use crate::config::ActionConfig;
    use crate::world::MemoryGraph;

    fn bot(team: u8) -> BotIdentity {
        BotIdentity::new(PlayerSlot(1), "bot", Intelligence::Normal).with_team(team)
    }

    fn arrive(
        graph: &MemoryGraph,
        agent: &AgentState,
        waypoint: WaypointId,
        next: Option<WaypointId>,
        already_used: bool,
    ) -> ArrivalPlan {
        let identity = bot(UNASSIGNED_TEAM);
        let config = ActionConfig::default();
        DeathmatchRules.on_waypoint_arrival(&WaypointArrival {
            bot: &identity,
            agent,
            waypoint,
            next,
            graph,
            already_used,
            dont_break_objects: false,
            config: &config,
        })
    }

    #[test]
    fn test_team_rules() {
        let rules = DeathmatchRules;
        let other = |team| PlayerInfo::new(PlayerSlot(2), team, Vec3::ZERO);

        assert!(rules.is_enemy(&bot(UNASSIGNED_TEAM), &other(3)));
        assert!(rules.is_enemy(&bot(2), &other(3)));
        assert!(!rules.is_enemy(&bot(2), &other(2)));
        assert!(!rules.is_enemy(&bot(2), &PlayerInfo::new(PlayerSlot(1), 3, Vec3::ZERO)));
    }

    #[test]
    fn test_machine_takes_precedence_over_path_flags() {
        let mut graph = MemoryGraph::new();
        let machine = graph.add_waypoint(Vec3::ZERO, WaypointFlags::HEALTH_MACHINE);
        let next = graph.add_waypoint(Vec3::X * 5.0, WaypointFlags::NONE);
        graph.connect(machine, next, PathFlags::JUMP | PathFlags::CROUCH);

        let mut hurt = AgentState::default();
        hurt.health = 40;
        let plan = arrive(&graph, &hurt, machine, Some(next), false);
        assert_eq!(plan.actions.len(), 1);
        assert_eq!(plan.actions[0].kind(), ActionKind::UseMachine(ResourceKind::Health));
        assert!(plan.hold_movement);

        // Уже использовали — обычная path policy
        let plan = arrive(&graph, &hurt, machine, Some(next), true);
        assert_eq!(plan.actions[0].kind(), ActionKind::Press(TimedButton::Jump));
        assert!(plan.posture.duck);

        // Полное здоровье — автомат не нужен
        let plan = arrive(&graph, &AgentState::default(), machine, Some(next), false);
        assert!(plan.actions.iter().all(|a| !matches!(a.kind(), ActionKind::UseMachine(_))));
    }

    #[test]
    fn test_path_flags_map_to_posture_and_actions() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_waypoint(Vec3::ZERO, WaypointFlags::NONE);
        let b = graph.add_waypoint(Vec3::X * 5.0, WaypointFlags::NONE);
        graph.connect(a, b, PathFlags::DOOR | PathFlags::SPRINT | PathFlags::FLASHLIGHT);

        let plan = arrive(&graph, &AgentState::default(), a, Some(b), false);
        assert!(plan.posture.sprint);
        assert!(plan.posture.flashlight);
        assert!(!plan.posture.duck);
        assert_eq!(plan.actions[0].kind(), ActionKind::Press(TimedButton::Use));
        assert!(plan.hold_movement);

        // Без next — ничего
        let plan = arrive(&graph, &AgentState::default(), b, None, false);
        assert_eq!(plan, ArrivalPlan::default());
    }

    #[test]
    fn test_classify_objects() {
        let rules = DeathmatchRules;
        let item = |kind, flags| ItemInfo {
            handle: ItemHandle::new(kind, 0),
            position: Vec3::ZERO,
            flags,
            radius: 0.5,
        };

        assert_eq!(rules.classify_item(&item(EntityType::Health, EntityFlags::NONE)), ItemClass::Pickup);
        assert_eq!(rules.classify_item(&item(EntityType::Object, EntityFlags::BOX)), ItemClass::Breakable);
        assert_eq!(rules.classify_item(&item(EntityType::Object, EntityFlags::NONE)), ItemClass::Pushable);
        assert_eq!(
            rules.classify_item(&item(EntityType::Object, EntityFlags::BOX | EntityFlags::EXPLOSIVE)),
            ItemClass::Pushable
        );
        assert_eq!(rules.classify_item(&item(EntityType::Door, EntityFlags::NONE)), ItemClass::Usable);
    }
}
