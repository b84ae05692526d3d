//! Tests for BotController (end-to-end тики против in-memory мира).

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bevy::prelude::*;

    use super::super::action::{AtomicAction, TimeWindow, TimedButton};
    use super::super::arsenal::WeaponSlot;
    use super::super::controller::{BotController, TickContext};
    use super::super::events::{BotEventKind, ChatPhrase, MoveFailure};
    use super::super::movement::MovementState;
    use super::super::stuck::StuckPhase;
    use crate::components::{
        AgentState, BotCommand, BotIdentity, Buttons, EntityFlags, EntityType, Intelligence,
        LookAngles, PathFlags, PlayerInfo, PlayerSlot, ResourceKind, WaypointFlags, WaypointId,
        WeaponKind, WorldSnapshot,
    };
    use crate::config::BotConfig;
    use crate::mods::DeathmatchRules;
    use crate::world::{MemoryGraph, MemoryItems, MemoryPathSearch, OpenSight};
    use crate::BotError;

    const ME: PlayerSlot = PlayerSlot(0);
    const DT: f32 = 1.0 / 60.0;

    /// Мир для тестов: граф, предметы, игроки и тело бота
    struct Arena {
        graph: MemoryGraph,
        items: MemoryItems,
        world: WorldSnapshot,
        agent: AgentState,
        now: f32,
    }

    impl Arena {
        fn new(graph: MemoryGraph, start: Vec3) -> Self {
            Self {
                graph,
                items: MemoryItems::new(),
                world: WorldSnapshot::default(),
                agent: AgentState::at(start),
                now: 0.0,
            }
        }

        /// 10 waypoints через 10 м по X, рёбра только 5-7-9
        fn line() -> Self {
            let mut graph = MemoryGraph::new();
            for i in 0..10 {
                graph.add_waypoint(Vec3::new(i as f32 * 10.0, 0.0, 0.0), WaypointFlags::NONE);
            }
            graph.connect_both(WaypointId(5), WaypointId(7), PathFlags::NONE);
            graph.connect_both(WaypointId(7), WaypointId(9), PathFlags::NONE);
            Self::new(graph, Vec3::new(50.0, 0.0, 0.0))
        }

        fn bot(&self, intelligence: Intelligence) -> BotController {
            let mut bot = BotController::new(
                BotIdentity::new(ME, "tester", intelligence),
                Arc::new(BotConfig::default()),
                Box::new(MemoryPathSearch::new(64)),
            );
            bot.respawned(self.now, &self.agent, &self.graph);
            bot
        }

        /// Один тик; `integrate` — двигаем тело по команде
        fn step(&mut self, bot: &mut BotController, integrate: bool) -> BotCommand {
            let command = bot.tick(&TickContext {
                now: self.now,
                agent: &self.agent,
                world: &self.world,
                graph: &self.graph,
                items: &self.items,
                rules: &DeathmatchRules,
                sight: &OpenSight,
            });
            if integrate {
                self.agent.position += command.move_direction * command.speed * DT;
            }
            self.now += DT;
            command
        }

        fn run(&mut self, bot: &mut BotController, ticks: usize, integrate: bool) -> Vec<BotEventKind> {
            let mut events = Vec::new();
            for _ in 0..ticks {
                self.step(bot, integrate);
                events.extend(bot.drain_events());
            }
            events
        }
    }

    fn arrivals(events: &[BotEventKind]) -> Vec<WaypointId> {
        events
            .iter()
            .filter_map(|e| match e {
                BotEventKind::ArrivedAtWaypoint(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_route_through_sparse_graph() {
        let mut arena = Arena::line();
        let mut bot = arena.bot(Intelligence::Normal);
        assert_eq!(bot.movement().current(), Some(WaypointId(5)));

        bot.set_destination(WaypointId(9));
        let events = arena.run(&mut bot, 720, true);

        assert_eq!(arrivals(&events), vec![WaypointId(7), WaypointId(9)]);
        assert!(events.contains(&BotEventKind::ArrivedAtDestination(Some(WaypointId(9)))));
        assert!(!events
            .iter()
            .any(|e| matches!(e, BotEventKind::Stuck { .. } | BotEventKind::MoveFailure(_))));
        assert_eq!(*bot.movement().state(), MovementState::Idle);
        assert_eq!(bot.movement().current(), Some(WaypointId(9)));
        assert!((arena.agent.position.x - 90.0).abs() < 1.0);
    }

    #[test]
    fn test_health_machine_exhausts_early_and_route_continues() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_waypoint(Vec3::ZERO, WaypointFlags::NONE);
        let machine = graph.add_waypoint(Vec3::new(10.0, 0.0, 0.0), WaypointFlags::HEALTH_MACHINE);
        let b = graph.add_waypoint(Vec3::new(20.0, 0.0, 0.0), WaypointFlags::NONE);
        graph.connect_both(a, machine, PathFlags::NONE);
        graph.connect_both(machine, b, PathFlags::NONE);

        let mut arena = Arena::new(graph, Vec3::ZERO);
        arena.agent.health = 40;
        let mut bot = arena.bot(Intelligence::Normal);
        bot.set_destination(b);

        // 10 секунд: полное окно автомата (6 с) + дорога не уложились бы
        let mut events = Vec::new();
        let mut use_ticks = 0;
        for _ in 0..600 {
            let command = arena.step(&mut bot, true);
            if command.buttons.is_pressed(Buttons::USE) {
                use_ticks += 1;
                assert_eq!(command.move_direction, Vec3::ZERO);
                assert!(bot.aim().is_locked());
                // Автомат даёт здоровье только до 70
                if arena.agent.health < 70 {
                    arena.agent.health += 1;
                }
            }
            events.extend(bot.drain_events());
        }

        assert!(use_ticks > 0);
        assert_eq!(arena.agent.health, 70);
        let exhausted = events
            .iter()
            .position(|e| *e == BotEventKind::MachineExhausted(ResourceKind::Health))
            .expect("machine exhausted before the end of its window");
        let arrived = events
            .iter()
            .position(|e| *e == BotEventKind::ArrivedAtDestination(Some(b)))
            .expect("route continues after the machine");
        assert!(exhausted < arrived);
        assert_eq!(arrivals(&events), vec![machine, b]);
        // current сменился — флаг "уже использовали" сброшен
        assert!(!bot.timed().already_used());
    }

    #[test]
    fn test_close_enemy_engaged_with_best_weapon() {
        let mut arena = Arena::line();
        arena.agent.position = Vec3::ZERO;
        arena.world.upsert(PlayerInfo::new(PlayerSlot(1), 0, Vec3::new(3.0, 0.0, 0.0)));

        let mut bot = arena.bot(Intelligence::Normal);
        bot.arsenal_mut().add(WeaponSlot::new("crowbar", WeaponKind::Manual, 0, (0.0, 2.0)));
        bot.arsenal_mut()
            .add(WeaponSlot::new("shotgun", WeaponKind::Shotgun, 5, (0.0, 10.0)).with_ammo(6, 6, 12));

        let first = arena.step(&mut bot, false);
        assert_eq!(first.weapon_select, Some(1));
        assert_eq!(
            bot.drain_events(),
            vec![BotEventKind::TargetChanged {
                from: None,
                to: Some(PlayerSlot(1)),
            }]
        );

        let mut fired = false;
        for _ in 0..20 {
            let command = arena.step(&mut bot, false);
            assert_eq!(command.move_direction, Vec3::ZERO);
            assert_eq!(command.weapon_select, None);
            fired |= command.buttons.is_pressed(Buttons::ATTACK);
        }
        assert!(fired);
        assert_eq!(bot.combat().weapon_evaluations(), 1);
    }

    #[test]
    fn test_enqueue_overflow_is_returned() {
        let arena = Arena::line();
        let mut bot = arena.bot(Intelligence::Normal);

        for _ in 0..32 {
            bot.enqueue(AtomicAction::wait_for(1.0)).expect("capacity 32");
        }
        let result = bot.enqueue(AtomicAction::wait_for(1.0));
        assert!(matches!(result, Err(BotError::QueueFull { capacity: 32 })));
        assert_eq!(bot.queue().len(), 32);
    }

    #[test]
    fn test_blocked_bot_escalates_to_stuck_failure() {
        let mut arena = Arena::line();
        let mut bot = arena.bot(Intelligence::Normal);
        bot.set_destination(WaypointId(9));

        // Тело не двигается: упёрлись в невидимую стену
        let events = arena.run(&mut bot, 1200, false);

        assert!(events.contains(&BotEventKind::Stuck {
            waypoint: Some(WaypointId(5)),
            episode: 1,
        }));
        let failure = MoveFailure::Stuck(Some(WaypointId(5)));
        assert!(events.contains(&BotEventKind::MoveFailure(failure)));
        assert_eq!(bot.movement().move_failure(), Some(failure));
        assert!(!bot.stuck().is_stuck());
    }

    #[test]
    fn test_side_step_runs_full_window_then_retouches() {
        let mut arena = Arena::line();
        let mut bot = arena.bot(Intelligence::Normal);
        bot.set_destination(WaypointId(9));

        // Стена по X: тело уходит только вбок и только пока идёт side-step
        let mut stuck_seen = false;
        let mut side_ticks = 0;
        let mut moved_during_side_step = false;
        let mut retouched = false;
        for _ in 0..300 {
            let command = arena.step(&mut bot, false);
            let side_step = matches!(bot.stuck().phase(), StuckPhase::SideStep { .. });
            if side_step {
                side_ticks += 1;
                arena.agent.position.z += command.move_direction.z * command.speed * DT;
                moved_during_side_step |= !bot.stuck().is_stuck();
            }
            stuck_seen |= bot
                .drain_events()
                .iter()
                .any(|e| matches!(e, BotEventKind::Stuck { .. }));
            if bot.movement().is_retouching() {
                retouched = true;
                break;
            }
        }

        assert!(stuck_seen);
        assert!(moved_during_side_step);
        assert!(side_ticks >= 29, "side step lasted {side_ticks} ticks");
        assert!(retouched, "retouch never started");
        assert_eq!(bot.stuck().episodes(), 1);
        assert!(arena.agent.position.z.abs() > 0.5);
    }

    #[test]
    fn test_path_test_reports_success_and_failure() {
        let mut arena = Arena::line();
        let mut bot = arena.bot(Intelligence::Normal);

        bot.test_path(WaypointId(5), WaypointId(9));
        let events = arena.run(&mut bot, 720, true);
        let finished: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, BotEventKind::PathTestFinished { .. }))
            .collect();
        assert_eq!(finished, vec![&BotEventKind::PathTestFinished { success: true }]);

        bot.test_path(WaypointId(9), WaypointId(3));
        let events = arena.run(&mut bot, 2, true);
        assert!(events.contains(&BotEventKind::MoveFailure(MoveFailure::Unreachable {
            from: WaypointId(9),
            to: WaypointId(3),
        })));
        assert!(events.contains(&BotEventKind::PathTestFinished { success: false }));
    }

    #[test]
    fn test_death_clears_queue_and_respawn_picks_nearest_waypoint() {
        let mut arena = Arena::line();
        let mut bot = arena.bot(Intelligence::Normal);
        bot.enqueue(AtomicAction::wait_for(5.0)).unwrap();
        bot.set_destination(WaypointId(9));
        arena.run(&mut bot, 5, true);
        assert!(bot.queue().is_busy());

        arena.agent.alive = false;
        let command = arena.step(&mut bot, true);
        assert!(!bot.is_alive());
        assert!(!bot.queue().is_busy());
        assert_eq!(command.move_direction, Vec3::ZERO);
        assert_eq!(*bot.movement().state(), MovementState::Idle);

        arena.agent = AgentState::at(Vec3::new(31.0, 0.0, 0.0));
        bot.respawned(arena.now, &arena.agent, &arena.graph);
        assert!(bot.is_alive());
        assert_eq!(bot.movement().current(), Some(WaypointId(3)));
    }

    #[test]
    fn test_notifications_emit_events() {
        let arena = Arena::line();
        let mut bot = arena.bot(Intelligence::Normal);
        let mut hurt = AgentState::default();
        hurt.health = 5;

        bot.hurt_by(PlayerSlot(4), &hurt);
        bot.killed_enemy(PlayerSlot(4));
        bot.say(ChatPhrase::Affirmative, true);

        assert!(bot.combat().is_fleeing());
        assert_eq!(
            bot.drain_events(),
            vec![
                BotEventKind::HurtBy(PlayerSlot(4)),
                BotEventKind::KilledEnemy(PlayerSlot(4)),
                BotEventKind::ChatRequested {
                    phrase: ChatPhrase::Affirmative,
                    team_only: true,
                },
            ]
        );
        assert!(bot.drain_events().is_empty());
    }

    #[test]
    fn test_lock_all_freezes_output() {
        let mut arena = Arena::line();
        let mut bot = arena.bot(Intelligence::Normal);
        bot.set_destination(WaypointId(9));
        bot.set_lock_all(true);

        for _ in 0..30 {
            let command = arena.step(&mut bot, true);
            assert_eq!(command.move_direction, Vec3::ZERO);
            assert!(command.buttons.is_empty());
        }
        assert_eq!(arena.agent.position, Vec3::new(50.0, 0.0, 0.0));

        bot.set_lock_all(false);
        arena.run(&mut bot, 30, true);
        assert!(arena.agent.position.x > 50.0);
    }

    #[test]
    fn test_queued_aim_converges() {
        let mut arena = Arena::line();
        let mut bot = arena.bot(Intelligence::Normal);
        bot.enqueue(AtomicAction::aim_angles(LookAngles::new(0.0, 90.0))).unwrap();

        let mut last = LookAngles::default();
        for _ in 0..40 {
            last = arena.step(&mut bot, false).look;
        }
        assert!((last.yaw - 90.0).abs() < 1e-3);
        assert!(!bot.queue().is_busy());
    }

    #[test]
    fn test_aim_locked_while_jump_duck_window_is_open() {
        let mut arena = Arena::line();
        let mut bot = arena.bot(Intelligence::Normal);
        bot.enqueue(AtomicAction::press(TimedButton::JumpDuck, TimeWindow::new(0.0, 0.5)))
            .unwrap();

        let first = arena.step(&mut bot, false);
        assert!(first.buttons.is_pressed(Buttons::JUMP | Buttons::DUCK));
        assert!(bot.aim().is_locked());

        // Маршрут появился в воздухе — взгляд всё равно не крутится
        bot.set_destination(WaypointId(9));
        for _ in 0..20 {
            let command = arena.step(&mut bot, false);
            assert!(bot.aim().is_locked());
            assert_eq!(command.look, first.look);
        }

        arena.run(&mut bot, 30, false);
        assert!(!bot.aim().is_locked());
    }

    #[test]
    fn test_weapon_switch_from_queue() {
        let mut arena = Arena::line();
        let mut bot = arena.bot(Intelligence::Normal);
        bot.arsenal_mut().add(WeaponSlot::new("pistol", WeaponKind::Pistol, 1, (0.0, 30.0)).with_ammo(12, 12, 36));
        bot.arsenal_mut().add(WeaponSlot::new("smg", WeaponKind::Rifle, 3, (0.0, 40.0)).with_ammo(30, 30, 90));

        bot.enqueue(AtomicAction::switch_weapon(7)).unwrap();
        bot.enqueue(AtomicAction::switch_weapon(1)).unwrap();

        let commands: Vec<_> = (0..4).map(|_| arena.step(&mut bot, false)).collect();
        // Неизвестный индекс — warning, без переключения
        assert_eq!(commands[0].weapon_select, None);
        assert!(commands.iter().any(|c| c.weapon_select == Some(1)));
        assert_eq!(bot.arsenal().current(), Some(1));
    }

    #[test]
    fn test_pickup_reported_once() {
        let mut arena = Arena::line();
        let medkit = arena
            .items
            .add(EntityType::Health, Vec3::new(50.3, 0.0, 0.0), EntityFlags::RESPAWNABLE, 0.3);
        let mut bot = arena.bot(Intelligence::Normal);

        arena.step(&mut bot, false);
        assert!(bot.drain_events().is_empty());

        arena.items.take(medkit);
        let events = arena.run(&mut bot, 3, false);
        assert_eq!(events, vec![BotEventKind::PickedItem(medkit)]);
        assert!(bot.items().is_picked(medkit));
    }
}
