//! BotPlugin integration test
//!
//! Полный FixedUpdate pipeline: notifications → tick_bots → BotCommand → BotEvent
//!
//! Проверяем:
//! - GoTo доводит бота до цели через граф
//! - Уведомления доставляются только адресату
//! - Враг в поле зрения становится целью

use bevy::prelude::*;
use ironbot_simulation::ai::systems::publish_bot_events;
use ironbot_simulation::world::MemoryGraph;
use ironbot_simulation::*;

/// Вместо engine binding: двигаем тела и обновляем snapshot мира
fn integrate_bodies(
    clock: Res<SimulationClock>,
    mut snapshot: ResMut<WorldSnapshot>,
    mut bodies: Query<(&Bot, &mut AgentState, &BotCommand)>,
) {
    for (bot, mut agent, command) in bodies.iter_mut() {
        agent.position += command.move_direction * command.speed * clock.step;
        let identity = bot.identity();
        snapshot.upsert(PlayerInfo::new(identity.slot, identity.team, agent.position));
    }
}

/// Helper: 5 waypoints через 10 м по X, цепочка в обе стороны
fn line_graph() -> MemoryGraph {
    let mut graph = MemoryGraph::new();
    for i in 0..5 {
        graph.add_waypoint(Vec3::new(i as f32 * 10.0, 0.0, 0.0), WaypointFlags::NONE);
    }
    for i in 0..4 {
        graph.connect_both(WaypointId(i), WaypointId(i + 1), PathFlags::NONE);
    }
    graph
}

/// Helper: headless App с BotPlugin и картой
fn create_bot_app(graph: MemoryGraph) -> App {
    let mut app = create_headless_app(7);
    app.insert_resource(NavigationGraph(Box::new(graph)))
        .add_systems(FixedUpdate, integrate_bodies.after(publish_bot_events));
    app
}

fn run_ticks(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        app.world_mut().run_schedule(FixedUpdate);
    }
}

/// Все BotEvent с начала симуляции (First schedule не запускаем — буфер не чистится)
fn bot_events(app: &App) -> Vec<BotEvent> {
    let events = app.world().resource::<Events<BotEvent>>();
    let mut cursor = events.get_cursor();
    cursor.read(events).cloned().collect()
}

fn position_of(app: &App, entity: Entity) -> Vec3 {
    app.world()
        .get::<AgentState>(entity)
        .map(|agent| agent.position)
        .expect("bot entity has AgentState")
}

/// Test: GoTo через notification → ArrivedAtWaypoint по пути → ArrivedAtDestination
#[test]
fn test_goto_notification_reaches_destination() {
    let mut app = create_bot_app(line_graph());
    let me = PlayerSlot(0);
    let bot = spawn_bot(
        app.world_mut(),
        BotIdentity::new(me, "runner", Intelligence::Normal),
        AgentState::at(Vec3::ZERO),
    );

    app.world_mut().send_event(BotNotification::GoTo {
        bot: me,
        destination: WaypointId(4),
    });
    // 40 м при run speed 4 м/с = 10 с; запас на поиск пути
    run_ticks(&mut app, 720);

    let events = bot_events(&app);
    let arrivals: Vec<_> = events
        .iter()
        .filter_map(|e| match e.kind {
            BotEventKind::ArrivedAtWaypoint(id) => Some(id),
            _ => None,
        })
        .collect();
    assert_eq!(arrivals, vec![WaypointId(1), WaypointId(2), WaypointId(3), WaypointId(4)]);
    assert!(events.contains(&BotEvent {
        bot: me,
        kind: BotEventKind::ArrivedAtDestination(Some(WaypointId(4))),
    }));
    assert!(!events.iter().any(|e| matches!(e.kind, BotEventKind::MoveFailure(_))));

    let position = position_of(&app, bot);
    assert!((position.x - 40.0).abs() < 1.0, "bot stopped at {position:?}");

    // Цель достигнута — стоим
    let command = app.world().get::<BotCommand>(bot).copied().unwrap_or_default();
    assert!(!command.is_moving());
}

/// Test: уведомление с адресатом не задевает других ботов
#[test]
fn test_notifications_reach_only_addressee() {
    let mut app = create_bot_app(line_graph());
    for slot in 0..2 {
        spawn_bot(
            app.world_mut(),
            BotIdentity::new(PlayerSlot(slot), format!("bot{slot}"), Intelligence::Normal),
            AgentState::at(Vec3::new(slot as f32 * 40.0, 0.0, 0.0)),
        );
    }

    app.world_mut().send_event(BotNotification::Say {
        bot: PlayerSlot(1),
        phrase: ChatPhrase::Help,
        team_only: false,
    });
    app.world_mut().send_event(BotNotification::KilledEnemy {
        bot: PlayerSlot(0),
        victim: PlayerSlot(9),
    });
    run_ticks(&mut app, 1);

    let events = bot_events(&app);
    assert!(events.contains(&BotEvent {
        bot: PlayerSlot(1),
        kind: BotEventKind::ChatRequested {
            phrase: ChatPhrase::Help,
            team_only: false,
        },
    }));
    assert!(events.contains(&BotEvent {
        bot: PlayerSlot(0),
        kind: BotEventKind::KilledEnemy(PlayerSlot(9)),
    }));
    assert!(!events
        .iter()
        .any(|e| e.bot == PlayerSlot(0) && matches!(e.kind, BotEventKind::ChatRequested { .. })));
    assert!(!events
        .iter()
        .any(|e| e.bot == PlayerSlot(1) && matches!(e.kind, BotEventKind::KilledEnemy(_))));
}

/// Test: враг другой команды перед ботом → TargetChanged
#[test]
fn test_enemy_in_view_becomes_target() {
    let mut app = create_bot_app(line_graph());
    let hunter = spawn_bot(
        app.world_mut(),
        BotIdentity::new(PlayerSlot(0), "hunter", Intelligence::Normal).with_team(1),
        AgentState::at(Vec3::ZERO),
    );
    spawn_bot(
        app.world_mut(),
        BotIdentity::new(PlayerSlot(1), "prey", Intelligence::Normal).with_team(2),
        AgentState::at(Vec3::new(10.0, 0.0, 0.0)),
    );

    // Первый тик заполняет snapshot, дальше боты видят друг друга
    run_ticks(&mut app, 30);

    let events = bot_events(&app);
    assert!(events.contains(&BotEvent {
        bot: PlayerSlot(0),
        kind: BotEventKind::TargetChanged {
            from: None,
            to: Some(PlayerSlot(1)),
        },
    }));

    let target = app
        .world()
        .get::<Bot>(hunter)
        .and_then(|bot| bot.combat().target().map(|t| t.slot))
        .expect("hunter has a combat target");
    assert_eq!(target, PlayerSlot(1));
}

/// Test: SimulationClock тикает только в FixedUpdate, ровно по шагу
#[test]
fn test_clock_follows_fixed_update() {
    let mut app = create_bot_app(line_graph());
    run_ticks(&mut app, 120);

    let clock = app.world().resource::<SimulationClock>();
    assert_eq!(clock.tick, 120);
    assert!((clock.elapsed - 2.0).abs() < 1e-4);
}
